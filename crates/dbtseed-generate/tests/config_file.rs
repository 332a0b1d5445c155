use std::fs;
use std::path::{Path, PathBuf};

use dbtseed_core::{Schema, validate_schema};
use dbtseed_generate::{GenerationEngine, GenerationError, ValueKind, load_options};

fn repo_file(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(relative)
}

#[test]
fn example_config_drives_the_demo_schema() {
    let mut options = load_options(&repo_file("dbtseed.example.toml")).expect("load config");
    assert_eq!(options.min_rows, 10);
    assert_eq!(options.max_rows, 100);
    assert!(options.field_aliases.contains_key("OriginCityName"));
    options.validate().expect("example config is valid");
    options.seed = Some(17);

    let schema = Schema::from_path(&repo_file("demos/flights.yml")).expect("load demo schema");
    validate_schema(&schema).expect("demo schema is consistent");

    let mut engine = GenerationEngine::new(schema, options).expect("engine");
    let output = engine.generate(5, 5).expect("generate");
    let flights = output.table("flights").expect("flights");
    assert_eq!(flights.row_count, 5);
    assert!(
        flights
            .column("OriginCityName")
            .unwrap()
            .iter()
            .all(|value| value.as_str().is_some_and(|city| !city.is_empty()))
    );

    let airports = output.table("airports").expect("airports");
    let airport_ids = airports.column("airport_id").unwrap();
    for column in ["origin_airport_id", "dest_airport_id"] {
        assert!(
            flights
                .column(column)
                .unwrap()
                .iter()
                .all(|value| airport_ids.contains(value))
        );
    }
}

#[test]
fn kind_tables_resolve_with_bounds() {
    let dir = std::env::temp_dir().join(format!("dbtseed_config_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create dir");
    let path = dir.join("dbtseed.toml");
    fs::write(
        &path,
        r#"
seed = 3
[data_type_mapping]
INTEGER = { kind = "integer_number", min = 1, max = 8 }
"#,
    )
    .expect("write config");

    let options = load_options(&path).expect("load config");
    let kind = options.data_type_mapping["INTEGER"].resolve().expect("resolve");
    assert_eq!(kind, ValueKind::Integer { min: 1, max: 8 });

    fs::write(&path, "min_rows = \"ten\"").expect("rewrite config");
    assert!(matches!(load_options(&path), Err(GenerationError::Toml(_))));
    assert!(matches!(
        load_options(&dir.join("missing.toml")),
        Err(GenerationError::Io(_))
    ));

    fs::remove_dir_all(&dir).ok();
}
