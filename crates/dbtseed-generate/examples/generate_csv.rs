use std::env;
use std::path::PathBuf;

use dbtseed_core::Schema;
use dbtseed_generate::{GenerateOptions, GenerationEngine, write_output};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut schema_path: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--schema" => schema_path = args.next().map(PathBuf::from),
            "--out" => out_dir = args.next().map(PathBuf::from),
            "--seed" => seed = args.next().map(|value| value.parse()).transpose()?,
            _ => {
                if schema_path.is_none() {
                    schema_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let schema_path = schema_path.ok_or("missing --schema path")?;
    let out_dir = out_dir.unwrap_or_else(|| PathBuf::from("seeds"));
    let schema = Schema::from_path(&schema_path)?;

    let options = GenerateOptions {
        seed,
        ..GenerateOptions::default()
    };
    let mut engine = GenerationEngine::new(schema, options)?;
    let output = engine.run()?;
    let written = write_output(&out_dir, &output)?;

    println!("report={}", written.report_file.display());
    Ok(())
}
