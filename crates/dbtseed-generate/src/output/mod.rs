pub mod csv;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::GenerationError;
use crate::model::GenerationOutput;

pub const REPORT_FILE: &str = "generation_report.json";

/// Files produced by [`write_output`].
#[derive(Debug, Clone)]
pub struct WrittenOutput {
    pub table_files: Vec<PathBuf>,
    pub report_file: PathBuf,
    pub bytes_written: u64,
}

/// Write `<out_dir>/<table>.csv` for every table plus the JSON report.
pub fn write_output(
    out_dir: &Path,
    output: &GenerationOutput,
) -> Result<WrittenOutput, GenerationError> {
    std::fs::create_dir_all(out_dir)?;

    let mut table_files = Vec::with_capacity(output.tables.len());
    let mut bytes_written = 0_u64;
    for table in &output.tables {
        let path = out_dir.join(format!("{}.csv", table.name));
        let bytes = csv::write_table_csv(&path, table)?;
        debug!(table = %table.name, path = %path.display(), bytes, "table written");
        bytes_written += bytes;
        table_files.push(path);
    }

    let report_file = out_dir.join(REPORT_FILE);
    std::fs::write(&report_file, serde_json::to_vec_pretty(&output.report)?)?;

    Ok(WrittenOutput {
        table_files,
        report_file,
        bytes_written,
    })
}
