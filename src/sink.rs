//! File sinks for artifacts: a flat `.sql` file and an `.ipynb` notebook.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::artifact::Artifact;
use crate::error::SqlcellResult;
use crate::notebook::Notebook;

/// Timestamp layout used in output file names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Build `modified_<stem>_<timestamp>.<ext>` for a source file name.
pub fn output_file_name(source_name: &str, timestamp: &NaiveDateTime, ext: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_name);
    format!(
        "modified_{}_{}.{}",
        stem,
        timestamp.format(TIMESTAMP_FORMAT),
        ext
    )
}

/// Write the flat document form of `artifact`. Returns the written path.
pub fn write_sql(
    artifact: &Artifact,
    source_name: &str,
    output_dir: &Path,
    timestamp: &NaiveDateTime,
) -> SqlcellResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(output_file_name(source_name, timestamp, "sql"));
    std::fs::write(&path, artifact.to_document())?;
    info!(path = %path.display(), "SQL file created");
    Ok(path)
}

/// Write `artifact` as a notebook, one cell per unit. Returns the written path.
pub fn write_notebook(
    artifact: &Artifact,
    source_name: &str,
    output_dir: &Path,
    timestamp: &NaiveDateTime,
) -> SqlcellResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(output_file_name(source_name, timestamp, "ipynb"));
    std::fs::write(&path, Notebook::from(artifact).to_json()?)?;
    info!(path = %path.display(), cells = artifact.units().len(), "Notebook created");
    Ok(path)
}
