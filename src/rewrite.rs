//! Batch rewrite of transpiled SQL files through the language model.
//!
//! For each `.sql` file: ask the model to fully qualify table references,
//! run the reply through the SQL core, then write a `.sql` file and a
//! notebook. A failing file is logged and skipped; the batch continues.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use crate::completion::{rewrite_prompt, Completer};
use crate::config::{RewriteConfig, TargetConfig};
use crate::error::{SqlcellError, SqlcellResult};
use crate::sink;

/// Paths written for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub source: String,
    pub sql: PathBuf,
    pub notebook: PathBuf,
}

/// Outcome of a rewrite batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub written: Vec<WrittenFile>,
    /// File name and error message for each skipped file.
    pub failed: Vec<(String, String)>,
}

impl RewriteReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `.sql` file names directly inside `dir`, sorted.
pub fn list_sql_files(dir: &Path) -> SqlcellResult<Vec<String>> {
    if !dir.is_dir() {
        return Err(SqlcellError::Config(format!(
            "Directory '{}' not found",
            dir.display()
        )));
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".sql") && entry.file_type()?.is_file() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Rewrites every SQL file in a directory with a [`Completer`].
pub struct Rewriter<'a, C> {
    config: &'a RewriteConfig,
    target: &'a TargetConfig,
    completer: C,
}

impl<'a, C: Completer> Rewriter<'a, C> {
    pub fn new(config: &'a RewriteConfig, target: &'a TargetConfig, completer: C) -> Self {
        Self {
            config,
            target,
            completer,
        }
    }

    pub async fn run(&self) -> SqlcellResult<RewriteReport> {
        let files = list_sql_files(&self.config.transpiled_dir)?;
        let mut report = RewriteReport::default();
        if files.is_empty() {
            warn!(dir = %self.config.transpiled_dir.display(), "No SQL files found");
            return Ok(report);
        }

        info!(count = files.len(), "Found SQL files to process");
        for name in files {
            info!(file = %name, "Processing");
            let timestamp = Local::now().naive_local();
            match self.rewrite_file(&name, &timestamp).await {
                Ok(written) => {
                    info!(file = %name, "Successfully processed");
                    report.written.push(written);
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "Failed to process");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        info!(
            written = report.written.len(),
            failed = report.failed.len(),
            "Processing complete"
        );
        Ok(report)
    }

    async fn rewrite_file(&self, name: &str, timestamp: &NaiveDateTime) -> SqlcellResult<WrittenFile> {
        let sql = std::fs::read_to_string(self.config.transpiled_dir.join(name))?;
        let prompt = rewrite_prompt(&sql, &self.target.catalog, &self.target.schema);
        let reply = self.completer.complete(&prompt).await?;

        let artifact = crate::process(&reply);
        if artifact.is_blank() {
            warn!(file = %name, "Model returned no SQL");
        }

        let output_dir = &self.config.output_dir;
        Ok(WrittenFile {
            source: name.to_string(),
            sql: sink::write_sql(&artifact, name, output_dir, timestamp)?,
            notebook: sink::write_notebook(&artifact, name, output_dir, timestamp)?,
        })
    }
}
