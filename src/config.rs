//! Pipeline configuration.
//!
//! Loaded from TOML. Every section and field has a default, so an empty
//! file (or no file at all) is a valid configuration; each stage validates
//! only the fields it needs before running.
//!
//! ```toml
//! [target]
//! catalog = "main"
//! schema = "migrated"
//!
//! [rewrite]
//! transpiled_dir = "./transpiled"
//! model = "llama-3.1-8b-instant"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SqlcellError, SqlcellResult};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sqlcell.toml";

/// Source technologies accepted by the analyzer.
pub const SOURCE_TECHS: [&str; 35] = [
    "abinitio",
    "adf",
    "alteryx",
    "athena",
    "bigquery",
    "bods",
    "cloudera-impala",
    "datastage",
    "greenplum",
    "hive",
    "ibmdb2",
    "informatica-bde",
    "informatica-pc",
    "informatica-cloud",
    "MS SQL Server",
    "netezza",
    "oozie",
    "oracle",
    "odi",
    "pentahodi",
    "pig",
    "presto",
    "pyspark",
    "redshift",
    "saphana-calcviews",
    "sas",
    "snowflake",
    "spss",
    "sqoop",
    "ssis",
    "ssrs",
    "synapse",
    "talend",
    "teradata",
    "vertica",
];

/// Source dialects accepted by the transpiler.
pub const SOURCE_DIALECTS: [&str; 10] = [
    "datastage",
    "informatica (desktop edition)",
    "informatica cloud",
    "mssql",
    "netezza",
    "oracle",
    "snowflake",
    "synapse",
    "teradata",
    "tsql",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub databricks: DatabricksConfig,
    pub target: TargetConfig,
    pub analyzer: AnalyzerConfig,
    pub transpiler: TranspilerConfig,
    pub rewrite: RewriteConfig,
    pub upload: UploadConfig,
}

/// How to reach the external `databricks` CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabricksConfig {
    pub binary: String,
    pub profile: Option<String>,
}

impl Default for DatabricksConfig {
    fn default() -> Self {
        Self {
            binary: "databricks".to_string(),
            profile: None,
        }
    }
}

/// Default catalog and schema for three-level table names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub catalog: String,
    pub schema: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub source_directory: String,
    pub report_file: String,
    pub source_tech: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspilerConfig {
    pub source_dialect: String,
    pub input_source: String,
    pub output_folder: String,
    pub error_file_path: String,
    pub skip_validation: bool,
    pub warehouse: String,
    pub override_existing: bool,
    pub open_config: bool,
}

impl Default for TranspilerConfig {
    fn default() -> Self {
        Self {
            source_dialect: String::new(),
            input_source: String::new(),
            output_folder: "./transpiled".to_string(),
            error_file_path: "./errors.log".to_string(),
            skip_validation: false,
            warehouse: "1".to_string(),
            override_existing: true,
            open_config: true,
        }
    }
}

/// Settings for the LLM table-reference rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    pub transpiled_dir: PathBuf,
    pub output_dir: PathBuf,
    pub model: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub top_p: f32,
    pub endpoint: String,
    pub api_key_env: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            transpiled_dir: PathBuf::from("./transpiled"),
            output_dir: PathBuf::from("./transpiled"),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.6,
            max_completion_tokens: 4096,
            top_p: 0.95,
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub source_path: PathBuf,
    pub workspace_dir: String,
    pub cluster_id: Option<String>,
}

impl UploadConfig {
    /// Cluster to run uploaded notebooks on. `DATABRICKS_CLUSTER_ID` wins
    /// over the file value; blank values count as unset.
    pub fn effective_cluster_id(&self) -> Option<String> {
        std::env::var("DATABRICKS_CLUSTER_ID")
            .ok()
            .or_else(|| self.cluster_id.clone())
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }
}

impl Config {
    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> SqlcellResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> SqlcellResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from `explicit` if given, else the first existing default
    /// location, else built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> SqlcellResult<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "Loading config");
            return Self::load(path);
        }
        for path in default_locations() {
            if path.is_file() {
                debug!(path = %path.display(), "Loading config");
                return Self::load(path);
            }
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn validate_target(&self) -> SqlcellResult<()> {
        require("target.catalog", &self.target.catalog)?;
        require("target.schema", &self.target.schema)
    }

    pub fn validate_analyzer(&self) -> SqlcellResult<()> {
        let analyzer = &self.analyzer;
        require("analyzer.source_directory", &analyzer.source_directory)?;
        require("analyzer.report_file", &analyzer.report_file)?;
        if !analyzer.report_file.ends_with(".xlsx") {
            return Err(SqlcellError::Config(format!(
                "analyzer.report_file must be an .xlsx file, got '{}'",
                analyzer.report_file
            )));
        }
        one_of("analyzer.source_tech", &analyzer.source_tech, &SOURCE_TECHS)
    }

    pub fn validate_transpiler(&self) -> SqlcellResult<()> {
        let transpiler = &self.transpiler;
        one_of(
            "transpiler.source_dialect",
            &transpiler.source_dialect,
            &SOURCE_DIALECTS,
        )?;
        require("transpiler.input_source", &transpiler.input_source)?;
        require("transpiler.output_folder", &transpiler.output_folder)?;
        require("transpiler.error_file_path", &transpiler.error_file_path)?;
        self.validate_target()
    }

    pub fn validate_rewrite(&self) -> SqlcellResult<()> {
        let rewrite = &self.rewrite;
        require("rewrite.model", &rewrite.model)?;
        require("rewrite.endpoint", &rewrite.endpoint)?;
        if !(0.0..=1.0).contains(&rewrite.temperature) {
            return Err(SqlcellError::Config(format!(
                "rewrite.temperature must be between 0.0 and 1.0, got {}",
                rewrite.temperature
            )));
        }
        self.validate_target()
    }

    pub fn validate_upload(&self) -> SqlcellResult<()> {
        if self.upload.source_path.as_os_str().is_empty() {
            return Err(SqlcellError::Config("upload.source_path is required".to_string()));
        }
        require("upload.workspace_dir", &self.upload.workspace_dir)
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("sqlcell").join("config.toml"));
    }
    paths
}

fn require(field: &str, value: &str) -> SqlcellResult<()> {
    if value.trim().is_empty() {
        return Err(SqlcellError::Config(format!("{} is required", field)));
    }
    Ok(())
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> SqlcellResult<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(SqlcellError::Config(format!(
        "{} '{}' is not supported. Valid values: {}",
        field,
        value,
        allowed.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.rewrite.model, "llama-3.1-8b-instant");
        assert_eq!(config.rewrite.transpiled_dir, PathBuf::from("./transpiled"));
        assert_eq!(config.transpiler.warehouse, "1");
        assert_eq!(config.databricks.binary, "databricks");
    }

    #[test]
    fn test_partial_section() {
        let config = Config::from_toml(
            r#"
            [target]
            catalog = "main"
            schema = "sales"

            [rewrite]
            temperature = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(config.target.catalog, "main");
        assert_eq!(config.rewrite.temperature, 0.2);
        assert_eq!(config.rewrite.top_p, 0.95);
        assert!(config.validate_rewrite().is_ok());
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            Config::from_toml("[target\ncatalog ="),
            Err(SqlcellError::Toml(_))
        ));
    }

    #[test]
    fn test_rewrite_temperature_range() {
        let mut config = Config::default();
        config.target.catalog = "main".to_string();
        config.target.schema = "sales".to_string();
        config.rewrite.temperature = 1.5;
        let err = config.validate_rewrite().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_analyzer_validation() {
        let mut config = Config::default();
        config.analyzer.source_directory = "./legacy".to_string();
        config.analyzer.report_file = "report.csv".to_string();
        config.analyzer.source_tech = "teradata".to_string();
        assert!(config.validate_analyzer().is_err());

        config.analyzer.report_file = "report.xlsx".to_string();
        assert!(config.validate_analyzer().is_ok());

        config.analyzer.source_tech = "cobol".to_string();
        assert!(config.validate_analyzer().is_err());
    }

    #[test]
    fn test_transpiler_requires_target() {
        let mut config = Config::default();
        config.transpiler.source_dialect = "snowflake".to_string();
        config.transpiler.input_source = "./sql".to_string();
        let err = config.validate_transpiler().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: target.catalog is required");
    }

    #[test]
    fn test_upload_validation() {
        let mut config = Config::default();
        assert!(config.validate_upload().is_err());
        config.upload.source_path = PathBuf::from("./transpiled");
        config.upload.workspace_dir = "/Users/me/project".to_string();
        assert!(config.validate_upload().is_ok());
    }

    #[test]
    fn test_discover_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[target]\ncatalog = \"dev\"\n").unwrap();
        let config = Config::discover(Some(&path)).unwrap();
        assert_eq!(config.target.catalog, "dev");
    }
}
