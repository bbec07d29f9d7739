//! Wrapper around the external `databricks` command-line tool.
//!
//! Argument lists are built by pure functions so they can be checked
//! without the tool installed; [`DatabricksCli`] runs them.

use std::io::ErrorKind;
use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{AnalyzerConfig, DatabricksConfig, TargetConfig, TranspilerConfig};
use crate::error::{SqlcellError, SqlcellResult};

/// Workspace import format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Jupyter,
    Source,
}

impl ImportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportFormat::Jupyter => "JUPYTER",
            ImportFormat::Source => "SOURCE",
        }
    }
}

/// Notebook language for SOURCE imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Sql,
    Scala,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "PYTHON",
            Language::Sql => "SQL",
            Language::Scala => "SCALA",
        }
    }
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

pub fn analyze_args(analyzer: &AnalyzerConfig) -> Vec<String> {
    args([
        "labs",
        "lakebridge",
        "analyze",
        "--source-directory",
        &analyzer.source_directory,
        "--report-file",
        &analyzer.report_file,
        "--source-tech",
        &analyzer.source_tech,
    ])
}

pub fn transpile_args(transpiler: &TranspilerConfig, target: &TargetConfig) -> Vec<String> {
    args([
        "labs",
        "lakebridge",
        "transpile",
        "--input-source",
        &transpiler.input_source,
        "--output-folder",
        &transpiler.output_folder,
        "--error-file-path",
        &transpiler.error_file_path,
        "--catalog-name",
        &target.catalog,
        "--schema-name",
        &target.schema,
        "--skip-validation",
        if transpiler.skip_validation { "true" } else { "false" },
    ])
}

pub fn mkdirs_args(workspace_dir: &str) -> Vec<String> {
    args(["workspace", "mkdirs", workspace_dir])
}

/// `--language` is only passed for SOURCE imports.
pub fn import_args(
    workspace_path: &str,
    local_file: &Path,
    format: ImportFormat,
    language: Language,
) -> Vec<String> {
    let mut argv = args([
        "workspace",
        "import",
        workspace_path,
        "--file",
        &local_file.display().to_string(),
        "--format",
        format.as_str(),
        "--overwrite",
    ]);
    if format != ImportFormat::Jupyter {
        argv.extend(args(["--language", language.as_str()]));
    }
    argv
}

pub fn submit_run_args(json_file: &Path) -> Vec<String> {
    args(["runs", "submit", "--json-file", &json_file.display().to_string()])
}

/// Catalog names from `databricks catalogs list` output.
pub fn parse_catalogs(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.starts_with("---") && !line.trim().is_empty())
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Schema names from `databricks schemas list <catalog>` output, with the
/// `catalog.` prefix removed. The first line is a header.
pub fn parse_schemas(stdout: &str, catalog: &str) -> Vec<String> {
    let prefix = format!("{}.", catalog);
    stdout
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(|name| name.replace(&prefix, ""))
        .collect()
}

/// Warehouse ids from `databricks warehouses list` output.
pub fn parse_warehouses(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| {
            !line.starts_with("---") && !line.starts_with("ID ") && !line.trim().is_empty()
        })
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Handle to the `databricks` binary.
#[derive(Debug, Clone)]
pub struct DatabricksCli {
    binary: String,
    profile: Option<String>,
}

impl DatabricksCli {
    pub fn new(config: &DatabricksConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            profile: config.profile.clone(),
        }
    }

    fn command_line(&self, argv: &[String]) -> String {
        let mut parts = vec![self.binary.clone()];
        parts.extend(argv.iter().cloned());
        parts.join(" ")
    }

    /// Run with inherited stdio (progress is shown to the user).
    pub async fn run(&self, argv: &[String]) -> SqlcellResult<()> {
        let line = self.command_line(argv);
        info!(command = %line, "Running");
        let status = self
            .command(argv)
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;
        if !status.success() {
            return Err(SqlcellError::tool(line, status.to_string()));
        }
        Ok(())
    }

    /// Run and capture stdout.
    pub async fn output(&self, argv: &[String]) -> SqlcellResult<String> {
        let line = self.command_line(argv);
        debug!(command = %line, "Running");
        let output = self
            .command(argv)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SqlcellError::tool(line, stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn command(&self, argv: &[String]) -> Command {
        let mut command = Command::new(&self.binary);
        if let Some(profile) = &self.profile {
            command.arg("--profile").arg(profile);
        }
        command.args(argv);
        command
    }

    fn spawn_error(&self, e: std::io::Error) -> SqlcellError {
        if e.kind() == ErrorKind::NotFound {
            SqlcellError::ToolNotFound(self.binary.clone())
        } else {
            SqlcellError::Io(e)
        }
    }

    pub async fn analyze(&self, analyzer: &AnalyzerConfig) -> SqlcellResult<()> {
        self.run(&analyze_args(analyzer)).await?;
        info!(report = %analyzer.report_file, "Analyzer completed");
        Ok(())
    }

    pub async fn transpile(
        &self,
        transpiler: &TranspilerConfig,
        target: &TargetConfig,
    ) -> SqlcellResult<()> {
        self.run(&transpile_args(transpiler, target)).await?;
        info!(output = %transpiler.output_folder, "Transpiler completed");
        Ok(())
    }

    pub async fn list_catalogs(&self) -> SqlcellResult<Vec<String>> {
        let stdout = self.output(&args(["catalogs", "list"])).await?;
        Ok(parse_catalogs(&stdout))
    }

    pub async fn list_schemas(&self, catalog: &str) -> SqlcellResult<Vec<String>> {
        let stdout = self.output(&args(["schemas", "list", catalog])).await?;
        Ok(parse_schemas(&stdout, catalog))
    }

    pub async fn list_warehouses(&self) -> SqlcellResult<Vec<String>> {
        let stdout = self.output(&args(["warehouses", "list"])).await?;
        Ok(parse_warehouses(&stdout))
    }

    /// Check that the target catalog and schema exist in the workspace.
    pub async fn verify_target(&self, target: &TargetConfig) -> SqlcellResult<()> {
        let catalogs = self.list_catalogs().await?;
        check_listed("Catalog", &target.catalog, &catalogs)?;
        let schemas = self.list_schemas(&target.catalog).await?;
        check_listed("Schema", &target.schema, &schemas)
    }

    /// Check that a warehouse id exists. The default id `"1"` is not checked.
    pub async fn verify_warehouse(&self, warehouse: &str) -> SqlcellResult<()> {
        if warehouse == "1" {
            return Ok(());
        }
        let warehouses = self.list_warehouses().await?;
        check_listed("Warehouse", warehouse, &warehouses)
    }
}

fn check_listed(what: &str, name: &str, available: &[String]) -> SqlcellResult<()> {
    if available.iter().any(|a| a == name) {
        return Ok(());
    }
    let available = if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    };
    Err(SqlcellError::Config(format!(
        "{} '{}' not found. Available: {}",
        what, name, available
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_analyze_args() {
        let analyzer = AnalyzerConfig {
            source_directory: "./legacy".to_string(),
            report_file: "report.xlsx".to_string(),
            source_tech: "teradata".to_string(),
        };
        assert_eq!(
            analyze_args(&analyzer).join(" "),
            "labs lakebridge analyze --source-directory ./legacy --report-file report.xlsx --source-tech teradata"
        );
    }

    #[test]
    fn test_transpile_args() {
        let transpiler = TranspilerConfig {
            input_source: "./sql".to_string(),
            skip_validation: true,
            ..TranspilerConfig::default()
        };
        let target = TargetConfig {
            catalog: "main".to_string(),
            schema: "sales".to_string(),
        };
        let argv = transpile_args(&transpiler, &target);
        assert_eq!(&argv[..3], ["labs", "lakebridge", "transpile"]);
        assert!(argv.windows(2).any(|w| w == ["--catalog-name", "main"]));
        assert!(argv.windows(2).any(|w| w == ["--schema-name", "sales"]));
        assert_eq!(argv[argv.len() - 2..], ["--skip-validation", "true"]);
    }

    #[test]
    fn test_import_args_language_only_for_source() {
        let file = PathBuf::from("/tmp/a.ipynb");
        let argv = import_args("/Users/me/a", &file, ImportFormat::Jupyter, Language::Sql);
        assert!(!argv.contains(&"--language".to_string()));

        let file = PathBuf::from("/tmp/a.sql");
        let argv = import_args("/Users/me/a", &file, ImportFormat::Source, Language::Sql);
        assert_eq!(argv[argv.len() - 2..], ["--language", "SQL"]);
        assert!(argv.contains(&"--overwrite".to_string()));
    }

    #[test]
    fn test_parse_catalogs() {
        let stdout = "Name      Type\n--------  ----\nmain      MANAGED\n\nsamples   DELTASHARING\n";
        assert_eq!(parse_catalogs(stdout), vec!["Name", "main", "samples"]);
    }

    #[test]
    fn test_parse_schemas() {
        let stdout = "Full Name         Owner\nmain.default      me\nmain.sales        me\n\n";
        assert_eq!(parse_schemas(stdout, "main"), vec!["default", "sales"]);
    }

    #[test]
    fn test_parse_warehouses() {
        let stdout = "ID                Name    State\n0123456789abcde0  shared  RUNNING\n";
        assert_eq!(parse_warehouses(stdout), vec!["0123456789abcde0"]);
    }

    #[test]
    fn test_check_listed() {
        let available = vec!["main".to_string()];
        assert!(check_listed("Catalog", "main", &available).is_ok());
        let err = check_listed("Catalog", "dev", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Catalog 'dev' not found. Available: none"
        );
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let cli = DatabricksCli::new(&DatabricksConfig {
            binary: "sqlcell-no-such-binary".to_string(),
            profile: None,
        });
        let err = cli.list_catalogs().await.unwrap_err();
        assert!(matches!(err, SqlcellError::ToolNotFound(_)));
    }
}
