//! Upload of generated notebooks and SQL files into a workspace.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::UploadConfig;
use crate::databricks::{self, DatabricksCli, ImportFormat, Language};
use crate::error::{SqlcellError, SqlcellResult};

const SUPPORTED_EXTENSIONS: [&str; 3] = ["ipynb", "py", "sql"];

/// A local file and its path relative to the upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub local: PathBuf,
    pub relative: String,
}

/// One-off notebook run submitted after import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSpec {
    pub run_name: String,
    pub existing_cluster_id: String,
    pub timeout_seconds: u64,
    pub notebook_task: NotebookTask,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotebookTask {
    pub notebook_path: String,
    pub base_parameters: Map<String, Value>,
}

impl RunSpec {
    pub fn new(workspace_path: &str, cluster_id: &str) -> Self {
        let basename = workspace_path.rsplit('/').next().unwrap_or(workspace_path);
        Self {
            run_name: format!("adhoc_run:{}", basename),
            existing_cluster_id: cluster_id.to_string(),
            timeout_seconds: 3600,
            notebook_task: NotebookTask {
                notebook_path: workspace_path.to_string(),
                base_parameters: Map::new(),
            },
        }
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension(path).as_str())
}

/// Language to import a SOURCE file as. Unknown extensions default to SQL.
pub fn infer_language(path: &Path) -> Language {
    match extension(path).as_str() {
        "py" => Language::Python,
        "scala" | "sc" => Language::Scala,
        _ => Language::Sql,
    }
}

pub fn infer_format(path: &Path) -> ImportFormat {
    if extension(path) == "ipynb" {
        ImportFormat::Jupyter
    } else {
        ImportFormat::Source
    }
}

/// Workspace object path for a relative file path: extension dropped,
/// separators normalized to `/`.
pub fn workspace_object_path(workspace_dir: &str, relative: &str) -> String {
    let without_ext = match relative.rfind('.') {
        Some(dot) if !relative[dot..].contains(['/', '\\']) => &relative[..dot],
        _ => relative,
    };
    let unix = without_ext.replace('\\', "/");
    format!(
        "{}/{}",
        workspace_dir.trim_end_matches('/'),
        unix.trim_start_matches('/')
    )
}

/// Supported files under `source`: the file itself, or every supported
/// file below a directory, sorted by relative path.
pub fn collect_files(source: &Path) -> SqlcellResult<Vec<UploadItem>> {
    if !source.exists() {
        return Err(SqlcellError::Upload(format!(
            "Source not found: {}",
            source.display()
        )));
    }

    let mut items = Vec::new();
    if source.is_dir() {
        walk(source, source, &mut items)?;
        items.sort_by(|a, b| a.relative.cmp(&b.relative));
    } else if is_supported(source) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        items.push(UploadItem {
            local: source.to_path_buf(),
            relative: name,
        });
    }
    Ok(items)
}

fn walk(root: &Path, dir: &Path, items: &mut Vec<UploadItem>) -> SqlcellResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(root, &path, items)?;
        } else if is_supported(&path) {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            items.push(UploadItem {
                local: path,
                relative,
            });
        }
    }
    Ok(())
}

/// Import every supported file, submitting runs for notebooks when a
/// cluster is configured. Returns the workspace paths in import order.
pub async fn upload(cli: &DatabricksCli, config: &UploadConfig) -> SqlcellResult<Vec<String>> {
    if config.workspace_dir.trim().is_empty() {
        return Err(SqlcellError::Config(
            "Destination workspace directory is required".to_string(),
        ));
    }

    let items = collect_files(&config.source_path)?;
    if items.is_empty() {
        return Err(SqlcellError::Upload(
            "No supported files found to upload (.ipynb, .py, .sql)".to_string(),
        ));
    }

    let cluster_id = config.effective_cluster_id();
    let mut imported = Vec::with_capacity(items.len());
    for item in &items {
        let workspace_path = workspace_object_path(&config.workspace_dir, &item.relative);
        import(cli, &item.local, &workspace_path).await?;

        let runnable = matches!(extension(&item.local).as_str(), "ipynb" | "py");
        if let (true, Some(cluster_id)) = (runnable, cluster_id.as_deref()) {
            submit_run(cli, &workspace_path, cluster_id).await?;
        }
        imported.push(workspace_path);
    }
    Ok(imported)
}

async fn import(cli: &DatabricksCli, local: &Path, workspace_path: &str) -> SqlcellResult<()> {
    if let Some((parent, _)) = workspace_path.rsplit_once('/') {
        if !parent.is_empty() {
            cli.run(&databricks::mkdirs_args(parent)).await?;
        }
    }

    let local = std::path::absolute(local)?;
    cli.run(&databricks::import_args(
        workspace_path,
        &local,
        infer_format(&local),
        infer_language(&local),
    ))
    .await?;
    info!(path = %workspace_path, "Imported to workspace");
    Ok(())
}

async fn submit_run(cli: &DatabricksCli, workspace_path: &str, cluster_id: &str) -> SqlcellResult<()> {
    let spec = RunSpec::new(workspace_path, cluster_id);
    let json_file = std::env::temp_dir().join(format!(
        "sqlcell-run-{}-{}.json",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    std::fs::write(&json_file, serde_json::to_string(&spec)?)?;

    let result = cli.run(&databricks::submit_run_args(&json_file)).await;
    if let Err(e) = std::fs::remove_file(&json_file) {
        warn!(path = %json_file.display(), error = %e, "Failed to remove run spec");
    }
    result?;
    info!(path = %workspace_path, "Triggered run");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_object_path() {
        assert_eq!(
            workspace_object_path("/Users/me/project/", "modified_a_20250101_000000.ipynb"),
            "/Users/me/project/modified_a_20250101_000000"
        );
        assert_eq!(
            workspace_object_path("/Users/me/project", "sub\\dir\\b.sql"),
            "/Users/me/project/sub/dir/b"
        );
        assert_eq!(
            workspace_object_path("/Shared", "/nested/c.py"),
            "/Shared/nested/c"
        );
        assert_eq!(workspace_object_path("/Shared", "v1.2/README"), "/Shared/v1.2/README");
    }

    #[test]
    fn test_infer_language_and_format() {
        assert_eq!(infer_language(Path::new("a.py")), Language::Python);
        assert_eq!(infer_language(Path::new("a.SQL")), Language::Sql);
        assert_eq!(infer_language(Path::new("a.sc")), Language::Scala);
        assert_eq!(infer_language(Path::new("a.ipynb")), Language::Sql);
        assert_eq!(infer_format(Path::new("a.ipynb")), ImportFormat::Jupyter);
        assert_eq!(infer_format(Path::new("a.sql")), ImportFormat::Source);
    }

    #[test]
    fn test_run_spec_json() {
        let spec = RunSpec::new("/Users/me/project/nb", "0101-abc");
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            serde_json::json!({
                "run_name": "adhoc_run:nb",
                "existing_cluster_id": "0101-abc",
                "timeout_seconds": 3600,
                "notebook_task": {
                    "notebook_path": "/Users/me/project/nb",
                    "base_parameters": {}
                }
            })
        );
    }

    #[test]
    fn test_collect_files_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("a.ipynb"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        std::fs::write(dir.path().join("nested").join("c.py"), "print(1)").unwrap();

        let relative: Vec<String> = collect_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|item| item.relative.replace('\\', "/"))
            .collect();
        assert_eq!(relative, vec!["a.ipynb", "b.sql", "nested/c.py"]);
    }

    #[test]
    fn test_collect_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.sql");
        std::fs::write(&file, "SELECT 1;").unwrap();
        let items = collect_files(&file).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].relative, "only.sql");

        let txt = dir.path().join("only.txt");
        std::fs::write(&txt, "x").unwrap();
        assert!(collect_files(&txt).unwrap().is_empty());
    }

    #[test]
    fn test_collect_missing_source() {
        let err = collect_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, SqlcellError::Upload(_)));
    }
}
