//! Jupyter notebook (nbformat v4) model.
//!
//! Only what a freshly built notebook needs: code cells with no outputs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::artifact::Artifact;

pub const NBFORMAT: u32 = 4;
pub const NBFORMAT_MINOR: u32 = 4;

/// A notebook document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

/// A notebook cell. Only code cells are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    pub execution_count: Option<u32>,
    pub metadata: Map<String, Value>,
    pub outputs: Vec<Value>,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Code,
}

impl Cell {
    /// A code cell that has never been run.
    pub fn code(source: impl Into<String>) -> Self {
        Self {
            cell_type: CellType::Code,
            execution_count: None,
            metadata: Map::new(),
            outputs: Vec::new(),
            source: source.into(),
        }
    }
}

impl Notebook {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: Map::new(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        }
    }

    /// Serialize as pretty-printed JSON, newline-terminated.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// One code cell per content unit. An artifact always has a unit, so the
/// notebook always has a cell.
impl From<&Artifact> for Notebook {
    fn from(artifact: &Artifact) -> Self {
        Notebook::new(
            artifact
                .units()
                .iter()
                .map(|unit| Cell::code(unit.source.clone()))
                .collect(),
        )
    }
}
