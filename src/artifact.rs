//! Artifact emitter.
//!
//! Turns the three rendered blocks into the ordered content units a sink
//! persists: one unit per non-empty block, or a single empty unit when all
//! blocks are empty so a sink never writes a file or notebook with nothing in it.

use serde::Serialize;

use crate::classifier::StatementKind;
use crate::organizer::Blocks;

/// One persisted unit of SQL, e.g. one notebook cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentUnit {
    /// Kind of every statement in the unit; `None` for the placeholder unit.
    pub kind: Option<StatementKind>,
    pub source: String,
}

/// The ordered, never-empty output of one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    units: Vec<ContentUnit>,
}

impl Artifact {
    /// Content units in output order. Always at least one.
    pub fn units(&self) -> &[ContentUnit] {
        &self.units
    }

    /// Consume the artifact, returning its units.
    pub fn into_units(self) -> Vec<ContentUnit> {
        self.units
    }

    /// True when the artifact holds only the empty placeholder unit.
    pub fn is_blank(&self) -> bool {
        self.units.iter().all(|unit| unit.source.is_empty())
    }

    /// Render as one flat document: blocks separated by a blank line,
    /// followed by a single trailing newline.
    pub fn to_document(&self) -> String {
        let mut document = self
            .units
            .iter()
            .map(|unit| unit.source.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        document.push('\n');
        document
    }
}

/// Build the artifact from the three blocks.
pub fn emit(blocks: Blocks) -> Artifact {
    let Blocks {
        schema_definition,
        data_mutation,
        query,
    } = blocks;

    let units: Vec<ContentUnit> = [
        (StatementKind::SchemaDefinition, schema_definition),
        (StatementKind::DataMutation, data_mutation),
        (StatementKind::Query, query),
    ]
    .into_iter()
    .filter(|(_, source)| !source.is_empty())
    .map(|(kind, source)| ContentUnit {
        kind: Some(kind),
        source,
    })
    .collect();

    if units.is_empty() {
        return Artifact {
            units: vec![ContentUnit {
                kind: None,
                source: String::new(),
            }],
        };
    }

    Artifact { units }
}
