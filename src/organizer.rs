//! Block organizer.
//!
//! Partitions statements by [`StatementKind`] and renders each partition as
//! one block of text, statements separated by a blank line.

use crate::classifier::{classify, StatementKind};

/// Statements grouped by kind, each list in original appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub schema_definition: Vec<String>,
    pub data_mutation: Vec<String>,
    pub query: Vec<String>,
}

impl Partition {
    /// Classify and file every statement. Nothing is dropped or duplicated.
    pub fn from_statements<I, S>(statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut partition = Self::default();
        for statement in statements {
            let statement = statement.into();
            let kind = classify(&statement);
            partition.list_mut(kind).push(statement);
        }
        partition
    }

    /// The statements of one kind.
    pub fn list(&self, kind: StatementKind) -> &[String] {
        match kind {
            StatementKind::SchemaDefinition => &self.schema_definition,
            StatementKind::DataMutation => &self.data_mutation,
            StatementKind::Query => &self.query,
        }
    }

    fn list_mut(&mut self, kind: StatementKind) -> &mut Vec<String> {
        match kind {
            StatementKind::SchemaDefinition => &mut self.schema_definition,
            StatementKind::DataMutation => &mut self.data_mutation,
            StatementKind::Query => &mut self.query,
        }
    }

    /// Total number of statements across all kinds.
    pub fn len(&self) -> usize {
        self.schema_definition.len() + self.data_mutation.len() + self.query.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render each list as a block.
    pub fn render(&self) -> Blocks {
        Blocks {
            schema_definition: render_block(&self.schema_definition),
            data_mutation: render_block(&self.data_mutation),
            query: render_block(&self.query),
        }
    }
}

/// The three rendered blocks. Any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocks {
    pub schema_definition: String,
    pub data_mutation: String,
    pub query: String,
}

impl Blocks {
    /// The block for one kind.
    pub fn get(&self, kind: StatementKind) -> &str {
        match kind {
            StatementKind::SchemaDefinition => &self.schema_definition,
            StatementKind::DataMutation => &self.data_mutation,
            StatementKind::Query => &self.query,
        }
    }

    /// Blocks paired with their kind, in fixed output order.
    pub fn iter(&self) -> impl Iterator<Item = (StatementKind, &str)> {
        StatementKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// Classify, partition and render statements into three blocks.
pub fn organize<I, S>(statements: I) -> Blocks
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Partition::from_statements(statements).render()
}

fn render_block(statements: &[String]) -> String {
    statements
        .iter()
        .map(|s| s.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}
