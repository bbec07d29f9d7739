//! # sqlcell
//!
//! Turns language-model SQL output into well-formed, ordered notebook cells
//! for code being migrated to a new data platform.
//!
//! ## Quick Example
//!
//! ```
//! let artifact = sqlcell::process(
//!     "```sql\nSELECT * FROM a;\nCREATE TABLE a (x INT);\n```",
//! );
//! assert_eq!(
//!     artifact.to_document(),
//!     "CREATE TABLE a (x INT);\n\nSELECT * FROM a;\n",
//! );
//! ```
//!
//! ## Stages
//!
//! | Stage      | Module         | Output                                 |
//! |------------|----------------|----------------------------------------|
//! | Normalize  | [`normalizer`] | plain SQL, no fences or preamble       |
//! | Segment    | [`segmenter`]  | ordered statements                     |
//! | Classify   | [`classifier`] | schema definition, data mutation, query |
//! | Organize   | [`organizer`]  | three blocks                           |
//! | Emit       | [`artifact`]   | ordered content units, never empty     |
//!
//! The stages are pure and never fail. The rest of the crate is the
//! migration pipeline around them: [`config`], the [`databricks`] CLI
//! wrapper, the [`completion`] client, the [`rewrite`] batch, the file
//! [`sink`]s and [`upload`].

pub mod artifact;
pub mod classifier;
pub mod completion;
pub mod config;
pub mod databricks;
pub mod error;
pub mod normalizer;
pub mod notebook;
pub mod organizer;
pub mod rewrite;
pub mod segmenter;
pub mod sink;
pub mod upload;

pub mod prelude {
    pub use crate::artifact::{emit, Artifact, ContentUnit};
    pub use crate::classifier::{classify, StatementKind};
    pub use crate::error::*;
    pub use crate::normalizer::normalize;
    pub use crate::notebook::Notebook;
    pub use crate::organizer::{organize, Blocks, Partition};
    pub use crate::segmenter::segment;
    pub use crate::process;
}

/// Run raw model output through every stage of the SQL core.
///
/// # Example
///
/// ```
/// let artifact = sqlcell::process("");
/// assert_eq!(artifact.units().len(), 1);
/// ```
pub fn process(raw: &str) -> artifact::Artifact {
    let text = normalizer::normalize(raw);
    artifact::emit(organizer::organize(segmenter::segment(&text)))
}
