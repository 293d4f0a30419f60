//! Pipeline definition builder
//!
//! Derives the data-movement job topology for an entity kind from its static
//! descriptor: blob source location, column structure, and staging sink
//! table. Pure lookup and construct; unknown entity kinds are unrepresentable
//! because [`EntityKind`] is a closed enum.

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;

/// One column of the job's source structure, as validated by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Specification for one data-movement job: copy a named blob payload into a
/// staging table. Built fresh per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Job name registered with the pipeline runner.
    pub name: String,
    /// Blob file the job reads from.
    pub source_location: String,
    /// Exact source structure, reproduced for downstream schema validation.
    pub source_columns: Vec<SourceColumn>,
    /// Staging table the job writes to.
    pub sink_table: String,
}

/// Build the job spec for an entity kind.
pub fn build_job_spec(kind: EntityKind) -> JobSpec {
    let descriptor = kind.descriptor();

    JobSpec {
        name: descriptor.job_name.to_string(),
        source_location: descriptor.blob_file.to_string(),
        source_columns: descriptor
            .source_columns
            .iter()
            .map(|c| SourceColumn {
                name: c.name.to_string(),
                column_type: c.ty.as_str().to_string(),
            })
            .collect(),
        sink_table: descriptor.staging_table.to_string(),
    }
}
