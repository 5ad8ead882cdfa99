//! # Module: audit
//!
//! Write-side of the control loop: every proposed change leaves a manifest
//! and a justification record on disk, keyed by the same action identifier.
//! Records are written once and never mutated or deleted by the agent.
//!
//! ## Sub-modules
//! - [`manifest`]: versioned YAML proposal documents
//! - [`schema`]: advisory JSON-schema validation of justification records
//! - [`justification`]: the append-only audit trail
//! - [`trust_index`]: aggregate policy pass rate over the audit trail

pub mod justification;
pub mod manifest;
pub mod schema;
pub mod trust_index;

use std::path::Path;

use uuid::Uuid;

use crate::error::{AgentError, Result};

pub use justification::{JustificationLog, JustificationRecord, EXPLAIN, HUMAN_REVIEW_REQUIRED};
pub use manifest::{ManifestStore, Proposal, ProposalManifest, SavedManifest};
pub use schema::{load_validator, JsonSchemaValidator, NoopValidator, SchemaValidator, Validation};
pub use trust_index::{TrustIndexCalculator, TrustIndexSummary, TrustReport};

/// Opaque identifier shared by a manifest and its justification record.
pub type ActionId = Uuid;

/// Write `contents` to `dir/file_name`, creating `dir` if needed.
pub(crate) fn write_artifact(dir: &Path, file_name: &str, contents: &[u8]) -> Result<std::path::PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| AgentError::io(dir, e))?;
    let path = dir.join(file_name);
    std::fs::write(&path, contents).map_err(|e| AgentError::io(&path, e))?;
    Ok(path)
}
