//! # Stage: Manifest Store
//!
//! ## Responsibility
//! Persist each proposed change as a `tval/v1` `Proposal` document at
//! `<proposals_dir>/<action_id>.yaml`.
//!
//! ```yaml
//! apiVersion: tval/v1
//! kind: Proposal
//! metadata:
//!   id: 6f1c...
//!   target: payments
//! spec:
//!   param: MAX_CONCURRENCY
//!   proposed: 10
//! ```
//!
//! ## Guarantees
//! - One whole-document write per proposal, under a fresh v4 UUID
//! - A manifest whose justification record could not be written is removed
//!   again via [`ManifestStore::discard`]

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{write_artifact, ActionId};
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};

pub const API_VERSION: &str = "tval/v1";
pub const KIND_PROPOSAL: &str = "Proposal";

/// A decided change to one parameter of the target service.
///
/// Only built when `proposed != current`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub action_id: ActionId,
    pub target: String,
    pub param: String,
    pub current: u32,
    pub proposed: u32,
}

/// On-disk manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ManifestMetadata,
    pub spec: ManifestSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub id: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestSpec {
    pub param: String,
    pub proposed: u32,
}

impl ProposalManifest {
    pub fn new(action_id: ActionId, target: &str, param: &str, proposed: u32) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND_PROPOSAL.to_string(),
            metadata: ManifestMetadata { id: action_id.to_string(), target: target.to_string() },
            spec: ManifestSpec { param: param.to_string(), proposed },
        }
    }
}

/// Identifier and location of a written manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedManifest {
    pub action_id: ActionId,
    pub path: PathBuf,
}

/// Writes proposal manifests for one target service.
pub struct ManifestStore {
    dir: PathBuf,
    target: String,
}

impl ManifestStore {
    pub fn new(cfg: &AgentConfig) -> Self {
        Self { dir: cfg.proposals_dir.clone(), target: cfg.target_service.clone() }
    }

    /// Service the manifests are written for.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Generate a fresh action id and write the manifest for `param = proposed`.
    pub fn save(&self, param: &str, proposed: u32) -> Result<SavedManifest> {
        let action_id = Uuid::new_v4();
        let manifest = ProposalManifest::new(action_id, &self.target, param, proposed);
        let yaml = serde_yaml::to_string(&manifest).map_err(|e| AgentError::Encode {
            what: "proposal manifest".into(),
            detail: e.to_string(),
        })?;
        let path = write_artifact(&self.dir, &format!("{action_id}.yaml"), yaml.as_bytes())?;
        debug!(%action_id, path = %path.display(), "manifest written");
        Ok(SavedManifest { action_id, path })
    }

    /// Remove a manifest that will never be paired with a justification record.
    pub fn discard(&self, saved: &SavedManifest) {
        match std::fs::remove_file(&saved.path) {
            Ok(()) => debug!(action_id = %saved.action_id, "manifest discarded"),
            Err(e) => warn!(
                action_id = %saved.action_id,
                path = %saved.path.display(),
                error = %e,
                "could not discard unpaired manifest"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &std::path::Path) -> ManifestStore {
        ManifestStore::new(&AgentConfig { proposals_dir: dir.to_path_buf(), ..AgentConfig::default() })
    }

    #[test]
    fn save_writes_versioned_document_keyed_by_id() {
        let tmp = tempfile::tempdir().unwrap();
        let saved = store_in(tmp.path()).save("MAX_CONCURRENCY", 10).unwrap();

        assert_eq!(saved.path, tmp.path().join(format!("{}.yaml", saved.action_id)));
        let text = std::fs::read_to_string(&saved.path).unwrap();
        let doc: ProposalManifest = serde_yaml::from_str(&text).unwrap();
        assert_eq!(doc, ProposalManifest::new(saved.action_id, "payments", "MAX_CONCURRENCY", 10));
        assert!(text.contains("apiVersion: tval/v1"), "yaml: {text}");
        assert!(text.contains("kind: Proposal"), "yaml: {text}");
    }

    #[test]
    fn each_save_gets_a_fresh_id() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let a = store.save("MAX_CONCURRENCY", 10).unwrap();
        let b = store.save("MAX_CONCURRENCY", 10).unwrap();
        assert_ne!(a.action_id, b.action_id);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 2);
    }

    #[test]
    fn discard_removes_only_that_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let kept = store.save("MAX_CONCURRENCY", 10).unwrap();
        let dropped = store.save("MAX_CONCURRENCY", 12).unwrap();

        store.discard(&dropped);
        assert!(!dropped.path.exists());
        assert!(kept.path.exists());

        // already gone: logged, not fatal
        store.discard(&dropped);
    }

    #[test]
    fn creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("manifests").join("payments");
        let saved = store_in(&nested).save("MAX_CONCURRENCY", 4).unwrap();
        assert!(saved.path.exists());
    }

    #[test]
    fn unwritable_location_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let err = store_in(&blocker).save("MAX_CONCURRENCY", 4).unwrap_err();
        assert!(matches!(err, AgentError::Io { .. }), "got {err}");
    }

    #[test]
    fn manifest_json_field_names() {
        let id = Uuid::nil();
        let v = serde_json::to_value(ProposalManifest::new(id, "payments", "MAX_CONCURRENCY", 6)).unwrap();
        assert_eq!(v["apiVersion"], "tval/v1");
        assert_eq!(v["kind"], "Proposal");
        assert_eq!(v["metadata"]["id"], id.to_string());
        assert_eq!(v["metadata"]["target"], "payments");
        assert_eq!(v["spec"]["param"], "MAX_CONCURRENCY");
        assert_eq!(v["spec"]["proposed"], 6);
    }
}
