//! JSON dataset fixtures.
//!
//! A dataset is an ordered list of revisions replayed into an in-memory
//! repository:
//!
//! ```json
//! {
//!   "head": "main",
//!   "revisions": [
//!     {
//!       "branch": "main",
//!       "tag": "v1",
//!       "message": "initial roads",
//!       "types": [{"name": "roads", "attributes": [{"name": "name", "kind": "string"}]}],
//!       "put": [{"type": "roads", "id": "A", "values": ["Main"]}],
//!       "remove": [{"type": "roads", "id": "B"}]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use vsq_repo::InMemoryRepository;
use vsq_types::{FeatureType, Value};

#[derive(Debug, Deserialize)]
pub struct Dataset {
    /// Branch HEAD points at after loading.
    #[serde(default = "default_branch")]
    pub head: String,
    pub revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
pub struct Revision {
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Feature types added or replaced by this revision.
    #[serde(default)]
    pub types: Vec<FeatureType>,
    /// Feature types dropped by this revision.
    #[serde(default)]
    pub drop_types: Vec<String>,
    #[serde(default)]
    pub put: Vec<FeaturePut>,
    #[serde(default)]
    pub remove: Vec<FeatureKey>,
}

#[derive(Debug, Deserialize)]
pub struct FeaturePut {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct FeatureKey {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
}

fn default_branch() -> String {
    "main".into()
}

impl Dataset {
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("invalid dataset")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Replay every revision into a fresh repository.
    pub fn build(&self) -> anyhow::Result<Arc<InMemoryRepository>> {
        let repo = Arc::new(InMemoryRepository::new());
        for (n, revision) in self.revisions.iter().enumerate() {
            let mut builder = repo.builder(&revision.branch)?;
            for schema in &revision.types {
                builder.put_type(schema.clone())?;
            }
            for name in &revision.drop_types {
                builder.remove_type(name);
            }
            for put in &revision.put {
                builder
                    .put_feature(&put.type_name, &put.id, put.values.clone())
                    .with_context(|| format!("revision {n}: cannot put {}/{}", put.type_name, put.id))?;
            }
            for key in &revision.remove {
                if !builder.remove_feature(&key.type_name, &key.id) {
                    tracing::debug!(revision = n, type_name = %key.type_name, id = %key.id, "nothing to remove");
                }
            }
            let commit = builder.commit(&revision.message)?;
            if let Some(tag) = &revision.tag {
                repo.tag(tag, commit)?;
            }
            tracing::debug!(revision = n, branch = %revision.branch, commit = %commit.short_hex(), "loaded revision");
        }
        repo.set_head(&self.head)?;
        Ok(repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsq_repo::{Repository, RevSpec};

    const ROADS: &str = r#"{
        "revisions": [
            {
                "tag": "r1",
                "types": [{
                    "name": "roads",
                    "attributes": [
                        {"name": "name", "kind": "string"},
                        {"name": "geom", "kind": "geometry"}
                    ],
                    "default_geometry": "geom"
                }],
                "put": [
                    {"type": "roads", "id": "A", "values": ["Main", {"Point": {"x": 0.0, "y": 0.0}}]},
                    {"type": "roads", "id": "B", "values": ["Oak", {"Point": {"x": 5.0, "y": 5.0}}]}
                ]
            },
            {
                "message": "drop B",
                "remove": [{"type": "roads", "id": "B"}]
            }
        ]
    }"#;

    #[test]
    fn replays_revisions() {
        let repo = Dataset::from_json(ROADS).unwrap().build().unwrap();
        let head = repo.resolve_tree(&RevSpec::head("roads")).unwrap().unwrap();
        assert_eq!(head.size(), 1);
        let r1 = repo.resolve_tree(&RevSpec::new("r1", "roads")).unwrap().unwrap();
        assert_eq!(r1.size(), 2);
        assert_eq!(repo.head(), "refs/heads/main");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let json = r#"{"revisions": [{"put": [{"type": "rivers", "id": "x", "values": []}]}]}"#;
        assert!(Dataset::from_json(json).unwrap().build().is_err());
    }
}
