//! Generated artifact model.
//!
//! Generators reply with a `code_blocks` envelope in one of two shapes:
//!
//! ```text
//! code mode:          {"code_blocks": [{"technology": "...", "code": "..."}]}
//! dependencies mode:  {"code_blocks": [{"technology": "...",
//!                                       "blocks": [{"filename": "...", "code": "..."}]}]}
//! ```
//!
//! Both normalize into [`Artifact`]s with one or more [`CodeBlock`]s.

use serde::{Deserialize, Serialize};

/// A single named code body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub code: String,
}

/// Code generated for one technology of a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub technology: String,
    pub blocks: Vec<CodeBlock>,
}

/// The output of one branch. Empty on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactSet(Vec<Artifact>);

impl ArtifactSet {
    /// The failure placeholder.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(artifacts: Vec<Artifact>) -> Self {
        Self(artifacts)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Artifact> {
        self.0.iter()
    }

    /// Parse a generator reply carrying a `code_blocks` array.
    pub fn from_code_blocks(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let envelope: CodeBlocksEnvelope = serde_json::from_value(value)?;
        Ok(Self(
            envelope.code_blocks.into_iter().map(Artifact::from).collect(),
        ))
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Deserialize)]
struct CodeBlocksEnvelope {
    code_blocks: Vec<RawArtifact>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArtifact {
    Blocks {
        technology: String,
        blocks: Vec<CodeBlock>,
    },
    Single {
        technology: String,
        code: String,
        #[serde(default)]
        filename: Option<String>,
    },
}

impl From<RawArtifact> for Artifact {
    fn from(raw: RawArtifact) -> Self {
        match raw {
            RawArtifact::Blocks { technology, blocks } => Self { technology, blocks },
            RawArtifact::Single {
                technology,
                code,
                filename,
            } => Self {
                technology,
                blocks: vec![CodeBlock { filename, code }],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_code_mode_reply() {
        let set = ArtifactSet::from_code_blocks(json!({
            "code_blocks": [
                {"technology": "React", "code": "export default App;"},
                {"technology": "Express", "code": "app.listen(3000);"}
            ]
        }))
        .unwrap();

        assert_eq!(set.len(), 2);
        let first = set.iter().next().unwrap();
        assert_eq!(first.technology, "React");
        assert_eq!(first.blocks.len(), 1);
        assert!(first.blocks[0].filename.is_none());
    }

    #[test]
    fn parses_dependencies_mode_reply() {
        let set = ArtifactSet::from_code_blocks(json!({
            "code_blocks": [{
                "technology": "Python, FastAPI",
                "blocks": [
                    {"filename": "requirements.txt", "code": "fastapi==0.111.0\n"}
                ]
            }]
        }))
        .unwrap();

        let artifact = set.iter().next().unwrap();
        assert_eq!(
            artifact.blocks[0].filename.as_deref(),
            Some("requirements.txt")
        );
    }

    #[test]
    fn rejects_missing_envelope() {
        assert!(ArtifactSet::from_code_blocks(json!({"files": []})).is_err());
        assert!(ArtifactSet::from_code_blocks(json!({"code_blocks": [{"code": "x"}]})).is_err());
    }

    #[test]
    fn empty_set_serializes_as_empty_array() {
        let json = serde_json::to_value(ArtifactSet::empty()).unwrap();
        assert_eq!(json, json!([]));
    }
}
