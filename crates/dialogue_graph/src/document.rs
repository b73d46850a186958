// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON import/export of dialogue documents.
//!
//! A document is `{ "info": { ... }, "nodes": [ ... ] }`. Unknown keys in
//! `info` are preserved so an exported file round-trips unchanged.

use crate::graph::DialogueGraph;
use crate::node::{GraphNode, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Current document format version
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Document errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The JSON does not match the document shape
    #[error("Invalid dialogue document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two nodes share an id
    #[error("Duplicate node id: {0}")]
    DuplicateId(NodeId),

    /// The document was written by a newer format
    #[error("Unsupported document version {found} (newest supported is {supported})")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Document metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Dialogue title
    #[serde(default)]
    pub title: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Format version. Documents without one are read as the current version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: "Untitled Dialogue".to_string(),
            description: String::new(),
            version: Some(DOCUMENT_FORMAT_VERSION),
            extra: IndexMap::new(),
        }
    }
}

/// A dialogue as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueDocument {
    /// Metadata
    #[serde(default)]
    pub info: DocumentInfo,
    /// Canonical nodes
    pub nodes: Vec<GraphNode>,
}

impl DialogueDocument {
    /// Parse and check a document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(json)?;
        document.check()?;
        Ok(document)
    }

    /// Serialize as pretty JSON
    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let document = Self::from_json_str(&content)?;
        tracing::info!(
            "Loaded dialogue '{}' ({} nodes) from {:?}",
            document.info.title,
            document.nodes.len(),
            path
        );
        Ok(document)
    }

    /// Save the document to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_json_string_pretty()?;
        std::fs::write(path, content)?;
        tracing::info!("Saved dialogue '{}' to {:?}", self.info.title, path);
        Ok(())
    }

    /// Build the read-only graph index
    pub fn graph(&self) -> DialogueGraph {
        DialogueGraph::from_nodes(self.nodes.iter().cloned())
    }

    fn check(&self) -> Result<()> {
        if let Some(found) = self.info.version.filter(|v| *v > DOCUMENT_FORMAT_VERSION) {
            return Err(DocumentError::UnsupportedVersion {
                found,
                supported: DOCUMENT_FORMAT_VERSION,
            });
        }

        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(&node.id) {
                return Err(DocumentError::DuplicateId(node.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use serde_json::json;

    #[test]
    fn test_parse_document() {
        let json = json!({
            "info": {"title": "Tavern", "author": "mira", "version": 1},
            "nodes": [
                {"id": "a", "type": "statement", "text": "Hello", "next_node": "b"},
                {"id": "b", "type": "comment", "text": "todo"}
            ]
        })
        .to_string();

        let document = DialogueDocument::from_json_str(&json).unwrap();
        assert_eq!(document.info.title, "Tavern");
        assert_eq!(document.info.extra.get("author"), Some(&json!("mira")));
        assert_eq!(document.nodes[1].kind(), NodeKind::Comment);
    }

    #[test]
    fn test_export_round_trip() {
        let json = json!({
            "info": {"title": "Tavern", "author": "mira", "version": 1},
            "nodes": [
                {"id": "a", "type": "statement", "speaker": "", "mood": "", "text": "Hello", "next_node": ""}
            ]
        })
        .to_string();

        let document = DialogueDocument::from_json_str(&json).unwrap();
        let exported = document.to_json_string_pretty().unwrap();
        let again = DialogueDocument::from_json_str(&exported).unwrap();
        assert_eq!(again, document);
        let value: Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(value["info"]["author"], "mira");
    }

    #[test]
    fn test_export_keeps_missing_version_missing() {
        let json = json!({
            "info": {"title": "Tavern"},
            "nodes": []
        })
        .to_string();

        let document = DialogueDocument::from_json_str(&json).unwrap();
        assert_eq!(document.info.version, None);
        let value: Value = serde_json::from_str(&document.to_json_string_pretty().unwrap()).unwrap();
        assert_eq!(value["info"], json!({"title": "Tavern"}));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = json!({
            "info": {"title": "Dup"},
            "nodes": [
                {"id": "a", "type": "comment"},
                {"id": "a", "type": "comment"}
            ]
        })
        .to_string();

        match DialogueDocument::from_json_str(&json) {
            Err(DocumentError::DuplicateId(id)) => assert_eq!(id.as_str(), "a"),
            other => panic!("expected duplicate id error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let json = json!({
            "nodes": [{"id": "a", "type": "statement"}]
        })
        .to_string();
        assert!(matches!(
            DialogueDocument::from_json_str(&json),
            Err(DocumentError::Parse(_))
        ));
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = json!({"info": {"version": 99}, "nodes": []}).to_string();
        assert!(matches!(
            DialogueDocument::from_json_str(&json),
            Err(DocumentError::UnsupportedVersion { found: 99, .. })
        ));
    }
}
