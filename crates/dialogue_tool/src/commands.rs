// SPDX-License-Identifier: MIT OR Apache-2.0
//! Batch commands: check, flow and normalize.

use dialogue_graph::{
    to_graph_detailed, to_renderable, validate, DialogueDocument, DocumentError, Flow,
    Reconstruction, ValidationReport,
};
use dialogue_preview::SettingsError;
use std::path::Path;

/// Error type for tool commands
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Document could not be read or written
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Preview settings could not be read
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// JSON output failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Terminal or runtime I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tool commands
pub type Result<T> = std::result::Result<T, ToolError>;

/// Validate a document file
pub fn check(path: &Path) -> Result<ValidationReport> {
    let document = DialogueDocument::load(path)?;
    Ok(validate(&document.graph()))
}

/// Render the flow view of a document file as JSON
pub fn flow(path: &Path, pretty: bool) -> Result<String> {
    let document = DialogueDocument::load(path)?;
    let flow = to_renderable(&document.nodes);
    let json = if pretty {
        serde_json::to_string_pretty(&flow)?
    } else {
        serde_json::to_string(&flow)?
    };
    Ok(json)
}

/// Push a document through the flow view and back
pub fn normalize_document(document: &DialogueDocument) -> (DialogueDocument, Reconstruction) {
    let Flow { nodes, edges } = to_renderable(&document.nodes);
    let reconstruction = to_graph_detailed(&nodes, &edges);
    let normalized = DialogueDocument {
        info: document.info.clone(),
        nodes: reconstruction.nodes.clone(),
    };
    (normalized, reconstruction)
}

/// Normalize a document file, writing to `output` or back in place
pub fn normalize(path: &Path, output: Option<&Path>) -> Result<Reconstruction> {
    let document = DialogueDocument::load(path)?;
    let (normalized, reconstruction) = normalize_document(&document);

    let target = output.unwrap_or(path);
    normalized.save(target)?;

    if normalized == document {
        tracing::info!("Document was already canonical");
    } else {
        tracing::info!("Rewrote pointers and choice indices");
    }
    Ok(reconstruction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogue_graph::{NodeBody, NodeKind};
    use serde_json::json;

    fn document() -> DialogueDocument {
        let json = json!({
            "info": {"title": "Gate"},
            "nodes": [
                {"id": "q", "type": "question", "text": "Open?", "choices": [
                    {"index": 4, "text": "Yes", "next_node": "open"},
                    {"index": 9, "text": "No", "next_node": ""}
                ]},
                {"id": "open", "type": "event", "event_name": "open_gate", "next_node": ""}
            ]
        });
        DialogueDocument::from_json_str(&json.to_string()).unwrap()
    }

    #[test]
    fn test_normalize_compacts_indices() {
        let (normalized, reconstruction) = normalize_document(&document());
        assert!(reconstruction.is_lossless());
        assert_eq!(normalized.info.title, "Gate");
        let NodeBody::Question(question) = &normalized.nodes[0].body else {
            panic!("expected question");
        };
        let indices: Vec<u32> = question.choices.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(question.choices[0].text, "Yes");
    }

    #[test]
    fn test_normalize_is_stable() {
        let (once, _) = normalize_document(&document());
        let (twice, _) = normalize_document(&once);
        assert_eq!(once, twice);
        assert_eq!(twice.nodes[1].kind(), NodeKind::Event);
    }
}
