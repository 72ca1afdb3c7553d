use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::SrcmapError;

// ── Node Types ──────────────────────────────────────────────────────────────

/// The closed set of semantic entities the extractors emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Function,
    Interface,
    Class,
    /// Outbound HTTP client call site.
    HttpCall,
    /// Shell / subprocess execution site.
    CmdExec,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function => write!(f, "FUNCTION"),
            Self::Interface => write!(f, "INTERFACE"),
            Self::Class => write!(f, "CLASS"),
            Self::HttpCall => write!(f, "HTTP_CALL"),
            Self::CmdExec => write!(f, "CMD_EXEC"),
        }
    }
}

impl std::str::FromStr for NodeType {
    type Err = SrcmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FUNCTION" => Ok(Self::Function),
            "INTERFACE" => Ok(Self::Interface),
            "CLASS" => Ok(Self::Class),
            "HTTP_CALL" => Ok(Self::HttpCall),
            "CMD_EXEC" => Ok(Self::CmdExec),
            _ => Err(SrcmapError::InvalidNodeType(s.to_string())),
        }
    }
}

// ── Code Node ───────────────────────────────────────────────────────────────

/// A semantic unit of code extracted from a source file.
///
/// Created by an extractor, inserted once into the repository, and mutated
/// only by the dependency resolver (which fills `dependencies` and drains
/// `unresolved_refs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeNode {
    /// Process-unique opaque id.
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Qualified name: `(Type).Method` for receiver methods, `Class.method`
    /// for class-bound methods, bare identifier for free functions.
    pub name: String,
    /// Tag of the extractor that produced the node ("go", "java", "python").
    pub language: String,
    pub file_path: String,
    /// 1-based line of the declaration or call site.
    pub line_number: usize,
    /// Declaration surface text, when the extractor captures one.
    #[serde(default)]
    pub signature: String,
    /// Comment blocks immediately above the declaration, nearest-first.
    #[serde(default)]
    pub comments: Vec<String>,
    /// Language-specific extras.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Resolved ids of nodes this node references. Empty until the resolver
    /// has run. Never contains the owning node's own id.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Symbolic call references pending resolution. Never serialized.
    #[serde(skip)]
    pub unresolved_refs: Vec<String>,
}

impl CodeNode {
    /// Create a node with a fresh v4 id and empty optional fields.
    pub fn new(
        node_type: NodeType,
        name: impl Into<String>,
        language: impl Into<String>,
        file_path: impl Into<String>,
        line_number: usize,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            node_type,
            name: name.into(),
            language: language.into(),
            file_path: file_path.into(),
            line_number,
            signature: String::new(),
            comments: Vec::new(),
            metadata: HashMap::new(),
            dependencies: Vec::new(),
            unresolved_refs: Vec::new(),
        }
    }
}

/// Lowercased extension of a recorded file path, including the leading dot;
/// empty when there is none. Filter sets and dispatch keys use this form.
pub fn file_extension(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_extension_is_dotted_and_lowercased() {
        assert_eq!(file_extension("src/Main.GO"), ".go");
        assert_eq!(file_extension("app.py"), ".py");
        assert_eq!(file_extension("Makefile"), "");
        assert_eq!(file_extension("dir.with.dots/file.java"), ".java");
    }

    #[test]
    fn node_type_roundtrip() {
        for nt in [
            NodeType::Function,
            NodeType::Interface,
            NodeType::Class,
            NodeType::HttpCall,
            NodeType::CmdExec,
        ] {
            let s = nt.to_string();
            let parsed: NodeType = s.parse().unwrap();
            assert_eq!(nt, parsed);
        }
    }

    #[test]
    fn node_type_wire_tags() {
        assert_eq!(
            serde_json::to_string(&NodeType::HttpCall).unwrap(),
            "\"HTTP_CALL\""
        );
        assert_eq!(
            serde_json::to_string(&NodeType::CmdExec).unwrap(),
            "\"CMD_EXEC\""
        );
        assert_eq!(
            serde_json::to_string(&NodeType::Function).unwrap(),
            "\"FUNCTION\""
        );
    }

    #[test]
    fn invalid_node_type_rejected() {
        let result: Result<NodeType, _> = "STRUCT".parse();
        assert!(result.is_err());
    }

    #[test]
    fn fresh_nodes_get_unique_ids() {
        let a = CodeNode::new(NodeType::Function, "a", "go", "a.go", 1);
        let b = CodeNode::new(NodeType::Function, "a", "go", "a.go", 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn unresolved_refs_never_serialized() {
        let mut node = CodeNode::new(NodeType::Function, "f", "go", "f.go", 3);
        node.unresolved_refs = vec!["g".to_string()];
        let value = serde_json::to_value(&node).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("unresolved_refs"));
        assert!(!obj.contains_key("unresolvedRefs"));
        for field in [
            "id",
            "type",
            "name",
            "language",
            "file_path",
            "line_number",
            "signature",
            "comments",
            "metadata",
            "dependencies",
        ] {
            assert!(obj.contains_key(field), "missing wire field {field}");
        }
    }

    #[test]
    fn deserialized_nodes_have_empty_refs() {
        let json = r#"{
            "id": "n1",
            "type": "CLASS",
            "name": "OrderService",
            "language": "java",
            "file_path": "svc/OrderService.java",
            "line_number": 4
        }"#;
        let node: CodeNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.node_type, NodeType::Class);
        assert!(node.unresolved_refs.is_empty());
        assert!(node.dependencies.is_empty());
        assert!(node.comments.is_empty());
    }
}
