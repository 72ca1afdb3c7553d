//! Java extractor: line-oriented scan with brace-counted method bodies.
//!
//! Regex heuristics only; a syntactically complete parse is not required.

use std::collections::BTreeSet;

use regex::Regex;
use srcmap_core::{CodeNode, NodeType, SrcmapError};

use crate::extractor::LanguageExtractor;

/// Receiver identifiers that are standard-library noise, not project calls.
const JAVA_BUILTINS: &[&str] = &[
    "System",
    "String",
    "Integer",
    "Long",
    "Double",
    "Float",
    "Boolean",
    "List",
    "Map",
    "Set",
    "Arrays",
    "Collections",
    "Optional",
    "Stream",
    "Objects",
    "Math",
];

/// Brace-counted line extractor for Java sources.
pub struct JavaExtractor {
    re_class: Regex,
    re_method: Regex,
    re_http: Regex,
    re_method_call: Regex,
}

struct MethodBody {
    node_idx: usize,
    lines: Vec<String>,
    depth: i32,
}

impl JavaExtractor {
    pub fn new() -> Self {
        Self {
            re_class: Regex::new(r"(public|protected|private)?\s*(class|interface)\s+(\w+)")
                .expect("class regex"),
            re_method: Regex::new(r"(public|protected|private)\s+[\w<>]+\s+(\w+)\s*\(.*\)")
                .expect("method regex"),
            re_http: Regex::new(r"(RestTemplate|WebClient|HttpClient|MockMvc)")
                .expect("http regex"),
            re_method_call: Regex::new(r"(\w+)\.(\w+)\s*\(").expect("call regex"),
        }
    }
}

impl Default for JavaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for JavaExtractor {
    fn language(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".java"]
    }

    fn scan(&self, file_path: &str, content: &[u8]) -> Result<Vec<CodeNode>, SrcmapError> {
        let text = String::from_utf8_lossy(content);
        let mut nodes: Vec<CodeNode> = Vec::new();

        let mut current_class: Option<String> = None;
        let mut comments: Vec<String> = Vec::new();
        let mut body: Option<MethodBody> = None;

        for (idx, line) in text.lines().enumerate() {
            let line_number = idx + 1;
            let trimmed = line.trim();

            if trimmed.starts_with("//") || trimmed.starts_with('*') || trimmed.starts_with("/*") {
                comments.push(trimmed.to_string());
                continue;
            }

            if let Some(caps) = self.re_class.captures(line) {
                let node_type = if &caps[2] == "interface" {
                    NodeType::Interface
                } else {
                    NodeType::Class
                };
                let name = caps[3].to_string();
                current_class = Some(name.clone());
                let mut node =
                    CodeNode::new(node_type, name, "java", file_path, line_number);
                node.comments = take_reversed(&mut comments);
                node.signature = trimmed.to_string();
                if let Some(vis) = caps.get(1) {
                    node.metadata.insert(
                        "visibility".to_string(),
                        serde_json::Value::String(vis.as_str().to_string()),
                    );
                }
                nodes.push(node);
                continue;
            }

            if let Some(caps) = self.re_method.captures(line) {
                let method_name = caps[2].to_string();
                let full_name = match &current_class {
                    Some(class) => format!("{class}.{method_name}"),
                    None => method_name,
                };
                let mut node =
                    CodeNode::new(NodeType::Function, full_name, "java", file_path, line_number);
                node.comments = take_reversed(&mut comments);
                node.signature = trimmed.to_string();
                node.metadata.insert(
                    "visibility".to_string(),
                    serde_json::Value::String(caps[1].to_string()),
                );
                let node_idx = nodes.len();
                nodes.push(node);

                // Abstract and interface methods carry no body on this line;
                // only a net-positive brace delta opens one.
                let depth = brace_delta(line);
                if depth > 0 {
                    body = Some(MethodBody {
                        node_idx,
                        lines: vec![line.to_string()],
                        depth,
                    });
                }
                continue;
            }

            if let Some(tracked) = body.as_mut() {
                tracked.lines.push(line.to_string());
                tracked.depth += brace_delta(line);
                if tracked.depth <= 0 {
                    nodes[tracked.node_idx].unresolved_refs =
                        self.extract_call_refs(&tracked.lines);
                    body = None;
                }
                continue;
            }

            if let Some(caps) = self.re_http.captures(line) {
                nodes.push(CodeNode::new(
                    NodeType::HttpCall,
                    caps[1].to_string(),
                    "java",
                    file_path,
                    line_number,
                ));
            }

            // Annotations keep the pending comment chain alive.
            if !trimmed.is_empty() && !trimmed.starts_with('@') {
                comments.clear();
            }
        }

        Ok(nodes)
    }
}

impl JavaExtractor {
    fn extract_call_refs(&self, lines: &[String]) -> Vec<String> {
        let mut refs = BTreeSet::new();
        for line in lines {
            for caps in self.re_method_call.captures_iter(line) {
                let obj = &caps[1];
                let method = &caps[2];
                if !JAVA_BUILTINS.contains(&obj) {
                    refs.insert(format!("{obj}.{method}"));
                    refs.insert(method.to_string());
                }
            }
        }
        refs.into_iter().collect()
    }
}

fn brace_delta(line: &str) -> i32 {
    let opens = line.matches('{').count() as i32;
    let closes = line.matches('}').count() as i32;
    opens - closes
}

/// Hand the pending comment buffer over, nearest line first.
fn take_reversed(comments: &mut Vec<String>) -> Vec<String> {
    let mut out = std::mem::take(comments);
    out.reverse();
    out
}
