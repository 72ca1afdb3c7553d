//! Go extractor using tree-sitter-go.
//!
//! Two-phase walk: declarations and HTTP call sites first, then call
//! references inside each function body for cross-file resolution.

use std::collections::BTreeSet;

use srcmap_core::{CodeNode, NodeType, SrcmapError};
use tree_sitter::{Node, Parser};

use crate::extractor::LanguageExtractor;

/// Structured-AST extractor for Go sources.
pub struct GoExtractor;

impl GoExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for GoExtractor {
    fn language(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".go"]
    }

    fn scan(&self, file_path: &str, content: &[u8]) -> Result<Vec<CodeNode>, SrcmapError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| SrcmapError::Parse(e.to_string()))?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| SrcmapError::Parse(format!("failed to parse {file_path}")))?;

        let groups = collect_comment_groups(tree.root_node(), content);

        // Phase 1: declarations, interfaces, HTTP call sites.
        let mut nodes = Vec::new();
        let mut bodies = Vec::new();
        collect_declarations(
            tree.root_node(),
            content,
            file_path,
            &groups,
            &mut nodes,
            &mut bodies,
        );

        // Phase 2: call references inside each collected body.
        for (idx, body) in bodies {
            nodes[idx].unresolved_refs = extract_call_refs(body, content);
        }

        Ok(nodes)
    }
}

// ── Declaration Extraction ────────────────────────────────────────────────

fn collect_declarations<'a>(
    node: Node<'a>,
    source: &[u8],
    file_path: &str,
    groups: &[CommentGroup],
    nodes: &mut Vec<CodeNode>,
    bodies: &mut Vec<(usize, Node<'a>)>,
) {
    match node.kind() {
        "function_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = node_text(name_node, source);
                let code = declaration_node(node, NodeType::Function, name, file_path, groups, source);
                push_with_body(node, code, nodes, bodies);
            }
        }
        "method_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let method = node_text(name_node, source);
                let receiver = receiver_type(node, source);
                let name = match &receiver {
                    Some(recv) => format!("({recv}).{method}"),
                    None => method,
                };
                let mut code =
                    declaration_node(node, NodeType::Function, name, file_path, groups, source);
                if let Some(recv) = receiver {
                    code.metadata
                        .insert("receiver".to_string(), serde_json::Value::String(recv));
                }
                push_with_body(node, code, nodes, bodies);
            }
        }
        "type_declaration" => {
            extract_interfaces(node, source, file_path, groups, nodes);
        }
        "call_expression" => {
            if let Some(http) = parse_http_call(node, source, file_path) {
                nodes.push(http);
            }
        }
        _ => {}
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_declarations(child, source, file_path, groups, nodes, bodies);
        }
    }
}

fn declaration_node(
    node: Node,
    node_type: NodeType,
    name: String,
    file_path: &str,
    groups: &[CommentGroup],
    source: &[u8],
) -> CodeNode {
    let line = node.start_position().row + 1;
    let mut code = CodeNode::new(node_type, name, "go", file_path, line);
    code.comments = attach_comments(groups, line);
    code.signature = declaration_signature(node, source);
    code
}

fn push_with_body<'a>(
    node: Node<'a>,
    code: CodeNode,
    nodes: &mut Vec<CodeNode>,
    bodies: &mut Vec<(usize, Node<'a>)>,
) {
    let idx = nodes.len();
    nodes.push(code);
    if let Some(body) = node.child_by_field_name("body") {
        bodies.push((idx, body));
    }
}

fn extract_interfaces(
    decl: Node,
    source: &[u8],
    file_path: &str,
    groups: &[CommentGroup],
    nodes: &mut Vec<CodeNode>,
) {
    for i in 0..decl.child_count() {
        if let Some(spec) = decl.child(i) {
            if spec.kind() != "type_spec" {
                continue;
            }
            let name_node = match spec.child_by_field_name("name") {
                Some(n) => n,
                None => continue,
            };
            let type_node = match spec.child_by_field_name("type") {
                Some(n) => n,
                None => continue,
            };
            if type_node.kind() != "interface_type" {
                continue;
            }
            let name = node_text(name_node, source);
            let line = spec.start_position().row + 1;
            let mut code = CodeNode::new(NodeType::Interface, name.clone(), "go", file_path, line);
            code.comments = attach_comments(groups, line);
            let type_text = node_text(type_node, source);
            let first_line = type_text.lines().next().unwrap_or("").trim();
            code.signature = format!("type {name} {first_line}").trim().to_string();
            nodes.push(code);
        }
    }
}

/// Receiver type name, dereferencing one level of pointer wrapping:
/// `(h *Handler)` and `(h Handler)` both yield `Handler`.
fn receiver_type(node: Node, source: &[u8]) -> Option<String> {
    let receiver = node.child_by_field_name("receiver")?;
    for i in 0..receiver.child_count() {
        if let Some(child) = receiver.child(i) {
            if child.kind() == "parameter_declaration" {
                if let Some(type_node) = child.child_by_field_name("type") {
                    let type_text = node_text(type_node, source);
                    let clean = type_text.strip_prefix('*').unwrap_or(&type_text);
                    return Some(clean.to_string());
                }
            }
        }
    }
    None
}

fn parse_http_call(call: Node, source: &[u8], file_path: &str) -> Option<CodeNode> {
    let fun = call.child_by_field_name("function")?;
    if fun.kind() != "selector_expression" {
        return None;
    }
    let operand = fun.child_by_field_name("operand")?;
    if operand.kind() != "identifier" || node_text(operand, source) != "http" {
        return None;
    }
    let method = node_text(fun.child_by_field_name("field")?, source);
    if !matches!(method.as_str(), "Get" | "Post" | "NewRequest") {
        return None;
    }
    Some(CodeNode::new(
        NodeType::HttpCall,
        format!("http.{method}"),
        "go",
        file_path,
        call.start_position().row + 1,
    ))
}

fn declaration_signature(node: Node, source: &[u8]) -> String {
    let text = node_text(node, source);
    if let Some(pos) = text.find('{') {
        text[..pos].trim().to_string()
    } else {
        text.lines().next().unwrap_or(&text).trim().to_string()
    }
}

// ── Reference Extraction ──────────────────────────────────────────────────

fn extract_call_refs(body: Node, source: &[u8]) -> Vec<String> {
    let mut refs = BTreeSet::new();
    walk_calls(body, source, &mut refs);
    refs.into_iter().collect()
}

fn walk_calls(node: Node, source: &[u8], refs: &mut BTreeSet<String>) {
    if node.kind() == "call_expression" {
        if let Some(fun) = node.child_by_field_name("function") {
            let reference = match fun.kind() {
                "identifier" => node_text(fun, source),
                "selector_expression" => selector_to_string(fun, source),
                _ => String::new(),
            };
            if !reference.is_empty() {
                refs.insert(reference);
            }
        }
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            walk_calls(child, source, refs);
        }
    }
}

/// Flatten a selector chain to its dotted path, e.g. `h.service.GetNodes`.
/// A non-identifier leftmost expression yields the partial suffix collected
/// so far (`foo().Bar` -> `Bar`).
fn selector_to_string(sel: Node, source: &[u8]) -> String {
    let mut parts = Vec::new();
    let mut current = sel;
    loop {
        match current.kind() {
            "selector_expression" => {
                if let Some(field) = current.child_by_field_name("field") {
                    parts.push(node_text(field, source));
                }
                match current.child_by_field_name("operand") {
                    Some(operand) => current = operand,
                    None => break,
                }
            }
            "identifier" => {
                parts.push(node_text(current, source));
                break;
            }
            _ => break,
        }
    }
    parts.reverse();
    parts.join(".")
}

// ── Comment Attachment ────────────────────────────────────────────────────

/// A contiguous comment block with 1-based line bounds and cleaned text.
struct CommentGroup {
    start_line: usize,
    end_line: usize,
    text: String,
    line_kind: bool,
}

/// Collect comment groups in source order. Consecutive `//` comments on
/// adjacent lines merge into one group; each block comment stands alone.
fn collect_comment_groups(root: Node, source: &[u8]) -> Vec<CommentGroup> {
    let mut comment_nodes = Vec::new();
    gather_comments(root, &mut comment_nodes);

    let mut groups: Vec<CommentGroup> = Vec::new();
    for comment in comment_nodes {
        let start_line = comment.start_position().row + 1;
        let end_line = comment.end_position().row + 1;
        let raw = node_text(comment, source);
        let line_kind = raw.starts_with("//");

        if line_kind {
            if let Some(last) = groups.last_mut() {
                if last.line_kind && last.end_line + 1 == start_line {
                    last.end_line = end_line;
                    last.text.push('\n');
                    last.text.push_str(&strip_line_marker(&raw));
                    continue;
                }
            }
        }

        let text = if line_kind {
            strip_line_marker(&raw)
        } else {
            clean_block_comment(&raw)
        };
        groups.push(CommentGroup {
            start_line,
            end_line,
            text,
            line_kind,
        });
    }
    groups
}

fn gather_comments<'a>(node: Node<'a>, out: &mut Vec<Node<'a>>) {
    if node.kind() == "comment" {
        out.push(node);
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            gather_comments(child, out);
        }
    }
}

fn strip_line_marker(raw: &str) -> String {
    raw.strip_prefix("// ")
        .or_else(|| raw.strip_prefix("//"))
        .unwrap_or(raw)
        .trim_end()
        .to_string()
}

fn clean_block_comment(raw: &str) -> String {
    let inner = raw.strip_prefix("/*").unwrap_or(raw);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);
    let lines: Vec<String> = inner
        .lines()
        .map(|l| {
            let t = l.trim();
            t.strip_prefix("* ")
                .or_else(|| t.strip_prefix('*'))
                .unwrap_or(t)
                .trim()
                .to_string()
        })
        .collect();
    lines.join("\n").trim().to_string()
}

/// Walk upward from the declaration line, collecting the group ending on the
/// line directly above, then the group above that one, stopping at the first
/// gap. Nearest group lands at index 0.
fn attach_comments(groups: &[CommentGroup], decl_line: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut target = decl_line.saturating_sub(1);
    while target > 0 {
        match groups.iter().find(|g| g.end_line == target) {
            Some(group) => {
                out.push(group.text.clone());
                target = group.start_line.saturating_sub(1);
            }
            None => break,
        }
    }
    out
}

fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}
