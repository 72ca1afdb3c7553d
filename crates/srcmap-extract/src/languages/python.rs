//! Python extractor: line-oriented scan with indentation-scoped function
//! bodies.

use std::collections::BTreeSet;

use regex::Regex;
use srcmap_core::{CodeNode, NodeType, SrcmapError};

use crate::extractor::LanguageExtractor;

const PYTHON_BUILTINS: &[&str] = &[
    "print",
    "len",
    "range",
    "str",
    "int",
    "float",
    "list",
    "dict",
    "set",
    "tuple",
    "bool",
    "type",
    "isinstance",
    "hasattr",
    "getattr",
    "setattr",
    "open",
    "super",
    "enumerate",
    "zip",
    "map",
    "filter",
    "sorted",
    "reversed",
    "any",
    "all",
    "min",
    "max",
    "sum",
    "abs",
    "round",
];

/// Keywords that tokenize like calls (`if(...)`, `while(...)`).
const PYTHON_KEYWORDS: &[&str] = &[
    "if", "else", "elif", "for", "while", "return", "def", "class", "import", "from", "try",
    "except", "finally", "with", "as", "raise", "pass", "break", "continue",
];

/// Indentation-scoped line extractor for Python sources.
pub struct PythonExtractor {
    re_def: Regex,
    re_class: Regex,
    re_http: Regex,
    re_cmd: Regex,
    re_method_call: Regex,
    re_func_call: Regex,
}

impl PythonExtractor {
    pub fn new() -> Self {
        Self {
            re_def: Regex::new(r"^def\s+(\w+)").expect("def regex"),
            re_class: Regex::new(r"^class\s+(\w+)").expect("class regex"),
            re_http: Regex::new(r"(requests\.(get|post|put|delete|patch)|urllib|httpx)")
                .expect("http regex"),
            re_cmd: Regex::new(r"(subprocess\.run|os\.system|exec)").expect("cmd regex"),
            re_method_call: Regex::new(r"(\w+)\.(\w+)\s*\(").expect("method call regex"),
            re_func_call: Regex::new(r"([a-z_]\w*)\s*\(").expect("func call regex"),
        }
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for PythonExtractor {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".py"]
    }

    fn scan(&self, file_path: &str, content: &[u8]) -> Result<Vec<CodeNode>, SrcmapError> {
        let text = String::from_utf8_lossy(content);
        let mut nodes: Vec<CodeNode> = Vec::new();

        let mut comments: Vec<String> = Vec::new();
        let mut current_func: Option<usize> = None;
        let mut current_indent = 0usize;
        let mut body_lines: Vec<String> = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line_number = idx + 1;
            let trimmed = line.trim();
            let indent = line.len() - line.trim_start_matches([' ', '\t']).len();

            // Comment lines never terminate a body; they only feed the
            // pending attachment buffer.
            if trimmed.starts_with('#') {
                comments.push(trimmed.to_string());
                continue;
            }

            // A non-blank line back at (or above) the def's indentation ends
            // the current function.
            if let Some(func_idx) = current_func {
                if !trimmed.is_empty() && indent <= current_indent {
                    nodes[func_idx].unresolved_refs = self.extract_call_refs(&body_lines);
                    current_func = None;
                    body_lines.clear();
                }
            }

            if current_func.is_some() && !trimmed.is_empty() {
                body_lines.push(line.to_string());
            }

            if let Some(caps) = self.re_class.captures(trimmed) {
                let mut node = CodeNode::new(
                    NodeType::Class,
                    caps[1].to_string(),
                    "python",
                    file_path,
                    line_number,
                );
                node.comments = take_reversed(&mut comments);
                node.signature = trimmed.to_string();
                nodes.push(node);
                continue;
            }

            if let Some(caps) = self.re_def.captures(trimmed) {
                let mut node = CodeNode::new(
                    NodeType::Function,
                    caps[1].to_string(),
                    "python",
                    file_path,
                    line_number,
                );
                node.comments = take_reversed(&mut comments);
                node.signature = trimmed.to_string();
                current_func = Some(nodes.len());
                current_indent = indent;
                body_lines.clear();
                nodes.push(node);
                continue;
            }

            if let Some(caps) = self.re_http.captures(trimmed) {
                nodes.push(CodeNode::new(
                    NodeType::HttpCall,
                    caps[1].to_string(),
                    "python",
                    file_path,
                    line_number,
                ));
            }

            if let Some(caps) = self.re_cmd.captures(trimmed) {
                nodes.push(CodeNode::new(
                    NodeType::CmdExec,
                    caps[1].to_string(),
                    "python",
                    file_path,
                    line_number,
                ));
            }

            if !trimmed.is_empty() {
                comments.clear();
            }
        }

        // A function running to EOF still gets its refs.
        if let Some(func_idx) = current_func {
            if !body_lines.is_empty() {
                nodes[func_idx].unresolved_refs = self.extract_call_refs(&body_lines);
            }
        }

        Ok(nodes)
    }
}

impl PythonExtractor {
    fn extract_call_refs(&self, lines: &[String]) -> Vec<String> {
        let mut refs = BTreeSet::new();
        for line in lines {
            for caps in self.re_method_call.captures_iter(line) {
                let obj = &caps[1];
                let method = &caps[2];
                if obj != "self" && !PYTHON_BUILTINS.contains(&obj) {
                    refs.insert(format!("{obj}.{method}"));
                }
                refs.insert(method.to_string());
            }
            for caps in self.re_func_call.captures_iter(line) {
                let name = &caps[1];
                if !PYTHON_BUILTINS.contains(&name) && !PYTHON_KEYWORDS.contains(&name) {
                    refs.insert(name.to_string());
                }
            }
        }
        refs.into_iter().collect()
    }
}

fn take_reversed(comments: &mut Vec<String>) -> Vec<String> {
    let mut out = std::mem::take(comments);
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<CodeNode> {
        PythonExtractor::new()
            .scan("app.py", source.as_bytes())
            .expect("scan should succeed")
    }

    #[test]
    fn extracts_functions_and_classes() {
        let source = r#"# Stores users
class UserStore:
    def save(self, user):
        self.db.insert(user)

def main():
    pass
"#;
        let nodes = scan(source);
        let class = nodes.iter().find(|n| n.name == "UserStore").unwrap();
        assert_eq!(class.node_type, NodeType::Class);
        assert_eq!(class.comments, vec!["# Stores users".to_string()]);

        // Methods are bare def names, not qualified by class.
        let save = nodes.iter().find(|n| n.name == "save").unwrap();
        assert_eq!(save.node_type, NodeType::Function);
        assert_eq!(save.line_number, 3);

        assert!(nodes.iter().any(|n| n.name == "main"));
    }

    #[test]
    fn function_ends_at_dedent() {
        let source = r#"def first():
    db.query(x)

def second():
    cache.fetch(y)
"#;
        let nodes = scan(source);
        let first = nodes.iter().find(|n| n.name == "first").unwrap();
        assert!(first.unresolved_refs.contains(&"db.query".to_string()));
        assert!(!first.unresolved_refs.contains(&"cache.fetch".to_string()));
    }

    #[test]
    fn last_function_flushes_at_eof() {
        let source = "def tail():\n    worker.spin()\n";
        let nodes = scan(source);
        let tail = nodes.iter().find(|n| n.name == "tail").unwrap();
        assert!(tail.unresolved_refs.contains(&"worker.spin".to_string()));
        assert!(tail.unresolved_refs.contains(&"spin".to_string()));
    }

    #[test]
    fn self_and_builtin_receivers_suppress_qualified_form_only() {
        let source = r#"def handler(self):
    self.validate(x)
    print(x)
"#;
        let nodes = scan(source);
        let handler = nodes.iter().find(|n| n.name == "handler").unwrap();
        assert!(!handler
            .unresolved_refs
            .contains(&"self.validate".to_string()));
        assert!(handler.unresolved_refs.contains(&"validate".to_string()));
        assert!(!handler.unresolved_refs.contains(&"print".to_string()));
    }

    #[test]
    fn keywords_are_not_call_refs() {
        let source = r#"def branchy():
    if(ready):
        helper(x)
    while(busy):
        pass
"#;
        let nodes = scan(source);
        let branchy = nodes.iter().find(|n| n.name == "branchy").unwrap();
        assert!(!branchy.unresolved_refs.contains(&"if".to_string()));
        assert!(!branchy.unresolved_refs.contains(&"while".to_string()));
        assert!(branchy.unresolved_refs.contains(&"helper".to_string()));
    }

    #[test]
    fn requests_calls_emit_http_nodes() {
        let source = r#"def fetch():
    requests.get("https://auth")
"#;
        let nodes = scan(source);
        let call = nodes
            .iter()
            .find(|n| n.node_type == NodeType::HttpCall)
            .unwrap();
        assert_eq!(call.name, "requests.get");
        assert_eq!(call.line_number, 2);
    }

    #[test]
    fn subprocess_calls_emit_cmd_exec_nodes() {
        let source = r#"def deploy():
    subprocess.run(["ls"])
    os.system("echo hi")
"#;
        let nodes = scan(source);
        let cmds: Vec<_> = nodes
            .iter()
            .filter(|n| n.node_type == NodeType::CmdExec)
            .collect();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].name, "subprocess.run");
        assert_eq!(cmds[1].name, "os.system");
    }

    #[test]
    fn comment_at_function_indent_does_not_end_body() {
        let source = r#"def noisy():
    db.load(x)
# trailing note at column zero
    db.store(x)
"#;
        let nodes = scan(source);
        let noisy = nodes.iter().find(|n| n.name == "noisy").unwrap();
        assert!(noisy.unresolved_refs.contains(&"db.load".to_string()));
        assert!(noisy.unresolved_refs.contains(&"db.store".to_string()));
    }

    #[test]
    fn comments_attach_nearest_first() {
        let source = r#"# oldest
# newest
def documented():
    pass
"#;
        let nodes = scan(source);
        let doc = nodes.iter().find(|n| n.name == "documented").unwrap();
        assert_eq!(
            doc.comments,
            vec!["# newest".to_string(), "# oldest".to_string()]
        );
    }

    #[test]
    fn empty_and_comment_only_files_yield_nothing() {
        assert!(scan("").is_empty());
        assert!(scan("# nothing\n# at all\n").is_empty());
    }
}
