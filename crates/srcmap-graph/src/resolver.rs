//! Cross-file dependency resolution.
//!
//! After a whole batch has been extracted, a registry maps qualified names
//! to node ids; each node's symbolic call references are then rewritten into
//! concrete dependency edges. Resolution never fails: an unresolvable
//! reference is dropped.

use std::collections::{BTreeMap, BTreeSet};

use srcmap_core::{CodeNode, NodeType};

/// Resolves symbolic call references to node ids across one scanned batch.
///
/// Not thread-safe; each directory scan builds its own resolver.
pub struct DependencyResolver {
    // Keys: "FuncName", "(Type).Method", "Type.Method", "Class.method".
    registry: BTreeMap<String, String>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self {
            registry: BTreeMap::new(),
        }
    }

    /// Build the name lookup from all scanned nodes. Call after extraction
    /// of the whole batch completes.
    pub fn build_registry(&mut self, nodes: &[CodeNode]) {
        for node in nodes {
            if !matches!(
                node.node_type,
                NodeType::Function | NodeType::Class | NodeType::Interface
            ) {
                continue;
            }

            // The verbatim name always maps to the node.
            self.registry.insert(node.name.clone(), node.id.clone());

            // "(Type).Method" and "Class.method" also answer to the bare
            // method name; first registration wins.
            if let Some(idx) = node.name.rfind('.') {
                let method = node.name[idx + 1..].to_string();
                self.registry.entry(method).or_insert_with(|| node.id.clone());
            }

            // Receiver form additionally answers to "Type.Method".
            if let Some(rest) = node.name.strip_prefix('(') {
                if let Some(close) = rest.find(')') {
                    let type_name = &rest[..close];
                    if let Some(method) = rest[close + 1..].strip_prefix('.') {
                        let alt_key = format!("{type_name}.{method}");
                        self.registry
                            .entry(alt_key)
                            .or_insert_with(|| node.id.clone());
                    }
                }
            }
        }
    }

    /// Rewrite every node's unresolved references into dependency edges,
    /// dropping self-references, then clear the transient refs.
    pub fn resolve_all(&self, nodes: &mut [CodeNode]) {
        for node in nodes {
            if node.unresolved_refs.is_empty() {
                continue;
            }

            let mut deps = BTreeSet::new();
            for reference in &node.unresolved_refs {
                if let Some(id) = self.resolve(reference) {
                    if id != node.id {
                        deps.insert(id);
                    }
                }
            }

            node.dependencies = deps.into_iter().collect();
            node.unresolved_refs.clear();
        }
    }

    /// Match ladder, first hit wins:
    /// 1. exact registry key
    /// 2. trailing segment after the last `.`
    /// 3. any registry key ending in `".<ref>"`
    /// 4. final segment of a multi-dotted reference
    fn resolve(&self, reference: &str) -> Option<String> {
        if let Some(id) = self.registry.get(reference) {
            return Some(id.clone());
        }

        if let Some(idx) = reference.rfind('.') {
            if let Some(id) = self.registry.get(&reference[idx + 1..]) {
                return Some(id.clone());
            }
        }

        let suffix = format!(".{reference}");
        for (key, id) in &self.registry {
            if key.ends_with(&suffix) {
                return Some(id.clone());
            }
        }

        let mut parts = reference.split('.');
        if let (Some(_), Some(_)) = (parts.next(), parts.next()) {
            if let Some(last) = reference.split('.').next_back() {
                if let Some(id) = self.registry.get(last) {
                    return Some(id.clone());
                }
            }
        }

        None
    }

    /// Number of registered lookup keys.
    pub fn registry_len(&self) -> usize {
        self.registry.len()
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(name: &str, node_type: NodeType, file: &str) -> CodeNode {
        CodeNode::new(node_type, name, "go", file, 1)
    }

    fn with_refs(mut node: CodeNode, refs: &[&str]) -> CodeNode {
        node.unresolved_refs = refs.iter().map(|r| r.to_string()).collect();
        node
    }

    #[test]
    fn resolves_exact_match() {
        let target = make_node("GetNodes", NodeType::Function, "a.go");
        let target_id = target.id.clone();
        let caller = with_refs(make_node("ScanFile", NodeType::Function, "b.go"), &["GetNodes"]);

        let mut nodes = vec![target, caller];
        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        resolver.resolve_all(&mut nodes);

        assert_eq!(nodes[1].dependencies, vec![target_id]);
        assert!(nodes[1].unresolved_refs.is_empty());
    }

    #[test]
    fn resolves_qualified_ref_via_trailing_segment() {
        let target = make_node("GetNodes", NodeType::Function, "a.go");
        let target_id = target.id.clone();
        let caller = with_refs(
            make_node("ScanFile", NodeType::Function, "b.go"),
            &["h.service.GetNodes"],
        );

        let mut nodes = vec![target, caller];
        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        resolver.resolve_all(&mut nodes);

        assert_eq!(nodes[1].dependencies, vec![target_id]);
    }

    #[test]
    fn receiver_form_registers_type_dot_method() {
        let method = make_node("(InventoryHandler).GetAll", NodeType::Function, "h.go");
        let method_id = method.id.clone();
        let caller = with_refs(
            make_node("route", NodeType::Function, "r.go"),
            &["InventoryHandler.GetAll"],
        );

        let mut nodes = vec![method, caller];
        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        resolver.resolve_all(&mut nodes);

        assert_eq!(nodes[1].dependencies, vec![method_id]);
    }

    #[test]
    fn bare_method_name_reaches_receiver_method() {
        let method = make_node("(Widget).Render", NodeType::Function, "w.go");
        let method_id = method.id.clone();
        let caller = with_refs(make_node("draw", NodeType::Function, "d.go"), &["Render"]);

        let mut nodes = vec![method, caller];
        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        resolver.resolve_all(&mut nodes);

        assert_eq!(nodes[1].dependencies, vec![method_id]);
    }

    #[test]
    fn self_loop_is_suppressed() {
        let recursive = with_refs(make_node("f", NodeType::Function, "f.go"), &["f"]);
        let mut nodes = vec![recursive];
        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        resolver.resolve_all(&mut nodes);

        assert!(nodes[0].dependencies.is_empty());
        assert!(nodes[0].unresolved_refs.is_empty());
    }

    #[test]
    fn unresolvable_refs_are_dropped_silently() {
        let caller = with_refs(
            make_node("lonely", NodeType::Function, "l.go"),
            &["nowhere.tobe.found"],
        );
        let mut nodes = vec![caller];
        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        resolver.resolve_all(&mut nodes);

        assert!(nodes[0].dependencies.is_empty());
        assert!(nodes[0].unresolved_refs.is_empty());
    }

    #[test]
    fn duplicate_refs_produce_one_edge() {
        let target = make_node("helper", NodeType::Function, "h.go");
        let target_id = target.id.clone();
        let caller = with_refs(
            make_node("caller", NodeType::Function, "c.go"),
            &["helper", "x.helper"],
        );

        let mut nodes = vec![target, caller];
        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        resolver.resolve_all(&mut nodes);

        assert_eq!(nodes[1].dependencies, vec![target_id]);
    }

    #[test]
    fn first_registration_wins_for_bare_method_keys() {
        let first = make_node("ClassA.run", NodeType::Function, "a.java");
        let first_id = first.id.clone();
        let second = make_node("ClassB.run", NodeType::Function, "b.java");
        let second_id = second.id.clone();
        let caller = with_refs(make_node("main", NodeType::Function, "m.java"), &["x.run"]);

        let mut nodes = vec![first, second, caller];
        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        resolver.resolve_all(&mut nodes);

        // "x.run" misses exactly, then its trailing segment hits the key
        // registered by the earlier node.
        assert_eq!(nodes[2].dependencies, vec![first_id.clone()]);

        // The fully qualified form still reaches the later node.
        let caller2 = with_refs(
            make_node("main2", NodeType::Function, "m2.java"),
            &["ClassB.run"],
        );
        let mut nodes2 = vec![caller2];
        resolver.resolve_all(&mut nodes2);
        assert_eq!(nodes2[0].dependencies, vec![second_id]);
    }

    #[test]
    fn http_and_cmd_nodes_are_not_registered() {
        let http = make_node("http.Get", NodeType::HttpCall, "a.go");
        let cmd = make_node("os.system", NodeType::CmdExec, "b.py");
        let nodes = vec![http, cmd];
        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        assert_eq!(resolver.registry_len(), 0);
    }

    #[test]
    fn classes_and_interfaces_are_registered() {
        let class = make_node("OrderService", NodeType::Class, "o.java");
        let class_id = class.id.clone();
        let iface = make_node("Repository", NodeType::Interface, "r.java");
        let caller = with_refs(
            make_node("main", NodeType::Function, "m.java"),
            &["OrderService", "Repository"],
        );

        let mut nodes = vec![class, iface, caller];
        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        resolver.resolve_all(&mut nodes);

        assert_eq!(nodes[2].dependencies.len(), 2);
        assert!(nodes[2].dependencies.contains(&class_id));
    }

    #[test]
    fn nodes_without_refs_are_left_untouched() {
        let mut plain = make_node("quiet", NodeType::Function, "q.go");
        plain.dependencies = vec!["preexisting".to_string()];
        let mut nodes = vec![plain];
        let resolver = DependencyResolver::new();
        resolver.resolve_all(&mut nodes);
        assert_eq!(nodes[0].dependencies, vec!["preexisting".to_string()]);
    }
}
