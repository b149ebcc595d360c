//! PHP extractor (§4.4).
//!
//! One tree-sitter-backed parser, no regex multiplexing. §9's open
//! question picks the AST-helper variant over the source's regex/token
//! alternatives. Walks the concrete syntax tree directly (no `.scm` query)
//! because FQN resolution needs sequential, stateful traversal: a `use`
//! alias or a bare `namespace Foo;` statement changes how every later
//! sibling resolves names, which a declarative query can't express.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser};

use crate::extractor::Extractor;
use crate::identity;
use crate::types::{
    Diagnostic, Edge, EdgeKind, Language, ParseResult, PrimaryLabel, SourceSpan, Vertex,
};

pub struct PhpExtractor;

impl Extractor for PhpExtractor {
    fn name(&self) -> &'static str {
        "php"
    }

    fn supported_extensions(&self) -> HashSet<&'static str> {
        ["php"].into_iter().collect()
    }

    fn language_tag(&self) -> Language {
        Language::Php
    }

    fn parse_file(&self, path: &Path, bytes: &[u8]) -> ParseResult {
        let content = match std::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => {
                return ParseResult::failed(
                    path.to_path_buf(),
                    Diagnostic::fatal(format!("not valid UTF-8: {e}")),
                )
            }
        };

        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&tree_sitter_php::LANGUAGE_PHP.into()) {
            return ParseResult::failed(
                path.to_path_buf(),
                Diagnostic::fatal(format!("grammar load failure: {e}")),
            );
        }

        let tree = match parser.parse(content, None) {
            Some(t) => t,
            None => {
                return ParseResult::failed(
                    path.to_path_buf(),
                    Diagnostic::fatal("tree-sitter returned no tree (timeout)"),
                )
            }
        };

        let mut collector = Collector::new(path.to_path_buf(), content);
        collector.push_file_vertex();
        collector.walk_siblings(tree.root_node(), Scope::default());
        collector.into_result()
    }
}

/// Lexical scope threaded through sibling traversal, cloned per recursion
/// level so a `use` alias introduced deeper in the tree never leaks back up
/// to an outer sibling loop, but flows forward to every later sibling in
/// the same block (simple `namespace Foo;` semantics, §4.4).
#[derive(Default, Clone)]
struct Scope {
    namespace: String,
    use_map: HashMap<String, String>,
    current_class_fqn: Option<String>,
    current_parent_fqn: Option<String>,
    /// Id of the enclosing method/function, for CALLS/INSTANTIATES attribution.
    current_container_id: Option<String>,
}

struct Collector {
    file_path: PathBuf,
    file_path_str: String,
    content: String,
    file_id: String,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    diagnostics: Vec<Diagnostic>,
    /// Ids already pushed, so placeholder/concrete merges in this file don't
    /// duplicate a vertex.
    seen_ids: HashSet<String>,
}

impl Collector {
    fn new(file_path: PathBuf, content: &str) -> Self {
        let file_path_str = file_path.to_string_lossy().to_string();
        let file_id = identity::file_id(&file_path_str);
        Self {
            file_path,
            file_path_str,
            content: content.to_string(),
            file_id,
            vertices: Vec::new(),
            edges: Vec::new(),
            diagnostics: Vec::new(),
            seen_ids: HashSet::new(),
        }
    }

    fn push_file_vertex(&mut self) {
        let name = self
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.file_path_str.clone());
        self.push_vertex(Vertex::new(
            self.file_id.clone(),
            PrimaryLabel::File,
            Language::Php,
            name,
            self.file_path_str.clone(),
        ));
    }

    fn into_result(self) -> ParseResult {
        ParseResult {
            file_path: self.file_path,
            vertices: self.vertices,
            edges: self.edges,
            diagnostics: self.diagnostics,
        }
    }

    fn push_vertex(&mut self, vertex: Vertex) {
        if self.seen_ids.insert(vertex.id.clone()) {
            self.vertices.push(vertex);
            return;
        }
        // A forward reference (e.g. `new B()` before `class B` is declared
        // later in the same file) may have already queued an Unresolved
        // placeholder for this id; the concrete definition takes its place
        // rather than being dropped as a duplicate.
        if vertex.label != PrimaryLabel::Unresolved {
            if let Some(existing) = self.vertices.iter_mut().find(|v| v.id == vertex.id && v.label == PrimaryLabel::Unresolved) {
                *existing = vertex;
            }
        }
    }

    fn text(&self, node: Node) -> String {
        node.utf8_text(self.content.as_bytes()).unwrap_or("").to_string()
    }

    fn span(&self, node: Node) -> SourceSpan {
        let start = node.start_position();
        let end = node.end_position();
        SourceSpan {
            file_path: self.file_path.clone(),
            start_line: start.row as u32 + 1,
            start_column: start.column as u32 + 1,
            end_line: end.row as u32 + 1,
            end_column: end.column as u32 + 1,
        }
    }

    fn defined_in(&mut self, symbol_id: &str) {
        self.edges.push(Edge::new(EdgeKind::DefinedIn, symbol_id, self.file_id.clone()));
    }

    /// First direct child whose `kind()` is one of `kinds`.
    fn find_child<'a>(node: Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .find(|c| kinds.contains(&c.kind()))
    }

    /// All direct children whose `kind()` is one of `kinds`.
    fn find_children<'a>(node: Node<'a>, kinds: &[&str]) -> Vec<Node<'a>> {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .filter(|c| kinds.contains(&c.kind()))
            .collect()
    }

    /// Resolve a name reference per §4.4's rules: `use` aliases, relative
    /// names against the current namespace, leading `\` for absolute,
    /// `parent`/`self`/`static` against the enclosing class.
    fn resolve_name(&self, raw: &str, scope: &Scope) -> Option<String> {
        let name = raw.trim();
        if name.is_empty() {
            return None;
        }
        match name {
            "self" | "static" => return scope.current_class_fqn.clone(),
            "parent" => return scope.current_parent_fqn.clone(),
            _ => {}
        }
        if let Some(stripped) = name.strip_prefix('\\') {
            return Some(stripped.to_string());
        }
        let first_segment = name.split('\\').next().unwrap_or(name);
        if let Some(target) = scope.use_map.get(first_segment) {
            let rest = &name[first_segment.len()..];
            return Some(format!("{target}{rest}"));
        }
        if scope.namespace.is_empty() {
            Some(name.to_string())
        } else {
            Some(format!("{}\\{}", scope.namespace, name))
        }
    }

    /// Walk a sequence of sibling statements left to right, threading scope
    /// mutations (namespace switches, `use` aliases) forward.
    fn walk_siblings(&mut self, container: Node, mut scope: Scope) {
        let mut cursor = container.walk();
        let children: Vec<Node> = container.children(&mut cursor).collect();
        for child in children {
            self.walk_statement(child, &mut scope);
        }
    }

    fn walk_statement(&mut self, node: Node, scope: &mut Scope) {
        match node.kind() {
            "namespace_definition" => self.handle_namespace(node, scope),
            "namespace_use_declaration" => self.handle_use_declaration(node, scope),
            "class_declaration" => self.handle_class(node, scope, PrimaryLabel::Class),
            "interface_declaration" => self.handle_class(node, scope, PrimaryLabel::Interface),
            "trait_declaration" => self.handle_class(node, scope, PrimaryLabel::Trait),
            "function_definition" => self.handle_function(node, scope),
            "const_declaration" => self.handle_toplevel_const(node, scope),
            "compound_statement" => self.walk_siblings(node, scope.clone()),
            _ => self.walk_generic(node, scope),
        }
    }

    /// Anything that isn't a declaration: recurse looking for nested
    /// declarations (e.g. inside `if`/conditional includes) without
    /// re-dispatching call/new extraction (that only happens inside a
    /// function/method body, handled by `walk_body`).
    fn walk_generic(&mut self, node: Node, scope: &mut Scope) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk_statement(child, scope);
        }
    }

    fn handle_namespace(&mut self, node: Node, scope: &mut Scope) {
        let name = Self::find_child(node, &["namespace_name"])
            .map(|n| self.text(n))
            .unwrap_or_default();

        let ns_vertex_id = identity::namespace_id(&name);
        if !name.is_empty() {
            self.push_vertex(Vertex::new(
                ns_vertex_id,
                PrimaryLabel::Namespace,
                Language::Php,
                name.rsplit('\\').next().unwrap_or(&name).to_string(),
                name.clone(),
            ));
        }

        if let Some(body) = Self::find_child(node, &["compound_statement"]) {
            let mut inner = scope.clone();
            inner.namespace = name;
            self.walk_siblings(body, inner);
        } else {
            scope.namespace = name;
        }
    }

    fn handle_use_declaration(&mut self, node: Node, scope: &mut Scope) {
        let mut cursor = node.walk();
        for clause in node.children(&mut cursor) {
            if clause.kind() != "namespace_use_clause" && clause.kind() != "namespace_use_group_clause_1" {
                continue;
            }
            let imported = Self::find_child(clause, &["qualified_name", "name"])
                .map(|n| self.text(n));
            let Some(imported) = imported else { continue };

            let alias = Self::find_child(clause, &["namespace_aliasing_clause"])
                .and_then(|a| Self::find_child(a, &["name"]))
                .map(|n| self.text(n));

            let key = alias.unwrap_or_else(|| {
                imported.rsplit('\\').next().unwrap_or(&imported).to_string()
            });
            scope.use_map.insert(key, imported.clone());

            let target_id = identity::symbol_id(Language::Php, &imported);
            self.push_unresolved(&target_id, PrimaryLabel::Class, &imported);
            self.edges.push(
                Edge::new(EdgeKind::Imports, self.file_id.clone(), target_id)
                    .with_attr("module_spec", imported),
            );
        }
    }

    fn handle_class(&mut self, node: Node, scope: &mut Scope, label: PrimaryLabel) {
        let Some(name_node) = node.child_by_field_name("name") else {
            self.diagnostics.push(
                Diagnostic::warning("declaration without a name; skipped").at(self.span(node)),
            );
            return;
        };
        let name = self.text(name_node);
        let fqn = if scope.namespace.is_empty() {
            name.clone()
        } else {
            format!("{}\\{}", scope.namespace, name)
        };
        let id = identity::symbol_id(Language::Php, &fqn);

        let mut vertex = Vertex::new(id.clone(), label, Language::Php, name, fqn.clone())
            .with_location(self.span(node));

        let is_abstract = Self::leading_modifier_contains(&node, &self.content, "abstract_modifier");
        let is_final = Self::leading_modifier_contains(&node, &self.content, "final_modifier");
        vertex = vertex.with_attr("abstract", is_abstract).with_attr("final", is_final);

        self.push_vertex(vertex);
        self.defined_in(&id);

        let mut inner_scope = scope.clone();
        inner_scope.current_class_fqn = Some(fqn.clone());

        // EXTENDS
        if let Some(base) = Self::find_child(node, &["base_clause"]) {
            let targets = Self::find_children(base, &["qualified_name", "name"]);
            for (i, target_node) in targets.iter().enumerate() {
                let raw = self.text(*target_node);
                if let Some(resolved) = self.resolve_name(&raw, scope) {
                    let target_id = identity::symbol_id(Language::Php, &resolved);
                    let target_label = if label == PrimaryLabel::Interface {
                        PrimaryLabel::Interface
                    } else {
                        PrimaryLabel::Class
                    };
                    self.push_unresolved(&target_id, target_label, &resolved);
                    self.edges.push(Edge::new(EdgeKind::Extends, id.clone(), target_id));
                    if i == 0 && label == PrimaryLabel::Class {
                        inner_scope.current_parent_fqn = Some(resolved);
                    }
                }
            }
        }

        // IMPLEMENTS
        if let Some(iface) = Self::find_child(node, &["class_interface_clause"]) {
            for target_node in Self::find_children(iface, &["qualified_name", "name"]) {
                let raw = self.text(target_node);
                if let Some(resolved) = self.resolve_name(&raw, scope) {
                    let target_id = identity::symbol_id(Language::Php, &resolved);
                    self.push_unresolved(&target_id, PrimaryLabel::Interface, &resolved);
                    self.edges.push(Edge::new(EdgeKind::Implements, id.clone(), target_id));
                }
            }
        }

        // Anonymous classes never reach here (node.kind() is always a named
        // declaration), but nested member declarations still need the decl
        // list body:
        if let Some(body) = Self::find_child(node, &["declaration_list"]) {
            self.walk_class_body(body, &fqn, &id, &inner_scope);
        }
    }

    fn leading_modifier_contains(node: &Node, content: &str, kind: &str) -> bool {
        let mut cursor = node.walk();
        node.children(&mut cursor).any(|c| c.kind() == kind) || {
            let _ = content;
            false
        }
    }

    fn walk_class_body(&mut self, body: Node, class_fqn: &str, class_id: &str, scope: &Scope) {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "method_declaration" => self.handle_method(member, class_fqn, class_id, scope),
                "property_declaration" => self.handle_property(member, class_fqn, class_id),
                "const_declaration" => self.handle_class_const(member, class_fqn, class_id),
                "use_declaration" => self.handle_trait_use(member, class_id, scope),
                _ => {}
            }
        }
    }

    fn handle_trait_use(&mut self, node: Node, class_id: &str, scope: &Scope) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "name" && child.kind() != "qualified_name" {
                continue;
            }
            let raw = self.text(child);
            if let Some(resolved) = self.resolve_name(&raw, scope) {
                let target_id = identity::symbol_id(Language::Php, &resolved);
                self.push_unresolved(&target_id, PrimaryLabel::Trait, &resolved);
                self.edges
                    .push(Edge::new(EdgeKind::UsesTrait, class_id.to_string(), target_id));
            }
        }
    }

    fn handle_method(&mut self, node: Node, class_fqn: &str, class_id: &str, scope: &Scope) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node);
        let id = identity::member_id(Language::Php, class_fqn, &name);

        let is_static = Self::find_child(node, &["static_modifier"]).is_some();
        let visibility = ["public", "private", "protected"]
            .iter()
            .find(|kw| Self::find_child(node, &[&format!("{kw}_modifier") as &str]).is_some())
            .copied()
            .unwrap_or("public");

        let vertex = Vertex::new(id.clone(), PrimaryLabel::Method, Language::Php, name, format!("{class_fqn}::{}", self.text(name_node)))
            .with_location(self.span(node))
            .with_attr("visibility", visibility)
            .with_attr("static", is_static);
        self.push_vertex(vertex);
        self.defined_in(&id);
        self.edges.push(Edge::new(EdgeKind::HasMethod, class_id.to_string(), id.clone()));

        let mut body_scope = scope.clone();
        body_scope.current_container_id = Some(id);
        if let Some(body) = Self::find_child(node, &["compound_statement"]) {
            self.walk_body(body, &body_scope);
        }
    }

    fn handle_function(&mut self, node: Node, scope: &mut Scope) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node);
        let fqn = if scope.namespace.is_empty() {
            name.clone()
        } else {
            format!("{}\\{}", scope.namespace, name)
        };
        let id = identity::symbol_id(Language::Php, &fqn);
        self.push_vertex(Vertex::new(id.clone(), PrimaryLabel::Function, Language::Php, name, fqn).with_location(self.span(node)));
        self.defined_in(&id);

        let mut body_scope = scope.clone();
        body_scope.current_container_id = Some(id);
        if let Some(body) = Self::find_child(node, &["compound_statement"]) {
            self.walk_body(body, &body_scope);
        }
    }

    fn handle_property(&mut self, node: Node, class_fqn: &str, class_id: &str) {
        let elements = Self::find_children(node, &["property_element"]);
        let is_static = Self::find_child(node, &["static_modifier"]).is_some();
        let visibility = ["public", "private", "protected"]
            .iter()
            .find(|kw| Self::find_child(node, &[&format!("{kw}_modifier") as &str]).is_some())
            .copied()
            .unwrap_or("public");

        for element in elements {
            let Some(var_node) = Self::find_child(element, &["variable_name"]) else {
                continue;
            };
            let raw_name = self.text(var_node);
            let name = raw_name.trim_start_matches('$').to_string();
            let id = identity::member_id(Language::Php, class_fqn, &name);
            let vertex = Vertex::new(
                id.clone(),
                PrimaryLabel::Property,
                Language::Php,
                name,
                format!("{class_fqn}::${}", raw_name.trim_start_matches('$')),
            )
            .with_location(self.span(node))
            .with_attr("visibility", visibility)
            .with_attr("static", is_static);
            self.push_vertex(vertex);
            self.defined_in(&id);
            self.edges
                .push(Edge::new(EdgeKind::HasProperty, class_id.to_string(), id));
        }
    }

    fn handle_class_const(&mut self, node: Node, class_fqn: &str, class_id: &str) {
        for element in Self::find_children(node, &["const_element"]) {
            let Some(name_node) = Self::find_child(element, &["name"]) else {
                continue;
            };
            let name = self.text(name_node);
            let fqn = format!("{class_fqn}::{name}");
            let id = identity::symbol_id(Language::Php, &fqn);
            self.push_vertex(
                Vertex::new(id.clone(), PrimaryLabel::Constant, Language::Php, name, fqn)
                    .with_location(self.span(node)),
            );
            self.defined_in(&id);
            self.edges
                .push(Edge::new(EdgeKind::HasConstant, class_id.to_string(), id));
        }
    }

    fn handle_toplevel_const(&mut self, node: Node, scope: &Scope) {
        for element in Self::find_children(node, &["const_element"]) {
            let Some(name_node) = Self::find_child(element, &["name"]) else {
                continue;
            };
            let name = self.text(name_node);
            let fqn = if scope.namespace.is_empty() {
                name.clone()
            } else {
                format!("{}\\{}", scope.namespace, name)
            };
            let id = identity::symbol_id(Language::Php, &fqn);
            self.push_vertex(
                Vertex::new(id.clone(), PrimaryLabel::Constant, Language::Php, name, fqn)
                    .with_location(self.span(node)),
            );
            self.defined_in(&id);
        }
    }

    /// Walk a function/method body looking for `new X(...)` and call sites.
    /// Does not descend into `anonymous_class_creation_expression` bodies
    /// (§4.4: "Anonymous classes are skipped; their members do not generate
    /// vertices").
    fn walk_body(&mut self, node: Node, scope: &Scope) {
        if node.kind() == "anonymous_class_creation_expression" {
            return;
        }
        match node.kind() {
            "object_creation_expression" => self.handle_instantiation(node, scope),
            "scoped_call_expression" => self.handle_scoped_call(node, scope),
            "member_call_expression" => self.handle_member_call(node, scope),
            "function_call_expression" => self.handle_function_call(node, scope),
            _ => {}
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk_body(child, scope);
        }
    }

    fn handle_instantiation(&mut self, node: Node, scope: &Scope) {
        let Some(container) = &scope.current_container_id else {
            return;
        };
        let Some(class_node) = Self::find_child(node, &["qualified_name", "name"]) else {
            return;
        };
        let raw = self.text(class_node);
        let Some(resolved) = self.resolve_name(&raw, scope) else {
            return;
        };
        let target_id = identity::symbol_id(Language::Php, &resolved);
        self.push_unresolved(&target_id, PrimaryLabel::Class, &resolved);
        self.edges.push(
            Edge::new(EdgeKind::Instantiates, container.clone(), target_id).at(
                node.start_position().row as u32 + 1,
                node.start_position().column as u32 + 1,
            ),
        );
    }

    fn handle_scoped_call(&mut self, node: Node, scope: &Scope) {
        let Some(container) = &scope.current_container_id else {
            return;
        };
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let method_name = self.text(name_node);
        let Some(qualifier) = Self::find_child(node, &["qualified_name", "name", "relative_scope"])
        else {
            return;
        };
        let qualifier_text = self.text(qualifier);

        let target_class_fqn = match qualifier_text.as_str() {
            "self" | "static" => scope.current_class_fqn.clone(),
            "parent" => scope.current_parent_fqn.clone(),
            other => self.resolve_name(other, scope),
        };

        let target_id = match target_class_fqn {
            Some(fqn) => {
                let id = identity::member_id(Language::Php, &fqn, &method_name);
                self.push_unresolved(&id, PrimaryLabel::Method, &format!("{fqn}::{method_name}"));
                id
            }
            None => {
                let id = identity::unresolved_id("method", &method_name);
                self.push_unresolved(&id, PrimaryLabel::Method, &method_name);
                id
            }
        };
        self.edges.push(
            Edge::new(EdgeKind::Calls, container.clone(), target_id).at(
                node.start_position().row as u32 + 1,
                node.start_position().column as u32 + 1,
            ),
        );
    }

    fn handle_member_call(&mut self, node: Node, scope: &Scope) {
        let Some(container) = &scope.current_container_id else {
            return;
        };
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let method_name = self.text(name_node);

        let receiver_is_this = node
            .child_by_field_name("object")
            .map(|o| self.text(o) == "$this")
            .unwrap_or(false);

        let target_id = if receiver_is_this {
            match &scope.current_class_fqn {
                Some(fqn) => {
                    let id = identity::member_id(Language::Php, fqn, &method_name);
                    self.push_unresolved(&id, PrimaryLabel::Method, &format!("{fqn}::{method_name}"));
                    id
                }
                None => {
                    let id = identity::unresolved_id("method", &method_name);
                    self.push_unresolved(&id, PrimaryLabel::Method, &method_name);
                    id
                }
            }
        } else {
            // Best-effort only: static target not determinable from a
            // non-`$this` receiver (§4.4 item 10).
            let id = identity::unresolved_id("method", &method_name);
            self.push_unresolved(&id, PrimaryLabel::Method, &method_name);
            id
        };
        self.edges.push(
            Edge::new(EdgeKind::Calls, container.clone(), target_id).at(
                node.start_position().row as u32 + 1,
                node.start_position().column as u32 + 1,
            ),
        );
    }

    fn handle_function_call(&mut self, node: Node, scope: &Scope) {
        let Some(container) = &scope.current_container_id else {
            return;
        };
        let Some(function_node) = node
            .child_by_field_name("function")
            .or_else(|| Self::find_child(node, &["qualified_name", "name"]))
        else {
            return;
        };
        if !["qualified_name", "name"].contains(&function_node.kind()) {
            return; // dynamic callee (e.g. a variable), not resolvable.
        }
        let raw = self.text(function_node);
        let Some(resolved) = self.resolve_name(&raw, scope) else {
            return;
        };
        let target_id = identity::symbol_id(Language::Php, &resolved);
        self.push_unresolved(&target_id, PrimaryLabel::Function, &resolved);
        self.edges.push(
            Edge::new(EdgeKind::Calls, container.clone(), target_id).at(
                node.start_position().row as u32 + 1,
                node.start_position().column as u32 + 1,
            ),
        );
    }

    fn push_unresolved(&mut self, id: &str, label: PrimaryLabel, qualified_name: &str) {
        if self.seen_ids.contains(id) {
            return;
        }
        self.push_vertex(
            Vertex::new(
                id.to_string(),
                PrimaryLabel::Unresolved,
                Language::Php,
                qualified_name.rsplit('\\').next().unwrap_or(qualified_name).to_string(),
                qualified_name.to_string(),
            )
            .with_attr("expected_label", label.as_str()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> ParseResult {
        PhpExtractor.parse_file(Path::new("/r/A.php"), src.as_bytes())
    }

    #[test]
    fn single_class_with_namespace_and_unresolved_extends() {
        let result = extract("<?php\nnamespace X;\nclass A extends X\\B {}\n");
        let class = result
            .vertices
            .iter()
            .find(|v| v.label == PrimaryLabel::Class)
            .expect("class vertex");
        assert_eq!(class.qualified_name, "X\\A");

        let unresolved = result
            .vertices
            .iter()
            .find(|v| v.label == PrimaryLabel::Unresolved)
            .expect("unresolved placeholder for X\\B");
        assert_eq!(unresolved.qualified_name, "X\\B");

        assert!(result
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::Extends && e.source_id == class.id && e.target_id == unresolved.id));
    }

    #[test]
    fn namespace_vertex_and_defined_in_edge_are_produced() {
        let result = extract("<?php\nnamespace X;\nclass A {}\n");
        assert!(result.vertices.iter().any(|v| v.label == PrimaryLabel::Namespace && v.qualified_name == "X"));
        let class = result.vertices.iter().find(|v| v.label == PrimaryLabel::Class).unwrap();
        assert!(result
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::DefinedIn && e.source_id == class.id));
    }

    #[test]
    fn trait_use_produces_uses_trait_edge() {
        let result = extract("<?php\nclass C { use T; }\n");
        let class = result.vertices.iter().find(|v| v.label == PrimaryLabel::Class).unwrap();
        let trait_v = result.vertices.iter().find(|v| v.qualified_name == "T").unwrap();
        assert!(result
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::UsesTrait && e.source_id == class.id && e.target_id == trait_v.id));
    }

    #[test]
    fn method_and_property_ownership_edges() {
        let result = extract("<?php\nclass A {\n  private $value;\n  public function run() {}\n}\n");
        let class = result.vertices.iter().find(|v| v.label == PrimaryLabel::Class).unwrap();
        assert!(result.vertices.iter().any(|v| v.label == PrimaryLabel::Method && v.name == "run"));
        assert!(result.vertices.iter().any(|v| v.label == PrimaryLabel::Property && v.name == "value"));
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::HasMethod && e.source_id == class.id));
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::HasProperty && e.source_id == class.id));
    }

    #[test]
    fn this_call_resolves_to_member_id_of_enclosing_class() {
        let result = extract("<?php\nclass A {\n  public function run() { $this->helper(); }\n  public function helper() {}\n}\n");
        let helper = result
            .vertices
            .iter()
            .find(|v| v.label == PrimaryLabel::Method && v.name == "helper")
            .unwrap();
        assert!(result
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::Calls && e.target_id == helper.id));
    }

    #[test]
    fn new_expression_produces_instantiates_edge() {
        let result = extract("<?php\nclass A {\n  public function run() { new B(); }\n}\n");
        let run = result.vertices.iter().find(|v| v.name == "run").unwrap();
        let b_id = identity::symbol_id(Language::Php, "B");
        assert!(result
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::Instantiates && e.source_id == run.id && e.target_id == b_id));
    }

    #[test]
    fn new_expression_also_materializes_an_unresolved_placeholder_for_its_target() {
        let result = extract("<?php\nclass A {\n  public function run() { new B(); }\n}\n");
        let b_id = identity::symbol_id(Language::Php, "B");
        assert!(result
            .vertices
            .iter()
            .any(|v| v.id == b_id && v.label == PrimaryLabel::Unresolved));
    }

    #[test]
    fn plain_function_call_materializes_an_unresolved_function_placeholder() {
        let result = extract("<?php\nfunction run() { helper(); }\n");
        let helper_id = identity::symbol_id(Language::Php, "helper");
        assert!(result
            .vertices
            .iter()
            .any(|v| v.id == helper_id && v.label == PrimaryLabel::Unresolved));
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::Calls && e.target_id == helper_id));
    }

    #[test]
    fn use_declaration_materializes_an_unresolved_placeholder_for_the_imported_class() {
        let result = extract("<?php\nnamespace X;\nuse Y\\Imported;\nclass A { public function run() { new Imported(); } }\n");
        let imported_id = identity::symbol_id(Language::Php, "Y\\Imported");
        assert!(result
            .vertices
            .iter()
            .any(|v| v.id == imported_id && v.label == PrimaryLabel::Unresolved));
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::Imports && e.target_id == imported_id));
    }

    #[test]
    fn forward_referenced_class_defined_later_in_file_is_not_left_unresolved() {
        // `new B()` is seen before `class B` is declared later in the same
        // file; the concrete definition must win over the placeholder.
        let result = extract("<?php\nclass A {\n  public function run() { new B(); }\n}\nclass B {}\n");
        let b_id = identity::symbol_id(Language::Php, "B");
        let b_vertices: Vec<_> = result.vertices.iter().filter(|v| v.id == b_id).collect();
        assert_eq!(b_vertices.len(), 1, "expected exactly one vertex for B, got {b_vertices:?}");
        assert_eq!(b_vertices[0].label, PrimaryLabel::Class);
    }

    #[test]
    fn two_classes_same_short_name_different_namespace_get_distinct_ids() {
        let a = extract("<?php\nnamespace X;\nclass A {}\n");
        let b = extract("<?php\nnamespace Y;\nclass A {}\n");
        let id_a = a.vertices.iter().find(|v| v.label == PrimaryLabel::Class).unwrap().id.clone();
        let id_b = b.vertices.iter().find(|v| v.label == PrimaryLabel::Class).unwrap().id.clone();
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn anonymous_class_members_are_skipped() {
        let result = extract("<?php\nfunction make() { return new class { public function hidden() {} }; }\n");
        assert!(!result.vertices.iter().any(|v| v.name == "hidden"));
    }

    #[test]
    fn syntax_error_still_yields_file_vertex_and_diagnostic_or_partial_results() {
        let result = extract("<?php\nclass {{{ broken");
        assert!(result.vertices.iter().any(|v| v.label == PrimaryLabel::File));
    }
}
