//! JavaScript extractor (§4.5).
//!
//! Handles ES6 modules, CommonJS, AMD's `define(...)`, and Backbone-style
//! `.extend` uniformly by walking the tree directly rather than compiling
//! four separate query sets. The shapes share enough structure (a call
//! expression whose arguments need inspecting, a variable binding that
//! determines a class/function's name) that one stateful walk is simpler
//! than four independent passes that would need to agree on vertex ids
//! afterwards.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser};

use crate::extractor::Extractor;
use crate::identity;
use crate::types::{
    Diagnostic, Edge, EdgeKind, Language, ParseResult, PrimaryLabel, SourceSpan, Vertex,
};

const HTTP_METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options"];

pub struct JavaScriptExtractor;

impl Extractor for JavaScriptExtractor {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn supported_extensions(&self) -> HashSet<&'static str> {
        ["js", "jsx", "mjs", "cjs"].into_iter().collect()
    }

    fn language_tag(&self) -> Language {
        Language::JavaScript
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
        if let Err(e) = parser.set_language(&tree_sitter_javascript::LANGUAGE.into()) {
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
        collector.push_file_and_module_vertices();
        collector.walk(tree.root_node(), Scope::default());
        collector.into_result()
    }
}

#[derive(Default, Clone)]
struct Scope {
    /// Local binding name -> module specifier, populated from ES6 imports
    /// and CommonJS `require`.
    imports: HashMap<String, String>,
    /// Id of the nearest enclosing function/method/arrow, if any.
    current_container_id: Option<String>,
}

struct Collector {
    file_path: PathBuf,
    file_path_str: String,
    content: String,
    file_id: String,
    module_id: String,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    diagnostics: Vec<Diagnostic>,
    seen_ids: HashSet<String>,
    anon_counter: u32,
}

impl Collector {
    fn new(file_path: PathBuf, content: &str) -> Self {
        let file_path_str = file_path.to_string_lossy().to_string();
        let file_id = identity::file_id(&file_path_str);
        let module_id = identity::module_id(&file_path_str);
        Self {
            file_path,
            file_path_str,
            content: content.to_string(),
            file_id,
            module_id,
            vertices: Vec::new(),
            edges: Vec::new(),
            diagnostics: Vec::new(),
            seen_ids: HashSet::new(),
            anon_counter: 0,
        }
    }

    fn push_file_and_module_vertices(&mut self) {
        let name = self
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.file_path_str.clone());
        self.push_vertex(Vertex::new(
            self.file_id.clone(),
            PrimaryLabel::File,
            Language::JavaScript,
            name.clone(),
            self.file_path_str.clone(),
        ));
        self.push_vertex(Vertex::new(
            self.module_id.clone(),
            PrimaryLabel::Module,
            Language::JavaScript,
            name,
            self.file_path_str.clone(),
        ));
        self.edges
            .push(Edge::new(EdgeKind::DefinedIn, self.module_id.clone(), self.file_id.clone()));
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

    fn find_child<'a>(node: Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
        let mut cursor = node.walk();
        node.children(&mut cursor).find(|c| kinds.contains(&c.kind()))
    }

    fn string_literal_value(&self, node: Node) -> Option<String> {
        match node.kind() {
            "string" => {
                let raw = self.text(node);
                Some(raw.trim_matches(|c| c == '\'' || c == '"' || c == '`').to_string())
            }
            _ => None,
        }
    }

    /// Local-name-or-module-scoped fqn + id, per §4.5 item 5: imported
    /// identifiers are keyed by module + exported name, everything else is
    /// scoped to the file.
    fn resolve_ref(&self, name: &str, scope: &Scope) -> (String, String) {
        let root = name.split('.').next().unwrap_or(name);
        if let Some(module) = scope.imports.get(root) {
            let fqn = format!("{module}::{name}");
            (identity::symbol_id(Language::JavaScript, &fqn), fqn)
        } else {
            let fqn = format!("{}::{}", self.file_path_str, name);
            (identity::symbol_id(Language::JavaScript, &fqn), fqn)
        }
    }

    fn push_unresolved_class(&mut self, id: &str, qualified_name: &str) {
        if self.seen_ids.contains(id) {
            return;
        }
        self.push_vertex(
            Vertex::new(
                id.to_string(),
                PrimaryLabel::Unresolved,
                Language::JavaScript,
                qualified_name.rsplit("::").next().unwrap_or(qualified_name).to_string(),
                qualified_name.to_string(),
            )
            .with_attr("expected_label", PrimaryLabel::Class.as_str()),
        );
    }

    fn next_anon_id(&mut self, node: Node) -> String {
        self.anon_counter += 1;
        let pos = node.start_position();
        let fqn = format!("{}::<anonymous@{}:{}>", self.file_path_str, pos.row + 1, pos.column + 1);
        identity::symbol_id(Language::JavaScript, &fqn)
    }

    // -- main walk ----------------------------------------------------

    fn walk(&mut self, node: Node, scope: Scope) {
        match node.kind() {
            "import_statement" => {
                let mut scope = scope;
                self.handle_import_statement(node, &mut scope);
                self.walk_children(node, scope);
                return;
            }
            "class_declaration" | "class" => {
                self.handle_class(node, &scope, None);
                return;
            }
            "function_declaration" => {
                self.handle_named_function(node, &scope);
                return;
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut scope = scope;
                self.handle_variable_declaration(node, &mut scope);
                self.walk_children(node, scope);
                return;
            }
            "call_expression" => {
                self.handle_call_expression(node, &scope);
            }
            "new_expression" => {
                self.handle_new_expression(node, &scope);
            }
            _ => {}
        }
        self.walk_children(node, scope);
    }

    fn walk_children(&mut self, node: Node, scope: Scope) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child, scope.clone());
        }
    }

    fn defined_in(&mut self, id: &str) {
        self.edges.push(Edge::new(EdgeKind::DefinedIn, id, self.file_id.clone()));
    }

    fn container_or_file(&self, scope: &Scope) -> String {
        scope.current_container_id.clone().unwrap_or_else(|| self.file_id.clone())
    }

    // -- imports --------------------------------------------------------

    fn handle_import_statement(&mut self, node: Node, scope: &mut Scope) {
        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let Some(spec) = self.string_literal_value(source) else {
            return;
        };
        let target_id = identity::module_id(&spec);
        self.push_vertex(Vertex::new(
            target_id.clone(),
            PrimaryLabel::Module,
            Language::JavaScript,
            spec.rsplit('/').next().unwrap_or(&spec).to_string(),
            spec.clone(),
        ));
        self.edges
            .push(Edge::new(EdgeKind::Imports, self.module_id.clone(), target_id));

        if let Some(clause) = Self::find_child(node, &["import_clause"]) {
            self.collect_import_bindings(clause, &spec, scope);
        }
    }

    fn collect_import_bindings(&mut self, clause: Node, spec: &str, scope: &mut Scope) {
        let mut cursor = clause.walk();
        for child in clause.children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    scope.imports.insert(self.text(child), spec.to_string());
                }
                "namespace_import" => {
                    if let Some(id_node) = Self::find_child(child, &["identifier"]) {
                        scope.imports.insert(self.text(id_node), spec.to_string());
                    }
                }
                "named_imports" => {
                    let mut inner = child.walk();
                    for specifier in child.children(&mut inner) {
                        if specifier.kind() != "import_specifier" {
                            continue;
                        }
                        let local = specifier
                            .child_by_field_name("alias")
                            .or_else(|| specifier.child_by_field_name("name"))
                            .map(|n| self.text(n));
                        if let Some(local) = local {
                            scope.imports.insert(local, spec.to_string());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    // -- declarations -----------------------------------------------------

    fn handle_variable_declaration(&mut self, node: Node, scope: &mut Scope) {
        let mut cursor = node.walk();
        for declarator in node.children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            let Some(value) = declarator.child_by_field_name("value") else {
                continue;
            };
            let binding_name = self.text(name_node);

            match value.kind() {
                "call_expression" => {
                    if self.try_handle_require(value, &binding_name, scope) {
                        continue;
                    }
                    if self.try_handle_backbone_extend(value, &binding_name, scope) {
                        continue;
                    }
                    self.handle_call_expression(value, scope);
                }
                "function_expression" | "arrow_function" | "generator_function" => {
                    self.handle_named_function_value(value, &binding_name, scope);
                }
                "class" => {
                    self.handle_class(value, scope, Some(binding_name));
                }
                _ => {}
            }
        }
    }

    fn try_handle_require(&mut self, call: Node, binding_name: &str, scope: &mut Scope) -> bool {
        let Some(function) = call.child_by_field_name("function") else {
            return false;
        };
        if self.text(function) != "require" {
            return false;
        }
        let Some(args) = call.child_by_field_name("arguments") else {
            return false;
        };
        let Some(first_arg) = args.named_child(0) else {
            return false;
        };
        let Some(spec) = self.string_literal_value(first_arg) else {
            return false;
        };
        let target_id = identity::module_id(&spec);
        self.push_vertex(Vertex::new(
            target_id.clone(),
            PrimaryLabel::Module,
            Language::JavaScript,
            spec.rsplit('/').next().unwrap_or(&spec).to_string(),
            spec.clone(),
        ));
        self.edges
            .push(Edge::new(EdgeKind::Imports, self.module_id.clone(), target_id));
        scope.imports.insert(binding_name.to_string(), spec);
        true
    }

    fn try_handle_backbone_extend(&mut self, call: Node, binding_name: &str, scope: &Scope) -> bool {
        let Some(function) = call.child_by_field_name("function") else {
            return false;
        };
        if function.kind() != "member_expression" {
            return false;
        }
        let property = function.child_by_field_name("property").map(|n| self.text(n));
        if property.as_deref() != Some("extend") {
            return false;
        }
        let Some(parent_node) = function.child_by_field_name("object") else {
            return false;
        };
        let parent_name = self.text(parent_node);

        let fqn = format!("{}::{}", self.file_path_str, binding_name);
        let id = identity::symbol_id(Language::JavaScript, &fqn);
        self.push_vertex(
            Vertex::new(id.clone(), PrimaryLabel::Class, Language::JavaScript, binding_name.to_string(), fqn)
                .with_location(self.span(call))
                .with_attr("style", "backbone_extend"),
        );
        self.defined_in(&id);

        let (target_id, target_fqn) = self.resolve_ref(&parent_name, scope);
        self.push_unresolved_class(&target_id, &target_fqn);
        self.edges.push(Edge::new(EdgeKind::Extends, id.clone(), target_id));

        if let Some(args) = call.child_by_field_name("arguments") {
            if let Some(obj) = args.named_child(0) {
                if obj.kind() == "object" {
                    self.extract_methods_from_object(obj, &id, &fqn, scope);
                }
            }
        }
        true
    }

    fn extract_methods_from_object(&mut self, obj: Node, class_id: &str, class_fqn: &str, scope: &Scope) {
        let mut cursor = obj.walk();
        for pair in obj.children(&mut cursor) {
            if pair.kind() != "pair" && pair.kind() != "method_definition" {
                continue;
            }
            let (key, value) = if pair.kind() == "method_definition" {
                (pair.child_by_field_name("name"), pair.child_by_field_name("body"))
            } else {
                (pair.child_by_field_name("key"), pair.child_by_field_name("value"))
            };
            let Some(key) = key else { continue };
            let method_name = self.text(key);
            let is_function = pair.kind() == "method_definition"
                || value.map(|v| matches!(v.kind(), "function_expression" | "arrow_function")).unwrap_or(false);
            if !is_function {
                continue;
            }
            let method_id = identity::member_id(Language::JavaScript, class_fqn, &method_name);
            self.push_vertex(
                Vertex::new(
                    method_id.clone(),
                    PrimaryLabel::Method,
                    Language::JavaScript,
                    method_name,
                    format!("{class_fqn}::{}", self.text(key)),
                )
                .with_location(self.span(pair)),
            );
            self.defined_in(&method_id);
            self.edges
                .push(Edge::new(EdgeKind::HasMethod, class_id.to_string(), method_id.clone()));

            let mut body_scope = scope.clone();
            body_scope.current_container_id = Some(method_id);
            if let Some(body) = value.and_then(|v| Self::find_child(v, &["statement_block"])) {
                self.walk(body, body_scope);
            }
        }
    }

    fn handle_named_function(&mut self, node: Node, scope: &Scope) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node);
        self.push_function_vertex_and_walk(node, &name, scope);
    }

    fn handle_named_function_value(&mut self, node: Node, binding_name: &str, scope: &Scope) {
        self.push_function_vertex_and_walk(node, binding_name, scope);
    }

    fn push_function_vertex_and_walk(&mut self, node: Node, name: &str, scope: &Scope) {
        let fqn = format!("{}::{}", self.file_path_str, name);
        let id = identity::symbol_id(Language::JavaScript, &fqn);
        self.push_vertex(
            Vertex::new(id.clone(), PrimaryLabel::Function, Language::JavaScript, name.to_string(), fqn)
                .with_location(self.span(node)),
        );
        self.defined_in(&id);

        let mut body_scope = scope.clone();
        body_scope.current_container_id = Some(id);
        if let Some(body) = Self::find_child(node, &["statement_block"]) {
            self.walk(body, body_scope);
        } else if let Some(expr_body) = node.child_by_field_name("body") {
            // Arrow function with an expression body (no braces).
            self.walk(expr_body, body_scope);
        }
    }

    fn handle_class(&mut self, node: Node, scope: &Scope, forced_name: Option<String>) {
        let name = forced_name
            .or_else(|| node.child_by_field_name("name").map(|n| self.text(n)))
            .unwrap_or_else(|| format!("<anonymous@{}>", node.start_position().row + 1));
        let fqn = format!("{}::{}", self.file_path_str, name);
        let id = identity::symbol_id(Language::JavaScript, &fqn);
        self.push_vertex(
            Vertex::new(id.clone(), PrimaryLabel::Class, Language::JavaScript, name, fqn.clone())
                .with_location(self.span(node)),
        );
        self.defined_in(&id);

        if let Some(heritage) = Self::find_child(node, &["class_heritage"]) {
            if let Some(super_node) = Self::find_child(heritage, &["identifier", "member_expression"]) {
                let super_name = self.text(super_node);
                let (target_id, target_fqn) = self.resolve_ref(&super_name, scope);
                self.push_unresolved_class(&target_id, &target_fqn);
                self.edges.push(Edge::new(EdgeKind::Extends, id.clone(), target_id));
            }
        }

        if let Some(body) = Self::find_child(node, &["class_body"]) {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                if member.kind() != "method_definition" {
                    continue;
                }
                let Some(name_node) = member.child_by_field_name("name") else {
                    continue;
                };
                let method_name = self.text(name_node);
                let method_id = identity::member_id(Language::JavaScript, &fqn, &method_name);
                self.push_vertex(
                    Vertex::new(method_id.clone(), PrimaryLabel::Method, Language::JavaScript, method_name, format!("{fqn}::{}", self.text(name_node)))
                        .with_location(self.span(member)),
                );
                self.defined_in(&method_id);
                self.edges
                    .push(Edge::new(EdgeKind::HasMethod, id.clone(), method_id.clone()));

                let mut body_scope = scope.clone();
                body_scope.current_container_id = Some(method_id);
                if let Some(method_body) = member.child_by_field_name("body") {
                    self.walk(method_body, body_scope);
                }
            }
        }
    }

    // -- call/new sites ---------------------------------------------------

    fn handle_new_expression(&mut self, node: Node, scope: &Scope) {
        let Some(ctor) = Self::find_child(node, &["identifier", "member_expression"]) else {
            return;
        };
        let name = self.text(ctor);
        let (target_id, target_fqn) = self.resolve_ref(&name, scope);
        self.push_unresolved_class(&target_id, &target_fqn);
        let container = self.container_or_file(scope);
        self.edges.push(
            Edge::new(EdgeKind::Instantiates, container, target_id).at(
                node.start_position().row as u32 + 1,
                node.start_position().column as u32 + 1,
            ),
        );
    }

    fn handle_call_expression(&mut self, node: Node, scope: &Scope) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let callee = self.text(function);

        if callee == "define" {
            self.handle_amd_define(node, scope);
            return;
        }

        let Some(args) = node.child_by_field_name("arguments") else {
            return;
        };

        let resolved = if callee == "fetch" {
            self.extract_fetch(args)
        } else if callee == "$.ajax" || callee == "jQuery.ajax" {
            self.extract_ajax_object(args)
        } else if let Some(method) = match_suffix(&callee, "axios.", "") {
            HTTP_METHODS
                .iter()
                .find(|m| m.eq_ignore_ascii_case(method))
                .and_then(|m| args.named_child(0).map(|u| (m.to_ascii_uppercase(), u)))
                .and_then(|(m, u)| self.extract_url(u).map(|url| (m, url)))
        } else if let Some(method) = request_suffix_method(&callee) {
            args.named_child(0)
                .and_then(|u| self.extract_url(u))
                .map(|url| (method, url))
        } else {
            None
        };

        if let Some((method, url)) = resolved {
            self.emit_calls_api(node, &method, &url, scope);
        }
    }

    fn extract_fetch(&mut self, args: Node) -> Option<(String, String)> {
        let url_node = args.named_child(0)?;
        let url = self.extract_url(url_node)?;
        let mut method = "GET".to_string();
        if let Some(opts) = args.named_child(1) {
            if opts.kind() == "object" {
                if let Some(m) = self.object_string_property(opts, &["method"]) {
                    method = m.to_ascii_uppercase();
                }
            }
        }
        Some((method, url))
    }

    fn extract_ajax_object(&mut self, args: Node) -> Option<(String, String)> {
        let obj = args.named_child(0)?;
        if obj.kind() != "object" {
            return None;
        }
        let url = self.object_string_property(obj, &["url"])?;
        let url = self.extract_url_from_text(&url);
        let method = self
            .object_string_property(obj, &["method", "type"])
            .map(|m| m.to_ascii_uppercase())
            .unwrap_or_else(|| "GET".to_string());
        Some((method, url))
    }

    fn object_string_property(&self, obj: Node, keys: &[&str]) -> Option<String> {
        let mut cursor = obj.walk();
        for pair in obj.children(&mut cursor) {
            if pair.kind() != "pair" {
                continue;
            }
            let Some(key_node) = pair.child_by_field_name("key") else {
                continue;
            };
            let key_text = self.text(key_node);
            let key_text = key_text.trim_matches(|c| c == '\'' || c == '"');
            if !keys.iter().any(|k| k.eq_ignore_ascii_case(key_text)) {
                continue;
            }
            let value = pair.child_by_field_name("value")?;
            return self.string_literal_value(value).or(Some(self.text(value)));
        }
        None
    }

    fn extract_url_from_text(&self, raw: &str) -> String {
        raw.to_string()
    }

    /// Static string, or a template literal / concatenation whose static
    /// prefix is identifiable (appended with `{id}`); returns `None` for a
    /// fully dynamic URL (§4.5 item 6).
    fn extract_url(&self, node: Node) -> Option<String> {
        match node.kind() {
            "string" => self.string_literal_value(node),
            "template_string" => {
                let mut cursor = node.walk();
                let mut prefix = String::new();
                let mut saw_substitution = false;
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "string_fragment" => prefix.push_str(&self.text(child)),
                        "template_substitution" => {
                            saw_substitution = true;
                            break;
                        }
                        _ => {}
                    }
                }
                if !saw_substitution {
                    return Some(prefix);
                }
                if prefix.is_empty() {
                    None
                } else {
                    Some(format!("{prefix}{{id}}"))
                }
            }
            "binary_expression" => {
                let left = node.child_by_field_name("left")?;
                let prefix = self.extract_url(left)?;
                Some(format!("{prefix}{{id}}"))
            }
            _ => None,
        }
    }

    fn emit_calls_api(&mut self, node: Node, method: &str, raw_url: &str, scope: &Scope) {
        let normalized = identity::normalize_endpoint_path(raw_url);
        let endpoint_id = identity::endpoint_id(method, &normalized);
        let qualified_name = format!("{} {}", method.to_ascii_uppercase(), normalized);
        self.push_vertex(
            Vertex::new(endpoint_id.clone(), PrimaryLabel::Endpoint, Language::Api, qualified_name.clone(), qualified_name)
                .with_attr("method", method.to_ascii_uppercase()),
        );
        let container = self.container_or_file(scope);
        self.edges.push(
            Edge::new(EdgeKind::CallsApi, container, endpoint_id).at(
                node.start_position().row as u32 + 1,
                node.start_position().column as u32 + 1,
            ),
        );
    }

    fn handle_amd_define(&mut self, node: Node, scope: &Scope) {
        let Some(args) = node.child_by_field_name("arguments") else {
            return;
        };
        let mut deps_node = None;
        let mut factory_node = None;
        let mut cursor = args.walk();
        for child in args.children(&mut cursor) {
            match child.kind() {
                "array" => deps_node = Some(child),
                "function_expression" | "arrow_function" => factory_node = Some(child),
                _ => {}
            }
        }
        if let Some(deps) = deps_node {
            let mut dep_cursor = deps.walk();
            for dep in deps.children(&mut dep_cursor) {
                let Some(spec) = self.string_literal_value(dep) else {
                    continue;
                };
                let target_id = identity::module_id(&spec);
                self.push_vertex(Vertex::new(
                    target_id.clone(),
                    PrimaryLabel::Module,
                    Language::JavaScript,
                    spec.rsplit('/').next().unwrap_or(&spec).to_string(),
                    spec,
                ));
                self.edges
                    .push(Edge::new(EdgeKind::Imports, self.module_id.clone(), target_id));
            }
        }
        if let Some(factory) = factory_node {
            let anon_id = self.next_anon_id(factory);
            self.push_vertex(
                Vertex::new(anon_id.clone(), PrimaryLabel::Function, Language::JavaScript, "<amd-factory>".to_string(), format!("{}::<amd-factory>", self.file_path_str))
                    .with_location(self.span(factory)),
            );
            self.defined_in(&anon_id);
            let mut body_scope = scope.clone();
            body_scope.current_container_id = Some(anon_id);
            if let Some(body) = Self::find_child(factory, &["statement_block"]) {
                self.walk(body, body_scope);
            }
        }
    }
}

fn match_suffix<'a>(text: &'a str, prefix: &str, _suffix: &str) -> Option<&'a str> {
    text.strip_prefix(prefix)
}

/// `Foo.Ajax.getRequest` -> `Some("GET")`, generalizing §4.5's
/// `Foo.Ajax.METHODRequest(url, ...)` pattern.
fn request_suffix_method(callee: &str) -> Option<String> {
    let last_segment = callee.rsplit('.').next()?;
    let lower = last_segment.to_ascii_lowercase();
    let method_token = lower.strip_suffix("request")?;
    HTTP_METHODS
        .iter()
        .find(|m| **m == method_token)
        .map(|m| m.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> ParseResult {
        JavaScriptExtractor.parse_file(Path::new("/r/view.js"), src.as_bytes())
    }

    #[test]
    fn fetch_call_in_method_produces_calls_api_edge() {
        let result = extract("class V { load() { fetch('/api/v1/Lead/' + id); } }");
        let endpoint = result
            .vertices
            .iter()
            .find(|v| v.label == PrimaryLabel::Endpoint)
            .expect("endpoint vertex");
        assert_eq!(endpoint.qualified_name, "GET /api/v1/Lead/{id}");

        let method = result.vertices.iter().find(|v| v.label == PrimaryLabel::Method).unwrap();
        assert!(result
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::CallsApi && e.source_id == method.id && e.target_id == endpoint.id));
    }

    #[test]
    fn module_top_level_fetch_attributes_to_file_vertex() {
        let result = extract("fetch('/api/v1/Lead');");
        let file = result.vertices.iter().find(|v| v.label == PrimaryLabel::File).unwrap();
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::CallsApi && e.source_id == file.id));
    }

    #[test]
    fn fully_dynamic_url_is_skipped_not_crashed_on() {
        let result = extract("fetch(someDynamicUrl);");
        assert!(!result.vertices.iter().any(|v| v.label == PrimaryLabel::Endpoint));
    }

    #[test]
    fn axios_get_detected() {
        let result = extract("function run() { axios.get('/api/v1/Lead'); }");
        let endpoint = result.vertices.iter().find(|v| v.label == PrimaryLabel::Endpoint).unwrap();
        assert_eq!(endpoint.qualified_name, "GET /api/v1/Lead");
    }

    #[test]
    fn framework_ajax_method_request_detected() {
        let result = extract("function run() { Espo.Ajax.postRequest('/api/v1/Lead'); }");
        let endpoint = result.vertices.iter().find(|v| v.label == PrimaryLabel::Endpoint).unwrap();
        assert_eq!(endpoint.qualified_name, "POST /api/v1/Lead");
    }

    #[test]
    fn es6_import_produces_module_and_imports_edge() {
        let result = extract("import Foo from './foo';");
        let module_v = result.vertices.iter().find(|v| v.label == PrimaryLabel::Module && v.qualified_name == "./foo");
        assert!(module_v.is_some());
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::Imports));
    }

    #[test]
    fn commonjs_require_produces_imports_edge() {
        let result = extract("const foo = require('./foo');");
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::Imports));
    }

    #[test]
    fn backbone_extend_produces_class_and_extends_edge() {
        let result = extract("const MyView = Backbone.View.extend({ render: function() {} });");
        let class_v = result.vertices.iter().find(|v| v.label == PrimaryLabel::Class).unwrap();
        assert_eq!(class_v.name, "MyView");
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::Extends && e.source_id == class_v.id));
        assert!(result.vertices.iter().any(|v| v.label == PrimaryLabel::Method && v.name == "render"));
    }

    #[test]
    fn es6_class_extends_produces_extends_edge() {
        let result = extract("class Child extends Parent { go() {} }");
        let child = result.vertices.iter().find(|v| v.label == PrimaryLabel::Class).unwrap();
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::Extends && e.source_id == child.id));
        assert!(result.vertices.iter().any(|v| v.label == PrimaryLabel::Method && v.name == "go"));
    }

    #[test]
    fn new_expression_produces_instantiates_edge() {
        let result = extract("function make() { return new Widget(); }");
        let make = result.vertices.iter().find(|v| v.name == "make").unwrap();
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::Instantiates && e.source_id == make.id));
    }

    #[test]
    fn amd_define_records_deps_as_imports() {
        let result = extract("define(['dep1', 'dep2'], function(a, b) { fetch('/api/v1/Lead'); });");
        assert_eq!(result.edges.iter().filter(|e| e.kind == EdgeKind::Imports).count(), 2);
        assert!(result.vertices.iter().any(|v| v.label == PrimaryLabel::Endpoint));
    }
}
