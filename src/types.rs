//! Core vertex/edge data model shared by every extractor, the store gateway,
//! and the linker.
//!
//! A [`Vertex`] models §3.1 as a single struct carrying a discriminant
//! ([`PrimaryLabel`]) rather than a sum type per label. The header fields
//! (id, name, qualified_name, source location, attributes) are identical
//! across labels, and a flat struct keeps the store-row conversion in
//! `db::converters` a straight field copy instead of a match per variant.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One of the thirteen vertex kinds the schema recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimaryLabel {
    Directory,
    File,
    Namespace,
    Class,
    Interface,
    Trait,
    Method,
    Property,
    Constant,
    Function,
    Module,
    Endpoint,
    Unresolved,
    /// Not in §3.1's enumerated list verbatim, but required by §3.4's
    /// `REGISTERED_IN` edge target and §6.2's metadata enricher.
    ConfigFile,
}

impl PrimaryLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryLabel::Directory => "Directory",
            PrimaryLabel::File => "File",
            PrimaryLabel::Namespace => "Namespace",
            PrimaryLabel::Class => "Class",
            PrimaryLabel::Interface => "Interface",
            PrimaryLabel::Trait => "Trait",
            PrimaryLabel::Method => "Method",
            PrimaryLabel::Property => "Property",
            PrimaryLabel::Constant => "Constant",
            PrimaryLabel::Function => "Function",
            PrimaryLabel::Module => "Module",
            PrimaryLabel::Endpoint => "Endpoint",
            PrimaryLabel::Unresolved => "Unresolved",
            PrimaryLabel::ConfigFile => "ConfigFile",
        }
    }
}

impl fmt::Display for PrimaryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Language tag carried on every vertex for federation (§4.2 `_language`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Php,
    JavaScript,
    Filesystem,
    Api,
    Framework,
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Php => "php",
            Language::JavaScript => "javascript",
            Language::Filesystem => "filesystem",
            Language::Api => "api",
            Language::Framework => "framework",
            Language::Unknown => "unknown",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "php" => Some(Language::Php),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single attribute value (§3.1: "primitive-typed values").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<AttrValue>),
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}
impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}
impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}
impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}
impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

/// Attribute map. `BTreeMap` keeps flattened-key output (and test
/// assertions) order-stable.
pub type Attributes = BTreeMap<String, AttrValue>;

/// `(file_path, start_line, start_column, end_line, end_column)` per §3.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub file_path: PathBuf,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceSpan {
    pub fn point(file_path: PathBuf, line: u32, column: u32) -> Self {
        Self {
            file_path,
            start_line: line,
            start_column: column,
            end_line: line,
            end_column: column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: String,
    pub label: PrimaryLabel,
    pub language: Language,
    pub name: String,
    pub qualified_name: String,
    pub location: Option<SourceSpan>,
    pub attributes: Attributes,
}

impl Vertex {
    pub fn new(
        id: impl Into<String>,
        label: PrimaryLabel,
        language: Language,
        name: impl Into<String>,
        qualified_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label,
            language,
            name: name.into(),
            qualified_name: qualified_name.into(),
            location: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_location(mut self, location: SourceSpan) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn is_unresolved(&self) -> bool {
        self.label == PrimaryLabel::Unresolved
    }
}

/// The closed edge-type enum of §3.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Contains,
    InDirectory,
    DefinedIn,
    Extends,
    Implements,
    UsesTrait,
    HasMethod,
    HasProperty,
    HasConstant,
    Calls,
    Instantiates,
    Imports,
    CallsApi,
    Handles,
    RegisteredIn,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::InDirectory => "IN_DIRECTORY",
            EdgeKind::DefinedIn => "DEFINED_IN",
            EdgeKind::Extends => "EXTENDS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::UsesTrait => "USES_TRAIT",
            EdgeKind::HasMethod => "HAS_METHOD",
            EdgeKind::HasProperty => "HAS_PROPERTY",
            EdgeKind::HasConstant => "HAS_CONSTANT",
            EdgeKind::Calls => "CALLS",
            EdgeKind::Instantiates => "INSTANTIATES",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::CallsApi => "CALLS_API",
            EdgeKind::Handles => "HANDLES",
            EdgeKind::RegisteredIn => "REGISTERED_IN",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub source_id: String,
    pub target_id: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub attributes: Attributes,
}

impl Edge {
    pub fn new(kind: EdgeKind, source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            kind,
            source_id: source_id.into(),
            target_id: target_id.into(),
            line: None,
            column: None,
            attributes: Attributes::new(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Severity of a [`Diagnostic`]. Fatal diagnostics mean the producing unit
/// of work (file, batch, link pass) made no forward progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: Option<SourceSpan>,
}

impl Diagnostic {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            message: message.into(),
            location: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: SourceSpan) -> Self {
        self.location = Some(location);
        self
    }
}

/// Output of a single extractor invocation (§4.3).
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub file_path: PathBuf,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    pub fn empty(file_path: PathBuf) -> Self {
        Self {
            file_path,
            vertices: Vec::new(),
            edges: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn failed(file_path: PathBuf, diagnostic: Diagnostic) -> Self {
        let mut result = Self::empty(file_path);
        result.diagnostics.push(diagnostic);
        result
    }
}
