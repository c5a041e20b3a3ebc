//! Symbol model definitions
//!
//! Core types for representing workspace symbol results from LSP.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::lsp::{Position, Range};

/// A symbol returned by `workspace/symbol`
///
/// Constructed only from a validated protocol entry, so `location` is always
/// present. Instances are plain values: they are never mutated after
/// construction and carry no identity beyond their content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntity {
    pub name: String,
    pub kind: SymbolKind,
    pub container_name: Option<String>,
    pub location: Location,
}

impl SymbolEntity {
    pub fn new(name: impl Into<String>, kind: SymbolKind, location: Location) -> Self {
        Self {
            name: name.into(),
            kind,
            container_name: None,
            location,
        }
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container_name = Some(container.into());
        self
    }

    /// Container name, or an empty string when the server sent none
    pub fn container(&self) -> &str {
        self.container_name.as_deref().unwrap_or("")
    }

    /// Zero-based start point of the symbol
    pub fn start(&self) -> Position {
        self.location.range.start
    }
}

/// A user-entered search string
///
/// Empty text is valid and asks the server for every symbol.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Symbol classification (aligned with LSP SymbolKind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    File,
    Module,
    Namespace,
    Package,
    Class,
    Method,
    Property,
    Field,
    Constructor,
    Enum,
    Interface,
    Function,
    Variable,
    Constant,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Key,
    Null,
    EnumMember,
    Struct,
    Event,
    Operator,
    TypeParameter,
    /// A code outside the LSP enumeration, kept for diagnostics
    Unknown(u32),
}

impl SymbolKind {
    /// Every kind the client advertises in `symbolKind.valueSet`
    pub const ALL_LSP_CODES: std::ops::RangeInclusive<u32> = 1..=26;

    /// Convert from LSP SymbolKind number
    pub fn from_lsp(kind: u32) -> Self {
        match kind {
            1 => Self::File,
            2 => Self::Module,
            3 => Self::Namespace,
            4 => Self::Package,
            5 => Self::Class,
            6 => Self::Method,
            7 => Self::Property,
            8 => Self::Field,
            9 => Self::Constructor,
            10 => Self::Enum,
            11 => Self::Interface,
            12 => Self::Function,
            13 => Self::Variable,
            14 => Self::Constant,
            15 => Self::String,
            16 => Self::Number,
            17 => Self::Boolean,
            18 => Self::Array,
            19 => Self::Object,
            20 => Self::Key,
            21 => Self::Null,
            22 => Self::EnumMember,
            23 => Self::Struct,
            24 => Self::Event,
            25 => Self::Operator,
            26 => Self::TypeParameter,
            other => Self::Unknown(other),
        }
    }

    /// Display label used in chooser items
    pub fn label(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Module => "module",
            Self::Namespace => "namespace",
            Self::Package => "package",
            Self::Class => "class",
            Self::Method => "method",
            Self::Property => "property",
            Self::Field => "field",
            Self::Constructor => "constructor",
            Self::Enum => "enum",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Key => "key",
            Self::Null => "null",
            Self::EnumMember => "enum member",
            Self::Struct => "struct",
            Self::Event => "event",
            Self::Operator => "operator",
            Self::TypeParameter => "type parameter",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Symbol location as sent by the server
///
/// `uri` always names a file; the range is zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

impl Location {
    pub fn new(uri: impl Into<String>, range: Range) -> Self {
        Self {
            uri: uri.into(),
            range,
        }
    }

    /// Location for a single zero-based position
    pub fn point(uri: impl Into<String>, line: u32, character: u32) -> Self {
        Self::new(uri, Range::point(Position::new(line, character)))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.uri, self.range.start.line, self.range.start.character
        )
    }
}

/// Where the host should jump to
///
/// `line` and `column` are 1-based: a symbol starting at zero-based row 4,
/// column 2 opens at line 5, column 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenInstruction {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl OpenInstruction {
    /// `path:line:column`, the form editors accept on the command line
    pub fn encoded(&self) -> String {
        format!("{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

// ============================================================================
// Language
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    // === Systems Languages ===
    Rust,
    Cpp,
    Zig,

    // === JVM Languages ===
    Java,
    Kotlin,

    // === .NET Languages ===
    CSharp,

    // === Web Languages ===
    TypeScript,
    JavaScript,

    // === Scripting Languages ===
    Python,
    Ruby,
    PHP,
    Lua,

    // === Application Languages ===
    Go,

    #[default]
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Self::Rust,
            "c" | "cpp" | "cc" | "cxx" | "h" | "hpp" | "hxx" => Self::Cpp,
            "zig" => Self::Zig,
            "java" => Self::Java,
            "kt" | "kts" => Self::Kotlin,
            "cs" => Self::CSharp,
            "ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "py" | "pyi" => Self::Python,
            "rb" | "rake" | "gemspec" => Self::Ruby,
            "php" => Self::PHP,
            "lua" => Self::Lua,
            "go" => Self::Go,
            _ => Self::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Get LSP language ID
    pub fn lsp_id(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Cpp => "cpp",
            Self::Zig => "zig",
            Self::Java => "java",
            Self::Kotlin => "kotlin",
            Self::CSharp => "csharp",
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Ruby => "ruby",
            Self::PHP => "php",
            Self::Lua => "lua",
            Self::Go => "go",
            Self::Unknown => "plaintext",
        }
    }

    /// Get all supported languages (excluding Unknown)
    pub fn all() -> Vec<Self> {
        vec![
            Self::Rust,
            Self::Cpp,
            Self::Zig,
            Self::Java,
            Self::Kotlin,
            Self::CSharp,
            Self::TypeScript,
            Self::JavaScript,
            Self::Python,
            Self::Ruby,
            Self::PHP,
            Self::Lua,
            Self::Go,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lsp_id())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rust" | "rs" => Ok(Self::Rust),
            "cpp" | "c++" | "c" => Ok(Self::Cpp),
            "zig" => Ok(Self::Zig),
            "java" => Ok(Self::Java),
            "kotlin" | "kt" => Ok(Self::Kotlin),
            "csharp" | "c#" | "cs" => Ok(Self::CSharp),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "javascript" | "js" => Ok(Self::JavaScript),
            "python" | "py" => Ok(Self::Python),
            "ruby" | "rb" => Ok(Self::Ruby),
            "php" => Ok(Self::PHP),
            "lua" => Ok(Self::Lua),
            "go" | "golang" => Ok(Self::Go),
            _ => Err(format!("Unknown language: {}", s)),
        }
    }
}
