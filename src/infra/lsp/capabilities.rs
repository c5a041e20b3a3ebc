//! Workspace symbol capability checks
//!
//! What a running server advertises decides whether a search may be sent;
//! the static matrix only feeds `doctor` output.

use serde_json::Value;

use super::protocol::ServerCapabilities;
use crate::models::symbol::Language;

/// Whether `workspaceSymbolProvider` is `true` or an options object
pub fn provides_workspace_symbols(capabilities: &ServerCapabilities) -> bool {
    match &capabilities.workspace_symbol_provider {
        Some(Value::Bool(enabled)) => *enabled,
        Some(Value::Object(_)) => true,
        _ => false,
    }
}

/// Support level for workspace symbols, as observed in practice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportLevel {
    Full,
    Partial,
}

impl SupportLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
        }
    }
}

pub fn workspace_symbol_support(language: Language) -> SupportLevel {
    match language {
        // kotlin-lsp answers with class-level symbols only
        Language::Kotlin => SupportLevel::Partial,
        // tsserver only knows files from projects it has loaded
        Language::TypeScript | Language::JavaScript => SupportLevel::Partial,
        Language::Lua | Language::Zig => SupportLevel::Partial,
        _ => SupportLevel::Full,
    }
}

/// Caveat worth printing next to a partially supported language
pub fn support_note(language: Language) -> Option<&'static str> {
    match language {
        Language::Kotlin => Some("Only class-level symbols are reported"),
        Language::TypeScript | Language::JavaScript => {
            Some("Results cover projects tsserver has loaded; pass --file inside the project")
        }
        Language::Lua | Language::Zig => Some("Results depend on workspace configuration"),
        _ => None,
    }
}

/// Human-readable language name
pub fn language_display_name(language: Language) -> &'static str {
    match language {
        Language::Rust => "Rust",
        Language::Cpp => "C/C++",
        Language::Zig => "Zig",
        Language::Java => "Java",
        Language::Kotlin => "Kotlin",
        Language::CSharp => "C#",
        Language::TypeScript => "TypeScript",
        Language::JavaScript => "JavaScript",
        Language::Python => "Python",
        Language::Ruby => "Ruby",
        Language::PHP => "PHP",
        Language::Lua => "Lua",
        Language::Go => "Go",
        Language::Unknown => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(provider: Option<Value>) -> ServerCapabilities {
        ServerCapabilities {
            workspace_symbol_provider: provider,
            ..Default::default()
        }
    }

    #[test]
    fn test_provider_variants() {
        assert!(provides_workspace_symbols(&caps(Some(Value::Bool(true)))));
        assert!(provides_workspace_symbols(&caps(Some(
            serde_json::json!({"resolveProvider": true})
        ))));
        assert!(!provides_workspace_symbols(&caps(Some(Value::Bool(false)))));
        assert!(!provides_workspace_symbols(&caps(None)));
        assert!(!provides_workspace_symbols(&caps(Some(Value::Null))));
    }

    #[test]
    fn test_support_matrix() {
        assert_eq!(workspace_symbol_support(Language::Rust), SupportLevel::Full);
        assert_eq!(
            workspace_symbol_support(Language::Kotlin),
            SupportLevel::Partial
        );
        assert!(support_note(Language::Kotlin).is_some());
        assert!(support_note(Language::Go).is_none());
    }
}
