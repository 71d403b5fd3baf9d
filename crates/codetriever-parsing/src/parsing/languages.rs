//! Language-specific configurations for code parsing
//!
//! This module centralizes tree-sitter grammar registration and the
//! extension-to-language mapping used to dispatch a file to the right
//! chunker. Not every extension the Chunker is asked about has a
//! registered grammar: [`get_language_from_extension`] still returns a
//! language id for those (so callers can label the chunk), but
//! [`get_language_config`] returns `None` and the caller falls back to a
//! line-oriented heuristic.

use lazy_static::lazy_static;
use std::collections::HashMap;
use tree_sitter::Language;

/// Configuration for a specific programming language
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// The language identifier (e.g., "rust", "python")
    pub id: &'static str,
    /// File extensions associated with this language
    pub extensions: &'static [&'static str],
    /// Tree-sitter language parser
    pub tree_sitter_language: Option<Language>,
    /// Tree-sitter query for extracting code elements
    pub tree_sitter_query: Option<&'static str>,
    /// Keywords that indicate function definitions (heuristic fallback only)
    pub function_keywords: &'static [&'static str],
    /// Keywords that indicate class/type definitions (heuristic fallback only)
    pub class_keywords: &'static [&'static str],
    /// Whether the language uses braces for blocks
    pub uses_braces: bool,
    /// Whether the language uses indentation for blocks (like Python)
    pub uses_indentation: bool,
}

impl LanguageConfig {
    /// Creates a new language configuration
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            extensions: &[],
            tree_sitter_language: None,
            tree_sitter_query: None,
            function_keywords: &[],
            class_keywords: &[],
            uses_braces: true,
            uses_indentation: false,
        }
    }

    /// Builder method to set extensions
    pub const fn with_extensions(mut self, extensions: &'static [&'static str]) -> Self {
        self.extensions = extensions;
        self
    }

    /// Builder method to set tree-sitter language
    pub fn with_tree_sitter(mut self, language: Language, query: &'static str) -> Self {
        self.tree_sitter_language = Some(language);
        self.tree_sitter_query = Some(query);
        self
    }

    /// Builder method to set function keywords
    pub const fn with_function_keywords(mut self, keywords: &'static [&'static str]) -> Self {
        self.function_keywords = keywords;
        self
    }

    /// Builder method to set class keywords
    pub const fn with_class_keywords(mut self, keywords: &'static [&'static str]) -> Self {
        self.class_keywords = keywords;
        self
    }

    /// Builder method to set block style
    pub const fn with_block_style(mut self, uses_braces: bool, uses_indentation: bool) -> Self {
        self.uses_braces = uses_braces;
        self.uses_indentation = uses_indentation;
        self
    }
}

lazy_static! {
    /// Registry of languages with a registered tree-sitter grammar.
    pub static ref LANGUAGE_REGISTRY: HashMap<&'static str, LanguageConfig> = {
        let mut registry = HashMap::new();

        registry.insert(
            "rust",
            LanguageConfig::new("rust")
                .with_extensions(&["rs"])
                .with_tree_sitter(
                    tree_sitter_rust::LANGUAGE.into(),
                    r#"
                    (function_item) @function
                    (impl_item) @impl
                    (struct_item) @struct
                    (enum_item) @enum
                    (trait_item) @trait
                    (mod_item) @module
                    "#,
                )
                .with_function_keywords(&["fn ", "pub fn", "pub(crate) fn", "async fn"])
                .with_class_keywords(&["struct ", "enum ", "trait ", "impl "])
                .with_block_style(true, false),
        );

        registry.insert(
            "python",
            LanguageConfig::new("python")
                .with_extensions(&["py", "pyi"])
                .with_tree_sitter(
                    tree_sitter_python::LANGUAGE.into(),
                    r#"
                    (function_definition) @function
                    (class_definition) @class
                    "#,
                )
                .with_function_keywords(&["def ", "async def "])
                .with_class_keywords(&["class "])
                .with_block_style(false, true),
        );

        registry.insert(
            "javascript",
            LanguageConfig::new("javascript")
                .with_extensions(&["js", "mjs", "cjs", "jsx"])
                .with_tree_sitter(
                    tree_sitter_javascript::LANGUAGE.into(),
                    r#"
                    (function_declaration) @function
                    (arrow_function) @arrow_function
                    (class_declaration) @class
                    (method_definition) @method
                    "#,
                )
                .with_function_keywords(&["function ", "async function ", "const ", "let ", "var "])
                .with_class_keywords(&["class "])
                .with_block_style(true, false),
        );

        registry.insert(
            "typescript",
            LanguageConfig::new("typescript")
                .with_extensions(&["ts", "mts", "cts"])
                .with_tree_sitter(
                    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                    r#"
                    (function_declaration) @function
                    (arrow_function) @arrow_function
                    (class_declaration) @class
                    (method_definition) @method
                    (interface_declaration) @interface
                    "#,
                )
                .with_function_keywords(&["function ", "async function ", "const ", "let ", "var "])
                .with_class_keywords(&["class ", "interface ", "type ", "enum "])
                .with_block_style(true, false),
        );

        registry.insert(
            "tsx",
            LanguageConfig::new("tsx")
                .with_extensions(&["tsx"])
                .with_tree_sitter(
                    tree_sitter_typescript::LANGUAGE_TSX.into(),
                    r#"
                    (function_declaration) @function
                    (arrow_function) @arrow_function
                    (class_declaration) @class
                    (method_definition) @method
                    "#,
                )
                .with_function_keywords(&["function ", "async function ", "const ", "let ", "var "])
                .with_class_keywords(&["class ", "interface "])
                .with_block_style(true, false),
        );

        registry.insert(
            "go",
            LanguageConfig::new("go")
                .with_extensions(&["go"])
                .with_tree_sitter(
                    tree_sitter_go::LANGUAGE.into(),
                    r#"
                    (function_declaration) @function
                    (method_declaration) @method
                    (type_declaration) @type
                    "#,
                )
                .with_function_keywords(&["func "])
                .with_class_keywords(&["type ", "struct ", "interface "])
                .with_block_style(true, false),
        );

        registry.insert(
            "java",
            LanguageConfig::new("java")
                .with_extensions(&["java"])
                .with_tree_sitter(
                    tree_sitter_java::LANGUAGE.into(),
                    r#"
                    (class_declaration) @class
                    (interface_declaration) @interface
                    (method_declaration) @method
                    "#,
                )
                .with_function_keywords(&["public ", "private ", "protected ", "static "])
                .with_class_keywords(&["class ", "interface ", "enum "])
                .with_block_style(true, false),
        );

        registry.insert(
            "c",
            LanguageConfig::new("c")
                .with_extensions(&["c", "h"])
                .with_tree_sitter(
                    tree_sitter_c::LANGUAGE.into(),
                    r#"
                    (function_definition) @function
                    (struct_specifier) @struct
                    "#,
                )
                .with_function_keywords(&["int ", "void ", "char ", "float ", "double ", "static "])
                .with_class_keywords(&["struct ", "typedef ", "enum ", "union "])
                .with_block_style(true, false),
        );

        registry.insert(
            "cpp",
            LanguageConfig::new("cpp")
                .with_extensions(&["cpp", "cxx", "cc", "c++", "hpp", "hxx", "hh", "h++"])
                .with_tree_sitter(
                    tree_sitter_cpp::LANGUAGE.into(),
                    r#"
                    (function_definition) @function
                    (struct_specifier) @struct
                    (class_specifier) @class
                    "#,
                )
                .with_function_keywords(&["void ", "int ", "bool ", "auto ", "template "])
                .with_class_keywords(&["class ", "struct ", "namespace ", "template "])
                .with_block_style(true, false),
        );

        registry.insert(
            "csharp",
            LanguageConfig::new("csharp")
                .with_extensions(&["cs", "csx"])
                .with_tree_sitter(
                    tree_sitter_c_sharp::LANGUAGE.into(),
                    r#"
                    (namespace_declaration) @namespace
                    (class_declaration) @class
                    (interface_declaration) @interface
                    (struct_declaration) @struct
                    (record_declaration) @record
                    (enum_declaration) @enum
                    (method_declaration) @method
                    (constructor_declaration) @constructor
                    (property_declaration) @property
                    (field_declaration) @field
                    (event_declaration) @event
                    (event_field_declaration) @event
                    (indexer_declaration) @indexer
                    "#,
                )
                .with_function_keywords(&["public ", "private ", "protected ", "internal ", "static ", "async ", "override ", "virtual "])
                .with_class_keywords(&["class ", "interface ", "struct ", "enum ", "record "])
                .with_block_style(true, false),
        );

        registry
    };

    /// Map of file extensions to language ids, including extensions from
    /// spec's broader RepoFetcher allow-list that have no tree-sitter
    /// grammar registered above (those fall back to heuristic chunking).
    pub static ref EXTENSION_MAP: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();

        for (lang_id, config) in LANGUAGE_REGISTRY.iter() {
            for ext in config.extensions {
                map.insert(*ext, *lang_id);
            }
        }

        // Grammar-less languages: identified for labeling, parsed heuristically.
        map.insert("php", "php");
        map.insert("rb", "ruby");
        map.insert("kt", "kotlin");
        map.insert("scala", "scala");
        map.insert("swift", "swift");
        map.insert("dart", "dart");
        map.insert("vue", "vue");

        map
    };
}

/// Gets a language configuration by id.
#[must_use]
pub fn get_language_config(language_id: &str) -> Option<&'static LanguageConfig> {
    LANGUAGE_REGISTRY.get(language_id)
}

/// Gets a language id from a raw extension (no leading dot), e.g. `"rs"`.
#[must_use]
pub fn get_language_for_extension(extension: &str) -> Option<&'static str> {
    EXTENSION_MAP.get(extension).copied()
}

/// Gets a language id from a file path by inspecting its extension.
#[must_use]
pub fn get_language_from_extension(file_path: &str) -> Option<String> {
    let extension = std::path::Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())?;
    get_language_for_extension(&extension.to_lowercase()).map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_registry_initialization() {
        assert!(!LANGUAGE_REGISTRY.is_empty());
        assert!(LANGUAGE_REGISTRY.contains_key("rust"));
        assert!(LANGUAGE_REGISTRY.contains_key("python"));
        assert!(LANGUAGE_REGISTRY.contains_key("csharp"));
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(get_language_for_extension("rs"), Some("rust"));
        assert_eq!(get_language_for_extension("py"), Some("python"));
        assert_eq!(get_language_for_extension("cs"), Some("csharp"));
        assert_eq!(get_language_for_extension("go"), Some("go"));
    }

    #[test]
    fn test_grammar_less_extensions_still_labeled() {
        assert_eq!(get_language_for_extension("php"), Some("php"));
        assert!(get_language_config("php").is_none());
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            get_language_from_extension("src/main.rs"),
            Some("rust".to_string())
        );
        assert_eq!(get_language_from_extension("no_extension"), None);
    }

    #[test]
    fn test_csharp_configuration() {
        let cs_config = get_language_config("csharp").expect("csharp registered");
        assert_eq!(cs_config.id, "csharp");
        assert!(cs_config.extensions.contains(&"cs"));
        assert!(cs_config.tree_sitter_language.is_some());
        let query = cs_config.tree_sitter_query.expect("query present");
        assert!(query.contains("namespace_declaration"));
        assert!(query.contains("constructor_declaration"));
        assert!(query.contains("indexer_declaration"));
    }

    #[test]
    fn test_all_registered_languages_have_grammar_and_extensions() {
        for (lang, config) in LANGUAGE_REGISTRY.iter() {
            assert_eq!(config.id, *lang);
            assert!(!config.extensions.is_empty(), "{lang} has no extensions");
            assert!(
                config.tree_sitter_language.is_some(),
                "{lang} has no tree-sitter language"
            );
            assert!(
                config.tree_sitter_query.is_some(),
                "{lang} has no tree-sitter query"
            );
        }
    }

    #[test]
    fn test_extension_uniqueness() {
        type ExtensionMap<'a> = HashMap<&'a str, Vec<&'a str>>;
        let mut extension_count: ExtensionMap = HashMap::new();

        for (lang_id, config) in LANGUAGE_REGISTRY.iter() {
            for ext in config.extensions {
                extension_count.entry(ext).or_default().push(lang_id);
            }
        }

        let allowed_duplicates = ["h", "hpp"];

        for (ext, langs) in &extension_count {
            if langs.len() > 1 && !allowed_duplicates.contains(ext) {
                panic!("Extension '{ext}' maps to multiple languages: {langs:?}");
            }
        }
    }
}
