#![warn(missing_docs)]
//! `caret-lang` - data-driven language identification helpers for `caret-core`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any tokenizer or
//! grammar implementation. It answers three questions for a host:
//!
//! - which language key a file path / extension maps to
//! - which tokenizer family that language key is highlighted with
//! - which indent unit is the conventional default for that language

/// The language key used when nothing more specific is known.
pub const PLAIN_LANGUAGE_KEY: &str = "plain";

/// The family of tokenizer a language is highlighted with.
///
/// A tokenizer registry maps each family to one tokenizer implementation; several language
/// keys can share a family (e.g. `c`, `rust` and `go` are all [`TokenizerFamily::CFamily`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenizerFamily {
    /// Curly-brace languages with `//` and `/* */` comments.
    CFamily,
    /// Languages with `#` comments and triple-quoted strings.
    Python,
    /// Tag based markup (HTML, XML, SVG).
    Markup,
    /// JavaScript/TypeScript with embedded JSX tags.
    Jsx,
    /// No tokenization; the whole range gets the default color.
    Plain,
}

impl TokenizerFamily {
    /// All families, in a stable order.
    pub const ALL: [TokenizerFamily; 5] = [
        TokenizerFamily::CFamily,
        TokenizerFamily::Python,
        TokenizerFamily::Markup,
        TokenizerFamily::Jsx,
        TokenizerFamily::Plain,
    ];
}

/// The unit inserted or removed by indent / unindent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndentUnit {
    /// A single `'\t'`.
    Tab,
    /// `n` spaces (`n` is at least 1 when used).
    Spaces(u8),
}

impl IndentUnit {
    /// The bytes inserted for one indent level.
    pub fn bytes(self) -> Vec<u8> {
        match self {
            IndentUnit::Tab => vec![b'\t'],
            IndentUnit::Spaces(n) => vec![b' '; usize::from(n.max(1))],
        }
    }

    /// Byte length of one indent level.
    pub fn len(self) -> usize {
        match self {
            IndentUnit::Tab => 1,
            IndentUnit::Spaces(n) => usize::from(n.max(1)),
        }
    }

    /// Always `false`; an indent unit is never empty.
    pub fn is_empty(self) -> bool {
        false
    }
}

impl Default for IndentUnit {
    fn default() -> Self {
        IndentUnit::Spaces(4)
    }
}

/// Static description of a known language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageSpec {
    /// Stable language key (e.g. `"rust"`).
    pub key: &'static str,
    /// File extensions (lowercase, without the dot).
    pub extensions: &'static [&'static str],
    /// Tokenizer family used to highlight this language.
    pub family: TokenizerFamily,
    /// Conventional indent unit.
    pub indent: IndentUnit,
}

const LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec {
        key: "c",
        extensions: &["c", "h"],
        family: TokenizerFamily::CFamily,
        indent: IndentUnit::Spaces(4),
    },
    LanguageSpec {
        key: "cpp",
        extensions: &["cc", "cpp", "cxx", "hpp", "hh", "hxx"],
        family: TokenizerFamily::CFamily,
        indent: IndentUnit::Spaces(4),
    },
    LanguageSpec {
        key: "rust",
        extensions: &["rs"],
        family: TokenizerFamily::CFamily,
        indent: IndentUnit::Spaces(4),
    },
    LanguageSpec {
        key: "go",
        extensions: &["go"],
        family: TokenizerFamily::CFamily,
        indent: IndentUnit::Tab,
    },
    LanguageSpec {
        key: "java",
        extensions: &["java"],
        family: TokenizerFamily::CFamily,
        indent: IndentUnit::Spaces(4),
    },
    LanguageSpec {
        key: "csharp",
        extensions: &["cs"],
        family: TokenizerFamily::CFamily,
        indent: IndentUnit::Spaces(4),
    },
    LanguageSpec {
        key: "javascript",
        extensions: &["js", "mjs", "cjs"],
        family: TokenizerFamily::CFamily,
        indent: IndentUnit::Spaces(2),
    },
    LanguageSpec {
        key: "typescript",
        extensions: &["ts", "mts", "cts"],
        family: TokenizerFamily::CFamily,
        indent: IndentUnit::Spaces(2),
    },
    LanguageSpec {
        key: "jsx",
        extensions: &["jsx", "tsx"],
        family: TokenizerFamily::Jsx,
        indent: IndentUnit::Spaces(2),
    },
    LanguageSpec {
        key: "python",
        extensions: &["py", "pyi", "pyw"],
        family: TokenizerFamily::Python,
        indent: IndentUnit::Spaces(4),
    },
    LanguageSpec {
        key: "shell",
        extensions: &["sh", "bash", "zsh"],
        family: TokenizerFamily::Python,
        indent: IndentUnit::Spaces(2),
    },
    LanguageSpec {
        key: "html",
        extensions: &["html", "htm", "xhtml"],
        family: TokenizerFamily::Markup,
        indent: IndentUnit::Spaces(2),
    },
    LanguageSpec {
        key: "xml",
        extensions: &["xml", "svg", "xsd", "plist"],
        family: TokenizerFamily::Markup,
        indent: IndentUnit::Spaces(2),
    },
    LanguageSpec {
        key: PLAIN_LANGUAGE_KEY,
        extensions: &["txt"],
        family: TokenizerFamily::Plain,
        indent: IndentUnit::Spaces(4),
    },
];

/// Look up a known language by key.
pub fn language(key: &str) -> Option<&'static LanguageSpec> {
    LANGUAGES.iter().find(|lang| lang.key == key)
}

/// All known languages.
pub fn languages() -> &'static [LanguageSpec] {
    LANGUAGES
}

/// Map a file extension (with or without a leading dot, any case) to a language key.
///
/// Unknown extensions map to [`PLAIN_LANGUAGE_KEY`].
pub fn language_key_for_extension(extension: &str) -> &'static str {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|lang| lang.extensions.contains(&ext.as_str()))
        .map(|lang| lang.key)
        .unwrap_or(PLAIN_LANGUAGE_KEY)
}

/// Map a file path (or file name) to a language key using its extension.
pub fn language_key_for_path(path: &str) -> &'static str {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => language_key_for_extension(ext),
        _ => PLAIN_LANGUAGE_KEY,
    }
}

/// Tokenizer family for a language key. Unknown keys use [`TokenizerFamily::Plain`].
pub fn family_for_key(key: &str) -> TokenizerFamily {
    language(key)
        .map(|lang| lang.family)
        .unwrap_or(TokenizerFamily::Plain)
}

/// Conventional indent unit for a language key.
pub fn indent_for_key(key: &str) -> IndentUnit {
    language(key).map(|lang| lang.indent).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lookup() {
        assert_eq!(language_key_for_extension("rs"), "rust");
        assert_eq!(language_key_for_extension(".PY"), "python");
        assert_eq!(language_key_for_extension("tsx"), "jsx");
        assert_eq!(language_key_for_extension("unknown"), PLAIN_LANGUAGE_KEY);
    }

    #[test]
    fn test_path_lookup() {
        assert_eq!(language_key_for_path("src/main.rs"), "rust");
        assert_eq!(language_key_for_path("C:\\web\\index.HTML"), "html");
        assert_eq!(language_key_for_path("Makefile"), PLAIN_LANGUAGE_KEY);
        assert_eq!(language_key_for_path(".bashrc"), PLAIN_LANGUAGE_KEY);
    }

    #[test]
    fn test_family_and_indent() {
        assert_eq!(family_for_key("cpp"), TokenizerFamily::CFamily);
        assert_eq!(family_for_key("xml"), TokenizerFamily::Markup);
        assert_eq!(family_for_key("nope"), TokenizerFamily::Plain);
        assert_eq!(indent_for_key("go"), IndentUnit::Tab);
        assert_eq!(indent_for_key("nope"), IndentUnit::Spaces(4));
    }

    #[test]
    fn test_indent_unit_bytes() {
        assert_eq!(IndentUnit::Tab.bytes(), b"\t".to_vec());
        assert_eq!(IndentUnit::Spaces(2).bytes(), b"  ".to_vec());
        assert_eq!(IndentUnit::Spaces(0).len(), 1);
    }
}
