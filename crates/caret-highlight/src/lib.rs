//! `caret-highlight` - regex-driven tokenizers for `caret-core`.
//!
//! Each tokenizer is an ordered list of [`RegexRule`]s run as a single-pass lexer: at every
//! position the rule with the earliest match wins, ties going to the rule listed first. The
//! grammars are deliberately small (keywords, literals, comments, tags) and are not parsers.
//!
//! ```rust
//! use caret_core::{CancellationToken, TokenKind, Tokenizer};
//! use caret_highlight::default_registry;
//!
//! let registry = default_registry().unwrap();
//! let tokenizer = registry.resolve("rust");
//! let tokens = tokenizer.tokenize(b"let x = 1;", &CancellationToken::new()).unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Keyword);
//! ```

mod grammars;

use std::ops::Range;
use std::sync::Arc;

use caret_core::{
    CancellationToken, ColorTag, DefaultTheme, HighlightError, Palette, Theme, Token, TokenKind,
    Tokenizer, TokenizerRegistry,
};
use caret_lang::TokenizerFamily;
use regex::bytes::Regex;
use tracing::debug;

/// A single regex lexing rule.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
    kind: TokenKind,
    capture_group: Option<usize>,
}

impl RegexRule {
    /// Compile a rule producing tokens of `kind`.
    pub fn new(pattern: &str, kind: TokenKind) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            kind,
            capture_group: None,
        })
    }

    /// Emit only a capture group of each match.
    ///
    /// Lexing resumes right after the group, so text the pattern needed as trailing context is
    /// still lexed by the other rules. Example (Rust macro name before its bracket):
    /// - pattern: `\b([a-z_]\w*!)[(\[{]`
    /// - capture_group: `1`
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }

    /// Token kind produced by this rule.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Earliest match at or after `pos`: `(match_start, token_range)`.
    fn find_at(&self, text: &[u8], pos: usize) -> Option<(usize, Range<usize>)> {
        match self.capture_group {
            None => self
                .regex
                .find_at(text, pos)
                .map(|m| (m.start(), m.range())),
            Some(group) => {
                let caps = self.regex.captures_at(text, pos)?;
                let whole = caps.get(0)?;
                let token = caps.get(group).map_or(whole.range(), |m| m.range());
                Some((whole.start(), token))
            }
        }
    }
}

/// A tokenizer over an ordered rule list.
#[derive(Debug)]
pub struct RegexTokenizer {
    name: &'static str,
    rules: Vec<RegexRule>,
    palette: Arc<Palette>,
}

impl RegexTokenizer {
    /// Create a tokenizer from rules in priority order.
    pub fn new(name: &'static str, rules: Vec<RegexRule>, palette: Arc<Palette>) -> Self {
        Self {
            name,
            rules,
            palette,
        }
    }

    /// The rules, in priority order.
    pub fn rules(&self) -> &[RegexRule] {
        &self.rules
    }

    /// C, C++, Rust, Go, Java, C#, JavaScript and TypeScript.
    pub fn c_family(palette: Arc<Palette>) -> Result<Self, regex::Error> {
        Ok(Self::new("c-family", grammars::c_family()?, palette))
    }

    /// Python and shell scripts.
    pub fn python(palette: Arc<Palette>) -> Result<Self, regex::Error> {
        Ok(Self::new("python", grammars::python()?, palette))
    }

    /// HTML and XML.
    pub fn markup(palette: Arc<Palette>) -> Result<Self, regex::Error> {
        Ok(Self::new("markup", grammars::markup()?, palette))
    }

    /// JSX / TSX: the C-family grammar plus inline tags.
    pub fn jsx(palette: Arc<Palette>) -> Result<Self, regex::Error> {
        Ok(Self::new("jsx", grammars::jsx()?, palette))
    }

    /// The builtin tokenizer for `family`, or `None` for [`TokenizerFamily::Plain`].
    pub fn for_family(
        family: TokenizerFamily,
        palette: Arc<Palette>,
    ) -> Result<Option<Self>, regex::Error> {
        Ok(match family {
            TokenizerFamily::CFamily => Some(Self::c_family(palette)?),
            TokenizerFamily::Python => Some(Self::python(palette)?),
            TokenizerFamily::Markup => Some(Self::markup(palette)?),
            TokenizerFamily::Jsx => Some(Self::jsx(palette)?),
            TokenizerFamily::Plain => None,
        })
    }
}

impl Tokenizer for RegexTokenizer {
    fn name(&self) -> &str {
        self.name
    }

    fn tokenize(
        &self,
        text: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Vec<Token>, HighlightError> {
        let mut tokens = Vec::new();
        // Next match of each rule; `None` once a rule has no match left.
        let mut pending: Vec<Option<(usize, Range<usize>)>> =
            self.rules.iter().map(|rule| rule.find_at(text, 0)).collect();
        let mut pos = 0;

        while pos < text.len() {
            cancel.check()?;

            for (rule, slot) in self.rules.iter().zip(pending.iter_mut()) {
                if slot.as_ref().is_some_and(|(start, _)| *start < pos) {
                    *slot = rule.find_at(text, pos);
                }
            }

            let Some((index, (start, token))) = pending
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| slot.clone().map(|m| (i, m)))
                .min_by_key(|(i, (start, _))| (*start, *i))
            else {
                break;
            };

            if !token.is_empty() {
                tokens.push(Token::new(self.rules[index].kind, token.start, token.len()));
            }
            pos = token.end.max(start + 1);
        }

        Ok(tokens)
    }

    fn color_for(&self, kind: TokenKind) -> ColorTag {
        self.palette.color(kind)
    }

    fn invalidate_cached_colors(&self) {
        self.palette.invalidate();
    }
}

/// A registry with every builtin tokenizer family registered over `theme`.
pub fn builtin_registry(theme: Arc<dyn Theme>) -> Result<TokenizerRegistry, regex::Error> {
    let mut registry = TokenizerRegistry::new(theme);
    let palette = registry.palette();
    for family in TokenizerFamily::ALL {
        if let Some(tokenizer) = RegexTokenizer::for_family(family, palette.clone())? {
            debug!(?family, tokenizer = tokenizer.name, "registering builtin tokenizer");
            registry.register(family, Arc::new(tokenizer));
        }
    }
    Ok(registry)
}

/// [`builtin_registry`] over [`DefaultTheme`].
pub fn default_registry() -> Result<TokenizerRegistry, regex::Error> {
    builtin_registry(Arc::new(DefaultTheme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex<'a>(tokenizer: &RegexTokenizer, text: &'a str) -> Vec<(TokenKind, &'a str)> {
        tokenizer
            .tokenize(text.as_bytes(), &CancellationToken::new())
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, &text[t.start..t.end()]))
            .collect()
    }

    #[test]
    fn test_earliest_match_wins_and_ties_go_to_first_rule() {
        let rules = vec![
            RegexRule::new("ab", TokenKind::Keyword).unwrap(),
            RegexRule::new("a", TokenKind::Operator).unwrap(),
            RegexRule::new("b", TokenKind::Number).unwrap(),
        ];
        let tokenizer = RegexTokenizer::new("test", rules, Arc::new(Palette::default()));
        assert_eq!(
            lex(&tokenizer, "bab a"),
            vec![
                (TokenKind::Number, "b"),
                (TokenKind::Keyword, "ab"),
                (TokenKind::Operator, "a"),
            ]
        );
    }

    #[test]
    fn test_capture_group_resumes_after_group() {
        let rules = vec![
            RegexRule::new(r"(\w+)=", TokenKind::Attribute)
                .unwrap()
                .with_capture_group(1),
            RegexRule::new("=", TokenKind::Operator).unwrap(),
        ];
        let tokenizer = RegexTokenizer::new("test", rules, Arc::new(Palette::default()));
        assert_eq!(
            lex(&tokenizer, "k=v"),
            vec![(TokenKind::Attribute, "k"), (TokenKind::Operator, "=")]
        );
    }

    #[test]
    fn test_empty_matches_do_not_stall() {
        let rules = vec![RegexRule::new("x*", TokenKind::Keyword).unwrap()];
        let tokenizer = RegexTokenizer::new("test", rules, Arc::new(Palette::default()));
        assert_eq!(lex(&tokenizer, "axx"), vec![(TokenKind::Keyword, "xx")]);
    }

    #[test]
    fn test_cancelled_token_stops_tokenizing() {
        let tokenizer = RegexTokenizer::c_family(Arc::new(Palette::default())).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(
            tokenizer.tokenize(b"let x = 1;", &cancel),
            Err(HighlightError::Cancelled)
        );
    }

    #[test]
    fn test_builtin_registry_covers_every_family() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.resolve("rust").name(), "c-family");
        assert_eq!(registry.resolve("python").name(), "python");
        assert_eq!(registry.resolve("html").name(), "markup");
        assert_eq!(registry.resolve("jsx").name(), "jsx");
        assert_eq!(registry.resolve("plain").name(), "plain");
        assert_eq!(registry.resolve("cobol").name(), "plain");
    }
}
