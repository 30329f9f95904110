//! Tokenizer capability, theme palette, and the language-keyed tokenizer registry.
//!
//! The highlight scheduler is agnostic to tokenizer internals: it only relies on
//! [`Tokenizer::apply_highlighting`] writing colors for one range and polling the cancellation
//! token often enough. Concrete grammars live outside this crate (see `caret-highlight`).

use std::collections::BTreeMap;
use std::sync::Arc;

use caret_lang::{TokenizerFamily, family_for_key};
use parking_lot::RwLock;

use crate::cancel::CancellationToken;
use crate::document::ColorTag;
use crate::error::HighlightError;

/// Syntactic category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    /// Anything not otherwise classified.
    Plain,
    /// Reserved words.
    Keyword,
    /// Builtin or declared type names.
    Type,
    /// Builtin constants and functions (`true`, `None`, `self`).
    Builtin,
    /// String and character literals.
    String,
    /// Numeric literals.
    Number,
    /// Line and block comments.
    Comment,
    /// Operators.
    Operator,
    /// Brackets, separators.
    Punctuation,
    /// Preprocessor directives.
    Preprocessor,
    /// Markup tag names.
    Tag,
    /// Markup attributes.
    Attribute,
    /// Decorators / annotations.
    Decorator,
    /// Markup character entities.
    Entity,
}

impl TokenKind {
    /// Number of kinds.
    pub const COUNT: usize = 14;

    /// All kinds, in declaration order.
    pub const ALL: [TokenKind; TokenKind::COUNT] = [
        TokenKind::Plain,
        TokenKind::Keyword,
        TokenKind::Type,
        TokenKind::Builtin,
        TokenKind::String,
        TokenKind::Number,
        TokenKind::Comment,
        TokenKind::Operator,
        TokenKind::Punctuation,
        TokenKind::Preprocessor,
        TokenKind::Tag,
        TokenKind::Attribute,
        TokenKind::Decorator,
        TokenKind::Entity,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// A token produced by [`Tokenizer::tokenize`], in offsets relative to the tokenized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Token category.
    pub kind: TokenKind,
    /// Start offset.
    pub start: usize,
    /// Length in bytes.
    pub len: usize,
}

impl Token {
    /// Create a token.
    pub fn new(kind: TokenKind, start: usize, len: usize) -> Self {
        Self { kind, start, len }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Maps token kinds to colors. Supplied by the host's settings layer.
pub trait Theme: Send + Sync {
    /// Color for `kind`.
    fn color_for(&self, kind: TokenKind) -> ColorTag;
}

/// A dark theme used when the host does not supply one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTheme;

impl Theme for DefaultTheme {
    fn color_for(&self, kind: TokenKind) -> ColorTag {
        match kind {
            TokenKind::Plain | TokenKind::Punctuation => ColorTag::DEFAULT,
            TokenKind::Keyword => ColorTag::rgb(0x56, 0x9C, 0xD6),
            TokenKind::Type => ColorTag::rgb(0x4E, 0xC9, 0xB0),
            TokenKind::Builtin => ColorTag::rgb(0x56, 0x9C, 0xD6),
            TokenKind::String => ColorTag::rgb(0xCE, 0x91, 0x78),
            TokenKind::Number => ColorTag::rgb(0xB5, 0xCE, 0xA8),
            TokenKind::Comment => ColorTag::rgb(0x6A, 0x99, 0x55),
            TokenKind::Operator => ColorTag::rgb(0xD4, 0xD4, 0xD4),
            TokenKind::Preprocessor => ColorTag::rgb(0xC5, 0x86, 0xC0),
            TokenKind::Tag => ColorTag::rgb(0x56, 0x9C, 0xD6),
            TokenKind::Attribute => ColorTag::rgb(0x9C, 0xDC, 0xFE),
            TokenKind::Decorator => ColorTag::rgb(0xDC, 0xDC, 0xAA),
            TokenKind::Entity => ColorTag::rgb(0xD7, 0xBA, 0x7D),
        }
    }
}

/// Theme colors resolved once and cached until explicitly invalidated.
pub struct Palette {
    theme: RwLock<Arc<dyn Theme>>,
    cache: RwLock<Option<[ColorTag; TokenKind::COUNT]>>,
}

impl Palette {
    /// Create a palette over `theme`.
    pub fn new(theme: Arc<dyn Theme>) -> Self {
        Self {
            theme: RwLock::new(theme),
            cache: RwLock::new(None),
        }
    }

    /// Cached color for `kind`, resolving the whole table on first use.
    pub fn color(&self, kind: TokenKind) -> ColorTag {
        if let Some(table) = self.cache.read().as_ref() {
            return table[kind.index()];
        }
        let theme = self.theme.read().clone();
        let table = TokenKind::ALL.map(|k| theme.color_for(k));
        *self.cache.write() = Some(table);
        table[kind.index()]
    }

    /// Drop cached colors; the next lookup re-reads the theme.
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    /// Swap in a new theme and invalidate.
    pub fn set_theme(&self, theme: Arc<dyn Theme>) {
        *self.theme.write() = theme;
        self.invalidate();
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(Arc::new(DefaultTheme))
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Palette")
            .field("cached", &self.cache.read().is_some())
            .finish()
    }
}

/// A pluggable tokenizer for one grammar family.
///
/// Implementations must poll `cancel` at fine granularity (per token or per line) and return
/// [`HighlightError::Cancelled`] promptly once it is set.
pub trait Tokenizer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Split `text` into tokens ordered by start offset. Offsets are relative to `text`.
    fn tokenize(
        &self,
        text: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Vec<Token>, HighlightError>;

    /// Color for a token kind (normally through a cached [`Palette`]).
    fn color_for(&self, kind: TokenKind) -> ColorTag;

    /// Forget cached theme colors. Called on theme change.
    fn invalidate_cached_colors(&self);

    /// Tokenize `text` and write colors into `colors[start_offset..start_offset + text.len()]`.
    ///
    /// Bytes not covered by any token get the plain color.
    fn apply_highlighting(
        &self,
        text: &[u8],
        colors: &mut [ColorTag],
        start_offset: usize,
        cancel: &CancellationToken,
    ) -> Result<(), HighlightError> {
        let tokens = self.tokenize(text, cancel)?;
        let end = start_offset.saturating_add(text.len()).min(colors.len());
        let start = start_offset.min(end);
        let region = &mut colors[start..end];
        region.fill(self.color_for(TokenKind::Plain));

        for token in tokens {
            cancel.check()?;
            let token_end = token.end().min(region.len());
            let token_start = token.start.min(token_end);
            region[token_start..token_end].fill(self.color_for(token.kind));
        }
        Ok(())
    }
}

/// The no-op tokenizer: everything is plain text.
#[derive(Debug, Default)]
pub struct PlainTokenizer {
    palette: Arc<Palette>,
}

impl PlainTokenizer {
    /// Create a plain tokenizer sharing `palette`.
    pub fn new(palette: Arc<Palette>) -> Self {
        Self { palette }
    }
}

impl Tokenizer for PlainTokenizer {
    fn name(&self) -> &str {
        "plain"
    }

    fn tokenize(
        &self,
        _text: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Vec<Token>, HighlightError> {
        cancel.check()?;
        Ok(Vec::new())
    }

    fn color_for(&self, kind: TokenKind) -> ColorTag {
        self.palette.color(kind)
    }

    fn invalidate_cached_colors(&self) {
        self.palette.invalidate();
    }
}

/// Language-keyed tokenizer lookup.
///
/// Language keys are mapped to a [`TokenizerFamily`] by `caret-lang`; each family has at most
/// one registered tokenizer. Unregistered families fall back to [`PlainTokenizer`].
pub struct TokenizerRegistry {
    palette: Arc<Palette>,
    tokenizers: BTreeMap<TokenizerFamily, Arc<dyn Tokenizer>>,
    fallback: Arc<dyn Tokenizer>,
}

impl TokenizerRegistry {
    /// Create a registry with only the plain fallback.
    pub fn new(theme: Arc<dyn Theme>) -> Self {
        let palette = Arc::new(Palette::new(theme));
        let fallback: Arc<dyn Tokenizer> = Arc::new(PlainTokenizer::new(palette.clone()));
        Self {
            palette,
            tokenizers: BTreeMap::new(),
            fallback,
        }
    }

    /// Palette shared by tokenizers built for this registry.
    pub fn palette(&self) -> Arc<Palette> {
        self.palette.clone()
    }

    /// Register `tokenizer` for `family`, replacing any previous one.
    pub fn register(&mut self, family: TokenizerFamily, tokenizer: Arc<dyn Tokenizer>) {
        self.tokenizers.insert(family, tokenizer);
    }

    /// Builder-style [`TokenizerRegistry::register`].
    pub fn with(mut self, family: TokenizerFamily, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.register(family, tokenizer);
        self
    }

    /// Returns `true` if a tokenizer other than the fallback serves `family`.
    pub fn has_family(&self, family: TokenizerFamily) -> bool {
        self.tokenizers.contains_key(&family)
    }

    /// Tokenizer for a language key.
    pub fn resolve(&self, language_key: &str) -> Arc<dyn Tokenizer> {
        self.tokenizers
            .get(&family_for_key(language_key))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Replace the theme and drop every cached color table.
    pub fn set_theme(&self, theme: Arc<dyn Theme>) {
        self.palette.set_theme(theme);
        self.invalidate_cached_colors();
    }

    /// Tell every tokenizer its cached colors are stale.
    pub fn invalidate_cached_colors(&self) {
        self.fallback.invalidate_cached_colors();
        for tokenizer in self.tokenizers.values() {
            tokenizer.invalidate_cached_colors();
        }
    }
}

impl Default for TokenizerRegistry {
    fn default() -> Self {
        Self::new(Arc::new(DefaultTheme))
    }
}

impl std::fmt::Debug for TokenizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerRegistry")
            .field("families", &self.tokenizers.keys().collect::<Vec<_>>())
            .finish()
    }
}
