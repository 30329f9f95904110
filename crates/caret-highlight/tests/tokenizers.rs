use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use caret_core::{
    CancellationToken, ColorTag, DefaultTheme, EditorConfig, EditorIntent, EditorSession,
    JobOutcome, LoadOptions, LoadedFile, MemoryClipboard, Palette, Theme, TokenKind, Tokenizer,
    Workspace,
};
use caret_highlight::{RegexTokenizer, builtin_registry, default_registry};
use pretty_assertions::assert_eq;

fn lex<'a>(tokenizer: &dyn Tokenizer, text: &'a str) -> Vec<(TokenKind, &'a str)> {
    tokenizer
        .tokenize(text.as_bytes(), &CancellationToken::new())
        .unwrap()
        .into_iter()
        .map(|t| (t.kind, &text[t.start..t.end()]))
        .collect()
}

fn palette() -> Arc<Palette> {
    Arc::new(Palette::default())
}

/// Default colors, except keywords which can be recolored in place.
struct KeywordTheme(AtomicU32);

impl KeywordTheme {
    fn new(keyword: ColorTag) -> Self {
        Self(AtomicU32::new(keyword.0))
    }

    fn set_keyword(&self, keyword: ColorTag) {
        self.0.store(keyword.0, Ordering::SeqCst);
    }
}

impl Theme for KeywordTheme {
    fn color_for(&self, kind: TokenKind) -> ColorTag {
        match kind {
            TokenKind::Keyword => ColorTag(self.0.load(Ordering::SeqCst)),
            _ => DefaultTheme.color_for(kind),
        }
    }
}

#[test]
fn test_c_family_statement() {
    let tokenizer = RegexTokenizer::c_family(palette()).unwrap();
    assert_eq!(
        lex(&tokenizer, "let x = 42; // hi"),
        vec![
            (TokenKind::Keyword, "let"),
            (TokenKind::Operator, "="),
            (TokenKind::Number, "42"),
            (TokenKind::Punctuation, ";"),
            (TokenKind::Comment, "// hi"),
        ]
    );
}

#[test]
fn test_c_family_unterminated_block_comment_runs_to_end() {
    let tokenizer = RegexTokenizer::c_family(palette()).unwrap();
    assert_eq!(
        lex(&tokenizer, "a /* open\nstill"),
        vec![(TokenKind::Comment, "/* open\nstill")]
    );
}

#[test]
fn test_rust_attribute_and_types() {
    let tokenizer = RegexTokenizer::c_family(palette()).unwrap();
    assert_eq!(
        lex(&tokenizer, "#[derive(Debug)]\nstruct Point { x: f64 }"),
        vec![
            (TokenKind::Decorator, "#[derive(Debug)]"),
            (TokenKind::Keyword, "struct"),
            (TokenKind::Type, "Point"),
            (TokenKind::Punctuation, "{"),
            (TokenKind::Operator, ":"),
            (TokenKind::Type, "f64"),
            (TokenKind::Punctuation, "}"),
        ]
    );
}

#[test]
fn test_rust_macro_name_and_arguments() {
    let tokenizer = RegexTokenizer::c_family(palette()).unwrap();
    assert_eq!(
        lex(&tokenizer, r#"println!("hi {}", n);"#),
        vec![
            (TokenKind::Builtin, "println!"),
            (TokenKind::Punctuation, "("),
            (TokenKind::String, r#""hi {}""#),
            (TokenKind::Punctuation, ","),
            (TokenKind::Punctuation, ")"),
            (TokenKind::Punctuation, ";"),
        ]
    );
}

#[test]
fn test_c_preprocessor() {
    let tokenizer = RegexTokenizer::c_family(palette()).unwrap();
    let tokens = lex(&tokenizer, "#include <stdio.h>\nint main() { return 0; }");
    assert!(tokens.contains(&(TokenKind::Preprocessor, "#include")));
    assert!(tokens.contains(&(TokenKind::Type, "int")));
    assert!(tokens.contains(&(TokenKind::Keyword, "return")));
    assert!(tokens.contains(&(TokenKind::Number, "0")));
}

#[test]
fn test_python_decorator_strings_and_comments() {
    let tokenizer = RegexTokenizer::python(palette()).unwrap();
    let tokens = lex(
        &tokenizer,
        "@decorator\ndef f(x):\n    return \"s\"  # note\n",
    );
    assert!(tokens.contains(&(TokenKind::Decorator, "@decorator")));
    assert!(tokens.contains(&(TokenKind::Keyword, "def")));
    assert!(tokens.contains(&(TokenKind::Keyword, "return")));
    assert!(tokens.contains(&(TokenKind::String, "\"s\"")));
    assert!(tokens.contains(&(TokenKind::Comment, "# note")));
}

#[test]
fn test_python_triple_quoted_string_spans_lines() {
    let tokenizer = RegexTokenizer::python(palette()).unwrap();
    let tokens = lex(&tokenizer, "x = \"\"\"doc\nmore\"\"\"\ny = 1");
    assert!(tokens.contains(&(TokenKind::String, "\"\"\"doc\nmore\"\"\"")));
    assert!(tokens.contains(&(TokenKind::Number, "1")));
}

#[test]
fn test_shell_variables() {
    let tokenizer = RegexTokenizer::python(palette()).unwrap();
    assert_eq!(
        lex(&tokenizer, "echo $HOME # done"),
        vec![
            (TokenKind::Builtin, "echo"),
            (TokenKind::Entity, "$HOME"),
            (TokenKind::Comment, "# done"),
        ]
    );
}

#[test]
fn test_markup_tags_attributes_and_entities() {
    let tokenizer = RegexTokenizer::markup(palette()).unwrap();
    assert_eq!(
        lex(&tokenizer, r#"<!-- c --><a href="x">&amp;</a>"#),
        vec![
            (TokenKind::Comment, "<!-- c -->"),
            (TokenKind::Tag, "<a"),
            (TokenKind::Attribute, "href"),
            (TokenKind::String, r#""x""#),
            (TokenKind::Punctuation, ">"),
            (TokenKind::Entity, "&amp;"),
            (TokenKind::Tag, "</a"),
            (TokenKind::Punctuation, ">"),
        ]
    );
}

#[test]
fn test_jsx_inline_tags() {
    let tokenizer = RegexTokenizer::jsx(palette()).unwrap();
    assert_eq!(
        lex(&tokenizer, r#"const el = <div className="x">{name}</div>;"#),
        vec![
            (TokenKind::Keyword, "const"),
            (TokenKind::Operator, "="),
            (TokenKind::Tag, "<div"),
            (TokenKind::Attribute, "className"),
            (TokenKind::Operator, "="),
            (TokenKind::String, r#""x""#),
            (TokenKind::Operator, ">"),
            (TokenKind::Punctuation, "{"),
            (TokenKind::Punctuation, "}"),
            (TokenKind::Tag, "</div"),
            (TokenKind::Operator, ">"),
            (TokenKind::Punctuation, ";"),
        ]
    );
}

#[test]
fn test_invalid_utf8_does_not_break_tokenizing() {
    let tokenizer = RegexTokenizer::c_family(palette()).unwrap();
    let text = b"/* \xFF\xFE */ let";
    let tokens = tokenizer
        .tokenize(text, &CancellationToken::new())
        .unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, TokenKind::Comment);
    assert_eq!(tokens[0].len, 8);
    assert_eq!(tokens[1].kind, TokenKind::Keyword);
}

#[test]
fn test_apply_highlighting_writes_theme_colors() {
    let registry = default_registry().unwrap();
    let tokenizer = registry.resolve("rust");
    let text = b"fn main() {}";
    let mut colors = vec![ColorTag(0); text.len()];
    tokenizer
        .apply_highlighting(text, &mut colors, 0, &CancellationToken::new())
        .unwrap();

    let keyword = DefaultTheme.color_for(TokenKind::Keyword);
    assert_eq!(&colors[0..2], &[keyword; 2]);
    assert_eq!(colors[2], DefaultTheme.color_for(TokenKind::Plain));
}

#[test]
fn test_session_highlights_in_background() {
    let mut session = EditorSession::new(
        EditorConfig::default(),
        Arc::new(default_registry().unwrap()),
        Arc::new(MemoryClipboard::new()),
    );
    session.load(
        Ok(LoadedFile::from_path("main.rs", "fn main() {}")),
        LoadOptions::new(),
    );
    assert_eq!(session.wait_for_highlight(), Some(JobOutcome::Published));

    let keyword = DefaultTheme.color_for(TokenKind::Keyword);
    assert_eq!(session.document().color_at(0), Some(keyword));

    // Typing in front keeps parity and re-highlights the edited line.
    session.handle(EditorIntent::InsertText("pub ".to_string()));
    assert_eq!(session.wait_for_highlight(), Some(JobOutcome::Published));
    assert_eq!(session.document().color_at(0), Some(keyword));
    assert_eq!(session.document().color_at(4), Some(keyword));
    assert_eq!(session.document().colors().len(), session.text().len());
}

#[test]
fn test_set_theme_recolors_open_document() {
    let mut session = EditorSession::new(
        EditorConfig::default(),
        Arc::new(default_registry().unwrap()),
        Arc::new(MemoryClipboard::new()),
    );
    session.load(
        Ok(LoadedFile::from_path("main.rs", "fn main() {}")),
        LoadOptions::new(),
    );
    assert_eq!(session.wait_for_highlight(), Some(JobOutcome::Published));
    assert_eq!(
        session.document().color_at(0),
        Some(DefaultTheme.color_for(TokenKind::Keyword))
    );

    let light = ColorTag::rgb(0x00, 0x00, 0xFF);
    session.set_theme(Arc::new(KeywordTheme::new(light)));
    assert_eq!(session.wait_for_highlight(), Some(JobOutcome::Published));
    assert_eq!(session.document().color_at(0), Some(light));
    assert_eq!(session.document().color_at(1), Some(light));
    assert_eq!(
        session.document().color_at(2),
        Some(DefaultTheme.color_for(TokenKind::Plain))
    );
}

#[test]
fn test_workspace_theme_change_refreshes_every_session() {
    let before = ColorTag::rgb(0x10, 0x20, 0x30);
    let after = ColorTag::rgb(0xC0, 0x40, 0x00);
    let theme = Arc::new(KeywordTheme::new(before));
    let mut workspace = Workspace::new(
        EditorConfig::default(),
        Arc::new(builtin_registry(theme.clone()).unwrap()),
        Arc::new(MemoryClipboard::new()),
    );
    let rust = workspace
        .open(
            Some("main.rs".to_string()),
            Ok(LoadedFile::from_path("main.rs", "fn main() {}")),
            LoadOptions::new(),
        )
        .unwrap();
    let python = workspace
        .open(
            Some("tool.py".to_string()),
            Ok(LoadedFile::from_path("tool.py", "def run(): pass")),
            LoadOptions::new(),
        )
        .unwrap();

    for id in [rust, python] {
        let session = workspace.session_mut(id).unwrap();
        assert_eq!(session.wait_for_highlight(), Some(JobOutcome::Published));
        assert_eq!(session.document().color_at(0), Some(before));
    }

    theme.set_keyword(after);
    workspace.theme_changed();

    for id in [rust, python] {
        let session = workspace.session_mut(id).unwrap();
        assert_eq!(session.wait_for_highlight(), Some(JobOutcome::Published));
        assert_eq!(session.document().color_at(0), Some(after));
        assert_eq!(session.document().color_at(1), Some(after));
    }
}
