//! Builtin rule lists. Order matters: earlier rules win ties at the same start offset.

use caret_core::TokenKind;

use crate::RegexRule;

const C_KEYWORDS: &str = r"\b(?:abstract|as|async|await|break|case|catch|chan|class|const|continue|crate|default|defer|delete|do|dyn|else|enum|export|extends|extern|final|finally|fn|for|from|func|function|go|goto|if|impl|implements|import|in|inline|instanceof|interface|internal|let|loop|match|mod|move|mut|namespace|new|of|operator|override|package|private|protected|pub|public|range|ref|return|sealed|select|sizeof|static|struct|super|switch|template|this|throw|throws|trait|try|type|typedef|typename|typeof|union|unsafe|use|using|var|virtual|volatile|where|while|yield)\b";

const C_TYPES: &str = r"\b(?:any|bool|boolean|byte|char|double|f32|f64|float|i128|i16|i32|i64|i8|int|isize|long|never|number|object|rune|short|signed|str|string|u128|u16|u32|u64|u8|unknown|unsigned|usize|void|Self|String)\b";

const C_BUILTINS: &str =
    r"\b(?:true|false|null|nullptr|nil|undefined|NaN|None|Some|Ok|Err|self)\b";

const C_NUMBER: &str = r"\b(?:0[xX][0-9A-Fa-f_]+|0[bB][01_]+|0[oO][0-7_]+|[0-9][0-9_]*(?:\.[0-9][0-9_]*)?(?:[eE][+-]?[0-9]+)?)(?:[uUlLfF]+|[iu](?:8|16|32|64|128|size)|f32|f64)?\b";

const PY_KEYWORDS: &str = r"\b(?:and|as|assert|async|await|break|case|class|continue|def|del|do|done|elif|else|esac|except|export|fi|finally|for|from|function|global|if|import|in|is|lambda|local|match|nonlocal|not|or|pass|raise|readonly|return|select|then|try|unset|until|while|with|yield)\b";

const PY_BUILTINS: &str = r"\b(?:True|False|None|self|cls|print|len|range|int|str|float|list|dict|set|tuple|bool|bytes|object|type|isinstance|super|open|echo|cd|exit|source)\b";

const PY_NUMBER: &str = r"\b(?:0[xX][0-9A-Fa-f_]+|0[oO][0-7_]+|0[bB][01_]+|[0-9][0-9_]*(?:\.[0-9_]*)?(?:[eE][+-]?[0-9]+)?[jJ]?)\b";

/// Comments, literals and identifiers shared by the C-family and JSX grammars.
fn c_family_head() -> Result<Vec<RegexRule>, regex::Error> {
    Ok(vec![
        // Block comment; an unterminated one runs to the end of the text.
        RegexRule::new(r"(?s-u)/\*.*?(?:\*/|\z)", TokenKind::Comment)?,
        RegexRule::new(r"(?-u)//[^\n]*", TokenKind::Comment)?,
        RegexRule::new(r"(?m)^[ \t]*#[ \t]*[A-Za-z_]\w*", TokenKind::Preprocessor)?,
        // Rust attributes
        RegexRule::new(r"(?-u)#!?\[[^\]\n]*\]", TokenKind::Decorator)?,
        // Java / TypeScript annotations
        RegexRule::new(r"@[A-Za-z_][\w.]*", TokenKind::Decorator)?,
        RegexRule::new(r#"(?-u)"(?:[^"\\\n]|\\.)*"?"#, TokenKind::String)?,
        RegexRule::new(r"(?-u)'(?:[^'\\\n]|\\.)'", TokenKind::String)?,
        RegexRule::new(r"(?s-u)`(?:[^`\\]|\\.)*`?", TokenKind::String)?,
        RegexRule::new(C_NUMBER, TokenKind::Number)?,
        // Rust macro invocation
        RegexRule::new(r"\b([a-z_]\w*!)[(\[{]", TokenKind::Builtin)?.with_capture_group(1),
        RegexRule::new(C_KEYWORDS, TokenKind::Keyword)?,
        RegexRule::new(C_TYPES, TokenKind::Type)?,
        RegexRule::new(C_BUILTINS, TokenKind::Builtin)?,
        // UpperCamelCase names; ALL_CAPS constants stay plain.
        RegexRule::new(r"\b[A-Z][A-Za-z0-9_]*[a-z][A-Za-z0-9_]*\b", TokenKind::Type)?,
    ])
}

fn c_family_tail() -> Result<Vec<RegexRule>, regex::Error> {
    Ok(vec![
        RegexRule::new(r"[-+*/%=&|^!<>?:~]+", TokenKind::Operator)?,
        RegexRule::new(r"[(){}\[\];,.]", TokenKind::Punctuation)?,
    ])
}

pub(crate) fn c_family() -> Result<Vec<RegexRule>, regex::Error> {
    let mut rules = c_family_head()?;
    rules.extend(c_family_tail()?);
    Ok(rules)
}

pub(crate) fn jsx() -> Result<Vec<RegexRule>, regex::Error> {
    let mut rules = c_family_head()?;
    rules.extend([
        RegexRule::new(r"</?[A-Za-z][\w.:-]*", TokenKind::Tag)?,
        RegexRule::new(r"/>", TokenKind::Tag)?,
        RegexRule::new(r#"\s([A-Za-z_][\w-]*)=["'{]"#, TokenKind::Attribute)?.with_capture_group(1),
    ]);
    rules.extend(c_family_tail()?);
    Ok(rules)
}

pub(crate) fn python() -> Result<Vec<RegexRule>, regex::Error> {
    Ok(vec![
        RegexRule::new(
            r#"(?s-u)(?:\b[rRbBuUfF]{1,2})?(?:'''.*?(?:'''|\z)|""".*?(?:"""|\z))"#,
            TokenKind::String,
        )?,
        RegexRule::new(r"(?-u)#[^\n]*", TokenKind::Comment)?,
        RegexRule::new(
            r#"(?-u)(?:\b[rRbBuUfF]{1,2})?(?:"(?:[^"\\\n]|\\.)*"?|'(?:[^'\\\n]|\\.)*'?)"#,
            TokenKind::String,
        )?,
        RegexRule::new(r"(?m)^[ \t]*(@[A-Za-z_][\w.]*)", TokenKind::Decorator)?
            .with_capture_group(1),
        // Shell variables
        RegexRule::new(
            r"\$(?:\{[^}\n]*\}|[A-Za-z_]\w*|[0-9@#?$!*-])",
            TokenKind::Entity,
        )?,
        RegexRule::new(PY_NUMBER, TokenKind::Number)?,
        RegexRule::new(PY_KEYWORDS, TokenKind::Keyword)?,
        RegexRule::new(PY_BUILTINS, TokenKind::Builtin)?,
        RegexRule::new(r"\b[A-Z][A-Za-z0-9_]*[a-z][A-Za-z0-9_]*\b", TokenKind::Type)?,
        RegexRule::new(r"[-+*/%=&|^!<>~@]+", TokenKind::Operator)?,
        RegexRule::new(r"[(){}\[\];,.:]", TokenKind::Punctuation)?,
    ])
}

pub(crate) fn markup() -> Result<Vec<RegexRule>, regex::Error> {
    Ok(vec![
        RegexRule::new(r"(?s-u)<!--.*?(?:-->|\z)", TokenKind::Comment)?,
        RegexRule::new(r"(?s-u)<!\[CDATA\[.*?(?:\]\]>|\z)", TokenKind::String)?,
        RegexRule::new(r"(?-u)<[!?][^>]*>?", TokenKind::Preprocessor)?,
        RegexRule::new(r"</?[A-Za-z][\w:.-]*", TokenKind::Tag)?,
        RegexRule::new(r"\b([A-Za-z_:][\w:.-]*)[ \t]*=", TokenKind::Attribute)?
            .with_capture_group(1),
        // Attribute values only, so apostrophes in text content stay plain.
        RegexRule::new(r#"(?-u)=[ \t]*("[^"]*"?|'[^']*'?)"#, TokenKind::String)?
            .with_capture_group(1),
        RegexRule::new(
            r"&(?:#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z][A-Za-z0-9]*);",
            TokenKind::Entity,
        )?,
        RegexRule::new(r"/?>", TokenKind::Punctuation)?,
    ])
}
