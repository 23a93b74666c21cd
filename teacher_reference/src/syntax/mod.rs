//! Syntax highlighting for InputLayer Datalog.
//!
//! Uses a PEG grammar (`datalog.pest`) to tokenize input into classified spans,
//! then maps each span to ANSI terminal colors for REPL highlighting.
//!
//! The `.pest` grammar file is a reusable artifact that can also drive
//! web-based syntax highlighting (e.g., for documentation sites).

pub mod highlight;

use pest::Parser;
use pest_derive::Parser;
use std::ops::Range;

#[derive(Parser)]
#[grammar = "syntax/datalog.pest"]
struct DatalogTokenizer;

/// Token classification for syntax highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    StringLiteral,
    MetaCommand,
    QueryMarker,
    RuleArrow,
    OperatorPrefix,
    NegationPrefix,
    ComparisonOp,
    Number,
    Aggregate,
    BuiltinFn,
    Keyword,
    Variable,
    Identifier,
    ArithOp,
    Punctuation,
    Whitespace,
    Unknown,
}

impl TokenKind {
    /// ANSI escape code for this token kind (dark terminal background).
    pub fn ansi_code(self) -> &'static str {
        match self {
            Self::Comment => "\x1b[90m",          // dark gray
            Self::StringLiteral => "\x1b[32m",    // green
            Self::MetaCommand => "\x1b[1;35m",    // bold magenta
            Self::QueryMarker => "\x1b[1;36m",    // bold cyan
            Self::RuleArrow => "\x1b[1;36m",      // bold cyan
            Self::OperatorPrefix => "\x1b[1;36m", // bold cyan
            Self::NegationPrefix => "\x1b[1;31m", // bold red
            Self::ComparisonOp => "\x1b[31m",     // red
            Self::Number => "\x1b[36m",           // cyan
            Self::Aggregate => "\x1b[1;33m",      // bold yellow
            Self::BuiltinFn => "\x1b[33m",        // yellow
            Self::Keyword => "\x1b[1;34m",        // bold blue
            Self::Variable => "\x1b[1;37m",       // bold white
            Self::Identifier => "\x1b[97m",       // bright white (relations)
            Self::ArithOp => "\x1b[31m",          // red
            Self::Punctuation => "\x1b[90m",      // dark gray
            Self::Whitespace => "",               // no color
            Self::Unknown => "",                  // no color
        }
    }
}

/// A classified token span.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Tokenize a line of Datalog input into classified spans.
///
/// On parse failure (partial/malformed input), returns the entire input
/// as a single `Unknown` token so highlighting degrades gracefully.
pub fn tokenize(input: &str) -> Vec<Token> {
    let pairs = match DatalogTokenizer::parse(Rule::line, input) {
        Ok(pairs) => pairs,
        Err(_) => {
            return vec![Token {
                kind: TokenKind::Unknown,
                span: 0..input.len(),
            }];
        }
    };

    let mut tokens = Vec::new();

    for pair in pairs.flatten() {
        let kind = match pair.as_rule() {
            Rule::COMMENT => TokenKind::Comment,
            Rule::string_literal => TokenKind::StringLiteral,
            Rule::meta_command => TokenKind::MetaCommand,
            Rule::query_marker => TokenKind::QueryMarker,
            Rule::rule_arrow => TokenKind::RuleArrow,
            Rule::operator_prefix => TokenKind::OperatorPrefix,
            Rule::negation_prefix => TokenKind::NegationPrefix,
            Rule::comparison_op => TokenKind::ComparisonOp,
            Rule::number => TokenKind::Number,
            Rule::aggregate => TokenKind::Aggregate,
            Rule::builtin_fn => TokenKind::BuiltinFn,
            Rule::keyword => TokenKind::Keyword,
            Rule::variable => TokenKind::Variable,
            Rule::identifier => TokenKind::Identifier,
            Rule::arith_op => TokenKind::ArithOp,
            Rule::punctuation => TokenKind::Punctuation,
            Rule::whitespace => TokenKind::Whitespace,
            Rule::any_char => TokenKind::Unknown,
            // line, token, and hidden rules are structural â€” skip
            _ => continue,
        };

        let span = pair.as_span();
        tokens.push(Token {
            kind,
            span: span.start()..span.end(),
        });
    }

    tokens
}
