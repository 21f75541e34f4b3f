use std::fmt;

use thiserror::Error;

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagKind {
    Lex,
    Parse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    pub kind: DiagKind,
    pub span: Span,
    pub message: String,
}

impl Diag {
    pub fn parse(span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: DiagKind::Parse,
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} error at {}..{}: {}",
            self.kind, self.span.start, self.span.end, self.message
        )
    }
}

/// Every diagnostic collected while lexing and parsing one source file.
///
/// The first diagnostic is the one reported by `Display`; the rest are kept for callers
/// that want to show them all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub diags: Vec<Diag>,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diags.first() {
            Some(first) if self.diags.len() > 1 => {
                write!(f, "{first} (and {} more)", self.diags.len() - 1)
            }
            Some(first) => write!(f, "{first}"),
            None => f.write_str("parse failed"),
        }
    }
}

impl std::error::Error for ParseFailure {}

#[derive(Debug, Error, Clone, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    #[error("invalid token")]
    InvalidToken,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated comment")]
    UnterminatedComment,
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Default)]
#[error("{kind}: {span:?}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    #[inline]
    pub fn diag(&self) -> Diag {
        Diag {
            kind: DiagKind::Lex,
            span: self.span,
            message: self.kind.to_string(),
        }
    }
}
