//! Go declaration-level front end (Logos lexer + recursive-descent parser).
//!
//! - The lexer implements Go semicolon insertion and records comments on the side.
//! - The parser builds an arena-backed syntax tree of the package clause, imports and
//!   type declarations. Function bodies, `const` and `var` are skipped as opaque spans.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod lit;
pub mod parser;

pub use error::{Diag, ParseFailure};
pub use lexer::Lexer;
pub use parser::{ParsedSource, parse_source};
