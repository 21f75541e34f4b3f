//! Go type-model extraction.
//!
//! - Go files are parsed by `gosyntax` and converted into a small closed set of type
//!   shapes ([`model::TypeShape`]), with struct and comment tags parsed by [`tags`].
//! - [`resolve::resolve_references`] then links every reference across files, packages and
//!   modules of a batch.

pub mod convert;
pub mod dir;
pub mod error;
pub mod model;
pub mod module;
pub mod resolve;
pub mod source;
pub mod tags;
pub mod walk;

pub use dir::{ParseDirectoryOptions, parse_directory};
pub use error::{Error, Result};
pub use model::{CompilationUnit, Declaration, Module, TypeShape};
pub use resolve::{ResolveStats, resolve_references};
pub use source::{ParseFileOptions, ParseTextOptions, parse_file, parse_text};
pub use tags::{Tag, Tags, scan_tags};
