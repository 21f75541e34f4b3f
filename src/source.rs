//! Single-file entry points.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::convert::convert_unit;
use crate::error::{Error, Result};
use crate::model::{CompilationUnit, Module};

/// In-memory source. `filename` is only recorded, never read.
#[derive(Debug, Clone, Default)]
pub struct ParseTextOptions {
    pub content: String,
    pub filename: String,
    pub module: Module,
}

#[derive(Debug, Clone, Default)]
pub struct ParseFileOptions {
    pub filename: PathBuf,
    /// Locate the enclosing `go.mod` and record the module on the unit.
    pub resolve_module: bool,
}

pub fn parse_text(options: ParseTextOptions) -> Result<CompilationUnit> {
    let ParseTextOptions {
        content,
        filename,
        module,
    } = options;

    let parsed = gosyntax::parse_source(&content).map_err(|failure| Error::Syntax {
        filename: filename.clone(),
        failure,
    })?;
    let unit = convert_unit(&parsed, content, filename, module)?;

    debug!(
        file = %unit.filename,
        package = %unit.package,
        declarations = unit.declarations.len(),
        "parsed"
    );
    Ok(unit)
}

pub fn parse_file(options: ParseFileOptions) -> Result<CompilationUnit> {
    let filename = absolute(&options.filename)?;
    let content = fs::read_to_string(&filename).map_err(|e| Error::io(&filename, e))?;

    let module = if options.resolve_module {
        Module::locate(&filename)?
    } else {
        Module::default()
    };

    parse_text(ParseTextOptions {
        content,
        filename: filename.to_string_lossy().into_owned(),
        module,
    })
}

pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_name_the_file() {
        let err = parse_text(ParseTextOptions {
            content: "package p\ntype A struct {\n".into(),
            filename: "broken.go".into(),
            module: Module::default(),
        })
        .unwrap_err();

        match err {
            Error::Syntax { filename, failure } => {
                assert_eq!(filename, "broken.go");
                assert!(!failure.diags.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_files_report_their_path() {
        let err = parse_file(ParseFileOptions {
            filename: "definitely/not/here.go".into(),
            resolve_module: false,
        })
        .unwrap_err();
        assert!(matches!(err, Error::Io { ref path, .. } if path.ends_with("here.go")));
    }
}
