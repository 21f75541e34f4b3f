use std::path::PathBuf;

use gosyntax::ParseFailure;
use thiserror::Error;

use crate::convert::ConvertError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal errors. Any of them aborts the file, and in directory mode the whole run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse {filename}: {failure}")]
    Syntax {
        filename: String,
        #[source]
        failure: ParseFailure,
    },

    #[error("unable to parse declaration {name} in {filename}: {source}")]
    Declaration {
        name: String,
        filename: String,
        #[source]
        source: ConvertError,
    },

    #[error("unable to parse import in {filename}: {source}")]
    Import {
        filename: String,
        #[source]
        source: ConvertError,
    },

    #[error("unable to locate go.mod file for {}", path.display())]
    ModuleNotFound { path: PathBuf },

    #[error("go module name not found in {}", path.display())]
    ModuleName { path: PathBuf },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_errors_name_the_file() {
        let err = Error::Declaration {
            name: "Grid".into(),
            filename: "model/grid.go".into(),
            source: ConvertError::ArrayLength { start: 40, end: 44 },
        };
        assert_eq!(
            err.to_string(),
            "unable to parse declaration Grid in model/grid.go: \
             array length at 40..44 lies outside the source text"
        );

        let err = Error::Import {
            filename: "main.go".into(),
            source: ConvertError::QualifiedName("a.b.c".into()),
        };
        assert!(err.to_string().starts_with("unable to parse import in main.go: "));
    }
}
