//! Directory discovery.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;
use crate::model::CompilationUnit;
use crate::source::{ParseFileOptions, absolute, parse_file};

#[derive(Debug, Clone, Default)]
pub struct ParseDirectoryOptions {
    pub base_dir: PathBuf,
    pub resolve_module: bool,
    /// Also parse `_test.go` files.
    pub include_test_files: bool,
}

/// Parses every Go file under `base_dir`, in lexical pre-order.
///
/// `vendor` and `testdata` subtrees are skipped. The first failing file aborts the run.
pub fn parse_directory(options: ParseDirectoryOptions) -> Result<Vec<CompilationUnit>> {
    let base_dir = absolute(&options.base_dir)?;
    let files = discover(&base_dir, options.include_test_files)?;
    debug!(base_dir = %base_dir.display(), files = files.len(), "discovered go files");

    files
        .into_par_iter()
        .map(|filename| {
            parse_file(ParseFileOptions {
                filename,
                resolve_module: options.resolve_module,
            })
        })
        .collect()
}

/// Go source files under `base_dir`, sorted the way `parse_directory` visits them.
pub fn discover(base_dir: &Path, include_test_files: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(base_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

    // Symlinked files count; symlinked directories are not entered.
    for entry in walker {
        let entry = entry?;
        if entry.path().is_file() && is_go_source(&entry, include_test_files) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| {
            name.eq_ignore_ascii_case("vendor") || name.eq_ignore_ascii_case("testdata")
        })
}

fn is_go_source(entry: &DirEntry, include_test_files: bool) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    name.ends_with(".go") && (include_test_files || !name.ends_with("_test.go"))
}
