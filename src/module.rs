//! Locating the Go module a file belongs to.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Module;

impl Module {
    /// Walks up from the directory of `file` to the nearest `go.mod`.
    ///
    /// Directories crossed on the way become [`Module::sub_dir`]. Crossing a `vendor`
    /// directory, or reaching the filesystem root, fails with [`Error::ModuleNotFound`].
    pub fn locate(file: &Path) -> Result<Module> {
        let not_found = || Error::ModuleNotFound {
            path: file.to_path_buf(),
        };

        let mut dir = file.parent().ok_or_else(not_found)?;
        let mut fragments: Vec<&str> = Vec::new();

        loop {
            let go_mod = dir.join("go.mod");
            match fs::read_to_string(&go_mod) {
                Ok(content) => {
                    let name = module_name(&content)
                        .ok_or_else(|| Error::ModuleName { path: go_mod.clone() })?;
                    fragments.reverse();
                    let module = Module::new(name, fragments.join("/"));
                    debug!(go_mod = %go_mod.display(), module = %module.full_name(), "located module");
                    return Ok(module);
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(Error::io(go_mod, err)),
            }

            let fragment = dir
                .file_name()
                .and_then(|f| f.to_str())
                .ok_or_else(not_found)?;
            if fragment.eq_ignore_ascii_case("vendor") {
                return Err(not_found());
            }
            fragments.push(fragment);
            dir = dir.parent().ok_or_else(not_found)?;
        }
    }
}

/// Name from the first `module` directive, unquoted. `None` when missing or empty.
pub fn module_name(go_mod: &str) -> Option<&str> {
    let line = go_mod
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("module "))?;
    let line = line.split_once("//").map_or(line, |(name, _)| name).trim();
    let name = line
        .strip_prefix('"')
        .and_then(|l| l.strip_suffix('"'))
        .unwrap_or(line);
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::tempdir;

    #[test]
    fn module_directive_forms() {
        assert_eq!(module_name("module example.com/m\n"), Some("example.com/m"));
        assert_eq!(
            module_name("// header\n\nmodule \"example.com/q\" // quoted\ngo 1.22\n"),
            Some("example.com/q")
        );
        assert_eq!(module_name("go 1.22\n"), None);
        assert_eq!(module_name("module \n"), None);
    }

    #[test]
    fn sub_dir_collects_crossed_directories() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("go.mod"), "module example.com/m\n").unwrap();
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let module = Module::locate(&nested.join("x.go")).unwrap();
        assert_eq!(module, Module::new("example.com/m", "a/b"));

        let module = Module::locate(&root.path().join("x.go")).unwrap();
        assert_eq!(module, Module::new("example.com/m", ""));
    }

    #[test]
    fn vendor_directories_stop_the_search() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("go.mod"), "module example.com/m\n").unwrap();
        let vendored = root.path().join("Vendor").join("dep");
        fs::create_dir_all(&vendored).unwrap();

        // `dep` has no go.mod, so the search would cross `Vendor`.
        let err = Module::locate(&vendored.join("x.go")).unwrap_err();
        assert!(matches!(err, Error::ModuleNotFound { .. }));
    }

    #[test]
    fn empty_module_name_is_an_error() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("go.mod"), "go 1.22\n").unwrap();
        let err = Module::locate(&root.path().join("x.go")).unwrap_err();
        assert!(matches!(err, Error::ModuleName { .. }));
    }
}
