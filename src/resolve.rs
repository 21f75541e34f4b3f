//! Batch-wide reference resolution.
//!
//! Resolution runs in two phases. The [`DeclarationIndex`] is built over the whole batch
//! first; only then are units walked, in parallel, binding every reference that can be
//! determined. The walk never mutates the index, and each reference is written at most once
//! through its `OnceLock`, so units need no further coordination.
//!
//! Misses are expected and silent: an unknown import alias, an unknown module, a relative
//! import escaping the module root or a missing declaration all leave the reference unbound.

use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Add;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::model::{CompilationUnit, DeclRef, Module, NonNativeType, identifier_parts};
use crate::walk::{Visitor, Walk};

/// Units of the batch grouped by module full name, batch order preserved.
#[derive(Debug)]
pub struct DeclarationIndex<'u> {
    units: &'u [CompilationUnit],
    modules: HashMap<String, Vec<usize>>,
}

impl<'u> DeclarationIndex<'u> {
    pub fn build(units: &'u [CompilationUnit]) -> Self {
        let mut modules: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, unit) in units.iter().enumerate() {
            modules.entry(unit.module.full_name()).or_default().push(i);
        }
        Self { units, modules }
    }

    /// First declaration named `name` in `module`, scanning units then declarations.
    pub fn lookup(&self, module: &str, name: &str) -> Option<DeclRef> {
        self.modules.get(module)?.iter().find_map(|&unit| {
            self.units[unit]
                .declarations
                .iter()
                .position(|d| d.name == name)
                .map(|decl| DeclRef { unit, decl })
        })
    }

    /// Target of `reference` as seen from `unit`, without binding it.
    pub fn resolve(&self, unit: &CompilationUnit, reference: &NonNativeType) -> Option<DeclRef> {
        let (module, name) = target_module(unit, &reference.name)?;
        self.lookup(&module, name)
    }
}

/// Module full name and unqualified declaration name a reference points at.
fn target_module<'a>(unit: &'a CompilationUnit, name: &'a str) -> Option<(Cow<'a, str>, &'a str)> {
    let (pkg, ident) = identifier_parts(name)?;
    let Some(pkg) = pkg else {
        return Some((Cow::Owned(unit.module.full_name()), ident));
    };

    let import = unit.import(pkg)?;
    let module = match import.path.as_str() {
        "" => return None,
        "." => Cow::Owned(unit.module.full_name()),
        path if path.starts_with('.') => Cow::Owned(normalize_relative(&unit.module, path)?),
        path => Cow::Borrowed(path),
    };
    Some((module, ident))
}

/// Module full name of a relative import made from a file in `module`.
///
/// `.` segments are dropped and `..` removes the preceding segment; `None` when `..` would
/// climb above the module root.
pub fn normalize_relative(module: &Module, path: &str) -> Option<String> {
    let joined = if module.sub_dir.is_empty() {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("{}/{}", module.sub_dir, path))
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "." => {}
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(segment),
        }
    }

    let rest = segments.join("/");
    Some(if rest.is_empty() {
        module.name.clone()
    } else {
        format!("{}/{}", module.name, rest)
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// References visited.
    pub references: usize,
    /// References bound once the run finished, including those bound by earlier runs.
    pub resolved: usize,
}

impl ResolveStats {
    pub fn unresolved(&self) -> usize {
        self.references - self.resolved
    }
}

impl Add for ResolveStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            references: self.references + rhs.references,
            resolved: self.resolved + rhs.resolved,
        }
    }
}

struct UnitResolver<'i, 'u> {
    index: &'i DeclarationIndex<'u>,
    unit: &'u CompilationUnit,
    stats: ResolveStats,
}

impl<'m> Visitor<'m> for UnitResolver<'_, '_> {
    fn visit_non_native(&mut self, ty: &'m NonNativeType) {
        self.stats.references += 1;

        if !ty.is_resolved() {
            match self.index.resolve(self.unit, ty) {
                Some(target) => {
                    // Another unit cannot reach this node, so the cell is still empty.
                    let _ = ty.target.set(target);
                }
                None => {
                    trace!(name = %ty.name, file = %self.unit.filename, "reference left unresolved");
                }
            }
        }

        if ty.is_resolved() {
            self.stats.resolved += 1;
        }
    }
}

/// Binds every reference in `units` that points at a declaration of the batch.
///
/// Running it again over the same batch changes nothing.
pub fn resolve_references(units: &[CompilationUnit]) -> ResolveStats {
    let index = DeclarationIndex::build(units);

    let stats = units
        .par_iter()
        .map(|unit| {
            let mut resolver = UnitResolver {
                index: &index,
                unit,
                stats: ResolveStats::default(),
            };
            unit.walk(&mut resolver);
            resolver.stats
        })
        .reduce(ResolveStats::default, Add::add);

    debug!(
        units = units.len(),
        modules = index.modules.len(),
        references = stats.references,
        resolved = stats.resolved,
        "resolved references"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(sub_dir: &str) -> Module {
        Module::new("example.com/m", sub_dir)
    }

    #[test]
    fn parent_segments_climb() {
        assert_eq!(
            normalize_relative(&module("a/b"), "../c").as_deref(),
            Some("example.com/m/a/c")
        );
        assert_eq!(
            normalize_relative(&module("a"), "./b/./c").as_deref(),
            Some("example.com/m/a/b/c")
        );
        assert_eq!(
            normalize_relative(&module("a"), "..").as_deref(),
            Some("example.com/m")
        );
    }

    #[test]
    fn climbing_above_the_root_is_abandoned() {
        assert_eq!(normalize_relative(&module("a"), "../../x"), None);
        assert_eq!(normalize_relative(&module(""), "../x"), None);
    }

    #[test]
    fn root_module_relative_imports() {
        assert_eq!(
            normalize_relative(&module(""), "./x").as_deref(),
            Some("example.com/m/x")
        );
    }

    #[test]
    fn stats_add_up() {
        let a = ResolveStats {
            references: 3,
            resolved: 1,
        };
        let b = ResolveStats {
            references: 2,
            resolved: 2,
        };
        assert_eq!(
            a + b,
            ResolveStats {
                references: 5,
                resolved: 3
            }
        );
        assert_eq!((a + b).unresolved(), 2);
    }
}
