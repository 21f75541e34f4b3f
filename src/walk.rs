//! Depth-first traversal of the type model.
//!
//! `Walk` is derived for every shape with `#[derive(WalkModel)]`, so adding a shape
//! variant automatically extends every traversal. Visitors override only the hooks they
//! care about.

use crate::model::{CompilationUnit, Declaration, NonNativeType};

pub trait Walk<'m> {
    fn walk<V: Visitor<'m> + ?Sized>(&'m self, v: &mut V);
}

pub trait Visitor<'m> {
    #[inline]
    fn visit_declaration(&mut self, decl: &'m Declaration) {
        decl.walk(self);
    }

    /// Called for every reference, however deeply nested.
    #[inline]
    fn visit_non_native(&mut self, _ty: &'m NonNativeType) {}
}

impl<'m> Walk<'m> for NonNativeType {
    #[inline]
    fn walk<V: Visitor<'m> + ?Sized>(&'m self, v: &mut V) {
        v.visit_non_native(self);
    }
}

impl<'m> Walk<'m> for CompilationUnit {
    fn walk<V: Visitor<'m> + ?Sized>(&'m self, v: &mut V) {
        for decl in &self.declarations {
            v.visit_declaration(decl);
        }
    }
}

impl<'m, T: Walk<'m>> Walk<'m> for Box<T> {
    #[inline]
    fn walk<V: Visitor<'m> + ?Sized>(&'m self, v: &mut V) {
        (**self).walk(v);
    }
}

impl<'m, T: Walk<'m>> Walk<'m> for Vec<T> {
    #[inline]
    fn walk<V: Visitor<'m> + ?Sized>(&'m self, v: &mut V) {
        for item in self {
            item.walk(v);
        }
    }
}

/// Collects every reference reachable from the visited nodes, in walk order.
#[derive(Debug, Default)]
pub struct CollectReferences<'m> {
    pub found: Vec<&'m NonNativeType>,
}

impl<'m> Visitor<'m> for CollectReferences<'m> {
    fn visit_non_native(&mut self, ty: &'m NonNativeType) {
        self.found.push(ty);
    }
}

/// All references reachable from `decl`.
pub fn references(decl: &Declaration) -> Vec<&NonNativeType> {
    let mut collector = CollectReferences::default();
    collector.visit_declaration(decl);
    collector.found
}
