//! # Go declaration-level syntax tree
//!
//! Models the part of a Go source file that carries type information: the package
//! clause, imports, type declarations and the full type grammar, plus the comments
//! attached to declarations. Function bodies and `const`/`var` declarations are kept as
//! opaque spans.
//!
//! ## Architecture
//!
//! - **Nodes**: allocated in typed arenas (`SpannedArena<T>`) and addressed by `Id<T>`
//! - **Lists**: centralized buffers referenced by `ListRef<T>` instead of per-node `Vec`s
//! - **Spans**: kept in side tables next to each arena
//! - **Symbols**: identifiers are interned once per file
//!
//! Literal text (tags, import paths, array lengths) is never copied into the tree; it is
//! recovered from the source through spans.

use core::marker::PhantomData;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::hash::{BuildHasher, BuildHasherDefault, Hasher, RandomState};

// =============================================================================
// Core Foundation Types
// =============================================================================

/// Byte span in the source text; `end` is exclusive.
///
/// Positions are stored as `u32`, limiting file size to 4GB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Creates a new span, clamping positions that do not fit in `u32`.
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        let s = if start > u32::MAX as usize {
            u32::MAX
        } else {
            start as u32
        };
        let e = if end > u32::MAX as usize {
            u32::MAX
        } else {
            end as u32
        };
        Self { start: s, end: e }
    }

    #[inline]
    pub const fn from_range(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub const fn to(self, other: Span) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the source text covered by this span, if it lies on valid boundaries.
    #[inline]
    pub fn text<'src>(&self, src: &'src str) -> Option<&'src str> {
        src.get(self.start as usize..self.end as usize)
    }
}

/// Type-safe identifier for arena-allocated nodes.
#[derive(Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Id<T> {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn to_usize(&self) -> usize {
        self.raw as usize
    }
}

/// Typed reference into a centralized list buffer of `AstArena::extras`.
#[derive(Debug, PartialEq, Eq)]
pub struct ListRef<T> {
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for ListRef<T> {}

impl<T> Clone for ListRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Default for ListRef<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> ListRef<T> {
    pub const EMPTY: Self = Self {
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    const fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..(self.start + self.len) as usize
    }
}

// =============================================================================
// Symbol Interning
// =============================================================================

/// Interned identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Symbol(u32);

pub type Ident = Symbol;

/// Identifier occurrence (interned symbol + source position).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentName {
    pub sym: Ident,
    pub pos: Span,
}

#[derive(Default)]
struct U64IdentityHasher(u64);

impl Hasher for U64IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(b);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

type U64IdentityBuild = BuildHasherDefault<U64IdentityHasher>;

/// String interner: strings are stored once and looked up through hash buckets.
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    buckets: HashMap<u64, SmallVec<[Symbol; 1]>, U64IdentityBuild>,
    state: RandomState,
}

impl Interner {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a string and returns its symbol, reusing an existing one when present.
    pub fn intern(&mut self, s: &str) -> Symbol {
        let h = self.state.hash_one(s);
        let entry = self.buckets.entry(h).or_default();

        for &sym in entry.iter() {
            if self.strings[sym.0 as usize].as_ref() == s {
                return sym;
            }
        }

        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(s.into());
        entry.push(sym);
        sym
    }

    /// Resolves a symbol produced by this interner. Foreign symbols resolve to `""`.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.strings
            .get(sym.0 as usize)
            .map(AsRef::as_ref)
            .unwrap_or("")
    }
}

// =============================================================================
// Arena Allocation
// =============================================================================

/// Arena for nodes with a parallel span table.
#[derive(Debug)]
pub struct SpannedArena<T> {
    data: Vec<T>,
    spans: Vec<Span>,
}

impl<T> Default for SpannedArena<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            spans: Vec::new(),
        }
    }
}

impl<T> SpannedArena<T> {
    #[inline]
    pub fn alloc(&mut self, node: T, span: Span) -> Id<T> {
        let id = Id::from_raw(self.data.len() as u32);
        self.data.push(node);
        self.spans.push(span);
        id
    }

    #[inline]
    pub fn get(&self, id: Id<T>) -> &T {
        &self.data[id.to_usize()]
    }

    #[inline]
    pub fn span(&self, id: Id<T>) -> Span {
        self.spans[id.to_usize()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Index<Id<T>> for SpannedArena<T> {
    type Output = T;
    fn index(&self, id: Id<T>) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<Id<T>> for SpannedArena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.data[id.to_usize()]
    }
}

pub type ExprId = Id<Expr>;
pub type TypeId = Id<Type>;
pub type FieldId = Id<Field>;
pub type SignatureId = Id<Signature>;
pub type TypeParamsId = Id<TypeParams>;
pub type TypeParamDeclId = Id<TypeParamDecl>;
pub type CommentId = Id<Comment>;
pub type CommentGroupId = Id<CommentGroup>;

// =============================================================================
// Centralized List Storage
// =============================================================================

#[derive(Debug, Default)]
pub struct ExtraData {
    pub ident_names: Vec<IdentName>,
    pub types: Vec<TypeId>,
    pub fields: Vec<FieldId>,
    pub specs: Vec<Spec>,
    pub top_decls: Vec<TopLevelDecl>,
    pub type_terms: Vec<TypeTerm>,
    pub interface_elems: Vec<InterfaceElem>,
    pub type_param_decl_ids: Vec<TypeParamDeclId>,
    pub comment_ids: Vec<CommentId>,
    pub comment_group_ids: Vec<CommentGroupId>,
}

/// Central arena holding all nodes and list buffers of one source file.
#[derive(Debug, Default)]
pub struct AstArena {
    pub exprs: SpannedArena<Expr>,
    pub types: SpannedArena<Type>,
    pub signatures: SpannedArena<Signature>,
    pub fields: SpannedArena<Field>,
    pub type_params: SpannedArena<TypeParams>,
    pub type_param_decls: SpannedArena<TypeParamDecl>,
    pub comments: SpannedArena<Comment>,
    pub comment_groups: SpannedArena<CommentGroup>,
    pub extras: ExtraData,
}

macro_rules! list_fns {
    ($($builder:ident, $getter:ident: $t:ty => $buf:ident;)*) => {
        $(
            pub fn $builder(&mut self, items: impl IntoIterator<Item = $t>) -> ListRef<$t> {
                Self::push_list(&mut self.extras.$buf, items)
            }

            pub fn $getter(&self, r: ListRef<$t>) -> &[$t] {
                &self.extras.$buf[r.range()]
            }
        )*
    };
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn push_list<T>(buf: &mut Vec<T>, items: impl IntoIterator<Item = T>) -> ListRef<T> {
        let start = buf.len();
        buf.extend(items);
        let len = buf.len() - start;
        ListRef::new(start as u32, len as u32)
    }

    list_fns! {
        list_ident_names, ident_names: IdentName => ident_names;
        list_types, types_list: TypeId => types;
        list_fields, fields_list: FieldId => fields;
        list_specs, specs_list: Spec => specs;
        list_top_decls, top_decls: TopLevelDecl => top_decls;
        list_type_terms, type_terms: TypeTerm => type_terms;
        list_interface_elems, interface_elems: InterfaceElem => interface_elems;
        list_type_param_decl_ids, type_param_decl_ids: TypeParamDeclId => type_param_decl_ids;
        list_comment_ids, comment_ids: CommentId => comment_ids;
        list_comment_group_ids, comment_group_ids: CommentGroupId => comment_group_ids;
    }

    /// Text of a comment group, following Go's `ast.CommentGroup.Text` rules: comment
    /// markers are removed, a single space after `//` is dropped, `//`-directives such as
    /// `//go:generate` are omitted, trailing whitespace is trimmed, leading and trailing
    /// blank lines are removed and runs of blank lines collapse into one. Non-empty
    /// results end with a newline.
    pub fn comment_text(&self, group: CommentGroupId, src: &str) -> String {
        let mut lines: Vec<&str> = Vec::new();

        for &id in self.comment_ids(self.comment_groups[group].comments) {
            let Some(raw) = self.comments.span(id).text(src) else {
                continue;
            };
            let body = match self.comments[id].kind {
                CommentKind::Line => {
                    let c = raw.strip_prefix("//").unwrap_or(raw);
                    if let Some(rest) = c.strip_prefix(' ') {
                        rest
                    } else if is_directive(c) {
                        continue;
                    } else {
                        c
                    }
                }
                CommentKind::Block => {
                    let c = raw.strip_prefix("/*").unwrap_or(raw);
                    c.strip_suffix("*/").unwrap_or(c)
                }
            };
            lines.extend(body.split('\n').map(|l| l.trim_end_matches([' ', '\t', '\n', '\r'])));
        }

        let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
        for line in lines {
            if !line.is_empty() || kept.last().is_some_and(|prev| !prev.is_empty()) {
                kept.push(line);
            }
        }
        while kept.last().is_some_and(|l| l.is_empty()) {
            kept.pop();
        }

        let mut out = kept.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// Reports whether a `//` comment body (markers removed) is a tool directive such as
/// `go:generate`, `line 10` or `export f`.
fn is_directive(c: &str) -> bool {
    if c.starts_with("line ") || c.starts_with("extern ") || c.starts_with("export ") {
        return true;
    }

    let bytes = c.as_bytes();
    let Some(colon) = c.find(':') else {
        return false;
    };
    if colon == 0 || colon + 1 >= bytes.len() {
        return false;
    }

    (0..=colon + 1)
        .filter(|&i| i != colon)
        .all(|i| bytes[i].is_ascii_lowercase() || bytes[i].is_ascii_digit())
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

/// Comment token (text is recovered from source via span).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
}

/// Adjacent comments with no blank line or token between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentGroup {
    pub comments: ListRef<CommentId>,
}

// =============================================================================
// Source File and Declarations
// =============================================================================

/// ```text
/// SourceFile = PackageClause ";" { ImportDecl ";" } { TopLevelDecl ";" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFile {
    pub package_pos: Span,
    pub name: Ident,
    pub decls: ListRef<TopLevelDecl>,
    pub comments: ListRef<CommentGroupId>,
    pub doc: Option<CommentGroupId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopLevelDecl {
    Gen(GenDecl),
    /// Function or method declaration; only its extent is recorded.
    Func(Span),
}

/// `import`, `const`, `type` or `var` declaration. `const` and `var` carry no specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenDecl {
    pub doc: Option<CommentGroupId>,
    pub kw_pos: Span,
    pub kind: GenDeclKind,
    pub l_paren: Option<Span>,
    pub specs: ListRef<Spec>,
    pub r_paren: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GenDeclKind {
    Import,
    Const,
    Type,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spec {
    Import(ImportSpec),
    Type(TypeSpec),
}

/// `ImportSpec = [ "." | PackageName ] ImportPath`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSpec {
    pub doc: Option<CommentGroupId>,
    pub name: Option<ImportName>,
    pub path: StringLit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportName {
    Dot(Span),
    Blank(Span),
    Name(Ident, Span),
}

/// `TypeSpec = AliasDecl | TypeDef`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    pub doc: Option<CommentGroupId>,
    /// Trailing comment group on the spec's last line.
    pub comment: Option<CommentGroupId>,
    pub name: Ident,
    pub name_pos: Span,
    pub type_params: Option<TypeParamsId>,
    pub assign_pos: Option<Span>,
    pub typ: TypeId,
    pub alias: bool,
}

// =============================================================================
// Generics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeParams {
    pub params: ListRef<TypeParamDeclId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeParamDecl {
    pub names: ListRef<IdentName>,
    pub constraint: TypeElem,
}

/// Syntactic type element: `TypeTerm { "|" TypeTerm }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeElem {
    pub terms: ListRef<TypeTerm>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTerm {
    /// `~T`
    Tilde { tilde_pos: Span, typ: TypeId },
    Type { typ: TypeId },
}

// =============================================================================
// Signatures and Fields
// =============================================================================

/// `Signature = Parameters [ Result ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub params: FieldList,
    pub results: Option<Results>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Results {
    /// `(x int, y string)` or `(int, error)`
    Params(FieldList),
    /// Single unnamed result: `int`
    Type(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldList {
    pub l_paren: Span,
    pub fields: ListRef<FieldId>,
    pub r_paren: Span,
}

/// Field in a parameter list or struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Empty for anonymous parameters and embedded fields.
    pub names: ListRef<IdentName>,
    /// Position of `...` for variadic parameters.
    pub ellipsis_pos: Option<Span>,
    pub typ: TypeId,
    /// Struct tag literal (struct fields only).
    pub tag: Option<StringLit>,
    pub is_embed: bool,
}

// =============================================================================
// Expressions (array lengths)
// =============================================================================

/// Constant expression in an array length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expr {
    Ident(Ident),
    BasicLit(BasicLit),
    /// `pkg.Name`
    Selector { pkg: Ident, name: Ident },
    /// Any other expression; its text is recovered from the source via its span.
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicLit {
    pub kind: BasicLitKind,
    pub raw: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BasicLitKind {
    Int,
    Float,
    Imag,
    Rune,
    String,
}

/// String literal (interpreted or raw), quotes included in `raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLit {
    pub raw: Span,
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    /// `Name`, `pkg.Name`, `Name[T]`
    Named {
        pkg: Option<IdentName>,
        name: Ident,
        name_pos: Span,
        args: ListRef<TypeId>,
    },

    /// `*T`
    Pointer { star_pos: Span, elem: TypeId },

    /// `[N]T` or `[...]T`
    Array { len: ArrayLen, elem: TypeId },

    /// `[]T`
    Slice { elem: TypeId },

    /// `map[K]V`
    Map { key: TypeId, val: TypeId },

    /// `chan T`, `<-chan T` or `chan<- T`
    Chan { dir: ChanDir, elem: TypeId },

    /// `struct { ... }`
    Struct { fields: ListRef<FieldId> },

    /// `interface { ... }`
    Interface { elems: ListRef<InterfaceElem> },

    /// `func(...) ...`
    Func { sig: SignatureId },

    /// `(T)`
    Paren { typ: TypeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLen {
    Expr(ExprId),
    /// `[...]T`
    Ellipsis(Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceElem {
    /// `Method(...) ...`
    Method {
        name: Ident,
        name_pos: Span,
        sig: SignatureId,
    },

    /// Embedded type (`io.Reader`) or union (`int | ~float64`)
    TypeElem(TypeElem),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner_reuses_symbols() {
        let mut interner = Interner::new();
        let a = interner.intern("Point");
        let b = interner.intern("Point");
        let c = interner.intern("Rect");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(c), "Rect");
    }

    #[test]
    fn directives_are_recognized() {
        assert!(is_directive("go:generate stringer"));
        assert!(is_directive("line foo.go:10"));
        assert!(!is_directive("parser-test-tag:\"x\""));
        assert!(!is_directive("json:\"x\""));
        assert!(!is_directive("plain text"));
    }
}
