//! The normalized type model produced by conversion and linked by resolution.
//!
//! Everything here is immutable once built, except [`NonNativeType::target`], a
//! write-once cell that the resolver fills after the whole batch exists.

use std::fmt;
use std::sync::OnceLock;

use model_derive::WalkModel;

use crate::tags::Tags;

/// Builtin type names that convert to [`TypeShape::Native`]. `rune`, `error` and `any`
/// are deliberately absent and convert to references.
pub const NATIVE_TYPES: &[&str] = &[
    "bool",
    "byte",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "string",
    "float",
    "float64",
    "float32",
    "complex128",
    "complex64",
    "uintptr",
];

#[inline]
pub fn is_native_type(name: &str) -> bool {
    NATIVE_TYPES.contains(&name)
}

/// Exported Go identifier: first character is an uppercase letter.
pub fn is_public(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Splits `pkg.Name` into its optional package and its name. `None` when either part is
/// empty or there is more than one dot.
pub fn identifier_parts(name: &str) -> Option<(Option<&str>, &str)> {
    match name.split_once('.') {
        None if !name.is_empty() => Some((None, name)),
        Some((pkg, ident)) if !pkg.is_empty() && !ident.is_empty() && !ident.contains('.') => {
            Some((Some(pkg), ident))
        }
        _ => None,
    }
}

// =============================================================================
// Modules and units
// =============================================================================

/// Logical module a file belongs to: the `go.mod` module name plus the file's directory
/// relative to the module root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Module {
    pub name: String,
    pub sub_dir: String,
}

impl Module {
    pub fn new(name: impl Into<String>, sub_dir: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_dir: sub_dir.into(),
        }
    }

    /// `name`, or `name/sub_dir` when the sub-directory is not empty.
    pub fn full_name(&self) -> String {
        if self.sub_dir.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.name, self.sub_dir)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Explicit alias, `.`, `_`, or the last segment of the path.
    pub name: String,
    pub path: String,
}

/// One converted source file.
#[derive(Debug)]
pub struct CompilationUnit {
    pub module: Module,
    pub filename: String,
    pub package: String,
    pub imports: Vec<Import>,
    pub declarations: Vec<Declaration>,
    /// Source text the unit was converted from.
    pub text: String,
}

impl CompilationUnit {
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    pub fn import(&self, alias: &str) -> Option<&Import> {
        self.imports.iter().find(|i| i.name == alias)
    }
}

#[derive(Debug, WalkModel)]
pub struct Declaration {
    #[walk(skip)]
    pub name: String,
    pub ty: TypeShape,
    #[walk(skip)]
    pub tags: Tags,
}

impl Declaration {
    pub fn is_public(&self) -> bool {
        is_public(&self.name)
    }
}

/// Handle to a declaration inside the batch that was resolved: index of the unit, then
/// index of the declaration within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclRef {
    pub unit: usize,
    pub decl: usize,
}

impl DeclRef {
    /// Follows the handle into the batch it was resolved against.
    pub fn get<'a>(&self, units: &'a [CompilationUnit]) -> Option<&'a Declaration> {
        units.get(self.unit)?.declarations.get(self.decl)
    }
}

// =============================================================================
// Type shapes
// =============================================================================

#[derive(Debug, WalkModel)]
pub enum TypeShape {
    Native(NativeType),
    NonNative(NonNativeType),
    Struct(StructType),
    Interface(InterfaceType),
    Map(MapType),
    Array(ArrayType),
    Pointer(PointerType),
    Channel(ChannelType),
    Function(FunctionType),
}

impl TypeShape {
    /// Name an embedded field of this type is promoted under: the builtin name, the
    /// unqualified reference name, or that of the element for arrays, pointers and
    /// channels. Empty for everything else.
    pub fn implicit_name(&self) -> &str {
        match self {
            Self::Native(n) => &n.name,
            Self::NonNative(n) => n.unqualified_name(),
            Self::Array(a) => a.elem.implicit_name(),
            Self::Pointer(p) => p.to.implicit_name(),
            Self::Channel(c) => c.elem.implicit_name(),
            Self::Struct(_) | Self::Interface(_) | Self::Map(_) | Self::Function(_) => "",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Native(_) => "native",
            Self::NonNative(_) => "reference",
            Self::Struct(_) => "struct",
            Self::Interface(_) => "interface",
            Self::Map(_) => "map",
            Self::Array(_) => "array",
            Self::Pointer(_) => "pointer",
            Self::Channel(_) => "channel",
            Self::Function(_) => "function",
        }
    }

    pub fn as_non_native(&self) -> Option<&NonNativeType> {
        match self {
            Self::NonNative(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, WalkModel)]
pub struct NativeType {
    #[walk(skip)]
    pub name: String,
}

/// Reference to another declaration by name, `Name` or `pkg.Name`.
#[derive(Debug, Default)]
pub struct NonNativeType {
    pub name: String,
    pub target: OnceLock<DeclRef>,
}

impl NonNativeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: OnceLock::new(),
        }
    }

    /// Package qualifier, if any.
    pub fn package(&self) -> Option<&str> {
        self.name.split_once('.').map(|(pkg, _)| pkg)
    }

    pub fn unqualified_name(&self) -> &str {
        self.name.split_once('.').map_or(&self.name, |(_, name)| name)
    }

    #[inline]
    pub fn target(&self) -> Option<DeclRef> {
        self.target.get().copied()
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }
}

#[derive(Debug, WalkModel)]
pub struct Field {
    /// Declared names; empty for embedded fields and anonymous parameters.
    #[walk(skip)]
    pub names: Vec<String>,
    /// Set only when `names` is empty.
    #[walk(skip)]
    pub implicit_name: String,
    pub ty: TypeShape,
    #[walk(skip)]
    pub tags: Tags,
}

impl Field {
    /// The declared names, or the implicit name of an embedded field.
    pub fn effective_names(&self) -> Vec<&str> {
        if self.names.is_empty() {
            vec![self.implicit_name.as_str()]
        } else {
            self.names.iter().map(String::as_str).collect()
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Default, WalkModel)]
pub struct StructType {
    pub fields: Vec<Field>,
}

impl StructType {
    /// First field declaring or embedding `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.effective_names().contains(&name))
    }
}

#[derive(Debug, Default, WalkModel)]
pub struct InterfaceType {
    /// Methods as function-typed fields, and embedded interfaces as embedded fields.
    pub methods: Vec<Field>,
    /// Set by conversion when type unions or `~T` terms were dropped from `methods`.
    /// The syntax tree itself never marks an interface incomplete.
    #[walk(skip)]
    pub incomplete: bool,
}

#[derive(Debug, WalkModel)]
pub struct MapType {
    pub key: Box<TypeShape>,
    pub value: Box<TypeShape>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArraySize {
    /// `[]T`
    Slice,
    /// `[...]T`
    Ellipsis,
    /// Length expression as written: `10`, `N`, `pkg.N`, `2 * N`.
    Expr(String),
}

impl fmt::Display for ArraySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slice => Ok(()),
            Self::Ellipsis => f.write_str("..."),
            Self::Expr(e) => f.write_str(e),
        }
    }
}

#[derive(Debug, WalkModel)]
pub struct ArrayType {
    #[walk(skip)]
    pub size: ArraySize,
    /// Value of an integer or rune literal length.
    #[walk(skip)]
    pub parsed_int: Option<i64>,
    pub elem: Box<TypeShape>,
}

#[derive(Debug, WalkModel)]
pub struct PointerType {
    pub to: Box<TypeShape>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, WalkModel)]
pub struct ChannelType {
    #[walk(skip)]
    pub dir: ChanDir,
    pub elem: Box<TypeShape>,
}

#[derive(Debug, Default, WalkModel)]
pub struct FunctionType {
    pub type_params: Vec<Field>,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}
