//! Syntax tree to type model.
//!
//! Conversion is total over the declaration grammar: every type expression yields either
//! a shape or `None` ("not supported"), and the caller drops the field or declaration
//! holding an unsupported type. Only malformed input that cannot be represented at all
//! (a broken qualified name, an array length outside the source, an undecodable import
//! path) is an error.

use gosyntax::ParsedSource;
use gosyntax::ast::{
    self, ArrayLen, BasicLitKind, CommentGroupId, Expr, FieldId, GenDeclKind, ImportName,
    InterfaceElem, Results, SignatureId, Spec, StringLit, TopLevelDecl, Type, TypeId,
    TypeParamsId, TypeSpec, TypeTerm,
};
use gosyntax::lit::{self, LitError};
use thiserror::Error;
use tracing::trace;

use crate::error::{Error, Result};
use crate::model::{
    ArraySize, ArrayType, ChanDir, ChannelType, CompilationUnit, Declaration, Field,
    FunctionType, Import, InterfaceType, MapType, Module, NativeType, NonNativeType,
    PointerType, StructType, TypeShape, identifier_parts, is_native_type,
};
use crate::tags::{Tags, scan_tags};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("malformed qualified name `{0}`")]
    QualifiedName(String),

    #[error("array length at {start}..{end} lies outside the source text")]
    ArrayLength { start: u32, end: u32 },

    #[error("malformed import path {path}: {source}")]
    ImportPath {
        path: String,
        #[source]
        source: LitError,
    },
}

type ConvertResult<T> = std::result::Result<T, ConvertError>;

/// Builds the compilation unit for one parsed file.
pub fn convert_unit(
    parsed: &ParsedSource,
    text: String,
    filename: impl Into<String>,
    module: Module,
) -> Result<CompilationUnit> {
    let filename = filename.into();
    let converter = Converter::new(parsed, &text);
    let imports = converter.imports().map_err(|source| Error::Import {
        filename: filename.clone(),
        source,
    })?;
    let declarations = converter.declarations(&filename)?;
    let package = converter.name(parsed.file.name).to_owned();

    Ok(CompilationUnit {
        module,
        filename,
        package,
        imports,
        declarations,
        text,
    })
}

/// Converts the nodes of one parsed file. `src` must be the text the file was parsed
/// from: spans are resolved against it.
pub struct Converter<'a> {
    parsed: &'a ParsedSource,
    src: &'a str,
}

impl<'a> Converter<'a> {
    pub fn new(parsed: &'a ParsedSource, src: &'a str) -> Self {
        Self { parsed, src }
    }

    #[inline]
    fn arena(&self) -> &'a ast::AstArena {
        &self.parsed.arena
    }

    #[inline]
    fn name(&self, sym: ast::Ident) -> &'a str {
        self.parsed.interner.resolve(sym)
    }

    fn type_specs(&self) -> impl Iterator<Item = (ast::GenDecl, TypeSpec)> + 'a {
        let arena = self.arena();
        arena
            .top_decls(self.parsed.file.decls)
            .iter()
            .filter_map(|decl| match decl {
                TopLevelDecl::Gen(g) if g.kind == GenDeclKind::Type => Some(*g),
                _ => None,
            })
            .flat_map(move |g| {
                arena.specs_list(g.specs).iter().filter_map(move |s| match s {
                    Spec::Type(t) => Some((g, *t)),
                    Spec::Import(_) => None,
                })
            })
    }

    // -------------------------------------------------------------------------
    // Imports and declarations
    // -------------------------------------------------------------------------

    pub fn imports(&self) -> ConvertResult<Vec<Import>> {
        let arena = self.arena();
        let specs = arena
            .top_decls(self.parsed.file.decls)
            .iter()
            .filter_map(|decl| match decl {
                TopLevelDecl::Gen(g) if g.kind == GenDeclKind::Import => Some(g.specs),
                _ => None,
            })
            .flat_map(|specs| arena.specs_list(specs));

        let mut imports = Vec::new();
        for spec in specs {
            let Spec::Import(spec) = spec else {
                continue;
            };
            let raw = spec.path.raw.text(self.src).unwrap_or_default();
            let path = lit::unquote(raw).map_err(|source| ConvertError::ImportPath {
                path: raw.to_owned(),
                source,
            })?;

            let name = match spec.name {
                Some(ImportName::Dot(_)) => ".".to_owned(),
                Some(ImportName::Blank(_)) => "_".to_owned(),
                Some(ImportName::Name(sym, _)) => self.name(sym).to_owned(),
                None => path.rsplit('/').next().unwrap_or_default().to_owned(),
            };
            imports.push(Import { name, path });
        }
        Ok(imports)
    }

    /// Converts the type declarations in file order. `filename` only labels errors.
    pub fn declarations(&self, filename: &str) -> Result<Vec<Declaration>> {
        let mut out = Vec::new();

        for (gen_decl, spec) in self.type_specs() {
            let name = self.name(spec.name);
            if name.is_empty() {
                continue;
            }

            let ty = self
                .convert_decl_type(&spec)
                .map_err(|source| Error::Declaration {
                    name: name.to_owned(),
                    filename: filename.to_owned(),
                    source,
                })?;
            let Some(ty) = ty else {
                trace!(name, "skipping declaration of unsupported type");
                continue;
            };

            let mut tags = Tags::new();
            for group in [gen_decl.doc, spec.comment].into_iter().flatten() {
                self.scan_comment_tags(group, &mut tags);
            }

            out.push(Declaration {
                name: name.to_owned(),
                ty,
                tags,
            });
        }

        Ok(out)
    }

    /// Each line of the comment text is scanned on its own; later keys overwrite.
    fn scan_comment_tags(&self, group: CommentGroupId, tags: &mut Tags) {
        let text = self.arena().comment_text(group, self.src);
        for line in text.split('\n') {
            tags.extend(scan_tags(line.trim()));
        }
    }

    /// A declared function type also carries the declaration's type parameters.
    fn convert_decl_type(&self, spec: &TypeSpec) -> ConvertResult<Option<TypeShape>> {
        match self.arena().types[spec.typ] {
            Type::Func { sig } => self
                .convert_signature(sig, spec.type_params)
                .map(|f| Some(TypeShape::Function(f))),
            _ => self.convert_type(spec.typ),
        }
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    pub fn convert_type(&self, id: TypeId) -> ConvertResult<Option<TypeShape>> {
        let shape = match self.arena().types[id] {
            Type::Paren { typ } => return self.convert_type(typ),

            Type::Named { args, .. } if !args.is_empty() => {
                trace!("generic instantiation is not supported");
                return Ok(None);
            }
            Type::Named {
                pkg: None, name, ..
            } => {
                let name = self.name(name);
                if is_native_type(name) {
                    TypeShape::Native(NativeType {
                        name: name.to_owned(),
                    })
                } else {
                    TypeShape::NonNative(NonNativeType::new(name))
                }
            }
            Type::Named {
                pkg: Some(pkg),
                name,
                ..
            } => {
                let qualified = format!("{}.{}", self.name(pkg.sym), self.name(name));
                if identifier_parts(&qualified).is_none() {
                    return Err(ConvertError::QualifiedName(qualified));
                }
                TypeShape::NonNative(NonNativeType::new(qualified))
            }

            Type::Struct { fields } => TypeShape::Struct(StructType {
                fields: self.convert_fields(self.arena().fields_list(fields))?,
            }),
            Type::Interface { elems } => TypeShape::Interface(self.convert_interface(elems)?),

            Type::Map { key, val } => {
                let (Some(key), Some(value)) = (self.convert_type(key)?, self.convert_type(val)?)
                else {
                    return Ok(None);
                };
                TypeShape::Map(MapType {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }

            Type::Slice { elem } => return self.convert_array(None, elem),
            Type::Array { len, elem } => return self.convert_array(Some(len), elem),

            Type::Pointer { elem, .. } => {
                let Some(to) = self.convert_type(elem)? else {
                    return Ok(None);
                };
                TypeShape::Pointer(PointerType { to: Box::new(to) })
            }

            Type::Chan { dir, elem } => {
                let Some(elem) = self.convert_type(elem)? else {
                    return Ok(None);
                };
                let dir = match dir {
                    ast::ChanDir::Both => ChanDir::Both,
                    ast::ChanDir::Send => ChanDir::Send,
                    ast::ChanDir::Recv => ChanDir::Recv,
                };
                TypeShape::Channel(ChannelType {
                    dir,
                    elem: Box::new(elem),
                })
            }

            Type::Func { sig } => TypeShape::Function(self.convert_signature(sig, None)?),
        };
        Ok(Some(shape))
    }

    fn convert_array(&self, len: Option<ArrayLen>, elem: TypeId) -> ConvertResult<Option<TypeShape>> {
        let Some(elem) = self.convert_type(elem)? else {
            return Ok(None);
        };

        let (size, parsed_int) = match len {
            None => (ArraySize::Slice, None),
            Some(ArrayLen::Ellipsis(_)) => (ArraySize::Ellipsis, None),
            Some(ArrayLen::Expr(id)) => self.array_length(id)?,
        };

        Ok(Some(TypeShape::Array(ArrayType {
            size,
            parsed_int,
            elem: Box::new(elem),
        })))
    }

    fn array_length(&self, id: ast::ExprId) -> ConvertResult<(ArraySize, Option<i64>)> {
        let arena = self.arena();
        let span = arena.exprs.span(id);
        let source_text = || {
            span.text(self.src)
                .map(str::to_owned)
                .ok_or(ConvertError::ArrayLength {
                    start: span.start,
                    end: span.end,
                })
        };

        Ok(match arena.exprs[id] {
            Expr::Selector { pkg, name } => (
                ArraySize::Expr(format!("{}.{}", self.name(pkg), self.name(name))),
                None,
            ),
            Expr::BasicLit(lit) => {
                let text = source_text()?;
                let parsed_int = match lit.kind {
                    BasicLitKind::Int => lit::parse_int(&text),
                    BasicLitKind::Rune => lit::unquote_char(&text).ok().map(i64::from),
                    _ => None,
                };
                (ArraySize::Expr(text), parsed_int)
            }
            Expr::Ident(sym) => (ArraySize::Expr(self.name(sym).to_owned()), None),
            Expr::Raw => (ArraySize::Expr(source_text()?), None),
        })
    }

    fn convert_interface(&self, elems: ast::ListRef<InterfaceElem>) -> ConvertResult<InterfaceType> {
        let mut iface = InterfaceType::default();

        for elem in self.arena().interface_elems(elems) {
            match *elem {
                InterfaceElem::Method { name, sig, .. } => iface.methods.push(Field {
                    names: vec![self.name(name).to_owned()],
                    implicit_name: String::new(),
                    ty: TypeShape::Function(self.convert_signature(sig, None)?),
                    tags: Tags::new(),
                }),
                InterfaceElem::TypeElem(te) => match self.arena().type_terms(te.terms) {
                    [TypeTerm::Type { typ }] => {
                        if let Some(ty) = self.convert_type(*typ)? {
                            iface.methods.push(embedded(ty));
                        }
                    }
                    _ => {
                        trace!("dropping type set element from interface");
                        iface.incomplete = true;
                    }
                },
            }
        }

        Ok(iface)
    }

    // -------------------------------------------------------------------------
    // Fields and signatures
    // -------------------------------------------------------------------------

    fn convert_signature(
        &self,
        sig: SignatureId,
        type_params: Option<TypeParamsId>,
    ) -> ConvertResult<FunctionType> {
        let arena = self.arena();
        let sig = arena.signatures[sig];

        let results = match sig.results {
            None => Vec::new(),
            Some(Results::Params(list)) => self.convert_fields(arena.fields_list(list.fields))?,
            Some(Results::Type(typ)) => self.convert_type(typ)?.map(embedded).into_iter().collect(),
        };

        Ok(FunctionType {
            type_params: match type_params {
                Some(id) => self.convert_type_params(id)?,
                None => Vec::new(),
            },
            params: self.convert_fields(arena.fields_list(sig.params.fields))?,
            results,
        })
    }

    /// Each `[A, B C]` group becomes one field named after its parameters and typed by
    /// its constraint. Union and `~T` constraints are not supported.
    fn convert_type_params(&self, id: TypeParamsId) -> ConvertResult<Vec<Field>> {
        let arena = self.arena();
        let mut out = Vec::new();

        for &decl_id in arena.type_param_decl_ids(arena.type_params[id].params) {
            let decl = arena.type_param_decls[decl_id];
            let [TypeTerm::Type { typ }] = arena.type_terms(decl.constraint.terms) else {
                continue;
            };
            let Some(ty) = self.convert_type(*typ)? else {
                continue;
            };
            out.push(Field {
                names: self.ident_names(decl.names),
                implicit_name: String::new(),
                ty,
                tags: Tags::new(),
            });
        }

        Ok(out)
    }

    fn convert_fields(&self, ids: &[FieldId]) -> ConvertResult<Vec<Field>> {
        let arena = self.arena();
        let mut out = Vec::with_capacity(ids.len());

        for &id in ids {
            let field = arena.fields[id];
            if field.ellipsis_pos.is_some() {
                trace!("dropping variadic parameter");
                continue;
            }
            let Some(ty) = self.convert_type(field.typ)? else {
                trace!("dropping field of unsupported type");
                continue;
            };

            let names = self.ident_names(field.names);
            let implicit_name = if names.is_empty() {
                ty.implicit_name().to_owned()
            } else {
                String::new()
            };
            let tags = field.tag.map(|t| self.field_tags(t)).unwrap_or_default();

            out.push(Field {
                names,
                implicit_name,
                ty,
                tags,
            });
        }

        Ok(out)
    }

    fn ident_names(&self, names: ast::ListRef<ast::IdentName>) -> Vec<String> {
        self.arena()
            .ident_names(names)
            .iter()
            .map(|n| self.name(n.sym).to_owned())
            .collect()
    }

    fn field_tags(&self, tag: StringLit) -> Tags {
        let raw = tag.raw.text(self.src).unwrap_or_default();
        match lit::unquote(raw) {
            Ok(text) => scan_tags(&text),
            Err(err) => {
                trace!(%err, "ignoring undecodable field tag");
                Tags::new()
            }
        }
    }
}

/// Anonymous field: embedded struct member, embedded interface or unnamed result.
fn embedded(ty: TypeShape) -> Field {
    Field {
        names: Vec::new(),
        implicit_name: ty.implicit_name().to_owned(),
        ty,
        tags: Tags::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(src: &str) -> CompilationUnit {
        let parsed = gosyntax::parse_source(src).unwrap();
        convert_unit(&parsed, src.to_owned(), "test.go", Module::default()).unwrap()
    }

    #[test]
    fn rune_array_length_is_parsed() {
        let unit = convert("package p\ntype A ['a']int\n");
        let array = unit.declarations[0].ty.as_array().unwrap();
        assert_eq!(array.size, ArraySize::Expr("'a'".into()));
        assert_eq!(array.parsed_int, Some(97));
    }

    #[test]
    fn hex_array_length_is_parsed() {
        let unit = convert("package p\ntype A [0x10]int\n");
        assert_eq!(unit.declarations[0].ty.as_array().unwrap().parsed_int, Some(16));
    }

    #[test]
    fn escaped_field_tags_are_unquoted() {
        let unit = convert("package p\ntype S struct { A int \"json:\\\"a\\\"\" }\n");
        let st = unit.declarations[0].ty.as_struct().unwrap();
        assert_eq!(st.fields[0].tags.get("json").map(|t| t.as_str()), Some("a"));
    }
}
