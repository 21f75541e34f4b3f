//! Recursive-descent parser for the declaration level of a Go source file.
//!
//! The whole token stream is buffered up front so that the few ambiguous spots of the
//! type grammar (`type A [N]int` versus `type L[T any] ...`, parameter names versus
//! parameter types) can be settled with bounded lookahead.

use crate::ast::{
    self, ArrayLen, AstArena, BasicLit, BasicLitKind, ChanDir, CommentGroup, CommentGroupId,
    Expr, Field, FieldId, FieldList, GenDecl, GenDeclKind, IdentName, ImportName, ImportSpec,
    InterfaceElem, Interner, ListRef, Results, Signature, SignatureId, SourceFile, Span, Spec,
    StringLit, TopLevelDecl, Type, TypeElem, TypeId, TypeParamDecl, TypeParams, TypeParamsId,
    TypeSpec, TypeTerm,
};
use crate::error::{Diag, ParseFailure};
use crate::lexer::{LexedComment, Lexer, Tok};

type PResult<T> = Result<T, Diag>;

/// A parsed file together with the arena and interner its ids point into.
#[derive(Debug)]
pub struct ParsedSource {
    pub file: SourceFile,
    pub arena: AstArena,
    pub interner: Interner,
}

impl ParsedSource {
    #[inline]
    pub fn name(&self, sym: ast::Ident) -> &str {
        self.interner.resolve(sym)
    }
}

/// Parses one Go source file. Any lexical or syntax error fails the whole file.
pub fn parse_source(src: &str) -> Result<ParsedSource, ParseFailure> {
    let mut lexer = Lexer::new(src);
    let toks: Vec<_> = lexer.by_ref().collect();
    let diags = lexer.take_diags();
    if !diags.is_empty() {
        return Err(ParseFailure { diags });
    }
    let comments = lexer.take_comments();

    let mut parser = Parser::new(src, toks, &comments);
    let file = parser.parse_file();

    if parser.diags.is_empty() {
        Ok(ParsedSource {
            file,
            arena: parser.arena,
            interner: parser.interner,
        })
    } else {
        Err(ParseFailure {
            diags: parser.diags,
        })
    }
}

// =============================================================================
// Parameter list resolution
// =============================================================================

/// One entry of a parameter list before names and types are told apart.
#[derive(Clone, Debug)]
struct ParamDecl {
    name: Option<IdentName>,
    ellipsis_pos: Option<Span>,
    typ: Option<TypeId>,
    span: Span,
}

/// Go parameter lists are either all named or all anonymous. If any entry carries both a
/// name and a type, bare identifiers are names sharing the next type (`a, b int`);
/// otherwise every bare identifier is itself a type (`func(int, error)`).
fn resolve_param_list(arena: &mut AstArena, params: Vec<ParamDecl>) -> PResult<Vec<FieldId>> {
    let named = params.iter().any(|p| p.name.is_some() && p.typ.is_some());
    let mut out = Vec::with_capacity(params.len());

    if !named {
        for p in params {
            let typ = match (p.typ, p.name) {
                (Some(typ), _) => typ,
                (None, Some(name)) => named_type_from_ident(arena, name),
                (None, None) => return Err(Diag::parse(p.span, "expected parameter type")),
            };
            let field = Field {
                names: ListRef::EMPTY,
                ellipsis_pos: p.ellipsis_pos,
                typ,
                tag: None,
                is_embed: false,
            };
            out.push(arena.fields.alloc(field, p.span));
        }
        return Ok(out);
    }

    let mut pending: Vec<IdentName> = Vec::new();
    let mut pending_start: Option<u32> = None;

    for p in params {
        match p.typ {
            None => {
                pending_start.get_or_insert(p.span.start);
                pending.extend(p.name);
            }
            Some(typ) => {
                let start = pending_start.take().unwrap_or(p.span.start);
                pending.extend(p.name);
                let names = arena.list_ident_names(pending.drain(..));
                let field = Field {
                    names,
                    ellipsis_pos: p.ellipsis_pos,
                    typ,
                    tag: None,
                    is_embed: false,
                };
                let span = Span {
                    start,
                    end: p.span.end,
                };
                out.push(arena.fields.alloc(field, span));
            }
        }
    }

    if let Some(last) = pending.last() {
        return Err(Diag::parse(last.pos, "mixed named and unnamed parameters"));
    }
    Ok(out)
}

fn named_type_from_ident(arena: &mut AstArena, name: IdentName) -> TypeId {
    arena.types.alloc(
        Type::Named {
            pkg: None,
            name: name.sym,
            name_pos: name.pos,
            args: ListRef::EMPTY,
        },
        name.pos,
    )
}

#[inline]
fn is_type_start(tok: Tok<'_>) -> bool {
    matches!(
        tok,
        Tok::Ident(_)
            | Tok::Star
            | Tok::LBrack
            | Tok::LParen
            | Tok::Arrow
            | Tok::KwMap
            | Tok::KwChan
            | Tok::KwFunc
            | Tok::KwStruct
            | Tok::KwInterface
    )
}

// =============================================================================
// Parser
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct GroupInfo {
    id: CommentGroupId,
    start: usize,
    end: usize,
    /// Starts on the line of the preceding token.
    trailing: bool,
}

struct Parser<'src> {
    toks: Vec<(usize, Tok<'src>, usize)>,
    pos: usize,
    last_end: usize,
    src_len: usize,

    /// Byte offset of each line start.
    lines: Vec<usize>,
    /// `(start, end)` of every token that is not an injected semicolon.
    real: Vec<(usize, usize)>,
    groups: Vec<GroupInfo>,

    arena: AstArena,
    interner: Interner,
    diags: Vec<Diag>,
}

impl<'src> Parser<'src> {
    fn new(src: &'src str, toks: Vec<(usize, Tok<'src>, usize)>, comments: &[LexedComment]) -> Self {
        let lines = std::iter::once(0)
            .chain(memchr::memchr_iter(b'\n', src.as_bytes()).map(|i| i + 1))
            .collect();
        let real = toks
            .iter()
            .filter(|(s, t, e)| !(*t == Tok::Semi && s == e))
            .map(|&(s, _, e)| (s, e))
            .collect();

        let mut parser = Self {
            toks,
            pos: 0,
            last_end: 0,
            src_len: src.len(),
            lines,
            real,
            groups: Vec::new(),
            arena: AstArena::new(),
            interner: Interner::new(),
            diags: Vec::new(),
        };
        parser.build_comment_groups(comments);
        parser
    }

    // -------------------------------------------------------------------------
    // Positions and comments
    // -------------------------------------------------------------------------

    #[inline]
    fn line_of(&self, pos: usize) -> usize {
        self.lines.partition_point(|&s| s <= pos).saturating_sub(1)
    }

    fn has_token_between(&self, from: usize, to: usize) -> bool {
        let idx = self.real.partition_point(|t| t.0 < from);
        self.real.get(idx).is_some_and(|t| t.0 < to)
    }

    fn prev_token_end(&self, pos: usize) -> Option<usize> {
        let idx = self.real.partition_point(|t| t.0 < pos);
        idx.checked_sub(1).map(|i| self.real[i].1)
    }

    fn build_comment_groups(&mut self, comments: &[LexedComment]) {
        let mut i = 0;
        while i < comments.len() {
            let first = comments[i];
            let start = first.span.start as usize;
            let trailing = self
                .prev_token_end(start)
                .is_some_and(|e| self.line_of(e) == self.line_of(start));
            let limit = usize::from(!trailing);

            let mut end = first.span.end as usize;
            let mut j = i + 1;
            while let Some(next) = comments.get(j) {
                let next_start = next.span.start as usize;
                if self.has_token_between(end, next_start)
                    || self.line_of(next_start) > self.line_of(end) + limit
                {
                    break;
                }
                end = next.span.end as usize;
                j += 1;
            }

            let ids: Vec<_> = comments[i..j]
                .iter()
                .map(|c| self.arena.comments.alloc(ast::Comment { kind: c.kind }, c.span))
                .collect();
            let list = self.arena.list_comment_ids(ids);
            let id = self
                .arena
                .comment_groups
                .alloc(CommentGroup { comments: list }, Span::new(start, end));
            self.groups.push(GroupInfo {
                id,
                start,
                end,
                trailing,
            });
            i = j;
        }
    }

    /// Comment group ending on the line right above `pos` with no token in between.
    fn doc_for(&self, pos: usize) -> Option<CommentGroupId> {
        let idx = self.groups.partition_point(|g| g.start < pos);
        let g = self.groups.get(idx.checked_sub(1)?)?;
        let adjacent = !g.trailing
            && g.end <= pos
            && self.line_of(g.end) + 1 == self.line_of(pos)
            && !self.has_token_between(g.end, pos);
        adjacent.then_some(g.id)
    }

    /// Comment group starting on the same line as `end`, after the token ending there.
    fn line_comment_after(&self, end: usize) -> Option<CommentGroupId> {
        let idx = self.groups.partition_point(|g| g.start < end);
        let g = self.groups.get(idx)?;
        let same_line = g.trailing
            && self.line_of(g.start) == self.line_of(end)
            && !self.has_token_between(end, g.start);
        same_line.then_some(g.id)
    }

    // -------------------------------------------------------------------------
    // Token cursor
    // -------------------------------------------------------------------------

    #[inline]
    fn nth(&self, n: usize) -> Option<Tok<'src>> {
        self.toks.get(self.pos + n).map(|t| t.1)
    }

    #[inline]
    fn tok(&self) -> Option<Tok<'src>> {
        self.nth(0)
    }

    #[inline]
    fn at(&self, tok: Tok<'_>) -> bool {
        self.tok() == Some(tok)
    }

    fn span(&self) -> Span {
        match self.toks.get(self.pos) {
            Some(&(s, _, e)) => Span::new(s, e),
            None => Span::new(self.src_len, self.src_len),
        }
    }

    #[inline]
    fn start(&self) -> usize {
        self.span().start as usize
    }

    fn bump(&mut self) -> Span {
        let span = self.span();
        if !span.is_empty() {
            self.last_end = span.end as usize;
        }
        if self.pos < self.toks.len() {
            self.pos += 1;
        }
        span
    }

    fn eat(&mut self, tok: Tok<'_>) -> Option<Span> {
        self.at(tok).then(|| self.bump())
    }

    fn expect(&mut self, tok: Tok<'_>, what: &str) -> PResult<Span> {
        self.eat(tok).ok_or_else(|| self.unexpected(what))
    }

    fn unexpected(&self, what: &str) -> Diag {
        let found = match self.tok() {
            Some(Tok::Semi) if self.span().is_empty() => "newline".to_owned(),
            Some(t) => t.to_string(),
            None => "end of file".to_owned(),
        };
        Diag::parse(self.span(), format!("expected {what}, found {found}"))
    }

    fn ident(&mut self, what: &str) -> PResult<IdentName> {
        match self.tok() {
            Some(Tok::Ident(s)) => {
                let sym = self.interner.intern(s);
                let pos = self.bump();
                Ok(IdentName { sym, pos })
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.last_end.max(start))
    }

    /// Index of the token closing the bracket at `self.pos + open`.
    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, &(_, t, _)) in self.toks.iter().enumerate().skip(self.pos + open) {
            match t {
                Tok::LBrack | Tok::LParen | Tok::LBrace => depth += 1,
                Tok::RBrack | Tok::RParen | Tok::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Whether the `[...]` opening at `self.pos + open` is followed by a type, as in the
    /// field `buf [N]byte`, rather than closing a generic instantiation like `List[T]`.
    fn bracket_then_type(&self, open: usize) -> bool {
        self.matching_close(open)
            .and_then(|close| self.toks.get(close + 1))
            .is_some_and(|&(_, t, _)| is_type_start(t))
    }

    // -------------------------------------------------------------------------
    // File and declarations
    // -------------------------------------------------------------------------

    fn parse_file(&mut self) -> SourceFile {
        let doc = self.doc_for(self.start());
        let (package_pos, name) = match self.parse_package_clause() {
            Ok(header) => header,
            Err(diag) => {
                self.diags.push(diag);
                self.sync();
                (Span::default(), self.interner.intern(""))
            }
        };

        let mut decls = Vec::new();
        while let Some(tok) = self.tok() {
            if tok == Tok::Semi {
                self.bump();
                continue;
            }
            match self.parse_top_level_decl() {
                Ok(decl) => decls.push(decl),
                Err(diag) => {
                    self.diags.push(diag);
                    self.sync();
                }
            }
        }

        let group_ids: Vec<_> = self.groups.iter().map(|g| g.id).collect();
        SourceFile {
            package_pos,
            name,
            decls: self.arena.list_top_decls(decls),
            comments: self.arena.list_comment_group_ids(group_ids),
            doc,
        }
    }

    fn parse_package_clause(&mut self) -> PResult<(Span, ast::Ident)> {
        let pos = self.expect(Tok::KwPackage, "package clause")?;
        let name = self.ident("package name")?;
        self.expect_decl_end()?;
        Ok((pos, name.sym))
    }

    /// Skips to the next declaration keyword that follows a semicolon.
    fn sync(&mut self) {
        while let Some(tok) = self.tok() {
            self.bump();
            if tok == Tok::Semi
                && matches!(
                    self.tok(),
                    None | Some(Tok::KwType | Tok::KwFunc | Tok::KwImport | Tok::KwVar | Tok::KwConst)
                )
            {
                return;
            }
        }
    }

    fn expect_decl_end(&mut self) -> PResult<()> {
        match self.tok() {
            None => Ok(()),
            Some(Tok::Semi) => {
                self.bump();
                Ok(())
            }
            _ => Err(self.unexpected("';' or newline")),
        }
    }

    fn parse_top_level_decl(&mut self) -> PResult<TopLevelDecl> {
        let kind = match self.tok() {
            Some(Tok::KwImport) => GenDeclKind::Import,
            Some(Tok::KwType) => GenDeclKind::Type,
            Some(Tok::KwConst) => GenDeclKind::Const,
            Some(Tok::KwVar) => GenDeclKind::Var,
            Some(Tok::KwFunc) => {
                let start = self.start();
                self.skip_decl();
                return Ok(TopLevelDecl::Func(self.span_from(start)));
            }
            _ => return Err(self.unexpected("declaration")),
        };

        let doc = self.doc_for(self.start());
        let kw_pos = self.span();

        if matches!(kind, GenDeclKind::Const | GenDeclKind::Var) {
            self.skip_decl();
            return Ok(TopLevelDecl::Gen(GenDecl {
                doc,
                kw_pos,
                kind,
                l_paren: None,
                specs: ListRef::EMPTY,
                r_paren: None,
            }));
        }

        self.bump();
        let mut specs = Vec::new();
        let (l_paren, r_paren) = if let Some(l) = self.eat(Tok::LParen) {
            loop {
                match self.tok() {
                    Some(Tok::RParen) => break,
                    Some(Tok::Semi) => {
                        self.bump();
                    }
                    Some(_) => {
                        specs.push(self.parse_spec(kind, true)?);
                        if !self.at(Tok::RParen) {
                            self.expect(Tok::Semi, "';' or ')'")?;
                        }
                    }
                    None => return Err(self.unexpected("')'")),
                }
            }
            (Some(l), Some(self.bump()))
        } else {
            specs.push(self.parse_spec(kind, false)?);
            (None, None)
        };
        self.expect_decl_end()?;

        Ok(TopLevelDecl::Gen(GenDecl {
            doc,
            kw_pos,
            kind,
            l_paren,
            specs: self.arena.list_specs(specs),
            r_paren,
        }))
    }

    /// Consumes a declaration whose content is not modelled: everything up to the first
    /// semicolon outside any brackets.
    fn skip_decl(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.tok() {
            self.bump();
            match tok {
                Tok::LParen | Tok::LBrack | Tok::LBrace => depth += 1,
                Tok::RParen | Tok::RBrack | Tok::RBrace => depth = depth.saturating_sub(1),
                Tok::Semi if depth == 0 => return,
                _ => {}
            }
        }
    }

    fn parse_spec(&mut self, kind: GenDeclKind, grouped: bool) -> PResult<Spec> {
        let doc = if grouped {
            self.doc_for(self.start())
        } else {
            None
        };
        match kind {
            GenDeclKind::Import => self.parse_import_spec(doc).map(Spec::Import),
            _ => self.parse_type_spec(doc).map(Spec::Type),
        }
    }

    fn parse_import_spec(&mut self, doc: Option<CommentGroupId>) -> PResult<ImportSpec> {
        let name = match self.tok() {
            Some(Tok::Dot) => Some(ImportName::Dot(self.bump())),
            Some(Tok::Ident("_")) => Some(ImportName::Blank(self.bump())),
            Some(Tok::Ident(_)) => {
                let id = self.ident("import name")?;
                Some(ImportName::Name(id.sym, id.pos))
            }
            _ => None,
        };
        let path = match self.tok() {
            Some(Tok::StringLit(_) | Tok::RawStringLit(_)) => StringLit { raw: self.bump() },
            _ => return Err(self.unexpected("import path")),
        };
        Ok(ImportSpec { doc, name, path })
    }

    fn parse_type_spec(&mut self, doc: Option<CommentGroupId>) -> PResult<TypeSpec> {
        let name = self.ident("type name")?;

        let type_params = if self.at(Tok::LBrack) && self.is_type_params() {
            Some(self.parse_type_params()?)
        } else {
            None
        };
        let assign_pos = self.eat(Tok::Assign);
        let typ = self.parse_type()?;
        let comment = self.line_comment_after(self.last_end);

        Ok(TypeSpec {
            doc,
            comment,
            name: name.sym,
            name_pos: name.pos,
            type_params,
            assign_pos,
            typ,
            alias: assign_pos.is_some(),
        })
    }

    /// `type L[T any]` versus `type A [N]int`: a parameter list starts with a name that
    /// is followed by another name, a comma or the start of a constraint.
    fn is_type_params(&self) -> bool {
        matches!(self.nth(1), Some(Tok::Ident(_)))
            && matches!(
                self.nth(2),
                Some(
                    Tok::Ident(_)
                        | Tok::Comma
                        | Tok::Tilde
                        | Tok::LBrack
                        | Tok::KwInterface
                        | Tok::KwStruct
                        | Tok::KwMap
                        | Tok::KwChan
                        | Tok::KwFunc
                )
            )
    }

    fn parse_type_params(&mut self) -> PResult<TypeParamsId> {
        let start = self.start();
        self.expect(Tok::LBrack, "'['")?;

        let mut decls = Vec::new();
        while !self.at(Tok::RBrack) {
            let decl_start = self.start();
            let mut names = vec![self.ident("type parameter name")?];
            while self.eat(Tok::Comma).is_some() {
                names.push(self.ident("type parameter name")?);
            }
            let constraint = self.parse_type_elem()?;
            let names = self.arena.list_ident_names(names);
            let decl = TypeParamDecl { names, constraint };
            let span = self.span_from(decl_start);
            decls.push(self.arena.type_param_decls.alloc(decl, span));

            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        self.expect(Tok::RBrack, "']'")?;

        let params = self.arena.list_type_param_decl_ids(decls);
        let span = self.span_from(start);
        Ok(self.arena.type_params.alloc(TypeParams { params }, span))
    }

    /// `TypeTerm { "|" TypeTerm }` with `TypeTerm = [ "~" ] Type`.
    fn parse_type_elem(&mut self) -> PResult<TypeElem> {
        let mut terms = Vec::new();
        loop {
            let term = match self.eat(Tok::Tilde) {
                Some(tilde_pos) => TypeTerm::Tilde {
                    tilde_pos,
                    typ: self.parse_type()?,
                },
                None => TypeTerm::Type {
                    typ: self.parse_type()?,
                },
            };
            terms.push(term);
            if self.eat(Tok::Pipe).is_none() {
                break;
            }
        }
        Ok(TypeElem {
            terms: self.arena.list_type_terms(terms),
        })
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    fn parse_type(&mut self) -> PResult<TypeId> {
        let start = self.start();
        let typ = match self.tok() {
            Some(Tok::Ident(_)) => return self.parse_named(),
            Some(Tok::LBrack) => return self.parse_array_or_slice(),
            Some(Tok::KwStruct) => return self.parse_struct(),
            Some(Tok::KwInterface) => return self.parse_interface(),
            Some(Tok::Star) => {
                let star_pos = self.bump();
                let elem = self.parse_type()?;
                Type::Pointer { star_pos, elem }
            }
            Some(Tok::KwMap) => {
                self.bump();
                self.expect(Tok::LBrack, "'['")?;
                let key = self.parse_type()?;
                self.expect(Tok::RBrack, "']'")?;
                let val = self.parse_type()?;
                Type::Map { key, val }
            }
            Some(Tok::KwChan) => {
                self.bump();
                let dir = if self.eat(Tok::Arrow).is_some() {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                Type::Chan { dir, elem }
            }
            Some(Tok::Arrow) => {
                self.bump();
                self.expect(Tok::KwChan, "'chan'")?;
                let elem = self.parse_type()?;
                Type::Chan {
                    dir: ChanDir::Recv,
                    elem,
                }
            }
            Some(Tok::KwFunc) => {
                self.bump();
                let sig = self.parse_signature(start)?;
                Type::Func { sig }
            }
            Some(Tok::LParen) => {
                self.bump();
                let typ = self.parse_type()?;
                self.expect(Tok::RParen, "')'")?;
                Type::Paren { typ }
            }
            _ => return Err(self.unexpected("type")),
        };
        Ok(self.alloc_type(typ, start))
    }

    #[inline]
    fn alloc_type(&mut self, typ: Type, start: usize) -> TypeId {
        let span = self.span_from(start);
        self.arena.types.alloc(typ, span)
    }

    /// `Name`, `pkg.Name`, optionally followed by type arguments.
    fn parse_named(&mut self) -> PResult<TypeId> {
        let start = self.start();
        let first = self.ident("type name")?;
        let (pkg, name) = if self.eat(Tok::Dot).is_some() {
            (Some(first), self.ident("type name")?)
        } else {
            (None, first)
        };

        let args = if self.eat(Tok::LBrack).is_some() {
            let mut args = Vec::new();
            while !self.at(Tok::RBrack) {
                args.push(self.parse_type()?);
                if self.eat(Tok::Comma).is_none() {
                    break;
                }
            }
            self.expect(Tok::RBrack, "']'")?;
            self.arena.list_types(args)
        } else {
            ListRef::EMPTY
        };

        let typ = Type::Named {
            pkg,
            name: name.sym,
            name_pos: name.pos,
            args,
        };
        Ok(self.alloc_type(typ, start))
    }

    fn parse_array_or_slice(&mut self) -> PResult<TypeId> {
        let start = self.start();
        self.expect(Tok::LBrack, "'['")?;

        if self.eat(Tok::RBrack).is_some() {
            let elem = self.parse_type()?;
            return Ok(self.alloc_type(Type::Slice { elem }, start));
        }

        let len = if self.at(Tok::Ellipsis) && self.nth(1) == Some(Tok::RBrack) {
            ArrayLen::Ellipsis(self.bump())
        } else {
            ArrayLen::Expr(self.parse_array_len()?)
        };
        self.expect(Tok::RBrack, "']'")?;
        let elem = self.parse_type()?;
        Ok(self.alloc_type(Type::Array { len, elem }, start))
    }

    /// Scans the length expression up to the closing `]`. Identifiers, `pkg.Name` and
    /// single literals are classified; anything else is kept as raw source.
    fn parse_array_len(&mut self) -> PResult<ast::ExprId> {
        let first = self.pos;
        let mut depth = 0usize;
        loop {
            match self.tok() {
                None => return Err(self.unexpected("']'")),
                Some(Tok::RBrack) if depth == 0 => break,
                Some(Tok::LBrack | Tok::LParen | Tok::LBrace) => depth += 1,
                Some(Tok::RBrack | Tok::RParen | Tok::RBrace) => depth = depth.saturating_sub(1),
                Some(_) => {}
            }
            self.bump();
        }
        if self.pos == first {
            return Err(self.unexpected("array length"));
        }

        let span = Span::new(self.toks[first].0, self.toks[self.pos - 1].2);
        let expr = match &self.toks[first..self.pos] {
            [(_, Tok::Ident(name), _)] => Expr::Ident(self.interner.intern(name)),
            [(_, Tok::Ident(pkg), _), (_, Tok::Dot, _), (_, Tok::Ident(name), _)] => {
                let (pkg, name) = (*pkg, *name);
                Expr::Selector {
                    pkg: self.interner.intern(pkg),
                    name: self.interner.intern(name),
                }
            }
            [(_, lit, _)] => match basic_lit_kind(*lit) {
                Some(kind) => Expr::BasicLit(BasicLit { kind, raw: span }),
                None => Expr::Raw,
            },
            _ => Expr::Raw,
        };
        Ok(self.arena.exprs.alloc(expr, span))
    }

    fn parse_struct(&mut self) -> PResult<TypeId> {
        let start = self.start();
        self.expect(Tok::KwStruct, "'struct'")?;
        self.expect(Tok::LBrace, "'{'")?;

        let mut fields = Vec::new();
        loop {
            match self.tok() {
                Some(Tok::RBrace) => break,
                Some(Tok::Semi) => {
                    self.bump();
                }
                Some(_) => {
                    fields.push(self.parse_field_decl()?);
                    if !self.at(Tok::RBrace) {
                        self.expect(Tok::Semi, "';' or '}'")?;
                    }
                }
                None => return Err(self.unexpected("'}'")),
            }
        }
        self.bump();

        let fields = self.arena.list_fields(fields);
        Ok(self.alloc_type(Type::Struct { fields }, start))
    }

    fn parse_field_decl(&mut self) -> PResult<FieldId> {
        let start = self.start();
        let embedded = match (self.tok(), self.nth(1)) {
            (Some(Tok::Star), _) => true,
            (
                Some(Tok::Ident(_)),
                None
                | Some(
                    Tok::Dot | Tok::Semi | Tok::RBrace | Tok::StringLit(_) | Tok::RawStringLit(_),
                ),
            ) => true,
            (Some(Tok::Ident(_)), Some(Tok::LBrack)) => !self.bracket_then_type(1),
            (Some(Tok::Ident(_)), _) => false,
            _ => return Err(self.unexpected("field name or embedded type")),
        };

        let (names, typ) = if embedded {
            (ListRef::EMPTY, self.parse_type()?)
        } else {
            let mut names = vec![self.ident("field name")?];
            while self.eat(Tok::Comma).is_some() {
                names.push(self.ident("field name")?);
            }
            let names = self.arena.list_ident_names(names);
            (names, self.parse_type()?)
        };

        let tag = match self.tok() {
            Some(Tok::StringLit(_) | Tok::RawStringLit(_)) => Some(StringLit { raw: self.bump() }),
            _ => None,
        };

        let field = Field {
            names,
            ellipsis_pos: None,
            typ,
            tag,
            is_embed: embedded,
        };
        let span = self.span_from(start);
        Ok(self.arena.fields.alloc(field, span))
    }

    fn parse_interface(&mut self) -> PResult<TypeId> {
        let start = self.start();
        self.expect(Tok::KwInterface, "'interface'")?;
        self.expect(Tok::LBrace, "'{'")?;

        let mut elems = Vec::new();
        loop {
            match self.tok() {
                Some(Tok::RBrace) => break,
                Some(Tok::Semi) => {
                    self.bump();
                }
                Some(Tok::Ident(_)) if self.nth(1) == Some(Tok::LParen) => {
                    let name_start = self.start();
                    let name = self.ident("method name")?;
                    let sig = self.parse_signature(name_start)?;
                    elems.push(InterfaceElem::Method {
                        name: name.sym,
                        name_pos: name.pos,
                        sig,
                    });
                    if !self.at(Tok::RBrace) {
                        self.expect(Tok::Semi, "';' or '}'")?;
                    }
                }
                Some(_) => {
                    elems.push(InterfaceElem::TypeElem(self.parse_type_elem()?));
                    if !self.at(Tok::RBrace) {
                        self.expect(Tok::Semi, "';' or '}'")?;
                    }
                }
                None => return Err(self.unexpected("'}'")),
            }
        }
        self.bump();

        let elems = self.arena.list_interface_elems(elems);
        Ok(self.alloc_type(Type::Interface { elems }, start))
    }

    // -------------------------------------------------------------------------
    // Signatures
    // -------------------------------------------------------------------------

    fn parse_signature(&mut self, start: usize) -> PResult<SignatureId> {
        let params = self.parse_params()?;
        let results = match self.tok() {
            Some(Tok::LParen) => Some(Results::Params(self.parse_params()?)),
            Some(t) if is_type_start(t) => Some(Results::Type(self.parse_type()?)),
            _ => None,
        };
        let span = self.span_from(start);
        Ok(self.arena.signatures.alloc(Signature { params, results }, span))
    }

    fn parse_params(&mut self) -> PResult<FieldList> {
        let l_paren = self.expect(Tok::LParen, "'('")?;

        let mut params = Vec::new();
        while !self.at(Tok::RParen) {
            params.push(self.parse_param()?);
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        let r_paren = self.expect(Tok::RParen, "')'")?;

        let fields = resolve_param_list(&mut self.arena, params)?;
        Ok(FieldList {
            l_paren,
            fields: self.arena.list_fields(fields),
            r_paren,
        })
    }

    fn parse_param(&mut self) -> PResult<ParamDecl> {
        let start = self.start();

        let name = match (self.tok(), self.nth(1)) {
            (Some(Tok::Ident(_)), Some(Tok::Comma | Tok::RParen)) => {
                let name = self.ident("parameter name")?;
                return Ok(ParamDecl {
                    name: Some(name),
                    ellipsis_pos: None,
                    typ: None,
                    span: name.pos,
                });
            }
            (Some(Tok::Ident(_)), Some(Tok::LBrack)) if self.bracket_then_type(1) => {
                Some(self.ident("parameter name")?)
            }
            (Some(Tok::Ident(_)), Some(Tok::Dot | Tok::LBrack)) => None,
            (Some(Tok::Ident(_)), Some(Tok::Ellipsis)) => Some(self.ident("parameter name")?),
            (Some(Tok::Ident(_)), Some(t)) if is_type_start(t) => {
                Some(self.ident("parameter name")?)
            }
            _ => None,
        };

        let ellipsis_pos = self.eat(Tok::Ellipsis);
        let typ = self.parse_type()?;
        Ok(ParamDecl {
            name,
            ellipsis_pos,
            typ: Some(typ),
            span: self.span_from(start),
        })
    }
}

fn basic_lit_kind(tok: Tok<'_>) -> Option<BasicLitKind> {
    Some(match tok {
        Tok::IntLit(_) => BasicLitKind::Int,
        Tok::FloatLit(_) => BasicLitKind::Float,
        Tok::ImagLit(_) => BasicLitKind::Imag,
        Tok::RuneLit(_) => BasicLitKind::Rune,
        Tok::StringLit(_) | Tok::RawStringLit(_) => BasicLitKind::String,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_decls(parsed: &ParsedSource) -> Vec<TypeSpec> {
        parsed
            .arena
            .top_decls(parsed.file.decls)
            .iter()
            .filter_map(|d| match d {
                TopLevelDecl::Gen(g) => Some(g.specs),
                TopLevelDecl::Func(_) => None,
            })
            .flat_map(|specs| parsed.arena.specs_list(specs).to_vec())
            .filter_map(|s| match s {
                Spec::Type(t) => Some(t),
                Spec::Import(_) => None,
            })
            .collect()
    }

    #[test]
    fn array_versus_type_params() {
        let parsed = parse_source("package p\ntype A [N]int\ntype L[T any] []T\n").unwrap();
        let specs = type_decls(&parsed);
        assert_eq!(specs.len(), 2);
        assert!(specs[0].type_params.is_none());
        assert!(matches!(
            parsed.arena.types[specs[0].typ],
            Type::Array { len: ArrayLen::Expr(_), .. }
        ));
        assert!(specs[1].type_params.is_some());
    }

    #[test]
    fn anonymous_parameters_are_types() {
        let parsed = parse_source("package p\ntype F func(int, error) (a, b string)\n").unwrap();
        let spec = type_decls(&parsed)[0];
        let Type::Func { sig } = parsed.arena.types[spec.typ] else {
            panic!("expected func type");
        };
        let sig = parsed.arena.signatures[sig];
        let params = parsed.arena.fields_list(sig.params.fields);
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|&f| parsed.arena.fields[f].names.is_empty()));

        let Some(Results::Params(results)) = sig.results else {
            panic!("expected result list");
        };
        let results = parsed.arena.fields_list(results.fields);
        assert_eq!(results.len(), 1);
        assert_eq!(parsed.arena.fields[results[0]].names.len(), 2);
    }

    #[test]
    fn doc_and_line_comments_attach() {
        let src = "package p\n\n// Doc line\ntype A int // trailing\n// Other\ntype B int\n";
        let parsed = parse_source(src).unwrap();
        let decls = parsed.arena.top_decls(parsed.file.decls);
        let TopLevelDecl::Gen(a) = decls[0] else {
            panic!("expected gen decl");
        };
        let doc = a.doc.map(|g| parsed.arena.comment_text(g, src));
        assert_eq!(doc.as_deref(), Some("Doc line\n"));

        let spec = type_decls(&parsed)[0];
        let line = spec.comment.map(|g| parsed.arena.comment_text(g, src));
        assert_eq!(line.as_deref(), Some("trailing\n"));

        let TopLevelDecl::Gen(b) = decls[1] else {
            panic!("expected gen decl");
        };
        let doc = b.doc.map(|g| parsed.arena.comment_text(g, src));
        assert_eq!(doc.as_deref(), Some("Other\n"));
    }

    #[test]
    fn bodies_are_skipped() {
        let src = "package p\nfunc f() { if x { y() } }\nvar v = struct{}{}\ntype T int\n";
        let parsed = parse_source(src).unwrap();
        assert_eq!(parsed.arena.top_decls(parsed.file.decls).len(), 3);
        assert_eq!(type_decls(&parsed).len(), 1);
    }

    #[test]
    fn syntax_errors_fail_the_file() {
        let err = parse_source("package p\ntype = int\n").unwrap_err();
        assert!(err.to_string().contains("expected type name"));
    }
}
