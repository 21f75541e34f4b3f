use gosyntax::ast::{
    ArrayLen, ChanDir, CommentGroupId, Expr, ImportName, InterfaceElem, Spec, TopLevelDecl, Type, TypeSpec,
    TypeTerm,
};
use gosyntax::{ParsedSource, parse_source};
use indoc::indoc;

fn parse(src: &str) -> ParsedSource {
    match parse_source(src) {
        Ok(parsed) => parsed,
        Err(err) => panic!("parse failed: {err}\n{src}"),
    }
}

fn specs(parsed: &ParsedSource) -> Vec<Spec> {
    parsed
        .arena
        .top_decls(parsed.file.decls)
        .iter()
        .filter_map(|d| match d {
            TopLevelDecl::Gen(g) => Some(parsed.arena.specs_list(g.specs).to_vec()),
            TopLevelDecl::Func(_) => None,
        })
        .flatten()
        .collect()
}

fn type_spec(parsed: &ParsedSource, name: &str) -> TypeSpec {
    specs(parsed)
        .into_iter()
        .find_map(|s| match s {
            Spec::Type(t) if parsed.name(t.name) == name => Some(t),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no type spec named {name}"))
}

#[test]
fn package_and_imports() {
    let parsed = parse(indoc! {r#"
        package sample

        import "fmt"

        import (
            alias "example.com/lib/v2"
            . "strings"
            _ "embed"
        )
    "#});
    assert_eq!(parsed.name(parsed.file.name), "sample");

    let imports: Vec<_> = specs(&parsed)
        .into_iter()
        .filter_map(|s| match s {
            Spec::Import(i) => Some(i),
            Spec::Type(_) => None,
        })
        .collect();
    assert_eq!(imports.len(), 4);
    assert!(imports[0].name.is_none());
    assert!(matches!(imports[1].name, Some(ImportName::Name(sym, _)) if parsed.name(sym) == "alias"));
    assert!(matches!(imports[2].name, Some(ImportName::Dot(_))));
    assert!(matches!(imports[3].name, Some(ImportName::Blank(_))));

    let src_path = imports[1].path.raw;
    assert_eq!(src_path.len(), "\"example.com/lib/v2\"".len() as u32);
}

#[test]
fn struct_fields_tags_and_embedding() {
    let src = indoc! {r#"
        package p

        type S struct {
            A, B int `json:"a"`
            io.Reader
            *Base
            List[int]
            Buf [Size]byte
            F func(x int) error
        }
    "#};
    let parsed = parse(src);
    let spec = type_spec(&parsed, "S");
    let Type::Struct { fields } = parsed.arena.types[spec.typ] else {
        panic!("expected struct");
    };
    let fields: Vec<_> = parsed
        .arena
        .fields_list(fields)
        .iter()
        .map(|&f| parsed.arena.fields[f])
        .collect();
    assert_eq!(fields.len(), 6);

    assert_eq!(fields[0].names.len(), 2);
    let tag = fields[0].tag.and_then(|t| t.raw.text(src));
    assert_eq!(tag, Some("`json:\"a\"`"));

    assert!(fields[1].is_embed && fields[2].is_embed && fields[3].is_embed);
    assert!(!fields[4].is_embed);
    assert!(matches!(
        parsed.arena.types[fields[4].typ],
        Type::Array { len: ArrayLen::Expr(_), .. }
    ));
    assert!(matches!(parsed.arena.types[fields[5].typ], Type::Func { .. }));
}

#[test]
fn interface_methods_embeds_and_unions() {
    let parsed = parse(indoc! {"
        package p

        type I interface {
            fmt.Stringer
            Close() error
            ~int | string
        }
    "});
    let spec = type_spec(&parsed, "I");
    let Type::Interface { elems } = parsed.arena.types[spec.typ] else {
        panic!("expected interface");
    };
    let elems = parsed.arena.interface_elems(elems);
    assert_eq!(elems.len(), 3);
    assert!(matches!(elems[0], InterfaceElem::TypeElem(e) if e.terms.len() == 1));
    assert!(matches!(elems[1], InterfaceElem::Method { name, .. } if parsed.name(name) == "Close"));
    let InterfaceElem::TypeElem(union) = elems[2] else {
        panic!("expected union");
    };
    let terms = parsed.arena.type_terms(union.terms);
    assert!(matches!(terms[0], TypeTerm::Tilde { .. }));
    assert!(matches!(terms[1], TypeTerm::Type { .. }));
}

#[test]
fn array_lengths_are_classified() {
    let src = indoc! {"
        package p

        type A [10]int
        type B [pkg.Size]int
        type C [N]int
        type D [2 * N]int
        type E [...]int
        type F []int
    "};
    let parsed = parse(src);

    let len_of = |name: &str| match parsed.arena.types[type_spec(&parsed, name).typ] {
        Type::Array { len, .. } => Some(len),
        _ => None,
    };
    let expr = |len: Option<ArrayLen>| match len {
        Some(ArrayLen::Expr(id)) => Some((parsed.arena.exprs[id], parsed.arena.exprs.span(id))),
        _ => None,
    };

    assert!(matches!(expr(len_of("A")), Some((Expr::BasicLit(_), _))));
    assert!(matches!(expr(len_of("B")), Some((Expr::Selector { .. }, _))));
    assert!(matches!(expr(len_of("C")), Some((Expr::Ident(_), _))));
    let (raw, span) = expr(len_of("D")).expect("array length");
    assert_eq!(raw, Expr::Raw);
    assert_eq!(span.text(src), Some("2 * N"));
    assert!(matches!(len_of("E"), Some(ArrayLen::Ellipsis(_))));
    assert!(len_of("F").is_none());
}

#[test]
fn channels_maps_and_generics() {
    let parsed = parse(indoc! {"
        package p

        type R <-chan int
        type S chan<- string
        type M map[string][]byte
        type Pair[K comparable, V any] struct { Key K; Val V }
        type Alias = Pair[string, int]
    "});

    assert!(matches!(
        parsed.arena.types[type_spec(&parsed, "R").typ],
        Type::Chan { dir: ChanDir::Recv, .. }
    ));
    assert!(matches!(
        parsed.arena.types[type_spec(&parsed, "S").typ],
        Type::Chan { dir: ChanDir::Send, .. }
    ));
    assert!(matches!(parsed.arena.types[type_spec(&parsed, "M").typ], Type::Map { .. }));

    let pair = type_spec(&parsed, "Pair");
    let params = pair.type_params.map(|id| parsed.arena.type_params[id].params);
    assert_eq!(params.map(|p| p.len()), Some(2));

    let alias = type_spec(&parsed, "Alias");
    assert!(alias.alias);
    assert!(matches!(
        parsed.arena.types[alias.typ],
        Type::Named { args, .. } if args.len() == 2
    ));
}

#[test]
fn grouped_type_specs_keep_their_own_docs() {
    let src = indoc! {"
        package p

        // Group doc
        type (
            // A doc
            A int // A line

            B string
        )
    "};
    let parsed = parse(src);
    let a = type_spec(&parsed, "A");
    let b = type_spec(&parsed, "B");

    let text = |g: CommentGroupId| parsed.arena.comment_text(g, src);
    assert_eq!(a.doc.map(text).as_deref(), Some("A doc\n"));
    assert_eq!(a.comment.map(text).as_deref(), Some("A line\n"));
    assert!(b.doc.is_none());
    assert!(b.comment.is_none());

    let TopLevelDecl::Gen(decl) = parsed.arena.top_decls(parsed.file.decls)[0] else {
        panic!("expected gen decl");
    };
    assert_eq!(decl.doc.map(text).as_deref(), Some("Group doc\n"));
}

#[test]
fn functions_consts_and_vars_are_skipped() {
    let parsed = parse(indoc! {"
        package p

        const (
            X = iota
            Y
        )

        var v = map[string]int{\"a\": 1}

        func (s *S) M(a int) (int, error) {
            for i := 0; i < 10; i++ {
            }
            return 0, nil
        }

        type S struct{}
    "});
    let decls = parsed.arena.top_decls(parsed.file.decls);
    assert_eq!(decls.len(), 4);
    assert!(matches!(decls[2], TopLevelDecl::Func(_)));
    assert_eq!(specs(&parsed).len(), 1);
}

#[test]
fn errors_are_reported_with_positions() {
    let err = parse_source("package p\n\ntype T struct {\n    A int\n").unwrap_err();
    assert!(!err.diags.is_empty());
    assert!(err.to_string().contains("expected"));

    assert!(parse_source("type T int\n").is_err());
    assert!(parse_source("package p\ntype T [3\n").is_err());
}
