use gotypes::model::{DeclRef, Module, TypeShape};
use gotypes::{ParseTextOptions, parse_text, resolve_references};
use indoc::indoc;

const SOURCE: &str = indoc! {r#"
    package main

    import (
        "fmt"
    )

    type A struct {
        I int `parser-test-tag:"this is a test"`
    }

    // parser-test-tag:"this is a test"
    type B struct {
        A
        J string
    }

    type C struct {
        B B
        K []byte
        L [10]string
    }

    func main() {
        c := C{}
        fmt.Println("Hello!", c.B.I)
    }
"#};

#[test]
fn tags_references_and_array_sizes() {
    let unit = parse_text(ParseTextOptions {
        content: SOURCE.to_owned(),
        filename: "test.go".into(),
        module: Module::new("github.com/example/gotypes-test", ""),
    })
    .unwrap();
    let units = vec![unit];

    let stats = resolve_references(&units);
    assert_eq!(stats.references, 2);
    assert_eq!(stats.unresolved(), 0);

    let decls = &units[0].declarations;
    let names: Vec<_> = decls.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);

    // Field tag on A.I.
    let a = decls[0].ty.as_struct().unwrap();
    let tag = a.fields[0].tags.get("parser-test-tag").unwrap();
    assert_eq!(tag.as_str(), "this is a test");

    // Declaration tag on B from its doc comment.
    let tag = decls[1].tags.get("parser-test-tag").unwrap();
    assert_eq!(tag.as_str(), "this is a test");

    // B embeds A.
    let b = decls[1].ty.as_struct().unwrap();
    let embedded = &b.fields[0];
    assert!(embedded.is_embedded());
    assert_eq!(embedded.implicit_name, "A");
    let target = embedded.ty.as_non_native().unwrap().target();
    assert_eq!(target, Some(DeclRef { unit: 0, decl: 0 }));
    assert!(std::ptr::eq(target.unwrap().get(&units).unwrap(), &decls[0]));

    // C.B refers to B.
    let c = decls[2].ty.as_struct().unwrap();
    let target = c.field("B").unwrap().ty.as_non_native().unwrap().target();
    assert!(std::ptr::eq(target.unwrap().get(&units).unwrap(), &decls[1]));

    // C.K is a byte slice, C.L has a literal size.
    let k = c.field("K").unwrap().ty.as_array().unwrap();
    assert!(matches!(&*k.elem, TypeShape::Native(n) if n.name == "byte"));
    assert_eq!(k.parsed_int, None);
    assert_eq!(c.field("L").unwrap().ty.as_array().unwrap().parsed_int, Some(10));
}
