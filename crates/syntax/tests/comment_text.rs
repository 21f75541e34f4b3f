use gosyntax::ast::TopLevelDecl;
use gosyntax::parse_source;
use indoc::indoc;

fn decl_doc(src: &str) -> String {
    let parsed = parse_source(src).unwrap_or_else(|e| panic!("{e}"));
    let decl = parsed
        .arena
        .top_decls(parsed.file.decls)
        .iter()
        .find_map(|d| match d {
            TopLevelDecl::Gen(g) => Some(*g),
            TopLevelDecl::Func(_) => None,
        })
        .expect("declaration");
    decl.doc
        .map(|g| parsed.arena.comment_text(g, src))
        .unwrap_or_default()
}

#[test]
fn line_comments_drop_markers_and_one_space() {
    let doc = decl_doc(indoc! {"
        package p

        // First line
        //   indented
        //no space
        type T int
    "});
    assert_eq!(doc, "First line\n  indented\nno space\n");
}

#[test]
fn directives_are_omitted() {
    let doc = decl_doc(indoc! {"
        package p

        // Keep me
        //go:generate stringer -type=T
        //lint:ignore U1000 unused
        type T int
    "});
    assert_eq!(doc, "Keep me\n");
}

#[test]
fn blank_lines_are_collapsed_and_trimmed() {
    let doc = decl_doc(indoc! {"
        package p

        /*

        Block   

        comment

        */
        type T int
    "});
    assert_eq!(doc, "Block\n\ncomment\n");
}

#[test]
fn blank_line_breaks_the_group() {
    let doc = decl_doc(indoc! {"
        package p

        // Detached

        // Attached
        type T int
    "});
    assert_eq!(doc, "Attached\n");
}

#[test]
fn tag_lines_survive() {
    let doc = decl_doc(indoc! {r#"
        package p

        // Doc text
        // parser-test-tag:"tag value"
        type T int
    "#});
    assert_eq!(doc, "Doc text\nparser-test-tag:\"tag value\"\n");
}
