use gosyntax::lexer::{Lexer, Tok};

fn injected_semis(input: &str) -> Vec<usize> {
    Lexer::new(input)
        .filter_map(|(s, t, e)| (t == Tok::Semi && s == e).then_some(s))
        .collect()
}

#[test]
fn newline_after_identifier_inserts_semicolon() {
    assert_eq!(injected_semis("type A int\n"), vec![10]);
}

#[test]
fn no_semicolon_after_operator_or_open_bracket() {
    assert!(injected_semis("a +\nb").ends_with(&[5]));
    assert_eq!(injected_semis("struct {\n"), Vec::<usize>::new());
}

#[test]
fn closing_brackets_insert_semicolon() {
    assert_eq!(injected_semis("f()\n"), vec![3]);
    assert_eq!(injected_semis("[]\n"), vec![2]);
    assert_eq!(injected_semis("}\n"), vec![1]);
}

#[test]
fn line_comment_keeps_semicolon_before_it_ends() {
    // The semicolon lands at the newline, after the comment.
    let src = "type A int // note\n";
    assert_eq!(injected_semis(src), vec![src.len() - 1]);
}

#[test]
fn eof_inserts_semicolon() {
    assert_eq!(injected_semis("package p"), vec![9]);
}

#[test]
fn comments_are_recorded_not_emitted() {
    let mut lx = Lexer::new("// a\n/* b */ x // c\n");
    let toks: Vec<_> = lx.by_ref().map(|(_, t, _)| t).collect();
    assert_eq!(toks, vec![Tok::Ident("x"), Tok::Semi]);

    let comments = lx.take_comments();
    assert_eq!(comments.len(), 3);
    assert!(comments.windows(2).all(|w| w[0].span.end <= w[1].span.start));
}

#[test]
fn unterminated_string_is_reported() {
    let mut lx = Lexer::new("\"abc\n");
    let toks: Vec<_> = lx.by_ref().map(|(_, t, _)| t).collect();
    assert!(toks.contains(&Tok::Error));
    let diags = lx.take_diags();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "unterminated string");
}
