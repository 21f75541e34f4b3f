use gosyntax::lexer::{Lexer, Tok};
use gosyntax::parse_source;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn lexer_spans_stay_in_bounds(s in ".*") {
        let mut last_real_end = 0usize;
        for (start, tok, end) in Lexer::new(&s) {
            prop_assert!(start <= end && end <= s.len(), "bad span ({start},{end}) for {s:?}");

            let injected = tok == Tok::Semi && start == end;
            if !injected {
                prop_assert!(start >= last_real_end, "token moved backwards in {s:?}");
                last_real_end = end;
            }
        }
    }

    #[test]
    fn parser_never_panics(s in ".*") {
        let _ = parse_source(&s);
    }

    #[test]
    fn parser_never_panics_on_declaration_soup(
        parts in prop::collection::vec(
            prop::sample::select(vec![
                "package p\n", "type ", "T ", "[", "]", "N ", "struct {", "}", "interface {",
                "map[", "chan ", "<-", "func(", ")", ",", "*", "~", "|", "\"tag\"", "\n",
                "any", ".", "...", "= ", "// c\n", "/* c */",
            ]),
            0..40,
        )
    ) {
        let src: String = parts.concat();
        let _ = parse_source(&src);
    }
}
