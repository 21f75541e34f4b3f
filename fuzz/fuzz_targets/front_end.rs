#![no_main]

use gotypes::model::Module;
use gotypes::{ParseTextOptions, parse_text, resolve_references};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let content = String::from_utf8_lossy(data).into_owned();

    // Either outcome is fine; neither may panic.
    if let Ok(unit) = parse_text(ParseTextOptions {
        content,
        filename: "fuzz.go".into(),
        module: Module::new("example.com/fuzz", ""),
    }) {
        let units = vec![unit];
        let first = resolve_references(&units);
        let second = resolve_references(&units);
        assert_eq!(first, second);
    }
});
