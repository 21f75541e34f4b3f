#![no_main]

use gotypes::{Tag, scan_tags};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);

    let tags = scan_tags(&s);
    for (key, tag) in tags.iter() {
        assert!(!key.is_empty());
        assert!(!key.contains([' ', ':', '"']));
        for (name, _) in tag.properties() {
            assert!(!name.is_empty());
            let _ = tag.bool_property(name);
        }
    }

    // The raw input as a property list.
    let tag = Tag::new(&*s);
    let mut steps = 0usize;
    for (name, value) in tag.properties() {
        assert!(!name.is_empty());
        assert!(value.len() <= s.len());
        steps += 1;
        assert!(steps <= s.len());
    }
});
