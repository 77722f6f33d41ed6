#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlbind::{Document, Selector};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(selector) = Selector::parse(s) {
            let reparsed = Selector::parse(&selector.to_string());
            assert_eq!(reparsed.as_ref().ok(), Some(&selector));
        }
        let doc = Document::new("Root");
        let _ = doc.access_all(doc.root(), s);
    }
});
