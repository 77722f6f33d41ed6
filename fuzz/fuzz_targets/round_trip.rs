#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlbind::Document;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(mut doc) = Document::parse(s) {
            let written = doc.to_xml().expect("a parsed document always writes");
            let again = Document::parse(&written).expect("written output parses");
            assert_eq!(
                again.export(again.root()).ok(),
                doc.export(doc.root()).ok(),
                "round trip changed the tree"
            );
        }
    }
});
