#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlbind::{from_bytes, from_str_with_options, ParseOptions};

fuzz_target!(|data: &[u8]| {
    let _ = from_bytes(data);
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = from_str_with_options(s, ParseOptions::strict());
    }
});
