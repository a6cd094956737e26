#![no_main]

#[macro_use]
extern crate libfuzzer_sys;
extern crate chunkftp;

use chunkftp::path;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else { return };
    let resolved = path::resolve_virtual("/alice", input);

    assert!(resolved.starts_with('/'));
    assert!(!resolved.split('/').any(|seg| seg == ".."));
});
