#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fuzz.m4a");
    if std::fs::write(&path, data).is_err() {
        return;
    }
    if let Ok(mut tag_file) = mp4tag::TagFile::open(&path) {
        let _ = tag_file.read_tags();
    }
});
