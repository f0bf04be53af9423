#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(chunks) = sdxf2::decode(data) {
        // Anything that decodes must encode again and decode to the same tree.
        let encoded = sdxf2::encode(&chunks).expect("decoded tree failed to encode");
        let again = sdxf2::decode(&encoded).expect("re-encoded tree failed to decode");
        assert!(
            again.len() == chunks.len(),
            "re-encoded tree has a different chunk count"
        );
    }
});
