#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Exercise the raw-byte deserialization path (includes serde_json's
    // own UTF-8 validation and error handling for invalid sequences).
    let _ = serde_json::from_slice::<shiritori_client::protocol::ServerEvent>(data);

    // Also exercise the str-based path the transport loop actually uses.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = serde_json::from_str::<shiritori_client::protocol::ServerEvent>(s);
    }
});
