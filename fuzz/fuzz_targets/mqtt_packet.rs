#![no_main]

use codec::{CodecConfig, CodecLimits};
use libfuzzer_sys::fuzz_target;
use mqtt::read_packet;

fuzz_target!(|data: &[u8]| {
    let config = CodecConfig::default().with_limits(CodecLimits::for_testing());
    let mut source = data;
    for _ in 0..64 {
        let Ok(packet) = read_packet(&mut source, &config) else {
            break;
        };
        // Anything that decoded and validated must encode to the same frame length.
        let bytes = packet.to_bytes().expect("decoded packet re-encodes");
        assert_eq!(bytes.len(), packet.header().frame_len());
    }
});
