#![no_main]

use std::io::Read;

use bitstream::BitReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 16 {
        return;
    }
    let (ops, input) = data.split_at(16);
    let mut reader = BitReader::new(input);

    // The first 16 bytes drive a bounded sequence of operations.
    for &op in ops {
        match op % 5 {
            0 => {
                let _ = reader.read_bit();
            }
            1 => {
                let bits = (op >> 2) % 64 + 1;
                let _ = reader.read_bits(bits);
            }
            2 => {
                let _ = reader.align_to_byte();
            }
            3 => {
                let bits = usize::from(op >> 1);
                if let Ok(field) = reader.read_field(bits) {
                    assert_eq!(field.len(), bits.div_ceil(8));
                }
            }
            _ => {
                let mut buf = [0u8; 4];
                let _ = reader.read(&mut buf);
            }
        }
    }
});
