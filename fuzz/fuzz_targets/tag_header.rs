#![no_main]
use libfuzzer_sys::fuzz_target;
use swfrec::{BitReader, BitWriter, TagHeader};

fuzz_target!(|data: &[u8]| {
    let Ok(header) = TagHeader::read(&mut BitReader::new(data)) else {
        return;
    };
    let mut w = BitWriter::new();
    header.write(&mut w).expect("decoded header must re-encode");
    assert_eq!(w.bytes(), &data[..header.encoded_len()]);
});
