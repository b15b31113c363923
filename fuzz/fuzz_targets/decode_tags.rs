#![no_main]
use libfuzzer_sys::fuzz_target;
use swfrec::{decode_tags, encode_tags, CodecContext, DecoderConfig, EncoderConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(tags) = decode_tags(data, &mut CodecContext::new(), &DecoderConfig::default()) else {
        return;
    };
    // Was sich dekodieren laesst, muss sich auch wieder kodieren lassen
    let bytes = encode_tags(&tags, &mut CodecContext::new(), &EncoderConfig::default())
        .expect("decoded tags must re-encode");
    let again = decode_tags(&bytes, &mut CodecContext::new(), &DecoderConfig::default())
        .expect("re-encoded tags must decode");
    // Breiten werden beim Kodieren normalisiert (Postscript-Regel), danach stabil
    let normalised = encode_tags(&again, &mut CodecContext::new(), &EncoderConfig::default())
        .expect("normalised tags must re-encode");
    assert_eq!(normalised, bytes);
});
