#![no_main]
use libfuzzer_sys::fuzz_target;
use swfrec::context::ParamKey;
use swfrec::record::{from_bytes, Record};
use swfrec::{BitWriter, CodecContext, ShapeStream};

fuzz_target!(|data: &[u8]| {
    // Erstes Byte: Index-Breiten (je 4 Bit), Rest: Record-Stream
    let Some((&widths, stream_bytes)) = data.split_first() else {
        return;
    };
    let mut ctx = CodecContext::new();
    ctx.set(ParamKey::FillIndexWidth, widths >> 4);
    ctx.set(ParamKey::LineIndexWidth, widths & 0x0F);
    let seed = ctx.snapshot();

    let Ok(stream) = from_bytes::<ShapeStream>(stream_bytes, &mut ctx) else {
        return;
    };
    ctx.restore(seed);
    let mut w = BitWriter::new();
    if stream.write(&mut w, &mut ctx).is_ok() {
        let mut check = CodecContext::new();
        check.set(ParamKey::FillIndexWidth, widths >> 4);
        check.set(ParamKey::LineIndexWidth, widths & 0x0F);
        let back = from_bytes::<ShapeStream>(w.bytes(), &mut check)
            .expect("written stream must decode");
        assert_eq!(back, stream);
    }
});
