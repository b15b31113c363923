//! End-to-end shape scenarios: exact bytes, re-encoding, extended counts.

use swfrec::context::ParamKey;
use swfrec::envelope::{decode_tag, encode_tag};
use swfrec::record::{from_bytes, to_bytes, Record};
use swfrec::{
    CodecContext, CurvedEdge, DefineShape, EncoderConfig, Error, FillStyle, LineStyle, Rect, Rgba,
    ShapeRecord, ShapeStream, ShapeVersion, ShapeWithStyle, StraightEdge, StyleChange, StyleTable,
};

fn red_fill() -> FillStyle {
    FillStyle::Solid(Rgba::rgb(0xFF, 0x00, 0x00))
}

fn black_line() -> LineStyle {
    LineStyle {
        width: 20,
        color: Rgba::rgb(0, 0, 0),
    }
}

/// Move to (10,20), fill 1, new styles (1 fill, 1 line, widths 2/1), a
/// horizontal edge and a curve.
fn scenario_stream() -> ShapeStream {
    ShapeStream::new(vec![
        StyleChange {
            move_to: Some((10, 20)),
            fill_style: Some(1),
            new_styles: Some(StyleTable {
                fill_styles: vec![red_fill()],
                line_styles: vec![black_line()],
                fill_index_width: 2,
                line_index_width: 1,
            }),
            ..StyleChange::default()
        }
        .into(),
        StraightEdge { dx: 5, dy: 0 }.into(),
        CurvedEdge {
            control_dx: 3,
            control_dy: 4,
            anchor_dx: 6,
            anchor_dy: 8,
        }
        .into(),
    ])
}

const SCENARIO_BYTES: [u8; 21] = [
    // 0 1 0 0 1 1 | 00110 | 001010 | 010100 | 1
    0x4C, 0xC5, 0x29,
    // fills: count, solid red
    0x01, 0x00, 0xFF, 0x00, 0x00,
    // lines: count, width 20, black
    0x01, 0x14, 0x00, 0x00, 0x00, 0x00,
    // fill width 2, line width 1
    0x21,
    // straight edge, curve, end marker, padding
    0xC8, 0x58, 0xC6, 0x43, 0x20, 0x00,
];

fn context_with_widths(fill: u8, line: u8) -> CodecContext {
    let mut ctx = CodecContext::new();
    ctx.set(ParamKey::FillIndexWidth, fill);
    ctx.set(ParamKey::LineIndexWidth, line);
    ctx
}

#[test]
fn scenario_stream_exact_bytes() {
    let mut ctx = context_with_widths(1, 0);
    let bytes = to_bytes(&scenario_stream(), &mut ctx).unwrap();
    assert_eq!(bytes, SCENARIO_BYTES);
    assert_eq!(ctx.width(ParamKey::FillIndexWidth), 2);
    assert_eq!(ctx.width(ParamKey::LineIndexWidth), 1);
    // 24 + 12 * 8 + 12 + 26 Bits Records, ohne Terminator
    assert_eq!(ctx.int(ParamKey::ShapeBitAccumulator), 158);
}

#[test]
fn scenario_stream_decodes_three_records() {
    let mut ctx = context_with_widths(1, 0);
    let stream: ShapeStream = from_bytes(&SCENARIO_BYTES, &mut ctx).unwrap();
    assert_eq!(stream.records.len(), 3);
    assert!(matches!(stream.records[0], ShapeRecord::StyleChange(_)));
    assert_eq!(stream.records[1], ShapeRecord::StraightEdge(StraightEdge { dx: 5, dy: 0 }));
    assert_eq!(stream, scenario_stream());

    let mut enc = context_with_widths(1, 0);
    assert_eq!(to_bytes(&stream, &mut enc).unwrap(), SCENARIO_BYTES);
}

#[test]
fn scenario_in_define_shape_reencodes_identically() {
    let mut ctx = CodecContext::new();
    let tag = DefineShape {
        version: ShapeVersion::One,
        id: 7,
        bounds: Rect::new(0, 400, 0, 400),
        shape: ShapeWithStyle {
            styles: StyleTable::fitted(vec![red_fill()], vec![], &ctx),
            stream: scenario_stream(),
        },
    };
    let bytes = encode_tag(&tag, &mut ctx, &EncoderConfig::default()).unwrap();
    assert!(bytes.windows(SCENARIO_BYTES.len()).any(|w| w == SCENARIO_BYTES));

    let decoded: DefineShape = decode_tag(&bytes, &mut CodecContext::new()).unwrap();
    assert_eq!(decoded, tag);
    let again = encode_tag(&decoded, &mut CodecContext::new(), &EncoderConfig::default()).unwrap();
    assert_eq!(again, bytes);
}

#[test]
fn measure_then_write_with_reseeded_context() {
    let mut ctx = context_with_widths(1, 0);
    let seed = ctx.snapshot();
    let stream = scenario_stream();
    let measured = stream.measure(&mut ctx).unwrap();
    assert_eq!(measured, SCENARIO_BYTES.len() * 8);

    ctx.restore(seed);
    let mut w = swfrec::BitWriter::new();
    stream.write(&mut w, &mut ctx).unwrap();
    assert_eq!(w.bit_position(), measured);
}

fn many_fills(n: usize) -> Vec<FillStyle> {
    (0..n).map(|i| FillStyle::Solid(Rgba::rgb(i as u8, 0, 0))).collect()
}

fn shape_with_fills(version: ShapeVersion, n: usize) -> DefineShape {
    let ctx = CodecContext::new();
    DefineShape {
        version,
        id: 1,
        bounds: Rect::default(),
        shape: ShapeWithStyle {
            styles: StyleTable::fitted(many_fills(n), vec![], &ctx),
            stream: ShapeStream::default(),
        },
    }
}

/// Count bytes that follow id (2) and the all-zero bounds (2) in the body,
/// behind a long header (6).
fn count_bytes(bytes: &[u8], len: usize) -> &[u8] {
    &bytes[10..10 + len]
}

#[test]
fn fill_array_of_255_uses_extended_count() {
    let mut ctx = CodecContext::new();
    let tag = shape_with_fills(ShapeVersion::Two, 255);
    assert_eq!(tag.shape.styles.fill_index_width, 8);
    let bytes = encode_tag(&tag, &mut ctx, &EncoderConfig::default()).unwrap();
    assert_eq!(count_bytes(&bytes, 3), [0xFFu8, 0xFF, 0x00]);
    assert_eq!(decode_tag::<DefineShape>(&bytes, &mut ctx).unwrap(), tag);
}

#[test]
fn extended_count_boundaries() {
    let mut ctx = CodecContext::new();
    for (n, head) in [(254, vec![0xFEu8]), (256, vec![0xFFu8, 0x00, 0x01])] {
        let tag = shape_with_fills(ShapeVersion::Three, n);
        let bytes = encode_tag(&tag, &mut ctx, &EncoderConfig::default()).unwrap();
        assert_eq!(count_bytes(&bytes, head.len()), head.as_slice(), "{n} fills");
        assert_eq!(decode_tag::<DefineShape>(&bytes, &mut ctx).unwrap(), tag, "{n} fills");
    }
}

#[test]
fn plain_counts_stop_at_255() {
    let mut ctx = CodecContext::new();
    let tag = shape_with_fills(ShapeVersion::One, 255);
    let bytes = encode_tag(&tag, &mut ctx, &EncoderConfig::default()).unwrap();
    assert_eq!(count_bytes(&bytes, 2), [0xFFu8, 0x00]);
    assert_eq!(decode_tag::<DefineShape>(&bytes, &mut ctx).unwrap(), tag);

    let too_many = shape_with_fills(ShapeVersion::One, 256);
    let err = encode_tag(&too_many, &mut ctx, &EncoderConfig::default()).unwrap_err();
    assert_eq!(
        err,
        Error::FieldOverflow {
            field: "StyleTable.fill_styles",
            value: 256,
            max_width: 255,
        }
    );
}
