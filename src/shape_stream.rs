//! Shape record streams and the structures that own them.
//!
//! A stream is a run of [`ShapeRecord`]s closed by six zero bits. The
//! terminator never shows up in the record list. Owners ([`Shape`],
//! [`ShapeWithStyle`]) install the initial index widths and put the caller's
//! widths back once the stream is done, so style tables inside the stream
//! cannot leak into sibling shapes.

use log::trace;

use crate::bitstream::BitReader;
use crate::context::{CodecContext, ParamKey};
use crate::record::{Layout, Record};
use crate::shape_record::{
    check_index_width, set_index_widths, written_index_widths, ShapeRecord, StyleTable,
};
use crate::Result;

/// Bits of the end-of-stream marker.
const END_MARKER_BITS: u8 = 6;

const INDEX_WIDTH_KEYS: [ParamKey; 2] = [ParamKey::FillIndexWidth, ParamKey::LineIndexWidth];

/// Adds the record bits of one stream to the running total.
fn accumulate_bits(ctx: &mut CodecContext, bits: usize) {
    let total = ctx.int(ParamKey::ShapeBitAccumulator) + bits as i64;
    ctx.set(ParamKey::ShapeBitAccumulator, total);
}

/// Sequence of shape records up to (not including) the end marker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShapeStream {
    pub records: Vec<ShapeRecord>,
}

impl ShapeStream {
    pub fn new(records: Vec<ShapeRecord>) -> Self {
        Self { records }
    }

    /// Number of edge records.
    pub fn edge_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_edge()).count()
    }
}

impl FromIterator<ShapeRecord> for ShapeStream {
    fn from_iter<I: IntoIterator<Item = ShapeRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Record for ShapeStream {
    const NAME: &'static str = "ShapeStream";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        let start = out.bit_len();
        for record in &self.records {
            record.layout(ctx, out)?;
        }
        accumulate_bits(ctx, out.bit_len() - start);
        out.unsigned(0, END_MARKER_BITS);
        out.align();
        Ok(())
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        let start = reader.bit_position();
        let mut records = Vec::new();
        while reader.peek_bits(END_MARKER_BITS)? != 0 {
            records.push(ShapeRecord::read(reader, ctx)?);
        }
        accumulate_bits(ctx, reader.bit_position() - start);
        reader.read_bits(END_MARKER_BITS)?;
        reader.align_to_byte();
        trace!(
            "[swfrec] shape stream: {} records, {} bits",
            records.len(),
            reader.bit_position() - start
        );
        Ok(Self { records })
    }
}

/// A shape without its own style arrays (glyph outlines and similar).
///
/// Index widths are stored explicitly; records can only reference styles
/// introduced by style-change records inside the stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Shape {
    pub fill_index_width: u8,
    pub line_index_width: u8,
    pub stream: ShapeStream,
}

impl Record for Shape {
    const NAME: &'static str = "Shape";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        check_index_width("Shape.fill_index_width", self.fill_index_width)?;
        check_index_width("Shape.line_index_width", self.line_index_width)?;
        let mut scope = ctx.scope(&INDEX_WIDTH_KEYS);
        let (fill, line) =
            written_index_widths(&scope, self.fill_index_width, self.line_index_width);
        out.unsigned(u64::from(fill), 4);
        out.unsigned(u64::from(line), 4);
        set_index_widths(&mut scope, fill, line);
        self.stream.layout(&mut scope, out)
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        let mut scope = ctx.scope(&INDEX_WIDTH_KEYS);
        let fill_index_width = reader.read_bits(4)? as u8;
        let line_index_width = reader.read_bits(4)? as u8;
        set_index_widths(&mut scope, fill_index_width, line_index_width);
        let stream = ShapeStream::read(reader, &mut scope)?;
        Ok(Self {
            fill_index_width,
            line_index_width,
            stream,
        })
    }
}

/// A shape with its initial style arrays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShapeWithStyle {
    pub styles: StyleTable,
    pub stream: ShapeStream,
}

impl Record for ShapeWithStyle {
    const NAME: &'static str = "ShapeWithStyle";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        let mut scope = ctx.scope(&INDEX_WIDTH_KEYS);
        self.styles.layout(&mut scope, out)?;
        self.stream.layout(&mut scope, out)
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        let mut scope = ctx.scope(&INDEX_WIDTH_KEYS);
        let styles = StyleTable::read(reader, &mut scope)?;
        let stream = ShapeStream::read(reader, &mut scope)?;
        Ok(Self { styles, stream })
    }
}
