//! Two-phase record protocol: lay out once, measure, then write the same bits.
//!
//! A record describes its encoding exactly once, in [`Record::layout`], as a
//! flat list of fields. Measuring and writing both derive from that list, so
//! the size announced in a tag header cannot drift from the bits emitted.
//! `layout` also performs every context mutation the matching `read` would
//! perform (new index widths, alpha flags), keeping encoder and decoder in
//! step.

use crate::bitstream::{BitReader, BitWriter};
use crate::context::CodecContext;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Bits { value: u64, width: u8 },
    /// Zero-Padding bis zur naechsten Bytegrenze; `pad` ist der geplante Wert.
    Align { pad: u8 },
}

/// Declarative bit layout of a record (or a tree of nested records).
///
/// Positions are tracked relative to `start`, the absolute bit position the
/// layout assumes it will be written at; alignment padding depends on it.
#[derive(Debug, Clone)]
pub struct Layout {
    start: usize,
    bits: usize,
    fields: Vec<Field>,
}

impl Layout {
    /// Starts a layout that will be written at absolute bit `start`.
    pub fn at(start: usize) -> Self {
        Self {
            start,
            bits: 0,
            fields: Vec::new(),
        }
    }

    /// Bits laid out so far.
    pub fn bit_len(&self) -> usize {
        self.bits
    }

    /// Absolute bit position after the fields laid out so far.
    pub fn position(&self) -> usize {
        self.start + self.bits
    }

    /// Appends the low `width` bits of `value`.
    pub fn unsigned(&mut self, value: u64, width: u8) {
        debug_assert!(width <= 64, "bit count must be 0..=64, got {width}");
        if width == 0 {
            return;
        }
        self.fields.push(Field::Bits { value, width });
        self.bits += width as usize;
    }

    /// Appends `value` as a `width`-bit two's complement field.
    pub fn signed(&mut self, value: i64, width: u8) {
        self.unsigned(value as u64, width);
    }

    /// Appends a single flag bit.
    pub fn flag(&mut self, set: bool) {
        self.unsigned(u64::from(set), 1);
    }

    /// Appends one byte (not necessarily aligned).
    pub fn u8(&mut self, value: u8) {
        self.unsigned(u64::from(value), 8);
    }

    /// Appends a little-endian u16.
    pub fn u16(&mut self, value: u16) {
        for b in value.to_le_bytes() {
            self.u8(b);
        }
    }

    /// Appends a little-endian u32.
    pub fn u32(&mut self, value: u32) {
        for b in value.to_le_bytes() {
            self.u8(b);
        }
    }

    /// Appends a byte slice, one `u8` field per byte.
    pub fn bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.u8(b);
        }
    }

    /// Pads to the next byte boundary (relative to the absolute start).
    pub fn align(&mut self) {
        let pad = ((8 - self.position() % 8) % 8) as u8;
        if pad > 0 {
            self.fields.push(Field::Align { pad });
            self.bits += pad as usize;
        }
    }

    fn emit(&self, writer: &mut BitWriter) {
        for field in &self.fields {
            match *field {
                Field::Bits { value, width } => writer.write_bits(value, width),
                // Der Writer bestimmt das Padding selbst: stimmt die Phase nicht,
                // faellt das in write_to als InvariantViolation auf.
                Field::Align { .. } => writer.align_to_byte(),
            }
        }
    }
}

/// A measured record: its cached layout, ready to be written.
#[derive(Debug, Clone)]
pub struct Plan {
    record: &'static str,
    layout: Layout,
}

impl Plan {
    /// Runs `build` against a fresh layout starting at bit `start`.
    pub fn build<F>(
        record: &'static str,
        start: usize,
        ctx: &mut CodecContext,
        build: F,
    ) -> Result<Self>
    where
        F: FnOnce(&mut CodecContext, &mut Layout) -> Result<()>,
    {
        let mut layout = Layout::at(start);
        build(ctx, &mut layout)?;
        Ok(Self { record, layout })
    }

    /// Name of the planned record.
    pub fn record(&self) -> &'static str {
        self.record
    }

    /// Exact number of bits `write_to` will emit.
    pub fn bit_len(&self) -> usize {
        self.layout.bit_len()
    }

    /// Number of whole bytes the plan occupies (rounded up).
    pub fn byte_len(&self) -> usize {
        self.layout.bit_len().div_ceil(8)
    }

    /// Emits the planned fields.
    ///
    /// # Errors
    ///
    /// [`Error::InvariantViolation`] if the writer advanced by a different
    /// number of bits than measured. That happens when the plan was laid out
    /// for a different bit phase than the writer is at.
    pub fn write_to(&self, writer: &mut BitWriter) -> Result<()> {
        let before = writer.bit_position();
        self.layout.emit(writer);
        let written = writer.bit_position() - before;
        if written != self.bit_len() {
            return Err(Error::InvariantViolation {
                record: self.record,
                measured: self.bit_len(),
                written,
            });
        }
        Ok(())
    }
}

/// A bit-packed structure with a size-exact encoding.
pub trait Record: Sized {
    /// Name used in diagnostics.
    const NAME: &'static str;

    /// Describes the encoding of `self`, mutating `ctx` exactly as
    /// [`Record::read`] would for the same bits.
    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()>;

    /// Decodes one record, pulling field widths from `ctx`.
    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self>;

    /// Lays out `self` for writing at absolute bit `start`.
    fn plan_at(&self, start: usize, ctx: &mut CodecContext) -> Result<Plan> {
        Plan::build(Self::NAME, start, ctx, |ctx, out| self.layout(ctx, out))
    }

    /// Lays out `self` for writing at a byte boundary.
    fn plan(&self, ctx: &mut CodecContext) -> Result<Plan> {
        self.plan_at(0, ctx)
    }

    /// Bits `self` occupies when written at a byte boundary.
    ///
    /// Mutates `ctx` like `write` does; re-seed it (see
    /// [`CodecContext::snapshot`]) before a separate `write` call.
    fn measure(&self, ctx: &mut CodecContext) -> Result<usize> {
        Ok(self.plan(ctx)?.bit_len())
    }

    /// Writes `self` at the writer's current position, emitting exactly the
    /// bits [`Record::measure`] reports.
    ///
    /// # Errors
    ///
    /// [`Error::InvariantViolation`] if the writer's bit phase changes the
    /// size, i.e. a record with alignment padding written mid-byte. Use
    /// [`Record::plan_at`] for such positions.
    fn write(&self, writer: &mut BitWriter, ctx: &mut CodecContext) -> Result<()> {
        self.plan(ctx)?.write_to(writer)
    }
}

/// Encodes a single record into a fresh, zero-padded buffer.
pub fn to_bytes<R: Record>(record: &R, ctx: &mut CodecContext) -> Result<Vec<u8>> {
    let plan = record.plan(ctx)?;
    let mut writer = BitWriter::with_capacity(plan.byte_len());
    plan.write_to(&mut writer)?;
    Ok(writer.into_vec())
}

/// Decodes a single record from the start of `data`.
pub fn from_bytes<R: Record>(data: &[u8], ctx: &mut CodecContext) -> Result<R> {
    let mut reader = BitReader::new(data);
    R::read(&mut reader, ctx)
}
