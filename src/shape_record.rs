//! The three shape record kinds and the style tables they reference.
//!
//! Every record starts with a type flag. `0` is a style change; `1` marks an
//! edge, and a second flag chooses between straight (`1`) and curved (`0`).
//!
//! ```text
//! StyleChange   0 N L A F M [move] [fill] [alt fill] [line] [align, new styles]
//! StraightEdge  1 1 wwww G (dx dy | V d)
//! CurvedEdge    1 0 wwww cdx cdy adx ady
//! ```
//!
//! Edge widths are stored as `width - 2` in four bits, so edge deltas are
//! limited to 17 bits.

use crate::bit_width;
use crate::bitstream::BitReader;
use crate::context::{CodecContext, ParamKey};
use crate::extended_count::{layout_array, read_array};
use crate::geometry::{group_width, layout_group, WIDTH_PREFIX_BITS};
use crate::record::{Layout, Record};
use crate::style::{FillStyle, LineStyle};
use crate::{Error, Result};

/// Bits of the `width - 2` prefix in front of edge deltas.
const EDGE_WIDTH_BITS: u8 = 4;

/// Smallest edge field width.
pub const MIN_EDGE_WIDTH: u8 = 2;

/// Largest edge field width (`0b1111 + 2`).
pub const MAX_EDGE_WIDTH: u8 = (1 << EDGE_WIDTH_BITS) - 1 + MIN_EDGE_WIDTH;

/// Largest style index width (4-bit field).
pub const MAX_INDEX_WIDTH: u8 = 15;

/// Fill and line style arrays together with the index widths that select
/// entries from them.
///
/// Writing or reading a table installs its widths as
/// [`ParamKey::FillIndexWidth`] / [`ParamKey::LineIndexWidth`] for the records
/// that follow. While [`ParamKey::IsPostscriptHint`] is set, a width of 0 is
/// written (and installed) as 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleTable {
    pub fill_styles: Vec<FillStyle>,
    pub line_styles: Vec<LineStyle>,
    pub fill_index_width: u8,
    pub line_index_width: u8,
}

impl StyleTable {
    /// Builds a table with the smallest index widths for its arrays.
    ///
    /// With [`ParamKey::IsPostscriptHint`] set in `ctx`, an empty array still
    /// gets a 1-bit index field.
    pub fn fitted(
        fill_styles: Vec<FillStyle>,
        line_styles: Vec<LineStyle>,
        ctx: &CodecContext,
    ) -> Self {
        let postscript = ctx.flag(ParamKey::IsPostscriptHint);
        Self {
            fill_index_width: bit_width::for_index(fill_styles.len(), postscript),
            line_index_width: bit_width::for_index(line_styles.len(), postscript),
            fill_styles,
            line_styles,
        }
    }
}

/// Checks that an explicit index width fits its 4-bit field.
///
/// A width narrower than the style count needs is legal: only the indices
/// actually written have to fit it (see [`StyleChange`]).
pub(crate) fn check_index_width(field: &'static str, width: u8) -> Result<()> {
    if width > MAX_INDEX_WIDTH {
        return Err(Error::field_overflow(field, i64::from(width), u32::from(MAX_INDEX_WIDTH)));
    }
    Ok(())
}

/// Index widths as written: under [`ParamKey::IsPostscriptHint`] a stored
/// width of 0 goes out as 1.
pub(crate) fn written_index_widths(ctx: &CodecContext, fill: u8, line: u8) -> (u8, u8) {
    let postscript = ctx.flag(ParamKey::IsPostscriptHint);
    (
        bit_width::widen_index(fill, postscript),
        bit_width::widen_index(line, postscript),
    )
}

/// Installs a pair of index widths for the records that follow.
pub(crate) fn set_index_widths(ctx: &mut CodecContext, fill: u8, line: u8) {
    ctx.set(ParamKey::FillIndexWidth, fill);
    ctx.set(ParamKey::LineIndexWidth, line);
}

impl Record for StyleTable {
    const NAME: &'static str = "StyleTable";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        check_index_width("StyleTable.fill_index_width", self.fill_index_width)?;
        check_index_width("StyleTable.line_index_width", self.line_index_width)?;
        out.align();
        layout_array(&self.fill_styles, ctx, out, "StyleTable.fill_styles")?;
        layout_array(&self.line_styles, ctx, out, "StyleTable.line_styles")?;
        let (fill, line) = written_index_widths(ctx, self.fill_index_width, self.line_index_width);
        out.unsigned(u64::from(fill), 4);
        out.unsigned(u64::from(line), 4);
        set_index_widths(ctx, fill, line);
        Ok(())
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        reader.align_to_byte();
        let fill_styles = read_array(reader, ctx)?;
        let line_styles = read_array(reader, ctx)?;
        let fill_index_width = reader.read_bits(4)? as u8;
        let line_index_width = reader.read_bits(4)? as u8;
        set_index_widths(ctx, fill_index_width, line_index_width);
        Ok(Self {
            fill_styles,
            line_styles,
            fill_index_width,
            line_index_width,
        })
    }
}

/// Moves the pen and/or switches styles.
///
/// Style indices are 1-based; `Some(0)` explicitly clears a style. They are
/// written with the index widths active *before* this record, even when it
/// carries `new_styles`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleChange {
    /// Absolute move target relative to the shape origin.
    pub move_to: Option<(i32, i32)>,
    pub fill_style: Option<u32>,
    pub alt_fill_style: Option<u32>,
    pub line_style: Option<u32>,
    pub new_styles: Option<StyleTable>,
}

impl StyleChange {
    fn is_empty(&self) -> bool {
        self.move_to.is_none()
            && self.fill_style.is_none()
            && self.alt_fill_style.is_none()
            && self.line_style.is_none()
            && self.new_styles.is_none()
    }
}

fn layout_index(out: &mut Layout, field: &'static str, index: u32, width: u8) -> Result<()> {
    if bit_width::for_unsigned(u64::from(index)) > width {
        return Err(Error::field_overflow(field, i64::from(index), u32::from(width)));
    }
    out.unsigned(u64::from(index), width);
    Ok(())
}

impl Record for StyleChange {
    const NAME: &'static str = "StyleChange";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        if self.is_empty() {
            // Sechs Null-Bits waeren der Stream-Terminator
            return Err(Error::InvalidRecord {
                record: Self::NAME,
                reason: "no fields set",
            });
        }
        out.flag(false);
        out.flag(self.new_styles.is_some());
        out.flag(self.line_style.is_some());
        out.flag(self.alt_fill_style.is_some());
        out.flag(self.fill_style.is_some());
        out.flag(self.move_to.is_some());

        if let Some((x, y)) = self.move_to {
            let values = [i64::from(x), i64::from(y)];
            layout_group(out, group_width("StyleChange.move_to", &values, 1)?, &values);
        }
        let fill_width = ctx.width(ParamKey::FillIndexWidth);
        let line_width = ctx.width(ParamKey::LineIndexWidth);
        if let Some(i) = self.fill_style {
            layout_index(out, "StyleChange.fill_style", i, fill_width)?;
        }
        if let Some(i) = self.alt_fill_style {
            layout_index(out, "StyleChange.alt_fill_style", i, fill_width)?;
        }
        if let Some(i) = self.line_style {
            layout_index(out, "StyleChange.line_style", i, line_width)?;
        }
        if let Some(table) = &self.new_styles {
            table.layout(ctx, out)?;
        }
        Ok(())
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        if reader.read_bit()? {
            return Err(Error::InvalidRecord {
                record: Self::NAME,
                reason: "type flag marks an edge record",
            });
        }
        let has_new_styles = reader.read_bit()?;
        let has_line = reader.read_bit()?;
        let has_alt_fill = reader.read_bit()?;
        let has_fill = reader.read_bit()?;
        let has_move = reader.read_bit()?;

        let move_to = if has_move {
            let width = reader.read_bits(WIDTH_PREFIX_BITS)? as u8;
            let x = reader.read_signed(width)? as i32;
            let y = reader.read_signed(width)? as i32;
            Some((x, y))
        } else {
            None
        };
        let fill_width = ctx.width(ParamKey::FillIndexWidth);
        let line_width = ctx.width(ParamKey::LineIndexWidth);
        let mut index = |present: bool, width: u8| -> Result<Option<u32>> {
            if present {
                Ok(Some(reader.read_bits(width)? as u32))
            } else {
                Ok(None)
            }
        };
        let fill_style = index(has_fill, fill_width)?;
        let alt_fill_style = index(has_alt_fill, fill_width)?;
        let line_style = index(has_line, line_width)?;
        let new_styles = if has_new_styles {
            Some(StyleTable::read(reader, ctx)?)
        } else {
            None
        };

        let record = Self {
            move_to,
            fill_style,
            alt_fill_style,
            line_style,
            new_styles,
        };
        if record.is_empty() {
            return Err(Error::InvalidRecord {
                record: Self::NAME,
                reason: "end-of-shape marker",
            });
        }
        Ok(record)
    }
}

/// Shared width for a group of edge deltas (`2..=17` bits).
fn edge_width(field: &'static str, values: &[i64]) -> Result<u8> {
    let width = bit_width::for_signed_group(values, MIN_EDGE_WIDTH);
    if width > MAX_EDGE_WIDTH {
        let worst = values.iter().copied().max_by_key(|v| bit_width::for_signed(*v)).unwrap_or(0);
        return Err(Error::field_overflow(field, worst, u32::from(MAX_EDGE_WIDTH)));
    }
    Ok(width)
}

fn read_edge_width(reader: &mut BitReader<'_>) -> Result<u8> {
    Ok(reader.read_bits(EDGE_WIDTH_BITS)? as u8 + MIN_EDGE_WIDTH)
}

/// Straight line from the pen position by `(dx, dy)` twips.
///
/// Horizontal (`dy == 0`) and vertical (`dx == 0`) lines store a single
/// delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StraightEdge {
    pub dx: i32,
    pub dy: i32,
}

impl Record for StraightEdge {
    const NAME: &'static str = "StraightEdge";

    fn layout(&self, _ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        out.flag(true);
        out.flag(true);
        if self.dy == 0 || self.dx == 0 {
            let vertical = self.dy != 0;
            let delta = i64::from(if vertical { self.dy } else { self.dx });
            let width = edge_width("StraightEdge.delta", &[delta])?;
            out.unsigned(u64::from(width - MIN_EDGE_WIDTH), EDGE_WIDTH_BITS);
            out.flag(false);
            out.flag(vertical);
            out.signed(delta, width);
        } else {
            let values = [i64::from(self.dx), i64::from(self.dy)];
            let width = edge_width("StraightEdge.delta", &values)?;
            out.unsigned(u64::from(width - MIN_EDGE_WIDTH), EDGE_WIDTH_BITS);
            out.flag(true);
            out.signed(values[0], width);
            out.signed(values[1], width);
        }
        Ok(())
    }

    fn read(reader: &mut BitReader<'_>, _ctx: &mut CodecContext) -> Result<Self> {
        if reader.read_bits(2)? != 0b11 {
            return Err(Error::InvalidRecord {
                record: Self::NAME,
                reason: "type flags do not mark a straight edge",
            });
        }
        let width = read_edge_width(reader)?;
        if reader.read_bit()? {
            let dx = reader.read_signed(width)? as i32;
            let dy = reader.read_signed(width)? as i32;
            Ok(Self { dx, dy })
        } else if reader.read_bit()? {
            Ok(Self {
                dx: 0,
                dy: reader.read_signed(width)? as i32,
            })
        } else {
            Ok(Self {
                dx: reader.read_signed(width)? as i32,
                dy: 0,
            })
        }
    }
}

/// Quadratic Bezier: control point and anchor, each relative to the point
/// before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurvedEdge {
    pub control_dx: i32,
    pub control_dy: i32,
    pub anchor_dx: i32,
    pub anchor_dy: i32,
}

impl Record for CurvedEdge {
    const NAME: &'static str = "CurvedEdge";

    fn layout(&self, _ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        let values = [
            self.control_dx,
            self.control_dy,
            self.anchor_dx,
            self.anchor_dy,
        ]
        .map(i64::from);
        let width = edge_width("CurvedEdge.delta", &values)?;
        out.flag(true);
        out.flag(false);
        out.unsigned(u64::from(width - MIN_EDGE_WIDTH), EDGE_WIDTH_BITS);
        for v in values {
            out.signed(v, width);
        }
        Ok(())
    }

    fn read(reader: &mut BitReader<'_>, _ctx: &mut CodecContext) -> Result<Self> {
        if reader.read_bits(2)? != 0b10 {
            return Err(Error::InvalidRecord {
                record: Self::NAME,
                reason: "type flags do not mark a curved edge",
            });
        }
        let width = read_edge_width(reader)?;
        let control_dx = reader.read_signed(width)? as i32;
        let control_dy = reader.read_signed(width)? as i32;
        let anchor_dx = reader.read_signed(width)? as i32;
        let anchor_dy = reader.read_signed(width)? as i32;
        Ok(Self {
            control_dx,
            control_dy,
            anchor_dx,
            anchor_dy,
        })
    }
}

/// One record of a shape stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeRecord {
    StyleChange(StyleChange),
    StraightEdge(StraightEdge),
    CurvedEdge(CurvedEdge),
}

impl ShapeRecord {
    pub fn is_edge(&self) -> bool {
        !matches!(self, Self::StyleChange(_))
    }
}

impl From<StyleChange> for ShapeRecord {
    fn from(r: StyleChange) -> Self {
        Self::StyleChange(r)
    }
}

impl From<StraightEdge> for ShapeRecord {
    fn from(r: StraightEdge) -> Self {
        Self::StraightEdge(r)
    }
}

impl From<CurvedEdge> for ShapeRecord {
    fn from(r: CurvedEdge) -> Self {
        Self::CurvedEdge(r)
    }
}

impl Record for ShapeRecord {
    const NAME: &'static str = "ShapeRecord";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        match self {
            Self::StyleChange(r) => r.layout(ctx, out),
            Self::StraightEdge(r) => r.layout(ctx, out),
            Self::CurvedEdge(r) => r.layout(ctx, out),
        }
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        match reader.peek_bits(2)? {
            0b11 => Ok(Self::StraightEdge(StraightEdge::read(reader, ctx)?)),
            0b10 => Ok(Self::CurvedEdge(CurvedEdge::read(reader, ctx)?)),
            _ => Ok(Self::StyleChange(StyleChange::read(reader, ctx)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::BitWriter;
    use crate::color::Rgba;
    use crate::record::{from_bytes, to_bytes};

    fn encode<R: Record>(rec: &R, ctx: &mut CodecContext) -> (Vec<u8>, usize) {
        let mut w = BitWriter::new();
        rec.write(&mut w, ctx).unwrap();
        let bits = w.bit_position();
        (w.into_vec(), bits)
    }

    #[test]
    fn horizontal_edge_bits() {
        let mut ctx = CodecContext::new();
        let (bytes, bits) = encode(&StraightEdge { dx: 5, dy: 0 }, &mut ctx);
        // 1 1 0010 0 0 0101
        assert_eq!(bits, 12);
        assert_eq!(bytes, vec![0b1100_1000, 0b0101_0000]);
    }

    #[test]
    fn vertical_edge_bits() {
        let mut ctx = CodecContext::new();
        let (bytes, bits) = encode(&StraightEdge { dx: 0, dy: -3 }, &mut ctx);
        // 1 1 0001 0 1 101
        assert_eq!(bits, 11);
        assert_eq!(bytes, vec![0b1100_0101, 0b1010_0000]);
    }

    #[test]
    fn general_edge_round_trip() {
        let mut ctx = CodecContext::new();
        for edge in [
            StraightEdge { dx: 1, dy: -1 },
            StraightEdge { dx: 65535, dy: -65536 },
            StraightEdge { dx: 0, dy: 0 },
        ] {
            let bytes = to_bytes(&edge, &mut ctx).unwrap();
            assert_eq!(from_bytes::<StraightEdge>(&bytes, &mut ctx).unwrap(), edge);
        }
    }

    #[test]
    fn edge_delta_beyond_17_bits() {
        let mut ctx = CodecContext::new();
        let err = to_bytes(&StraightEdge { dx: 65536, dy: 1 }, &mut ctx).unwrap_err();
        assert_eq!(err, Error::field_overflow("StraightEdge.delta", 65536, 17));
        let err = to_bytes(
            &CurvedEdge {
                control_dx: 0,
                control_dy: -65537,
                anchor_dx: 0,
                anchor_dy: 0,
            },
            &mut ctx,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::FieldOverflow {
                field: "CurvedEdge.delta",
                value: -65537,
                ..
            }
        ));
    }

    #[test]
    fn curved_edge_shares_one_width() {
        let mut ctx = CodecContext::new();
        let curve = CurvedEdge {
            control_dx: 3,
            control_dy: 4,
            anchor_dx: 6,
            anchor_dy: 8,
        };
        let (bytes, bits) = encode(&curve, &mut ctx);
        // 8 braucht 5 Bits: 2 + 4 + 4*5
        assert_eq!(bits, 26);
        assert_eq!(bytes[0] >> 2, 0b10_0011);
        assert_eq!(from_bytes::<CurvedEdge>(&bytes, &mut ctx).unwrap(), curve);
    }

    #[test]
    fn style_change_uses_context_widths() {
        let mut ctx = CodecContext::new();
        set_index_widths(&mut ctx, 3, 2);
        let change = StyleChange {
            fill_style: Some(5),
            line_style: Some(2),
            ..StyleChange::default()
        };
        let (bytes, bits) = encode(&change, &mut ctx);
        // 0 0 1 0 1 0 | 101 | 10
        assert_eq!(bits, 11);
        assert_eq!(bytes, vec![0b0010_1010, 0b1100_0000]);
        assert_eq!(from_bytes::<StyleChange>(&bytes, &mut ctx).unwrap(), change);
    }

    #[test]
    fn style_index_must_fit_width() {
        let mut ctx = CodecContext::new();
        set_index_widths(&mut ctx, 1, 0);
        let change = StyleChange {
            fill_style: Some(2),
            ..StyleChange::default()
        };
        let err = to_bytes(&change, &mut ctx).unwrap_err();
        assert_eq!(err, Error::field_overflow("StyleChange.fill_style", 2, 1));
    }

    #[test]
    fn empty_style_change_is_rejected() {
        let mut ctx = CodecContext::new();
        let err = to_bytes(&StyleChange::default(), &mut ctx).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { record: "StyleChange", .. }));
        let err = from_bytes::<StyleChange>(&[0x00], &mut ctx).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { record: "StyleChange", .. }));
    }

    #[test]
    fn new_styles_switch_widths_after_indices() {
        let mut ctx = CodecContext::new();
        set_index_widths(&mut ctx, 1, 1);
        let table = StyleTable {
            fill_styles: vec![FillStyle::Solid(Rgba::rgb(1, 2, 3)); 3],
            line_styles: vec![],
            fill_index_width: 2,
            line_index_width: 0,
        };
        let change = StyleChange {
            fill_style: Some(1),
            new_styles: Some(table),
            ..StyleChange::default()
        };
        let bytes = to_bytes(&change, &mut ctx).unwrap();
        assert_eq!(ctx.width(ParamKey::FillIndexWidth), 2);
        assert_eq!(ctx.width(ParamKey::LineIndexWidth), 0);

        let mut dec = CodecContext::new();
        set_index_widths(&mut dec, 1, 1);
        assert_eq!(from_bytes::<StyleChange>(&bytes, &mut dec).unwrap(), change);
        assert_eq!(dec, ctx);
    }

    #[test]
    fn table_width_limit() {
        let mut ctx = CodecContext::new();
        let table = StyleTable {
            fill_index_width: 16,
            ..StyleTable::default()
        };
        let err = to_bytes(&table, &mut ctx).unwrap_err();
        assert_eq!(err, Error::field_overflow("StyleTable.fill_index_width", 16, 15));
    }

    #[test]
    fn narrow_table_width_round_trips() {
        let mut ctx = CodecContext::new();
        let table = StyleTable {
            fill_styles: vec![FillStyle::Solid(Rgba::rgb(0, 0, 0)); 5],
            line_styles: vec![],
            fill_index_width: 1,
            line_index_width: 0,
        };
        let bytes = to_bytes(&table, &mut ctx).unwrap();
        assert_eq!(from_bytes::<StyleTable>(&bytes, &mut ctx).unwrap(), table);
    }

    #[test]
    fn postscript_hint_widens_zero_widths_on_write() {
        let mut ctx = CodecContext::new();
        ctx.set(ParamKey::IsPostscriptHint, true);
        let table = StyleTable {
            fill_styles: vec![FillStyle::Solid(Rgba::rgb(0, 0, 0)); 3],
            line_styles: vec![],
            fill_index_width: 2,
            line_index_width: 0,
        };
        let bytes = to_bytes(&table, &mut ctx).unwrap();
        // Zaehler 3, Solid x3, Zaehler 0, Breiten 2/1
        assert_eq!(bytes[bytes.len() - 1], 0x21);
        assert_eq!(ctx.width(ParamKey::LineIndexWidth), 1);

        let back = from_bytes::<StyleTable>(&bytes, &mut CodecContext::new()).unwrap();
        assert_eq!((back.fill_index_width, back.line_index_width), (2, 1));
    }

    #[test]
    fn fitted_widths_follow_postscript_hint() {
        let mut ctx = CodecContext::new();
        let line = LineStyle {
            width: 1,
            color: Rgba::rgb(0, 0, 0),
        };
        let plain = StyleTable::fitted(vec![], vec![line], &ctx);
        assert_eq!((plain.fill_index_width, plain.line_index_width), (0, 1));
        ctx.set(ParamKey::IsPostscriptHint, true);
        let ps = StyleTable::fitted(vec![], vec![], &ctx);
        assert_eq!((ps.fill_index_width, ps.line_index_width), (1, 1));
    }

    #[test]
    fn shape_record_dispatch() {
        let mut ctx = CodecContext::new();
        let records: Vec<ShapeRecord> = vec![
            StraightEdge { dx: 2, dy: 2 }.into(),
            CurvedEdge {
                control_dx: -1,
                control_dy: 0,
                anchor_dx: 1,
                anchor_dy: 0,
            }
            .into(),
            StyleChange {
                move_to: Some((-7, 0)),
                ..StyleChange::default()
            }
            .into(),
        ];
        for rec in &records {
            let bytes = to_bytes(rec, &mut ctx).unwrap();
            assert_eq!(&from_bytes::<ShapeRecord>(&bytes, &mut ctx).unwrap(), rec);
        }
        assert!(records[0].is_edge() && records[1].is_edge() && !records[2].is_edge());
    }
}
