//! Bounds rectangle and coordinate transform records.
//!
//! Both pack their values behind 5-bit width prefixes and end on a byte
//! boundary.

use crate::bit_width;
use crate::bitstream::BitReader;
use crate::context::CodecContext;
use crate::record::{Layout, Record};
use crate::{Error, Result};

/// Width of the prefix that announces a group's field width.
pub(crate) const WIDTH_PREFIX_BITS: u8 = 5;

/// Largest width a 5-bit prefix can announce.
const MAX_GROUP_WIDTH: u8 = (1 << WIDTH_PREFIX_BITS) - 1;

/// Shared width for `values`, checked against the 5-bit prefix limit.
pub(crate) fn group_width(field: &'static str, values: &[i64], min: u8) -> Result<u8> {
    let width = bit_width::for_signed_group(values, min);
    if width > MAX_GROUP_WIDTH {
        let worst = values.iter().copied().max_by_key(|v| bit_width::for_signed(*v)).unwrap_or(0);
        return Err(Error::field_overflow(field, worst, u32::from(MAX_GROUP_WIDTH)));
    }
    Ok(width)
}

pub(crate) fn layout_group(out: &mut Layout, width: u8, values: &[i64]) {
    out.unsigned(u64::from(width), WIDTH_PREFIX_BITS);
    for &v in values {
        out.signed(v, width);
    }
}

/// Bounds rectangle in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl Rect {
    pub fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

impl Record for Rect {
    const NAME: &'static str = "Rect";

    fn layout(&self, _ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        let values = [self.x_min, self.x_max, self.y_min, self.y_max].map(i64::from);
        let width = group_width("Rect.bounds", &values, 1)?;
        layout_group(out, width, &values);
        out.align();
        Ok(())
    }

    fn read(reader: &mut BitReader<'_>, _ctx: &mut CodecContext) -> Result<Self> {
        let width = reader.read_bits(WIDTH_PREFIX_BITS)? as u8;
        let x_min = reader.read_signed(width)? as i32;
        let x_max = reader.read_signed(width)? as i32;
        let y_min = reader.read_signed(width)? as i32;
        let y_max = reader.read_signed(width)? as i32;
        reader.align_to_byte();
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }
}

/// 2D affine transform.
///
/// Scale and rotate/skew terms are 16.16 fixed point, stored raw; translation
/// is in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Matrix {
    /// `(scale_x, scale_y)`; `None` means identity scale.
    pub scale: Option<(i32, i32)>,
    /// `(rotate_skew0, rotate_skew1)`; `None` means no rotation or skew.
    pub rotate_skew: Option<(i32, i32)>,
    pub translate_x: i32,
    pub translate_y: i32,
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        scale: None,
        rotate_skew: None,
        translate_x: 0,
        translate_y: 0,
    };

    pub fn translate(x: i32, y: i32) -> Self {
        Self {
            translate_x: x,
            translate_y: y,
            ..Self::IDENTITY
        }
    }
}

impl Record for Matrix {
    const NAME: &'static str = "Matrix";

    fn layout(&self, _ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        out.flag(self.scale.is_some());
        if let Some((sx, sy)) = self.scale {
            let values = [i64::from(sx), i64::from(sy)];
            layout_group(out, group_width("Matrix.scale", &values, 1)?, &values);
        }
        out.flag(self.rotate_skew.is_some());
        if let Some((r0, r1)) = self.rotate_skew {
            let values = [i64::from(r0), i64::from(r1)];
            layout_group(out, group_width("Matrix.rotate_skew", &values, 1)?, &values);
        }
        let values = [i64::from(self.translate_x), i64::from(self.translate_y)];
        // Reine Null-Translation kommt ohne Wertbits aus
        let width = if self.translate_x == 0 && self.translate_y == 0 {
            0
        } else {
            group_width("Matrix.translate", &values, 1)?
        };
        layout_group(out, width, &values);
        out.align();
        Ok(())
    }

    fn read(reader: &mut BitReader<'_>, _ctx: &mut CodecContext) -> Result<Self> {
        let read_pair = |reader: &mut BitReader<'_>| -> Result<(i32, i32)> {
            let width = reader.read_bits(WIDTH_PREFIX_BITS)? as u8;
            let a = reader.read_signed(width)? as i32;
            let b = reader.read_signed(width)? as i32;
            Ok((a, b))
        };
        let scale = if reader.read_bit()? {
            Some(read_pair(reader)?)
        } else {
            None
        };
        let rotate_skew = if reader.read_bit()? {
            Some(read_pair(reader)?)
        } else {
            None
        };
        let (translate_x, translate_y) = read_pair(reader)?;
        reader.align_to_byte();
        Ok(Self {
            scale,
            rotate_skew,
            translate_x,
            translate_y,
        })
    }
}
