//! Fill and line styles.
//!
//! A fill style starts with a type byte that selects its variant. Decoding
//! goes through [`FILL_STYLE_DECODERS`], a fixed table keyed by that byte;
//! anything not in the table is rejected with
//! [`Error::UnsupportedRecordType`].

use crate::bitstream::BitReader;
use crate::color::Rgba;
use crate::context::CodecContext;
use crate::geometry::Matrix;
use crate::record::{Layout, Record};
use crate::{Error, Result};

/// Maximum number of stops a gradient can carry (4-bit count).
pub const MAX_GRADIENT_STOPS: usize = 15;

/// How a gradient continues past its end stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpreadMode {
    #[default]
    Pad = 0,
    Reflect = 1,
    Repeat = 2,
}

/// Colour space gradient stops are interpolated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Normal = 0,
    Linear = 1,
}

/// One colour stop of a gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientStop {
    /// Position along the gradient, 0..=255.
    pub ratio: u8,
    pub color: Rgba,
}

impl Record for GradientStop {
    const NAME: &'static str = "GradientStop";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        out.u8(self.ratio);
        self.color.layout(ctx, out)
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        let ratio = reader.read_u8()?;
        let color = Rgba::read(reader, ctx)?;
        Ok(Self { ratio, color })
    }
}

/// Gradient definition shared by linear, radial and focal fills.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Gradient {
    pub spread: SpreadMode,
    pub interpolation: InterpolationMode,
    pub stops: Vec<GradientStop>,
}

impl Record for Gradient {
    const NAME: &'static str = "Gradient";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        if self.stops.len() > MAX_GRADIENT_STOPS {
            return Err(Error::field_overflow(
                "Gradient.stops",
                self.stops.len() as i64,
                MAX_GRADIENT_STOPS as u32,
            ));
        }
        out.unsigned(self.spread as u64, 2);
        out.unsigned(self.interpolation as u64, 2);
        out.unsigned(self.stops.len() as u64, 4);
        for stop in &self.stops {
            stop.layout(ctx, out)?;
        }
        Ok(())
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        let byte_offset = reader.byte_position();
        let spread = match reader.read_bits(2)? {
            0 => SpreadMode::Pad,
            1 => SpreadMode::Reflect,
            2 => SpreadMode::Repeat,
            other => {
                return Err(Error::UnsupportedRecordType {
                    kind: "SpreadMode",
                    type_byte: other as u8,
                    byte_offset,
                })
            }
        };
        let interpolation = match reader.read_bits(2)? {
            0 => InterpolationMode::Normal,
            1 => InterpolationMode::Linear,
            other => {
                return Err(Error::UnsupportedRecordType {
                    kind: "InterpolationMode",
                    type_byte: other as u8,
                    byte_offset,
                })
            }
        };
        let count = reader.read_bits(4)? as usize;
        let mut stops = Vec::with_capacity(count);
        for _ in 0..count {
            stops.push(GradientStop::read(reader, ctx)?);
        }
        Ok(Self {
            spread,
            interpolation,
            stops,
        })
    }
}

/// Bitmap fill flavours; the discriminant is the fill type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapFill {
    Repeating = 0x40,
    Clipped = 0x41,
    NonSmoothedRepeating = 0x42,
    NonSmoothedClipped = 0x43,
}

/// A fill style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillStyle {
    Solid(Rgba),
    LinearGradient { matrix: Matrix, gradient: Gradient },
    RadialGradient { matrix: Matrix, gradient: Gradient },
    /// Radial gradient with a focal point (signed 8.8 fixed point, -1.0..=1.0).
    FocalGradient {
        matrix: Matrix,
        gradient: Gradient,
        focal_point: i16,
    },
    Bitmap {
        kind: BitmapFill,
        bitmap_id: u16,
        matrix: Matrix,
    },
}

pub const FILL_SOLID: u8 = 0x00;
pub const FILL_LINEAR_GRADIENT: u8 = 0x10;
pub const FILL_RADIAL_GRADIENT: u8 = 0x12;
pub const FILL_FOCAL_GRADIENT: u8 = 0x13;

type FillDecoder = fn(&mut BitReader<'_>, &mut CodecContext) -> Result<FillStyle>;

/// Decode table: fill type byte → variant decoder.
pub const FILL_STYLE_DECODERS: &[(u8, FillDecoder)] = &[
    (FILL_SOLID, read_solid),
    (FILL_LINEAR_GRADIENT, read_linear),
    (FILL_RADIAL_GRADIENT, read_radial),
    (FILL_FOCAL_GRADIENT, read_focal),
    (BitmapFill::Repeating as u8, read_repeating_bitmap),
    (BitmapFill::Clipped as u8, read_clipped_bitmap),
    (BitmapFill::NonSmoothedRepeating as u8, read_non_smoothed_repeating_bitmap),
    (BitmapFill::NonSmoothedClipped as u8, read_non_smoothed_clipped_bitmap),
];

fn read_solid(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<FillStyle> {
    Ok(FillStyle::Solid(Rgba::read(reader, ctx)?))
}

fn read_linear(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<FillStyle> {
    let matrix = Matrix::read(reader, ctx)?;
    let gradient = Gradient::read(reader, ctx)?;
    Ok(FillStyle::LinearGradient { matrix, gradient })
}

fn read_radial(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<FillStyle> {
    let matrix = Matrix::read(reader, ctx)?;
    let gradient = Gradient::read(reader, ctx)?;
    Ok(FillStyle::RadialGradient { matrix, gradient })
}

fn read_focal(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<FillStyle> {
    let matrix = Matrix::read(reader, ctx)?;
    let gradient = Gradient::read(reader, ctx)?;
    let focal_point = reader.read_u16()? as i16;
    Ok(FillStyle::FocalGradient {
        matrix,
        gradient,
        focal_point,
    })
}

fn read_repeating_bitmap(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<FillStyle> {
    read_bitmap(BitmapFill::Repeating, reader, ctx)
}

fn read_clipped_bitmap(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<FillStyle> {
    read_bitmap(BitmapFill::Clipped, reader, ctx)
}

fn read_non_smoothed_repeating_bitmap(
    reader: &mut BitReader<'_>,
    ctx: &mut CodecContext,
) -> Result<FillStyle> {
    read_bitmap(BitmapFill::NonSmoothedRepeating, reader, ctx)
}

fn read_non_smoothed_clipped_bitmap(
    reader: &mut BitReader<'_>,
    ctx: &mut CodecContext,
) -> Result<FillStyle> {
    read_bitmap(BitmapFill::NonSmoothedClipped, reader, ctx)
}

fn read_bitmap(
    kind: BitmapFill,
    reader: &mut BitReader<'_>,
    ctx: &mut CodecContext,
) -> Result<FillStyle> {
    let bitmap_id = reader.read_u16()?;
    let matrix = Matrix::read(reader, ctx)?;
    Ok(FillStyle::Bitmap {
        kind,
        bitmap_id,
        matrix,
    })
}

impl FillStyle {
    /// The type byte this style is written with.
    pub fn type_byte(&self) -> u8 {
        match self {
            Self::Solid(_) => FILL_SOLID,
            Self::LinearGradient { .. } => FILL_LINEAR_GRADIENT,
            Self::RadialGradient { .. } => FILL_RADIAL_GRADIENT,
            Self::FocalGradient { .. } => FILL_FOCAL_GRADIENT,
            Self::Bitmap { kind, .. } => *kind as u8,
        }
    }
}

impl Record for FillStyle {
    const NAME: &'static str = "FillStyle";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        out.u8(self.type_byte());
        match self {
            Self::Solid(color) => color.layout(ctx, out),
            Self::LinearGradient { matrix, gradient }
            | Self::RadialGradient { matrix, gradient } => {
                matrix.layout(ctx, out)?;
                gradient.layout(ctx, out)
            }
            Self::FocalGradient {
                matrix,
                gradient,
                focal_point,
            } => {
                matrix.layout(ctx, out)?;
                gradient.layout(ctx, out)?;
                out.u16(*focal_point as u16);
                Ok(())
            }
            Self::Bitmap { bitmap_id, matrix, .. } => {
                out.u16(*bitmap_id);
                matrix.layout(ctx, out)
            }
        }
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        let byte_offset = reader.byte_position();
        let type_byte = reader.read_u8()?;
        let decode = FILL_STYLE_DECODERS
            .iter()
            .find(|(byte, _)| *byte == type_byte)
            .map(|(_, decode)| *decode)
            .ok_or(Error::UnsupportedRecordType {
                kind: Self::NAME,
                type_byte,
                byte_offset,
            })?;
        decode(reader, ctx)
    }
}

/// A line style: stroke width in twips plus colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyle {
    pub width: u16,
    pub color: Rgba,
}

impl Record for LineStyle {
    const NAME: &'static str = "LineStyle";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        out.u16(self.width);
        self.color.layout(ctx, out)
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        let width = reader.read_u16()?;
        let color = Rgba::read(reader, ctx)?;
        Ok(Self { width, color })
    }
}
