//! RGB / RGBA colour record.

use crate::bitstream::BitReader;
use crate::context::{CodecContext, ParamKey};
use crate::record::{Layout, Record};
use crate::Result;

/// A colour. Stored as RGB, or RGBA when [`ParamKey::HasAlphaChannel`] is set.
///
/// Without the alpha channel the alpha byte is not written and reads back as
/// 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Opaque colour.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Record for Rgba {
    const NAME: &'static str = "Rgba";

    fn layout(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        out.u8(self.r);
        out.u8(self.g);
        out.u8(self.b);
        if ctx.flag(ParamKey::HasAlphaChannel) {
            out.u8(self.a);
        }
        Ok(())
    }

    fn read(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Self> {
        let r = reader.read_u8()?;
        let g = reader.read_u8()?;
        let b = reader.read_u8()?;
        let a = if ctx.flag(ParamKey::HasAlphaChannel) { reader.read_u8()? } else { 255 };
        Ok(Self { r, g, b, a })
    }
}
