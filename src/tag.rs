//! Tag catalogue and tag list decode/encode.
//!
//! Only the shape definition tags and the two marker tags are decoded; every
//! other code is kept as [`Tag::Unknown`] with its raw body so a decoded list
//! re-encodes to the same bytes.

use log::{debug, warn};

use crate::bitstream::{BitReader, BitWriter};
use crate::config::{DecoderConfig, EncoderConfig};
use crate::context::{CodecContext, ParamKey};
use crate::envelope::{read_frame, read_raw_tag, write_frame, TagBody, TagHeader};
use crate::geometry::Rect;
use crate::record::{Layout, Record};
use crate::shape_stream::ShapeWithStyle;
use crate::{Error, Result};

/// Known tag codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TagCode {
    End = 0,
    DefineShape = 2,
    DefineShape2 = 22,
    PathsArePostscript = 25,
    DefineShape3 = 32,
}

impl TagCode {
    const ALL: [TagCode; 5] = [
        Self::End,
        Self::DefineShape,
        Self::DefineShape2,
        Self::PathsArePostscript,
        Self::DefineShape3,
    ];

    pub fn from_u16(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|c| *c as u16 == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::End => "End",
            Self::DefineShape => "DefineShape",
            Self::DefineShape2 => "DefineShape2",
            Self::PathsArePostscript => "PathsArePostscript",
            Self::DefineShape3 => "DefineShape3",
        }
    }
}

/// Diagnostic name for a tag code; `"Unknown"` for codes not in [`TagCode`].
pub fn tag_name(code: u16) -> &'static str {
    TagCode::from_u16(code).map_or("Unknown", TagCode::name)
}

/// Shape tag revision. Later revisions widen what the style arrays may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeVersion {
    /// Plain counts, RGB colours.
    One,
    /// Extended style counts.
    Two,
    /// Extended style counts, RGBA colours.
    Three,
}

impl ShapeVersion {
    pub fn code(self) -> TagCode {
        match self {
            Self::One => TagCode::DefineShape,
            Self::Two => TagCode::DefineShape2,
            Self::Three => TagCode::DefineShape3,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match TagCode::from_u16(code)? {
            TagCode::DefineShape => Some(Self::One),
            TagCode::DefineShape2 => Some(Self::Two),
            TagCode::DefineShape3 => Some(Self::Three),
            _ => None,
        }
    }

    fn apply(self, ctx: &mut CodecContext) {
        ctx.set(ParamKey::UsesExtendedCounts, self >= Self::Two);
        ctx.set(ParamKey::HasAlphaChannel, self == Self::Three);
    }
}

const SHAPE_TAG_KEYS: [ParamKey; 2] = [ParamKey::UsesExtendedCounts, ParamKey::HasAlphaChannel];

/// A shape definition (DefineShape, DefineShape2, DefineShape3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineShape {
    pub version: ShapeVersion,
    /// Character id.
    pub id: u16,
    pub bounds: Rect,
    pub shape: ShapeWithStyle,
}

impl TagBody for DefineShape {
    const CODES: &'static [u16] = &[
        TagCode::DefineShape as u16,
        TagCode::DefineShape2 as u16,
        TagCode::DefineShape3 as u16,
    ];

    fn tag_code(&self) -> u16 {
        self.version.code() as u16
    }

    fn read_body(
        header: &TagHeader,
        reader: &mut BitReader<'_>,
        ctx: &mut CodecContext,
    ) -> Result<Self> {
        let version = ShapeVersion::from_code(header.code).ok_or(Error::TagCodeMismatch {
            expected: Self::CODES[0],
            found: header.code,
            byte_offset: reader.byte_position().saturating_sub(header.encoded_len()),
        })?;
        let mut scope = ctx.scope(&SHAPE_TAG_KEYS);
        version.apply(&mut scope);
        let id = reader.read_u16()?;
        let bounds = Rect::read(reader, &mut scope)?;
        let shape = ShapeWithStyle::read(reader, &mut scope)?;
        Ok(Self {
            version,
            id,
            bounds,
            shape,
        })
    }

    fn layout_body(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        let mut scope = ctx.scope(&SHAPE_TAG_KEYS);
        self.version.apply(&mut scope);
        out.u16(self.id);
        self.bounds.layout(&mut scope, out)?;
        self.shape.layout(&mut scope, out)
    }
}

/// One tag of a tag list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    DefineShape(DefineShape),
    /// Marker: shapes that follow use postscript-style paths.
    PathsArePostscript,
    End,
    /// Any other tag, body kept verbatim.
    Unknown {
        code: u16,
        body: Vec<u8>,
        long_form: bool,
    },
}

impl Tag {
    pub fn code(&self) -> u16 {
        match self {
            Self::DefineShape(shape) => shape.tag_code(),
            Self::PathsArePostscript => TagCode::PathsArePostscript as u16,
            Self::End => TagCode::End as u16,
            Self::Unknown { code, .. } => *code,
        }
    }

    pub fn name(&self) -> &'static str {
        tag_name(self.code())
    }

    fn long_form(&self) -> bool {
        matches!(self, Self::Unknown { long_form: true, .. })
    }

    fn read_body(
        header: &TagHeader,
        reader: &mut BitReader<'_>,
        ctx: &mut CodecContext,
    ) -> Result<Self> {
        match TagCode::from_u16(header.code) {
            Some(TagCode::End) => Ok(Self::End),
            Some(TagCode::PathsArePostscript) => Ok(Self::PathsArePostscript),
            Some(TagCode::DefineShape | TagCode::DefineShape2 | TagCode::DefineShape3) => {
                Ok(Self::DefineShape(DefineShape::read_body(header, reader, ctx)?))
            }
            None => Ok(Self::Unknown {
                code: header.code,
                body: reader.read_bytes(header.length as usize)?,
                long_form: header.long_form,
            }),
        }
    }

    fn layout_body(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()> {
        match self {
            Self::DefineShape(shape) => shape.layout_body(ctx, out),
            Self::PathsArePostscript | Self::End => Ok(()),
            Self::Unknown { body, .. } => {
                out.bytes(body);
                Ok(())
            }
        }
    }
}

impl From<DefineShape> for Tag {
    fn from(shape: DefineShape) -> Self {
        Self::DefineShape(shape)
    }
}

/// Rules the tag list applies between tags.
fn after_tag(tag: &Tag, ctx: &mut CodecContext) {
    if matches!(tag, Tag::PathsArePostscript) {
        ctx.set(ParamKey::IsPostscriptHint, true);
    }
}

/// Decodes a tag list up to and including the End tag (or the end of `data`).
///
/// Meeting a [`Tag::PathsArePostscript`] sets [`ParamKey::IsPostscriptHint`]
/// for the rest of the pass.
pub fn decode_tags(
    data: &[u8],
    ctx: &mut CodecContext,
    config: &DecoderConfig,
) -> Result<Vec<Tag>> {
    let mut reader = BitReader::new(data);
    let mut tags = Vec::new();
    while reader.remaining_bits() > 0 {
        let checkpoint = reader.save_checkpoint();
        let byte_offset = reader.byte_position();
        let tag = match read_frame(&mut reader, ctx, Tag::read_body) {
            Ok((_, tag)) => tag,
            Err(err) if config.skip_corrupt_tags => {
                reader.restore_checkpoint(checkpoint);
                let raw = read_raw_tag(&mut reader)?;
                warn!(
                    "[swfrec] skipping corrupt {} at byte {byte_offset}: {err}",
                    tag_name(raw.code)
                );
                Tag::Unknown {
                    code: raw.code,
                    body: raw.body,
                    long_form: raw.long_form,
                }
            }
            Err(err) => return Err(err),
        };
        after_tag(&tag, ctx);
        let end = tag == Tag::End;
        tags.push(tag);
        if end {
            break;
        }
    }
    if reader.remaining_bits() > 0 {
        debug!("[swfrec] {} bytes after End tag ignored", reader.remaining_bits() / 8);
    }
    Ok(tags)
}

/// Encodes a tag list.
pub fn encode_tags(
    tags: &[Tag],
    ctx: &mut CodecContext,
    config: &EncoderConfig,
) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new();
    for tag in tags {
        let long_form = config.force_long_headers || tag.long_form();
        write_frame(&mut writer, ctx, tag.code(), long_form, |ctx, out| tag.layout_body(ctx, out))?;
        after_tag(tag, ctx);
    }
    Ok(writer.into_vec())
}
