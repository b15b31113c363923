//! Tag framing: header, body, end-pointer check.
//!
//! Ein Tag besteht aus:
//! - Header (u16 LE): `code << 6 | length`, Code 10 Bits, Laenge 6 Bits
//! - Lange Form: Laengenfeld `0x3F`, danach die echte Laenge als u32 LE
//! - Body: `length` Bytes, beginnt und endet auf einer Bytegrenze
//!
//! Bodies shorter than 63 bytes use the short form unless the caller asks for
//! the long one. Decoding checks that the body consumed exactly the declared
//! number of bytes and reports [`Error::FrameLengthMismatch`] otherwise.
//!
//! # Beispiel
//!
//! ```
//! use swfrec::bitstream::{BitReader, BitWriter};
//! use swfrec::envelope::TagHeader;
//!
//! let mut w = BitWriter::new();
//! TagHeader::new(2, 100).write(&mut w).unwrap();
//! let bytes = w.into_vec();
//! assert_eq!(bytes, [0xBF, 0x00, 100, 0, 0, 0]);
//!
//! let header = TagHeader::read(&mut BitReader::new(&bytes)).unwrap();
//! assert!(header.long_form);
//! ```

use log::{debug, trace};

use crate::bitstream::{BitReader, BitWriter};
use crate::config::EncoderConfig;
use crate::context::CodecContext;
use crate::record::{Layout, Plan};
use crate::tag::tag_name;
use crate::{Error, Result};

/// Length field value announcing a following u32 length.
pub const LONG_LENGTH_MARKER: u16 = 0x3F;

/// Largest tag code (10 bits).
pub const MAX_TAG_CODE: u16 = 0x3FF;

/// Header bytes in short form.
const SHORT_HEADER_LEN: usize = 2;

/// Header bytes in long form.
const LONG_HEADER_LEN: usize = 6;

/// Tag header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub code: u16,
    /// Body length in bytes.
    pub length: u32,
    /// Length stored as `0x3F` + u32.
    pub long_form: bool,
}

impl TagHeader {
    /// Header in the shortest form that can hold `length`.
    pub fn new(code: u16, length: u32) -> Self {
        Self {
            code,
            length,
            long_form: length >= u32::from(LONG_LENGTH_MARKER),
        }
    }

    /// Bytes the header occupies.
    pub fn encoded_len(&self) -> usize {
        if self.long_form {
            LONG_HEADER_LEN
        } else {
            SHORT_HEADER_LEN
        }
    }

    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let raw = reader.read_u16()?;
        let code = raw >> 6;
        let short = raw & LONG_LENGTH_MARKER;
        if short == LONG_LENGTH_MARKER {
            let length = reader.read_u32()?;
            Ok(Self {
                code,
                length,
                long_form: true,
            })
        } else {
            Ok(Self {
                code,
                length: u32::from(short),
                long_form: false,
            })
        }
    }

    /// Writes the header at the current (byte-aligned) position.
    ///
    /// # Errors
    ///
    /// [`Error::FieldOverflow`] if the code exceeds 10 bits, or if a short
    /// form header is asked to carry 63 bytes or more.
    pub fn write(&self, writer: &mut BitWriter) -> Result<()> {
        if self.code > MAX_TAG_CODE {
            return Err(Error::field_overflow(
                "TagHeader.code",
                i64::from(self.code),
                u32::from(MAX_TAG_CODE),
            ));
        }
        if self.long_form {
            writer.write_u16(self.code << 6 | LONG_LENGTH_MARKER);
            writer.write_u32(self.length);
        } else {
            if self.length >= u32::from(LONG_LENGTH_MARKER) {
                return Err(Error::field_overflow(
                    "TagHeader.length",
                    i64::from(self.length),
                    u32::from(LONG_LENGTH_MARKER - 1),
                ));
            }
            writer.write_u16(self.code << 6 | self.length as u16);
        }
        Ok(())
    }
}

/// A tag body type with a fixed set of tag codes.
pub trait TagBody: Sized {
    /// Codes whose bodies this type decodes; the first one is its canonical code.
    const CODES: &'static [u16];

    /// Code to write into the header for `self`.
    fn tag_code(&self) -> u16;

    /// Decodes the body announced by `header`.
    fn read_body(
        header: &TagHeader,
        reader: &mut BitReader<'_>,
        ctx: &mut CodecContext,
    ) -> Result<Self>;

    /// Lays out the body (without header).
    fn layout_body(&self, ctx: &mut CodecContext, out: &mut Layout) -> Result<()>;
}

/// Reads one framed tag, decoding its body with `body`.
///
/// The body is not bounded by the declared length: a body that reads past its
/// end (or stops short) is reported as [`Error::FrameLengthMismatch`], with
/// `discrepancy = consumed - declared`.
pub fn read_frame<T, F>(
    reader: &mut BitReader<'_>,
    ctx: &mut CodecContext,
    body: F,
) -> Result<(TagHeader, T)>
where
    F: FnOnce(&TagHeader, &mut BitReader<'_>, &mut CodecContext) -> Result<T>,
{
    reader.align_to_byte();
    let byte_offset = reader.byte_position();
    let header = TagHeader::read(reader)?;
    let name = tag_name(header.code);
    trace!(
        "[swfrec] tag header at byte {byte_offset}: {name} (code {}), {} bytes{}",
        header.code,
        header.length,
        if header.long_form { ", long form" } else { "" }
    );

    let body_start = reader.bit_position();
    let value = body(&header, reader, ctx)?;
    reader.align_to_byte();

    let consumed = ((reader.bit_position() - body_start) / 8) as i64;
    let discrepancy = consumed - i64::from(header.length);
    if discrepancy != 0 {
        return Err(Error::FrameLengthMismatch {
            tag: name,
            byte_offset,
            declared: header.length,
            discrepancy,
        });
    }
    debug!("[swfrec] decoded {name} at byte {byte_offset} ({} bytes)", header.length);
    Ok((header, value))
}

/// Writes one framed tag whose body is described by `layout`.
///
/// The body is measured first; the header form follows from its length
/// unless `long_form` forces the long header. A long header is written with a
/// zero length and patched once the body is out.
pub fn write_frame<F>(
    writer: &mut BitWriter,
    ctx: &mut CodecContext,
    code: u16,
    long_form: bool,
    layout: F,
) -> Result<()>
where
    F: FnOnce(&mut CodecContext, &mut Layout) -> Result<()>,
{
    writer.align_to_byte();
    let name = tag_name(code);
    // Body beginnt auf einer Bytegrenze, Phase 0 passt also immer
    let plan = Plan::build(name, 0, ctx, layout)?;
    let length = u32::try_from(plan.byte_len()).map_err(|_| {
        Error::field_overflow("TagHeader.length", plan.byte_len() as i64, u32::MAX)
    })?;
    let header = TagHeader::new(code, length);

    if header.long_form || long_form {
        TagHeader {
            length: 0,
            long_form: true,
            ..header
        }
        .write(writer)?;
        let length_at = writer.bit_position() - 32;
        let body_start = writer.bit_position();
        plan.write_to(writer)?;
        writer.align_to_byte();
        let written = (writer.bit_position() - body_start) / 8;
        writer.patch_u32(length_at, written as u32);
    } else {
        header.write(writer)?;
        plan.write_to(writer)?;
        writer.align_to_byte();
    }
    trace!("[swfrec] wrote {name} (code {code}), {length} bytes");
    Ok(())
}

/// Reads a single tag of type `T` at the reader's position.
///
/// # Errors
///
/// [`Error::TagCodeMismatch`] if the header carries a code `T` does not
/// decode.
pub fn read_tag<T: TagBody>(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<T> {
    let (_, value) = read_frame(reader, ctx, |header, reader, ctx| {
        if !T::CODES.contains(&header.code) {
            return Err(Error::TagCodeMismatch {
                expected: T::CODES.first().copied().unwrap_or_default(),
                found: header.code,
                byte_offset: reader.byte_position() - header.encoded_len(),
            });
        }
        T::read_body(header, reader, ctx)
    })?;
    Ok(value)
}

/// Writes a single tag of type `T`.
pub fn write_tag<T: TagBody>(
    body: &T,
    writer: &mut BitWriter,
    ctx: &mut CodecContext,
    config: &EncoderConfig,
) -> Result<()> {
    write_frame(
        writer,
        ctx,
        body.tag_code(),
        config.force_long_headers,
        |ctx, out| body.layout_body(ctx, out),
    )
}

/// Decodes a single tag of type `T` from the start of `data`.
pub fn decode_tag<T: TagBody>(data: &[u8], ctx: &mut CodecContext) -> Result<T> {
    read_tag(&mut BitReader::new(data), ctx)
}

/// Encodes a single tag of type `T` into a fresh buffer.
pub fn encode_tag<T: TagBody>(
    body: &T,
    ctx: &mut CodecContext,
    config: &EncoderConfig,
) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new();
    write_tag(body, &mut writer, ctx, config)?;
    Ok(writer.into_vec())
}

/// A tag kept as header fields plus undecoded body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTag {
    pub code: u16,
    pub long_form: bool,
    pub body: Vec<u8>,
}

/// Reads one tag without decoding its body, skipping by the declared length.
pub fn read_raw_tag(reader: &mut BitReader<'_>) -> Result<RawTag> {
    reader.align_to_byte();
    let header = TagHeader::read(reader)?;
    let body = reader.read_bytes(header.length as usize)?;
    Ok(RawTag {
        code: header.code,
        long_form: header.long_form,
        body,
    })
}
