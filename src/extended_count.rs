//! Counts with a 0xFF escape, and the record arrays that use them.
//!
//! A count is one byte. When [`ParamKey::UsesExtendedCounts`] is set, the
//! byte value 0xFF is a sentinel: the real count follows as a little-endian
//! u16. Without the flag the byte is taken literally (0..=255).
//!
//! | count   | extended      | plain   |
//! |---------|---------------|---------|
//! | 0..=254 | `n`           | `n`     |
//! | 255     | `FF FF 00`    | `FF`    |
//! | 256..   | `FF lo hi`    | error   |

use crate::bitstream::BitReader;
use crate::context::{CodecContext, ParamKey};
use crate::record::{Layout, Record};
use crate::{Error, Result};

/// Count byte announcing a following u16 count.
pub const EXTENDED_COUNT_SENTINEL: u8 = 0xFF;

/// Lays out `count` in the short or extended form.
///
/// # Errors
///
/// [`Error::FieldOverflow`] if `count` exceeds 255 (plain) or 65535 (extended).
pub fn layout_count(
    out: &mut Layout,
    count: usize,
    extended: bool,
    field: &'static str,
) -> Result<()> {
    if extended {
        if count < usize::from(EXTENDED_COUNT_SENTINEL) {
            out.u8(count as u8);
        } else if count <= usize::from(u16::MAX) {
            out.u8(EXTENDED_COUNT_SENTINEL);
            out.u16(count as u16);
        } else {
            return Err(Error::field_overflow(field, count as i64, u32::from(u16::MAX)));
        }
    } else if count <= usize::from(u8::MAX) {
        out.u8(count as u8);
    } else {
        return Err(Error::field_overflow(field, count as i64, u32::from(u8::MAX)));
    }
    Ok(())
}

/// Reads a count written by [`layout_count`].
pub fn read_count(reader: &mut BitReader<'_>, extended: bool) -> Result<usize> {
    let short = reader.read_u8()?;
    if extended && short == EXTENDED_COUNT_SENTINEL {
        Ok(usize::from(reader.read_u16()?))
    } else {
        Ok(usize::from(short))
    }
}

/// Lays out a counted array of records; the count form follows the context.
pub fn layout_array<R: Record>(
    items: &[R],
    ctx: &mut CodecContext,
    out: &mut Layout,
    field: &'static str,
) -> Result<()> {
    layout_count(out, items.len(), ctx.flag(ParamKey::UsesExtendedCounts), field)?;
    for item in items {
        item.layout(ctx, out)?;
    }
    Ok(())
}

/// Reads a counted array of records.
pub fn read_array<R: Record>(reader: &mut BitReader<'_>, ctx: &mut CodecContext) -> Result<Vec<R>> {
    let count = read_count(reader, ctx.flag(ParamKey::UsesExtendedCounts))?;
    // Kapazitaet begrenzen: count stammt aus ungeprueften Eingabedaten
    let mut items = Vec::with_capacity(count.min(reader.remaining_bits() / 8 + 1));
    for _ in 0..count {
        items.push(R::read(reader, ctx)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::BitWriter;

    fn count_bytes(count: usize, extended: bool) -> Result<Vec<u8>> {
        let mut ctx = CodecContext::new();
        let plan = crate::record::Plan::build("count", 0, &mut ctx, |_, out| {
            layout_count(out, count, extended, "test.count")
        })?;
        let mut w = BitWriter::new();
        plan.write_to(&mut w)?;
        Ok(w.into_vec())
    }

    fn decode(bytes: &[u8], extended: bool) -> usize {
        read_count(&mut BitReader::new(bytes), extended).unwrap()
    }

    #[test]
    fn sentinel_boundary_extended() {
        assert_eq!(count_bytes(0, true).unwrap(), vec![0x00]);
        assert_eq!(count_bytes(254, true).unwrap(), vec![0xFE]);
        assert_eq!(count_bytes(255, true).unwrap(), vec![0xFF, 0xFF, 0x00]);
        assert_eq!(count_bytes(256, true).unwrap(), vec![0xFF, 0x00, 0x01]);
        assert_eq!(count_bytes(65535, true).unwrap(), vec![0xFF, 0xFF, 0xFF]);

        for n in [0, 1, 254, 255, 256, 1000, 65535] {
            assert_eq!(decode(&count_bytes(n, true).unwrap(), true), n);
        }
    }

    #[test]
    fn plain_counts_take_0xff_literally() {
        assert_eq!(count_bytes(255, false).unwrap(), vec![0xFF]);
        assert_eq!(decode(&[0xFF, 0x12, 0x34], false), 255);
    }

    #[test]
    fn overflow_is_reported() {
        assert!(matches!(
            count_bytes(256, false),
            Err(Error::FieldOverflow { field: "test.count", value: 256, max_width: 255 })
        ));
        assert!(matches!(
            count_bytes(65536, true),
            Err(Error::FieldOverflow { value: 65536, .. })
        ));
    }

    #[test]
    fn truncated_extended_count_underruns() {
        assert!(matches!(
            read_count(&mut BitReader::new(&[0xFF, 0x01]), true),
            Err(Error::Underrun { .. })
        ));
    }
}
