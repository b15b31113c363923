//! Bit-level stream reader and writer for SWF records.
//!
//! SWF packs bit fields MSB-first: bit 7 of each byte is read/written first.
//! Multi-byte integers (u16/u32) are little-endian and go through the same
//! cursor, eight bits at a time.

use crate::{Error, Result};

/// Writes bits MSB-first into a growable byte buffer.
///
/// The cursor can be repositioned anywhere inside the written range
/// (`set_bit_position`) to overwrite a placeholder once its value is known.
/// Writes past the cursor overwrite; writes at the end grow the buffer.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    /// Aktuelle Schreibposition in Bits.
    pos: usize,
    /// Hoechste je geschriebene Bitposition (logisches Ende).
    end: usize,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with room for `bytes` bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
            pos: 0,
            end: 0,
        }
    }

    /// Writes a single bit. `true` = 1, `false` = 0.
    #[inline]
    pub fn write_bit(&mut self, val: bool) {
        self.write_bits(u64::from(val), 1);
    }

    /// Writes the lower `n` bits of `val`, MSB first.
    ///
    /// Higher bits are silently dropped: a value that does not fit `n` bits is
    /// truncated, exactly as the format packs it. `n == 0` is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `n > 64`.
    pub fn write_bits(&mut self, val: u64, n: u8) {
        assert!(n <= 64, "bit count must be 0..=64, got {n}");
        if n == 0 {
            return;
        }
        let val = if n < 64 { val & ((1u64 << n) - 1) } else { val };
        let mut remaining = n as usize;
        while remaining > 0 {
            let byte_idx = self.pos / 8;
            if byte_idx == self.buf.len() {
                self.buf.push(0);
            }
            let used = self.pos % 8;
            let free = 8 - used;
            let take = free.min(remaining);
            let chunk = ((val >> (remaining - take)) & ((1u64 << take) - 1)) as u8;
            let shift = free - take;
            let mask = (((1u16 << take) - 1) as u8) << shift;
            self.buf[byte_idx] = (self.buf[byte_idx] & !mask) | (chunk << shift);
            self.pos += take;
            remaining -= take;
        }
        self.end = self.end.max(self.pos);
    }

    /// Writes the lower `n` bits of a signed value (two's complement).
    #[inline]
    pub fn write_signed(&mut self, val: i64, n: u8) {
        self.write_bits(val as u64, n);
    }

    /// Writes one byte (8 bits, not necessarily aligned).
    #[inline]
    pub fn write_u8(&mut self, val: u8) {
        self.write_bits(u64::from(val), 8);
    }

    /// Writes a little-endian u16.
    pub fn write_u16(&mut self, val: u16) {
        for b in val.to_le_bytes() {
            self.write_u8(b);
        }
    }

    /// Writes a little-endian u32.
    pub fn write_u32(&mut self, val: u32) {
        for b in val.to_le_bytes() {
            self.write_u8(b);
        }
    }

    /// Writes a byte slice.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.pos == self.end && self.pos % 8 == 0 {
            // Fast path: angehaengt und byte-aligned
            self.buf.truncate(self.pos / 8);
            self.buf.extend_from_slice(bytes);
            self.pos += bytes.len() * 8;
            self.end = self.pos;
        } else {
            for &b in bytes {
                self.write_u8(b);
            }
        }
    }

    /// Pads with zero bits up to the next byte boundary. No-op if aligned.
    pub fn align_to_byte(&mut self) {
        let partial = self.pos % 8;
        if partial > 0 {
            self.write_bits(0, (8 - partial) as u8);
        }
    }

    /// Number of zero bits `align_to_byte` would emit right now.
    pub fn padding_to_byte(&self) -> usize {
        (8 - self.pos % 8) % 8
    }

    /// Returns the current bit position (the write cursor).
    pub fn bit_position(&self) -> usize {
        self.pos
    }

    /// Returns the total number of bits written (the high-water mark).
    pub fn len_bits(&self) -> usize {
        self.end
    }

    /// Moves the write cursor to an absolute bit position.
    ///
    /// # Panics
    ///
    /// Panics if `pos` lies beyond the written range.
    pub fn set_bit_position(&mut self, pos: usize) {
        assert!(
            pos <= self.end,
            "bit position {pos} exceeds written length {} bits",
            self.end
        );
        self.pos = pos;
    }

    /// Overwrites `n` bits at `at` with `val` and restores the cursor.
    ///
    /// Backpatching: a placeholder was written earlier, the real value is only
    /// known now.
    pub fn patch_bits(&mut self, at: usize, val: u64, n: u8) {
        let resume = self.pos;
        self.set_bit_position(at);
        self.write_bits(val, n);
        self.pos = resume;
    }

    /// Overwrites a little-endian u32 at `at` and restores the cursor.
    pub fn patch_u32(&mut self, at: usize, val: u32) {
        let resume = self.pos;
        self.set_bit_position(at);
        self.write_u32(val);
        self.pos = resume;
    }

    /// Bytes written so far; a trailing partial byte is zero-padded.
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.end.div_ceil(8)]
    }

    /// Finalises the writer and returns the buffer (last byte zero-padded).
    pub fn into_vec(mut self) -> Vec<u8> {
        self.buf.truncate(self.end.div_ceil(8));
        self.buf
    }
}

/// Checkpoint für BitReader-Rollback (Lookahead, Typ-Byte-Scan).
#[derive(Debug, Clone, Copy)]
pub struct BitReaderCheckpoint {
    byte_pos: usize,
    accum: u64,
    accum_bits: u8,
}

/// Reads bits MSB-first from an immutable byte slice.
///
/// Verwendet einen u64-Akkumulator: Bytes werden batchweise geladen und per
/// Shift/Mask extrahiert, Boundary-Checks nur beim Refill.
#[derive(Debug, Clone, Copy)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Naechstes ungelesenes Byte in data.
    byte_pos: usize,
    /// Linksbuendig: Bit 63 = aeltestes Bit, rechte (64 - accum_bits) Bits sind 0.
    accum: u64,
    /// Anzahl gueltiger Bits im Akkumulator (0..=64).
    accum_bits: u8,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            accum: 0,
            accum_bits: 0,
        }
    }

    #[inline(always)]
    fn refill(&mut self) {
        while self.accum_bits <= 56 && self.byte_pos < self.data.len() {
            self.accum |= (self.data[self.byte_pos] as u64) << (56 - self.accum_bits);
            self.byte_pos += 1;
            self.accum_bits += 8;
        }
    }

    /// Reads a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Reads `n` unsigned bits, MSB first. `n == 0` returns 0 and consumes nothing.
    ///
    /// # Panics
    ///
    /// Panics if `n > 64`.
    pub fn read_bits(&mut self, n: u8) -> Result<u64> {
        assert!(n <= 64, "bit count must be 0..=64, got {n}");
        if n == 0 {
            return Ok(0);
        }
        // Upfront-Check: State bleibt bei Fehler unveraendert
        let available = self.remaining_bits();
        if (n as usize) > available {
            return Err(Error::underrun(self.bit_position(), n as usize, available));
        }

        self.refill();
        if self.accum_bits >= n {
            let val = self.accum >> (64 - n);
            self.accum = if n < 64 { self.accum << n } else { 0 };
            self.accum_bits -= n;
            Ok(val)
        } else {
            // Zweistufig: n > 56 und Akkumulator nicht voll genug
            let first = self.accum_bits;
            let high = self.accum >> (64 - first);
            self.accum = 0;
            self.accum_bits = 0;
            let rest = n - first;
            self.refill();
            let low = self.accum >> (64 - rest);
            self.accum <<= rest;
            self.accum_bits -= rest;
            Ok((high << rest) | low)
        }
    }

    /// Reads `n` bits and sign-extends them (two's complement).
    pub fn read_signed(&mut self, n: u8) -> Result<i64> {
        let raw = self.read_bits(n)?;
        if n == 0 || n == 64 {
            return Ok(raw as i64);
        }
        if (raw >> (n - 1)) & 1 == 1 {
            Ok((raw | (u64::MAX << n)) as i64)
        } else {
            Ok(raw as i64)
        }
    }

    /// Reads one byte (8 bits, not necessarily aligned).
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads a little-endian u16.
    pub fn read_u16(&mut self) -> Result<u16> {
        let available = self.remaining_bits();
        if available < 16 {
            return Err(Error::underrun(self.bit_position(), 16, available));
        }
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Reads a little-endian u32.
    pub fn read_u32(&mut self) -> Result<u32> {
        let available = self.remaining_bits();
        if available < 32 {
            return Err(Error::underrun(self.bit_position(), 32, available));
        }
        let mut bytes = [0u8; 4];
        for b in &mut bytes {
            *b = self.read_u8()?;
        }
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads `len` bytes into a new vector.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let available = self.remaining_bits();
        if len.saturating_mul(8) > available {
            return Err(Error::underrun(self.bit_position(), len.saturating_mul(8), available));
        }
        if self.accum_bits == 0 {
            let out = self.data[self.byte_pos..self.byte_pos + len].to_vec();
            self.byte_pos += len;
            return Ok(out);
        }
        (0..len).map(|_| self.read_u8()).collect()
    }

    /// Returns the next `n` bits without consuming them.
    pub fn peek_bits(&mut self, n: u8) -> Result<u64> {
        let cp = self.save_checkpoint();
        let val = self.read_bits(n);
        self.restore_checkpoint(cp);
        val
    }

    /// Discards unread bits up to the next byte boundary. No-op if aligned.
    pub fn align_to_byte(&mut self) {
        let discard = self.accum_bits % 8;
        if discard > 0 {
            self.accum <<= discard;
            self.accum_bits -= discard;
        }
    }

    /// Returns the current bit position.
    pub fn bit_position(&self) -> usize {
        self.byte_pos * 8 - self.accum_bits as usize
    }

    /// Byte offset of the current position (rounded down).
    pub fn byte_position(&self) -> usize {
        self.bit_position() / 8
    }

    /// Returns the number of bits remaining to be read.
    pub fn remaining_bits(&self) -> usize {
        (self.data.len() - self.byte_pos) * 8 + self.accum_bits as usize
    }

    /// Returns the total number of bits in the stream.
    pub fn total_bits(&self) -> usize {
        self.data.len() * 8
    }

    /// Speichert die aktuelle Leseposition fuer spaeteren Rollback.
    pub fn save_checkpoint(&self) -> BitReaderCheckpoint {
        BitReaderCheckpoint {
            byte_pos: self.byte_pos,
            accum: self.accum,
            accum_bits: self.accum_bits,
        }
    }

    /// Stellt eine zuvor gespeicherte Leseposition wieder her.
    pub fn restore_checkpoint(&mut self, cp: BitReaderCheckpoint) {
        self.byte_pos = cp.byte_pos;
        self.accum = cp.accum;
        self.accum_bits = cp.accum_bits;
    }

    /// Moves the cursor to an absolute bit position.
    ///
    /// # Errors
    ///
    /// [`Error::Underrun`] if `pos` lies beyond the end of the buffer; the
    /// cursor is left unchanged.
    pub fn set_bit_position(&mut self, pos: usize) -> Result<()> {
        let total = self.total_bits();
        if pos > total {
            return Err(Error::underrun(
                self.bit_position(),
                pos - self.bit_position(),
                self.remaining_bits(),
            ));
        }
        self.byte_pos = pos / 8;
        self.accum = 0;
        self.accum_bits = 0;
        let partial = (pos % 8) as u8;
        if partial > 0 {
            let byte = self.data[self.byte_pos];
            self.byte_pos += 1;
            let remaining = 8 - partial;
            let bits = byte & ((1u8 << remaining) - 1);
            self.accum = (bits as u64) << (64 - remaining);
            self.accum_bits = remaining;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_default() {
        let w = BitWriter::default();
        assert_eq!(w.bit_position(), 0);
        assert_eq!(w.into_vec(), Vec::<u8>::new());
    }

    #[test]
    fn write_read_single_bit() {
        let mut w = BitWriter::new();
        w.write_bit(true);
        let data = w.into_vec();
        assert_eq!(data, vec![0b1000_0000]);

        let mut r = BitReader::new(&data);
        assert!(r.read_bit().unwrap());
    }

    #[test]
    fn write_read_3_bits() {
        let mut w = BitWriter::new();
        w.write_bits(0b101, 3);
        let data = w.into_vec();
        assert_eq!(data, vec![0b1010_0000]);

        let mut r = BitReader::new(&data);
        assert_eq!(r.read_bits(3).unwrap(), 0b101);
    }

    #[test]
    fn write_read_64_bits_unaligned() {
        let val: u64 = 0xDEAD_BEEF_CAFE_BABE;
        let mut w = BitWriter::new();
        w.write_bits(0b101, 3);
        w.write_bits(val, 64);
        let data = w.into_vec();
        assert_eq!(data.len(), 9);

        let mut r = BitReader::new(&data);
        assert_eq!(r.read_bits(3).unwrap(), 0b101);
        assert_eq!(r.read_bits(64).unwrap(), val);
    }

    #[test]
    fn cross_byte_boundary() {
        let mut w = BitWriter::new();
        w.write_bits(0b11, 2);
        w.write_bits(0b10_1010_1010, 10);
        let data = w.into_vec();
        assert_eq!(data, vec![0b1110_1010, 0b1010_0000]);

        let mut r = BitReader::new(&data);
        assert_eq!(r.read_bits(2).unwrap(), 0b11);
        assert_eq!(r.read_bits(10).unwrap(), 0b10_1010_1010);
    }

    #[test]
    fn zero_bit_ops_are_noops() {
        let mut w = BitWriter::new();
        w.write_bits(0xFF, 0);
        assert_eq!(w.bit_position(), 0);

        let mut r = BitReader::new(&[]);
        assert_eq!(r.read_bits(0).unwrap(), 0);
        assert_eq!(r.read_signed(0).unwrap(), 0);
        assert_eq!(r.bit_position(), 0);
    }

    #[test]
    fn write_truncates_to_low_bits() {
        let mut w = BitWriter::new();
        w.write_bits(0b1111_0101, 4);
        assert_eq!(w.into_vec(), vec![0b0101_0000]);
    }

    #[test]
    fn signed_round_trip_boundaries() {
        let cases: &[(i64, u8)] = &[
            (0, 1),
            (-1, 1),
            (-2, 2),
            (1, 2),
            (-16, 5),
            (15, 5),
            (-32768, 16),
            (32767, 16),
        ];
        let mut w = BitWriter::new();
        for &(v, n) in cases {
            w.write_signed(v, n);
        }
        let data = w.into_vec();
        let mut r = BitReader::new(&data);
        for &(v, n) in cases {
            assert_eq!(r.read_signed(n).unwrap(), v, "width {n}");
        }
    }

    #[test]
    fn little_endian_integers() {
        let mut w = BitWriter::new();
        w.write_u16(0x1234);
        w.write_u32(0xAABB_CCDD);
        let data = w.into_vec();
        assert_eq!(data, vec![0x34, 0x12, 0xDD, 0xCC, 0xBB, 0xAA]);

        let mut r = BitReader::new(&data);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.read_u32().unwrap(), 0xAABB_CCDD);
    }

    #[test]
    fn align_to_byte_writer_and_reader() {
        let mut w = BitWriter::new();
        w.write_bits(0b111, 3);
        assert_eq!(w.padding_to_byte(), 5);
        w.align_to_byte();
        assert_eq!(w.bit_position(), 8);
        w.align_to_byte();
        assert_eq!(w.bit_position(), 8);
        w.write_u8(0xAB);
        let data = w.into_vec();
        assert_eq!(data, vec![0b1110_0000, 0xAB]);

        let mut r = BitReader::new(&data);
        r.read_bits(3).unwrap();
        r.align_to_byte();
        assert_eq!(r.bit_position(), 8);
        assert_eq!(r.read_u8().unwrap(), 0xAB);
    }

    #[test]
    fn read_past_end_is_underrun() {
        let mut r = BitReader::new(&[0xFF]);
        r.read_bits(5).unwrap();
        let err = r.read_bits(4).unwrap_err();
        assert_eq!(
            err,
            Error::Underrun {
                bit_position: 5,
                requested: 4,
                available: 3,
            }
        );
        // Position bleibt unveraendert
        assert_eq!(r.bit_position(), 5);
    }

    #[test]
    fn read_u16_underrun() {
        let mut r = BitReader::new(&[0x01]);
        assert!(matches!(r.read_u16(), Err(Error::Underrun { requested: 16, .. })));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut r = BitReader::new(&[0b1011_0000]);
        assert_eq!(r.peek_bits(4).unwrap(), 0b1011);
        assert_eq!(r.bit_position(), 0);
        assert_eq!(r.read_bits(2).unwrap(), 0b10);
        assert_eq!(r.peek_bits(2).unwrap(), 0b11);
        assert_eq!(r.bit_position(), 2);
    }

    #[test]
    fn reader_set_bit_position_mid_byte() {
        let data = [0b0000_1111, 0xF0];
        let mut r = BitReader::new(&data);
        r.set_bit_position(4).unwrap();
        assert_eq!(r.read_bits(8).unwrap(), 0xFF);
        assert!(r.set_bit_position(17).is_err());
        assert_eq!(r.bit_position(), 12);
        r.set_bit_position(16).unwrap();
        assert_eq!(r.remaining_bits(), 0);
    }

    #[test]
    fn backpatch_restores_cursor() {
        let mut w = BitWriter::new();
        w.write_u8(0x11);
        let placeholder = w.bit_position();
        w.write_u32(0);
        w.write_u8(0x22);
        w.patch_u32(placeholder, 0x0403_0201);
        assert_eq!(w.bit_position(), 48);
        w.write_u8(0x33);
        assert_eq!(w.into_vec(), vec![0x11, 0x01, 0x02, 0x03, 0x04, 0x22, 0x33]);
    }

    #[test]
    fn patch_bits_overwrites_only_target() {
        let mut w = BitWriter::new();
        w.write_bits(0b1111_1111, 8);
        w.patch_bits(2, 0b00, 2);
        assert_eq!(w.bit_position(), 8);
        assert_eq!(w.into_vec(), vec![0b1100_1111]);
    }

    #[test]
    #[should_panic(expected = "exceeds written length")]
    fn writer_seek_beyond_end_panics() {
        let mut w = BitWriter::new();
        w.write_u8(0);
        w.set_bit_position(9);
    }

    #[test]
    fn write_bytes_fast_and_slow_path() {
        let mut w = BitWriter::new();
        w.write_bytes(&[1, 2]);
        w.write_bit(true);
        w.write_bytes(&[0xFF]);
        assert_eq!(w.into_vec(), vec![1, 2, 0xFF, 0x80]);

        let data = [0xAA, 0xBB, 0xCC];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read_bytes(2).unwrap(), vec![0xAA, 0xBB]);
        assert!(r.read_bytes(2).is_err());
    }

    #[test]
    fn bytes_view_pads_partial() {
        let mut w = BitWriter::new();
        w.write_bits(0b1, 1);
        assert_eq!(w.bytes(), &[0x80]);
        assert_eq!(w.len_bits(), 1);
    }
}
