//! Zentrale Bitbreiten-Berechnung.
//!
//! SWF stores most coordinates in groups that share one field width; the width
//! is computed from the values and written as a small prefix. Everything here
//! returns the *smallest* width that represents every value of the group.

/// Bits needed for `v` as an unsigned field.
///
/// - `0`: 0 Bits
/// - `1`: 1 Bit
/// - `2..=3`: 2 Bits
/// - `4..=7`: 3 Bits
#[inline]
pub fn for_unsigned(v: u64) -> u8 {
    (u64::BITS - v.leading_zeros()) as u8
}

/// Bits needed for `v` as a two's complement signed field, sign bit included.
///
/// Zero and `-1` both need one bit.
#[inline]
pub fn for_signed(v: i64) -> u8 {
    let magnitude = (if v < 0 { !v } else { v }) as u64;
    for_unsigned(magnitude) + 1
}

/// Shared width for a group of signed values, never below `min`.
pub fn for_signed_group(values: &[i64], min: u8) -> u8 {
    values.iter().copied().map(for_signed).fold(min, u8::max)
}

/// Width of a 1-based style index into an array of `count` styles.
///
/// Unter Postscript-Pfaden wird eine Breite von 0 auf 1 angehoben (auch bei
/// leerem Style-Array).
pub fn for_index(count: usize, postscript: bool) -> u8 {
    widen_index(for_unsigned(count as u64), postscript)
}

/// Applies the postscript rule to an index width: 0 becomes 1.
#[inline]
pub fn widen_index(width: u8, postscript: bool) -> u8 {
    if width == 0 && postscript {
        1
    } else {
        width
    }
}

/// Largest signed value representable in `width` bits.
#[inline]
pub fn signed_max(width: u8) -> i64 {
    match width {
        0 => 0,
        64.. => i64::MAX,
        w => (1i64 << (w - 1)) - 1,
    }
}

/// Smallest signed value representable in `width` bits.
#[inline]
pub fn signed_min(width: u8) -> i64 {
    match width {
        0 => 0,
        64.. => i64::MIN,
        w => -(1i64 << (w - 1)),
    }
}
