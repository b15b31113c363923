//! Central error types for the SWF record codec.
//!
//! Every decode failure carries the byte offset and, where known, the name of
//! the tag or record that was being processed. The `Display` strings are part
//! of the public contract: tooling greps for them when hunting corrupt files.

use core::fmt;

/// All errors raised while reading or writing SWF records.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A read ran past the end of the buffer.
    Underrun {
        /// Bit position at which the read was attempted.
        bit_position: usize,
        /// Bits requested by the read.
        requested: usize,
        /// Bits still available in the buffer.
        available: usize,
    },
    /// A leading type byte does not match any registered decoder.
    UnsupportedRecordType {
        /// Record family the byte was read for (e.g. `"FillStyle"`).
        kind: &'static str,
        /// The offending discriminant.
        type_byte: u8,
        /// Byte offset of the discriminant in the stream.
        byte_offset: usize,
    },
    /// A tag body consumed a different number of bytes than its header declared.
    FrameLengthMismatch {
        /// Tag name (e.g. `"DefineShape3"`).
        tag: &'static str,
        /// Byte offset of the tag header.
        byte_offset: usize,
        /// Body length from the header, in bytes.
        declared: u32,
        /// `consumed - declared` in bytes; negative when the body read too little.
        discrepancy: i64,
    },
    /// A write emitted a different number of bits than its measurement.
    ///
    /// Interner Konsistenzfehler: Plan und Ausgabe sind auseinandergelaufen.
    InvariantViolation {
        /// Record whose plan was written.
        record: &'static str,
        /// Bits promised by `measure`.
        measured: usize,
        /// Bits actually emitted.
        written: usize,
    },
    /// A value does not fit the widest field the format permits.
    FieldOverflow {
        /// Field name (e.g. `"StraightEdge.delta"`).
        field: &'static str,
        /// The value that did not fit.
        value: i64,
        /// Largest width (or count) the field allows.
        max_width: u32,
    },
    /// A record cannot be encoded in its current form.
    InvalidRecord {
        /// Record name.
        record: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// A typed tag decode found a different tag code in the header.
    TagCodeMismatch {
        /// Code the caller asked for.
        expected: u16,
        /// Code found in the header.
        found: u16,
        /// Byte offset of the tag header.
        byte_offset: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Underrun {
                bit_position,
                requested,
                available,
            } => write!(
                f,
                "buffer underrun at byte offset {} (bit {bit_position}): \
                 requested {requested} bits, {available} available",
                bit_position / 8
            ),
            Self::UnsupportedRecordType {
                kind,
                type_byte,
                byte_offset,
            } => write!(
                f,
                "unsupported {kind} type 0x{type_byte:02X} at byte offset {byte_offset}"
            ),
            Self::FrameLengthMismatch {
                tag,
                byte_offset,
                declared,
                discrepancy,
            } => {
                let consumed = i64::from(*declared) + discrepancy;
                write!(
                    f,
                    "{tag} at byte offset {byte_offset}: declared length {declared} bytes, \
                     body consumed {consumed} ({discrepancy:+})"
                )
            }
            Self::InvariantViolation {
                record,
                measured,
                written,
            } => write!(
                f,
                "{record}: measured {measured} bits but wrote {written} bits"
            ),
            Self::FieldOverflow {
                field,
                value,
                max_width,
            } => write!(
                f,
                "{field}: value {value} exceeds field limit {max_width}"
            ),
            Self::InvalidRecord { record, reason } => write!(f, "invalid {record}: {reason}"),
            Self::TagCodeMismatch {
                expected,
                found,
                byte_offset,
            } => write!(
                f,
                "tag code mismatch at byte offset {byte_offset}: expected {expected}, found {found}"
            ),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Erstellt einen `Underrun` Fehler.
    pub fn underrun(bit_position: usize, requested: usize, available: usize) -> Self {
        Self::Underrun {
            bit_position,
            requested,
            available,
        }
    }

    /// Erstellt einen `FieldOverflow` Fehler.
    pub fn field_overflow(field: &'static str, value: i64, max_width: u32) -> Self {
        Self::FieldOverflow {
            field,
            value,
            max_width,
        }
    }

    /// Byte offset the error points at, if it carries one.
    pub fn byte_offset(&self) -> Option<usize> {
        match self {
            Self::Underrun { bit_position, .. } => Some(bit_position / 8),
            Self::UnsupportedRecordType { byte_offset, .. }
            | Self::FrameLengthMismatch { byte_offset, .. }
            | Self::TagCodeMismatch { byte_offset, .. } => Some(*byte_offset),
            Self::InvariantViolation { .. }
            | Self::FieldOverflow { .. }
            | Self::InvalidRecord { .. } => None,
        }
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
