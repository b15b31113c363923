//! Encoder- und Decoder-Konfiguration.

/// Encoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderConfig {
    /// Always write the long tag header (0x3F marker + u32 length), even for
    /// bodies shorter than 63 bytes.
    pub force_long_headers: bool,
}

impl EncoderConfig {
    /// Always write long tag headers.
    pub fn with_long_headers(mut self) -> Self {
        self.force_long_headers = true;
        self
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderConfig {
    /// Keep going after a tag body fails to decode: the tag is kept as raw
    /// bytes and decoding resumes at its declared end. Off by default, so a
    /// malformed tag aborts the whole decode.
    pub skip_corrupt_tags: bool,
}

impl DecoderConfig {
    /// Keep corrupt tags as raw bytes instead of aborting.
    pub fn with_skip_corrupt_tags(mut self) -> Self {
        self.skip_corrupt_tags = true;
        self
    }
}
