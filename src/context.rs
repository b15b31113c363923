//! Ambient codec parameters shared by all records of one decode or encode pass.
//!
//! Field widths and mode flags set by one record (a shape's index widths, a
//! tag's alpha flag) change how later siblings and descendants are laid out.
//! The store itself has no nesting; [`CodecContext::scope`] hands out a guard
//! that restores the listed keys when it goes out of scope, so a subtree can
//! override a parameter without leaking it to the rest of the stream.
//!
//! # Beispiel
//!
//! ```
//! use swfrec::context::{CodecContext, ParamKey};
//!
//! let mut ctx = CodecContext::new();
//! ctx.set(ParamKey::FillIndexWidth, 3u8);
//! {
//!     let mut inner = ctx.scope(&[ParamKey::FillIndexWidth]);
//!     inner.set(ParamKey::FillIndexWidth, 1u8);
//!     assert_eq!(inner.width(ParamKey::FillIndexWidth), 1);
//! }
//! assert_eq!(ctx.width(ParamKey::FillIndexWidth), 3);
//! ```

use core::ops::{Deref, DerefMut};

use crate::FastHashMap;

/// Name of an ambient parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// Bit width of fill style indices in style-change records.
    FillIndexWidth,
    /// Bit width of line style indices in style-change records.
    LineIndexWidth,
    /// Colours carry an alpha byte (RGBA instead of RGB).
    HasAlphaChannel,
    /// Style array counts may use the 0xFF + u16 extended form.
    UsesExtendedCounts,
    /// Paths are postscript-style; widens empty style index fields to 1 bit.
    IsPostscriptHint,
    /// Running total of shape record bits processed in this pass.
    ///
    /// Every shape stream adds the bits of its records (end marker and
    /// padding excluded).
    ShapeBitAccumulator,
    /// Parameter owned by a collaborating record type.
    Named(&'static str),
}

/// Value of an ambient parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Bool(bool),
}

impl ParamValue {
    /// Integer view; `true` reads as 1.
    pub fn as_int(self) -> i64 {
        match self {
            Self::Int(v) => v,
            Self::Bool(b) => i64::from(b),
        }
    }

    /// Boolean view; any non-zero integer reads as `true`.
    pub fn as_bool(self) -> bool {
        match self {
            Self::Int(v) => v != 0,
            Self::Bool(b) => b,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u8> for ParamValue {
    fn from(v: u8) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

/// Key/value store of ambient parameters for one pass.
///
/// Owned by exactly one decode or encode call chain; never shared between
/// concurrent passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodecContext {
    params: FastHashMap<ParamKey, ParamValue>,
}

/// Full copy of a context, used to re-seed it between `measure` and `write`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot(FastHashMap<ParamKey, ParamValue>);

impl CodecContext {
    /// Creates an empty context (all flags `false`, all widths 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value of `key`, if set.
    pub fn get(&self, key: ParamKey) -> Option<ParamValue> {
        self.params.get(&key).copied()
    }

    /// Sets `key`, returning the previous value.
    pub fn set(&mut self, key: ParamKey, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.params.insert(key, value.into())
    }

    /// Removes `key`, returning the previous value.
    pub fn remove(&mut self, key: ParamKey) -> Option<ParamValue> {
        self.params.remove(&key)
    }

    /// Whether `key` is set.
    pub fn contains(&self, key: ParamKey) -> bool {
        self.params.contains_key(&key)
    }

    /// Integer value of `key`; 0 when unset.
    pub fn int(&self, key: ParamKey) -> i64 {
        self.get(key).map_or(0, ParamValue::as_int)
    }

    /// Flag value of `key`; `false` when unset.
    pub fn flag(&self, key: ParamKey) -> bool {
        self.get(key).is_some_and(ParamValue::as_bool)
    }

    /// Field width stored under `key`, clamped to `0..=64`.
    pub fn width(&self, key: ParamKey) -> u8 {
        self.int(key).clamp(0, 64) as u8
    }

    /// Copies the whole context.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot(self.params.clone())
    }

    /// Replaces the whole context with a snapshot.
    pub fn restore(&mut self, snapshot: ContextSnapshot) {
        self.params = snapshot.0;
    }

    /// Enters a subtree that may override `keys`.
    ///
    /// The returned guard derefs to the context; when it is dropped every
    /// listed key is put back to its prior value (or removed if it was unset),
    /// whatever the subtree did in between, including on early `?` returns.
    pub fn scope(&mut self, keys: &[ParamKey]) -> ContextScope<'_> {
        let saved = keys.iter().map(|&k| (k, self.get(k))).collect();
        ContextScope { ctx: self, saved }
    }
}

/// Guard returned by [`CodecContext::scope`].
#[derive(Debug)]
pub struct ContextScope<'a> {
    ctx: &'a mut CodecContext,
    saved: Vec<(ParamKey, Option<ParamValue>)>,
}

impl Deref for ContextScope<'_> {
    type Target = CodecContext;

    fn deref(&self) -> &CodecContext {
        self.ctx
    }
}

impl DerefMut for ContextScope<'_> {
    fn deref_mut(&mut self) -> &mut CodecContext {
        self.ctx
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        // Rueckwaerts, damit doppelt gelistete Keys den aeltesten Wert bekommen
        for (key, prior) in self.saved.drain(..).rev() {
            match prior {
                Some(v) => {
                    self.ctx.params.insert(key, v);
                }
                None => {
                    self.ctx.params.remove(&key);
                }
            }
        }
    }
}
