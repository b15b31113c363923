//! swfrec – size-exact codec for SWF tags and shape records
//!
//! # Beispiel
//!
//! ```
//! use swfrec::{
//!     decode_tags, encode_tags, CodecContext, DecoderConfig, DefineShape, EncoderConfig,
//!     FillStyle, Rect, Rgba, ShapeStream, ShapeVersion, ShapeWithStyle, StraightEdge,
//!     StyleChange, StyleTable, Tag,
//! };
//!
//! let mut ctx = CodecContext::new();
//! let styles = StyleTable::fitted(vec![FillStyle::Solid(Rgba::rgb(255, 0, 0))], vec![], &ctx);
//! let stream = ShapeStream::new(vec![
//!     StyleChange {
//!         move_to: Some((0, 0)),
//!         fill_style: Some(1),
//!         ..Default::default()
//!     }
//!     .into(),
//!     StraightEdge { dx: 100, dy: 0 }.into(),
//!     StraightEdge { dx: 0, dy: 100 }.into(),
//! ]);
//! let tags = vec![
//!     Tag::DefineShape(DefineShape {
//!         version: ShapeVersion::One,
//!         id: 1,
//!         bounds: Rect::new(0, 100, 0, 100),
//!         shape: ShapeWithStyle { styles, stream },
//!     }),
//!     Tag::End,
//! ];
//!
//! // Encode
//! let bytes = encode_tags(&tags, &mut ctx, &EncoderConfig::default()).unwrap();
//!
//! // Decode
//! let decoded = decode_tags(&bytes, &mut CodecContext::new(), &DecoderConfig::default()).unwrap();
//! assert_eq!(decoded, tags);
//! ```

pub mod bit_width;
pub mod bitstream;
pub mod color;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod extended_count;
pub mod geometry;
pub mod record;
pub mod shape_record;
pub mod shape_stream;
pub mod style;
pub mod tag;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent, fuer interne Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

// Public API: Bitstream / Context / Protokoll
pub use bitstream::{BitReader, BitWriter};
pub use context::{CodecContext, ContextScope, ParamKey, ParamValue};
pub use record::{Layout, Plan, Record};

// Public API: Konfiguration
pub use config::{DecoderConfig, EncoderConfig};

// Public API: Records
pub use color::Rgba;
pub use geometry::{Matrix, Rect};
pub use shape_record::{CurvedEdge, ShapeRecord, StraightEdge, StyleChange, StyleTable};
pub use shape_stream::{Shape, ShapeStream, ShapeWithStyle};
pub use style::{FillStyle, Gradient, GradientStop, LineStyle};

// Public API: Tags
pub use envelope::{decode_tag, encode_tag, read_raw_tag, RawTag, TagBody, TagHeader};
pub use tag::{decode_tags, encode_tags, DefineShape, ShapeVersion, Tag, TagCode};
