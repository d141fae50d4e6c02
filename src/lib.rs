//! # flatwire: nested values to network-order flat binary and back
//!
//! Maps nested, statically-typed values (records, lists and tuples of bools,
//! 16-bit integers, floats, doubles, single bytes and UTF-8 strings) to a flat
//! big-endian byte buffer described by a struct-style format string, and
//! rebuilds the original nesting from the bytes plus a [`TypeMap`].
//!
//! ## Pipeline
//!
//! - **Format codes** ([`format`]): each leaf maps to `?`, `h`, `f`, `d`, `c` or `<N>s`;
//!   a value's format string is its leaf codes in depth-first order.
//! - **Encode** ([`codec::encode`]): flatten depth-first, then pack against `!<format>`.
//! - **Type map** ([`typemap::build_typemap`]): shape descriptor built once from a template value.
//! - **Decode** ([`codec::decode`]): check the format against the type map, unpack, re-nest.
//!
//! Container boundaries never appear on the wire. Sets are rejected everywhere,
//! since their element order is not reproducible.
//!
//! ## Example
//!
//! ```
//! use flatwire::{build_typemap, decode, encode, Record, Value};
//!
//! let person = Value::Record(
//!     Record::new("Person").with("name", "ab").with("age", 12i16).with("height", 1.5f32),
//! );
//! let encoded = encode(&person)?;
//! assert_eq!(encoded.format.to_string(), "2shf");
//! assert_eq!(encoded.bytes.len(), 8);
//!
//! let map = build_typemap(&person)?;
//! assert_eq!(decode(&encoded.bytes, &encoded.format, &map)?, person);
//! # Ok::<(), flatwire::CodecError>(())
//! ```

pub mod codec;
pub mod config;
pub mod dump;
pub mod format;
pub mod frame;
pub mod parser;
pub mod record;
pub mod transport;
pub mod typemap;
pub mod value;

pub use codec::{check_format, decode, decode_str, encode, flatten, pack, remap, unpack, CodecError, Encoded};
pub use config::{Config, ConfigError};
pub use format::{derive_code, derive_code_sequence, FormatCode, FormatString};
pub use frame::Frame;
pub use record::{take_record, FieldDescriptor, FieldTag, RecordCodec, RecordSchema, WireRecord};
pub use transport::{ByteSink, ByteSource, MemoryChannel, TransportError, UdpTransport};
pub use typemap::{build_typemap, ContainerKind, ContainerMap, TypeMap};
pub use value::{FromValue, PrimitiveType, Record, Value};
