//! # Johanson
//!
//! An incremental, event-based JSON parser and generator.
//!
//! ## Parsing
//!
//! Implement [`JsonHandler`] for the callbacks you care about and feed the
//! parser chunks of JSON text. Chunks may split the text anywhere, even in
//! the middle of a token, which makes the parser suitable for consuming
//! JSON straight off a network connection or any other source that
//! delivers bytes in arbitrary pieces.
//!
//! ```
//! use johanson::{JsonHandler, JsonParser};
//!
//! #[derive(Default)]
//! struct Collect {
//!     keys: Vec<String>,
//!     ints: Vec<i64>,
//! }
//!
//! impl JsonHandler for Collect {
//!     fn on_map_key(&mut self, key: &[u8]) -> bool {
//!         self.keys.push(String::from_utf8_lossy(key).into_owned());
//!         true
//!     }
//!
//!     fn on_integer(&mut self, val: i64) -> bool {
//!         self.ints.push(val);
//!         true
//!     }
//! }
//!
//! let mut parser = JsonParser::new(Collect::default());
//!
//! // the chunk boundary falls inside the key token
//! parser.parse(br#"{"answ"#).unwrap();
//! parser.parse(br#"er": 42}"#).unwrap();
//! parser.finish().unwrap();
//!
//! assert_eq!(parser.handler.keys, vec!["answer"]);
//! assert_eq!(parser.handler.ints, vec![42]);
//! ```
//!
//! Returning `false` from a callback cancels the parse. Parsing purely for
//! validation works with the no-op handler `()`:
//!
//! ```
//! use johanson::JsonParser;
//!
//! let mut parser = JsonParser::new(());
//! assert!(parser.parse(br#"[1, "two", 3.0]"#).is_ok());
//! assert!(parser.finish().is_ok());
//! ```
//!
//! ## Generating
//!
//! [`JsonGenerator`] is the reverse direction: drive it with
//! value-construction calls and collect well-formed JSON text, either from
//! its internal buffer or through a print callback.
//!
//! ```
//! use johanson::JsonGenerator;
//!
//! let mut gen = JsonGenerator::new();
//! gen.map_open().unwrap();
//! gen.string(b"name").unwrap();
//! gen.string(b"Elvis").unwrap();
//! gen.string(b"age").unwrap();
//! gen.integer(42).unwrap();
//! gen.map_close().unwrap();
//!
//! assert_eq!(gen.buf().unwrap(), br#"{"name":"Elvis","age":42}"#);
//! ```
//!
//! The generator refuses to produce malformed output: map keys must be
//! strings, nothing may follow a complete document, and nesting past 255
//! levels is rejected.
//!
//! ## Parsing into a Serde JSON Value
//!
//! For testing and compatibility reasons, a byte slice can be parsed into
//! a [Serde JSON](https://github.com/serde-rs/json) Value. This needs the
//! `serde_json` feature.
//!
//! ```ignore
//! use johanson::serde_json::from_slice;
//!
//! let value = from_slice(br#"{"name": "Elvis"}"#).unwrap();
//! assert_eq!(value["name"], "Elvis");
//! ```
mod buf;
mod bytestack;
mod encode;
mod generator;
mod lexer;
mod options;
mod parser;
mod token;

#[cfg(feature = "serde_json")]
pub mod serde_json;

pub use encode::unescape;
pub use generator::{GenError, JsonGenerator, MAX_DEPTH};
pub use lexer::{JsonLexer, LexError};
pub use options::{
    JsonGeneratorOptions, JsonGeneratorOptionsBuilder, JsonParserOptions, JsonParserOptionsBuilder,
};
pub use parser::{JsonHandler, JsonParser, ParserError};
pub use token::JsonToken;
