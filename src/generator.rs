//! A validating JSON generator.
//!
//! The generator is a state machine: each value-construction call checks
//! that it is legal in the current state (map keys must be strings, nothing
//! may follow a complete document, nesting is capped), inserts any needed
//! separator and indentation, emits bytes, and advances the state. Output
//! goes either to an internal queryable buffer or to a caller-supplied
//! print callback.

use thiserror::Error;

use crate::buf::Buf;
use crate::encode::{string_encode, utf8_validate};
use crate::options::JsonGeneratorOptions;

/// The maximum nesting depth the generator supports.
pub const MAX_DEPTH: usize = 255;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GenState {
    Start,
    MapStart,
    MapKey,
    MapVal,
    ArrayStart,
    InArray,
    Complete,
    Error,
}

/// An error returned by a generator operation. Misuse errors leave the
/// generator in an error state; every operation after that fails with
/// [`GenError::InErrorState`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenError {
    /// At a point where a map key is expected, an operation other than
    /// [`string()`](JsonGenerator::string) was called
    #[error("map keys must be strings")]
    KeysMustBeStrings,

    /// The maximum generation depth was exceeded; see [`MAX_DEPTH`]
    #[error("maximum generation depth exceeded")]
    MaxDepthExceeded,

    /// An operation was called while in an error state
    #[error("generator is in an error state")]
    InErrorState,

    /// A complete JSON document has already been generated
    #[error("a complete JSON document has been generated")]
    GenerationComplete,

    /// [`double()`](JsonGenerator::double) was passed an invalid floating
    /// point value (infinity or NaN)
    #[error("invalid floating point value (infinity or NaN)")]
    InvalidNumber,

    /// A print callback is installed, so there is no internal buffer to
    /// get
    #[error("output goes to a print callback, there is no internal buffer")]
    NoBuf,

    /// UTF-8 validation is enabled and an invalid string was passed
    #[error("string is not valid UTF8")]
    InvalidString,
}

/// Where generated bytes go: the internal buffer by default, or a caller
/// callback once one is installed.
enum Output<'out> {
    Buffer(Buf),
    Print(Box<dyn FnMut(&[u8]) + 'out>),
}

impl Output<'_> {
    fn print(&mut self, bytes: &[u8]) {
        match self {
            Output::Buffer(buf) => buf.append(bytes),
            Output::Print(f) => f(bytes),
        }
    }
}

/// An incremental JSON generator.
///
/// Drive it with value-construction calls; it emits well-formed JSON text
/// and rejects sequences that could not be well-formed. See the
/// [crate docs](crate) for an example.
pub struct JsonGenerator<'out> {
    options: JsonGeneratorOptions,

    depth: usize,

    /// Current state per depth; the active one is `state[depth]`
    state: [GenState; MAX_DEPTH],

    out: Output<'out>,
}

impl Default for JsonGenerator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'out> JsonGenerator<'out> {
    /// Create a generator with default options, emitting into the internal
    /// buffer.
    pub fn new() -> Self {
        Self::new_with_options(JsonGeneratorOptions::default())
    }

    /// Create a generator using the given [`JsonGeneratorOptions`].
    pub fn new_with_options(options: JsonGeneratorOptions) -> Self {
        JsonGenerator {
            options,
            depth: 0,
            state: [GenState::Start; MAX_DEPTH],
            out: Output::Buffer(Buf::new()),
        }
    }

    /// Send generated bytes to `print` as they are produced, instead of
    /// collecting them in the internal buffer. The internal buffer, along
    /// with anything in it, is discarded.
    pub fn set_print_callback(&mut self, print: impl FnMut(&[u8]) + 'out) {
        self.out = Output::Print(Box::new(print));
    }

    /// Latch the error state and hand back `err`.
    fn fail(&mut self, err: GenError) -> GenError {
        self.state[self.depth] = GenState::Error;
        err
    }

    /// Check that we're not complete or in an error state; in a valid
    /// state to be generating.
    fn ensure_valid_state(&self) -> Result<(), GenError> {
        match self.state[self.depth] {
            GenState::Error => Err(GenError::InErrorState),
            GenState::Complete => Err(GenError::GenerationComplete),
            _ => Ok(()),
        }
    }

    fn ensure_not_key(&mut self) -> Result<(), GenError> {
        if matches!(self.state[self.depth], GenState::MapKey | GenState::MapStart) {
            return Err(self.fail(GenError::KeysMustBeStrings));
        }
        Ok(())
    }

    fn insert_sep(&mut self) {
        match self.state[self.depth] {
            GenState::MapKey | GenState::InArray => {
                self.out.print(b",");
                if self.options.beautify {
                    self.out.print(b"\n");
                }
            }
            GenState::MapVal => {
                self.out.print(b":");
                if self.options.beautify {
                    self.out.print(b" ");
                }
            }
            _ => {}
        }
    }

    fn insert_whitespace(&mut self) {
        if self.options.beautify && self.state[self.depth] != GenState::MapVal {
            for _ in 0..self.depth {
                self.out.print(self.options.indent.as_bytes());
            }
        }
    }

    /// Advance the current state after an atom (or a closed container) has
    /// been appended.
    fn appended_atom(&mut self) {
        let state = &mut self.state[self.depth];
        *state = match *state {
            GenState::Start => GenState::Complete,
            GenState::MapStart | GenState::MapKey => GenState::MapVal,
            GenState::ArrayStart => GenState::InArray,
            GenState::MapVal => GenState::MapKey,
            other => other,
        };
    }

    fn final_newline(&mut self) {
        if self.options.beautify && self.state[self.depth] == GenState::Complete {
            self.out.print(b"\n");
        }
    }

    /// Emit an integer.
    pub fn integer(&mut self, val: i64) -> Result<(), GenError> {
        self.ensure_valid_state()?;
        self.ensure_not_key()?;
        self.insert_sep();
        self.insert_whitespace();
        self.out.print(val.to_string().as_bytes());
        self.appended_atom();
        self.final_newline();
        Ok(())
    }

    /// Emit a floating point number. Infinities and NaN have no JSON form
    /// and are rejected with [`GenError::InvalidNumber`]. The formatted
    /// text always re-parses as a double.
    pub fn double(&mut self, val: f64) -> Result<(), GenError> {
        self.ensure_valid_state()?;
        self.ensure_not_key()?;
        if !val.is_finite() {
            return Err(self.fail(GenError::InvalidNumber));
        }
        self.insert_sep();
        self.insert_whitespace();
        let mut fmt = dtoa::Buffer::new();
        self.out.print(fmt.format(val).as_bytes());
        self.appended_atom();
        self.final_newline();
        Ok(())
    }

    /// Emit an already-formatted number. The caller vouches for the
    /// digits; they are passed through untouched.
    pub fn number(&mut self, val: &[u8]) -> Result<(), GenError> {
        self.ensure_valid_state()?;
        self.ensure_not_key()?;
        self.insert_sep();
        self.insert_whitespace();
        self.out.print(val);
        self.appended_atom();
        self.final_newline();
        Ok(())
    }

    /// Emit a string, quoted and escaped. This is the only operation legal
    /// where a map key is expected.
    pub fn string(&mut self, val: &[u8]) -> Result<(), GenError> {
        self.ensure_valid_state()?;
        if self.options.validate_utf8 && !utf8_validate(val) {
            return Err(self.fail(GenError::InvalidString));
        }
        self.insert_sep();
        self.insert_whitespace();
        self.out.print(b"\"");
        let escape_solidus = self.options.escape_solidus;
        let out = &mut self.out;
        string_encode(|b| out.print(b), val, escape_solidus);
        self.out.print(b"\"");
        self.appended_atom();
        self.final_newline();
        Ok(())
    }

    /// Emit `null`.
    pub fn null(&mut self) -> Result<(), GenError> {
        self.ensure_valid_state()?;
        self.ensure_not_key()?;
        self.insert_sep();
        self.insert_whitespace();
        self.out.print(b"null");
        self.appended_atom();
        self.final_newline();
        Ok(())
    }

    /// Emit `true` or `false`.
    pub fn bool(&mut self, val: bool) -> Result<(), GenError> {
        self.ensure_valid_state()?;
        self.ensure_not_key()?;
        self.insert_sep();
        self.insert_whitespace();
        self.out.print(if val { b"true" as &[u8] } else { b"false" });
        self.appended_atom();
        self.final_newline();
        Ok(())
    }

    /// Open a map. Every entry is a [`string()`](Self::string) key
    /// followed by one value.
    pub fn map_open(&mut self) -> Result<(), GenError> {
        self.ensure_valid_state()?;
        self.ensure_not_key()?;
        self.insert_sep();
        self.insert_whitespace();
        if self.depth + 1 >= MAX_DEPTH {
            return Err(self.fail(GenError::MaxDepthExceeded));
        }
        self.depth += 1;
        self.state[self.depth] = GenState::MapStart;
        self.out.print(b"{");
        if self.options.beautify {
            self.out.print(b"\n");
        }
        Ok(())
    }

    /// Close the innermost open map.
    pub fn map_close(&mut self) -> Result<(), GenError> {
        self.ensure_valid_state()?;
        if self.depth == 0 {
            return Err(GenError::GenerationComplete);
        }
        // drop to the parent level first so separator bookkeeping and
        // indentation happen there
        self.depth -= 1;
        if self.options.beautify {
            self.out.print(b"\n");
        }
        self.appended_atom();
        self.insert_whitespace();
        self.out.print(b"}");
        self.final_newline();
        Ok(())
    }

    /// Open an array.
    pub fn array_open(&mut self) -> Result<(), GenError> {
        self.ensure_valid_state()?;
        self.ensure_not_key()?;
        self.insert_sep();
        self.insert_whitespace();
        if self.depth + 1 >= MAX_DEPTH {
            return Err(self.fail(GenError::MaxDepthExceeded));
        }
        self.depth += 1;
        self.state[self.depth] = GenState::ArrayStart;
        self.out.print(b"[");
        if self.options.beautify {
            self.out.print(b"\n");
        }
        Ok(())
    }

    /// Close the innermost open array.
    pub fn array_close(&mut self) -> Result<(), GenError> {
        self.ensure_valid_state()?;
        if self.depth == 0 {
            return Err(GenError::GenerationComplete);
        }
        self.depth -= 1;
        if self.options.beautify {
            self.out.print(b"\n");
        }
        self.appended_atom();
        self.insert_whitespace();
        self.out.print(b"]");
        self.final_newline();
        Ok(())
    }

    /// The bytes generated so far. Fails with [`GenError::NoBuf`] when a
    /// print callback is installed.
    pub fn buf(&self) -> Result<&[u8], GenError> {
        match &self.out {
            Output::Buffer(buf) => Ok(buf.data()),
            Output::Print(_) => Err(GenError::NoBuf),
        }
    }

    /// Empty the internal buffer. Does nothing when a print callback is
    /// installed.
    pub fn clear(&mut self) {
        if let Output::Buffer(buf) = &mut self.out {
            buf.clear();
        }
    }

    /// Make the generator ready for a new document: depth and states are
    /// reset, and `sep`, if given, is emitted between the old output and
    /// the new. The internal buffer is not cleared.
    pub fn reset(&mut self, sep: Option<&str>) {
        self.depth = 0;
        self.state = [GenState::Start; MAX_DEPTH];
        if let Some(sep) = sep {
            self.out.print(sep.as_bytes());
        }
    }
}
