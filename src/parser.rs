//! A pushdown JSON parser over the chunk-tolerant lexer.
//!
//! The parser keeps its automaton on an explicit state stack instead of the
//! call stack, so arbitrarily deep nesting costs heap memory, not stack
//! frames. Tokens are pulled from the lexer one at a time; each token is
//! dispatched against the current top of the stack, callbacks fire in
//! document order, and container states are pushed and popped as maps and
//! arrays open and close.

use thiserror::Error;

use crate::buf::Buf;
use crate::bytestack::ByteStack;
use crate::encode::string_decode;
use crate::lexer::{JsonLexer, LexError};
use crate::options::JsonParserOptions;
use crate::token::JsonToken;

const CLIENT_CANCELLED: &str = "client cancelled parse via callback return value";

/// The parser's pushdown states. Stack depth equals the nesting depth of
/// the JSON text plus one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
enum State {
    Start,
    ParseComplete,
    ParseError,
    LexicalError,
    MapStart,
    MapSep,
    MapNeedVal,
    MapGotVal,
    MapNeedKey,
    ArrayStart,
    ArrayGotVal,
    ArrayNeedVal,
    GotValue,
}

/// An error that terminates a parse. Once returned, the parser stays in the
/// corresponding error state and every further [`parse()`](JsonParser::parse)
/// or [`finish()`](JsonParser::finish) call fails again.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserError {
    /// A callback returned `false`
    #[error("client cancelled parse via callback return value")]
    Cancelled,

    /// The text violates the JSON grammar
    #[error("{0}")]
    Parse(&'static str),

    /// The lexer found malformed input
    #[error("{0}")]
    Lexical(#[from] LexError),
}

/// The callbacks driven by [`JsonParser`]. All methods default to doing
/// nothing and returning `true`; implement the ones you care about.
/// Returning `false` from any of them cancels the parse with
/// [`ParserError::Cancelled`].
///
/// String, key and number payloads are borrowed slices that are only valid
/// for the duration of the call. When string validation is enabled (the
/// default) string and key bytes are guaranteed to be valid UTF-8.
pub trait JsonHandler {
    /// Deliver every numeric token verbatim to
    /// [`on_number()`](Self::on_number) instead of converting it. Numbers
    /// of arbitrary precision survive this way; overflow detection is then
    /// the handler's business.
    fn raw_numbers(&self) -> bool {
        false
    }

    /// A `null` value.
    fn on_null(&mut self) -> bool {
        true
    }

    /// A `true` or `false` value.
    fn on_bool(&mut self, _val: bool) -> bool {
        true
    }

    /// A number without fraction or exponent. Not called when
    /// [`raw_numbers()`](Self::raw_numbers) is `true`.
    fn on_integer(&mut self, _val: i64) -> bool {
        true
    }

    /// A number with a fraction or exponent. Not called when
    /// [`raw_numbers()`](Self::raw_numbers) is `true`.
    fn on_double(&mut self, _val: f64) -> bool {
        true
    }

    /// The unconverted text of a numeric token. Only called when
    /// [`raw_numbers()`](Self::raw_numbers) is `true`.
    fn on_number(&mut self, _text: &[u8]) -> bool {
        true
    }

    /// A string value, unescaped.
    fn on_string(&mut self, _val: &[u8]) -> bool {
        true
    }

    /// The start of a map (`{`).
    fn on_start_map(&mut self) -> bool {
        true
    }

    /// A map key, unescaped.
    fn on_map_key(&mut self, _key: &[u8]) -> bool {
        true
    }

    /// The end of a map (`}`).
    fn on_end_map(&mut self) -> bool {
        true
    }

    /// The start of an array (`[`).
    fn on_start_array(&mut self) -> bool {
        true
    }

    /// The end of an array (`]`).
    fn on_end_array(&mut self) -> bool {
        true
    }
}

/// The no-op handler: parse purely for validation.
impl JsonHandler for () {}

/// Cancel the parse on behalf of a callback that returned `false`.
fn cancel(
    state_stack: &mut ByteStack<State>,
    parse_error: &mut Option<&'static str>,
) -> Result<(), ParserError> {
    state_stack.set(State::ParseError);
    *parse_error = Some(CLIENT_CANCELLED);
    Err(ParserError::Cancelled)
}

/// An incremental, event-based JSON parser.
///
/// Feed it chunks of JSON text with [`parse()`](Self::parse), split
/// anywhere (even mid-token), and finish with [`finish()`](Self::finish).
/// Syntactic elements are delivered to the owned [`JsonHandler`] in
/// document order.
pub struct JsonParser<H> {
    pub handler: H,

    options: JsonParserOptions,

    lexer: JsonLexer,

    /// Scratch space for unescaping strings before they reach the handler
    decode_buf: Buf,

    /// The pushdown automaton
    state_stack: ByteStack<State>,

    /// Bytes consumed from the most recent chunk; on error it points into
    /// the offending region
    bytes_consumed: usize,

    /// Static message describing the current parse error, if any
    parse_error: Option<&'static str>,
}

impl<H> JsonParser<H>
where
    H: JsonHandler,
{
    /// Create a new JSON parser delivering to the given handler, with
    /// default options.
    pub fn new(handler: H) -> Self {
        Self::new_with_options(handler, JsonParserOptions::default())
    }

    /// Create a new JSON parser using the given [`JsonHandler`] and
    /// [`JsonParserOptions`].
    pub fn new_with_options(handler: H, options: JsonParserOptions) -> Self {
        let mut state_stack = ByteStack::new();
        state_stack.push(State::Start);
        JsonParser {
            handler,
            options,
            lexer: JsonLexer::new(options.allow_comments, options.validate_strings),
            decode_buf: Buf::new(),
            state_stack,
            bytes_consumed: 0,
            parse_error: None,
        }
    }

    /// How many bytes of the most recent chunk have been consumed. After a
    /// successful [`parse()`](Self::parse) this equals the chunk length;
    /// after an error it points into the offending region.
    pub fn bytes_consumed(&self) -> usize {
        self.bytes_consumed
    }

    /// The error described by the current lexer state.
    fn lexical_error(lexer: &JsonLexer) -> ParserError {
        ParserError::Lexical(lexer.error().unwrap_or(LexError::InvalidChar))
    }

    /// Parse one chunk of JSON text. Returns `Ok` when the chunk was
    /// consumed, which includes the case where it ended in the middle of a
    /// token; the next call resumes there.
    pub fn parse(&mut self, chunk: &[u8]) -> Result<(), ParserError> {
        let JsonParser {
            handler,
            options,
            lexer,
            decode_buf,
            state_stack,
            bytes_consumed,
            parse_error,
        } = self;
        let offset = bytes_consumed;
        *offset = 0;

        loop {
            match state_stack.current() {
                State::ParseComplete => {
                    if options.allow_multiple_values {
                        state_stack.set(State::GotValue);
                        continue;
                    }
                    if !options.allow_trailing_garbage && *offset != chunk.len() {
                        let (tok, _) = lexer.lex(chunk, offset);
                        if tok != JsonToken::Eof {
                            state_stack.set(State::ParseError);
                            *parse_error = Some("trailing garbage");
                        }
                        continue;
                    }
                    return Ok(());
                }

                State::LexicalError => {
                    return Err(Self::lexical_error(lexer));
                }

                State::ParseError => {
                    return Err(ParserError::Parse(parse_error.unwrap_or("parse error")));
                }

                // The value-expecting states. For maps and arrays the state
                // at this depth is advanced first, then the state of the
                // next depth is pushed; anything other than `Start` wants
                // pushing.
                State::Start
                | State::GotValue
                | State::MapNeedVal
                | State::ArrayNeedVal
                | State::ArrayStart => {
                    let mut state_to_push = State::Start;

                    let (tok, raw) = lexer.lex(chunk, offset);
                    let raw_len = raw.len();

                    match tok {
                        JsonToken::Eof => return Ok(()),
                        JsonToken::Error => {
                            state_stack.set(State::LexicalError);
                            continue;
                        }
                        JsonToken::String => {
                            if !handler.on_string(raw) {
                                return cancel(state_stack, parse_error);
                            }
                        }
                        JsonToken::StringWithEscapes => {
                            decode_buf.clear();
                            string_decode(decode_buf, raw);
                            if !handler.on_string(decode_buf.data()) {
                                return cancel(state_stack, parse_error);
                            }
                        }
                        JsonToken::Bool => {
                            if !handler.on_bool(raw[0] == b't') {
                                return cancel(state_stack, parse_error);
                            }
                        }
                        JsonToken::Null => {
                            if !handler.on_null() {
                                return cancel(state_stack, parse_error);
                            }
                        }
                        JsonToken::LeftBrace => {
                            if !handler.on_start_map() {
                                return cancel(state_stack, parse_error);
                            }
                            state_to_push = State::MapStart;
                        }
                        JsonToken::LeftBracket => {
                            if !handler.on_start_array() {
                                return cancel(state_stack, parse_error);
                            }
                            state_to_push = State::ArrayStart;
                        }
                        JsonToken::Integer => {
                            if handler.raw_numbers() {
                                if !handler.on_number(raw) {
                                    return cancel(state_stack, parse_error);
                                }
                            } else {
                                match btoi::btoi::<i64>(raw) {
                                    Ok(i) => {
                                        if !handler.on_integer(i) {
                                            return cancel(state_stack, parse_error);
                                        }
                                    }
                                    Err(_) => {
                                        // the lexer vouched for the digits,
                                        // so this can only be overflow
                                        state_stack.set(State::ParseError);
                                        *parse_error = Some("integer overflow");
                                        // try to restore the error offset
                                        if *offset >= raw_len {
                                            *offset -= raw_len;
                                        } else {
                                            *offset = 0;
                                        }
                                        continue;
                                    }
                                }
                            }
                        }
                        JsonToken::Double => {
                            if handler.raw_numbers() {
                                if !handler.on_number(raw) {
                                    return cancel(state_stack, parse_error);
                                }
                            } else {
                                let d = std::str::from_utf8(raw)
                                    .ok()
                                    .and_then(|s| s.parse::<f64>().ok());
                                match d {
                                    Some(d) if d.is_finite() => {
                                        if !handler.on_double(d) {
                                            return cancel(state_stack, parse_error);
                                        }
                                    }
                                    _ => {
                                        state_stack.set(State::ParseError);
                                        *parse_error =
                                            Some("numeric (floating point) overflow");
                                        if *offset >= raw_len {
                                            *offset -= raw_len;
                                        } else {
                                            *offset = 0;
                                        }
                                        continue;
                                    }
                                }
                            }
                        }
                        JsonToken::RightBracket => {
                            // `]` closes an empty array; at any other point
                            // in a value position it is an error token
                            if state_stack.current() == State::ArrayStart {
                                if !handler.on_end_array() {
                                    return cancel(state_stack, parse_error);
                                }
                                state_stack.pop();
                                continue;
                            }
                            state_stack.set(State::ParseError);
                            *parse_error = Some("unallowed token at this point in JSON text");
                            continue;
                        }
                        JsonToken::Colon | JsonToken::Comma | JsonToken::RightBrace => {
                            state_stack.set(State::ParseError);
                            *parse_error = Some("unallowed token at this point in JSON text");
                            continue;
                        }
                        JsonToken::Comment => {
                            state_stack.set(State::ParseError);
                            *parse_error = Some("invalid token, internal error");
                            continue;
                        }
                    }

                    // got a value; the transition depends on the state
                    // we're in
                    match state_stack.current() {
                        State::Start | State::GotValue => state_stack.set(State::ParseComplete),
                        State::MapNeedVal => state_stack.set(State::MapGotVal),
                        _ => state_stack.set(State::ArrayGotVal),
                    }
                    if state_to_push != State::Start {
                        state_stack.push(state_to_push);
                    }
                    continue;
                }

                // The only difference between these two states is that in
                // MapStart a `}` is valid, whereas in MapNeedKey a comma
                // has been parsed and a string key must follow.
                State::MapStart | State::MapNeedKey => {
                    let (tok, raw) = lexer.lex(chunk, offset);
                    match tok {
                        JsonToken::Eof => return Ok(()),
                        JsonToken::Error => {
                            state_stack.set(State::LexicalError);
                            continue;
                        }
                        JsonToken::String => {
                            if !handler.on_map_key(raw) {
                                return cancel(state_stack, parse_error);
                            }
                            state_stack.set(State::MapSep);
                            continue;
                        }
                        JsonToken::StringWithEscapes => {
                            decode_buf.clear();
                            string_decode(decode_buf, raw);
                            if !handler.on_map_key(decode_buf.data()) {
                                return cancel(state_stack, parse_error);
                            }
                            state_stack.set(State::MapSep);
                            continue;
                        }
                        JsonToken::RightBrace
                            if state_stack.current() == State::MapStart =>
                        {
                            if !handler.on_end_map() {
                                return cancel(state_stack, parse_error);
                            }
                            state_stack.pop();
                            continue;
                        }
                        _ => {
                            state_stack.set(State::ParseError);
                            *parse_error = Some("invalid object key (must be a string)");
                            continue;
                        }
                    }
                }

                State::MapSep => {
                    let (tok, _) = lexer.lex(chunk, offset);
                    match tok {
                        JsonToken::Colon => {
                            state_stack.set(State::MapNeedVal);
                            continue;
                        }
                        JsonToken::Eof => return Ok(()),
                        JsonToken::Error => {
                            state_stack.set(State::LexicalError);
                            continue;
                        }
                        _ => {
                            state_stack.set(State::ParseError);
                            *parse_error =
                                Some("object key and value must be separated by a colon (':')");
                            continue;
                        }
                    }
                }

                State::MapGotVal => {
                    let (tok, raw) = lexer.lex(chunk, offset);
                    let raw_len = raw.len();
                    match tok {
                        JsonToken::RightBrace => {
                            if !handler.on_end_map() {
                                return cancel(state_stack, parse_error);
                            }
                            state_stack.pop();
                            continue;
                        }
                        JsonToken::Comma => {
                            state_stack.set(State::MapNeedKey);
                            continue;
                        }
                        JsonToken::Eof => return Ok(()),
                        JsonToken::Error => {
                            state_stack.set(State::LexicalError);
                            continue;
                        }
                        _ => {
                            state_stack.set(State::ParseError);
                            *parse_error =
                                Some("after key and value, inside map, I expect ',' or '}'");
                            // try to restore the error offset
                            if *offset >= raw_len {
                                *offset -= raw_len;
                            } else {
                                *offset = 0;
                            }
                            continue;
                        }
                    }
                }

                State::ArrayGotVal => {
                    let (tok, _) = lexer.lex(chunk, offset);
                    match tok {
                        JsonToken::RightBracket => {
                            if !handler.on_end_array() {
                                return cancel(state_stack, parse_error);
                            }
                            state_stack.pop();
                            continue;
                        }
                        JsonToken::Comma => {
                            state_stack.set(State::ArrayNeedVal);
                            continue;
                        }
                        JsonToken::Eof => return Ok(()),
                        JsonToken::Error => {
                            state_stack.set(State::LexicalError);
                            continue;
                        }
                        _ => {
                            state_stack.set(State::ParseError);
                            *parse_error = Some("after array element, I expect ',' or ']'");
                            continue;
                        }
                    }
                }
            }
        }
    }

    /// Signal end of input. Flushes any token whose end was ambiguous (a
    /// number at EOF) by parsing a single space, then checks that the parse
    /// actually completed.
    pub fn finish(&mut self) -> Result<(), ParserError> {
        self.parse(b" ")?;

        match self.state_stack.current() {
            State::ParseError => Err(ParserError::Parse(
                self.parse_error.unwrap_or("parse error"),
            )),
            State::LexicalError => Err(Self::lexical_error(&self.lexer)),
            State::GotValue | State::ParseComplete => Ok(()),
            _ => {
                if !self.options.allow_partial_values {
                    self.state_stack.set(State::ParseError);
                    self.parse_error = Some("premature EOF");
                    return Err(ParserError::Parse("premature EOF"));
                }
                Ok(())
            }
        }
    }

    /// Render the current error as a human-readable string of the form
    /// `<kind> error: <text>`. When `verbose` is set, two more lines show
    /// up to 60 characters of `chunk` around
    /// [`bytes_consumed()`](Self::bytes_consumed) with an arrow pointing at
    /// the offending column.
    pub fn error_string(&self, verbose: bool, chunk: &[u8]) -> String {
        let offset = self.bytes_consumed;

        let (error_type, error_text) = match self.state_stack.current() {
            State::ParseError => ("parse", self.parse_error.map(|msg| msg.to_string())),
            State::LexicalError => (
                "lexical",
                Some(
                    self.lexer
                        .error()
                        .unwrap_or(LexError::InvalidChar)
                        .to_string(),
                ),
            ),
            _ => ("unknown", None),
        };

        let mut out = String::new();
        out.push_str(error_type);
        out.push_str(" error");
        if let Some(text) = &error_text {
            out.push_str(": ");
            out.push_str(text);
        }
        out.push('\n');

        // append as many spaces as needed to make the error fall at
        // column 41
        if verbose {
            let spaces_needed = if offset < 30 { 40 - offset } else { 10 };
            let end = (offset + 30).min(chunk.len());
            let start = offset.saturating_sub(30).min(end);

            for _ in 0..spaces_needed {
                out.push(' ');
            }
            for &c in &chunk[start..end] {
                if c != b'\n' && c != b'\r' {
                    out.push(c as char);
                } else {
                    out.push(' ');
                }
            }
            out.push('\n');
            out.push_str("                     (right here) ------^\n");
        }

        out
    }
}
