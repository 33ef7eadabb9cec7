//! A chunk-tolerant JSON tokenizer.
//!
//! The lexer supports stream parsing: the first bytes of a JSON text can be
//! tokenized before the last bytes are available. The price is that a chunk
//! boundary may fall in the middle of a token. The lexer handles that case
//! transparently with a reassembly buffer and a character-reading
//! abstraction: whenever a chunk ends before the current token does, the
//! partial token's bytes are copied into the buffer and
//! [`JsonToken::Eof`] is returned; the next call reads buffered characters
//! first and then falls through to the new chunk. A token completed this way
//! is reported as a slice into the reassembly buffer instead of the chunk.

use thiserror::Error;

use crate::buf::Buf;
use crate::token::JsonToken;

// Classification bits for the lookup table below.
const VEC: u8 = 0x01; // valid escaped control char ('u' is handled separately)
const IJC: u8 = 0x02; // invalid raw json-string char
const VHC: u8 = 0x04; // valid hex char
const NFP: u8 = 0x08; // needs further processing while string scanning
const NUC: u8 = 0x10; // needs utf8 checking when validation is enabled

#[rustfmt::skip]
const CHAR_LOOKUP_TABLE: [u8; 256] = [
/*00*/ IJC        , IJC        , IJC        , IJC        , IJC        , IJC        , IJC        , IJC        ,
/*08*/ IJC        , IJC        , IJC        , IJC        , IJC        , IJC        , IJC        , IJC        ,
/*10*/ IJC        , IJC        , IJC        , IJC        , IJC        , IJC        , IJC        , IJC        ,
/*18*/ IJC        , IJC        , IJC        , IJC        , IJC        , IJC        , IJC        , IJC        ,

/*20*/ 0          , 0          , NFP|VEC|IJC, 0          , 0          , 0          , 0          , 0          ,
/*28*/ 0          , 0          , 0          , 0          , 0          , 0          , 0          , VEC        ,
/*30*/ VHC        , VHC        , VHC        , VHC        , VHC        , VHC        , VHC        , VHC        ,
/*38*/ VHC        , VHC        , 0          , 0          , 0          , 0          , 0          , 0          ,

/*40*/ 0          , VHC        , VHC        , VHC        , VHC        , VHC        , VHC        , 0          ,
/*48*/ 0          , 0          , 0          , 0          , 0          , 0          , 0          , 0          ,
/*50*/ 0          , 0          , 0          , 0          , 0          , 0          , 0          , 0          ,
/*58*/ 0          , 0          , 0          , 0          , NFP|VEC|IJC, 0          , 0          , 0          ,

/*60*/ 0          , VHC        , VEC|VHC    , VHC        , VHC        , VHC        , VEC|VHC    , 0          ,
/*68*/ 0          , 0          , 0          , 0          , 0          , 0          , VEC        , 0          ,
/*70*/ 0          , 0          , VEC        , 0          , VEC        , 0          , 0          , 0          ,
/*78*/ 0          , 0          , 0          , 0          , 0          , 0          , 0          , 0          ,

       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,

       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,

       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,

       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
       NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        , NUC        ,
];

/// An error encountered while tokenizing JSON text.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    #[error("invalid bytes in UTF8 string.")]
    StringInvalidUtf8,

    #[error("inside a string, '\\' occurs before a character which it may not.")]
    StringInvalidEscapedChar,

    #[error("invalid character inside string.")]
    StringInvalidJsonChar,

    #[error("invalid (non-hex) character occurs after '\\u' inside string.")]
    StringInvalidHexChar,

    #[error("invalid char in json text.")]
    InvalidChar,

    #[error("invalid string in json text.")]
    InvalidString,

    #[error("malformed number, a digit is required after the exponent.")]
    MissingIntegerAfterExponent,

    #[error("malformed number, a digit is required after the decimal point.")]
    MissingIntegerAfterDecimal,

    #[error("malformed number, a digit is required after the minus sign.")]
    MissingIntegerAfterMinus,

    #[error("probable comment found in input text, comments are not enabled.")]
    UnallowedComment,
}

/// Scan a string for interesting characters that might need further review.
/// Returns the number of leading characters that are uninteresting and can
/// be skipped.
fn string_scan(data: &[u8], utf8check: bool) -> usize {
    let mask = IJC | NFP | if utf8check { NUC } else { 0 };
    data.iter()
        .take_while(|&&c| CHAR_LOOKUP_TABLE[usize::from(c)] & mask == 0)
        .count()
}

/// A chunk-tolerant JSON tokenizer.
///
/// Feed it chunks of JSON text through [`lex()`](Self::lex); tokens that
/// straddle chunk boundaries are reassembled transparently. See the module
/// docs for the full model.
#[derive(Debug)]
pub struct JsonLexer {
    /// The overall line and byte offset into the data consumed so far
    line_off: usize,
    char_off: usize,

    error: Option<LexError>,

    /// Holds the partial token when a chunk ends mid-token
    buf: Buf,

    /// Read cursor into `buf` while buffered characters are served back
    buf_off: usize,

    /// Are we using the reassembly buffer?
    buf_in_use: bool,

    allow_comments: bool,
    validate_utf8: bool,
}

impl JsonLexer {
    /// Create a new lexer. `allow_comments` enables `//` and `/* */`
    /// comments; `validate_utf8` makes the lexer check bytes with the high
    /// bit set inside strings.
    pub fn new(allow_comments: bool, validate_utf8: bool) -> Self {
        JsonLexer {
            line_off: 0,
            char_off: 0,
            error: None,
            buf: Buf::new(),
            buf_off: 0,
            buf_in_use: false,
            allow_comments,
            validate_utf8,
        }
    }

    /// The error behind the most recent [`JsonToken::Error`].
    pub fn error(&self) -> Option<LexError> {
        self.error
    }

    /// Number of newlines consumed so far.
    pub fn current_line(&self) -> usize {
        self.line_off
    }

    /// Number of chunk bytes consumed so far.
    pub fn current_char(&self) -> usize {
        self.char_off
    }

    /// Pull the next character, preferring the reassembly buffer over the
    /// live chunk.
    fn read_chr(&mut self, chunk: &[u8], offset: &mut usize) -> u8 {
        if self.buf_in_use && !self.buf.is_empty() && self.buf_off < self.buf.len() {
            let c = self.buf.data()[self.buf_off];
            self.buf_off += 1;
            c
        } else {
            let c = chunk[*offset];
            *offset += 1;
            c
        }
    }

    /// Rewind the most recent read.
    fn unread_chr(&mut self, offset: &mut usize) {
        if *offset > 0 {
            *offset -= 1;
        } else {
            self.buf_off -= 1;
        }
    }

    /// Process a variable-length UTF-8 encoded codepoint whose first byte
    /// is `chr`.
    ///
    /// Returns [`JsonToken::String`] if a valid character was consumed,
    /// [`JsonToken::Eof`] if the chunk ended before validation could
    /// complete, and [`JsonToken::Error`] on invalid UTF-8.
    fn utf8_char(&mut self, chunk: &[u8], offset: &mut usize, chr: u8) -> JsonToken {
        let continuations = if chr <= 0x7F {
            return JsonToken::String;
        } else if chr >> 5 == 0x6 {
            1
        } else if chr >> 4 == 0x0E {
            2
        } else if chr >> 3 == 0x1E {
            3
        } else {
            return JsonToken::Error;
        };
        for _ in 0..continuations {
            if *offset >= chunk.len() {
                return JsonToken::Eof;
            }
            let c = self.read_chr(chunk, offset);
            if c >> 6 != 0x2 {
                return JsonToken::Error;
            }
        }
        JsonToken::String
    }

    /// Lex a string, `offset` pointing just past the opening quote.
    ///
    /// Returns [`JsonToken::String`] (upgraded to
    /// [`JsonToken::StringWithEscapes`] when any escape was seen) with
    /// `offset` just past the terminating quote, [`JsonToken::Eof`] when the
    /// chunk ended first, or [`JsonToken::Error`] with `offset` pointing at
    /// the offending character.
    fn lex_string(&mut self, chunk: &[u8], offset: &mut usize) -> JsonToken {
        let mut tok = JsonToken::Error;
        let mut has_escapes = false;

        'scanning: loop {
            // skip as much of the buffers as possible in one go
            if self.buf_in_use && !self.buf.is_empty() && self.buf_off < self.buf.len() {
                let skip = string_scan(&self.buf.data()[self.buf_off..], self.validate_utf8);
                self.buf_off += skip;
            } else if *offset < chunk.len() {
                let skip = string_scan(&chunk[*offset..], self.validate_utf8);
                *offset += skip;
            }

            if *offset >= chunk.len() {
                tok = JsonToken::Eof;
                break;
            }

            let c = self.read_chr(chunk, offset);

            if c == b'"' {
                // quote terminates
                tok = JsonToken::String;
                break;
            } else if c == b'\\' {
                has_escapes = true;
                if *offset >= chunk.len() {
                    tok = JsonToken::Eof;
                    break;
                }

                let c = self.read_chr(chunk, offset);
                if c == b'u' {
                    for _ in 0..4 {
                        if *offset >= chunk.len() {
                            tok = JsonToken::Eof;
                            break 'scanning;
                        }
                        let c = self.read_chr(chunk, offset);
                        if CHAR_LOOKUP_TABLE[usize::from(c)] & VHC == 0 {
                            // back up to the offending char
                            self.unread_chr(offset);
                            self.error = Some(LexError::StringInvalidHexChar);
                            break 'scanning;
                        }
                    }
                } else if CHAR_LOOKUP_TABLE[usize::from(c)] & VEC == 0 {
                    self.unread_chr(offset);
                    self.error = Some(LexError::StringInvalidEscapedChar);
                    break;
                }
            } else if CHAR_LOOKUP_TABLE[usize::from(c)] & IJC != 0 {
                self.unread_chr(offset);
                self.error = Some(LexError::StringInvalidJsonChar);
                break;
            } else if self.validate_utf8 {
                match self.utf8_char(chunk, offset, c) {
                    JsonToken::Eof => {
                        tok = JsonToken::Eof;
                        break;
                    }
                    JsonToken::Error => {
                        self.error = Some(LexError::StringInvalidUtf8);
                        break;
                    }
                    _ => {}
                }
            }
            // plain character, accept it and move on
        }

        if has_escapes && tok == JsonToken::String {
            tok = JsonToken::StringWithEscapes;
        }
        tok
    }

    /// Lex a number. Numbers are the only tokens that must be read past to
    /// know they are complete, so the final delimiting character is always
    /// read and then unread. There is an ambiguous case for numbers at end
    /// of input; see [`finalize()`](Self::finalize).
    fn lex_number(&mut self, chunk: &[u8], offset: &mut usize) -> JsonToken {
        let mut tok = JsonToken::Integer;

        if *offset >= chunk.len() {
            return JsonToken::Eof;
        }
        let mut c = self.read_chr(chunk, offset);

        // optional leading minus
        if c == b'-' {
            if *offset >= chunk.len() {
                return JsonToken::Eof;
            }
            c = self.read_chr(chunk, offset);
        }

        // a single zero, or a series of digits not starting with zero
        if c == b'0' {
            if *offset >= chunk.len() {
                return JsonToken::Eof;
            }
            c = self.read_chr(chunk, offset);
        } else if c.is_ascii_digit() {
            loop {
                if *offset >= chunk.len() {
                    return JsonToken::Eof;
                }
                c = self.read_chr(chunk, offset);
                if !c.is_ascii_digit() {
                    break;
                }
            }
        } else {
            self.unread_chr(offset);
            self.error = Some(LexError::MissingIntegerAfterMinus);
            return JsonToken::Error;
        }

        // optional fraction (makes this a double)
        if c == b'.' {
            let mut num_rd = 0;

            if *offset >= chunk.len() {
                return JsonToken::Eof;
            }
            c = self.read_chr(chunk, offset);

            while c.is_ascii_digit() {
                num_rd += 1;
                if *offset >= chunk.len() {
                    return JsonToken::Eof;
                }
                c = self.read_chr(chunk, offset);
            }

            if num_rd == 0 {
                self.unread_chr(offset);
                self.error = Some(LexError::MissingIntegerAfterDecimal);
                return JsonToken::Error;
            }
            tok = JsonToken::Double;
        }

        // optional exponent (makes this a double)
        if c == b'e' || c == b'E' {
            if *offset >= chunk.len() {
                return JsonToken::Eof;
            }
            c = self.read_chr(chunk, offset);

            if c == b'+' || c == b'-' {
                if *offset >= chunk.len() {
                    return JsonToken::Eof;
                }
                c = self.read_chr(chunk, offset);
            }

            if c.is_ascii_digit() {
                loop {
                    if *offset >= chunk.len() {
                        return JsonToken::Eof;
                    }
                    c = self.read_chr(chunk, offset);
                    if !c.is_ascii_digit() {
                        break;
                    }
                }
            } else {
                self.unread_chr(offset);
                self.error = Some(LexError::MissingIntegerAfterExponent);
                return JsonToken::Error;
            }
            tok = JsonToken::Double;
        }

        // we always go one byte too far
        self.unread_chr(offset);
        tok
    }

    /// Lex a comment, `offset` pointing just past the opening slash.
    fn lex_comment(&mut self, chunk: &[u8], offset: &mut usize) -> JsonToken {
        if *offset >= chunk.len() {
            return JsonToken::Eof;
        }
        let mut c = self.read_chr(chunk, offset);

        // either a second slash or a star must follow
        if c == b'/' {
            // throw away until end of line
            loop {
                if *offset >= chunk.len() {
                    return JsonToken::Eof;
                }
                c = self.read_chr(chunk, offset);
                if c == b'\n' {
                    break;
                }
            }
        } else if c == b'*' {
            // throw away until the closing star-slash
            loop {
                if *offset >= chunk.len() {
                    return JsonToken::Eof;
                }
                c = self.read_chr(chunk, offset);
                if c == b'*' {
                    if *offset >= chunk.len() {
                        return JsonToken::Eof;
                    }
                    c = self.read_chr(chunk, offset);
                    if c == b'/' {
                        break;
                    }
                    self.unread_chr(offset);
                }
            }
        } else {
            self.error = Some(LexError::InvalidChar);
            return JsonToken::Error;
        }

        JsonToken::Comment
    }

    /// Lex the next token out of `chunk`, starting at `*offset`.
    ///
    /// On return `*offset` points just past the consumed bytes. The
    /// returned slice is the token's text (inside the chunk when the token
    /// fit into it, inside the reassembly buffer when it straddled a chunk
    /// boundary) and stays valid until the next call that touches the
    /// lexer. String tokens have their surrounding quotes stripped.
    pub fn lex<'a>(&'a mut self, chunk: &'a [u8], offset: &mut usize) -> (JsonToken, &'a [u8]) {
        let entry_off = *offset;
        let mut start_off = *offset;
        let mut tok;

        'lexing: loop {
            debug_assert!(*offset <= chunk.len());

            if *offset >= chunk.len() {
                tok = JsonToken::Eof;
                break;
            }

            let c = self.read_chr(chunk, offset);

            match c {
                b'{' => {
                    tok = JsonToken::LeftBrace;
                    break;
                }
                b'}' => {
                    tok = JsonToken::RightBrace;
                    break;
                }
                b'[' => {
                    tok = JsonToken::LeftBracket;
                    break;
                }
                b']' => {
                    tok = JsonToken::RightBracket;
                    break;
                }
                b',' => {
                    tok = JsonToken::Comma;
                    break;
                }
                b':' => {
                    tok = JsonToken::Colon;
                    break;
                }
                b'\t' | b'\x0B' | b'\x0C' | b'\r' | b' ' => {
                    start_off += 1;
                }
                b'\n' => {
                    self.line_off += 1;
                    start_off += 1;
                }
                b't' | b'f' | b'n' => {
                    let (want, lit_tok) = match c {
                        b't' => (&b"rue"[..], JsonToken::Bool),
                        b'f' => (&b"alse"[..], JsonToken::Bool),
                        _ => (&b"ull"[..], JsonToken::Null),
                    };
                    for &want_c in want {
                        if *offset >= chunk.len() {
                            tok = JsonToken::Eof;
                            break 'lexing;
                        }
                        let c = self.read_chr(chunk, offset);
                        if c != want_c {
                            self.unread_chr(offset);
                            self.error = Some(LexError::InvalidString);
                            tok = JsonToken::Error;
                            break 'lexing;
                        }
                    }
                    tok = lit_tok;
                    break;
                }
                b'"' => {
                    tok = self.lex_string(chunk, offset);
                    break;
                }
                b'-' | b'0'..=b'9' => {
                    // number parsing wants to start from the first byte
                    self.unread_chr(offset);
                    tok = self.lex_number(chunk, offset);
                    break;
                }
                b'/' => {
                    // a probable comment
                    if !self.allow_comments {
                        self.unread_chr(offset);
                        self.error = Some(LexError::UnallowedComment);
                        tok = JsonToken::Error;
                        break;
                    }
                    tok = self.lex_comment(chunk, offset);
                    if tok == JsonToken::Comment {
                        // comment consumed, keep scanning from after it
                        self.buf.clear();
                        self.buf_in_use = false;
                        start_off = *offset;
                        continue;
                    }
                    // hit error or eof, bail
                    break;
                }
                _ => {
                    self.error = Some(LexError::InvalidChar);
                    tok = JsonToken::Error;
                    break;
                }
            }
        }

        // When the token straddles chunks, the bytes consumed from this
        // chunk join the reassembly buffer; a completed token is then
        // published from the buffer rather than the chunk.
        let mut report: &[u8] = b"";
        if tok == JsonToken::Eof || self.buf_in_use {
            if !self.buf_in_use {
                self.buf.clear();
            }
            self.buf_in_use = true;
            self.buf.append(&chunk[start_off..*offset]);
            self.buf_off = 0;

            if tok != JsonToken::Eof {
                report = self.buf.data();
                self.buf_in_use = false;
            }
        } else if tok != JsonToken::Error {
            report = &chunk[start_off..*offset];
        }

        // special case for strings: skip the quotes
        if tok == JsonToken::String || tok == JsonToken::StringWithEscapes {
            debug_assert!(report.len() >= 2);
            report = &report[1..report.len() - 1];
        }

        self.char_off += *offset - entry_off;

        (tok, report)
    }

    /// Look at the next token without consuming it: the reassembly state is
    /// saved around an ordinary [`lex()`](Self::lex) call and restored
    /// afterwards.
    pub fn peek(&mut self, chunk: &[u8], offset: usize) -> JsonToken {
        let buf_len = self.buf.len();
        let buf_off = self.buf_off;
        let buf_in_use = self.buf_in_use;
        let line_off = self.line_off;
        let char_off = self.char_off;
        let mut offset = offset;

        let (tok, _) = self.lex(chunk, &mut offset);

        self.buf_off = buf_off;
        self.buf_in_use = buf_in_use;
        self.buf.truncate(buf_len);
        self.line_off = line_off;
        self.char_off = char_off;

        tok
    }

    /// Flush a pending token at end of input by lexing a single space.
    /// Only numbers need this: their end is impossible to detect without
    /// reading past it.
    pub fn finalize(&mut self, offset: usize) -> JsonToken {
        let mut offset = offset;
        let (tok, _) = self.lex(b" ", &mut offset);
        tok
    }
}
