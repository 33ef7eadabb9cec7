/// All token kinds produced by [`JsonLexer::lex()`](crate::JsonLexer::lex).
///
/// Every kind except [`Error`](JsonToken::Error) and
/// [`Eof`](JsonToken::Eof) carries a byte slice alongside it; for
/// [`String`](JsonToken::String) and
/// [`StringWithEscapes`](JsonToken::StringWithEscapes) the slice is the
/// string's interior, with the surrounding quotes already stripped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JsonToken {
    /// The literal `true` or `false`. The first byte of the slice tells
    /// which.
    Bool,

    /// A `:` separating a map key from its value.
    Colon,

    /// A `,` separating container elements.
    Comma,

    /// The chunk ended before the current token was complete. Feed the next
    /// chunk and lex again; the partial token is kept in the lexer's
    /// reassembly buffer.
    Eof,

    /// A lexical error. Call [`JsonLexer::error()`](crate::JsonLexer::error)
    /// for the cause.
    Error,

    /// A `{` opening a map.
    LeftBrace,

    /// A `[` opening an array.
    LeftBracket,

    /// A `}` closing a map.
    RightBrace,

    /// A `]` closing an array.
    RightBracket,

    /// A number without fraction or exponent.
    Integer,

    /// A number with a fraction or exponent.
    Double,

    /// A string containing no escape sequences; the slice can be used
    /// as-is.
    String,

    /// A string containing at least one escape sequence; the slice must be
    /// run through [`unescape()`](crate::unescape) before use.
    StringWithEscapes,

    /// The literal `null`.
    Null,

    /// A comment. Never returned: the lexer consumes comments internally
    /// (or reports [`Error`](JsonToken::Error) when comments are not
    /// enabled).
    Comment,
}
