/// Options for [`JsonParser`](crate::JsonParser). Use
/// [`JsonParserOptionsBuilder`] to create instances of this struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonParserOptions {
    /// `true` if `//` and `/* */` comments are skipped over
    pub(crate) allow_comments: bool,

    /// `true` if string contents are checked for valid UTF-8
    pub(crate) validate_strings: bool,

    /// `true` if bytes after a complete value are left unexamined instead
    /// of being a parse error
    pub(crate) allow_trailing_garbage: bool,

    /// `true` if the input may be a whitespace-separated stream of
    /// top-level values
    pub(crate) allow_multiple_values: bool,

    /// `true` if end of input in the middle of a value is acceptable
    pub(crate) allow_partial_values: bool,
}

impl Default for JsonParserOptions {
    /// Returns default JSON parser options: strict RFC 4627 input, UTF-8
    /// validation on.
    fn default() -> Self {
        Self {
            allow_comments: false,
            validate_strings: true,
            allow_trailing_garbage: false,
            allow_multiple_values: false,
            allow_partial_values: false,
        }
    }
}

impl JsonParserOptions {
    /// Returns `true` if comments are skipped over.
    pub fn allow_comments(&self) -> bool {
        self.allow_comments
    }

    /// Returns `true` if string contents are checked for valid UTF-8.
    pub fn validate_strings(&self) -> bool {
        self.validate_strings
    }

    /// Returns `true` if bytes after a complete value are tolerated.
    pub fn allow_trailing_garbage(&self) -> bool {
        self.allow_trailing_garbage
    }

    /// Returns `true` if multiple top-level values are accepted.
    pub fn allow_multiple_values(&self) -> bool {
        self.allow_multiple_values
    }

    /// Returns `true` if a truncated value at end of input is accepted.
    pub fn allow_partial_values(&self) -> bool {
        self.allow_partial_values
    }
}

/// A builder for [`JsonParserOptions`]
///
/// ```rust
/// use johanson::{JsonParser, JsonParserOptionsBuilder};
///
/// let mut parser = JsonParser::new_with_options(
///     (),
///     JsonParserOptionsBuilder::default()
///         .with_allow_comments(true)
///         .build(),
/// );
/// assert!(parser.parse(b"/* a comment */ [1, 2]").is_ok());
/// ```
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonParserOptionsBuilder {
    options: JsonParserOptions,
}

impl JsonParserOptionsBuilder {
    /// Skip `//` line comments and `/* */` block comments instead of
    /// treating them as lexical errors.
    pub fn with_allow_comments(mut self, allow_comments: bool) -> Self {
        self.options.allow_comments = allow_comments;
        self
    }

    /// Check that string contents are valid UTF-8. Enabled by default;
    /// turning it off makes string scanning cheaper and delivers raw bytes
    /// to the callbacks.
    pub fn with_validate_strings(mut self, validate_strings: bool) -> Self {
        self.options.validate_strings = validate_strings;
        self
    }

    /// Stop verifying that input past a complete top-level value is
    /// whitespace only.
    pub fn with_allow_trailing_garbage(mut self, allow_trailing_garbage: bool) -> Self {
        self.options.allow_trailing_garbage = allow_trailing_garbage;
        self
    }

    /// Accept a stream of whitespace-separated top-level values, e.g.
    /// `1 2 ["a"] {"b":3}`, delivering callbacks for each in turn.
    pub fn with_allow_multiple_values(mut self, allow_multiple_values: bool) -> Self {
        self.options.allow_multiple_values = allow_multiple_values;
        self
    }

    /// Treat end of input in the middle of a value as success instead of a
    /// "premature EOF" error in [`finish()`](crate::JsonParser::finish).
    pub fn with_allow_partial_values(mut self, allow_partial_values: bool) -> Self {
        self.options.allow_partial_values = allow_partial_values;
        self
    }

    /// Create a new [`JsonParserOptions`] object
    pub fn build(self) -> JsonParserOptions {
        self.options
    }
}

/// Options for [`JsonGenerator`](crate::JsonGenerator). Use
/// [`JsonGeneratorOptionsBuilder`] to create instances of this struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonGeneratorOptions {
    /// `true` if output is indented for human readability
    pub(crate) beautify: bool,

    /// The string used for one level of indentation when beautifying
    pub(crate) indent: String,

    /// `true` if strings passed to the generator are checked for valid
    /// UTF-8 before being emitted
    pub(crate) validate_utf8: bool,

    /// `true` if the forward solidus `/` is escaped as `\/`
    pub(crate) escape_solidus: bool,
}

impl Default for JsonGeneratorOptions {
    /// Returns default generator options: compact output, no validation,
    /// two-space indent once beautifying is enabled.
    fn default() -> Self {
        Self {
            beautify: false,
            indent: "  ".to_string(),
            validate_utf8: false,
            escape_solidus: false,
        }
    }
}

impl JsonGeneratorOptions {
    /// Returns `true` if output is beautified.
    pub fn beautify(&self) -> bool {
        self.beautify
    }

    /// Returns the indentation string.
    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// Returns `true` if strings are validated before being emitted.
    pub fn validate_utf8(&self) -> bool {
        self.validate_utf8
    }

    /// Returns `true` if `/` is escaped in output.
    pub fn escape_solidus(&self) -> bool {
        self.escape_solidus
    }
}

/// A builder for [`JsonGeneratorOptions`]
///
/// ```rust
/// use johanson::{JsonGenerator, JsonGeneratorOptionsBuilder};
///
/// let mut gen = JsonGenerator::new_with_options(
///     JsonGeneratorOptionsBuilder::default()
///         .with_beautify(true)
///         .with_indent("\t")
///         .build(),
/// );
/// gen.array_open().unwrap();
/// gen.bool(true).unwrap();
/// gen.array_close().unwrap();
/// assert_eq!(gen.buf().unwrap(), b"[\n\ttrue\n]\n");
/// ```
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct JsonGeneratorOptionsBuilder {
    options: JsonGeneratorOptions,
}

impl JsonGeneratorOptionsBuilder {
    /// Generate indented (beautiful) output.
    pub fn with_beautify(mut self, beautify: bool) -> Self {
        self.options.beautify = beautify;
        self
    }

    /// Set the string used for one level of indentation when beautifying,
    /// maybe `"\t"` or some number of spaces. The default is two spaces.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.options.indent = indent.into();
        self
    }

    /// Check that strings passed to
    /// [`string()`](crate::JsonGenerator::string) are valid UTF-8. The
    /// generator does not validate by default.
    pub fn with_validate_utf8(mut self, validate_utf8: bool) -> Self {
        self.options.validate_utf8 = validate_utf8;
        self
    }

    /// Always escape the forward solidus `/`. JSON does not require it; by
    /// default it is passed through to save bytes.
    pub fn with_escape_solidus(mut self, escape_solidus: bool) -> Self {
        self.options.escape_solidus = escape_solidus;
        self
    }

    /// Create a new [`JsonGeneratorOptions`] object
    pub fn build(self) -> JsonGeneratorOptions {
        self.options
    }
}
