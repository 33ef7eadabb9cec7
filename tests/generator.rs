use johanson::{GenError, JsonGenerator, JsonGeneratorOptionsBuilder, MAX_DEPTH};

#[test]
fn compact_object() {
    let mut gen = JsonGenerator::new();
    gen.map_open().unwrap();
    gen.string(b"name").unwrap();
    gen.string(b"Elvis").unwrap();
    gen.string(b"albums").unwrap();
    gen.array_open().unwrap();
    gen.integer(24).unwrap();
    gen.double(1.5).unwrap();
    gen.bool(true).unwrap();
    gen.null().unwrap();
    gen.array_close().unwrap();
    gen.map_close().unwrap();

    assert_eq!(
        gen.buf().unwrap(),
        br#"{"name":"Elvis","albums":[24,1.5,true,null]}"#
    );
}

#[test]
fn beautified_map() {
    let mut gen = JsonGenerator::new_with_options(
        JsonGeneratorOptionsBuilder::default()
            .with_beautify(true)
            .build(),
    );
    gen.map_open().unwrap();
    gen.string(b"k").unwrap();
    gen.integer(42).unwrap();
    gen.map_close().unwrap();

    assert_eq!(gen.buf().unwrap(), b"{\n  \"k\": 42\n}\n");
}

#[test]
fn beautified_nesting() {
    let mut gen = JsonGenerator::new_with_options(
        JsonGeneratorOptionsBuilder::default()
            .with_beautify(true)
            .build(),
    );
    gen.map_open().unwrap();
    gen.string(b"a").unwrap();
    gen.array_open().unwrap();
    gen.integer(1).unwrap();
    gen.integer(2).unwrap();
    gen.array_close().unwrap();
    gen.map_close().unwrap();

    assert_eq!(
        gen.buf().unwrap(),
        b"{\n  \"a\": [\n    1,\n    2\n  ]\n}\n"
    );
}

#[test]
fn custom_indent() {
    let mut gen = JsonGenerator::new_with_options(
        JsonGeneratorOptionsBuilder::default()
            .with_beautify(true)
            .with_indent("\t")
            .build(),
    );
    gen.array_open().unwrap();
    gen.string(b"x").unwrap();
    gen.array_close().unwrap();

    assert_eq!(gen.buf().unwrap(), b"[\n\t\"x\"\n]\n");
}

#[test]
fn scalar_document() {
    let mut gen = JsonGenerator::new();
    gen.integer(7).unwrap();
    assert_eq!(gen.buf().unwrap(), b"7");

    // the document is complete, nothing more may follow
    assert_eq!(gen.integer(8), Err(GenError::GenerationComplete));
}

#[test]
fn double_formatting_reparses() {
    let mut gen = JsonGenerator::new();
    gen.array_open().unwrap();
    gen.double(42.0).unwrap();
    gen.double(-0.25).unwrap();
    gen.double(1e300).unwrap();
    gen.array_close().unwrap();

    let text = std::str::from_utf8(gen.buf().unwrap()).unwrap().to_string();
    // every element must contain a '.' or an exponent so it reads back as
    // a double
    for elem in text[1..text.len() - 1].split(',') {
        assert!(
            elem.contains('.') || elem.contains('e') || elem.contains('E'),
            "element {elem} would re-parse as an integer"
        );
        assert!(elem.parse::<f64>().is_ok());
    }
    assert!(text.starts_with("[42.0,-0.25,"));
}

#[test]
fn non_finite_doubles_are_rejected() {
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let mut gen = JsonGenerator::new();
        assert_eq!(gen.double(bad), Err(GenError::InvalidNumber));
        // the failure latches
        assert_eq!(gen.integer(1), Err(GenError::InErrorState));
    }
}

#[test]
fn raw_number_passthrough() {
    let mut gen = JsonGenerator::new();
    gen.array_open().unwrap();
    gen.number(b"123456789012345678901234567890").unwrap();
    gen.number(b"1.5e-300").unwrap();
    gen.array_close().unwrap();
    assert_eq!(
        gen.buf().unwrap(),
        b"[123456789012345678901234567890,1.5e-300]"
    );
}

#[test]
fn string_escaping() {
    let mut gen = JsonGenerator::new();
    gen.string(b"a\"b\\c\nd\x01e").unwrap();
    assert_eq!(gen.buf().unwrap(), br#""a\"b\\c\nd\u0001e""#);
}

#[test]
fn escape_solidus_option() {
    let mut gen = JsonGenerator::new();
    gen.string(b"a/b").unwrap();
    assert_eq!(gen.buf().unwrap(), br#""a/b""#);

    let mut gen = JsonGenerator::new_with_options(
        JsonGeneratorOptionsBuilder::default()
            .with_escape_solidus(true)
            .build(),
    );
    gen.string(b"a/b").unwrap();
    assert_eq!(gen.buf().unwrap(), br#""a\/b""#);
}

#[test]
fn utf8_validation_option() {
    // off by default: raw bytes pass through
    let mut gen = JsonGenerator::new();
    gen.string(b"a\xFFb").unwrap();

    let mut gen = JsonGenerator::new_with_options(
        JsonGeneratorOptionsBuilder::default()
            .with_validate_utf8(true)
            .build(),
    );
    assert_eq!(gen.string(b"a\xFFb"), Err(GenError::InvalidString));
    assert_eq!(gen.null(), Err(GenError::InErrorState));
}

#[test]
fn keys_must_be_strings() {
    let mut gen = JsonGenerator::new();
    gen.map_open().unwrap();
    assert_eq!(gen.integer(1), Err(GenError::KeysMustBeStrings));
    // any further operation reports the latched error state
    assert_eq!(gen.string(b"k"), Err(GenError::InErrorState));
    assert_eq!(gen.map_close(), Err(GenError::InErrorState));
}

#[test]
fn key_value_alternation() {
    let mut gen = JsonGenerator::new();
    gen.map_open().unwrap();
    gen.string(b"a").unwrap();
    // a value position accepts any kind
    gen.map_open().unwrap();
    gen.string(b"b").unwrap();
    gen.bool(false).unwrap();
    gen.map_close().unwrap();
    gen.map_close().unwrap();
    assert_eq!(gen.buf().unwrap(), br#"{"a":{"b":false}}"#);
}

#[test]
fn close_at_top_level() {
    let mut gen = JsonGenerator::new();
    assert_eq!(gen.map_close(), Err(GenError::GenerationComplete));
    assert_eq!(gen.array_close(), Err(GenError::GenerationComplete));
    // that is not a latched error; generation can still proceed
    gen.integer(1).unwrap();
    assert_eq!(gen.buf().unwrap(), b"1");
}

#[test]
fn depth_cap() {
    let mut gen = JsonGenerator::new();
    for _ in 0..MAX_DEPTH - 1 {
        gen.array_open().unwrap();
    }
    assert_eq!(gen.array_open(), Err(GenError::MaxDepthExceeded));
    assert_eq!(gen.integer(1), Err(GenError::InErrorState));
}

#[test]
fn print_callback_sink() {
    let mut out: Vec<u8> = Vec::new();
    {
        let mut gen = JsonGenerator::new();
        gen.set_print_callback(|bytes| out.extend_from_slice(bytes));
        gen.array_open().unwrap();
        gen.integer(1).unwrap();
        gen.string(b"x").unwrap();
        gen.array_close().unwrap();

        // no internal buffer to query with an external sink
        assert_eq!(gen.buf().unwrap_err(), GenError::NoBuf);
        gen.clear();
    }
    assert_eq!(out, br#"[1,"x"]"#);
}

#[test]
fn clear_resets_buffer_only() {
    let mut gen = JsonGenerator::new();
    gen.integer(1).unwrap();
    gen.clear();
    assert_eq!(gen.buf().unwrap(), b"");
    // the state machine still considers the document complete
    assert_eq!(gen.integer(2), Err(GenError::GenerationComplete));
}

#[test]
fn reset_starts_a_new_document() {
    let mut gen = JsonGenerator::new();
    gen.integer(1).unwrap();
    gen.reset(Some("\n"));
    gen.integer(2).unwrap();
    // the buffer is kept across the reset, with the separator in between
    assert_eq!(gen.buf().unwrap(), b"1\n2");

    gen.reset(None);
    gen.bool(true).unwrap();
    assert_eq!(gen.buf().unwrap(), b"1\n2true");
}
