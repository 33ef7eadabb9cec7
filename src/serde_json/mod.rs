//! Parse JSON text into a Serde JSON [`Value`] through the event parser.
//! Exists for testing and compatibility; if all your data fits in memory,
//! you are most likely better off using Serde JSON directly.

use serde_json::{Map, Number, Value};

use crate::{JsonHandler, JsonParser, ParserError};

/// Builds a [`Value`] out of parser callbacks. Containers under
/// construction live on a stack, each remembering the map key it will be
/// inserted under once it closes.
#[derive(Default)]
struct ValueBuilder {
    stack: Vec<(Option<String>, Value)>,
    current_key: Option<String>,
    result: Option<Value>,
}

impl ValueBuilder {
    /// Attach a finished value to the innermost open container, or make it
    /// the result if there is none.
    fn push_value(&mut self, v: Value) -> bool {
        match self.stack.last_mut() {
            Some((_, Value::Object(m))) => match self.current_key.take() {
                Some(key) => {
                    m.insert(key, v);
                    true
                }
                None => false,
            },
            Some((_, Value::Array(a))) => {
                a.push(v);
                true
            }
            Some(_) => false,
            None => {
                self.result = Some(v);
                true
            }
        }
    }

    fn open(&mut self, v: Value) -> bool {
        let key = self.current_key.take();
        self.stack.push((key, v));
        true
    }

    fn close(&mut self) -> bool {
        match self.stack.pop() {
            Some((key, v)) => {
                self.current_key = key;
                self.push_value(v)
            }
            None => false,
        }
    }
}

impl JsonHandler for ValueBuilder {
    fn on_null(&mut self) -> bool {
        self.push_value(Value::Null)
    }

    fn on_bool(&mut self, val: bool) -> bool {
        self.push_value(Value::Bool(val))
    }

    fn on_integer(&mut self, val: i64) -> bool {
        self.push_value(Value::Number(Number::from(val)))
    }

    fn on_double(&mut self, val: f64) -> bool {
        match Number::from_f64(val) {
            Some(n) => self.push_value(Value::Number(n)),
            None => false,
        }
    }

    fn on_string(&mut self, val: &[u8]) -> bool {
        self.push_value(Value::String(String::from_utf8_lossy(val).into_owned()))
    }

    fn on_start_map(&mut self) -> bool {
        self.open(Value::Object(Map::new()))
    }

    fn on_map_key(&mut self, key: &[u8]) -> bool {
        self.current_key = Some(String::from_utf8_lossy(key).into_owned());
        true
    }

    fn on_end_map(&mut self) -> bool {
        self.close()
    }

    fn on_start_array(&mut self) -> bool {
        self.open(Value::Array(vec![]))
    }

    fn on_end_array(&mut self) -> bool {
        self.close()
    }
}

/// Parse a byte slice into a Serde JSON [Value]
///
/// ```
/// use serde_json::json;
/// use johanson::serde_json::from_slice;
///
/// let json = r#"{"name": "Elvis"}"#.as_bytes();
/// let expected = json!({
///     "name": "Elvis"
/// });
/// let actual = from_slice(json).unwrap();
/// assert_eq!(expected, actual);
/// ```
pub fn from_slice(v: &[u8]) -> Result<Value, ParserError> {
    let mut parser = JsonParser::new(ValueBuilder::default());
    parser.parse(v)?;
    parser.finish()?;
    Ok(parser.handler.result.take().unwrap_or(Value::Null))
}

#[cfg(test)]
mod test {
    use crate::serde_json::from_slice;
    use serde_json::{from_slice as serde_from_slice, Value};

    /// Test that an empty object is parsed correctly
    #[test]
    fn empty_object() {
        let json = r#"{}"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that a simple object is parsed correctly
    #[test]
    fn simple_object() {
        let json = r#"{"name": "Elvis"}"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that an empty array is parsed correctly
    #[test]
    fn empty_array() {
        let json = r#"[]"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that an array with mixed values is parsed correctly
    #[test]
    fn mixed_array() {
        let json = r#"["Elvis", 132, "Max", 80.67]"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that a bare scalar is parsed correctly
    #[test]
    fn scalar() {
        let json = r#"42"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that embedded containers are parsed correctly
    #[test]
    fn embedded_objects() {
        let json = r#"{
            "name": "Elvis",
            "address": {"street": "Graceland", "city": "Memphis"},
            "albums": [
                "Elvis Presley",
                "Elvis",
                "Elvis' Christmas Album",
                "Elvis Is Back!",
                {
                    "title": "His Hand in Mine",
                    "year": 1960
                },
                "... any many others :)"
            ]
        }"#
        .as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that malformed input is rejected
    #[test]
    fn syntax_error() {
        assert!(from_slice(br#"{"a": }"#).is_err());
        assert!(from_slice(br#"[1, 2"#).is_err());
    }
}
