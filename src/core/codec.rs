//! Purpose: Encode documents to bytes and decode bytes to documents.
//! Exports: `Encoding`, `encode`, `decode`, `from_document`.
//! Role: The only place serde_json is driven; façade code never formats JSON itself.
//! Invariants: Encoding always targets an in-memory buffer, never a file handle.
//! Invariants: Errors are validation-class; callers attach the path.
//! Notes: `ensure_ascii` output matches the common `\uXXXX` lowercase-hex convention.

use std::io;

use serde::Serialize;
use serde::ser::{
    self, Error as _, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::error::Category;
use serde_json::ser::Formatter;

use crate::core::error::{Error, ErrorKind};

pub const DEFAULT_INDENT: usize = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Encoding {
    /// Spaces per nesting level; `None` or `Some(0)` means compact output.
    pub indent: Option<usize>,
    /// Escape every non-ASCII code point as `\uXXXX`.
    pub ensure_ascii: bool,
}

impl Default for Encoding {
    fn default() -> Self {
        Self {
            indent: Some(DEFAULT_INDENT),
            ensure_ascii: false,
        }
    }
}

impl Encoding {
    pub fn compact() -> Self {
        Self {
            indent: None,
            ensure_ascii: false,
        }
    }
}

/// Encodes `value` into a fresh buffer.
///
/// serde_json writes `NaN` and infinities as `null`; those are rejected here
/// instead so a stored document always reads back as what was written.
pub fn encode<T: Serialize + ?Sized>(value: &T, encoding: &Encoding) -> Result<Vec<u8>, Error> {
    value.serialize(FiniteCheck).map_err(serialize_error)?;
    let mut buf = Vec::with_capacity(128);
    let formatter = JsonFormatter::new(encoding);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer).map_err(serialize_error)?;
    Ok(buf)
}

fn serialize_error(err: serde_json::Error) -> Error {
    Error::new(ErrorKind::Serialize)
        .with_message(format!("value is not JSON-serializable: {err}"))
        .with_source(err)
}

pub fn decode(bytes: &[u8]) -> Result<Value, Error> {
    serde_json::from_slice(bytes).map_err(parse_error)
}

/// Converts an already-parsed document into a typed value.
pub fn from_document<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value).map_err(|err| {
        Error::new(ErrorKind::Type)
            .with_message(format!("document does not match the expected shape: {err}"))
            .with_source(err)
    })
}

fn parse_error(err: serde_json::Error) -> Error {
    let hint = match err.classify() {
        Category::Eof => "The file ends before the JSON value is complete.",
        Category::Syntax => "Fix the JSON syntax at the reported line and column.",
        Category::Data => "The JSON is well-formed but holds an unsupported value.",
        Category::Io => "The content could not be read as UTF-8 JSON text.",
    };
    Error::new(ErrorKind::Parse)
        .with_message(format!("invalid JSON: {err}"))
        .with_hint(hint)
        .with_position(err.line(), err.column())
        .with_source(err)
}

/// Output-free serializer that walks a value and fails on floats JSON cannot
/// represent. Everything else is accepted; serde_json reports its own errors.
#[derive(Clone, Copy)]
struct FiniteCheck;

fn finite(value: f64) -> Result<(), serde_json::Error> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(serde_json::Error::custom(format!(
            "non-finite float {value} has no JSON form"
        )))
    }
}

impl ser::Serializer for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i8(self, _: i8) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i16(self, _: i16) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i32(self, _: i32) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i64(self, _: i64) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i128(self, _: i128) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u8(self, _: u8) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u16(self, _: u16) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u32(self, _: u32) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u64(self, _: u64) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u128(self, _: u128) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_f32(self, value: f32) -> Result<(), Self::Error> {
        finite(f64::from(value))
    }
    fn serialize_f64(self, value: f64) -> Result<(), Self::Error> {
        finite(value)
    }
    fn serialize_char(self, _: char) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_str(self, _: &str) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_none(self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), Self::Error> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(self)
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_tuple(self, _: usize) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, Self::Error> {
        Ok(self)
    }
}

impl SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Self::Error> {
        key.serialize(*self)
    }
    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// serde_json formatter covering both compact and indented layouts, with
/// optional ASCII-only string output.
struct JsonFormatter {
    indent: Option<Vec<u8>>,
    ensure_ascii: bool,
    depth: usize,
    has_value: bool,
}

impl JsonFormatter {
    fn new(encoding: &Encoding) -> Self {
        let indent = encoding
            .indent
            .filter(|width| *width > 0)
            .map(|width| vec![b' '; width]);
        Self {
            indent,
            ensure_ascii: encoding.ensure_ascii,
            depth: 0,
            has_value: false,
        }
    }

    fn newline_and_indent<W: ?Sized + io::Write>(&self, writer: &mut W) -> io::Result<()> {
        if let Some(unit) = &self.indent {
            writer.write_all(b"\n")?;
            for _ in 0..self.depth {
                writer.write_all(unit)?;
            }
        }
        Ok(())
    }

    fn open<W: ?Sized + io::Write>(&mut self, writer: &mut W, token: &[u8]) -> io::Result<()> {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(token)
    }

    fn close<W: ?Sized + io::Write>(&mut self, writer: &mut W, token: &[u8]) -> io::Result<()> {
        self.depth -= 1;
        if self.has_value {
            self.newline_and_indent(writer)?;
        }
        writer.write_all(token)
    }

    fn separator<W: ?Sized + io::Write>(&self, writer: &mut W, first: bool) -> io::Result<()> {
        if !first {
            writer.write_all(b",")?;
        }
        self.newline_and_indent(writer)
    }
}

impl Formatter for JsonFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.open(writer, b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.close(writer, b"]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.separator(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.open(writer, b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.close(writer, b"}")
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.separator(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        if self.indent.is_some() {
            writer.write_all(b": ")
        } else {
            writer.write_all(b":")
        }
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if !self.ensure_ascii || fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
                continue;
            }
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Encoding, decode, encode, from_document};
    use crate::core::error::ErrorKind;
    use serde::ser::{Error as _, Serialize, Serializer};
    use serde_json::json;
    use std::collections::HashMap;

    fn encode_str(value: &serde_json::Value, encoding: Encoding) -> String {
        String::from_utf8(encode(value, &encoding).expect("encode")).expect("utf8")
    }

    #[test]
    fn default_encoding_indents_four_spaces() {
        let value = json!({"a": [1, 2], "b": {}, "c": []});
        let text = encode_str(&value, Encoding::default());
        assert_eq!(
            text,
            "{\n    \"a\": [\n        1,\n        2\n    ],\n    \"b\": {},\n    \"c\": []\n}"
        );
    }

    #[test]
    fn zero_and_none_indent_are_compact() {
        let value = json!({"a": [1, {"b": null}]});
        let expected = r#"{"a":[1,{"b":null}]}"#;
        assert_eq!(encode_str(&value, Encoding::compact()), expected);
        let zero = Encoding {
            indent: Some(0),
            ensure_ascii: false,
        };
        assert_eq!(encode_str(&value, zero), expected);
    }

    #[test]
    fn two_space_indent_matches_serde_pretty() {
        let value = json!({"nested": {"list": [true, false, null]}, "n": 1.5});
        let encoding = Encoding {
            indent: Some(2),
            ensure_ascii: false,
        };
        assert_eq!(
            encode_str(&value, encoding),
            serde_json::to_string_pretty(&value).expect("pretty")
        );
    }

    #[test]
    fn ensure_ascii_escapes_non_ascii_code_points() {
        let value = json!({"café": "naïve 😀", "plain": "a\"b"});
        let ascii = Encoding {
            indent: None,
            ensure_ascii: true,
        };
        assert_eq!(
            encode_str(&value, ascii),
            r#"{"caf\u00e9":"na\u00efve \ud83d\ude00","plain":"a\"b"}"#
        );
        assert_eq!(
            encode_str(&value, Encoding::compact()),
            r#"{"café":"naïve 😀","plain":"a\"b"}"#
        );
    }

    #[test]
    fn ascii_output_decodes_to_the_same_document() {
        let value = json!({"ключ": ["значение", "✓"]});
        let encoding = Encoding {
            indent: Some(4),
            ensure_ascii: true,
        };
        let bytes = encode(&value, &encoding).expect("encode");
        assert!(bytes.is_ascii());
        assert_eq!(decode(&bytes).expect("decode"), value);
    }

    #[test]
    fn non_string_map_keys_fail_to_serialize() {
        let mut map = HashMap::new();
        map.insert(vec![1u8, 2], "blob");
        let err = encode(&map, &Encoding::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialize);
        assert!(err.is_validation_error());
    }

    struct Unrepresentable;

    impl Serialize for Unrepresentable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("raw handle has no JSON form"))
        }
    }

    #[test]
    fn custom_serializer_failure_is_a_validation_error() {
        let err = encode(&Unrepresentable, &Encoding::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialize);
        assert!(err.message().unwrap().contains("raw handle"));
    }

    #[test]
    fn non_finite_floats_are_rejected_not_nulled() {
        let mut nested = HashMap::new();
        nested.insert("ratio", vec![Some(1.5_f64), Some(f64::NAN)]);
        let err = encode(&nested, &Encoding::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialize);
        assert!(err.message().unwrap().contains("non-finite"));

        let err = encode(&(1_u8, f32::NEG_INFINITY), &Encoding::compact()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialize);

        let ok = encode(&vec![0.25_f64, -3.0], &Encoding::compact()).expect("finite");
        assert_eq!(ok, b"[0.25,-3.0]");
    }

    #[test]
    fn decode_reports_line_and_column() {
        let err = decode(b"{\n  \"a\": 1,\n  \"b\": ]\n}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.line(), Some(3));
        assert!(err.column().is_some());
    }

    #[test]
    fn decode_rejects_truncated_and_invalid_utf8_input() {
        let err = decode(b"{invalid json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = decode(&[0xff, b'{', b'}']).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = decode(b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn from_document_reports_shape_mismatch() {
        #[derive(serde::Deserialize, Debug)]
        struct Settings {
            #[allow(dead_code)]
            port: u16,
        }
        let err = from_document::<Settings>(json!({"port": "eighty"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }
}
