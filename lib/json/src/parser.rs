//! Recursive-descent JSON parser producing a [`crate::Node`] tree.

use crate::{JsonNumber, Node};
use alloc::string::String;
use alloc::vec::Vec;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected byte at offset {0}")]
    UnexpectedByte(usize),
    #[error("invalid number literal at offset {0}")]
    InvalidNumber(usize),
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),
    #[error("trailing data after document at offset {0}")]
    TrailingData(usize),
}

pub fn parse(input: &str) -> Result<Node, ParseError> {
    let mut p = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    p.skip_ws();
    let node = p.parse_value()?;
    p.skip_ws();
    if p.pos != p.bytes.len() {
        return Err(ParseError::TrailingData(p.pos));
    }
    Ok(node)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\n' || b == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), ParseError> {
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else if self.peek().is_none() {
            Err(ParseError::UnexpectedEof)
        } else {
            Err(ParseError::UnexpectedByte(self.pos))
        }
    }

    fn parse_value(&mut self) -> Result<Node, ParseError> {
        self.skip_ws();
        match self.peek() {
            None => Err(ParseError::UnexpectedEof),
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => Ok(Node::String(self.parse_string()?)),
            Some(b't') => self.parse_literal("true", Node::Bool(true)),
            Some(b'f') => self.parse_literal("false", Node::Bool(false)),
            Some(b'n') => self.parse_literal("null", Node::Null),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            Some(_) => Err(ParseError::UnexpectedByte(self.pos)),
        }
    }

    fn parse_literal(&mut self, lit: &str, node: Node) -> Result<Node, ParseError> {
        let end = self.pos + lit.len();
        if end <= self.bytes.len() && &self.bytes[self.pos..end] == lit.as_bytes() {
            self.pos = end;
            Ok(node)
        } else {
            Err(ParseError::UnexpectedByte(self.pos))
        }
    }

    fn parse_object(&mut self) -> Result<Node, ParseError> {
        self.expect(b'{')?;
        let mut members: Vec<(String, Node)> = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Node::Object(members));
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(ParseError::UnexpectedByte(self.pos));
            }
            let key = self.parse_string()?;
            self.skip_ws();
            self.expect(b':')?;
            let value = self.parse_value()?;
            members.retain(|(k, _)| k != &key);
            members.push((key, value));
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                }
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(ParseError::UnexpectedEof),
                Some(_) => return Err(ParseError::UnexpectedByte(self.pos)),
            }
        }
        Ok(Node::Object(members))
    }

    fn parse_array(&mut self) -> Result<Node, ParseError> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Node::Array(items));
        }
        loop {
            let value = self.parse_value()?;
            items.push(value);
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                }
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(ParseError::UnexpectedEof),
                Some(_) => return Err(ParseError::UnexpectedByte(self.pos)),
            }
        }
        Ok(Node::Array(items))
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.expect(b'"')?;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::UnterminatedString(start)),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let esc_pos = self.pos;
                    match self.peek() {
                        Some(b'"') => {
                            out.push('"');
                            self.pos += 1;
                        }
                        Some(b'\\') => {
                            out.push('\\');
                            self.pos += 1;
                        }
                        Some(b'/') => {
                            out.push('/');
                            self.pos += 1;
                        }
                        Some(b'b') => {
                            out.push('\u{8}');
                            self.pos += 1;
                        }
                        Some(b'f') => {
                            out.push('\u{c}');
                            self.pos += 1;
                        }
                        Some(b'n') => {
                            out.push('\n');
                            self.pos += 1;
                        }
                        Some(b'r') => {
                            out.push('\r');
                            self.pos += 1;
                        }
                        Some(b't') => {
                            out.push('\t');
                            self.pos += 1;
                        }
                        Some(b'u') => {
                            self.pos += 1;
                            let code = self.parse_hex4(esc_pos)?;
                            match char::from_u32(code as u32) {
                                Some(c) => out.push(c),
                                None => out.push('\u{FFFD}'),
                            }
                        }
                        _ => return Err(ParseError::InvalidEscape(esc_pos)),
                    }
                }
                Some(_) => {
                    let rest = core::str::from_utf8(&self.bytes[self.pos..])
                        .map_err(|_| ParseError::InvalidEscape(self.pos))?;
                    let ch = rest.chars().next().unwrap();
                    out.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
        Ok(out)
    }

    fn parse_hex4(&mut self, esc_pos: usize) -> Result<u16, ParseError> {
        if self.pos + 4 > self.bytes.len() {
            return Err(ParseError::InvalidEscape(esc_pos));
        }
        let slice = core::str::from_utf8(&self.bytes[self.pos..self.pos + 4])
            .map_err(|_| ParseError::InvalidEscape(esc_pos))?;
        let code = u16::from_str_radix(slice, 16).map_err(|_| ParseError::InvalidEscape(esc_pos))?;
        self.pos += 4;
        Ok(code)
    }

    fn parse_number(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let int_start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.pos == int_start {
            return Err(ParseError::InvalidNumber(start));
        }
        let mut is_float = false;
        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            let frac_start = self.pos;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.pos == frac_start {
                return Err(ParseError::InvalidNumber(start));
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            let exp_start = self.pos;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.pos == exp_start {
                return Err(ParseError::InvalidNumber(start));
            }
        }
        let text = core::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| ParseError::InvalidNumber(start))?;
        if is_float {
            let f: f64 = text.parse().map_err(|_| ParseError::InvalidNumber(start))?;
            Ok(Node::Number(JsonNumber::from_f64(f)))
        } else {
            match text.parse::<i64>() {
                Ok(i) => Ok(Node::Number(JsonNumber::from_i64(i))),
                Err(_) => {
                    let f: f64 = text.parse().map_err(|_| ParseError::InvalidNumber(start))?;
                    Ok(Node::Number(JsonNumber::from_f64(f)))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonType;

    #[test]
    fn parses_flat_object() {
        let node = parse(r#"{"req":"card.version","id":7}"#).unwrap();
        assert_eq!(node.get_string("req"), "card.version");
        assert_eq!(node.get_int("id"), 7);
    }

    #[test]
    fn parses_nested_body_and_array() {
        let node = parse(r#"{"body":{"sku":"NOTE-WBGL"},"tags":[1,2,3]}"#).unwrap();
        let body = node.get_object("body").unwrap();
        assert_eq!(body.get_string("sku"), "NOTE-WBGL");
        let tags = node.get_array("tags").unwrap();
        assert_eq!(tags.as_array().unwrap().len(), 3);
    }

    #[test]
    fn integer_round_trips_exactly() {
        let node = parse(r#"{"num":-4200000000}"#).unwrap();
        assert_eq!(node.get_int("num"), -4_200_000_000);
    }

    #[test]
    fn float_value_keeps_fraction() {
        let node = parse(r#"{"lat":40.7128}"#).unwrap();
        assert!((node.get_double("lat") - 40.7128).abs() < 1e-9);
    }

    #[test]
    fn escaped_string_decodes() {
        let node = parse(r#"{"s":"a\nb\"c"}"#).unwrap();
        assert_eq!(node.get_string("s"), "a\nb\"c");
    }

    #[test]
    fn duplicate_keys_keep_last() {
        let node = parse(r#"{"a":1,"a":2}"#).unwrap();
        assert_eq!(node.get_int("a"), 2);
    }

    #[test]
    fn rejects_trailing_data() {
        assert!(parse(r#"{"a":1} garbage"#).is_err());
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(parse(r#"{"a":"oops"#).is_err());
    }

    #[test]
    fn classifies_numeric_and_zero_number() {
        let node = parse(r#"{"n":0,"f":3}"#).unwrap();
        assert_eq!(node.get("n").unwrap().type_of(), JsonType::ZeroNumber);
        assert_eq!(node.get("f").unwrap().type_of(), JsonType::NonZeroNumber);
    }
}
