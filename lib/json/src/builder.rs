//! `object_from_format`: single-call object construction from a printf-like
//! format string, the idiomatic stand-in for the source library's C
//! varargs interface. Callers without C-style varargs pass an explicit
//! typed argument list instead; each `%s %d %f %b %o %a` spec in the
//! format string consumes the next element of that list, in order,
//! whether the spec appears in a field's name or its value position.

use crate::Node;
use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;

/// One positional argument consumed by a value-spec in the format string.
pub enum Arg<'a> {
    Str(Option<&'a str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Moved into the built tree when non-`None`; a `None` argument skips
    /// the field it's bound to rather than attaching `null`.
    Node(Option<Node>),
}

enum ValueOutcome {
    Value(Node),
    Skip,
    Malformed,
}

/// Builds an object from `fmt`, consuming `args` left to right as each
/// `%s %d %f %b %o %a` spec is encountered. Stops at the first malformed
/// field and returns everything successfully parsed before it -- it never
/// returns an error, matching the rest of this tree's null-safe query
/// policy.
pub fn object_from_format(fmt: &str, args: Vec<Arg>) -> Node {
    let mut result = Node::object();
    let mut args = args.into_iter();
    let bytes = fmt.as_bytes();
    let mut pos = 0usize;
    loop {
        skip_sep(bytes, &mut pos);
        if pos >= bytes.len() {
            break;
        }
        let name = match take_name(bytes, &mut pos, &mut args) {
            Some(n) => n,
            None => break,
        };
        if bytes.get(pos) != Some(&b':') {
            break;
        }
        pos += 1;
        match take_value(bytes, &mut pos, &mut args) {
            ValueOutcome::Value(v) => result.set(name, v),
            ValueOutcome::Skip => {}
            ValueOutcome::Malformed => break,
        }
    }
    result
}

/// Convenience wrapper matching the source library's `add-to-object`: build
/// a temporary from `fmt`/`args` and merge it into `target`.
pub fn add_to_object(target: &mut Node, fmt: &str, args: Vec<Arg>) {
    target.merge(object_from_format(fmt, args));
}

fn is_sep(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b',')
}

fn skip_sep(bytes: &[u8], pos: &mut usize) {
    while let Some(&b) = bytes.get(*pos) {
        if is_sep(b) {
            *pos += 1;
        } else {
            break;
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn take_name<'a>(
    bytes: &[u8],
    pos: &mut usize,
    args: &mut impl Iterator<Item = Arg<'a>>,
) -> Option<String> {
    if bytes[*pos..].starts_with(b"%s") {
        *pos += 2;
        return match args.next() {
            Some(Arg::Str(Some(s))) => Some(s.to_owned()),
            _ => None,
        };
    }
    let start = *pos;
    while bytes.get(*pos).copied().map(is_ident_byte).unwrap_or(false) {
        *pos += 1;
    }
    if *pos == start {
        return None;
    }
    Some(core::str::from_utf8(&bytes[start..*pos]).ok()?.to_owned())
}

fn take_value<'a>(
    bytes: &[u8],
    pos: &mut usize,
    args: &mut impl Iterator<Item = Arg<'a>>,
) -> ValueOutcome {
    match bytes.get(*pos..*pos + 2) {
        Some(b"%s") => {
            *pos += 2;
            match args.next() {
                Some(Arg::Str(Some(s))) => ValueOutcome::Value(Node::string(s)),
                Some(Arg::Str(None)) => ValueOutcome::Skip,
                _ => ValueOutcome::Malformed,
            }
        }
        Some(b"%d") => {
            *pos += 2;
            match args.next() {
                Some(Arg::Int(i)) => ValueOutcome::Value(Node::int(i)),
                _ => ValueOutcome::Malformed,
            }
        }
        Some(b"%f") => {
            *pos += 2;
            match args.next() {
                Some(Arg::Float(f)) => ValueOutcome::Value(Node::float(f)),
                _ => ValueOutcome::Malformed,
            }
        }
        Some(b"%b") => {
            *pos += 2;
            match args.next() {
                Some(Arg::Bool(b)) => ValueOutcome::Value(Node::bool(b)),
                _ => ValueOutcome::Malformed,
            }
        }
        Some(b"%o") | Some(b"%a") => {
            *pos += 2;
            match args.next() {
                Some(Arg::Node(Some(n))) => ValueOutcome::Value(n),
                Some(Arg::Node(None)) => ValueOutcome::Skip,
                _ => ValueOutcome::Malformed,
            }
        }
        _ => take_literal(bytes, pos),
    }
}

fn take_literal(bytes: &[u8], pos: &mut usize) -> ValueOutcome {
    match bytes.get(*pos) {
        Some(b'\'') | Some(b'"') => take_quoted(bytes, pos),
        Some(b'-') | Some(b'0'..=b'9') => take_number(bytes, pos),
        Some(c) if c.is_ascii_alphabetic() => take_unquoted(bytes, pos),
        _ => ValueOutcome::Malformed,
    }
}

fn take_quoted(bytes: &[u8], pos: &mut usize) -> ValueOutcome {
    let quote = bytes[*pos];
    let start = *pos;
    *pos += 1;
    let mut out = String::new();
    loop {
        match bytes.get(*pos) {
            None => {
                *pos = start;
                return ValueOutcome::Malformed;
            }
            Some(&b) if b == quote => {
                *pos += 1;
                return ValueOutcome::Value(Node::string(out));
            }
            Some(b'\\') => {
                *pos += 1;
                match bytes.get(*pos) {
                    Some(&b) if b == b'\'' || b == b'"' || b == b'\\' => {
                        out.push(b as char);
                        *pos += 1;
                    }
                    _ => {
                        *pos = start;
                        return ValueOutcome::Malformed;
                    }
                }
            }
            Some(&b) => {
                out.push(b as char);
                *pos += 1;
            }
        }
    }
}

fn take_number(bytes: &[u8], pos: &mut usize) -> ValueOutcome {
    let start = *pos;
    if bytes.get(*pos) == Some(&b'-') {
        *pos += 1;
    }
    let digit_start = *pos;
    while matches!(bytes.get(*pos), Some(b'0'..=b'9')) {
        *pos += 1;
    }
    if *pos == digit_start {
        *pos = start;
        return ValueOutcome::Malformed;
    }
    let mut is_float = false;
    if bytes.get(*pos) == Some(&b'.') {
        is_float = true;
        *pos += 1;
        // `42.` is accepted: no digits are required after the dot.
        while matches!(bytes.get(*pos), Some(b'0'..=b'9')) {
            *pos += 1;
        }
    }
    let text = core::str::from_utf8(&bytes[start..*pos]).unwrap();
    if is_float {
        let normalized = if text.ends_with('.') {
            let mut s = text.to_owned();
            s.push('0');
            s
        } else {
            text.to_owned()
        };
        match normalized.parse::<f64>() {
            Ok(f) => ValueOutcome::Value(Node::float(f)),
            Err(_) => {
                *pos = start;
                ValueOutcome::Malformed
            }
        }
    } else {
        match text.parse::<i64>() {
            Ok(i) => ValueOutcome::Value(Node::int(i)),
            Err(_) => match text.parse::<f64>() {
                Ok(f) => ValueOutcome::Value(Node::float(f)),
                Err(_) => {
                    *pos = start;
                    ValueOutcome::Malformed
                }
            },
        }
    }
}

fn take_unquoted(bytes: &[u8], pos: &mut usize) -> ValueOutcome {
    let start = *pos;
    *pos += 1; // first byte already verified alphabetic
    while bytes
        .get(*pos)
        .map(|&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
        .unwrap_or(false)
    {
        *pos += 1;
    }
    let token = core::str::from_utf8(&bytes[start..*pos]).unwrap();
    match token {
        "true" => ValueOutcome::Value(Node::bool(true)),
        "false" => ValueOutcome::Value(Node::bool(false)),
        _ => ValueOutcome::Value(Node::string(token)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_simple_fields_with_any_separator() {
        let a = object_from_format("a:1 b:2", vec![]);
        let b = object_from_format("a:1, b:2", vec![]);
        let c = object_from_format("a:1\tb:2", vec![]);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.get_int("a"), 1);
        assert_eq!(a.get_int("b"), 2);
    }

    #[test]
    fn unquoted_identifiers_become_strings() {
        let node = object_from_format("product:hub.set", vec![]);
        assert_eq!(node.get_string("product"), "hub.set");
    }

    #[test]
    fn literal_true_false_are_case_sensitive() {
        let node = object_from_format("a:true b:False", vec![]);
        assert_eq!(node.get_bool("a"), true);
        assert_eq!(node.get_string("b"), "False");
    }

    #[test]
    fn trailing_dot_float_is_accepted() {
        let node = object_from_format("n:42.", vec![]);
        assert_eq!(node.get_double("n"), 42.0);
    }

    #[test]
    fn value_specs_consume_args_in_order() {
        let node = object_from_format(
            "name:%s count:%d lat:%f on:%b",
            vec![
                Arg::Str(Some("sensor")),
                Arg::Int(5),
                Arg::Float(40.71),
                Arg::Bool(true),
            ],
        );
        assert_eq!(node.get_string("name"), "sensor");
        assert_eq!(node.get_int("count"), 5);
        assert_eq!(node.get_bool("on"), true);
    }

    #[test]
    fn null_node_arg_skips_field_but_continues() {
        let node = object_from_format("a:%o b:%d", vec![Arg::Node(None), Arg::Int(2)]);
        assert!(!node.is_present("a"));
        assert_eq!(node.get_int("b"), 2);
    }

    #[test]
    fn moved_node_arg_is_attached_by_value() {
        let inner = object_from_format("lat:%f lon:%f", vec![Arg::Float(40.7128), Arg::Float(-74.006)]);
        let outer = object_from_format(
            "city:%s location:%o",
            vec![Arg::Str(Some("NYC")), Arg::Node(Some(inner))],
        );
        let location = outer.get_object("location").unwrap();
        assert_eq!(location.get_double("lat"), 40.7128);
    }

    #[test]
    fn malformed_suffix_keeps_prior_fields() {
        let node = object_from_format("a:1 b:$bad", vec![]);
        assert_eq!(node.get_int("a"), 1);
        assert!(!node.is_present("b"));
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let node = object_from_format("a:1 a:2", vec![]);
        assert_eq!(node.get_int("a"), 2);
    }

    #[test]
    fn null_name_arg_stops_parsing_entirely() {
        let node = object_from_format("%s:1 b:2", vec![Arg::Str(None)]);
        assert!(!node.is_present("b"));
    }
}
