//! Serializes a [`crate::Node`] tree back to JSON text.

use crate::Node;
use alloc::format;
use alloc::string::String;
use core::fmt::Write;

/// Prints `node` as compact JSON (no inserted whitespace), matching the
/// wire format the transaction engine transmits.
pub fn print(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out, None);
    out
}

/// Prints `node` with two-space indentation, for debug output only; never
/// used on the wire.
pub fn print_pretty(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out, Some(0));
    out
}

fn write_node(node: &Node, out: &mut String, indent: Option<usize>) {
    match node {
        Node::Null => out.push_str("null"),
        Node::Bool(true) => out.push_str("true"),
        Node::Bool(false) => out.push_str("false"),
        Node::Number(n) => {
            if n.is_whole() && n.int.unsigned_abs() < (1u64 << 53) {
                let _ = write!(out, "{}", n.int);
            } else {
                let _ = write!(out, "{}", n.float);
            }
        }
        Node::String(s) => write_string(s, out),
        Node::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline_indent(out, indent.map(|d| d + 1));
                write_node(item, out, indent.map(|d| d + 1));
            }
            newline_indent(out, indent);
            out.push(']');
        }
        Node::Object(members) => {
            out.push('{');
            for (i, (key, value)) in members.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline_indent(out, indent.map(|d| d + 1));
                write_string(key, out);
                out.push(':');
                if indent.is_some() {
                    out.push(' ');
                }
                write_node(value, out, indent.map(|d| d + 1));
            }
            newline_indent(out, indent);
            out.push('}');
        }
    }
}

fn newline_indent(out: &mut String, indent: Option<usize>) {
    if let Some(depth) = indent {
        out.push('\n');
        for _ in 0..depth * 2 {
            out.push(' ');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::Node;

    #[test]
    fn prints_whole_number_without_fraction() {
        let node = Node::int(42);
        assert_eq!(print(&node), "42");
    }

    #[test]
    fn prints_fractional_number() {
        let node = Node::float(40.7128);
        assert_eq!(print(&node), "40.7128");
    }

    #[test]
    fn escapes_control_characters() {
        let node = Node::string("a\nb\"c\\d");
        assert_eq!(print(&node), "\"a\\nb\\\"c\\\\d\"");
    }

    #[test]
    fn round_trips_through_parse() {
        let original = r#"{"req":"card.version","id":7,"body":{"ok":true}}"#;
        let node = parse(original).unwrap();
        let reprinted = print(&node);
        let reparsed = parse(&reprinted).unwrap();
        assert_eq!(node, reparsed);
    }
}
