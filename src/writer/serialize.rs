//! Serialization of graph values to document syntax.

use std::io::Write;

use crate::graph::{Dict, Object};

/// Serialize one object value. References are written as `N 0 R` using the
/// arena numbering (id + 1); generation numbers are always zero.
pub fn serialize_object(obj: &Object, out: &mut Vec<u8>) {
    match obj {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(true) => out.extend_from_slice(b"true"),
        Object::Boolean(false) => out.extend_from_slice(b"false"),
        Object::Integer(v) => {
            let _ = write!(out, "{}", v);
        }
        Object::Real(v) => {
            let _ = write!(out, "{}", fmt_real(*v));
        }
        Object::Name(name) => serialize_name(name, out),
        Object::Text(text) => serialize_string(text, out),
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                serialize_object(item, out);
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => serialize_dict(dict, out),
        Object::Stream { dict, data } => {
            serialize_dict(dict, out);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\nendstream");
        }
        Object::Reference(id) => {
            let _ = write!(out, "{} 0 R", id + 1);
        }
    }
}

fn serialize_dict(dict: &Dict, out: &mut Vec<u8>) {
    out.extend_from_slice(b"<<");
    for (key, value) in dict {
        out.push(b' ');
        serialize_name(key, out);
        out.push(b' ');
        serialize_object(value, out);
    }
    out.extend_from_slice(b" >>");
}

fn serialize_name(name: &str, out: &mut Vec<u8>) {
    out.push(b'/');
    for c in name.chars() {
        let code = c as u32;
        let regular = c.is_ascii_alphanumeric()
            || matches!(c, '-' | '_' | '.' | '+' | '@' | '*' | '$');
        if regular {
            out.push(c as u8);
        } else if code <= 0xFF {
            let _ = write!(out, "#{:02X}", code);
        } else {
            out.extend_from_slice(b"#3F"); // '?'
        }
    }
}

fn serialize_string(text: &str, out: &mut Vec<u8>) {
    out.push(b'(');
    for c in text.chars() {
        let code = c as u32;
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            _ if (0x20..0x7F).contains(&code) => out.push(c as u8),
            _ if code <= 0xFF => {
                let _ = write!(out, "\\{:03o}", code);
            }
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
}

/// Deterministic real formatting: at most four decimals, trailing zeros
/// trimmed, integral values written without a point.
fn fmt_real(v: f64) -> String {
    if (v - v.round()).abs() < 0.00005 {
        format!("{}", v.round() as i64)
    } else {
        let s = format!("{:.4}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
