//! Percent-encoding: per-component escape sets, plus the encode/decode primitives.
//!
//! [Specification](https://url.spec.whatwg.org/#percent-encoded-bytes)

use crate::{ascii, set::AsciiSet};

/// <https://url.spec.whatwg.org/#c0-control-percent-encode-set>
pub const C0_CONTROL: AsciiSet = AsciiSet::from_range(0x00, 0x20).add(0x7F);

/// <https://url.spec.whatwg.org/#fragment-percent-encode-set>
pub const FRAGMENT: AsciiSet = C0_CONTROL.merge(AsciiSet::from_bytes(b" \"<>`"));

/// <https://url.spec.whatwg.org/#query-percent-encode-set>
pub const QUERY: AsciiSet = C0_CONTROL.merge(AsciiSet::from_bytes(b" \"#<>"));

/// <https://url.spec.whatwg.org/#special-query-percent-encode-set>
pub const SPECIAL_QUERY: AsciiSet = QUERY.add(b'\'');

/// <https://url.spec.whatwg.org/#path-percent-encode-set>
pub const PATH: AsciiSet = QUERY.merge(AsciiSet::from_bytes(b"?`{}"));

/// <https://url.spec.whatwg.org/#userinfo-percent-encode-set>
pub const USERINFO: AsciiSet = PATH.merge(AsciiSet::from_bytes(b"/:;=@[\\]^|"));

/// <https://url.spec.whatwg.org/#component-percent-encode-set>
pub const COMPONENT: AsciiSet = USERINFO.merge(AsciiSet::from_bytes(b"$%&+,"));

/// <https://url.spec.whatwg.org/#application-x-www-form-urlencoded-percent-encode-set>
///
/// `component`, plus `!'()~`, minus nothing further: those six bytes are
/// additionally escaped relative to `component` when producing
/// `application/x-www-form-urlencoded` bodies.
pub const FORM_URLENCODED: AsciiSet = COMPONENT.merge(AsciiSet::from_bytes(b"!'()~"));

/// <https://url.spec.whatwg.org/#string-percent-encode-after-encoding>
///
/// Escapes every byte of `input` that is a member of `encode_set`, appending
/// the (possibly escaped) result to `out`.
pub fn percent_encode(input: &str, encode_set: &AsciiSet, out: &mut String) {
    for c in input.chars() {
        percent_encode_char(c, encode_set, out);
    }
}

/// Percent-encodes a single code point's UTF-8 bytes against `encode_set`.
pub fn percent_encode_char(c: char, encode_set: &AsciiSet, out: &mut String) {
    let mut buffer = [0; 4];
    let bytes = c.encode_utf8(&mut buffer).as_bytes();
    for &byte in bytes {
        if byte < 0x80 && !encode_set.contains(byte) {
            out.push(byte as char);
        } else {
            percent_encode_byte(byte, out);
        }
    }
}

/// <https://url.spec.whatwg.org/#percent-encode>
pub fn percent_encode_byte(byte: u8, out: &mut String) {
    out.push('%');
    ascii::write_upper_hex(byte, out);
}

/// <https://url.spec.whatwg.org/#percent-decode>
///
/// Bytes that are not a valid `%HH` escape are passed through unchanged,
/// `%` included.
#[must_use]
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        let escape = (bytes[i] == b'%' && i + 2 < bytes.len())
            .then(|| ascii::hex_value(bytes[i + 1]).zip(ascii::hex_value(bytes[i + 2])))
            .flatten();

        if let Some((hi, lo)) = escape {
            decoded.push(hi * 16 + lo);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_encode_byte_examples() {
        // https://url.spec.whatwg.org/#example-percent-encode-operations
        let mut buf = String::new();
        percent_encode_byte(0x23, &mut buf);
        assert_eq!(buf, "%23");

        buf.clear();
        percent_encode_byte(0x7F, &mut buf);
        assert_eq!(buf, "%7F");
    }

    #[test]
    fn percent_decode_examples() {
        assert_eq!(percent_decode("%25%s%1G"), "%%s%1G");
    }

    #[test]
    fn percent_encode_respects_set() {
        let mut buf = String::new();
        percent_encode("a b", &QUERY, &mut buf);
        assert_eq!(buf, "a%20b");
    }

    #[test]
    fn percent_encode_roundtrips_through_decode() {
        let mut buf = String::new();
        percent_encode("h\u{e9}llo?", &PATH, &mut buf);
        assert_eq!(percent_decode(&buf), "h\u{e9}llo?");
    }
}
