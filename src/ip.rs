//! IPv4 and IPv6 literal parsing.
//!
//! [IPv4 specification](https://url.spec.whatwg.org/#concept-ipv4-parser)
//! [IPv6 specification](https://url.spec.whatwg.org/#concept-ipv6-parser)

use std::{fmt, net};

use crate::validation_error::{ValidationError, ValidationErrorHandler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ipv4ParseError {
    /// A dotted-numeric piece is not numeric at all (radix-appropriate digits only).
    NonNumericPart,
    /// More than four dot-separated pieces were given.
    TooManyParts,
    /// A non-final piece exceeds 255.
    NumberTooLarge,
    /// The final piece does not fit in the bits remaining for it.
    AddressOverflows,
}

impl fmt::Display for Ipv4ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::NonNumericPart => "IPv4 address part is not numeric",
            Self::TooManyParts => "IPv4 address has more than four parts",
            Self::NumberTooLarge => "IPv4 address part exceeds 255",
            Self::AddressOverflows => "IPv4 address overflows a 32-bit value",
        };
        f.write_str(message)
    }
}

impl std::error::Error for Ipv4ParseError {}

/// Whether a piece failed to parse because it wasn't numeric at all, which
/// signals the *caller* to retry the input as a domain instead of failing
/// outright, vs. a piece that is numeric but invalid in context.
enum NumberParseOutcome {
    Value(u32, bool),
    NotAnIpAddress,
}

/// <https://url.spec.whatwg.org/#ipv4-number-parser>
fn ipv4_number_parse(mut input: &str) -> Result<NumberParseOutcome, ()> {
    if input.is_empty() {
        return Err(());
    }

    let mut validation_error = false;
    let mut radix = 10;

    if input.len() >= 2 && (input.starts_with("0x") || input.starts_with("0X")) {
        validation_error = true;
        input = &input[2..];
        radix = 16;
    } else if input.len() >= 2 && input.starts_with('0') {
        validation_error = true;
        input = &input[1..];
        radix = 8;
    }

    if input.is_empty() {
        return Ok(NumberParseOutcome::Value(0, true));
    }

    if !input.bytes().all(|b| (b as char).is_digit(radix)) {
        return Ok(NumberParseOutcome::NotAnIpAddress);
    }

    match u32::from_str_radix(input, radix) {
        Ok(value) => Ok(NumberParseOutcome::Value(value, validation_error)),
        // The piece is numeric in shape but too large for a u32: this is a
        // genuine overflow, not "retry as domain".
        Err(_) => Err(()),
    }
}

/// <https://url.spec.whatwg.org/#concept-ipv4-parser>
///
/// A `None` return (rather than `Err`) means "not an IPv4 address" — the
/// caller should fall back to treating the input as a domain.
pub(crate) fn ipv4_parse<H: ValidationErrorHandler>(
    input: &str,
    error_handler: &mut H,
) -> Result<Option<net::Ipv4Addr>, Ipv4ParseError> {
    let mut parts: Vec<&str> = input.split('.').collect();

    if parts.last().copied().is_some_and(str::is_empty) {
        error_handler.validation_error(ValidationError::Ipv4EmptyPart);
        if parts.len() > 1 {
            parts.pop();
        }
    }

    if parts.len() > 4 {
        error_handler.validation_error(ValidationError::Ipv4TooManyParts);
        return Err(Ipv4ParseError::TooManyParts);
    }

    let mut numbers = [0u32; 4];
    let count = parts.len();

    for (index, part) in parts.iter().enumerate() {
        match ipv4_number_parse(part) {
            Ok(NumberParseOutcome::Value(value, had_nondecimal)) => {
                if had_nondecimal {
                    error_handler.validation_error(ValidationError::Ipv4NonDecimalPart);
                }
                numbers[index] = value;
            },
            Ok(NumberParseOutcome::NotAnIpAddress) => {
                error_handler.validation_error(ValidationError::Ipv4NonNumericPart);
                return Ok(None);
            },
            Err(()) => {
                error_handler.validation_error(ValidationError::Ipv4NonNumericPart);
                return Ok(None);
            },
        }
    }

    if numbers[..count.saturating_sub(1)].iter().any(|&n| n > 255) {
        error_handler.validation_error(ValidationError::Ipv4OutOfRangePart);
        return Err(Ipv4ParseError::NumberTooLarge);
    }

    let last = numbers[count - 1];
    if count >= 1 && last >= 256u32.pow((5 - count) as u32) {
        error_handler.validation_error(ValidationError::Ipv4OutOfRangePart);
        return Err(Ipv4ParseError::AddressOverflows);
    }

    let mut address = last;
    for (i, &n) in numbers[..count - 1].iter().enumerate() {
        address += n * 256u32.pow((3 - i) as u32);
    }

    Ok(Some(net::Ipv4Addr::from(address)))
}

/// Whether `part` parses as a single IPv4 number (decimal, hex, or octal),
/// used by the host parser's "ends in a number" check.
pub(crate) fn looks_like_ipv4_number(part: &str) -> bool {
    !matches!(ipv4_number_parse(part), Ok(NumberParseOutcome::NotAnIpAddress) | Err(()))
}

/// A restricted IPv4 parser used for the embedded tail of an IPv6 address:
/// exactly four decimal pieces, no hex/octal, no short forms.
///
/// <https://url.spec.whatwg.org/#ends-in-a-number-checker> (the embedded form)
fn ipv4_simple_parse(input: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let parts: Vec<&str> = input.split('.').collect();
    if parts.len() != 4 {
        return None;
    }

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // no leading zeroes beyond a single "0"
        if part.len() > 1 && part.starts_with('0') {
            return None;
        }
        octets[i] = part.parse::<u16>().ok().filter(|&v| v <= 255)? as u8;
    }

    Some(octets)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ipv6ParseError {
    InvalidCompression,
    TooManyPieces,
    MultipleCompression,
    InvalidCodePoint,
    TooFewPieces,
    EmbeddedIpv4TooManyPieces,
    EmbeddedIpv4InvalidCodePoint,
    EmbeddedIpv4OutOfRangePart,
    EmbeddedIpv4TooFewParts,
}

impl fmt::Display for Ipv6ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::InvalidCompression => "IPv6 address begins with improper compression",
            Self::TooManyPieces => "IPv6 address has more than 8 pieces",
            Self::MultipleCompression => "IPv6 address is compressed in more than one place",
            Self::InvalidCodePoint => "IPv6 address contains an invalid code point",
            Self::TooFewPieces => "uncompressed IPv6 address has fewer than 8 pieces",
            Self::EmbeddedIpv4TooManyPieces => "IPv6 address has too many pieces before an embedded IPv4 address",
            Self::EmbeddedIpv4InvalidCodePoint => "embedded IPv4 address contains an invalid code point",
            Self::EmbeddedIpv4OutOfRangePart => "embedded IPv4 address part exceeds 255",
            Self::EmbeddedIpv4TooFewParts => "embedded IPv4 address has too few parts",
        };
        f.write_str(message)
    }
}

impl std::error::Error for Ipv6ParseError {}

/// <https://url.spec.whatwg.org/#concept-ipv6-parser>
pub(crate) fn ipv6_parse<H: ValidationErrorHandler>(
    input: &str,
    error_handler: &mut H,
) -> Result<net::Ipv6Addr, Ipv6ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut address = [0u16; 8];
    let mut piece_index = 0usize;
    let mut compress: Option<usize> = None;
    let mut ptr = 0usize;

    if chars.get(ptr) == Some(&':') {
        if chars.get(ptr + 1) != Some(&':') {
            error_handler.validation_error(ValidationError::Ipv6InvalidCompression);
            return Err(Ipv6ParseError::InvalidCompression);
        }
        ptr += 2;
        piece_index += 1;
        compress = Some(piece_index);
    }

    while let Some(&c) = chars.get(ptr) {
        if piece_index == 8 {
            error_handler.validation_error(ValidationError::Ipv6TooManyPieces);
            return Err(Ipv6ParseError::TooManyPieces);
        }

        if c == ':' {
            if compress.is_some() {
                error_handler.validation_error(ValidationError::Ipv6MultipleCompression);
                return Err(Ipv6ParseError::MultipleCompression);
            }
            ptr += 1;
            piece_index += 1;
            compress = Some(piece_index);
            continue;
        }

        let mut value: u16 = 0;
        let mut length = 0;
        while length < 4 {
            match chars.get(ptr).and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    value = value * 0x10 + digit as u16;
                    ptr += 1;
                    length += 1;
                },
                None => break,
            }
        }

        if chars.get(ptr) == Some(&'.') {
            if length == 0 {
                error_handler.validation_error(ValidationError::Ipv4InIpv6InvalidCodepoint);
                return Err(Ipv6ParseError::EmbeddedIpv4InvalidCodePoint);
            }
            ptr -= length;

            if piece_index > 6 {
                error_handler.validation_error(ValidationError::Ipv4InIpv6TooManyPieces);
                return Err(Ipv6ParseError::EmbeddedIpv4TooManyPieces);
            }

            let remaining: String = chars[ptr..].iter().collect();
            let octets = ipv4_simple_parse(&remaining).ok_or_else(|| {
                error_handler.validation_error(ValidationError::Ipv4InIpv6InvalidCodepoint);
                Ipv6ParseError::EmbeddedIpv4InvalidCodePoint
            })?;

            address[piece_index] = u16::from_be_bytes([octets[0], octets[1]]);
            address[piece_index + 1] = u16::from_be_bytes([octets[2], octets[3]]);
            piece_index += 2;
            break;
        } else if chars.get(ptr) == Some(&':') {
            ptr += 1;
            if chars.get(ptr).is_none() {
                error_handler.validation_error(ValidationError::Ipv6InvalidCodepoint);
                return Err(Ipv6ParseError::InvalidCodePoint);
            }
        } else if chars.get(ptr).is_some() {
            error_handler.validation_error(ValidationError::Ipv6InvalidCodepoint);
            return Err(Ipv6ParseError::InvalidCodePoint);
        }

        address[piece_index] = value;
        piece_index += 1;
    }

    if let Some(compress_value) = compress {
        let mut swaps = piece_index - compress_value;
        piece_index = 7;
        while piece_index != 0 && swaps > 0 {
            address.swap(piece_index, compress_value + swaps - 1);
            piece_index -= 1;
            swaps -= 1;
        }
    } else if piece_index != 8 {
        error_handler.validation_error(ValidationError::Ipv6TooFewPieces);
        return Err(Ipv6ParseError::TooFewPieces);
    }

    Ok(net::Ipv6Addr::new(
        address[0], address[1], address[2], address[3], address[4], address[5], address[6],
        address[7],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation_error::IgnoreValidationErrors;

    #[test]
    fn ipv4_decimal() {
        let mut ignore = IgnoreValidationErrors;
        assert_eq!(
            ipv4_parse("127.0.0.1", &mut ignore),
            Ok(Some(net::Ipv4Addr::LOCALHOST))
        );
    }

    #[test]
    fn ipv4_mixed_radix() {
        let mut ignore = IgnoreValidationErrors;
        // RFC 6943 forbids this, the URL spec requires it.
        assert_eq!(
            ipv4_parse("0xff.1.0x2.3", &mut ignore),
            Ok(Some(net::Ipv4Addr::new(255, 1, 2, 3)))
        );
    }

    #[test]
    fn ipv4_short_forms() {
        let mut ignore = IgnoreValidationErrors;
        assert_eq!(
            ipv4_parse("0x7f.1", &mut ignore),
            Ok(Some(net::Ipv4Addr::new(127, 0, 0, 1)))
        );
        assert_eq!(
            ipv4_parse("192.168.257", &mut ignore),
            Ok(Some(net::Ipv4Addr::new(192, 168, 1, 1)))
        );
    }

    #[test]
    fn ipv4_non_numeric_is_not_an_address() {
        let mut ignore = IgnoreValidationErrors;
        assert_eq!(ipv4_parse("example.com", &mut ignore), Ok(None));
    }

    #[test]
    fn ipv4_too_many_parts_is_fatal() {
        let mut ignore = IgnoreValidationErrors;
        assert_eq!(
            ipv4_parse("1.2.3.4.5", &mut ignore),
            Err(Ipv4ParseError::TooManyParts)
        );
    }

    #[test]
    fn ipv6_roundtrip() {
        let mut ignore = IgnoreValidationErrors;
        let parsed = ipv6_parse("1:1:2:3:4:5:6:7", &mut ignore).unwrap();
        assert_eq!(parsed, net::Ipv6Addr::new(1, 1, 2, 3, 4, 5, 6, 7));
    }

    #[test]
    fn ipv6_compression() {
        let mut ignore = IgnoreValidationErrors;
        let parsed = ipv6_parse("2001:db8::1", &mut ignore).unwrap();
        assert_eq!(parsed, net::Ipv6Addr::new(0x2001, 0x0db8, 0, 0, 0, 0, 0, 1));
    }

    #[test]
    fn ipv6_embedded_ipv4() {
        let mut ignore = IgnoreValidationErrors;
        let parsed = ipv6_parse("::ffff:127.0.0.1", &mut ignore).unwrap();
        assert_eq!(
            parsed,
            net::Ipv6Addr::new(0, 0, 0, 0, 0, 0xffff, 0x7f00, 0x0001)
        );
    }

    #[test]
    fn ipv6_too_few_pieces() {
        let mut ignore = IgnoreValidationErrors;
        assert_eq!(
            ipv6_parse("1:2:3", &mut ignore),
            Err(Ipv6ParseError::TooFewPieces)
        );
    }

    #[test]
    fn ipv6_multiple_compression_rejected() {
        let mut ignore = IgnoreValidationErrors;
        assert_eq!(
            ipv6_parse("1::1::1", &mut ignore),
            Err(Ipv6ParseError::MultipleCompression)
        );
    }
}
