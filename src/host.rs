//! Host parsing and serialization.
//!
//! [Specification](https://url.spec.whatwg.org/#host-representation)

use std::{fmt, net};

use crate::{
    ascii,
    ip::{self, ipv4_parse, ipv6_parse, Ipv4ParseError, Ipv6ParseError},
    percent_encode::{self, percent_encode},
    validation_error::{ValidationError, ValidationErrorHandler},
};

/// Typically either a network address or an opaque identifier in situations
/// where a network address is not required.
///
/// [Specification](https://url.spec.whatwg.org/#concept-host)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Host {
    Domain(String),
    Ip(net::IpAddr),
    OpaqueHost(String),
    Empty,
}

impl Host {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// <https://url.spec.whatwg.org/#host-serializing>
impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(net::IpAddr::V4(ipv4)) => write!(f, "{ipv4}"),
            Self::Ip(net::IpAddr::V6(ipv6)) => write!(f, "[{ipv6}]"),
            Self::Domain(host) | Self::OpaqueHost(host) => f.write_str(host),
            Self::Empty => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostParseError {
    /// An IPv6 literal (`[...]`) is missing its closing bracket.
    Unclosed,
    ForbiddenCodePoint,
    Domain(DomainToAsciiError),
    Ipv4(Ipv4ParseError),
    Ipv6(Ipv6ParseError),
}

impl fmt::Display for HostParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unclosed => f.write_str("IPv6 address is missing a closing ']'"),
            Self::ForbiddenCodePoint => f.write_str("host contains a forbidden code point"),
            Self::Domain(e) => write!(f, "domain could not be converted to ASCII: {e}"),
            Self::Ipv4(e) => write!(f, "{e}"),
            Self::Ipv6(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HostParseError {}

/// A single failure reason for [`ToAscii::to_ascii`]. This crate's default
/// implementation never produces one (plain ASCII domains never fail), but a
/// real IDNA implementation plugged in via `ToAscii` can report one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainToAsciiError;

impl fmt::Display for DomainToAsciiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("domain to ASCII conversion failed")
    }
}

impl std::error::Error for DomainToAsciiError {}

/// Converts a (already percent-decoded) domain to an ASCII domain.
///
/// [Specification](https://url.spec.whatwg.org/#concept-domain-to-ascii)
///
/// This crate does not itself implement IDNA/Punycode: the conversion is
/// pluggable so that callers who need internationalized domain names can
/// supply a real implementation (e.g. backed by the `idna` crate) without
/// this crate depending on one. [`AsciiOnly`] is the default: it accepts a
/// domain unchanged if it is already ASCII, and otherwise fails.
pub trait ToAscii {
    fn to_ascii(&self, domain: &str) -> Result<String, DomainToAsciiError>;
}

/// The default [`ToAscii`] implementation: passes pure-ASCII domains through
/// (lowercased), rejects anything else.
#[derive(Clone, Copy, Debug, Default)]
pub struct AsciiOnly;

impl ToAscii for AsciiOnly {
    fn to_ascii(&self, domain: &str) -> Result<String, DomainToAsciiError> {
        if domain.is_ascii() {
            Ok(domain.to_ascii_lowercase())
        } else {
            Err(DomainToAsciiError)
        }
    }
}

/// <https://url.spec.whatwg.org/#ends-in-a-number-checker>
fn ends_in_a_number(input: &str) -> bool {
    let mut parts: Vec<&str> = input.split('.').collect();

    if let Some(&last) = parts.last() {
        if last.is_empty() && parts.len() > 1 {
            parts.pop();
        }
    }

    let Some(&last) = parts.last() else {
        return false;
    };

    if !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }

    ip::looks_like_ipv4_number(last)
}

/// <https://url.spec.whatwg.org/#concept-host-parser>
pub(crate) fn host_parse<H, A>(
    input: &str,
    is_not_special: bool,
    to_ascii: &A,
    error_handler: &mut H,
) -> Result<Host, HostParseError>
where
    H: ValidationErrorHandler,
    A: ToAscii,
{
    if let Some(ipv6_text) = input.strip_prefix('[') {
        let Some(ipv6_text) = ipv6_text.strip_suffix(']') else {
            error_handler.validation_error(ValidationError::Ipv6Unclosed);
            return Err(HostParseError::Unclosed);
        };
        let address = ipv6_parse(ipv6_text, error_handler).map_err(HostParseError::Ipv6)?;
        return Ok(Host::Ip(net::IpAddr::V6(address)));
    }

    if is_not_special {
        return opaque_host_parse(input, error_handler);
    }

    if input.is_empty() {
        return Ok(Host::Empty);
    }

    let domain = percent_encode::percent_decode(input);

    let ascii_domain = to_ascii
        .to_ascii(&domain)
        .map_err(HostParseError::Domain)?;

    if ascii_domain
        .bytes()
        .any(ascii::is_forbidden_domain_code_point)
    {
        error_handler.validation_error(ValidationError::DomainInvalidCodepoint);
        return Err(HostParseError::ForbiddenCodePoint);
    }

    if ends_in_a_number(&ascii_domain) {
        let address = ipv4_parse(&ascii_domain, error_handler).map_err(HostParseError::Ipv4)?;
        return match address {
            Some(address) => Ok(Host::Ip(net::IpAddr::V4(address))),
            None => Err(HostParseError::Ipv4(Ipv4ParseError::NonNumericPart)),
        };
    }

    Ok(Host::Domain(ascii_domain))
}

/// <https://url.spec.whatwg.org/#concept-opaque-host-parser>
fn opaque_host_parse<H: ValidationErrorHandler>(
    input: &str,
    error_handler: &mut H,
) -> Result<Host, HostParseError> {
    if input.is_empty() {
        return Ok(Host::Empty);
    }

    if input.bytes().any(ascii::is_forbidden_host_code_point) {
        error_handler.validation_error(ValidationError::HostInvalidCodepoint);
        return Err(HostParseError::ForbiddenCodePoint);
    }

    let bytes = input.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'%' {
            let valid_escape = bytes
                .get(i + 1)
                .copied()
                .zip(bytes.get(i + 2).copied())
                .is_some_and(|(a, c)| ascii::hex_value(a).is_some() && ascii::hex_value(c).is_some());
            if !valid_escape {
                error_handler.validation_error(ValidationError::UnescapedPercentSign);
            }
        }
    }
    for c in input.chars() {
        if c != '%' && !is_url_code_point(c) {
            error_handler.validation_error(ValidationError::InvalidUrlCodePoint);
        }
    }

    let mut out = String::new();
    percent_encode(input, &percent_encode::C0_CONTROL, &mut out);
    Ok(Host::OpaqueHost(out))
}

/// <https://url.spec.whatwg.org/#url-code-points>
fn is_url_code_point(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '$'
                | '&'
                | '\''
                | '('
                | ')'
                | '*'
                | '+'
                | ','
                | '-'
                | '.'
                | '/'
                | ':'
                | ';'
                | '='
                | '?'
                | '@'
                | '_'
                | '~'
        )
        || matches!(c, '\u{A0}'..='\u{10FFFD}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation_error::IgnoreValidationErrors;

    fn parse(input: &str, is_not_special: bool) -> Result<Host, HostParseError> {
        let mut ignore = IgnoreValidationErrors;
        host_parse(input, is_not_special, &AsciiOnly, &mut ignore)
    }

    #[test]
    fn parses_domain() {
        assert_eq!(parse("example.com", false), Ok(Host::Domain("example.com".to_string())));
    }

    #[test]
    fn domain_is_lowercased() {
        assert_eq!(parse("EXAMPLE.com", false), Ok(Host::Domain("example.com".to_string())));
    }

    #[test]
    fn parses_ipv4_domain() {
        assert_eq!(
            parse("127.0.0.1", false),
            Ok(Host::Ip(net::IpAddr::V4(net::Ipv4Addr::LOCALHOST)))
        );
    }

    #[test]
    fn parses_bracketed_ipv6() {
        assert_eq!(
            parse("[::1]", false),
            Ok(Host::Ip(net::IpAddr::V6(net::Ipv6Addr::LOCALHOST)))
        );
    }

    #[test]
    fn unclosed_ipv6_is_an_error() {
        assert_eq!(parse("[::1", false), Err(HostParseError::Unclosed));
    }

    #[test]
    fn forbidden_code_point_in_domain_is_rejected() {
        assert_eq!(
            parse("exa#mple.org", false),
            Err(HostParseError::ForbiddenCodePoint)
        );
    }

    #[test]
    fn opaque_host_is_percent_encoded() {
        // Non-ASCII bytes are always escaped in an opaque host, even though
        // the opaque-host percent-encode set only names C0 controls: any
        // byte >= 0x80 falls outside the "ASCII and not in set" fast path.
        assert_eq!(
            parse("exa\u{e9}mple", true),
            Ok(Host::OpaqueHost("exa%C3%A9mple".to_string()))
        );
    }

    #[test]
    fn opaque_host_rejects_forbidden_code_point() {
        assert_eq!(
            parse("exa mple", true),
            Err(HostParseError::ForbiddenCodePoint)
        );
    }

    #[test]
    fn empty_host_is_allowed_when_not_special() {
        assert_eq!(parse("", true), Ok(Host::Empty));
    }

    #[test]
    fn display_matches_serializer() {
        assert_eq!(Host::Domain("example.com".into()).to_string(), "example.com");
        assert_eq!(
            Host::Ip(net::IpAddr::V6(net::Ipv6Addr::LOCALHOST)).to_string(),
            "[::1]"
        );
        assert_eq!(Host::Empty.to_string(), "");
    }
}
