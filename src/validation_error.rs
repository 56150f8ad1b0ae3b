//! Non-fatal diagnostics raised while parsing a URL.
//!
//! [Specification](https://url.spec.whatwg.org/#validation-error)

/// A condition the parser noticed but did not need to abort for.
///
/// Most of these correspond 1:1 to a named validation error in the
/// specification. Fatal conditions are not represented here: they surface as
/// `Err` from the parsing functions instead, since by definition there is no
/// URL left to keep parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// The input contained a leading or trailing C0 control or space, which was trimmed.
    UnexpectedC0OrSpace,

    /// The input contained an ASCII tab or newline, which was removed.
    ///
    /// ## Example
    /// `"ht\tt\np://example.com"`
    UnexpectedTabOrNewline,

    /// The input does not start with an ASCII alpha where a scheme was expected.
    InvalidSchemeStart,

    /// The scheme could not be parsed from the input.
    InvalidScheme,

    /// The input has no scheme and no usable base URL to inherit one from.
    MissingSchemeNonRelativeUrl,

    /// The input's scheme is "file" but is not followed by "//".
    ///
    /// ## Example
    /// `"file:c:/my-secret-folder"`
    FileSchemeMissingFollowingSolidus,

    /// A relative reference does not start with `/`.
    RelativeUrlMissingBeginningSolidus,

    /// A special-scheme URL uses `\` instead of `/`.
    ///
    /// ## Example
    /// `"https://example.org\path\to\file"`
    UnexpectedReverseSolidus,

    /// The input's scheme is not followed by "//" before the authority.
    MissingSolidusBeforeAuthority,

    /// More than one unescaped `@` was seen in the authority.
    UnexpectedCommercialAt,

    /// The authority ended without producing a host.
    ///
    /// ## Examples
    /// * `"https://user@/path"`
    MissingCredentials,

    /// A `:` was seen in the authority with no preceding host.
    UnexpectedPortWithoutHost,

    /// A special-scheme URL has an empty host.
    ///
    /// ## Examples
    /// * `"https://#fragment"`
    /// * `"https://:443"`
    EmptyHostSpecialScheme,

    /// The host failed to parse; see the wrapped error for the reason.
    HostInvalid,

    /// The input's port is too big (fatal).
    ///
    /// ## Example
    /// `"https://example.org:70000"`
    PortOutOfRange,

    /// The input's port is not a number (fatal).
    ///
    /// ## Example
    /// `"https://example.org:7z"`
    PortInvalid,

    /// A relative-URL string starts with a Windows drive letter and the base URL's scheme is "file".
    UnexpectedWindowsDriveLetter,

    /// A `file:` URL's host is a Windows drive letter.
    ///
    /// ## Example
    /// `"file://c:"`
    UnexpectedWindowsDriveLetterHost,

    /// A `file:` URL unexpectedly carries host information.
    UnexpectedHostFileScheme,

    /// A path-only URL ended up with zero segments where one was expected.
    UnexpectedEmptyPath,

    /// A code point outside the URL code-point set was found.
    ///
    /// ## Examples
    /// * `"https://example.org/>"`
    /// * `" https://example.org "`
    /// * `"https://example.org/%s"`
    InvalidUrlCodePoint,

    /// A `%` is not followed by two ASCII hex digits.
    UnescapedPercentSign,

    /// The input's host contains a forbidden domain code point.
    ///
    /// ## Example
    /// Hosts are percent-decoded before being processed when the URL is special, which would result in the following host portion becoming "exa#mple.org" and thus triggering this error.
    ///
    /// `"https://exa%23mple.org"`
    DomainInvalidCodepoint,

    /// An opaque host (in a URL that is not special) contains a forbidden host code point.
    ///
    /// ## Example
    /// `"foo://exa[mple.org"`
    HostInvalidCodepoint,

    /// An IPv4 address ends with a `.`
    ///
    /// ## Example
    /// `"https://127.0.0.1./"`
    Ipv4EmptyPart,

    /// An IPv4 address does not consist of exactly 4 parts.
    ///
    /// ## Example
    /// `"https://1.2.3.4.5/"`
    Ipv4TooManyParts,

    /// An IPv4 address part is not numeric.
    ///
    /// ## Example
    /// `"https://test.42"`
    Ipv4NonNumericPart,

    /// The IPv4 address contains numbers expressed using hexadecimal or octal digits.
    ///
    /// ## Example
    /// `"https://127.0.0x0.1"`
    Ipv4NonDecimalPart,

    /// An IPv4 address part exceeds 255.
    ///
    /// ## Example
    /// `"https://255.255.4000.1"`
    Ipv4OutOfRangePart,

    /// An IPv6 address is missing the closing `]`.
    ///
    /// ## Example
    /// `"https://[::1"`
    Ipv6Unclosed,

    /// An IPv6 address begins with improper compression.
    ///
    /// ## Example
    /// `"https://[:1]"`
    Ipv6InvalidCompression,

    /// An IPv6 address contains more than 8 pieces.
    ///
    /// ## Example
    /// `"https://[1:2:3:4:5:6:7:8:9]"`
    Ipv6TooManyPieces,

    /// An IPv6 address is compressed in more than one spot.
    ///
    /// ## Example
    /// `"https://[1::1::1]"`
    Ipv6MultipleCompression,

    /// An IPv6 address contains a code point that is neither an ASCII hex digit nor a `:`, or it unexpectedly ends.
    ///
    /// ## Examples
    /// * `"https://[1:2:3!:4]"`
    /// * `"https://[1:2:3:]"`
    Ipv6InvalidCodepoint,

    /// An uncompressed IPv6 address contains fewer than 8 pieces.
    ///
    /// ## Example
    /// `"https://[1:2:3]"`
    Ipv6TooFewPieces,

    /// An IPv6 address with embedded IPv4 syntax has more than 6 pieces before the IPv4 tail.
    ///
    /// ## Example
    /// `"https://[1:1:1:1:1:1:1:127.0.0.1]"`
    Ipv4InIpv6TooManyPieces,

    /// An IPv6 address with embedded IPv4 syntax: a part is empty, non-ASCII-digit, leading-zero, or there are too many parts.
    ///
    /// ## Examples
    /// * `"https://[ffff::.0.0.1]"`
    /// * `"https://[ffff::127.0.xyz.1]"`
    /// * `"https://[ffff::127.00.0.1]"`
    Ipv4InIpv6InvalidCodepoint,

    /// An IPv6 address with embedded IPv4 syntax: a part exceeds 255.
    ///
    /// ## Example
    /// `"https://[ffff::127.0.0.4000]"`
    Ipv4InIpv6OutOfRangePart,

    /// An IPv6 address with embedded IPv4 syntax: fewer than 4 parts were found.
    ///
    /// ## Example
    /// `"https://[ffff::127.0.0]"`
    Ipv4InIpv6TooFewParts,
}

impl ValidationError {
    /// Whether this condition aborts parsing outright.
    ///
    /// Only port parsing can fail this way today; every other validation
    /// error is recoverable by definition (the algorithm always has a
    /// well-defined next step to take).
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::PortOutOfRange | Self::PortInvalid)
    }
}

/// Receives every [`ValidationError`] encountered while parsing, in order.
///
/// [Specification](https://url.spec.whatwg.org/#validation-error)
///
/// This is the error-accumulator the algorithm is defined in terms of: the
/// parser never branches on what a handler does with an error, it just
/// reports and moves on.
pub trait ValidationErrorHandler {
    fn validation_error(&mut self, error: ValidationError);
}

/// The default handler: observes nothing, costs nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct IgnoreValidationErrors;

impl ValidationErrorHandler for IgnoreValidationErrors {
    #[inline]
    fn validation_error(&mut self, _error: ValidationError) {}
}

/// Collects every validation error into a list, for callers that want the
/// full diagnostic picture rather than just the parse result.
impl ValidationErrorHandler for Vec<ValidationError> {
    fn validation_error(&mut self, error: ValidationError) {
        log::debug!("URL validation error: {error:?}");
        self.push(error);
    }
}
