//! The basic URL parser: a state machine that consumes an input string (plus
//! an optional base URL) and produces a [`Url`](crate::Url).
//!
//! [Specification](https://url.spec.whatwg.org/#url-parsing)

use std::fmt;

use crate::{
    ascii,
    host::{self, Host, HostParseError, ToAscii},
    percent_encode::{self, percent_encode_char},
    url::{is_special_scheme, Url, UrlPath},
    util,
    validation_error::{ValidationError, ValidationErrorHandler},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// No scheme could be parsed, and no base URL was given to supply one.
    MissingSchemeNonRelativeUrl,
    /// A state override was given and the input did not produce a valid scheme.
    InvalidScheme,
    /// The authority component ended without ever producing a host.
    MissingHost,
    /// Parsing the host component failed; see the wrapped error.
    Host(HostParseError),
    /// The port number does not fit in 16 bits.
    PortOutOfRange,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSchemeNonRelativeUrl => {
                f.write_str("input has no scheme and no base URL was given")
            },
            Self::InvalidScheme => f.write_str("input does not start with a valid scheme"),
            Self::MissingHost => f.write_str("authority is missing a host"),
            Self::Host(e) => write!(f, "invalid host: {e}"),
            Self::PortOutOfRange => f.write_str("port number is out of range"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<HostParseError> for ParseError {
    fn from(value: HostParseError) -> Self {
        Self::Host(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ParserState {
    SchemeStart,
    Scheme,
    NoScheme,
    SpecialRelativeOrAuthority,
    PathOrAuthority,
    Relative,
    RelativeSlash,
    SpecialAuthoritySlashes,
    SpecialAuthorityIgnoreSlashes,
    Authority,
    Host,
    Hostname,
    Port,
    File,
    FileSlash,
    FileHost,
    PathStart,
    Path,
    OpaquePath,
    Query,
    Fragment,
}

/// Runs the basic URL parser over `input`.
///
/// [Specification](https://url.spec.whatwg.org/#concept-basic-url-parser)
pub(crate) fn basic_url_parse<H, A>(
    input: &str,
    base: Option<&Url>,
    given_url: Option<Url>,
    state_override: Option<ParserState>,
    to_ascii: &A,
    error_handler: &mut H,
) -> Result<Url, ParseError>
where
    H: ValidationErrorHandler,
    A: ToAscii,
{
    let parser = BasicParser::new(
        input,
        base.cloned(),
        given_url,
        state_override,
        to_ascii,
        error_handler,
    );
    Ok(parser.run()?.url)
}

pub(crate) struct BasicParser<'a, H, A> {
    pub(crate) url: Url,
    base: Option<Url>,
    state: ParserState,
    state_override: Option<ParserState>,
    buffer: String,
    at_sign_seen: bool,
    inside_brackets: bool,
    password_token_seen: bool,
    input: Vec<char>,
    /// Signed so that "decrease pointer by 1" at position 0 (used throughout
    /// the state machine to re-visit the current code point after a state
    /// transition) is representable instead of silently clamping to 0 and
    /// skipping a character.
    ptr: isize,
    to_ascii: &'a A,
    error_handler: &'a mut H,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StartOver {
    Yes,
    No,
}

impl<'a, H: ValidationErrorHandler, A: ToAscii> BasicParser<'a, H, A> {
    pub(crate) fn new(
        input: &str,
        base: Option<Url>,
        given_url: Option<Url>,
        state_override: Option<ParserState>,
        to_ascii: &'a A,
        error_handler: &'a mut H,
    ) -> Self {
        let url = given_url.unwrap_or_default();

        let is_c0_or_space = |c: char| c.is_ascii() && ascii::is_c0_or_space(c as u8);
        let had_leading_or_trailing = input.chars().next().is_some_and(is_c0_or_space)
            || input.chars().last().is_some_and(is_c0_or_space);
        if had_leading_or_trailing {
            error_handler.validation_error(ValidationError::UnexpectedC0OrSpace);
        }
        let trimmed = input
            .trim_start_matches(is_c0_or_space)
            .trim_end_matches(is_c0_or_space);

        let had_tab_or_newline = trimmed
            .chars()
            .any(|c| c.is_ascii() && ascii::is_ascii_tab_or_newline(c as u8));
        if had_tab_or_newline {
            error_handler.validation_error(ValidationError::UnexpectedTabOrNewline);
        }

        let filtered: Vec<char> = trimmed
            .chars()
            .filter(|c| !(c.is_ascii() && ascii::is_ascii_tab_or_newline(*c as u8)))
            .collect();

        Self {
            url,
            base,
            state: state_override.unwrap_or(ParserState::SchemeStart),
            state_override,
            buffer: String::new(),
            at_sign_seen: false,
            inside_brackets: false,
            password_token_seen: false,
            input: filtered,
            ptr: 0isize,
            to_ascii,
            error_handler,
        }
    }

    pub(crate) fn run(mut self) -> Result<Self, ParseError> {
        loop {
            let start_over = self.step()?;

            if start_over == StartOver::Yes {
                self.ptr = 0;
                continue;
            }

            // The main loop always advances the pointer by one; a state that
            // needs to re-examine the current code point under a new state
            // calls `go_back`/`go_back_n` first, so the net effect is "stay
            // put". This also handles re-examining position 0, which a
            // saturating decrement would otherwise swallow.
            self.ptr += 1;
            if self.ptr < 0 || self.ptr as usize > self.input.len() {
                break;
            }
        }
        Ok(self)
    }

    fn c(&self) -> Option<char> {
        usize::try_from(self.ptr).ok().and_then(|i| self.input.get(i)).copied()
    }

    fn remaining(&self) -> &[char] {
        let next = self.ptr + 1;
        match usize::try_from(next) {
            Ok(i) if i < self.input.len() => &self.input[i..],
            _ => &[],
        }
    }

    fn remaining_starts_with(&self, c: char) -> bool {
        self.remaining().first() == Some(&c)
    }

    fn set_state(&mut self, state: ParserState) {
        self.state = state;
    }

    fn go_back(&mut self) {
        self.ptr -= 1;
    }

    fn go_back_n(&mut self, n: usize) {
        self.ptr -= n as isize;
    }

    fn encode_char(&mut self, c: char, set: &crate::set::AsciiSet, to: Buffer) {
        let mut out = String::new();
        percent_encode_char(c, set, &mut out);
        match to {
            Buffer::Scratch => self.buffer.push_str(&out),
            Buffer::Fragment => {
                self.url.fragment.get_or_insert_with(String::new).push_str(&out);
            },
            Buffer::OpaquePath => {
                if let UrlPath::Opaque(path) = &mut self.url.path {
                    path.push_str(&out);
                }
            },
        }
    }

    #[allow(clippy::too_many_lines)]
    fn step(&mut self) -> Result<StartOver, ParseError> {
        match self.state {
            // https://url.spec.whatwg.org/#scheme-start-state
            ParserState::SchemeStart => {
                if let Some(c) = self.c().filter(char::is_ascii_alphabetic) {
                    self.buffer.push(c.to_ascii_lowercase());
                    self.set_state(ParserState::Scheme);
                } else if self.state_override.is_none() {
                    self.set_state(ParserState::NoScheme);
                    self.go_back();
                } else {
                    self.error_handler.validation_error(ValidationError::InvalidSchemeStart);
                    return Err(ParseError::InvalidScheme);
                }
            },

            // https://url.spec.whatwg.org/#scheme-state
            ParserState::Scheme => {
                let c = self.c();
                if let Some(c) =
                    c.filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                {
                    self.buffer.push(c.to_ascii_lowercase());
                } else if c == Some(':') {
                    if self.state_override.is_some() {
                        let buffer_is_special = is_special_scheme(&self.buffer);
                        if self.url.is_special() != buffer_is_special {
                            return Ok(StartOver::No);
                        }
                        if (self.url.includes_credentials() || self.url.port.is_some())
                            && self.buffer == "file"
                        {
                            return Ok(StartOver::No);
                        }
                        if self.url.scheme == "file"
                            && self.url.host.as_ref().is_some_and(Host::is_empty)
                        {
                            return Ok(StartOver::No);
                        }
                    }

                    self.url.scheme = std::mem::take(&mut self.buffer);

                    if self.state_override.is_some() {
                        if self.url.port == crate::url::default_port_for_scheme(&self.url.scheme) {
                            self.url.port = None;
                        }
                        return Ok(StartOver::No);
                    }

                    if self.url.scheme == "file" {
                        if self.remaining().first() != Some(&'/')
                            || self.remaining().get(1) != Some(&'/')
                        {
                            self.error_handler
                                .validation_error(ValidationError::FileSchemeMissingFollowingSolidus);
                        }
                        self.set_state(ParserState::File);
                    } else if self.url.is_special()
                        && self.base.as_ref().is_some_and(|b| b.scheme == self.url.scheme)
                    {
                        self.set_state(ParserState::SpecialRelativeOrAuthority);
                    } else if self.url.is_special() {
                        self.set_state(ParserState::SpecialAuthoritySlashes);
                    } else if self.remaining_starts_with('/') {
                        self.set_state(ParserState::PathOrAuthority);
                        self.ptr += 1;
                    } else {
                        self.url.path = UrlPath::Opaque(String::new());
                        self.set_state(ParserState::OpaquePath);
                    }
                } else if self.state_override.is_none() {
                    self.buffer.clear();
                    self.set_state(ParserState::NoScheme);
                    return Ok(StartOver::Yes);
                } else {
                    self.error_handler.validation_error(ValidationError::InvalidScheme);
                    return Err(ParseError::InvalidScheme);
                }
            },

            // https://url.spec.whatwg.org/#no-scheme-state
            ParserState::NoScheme => {
                let c = self.c();
                let base_has_opaque_path = self.base.as_ref().is_some_and(Url::has_opaque_path);

                if self.base.is_none() || (base_has_opaque_path && c != Some('#')) {
                    self.error_handler
                        .validation_error(ValidationError::MissingSchemeNonRelativeUrl);
                    return Err(ParseError::MissingSchemeNonRelativeUrl);
                }

                let base = self.base.clone().expect("checked above");

                if base_has_opaque_path && c == Some('#') {
                    self.url.scheme = base.scheme.clone();
                    self.url.path = base.path.clone();
                    self.url.query = base.query.clone();
                    self.url.fragment = Some(String::new());
                    self.set_state(ParserState::Fragment);
                } else if base.scheme != "file" {
                    self.set_state(ParserState::Relative);
                    self.go_back();
                } else {
                    self.set_state(ParserState::File);
                    self.go_back();
                }
            },

            // https://url.spec.whatwg.org/#special-relative-or-authority-state
            ParserState::SpecialRelativeOrAuthority => {
                if self.c() == Some('/') && self.remaining_starts_with('/') {
                    self.set_state(ParserState::SpecialAuthorityIgnoreSlashes);
                    self.ptr += 1;
                } else {
                    self.error_handler
                        .validation_error(ValidationError::MissingSolidusBeforeAuthority);
                    self.set_state(ParserState::Relative);
                    self.go_back();
                }
            },

            // https://url.spec.whatwg.org/#path-or-authority-state
            ParserState::PathOrAuthority => {
                if self.c() == Some('/') {
                    self.set_state(ParserState::Authority);
                } else {
                    self.set_state(ParserState::Path);
                    self.go_back();
                }
            },

            // https://url.spec.whatwg.org/#relative-state
            ParserState::Relative => {
                let base = self.base.clone().expect("relative state requires a base");
                debug_assert_ne!(base.scheme, "file");
                self.url.scheme = base.scheme.clone();

                let c = self.c();
                if c == Some('/') {
                    self.set_state(ParserState::RelativeSlash);
                } else if self.url.is_special() && c == Some('\\') {
                    self.error_handler.validation_error(ValidationError::UnexpectedReverseSolidus);
                    self.set_state(ParserState::RelativeSlash);
                } else {
                    self.url.username = base.username.clone();
                    self.url.password = base.password.clone();
                    self.url.host = base.host.clone();
                    self.url.port = base.port;
                    self.url.path = base.path.clone();
                    self.url.query = base.query.clone();

                    if c == Some('?') {
                        self.url.query = Some(String::new());
                        self.set_state(ParserState::Query);
                    } else if c == Some('#') {
                        self.url.fragment = Some(String::new());
                        self.set_state(ParserState::Fragment);
                    } else if c.is_some() {
                        self.url.query = None;
                        self.url.shorten_path();
                        self.set_state(ParserState::Path);
                        self.go_back();
                    }
                }
            },

            // https://url.spec.whatwg.org/#relative-slash-state
            ParserState::RelativeSlash => {
                let c = self.c();
                if self.url.is_special() && matches!(c, Some('/' | '\\')) {
                    if c == Some('\\') {
                        self.error_handler
                            .validation_error(ValidationError::UnexpectedReverseSolidus);
                    }
                    self.set_state(ParserState::SpecialAuthorityIgnoreSlashes);
                } else if c == Some('/') {
                    self.set_state(ParserState::Authority);
                } else {
                    let base = self.base.clone().expect("relative-slash state requires a base");
                    self.url.username = base.username.clone();
                    self.url.password = base.password.clone();
                    self.url.host = base.host.clone();
                    self.url.port = base.port;
                    self.set_state(ParserState::Path);
                    self.go_back();
                }
            },

            // https://url.spec.whatwg.org/#special-authority-slashes-state
            ParserState::SpecialAuthoritySlashes => {
                if self.c() == Some('/') && self.remaining_starts_with('/') {
                    self.set_state(ParserState::SpecialAuthorityIgnoreSlashes);
                    self.ptr += 1;
                } else {
                    self.error_handler
                        .validation_error(ValidationError::MissingSolidusBeforeAuthority);
                    self.set_state(ParserState::SpecialAuthorityIgnoreSlashes);
                    self.go_back();
                }
            },

            // https://url.spec.whatwg.org/#special-authority-ignore-slashes-state
            ParserState::SpecialAuthorityIgnoreSlashes => {
                if !matches!(self.c(), Some('/' | '\\')) {
                    self.set_state(ParserState::Authority);
                    self.go_back();
                } else {
                    self.error_handler
                        .validation_error(ValidationError::MissingSolidusBeforeAuthority);
                }
            },

            // https://url.spec.whatwg.org/#authority-state
            ParserState::Authority => {
                let c = self.c();
                if c == Some('@') {
                    self.error_handler.validation_error(ValidationError::UnexpectedCommercialAt);

                    if self.at_sign_seen {
                        self.buffer.insert_str(0, "%40");
                    }
                    self.at_sign_seen = true;

                    let code_points: Vec<char> = self.buffer.chars().collect();
                    for code_point in code_points {
                        if code_point == ':' && !self.password_token_seen {
                            self.password_token_seen = true;
                            continue;
                        }

                        let mut encoded = String::new();
                        percent_encode_char(code_point, &percent_encode::USERINFO, &mut encoded);

                        if self.password_token_seen {
                            self.url.password.push_str(&encoded);
                        } else {
                            self.url.username.push_str(&encoded);
                        }
                    }

                    self.buffer.clear();
                } else if matches!(c, None | Some('/' | '?' | '#'))
                    || (self.url.is_special() && c == Some('\\'))
                {
                    if self.at_sign_seen && self.buffer.is_empty() {
                        self.error_handler.validation_error(ValidationError::MissingCredentials);
                        return Err(ParseError::MissingHost);
                    }

                    self.go_back_n(self.buffer.chars().count() + 1);
                    self.buffer.clear();
                    self.set_state(ParserState::Host);
                } else {
                    self.buffer.push(c.expect("handled above"));
                }
            },

            // https://url.spec.whatwg.org/#host-state
            // https://url.spec.whatwg.org/#hostname-state
            ParserState::Host | ParserState::Hostname => {
                if self.state_override.is_some() && self.url.scheme == "file" {
                    self.go_back();
                    self.set_state(ParserState::FileHost);
                    return Ok(StartOver::No);
                }

                let c = self.c();
                if c == Some(':') && !self.inside_brackets {
                    if self.buffer.is_empty() {
                        self.error_handler
                            .validation_error(ValidationError::UnexpectedPortWithoutHost);
                        return Err(ParseError::MissingHost);
                    }

                    if matches!(self.state_override, Some(ParserState::Hostname)) {
                        return Ok(StartOver::No);
                    }

                    let host = host::host_parse(
                        &self.buffer,
                        !self.url.is_special(),
                        self.to_ascii,
                        self.error_handler,
                    )?;
                    self.url.host = Some(host);
                    self.buffer.clear();
                    self.set_state(ParserState::Port);
                } else if matches!(c, None | Some('/' | '?' | '#'))
                    || (self.url.is_special() && c == Some('\\'))
                {
                    self.go_back();

                    if self.url.is_special() && self.buffer.is_empty() {
                        self.error_handler
                            .validation_error(ValidationError::EmptyHostSpecialScheme);
                        return Err(ParseError::MissingHost);
                    }
                    if self.state_override.is_some()
                        && self.buffer.is_empty()
                        && (self.url.includes_credentials() || self.url.port.is_some())
                    {
                        return Ok(StartOver::No);
                    }

                    let host = host::host_parse(
                        &self.buffer,
                        !self.url.is_special(),
                        self.to_ascii,
                        self.error_handler,
                    )?;
                    self.url.host = Some(host);
                    self.buffer.clear();
                    self.set_state(ParserState::PathStart);

                    if self.state_override.is_some() {
                        return Ok(StartOver::No);
                    }
                } else {
                    if c == Some('[') {
                        self.inside_brackets = true;
                    } else if c == Some(']') {
                        self.inside_brackets = false;
                    }
                    self.buffer.push(c.expect("handled above"));
                }
            },

            // https://url.spec.whatwg.org/#port-state
            ParserState::Port => {
                let c = self.c();
                if let Some(digit) = c.filter(char::is_ascii_digit) {
                    self.buffer.push(digit);
                } else if matches!(c, None | Some('/' | '?' | '#'))
                    || (self.url.is_special() && c == Some('\\'))
                    || self.state_override.is_some()
                {
                    if !self.buffer.is_empty() {
                        match self.buffer.parse::<u32>() {
                            Ok(port) if port <= u32::from(u16::MAX) => {
                                let port = port as u16;
                                if crate::url::default_port_for_scheme(&self.url.scheme) == Some(port)
                                {
                                    self.url.port = None;
                                } else {
                                    self.url.port = Some(port);
                                }
                                self.buffer.clear();
                            },
                            _ => {
                                self.error_handler.validation_error(ValidationError::PortOutOfRange);
                                return Err(ParseError::PortOutOfRange);
                            },
                        }
                    }

                    if self.state_override.is_some() {
                        return Ok(StartOver::No);
                    }

                    self.set_state(ParserState::PathStart);
                    self.go_back();
                } else {
                    self.error_handler.validation_error(ValidationError::PortOutOfRange);
                    return Err(ParseError::PortOutOfRange);
                }
            },

            // https://url.spec.whatwg.org/#file-state
            ParserState::File => {
                self.url.scheme = "file".to_string();
                self.url.host = Some(Host::Empty);

                let c = self.c();
                if matches!(c, Some('/' | '\\')) {
                    if c == Some('\\') {
                        self.error_handler
                            .validation_error(ValidationError::UnexpectedReverseSolidus);
                    }
                    self.set_state(ParserState::FileSlash);
                } else if let Some(base) = self.base.clone().filter(|b| b.scheme == "file") {
                    self.url.host = base.host.clone();
                    self.url.path = base.path.clone();
                    self.url.query = base.query.clone();

                    if c == Some('?') {
                        self.url.query = Some(String::new());
                        self.set_state(ParserState::Query);
                    } else if c == Some('#') {
                        self.url.fragment = Some(String::new());
                        self.set_state(ParserState::Fragment);
                    } else if let Some(c) = c {
                        self.url.query = None;
                        let remaining_string: String = self.remaining().iter().collect();
                        let current_and_remaining: String =
                            std::iter::once(c).chain(remaining_string.chars()).collect();
                        if !util::starts_with_windows_drive_letter(&current_and_remaining) {
                            self.url.shorten_path();
                        } else {
                            self.error_handler
                                .validation_error(ValidationError::UnexpectedWindowsDriveLetter);
                            self.url.path = UrlPath::List(Vec::new());
                        }
                        self.set_state(ParserState::Path);
                        self.go_back();
                    }
                } else {
                    self.set_state(ParserState::Path);
                    self.go_back();
                }
            },

            // https://url.spec.whatwg.org/#file-slash-state
            ParserState::FileSlash => {
                let c = self.c();
                if matches!(c, Some('/' | '\\')) {
                    if c == Some('\\') {
                        self.error_handler
                            .validation_error(ValidationError::UnexpectedReverseSolidus);
                    }
                    self.set_state(ParserState::FileHost);
                } else {
                    if let Some(base) = self.base.clone().filter(|b| b.scheme == "file") {
                        self.url.host = base.host.clone();

                        let remaining_string: String = self.remaining().iter().collect();
                        let current_and_remaining: String = self
                            .c()
                            .into_iter()
                            .chain(remaining_string.chars())
                            .collect();
                        let base_first_segment_is_drive_letter = base
                            .path
                            .segments()
                            .first()
                            .is_some_and(|s| util::is_normalized_windows_drive_letter(s));

                        if !util::starts_with_windows_drive_letter(&current_and_remaining)
                            && base_first_segment_is_drive_letter
                        {
                            self.url
                                .path
                                .segments_mut()
                                .push(base.path.segments()[0].clone());
                        }
                    }

                    self.set_state(ParserState::Path);
                    self.go_back();
                }
            },

            // https://url.spec.whatwg.org/#file-host-state
            ParserState::FileHost => {
                let c = self.c();
                if matches!(c, None | Some('/' | '\\' | '?' | '#')) {
                    self.go_back();

                    if self.state_override.is_none() && util::is_windows_drive_letter(&self.buffer) {
                        self.error_handler
                            .validation_error(ValidationError::UnexpectedWindowsDriveLetterHost);
                        self.set_state(ParserState::Path);
                    } else if self.buffer.is_empty() {
                        self.url.host = Some(Host::Empty);

                        if self.state_override.is_some() {
                            return Ok(StartOver::No);
                        }
                        self.set_state(ParserState::PathStart);
                    } else {
                        let mut host =
                            host::host_parse(&self.buffer, false, self.to_ascii, self.error_handler)?;

                        if let Host::Domain(domain) = &host {
                            if domain == "localhost" {
                                host = Host::Empty;
                            }
                        }

                        self.url.host = Some(host);

                        if self.state_override.is_some() {
                            return Ok(StartOver::No);
                        }

                        self.buffer.clear();
                        self.set_state(ParserState::PathStart);
                    }
                } else {
                    self.buffer.push(c.expect("handled above"));
                }
            },

            // https://url.spec.whatwg.org/#path-start-state
            ParserState::PathStart => {
                let c = self.c();
                if self.url.is_special() {
                    if c == Some('\\') {
                        self.error_handler
                            .validation_error(ValidationError::UnexpectedReverseSolidus);
                    }
                    self.set_state(ParserState::Path);
                    if !matches!(c, Some('/' | '\\')) {
                        self.go_back();
                    }
                } else if self.state_override.is_none() && c == Some('?') {
                    self.url.query = Some(String::new());
                    self.set_state(ParserState::Query);
                } else if self.state_override.is_none() && c == Some('#') {
                    self.url.fragment = Some(String::new());
                    self.set_state(ParserState::Fragment);
                } else if c.is_some() {
                    self.set_state(ParserState::Path);
                    if c != Some('/') {
                        self.go_back();
                    }
                } else if self.state_override.is_some() && self.url.host.is_none() {
                    self.url.path.segments_mut().push(String::new());
                }
            },

            // https://url.spec.whatwg.org/#path-state
            ParserState::Path => {
                let c = self.c();
                if matches!(c, None | Some('?' | '#' | '/'))
                    || (self.url.is_special() && c == Some('\\'))
                {
                    if self.url.is_special() && c == Some('\\') {
                        self.error_handler
                            .validation_error(ValidationError::UnexpectedReverseSolidus);
                    }

                    if ascii::is_double_dot_path_segment(&self.buffer) {
                        self.url.shorten_path();
                        if c != Some('/') && !(self.url.is_special() && c == Some('\\')) {
                            self.url.path.segments_mut().push(String::new());
                        }
                    } else if ascii::is_single_dot_path_segment(&self.buffer) {
                        if c != Some('/') && !(self.url.is_special() && c == Some('\\')) {
                            self.url.path.segments_mut().push(String::new());
                        }
                    } else {
                        if self.url.scheme == "file"
                            && self.url.path.segments().is_empty()
                            && util::is_windows_drive_letter(&self.buffer)
                        {
                            let mut chars: Vec<char> = self.buffer.chars().collect();
                            if let Some(second) = chars.get_mut(1) {
                                *second = ':';
                            }
                            self.buffer = chars.into_iter().collect();
                        }
                        self.url.path.segments_mut().push(std::mem::take(&mut self.buffer));
                    }

                    self.buffer.clear();

                    if c == Some('?') {
                        self.url.query = Some(String::new());
                        self.set_state(ParserState::Query);
                    }
                    if c == Some('#') {
                        self.url.fragment = Some(String::new());
                        self.set_state(ParserState::Fragment);
                    }
                } else {
                    let c = c.expect("handled above");
                    if c != '%' && !is_url_code_point(c) {
                        self.error_handler.validation_error(ValidationError::InvalidUrlCodePoint);
                    }
                    if c == '%' && !self.percent_escape_is_valid() {
                        self.error_handler.validation_error(ValidationError::UnescapedPercentSign);
                    }
                    self.encode_char(c, &percent_encode::PATH, Buffer::Scratch);
                }
            },

            // https://url.spec.whatwg.org/#cannot-be-a-base-url-path-state
            ParserState::OpaquePath => {
                let c = self.c();
                if c == Some('?') {
                    self.url.query = Some(String::new());
                    self.set_state(ParserState::Query);
                } else if c == Some('#') {
                    self.url.fragment = Some(String::new());
                    self.set_state(ParserState::Fragment);
                } else if let Some(c) = c {
                    if c != '%' && !is_url_code_point(c) {
                        self.error_handler.validation_error(ValidationError::InvalidUrlCodePoint);
                    }
                    if c == '%' && !self.percent_escape_is_valid() {
                        self.error_handler.validation_error(ValidationError::UnescapedPercentSign);
                    }
                    self.encode_char(c, &percent_encode::C0_CONTROL, Buffer::OpaquePath);
                }
            },

            // https://url.spec.whatwg.org/#query-state
            ParserState::Query => {
                let c = self.c();
                if (self.state_override.is_none() && c == Some('#')) || c.is_none() {
                    let set = if self.url.is_special() {
                        &percent_encode::SPECIAL_QUERY
                    } else {
                        &percent_encode::QUERY
                    };
                    let buffer = std::mem::take(&mut self.buffer);
                    let mut encoded = String::new();
                    percent_encode::percent_encode(&buffer, set, &mut encoded);
                    self.url.query.get_or_insert_with(String::new).push_str(&encoded);

                    if c == Some('#') {
                        self.url.fragment = Some(String::new());
                        self.set_state(ParserState::Fragment);
                    }
                } else if let Some(c) = c {
                    if c != '%' && !is_url_code_point(c) {
                        self.error_handler.validation_error(ValidationError::InvalidUrlCodePoint);
                    }
                    if c == '%' && !self.percent_escape_is_valid() {
                        self.error_handler.validation_error(ValidationError::UnescapedPercentSign);
                    }
                    self.buffer.push(c);
                }
            },

            // https://url.spec.whatwg.org/#fragment-state
            ParserState::Fragment => {
                if let Some(c) = self.c() {
                    if c != '%' && !is_url_code_point(c) {
                        self.error_handler.validation_error(ValidationError::InvalidUrlCodePoint);
                    }
                    if c == '%' && !self.percent_escape_is_valid() {
                        self.error_handler.validation_error(ValidationError::UnescapedPercentSign);
                    }
                    self.encode_char(c, &percent_encode::FRAGMENT, Buffer::Fragment);
                }
            },
        }

        Ok(StartOver::No)
    }

    fn percent_escape_is_valid(&self) -> bool {
        let Some(base) = usize::try_from(self.ptr).ok() else {
            return false;
        };
        let a = self.input.get(base + 1);
        let b = self.input.get(base + 2);
        matches!((a, b), (Some(a), Some(b)) if a.is_ascii_hexdigit() && b.is_ascii_hexdigit())
    }
}

enum Buffer {
    Scratch,
    Fragment,
    OpaquePath,
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
    use crate::{host::AsciiOnly, validation_error::IgnoreValidationErrors, Url};

    fn parse(input: &str) -> Url {
        let mut ignore = IgnoreValidationErrors;
        super::basic_url_parse(input, None, None, None, &AsciiOnly, &mut ignore).unwrap()
    }

    #[test]
    fn parses_simple_url() {
        let url = parse("https://example.com/path?query#frag");
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.path().segments(), &["path"]);
        assert_eq!(url.query(), Some("query"));
        assert_eq!(url.fragment(), Some("frag"));
    }

    #[test]
    fn resolves_relative_against_base() {
        let mut ignore = IgnoreValidationErrors;
        let base =
            super::basic_url_parse("https://example.com/a/b", None, None, None, &AsciiOnly, &mut ignore)
                .unwrap();
        let resolved =
            super::basic_url_parse("../c", Some(&base), None, None, &AsciiOnly, &mut ignore).unwrap();
        assert_eq!(resolved.to_string(), "https://example.com/c");
    }

    #[test]
    fn backslashes_are_treated_as_slashes_in_special_urls() {
        let url = parse("https://example.com\\a\\b");
        assert_eq!(url.path().segments(), &["a", "b"]);
    }

    #[test]
    fn missing_scheme_without_base_fails() {
        let mut ignore = IgnoreValidationErrors;
        assert!(
            super::basic_url_parse("//example.com", None, None, None, &AsciiOnly, &mut ignore).is_err()
        );
    }

    #[test]
    fn non_special_scheme_keeps_opaque_path() {
        let url = parse("data:text/plain,hello");
        assert!(url.has_opaque_path());
    }

    #[test]
    fn windows_drive_letter_in_file_path() {
        let url = parse("file:///C:/Users");
        assert_eq!(url.path().segments(), &["C:", "Users"]);
    }

    #[test]
    fn ipv6_host() {
        let url = parse("http://[::1]:8080/");
        assert_eq!(url.port(), Some(8080));
    }

    #[test]
    fn dot_segments_are_normalized() {
        let url = parse("https://example.com/a/./b/../c");
        assert_eq!(url.path().segments(), &["a", "c"]);
    }

    #[test]
    fn localhost_file_host_becomes_empty() {
        let url = parse("file://localhost/etc/hosts");
        assert!(url.host().is_some_and(|h| h.is_empty()));
    }
}
