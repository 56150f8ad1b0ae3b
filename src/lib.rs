//! A WHATWG-conformant parser for **U**niform **R**esource **L**ocators ([URL]s).
//!
//! You can find the relevant specification [here](https://url.spec.whatwg.org/).
//!
//! The preferred way to obtain a [`Url`] is to parse it:
//! ```
//! use url::Url;
//!
//! let url: Url = "https://example.com/a/b?c=d".parse().unwrap();
//!
//! assert_eq!(url.scheme(), "https");
//! assert_eq!(url.path().segments(), &["a", "b"]);
//! assert_eq!(url.query(), Some("c=d"));
//! ```

mod ascii;
mod host;
mod ip;
mod parser;
mod percent_encode;
mod set;
mod url;
mod util;
mod validation_error;

pub use crate::{
    host::{AsciiOnly, DomainToAsciiError, Host, HostParseError, ToAscii},
    ip::{Ipv4ParseError, Ipv6ParseError},
    parser::ParseError,
    percent_encode::{
        percent_decode, percent_encode, COMPONENT, FORM_URLENCODED, FRAGMENT, PATH, QUERY, USERINFO,
    },
    set::AsciiSet,
    url::{ExcludeFragment, Port, Url, UrlPath},
    validation_error::{IgnoreValidationErrors, ValidationError, ValidationErrorHandler},
};
