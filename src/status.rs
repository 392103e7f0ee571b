//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: `Response::with_status()`,
//! `Response::builder().status()`, [`HttpError::new`](crate::HttpError::new),
//! or as a bare handler return value.
//!
//! ```rust
//! use waypost::{Response, Status};
//!
//! Response::with_status(Status::NoContent);
//!
//! Response::builder()
//!     .status(Status::Created)
//!     .header("location", "/items/42")
//!     .json(b"42".to_vec());
//!
//! assert_eq!(Status::MethodNotAllowed.code(), 405);
//! assert_eq!(Status::from_code(404), Some(Status::NotFound));
//! ```

/// Declares the enum together with its numeric code and canonical reason
/// phrase so the three can never drift apart.
macro_rules! statuses {
    ($( $variant:ident = $code:literal, $reason:literal; )+) => {
        /// The status codes this crate answers with.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Status {
            $( $variant, )+
        }

        impl Status {
            /// Numeric status code.
            pub fn code(self) -> u16 {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            /// Canonical reason phrase (e.g. `"Not Found"`).
            pub fn reason(self) -> &'static str {
                match self {
                    $( Self::$variant => $reason, )+
                }
            }

            /// Looks up a known status by its numeric code.
            pub fn from_code(code: u16) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

statuses! {
    // 2xx
    Ok                   = 200, "OK";
    Created              = 201, "Created";
    Accepted             = 202, "Accepted";
    NoContent            = 204, "No Content";
    // 3xx
    MovedPermanently     = 301, "Moved Permanently";
    Found                = 302, "Found";
    SeeOther             = 303, "See Other";
    NotModified          = 304, "Not Modified";
    TemporaryRedirect    = 307, "Temporary Redirect";
    PermanentRedirect    = 308, "Permanent Redirect";
    // 4xx
    BadRequest           = 400, "Bad Request";
    Unauthorized         = 401, "Unauthorized";
    Forbidden            = 403, "Forbidden";
    NotFound             = 404, "Not Found";
    MethodNotAllowed     = 405, "Method Not Allowed";
    NotAcceptable        = 406, "Not Acceptable";
    Conflict             = 409, "Conflict";
    Gone                 = 410, "Gone";
    ContentTooLarge      = 413, "Content Too Large";
    UnsupportedMediaType = 415, "Unsupported Media Type";
    UnprocessableContent = 422, "Unprocessable Content";
    TooManyRequests      = 429, "Too Many Requests";
    // 5xx
    InternalServerError  = 500, "Internal Server Error";
    NotImplemented       = 501, "Not Implemented";
    BadGateway           = 502, "Bad Gateway";
    ServiceUnavailable   = 503, "Service Unavailable";
    GatewayTimeout       = 504, "Gateway Timeout";
}

impl Status {
    /// `true` for 4xx and 5xx codes, the only ones an [`HttpError`](crate::HttpError) should carry.
    pub fn is_error(self) -> bool {
        self.code() >= 400
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_lookup_agree() {
        for code in [200, 302, 400, 404, 405, 500, 503] {
            let status = Status::from_code(code).expect("known code");
            assert_eq!(status.code(), code);
        }
        assert_eq!(Status::from_code(299), None);
    }

    #[test]
    fn error_range() {
        assert!(!Status::Found.is_error());
        assert!(Status::BadRequest.is_error());
        assert!(Status::InternalServerError.is_error());
    }

    #[test]
    fn display_includes_reason() {
        assert_eq!(Status::MethodNotAllowed.to_string(), "405 Method Not Allowed");
    }
}
