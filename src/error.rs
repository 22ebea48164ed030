use thiserror::Error;

/// Error categorization used for diagnostics and exit reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or configuration supplied by the caller
    Usage,
    /// A remote service failed or could not be reached
    Remote,
    /// A remote service answered with a body we could not understand
    Parse,
    /// Local filesystem failure
    Local,
}

#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    // Local I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Refusing to send credentials over an insecure connection: {url}")]
    InsecureEndpoint { url: String },

    #[error("{service} request failed. Response code: {status} Response body: {body}")]
    Http {
        service: &'static str,
        status: u16,
        body: String,
    },

    // Empty search result
    #[error("No volume id was returned for query {query:?}. Change your Solr query string.")]
    NoVolumes { query: String },

    // Parse errors
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },
}

impl Error {
    /// Categorize the error for reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidInput { .. } | Error::InsecureEndpoint { .. } => {
                ErrorCategory::Usage
            }
            Error::Network(_) | Error::Http { .. } | Error::NoVolumes { .. } => {
                ErrorCategory::Remote
            }
            Error::Parse { .. } => ErrorCategory::Parse,
            Error::Io(_) => ErrorCategory::Local,
        }
    }

    /// HTTP status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn parse(context: &str, message: impl ToString) -> Self {
        Error::Parse {
            context: context.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_carries_code_and_body() {
        let err = Error::Http {
            service: "data api",
            status: 500,
            body: "server error".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("server error"));
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.category(), ErrorCategory::Remote);
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            Error::NoVolumes {
                query: "title:whale".to_string()
            }
            .category(),
            ErrorCategory::Remote
        );
        assert_eq!(
            Error::parse("solr response", "unexpected end").category(),
            ErrorCategory::Parse
        );
        assert_eq!(
            Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")).category(),
            ErrorCategory::Local
        );
        assert_eq!(
            Error::InsecureEndpoint {
                url: "http://example.org".to_string()
            }
            .category(),
            ErrorCategory::Usage
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("oauth2 response", "missing access_token");
        assert_eq!(
            err.to_string(),
            "Parse error in oauth2 response: missing access_token"
        );
        assert_eq!(err.status(), None);
    }
}
