//! Unified error types for the `pdsls_redirect` crate.
//!
//! Every step of a translation (handle resolution, DID document fetch, record
//! listing, pattern dispatch) reports failure through the single [`Error`] enum
//! below. Steps chain with `?`, so the first failure short-circuits the rest of
//! the request. The [`crate::Translator`] is the only place where these errors
//! are turned into "no result": it logs them with context and falls back to the
//! configured default, so none of them ever reaches the caller of a translation.

use thiserror::Error;

// --- Build-Time Error ---

/// Errors that can occur while building a [`crate::RedirectHttpClient`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to build the HTTP client (reqwest configuration).
    #[error("Failed to build the HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// A configured upstream endpoint is not a valid base URL.
    #[error("Invalid endpoint `{endpoint}`: {source}")]
    Endpoint {
        /// The offending configuration value.
        endpoint: String,
        /// Why it could not be parsed.
        source: url::ParseError,
    },
}

// --- The Main Operational Error Enum ---

/// The crate's top-level error type.
///
/// Variants follow the failure taxonomy of a translation request:
/// - [`Error::InvalidHandle`]: empty or malformed handle
/// - [`Error::Resolution`]: network/parse failure talking to an upstream
/// - [`Error::NoServiceEndpoint`]: the DID document has no PDS entry
/// - [`Error::NoPatternMatch`]: the URL belongs to no supported site
/// - [`Error::HandlerDeclined`]: a site matched but the URL shape is unsupported
/// - [`Error::NoRecordFound`]: a title search exhausted the collection
#[derive(Debug, Error)]
pub enum Error {
    /// The handle is empty (after stripping a leading `@`) or malformed.
    #[error("Invalid handle '{0}'")]
    InvalidHandle(String),

    /// Resolving a handle, DID document or record failed.
    #[error("Resolution failed: {0}")]
    Resolution(#[from] RequestError),

    /// The DID document does not list an `AtprotoPersonalDataServer` service.
    #[error("No service endpoint found for '{0}'")]
    NoServiceEndpoint(String),

    /// The URL matches no entry of the pattern table.
    #[error("No match found: unsupported website")]
    NoPatternMatch,

    /// A site pattern matched but its handler rejected the URL.
    #[error("Handler '{site}' declined the URL: {reason}")]
    HandlerDeclined {
        /// Name of the pattern table entry that matched.
        site: &'static str,
        /// Short explanation for the logs.
        reason: String,
    },

    /// A paginated title search ended without a matching record.
    #[error("No record in '{collection}' titled '{title}'")]
    NoRecordFound {
        /// Collection NSID that was scanned.
        collection: String,
        /// Decoded title that was searched for.
        title: String,
    },

    /// A string could not be parsed as a protocol resource locator.
    #[error("Invalid at:// locator: {0}")]
    InvalidLocator(String),

    /// URL parsing failed while preparing a request.
    #[error("Failed to parse URL: {0}")]
    Parse(#[from] url::ParseError),
}

impl Error {
    /// Shorthand used by site handlers.
    pub(crate) fn declined(site: &'static str, reason: impl Into<String>) -> Self {
        Error::HandlerDeclined {
            site,
            reason: reason.into(),
        }
    }
}

// --- Consolidated Request Error ---

/// Transport and server-side HTTP errors.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Network/protocol failure from reqwest (timeouts, TLS, I/O, etc.).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server returned a non-success status. Includes status and body message.
    #[error("Server responded with an error: {status} - {message}")]
    Server {
        /// The HTTP status code returned by the server.
        status: reqwest::StatusCode,
        /// Short description or the server response body captured for context.
        message: String,
    },

    /// The response was well-formed JSON but lacked a required field.
    #[error("Response is missing `{field}`")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },

    /// JSON decoding failed when parsing a server response.
    #[error("JSON decode error: {message}")]
    DecodeJson {
        /// Error message from the JSON deserializer (with context if available).
        message: String,
    },
}

/// A specialized `Result` type for `pdsls_redirect` operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Error::Resolution(RequestError::DecodeJson {
                message: err.to_string(),
            });
        }
        Error::Resolution(RequestError::Transport(err))
    }
}
