use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use reqwest::Response;

use crate::errors::{Error, RequestError, Result};

/// Convert non-2xx responses into a structured error that includes the server body.
///
/// If the status is successful (2xx), the original response is returned.
/// If the status is an error (4xx or 5xx), the response body is consumed
/// to create an `Error::Resolution(RequestError::Server)` and returned as an `Err`.
pub(crate) async fn check_http_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = response.text().await.unwrap_or_else(|_| {
        status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string()
    });

    Err(Error::from(RequestError::Server { status, message }))
}

/// Percent-decode a URL component the way browsers' `decodeURIComponent` does.
///
/// `+` is left alone. Invalid UTF-8 sequences fall back to the raw input.
pub(crate) fn decode_component(raw: &str) -> Cow<'_, str> {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(raw),
    }
}
