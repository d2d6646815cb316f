//! Identity resolution: handle → DID → DID document → PDS endpoint.
//!
//! Reads need no authentication and nothing is cached: every translation
//! resolves identities fresh, since a handle may point at a different DID
//! tomorrow.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = pdsls_redirect::RedirectHttpClient::new()?;
//! let identity = pdsls_redirect::IdentityResolver::with_client(&client);
//! let did = identity.resolve_did("@alice.bsky.social").await?;
//! let pds = identity.resolve_service_endpoint(&did).await?;
//! println!("{did} lives on {pds}");
//! # Ok(()) }
//! ```

use std::{fmt, str::FromStr};

use reqwest::Method;
use serde::Deserialize;
use url::Url;

use crate::{
    RedirectHttpClient,
    constants::PDS_SERVICE_TYPE,
    cross_log,
    errors::{Error, RequestError, Result},
    util::{check_http_status, decode_component},
};

const WELL_KNOWN_DID_PATH: &str = "/.well-known/did.json";

/// A decentralized identifier, e.g. `did:plc:ewvi7nxzyoun6zhxrhs64oiz`.
///
/// Only the shape `did:<method>:<id>` is checked; the identifier itself is opaque.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Did(String);

/// How a [`Did`]'s document is located.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DidMethod {
    /// Looked up in the PLC directory.
    Plc,
    /// Served from `/.well-known/did.json` on the embedded domain.
    Web,
    /// Any other method; treated like `plc` for lookups.
    Other,
}

impl Did {
    /// Whether `s` already has DID syntax (`did:` prefix).
    pub fn is_did(s: &str) -> bool {
        s.starts_with("did:")
    }

    /// The DID method.
    pub fn method(&self) -> DidMethod {
        if self.0.starts_with("did:plc:") {
            DidMethod::Plc
        } else if self.0.starts_with("did:web:") {
            DidMethod::Web
        } else {
            DidMethod::Other
        }
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// For `did:web:<domain>`, the document URL `https://<domain>/.well-known/did.json`.
    ///
    /// Ports are encoded as `%3A` in the identifier and decoded here.
    pub fn web_document_url(&self) -> Option<Result<Url>> {
        let domain = self.0.strip_prefix("did:web:")?;
        let domain = decode_component(domain);
        Some(Url::parse(&format!("https://{domain}{WELL_KNOWN_DID_PATH}")).map_err(Error::from))
    }
}

impl FromStr for Did {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("did"), Some(method), Some(id))
                if !method.is_empty()
                    && method.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
                    && !id.is_empty() =>
            {
                Ok(Did(s.to_string()))
            }
            _ => Err(Error::InvalidLocator(format!("not a DID: {s}"))),
        }
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A DID document, reduced to what the translator reads.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct DidDocument {
    /// Declared DID, when present.
    #[serde(default)]
    pub id: Option<String>,
    /// Service descriptors, in document order.
    #[serde(default)]
    pub service: Vec<ServiceDescriptor>,
}

/// One `service` entry of a [`DidDocument`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ServiceDescriptor {
    /// Fragment id, e.g. `#atproto_pds`.
    #[serde(default)]
    pub id: Option<String>,
    /// Service type, e.g. `AtprotoPersonalDataServer`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Endpoint URL.
    #[serde(rename = "serviceEndpoint")]
    pub endpoint: String,
}

impl DidDocument {
    /// Endpoint of the first `AtprotoPersonalDataServer` descriptor.
    pub fn pds_endpoint(&self) -> Option<&str> {
        self.service
            .iter()
            .find(|s| s.kind == PDS_SERVICE_TYPE)
            .map(|s| s.endpoint.as_str())
    }
}

#[derive(Deserialize)]
struct ResolveHandleResponse {
    did: Option<String>,
}

/// Resolves handles and DIDs against the public directory services.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    client: RedirectHttpClient,
}

impl IdentityResolver {
    /// Resolver on a specific client.
    pub fn with_client(client: &RedirectHttpClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// Turn a handle or DID into a DID.
    ///
    /// DIDs (also percent-encoded ones, as some sites put them in paths) are
    /// returned without any network call. A leading `@` is stripped from
    /// handles; an empty handle fails with [`Error::InvalidHandle`].
    pub async fn resolve_did(&self, handle_or_did: &str) -> Result<Did> {
        let decoded = decode_component(handle_or_did);
        if Did::is_did(&decoded) {
            return decoded.parse();
        }

        let handle = decoded.strip_prefix('@').unwrap_or(decoded.as_ref());
        if handle.is_empty() {
            return Err(Error::InvalidHandle(handle_or_did.to_string()));
        }

        self.resolve_handle(handle).await
    }

    /// Resolve a bare handle through `com.atproto.identity.resolveHandle`.
    pub async fn resolve_handle(&self, handle: &str) -> Result<Did> {
        if handle.is_empty() || handle.contains(['/', '?', '#', ' ']) {
            return Err(Error::InvalidHandle(handle.to_string()));
        }

        let mut url = Url::parse(
            &self
                .client
                .endpoints()
                .appview_xrpc("com.atproto.identity.resolveHandle"),
        )?;
        url.query_pairs_mut().append_pair("handle", handle);

        let response = self.client.request(Method::GET, url).send().await?;
        let response = check_http_status(response).await?;
        let body: ResolveHandleResponse = response.json().await?;

        let did = body
            .did
            .ok_or_else(|| Error::from(RequestError::MissingField { field: "did" }))?;
        cross_log!(debug, "Resolved handle '{handle}' to {did}");
        did.parse()
    }

    /// Fetch the DID document, from the domain for `did:web` and from the PLC
    /// directory otherwise.
    pub async fn fetch_did_document(&self, did: &Did) -> Result<DidDocument> {
        let url = match did.method() {
            DidMethod::Web => {
                cross_log!(debug, "Fetching did:web did doc");
                self.web_document_url(did)?
            }
            DidMethod::Plc | DidMethod::Other => {
                cross_log!(debug, "Fetching did:plc did doc");
                self.plc_document_url(did)?
            }
        };

        let response = self.client.request(Method::GET, url).send().await?;
        let response = check_http_status(response).await?;
        Ok(response.json().await?)
    }

    /// Personal data server hosting `did`'s repository.
    pub async fn resolve_service_endpoint(&self, did: &Did) -> Result<Url> {
        let document = self.fetch_did_document(did).await?;
        let endpoint = document
            .pds_endpoint()
            .ok_or_else(|| Error::NoServiceEndpoint(did.to_string()))?;
        cross_log!(debug, "Endpoint found: {endpoint}");
        Ok(Url::parse(endpoint)?)
    }

    fn web_document_url(&self, did: &Did) -> Result<Url> {
        if let Some(origin) = self.client.did_web_origin() {
            return Ok(origin.join(WELL_KNOWN_DID_PATH)?);
        }
        did.web_document_url()
            .transpose()?
            .ok_or_else(|| Error::InvalidLocator(format!("not a did:web: {did}")))
    }

    fn plc_document_url(&self, did: &Did) -> Result<Url> {
        let base = self.client.endpoints().plc_directory.as_str();
        Ok(Url::parse(&format!(
            "{}/{}",
            base.trim_end_matches('/'),
            did.as_str()
        ))?)
    }
}
