//! Typed addressing for AT Protocol resources.
//!
//! Accepted inputs for `ResourceLocator::from_str`:
//! - `at://<did>[/<collection>[/<rkey>]]`
//! - `<did>[/<collection>[/<rkey>]]`   (the form viewers put after `/at/`)
//!
//! Handles are not accepted here; resolve them to a DID first.

use std::{fmt, str::FromStr};

use crate::{
    errors::{Error, Result},
    identity::Did,
};

const EXPECTED_FORMS: &str = "expected `at://<did>[/<collection>[/<rkey>]]` or `<did>[/<collection>[/<rkey>]]`";

#[inline]
fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidLocator(msg.into())
}

/// Repository DID plus optional collection and record key.
///
/// - DID only: the whole repository
/// - DID + collection: a record listing
/// - DID + collection + rkey: a single record
///
/// A record key without a collection cannot be constructed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceLocator {
    did: Did,
    collection: Option<String>,
    rkey: Option<String>,
}

impl ResourceLocator {
    /// The repository itself.
    pub fn repo(did: Did) -> Self {
        Self {
            did,
            collection: None,
            rkey: None,
        }
    }

    /// A collection listing.
    pub fn collection(did: Did, collection: impl Into<String>) -> Self {
        Self {
            did,
            collection: Some(collection.into()),
            rkey: None,
        }
    }

    /// A single record.
    pub fn record(did: Did, collection: impl Into<String>, rkey: impl Into<String>) -> Self {
        Self {
            did,
            collection: Some(collection.into()),
            rkey: Some(rkey.into()),
        }
    }

    /// Repository DID.
    pub fn did(&self) -> &Did {
        &self.did
    }

    /// Collection NSID, if any.
    pub fn collection_nsid(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Record key, if any.
    pub fn rkey(&self) -> Option<&str> {
        self.rkey.as_deref()
    }

    /// Re-anchor on another DID keeping collection and rkey.
    pub(crate) fn with_did(self, did: Did) -> Self {
        Self { did, ..self }
    }

    /// `at://` rendering.
    pub fn to_at_uri(&self) -> String {
        format!("at://{self}")
    }

    /// Build from already-split components, e.g. regex captures.
    ///
    /// Empty components count as absent; a trailing slash is therefore harmless.
    pub fn from_parts(did: Did, collection: Option<&str>, rkey: Option<&str>) -> Result<Self> {
        let collection = collection.filter(|c| !c.is_empty());
        let rkey = rkey.filter(|r| !r.is_empty());
        match (collection, rkey) {
            (None, Some(rkey)) => Err(invalid(format!("record key '{rkey}' without collection"))),
            (collection, rkey) => Ok(Self {
                did,
                collection: collection.map(str::to_string),
                rkey: rkey.map(str::to_string),
            }),
        }
    }
}

impl FromStr for ResourceLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s.strip_prefix("at://").unwrap_or(s);
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        let mut segments = rest.splitn(3, '/');
        let did_str = segments.next().unwrap_or_default();
        if !Did::is_did(did_str) {
            return Err(invalid(format!("{EXPECTED_FORMS}, got '{s}'")));
        }
        let did: Did = did_str.parse()?;

        let collection = segments.next();
        let rkey = segments.next().map(|r| r.trim_end_matches('/'));
        if rkey.is_some_and(|r| r.contains('/')) {
            return Err(invalid(format!("too many path segments in '{s}'")));
        }

        Self::from_parts(did, collection, rkey)
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.did)?;
        if let Some(collection) = &self.collection {
            write!(f, "/{collection}")?;
            if let Some(rkey) = &self.rkey {
                write!(f, "/{rkey}")?;
            }
        }
        Ok(())
    }
}
