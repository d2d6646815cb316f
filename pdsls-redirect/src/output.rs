//! Turning a dispatch result into the URL the browser should open.

use crate::{
    constants::{BULK_LIST_LIMIT, Endpoints},
    errors::Result,
    identity::{Did, IdentityResolver},
    locator::ResourceLocator,
    records::xrpc_url,
    settings::Settings,
};

/// What a site handler resolved a URL to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// A repository, collection or record.
    Locator(ResourceLocator),
    /// The blob listing of a repository.
    Blobs(Did),
    /// A personal data server, by host.
    Pds(String),
    /// A finished URL that bypasses viewer rendering (e.g. a thread fetch).
    Url(String),
}

impl Resolution {
    /// The `at://` form, for results that have one.
    pub fn at_uri(&self) -> Option<String> {
        match self {
            Resolution::Locator(locator) => Some(locator.to_at_uri()),
            Resolution::Blobs(did) => Some(format!("at://{did}")),
            Resolution::Pds(_) | Resolution::Url(_) => None,
        }
    }
}

/// Terminal result of a translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Open `url`, in a new tab when `new_tab` is set.
    Navigate {
        /// Viewer page or raw API call.
        url: String,
        /// Whether the user asked for a new tab.
        new_tab: bool,
    },
    /// Nothing matched and the user opted out of the default page.
    Stay,
}

impl Outcome {
    /// The URL to open, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Outcome::Navigate { url, .. } => Some(url),
            Outcome::Stay => None,
        }
    }
}

/// Viewer page for `resolution`.
///
/// Locators render as `<root>/at/<did>[/<collection>[/<rkey>]]`.
pub fn viewer_url(root: &str, resolution: &Resolution) -> String {
    match resolution {
        Resolution::Locator(locator) => format!("{root}/at/{locator}"),
        Resolution::Blobs(did) => format!("{root}/at/{did}/blobs"),
        Resolution::Pds(host) => format!("{root}/{host}"),
        Resolution::Url(url) => url.clone(),
    }
}

/// `app.bsky.feed.getPostThread` call for a post.
pub fn thread_url(endpoints: &Endpoints, post: &ResourceLocator, settings: &Settings) -> String {
    format!(
        "{}?uri=at://{post}&depth={}&parentHeight={}",
        endpoints.appview_xrpc("app.bsky.feed.getPostThread"),
        settings.reply_count,
        settings.parent_count
    )
}

/// Raw XRPC call returning the data behind `resolution`.
///
/// Locators go to their own PDS, which costs a DID document lookup:
/// `describeRepo` for a repository, `listRecords` for a collection and
/// `getRecord` for a record.
pub async fn api_url(identity: &IdentityResolver, resolution: &Resolution) -> Result<String> {
    let url = match resolution {
        Resolution::Locator(locator) => {
            let did = locator.did();
            let service = identity.resolve_service_endpoint(did).await?;
            match (locator.collection_nsid(), locator.rkey()) {
                (None, _) => format!(
                    "{}?repo={did}",
                    xrpc_url(&service, "com.atproto.repo.describeRepo")?
                ),
                (Some(collection), None) => format!(
                    "{}?repo={did}&collection={collection}",
                    xrpc_url(&service, "com.atproto.repo.listRecords")?
                ),
                (Some(collection), Some(rkey)) => format!(
                    "{}?repo={did}&collection={collection}&rkey={rkey}",
                    xrpc_url(&service, "com.atproto.repo.getRecord")?
                ),
            }
        }
        Resolution::Blobs(did) => {
            let service = identity.resolve_service_endpoint(did).await?;
            format!(
                "{}?did={did}&limit={BULK_LIST_LIMIT}",
                xrpc_url(&service, "com.atproto.sync.listBlobs")?
            )
        }
        Resolution::Pds(host) => {
            format!("https://{host}/xrpc/com.atproto.sync.listRepos?limit={BULK_LIST_LIMIT}")
        }
        Resolution::Url(url) => url.clone(),
    };
    Ok(url)
}
