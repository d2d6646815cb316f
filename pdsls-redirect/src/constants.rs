//! Upstream hosts and record collections the translator knows about.

use url::Url;

use crate::errors::BuildError;

/// Public AppView used for handle resolution and thread fetches.
pub const DEFAULT_APPVIEW: &str = "https://public.api.bsky.app";
/// Directory serving `did:plc` documents.
pub const DEFAULT_PLC_DIRECTORY: &str = "https://plc.directory";
/// Root of the canonical viewer every locator is rendered against.
pub const DEFAULT_VIEWER_ROOT: &str = "https://pdsls.dev";

/// Service type of a personal data server in a DID document.
pub const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";

/// Page size used when scanning collections.
pub const LIST_PAGE_SIZE: u16 = 100;
/// Upper bound on pages read by a title search.
pub const DEFAULT_TITLE_SEARCH_MAX_PAGES: usize = 50;
/// `limit` sent with `listBlobs` and `listRepos` calls.
pub const BULK_LIST_LIMIT: u16 = 1000;

/// Record collections referenced by the site handlers.
pub mod nsid {
    /// Bluesky post.
    pub const POST: &str = "app.bsky.feed.post";
    /// Custom feed.
    pub const FEED_GENERATOR: &str = "app.bsky.feed.generator";
    /// Curation or moderation list.
    pub const LIST: &str = "app.bsky.graph.list";
    /// Starter pack.
    pub const STARTER_PACK: &str = "app.bsky.graph.starterpack";
    /// Block record, listed by Clearsky's blocking page.
    pub const BLOCK: &str = "app.bsky.graph.block";
    /// Bluesky profile, rkey `self`.
    pub const PROFILE: &str = "app.bsky.actor.profile";
    /// WhiteWind blog entry.
    pub const WHTWND_ENTRY: &str = "com.whtwnd.blog.entry";
    /// Smoke Signal event.
    pub const SMOKESIGNAL_EVENT: &str = "events.smokesignal.calendar.event";
    /// Smoke Signal profile.
    pub const SMOKESIGNAL_PROFILE: &str = "events.smokesignal.app.profile";
    /// atproto.camp badge.
    pub const BADGE_COLLECTION: &str = "blue.badge.collection";
    /// Linkat link board, rkey `self`.
    pub const LINKAT_BOARD: &str = "blue.linkat.board";
    /// Frontpage submission.
    pub const FRONTPAGE_POST: &str = "fyi.unravel.frontpage.post";
    /// Frontpage comment on a submission.
    pub const FRONTPAGE_COMMENT: &str = "fyi.unravel.frontpage.comment";
}

/// Base URLs of every upstream the pipeline talks to or renders against.
///
/// Defaults point at the production hosts. Tests and self-hosted setups
/// override them through [`crate::RedirectHttpClientBuilder::endpoints`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Serves `com.atproto.identity.resolveHandle` and `app.bsky.feed.getPostThread`.
    pub appview: Url,
    /// Serves `did:plc` documents at `/<did>`.
    pub plc_directory: Url,
    /// Viewer root, kept without a trailing slash since it is rendered verbatim.
    pub viewer_root: String,
}

impl Endpoints {
    /// Build from string bases, validating each one.
    pub fn new(appview: &str, plc_directory: &str, viewer_root: &str) -> Result<Self, BuildError> {
        let parse = |endpoint: &str| {
            Url::parse(endpoint).map_err(|source| BuildError::Endpoint {
                endpoint: endpoint.to_string(),
                source,
            })
        };
        // Validate the viewer root even though it is stored as text.
        parse(viewer_root)?;

        Ok(Self {
            appview: parse(appview)?,
            plc_directory: parse(plc_directory)?,
            viewer_root: viewer_root.trim_end_matches('/').to_string(),
        })
    }

    /// `<appview>/xrpc/<method>` without a query.
    pub(crate) fn appview_xrpc(&self, method: &str) -> String {
        format!(
            "{}/xrpc/{method}",
            self.appview.as_str().trim_end_matches('/')
        )
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_APPVIEW, DEFAULT_PLC_DIRECTORY, DEFAULT_VIEWER_ROOT)
            .expect("default endpoints are valid URLs")
    }
}
