//! The public entry point: one URL in, one navigation decision out.

use std::sync::Arc;

use crate::{
    BuildError, RedirectHttpClient, cross_log,
    dispatch::{Context, Dispatched, dispatch},
    errors::{Error, Result},
    identity::IdentityResolver,
    lexicon,
    output::{Outcome, Resolution, api_url, viewer_url},
    patterns::VIEWER_ENTRIES,
    records::RecordStore,
    settings::{MemorySettingsStore, Settings, SettingsStore},
};

/// Translates viewer-site URLs into canonical viewer (or raw API) URLs.
///
/// Cheap to clone; clones share the HTTP client and the settings store.
///
/// ```no_run
/// # async fn example() -> Result<(), pdsls_redirect::BuildError> {
/// use pdsls_redirect::{Outcome, Translator};
///
/// let translator = Translator::new()?;
/// match translator
///     .translate(Some("https://bsky.app/profile/alice.example/post/3k2x"))
///     .await
/// {
///     Outcome::Navigate { url, new_tab } => println!("{url} (new tab: {new_tab})"),
///     Outcome::Stay => println!("nothing to open"),
/// }
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Translator {
    client: RedirectHttpClient,
    identity: IdentityResolver,
    records: RecordStore,
    settings: Arc<dyn SettingsStore>,
}

impl Translator {
    /// Translator on a default client with default settings held in memory.
    pub fn new() -> std::result::Result<Self, BuildError> {
        Ok(Self::with_client(
            &RedirectHttpClient::new()?,
            Arc::new(MemorySettingsStore::default()),
        ))
    }

    /// Translator on a specific client and settings store.
    pub fn with_client(client: &RedirectHttpClient, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            client: client.clone(),
            identity: IdentityResolver::with_client(client),
            records: RecordStore::with_client(client),
            settings,
        }
    }

    /// Translate `url` with the store's current settings.
    ///
    /// Never fails: unsupported or unresolvable URLs end in the default page
    /// (`alwaysOpen`) or [`Outcome::Stay`].
    pub async fn translate(&self, url: Option<&str>) -> Outcome {
        let settings = self.settings.snapshot();
        self.translate_with(url, &settings).await
    }

    /// Translate `url` with an explicit settings snapshot.
    pub async fn translate_with(&self, url: Option<&str>, settings: &Settings) -> Outcome {
        let dispatched = match url {
            Some(url) => match self.resolve(url, settings).await {
                Ok(dispatched) => Some(dispatched),
                Err(Error::NoPatternMatch) => {
                    cross_log!(info, "No match found: unsupported website");
                    None
                }
                Err(e) => {
                    cross_log!(warn, "Could not translate '{url}': {e}");
                    None
                }
            },
            None => None,
        };

        let target = match dispatched {
            Some(dispatched) => self.render(&dispatched, settings).await,
            None if settings.always_open => self.client.endpoints().viewer_root.clone(),
            None => return Outcome::Stay,
        };

        cross_log!(info, "Redirecting to {target}");
        Outcome::Navigate {
            url: target,
            new_tab: settings.open_in_new_tab,
        }
    }

    /// Recognize and resolve `url` without rendering it.
    pub async fn resolve(&self, url: &str, settings: &Settings) -> Result<Dispatched> {
        let ctx = Context {
            identity: &self.identity,
            records: &self.records,
            endpoints: self.client.endpoints(),
            settings,
        };
        dispatch(ctx, url.trim(), 0).await
    }

    /// The `at://` URI behind `url`, if it addresses a repository or record.
    pub async fn at_uri(&self, url: &str) -> Option<String> {
        let resolution = self.resolve_locator_form(url).await?;
        resolution.at_uri()
    }

    /// The human-facing page for the record behind `url`, if its type has one.
    pub async fn public_url(&self, url: &str) -> Option<String> {
        match self.resolve_locator_form(url).await? {
            Resolution::Locator(locator) => lexicon::public_url(&locator),
            _ => None,
        }
    }

    /// Resolve with thread-fetch disabled so posts stay locators.
    async fn resolve_locator_form(&self, url: &str) -> Option<Resolution> {
        let settings = Settings {
            get_post_thread: false,
            ..self.settings.snapshot()
        };
        match self.resolve(url, &settings).await {
            Ok(dispatched) => Some(dispatched.resolution),
            Err(e) => {
                cross_log!(debug, "No locator for '{url}': {e}");
                None
            }
        }
    }

    /// Viewer URL, or the raw API call when the API policy applies.
    async fn render(&self, dispatched: &Dispatched, settings: &Settings) -> String {
        let root = &self.client.endpoints().viewer_root;
        let wants_api = settings.always_api
            || (settings.pdsls_opens_api && VIEWER_ENTRIES.contains(&dispatched.entry));
        if !wants_api {
            return viewer_url(root, &dispatched.resolution);
        }

        match api_url(&self.identity, &dispatched.resolution).await {
            Ok(url) => url,
            Err(e) => {
                cross_log!(warn, "API URL unavailable, using the viewer page: {e}");
                viewer_url(root, &dispatched.resolution)
            }
        }
    }
}
