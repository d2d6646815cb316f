//! User options consumed by the translator, and the store they come from.
//!
//! A translation reads one [`Settings`] snapshot when it starts and never looks
//! at the store again, so a change notification landing mid-request only
//! affects the next translation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::cross_log;

/// Legacy spellings still found in stored settings, with the key they stand for.
const LEGACY_KEYS: [(&str, &str); 2] = [
    ("jsonMode", "getPostThread"),
    ("pdslsOpensJSON", "pdslsOpensApi"),
];

fn canonical_key(key: &str) -> &str {
    LEGACY_KEYS
        .iter()
        .find(|(legacy, _)| *legacy == key)
        .map_or(key, |&(_, canonical)| canonical)
}

/// Flat option set, keyed in camelCase exactly as the extension stores it.
///
/// Deserializes from any map of stored keys, see [`Settings::from_map`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Open the viewer root when nothing matched, instead of not navigating.
    pub always_open: bool,
    /// Open in a new tab rather than replacing the current one.
    pub open_in_new_tab: bool,
    /// Let the catch-all pattern treat unknown hosts as a PDS.
    pub pds_fallback: bool,
    /// Turn URLs already on the viewer into raw XRPC calls.
    pub pdsls_opens_api: bool,
    /// Turn every resolved locator into a raw XRPC call.
    pub always_api: bool,
    /// Send posts to `app.bsky.feed.getPostThread` instead of the viewer.
    pub get_post_thread: bool,
    /// `depth` of thread fetches.
    pub reply_count: u32,
    /// `parentHeight` of thread fetches.
    pub parent_count: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            always_open: true,
            open_in_new_tab: true,
            pds_fallback: true,
            pdsls_opens_api: false,
            always_api: false,
            get_post_thread: false,
            reply_count: 0,
            parent_count: 0,
        }
    }
}

/// Stored shape: every key optional, legacy keys already renamed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    always_open: Option<bool>,
    open_in_new_tab: Option<bool>,
    pds_fallback: Option<bool>,
    pdsls_opens_api: Option<bool>,
    always_api: Option<bool>,
    get_post_thread: Option<bool>,
    #[serde(default, deserialize_with = "de_count")]
    reply_count: Option<u32>,
    #[serde(default, deserialize_with = "de_count")]
    parent_count: Option<u32>,
}

/// The options page stores spinner values as strings, older builds as numbers.
fn de_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Number(n)) => Ok(Some(n)),
        Some(Count::Text(s)) if s.trim().is_empty() => Ok(Some(0)),
        Some(Count::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Settings::from_map(map).map_err(serde::de::Error::custom)
    }
}

impl Settings {
    /// Settings from a stored key/value map.
    ///
    /// Missing keys keep their defaults and unknown keys are ignored. A legacy
    /// key (`jsonMode`, `pdslsOpensJSON`) overrides its current spelling when
    /// both are present.
    pub fn from_map(mut map: Map<String, Value>) -> serde_json::Result<Self> {
        for (legacy, canonical) in LEGACY_KEYS {
            if let Some(value) = map.remove(legacy) {
                map.insert(canonical.to_string(), value);
            }
        }

        let stored: StoredSettings = serde_json::from_value(Value::Object(map))?;
        let defaults = Settings::default();
        Ok(Settings {
            always_open: stored.always_open.unwrap_or(defaults.always_open),
            open_in_new_tab: stored.open_in_new_tab.unwrap_or(defaults.open_in_new_tab),
            pds_fallback: stored.pds_fallback.unwrap_or(defaults.pds_fallback),
            pdsls_opens_api: stored.pdsls_opens_api.unwrap_or(defaults.pdsls_opens_api),
            always_api: stored.always_api.unwrap_or(defaults.always_api),
            get_post_thread: stored.get_post_thread.unwrap_or(defaults.get_post_thread),
            reply_count: stored.reply_count.unwrap_or(defaults.reply_count),
            parent_count: stored.parent_count.unwrap_or(defaults.parent_count),
        })
    }

    /// Apply a change notification: each key is replaced in place.
    ///
    /// Unknown keys and values of the wrong type are logged and skipped so one
    /// bad entry does not discard the rest of the patch.
    pub fn apply_changes(&mut self, changes: &Map<String, Value>) {
        for (key, value) in changes {
            let mut current = match serde_json::to_value(&*self) {
                Ok(Value::Object(map)) => map,
                _ => return,
            };
            let canonical = canonical_key(key);
            if !current.contains_key(canonical) {
                cross_log!(debug, "Ignoring unknown setting '{key}'");
                continue;
            }
            let previous = current.insert(canonical.to_string(), value.clone());
            match Settings::from_map(current) {
                Ok(updated) => {
                    cross_log!(
                        info,
                        "Storage key \"{key}\" changed from {previous:?} to {value}"
                    );
                    *self = updated;
                }
                Err(e) => cross_log!(warn, "Rejected value {value} for setting '{key}': {e}"),
            }
        }
    }
}

/// Source of [`Settings`] snapshots plus change notifications.
///
/// The storage behind it (browser sync storage, a config file, memory) is
/// not the translator's concern.
pub trait SettingsStore: Send + Sync + std::fmt::Debug {
    /// Current settings, copied out.
    fn snapshot(&self) -> Settings;

    /// Receiver that observes every later change.
    fn subscribe(&self) -> watch::Receiver<Settings>;
}

/// In-process store backed by a `watch` channel.
#[derive(Debug)]
pub struct MemorySettingsStore {
    tx: watch::Sender<Settings>,
}

impl MemorySettingsStore {
    /// Store seeded with `initial`.
    pub fn new(initial: Settings) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replace every option.
    pub fn replace(&self, settings: Settings) {
        self.tx.send_replace(settings);
    }

    /// Patch individual options, see [`Settings::apply_changes`].
    pub fn apply_changes(&self, changes: &Map<String, Value>) {
        self.tx.send_modify(|settings| settings.apply_changes(changes));
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn snapshot(&self) -> Settings {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }
}
