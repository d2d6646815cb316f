//! Common imports for quick starts.

// Common
pub use crate::{BuildError, Error, Result};

// Transport
pub use crate::{RedirectHttpClient, RedirectHttpClientBuilder};

// Translation and its inputs
pub use crate::{MemorySettingsStore, Outcome, Settings, SettingsStore, Translator};

// Lower level building blocks
pub use crate::{IdentityResolver, RecordStore, ResourceLocator};
