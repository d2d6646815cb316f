#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(any(), deny(clippy::unwrap_used))]

mod client;
pub mod constants;
mod dispatch;
pub mod errors;
mod identity;
pub mod lexicon;
mod locator;
mod macros;
mod output;
pub mod patterns;
mod records;
mod settings;
mod translator;
mod util;

pub mod prelude;

// --- PUBLIC API EXPORTS ---
// Transport
pub use client::{DEFAULT_REQUEST_TIMEOUT, RedirectHttpClient, RedirectHttpClientBuilder};
// Entry point
pub use translator::Translator;
// Pipeline stages
pub use dispatch::{Dispatched, MAX_DELEGATION_DEPTH};
pub use identity::{Did, DidDocument, DidMethod, IdentityResolver, ServiceDescriptor};
pub use output::{Outcome, Resolution};
pub use records::{ListRecordsBuilder, Record, RecordPage, RecordStore};

// Error types
pub use errors::{BuildError, Error, Result};

// Common types and constants
pub use constants::Endpoints;
pub use locator::ResourceLocator;
pub use patterns::PatternTable;
pub use settings::{MemorySettingsStore, Settings, SettingsStore};

// Re-exports
pub use reqwest::{Method, StatusCode};
