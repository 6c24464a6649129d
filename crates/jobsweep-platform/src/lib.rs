//! Platform definitions and adapters for job listing platforms.
//!
//! This crate turns per-site TOML definitions into working adapters that
//! the orchestration engine can drive uniformly:
//!
//! - [`definition`] - TOML platform definitions (selectors, URL templates,
//!   login and apply flows)
//! - [`loader`] / [`catalog`] - loading definitions from disk and serving
//!   lookups
//! - [`adapter`] - the [`PlatformAdapter`] capability trait and its shared
//!   types
//! - [`dynamic`] - browser-driven adapter for JavaScript-heavy platforms
//! - [`static_site`] - stateless request/parse adapter for plain-document
//!   platforms

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod adapter;
pub mod catalog;
pub mod definition;
pub mod dynamic;
pub mod error;
pub mod loader;
pub mod static_site;

pub use adapter::{
    render_search_url, ApplyOutcome, CandidateStream, DocumentSet, PlatformAdapter, RotationHint,
    SearchQuery,
};
pub use catalog::PlatformCatalog;
pub use definition::{
    ApplyMethod, ApplySelectors, CardSelectors, LoginFlow, PlatformDefinition, PlatformMetadata,
    SearchMethod,
};
pub use dynamic::DynamicAdapter;
pub use error::{PlatformError, Result};
pub use loader::DefinitionLoader;
pub use static_site::StaticAdapter;
