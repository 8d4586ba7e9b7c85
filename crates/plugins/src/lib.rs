//! `ev-plugins` — resolves a datasource URL to the snapshot plugin that
//! serves its scheme.
//!
//! Plugins are linked into the build and installed into a
//! [`PluginRegistry`]; resolution never loads code at runtime.

pub mod resolver;

pub use resolver::{Datasource, PluginRegistry, ResolveError, DEFAULT_PROTOCOLS};
