//! Plugin registry — maps datasource schemes to snapshot plugins.

use std::collections::HashMap;
use std::sync::Arc;

use ev_domain::stream::BoxStream;
use ev_domain::Event;
use reqwest::Url;

/// Schemes known out of the box, with the crate that serves each.
pub const DEFAULT_PROTOCOLS: &[(&str, &str)] = &[("mongodb", "ev-snapshot-mongo")];

/// Implement this trait to serve snapshots for a datasource scheme.
///
/// # Example
///
/// ```rust,no_run
/// use ev_domain::stream::BoxStream;
/// use ev_domain::Event;
/// use ev_plugins::Datasource;
///
/// struct Empty;
///
/// #[async_trait::async_trait]
/// impl Datasource for Empty {
///     async fn snapshot(&self, _url: &str) -> ev_domain::Result<BoxStream<'static, Event>> {
///         Ok(Box::pin(futures_util::stream::empty()))
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Datasource: Send + Sync + 'static {
    /// Stream every stored event of the datasource at `url`, oldest first.
    async fn snapshot(&self, url: &str) -> ev_domain::Result<BoxStream<'static, Event>>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no datasource given\nusage: ev-snapshot <DATASOURCE>")]
    NoDatasource,
    #[error("no protocol in datasource {0:?}")]
    NoProtocol(String),
    #[error("invalid datasource {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{0}: is unknown")]
    UnknownProtocol(String),
    #[error(
        "cannot resolve plugin {module}. Make sure it is installed:\n    \
         add `{module}` to [dependencies] in Cargo.toml\n    \
         then register it with PluginRegistry::install(\"{module}\", ...)"
    )]
    ModuleNotFound { module: String },
}

/// Registry of protocol mappings and installed plugins.
///
/// ```rust,no_run
/// # use ev_plugins::PluginRegistry;
/// let mut reg = PluginRegistry::with_defaults();
/// // reg.install("ev-snapshot-mongo", MongoSnapshot::new());
/// let err = reg.resolve(Some("mongodb://db/events")).err();
/// ```
#[derive(Clone, Default)]
pub struct PluginRegistry {
    protocols: HashMap<String, String>,
    modules: HashMap<String, Arc<dyn Datasource>>,
}

impl PluginRegistry {
    /// An empty registry with no protocol mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with [`DEFAULT_PROTOCOLS`].
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        for (scheme, module) in DEFAULT_PROTOCOLS {
            reg.map_protocol(*scheme, *module);
        }
        reg
    }

    /// Serve `scheme` (without the trailing `:`) with `module`.
    pub fn map_protocol(&mut self, scheme: impl Into<String>, module: impl Into<String>) {
        self.protocols
            .insert(scheme.into().to_ascii_lowercase(), module.into());
    }

    /// Link `plugin` into the registry under `module`.
    pub fn install<D: Datasource>(&mut self, module: impl Into<String>, plugin: D) {
        self.modules.insert(module.into(), Arc::new(plugin));
    }

    pub fn module_for(&self, scheme: &str) -> Option<&str> {
        self.protocols.get(scheme).map(String::as_str)
    }

    /// Find the plugin serving `datasource`.
    pub fn resolve(&self, datasource: Option<&str>) -> Result<Arc<dyn Datasource>, ResolveError> {
        let result = self.lookup(datasource);
        if let Err(ref e) = result {
            tracing::warn!(datasource = ?datasource, error = %e, "plugin resolution failed");
        }
        result
    }

    fn lookup(&self, datasource: Option<&str>) -> Result<Arc<dyn Datasource>, ResolveError> {
        let datasource = datasource
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ResolveError::NoDatasource)?;

        if !has_scheme(datasource) {
            return Err(ResolveError::NoProtocol(datasource.to_owned()));
        }
        let url = Url::parse(datasource).map_err(|e| ResolveError::InvalidUrl {
            url: datasource.to_owned(),
            reason: e.to_string(),
        })?;

        let scheme = url.scheme();
        let module = self
            .module_for(scheme)
            .ok_or_else(|| ResolveError::UnknownProtocol(scheme.to_owned()))?;

        let plugin = self
            .modules
            .get(module)
            .cloned()
            .ok_or_else(|| ResolveError::ModuleNotFound {
                module: module.to_owned(),
            })?;
        tracing::debug!(scheme, module, "resolved datasource plugin");
        Ok(plugin)
    }
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"` prefix.
fn has_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
