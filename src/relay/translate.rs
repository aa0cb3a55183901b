//! Inbound path → upstream URL translation.

use url::Url;

use crate::config::UpstreamConfig;

/// Strip the mount prefix from an inbound path.
///
/// An empty remainder becomes `/`. Paths that do not start with the prefix
/// are passed through unchanged.
pub fn translate_path(path: &str, mount_prefix: &str) -> String {
    let rest = path.strip_prefix(mount_prefix).unwrap_or(path);
    if rest.is_empty() {
        "/".to_string()
    } else {
        rest.to_string()
    }
}

/// Location of the backend every call is relayed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    base: Url,
    api_prefix: String,
}

impl Upstream {
    pub fn new(host: &str, port: u16, api_prefix: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(&format!("http://{host}:{port}"))?,
            api_prefix: api_prefix.into(),
        })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, url::ParseError> {
        Self::new(&config.host, config.port, config.api_prefix.clone())
    }

    /// Build `http://<host>:<port><api_prefix><path>[?query]`.
    ///
    /// Characters not allowed in a path or query (spaces, non-ASCII) are
    /// percent-encoded; existing `%XX` escapes are kept as they are.
    pub fn target_url(&self, translated_path: &str, query: Option<&str>) -> String {
        let mut url = self.base.clone();
        url.set_path(&format!("{}{}", self.api_prefix, translated_path));
        url.set_query(query.filter(|q| !q.is_empty()));
        url.into()
    }
}
