//! Cross-origin header injection.

use std::collections::BTreeMap;

use crate::config::CorsConfig;
use crate::relay::event::OutboundResponse;

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";

/// The three permissive CORS headers every relay response carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_origin: String,
    allow_headers: String,
    allow_methods: String,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            allow_origin: config.allow_origin.clone(),
            allow_headers: config.allow_headers.clone(),
            allow_methods: config.allow_methods.clone(),
        }
    }

    /// Answer to an OPTIONS request; never touches upstream.
    pub fn preflight(&self) -> OutboundResponse {
        let mut response = OutboundResponse::new(200, "");
        self.apply(&mut response.headers);
        response
    }

    /// Insert all three CORS headers.
    pub fn apply(&self, headers: &mut BTreeMap<String, String>) {
        self.apply_origin(headers);
        headers.insert(ALLOW_HEADERS.to_string(), self.allow_headers.clone());
        headers.insert(ALLOW_METHODS.to_string(), self.allow_methods.clone());
    }

    /// Insert only the allowed-origin header.
    pub fn apply_origin(&self, headers: &mut BTreeMap<String, String>) {
        headers.insert(ALLOW_ORIGIN.to_string(), self.allow_origin.clone());
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::from_config(&CorsConfig::default())
    }
}
