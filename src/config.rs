//! Security configuration loaded from TOML.
//!
//! ```toml
//! baseline = true
//!
//! [hsts]
//! max_age_seconds = 31536000
//! include_subdomains = true
//! preload = false
//!
//! [csp]
//! report_only = true
//!
//! [cors]
//! allowed_origins = ["https://dash.titan.example"]
//! ```
//!
//! A missing section leaves that unit disabled; a present but empty section
//! enables it with defaults. `baseline` defaults to `true`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::Error;
use crate::middleware::{self, CorsConfig, CspConfig, HstsConfig};
use crate::router::Router;

/// Which security stages to run, and how.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    pub baseline: bool,
    pub hsts: Option<HstsConfig>,
    pub csp: Option<CspConfig>,
    pub cors: Option<CorsConfig>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { baseline: true, hsts: None, csp: None, cors: None }
    }
}

impl SecurityConfig {
    pub fn from_toml(source: &str) -> Result<Self, Error> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&source)
    }

    /// Layers the enabled stages onto `router` in a fixed order: baseline,
    /// HSTS, CSP, CORS.
    pub fn apply(&self, mut router: Router) -> Router {
        if self.baseline {
            router = router.layer(middleware::security_headers());
        }
        if let Some(config) = self.hsts {
            router = router.layer(middleware::hsts(config));
        }
        if let Some(config) = self.csp {
            router = router.layer(middleware::csp(config));
        }
        if let Some(config) = &self.cors {
            router = router.layer(middleware::cors(config.clone()));
        }

        info!(
            baseline = self.baseline,
            hsts = self.hsts.is_some(),
            csp = self.csp.is_some(),
            cors = self.cors.is_some(),
            "security stages configured",
        );
        router
    }
}
