use std::path::PathBuf;

use tracing::{debug, warn};

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::settings::active_proxy;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyConfig {
    /// `scheme://host:port`; a bare `host:port` is treated as http.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn new(url: &str) -> Self {
        let url = url.trim();
        let url = if url.contains("://") {
            url.to_string()
        } else {
            format!("http://{url}")
        };
        Self {
            url,
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username.filter(|value| !value.is_empty());
        self.password = password;
        self
    }
}

/// Everything the resolver needs to know about the local machine. Defaults
/// come from `jdkup_util`; the CLI layers flags and `JDKUP_*` variables on top.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    pub toolchains_file: PathBuf,
    pub jdks_dir: PathBuf,
    pub settings_file: PathBuf,
    /// `None` disables the secondary JDK manager entirely.
    pub jbang_home: Option<PathBuf>,
    pub catalog_url: String,
    pub proxy: Option<ProxyConfig>,
    pub skip: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            toolchains_file: jdkup_util::toolchains_file(),
            jdks_dir: jdkup_util::jdks_dir(),
            settings_file: jdkup_util::settings_file(),
            jbang_home: Some(jdkup_util::jbang_home()),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            proxy: None,
            skip: false,
        }
    }
}

impl ResolverConfig {
    /// Explicit proxy first, then the first active proxy of the Maven
    /// settings file.
    pub fn effective_proxy(&self) -> Option<ProxyConfig> {
        if let Some(proxy) = &self.proxy {
            return Some(proxy.clone());
        }
        match active_proxy(&self.settings_file) {
            Ok(Some(proxy)) => {
                debug!(
                    "Using proxy {} from {}",
                    proxy.url,
                    self.settings_file.display()
                );
                Some(proxy)
            }
            Ok(None) => None,
            Err(err) => {
                warn!("Ignoring proxy settings: {}", err);
                None
            }
        }
    }
}
