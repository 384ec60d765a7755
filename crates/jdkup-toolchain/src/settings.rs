use std::{fs, io, path::Path};

use crate::config::ProxyConfig;
use crate::error::{Result, ToolchainError};
use crate::xml::Element;

const DEFAULT_PROXY_PORT: &str = "8080";

/// First proxy in Maven's `settings.xml` whose `<active>` is not `false`.
pub fn active_proxy(settings_file: &Path) -> Result<Option<ProxyConfig>> {
    let raw = match fs::read_to_string(settings_file) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(ToolchainError::registry_read(settings_file, err)),
    };
    let root = Element::parse(&raw).map_err(|e| ToolchainError::registry_read(settings_file, e))?;
    Ok(proxy_from_settings(&root))
}

fn proxy_from_settings(root: &Element) -> Option<ProxyConfig> {
    let proxies = root.child("proxies")?;
    proxies
        .children_named("proxy")
        .filter(|proxy| {
            proxy
                .child_text("active")
                .map(|value| !value.eq_ignore_ascii_case("false"))
                .unwrap_or(true)
        })
        .find_map(|proxy| {
            let host = proxy.child_text("host")?;
            let protocol = proxy.child_text("protocol").unwrap_or("http");
            let port = proxy.child_text("port").unwrap_or(DEFAULT_PROXY_PORT);
            let config = ProxyConfig::new(&format!("{protocol}://{host}:{port}"));
            Some(config.with_credentials(
                proxy.child_text("username").map(str::to_string),
                proxy.child_text("password").map(str::to_string),
            ))
        })
}
