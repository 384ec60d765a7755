use std::io::Write;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::ProxyConfig;
use crate::error::{Result, ToolchainError};

const USER_AGENT: &str = concat!("jdkup/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Blocking HTTP seam used by the catalog client and the archive fetcher.
///
/// Implementations return `Err(ToolchainError::Transport)` only when no
/// response was obtained; HTTP status handling is left to the caller for
/// `get`, while `download` treats any non-2xx status as a transport failure.
pub trait HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse>;

    /// Streams the body of `url` into `dest`, returning the number of bytes.
    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(proxy: Option<&ProxyConfig>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Option::<Duration>::None);

        if let Some(proxy) = proxy {
            let mut rp = reqwest::Proxy::all(proxy.url.as_str()).map_err(|e| {
                ToolchainError::Transport(format!("invalid proxy {}: {e}", proxy.url))
            })?;
            if let Some(username) = proxy.username.as_deref() {
                rp = rp.basic_auth(username, proxy.password.as_deref().unwrap_or(""));
            }
            builder = builder.proxy(rp);
        }

        let client = builder
            .build()
            .map_err(|e| ToolchainError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| ToolchainError::Transport(format!("GET {url} failed: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .map_err(|e| ToolchainError::Transport(format!("reading {url} failed: {e}")))?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }

    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        let mut resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| ToolchainError::Transport(format!("download {url} failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(ToolchainError::Transport(format!(
                "download {url} failed with status {}",
                resp.status()
            )));
        }
        std::io::copy(&mut resp, dest)
            .map_err(|e| ToolchainError::Transport(format!("download {url} read failed: {e}")))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_authenticated_proxy() {
        let proxy = ProxyConfig::new("proxy.corp:3128")
            .with_credentials(Some("build".into()), Some("secret".into()));
        assert!(ReqwestTransport::new(Some(&proxy)).is_ok());
        assert!(ReqwestTransport::new(None).is_ok());
    }

    #[test]
    fn only_200_counts_as_ok() {
        let ok = HttpResponse {
            status: 200,
            body: Vec::new(),
        };
        let redirect = HttpResponse {
            status: 204,
            body: Vec::new(),
        };
        assert!(ok.is_ok());
        assert!(!redirect.is_ok());
    }
}
