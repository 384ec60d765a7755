//! Client for the foojay Disco API, the public index of downloadable JDK
//! distributions.

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Result, ToolchainError};
use crate::hashing::normalize_digest;
use crate::http::HttpTransport;
use crate::platform::{ArchiveType, Platform};

pub const DEFAULT_CATALOG_URL: &str = "https://api.foojay.io/disco/v3.0/packages";

/// Filters that do not depend on the request or the host.
const FIXED_FILTERS: [(&str, &str); 7] = [
    ("latest", "overall"),
    ("package_type", "jdk"),
    ("discovery_scope_id", "directly_downloadable"),
    ("match", "any"),
    ("javafx_bundled", "false"),
    ("directly_downloadable", "true"),
    ("release_status", "ga"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageQuery {
    pub vendor: String,
    pub version: String,
    pub platform: Platform,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageMatch {
    pub file_name: String,
    pub download_url: String,
    pub size_bytes: Option<u64>,
    /// Lower-case hex sha256, when the catalog publishes one.
    pub sha256: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    result: Vec<PackageSummary>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PackageSummary {
    filename: String,
    size: Option<u64>,
    links: PackageLinks,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PackageLinks {
    pkg_info_uri: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PackageInfoResponse {
    result: Vec<PackageInfo>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PackageInfo {
    direct_download_uri: String,
    checksum: String,
    checksum_type: String,
}

impl PackageQuery {
    pub fn new(version: impl Into<String>, vendor: impl Into<String>, platform: Platform) -> Self {
        Self {
            vendor: vendor.into(),
            version: version.into(),
            platform,
        }
    }

    pub fn archive_type(&self) -> ArchiveType {
        self.platform.os.archive_type()
    }

    /// Search parameters in the order they are sent.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let os = self.platform.os;
        let arch = self.platform.arch;
        let mut params = vec![
            ("distribution", self.vendor.clone()),
            ("version", self.version.clone()),
            ("operating_system", os.as_str().to_string()),
            ("architecture", arch.as_str().to_string()),
            ("bitness", arch.bitness().to_string()),
            ("archive_type", self.archive_type().as_str().to_string()),
            ("libc_type", os.libc_type().to_string()),
        ];
        params.extend(
            FIXED_FILTERS
                .iter()
                .map(|(key, value)| (*key, value.to_string())),
        );
        params
    }

    pub fn search_url(&self, base_url: &str) -> Result<String> {
        let url = Url::parse_with_params(base_url, self.params())
            .map_err(|e| ToolchainError::Transport(format!("invalid catalog url {base_url}: {e}")))?;
        Ok(url.to_string())
    }
}

pub struct CatalogClient<'a> {
    transport: &'a dyn HttpTransport,
    base_url: String,
}

impl<'a> CatalogClient<'a> {
    pub fn new(transport: &'a dyn HttpTransport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Resolves the catalog's top-ranked package for `query`.
    ///
    /// `Ok(None)` covers every "nothing to install" outcome: a non-200 status
    /// at either step, an empty result list, or a result without the fields
    /// needed to download it.
    pub fn find_package(&self, query: &PackageQuery) -> Result<Option<PackageMatch>> {
        let search_url = query.search_url(&self.base_url)?;
        debug!("Catalog search {}", search_url);

        let resp = self.transport.get(&search_url)?;
        if !resp.is_ok() {
            info!("Catalog search returned status {}", resp.status);
            return Ok(None);
        }
        let search: SearchResponse = parse_json(&search_url, &resp.body)?;
        let Some(package) = search.result.into_iter().next() else {
            info!(
                "No {} {} package in catalog for {}",
                query.vendor, query.version, query.platform
            );
            return Ok(None);
        };

        let file_name = package.filename.trim().to_string();
        let info_url = package.links.pkg_info_uri.trim().to_string();
        if file_name.is_empty() || info_url.is_empty() {
            warn!("Catalog package is missing filename or pkg_info_uri");
            return Ok(None);
        }

        debug!("Catalog package info {}", info_url);
        let resp = self.transport.get(&info_url)?;
        if !resp.is_ok() {
            info!("Catalog package info returned status {}", resp.status);
            return Ok(None);
        }
        let info: PackageInfoResponse = parse_json(&info_url, &resp.body)?;
        let Some(info) = info.result.into_iter().next() else {
            info!("Catalog package info for {} is empty", file_name);
            return Ok(None);
        };
        let download_url = info.direct_download_uri.trim().to_string();
        if download_url.is_empty() {
            warn!("Catalog package {} has no direct download uri", file_name);
            return Ok(None);
        }

        let sha256 = if info.checksum_type.eq_ignore_ascii_case("sha256")
            && !info.checksum.trim().is_empty()
        {
            Some(normalize_digest(&info.checksum))
        } else {
            None
        };

        Ok(Some(PackageMatch {
            file_name,
            download_url,
            size_bytes: package.size.filter(|size| *size > 0),
            sha256,
        }))
    }
}

fn parse_json<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| ToolchainError::CatalogFormat {
        url: url.to_string(),
        message: e.to_string(),
    })
}
