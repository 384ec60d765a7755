use std::path::PathBuf;

use tracing::{info, warn};

use crate::archive::{extract, jdk_home_for, root_entry_name};
use crate::artifacts::ensure_downloaded;
use crate::catalog::{CatalogClient, PackageQuery};
use crate::error::Result;
use crate::graalvm::{is_graalvm, spawn_native_image_install};
use crate::http::HttpTransport;
use crate::platform::Platform;

/// Catalog lookup, download, extraction and post-install hooks for one JDK.
pub struct CatalogProvisioner<'a> {
    transport: &'a dyn HttpTransport,
    catalog_url: String,
    jdks_dir: PathBuf,
    platform: Platform,
}

impl<'a> CatalogProvisioner<'a> {
    pub fn new(
        transport: &'a dyn HttpTransport,
        catalog_url: impl Into<String>,
        jdks_dir: impl Into<PathBuf>,
        platform: Platform,
    ) -> Self {
        Self {
            transport,
            catalog_url: catalog_url.into(),
            jdks_dir: jdks_dir.into(),
            platform,
        }
    }

    /// Home of the installed JDK, or `None` when the catalog has nothing for
    /// this version and vendor.
    pub fn provision(&self, version: &str, vendor: &str) -> Result<Option<PathBuf>> {
        info!("Installing JDK {} ({}) from the catalog", version, vendor);
        let query = PackageQuery::new(version, vendor, self.platform);
        let Some(package) =
            CatalogClient::new(self.transport, &self.catalog_url).find_package(&query)?
        else {
            return Ok(None);
        };

        let archive = ensure_downloaded(
            self.transport,
            &package.download_url,
            &package.file_name,
            &self.jdks_dir,
            package.sha256.as_deref(),
            package.size_bytes,
        )?;
        let root = root_entry_name(&archive)?;
        extract(&archive, &self.jdks_dir)?;

        let home = jdk_home_for(&self.jdks_dir.join(root));
        info!("JDK installed: {}", home.display());

        if is_graalvm(vendor) {
            if let Err(err) = spawn_native_image_install(&home) {
                warn!("native-image install skipped: {}", err);
            }
        }
        Ok(Some(home))
    }
}
