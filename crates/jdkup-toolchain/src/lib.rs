//! Resolution and provisioning of Maven JDK toolchains.
//!
//! Requirements are matched against `~/.m2/toolchains.xml` first. Missing JDKs
//! are installed through jbang or the foojay catalog and appended to the same
//! file so the next run finds them.

pub mod archive;
pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod graalvm;
mod hashing;
pub mod http;
pub mod jbang;
pub mod matcher;
pub mod platform;
pub mod provision;
pub mod registry;
pub mod resolver;
pub mod settings;
pub mod xml;

pub use catalog::{CatalogClient, PackageMatch, PackageQuery, DEFAULT_CATALOG_URL};
pub use config::{ProxyConfig, ResolverConfig};
pub use error::{Result, ToolchainError};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport};
pub use jbang::{JbangManager, JdkManager};
pub use platform::{Architecture, ArchiveType, OsFamily, Platform};
pub use provision::CatalogProvisioner;
pub use registry::{ToolchainCandidate, ToolchainRegistry, ToolchainSource};
pub use resolver::{
    BuildContext, ResolutionFailure, ResolveError, ResolvedToolchain, Resolver, ToolchainOrigin,
    ToolchainRequirement, DEFAULT_VENDOR,
};
