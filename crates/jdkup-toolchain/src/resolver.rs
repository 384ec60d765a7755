use std::{
    collections::{BTreeMap, BTreeSet},
    env, fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::ResolverConfig;
use crate::error::{Result, ToolchainError};
use crate::http::HttpTransport;
use crate::jbang::{JbangManager, JdkManager};
use crate::matcher::VERSION_KEY;
use crate::platform::Platform;
use crate::provision::CatalogProvisioner;
use crate::registry::{
    ToolchainCandidate, ToolchainRegistry, ToolchainSource, JDK_HOME_KEY, JDK_TYPE,
};

pub const DEFAULT_VENDOR: &str = "oracle_open_jdk";
pub const VENDOR_KEY: &str = "vendor";

const UNRESOLVED_HEADER: &str =
    "Cannot find matching toolchain definitions for the following toolchain types:";
const UNRESOLVED_HINT: &str =
    "Please make sure you define the required toolchains in your ~/.m2/toolchains.xml file.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainRequirement {
    #[serde(rename = "type")]
    pub toolchain_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ToolchainRequirement {
    pub fn new(toolchain_type: impl Into<String>) -> Self {
        Self {
            toolchain_type: toolchain_type.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// `jdk [ version='17' vendor='temurin' ]`, or `jdk [ any ]`.
impl fmt::Display for ToolchainRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.toolchain_type)?;
        if self.params.is_empty() {
            write!(f, " any")?;
        }
        for (key, value) in &self.params {
            write!(f, " {key}='{value}'")?;
        }
        write!(f, " ]")
    }
}

/// Parses `type` or `type:key=value,key=value`. Values may be version
/// ranges such as `[11,17)` or `(,9],[11,)`.
impl FromStr for ToolchainRequirement {
    type Err = ToolchainError;

    fn from_str(raw: &str) -> Result<Self> {
        let (toolchain_type, params) = match raw.split_once(':') {
            Some((toolchain_type, params)) => (toolchain_type.trim(), params),
            None => (raw.trim(), ""),
        };
        if toolchain_type.is_empty() {
            return Err(ToolchainError::InvalidRequirement(format!(
                "missing toolchain type in '{raw}'"
            )));
        }
        let mut requirement = ToolchainRequirement::new(toolchain_type);
        for pair in split_params(params) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                ToolchainError::InvalidRequirement(format!("expected key=value, got '{pair}'"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ToolchainError::InvalidRequirement(format!(
                    "empty key in '{pair}'"
                )));
            }
            requirement.params.insert(key.to_string(), value.trim().to_string());
        }
        Ok(requirement)
    }
}

/// Splits on commas outside brackets; a piece opening a new range belongs to
/// the preceding value.
fn split_params(raw: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    pieces.push(current);

    let mut pairs: Vec<String> = Vec::new();
    for piece in pieces.iter().map(|piece| piece.trim()).filter(|piece| !piece.is_empty()) {
        match pairs.last_mut() {
            Some(previous) if piece.starts_with(['[', '(']) => {
                previous.push(',');
                previous.push_str(piece);
            }
            _ => pairs.push(piece.to_string()),
        }
    }
    pairs
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolchainOrigin {
    Existing,
    JdkManager,
    Catalog,
}

impl ToolchainOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolchainOrigin::Existing => "existing",
            ToolchainOrigin::JdkManager => "jdk_manager",
            ToolchainOrigin::Catalog => "catalog",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedToolchain {
    #[serde(rename = "type")]
    pub toolchain_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jdk_home: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub provides: BTreeMap<String, String>,
    pub configuration: BTreeMap<String, String>,
    pub origin: ToolchainOrigin,
}

impl ResolvedToolchain {
    fn from_candidate(candidate: ToolchainCandidate, origin: ToolchainOrigin) -> Self {
        Self {
            jdk_home: candidate.jdk_home().map(jdkup_util::expand_user),
            version: candidate.provides.get(VERSION_KEY).cloned(),
            vendor: candidate.provides.get(VENDOR_KEY).cloned(),
            toolchain_type: candidate.toolchain_type,
            provides: candidate.provides,
            configuration: candidate.configuration,
            origin,
        }
    }
}

/// Toolchains selected for the current build, keyed by type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildContext {
    toolchains: BTreeMap<String, ResolvedToolchain>,
}

impl BuildContext {
    pub fn get(&self, toolchain_type: &str) -> Option<&ResolvedToolchain> {
        self.toolchains.get(toolchain_type)
    }

    pub fn len(&self) -> usize {
        self.toolchains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toolchains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResolvedToolchain)> {
        self.toolchains.iter()
    }

    fn store(&mut self, toolchain: ResolvedToolchain) {
        self.toolchains
            .insert(toolchain.toolchain_type.clone(), toolchain);
    }
}

/// Requirements that could neither be matched nor provisioned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub unresolved: Vec<ToolchainRequirement>,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(UNRESOLVED_HEADER)?;
        for requirement in &self.unresolved {
            write!(f, "\n{requirement}")?;
        }
        write!(f, "\n{UNRESOLVED_HINT}")
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    Misconfigured(#[source] ToolchainError),
    #[error("{0}")]
    InvalidRequirements(#[source] ToolchainError),
    #[error("{0}")]
    Unresolved(ResolutionFailure),
}

/// Resolves toolchain requirements against the registry, then a JDK manager,
/// then the catalog.
pub struct Resolver<'a> {
    config: ResolverConfig,
    registry: ToolchainRegistry,
    source: Option<Box<dyn ToolchainSource + 'a>>,
    transport: &'a dyn HttpTransport,
    jdk_manager: Option<Box<dyn JdkManager + 'a>>,
    platform: Platform,
}

impl<'a> Resolver<'a> {
    pub fn new(config: ResolverConfig, transport: &'a dyn HttpTransport) -> Self {
        let registry = ToolchainRegistry::new(config.toolchains_file.clone());
        let jdk_manager = config
            .jbang_home
            .clone()
            .map(|home| Box::new(JbangManager::new(home)) as Box<dyn JdkManager + 'a>);
        Self {
            config,
            registry,
            source: None,
            transport,
            jdk_manager,
            platform: Platform::detect(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_jdk_manager(mut self, manager: Option<Box<dyn JdkManager + 'a>>) -> Self {
        self.jdk_manager = manager;
        self
    }

    /// Queries `source` for existing toolchains instead of the registry file.
    /// Provisioned JDKs are still appended to the registry file.
    pub fn with_source(mut self, source: Box<dyn ToolchainSource + 'a>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn registry(&self) -> &ToolchainRegistry {
        &self.registry
    }

    fn source(&self) -> &dyn ToolchainSource {
        match &self.source {
            Some(source) => source.as_ref(),
            None => &self.registry,
        }
    }

    pub fn resolve(
        &self,
        requirements: &[ToolchainRequirement],
    ) -> Result<BuildContext, ResolveError> {
        let mut context = BuildContext::default();
        if self.config.skip {
            info!("toolchain resolution skipped.");
            return Ok(context);
        }
        if requirements.is_empty() {
            warn!("No toolchains requirements configured.");
            return Ok(context);
        }
        reject_duplicate_types(requirements).map_err(ResolveError::InvalidRequirements)?;

        let mut unresolved = Vec::new();
        for requirement in requirements {
            match self.select(requirement)? {
                Some(toolchain) => {
                    jdkup_telemetry::event(
                        "toolchain.resolved",
                        &[
                            ("type", toolchain.toolchain_type.as_str()),
                            ("origin", toolchain.origin.as_str()),
                        ],
                    );
                    context.store(toolchain);
                }
                None => {
                    jdkup_telemetry::event(
                        "toolchain.failed",
                        &[("type", requirement.toolchain_type.as_str())],
                    );
                    unresolved.push(requirement.clone());
                }
            }
        }

        if unresolved.is_empty() {
            Ok(context)
        } else {
            let failure = ResolutionFailure { unresolved };
            error!("{}", failure);
            Err(ResolveError::Unresolved(failure))
        }
    }

    fn select(
        &self,
        requirement: &ToolchainRequirement,
    ) -> Result<Option<ResolvedToolchain>, ResolveError> {
        info!("Required toolchain: {}", requirement);
        let toolchain_type = requirement.toolchain_type.as_str();
        let candidates = self
            .source()
            .toolchains_for_type(toolchain_type)
            .map_err(ResolveError::Misconfigured)?;

        let mut type_found = 0usize;
        for candidate in candidates {
            if candidate.toolchain_type != toolchain_type {
                continue;
            }
            type_found += 1;
            if candidate.matches_requirements(&requirement.params) {
                info!(
                    "Found matching toolchain for type {}: {}",
                    toolchain_type,
                    describe_candidate(&candidate)
                );
                return Ok(Some(ResolvedToolchain::from_candidate(
                    candidate,
                    ToolchainOrigin::Existing,
                )));
            }
        }

        // The registry entry is always `jdk`; the context keeps the requested spelling.
        let provisioned = if toolchain_type.eq_ignore_ascii_case(JDK_TYPE) {
            self.provision_jdk(requirement)
                .map(|toolchain| ResolvedToolchain {
                    toolchain_type: toolchain_type.to_string(),
                    ..toolchain
                })
        } else {
            None
        };
        if provisioned.is_none() {
            if type_found == 0 {
                error!("No toolchain found for type {}", toolchain_type);
            } else {
                error!(
                    "No toolchain matched from {} found for type {}",
                    type_found, toolchain_type
                );
            }
        }
        Ok(provisioned)
    }

    fn provision_jdk(&self, requirement: &ToolchainRequirement) -> Option<ResolvedToolchain> {
        let Some(version) = requirement.param(VERSION_KEY) else {
            warn!("Cannot install a JDK without a version requirement");
            return None;
        };
        let vendor = requirement.param(VENDOR_KEY).unwrap_or(DEFAULT_VENDOR);

        if vendor.eq_ignore_ascii_case(DEFAULT_VENDOR) {
            if let Some(manager) = self.jdk_manager.as_deref().filter(|m| m.is_available()) {
                match self.resolve_with_manager(manager, version, vendor) {
                    Ok(toolchain) => return Some(toolchain),
                    Err(err) => warn!("Failed to find JDK from {}: {}", manager.name(), err),
                }
            }
        }

        match self.resolve_from_catalog(version, vendor) {
            Ok(Some(toolchain)) => Some(toolchain),
            Ok(None) => {
                info!("Catalog has no {} JDK for version {}", vendor, version);
                None
            }
            Err(err) => {
                error!("Failed to download and install JDK: {}", err);
                None
            }
        }
    }

    fn resolve_with_manager(
        &self,
        manager: &dyn JdkManager,
        version: &str,
        vendor: &str,
    ) -> Result<ResolvedToolchain> {
        let home = manager.resolve(version)?;
        self.register(&home, version, vendor, ToolchainOrigin::JdkManager)
    }

    fn resolve_from_catalog(
        &self,
        version: &str,
        vendor: &str,
    ) -> Result<Option<ResolvedToolchain>> {
        let provisioner = CatalogProvisioner::new(
            self.transport,
            self.config.catalog_url.clone(),
            self.config.jdks_dir.clone(),
            self.platform,
        );
        match provisioner.provision(version, vendor)? {
            Some(home) => self
                .register(&home, version, vendor, ToolchainOrigin::Catalog)
                .map(Some),
            None => Ok(None),
        }
    }

    fn register(
        &self,
        home: &Path,
        version: &str,
        vendor: &str,
        origin: ToolchainOrigin,
    ) -> Result<ResolvedToolchain> {
        let home = if home.is_absolute() {
            home.to_path_buf()
        } else {
            env::current_dir()?.join(home)
        };
        self.registry.append_jdk_toolchain(&home, version, vendor)?;

        let candidate = ToolchainCandidate {
            toolchain_type: JDK_TYPE.to_string(),
            provides: BTreeMap::from([
                (VERSION_KEY.to_string(), version.to_string()),
                (VENDOR_KEY.to_string(), vendor.to_string()),
            ]),
            configuration: BTreeMap::from([(
                JDK_HOME_KEY.to_string(),
                home.to_string_lossy().into_owned(),
            )]),
        };
        Ok(ResolvedToolchain::from_candidate(candidate, origin))
    }
}

/// The build context holds one toolchain per type.
fn reject_duplicate_types(requirements: &[ToolchainRequirement]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for requirement in requirements {
        if !seen.insert(requirement.toolchain_type.as_str()) {
            return Err(ToolchainError::InvalidRequirement(format!(
                "toolchain type '{}' is required more than once",
                requirement.toolchain_type
            )));
        }
    }
    Ok(())
}

fn describe_candidate(candidate: &ToolchainCandidate) -> String {
    let provides: Vec<_> = candidate
        .provides
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    match candidate.jdk_home() {
        Some(home) => format!(
            "{} ({}) at {}",
            candidate.toolchain_type,
            provides.join(", "),
            home
        ),
        None => format!("{} ({})", candidate.toolchain_type, provides.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::FakeTransport;
    use crate::platform::{Architecture, OsFamily};
    use std::cell::RefCell;
    use std::fs;

    struct StaticSource(Vec<ToolchainCandidate>);

    impl ToolchainSource for StaticSource {
        fn toolchains_for_type(&self, toolchain_type: &str) -> Result<Vec<ToolchainCandidate>> {
            Ok(self
                .0
                .iter()
                .filter(|c| c.toolchain_type == toolchain_type)
                .cloned()
                .collect())
        }
    }

    struct BrokenSource;

    impl ToolchainSource for BrokenSource {
        fn toolchains_for_type(&self, _toolchain_type: &str) -> Result<Vec<ToolchainCandidate>> {
            Err(ToolchainError::Misconfigured(
                "Java toolchain without the jdkHome configuration element.".into(),
            ))
        }
    }

    /// Records requested versions; `home` of `None` makes every call fail.
    struct FakeManager {
        home: Option<PathBuf>,
        calls: RefCell<Vec<String>>,
    }

    impl JdkManager for FakeManager {
        fn name(&self) -> &str {
            "fake"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn resolve(&self, version: &str) -> Result<PathBuf> {
            self.calls.borrow_mut().push(version.to_string());
            self.home
                .clone()
                .ok_or_else(|| ToolchainError::subprocess("fake", "install failed"))
        }
    }

    fn candidate(toolchain_type: &str, provides: &[(&str, &str)], home: &str) -> ToolchainCandidate {
        ToolchainCandidate {
            toolchain_type: toolchain_type.into(),
            provides: provides
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            configuration: BTreeMap::from([(JDK_HOME_KEY.to_string(), home.to_string())]),
        }
    }

    fn config(dir: &Path) -> ResolverConfig {
        ResolverConfig {
            toolchains_file: dir.join("toolchains.xml"),
            jdks_dir: dir.join("jdks"),
            settings_file: dir.join("settings.xml"),
            jbang_home: None,
            catalog_url: "https://catalog.test/packages".into(),
            proxy: None,
            skip: false,
        }
    }

    fn linux() -> Platform {
        Platform::new(OsFamily::Linux, Architecture::X64)
    }

    #[test]
    fn requirement_descriptions() {
        let requirement = ToolchainRequirement::new("jdk")
            .with_param("version", "17")
            .with_param("vendor", "temurin");
        assert_eq!(
            requirement.to_string(),
            "jdk [ vendor='temurin' version='17' ]"
        );
        assert_eq!(ToolchainRequirement::new("netbeans").to_string(), "netbeans [ any ]");
    }

    #[test]
    fn requirements_parse_from_cli_syntax() {
        let parsed: ToolchainRequirement = "jdk:version=[11,17), vendor=zulu".parse().unwrap();
        assert_eq!(parsed.toolchain_type, "jdk");
        assert_eq!(parsed.param("version"), Some("[11,17)"));
        assert_eq!(parsed.param("vendor"), Some("zulu"));

        let bare: ToolchainRequirement = "netbeans".parse().unwrap();
        assert!(bare.params.is_empty());

        assert!("".parse::<ToolchainRequirement>().is_err());
        assert!("jdk:version".parse::<ToolchainRequirement>().is_err());
        assert!("jdk:=17".parse::<ToolchainRequirement>().is_err());
    }

    #[test]
    fn range_unions_survive_parsing() {
        let parsed: ToolchainRequirement = "jdk:version=(,9],[11,),vendor=temurin".parse().unwrap();
        assert_eq!(parsed.param("version"), Some("(,9],[11,)"));
        assert_eq!(parsed.param("vendor"), Some("temurin"));
        assert_eq!(parsed.params.len(), 2);

        assert!(candidate_with_version("11.0.2").matches_requirements(&parsed.params));
        assert!(candidate_with_version("1.8").matches_requirements(&parsed.params));
        assert!(!candidate_with_version("10").matches_requirements(&parsed.params));

        let trailing: ToolchainRequirement = "jdk:vendor=zulu,version=[17,)".parse().unwrap();
        assert_eq!(trailing.param("version"), Some("[17,)"));
        assert_eq!(trailing.param("vendor"), Some("zulu"));
    }

    fn candidate_with_version(version: &str) -> ToolchainCandidate {
        candidate("jdk", &[("version", version), ("vendor", "temurin")], "/jdk")
    }

    #[test]
    fn repeated_type_is_rejected_before_matching() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default();
        let resolver = Resolver::new(config(dir.path()), &transport)
            .with_platform(linux())
            .with_source(Box::new(StaticSource(vec![
                candidate("jdk", &[("version", "11")], "/jdk/11"),
                candidate("jdk", &[("version", "17")], "/jdk/17"),
            ])));

        let err = resolver
            .resolve(&[
                ToolchainRequirement::new("jdk").with_param("version", "11"),
                ToolchainRequirement::new("jdk").with_param("version", "17"),
            ])
            .unwrap_err();
        match err {
            ResolveError::InvalidRequirements(ToolchainError::InvalidRequirement(message)) => {
                assert!(message.contains("'jdk'"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn first_matching_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default();
        let source = StaticSource(vec![
            candidate("jdk", &[("version", "11"), ("vendor", "temurin")], "/jdk/11"),
            candidate("jdk", &[("version", "17.0.2"), ("vendor", "temurin")], "/jdk/17a"),
            candidate("jdk", &[("version", "17.0.5"), ("vendor", "temurin")], "/jdk/17b"),
            candidate("netbeans", &[("id", "nb")], "/nb"),
        ]);
        let resolver = Resolver::new(config(dir.path()), &transport)
            .with_platform(linux())
            .with_source(Box::new(source));

        let context = resolver
            .resolve(&[
                ToolchainRequirement::new("jdk").with_param("version", "[17,18)"),
                ToolchainRequirement::new("netbeans"),
            ])
            .unwrap();

        assert_eq!(context.len(), 2);
        let jdk = context.get("jdk").unwrap();
        assert_eq!(jdk.origin, ToolchainOrigin::Existing);
        assert_eq!(jdk.jdk_home, Some(PathBuf::from("/jdk/17a")));
        assert_eq!(jdk.version.as_deref(), Some("17.0.2"));
        assert_eq!(context.get("netbeans").unwrap().provides["id"], "nb");
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn skip_and_empty_requirements_are_no_ops() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default();
        let mut skipped = config(dir.path());
        skipped.skip = true;
        let resolver = Resolver::new(skipped, &transport).with_source(Box::new(BrokenSource));
        let context = resolver
            .resolve(&[ToolchainRequirement::new("jdk").with_param("version", "17")])
            .unwrap();
        assert!(context.is_empty());

        let resolver = Resolver::new(config(dir.path()), &transport);
        assert!(resolver.resolve(&[]).unwrap().is_empty());
    }

    #[test]
    fn misconfigured_source_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default();
        let resolver =
            Resolver::new(config(dir.path()), &transport).with_source(Box::new(BrokenSource));
        let err = resolver
            .resolve(&[ToolchainRequirement::new("jdk").with_param("version", "17")])
            .unwrap_err();
        assert!(matches!(err, ResolveError::Misconfigured(_)));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn non_jdk_types_are_never_provisioned() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default();
        let resolver = Resolver::new(config(dir.path()), &transport)
            .with_source(Box::new(StaticSource(Vec::new())));
        let err = resolver
            .resolve(&[ToolchainRequirement::new("netbeans").with_param("id", "nb")])
            .unwrap_err();
        match err {
            ResolveError::Unresolved(failure) => {
                assert_eq!(failure.unresolved.len(), 1);
                let message = failure.to_string();
                assert!(message.starts_with(UNRESOLVED_HEADER));
                assert!(message.contains("\nnetbeans [ id='nb' ]\n"));
                assert!(message.ends_with(UNRESOLVED_HINT));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn jdk_without_version_is_not_provisioned() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default();
        let resolver = Resolver::new(config(dir.path()), &transport)
            .with_source(Box::new(StaticSource(Vec::new())));
        let err = resolver
            .resolve(&[ToolchainRequirement::new("jdk").with_param("vendor", "zulu")])
            .unwrap_err();
        assert!(matches!(err, ResolveError::Unresolved(_)));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn jdk_manager_handles_default_vendor() {
        let dir = tempfile::tempdir().unwrap();
        let jbang_jdk = dir.path().join("jbang/cache/jdks/8");
        fs::create_dir_all(&jbang_jdk).unwrap();
        let transport = FakeTransport::default();
        let resolver = Resolver::new(config(dir.path()), &transport)
            .with_platform(linux())
            .with_jdk_manager(Some(Box::new(FakeManager {
                home: Some(jbang_jdk.clone()),
                calls: RefCell::new(Vec::new()),
            })));

        let context = resolver
            .resolve(&[ToolchainRequirement::new("JDK").with_param("version", "1.8")])
            .unwrap();
        assert!(context.get("jdk").is_none());
        let jdk = context.get("JDK").unwrap();
        assert_eq!(jdk.toolchain_type, "JDK");
        assert_eq!(jdk.origin, ToolchainOrigin::JdkManager);
        assert_eq!(jdk.jdk_home.as_deref(), Some(jbang_jdk.as_path()));
        assert_eq!(jdk.vendor.as_deref(), Some(DEFAULT_VENDOR));
        assert!(transport.requests.borrow().is_empty());

        let registered = resolver.registry().all_toolchains().unwrap();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].provides["version"], "1.8");
        assert_eq!(registered[0].toolchain_type, JDK_TYPE);
    }

    #[test]
    fn other_vendors_skip_the_jdk_manager() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default();
        let manager = FakeManager {
            home: Some(dir.path().to_path_buf()),
            calls: RefCell::new(Vec::new()),
        };
        let resolver = Resolver::new(config(dir.path()), &transport)
            .with_platform(linux())
            .with_jdk_manager(Some(Box::new(manager)));

        let err = resolver
            .resolve(&[ToolchainRequirement::new("jdk")
                .with_param("version", "17")
                .with_param("vendor", "zulu")])
            .unwrap_err();
        assert!(matches!(err, ResolveError::Unresolved(_)));
        // Straight to the catalog, which has nothing.
        assert_eq!(transport.requests.borrow().len(), 1);
        assert!(!dir.path().join("toolchains.xml").exists());
    }

    #[test]
    fn failing_jdk_manager_falls_through_to_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default();
        let resolver = Resolver::new(config(dir.path()), &transport)
            .with_platform(linux())
            .with_jdk_manager(Some(Box::new(FakeManager {
                home: None,
                calls: RefCell::new(Vec::new()),
            })));

        let err = resolver
            .resolve(&[ToolchainRequirement::new("jdk").with_param("version", "17")])
            .unwrap_err();
        assert!(matches!(err, ResolveError::Unresolved(_)));
        let search = crate::catalog::PackageQuery::new("17", DEFAULT_VENDOR, linux())
            .search_url("https://catalog.test/packages")
            .unwrap();
        assert_eq!(transport.count(&search), 1);
    }

    #[test]
    fn build_context_serializes_by_type() {
        let mut context = BuildContext::default();
        context.store(ResolvedToolchain::from_candidate(
            candidate("jdk", &[("version", "17"), ("vendor", "zulu")], "/opt/jdk-17"),
            ToolchainOrigin::Catalog,
        ));
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["jdk"]["origin"], "catalog");
        assert_eq!(json["jdk"]["jdk_home"], "/opt/jdk-17");
        assert_eq!(json["jdk"]["type"], "jdk");
        assert_eq!(json["jdk"]["provides"]["vendor"], "zulu");
    }
}
