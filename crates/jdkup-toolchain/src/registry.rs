use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, ToolchainError};
use crate::matcher::matches_all;
use crate::xml::Element;

pub const JDK_TYPE: &str = "jdk";
pub const JDK_HOME_KEY: &str = "jdkHome";

const ROOT_ELEMENT: &str = "toolchains";

/// Anything that can list the toolchains already known for a type.
pub trait ToolchainSource {
    fn toolchains_for_type(&self, toolchain_type: &str) -> Result<Vec<ToolchainCandidate>>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolchainCandidate {
    #[serde(rename = "type")]
    pub toolchain_type: String,
    pub provides: BTreeMap<String, String>,
    pub configuration: BTreeMap<String, String>,
}

impl ToolchainCandidate {
    pub fn matches_requirements(&self, requirements: &BTreeMap<String, String>) -> bool {
        matches_all(requirements, &self.provides)
    }

    pub fn jdk_home(&self) -> Option<&str> {
        self.configuration.get(JDK_HOME_KEY).map(String::as_str)
    }

    fn from_element(element: &Element) -> Option<Self> {
        let toolchain_type = element.child_text("type")?.to_string();
        Some(Self {
            toolchain_type,
            provides: text_children(element.child("provides")),
            configuration: text_children(element.child("configuration")),
        })
    }
}

fn text_children(element: Option<&Element>) -> BTreeMap<String, String> {
    element
        .map(|element| {
            element
                .children
                .iter()
                .map(|child| (child.name.clone(), child.text().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// The Maven `toolchains.xml` file, read as a toolchain source and extended
/// with newly provisioned JDKs.
#[derive(Clone, Debug)]
pub struct ToolchainRegistry {
    path: PathBuf,
}

impl ToolchainRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "toolchains.xml".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Parsed document, or `None` when the file does not exist yet.
    fn read_document(&self) -> Result<Option<Element>, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.to_string()),
        };
        let root = Element::parse(&raw).map_err(|e| e.to_string())?;
        if root.name != ROOT_ELEMENT {
            return Err(format!(
                "expected <{ROOT_ELEMENT}> root element, found <{}>",
                root.name
            ));
        }
        Ok(Some(root))
    }

    /// Existing document, or an empty `<toolchains>` root when absent.
    pub fn load_document(&self) -> Result<Element> {
        match self.read_document() {
            Ok(Some(root)) => Ok(root),
            Ok(None) => Ok(Element::new(ROOT_ELEMENT)),
            Err(message) => Err(ToolchainError::registry_read(&self.path, message)),
        }
    }

    /// Every entry of the document in file order, without validation.
    pub fn all_toolchains(&self) -> Result<Vec<ToolchainCandidate>> {
        let root = match self.read_document() {
            Ok(Some(root)) => root,
            Ok(None) => return Ok(Vec::new()),
            Err(message) => {
                return Err(ToolchainError::Misconfigured(format!(
                    "cannot read {}: {message}",
                    self.path.display()
                )))
            }
        };
        let mut candidates = Vec::new();
        for element in root.children_named("toolchain") {
            match ToolchainCandidate::from_element(element) {
                Some(candidate) => candidates.push(candidate),
                None => warn!(
                    "Skipping toolchain without a type in {}",
                    self.path.display()
                ),
            }
        }
        Ok(candidates)
    }

    /// Appends a JDK entry under an exclusive lock and rewrites the file
    /// atomically. Existing entries are kept as they are.
    pub fn append_jdk_toolchain(&self, jdk_home: &Path, version: &str, vendor: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ToolchainError::registry_write(&self.path, e))?;
        }
        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                ToolchainError::registry_write(
                    &self.path,
                    format!("failed to open lock {}: {e}", lock_path.display()),
                )
            })?;
        lock.lock_exclusive().map_err(|e| {
            ToolchainError::registry_write(
                &self.path,
                format!("failed to lock {}: {e}", lock_path.display()),
            )
        })?;

        let result = self.append_locked(jdk_home, version, vendor);
        let _ = FileExt::unlock(&lock);
        result
    }

    fn append_locked(&self, jdk_home: &Path, version: &str, vendor: &str) -> Result<()> {
        let mut root = match self.read_document() {
            Ok(Some(root)) => root,
            Ok(None) => Element::new(ROOT_ELEMENT),
            Err(message) => return Err(ToolchainError::registry_write(&self.path, message)),
        };

        let mut provides = Element::new("provides");
        provides
            .push_child(Element::with_text("version", version))
            .push_child(Element::with_text("vendor", vendor));
        let mut configuration = Element::new("configuration");
        configuration.push_child(Element::with_text(
            JDK_HOME_KEY,
            jdk_home.to_string_lossy(),
        ));
        let mut toolchain = Element::new("toolchain");
        toolchain
            .push_child(Element::with_text("type", JDK_TYPE))
            .push_child(provides)
            .push_child(configuration);
        root.push_child(toolchain);

        jdkup_util::write_atomic(&self.path, root.to_xml_string().as_bytes())
            .map_err(|e| ToolchainError::registry_write(&self.path, e))?;
        info!(
            "Registered {} {} at {} in {}",
            vendor,
            version,
            jdk_home.display(),
            self.path.display()
        );
        Ok(())
    }
}

impl ToolchainSource for ToolchainRegistry {
    fn toolchains_for_type(&self, toolchain_type: &str) -> Result<Vec<ToolchainCandidate>> {
        let candidates: Vec<_> = self
            .all_toolchains()?
            .into_iter()
            .filter(|candidate| candidate.toolchain_type == toolchain_type)
            .collect();
        for candidate in &candidates {
            if candidate.toolchain_type == JDK_TYPE {
                validate_jdk(candidate)?;
            }
        }
        debug!(
            "Found {} {} toolchain(s) in {}",
            candidates.len(),
            toolchain_type,
            self.path.display()
        );
        Ok(candidates)
    }
}

fn validate_jdk(candidate: &ToolchainCandidate) -> Result<()> {
    let home = candidate
        .jdk_home()
        .filter(|home| !home.is_empty())
        .ok_or_else(|| {
            ToolchainError::Misconfigured(
                "Java toolchain without the jdkHome configuration element.".to_string(),
            )
        })?;
    let path = jdkup_util::expand_user(home);
    if !path.is_dir() {
        return Err(ToolchainError::Misconfigured(format!(
            "Non-existing JDK home configuration at {}",
            path.display()
        )));
    }
    Ok(())
}
