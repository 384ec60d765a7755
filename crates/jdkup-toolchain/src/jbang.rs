use std::{
    path::PathBuf,
    process::{Command, Stdio},
};

use tracing::{debug, info};

use crate::error::{Result, ToolchainError};

/// A third-party tool able to install JDKs on its own.
pub trait JdkManager {
    fn name(&self) -> &str;

    /// Whether the tool is installed on this machine.
    fn is_available(&self) -> bool;

    /// Installs the JDK for `version` if needed and returns its home.
    fn resolve(&self, version: &str) -> Result<PathBuf>;
}

/// Any `1.x` version is Java 8; otherwise the major is everything before the
/// first dot.
pub fn major_version(version: &str) -> String {
    let version = version.trim();
    match version.split_once('.') {
        Some(("1", _)) => "8".to_string(),
        Some((major, _)) => major.to_string(),
        None => version.to_string(),
    }
}

#[derive(Clone, Debug)]
pub struct JbangManager {
    home: PathBuf,
}

impl JbangManager {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn executable(&self) -> PathBuf {
        let name = if cfg!(windows) { "jbang.cmd" } else { "jbang" };
        self.home.join("bin").join(name)
    }

    pub fn cached_jdk(&self, major: &str) -> PathBuf {
        self.home.join("cache").join("jdks").join(major)
    }

    fn install(&self, major: &str) -> Result<()> {
        let program = self.executable();
        let program_name = program.display().to_string();
        info!("Installing JDK {} with {}", major, program_name);

        let output = Command::new(&program)
            .args(["jdk", "install", major])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ToolchainError::subprocess(&program_name, format!("failed to run: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(ToolchainError::subprocess(
                &program_name,
                format!("{}\n{}\n{}", output.status, stdout.trim(), stderr.trim()),
            ));
        }
        Ok(())
    }
}

impl JdkManager for JbangManager {
    fn name(&self) -> &str {
        "jbang"
    }

    fn is_available(&self) -> bool {
        self.home.is_dir()
    }

    fn resolve(&self, version: &str) -> Result<PathBuf> {
        let major = major_version(version);
        let cached = self.cached_jdk(&major);
        if cached.is_dir() {
            debug!("jbang already has JDK {} at {}", major, cached.display());
            return Ok(cached);
        }

        self.install(&major)?;
        if !cached.is_dir() {
            return Err(ToolchainError::subprocess(
                self.executable().display().to_string(),
                format!("JDK {major} not found at {} after install", cached.display()),
            ));
        }
        Ok(cached)
    }
}
