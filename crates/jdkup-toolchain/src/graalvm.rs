use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use tracing::{info, warn};

use crate::error::{Result, ToolchainError};

pub fn is_graalvm(vendor: &str) -> bool {
    vendor.to_ascii_lowercase().contains("graalvm")
}

pub fn updater_path(jdk_home: &Path) -> PathBuf {
    let name = if cfg!(windows) { "gu.cmd" } else { "gu" };
    jdk_home.join("bin").join(name)
}

/// Starts `gu install native-image` in the background.
///
/// The child is reaped by a detached thread that only logs its exit status;
/// callers may join the returned handle but never have to.
pub fn spawn_native_image_install(jdk_home: &Path) -> Result<thread::JoinHandle<()>> {
    let program = updater_path(jdk_home);
    let program_name = program.display().to_string();
    info!("Installing native-image with {}", program_name);

    let mut child = Command::new(&program)
        .args(["install", "native-image", "--ignore"])
        .env("GRAALVM_HOME", jdk_home)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ToolchainError::subprocess(&program_name, format!("failed to start: {e}")))?;

    let handle = thread::Builder::new()
        .name("graalvm-native-image".into())
        .spawn(move || match child.wait() {
            Ok(status) if status.success() => info!("native-image installed"),
            Ok(status) => warn!("{} exited with {}", program_name, status),
            Err(err) => warn!("failed to wait for {}: {}", program_name, err),
        })?;
    Ok(handle)
}
