use std::{
    fs, io,
    path::{Path, PathBuf},
};

use jdkup_telemetry as telemetry;
use serde::Serialize;
use uuid::Uuid;

pub const MAVEN_DIR_ENV: &str = "JDKUP_MAVEN_DIR";
pub const JBANG_DIR_ENV: &str = "JBANG_DIR";

pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(std::env::temp_dir)
}

/// Root of the Maven user directory (`~/.m2`), which holds the toolchain
/// registry, the settings file and the downloaded JDKs.
pub fn maven_dir() -> PathBuf {
    env_value(MAVEN_DIR_ENV)
        .map(|value| expand_user(&value))
        .unwrap_or_else(|| home_dir().join(".m2"))
}

pub fn toolchains_file() -> PathBuf {
    maven_dir().join("toolchains.xml")
}

pub fn settings_file() -> PathBuf {
    maven_dir().join("settings.xml")
}

pub fn jdks_dir() -> PathBuf {
    maven_dir().join("jdks")
}

pub fn data_dir() -> PathBuf {
    maven_dir().join("jdkup")
}

pub fn jbang_home() -> PathBuf {
    env_value(JBANG_DIR_ENV)
        .map(|value| expand_user(&value))
        .unwrap_or_else(|| home_dir().join(".jbang"))
}

pub fn expand_user(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        let rest = path.strip_prefix("~/").unwrap_or("");
        return home_dir().join(rest);
    }
    PathBuf::from(path)
}

/// Returns the trimmed value of `key`, or `None` when unset or blank.
pub fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".into());
    let tmp = path.with_file_name(format!(".{file_name}.tmp-{}", Uuid::new_v4()));
    if let Err(err) = fs::write(&tmp, data) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let data = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
    write_atomic(path, &data)
}

pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => tracing_subscriber::EnvFilter::new(value),
        _ => tracing_subscriber::EnvFilter::new(default_level),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| err as Box<dyn std::error::Error>)
}

pub fn init_cli_telemetry(app_name: &'static str, app_version: &'static str, command: &str) {
    telemetry::init_with_env(app_name, app_version, data_dir());
    telemetry::event("cli.start", &[("command", command)]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_user_keeps_plain_paths() {
        assert_eq!(expand_user("/opt/jdk"), PathBuf::from("/opt/jdk"));
        assert_eq!(expand_user("relative/dir"), PathBuf::from("relative/dir"));
    }

    #[test]
    fn expand_user_resolves_home_prefix() {
        assert_eq!(expand_user("~/.m2"), home_dir().join(".m2"));
        assert_eq!(expand_user("~"), home_dir());
    }

    #[test]
    fn tracing_installs_once() {
        let _ = init_tracing(true);
        let err = init_tracing(false).unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("toolchains.xml");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");

        let leftovers = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn write_json_atomic_pretty_prints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.json");
        let value = serde_json::json!({ "jdk": { "version": "17" } });
        write_json_atomic(&path, &value).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n"));
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, value);
    }
}
