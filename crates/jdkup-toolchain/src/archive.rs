//! Inspection and extraction of downloaded JDK archives.
//!
//! `.tar.gz` / `.tgz` files are read with `tar` over a gzip stream; every
//! other name is treated as a zip file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{Result, ToolchainError};
use crate::platform::ArchiveType;

/// Name of the top-level directory the archive unpacks into.
///
/// Entries such as `./` or `..` are skipped; the first remaining entry name
/// is stripped of a leading `./` and cut at its first `/`.
pub fn root_entry_name(archive: &Path) -> Result<String> {
    let first = match ArchiveType::from_file_name(&file_name_of(archive)) {
        ArchiveType::TarGz => first_tar_entry(archive)?,
        ArchiveType::Zip => first_zip_entry(archive)?,
    };
    let name = first.ok_or_else(|| ToolchainError::archive(archive, "archive has no entries"))?;
    let name = name.strip_prefix("./").unwrap_or(&name);
    let root = name.split('/').next().unwrap_or(name);
    if root.is_empty() {
        return Err(ToolchainError::archive(archive, "archive has no root entry"));
    }
    debug!("Archive {} has root entry {}", archive.display(), root);
    Ok(root.to_string())
}

/// Unpacks `archive` into `dest_dir`, overwriting existing files, then
/// deletes the archive.
pub fn extract(archive: &Path, dest_dir: &Path) -> Result<()> {
    fs::create_dir_all(dest_dir)?;
    info!(
        "Extracting archive {} into {}",
        archive.display(),
        dest_dir.display()
    );
    match ArchiveType::from_file_name(&file_name_of(archive)) {
        ArchiveType::TarGz => extract_tar_gz(archive, dest_dir)?,
        ArchiveType::Zip => extract_zip(archive, dest_dir)?,
    }
    fs::remove_file(archive).map_err(|e| {
        ToolchainError::archive(archive, format!("failed to delete after extraction: {e}"))
    })?;
    Ok(())
}

/// macOS distributions wrap the JDK in an application bundle.
pub fn jdk_home_for(extracted_root: &Path) -> PathBuf {
    let bundle_home = extracted_root.join("Contents").join("Home");
    if bundle_home.is_dir() {
        bundle_home
    } else {
        extracted_root.to_path_buf()
    }
}

fn file_name_of(archive: &Path) -> String {
    archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_skipped_entry(name: &str) -> bool {
    name.starts_with('.') && name.chars().count() < 4
}

fn open_tar(archive: &Path) -> Result<Archive<GzDecoder<fs::File>>> {
    let file = fs::File::open(archive)
        .map_err(|e| ToolchainError::archive(archive, format!("failed to open: {e}")))?;
    Ok(Archive::new(GzDecoder::new(file)))
}

fn first_tar_entry(archive: &Path) -> Result<Option<String>> {
    let mut tar = open_tar(archive)?;
    let entries = tar
        .entries()
        .map_err(|e| ToolchainError::archive(archive, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ToolchainError::archive(archive, e))?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        if !is_skipped_entry(&name) {
            return Ok(Some(name));
        }
    }
    Ok(None)
}

fn open_zip(archive: &Path) -> Result<ZipArchive<fs::File>> {
    let file = fs::File::open(archive)
        .map_err(|e| ToolchainError::archive(archive, format!("failed to open: {e}")))?;
    ZipArchive::new(file).map_err(|e| ToolchainError::archive(archive, e))
}

fn first_zip_entry(archive: &Path) -> Result<Option<String>> {
    let mut zip = open_zip(archive)?;
    for index in 0..zip.len() {
        let entry = zip
            .by_index(index)
            .map_err(|e| ToolchainError::archive(archive, e))?;
        let name = entry.name().to_string();
        if !is_skipped_entry(&name) {
            return Ok(Some(name));
        }
    }
    Ok(None)
}

fn extract_tar_gz(archive: &Path, dest_dir: &Path) -> Result<()> {
    let mut tar = open_tar(archive)?;
    tar.set_overwrite(true);
    tar.set_preserve_permissions(true);
    tar.unpack(dest_dir)
        .map_err(|e| ToolchainError::archive(archive, format!("extraction failed: {e}")))
}

fn extract_zip(archive: &Path, dest_dir: &Path) -> Result<()> {
    let mut zip = open_zip(archive)?;
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| ToolchainError::archive(archive, e))?;
        let relative = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
            ToolchainError::archive(
                archive,
                format!("entry {} escapes the destination", entry.name()),
            )
        })?;
        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&out_path)?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| ToolchainError::archive(archive, format!("{}: {e}", out_path.display())))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}
