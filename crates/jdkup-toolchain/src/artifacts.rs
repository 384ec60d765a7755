use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, ToolchainError};
use crate::hashing::{normalize_digest, sha256_file};
use crate::http::HttpTransport;

/// Makes sure `dest_dir/file_name` holds the archive behind `url`.
///
/// A cached file is checked against `expected_sha256` when one is known,
/// otherwise against `expected_size`; a file failing the check is replaced.
/// Without either it is reused as-is.
pub fn ensure_downloaded(
    transport: &dyn HttpTransport,
    url: &str,
    file_name: &str,
    dest_dir: &Path,
    expected_sha256: Option<&str>,
    expected_size: Option<u64>,
) -> Result<PathBuf> {
    validate_file_name(file_name)?;
    let expected = expected_sha256
        .map(normalize_digest)
        .filter(|digest| !digest.is_empty());
    let target = dest_dir.join(file_name);

    if target.is_file() {
        match (expected.as_deref(), expected_size) {
            (Some(expected), _) => {
                let actual = sha256_file(&target)?;
                if actual == expected {
                    info!("Using cached archive {}", target.display());
                    return Ok(target);
                }
                warn!(
                    "Cached archive {} has sha256 {}, expected {}; downloading again",
                    target.display(),
                    actual,
                    expected
                );
                fs::remove_file(&target)?;
            }
            (None, Some(size)) => {
                let actual = fs::metadata(&target)?.len();
                if actual == size {
                    info!("Using cached archive {}", target.display());
                    return Ok(target);
                }
                warn!(
                    "Cached archive {} has {} bytes, expected {}; downloading again",
                    target.display(),
                    actual,
                    size
                );
                fs::remove_file(&target)?;
            }
            (None, None) => {
                info!("Using cached archive {}", target.display());
                return Ok(target);
            }
        }
    }

    fs::create_dir_all(dest_dir).map_err(|e| {
        ToolchainError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to create {}: {e}", dest_dir.display()),
        ))
    })?;

    info!("Downloading {} to {}", url, target.display());
    let tmp = dest_dir.join(format!(".{file_name}.tmp-{}", Uuid::new_v4()));
    if let Err(err) = download_to(transport, url, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    if let Some(expected) = expected.as_deref() {
        let actual = sha256_file(&tmp)?;
        if actual != expected {
            let _ = fs::remove_file(&tmp);
            return Err(ToolchainError::ChecksumMismatch {
                path: target,
                expected: expected.to_string(),
                actual,
            });
        }
    } else if let Some(size) = expected_size {
        let actual = fs::metadata(&tmp)?.len();
        if actual != size {
            let _ = fs::remove_file(&tmp);
            return Err(ToolchainError::Transport(format!(
                "incomplete download of {url}: got {actual} bytes, expected {size}"
            )));
        }
    }

    fs::rename(&tmp, &target).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ToolchainError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to finalize download {}: {e}", target.display()),
        ))
    })?;
    info!("Saved archive {}", target.display());
    Ok(target)
}

fn download_to(transport: &dyn HttpTransport, url: &str, tmp: &Path) -> Result<()> {
    let file = fs::File::create(tmp)?;
    let mut writer = BufWriter::new(file);
    let bytes = transport.download(url, &mut writer)?;
    writer.flush()?;
    debug!("Fetched {} bytes from {}", bytes, url);
    Ok(())
}

fn validate_file_name(file_name: &str) -> Result<()> {
    let invalid = file_name.is_empty()
        || file_name == "."
        || file_name.contains("..")
        || file_name.contains('/')
        || file_name.contains('\\');
    if invalid {
        return Err(ToolchainError::archive(
            file_name,
            "refusing to store an archive under this name",
        ));
    }
    Ok(())
}
