use std::{fs, io, path::Path};

use sha2::{Digest, Sha256};

/// Lower-case hex sha256 of the file at `path`.
pub(crate) fn sha256_file(path: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut fs::File::open(path)?, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Catalog checksums may arrive upper-cased or padded.
pub(crate) fn normalize_digest(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}
