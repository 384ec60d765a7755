use std::fmt;

use jdkup_util::env_value;

const HOST_OS_ENV: &str = "JDKUP_HOST_OS";
const HOST_ARCH_ENV: &str = "JDKUP_HOST_ARCH";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    Windows,
    MacOs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Architecture {
    X32,
    X64,
    Aarch64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveType {
    TarGz,
    Zip,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Platform {
    pub os: OsFamily,
    pub arch: Architecture,
}

impl OsFamily {
    /// Unrecognised names fall back to linux.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("mac") || name.contains("darwin") {
            OsFamily::MacOs
        } else if name.contains("windows") {
            OsFamily::Windows
        } else {
            OsFamily::Linux
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::Windows => "windows",
            OsFamily::MacOs => "macos",
        }
    }

    pub fn archive_type(self) -> ArchiveType {
        match self {
            OsFamily::Windows => ArchiveType::Zip,
            _ => ArchiveType::TarGz,
        }
    }

    pub fn libc_type(self) -> &'static str {
        match self {
            OsFamily::Linux => "glibc",
            OsFamily::Windows => "c_std_lib",
            OsFamily::MacOs => "libc",
        }
    }
}

impl Architecture {
    /// Anything that is neither 32-bit x86 nor arm64 is treated as x64.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("x86_32") || name.contains("amd32") {
            Architecture::X32
        } else if name.contains("aarch64") || name.contains("arm64") {
            Architecture::Aarch64
        } else {
            Architecture::X64
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::X32 => "x32",
            Architecture::X64 => "x64",
            Architecture::Aarch64 => "aarch64",
        }
    }

    pub fn bitness(self) -> &'static str {
        match self {
            Architecture::X32 => "32",
            _ => "64",
        }
    }
}

impl ArchiveType {
    pub fn from_file_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveType::TarGz
        } else {
            ArchiveType::Zip
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveType::TarGz => "tar.gz",
            ArchiveType::Zip => "zip",
        }
    }
}

impl Platform {
    pub fn new(os: OsFamily, arch: Architecture) -> Self {
        Self { os, arch }
    }

    /// Host platform, overridable through `JDKUP_HOST_OS` / `JDKUP_HOST_ARCH`.
    pub fn detect() -> Self {
        let os = match env_value(HOST_OS_ENV) {
            Some(value) => OsFamily::from_name(&value),
            None => OsFamily::from_name(std::env::consts::OS),
        };
        let arch = match env_value(HOST_ARCH_ENV) {
            Some(value) => Architecture::from_name(&value),
            None => host_architecture(),
        };
        Self { os, arch }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}

fn host_architecture() -> Architecture {
    match std::env::consts::ARCH {
        "x86" => Architecture::X32,
        other => Architecture::from_name(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_names_map_to_catalog_families() {
        assert_eq!(OsFamily::from_name("Mac OS X"), OsFamily::MacOs);
        assert_eq!(OsFamily::from_name("macos"), OsFamily::MacOs);
        assert_eq!(OsFamily::from_name("Windows 11"), OsFamily::Windows);
        assert_eq!(OsFamily::from_name("linux"), OsFamily::Linux);
        assert_eq!(OsFamily::from_name("freebsd"), OsFamily::Linux);
    }

    #[test]
    fn archive_and_libc_follow_os() {
        assert_eq!(OsFamily::Windows.archive_type(), ArchiveType::Zip);
        assert_eq!(OsFamily::Windows.libc_type(), "c_std_lib");
        assert_eq!(OsFamily::Linux.archive_type(), ArchiveType::TarGz);
        assert_eq!(OsFamily::Linux.libc_type(), "glibc");
        assert_eq!(OsFamily::MacOs.archive_type(), ArchiveType::TarGz);
        assert_eq!(OsFamily::MacOs.libc_type(), "libc");
    }

    #[test]
    fn architecture_names_and_bitness() {
        assert_eq!(Architecture::from_name("aarch64"), Architecture::Aarch64);
        assert_eq!(Architecture::from_name("ARM64"), Architecture::Aarch64);
        assert_eq!(Architecture::from_name("x86_32"), Architecture::X32);
        assert_eq!(Architecture::from_name("amd32"), Architecture::X32);
        assert_eq!(Architecture::from_name("amd64"), Architecture::X64);
        assert_eq!(Architecture::from_name("riscv64"), Architecture::X64);
        assert_eq!(Architecture::X32.bitness(), "32");
        assert_eq!(Architecture::X64.bitness(), "64");
        assert_eq!(Architecture::Aarch64.bitness(), "64");
    }

    #[test]
    fn archive_type_from_file_suffix() {
        assert_eq!(
            ArchiveType::from_file_name("OpenJDK17U-jdk_x64_linux.tar.gz"),
            ArchiveType::TarGz
        );
        assert_eq!(ArchiveType::from_file_name("jdk.TGZ"), ArchiveType::TarGz);
        assert_eq!(ArchiveType::from_file_name("jdk-17_windows.zip"), ArchiveType::Zip);
        assert_eq!(ArchiveType::from_file_name("jdk.tar"), ArchiveType::Zip);
    }

    #[test]
    fn platform_displays_as_os_and_arch() {
        let platform = Platform::new(OsFamily::MacOs, Architecture::Aarch64);
        assert_eq!(platform.to_string(), "macos-aarch64");
    }
}
