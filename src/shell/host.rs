//! Host platform detection
//!
//! Produces the OS label and human-readable details that are embedded in the
//! system prompt, so the model suggests commands for the right shell.

use std::fmt;

/// Operating system family of the running host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl OsFamily {
    /// Family of the host this binary was compiled for
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` style identifier to a family
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => OsFamily::Linux,
            "macos" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            _ => OsFamily::Other,
        }
    }

    /// Short label used in prompts and logs
    pub fn label(&self) -> &'static str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
            OsFamily::Windows => "windows",
            OsFamily::Other => "other",
        }
    }

    /// Package managers the model should suggest for missing tools
    pub fn package_manager_hint(&self) -> &'static str {
        match self {
            OsFamily::Linux => "`apt install` or `dnf install`",
            OsFamily::MacOs => "`brew install`",
            OsFamily::Windows => "`winget install` or `choco install`",
            OsFamily::Other => "the platform's package manager",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Detected host information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub family: OsFamily,
    /// System name as users know it ("Linux", "Darwin", "Windows")
    pub name: String,
    /// Distribution / version details, e.g. "Ubuntu 22.04 (Kernel: 5.15.0)"
    pub details: String,
    /// CPU architecture, e.g. "x86_64"
    pub arch: String,
}

impl HostInfo {
    /// Probe the running host. Never fails; missing files degrade the details.
    pub fn detect() -> Self {
        let family = OsFamily::current();
        let arch = std::env::consts::ARCH.to_string();

        let (name, details) = match family {
            OsFamily::Linux => {
                let os_release = std::fs::read_to_string("/etc/os-release").ok();
                let kernel = std::fs::read_to_string("/proc/sys/kernel/osrelease")
                    .ok()
                    .map(|k| k.trim().to_string());
                (
                    "Linux".to_string(),
                    linux_details(os_release.as_deref(), kernel.as_deref()),
                )
            }
            OsFamily::MacOs => ("Darwin".to_string(), "macOS".to_string()),
            OsFamily::Windows => ("Windows".to_string(), "Windows".to_string()),
            OsFamily::Other => {
                let raw = std::env::consts::OS.to_string();
                (raw.clone(), raw)
            }
        };

        Self {
            family,
            name,
            details,
            arch,
        }
    }
}

/// Build the Linux details line from `/etc/os-release` content and the kernel release
fn linux_details(os_release: Option<&str>, kernel: Option<&str>) -> String {
    let distro = os_release.and_then(|content| {
        let field = |key: &str| {
            content.lines().find_map(|line| {
                let (k, v) = line.split_once('=')?;
                (k.trim() == key).then(|| v.trim().trim_matches('"').to_string())
            })
        };
        let name = field("NAME")?;
        Some(match field("VERSION_ID") {
            Some(version) if !version.is_empty() => format!("{} {}", name, version),
            _ => name,
        })
    });

    match (distro, kernel) {
        (Some(d), Some(k)) => format!("{} (Kernel: {})", d, k),
        (Some(d), None) => d,
        (None, Some(k)) => format!("Linux (Kernel: {})", k),
        (None, None) => "Linux".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UBUNTU: &str = r#"PRETTY_NAME="Ubuntu 22.04.3 LTS"
NAME="Ubuntu"
VERSION_ID="22.04"
ID=ubuntu
"#;

    #[test]
    fn test_family_labels() {
        assert_eq!(OsFamily::from_os("linux").label(), "linux");
        assert_eq!(OsFamily::from_os("macos").label(), "macos");
        assert_eq!(OsFamily::from_os("windows").label(), "windows");
        assert_eq!(OsFamily::from_os("freebsd"), OsFamily::Other);
        assert_eq!(OsFamily::Other.to_string(), "other");
    }

    #[test]
    fn test_linux_details_full() {
        let details = linux_details(Some(UBUNTU), Some("5.15.0-91-generic"));
        assert_eq!(details, "Ubuntu 22.04 (Kernel: 5.15.0-91-generic)");
    }

    #[test]
    fn test_linux_details_fallbacks() {
        assert_eq!(linux_details(None, Some("6.1.0")), "Linux (Kernel: 6.1.0)");
        assert_eq!(linux_details(None, None), "Linux");
        // PRETTY_NAME must not be mistaken for NAME
        assert_eq!(linux_details(Some("PRETTY_NAME=\"Arch\"\nNAME=\"Arch Linux\"\n"), None), "Arch Linux");
    }

    #[test]
    fn test_detect_matches_compile_target() {
        let host = HostInfo::detect();
        assert_eq!(host.family, OsFamily::current());
        assert!(!host.details.is_empty());
        assert!(!host.arch.is_empty());
    }
}
