//! Host environment probes
//!
//! Reads the machine name, user name, OS caption and toolchain description
//! from the host. Probes never fail; they report `None` or a placeholder and
//! leave classification to the pure functions in this module, which is where
//! the qualifier rules live.

use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::fs;
use std::process::{Command, Stdio};

/// `rustc --version` of the compiler that built this crate
pub const RUSTC_DESCRIPTION: &str = env!("APPROVAL_NAMING_RUSTC_DESCRIPTION");

/// Value reported when a name cannot be read from the host
pub const UNKNOWN: &str = "unknown";

/// Windows captions that collapse to `Windows <short>`
pub const KNOWN_WINDOWS_RELEASES: [&str; 8] = [
    "XP",
    "2000",
    "Vista",
    "7",
    "8",
    "Server 2003",
    "Server 2008",
    "Server 2012",
];

static TOOLCHAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rustc (\d+)\.(\d+)\.(\d+)(?:-([A-Za-z]+)[0-9A-Za-z.]*)?(?:\s|$)")
        .expect("toolchain regex")
});

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^rustc (\d+\.\d+\.\d+(?:-[0-9A-Za-z.]+)?)").expect("version regex"));

/// Release channel of a toolchain description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toolchain {
    /// Stable release
    Stable {
        /// Major version
        major: u32,
        /// Minor version
        minor: u32,
    },
    /// Nightly build
    Nightly {
        /// Major version
        major: u32,
        /// Minor version
        minor: u32,
    },
    /// Beta, dev or unparseable description
    Unclassified,
}

/// Classify a `rustc --version` line
#[must_use]
pub fn classify_toolchain(description: &str) -> Toolchain {
    let Some(caps) = TOOLCHAIN_RE.captures(description.trim()) else {
        return Toolchain::Unclassified;
    };
    let (Ok(major), Ok(minor)) = (caps[1].parse(), caps[2].parse()) else {
        return Toolchain::Unclassified;
    };
    match caps.get(4).map(|m| m.as_str()) {
        None => Toolchain::Stable { major, minor },
        Some("nightly") => Toolchain::Nightly { major, minor },
        Some(_) => Toolchain::Unclassified,
    }
}

/// Full version token of a `rustc --version` line, e.g. `1.80.1`
#[must_use]
pub fn toolchain_version(description: &str) -> Option<&str> {
    VERSION_RE
        .captures(description.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Collapse well-known Windows captions to `Windows <short>`
///
/// `"Microsoft Windows 7 Professional"` becomes `"Windows 7"`; anything else
/// is returned unchanged.
#[must_use]
pub fn transform_easy_os_name(caption: &str) -> String {
    KNOWN_WINDOWS_RELEASES
        .iter()
        .find(|short| caption.starts_with(&format!("Microsoft Windows {short}")))
        .map_or_else(|| caption.to_string(), |short| format!("Windows {short}"))
}

/// Extract a caption from `/etc/os-release` content
///
/// Prefers `PRETTY_NAME`, then `NAME VERSION_ID`, then `NAME`.
#[must_use]
pub fn parse_os_release(content: &str) -> Option<String> {
    let field = |key: &str| {
        content.lines().find_map(|line| {
            let (k, v) = line.split_once('=')?;
            if k.trim() != key {
                return None;
            }
            let v = v.trim().trim_matches('"').trim_matches('\'').trim();
            (!v.is_empty()).then(|| v.to_string())
        })
    };
    if let Some(pretty) = field("PRETTY_NAME") {
        return Some(pretty);
    }
    let name = field("NAME")?;
    Some(match field("VERSION_ID") {
        Some(version) => format!("{name} {version}"),
        None => name,
    })
}

/// Extract the `ProductName` value from `reg query` output
#[must_use]
pub fn parse_reg_product_name(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let line = line.trim();
        if !line.starts_with("ProductName") {
            return None;
        }
        let (_, value) = line.split_once("REG_SZ")?;
        let value = value.trim();
        if value.is_empty() {
            None
        } else if value.starts_with("Microsoft ") {
            Some(value.to_string())
        } else {
            Some(format!("Microsoft {value}"))
        }
    })
}

/// Host name of this machine
#[must_use]
pub fn hostname() -> String {
    let candidates = [
        non_empty_env("COMPUTERNAME"),
        read_trimmed("/proc/sys/kernel/hostname"),
        read_trimmed("/etc/hostname"),
        non_empty_env("HOSTNAME"),
    ];
    candidates
        .into_iter()
        .flatten()
        .next()
        .or_else(|| command_output("hostname", &[]))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Login name of the current user
#[must_use]
pub fn user_name() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .into_iter()
        .find_map(non_empty_env)
        .or_else(|| command_output("whoami", &[]))
        .map(|name| match name.rsplit_once('\\') {
            // `whoami` on Windows prints DOMAIN\user
            Some((_, user)) => user.to_string(),
            None => name,
        })
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Human-readable OS caption, if the host exposes one
#[must_use]
pub fn os_caption() -> Option<String> {
    let caption = read_os_caption();
    tracing::trace!(?caption, os = env::consts::OS, "read OS caption");
    caption
}

#[cfg(target_os = "linux")]
fn read_os_caption() -> Option<String> {
    ["/etc/os-release", "/usr/lib/os-release"]
        .into_iter()
        .find_map(|path| fs::read_to_string(path).ok())
        .and_then(|content| parse_os_release(&content))
}

#[cfg(target_os = "macos")]
fn read_os_caption() -> Option<String> {
    let name = command_output("sw_vers", &["-productName"])?;
    Some(match command_output("sw_vers", &["-productVersion"]) {
        Some(version) => format!("{name} {version}"),
        None => name,
    })
}

#[cfg(windows)]
fn read_os_caption() -> Option<String> {
    let output = command_output(
        "reg",
        &[
            "query",
            r"HKLM\SOFTWARE\Microsoft\Windows NT\CurrentVersion",
            "/v",
            "ProductName",
        ],
    )?;
    parse_reg_product_name(&output)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
fn read_os_caption() -> Option<String> {
    None
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_trimmed(path: &str) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_stable() {
        assert_eq!(
            classify_toolchain("rustc 1.80.1 (3f5fd8dd4 2024-08-06)"),
            Toolchain::Stable { major: 1, minor: 80 }
        );
    }

    #[test]
    fn classify_nightly() {
        assert_eq!(
            classify_toolchain("rustc 1.83.0-nightly (1bc403daa 2024-09-17)"),
            Toolchain::Nightly { major: 1, minor: 83 }
        );
    }

    #[test]
    fn classify_beta_and_garbage() {
        assert_eq!(
            classify_toolchain("rustc 1.82.0-beta.3 (4976ae480 2024-09-09)"),
            Toolchain::Unclassified
        );
        assert_eq!(classify_toolchain("unknown"), Toolchain::Unclassified);
        assert_eq!(classify_toolchain("rustc 1.80"), Toolchain::Unclassified);
    }

    #[test]
    fn version_token() {
        assert_eq!(
            toolchain_version("rustc 1.80.1 (3f5fd8dd4 2024-08-06)"),
            Some("1.80.1")
        );
        assert_eq!(
            toolchain_version("rustc 1.82.0-beta.3 (4976ae480 2024-09-09)"),
            Some("1.82.0-beta.3")
        );
        assert_eq!(toolchain_version("unknown"), None);
    }

    #[test]
    fn build_script_recorded_description() {
        assert!(!RUSTC_DESCRIPTION.is_empty());
    }

    #[test]
    fn windows_captions_collapse() {
        assert_eq!(
            transform_easy_os_name("Microsoft Windows 7 Professional"),
            "Windows 7"
        );
        assert_eq!(
            transform_easy_os_name("Microsoft Windows Server 2008 R2 Enterprise"),
            "Windows Server 2008"
        );
        assert_eq!(transform_easy_os_name("Microsoft Windows XP"), "Windows XP");
    }

    #[test]
    fn other_captions_unchanged() {
        assert_eq!(
            transform_easy_os_name("Microsoft Windows 10 Pro"),
            "Microsoft Windows 10 Pro"
        );
        assert_eq!(transform_easy_os_name("Ubuntu 22.04.4 LTS"), "Ubuntu 22.04.4 LTS");
    }

    #[test]
    fn os_release_pretty_name() {
        let content = "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nPRETTY_NAME=\"Ubuntu 22.04.4 LTS\"\n";
        assert_eq!(parse_os_release(content).as_deref(), Some("Ubuntu 22.04.4 LTS"));
    }

    #[test]
    fn os_release_name_and_version() {
        let content = "NAME=Alpine\nVERSION_ID=3.19.1\n";
        assert_eq!(parse_os_release(content).as_deref(), Some("Alpine 3.19.1"));
        assert_eq!(parse_os_release("ID=x\n"), None);
    }

    #[test]
    fn reg_query_product_name() {
        let output = concat!(
            "\r\nHKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\r\n",
            "    ProductName    REG_SZ    Windows 10 Pro\r\n\r\n",
        );
        assert_eq!(
            parse_reg_product_name(output).as_deref(),
            Some("Microsoft Windows 10 Pro")
        );
        assert_eq!(parse_reg_product_name("nothing here"), None);
    }

    #[test]
    fn probes_never_empty() {
        assert!(!hostname().is_empty());
        assert!(!user_name().is_empty());
    }
}
