use once_cell::sync::Lazy;
use regex::Regex;

/// Base name of the scanner executable.
pub const SCANNER_NAME: &str = "vulnscan";

const WINDOWS_BINARY: &str = "vulnscan.cmd";

/// Leading `MAJOR.MINOR.PATCH` shape printed by `vulnscan --version`.
static VERSION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+").expect("version prefix pattern is valid"));

/// Whether `--version` output identifies an installed scanner.
///
/// The output is trimmed and must start with `digits.digits.digits`; anything
/// after that (build metadata, channel tags) is ignored.
pub fn looks_like_version(output: &str) -> bool {
    VERSION_PREFIX.is_match(output.trim())
}

/// Executable name used on the given OS, as named by [`std::env::consts::OS`].
///
/// Windows installs ship a `.cmd` shim; every other platform uses the bare
/// name.
pub fn binary_name_for_os(os: &str) -> &'static str {
    if os == "windows" {
        WINDOWS_BINARY
    } else {
        SCANNER_NAME
    }
}

/// Executable name for the platform this crate was built for.
pub fn default_binary_name() -> &'static str {
    binary_name_for_os(std::env::consts::OS)
}
