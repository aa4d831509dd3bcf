use std::collections::HashMap;
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::detect;

/// Knobs controlling which executable the orchestrator invokes and where a
/// managed install is expected. Both default to sensible platform values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannerSettings {
    /// Explicit executable name or path. `None` resolves the platform
    /// default and leaves lookup to `PATH`.
    pub command: Option<String>,
    /// Directory a managing host downloads the scanner into.
    pub install_dir: Option<PathBuf>,
}

impl ScannerSettings {
    /// Environment variable naming the scanner executable.
    pub const COMMAND_ENV: &'static str = "VULN_BRIDGE_COMMAND";
    /// Environment variable naming the managed install directory.
    pub const INSTALL_DIR_ENV: &'static str = "VULN_BRIDGE_INSTALL_DIR";

    /// Read settings from the process environment. Unset and blank variables
    /// leave the defaults in place.
    pub fn from_env() -> Self {
        Self::from_map(std::env::vars().collect())
    }

    fn from_map(vars: HashMap<String, String>) -> Self {
        let command = vars
            .get(Self::COMMAND_ENV)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let install_dir = vars
            .get(Self::INSTALL_DIR_ENV)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self {
            command,
            install_dir,
        }
    }

    /// Fold a higher-precedence layer over this one. Fields the layer leaves
    /// unset keep their current value.
    pub fn overridden_by(self, layer: Self) -> Self {
        Self {
            command: layer.command.or(self.command),
            install_dir: layer.install_dir.or(self.install_dir),
        }
    }

    /// Executable invoked for every scanner call, detection and scans alike.
    pub fn resolved_command(&self) -> String {
        self.command
            .clone()
            .unwrap_or_else(|| detect::default_binary_name().to_owned())
    }

    /// File a managing host would have placed the scanner at.
    pub fn managed_binary_path(&self) -> PathBuf {
        self.managed_install_dir()
            .join(detect::default_binary_name())
    }

    fn managed_install_dir(&self) -> PathBuf {
        if let Some(dir) = &self.install_dir {
            return dir.clone();
        }
        if let Some(dirs) = ProjectDirs::from("", "", "vuln-bridge") {
            return dirs.data_dir().to_path_buf();
        }
        // No resolvable home directory. Fall back to a relative dotdir.
        PathBuf::from(".vuln-bridge")
    }
}
