use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::detect;
use crate::process::{CommandLine, CommandRunner, ExecutionContext, ProcessError, SystemCommandRunner};
use crate::result::{DecodeError, ScanResult};
use crate::settings::ScannerSettings;

/// Failure of a [`CliScanner::scan`] call.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Caller precondition: the project root must name a directory.
    #[error("project root must not be empty")]
    EmptyProjectRoot,
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Detects and drives the external scanner CLI; the one entry point other
/// components should depend on.
///
/// The process layer is injected at construction, so tests and embedders can
/// substitute the subprocess machinery; production code uses
/// [`SystemCommandRunner`].
pub struct CliScanner<R: CommandRunner> {
    runner: Arc<R>,
    settings: ScannerSettings,
}

impl CliScanner<SystemCommandRunner> {
    /// Scanner over the real process layer with default settings.
    pub fn new() -> Self {
        Self::with_settings(ScannerSettings::default())
    }

    pub fn with_settings(settings: ScannerSettings) -> Self {
        Self::with_runner(Arc::new(SystemCommandRunner), settings)
    }
}

impl Default for CliScanner<SystemCommandRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> CliScanner<R> {
    pub fn with_runner(runner: Arc<R>, settings: ScannerSettings) -> Self {
        Self { runner, settings }
    }

    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    /// Whether the scanner CLI is usable on this host.
    ///
    /// Two checks run in order, stopping at the first hit: a `--version`
    /// probe of the configured command, then existence of the managed
    /// install file. Never fails; probe errors are logged and count as
    /// "not installed".
    pub fn is_installed(&self) -> bool {
        info!("checking whether the scanner CLI is installed");
        self.user_install_present() || self.managed_install_present()
    }

    fn user_install_present(&self) -> bool {
        let command = CommandLine::new(self.settings.resolved_command(), ["--version"]);
        debug!(command = %command, "probing user-installed scanner");
        match self.runner.run(&command, &ExecutionContext::default()) {
            Ok(output) => detect::looks_like_version(&output),
            Err(error) => {
                warn!(%error, "scanner version probe failed");
                false
            }
        }
    }

    fn managed_install_present(&self) -> bool {
        let path = self.settings.managed_binary_path();
        debug!(path = %path.display(), "checking managed install location");
        path.exists()
    }

    /// Run one scan of `project_root` and decode the scanner's JSON output.
    ///
    /// Blocks the calling thread until the scanner process exits, typically
    /// seconds but sometimes much longer on large dependency trees. There is
    /// no built-in timeout; callers needing bounded latency must wrap the
    /// call with their own deadline, and latency-sensitive threads should
    /// hand the call to a worker.
    #[instrument(name = "cli_scan", skip(self), fields(project_root = %project_root.display()))]
    pub fn scan(&self, project_root: &Path) -> Result<ScanResult, ScanError> {
        if project_root.as_os_str().is_empty() {
            return Err(ScanError::EmptyProjectRoot);
        }
        let command = CommandLine::new(self.settings.resolved_command(), ["--json", "test"]);
        let context = ExecutionContext::in_dir(project_root);
        let raw = self.runner.run(&command, &context)?;
        let result = ScanResult::from_json(&raw)?;
        debug!(ok = result.ok, issues = result.issues.len(), "scan output decoded");
        Ok(result)
    }
}
