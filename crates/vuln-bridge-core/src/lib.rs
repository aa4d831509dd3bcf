pub mod detect;
pub mod process;
pub mod report;
pub mod result;
pub mod scanner;
pub mod settings;

pub use process::{
    CommandLine, CommandRunner, ExecutionContext, ExecutionOutcome, ProcessError,
    SystemCommandRunner,
};
pub use report::{render_report, OutputFormat};
pub use result::{DecodeError, Issue, ScanResult, Severity};
pub use scanner::{CliScanner, ScanError};
pub use settings::ScannerSettings;
