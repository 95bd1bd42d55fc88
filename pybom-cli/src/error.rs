//! CLI-specific error types and exit code mapping

use pybom_core::error::{ConfigError, PybomError, SbomError};
use pybom_sbom::SbomGeneratorError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The project's own manifest could not be read.
    #[error("root manifest error: {0}")]
    RootManifest(String),

    /// SBOM generation failed for any other reason.
    #[error("generation error: {0}")]
    Generate(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file write, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success                        |
    /// | 1    | General / command error        |
    /// | 2    | Configuration error            |
    /// | 3    | Root manifest unreadable       |
    /// | 10   | IO error                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::RootManifest(_) => 3,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Generate(_) => 1,
        }
    }
}

impl From<PybomError> for CliError {
    fn from(e: PybomError) -> Self {
        match e {
            PybomError::Config(inner) => Self::Config(inner.to_string()),
            PybomError::Sbom(SbomError::ManifestUnreadable(msg)) => Self::RootManifest(msg),
            PybomError::Sbom(inner) => Self::Generate(inner.to_string()),
            PybomError::Io(inner) => Self::Io(inner),
        }
    }
}

impl From<SbomGeneratorError> for CliError {
    fn from(e: SbomGeneratorError) -> Self {
        match e {
            SbomGeneratorError::RootManifest { .. } => Self::RootManifest(e.to_string()),
            SbomGeneratorError::Config { field, reason } => {
                Self::Config(ConfigError::InvalidValue { field, reason }.to_string())
            }
            SbomGeneratorError::Io { ref source, .. } => {
                Self::Io(std::io::Error::new(source.kind(), e.to_string()))
            }
            other => Self::Generate(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("bad".to_owned());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_root_manifest() {
        let err = CliError::RootManifest("pyproject.toml: not found".to_owned());
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_io_error() {
        let err = CliError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "nope"));
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn test_exit_code_command_and_generate() {
        assert_eq!(CliError::Command("x".to_owned()).exit_code(), 1);
        assert_eq!(CliError::Generate("x".to_owned()).exit_code(), 1);
    }

    #[test]
    fn test_root_manifest_generator_error_maps_to_exit_3() {
        let err: CliError = SbomGeneratorError::RootManifest {
            path: "/p/pyproject.toml".to_owned(),
            reason: "not found".to_owned(),
        }
        .into();
        assert!(matches!(err, CliError::RootManifest(_)));
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("/p/pyproject.toml"));
    }

    #[test]
    fn test_generator_config_error_maps_to_config() {
        let err: CliError = SbomGeneratorError::Config {
            field: "freeze_command".to_owned(),
            reason: "must not be empty".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("freeze_command"));
    }

    #[test]
    fn test_generator_io_error_keeps_kind_and_path() {
        let err: CliError = SbomGeneratorError::Io {
            path: "/site".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        match &err {
            CliError::Io(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::PermissionDenied);
                assert!(inner.to_string().contains("/site"));
            }
            other => panic!("expected Io, got {other:?}"),
        }
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn test_freeze_failure_maps_to_generate() {
        let err: CliError = SbomGeneratorError::FreezeCommand {
            command: "pip freeze".to_owned(),
            reason: "exit status: 1".to_owned(),
        }
        .into();
        assert!(matches!(err, CliError::Generate(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_core_errors_map_by_category() {
        let config: CliError = PybomError::Config(ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        })
        .into();
        assert_eq!(config.exit_code(), 2);

        let manifest: CliError =
            PybomError::Sbom(SbomError::ManifestUnreadable("missing".to_owned())).into();
        assert_eq!(manifest.exit_code(), 3);
    }
}
