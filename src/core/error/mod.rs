use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,
    ValidationInvalidPattern,

    NetworkRequestFailed,
    NetworkBadStatus,

    CommandFailed,

    LintFailed,
    FeedMissingData,

    MinifyFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidPattern => "validation.invalid_pattern",

            ErrorCode::NetworkRequestFailed => "network.request_failed",
            ErrorCode::NetworkBadStatus => "network.bad_status",

            ErrorCode::CommandFailed => "command.failed",

            ErrorCode::LintFailed => "release.lint_failed",
            ErrorCode::FeedMissingData => "release.feed_missing_data",

            ErrorCode::MinifyFailed => "minify.failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidPatternDetails {
    pub pattern: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDetails {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFailedDetails {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintFailedDetails {
    pub dir: String,
    pub output: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMissingDataDetails {
    pub url: String,
    pub platform: String,
    pub channel: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifyFailedDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    /// Fatal errors gate the release unconditionally: the caller must stop
    /// and exit nonzero instead of treating them as an ordinary failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self.code, ErrorCode::LintFailed | ErrorCode::FeedMissingData)
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn validation_invalid_pattern(pattern: impl Into<String>, error: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let details = to_details(InvalidPatternDetails {
            pattern: pattern.clone(),
            error: error.into(),
        });

        Self::new(
            ErrorCode::ValidationInvalidPattern,
            format!("Invalid pattern '{}'", pattern),
            details,
        )
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let details = to_details(ConfigMissingKeyDetails {
            key: key.into(),
            path,
        });

        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            details,
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = to_details(ConfigInvalidJsonDetails {
            path: path.into(),
            error: err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn network_request_failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        let details = to_details(NetworkDetails {
            url: url.into(),
            status: None,
            error: error.into(),
        });

        let mut err = Self::new(ErrorCode::NetworkRequestFailed, "HTTP request failed", details);
        err.retryable = Some(true);
        err
    }

    pub fn network_bad_status(url: impl Into<String>, status: u16) -> Self {
        let details = to_details(NetworkDetails {
            url: url.into(),
            status: Some(status),
            error: format!("HTTP {}", status),
        });

        let mut err = Self::new(
            ErrorCode::NetworkBadStatus,
            format!("Remote returned HTTP {}", status),
            details,
        );
        err.retryable = Some(status >= 500);
        err
    }

    pub fn command_failed(details: CommandFailedDetails) -> Self {
        let message = format!("Command could not be run: {}", details.command);
        Self::new(ErrorCode::CommandFailed, message, to_details(details))
    }

    pub fn lint_failed(dir: impl Into<String>, output: impl Into<String>) -> Self {
        let dir = dir.into();
        let details = to_details(LintFailedDetails {
            dir: dir.clone(),
            output: output.into(),
        });

        Self::new(
            ErrorCode::LintFailed,
            format!("Lint reported problems in {}", dir),
            details,
        )
        .with_hint("Fix the reported problems and re-run the release")
    }

    pub fn feed_missing_data(details: FeedMissingDataDetails) -> Self {
        Self::new(
            ErrorCode::FeedMissingData,
            "Could not determine current Chrome version",
            to_details(details),
        )
    }

    pub fn minify_failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        let path = path.into();
        let details = to_details(MinifyFailedDetails {
            path: path.clone(),
            error: error.into(),
        });

        Self::new(
            ErrorCode::MinifyFailed,
            format!("Failed to minify {}", path),
            details,
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalJsonErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    /// Attach a key to the structured details, turning non-object details
    /// into an object first.
    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        if !self.details.is_object() {
            let previous = std::mem::replace(&mut self.details, Value::Object(serde_json::Map::new()));
            if !previous.is_null() {
                self.details["error"] = previous;
            }
        }
        self.details[key] = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lint_and_feed_errors_are_fatal() {
        assert!(Error::lint_failed("src/js", "1 problem").is_fatal());
        assert!(Error::feed_missing_data(FeedMissingDataDetails {
            url: "https://example.com/all.json".to_string(),
            platform: "win64".to_string(),
            channel: "stable".to_string(),
            problem: "platform not found".to_string(),
        })
        .is_fatal());

        assert!(!Error::internal_io("denied", None).is_fatal());
        assert!(!Error::network_bad_status("https://example.com", 404).is_fatal());
    }

    #[test]
    fn lint_failed_carries_tool_output() {
        let err = Error::lint_failed("build", "build/a.js\n  1:1  error  no-undef");
        assert_eq!(err.code.as_str(), "release.lint_failed");
        assert_eq!(err.details["dir"], "build");
        assert!(err.details["output"].as_str().unwrap().contains("no-undef"));
        assert_eq!(err.hints.len(), 1);
    }

    #[test]
    fn bad_status_is_retryable_only_for_server_errors() {
        assert_eq!(Error::network_bad_status("u", 503).retryable, Some(true));
        assert_eq!(Error::network_bad_status("u", 404).retryable, Some(false));
    }

    #[test]
    fn with_detail_preserves_existing_fields() {
        let err = Error::internal_io("denied", Some("remove".to_string()))
            .with_detail("stage", serde_json::json!("cleanPre"));
        assert_eq!(err.details["stage"], "cleanPre");
        assert_eq!(err.details["error"], "denied");
        assert_eq!(err.details["context"], "remove");
    }

    #[test]
    fn with_detail_wraps_scalar_details() {
        let err = Error::new(ErrorCode::InternalUnexpected, "x", serde_json::json!("raw"))
            .with_detail("stage", serde_json::json!("zip"));
        assert_eq!(err.details["error"], "raw");
        assert_eq!(err.details["stage"], "zip");
    }
}
