use std::time::Duration;
use thiserror::Error;

/// Why a label could not be handed to a printer.
#[derive(Error, Debug)]
pub enum DispatchCause {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Error, Debug)]
pub enum ScaleIotError {
    #[error("Transport error reaching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Scale {url} did not answer within {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("Scale {url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed scale payload: {message}")]
    Parse { message: String },

    #[error("[Error] {ip}:{port} → {cause}")]
    PrinterDispatch {
        ip: String,
        port: u16,
        #[source]
        cause: DispatchCause,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("A poll of {scale} is already in flight")]
    PollInProgress { scale: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Station worker has stopped")]
    WorkerStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Device,
    Data,
    Configuration,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScaleIotError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => ErrorCategory::Network,
            Self::HttpStatus { .. } | Self::PrinterDispatch { .. } => ErrorCategory::Device,
            Self::Parse { .. } => ErrorCategory::Data,
            Self::Validation { .. } | Self::PollInProgress { .. } => ErrorCategory::Input,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::IoError(_)
            | Self::WorkerStopped => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Device => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// True for both HTTP and printer deadlines.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::PrinterDispatch { cause, .. } => matches!(cause, DispatchCause::TimedOut(_)),
            _ => false,
        }
    }

    /// One-line status text for whatever is displaying results.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Transport { url, .. } => format!("Error: cannot reach scale at {}", url),
            Self::Timeout { url, .. } => format!("Error: scale at {} timed out", url),
            Self::HttpStatus { .. } => "HTTP Error".to_string(),
            Self::Parse { message } => format!("Error: unreadable scale data ({})", message),
            Self::PrinterDispatch { .. } => self.to_string(),
            Self::Validation { message } => format!("Warning: {}", message),
            Self::PollInProgress { scale } => format!("Still reading {}, please wait", scale),
            other => format!("Error: {}", other),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "Check that the scale is powered on and reachable on the network",
            Self::Timeout { .. } => "The scale is slow to answer; try again or raise scale.timeout_ms",
            Self::HttpStatus { .. } => "Verify the scale endpoint URL in the configuration",
            Self::Parse { .. } => "The scale returned something other than its XML document",
            Self::PrinterDispatch { cause, .. } => match cause {
                DispatchCause::TimedOut(_) => "The printer did not take the label in time; check its IP and that it is online",
                _ => "Check that the printer is online and listening on its raw port",
            },
            Self::Validation { .. } => "Correct the input and try again",
            Self::PollInProgress { .. } => "Wait for the running read to finish",
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file and restart",
            Self::IoError(_) => "Check file paths and permissions",
            Self::WorkerStopped => "Restart the application",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScaleIotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printer_dispatch_status_line() {
        let err = ScaleIotError::PrinterDispatch {
            ip: "192.168.1.5".to_string(),
            port: 9100,
            cause: DispatchCause::TimedOut(Duration::from_secs(5)),
        };

        assert_eq!(err.to_string(), "[Error] 192.168.1.5:9100 → timed out after 5s");
        assert_eq!(err.user_friendly_message(), err.to_string());
        assert!(err.is_timeout());
        assert_eq!(err.category(), ErrorCategory::Device);
    }

    #[test]
    fn test_http_status_is_not_a_timeout() {
        let err = ScaleIotError::HttpStatus {
            url: "http://scale/xml".to_string(),
            status: 500,
        };
        assert!(!err.is_timeout());
        assert_eq!(err.user_friendly_message(), "HTTP Error");
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_validation_is_low_severity() {
        let err = ScaleIotError::validation("please select a printer");
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.user_friendly_message(), "Warning: please select a printer");
    }
}
