use thiserror::Error;

pub const EMPTY_SCRIPT_MESSAGE: &str = "Please enter a movie script first.";

#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    Generic = 1,
    Auth = 2,
    Usage = 3,
    Network = 4,
    RateLimited = 5,
    Server = 6,
    Remote = 7,
    Fetch = 8,
    EmptyInput = 9,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Please enter a movie script first.")]
    EmptyInput,
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("{0}")]
    Server(String),
    /// The service answered, but not with the envelope we expected.
    #[error("{0}")]
    Remote(String),
    /// A generated image could not be downloaded or decoded.
    #[error("{0}")]
    Fetch(String),
    #[error("{0}")]
    Generic(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::EmptyInput => ExitCode::EmptyInput as i32,
            CliError::Usage(_) => ExitCode::Usage as i32,
            CliError::Auth(_) => ExitCode::Auth as i32,
            CliError::Network(_) => ExitCode::Network as i32,
            CliError::RateLimited(_) => ExitCode::RateLimited as i32,
            CliError::Server(_) => ExitCode::Server as i32,
            CliError::Remote(_) => ExitCode::Remote as i32,
            CliError::Fetch(_) => ExitCode::Fetch as i32,
            CliError::Generic(_) => ExitCode::Generic as i32,
        }
    }

    /// Text shown to the user when a top-level action fails.
    ///
    /// Blank input gets the fixed guidance line; everything else is prefixed
    /// with the action that failed so the underlying detail stays visible.
    pub fn describe_for(&self, action: &str) -> String {
        match self {
            CliError::EmptyInput => EMPTY_SCRIPT_MESSAGE.to_string(),
            other => format!("An error occurred while {action}:\n\n{other}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        CliError::Generic(format!("I/O error: {value}"))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        CliError::Generic(format!("JSON error: {value}"))
    }
}

impl From<url::ParseError> for CliError {
    fn from(value: url::ParseError) -> Self {
        CliError::Usage(format!("Invalid URL: {value}"))
    }
}

impl From<reqwest::Error> for CliError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return CliError::Network("Request timed out.".to_string());
        }
        CliError::Network(format!("Network request failed: {value}"))
    }
}

impl From<image::ImageError> for CliError {
    fn from(value: image::ImageError) -> Self {
        CliError::Fetch(format!("Failed decoding image: {value}"))
    }
}

pub fn with_debug_hint(message: &str, debug: bool) -> String {
    if debug {
        return message.to_string();
    }
    format!("{message} (try --debug for details)")
}

pub fn redact_secret(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let chars: Vec<char> = input.chars().collect();
    for (idx, c) in chars.iter().enumerate() {
        if idx < 3 || idx + 3 >= chars.len() {
            out.push(*c);
        } else {
            out.push('*');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{CliError, redact_secret};

    #[test]
    fn redact_keeps_edges() {
        assert_eq!(redact_secret("sk-abcdefgh"), "sk-*****fgh");
        assert_eq!(redact_secret(""), "");
    }

    #[test]
    fn empty_input_describes_with_guidance() {
        let text = CliError::EmptyInput.describe_for("generating commentary");
        assert_eq!(text, "Please enter a movie script first.");
    }

    #[test]
    fn failures_keep_underlying_detail() {
        let err = CliError::Server("upstream exploded".to_string());
        let text = err.describe_for("generating images");
        assert!(text.starts_with("An error occurred while generating images:"));
        assert!(text.ends_with("upstream exploded"));
    }
}
