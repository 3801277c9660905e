use thiserror::Error;

use super::address::AddressFamily;

/// Core error types for pfrule
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A single endpoint or port expression failed to parse
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An entry of a rules file could not be built
    #[error("rule #{index} ({label}): {source}")]
    Rule {
        index: usize,
        label: String,
        source: ParseError,
    },

    /// Configuration file is unusable
    #[error("Config error: {0}")]
    Config(String),
}

/// Errors produced while parsing addresses, port expressions and endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Literal or CIDR text cannot be parsed as an IP network.
    #[error("invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    /// Numeric token out of the 16-bit range or not an integer.
    #[error("invalid port number '{input}'")]
    InvalidPort { input: String },

    /// Port expression does not follow the operator grammar.
    #[error("malformed port expression '{input}': {reason}")]
    MalformedPortExpression { input: String, reason: String },

    /// Source and destination endpoints disagree on the address family.
    #[error("address family mismatch: source is {source_family}, destination is {destination_family}")]
    AddressFamilyConflict {
        source_family: AddressFamily,
        destination_family: AddressFamily,
    },
}

impl ParseError {
    pub(crate) fn invalid_address(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPortExpression {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns a user-facing explanation with suggestions for fixing the input.
    pub fn translate(&self) -> ErrorTranslation {
        match self {
            Self::InvalidAddress { input, .. } if input.contains('/') => {
                ErrorTranslation::new(format!("'{input}' is not a valid network"))
                    .with_suggestion("Use ADDRESS/PREFIX, e.g. 192.168.1.0/24 or 2001:db8::/32")
                    .with_suggestion("Prefix length must be 0-32 for IPv4 and 0-128 for IPv6")
                    .with_help("https://en.wikipedia.org/wiki/Classless_Inter-Domain_Routing")
            }
            Self::InvalidAddress { input, .. } => {
                ErrorTranslation::new(format!("'{input}' is not a valid IP address"))
                    .with_suggestion("Use a literal address such as 10.0.0.1 or fe80::1")
                    .with_suggestion("Host and interface names are not resolved")
            }
            Self::InvalidPort { input } => {
                ErrorTranslation::new(format!("'{input}' is not a valid port number"))
                    .with_suggestion("Port numbers must be between 0 and 65535")
                    .with_suggestion("Only decimal digits are accepted")
            }
            Self::MalformedPortExpression { input, reason } => {
                ErrorTranslation::new(format!("Cannot read port expression '{input}': {reason}"))
                    .with_suggestion("Single port: 80   Range: 1000:2000")
                    .with_suggestion("Comparisons: !=22  <1024  <=1024  >1023  >=1024")
                    .with_suggestion("Between: 10><20   Outside: 10<>20")
            }
            Self::AddressFamilyConflict {
                source_family,
                destination_family,
            } => ErrorTranslation::new(format!(
                "Source ({source_family}) and destination ({destination_family}) use different address families"
            ))
            .with_suggestion("A single rule matches either IPv4 or IPv6 traffic")
            .with_suggestion("Split the rule into one IPv4 and one IPv6 rule"),
        }
    }
}

/// Represents a translated error with helpful context
#[derive(Debug, Clone)]
pub struct ErrorTranslation {
    pub user_message: String,
    pub suggestions: Vec<String>,
    pub help_url: Option<String>,
}

impl ErrorTranslation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            user_message: message.into(),
            suggestions: Vec::new(),
            help_url: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, url: impl Into<String>) -> Self {
        self.help_url = Some(url.into());
        self
    }
}

pub type Result<T> = std::result::Result<T, Error>;
