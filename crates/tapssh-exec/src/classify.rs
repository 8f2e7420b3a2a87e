//! Error classification into user-facing categories
//!
//! Raw transport errors are matched against keyword tables in a fixed
//! precedence order. Every category except [`ErrorCategory::Unknown`] is shown
//! to the user through a fixed template; `Unknown` passes the raw text through
//! so rare failures stay debuggable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SshError;

/// Closed set of failure categories, in match precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Timeout,
    ConnectionRefused,
    AuthenticationFailed,
    HostUnreachable,
    NetworkUnreachable,
    ConnectionReset,
    InvalidPort,
    Unknown,
}

/// Keyword table; checked top to bottom, first hit wins
const RULES: &[(ErrorCategory, &[&str])] = &[
    (ErrorCategory::Timeout, &["timeout", "timed out"]),
    (ErrorCategory::ConnectionRefused, &["refused", "econnrefused"]),
    (
        ErrorCategory::AuthenticationFailed,
        &["authentication", "auth fail", "permission denied", "password"],
    ),
    (
        ErrorCategory::HostUnreachable,
        &["host", "resolve", "enotfound", "name or service"],
    ),
    (
        ErrorCategory::NetworkUnreachable,
        &["network", "unreachable", "enetunreach"],
    ),
    (
        ErrorCategory::ConnectionReset,
        &["reset", "socket", "broken pipe", "econnreset"],
    ),
    (ErrorCategory::InvalidPort, &["port"]),
];

impl ErrorCategory {
    /// Stable snake-case name, used on the relay wire
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::ConnectionRefused => "connection_refused",
            ErrorCategory::AuthenticationFailed => "authentication_failed",
            ErrorCategory::HostUnreachable => "host_unreachable",
            ErrorCategory::NetworkUnreachable => "network_unreachable",
            ErrorCategory::ConnectionReset => "connection_reset",
            ErrorCategory::InvalidPort => "invalid_port",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeout" => Ok(ErrorCategory::Timeout),
            "connection_refused" => Ok(ErrorCategory::ConnectionRefused),
            "authentication_failed" => Ok(ErrorCategory::AuthenticationFailed),
            "host_unreachable" => Ok(ErrorCategory::HostUnreachable),
            "network_unreachable" => Ok(ErrorCategory::NetworkUnreachable),
            "connection_reset" => Ok(ErrorCategory::ConnectionReset),
            "invalid_port" => Ok(ErrorCategory::InvalidPort),
            "unknown" => Ok(ErrorCategory::Unknown),
            other => Err(format!("unknown error category: {other}")),
        }
    }
}

/// Language of user-facing messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Tr,
}

impl Locale {
    /// Template shown for a category; `None` for `Unknown`
    #[must_use]
    pub fn template(self, category: ErrorCategory) -> Option<&'static str> {
        let text = match (self, category) {
            (_, ErrorCategory::Unknown) => return None,
            (Locale::En, ErrorCategory::Timeout) => {
                "Connection timed out. The device is not responding."
            }
            (Locale::En, ErrorCategory::ConnectionRefused) => {
                "Connection refused. Check that the SSH service is running."
            }
            (Locale::En, ErrorCategory::AuthenticationFailed) => {
                "Authentication failed. The username or password is incorrect."
            }
            (Locale::En, ErrorCategory::HostUnreachable) => {
                "Host not found. Check the IP address."
            }
            (Locale::En, ErrorCategory::NetworkUnreachable) => {
                "Network error. Make sure you are on the same Wi-Fi network as the device."
            }
            (Locale::En, ErrorCategory::ConnectionReset) => {
                "Connection lost. Make sure the device is powered on."
            }
            (Locale::En, ErrorCategory::InvalidPort) => {
                "Port error. Check that the SSH port (usually 22) is open."
            }
            (Locale::Tr, ErrorCategory::Timeout) => {
                "Bağlantı zaman aşımına uğradı. Cihaz yanıt vermiyor."
            }
            (Locale::Tr, ErrorCategory::ConnectionRefused) => {
                "Bağlantı reddedildi. SSH servisi çalışıyor mu kontrol edin."
            }
            (Locale::Tr, ErrorCategory::AuthenticationFailed) => {
                "Kimlik doğrulama hatası. Kullanıcı adı veya şifre yanlış."
            }
            (Locale::Tr, ErrorCategory::HostUnreachable) => {
                "Host bulunamadı. IP adresini kontrol edin."
            }
            (Locale::Tr, ErrorCategory::NetworkUnreachable) => {
                "Ağ hatası. Aynı WiFi ağında olduğunuzdan emin olun."
            }
            (Locale::Tr, ErrorCategory::ConnectionReset) => {
                "Bağlantı hatası. Cihazın açık olduğundan emin olun."
            }
            (Locale::Tr, ErrorCategory::InvalidPort) => {
                "Port hatası. SSH portu (genellikle 22) açık mı kontrol edin."
            }
        };
        Some(text)
    }

    /// Fallback for an `Unknown` failure with no text at all
    #[must_use]
    pub fn generic_error(self) -> &'static str {
        match self {
            Locale::En => "SSH connection error.",
            Locale::Tr => "SSH bağlantı hatası oluştu.",
        }
    }

    /// Shown instead of an empty success output
    #[must_use]
    pub fn success_placeholder(self) -> &'static str {
        match self {
            Locale::En => "Command completed successfully.",
            Locale::Tr => "Komut başarıyla çalıştırıldı.",
        }
    }
}

/// Category plus the message the user should see
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub message: String,
}

/// Match raw error text against the keyword table
#[must_use]
pub fn categorize(raw: &str) -> ErrorCategory {
    let lowered = raw.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map_or(ErrorCategory::Unknown, |(category, _)| *category)
}

/// Build the user-facing message for a category and its raw text
#[must_use]
pub fn describe(category: ErrorCategory, raw: &str, locale: Locale) -> Classification {
    let message = match locale.template(category) {
        Some(template) => template.to_string(),
        None if raw.trim().is_empty() => locale.generic_error().to_string(),
        None => raw.to_string(),
    };
    Classification { category, message }
}

/// Classify raw error text
#[must_use]
pub fn classify_message(raw: &str, locale: Locale) -> Classification {
    describe(categorize(raw), raw, locale)
}

/// Classify a typed error
///
/// Deadline errors are always `Timeout`, and a failing remote command is
/// always `Unknown` with the remote output preserved so its stderr is never
/// mistaken for a transport failure.
#[must_use]
pub fn classify(error: &SshError, locale: Locale) -> Classification {
    match error {
        SshError::Timeout { .. } => describe(ErrorCategory::Timeout, "", locale),
        SshError::CommandFailed { output, .. } if !output.trim().is_empty() => {
            describe(ErrorCategory::Unknown, output, locale)
        }
        SshError::CommandFailed { .. } => {
            describe(ErrorCategory::Unknown, &error.to_string(), locale)
        }
        other => classify_message(&other.to_string(), locale),
    }
}
