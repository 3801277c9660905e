//! Rules file checking
//!
//! Builds every entry of a [`RulesFile`] and collects, per entry, either the
//! built rule or a translated error, plus any validator warnings. The report
//! renders as plain text for terminals or serializes to JSON.

use serde::Serialize;
use std::fmt::Write as _;

use crate::config::CheckConfig;
use crate::core::endpoint::{Endpoint, Rule};
use crate::core::error::ErrorTranslation;
use crate::rules_file::RulesFile;
use crate::utils::truncate_string;
use crate::validators::{check_port_spec, check_reserved_address, is_inverted_range};

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
}

impl From<ErrorTranslation> for Diagnostic {
    fn from(t: ErrorTranslation) -> Self {
        Self {
            message: t.user_message,
            suggestions: t.suggestions,
            help_url: t.help_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    /// 1-based position in the rules file
    pub index: usize,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<Rule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Diagnostic>,
    pub warnings: Vec<String>,
}

impl EntryReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub entries: Vec<EntryReport>,
}

impl CheckReport {
    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_ok()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.entries.iter().map(|e| e.warnings.len()).sum()
    }

    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Human-readable report, one block per entry.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        for entry in &self.entries {
            let label = if entry.label.is_empty() {
                "(unnamed)".to_string()
            } else {
                truncate_string(&entry.label, 40)
            };

            match (&entry.rule, &entry.error) {
                (Some(rule), _) => {
                    let _ = writeln!(out, "✓ #{} {label}: {}", entry.index, summarize(rule));
                }
                (None, Some(error)) => {
                    let _ = writeln!(out, "✗ #{} {label}: {}", entry.index, error.message);
                    for suggestion in &error.suggestions {
                        let _ = writeln!(out, "    - {suggestion}");
                    }
                    if let Some(url) = &error.help_url {
                        let _ = writeln!(out, "    see {url}");
                    }
                }
                (None, None) => {}
            }
            for warning in &entry.warnings {
                let _ = writeln!(out, "    ! {warning}");
            }
        }

        let _ = writeln!(
            out,
            "{} rule(s), {} error(s), {} warning(s)",
            self.entries.len(),
            self.error_count(),
            self.warning_count()
        );
        out
    }
}

fn describe_endpoint(endpoint: Option<&Endpoint>) -> String {
    match endpoint {
        None => "any".to_string(),
        Some(endpoint) if endpoint.port().is_any() => endpoint.address().to_string(),
        Some(endpoint) => format!("{} port {}", endpoint.address(), endpoint.port()),
    }
}

fn summarize(rule: &Rule) -> String {
    let family = rule
        .address_family()
        .unwrap_or_else(|_| rule.recorded_family());
    format!(
        "{family} from {} to {}",
        describe_endpoint(rule.source()),
        describe_endpoint(rule.destination())
    )
}

fn endpoint_warnings(endpoint: &Endpoint, config: &CheckConfig) -> Vec<String> {
    let side = endpoint.side();
    let mut warnings = Vec::new();

    if let Some(w) = check_port_spec(endpoint.port()) {
        warnings.push(format!("{side} port: {w}"));
    }
    if config.warn_reserved_addresses
        && let Some(w) = check_reserved_address(endpoint.address())
    {
        warnings.push(format!("{side} address: {w}"));
    }

    warnings
}

/// Builds and checks every entry of `file`.
pub fn check_rules(file: &RulesFile, config: &CheckConfig) -> CheckReport {
    let entries = file
        .rules
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mut report = EntryReport {
                index: i + 1,
                label: entry.label(),
                rule: None,
                error: None,
                warnings: Vec::new(),
            };

            match entry.build() {
                Ok(rule) => {
                    let endpoints = rule.source().into_iter().chain(rule.destination());
                    for endpoint in endpoints {
                        if config.reject_inverted_ranges && is_inverted_range(endpoint.port()) {
                            report.error = Some(Diagnostic {
                                message: format!(
                                    "{} port range {} is inverted",
                                    endpoint.side(),
                                    endpoint.port()
                                ),
                                suggestions: vec!["Write the lower port first".to_string()],
                                help_url: None,
                            });
                        }
                        report.warnings.extend(endpoint_warnings(endpoint, config));
                    }
                    if report.error.is_none() {
                        report.rule = Some(rule);
                    }
                }
                Err(e) => report.error = Some(e.translate().into()),
            }

            report
        })
        .collect();

    CheckReport { entries }
}
