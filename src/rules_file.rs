//! Rules files
//!
//! A rules file is a JSON document listing rules by their endpoint text:
//!
//! ```json
//! {
//!   "rules": [
//!     {
//!       "label": "ssh from lan",
//!       "from": { "address": "192.168.1.0/24" },
//!       "to": { "address": "192.168.1.10", "port": "22" }
//!     },
//!     {
//!       "label": "no high ports",
//!       "to": { "address": "10.0.0.0/8", "port": ">=1024", "negate": true }
//!     }
//!   ]
//! }
//! ```
//!
//! `port` defaults to the empty expression (any port) and `negate` to
//! `false`. Each entry is built into a [`Rule`], source side first.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::core::endpoint::Rule;
use crate::core::error::{Error, ParseError, Result};
use crate::validators::sanitize_label;

/// Maximum number of rules accepted from a single file
pub const MAX_RULES: usize = 1000;

/// Endpoint as written in a rules file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointText {
    pub address: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub negate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub from: Option<EndpointText>,
    #[serde(default)]
    pub to: Option<EndpointText>,
}

impl RuleEntry {
    /// Builds the entry into a rule.
    ///
    /// # Errors
    ///
    /// Returns the first parse error of either side, or
    /// [`ParseError::AddressFamilyConflict`] if the sides disagree.
    pub fn build(&self) -> std::result::Result<Rule, ParseError> {
        let mut rule = Rule::new(self.label());

        self.parse_into(&mut rule).inspect_err(|e| {
            warn!("Rule '{}' rejected: {}", rule.label, e);
        })?;

        Ok(rule)
    }

    /// Label as shown in reports and logs.
    pub fn label(&self) -> String {
        sanitize_label(&self.label)
    }

    fn parse_into(&self, rule: &mut Rule) -> std::result::Result<(), ParseError> {
        if let Some(from) = &self.from {
            rule.parse_source(&from.address, &from.port, from.negate)?;
        }
        if let Some(to) = &self.to {
            rule.parse_destination(&to.address, &to.port, to.negate)?;
        }
        rule.address_family()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

impl RulesFile {
    /// Parses a rules file from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: RulesFile = serde_json::from_str(text)?;

        if file.rules.len() > MAX_RULES {
            return Err(Error::Config(format!(
                "Too many rules ({}, max {MAX_RULES})",
                file.rules.len()
            )));
        }

        Ok(file)
    }

    /// Builds every entry, keeping failures alongside successes.
    ///
    /// Errors are [`Error::Rule`] carrying the 1-based entry index.
    pub fn build(&self) -> Vec<Result<Rule>> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                entry.build().map_err(|source| Error::Rule {
                    index: i + 1,
                    label: entry.label(),
                    source,
                })
            })
            .collect()
    }

    /// Builds every entry, stopping at the first failure.
    pub fn build_all(&self) -> Result<Vec<Rule>> {
        self.build().into_iter().collect()
    }
}

/// Reads and parses a rules file from disk.
pub fn load_rules(path: &Path) -> Result<RulesFile> {
    let text = std::fs::read_to_string(path)?;
    let file = RulesFile::from_json(&text)?;
    info!("Loaded {} rule(s) from {:?}", file.rules.len(), path);
    Ok(file)
}
