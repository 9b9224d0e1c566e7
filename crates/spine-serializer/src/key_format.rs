//! Key formatters: map field names to wire keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use spine_core::Field;

/// Naming convention applied to a field's serialized name on the wire.
pub trait KeyFormatter: fmt::Debug + Send + Sync {
    fn format_key(&self, name: &str) -> String;

    /// Wire key for `field`.
    fn format(&self, field: &Field) -> String {
        self.format_key(&field.serialized_name)
    }
}

/// Uses serialized names unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsIsKeyFormatter;

impl KeyFormatter for AsIsKeyFormatter {
    fn format_key(&self, name: &str) -> String {
        name.to_string()
    }
}

/// `camelCase` → `camel-case`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DasherizedKeyFormatter;

impl KeyFormatter for DasherizedKeyFormatter {
    fn format_key(&self, name: &str) -> String {
        split_camel_case(name, '-')
    }
}

/// `camelCase` → `camel_case`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderscoredKeyFormatter;

impl KeyFormatter for UnderscoredKeyFormatter {
    fn format_key(&self, name: &str) -> String {
        split_camel_case(name, '_')
    }
}

/// Insert `separator` before every uppercase letter that follows a
/// lowercase one, then lowercase everything.
fn split_camel_case(name: &str, separator: char) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() && prev_lower {
            out.push(separator);
        }
        prev_lower = c.is_lowercase();
        out.extend(c.to_lowercase());
    }
    out
}

/// Key format selector used by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyFormat {
    #[default]
    AsIs,
    Dasherized,
    Underscored,
}

impl KeyFormat {
    #[must_use]
    pub fn formatter(self) -> Box<dyn KeyFormatter> {
        match self {
            Self::AsIs => Box::new(AsIsKeyFormatter),
            Self::Dasherized => Box::new(DasherizedKeyFormatter),
            Self::Underscored => Box::new(UnderscoredKeyFormatter),
        }
    }
}
