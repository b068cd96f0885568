//! Template kind definitions for clientgen.
//!
//! # Examples
//!
//! ```
//! use clientgen_core::templates::TemplateKind;
//! use std::str::FromStr;
//!
//! let template = TemplateKind::from_str("rust").unwrap();
//! assert_eq!(template, TemplateKind::Rust);
//! assert_eq!(template.as_str(), "rust");
//! assert_eq!(template.to_string(), "rust");
//!
//! // The default template is the built-in Rust client
//! assert_eq!(TemplateKind::default(), TemplateKind::Rust);
//! ```
//!
//! Custom template directories are located by
//! [`TemplateDir::discover`](super::TemplateDir::discover).

// Internal imports (std, crate)
use std::fmt;
use std::str::FromStr;

/// Supported template kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemplateKind {
    /// Built-in async Rust client
    #[default]
    Rust,
    /// User-supplied template directory rendered against the Rust context
    Custom,
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rust" => Ok(TemplateKind::Rust),
            "custom" => Ok(TemplateKind::Custom),
            _ => Err(format!("Unknown template kind: {}", s)),
        }
    }
}

impl TemplateKind {
    /// Returns the template identifier as a string slice
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Custom => "custom",
        }
    }

    /// Whether the templates ship inside the binary
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Rust)
    }

    /// Returns an iterator over all available template kinds
    pub fn all() -> impl Iterator<Item = Self> {
        use TemplateKind::*;
        [Rust, Custom].iter().copied()
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
