//! Domain splitting
//!
//! The provider keys records by root domain, and names them relative to it:
//! `sub.example.com` lives in zone `example.com` under the name `sub`, while
//! the apex record of `example.com` is named `example.com` itself.

use crate::error::{Error, Result};
use std::fmt;

/// A domain split into its registrable root and the labels in front of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDomain {
    subdomain: String,
    root: String,
}

impl SplitDomain {
    /// Split a dotted domain string
    ///
    /// The root is always the last two labels. Anything before that is the
    /// subdomain, which is empty for a two-label input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDomain`] when the input has fewer than two labels.
    pub fn parse(domain: &str) -> Result<Self> {
        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 {
            return Err(Error::invalid_domain(format!(
                "{domain:?} needs at least two labels"
            )));
        }

        let split_at = labels.len() - 2;
        Ok(Self {
            subdomain: labels[..split_at].join("."),
            root: labels[split_at..].join("."),
        })
    }

    /// The labels before the root, dot-joined (may be empty)
    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    /// The last two labels
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Name of the record inside the root's zone
    ///
    /// This is the subdomain when there is one, the root otherwise.
    pub fn record_name(&self) -> &str {
        if self.subdomain.is_empty() {
            &self.root
        } else {
            &self.subdomain
        }
    }
}

impl fmt::Display for SplitDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subdomain.is_empty() {
            f.write_str(&self.root)
        } else {
            write!(f, "{}.{}", self.subdomain, self.root)
        }
    }
}
