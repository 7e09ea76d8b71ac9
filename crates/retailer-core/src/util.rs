//! Naming helpers: vendor validation and canonical package names.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, RetailerError};

/// Shortest vendor prefix accepted for canonical package names.
pub const MIN_VENDOR_LENGTH: usize = 3;

fn vendor_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[a-z0-9]([_.-]?[a-z0-9]+)*$").unwrap())
}

/// A validated package vendor (the `vendor` in `vendor/slug`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vendor(String);

impl Vendor {
    /// Validate and wrap a vendor prefix.
    ///
    /// Vendors follow Composer's vendor naming: lowercase alphanumerics
    /// separated by single `_`, `.` or `-`, at least [`MIN_VENDOR_LENGTH`]
    /// characters long.
    ///
    /// ```
    /// use retailer_core::util::Vendor;
    ///
    /// assert!(Vendor::new("pressody-retailer").is_ok());
    /// assert!(Vendor::new("ab").is_err());
    /// assert!(Vendor::new("Bad Vendor").is_err());
    /// ```
    pub fn new(vendor: impl Into<String>) -> Result<Self> {
        let vendor = vendor.into();

        if vendor.len() < MIN_VENDOR_LENGTH {
            return Err(RetailerError::InvalidVendor {
                vendor,
                reason: format!("must be at least {} characters long", MIN_VENDOR_LENGTH),
            });
        }

        if !vendor_regex().is_match(&vendor) {
            return Err(RetailerError::InvalidVendor {
                vendor,
                reason: "only lowercase letters, digits and single '_', '.' or '-' separators are allowed"
                    .to_string(),
            });
        }

        Ok(Self(vendor))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compose the canonical package name for a solution slug.
    pub fn package_name(&self, slug: &str) -> String {
        format!("{}/{}", self.0, slug.trim().to_lowercase())
    }
}

impl FromStr for Vendor {
    type Err = RetailerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Split a `vendor/name` package name into its two halves.
pub fn split_package_name(name: &str) -> Option<(&str, &str)> {
    let (vendor, package) = name.split_once('/')?;
    if vendor.is_empty() || package.is_empty() || package.contains('/') {
        return None;
    }
    Some((vendor, package))
}
