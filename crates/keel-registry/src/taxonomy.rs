//! Accounting taxonomies.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A distinct chart of accounts with its own native line-item codes.
///
/// Taxonomies are open-ended: any name appearing in a catalogue is a valid
/// taxonomy, so adding one is a data change. The four built-in taxonomies
/// have constructors for convenience.
#[derive(
    Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct Taxonomy(String);

impl Taxonomy {
    /// Create a taxonomy from its name. Names are case-insensitive.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_lowercase())
    }

    /// General (non-financial) companies.
    pub fn company() -> Self {
        Self::new("company")
    }

    /// Commercial banks.
    pub fn bank() -> Self {
        Self::new("bank")
    }

    /// Insurance companies.
    pub fn insurer() -> Self {
        Self::new("insurer")
    }

    /// Brokers and securities firms.
    pub fn broker() -> Self {
        Self::new("broker")
    }

    /// The taxonomy name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The four built-in taxonomies.
    pub fn builtin() -> [Self; 4] {
        [Self::company(), Self::bank(), Self::insurer(), Self::broker()]
    }
}

impl FromStr for Taxonomy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_normalized() {
        assert_eq!(Taxonomy::new(" Bank "), Taxonomy::bank());
        assert_eq!(Taxonomy::bank().to_string(), "bank");
        assert_eq!("INSURER".parse::<Taxonomy>().unwrap(), Taxonomy::insurer());
    }
}
