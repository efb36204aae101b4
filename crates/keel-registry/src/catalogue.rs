//! Catalogue documents.
//!
//! A catalogue is a CSV document whose first line carries its version:
//!
//! ```text
//! # version: 3
//! generic_name,display_name,unit,taxonomy,native_code
//! net_income,Net income,currency,bank,BIS_22A
//! cost_of_revenue,Cost of revenue,currency,bank,
//! ```
//!
//! An empty `native_code` declares the metric for a taxonomy without mapping
//! it, which resolves to [`Resolution::NotApplicable`](crate::Resolution).

use crate::{
    Taxonomy,
    error::{RegistryError, Result},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Built-in catalogue covering the four standard taxonomies.
const DEFAULT_CATALOGUE: &str = include_str!("../catalogue/default.csv");

/// A metric definition: one generic concept and its per-taxonomy codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    /// Taxonomy-independent concept name
    pub generic_name: String,
    /// Localized display name
    pub display_name: String,
    /// Unit of measure (`currency`, `shares`, ...)
    pub unit: String,
    /// Native code per taxonomy; `None` marks a declared but inapplicable concept
    pub codes: BTreeMap<Taxonomy, Option<String>>,
}

impl MetricDefinition {
    /// Native code for a taxonomy, if the concept applies to it.
    pub fn code_for(&self, taxonomy: &Taxonomy) -> Option<&str> {
        self.codes.get(taxonomy).and_then(|c| c.as_deref())
    }
}

/// A parsed, versioned catalogue document.
#[derive(Debug, Clone)]
pub struct Catalogue {
    version: u32,
    definitions: Vec<MetricDefinition>,
}

#[derive(Debug, Deserialize)]
struct CatalogueRow {
    generic_name: String,
    display_name: String,
    unit: String,
    taxonomy: String,
    native_code: Option<String>,
}

impl Catalogue {
    /// The catalogue embedded in this crate.
    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_CATALOGUE)
    }

    /// Read a catalogue from a file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse a catalogue document.
    pub fn parse(text: &str) -> Result<Self> {
        let version = parse_version(text)?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let mut definitions: Vec<MetricDefinition> = Vec::new();
        let mut index: BTreeMap<String, usize> = BTreeMap::new();

        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let row: CatalogueRow = record.deserialize(Some(&headers))?;
            if row.generic_name.is_empty() || row.taxonomy.is_empty() {
                return Err(RegistryError::InvalidRow {
                    line,
                    reason: "generic_name and taxonomy are required".to_string(),
                });
            }

            let taxonomy = Taxonomy::new(&row.taxonomy);
            let code = row.native_code.filter(|c| !c.is_empty());

            let slot = *index.entry(row.generic_name.clone()).or_insert_with(|| {
                definitions.push(MetricDefinition {
                    generic_name: row.generic_name.clone(),
                    display_name: row.display_name.clone(),
                    unit: row.unit.clone(),
                    codes: BTreeMap::new(),
                });
                definitions.len() - 1
            });

            let definition = &mut definitions[slot];
            match definition.codes.get(&taxonomy) {
                Some(Some(first)) if code.as_deref() != Some(first.as_str()) => {
                    return Err(RegistryError::ConflictingMapping {
                        generic_name: row.generic_name,
                        taxonomy,
                        first: first.clone(),
                        second: code.unwrap_or_default(),
                    });
                }
                Some(Some(_)) => {}
                _ => {
                    definition.codes.insert(taxonomy, code);
                }
            }
        }

        Ok(Self {
            version,
            definitions,
        })
    }

    /// Catalogue version; reloads only take effect on a strictly higher one.
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Metric definitions in document order.
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    /// Consume the catalogue into its definitions.
    pub fn into_definitions(self) -> Vec<MetricDefinition> {
        self.definitions
    }
}

fn parse_version(text: &str) -> Result<u32> {
    let header = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(RegistryError::MissingVersion)?;

    let value = header
        .strip_prefix('#')
        .map(str::trim)
        .and_then(|rest| rest.strip_prefix("version:"))
        .ok_or(RegistryError::MissingVersion)?
        .trim();

    value
        .parse()
        .map_err(|_| RegistryError::InvalidVersion(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "# version: 7
generic_name,display_name,unit,taxonomy,native_code
net_income,Net income,currency,company,CIS_22
net_income,Net income,currency,bank,BIS_22A
cost_of_revenue,Cost of revenue,currency,bank,
";

    #[test]
    fn test_parse_groups_rows_by_generic_name() {
        let catalogue = Catalogue::parse(SMALL).unwrap();
        assert_eq!(catalogue.version(), 7);
        assert_eq!(catalogue.definitions().len(), 2);

        let net_income = &catalogue.definitions()[0];
        assert_eq!(net_income.code_for(&Taxonomy::bank()), Some("BIS_22A"));
        assert_eq!(net_income.code_for(&Taxonomy::company()), Some("CIS_22"));
        assert_eq!(net_income.code_for(&Taxonomy::insurer()), None);

        let cogs = &catalogue.definitions()[1];
        assert!(cogs.codes.contains_key(&Taxonomy::bank()));
        assert_eq!(cogs.code_for(&Taxonomy::bank()), None);
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let text = "generic_name,display_name,unit,taxonomy,native_code\n";
        assert!(matches!(
            Catalogue::parse(text),
            Err(RegistryError::MissingVersion)
        ));
    }

    #[test]
    fn test_bad_version_is_rejected() {
        let text = "# version: two\ngeneric_name,display_name,unit,taxonomy,native_code\n";
        assert!(matches!(
            Catalogue::parse(text),
            Err(RegistryError::InvalidVersion(v)) if v == "two"
        ));
    }

    #[test]
    fn test_conflicting_codes_are_rejected() {
        let text = "# version: 1
generic_name,display_name,unit,taxonomy,native_code
net_income,Net income,currency,bank,BIS_22A
net_income,Net income,currency,bank,BIS_22B
";
        let err = Catalogue::parse(text).unwrap_err();
        assert!(matches!(err, RegistryError::ConflictingMapping { .. }));
        assert!(err.to_string().contains("BIS_22B"));
    }

    #[test]
    fn test_builtin_catalogue_parses() {
        let catalogue = Catalogue::builtin().unwrap();
        assert!(catalogue.version() >= 1);
        assert!(
            catalogue
                .definitions()
                .iter()
                .any(|d| d.generic_name == "net_interest_income")
        );
    }
}
