//! Metric registry: generic name ↔ native code resolution.

use crate::{
    Catalogue, MetricDefinition, Taxonomy,
    error::{RegistryError, Result},
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Outcome of resolving a generic name for a taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The taxonomy reports the concept under this native code
    Native(&'a str),
    /// The concept does not exist for this taxonomy
    NotApplicable,
}

impl<'a> Resolution<'a> {
    /// The native code, if applicable.
    pub const fn native(self) -> Option<&'a str> {
        match self {
            Self::Native(code) => Some(code),
            Self::NotApplicable => None,
        }
    }
}

/// Immutable catalogue of metric definitions.
///
/// Built once from a [`Catalogue`]; share it across workers behind an `Arc`
/// (see [`RegistryHandle`](crate::RegistryHandle)).
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    version: u32,
    definitions: BTreeMap<String, MetricDefinition>,
    inverse: HashMap<Taxonomy, HashMap<String, Vec<String>>>,
    taxonomies: BTreeSet<Taxonomy>,
}

impl MetricRegistry {
    /// Build a registry from a parsed catalogue.
    pub fn from_catalogue(catalogue: Catalogue) -> Self {
        let version = catalogue.version();
        let mut definitions = BTreeMap::new();
        let mut inverse: HashMap<Taxonomy, HashMap<String, Vec<String>>> = HashMap::new();
        let mut taxonomies = BTreeSet::new();

        for definition in catalogue.into_definitions() {
            for (taxonomy, code) in &definition.codes {
                taxonomies.insert(taxonomy.clone());
                if let Some(code) = code {
                    inverse
                        .entry(taxonomy.clone())
                        .or_default()
                        .entry(code.clone())
                        .or_default()
                        .push(definition.generic_name.clone());
                }
            }
            definitions.insert(definition.generic_name.clone(), definition);
        }

        Self {
            version,
            definitions,
            inverse,
            taxonomies,
        }
    }

    /// Registry backed by the built-in catalogue.
    pub fn builtin() -> Result<Self> {
        Catalogue::builtin().map(Self::from_catalogue)
    }

    /// Resolve a generic name to the native code used by `taxonomy`.
    ///
    /// Returns [`RegistryError::UnknownMetric`] when the generic name is not in
    /// the catalogue at all, and [`Resolution::NotApplicable`] when it is but
    /// the taxonomy does not report it.
    pub fn resolve(&self, generic_name: &str, taxonomy: &Taxonomy) -> Result<Resolution<'_>> {
        let definition = self.require(generic_name)?;
        Ok(definition
            .code_for(taxonomy)
            .map_or(Resolution::NotApplicable, Resolution::Native))
    }

    /// Inverse lookup: the generic name a native code stands for.
    ///
    /// `Ok(None)` means the code is not catalogued for this taxonomy.
    pub fn generic_for(&self, taxonomy: &Taxonomy, native_code: &str) -> Result<Option<&str>> {
        let Some(names) = self
            .inverse
            .get(taxonomy)
            .and_then(|codes| codes.get(native_code))
        else {
            return Ok(None);
        };

        match names.as_slice() {
            [single] => Ok(Some(single.as_str())),
            _ => Err(RegistryError::AmbiguousCodeMapping {
                taxonomy: taxonomy.clone(),
                native_code: native_code.to_string(),
                generic_names: names.clone(),
            }),
        }
    }

    /// Definition of a generic name.
    pub fn definition(&self, generic_name: &str) -> Option<&MetricDefinition> {
        self.definitions.get(generic_name)
    }

    /// Definition of a generic name, failing with `UnknownMetric`.
    pub fn require(&self, generic_name: &str) -> Result<&MetricDefinition> {
        self.definition(generic_name)
            .ok_or_else(|| RegistryError::UnknownMetric {
                generic_name: generic_name.to_string(),
            })
    }

    /// All generic names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Generic names that have a native code in `taxonomy`, sorted.
    pub fn generic_names_for(&self, taxonomy: &Taxonomy) -> Vec<&str> {
        self.definitions
            .values()
            .filter(|d| d.code_for(taxonomy).is_some())
            .map(|d| d.generic_name.as_str())
            .collect()
    }

    /// Every taxonomy mentioned by the catalogue.
    pub fn taxonomies(&self) -> impl Iterator<Item = &Taxonomy> {
        self.taxonomies.iter()
    }

    /// Catalogue version this registry was built from.
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Number of generic names.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry has no definitions.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn registry() -> MetricRegistry {
        MetricRegistry::builtin().unwrap()
    }

    #[rstest]
    #[case("net_income", Taxonomy::bank(), "BIS_22A")]
    #[case("net_income", Taxonomy::company(), "CIS_22")]
    #[case("net_interest_income", Taxonomy::bank(), "BIS_03")]
    #[case("net_premiums_earned", Taxonomy::insurer(), "IIS_03")]
    #[case("brokerage_fee_income", Taxonomy::broker(), "SIS_03")]
    fn test_resolve_native(#[case] name: &str, #[case] taxonomy: Taxonomy, #[case] code: &str) {
        assert_eq!(
            registry().resolve(name, &taxonomy).unwrap(),
            Resolution::Native(code)
        );
    }

    #[rstest]
    #[case("net_interest_income", Taxonomy::company())]
    #[case("cost_of_revenue", Taxonomy::bank())]
    #[case("claims_incurred", Taxonomy::broker())]
    fn test_resolve_not_applicable(#[case] name: &str, #[case] taxonomy: Taxonomy) {
        assert_eq!(
            registry().resolve(name, &taxonomy).unwrap(),
            Resolution::NotApplicable
        );
    }

    #[test]
    fn test_unknown_metric_is_an_error() {
        let err = registry()
            .resolve("ebitda_margin_adjusted", &Taxonomy::company())
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnknownMetric { ref generic_name } if generic_name == "ebitda_margin_adjusted"
        ));
    }

    #[test]
    fn test_inverse_lookup() {
        let registry = registry();
        assert_eq!(
            registry
                .generic_for(&Taxonomy::bank(), "BIS_22A")
                .unwrap(),
            Some("net_income")
        );
        assert_eq!(
            registry.generic_for(&Taxonomy::bank(), "CIS_22").unwrap(),
            None
        );
    }

    #[test]
    fn test_ambiguous_code_is_reported() {
        let catalogue = Catalogue::parse(
            "# version: 1
generic_name,display_name,unit,taxonomy,native_code
net_income,Net income,currency,bank,BIS_22A
net_income_parent,Net income to parent,currency,bank,BIS_22A
",
        )
        .unwrap();
        let registry = MetricRegistry::from_catalogue(catalogue);

        let err = registry
            .generic_for(&Taxonomy::bank(), "BIS_22A")
            .unwrap_err();
        match err {
            RegistryError::AmbiguousCodeMapping {
                taxonomy,
                native_code,
                generic_names,
            } => {
                assert_eq!(taxonomy, Taxonomy::bank());
                assert_eq!(native_code, "BIS_22A");
                assert_eq!(generic_names, vec!["net_income", "net_income_parent"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_new_taxonomy_needs_only_rows() {
        let catalogue = Catalogue::parse(
            "# version: 2
generic_name,display_name,unit,taxonomy,native_code
net_income,Net income,currency,trust,TIS_22
",
        )
        .unwrap();
        let registry = MetricRegistry::from_catalogue(catalogue);
        let trust = Taxonomy::new("trust");

        assert_eq!(
            registry.resolve("net_income", &trust).unwrap(),
            Resolution::Native("TIS_22")
        );
        assert!(registry.taxonomies().any(|t| *t == trust));
    }

    #[test]
    fn test_builtin_covers_all_taxonomies() {
        let registry = registry();
        for taxonomy in Taxonomy::builtin() {
            let names = registry.generic_names_for(&taxonomy);
            assert!(names.contains(&"net_income"), "{taxonomy} lacks net_income");
            assert!(names.contains(&"total_equity"), "{taxonomy} lacks total_equity");
        }
    }
}
