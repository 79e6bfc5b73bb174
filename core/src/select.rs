//! Selection policies for the parts of a schema that are chosen, not merged.
//!
//! Enums are deduplicated by name with the first declaration winning. Data
//! sources and generators are taken verbatim from a single fragment.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{DataSource, Fragment, GeneratorConfig, SchemaEnum};

/// Which fragment supplies the data-source list when several declare a
/// usable one.
///
/// # Examples
///
/// ```
/// use schema_mixer_core::DatasourceSelection;
///
/// assert_eq!(DatasourceSelection::default(), DatasourceSelection::Last);
/// let parsed: DatasourceSelection = serde_json::from_str("\"first\"").unwrap();
/// assert_eq!(parsed, DatasourceSelection::First);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceSelection {
    /// The first fragment with a usable data source wins.
    First,
    /// The last fragment with a usable data source wins.
    #[default]
    Last,
}

/// Picks the data-source list of one fragment.
///
/// Only fragments with at least one data source whose URL is resolvable are
/// candidates. The chosen list is returned verbatim, including its unusable
/// entries; every other fragment's data sources are discarded.
pub fn select_datasources(
    fragments: &[Fragment],
    selection: DatasourceSelection,
) -> Vec<DataSource> {
    let mut candidates = fragments
        .iter()
        .filter(|f| f.datasources.iter().any(DataSource::is_usable));

    let chosen = match selection {
        DatasourceSelection::First => candidates.next(),
        DatasourceSelection::Last => candidates.last(),
    };

    match chosen {
        Some(fragment) => {
            debug!(origin = %fragment.origin, "using data sources");
            fragment.datasources.clone()
        }
        None => Vec::new(),
    }
}

/// Picks the generator list of the last fragment that declares any.
pub fn select_generators(fragments: &[Fragment]) -> Vec<GeneratorConfig> {
    fragments
        .iter()
        .rev()
        .find(|f| !f.generators.is_empty())
        .map(|fragment| {
            debug!(origin = %fragment.origin, "using generators");
            fragment.generators.clone()
        })
        .unwrap_or_default()
}

/// Collects enums across fragments in order, keeping the first declaration
/// of each name.
pub fn select_enums(fragments: &[Fragment]) -> Vec<SchemaEnum> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut enums = Vec::new();

    for fragment in fragments {
        for schema_enum in &fragment.enums {
            if !seen.insert(schema_enum.name.as_str()) {
                warn!(
                    name = %schema_enum.name,
                    origin = %fragment.origin,
                    "enum already defined, keeping the first definition"
                );
                continue;
            }
            enums.push(schema_enum.clone());
        }
    }

    enums
}

#[cfg(test)]
mod tests {
    use crate::{EnvValue, GeneratorConfig};

    use super::*;

    fn with_datasource(origin: &str, provider: &str, url: EnvValue) -> Fragment {
        Fragment::new(origin).with_datasource(DataSource::new("db", provider, url))
    }

    #[test]
    fn test_select_datasources_skips_fragments_without_usable_url() {
        let usable = with_datasource("a", "postgresql", EnvValue::Env("DATABASE_URL".into()));
        let unusable = with_datasource("b", "mysql", EnvValue::Value(String::new()));
        let empty = Fragment::new("c");

        let picked = select_datasources(
            &[usable.clone(), unusable, empty],
            DatasourceSelection::Last,
        );
        assert_eq!(picked, usable.datasources);
    }

    #[test]
    fn test_select_datasources_keeps_exact_url_form() {
        let literal = with_datasource("a", "sqlite", EnvValue::Value("file:./dev.db".into()));
        let none = Fragment::new("b");

        let picked = select_datasources(&[literal, none], DatasourceSelection::First);
        assert_eq!(
            picked[0].url,
            Some(EnvValue::Value("file:./dev.db".into()))
        );
    }

    #[test]
    fn test_select_datasources_direction() {
        let a = with_datasource("a", "postgresql", EnvValue::Env("A".into()));
        let b = with_datasource("b", "mysql", EnvValue::Env("B".into()));
        let fragments = [a, b];

        assert_eq!(
            select_datasources(&fragments, DatasourceSelection::First)[0].provider,
            "postgresql"
        );
        assert_eq!(
            select_datasources(&fragments, DatasourceSelection::Last)[0].provider,
            "mysql"
        );
    }

    #[test]
    fn test_select_datasources_empty_when_none_usable() {
        let a = Fragment::new("a");
        assert!(select_datasources(&[a], DatasourceSelection::Last).is_empty());
    }

    #[test]
    fn test_select_generators_takes_last_non_empty_list() {
        let a = Fragment::new("a").with_generator(GeneratorConfig::new("client", "prisma-client-js"));
        let b = Fragment::new("b")
            .with_generator(GeneratorConfig::new("client", "prisma-client-py"))
            .with_generator(GeneratorConfig::new("erd", "prisma-erd-generator"));
        let c = Fragment::new("c");

        let picked = select_generators(&[a, b, c]);
        let providers: Vec<_> = picked.iter().map(|g| g.provider.clone()).collect();
        assert_eq!(
            providers,
            vec![
                EnvValue::Value("prisma-client-py".into()),
                EnvValue::Value("prisma-erd-generator".into())
            ]
        );
    }

    #[test]
    fn test_select_enums_first_definition_wins() {
        let a = Fragment::new("a").with_enum(SchemaEnum::new("Status", ["DRAFT", "PUBLISHED"]));
        let b = Fragment::new("b")
            .with_enum(SchemaEnum::new("Status", ["ARCHIVED"]))
            .with_enum(SchemaEnum::new("Role", ["USER"]));

        let enums = select_enums(&[a.clone(), b]);
        assert_eq!(enums.len(), 2);
        assert_eq!(enums[0], a.enums[0]);
        assert_eq!(enums[1].name, "Role");
    }
}
