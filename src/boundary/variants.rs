//! Name variant generation.
//!
//! Expands a bare locality into the ordered list of queries the resolver
//! sends to the geocoder. The order only breaks score ties; every variant is
//! searched.

use hashbrown::HashSet;
use serde::Serialize;

use super::AliasTable;
use crate::models::LocalityName;

/// Upper bound on queries per locality
pub const MAX_VARIANTS: usize = 10;

/// Upper bound on names taken from the discovery pre-query
pub const MAX_DISCOVERED: usize = 3;

/// How a variant was derived from the locality name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Bare,
    /// Alternate spelling from the alias table
    Alias,
    /// Name reported by the geocoder's name details
    Discovered,
    /// `<name> municipality`
    Municipality,
    /// Locale-specific administrative form, e.g. `<name> kommun`
    LocalSuffix,
    /// `<name>, <country>`
    Country,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameVariant {
    pub query: String,
    pub kind: VariantKind,
}

/// Outcome of the optional name discovery pre-query
#[derive(Debug, Clone)]
pub enum Discovery {
    Skipped,
    Found(Vec<String>),
    Failed,
}

struct VariantList {
    variants: Vec<NameVariant>,
    seen: HashSet<String>,
}

impl VariantList {
    fn new() -> Self {
        Self {
            variants: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Returns false if the query was empty, a duplicate or over the cap
    fn push(&mut self, query: String, kind: VariantKind) -> bool {
        let query = query.trim().to_string();
        if query.is_empty() || self.variants.len() >= MAX_VARIANTS {
            return false;
        }
        if !self.seen.insert(query.to_lowercase()) {
            return false;
        }
        self.variants.push(NameVariant { query, kind });
        true
    }
}

/// Administrative-suffix and country-qualified forms of one base name
fn push_admin_forms(list: &mut VariantList, base: &str, aliases: &AliasTable) {
    list.push(format!("{} municipality", base), VariantKind::Municipality);
    for entry in aliases.matching(base) {
        for form in &entry.suffix_forms {
            list.push(form.replace("{name}", base), VariantKind::LocalSuffix);
        }
        if let Some(country) = &entry.country {
            list.push(format!("{}, {}", base, country), VariantKind::Country);
        }
    }
}

/// Build the ordered, deduplicated variant list for `name`.
///
/// The bare name always comes first. When discovery was attempted and
/// failed only the bare name and its administrative forms are produced.
pub fn generate_variants(
    name: &LocalityName,
    aliases: &AliasTable,
    discovery: &Discovery,
) -> Vec<NameVariant> {
    let bare = name.as_str().to_string();
    let mut list = VariantList::new();
    list.push(bare.clone(), VariantKind::Bare);

    let mut bases = vec![bare.clone()];

    if !matches!(discovery, Discovery::Failed) {
        for entry in aliases.matching(&bare) {
            for alternate in &entry.alternates {
                if list.push(alternate.clone(), VariantKind::Alias) {
                    bases.push(alternate.clone());
                }
            }
        }
        if let Discovery::Found(names) = discovery {
            for discovered in names.iter().take(MAX_DISCOVERED) {
                if list.push(discovered.clone(), VariantKind::Discovered) {
                    bases.push(discovered.clone());
                }
            }
        }
    }

    for base in &bases {
        push_admin_forms(&mut list, base, aliases);
    }

    // An empty name still yields itself as the single variant
    if list.variants.is_empty() {
        list.variants.push(NameVariant {
            query: bare,
            kind: VariantKind::Bare,
        });
    }

    list.variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::AliasEntry;

    fn table() -> AliasTable {
        AliasTable::new(AliasEntry::builtin())
    }

    fn queries(variants: &[NameVariant]) -> Vec<&str> {
        variants.iter().map(|v| v.query.as_str()).collect()
    }

    #[test]
    fn test_unknown_locality_gets_municipality_form() {
        let variants = generate_variants(&"lisbon".into(), &table(), &Discovery::Skipped);
        assert_eq!(queries(&variants), vec!["lisbon", "lisbon municipality"]);
        assert_eq!(variants[0].kind, VariantKind::Bare);
        assert_eq!(variants[1].kind, VariantKind::Municipality);
    }

    #[test]
    fn test_alias_alternates_and_locale_forms() {
        let variants = generate_variants(&"Gothenburg".into(), &table(), &Discovery::Skipped);
        let q = queries(&variants);
        assert_eq!(q[0], "gothenburg");
        assert_eq!(q[1], "Göteborg");
        assert_eq!(q[2], "Göteborgs Stad");
        assert!(q.contains(&"gothenburg kommun"));
        assert!(q.contains(&"gothenburg, Sweden"));
        assert!(q.contains(&"Göteborg municipality"));
        assert!(variants.len() <= MAX_VARIANTS);
    }

    #[test]
    fn test_utrecht_forms() {
        let variants = generate_variants(&"utrecht".into(), &table(), &Discovery::Skipped);
        assert_eq!(
            queries(&variants),
            vec![
                "utrecht",
                "utrecht municipality",
                "utrecht gemeente",
                "utrecht, Netherlands"
            ]
        );
    }

    #[test]
    fn test_discovered_names_follow_alternates() {
        let discovery = Discovery::Found(vec!["Lisboa".into(), "lisbon".into()]);
        let variants = generate_variants(&"lisbon".into(), &table(), &discovery);
        assert_eq!(
            queries(&variants),
            vec!["lisbon", "Lisboa", "lisbon municipality", "Lisboa municipality"]
        );
        assert_eq!(variants[1].kind, VariantKind::Discovered);
    }

    #[test]
    fn test_failed_discovery_degrades_to_bare_forms() {
        let variants = generate_variants(&"gothenburg".into(), &table(), &Discovery::Failed);
        assert_eq!(
            queries(&variants),
            vec![
                "gothenburg",
                "gothenburg municipality",
                "gothenburg kommun",
                "gothenburgs Stad",
                "gothenburg, Sweden"
            ]
        );
    }

    #[test]
    fn test_invariants_hold_for_many_inputs() {
        let discovered = Discovery::Found((0..20).map(|i| format!("Name {}", i)).collect());
        for raw in ["a", "göteborg", "malmo", "stockholm", "x y z", "BUDAPEST", "gothenburg stad"] {
            for discovery in [&Discovery::Skipped, &Discovery::Failed, &discovered] {
                let name = LocalityName::new(raw);
                let variants = generate_variants(&name, &table(), discovery);
                assert!(!variants.is_empty());
                assert!(variants.len() <= MAX_VARIANTS);
                assert_eq!(variants[0].query, name.as_str());
                let mut seen = HashSet::new();
                for v in &variants {
                    assert!(seen.insert(v.query.clone()), "duplicate {}", v.query);
                }
            }
        }
    }
}
