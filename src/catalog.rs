//! Method catalog: every method identifier observed in a report.

use serde::Serialize;

use std::collections::HashSet;

use crate::Report;

/// Distinct method identifiers in first-seen order.
///
/// Ticks are walked in their stored (ascending) order; within a tick the keys
/// come out in `MethodCounts` order. The same report always yields the same
/// sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MethodCatalog {
    methods: Vec<String>,
}

impl MethodCatalog {
    pub fn from_methods<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for method in methods {
            let method = method.into();
            if seen.insert(method.clone()) {
                out.push(method);
            }
        }
        Self { methods: out }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.methods
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(String::as_str)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

pub fn all_methods(report: &Report) -> MethodCatalog {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut methods = Vec::new();
    for tick in &report.ticks {
        for method in tick.method_counts.methods() {
            if seen.insert(method) {
                methods.push(method.to_string());
            }
        }
    }
    tracing::debug!(
        methods = methods.len(),
        ticks = report.ticks.len(),
        "built method catalog"
    );
    MethodCatalog { methods }
}

/// Case-insensitive substring filter over a catalog.
///
/// An empty query keeps every entry. Relative order is always preserved.
pub fn filter_methods<'a>(catalog: &'a MethodCatalog, query: &str) -> Vec<&'a str> {
    let filter = MethodFilter::new(query);
    catalog.iter().filter(|m| filter.matches(m)).collect()
}

/// A lower-cased query, reusable across many identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodFilter {
    needle: String,
}

impl MethodFilter {
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.to_lowercase(),
        }
    }

    pub fn matches(&self, method: &str) -> bool {
        self.needle.is_empty() || method.to_lowercase().contains(&self.needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{report, report_json_from_ticks, two_tick_report};
    use proptest::prelude::*;

    #[test]
    fn union_of_keys_in_first_seen_order() {
        let catalog = all_methods(&two_tick_report());
        assert_eq!(catalog.as_slice(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn later_ticks_only_add_new_methods() {
        let catalog = all_methods(&report());
        assert_eq!(
            catalog.as_slice(),
            [
                "net.minecraft.Entity.tick".to_string(),
                "net.minecraft.World.getBlockState".to_string(),
                "org.bukkit.Scheduler.run".to_string(),
            ]
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let report = report();
        assert_eq!(all_methods(&report), all_methods(&report));
    }

    #[test]
    fn filter_is_case_insensitive() {
        let catalog = MethodCatalog::from_methods(["org.foo.Bar", "com.baz.Qux"]);
        assert_eq!(filter_methods(&catalog, "BAZ"), vec!["com.baz.Qux"]);
    }

    #[test]
    fn empty_query_returns_catalog_unchanged() {
        let catalog = all_methods(&report());
        let all: Vec<&str> = catalog.iter().collect();
        assert_eq!(filter_methods(&catalog, ""), all);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let catalog = all_methods(&report());
        assert!(filter_methods(&catalog, "zzz-not-there").is_empty());
    }

    #[test]
    fn filter_on_empty_catalog() {
        let catalog = MethodCatalog::default();
        assert!(filter_methods(&catalog, "").is_empty());
        assert!(filter_methods(&catalog, "x").is_empty());
    }

    #[test]
    fn from_methods_drops_duplicates() {
        let catalog = MethodCatalog::from_methods(["a", "b", "a"]);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("b"));
    }

    fn arb_ticks() -> impl Strategy<Value = Vec<(u64, Vec<(String, u64)>)>> {
        prop::collection::vec(
            prop::collection::vec(("[a-cA-C.]{1,4}", 0u64..50), 0..5),
            0..6,
        )
        .prop_map(|ticks| {
            ticks
                .into_iter()
                .enumerate()
                .map(|(i, counts)| (i as u64 * 2, counts))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_filter_is_ordered_subsequence(ticks in arb_ticks(), query in "[a-cA-C.]{0,2}") {
            let report = crate::Report::from_value(report_json_from_ticks(&ticks)).expect("report");
            let catalog = all_methods(&report);
            let filtered = filter_methods(&catalog, &query);

            let mut rest = catalog.iter();
            for m in &filtered {
                prop_assert!(rest.any(|c| c == *m), "{m} out of order or missing");
                prop_assert!(m.to_lowercase().contains(&query.to_lowercase()));
            }

            let everything: Vec<&str> = catalog.iter().collect();
            prop_assert_eq!(filter_methods(&catalog, ""), everything);
        }

        #[test]
        fn prop_catalog_has_no_duplicates(ticks in arb_ticks()) {
            let report = crate::Report::from_value(report_json_from_ticks(&ticks)).expect("report");
            let catalog = all_methods(&report);
            let unique: HashSet<&str> = catalog.iter().collect();
            prop_assert_eq!(unique.len(), catalog.len());
        }
    }
}
