//! Host table -- container/network to IP + domain records.
//!
//! [`HostTable`] is the authoritative in-memory state of the daemon. It is
//! owned by the event loop and only exposed to the renderer through
//! [`HostSnapshot`], a cloned view taken between mutations.
//!
//! Iteration order is ascending container id, then ascending network name,
//! so the same table state always renders to the same text.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::DomainRules;

/// One network attachment of one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostRecord {
    /// IP address on the network
    pub ip_address: String,
    /// Normalized domains, unique, in insertion order
    pub domains: Vec<String>,
}

impl HostRecord {
    fn push_unique(&mut self, domain: String) -> bool {
        if self.domains.contains(&domain) {
            return false;
        }
        self.domains.push(domain);
        true
    }
}

type NetworkMap = BTreeMap<String, HostRecord>;

/// Container id -> network name -> [`HostRecord`].
#[derive(Debug, Default)]
pub struct HostTable {
    rules: DomainRules,
    containers: BTreeMap<String, NetworkMap>,
}

impl HostTable {
    /// Creates an empty table that normalizes domains with `rules`.
    pub fn new(rules: DomainRules) -> Self {
        Self {
            rules,
            containers: BTreeMap::new(),
        }
    }

    /// Returns the normalization rules.
    pub fn rules(&self) -> &DomainRules {
        &self.rules
    }

    /// Replaces the record for `(container_id, network)` wholesale.
    ///
    /// `domains` are raw candidates: absent or empty values are skipped, the
    /// rest are normalized and deduplicated. Domain lists are never merged
    /// across calls.
    pub fn upsert<I, S>(&mut self, container_id: &str, network: &str, ip: &str, domains: I)
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let record = HostRecord {
            ip_address: ip.to_owned(),
            domains: self.rules.normalize_all(domains),
        };
        self.containers
            .entry(container_id.to_owned())
            .or_default()
            .insert(network.to_owned(), record);
    }

    /// Merges a single domain into the record for `(container_id, network)`.
    ///
    /// An existing record gets the normalized domain appended if it is not
    /// already present and takes `ip` as its address. Otherwise a new record
    /// is created. Returns `true` if the table changed.
    pub fn add_domain(&mut self, container_id: &str, network: &str, ip: &str, domain: &str) -> bool {
        if domain.is_empty() {
            return false;
        }
        let domain = self.rules.normalize(domain);
        let networks = self.containers.entry(container_id.to_owned()).or_default();

        match networks.get_mut(network) {
            Some(record) => {
                let ip_changed = record.ip_address != ip;
                if ip_changed {
                    record.ip_address = ip.to_owned();
                }
                record.push_unique(domain) || ip_changed
            }
            None => {
                networks.insert(
                    network.to_owned(),
                    HostRecord {
                        ip_address: ip.to_owned(),
                        domains: vec![domain],
                    },
                );
                true
            }
        }
    }

    /// Removes every network of a container. Returns `true` if it was present.
    pub fn remove(&mut self, container_id: &str) -> bool {
        self.containers.remove(container_id).is_some()
    }

    /// Removes a single network record.
    ///
    /// The container entry is dropped once its last network is gone.
    /// Unknown keys are a no-op. Returns `true` if a record was removed.
    pub fn remove_network(&mut self, container_id: &str, network: &str) -> bool {
        let Some(networks) = self.containers.get_mut(container_id) else {
            return false;
        };
        let removed = networks.remove(network).is_some();
        if networks.is_empty() {
            self.containers.remove(container_id);
        }
        removed
    }

    /// Drops every record. Used before a full rescan.
    pub fn clear(&mut self) {
        self.containers.clear();
    }

    /// Looks up a single record.
    pub fn get(&self, container_id: &str, network: &str) -> Option<&HostRecord> {
        self.containers.get(container_id)?.get(network)
    }

    /// Returns `true` if the container has at least one record.
    pub fn contains(&self, container_id: &str) -> bool {
        self.containers.contains_key(container_id)
    }

    /// Container ids in iteration order.
    pub fn container_ids(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(String::as_str)
    }

    /// Number of containers.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Number of (container, network) records.
    pub fn record_count(&self) -> usize {
        self.containers.values().map(BTreeMap::len).sum()
    }

    /// True when no container is tracked.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Takes a consistent read-only copy for rendering.
    pub fn snapshot(&self) -> HostSnapshot {
        HostSnapshot {
            containers: self.containers.clone(),
        }
    }
}

/// Read-only view of a [`HostTable`] at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HostSnapshot {
    containers: BTreeMap<String, NetworkMap>,
}

impl HostSnapshot {
    /// Iterates `(container_id, network, record)` in table order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &str, &HostRecord)> {
        self.containers.iter().flat_map(|(container_id, networks)| {
            networks
                .iter()
                .map(move |(network, record)| (container_id.as_str(), network.as_str(), record))
        })
    }

    /// Number of containers in the snapshot.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// True when the snapshot holds no containers.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Serializes the snapshot as compact JSON for debug logging.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> HostTable {
        HostTable::new(DomainRules::new("", ".docker"))
    }

    #[test]
    fn upsert_normalizes_and_dedups() {
        let mut t = table();
        t.upsert("c1", "bridge", "172.17.0.2", [Some("web"), Some("web.docker"), None, Some("")]);

        let record = t.get("c1", "bridge").unwrap();
        assert_eq!(record.ip_address, "172.17.0.2");
        assert_eq!(record.domains, vec!["web.docker"]);
    }

    #[test]
    fn upsert_replaces_instead_of_merging() {
        let mut t = table();
        t.upsert("c1", "bridge", "172.17.0.2", [Some("web"), Some("api")]);
        t.upsert("c1", "bridge", "172.17.0.3", [Some("db")]);

        let record = t.get("c1", "bridge").unwrap();
        assert_eq!(record.ip_address, "172.17.0.3");
        assert_eq!(record.domains, vec!["db.docker"]);
        assert_eq!(t.record_count(), 1);
    }

    #[test]
    fn upsert_keeps_other_networks() {
        let mut t = table();
        t.upsert("c1", "front", "10.0.0.2", [Some("web")]);
        t.upsert("c1", "back", "10.1.0.2", [Some("web")]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.record_count(), 2);
    }

    #[test]
    fn add_domain_merges_into_existing_record() {
        let mut t = table();
        assert!(t.add_domain("c1", "bridge", "172.17.0.2", "web"));
        assert!(t.add_domain("c1", "bridge", "172.17.0.2", "api"));
        assert!(!t.add_domain("c1", "bridge", "172.17.0.2", "web.docker"));

        let record = t.get("c1", "bridge").unwrap();
        assert_eq!(record.domains, vec!["web.docker", "api.docker"]);
    }

    #[test]
    fn add_domain_creates_record_for_new_network() {
        let mut t = table();
        t.add_domain("c1", "front", "10.0.0.2", "web");
        t.add_domain("c1", "back", "10.1.0.2", "web");
        assert_eq!(t.record_count(), 2);
        assert_eq!(t.get("c1", "back").unwrap().ip_address, "10.1.0.2");
    }

    #[test]
    fn add_domain_updates_ip() {
        let mut t = table();
        t.add_domain("c1", "bridge", "172.17.0.2", "web");
        assert!(t.add_domain("c1", "bridge", "172.17.0.9", "web"));
        assert_eq!(t.get("c1", "bridge").unwrap().ip_address, "172.17.0.9");
    }

    #[test]
    fn add_empty_domain_is_noop() {
        let mut t = table();
        assert!(!t.add_domain("c1", "bridge", "172.17.0.2", ""));
        assert!(t.is_empty());
    }

    #[test]
    fn remove_drops_all_networks() {
        let mut t = table();
        t.upsert("c1", "front", "10.0.0.2", [Some("web")]);
        t.upsert("c1", "back", "10.1.0.2", [Some("web")]);
        t.upsert("c2", "front", "10.0.0.3", [Some("db")]);

        assert!(t.remove("c1"));
        assert!(!t.contains("c1"));
        assert!(t.contains("c2"));
        assert!(!t.remove("c1"));
    }

    #[test]
    fn remove_network_drops_empty_container() {
        let mut t = table();
        t.upsert("c1", "front", "10.0.0.2", [Some("web")]);
        t.upsert("c1", "back", "10.1.0.2", [Some("web")]);

        assert!(t.remove_network("c1", "front"));
        assert!(t.contains("c1"));
        assert!(t.remove_network("c1", "back"));
        assert!(!t.contains("c1"));
        assert!(t.is_empty());
    }

    #[test]
    fn remove_network_unknown_key_is_noop() {
        let mut t = table();
        t.upsert("c1", "front", "10.0.0.2", [Some("web")]);

        assert!(!t.remove_network("c1", "missing"));
        assert!(!t.remove_network("missing", "front"));
        assert_eq!(t.record_count(), 1);
    }

    #[test]
    fn clear_empties_the_table() {
        let mut t = table();
        t.upsert("c1", "front", "10.0.0.2", [Some("web")]);
        t.upsert("c2", "front", "10.0.0.3", [Some("db")]);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.record_count(), 0);
    }

    #[test]
    fn snapshot_is_independent_of_later_mutations() {
        let mut t = table();
        t.upsert("c1", "bridge", "172.17.0.2", [Some("web")]);
        let snap = t.snapshot();
        t.remove("c1");

        assert_eq!(snap.records().count(), 1);
        assert!(t.snapshot().is_empty());
    }

    #[test]
    fn snapshot_iterates_in_sorted_order() {
        let mut t = table();
        t.upsert("c2", "bridge", "10.0.0.3", [Some("b")]);
        t.upsert("c1", "zeta", "10.0.0.2", [Some("a")]);
        t.upsert("c1", "alpha", "10.1.0.2", [Some("a")]);

        let order: Vec<_> = t
            .snapshot()
            .records()
            .map(|(c, n, _)| format!("{c}/{n}"))
            .collect();
        assert_eq!(order, vec!["c1/alpha", "c1/zeta", "c2/bridge"]);
        assert_eq!(t.container_ids().collect::<Vec<_>>(), vec!["c1", "c2"]);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut t = table();
        t.upsert("c1", "bridge", "172.17.0.2", [Some("web")]);
        let json = t.snapshot().to_json();
        assert!(json.contains("\"c1\""));
        assert!(json.contains("\"ip_address\":\"172.17.0.2\""));
        assert!(json.contains("web.docker"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Upsert(u8, u8, Vec<Option<String>>),
            AddDomain(u8, u8, String),
            Remove(u8),
            RemoveNetwork(u8, u8),
        }

        fn op() -> impl Strategy<Value = Op> {
            let name = prop::option::of("[a-c]{0,2}");
            prop_oneof![
                (0u8..3, 0u8..3, prop::collection::vec(name, 0..5))
                    .prop_map(|(c, n, d)| Op::Upsert(c, n, d)),
                (0u8..3, 0u8..3, "[a-c]{0,2}").prop_map(|(c, n, d)| Op::AddDomain(c, n, d)),
                (0u8..3).prop_map(Op::Remove),
                (0u8..3, 0u8..3).prop_map(|(c, n)| Op::RemoveNetwork(c, n)),
            ]
        }

        proptest! {
            #[test]
            fn invariants_hold_for_any_sequence(ops in prop::collection::vec(op(), 0..60)) {
                let mut t = table();
                for op in ops {
                    match op {
                        Op::Upsert(c, n, d) => t.upsert(&format!("c{c}"), &format!("n{n}"), "10.0.0.1", d),
                        Op::AddDomain(c, n, d) => {
                            t.add_domain(&format!("c{c}"), &format!("n{n}"), "10.0.0.1", &d);
                        }
                        Op::Remove(c) => {
                            t.remove(&format!("c{c}"));
                        }
                        Op::RemoveNetwork(c, n) => {
                            t.remove_network(&format!("c{c}"), &format!("n{n}"));
                        }
                    }

                    for networks in t.containers.values() {
                        prop_assert!(!networks.is_empty());
                        for record in networks.values() {
                            let mut unique = record.domains.clone();
                            unique.sort();
                            unique.dedup();
                            prop_assert_eq!(unique.len(), record.domains.len());
                        }
                    }
                }
            }
        }
    }
}
