//! Self-contained probe outcomes and their per-target aggregation.
//!
//! Results are plain value records: once a worker emits one it carries
//! everything needed for grouping, so aggregation can run in arrival order
//! without any synchronization against the probes that produced it.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::time::Duration;

use serde_derive::Serialize;

/// Outcome of a single TCP connect attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortProbe {
    pub host: IpAddr,
    pub port: u16,
    pub open: bool,
}

/// Outcome of testing one payload against one query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionResult {
    pub parameter: String,
    pub payload: String,
    pub vulnerable: bool,
    /// Database engine whose error signature matched, when one did.
    pub category: Option<String>,
    /// Round-trip time of the request; absent when transport failed.
    pub elapsed: Option<Duration>,
}

/// Per-host view of a reachability sweep: which tested ports answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSummary {
    pub host: IpAddr,
    pub open_ports: Vec<u16>,
}

impl HostSummary {
    /// A host is alive when at least one tested port accepted a connection.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.open_ports.is_empty()
    }
}

/// Folds connect outcomes into one summary per live host.
///
/// Hosts where nothing answered are omitted entirely; absence from the
/// output is the "not alive" signal. Ports are sorted and deduplicated, and
/// hosts come back in address order regardless of probe completion order.
#[must_use]
pub fn summarize_hosts(probes: &[PortProbe]) -> Vec<HostSummary> {
    let mut open_by_host: BTreeMap<IpAddr, BTreeSet<u16>> = BTreeMap::new();

    for probe in probes.iter().filter(|probe| probe.open) {
        open_by_host.entry(probe.host).or_default().insert(probe.port);
    }

    open_by_host
        .into_iter()
        .map(|(host, ports)| HostSummary {
            host,
            open_ports: ports.into_iter().collect(),
        })
        .collect()
}

/// Running record of one injection scan against a single URL.
///
/// Every probe outcome lands in `results`; the vulnerable subset is kept in
/// a parallel list since that is the actionable output.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub target: String,
    pub total_tested: usize,
    pub results: Vec<InjectionResult>,
    pub vulnerabilities: Vec<InjectionResult>,
}

impl ScanSummary {
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            total_tested: 0,
            results: Vec::new(),
            vulnerabilities: Vec::new(),
        }
    }

    pub fn record(&mut self, result: InjectionResult) {
        self.total_tested += 1;
        if result.vulnerable {
            self.vulnerabilities.push(result.clone());
        }
        self.results.push(result);
    }
}
