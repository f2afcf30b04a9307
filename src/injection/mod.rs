//! HTTP probing of URL query parameters for SQL error signatures.
//!
//! Each probe swaps one parameter's value for a candidate payload, issues a
//! GET through a client shared across the scan, and classifies the body
//! against the signature table. A failing request is a clean result, never a
//! failed batch.
use log::debug;

use std::time::Instant;

use anyhow::{ensure, Context, Result};
use futures::StreamExt;
use reqwest::{redirect, Client};
use std::pin::pin;
use std::time::Duration;
use url::Url;

use crate::probe::ProbePool;
use crate::summary::{InjectionResult, ScanSummary};
use crate::{detail, warning};

pub mod signatures;

pub use signatures::SignatureTable;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// One parameter/payload combination scheduled against a URL. Carries its
/// own snapshot of the original URL, so workers never share mutable state.
#[derive(Debug, Clone)]
pub struct InjectionProbe {
    pub base: Url,
    pub parameter: String,
    pub payload: String,
}

/// The injection sweep over a single URL's query parameters.
///
/// Owns the HTTP client for exactly one scan: the connection pool is reused
/// across all probes of that scan and released when the scanner is dropped.
/// Run concurrent scans with separate scanners.
pub struct InjectionScanner {
    client: Client,
    pool: ProbePool,
    payloads: Vec<String>,
    signatures: SignatureTable,
    greppable: bool,
    accessible: bool,
}

impl InjectionScanner {
    /// Builds the scanner and its HTTP client. Client construction is the
    /// one fatal setup point of this path; everything after it degrades
    /// per-probe.
    pub fn new(
        timeout: Duration,
        max_workers: usize,
        payloads: Vec<String>,
        signatures: SignatureTable,
        greppable: bool,
        accessible: bool,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::limited(4))
            .timeout(timeout)
            .build()
            .context("could not build the HTTP client")?;

        Ok(Self {
            client,
            pool: ProbePool::new(max_workers),
            payloads,
            signatures,
            greppable,
            accessible,
        })
    }

    /// Tests every parameter/payload combination of `url` and returns the
    /// accumulated summary. Findings are printed as they arrive.
    pub async fn scan_url(&self, url: &Url) -> Result<ScanSummary> {
        let parameters = parameter_names(url);
        ensure!(
            !parameters.is_empty(),
            "No query parameters found in URL {url}"
        );

        let descriptors: Vec<InjectionProbe> = parameters
            .iter()
            .flat_map(|parameter| {
                self.payloads.iter().map(move |payload| InjectionProbe {
                    base: url.clone(),
                    parameter: parameter.clone(),
                    payload: payload.clone(),
                })
            })
            .collect();

        detail!(
            format!(
                "Testing {} combinations across {} parameters",
                descriptors.len(),
                parameters.len()
            ),
            self.greppable,
            self.accessible
        );

        let mut summary = ScanSummary::new(url.as_str());
        let mut results = pin!(self
            .pool
            .stream(descriptors, |probe| self.test_payload(probe)));

        while let Some(result) = results.next().await {
            if result.vulnerable {
                warning!(
                    format!(
                        "VULNERABLE - parameter: {}, payload: '{}', db type: {}",
                        result.parameter,
                        result.payload,
                        result.category.as_deref().unwrap_or("unknown")
                    ),
                    self.greppable,
                    self.accessible
                );
            }
            summary.record(result);
        }

        Ok(summary)
    }

    /// Issues one GET with the payload substituted in and classifies the
    /// response. Transport failures of any kind collapse to a clean result
    /// with no timing, logged at debug level only.
    async fn test_payload(&self, probe: InjectionProbe) -> InjectionResult {
        let target = inject_payload(&probe.base, &probe.parameter, &probe.payload);
        let started = Instant::now();

        match self.fetch(target).await {
            Ok(body) => {
                let elapsed = started.elapsed();
                let category = self.signatures.classify(&body);
                InjectionResult {
                    vulnerable: category.is_some(),
                    category: category.map(str::to_owned),
                    parameter: probe.parameter,
                    payload: probe.payload,
                    elapsed: Some(elapsed),
                }
            }
            Err(e) => {
                debug!(
                    "Request for parameter {} with payload {:?} failed: {}",
                    probe.parameter, probe.payload, e
                );
                InjectionResult {
                    parameter: probe.parameter,
                    payload: probe.payload,
                    vulnerable: false,
                    category: None,
                    elapsed: None,
                }
            }
        }
    }

    async fn fetch(&self, url: Url) -> reqwest::Result<String> {
        self.client.get(url).send().await?.text().await
    }
}

/// Query parameter names in first-appearance order.
#[must_use]
pub fn parameter_names(url: &Url) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for (name, _) in url.query_pairs() {
        if !names.iter().any(|seen| *seen == name) {
            names.push(name.into_owned());
        }
    }

    names
}

/// Rebuilds `base` with the target parameter's value replaced by the
/// payload, percent-encoded per standard query rules.
///
/// All other parameters keep their order and values. Repeated occurrences of
/// the target parameter collapse into the single injected one.
#[must_use]
pub fn inject_payload(base: &Url, parameter: &str, payload: &str) -> Url {
    let pairs: Vec<(String, String)> = base.query_pairs().into_owned().collect();
    let mut url = base.clone();

    {
        let mut query = url.query_pairs_mut();
        query.clear();

        let mut injected = false;
        for (name, value) in &pairs {
            if name == parameter {
                if !injected {
                    query.append_pair(name, payload);
                    injected = true;
                }
            } else {
                query.append_pair(name, value);
            }
        }
    }

    url
}
