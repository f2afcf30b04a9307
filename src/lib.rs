//! This crate exposes the internal functionality of the netrecon
//! reconnaissance tool.
//!
//! netrecon answers two questions about infrastructure you are authorized to
//! test: which hosts in a range respond on a set of TCP ports, and whether a
//! URL's query parameters leak database error signatures when fed SQL
//! injection payloads. Both answers come from the same engine — a bounded
//! pool of concurrent probes that collects results as they complete and
//! never lets one hung target stall the batch.
//!
//! ## Architecture Overview
//!
//! 1. **Input Processing**: addresses, ports and URLs are parsed and
//!    validated before any probe is dispatched
//! 2. **Probe Scheduling**: [`probe::ProbePool`] fans descriptors out across
//!    a fixed worker budget
//! 3. **Probing**: [`scanner::Scanner`] attempts timed TCP connects;
//!    [`injection::InjectionScanner`] issues payload-carrying GET requests
//! 4. **Aggregation**: [`summary`] folds raw results into per-host and
//!    per-scan views
//!
//! ## Basic Usage Example
//!
//! ```no_run
//! use std::net::IpAddr;
//! use std::time::Duration;
//!
//! use netrecon::input::ScanOrder;
//! use netrecon::scanner::Scanner;
//! use netrecon::summary::summarize_hosts;
//!
//! #[tokio::main]
//! async fn main() {
//!     let addrs: Vec<IpAddr> = vec!["127.0.0.1".parse().unwrap()];
//!
//!     let scanner = Scanner::new(
//!         &addrs,                      // Target IP addresses
//!         vec![22, 80, 443],           // Ports to probe on each host
//!         50,                          // Worker budget (probes in flight)
//!         Duration::from_secs(1),      // Per-connection timeout
//!         ScanOrder::Serial,           // Probe the port list as given
//!         true,                        // Greppable output (quiet mode)
//!         true,                        // Accessibility mode
//!     );
//!
//!     let probes = scanner.run().await;
//!
//!     for host in summarize_hosts(&probes) {
//!         println!("{} is alive: {:?}", host.host, host.open_ports);
//!     }
//! }
//! ```
#![allow(clippy::needless_doctest_main)]

pub mod tui;

pub mod input;

pub mod address;

pub mod probe;

pub mod scanner;

pub mod injection;

pub mod summary;
