//! Provides functions to parse input IP addresses, CIDRs or files.
//!
//! Expansion happens entirely before any probe is dispatched; the scanner
//! itself only ever sees the resulting list of plain addresses.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use cidr_utils::cidr::IpCidr;
use futures::stream::{self, StreamExt};
use hickory_resolver::{
    config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts},
    TokioAsyncResolver,
};
use tokio::{fs, io};

use crate::input::PortsOpts;
use crate::warning;

/// Parses the string(s) into IP addresses.
///
/// Each input is tried as a CIDR or single IP first, then as a resolvable
/// hostname, and finally as a newline-delimited file of either. Inputs that
/// expand to nothing are reported and skipped.
pub async fn parse_addresses(input: &PortsOpts) -> Vec<IpAddr> {
    let resolver = get_resolver(input.resolver.as_ref()).await;
    let mut ips = Vec::new();

    for address in &input.addresses {
        let parsed = parse_address(address, &resolver).await;
        if parsed.is_empty() {
            match read_ips_from_file(address, &resolver).await {
                Ok(file_ips) if !file_ips.is_empty() => ips.extend(file_ips),
                _ => warning!(
                    format!("Host {address:?} could not be resolved."),
                    input.greppable,
                    input.accessible
                ),
            }
        } else {
            ips.extend(parsed);
        }
    }

    ips
}

/// Given a string, parse it as a CIDR, IP address, or resolvable host.
pub async fn parse_address(address: &str, resolver: &TokioAsyncResolver) -> Vec<IpAddr> {
    match IpCidr::from_str(address) {
        Ok(cidr) => cidr.iter().map(|c| c.address()).collect(),
        Err(_) => resolve_ips_from_host(address, resolver).await,
    }
}

/// Uses DNS to get the IPs associated with host
async fn resolve_ips_from_host(source: &str, backup_resolver: &TokioAsyncResolver) -> Vec<IpAddr> {
    if let Ok(addrs) = tokio::net::lookup_host((source, 80)).await {
        addrs.map(|addr| addr.ip()).collect()
    } else if let Ok(addrs) = backup_resolver.lookup_ip(source).await {
        addrs.iter().collect()
    } else {
        Vec::new()
    }
}

/// Derive a DNS resolver.
///
/// 1. if the `resolver` parameter has been set:
///     1. assume the parameter is a path and attempt to read IPs.
///     2. parse the input as a comma-separated list of IPs.
/// 2. if `resolver` is not set:
///    1. attempt to derive a resolver from the system config. (e.g.
///       `/etc/resolv.conf` on *nix).
///    2. finally, build a CloudFlare-based resolver (default
///       behaviour).
async fn get_resolver(resolver: Option<&String>) -> TokioAsyncResolver {
    match resolver {
        Some(r) => {
            let mut config = ResolverConfig::new();
            let resolver_ips = match read_resolver_from_file(r).await {
                Ok(ips) => ips,
                Err(_) => r
                    .split(',')
                    .filter_map(|r| IpAddr::from_str(r).ok())
                    .collect::<Vec<_>>(),
            };
            for ip in resolver_ips {
                config.add_name_server(NameServerConfig::new(
                    SocketAddr::new(ip, 53),
                    Protocol::Udp,
                ));
            }
            TokioAsyncResolver::tokio(config, ResolverOpts::default())
        }
        None => TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|_| {
            TokioAsyncResolver::tokio(ResolverConfig::cloudflare_tls(), ResolverOpts::default())
        }),
    }
}

/// Parses an input file of IPs for use in DNS resolution.
async fn read_resolver_from_file(path: &str) -> io::Result<Vec<IpAddr>> {
    let ips = fs::read_to_string(path)
        .await?
        .lines()
        .filter_map(|line| IpAddr::from_str(line.trim()).ok())
        .collect();

    Ok(ips)
}

/// Parses an input file of IPs, CIDRs or hosts and expands each line.
async fn read_ips_from_file(
    path: &str,
    backup_resolver: &TokioAsyncResolver,
) -> io::Result<Vec<IpAddr>> {
    let content = fs::read_to_string(path).await?;
    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect();

    let ips: Vec<Vec<IpAddr>> = stream::iter(lines)
        .map(move |line| async move { parse_address(&line, backup_resolver).await })
        .buffer_unordered(4)
        .collect()
        .await;

    Ok(ips.into_iter().flatten().collect())
}
