//! Command line driver: validates input, runs the requested scan and
//! renders the aggregated results.
use std::process::exit;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::debug;
use url::Url;

use netrecon::address::parse_addresses;
use netrecon::injection::signatures::{default_payloads, SignatureTable};
use netrecon::injection::InjectionScanner;
use netrecon::input::{Command, Config, Opts, PortsOpts, SqliOpts, DEFAULT_PORTS};
use netrecon::scanner::Scanner;
use netrecon::summary::{summarize_hosts, ScanSummary};
use netrecon::{detail, output, warning};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut opts = Opts::read();
    let config = Config::read(opts.config_path.clone());
    opts.merge(&config);

    debug!("Main() `opts` arguments are {opts:?}");

    match opts.command {
        Command::Ports(opts) => run_ports_scan(opts).await,
        Command::Sqli(opts) => run_injection_scan(opts).await,
    }
}

async fn run_ports_scan(opts: PortsOpts) -> Result<()> {
    let ips = parse_addresses(&opts).await;

    if ips.is_empty() {
        warning!(
            "No IPs could be resolved, aborting scan.",
            opts.greppable,
            opts.accessible
        );
        exit(1);
    }

    let ports = opts
        .ports
        .clone()
        .unwrap_or_else(|| DEFAULT_PORTS.to_vec());

    detail!(
        format!("Scanning {} host(s) on ports {ports:?}", ips.len()),
        opts.greppable,
        opts.accessible
    );

    let scanner = Scanner::new(
        &ips,
        ports,
        opts.workers,
        Duration::from_secs_f64(opts.timeout),
        opts.scan_order,
        opts.greppable,
        opts.accessible,
    );

    let started = Instant::now();
    let probes = scanner.run().await;
    let summaries = summarize_hosts(&probes);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for host in &summaries {
        if opts.greppable {
            println!("{} -> {:?}", host.host, host.open_ports);
        } else {
            output!(
                format!(
                    "Active host {}: {} open port(s) {:?}",
                    host.host,
                    host.open_ports.len(),
                    host.open_ports
                ),
                opts.greppable,
                opts.accessible
            );
        }
    }

    detail!(
        format!(
            "Scan complete in {:.2}s. Active hosts found: {}",
            started.elapsed().as_secs_f64(),
            summaries.len()
        ),
        opts.greppable,
        opts.accessible
    );

    Ok(())
}

async fn run_injection_scan(opts: SqliOpts) -> Result<()> {
    let url = match Url::parse(&opts.url) {
        Ok(url) if url.has_host() => url,
        _ => {
            warning!(
                format!("Invalid URL format {:?}", opts.url),
                opts.greppable,
                opts.accessible
            );
            exit(1);
        }
    };

    let scanner = InjectionScanner::new(
        Duration::from_secs(opts.timeout),
        opts.workers,
        default_payloads(!opts.safe),
        SignatureTable::builtin(),
        opts.greppable,
        opts.accessible,
    )?;

    detail!(
        format!("Scanning: {url}"),
        opts.greppable,
        opts.accessible
    );

    let started = Instant::now();
    let summary = match scanner.scan_url(&url).await {
        Ok(summary) => summary,
        Err(e) => {
            warning!(format!("{e}"), opts.greppable, opts.accessible);
            exit(1);
        }
    };

    report_injection_scan(&summary, &opts, started.elapsed())
}

fn report_injection_scan(summary: &ScanSummary, opts: &SqliOpts, elapsed: Duration) -> Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    if opts.greppable {
        for finding in &summary.vulnerabilities {
            println!(
                "{}\t{}\t{}",
                finding.parameter,
                finding.category.as_deref().unwrap_or("unknown"),
                finding.payload
            );
        }
        return Ok(());
    }

    if summary.vulnerabilities.is_empty() {
        output!(
            "No vulnerabilities detected",
            opts.greppable,
            opts.accessible
        );
    } else {
        warning!(
            format!(
                "Found {} potential vulnerabilities",
                summary.vulnerabilities.len()
            ),
            opts.greppable,
            opts.accessible
        );
    }

    detail!(
        format!(
            "Tested {} combinations in {:.2}s",
            summary.total_tested,
            elapsed.as_secs_f64()
        ),
        opts.greppable,
        opts.accessible
    );

    Ok(())
}
