//! Provides a means to read, parse and hold configuration options for scans.
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_derive::Deserialize;
use std::fs;
use std::path::PathBuf;

const LOWEST_PORT_NUMBER: u16 = 1;
const TOP_PORT_NUMBER: u16 = 65535;

/// Ports probed when no list is given: the usual remote-access, mail, web
/// and database suspects.
pub const DEFAULT_PORTS: [u16; 11] = [21, 22, 23, 25, 80, 443, 445, 3306, 3389, 8080, 8443];

/// Represents the order in which the port list will be probed.
///   - Serial will probe the list exactly as given.
///   - Random will shuffle the list before probing.
#[derive(Deserialize, Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    Serial,
    Random,
}

pub type Ports = Vec<u16>;

pub fn parse_ports_and_ranges(input: &str) -> Result<Ports, String> {
    let mut ports = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if part.contains('-') {
            let range_ports = parse_port_range(part)?;
            ports.extend(range_ports);
        } else {
            let port = parse_single_port(part)?;
            ports.push(port);
        }
    }

    if ports.is_empty() {
        return Err(String::from("No valid ports or ranges provided"));
    }

    ports.sort_unstable();
    ports.dedup();

    Ok(ports)
}

fn parse_port_range(range_str: &str) -> Result<Vec<u16>, String> {
    let range_parts: Vec<&str> = range_str.split('-').collect();
    if range_parts.len() != 2 {
        return Err(format!(
            "Invalid range format '{range_str}'. Expected 'start-end'. Example: 1-1000.",
        ));
    }

    let start: u16 = range_parts[0].parse().map_err(|_| {
        format!(
            "Invalid start port '{}' in range '{range_str}'",
            range_parts[0]
        )
    })?;
    let end: u16 = range_parts[1].parse().map_err(|_| {
        format!(
            "Invalid end port '{}' in range '{range_str}'",
            range_parts[1]
        )
    })?;

    if start > end {
        return Err(format!(
            "Start port {start} is greater than end port {end} in range '{range_str}'",
        ));
    }

    if start < LOWEST_PORT_NUMBER {
        return Err(format!(
            "Ports in range '{range_str}' must be between {LOWEST_PORT_NUMBER} and {TOP_PORT_NUMBER}",
        ));
    }

    Ok((start..=end).collect())
}

fn parse_single_port(port_str: &str) -> Result<u16, String> {
    let port: u16 = port_str
        .parse()
        .map_err(|_| format!("Invalid port number '{port_str}'"))?;

    if port < LOWEST_PORT_NUMBER {
        return Err(format!(
            "Port {port} must be between {LOWEST_PORT_NUMBER} and {TOP_PORT_NUMBER}",
        ));
    }

    Ok(port)
}

fn parse_connect_timeout(input: &str) -> Result<f64, String> {
    let seconds: f64 = input
        .parse()
        .map_err(|_| format!("Invalid timeout '{input}'. Expected seconds, e.g. 1.5"))?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("Timeout must be a positive number, got '{input}'"));
    }

    Ok(seconds)
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "netrecon",
    version = env!("CARGO_PKG_VERSION"),
    max_term_width = 120,
    help_template = "{bin} {version}\n{about}\n\nUSAGE:\n    {usage}\n\nOPTIONS:\n{options}\n\nCOMMANDS:\n{subcommands}",
)]
/// Active reconnaissance toolkit: TCP reachability sweeps and SQL injection
/// probing, both driven by the same bounded worker pool.
/// WARNING Only point this at infrastructure you are authorized to test.
pub struct Opts {
    /// Whether to ignore the configuration file or not.
    #[arg(short, long)]
    pub no_config: bool,

    /// Custom path to config file
    #[arg(short, long, value_parser)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sweep an address range for hosts answering on a set of TCP ports.
    Ports(PortsOpts),
    /// Probe a URL's query parameters for SQL error signatures.
    Sqli(SqliOpts),
}

#[derive(Args, Debug, Clone)]
pub struct PortsOpts {
    /// A comma-delimited list or newline-delimited file of separated CIDRs, IPs, or hosts to be scanned.
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub addresses: Vec<String>,

    /// A list of ports and/or port ranges to probe. Examples: 80,443,8080 or 1-1000,8080
    #[arg(short, long, value_parser = parse_ports_and_ranges)]
    pub ports: Option<Ports>,

    /// The number of seconds to wait on each connection attempt before the
    /// port is assumed to be closed.
    #[arg(short, long, value_parser = parse_connect_timeout, default_value = "1.0")]
    pub timeout: f64,

    /// The maximum number of connection attempts in flight at once.
    #[arg(short, long, default_value = "50")]
    pub workers: usize,

    /// The order of probing to be performed. The "serial" option will probe
    /// the port list as given while the "random" option will shuffle it.
    #[arg(long, value_enum, ignore_case = true, default_value = "serial")]
    pub scan_order: ScanOrder,

    /// A comma-delimited list or file of DNS resolvers.
    #[arg(long)]
    pub resolver: Option<String>,

    /// Greppable mode. Only output open sockets and summaries. Useful for grep or outputting to a file.
    #[arg(short, long)]
    pub greppable: bool,

    /// Accessible mode. Turns off features which negatively affect screen readers.
    #[arg(long)]
    pub accessible: bool,

    /// Print host summaries as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SqliOpts {
    /// The URL to test, including its query string. Example: http://example.com/page?id=1
    pub url: String,

    /// The number of seconds to wait for each request.
    #[arg(short, long, default_value = "10")]
    pub timeout: u64,

    /// The maximum number of requests in flight at once.
    #[arg(short, long, default_value = "5")]
    pub workers: usize,

    /// Leave out payloads that would modify data on a vulnerable target.
    #[arg(long)]
    pub safe: bool,

    /// Greppable mode. Only output findings and summaries.
    #[arg(short, long)]
    pub greppable: bool,

    /// Accessible mode. Turns off features which negatively affect screen readers.
    #[arg(long)]
    pub accessible: bool,

    /// Print the scan summary as JSON.
    #[arg(long)]
    pub json: bool,
}

#[cfg(not(tarpaulin_include))]
impl Opts {
    pub fn read() -> Self {
        Opts::parse()
    }

    /// Merges values found within the user configuration file into the
    /// command line arguments.
    pub fn merge(&mut self, config: &Config) {
        if self.no_config {
            return;
        }

        match &mut self.command {
            Command::Ports(opts) => opts.merge(config),
            Command::Sqli(opts) => opts.merge(config),
        }
    }
}

macro_rules! merge_configured {
    ($opts:expr, $config:expr, $($field:ident => $source:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$config.$source {
                $opts.$field = value.clone();
            }
        )+
    };
}

impl PortsOpts {
    fn merge(&mut self, config: &Config) {
        merge_configured!(
            self, config,
            timeout => timeout,
            workers => workers,
            scan_order => scan_order,
            greppable => greppable,
            accessible => accessible,
        );
        if config.ports.is_some() {
            self.ports.clone_from(&config.ports);
        }
        if config.resolver.is_some() {
            self.resolver.clone_from(&config.resolver);
        }
    }
}

impl SqliOpts {
    fn merge(&mut self, config: &Config) {
        merge_configured!(
            self, config,
            timeout => sqli_timeout,
            workers => sqli_workers,
            safe => safe,
            greppable => greppable,
            accessible => accessible,
        );
    }
}

/// Struct used to deserialize the options specified within our config file.
/// These will be further merged with our command line arguments in order to
/// generate the final scan options.
#[cfg(not(tarpaulin_include))]
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    ports: Option<Vec<u16>>,
    timeout: Option<f64>,
    workers: Option<usize>,
    scan_order: Option<ScanOrder>,
    resolver: Option<String>,
    greppable: Option<bool>,
    accessible: Option<bool>,
    sqli_timeout: Option<u64>,
    sqli_workers: Option<usize>,
    safe: Option<bool>,
}

#[cfg(not(tarpaulin_include))]
impl Config {
    /// Reads the configuration file with TOML format and parses it into a
    /// Config struct.
    ///
    /// # Format
    ///
    /// ports = [80, 443, 8080]
    /// timeout = 1.0
    /// workers = 50
    /// scan_order = "Serial"
    /// greppable = true
    /// sqli_timeout = 10
    /// sqli_workers = 5
    /// safe = false
    ///
    pub fn read(custom_config_path: Option<PathBuf>) -> Self {
        let mut content = String::new();
        let config_path = custom_config_path.unwrap_or_else(default_config_path);
        if config_path.exists() {
            content = fs::read_to_string(config_path).unwrap_or_default();
        }

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                println!("Found {e} in configuration file.\nAborting scan.\n");
                std::process::exit(1);
            }
        }
    }
}

/// Constructs default path to config toml
pub fn default_config_path() -> PathBuf {
    let Some(mut config_path) = dirs::home_dir() else {
        panic!("Could not infer config file path.");
    };
    config_path.push(".netrecon.toml");
    config_path
}
