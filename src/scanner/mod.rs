//! Core functionality for actual scanning behaviour.
use log::debug;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use itertools::iproduct;
use rand::rng;
use rand::seq::SliceRandom;
use tokio::io::{self, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;

use crate::input::ScanOrder;
use crate::probe::ProbePool;
use crate::summary::PortProbe;

#[derive(Debug)]
struct Connector {
    timeout: Duration,
    greppable: bool,
    accessible: bool,
}

impl Connector {
    /// Attempts one connection and folds the outcome into a [`PortProbe`].
    ///
    /// Open means the TCP handshake completed inside the timeout; refusal,
    /// reset, unreachable and timeout all collapse to closed. The cause is
    /// only kept at debug level. An established connection is shut down
    /// immediately so no socket outlives its probe.
    async fn probe(&self, socket: SocketAddr) -> PortProbe {
        let open = match self.connect(socket).await {
            Ok(mut tcp_stream) => {
                debug!(
                    "Connection was successful, shutting down stream {}",
                    &socket
                );
                if let Err(e) = tcp_stream.shutdown().await {
                    debug!("Shutdown stream error {}", &e);
                }
                self.fmt_ports(socket);
                true
            }
            Err(e) => {
                debug!("Connection to {} failed: {}", &socket, &e);
                false
            }
        };

        PortProbe {
            host: socket.ip(),
            port: socket.port(),
            open,
        }
    }

    /// Performs the connection to the socket with timeout. A single attempt;
    /// the timeout is wall-clock per probe, never cumulative.
    async fn connect(&self, socket: SocketAddr) -> io::Result<TcpStream> {
        time::timeout(
            self.timeout,
            async move { TcpStream::connect(socket).await },
        )
        .await?
    }

    /// Formats and prints the port status
    fn fmt_ports(&self, socket: SocketAddr) {
        if !self.greppable {
            if self.accessible {
                println!("Open {socket}");
            } else {
                println!("Open {}", socket.to_string().purple());
            }
        }
    }
}

/// The reachability sweep over a set of hosts and ports.
///
/// `ips` and `ports` span the cross product of probes; `batch_size` bounds
/// how many connection attempts run at once; `timeout` is how long to wait
/// before a port is declared closed. Every (host, port) pair yields exactly
/// one [`PortProbe`], open or not.
#[derive(Debug)]
pub struct Scanner {
    ips: Box<[IpAddr]>,
    ports: Vec<u16>,
    scan_order: ScanOrder,
    pool: ProbePool,
    connector: Arc<Connector>,
}

impl Scanner {
    #[must_use]
    pub fn new(
        ips: &[IpAddr],
        ports: Vec<u16>,
        batch_size: usize,
        timeout: Duration,
        scan_order: ScanOrder,
        greppable: bool,
        accessible: bool,
    ) -> Self {
        Self {
            ips: Box::from(ips),
            ports,
            scan_order,
            pool: ProbePool::new(batch_size),
            connector: Arc::new(Connector {
                timeout,
                greppable,
                accessible,
            }),
        }
    }

    /// Probes every socket in the sweep and returns the collected results in
    /// completion order. Open ports are printed as they are found.
    pub async fn run(&self) -> Vec<PortProbe> {
        let sockets = self.sockets();

        debug!(
            "Start scanning sockets. \nBatch size {}\nNumber of ip-s {}\nNumber of ports {}\nTargets all together {} ",
            self.pool.max_workers(),
            self.ips.len(),
            self.ports.len(),
            sockets.len()
        );

        let connector = Arc::clone(&self.connector);
        let results = self
            .pool
            .run(sockets, move |socket| {
                let connector = Arc::clone(&connector);
                async move { connector.probe(socket).await }
            })
            .await;

        debug!(
            "Found {} open sockets out of {}",
            results.iter().filter(|probe| probe.open).count(),
            results.len()
        );
        results
    }

    /// Builds the host×port cross product, port-major so consecutive probes
    /// land on different hosts rather than hammering one target.
    fn sockets(&self) -> Vec<SocketAddr> {
        let mut ports = self.ports.clone();
        if self.scan_order == ScanOrder::Random {
            ports.shuffle(&mut rng());
        }

        iproduct!(ports.iter(), self.ips.iter())
            .map(|(&port, &ip)| SocketAddr::new(ip, port))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::net::IpAddr;
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn scanner(addrs: &[IpAddr], ports: Vec<u16>, timeout_ms: u64) -> Scanner {
        Scanner::new(
            addrs,
            ports,
            10,
            Duration::from_millis(timeout_ms),
            ScanOrder::Serial,
            true,
            true,
        )
    }

    #[tokio::test]
    async fn scanner_runs() {
        // Makes sure the program still runs and doesn't panic
        let addrs = vec!["127.0.0.1".parse::<IpAddr>().unwrap()];
        let scanner = scanner(&addrs, (1..=100).collect(), 100);
        scanner.run().await;
    }

    #[tokio::test]
    async fn ipv6_scanner_runs() {
        let addrs = vec!["::1".parse::<IpAddr>().unwrap()];
        let scanner = scanner(&addrs, (1..=100).collect(), 100);
        scanner.run().await;
    }

    #[tokio::test]
    async fn quad_zero_scanner_runs() {
        let addrs = vec!["0.0.0.0".parse::<IpAddr>().unwrap()];
        let scanner = scanner(&addrs, (1..=100).collect(), 100);
        scanner.run().await;
    }

    #[tokio::test]
    async fn one_result_per_socket() {
        let addrs = vec![
            "127.0.0.1".parse::<IpAddr>().unwrap(),
            "::1".parse::<IpAddr>().unwrap(),
        ];
        let ports = vec![20_001, 20_002, 20_003];
        let scanner = scanner(&addrs, ports.clone(), 100);

        let results = scanner.run().await;

        assert_eq!(results.len(), addrs.len() * ports.len());

        let seen: BTreeSet<(IpAddr, u16)> = results
            .iter()
            .map(|probe| (probe.host, probe.port))
            .collect();
        assert_eq!(seen.len(), results.len(), "no duplicates, no drops");
    }

    #[tokio::test]
    async fn listener_is_reported_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let addrs = vec!["127.0.0.1".parse::<IpAddr>().unwrap()];
        let scanner = scanner(&addrs, vec![port], 500);

        let results = scanner.run().await;

        assert_eq!(results.len(), 1);
        assert!(results[0].open);
        assert_eq!(results[0].port, port);
        drop(listener);
    }

    #[tokio::test]
    async fn unbound_port_is_reported_closed() {
        // Grab an ephemeral port and release it so nothing is listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let addrs = vec!["127.0.0.1".parse::<IpAddr>().unwrap()];
        let scanner = scanner(&addrs, vec![port], 500);

        let results = scanner.run().await;

        assert_eq!(results.len(), 1);
        assert!(!results[0].open);
    }

    #[tokio::test]
    async fn non_routable_address_times_out_as_closed() {
        // TEST-NET-2, guaranteed unassigned: the connect either hangs until
        // the timeout or fails immediately, and both must read as closed.
        let addrs = vec!["198.51.100.1".parse::<IpAddr>().unwrap()];
        let scanner = scanner(&addrs, vec![81], 200);

        let started = Instant::now();
        let results = scanner.run().await;

        assert_eq!(results.len(), 1);
        assert!(!results[0].open);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn random_order_probes_the_same_sockets() {
        let addrs = vec!["127.0.0.1".parse::<IpAddr>().unwrap()];
        let ports: Vec<u16> = (20_010..20_020).collect();
        let scanner = Scanner::new(
            &addrs,
            ports.clone(),
            10,
            Duration::from_millis(100),
            ScanOrder::Random,
            true,
            true,
        );

        let results = scanner.run().await;

        let mut seen: Vec<u16> = results.iter().map(|probe| probe.port).collect();
        seen.sort_unstable();
        assert_eq!(seen, ports);
    }
}
