//! Bounded-time liveness probes.
//!
//! - `tcp:<port>` servers: a connection attempt to `127.0.0.1:<port>`
//! - `stdio` servers: a process-table scan for the server's identity
//!   pattern. This is a substring heuristic; two servers sharing a
//!   command fragment cannot be told apart.
//!
//! Every probe returns within its timeout. A probe that times out reports
//! "not alive" rather than an error.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use agentctl_core::{ProcessTable, ServerDefinition, Transport};
use futures_util::future::join_all;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct HealthProber {
    table: Arc<dyn ProcessTable>,
}

impl HealthProber {
    pub fn new(table: Arc<dyn ProcessTable>) -> Self {
        Self { table }
    }

    /// Whether `definition` looks alive, decided within `limit`.
    pub async fn probe(&self, definition: &ServerDefinition, limit: Duration) -> bool {
        let started = Instant::now();
        let alive = match definition.transport {
            Transport::Stdio => self.probe_stdio(definition.process_pattern(), limit).await,
            Transport::Tcp { port } => probe_tcp(port, limit).await,
        };

        debug!(
            server = %definition.name,
            transport = %definition.transport,
            alive = alive,
            elapsed_ms = started.elapsed().as_millis(),
            "Probe finished"
        );
        alive
    }

    /// Probe every definition concurrently; results keep input order.
    pub async fn probe_all(
        &self,
        definitions: &[ServerDefinition],
        limit: Duration,
    ) -> Vec<(String, bool)> {
        let probes = definitions.iter().map(|definition| async move {
            (definition.name.clone(), self.probe(definition, limit).await)
        });
        join_all(probes).await
    }

    async fn probe_stdio(&self, pattern: String, limit: Duration) -> bool {
        let table = Arc::clone(&self.table);
        let scan = tokio::task::spawn_blocking(move || !table.find_matching(&pattern).is_empty());

        match timeout(limit, scan).await {
            Ok(Ok(alive)) => alive,
            Ok(Err(e)) => {
                warn!(error = %e, "Process table scan failed");
                false
            }
            Err(_) => {
                debug!(timeout = ?limit, "Process table scan timed out");
                false
            }
        }
    }
}

async fn probe_tcp(port: u16, limit: Duration) -> bool {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    match timeout(limit, TcpStream::connect(addr)).await {
        // Connection accepted; dropping the stream closes it
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            debug!(port = port, error = %e, "TCP probe refused");
            false
        }
        Err(_) => {
            debug!(port = port, timeout = ?limit, "TCP probe timed out");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTable;
    use agentctl_core::ProcessInfo;

    fn github() -> ServerDefinition {
        ServerDefinition::stdio("github", "npx", ["-y", "@modelcontextprotocol/server-github"])
    }

    #[tokio::test]
    async fn stdio_probe_matches_process_table() {
        let mut table = MockTable::new();
        table.expect_snapshot().returning(|| {
            vec![ProcessInfo::new(
                77,
                "node /home/u/.npm/_npx/bin/npx -y @modelcontextprotocol/server-github",
            )]
        });
        let prober = HealthProber::new(Arc::new(table));

        assert!(prober.probe(&github(), Duration::from_secs(1)).await);
        let other = ServerDefinition::stdio("p", "npx", ["-y", "server-puppeteer"]);
        assert!(!prober.probe(&other, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn hung_scan_is_cut_off_at_timeout() {
        let mut table = MockTable::new();
        table.expect_snapshot().returning(|| {
            std::thread::sleep(Duration::from_millis(800));
            Vec::new()
        });
        let prober = HealthProber::new(Arc::new(table));

        let started = Instant::now();
        let alive = prober.probe(&github(), Duration::from_millis(100)).await;
        assert!(!alive);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn tcp_probe_follows_listener() {
        let listener = tokio_test::assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
        let port = listener.local_addr().unwrap().port();
        let definition = github().with_transport(Transport::Tcp { port });
        let prober = HealthProber::new(Arc::new(MockTable::new()));

        assert!(prober.probe(&definition, Duration::from_secs(1)).await);

        drop(listener);
        let started = Instant::now();
        assert!(!prober.probe(&definition, Duration::from_millis(300)).await);
        assert!(started.elapsed() < Duration::from_millis(800));
    }

    #[tokio::test]
    async fn probe_all_keeps_order() {
        let mut table = MockTable::new();
        table
            .expect_snapshot()
            .returning(|| vec![ProcessInfo::new(5, "npx server-b")]);
        let prober = HealthProber::new(Arc::new(table));
        let defs = vec![
            ServerDefinition::stdio("a", "npx", ["server-a"]),
            ServerDefinition::stdio("b", "npx", ["server-b"]),
        ];

        let results = prober.probe_all(&defs, Duration::from_secs(1)).await;
        assert_eq!(
            results,
            vec![("a".to_string(), false), ("b".to_string(), true)]
        );
    }
}
