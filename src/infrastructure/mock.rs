//! In-memory stand-ins for the time-series store.
//!
//! Used by the test suites and by hosts that want to exercise a reporter
//! without a running database.

use crate::domain::batch::BatchPoints;
use crate::domain::errors::ClientError;
use crate::domain::ports::{ConnectionConfig, Connector, PingResponse, TimeSeriesClient};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Client that records every batch it is asked to write
#[derive(Debug, Default)]
pub struct MockClient {
    unreachable: AtomicBool,
    ping_failing: AtomicBool,
    write_failures: AtomicUsize,
    pings: AtomicUsize,
    write_attempts: AtomicUsize,
    writes: Mutex<Vec<BatchPoints>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every ping and write, like a store that went away
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_ping_failing(&self, failing: bool) {
        self.ping_failing.store(failing, Ordering::SeqCst);
    }

    /// Fail the next `n` writes, then succeed again
    pub fn fail_next_writes(&self, n: usize) {
        self.write_failures.store(n, Ordering::SeqCst);
    }

    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Batches that were accepted
    pub fn writes(&self) -> Vec<BatchPoints> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn take_write_failure(&self) -> bool {
        self.write_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl TimeSeriesClient for MockClient {
    async fn ping(&self, _timeout: Duration) -> Result<PingResponse, ClientError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) || self.ping_failing.load(Ordering::SeqCst) {
            return Err(ClientError::Unavailable {
                reason: "mock ping failure".to_string(),
            });
        }
        Ok(PingResponse {
            rtt: Duration::from_millis(1),
            version: "mock".to_string(),
        })
    }

    async fn write(&self, batch: &BatchPoints) -> Result<(), ClientError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) || self.take_write_failure() {
            return Err(ClientError::Unavailable {
                reason: "mock write failure".to_string(),
            });
        }
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(batch.clone());
        Ok(())
    }
}

/// Connector handing out fresh [`MockClient`]s
#[derive(Debug, Default)]
pub struct MockConnector {
    connect_failures: AtomicUsize,
    attempts: AtomicUsize,
    clients: Mutex<Vec<Arc<MockClient>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` connects, then succeed again
    pub fn fail_next_connects(&self, n: usize) {
        self.connect_failures.store(n, Ordering::SeqCst);
    }

    pub fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Every client handed out so far, oldest first
    pub fn clients(&self) -> Vec<Arc<MockClient>> {
        self.clients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last_client(&self) -> Option<Arc<MockClient>> {
        self.clients().last().cloned()
    }
}

impl Connector for MockConnector {
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn TimeSeriesClient>, ClientError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .connect_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ClientError::InvalidAddress {
                address: config.address.clone(),
                reason: "mock connect failure".to_string(),
            });
        }

        let client = Arc::new(MockClient::new());
        self.clients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(client.clone());
        Ok(client)
    }
}
