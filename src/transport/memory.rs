//! # In-Memory Transport
//!
//! A [`TransportLink`] that keeps every write attempt in memory instead of
//! talking to hardware. Failures and congestion can be scripted, which makes
//! it the link used by the test suite and by `--dry-run`.
//!
//! ## Example
//!
//! ```
//! use catprint::transport::{DeviceAddress, MemoryLink, SegmentedWriter, TransportLink, WriterConfig};
//!
//! # block_on(async {
//! let mut link = MemoryLink::new();
//! link.connect(&"00:11:22:33:44:55".parse::<DeviceAddress>()?).await?;
//! link.fail_next(2);
//!
//! let stats = SegmentedWriter::new(&mut link, WriterConfig::default())
//!     .write(&[1, 2, 3])
//!     .await?;
//! assert_eq!(stats.retries, 2);
//! assert_eq!(link.received(), vec![1, 2, 3]);
//! # Ok::<(), catprint::CatprintError>(())
//! # }).unwrap();
//! # fn block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
//! # }
//! ```

use async_trait::async_trait;
use log::debug;
use tokio::time::Instant;

use super::{CongestionSignal, DeviceAddress, NotificationHandler, TransportLink};
use crate::error::LinkError;

/// One call to [`TransportLink::write_chunk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAttempt {
    pub at: Instant,
    pub bytes: Vec<u8>,
    pub accepted: bool,
}

/// Scriptable in-memory link.
#[derive(Default)]
pub struct MemoryLink {
    connected: bool,
    refuse_connect: bool,
    address: Option<DeviceAddress>,
    attempts: Vec<WriteAttempt>,
    accepted_count: usize,
    pending_failures: usize,
    scheduled_failures: Vec<(usize, usize)>,
    always_fail: bool,
    congest_after: Option<usize>,
    drop_after: Option<usize>,
    congestion: CongestionSignal,
    status: Vec<u8>,
    handler: Option<NotificationHandler>,
}

impl MemoryLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every [`connect`](TransportLink::connect) call fail.
    pub fn refuse_connections(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    /// Fail the next `n` write attempts.
    pub fn fail_next(&mut self, n: usize) {
        self.pending_failures += n;
    }

    /// Once `accepted` chunks have gone through, fail the next `n` attempts.
    pub fn fail_after_accepted(&mut self, accepted: usize, n: usize) {
        self.scheduled_failures.push((accepted, n));
    }

    /// Fail every write attempt from now on.
    pub fn fail_always(&mut self) {
        self.always_fail = true;
    }

    /// Raise the congestion flag right after the `n`-th accepted chunk.
    pub fn congest_after(&mut self, n: usize) {
        self.congest_after = Some(n);
    }

    /// Lose the connection on the first write attempt after `n` accepted chunks.
    pub fn drop_connection_after(&mut self, n: usize) {
        self.drop_after = Some(n);
    }

    /// Payload returned by [`read_status`](TransportLink::read_status).
    pub fn set_status(&mut self, status: Vec<u8>) {
        self.status = status;
    }

    /// Deliver a notification to the subscribed handler, if any.
    pub fn notify(&self, payload: &[u8]) {
        if let Some(handler) = &self.handler {
            handler(payload.to_vec());
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.handler.is_some()
    }

    pub fn address(&self) -> Option<&DeviceAddress> {
        self.address.as_ref()
    }

    /// Every write attempt, failed ones included, in call order.
    pub fn attempts(&self) -> &[WriteAttempt] {
        &self.attempts
    }

    /// Chunks the link accepted, in order.
    pub fn accepted(&self) -> Vec<&[u8]> {
        self.attempts
            .iter()
            .filter(|a| a.accepted)
            .map(|a| a.bytes.as_slice())
            .collect()
    }

    /// All accepted bytes concatenated.
    pub fn received(&self) -> Vec<u8> {
        self.accepted().concat()
    }

    fn should_fail(&mut self) -> bool {
        if let Some(pos) = self
            .scheduled_failures
            .iter()
            .position(|(after, _)| *after == self.accepted_count)
        {
            let (_, n) = self.scheduled_failures.remove(pos);
            self.pending_failures += n;
        }

        if self.always_fail {
            return true;
        }
        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            return true;
        }
        false
    }
}

#[async_trait]
impl TransportLink for MemoryLink {
    async fn connect(&mut self, address: &DeviceAddress) -> Result<(), LinkError> {
        if self.refuse_connect {
            return Err(LinkError::ConnectFailed(format!("{} refused", address)));
        }
        self.address = Some(address.clone());
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        self.connected = false;
        self.handler = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), LinkError> {
        if !self.connected {
            return Err(LinkError::WriteFailed("link is closed".to_string()));
        }

        if self.drop_after == Some(self.accepted_count) {
            self.drop_after = None;
            self.connected = false;
            self.handler = None;
            self.attempts.push(WriteAttempt {
                at: Instant::now(),
                bytes: chunk.to_vec(),
                accepted: false,
            });
            debug!("memory link: dropping connection");
            return Err(LinkError::WriteFailed("connection lost".to_string()));
        }

        let accepted = !self.should_fail();
        self.attempts.push(WriteAttempt {
            at: Instant::now(),
            bytes: chunk.to_vec(),
            accepted,
        });

        if !accepted {
            debug!("memory link: rejecting {} byte chunk", chunk.len());
            return Err(LinkError::WriteFailed("scripted failure".to_string()));
        }

        self.accepted_count += 1;
        if self.congest_after == Some(self.accepted_count) {
            self.congestion.set(true);
        }
        Ok(())
    }

    async fn read_status(&mut self) -> Result<Vec<u8>, LinkError> {
        if !self.connected {
            return Err(LinkError::ReadFailed("link is closed".to_string()));
        }
        Ok(self.status.clone())
    }

    async fn subscribe(&mut self, handler: NotificationHandler) -> Result<(), LinkError> {
        if !self.connected {
            return Err(LinkError::Subscribe("link is closed".to_string()));
        }
        self.handler = Some(handler);
        Ok(())
    }

    async fn unsubscribe(&mut self) -> Result<(), LinkError> {
        self.handler = None;
        Ok(())
    }

    fn congestion(&self) -> CongestionSignal {
        self.congestion.clone()
    }
}
