//! # Segmented Writer
//!
//! The printer's write characteristic only accepts small payloads and drops
//! some of them. [`SegmentedWriter`] pushes an arbitrary buffer through a
//! [`TransportLink`] as a strictly ordered series of chunks.
//!
//! ## Per-Chunk Loop
//!
//! ```text
//! offset = 0
//! while offset < len:
//!     write buffer[offset .. offset + chunk_size]
//!     ok   -> offset += n, failures = 0, sleep(interval or slow_interval)
//!     fail -> failures += 1
//!             failures == 50 -> abort whole buffer
//!             else           -> sleep(4ms), retry same chunk
//! ```
//!
//! A failure after which the link reports itself disconnected ends the write
//! with `NotConnected` right away instead of burning the retry budget.
//!
//! The slow interval is used while the link's [`CongestionSignal`] is set at
//! the moment a chunk is accepted. An abort never resumes: the next call
//! starts again from offset zero of whatever buffer it is given.

use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use super::{CongestionSignal, TransportLink};
use crate::error::CatprintError;

/// Consecutive failures of one chunk before the whole write is abandoned
pub const MAX_ATTEMPTS: u32 = 50;

/// Pause before retrying a failed chunk
pub const RETRY_BACKOFF: Duration = Duration::from_millis(4);

/// Default chunk size (bytes)
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Default delay after an accepted chunk
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);

/// Default delay after an accepted chunk while the link is congested
pub const DEFAULT_SLOW_INTERVAL: Duration = Duration::from_millis(50);

/// Chunking and pacing parameters. Validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    chunk_size: usize,
    interval: Duration,
    slow_interval: Duration,
}

impl WriterConfig {
    /// ## Errors
    ///
    /// [`CatprintError::Config`] if `chunk_size` is zero.
    pub fn new(
        chunk_size: usize,
        interval: Duration,
        slow_interval: Duration,
    ) -> Result<Self, CatprintError> {
        if chunk_size == 0 {
            return Err(CatprintError::config("chunk size must be positive"));
        }
        Ok(Self {
            chunk_size,
            interval,
            slow_interval,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn slow_interval(&self) -> Duration {
        self.slow_interval
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            interval: DEFAULT_INTERVAL,
            slow_interval: DEFAULT_SLOW_INTERVAL,
        }
    }
}

/// What a successful [`SegmentedWriter::write`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Chunks accepted by the link
    pub chunks: usize,
    /// Failed attempts that were retried
    pub retries: usize,
}

/// Sends buffers through an exclusively borrowed link.
pub struct SegmentedWriter<'a, L: TransportLink + ?Sized> {
    link: &'a mut L,
    config: WriterConfig,
    congestion: CongestionSignal,
}

impl<'a, L: TransportLink + ?Sized> SegmentedWriter<'a, L> {
    pub fn new(link: &'a mut L, config: WriterConfig) -> Self {
        let congestion = link.congestion();
        Self {
            link,
            config,
            congestion,
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    fn pacing(&self) -> Duration {
        if self.congestion.is_congested() {
            self.config.slow_interval
        } else {
            self.config.interval
        }
    }

    /// Write `buffer` as paced, retried chunks.
    ///
    /// ## Errors
    ///
    /// - [`CatprintError::NotConnected`] if the link is down before the first
    ///   chunk (nothing is written) or goes down during the write
    /// - [`CatprintError::RetryExhausted`] if one chunk fails [`MAX_ATTEMPTS`]
    ///   times in a row; later chunks are never attempted
    pub async fn write(&mut self, buffer: &[u8]) -> Result<WriteStats, CatprintError> {
        if !self.link.is_connected() {
            return Err(CatprintError::NotConnected);
        }

        let mut stats = WriteStats::default();
        let mut offset = 0;
        let mut failures = 0u32;

        while offset < buffer.len() {
            let end = (offset + self.config.chunk_size).min(buffer.len());

            match self.link.write_chunk(&buffer[offset..end]).await {
                Ok(()) => {
                    offset = end;
                    failures = 0;
                    stats.chunks += 1;
                    sleep(self.pacing()).await;
                }
                Err(e) => {
                    if !self.link.is_connected() {
                        warn!("link went down at offset {}: {}", offset, e);
                        return Err(CatprintError::NotConnected);
                    }
                    failures += 1;
                    if failures >= MAX_ATTEMPTS {
                        warn!(
                            "chunk at offset {} failed {} times, aborting write: {}",
                            offset, failures, e
                        );
                        return Err(CatprintError::RetryExhausted {
                            offset,
                            attempts: failures,
                        });
                    }
                    debug!("chunk at offset {} failed (attempt {}): {}", offset, failures, e);
                    stats.retries += 1;
                    sleep(RETRY_BACKOFF).await;
                }
            }
        }

        Ok(stats)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{DeviceAddress, MemoryLink};
    use tokio::time::Instant;

    async fn connected_link() -> MemoryLink {
        let mut link = MemoryLink::new();
        let addr: DeviceAddress = "00:11:22:33:44:55".parse().unwrap();
        link.connect(&addr).await.unwrap();
        link
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            WriterConfig::new(0, DEFAULT_INTERVAL, DEFAULT_SLOW_INTERVAL),
            Err(CatprintError::Config(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = WriterConfig::default();
        assert_eq!(config.chunk_size(), 100);
        assert_eq!(config.interval(), Duration::from_millis(10));
        assert_eq!(config.slow_interval(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_connected() {
        let mut link = MemoryLink::new();
        let mut writer = SegmentedWriter::new(&mut link, WriterConfig::default());
        let result = writer.write(&[1, 2, 3]).await;
        assert!(matches!(result, Err(CatprintError::NotConnected)));
        assert!(link.attempts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_in_order() {
        let mut link = connected_link().await;
        let data: Vec<u8> = (0..=250).collect();
        let stats = SegmentedWriter::new(&mut link, WriterConfig::default())
            .write(&data)
            .await
            .unwrap();

        assert_eq!(stats, WriteStats { chunks: 3, retries: 0 });
        let sizes: Vec<usize> = link.accepted().iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![100, 100, 51]);
        assert_eq!(link.received(), data);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_buffer_writes_nothing() {
        let mut link = connected_link().await;
        let stats = SegmentedWriter::new(&mut link, WriterConfig::default())
            .write(&[])
            .await
            .unwrap();
        assert_eq!(stats.chunks, 0);
        assert!(link.attempts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_resets_per_chunk() {
        let mut link = connected_link().await;
        // 30 failures on the first chunk, then 30 on the second: never 50 in a row
        link.fail_next(30);
        link.fail_after_accepted(1, 30);
        let config = WriterConfig::new(2, DEFAULT_INTERVAL, DEFAULT_SLOW_INTERVAL).unwrap();
        let stats = SegmentedWriter::new(&mut link, config)
            .write(&[1, 2, 3, 4])
            .await
            .unwrap();
        assert_eq!(stats, WriteStats { chunks: 2, retries: 60 });
        assert_eq!(link.received(), vec![1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_link_stops_retrying() {
        let mut link = connected_link().await;
        link.drop_connection_after(2);
        let config = WriterConfig::new(1, DEFAULT_INTERVAL, DEFAULT_SLOW_INTERVAL).unwrap();
        let result = SegmentedWriter::new(&mut link, config)
            .write(&[1, 2, 3, 4])
            .await;
        assert!(matches!(result, Err(CatprintError::NotConnected)));
        // Two accepted chunks and the one attempt that found the link gone
        assert_eq!(link.attempts().len(), 3);
        assert_eq!(link.received(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_delays() {
        let mut link = connected_link().await;
        let config =
            WriterConfig::new(1, Duration::from_millis(10), Duration::from_millis(50)).unwrap();
        let start = Instant::now();
        SegmentedWriter::new(&mut link, config)
            .write(&[1, 2, 3])
            .await
            .unwrap();
        // Three accepted chunks, each followed by one interval
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(30), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(34), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_backoff_delay() {
        let mut link = connected_link().await;
        link.fail_next(3);
        let config =
            WriterConfig::new(10, Duration::from_millis(10), Duration::from_millis(50)).unwrap();
        let start = Instant::now();
        SegmentedWriter::new(&mut link, config)
            .write(&[1])
            .await
            .unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3 * 4 + 10), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(3 * 4 + 10 + 5), "{:?}", elapsed);
    }
}
