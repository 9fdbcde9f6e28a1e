//! # Printer Session
//!
//! Owns one link to one printer and runs complete print jobs over it.
//!
//! ## State Machine
//!
//! ```text
//!                 connect() ok
//!   Disconnected ──────────────► Connected
//!        ▲  │                        │
//!        │  └─ connect() fails ──┐   │ disconnect()
//!        │       (stays put)  ◄──┘   │
//!        └───────────────────────────┘
//! ```
//!
//! ## Print Job
//!
//! [`PrinterSession::send`] writes the four handshake commands one after the
//! other, then the encoded image, each through a [`SegmentedWriter`]. The
//! first failing write ends the job; nothing already sent is resent.

use log::{debug, info, warn};

use crate::error::CatprintError;
use crate::protocol::commands::HANDSHAKE;
use crate::protocol::packet::Packet;
use crate::transport::writer::WriteStats;
use crate::transport::{
    DeviceAddress, LinkState, NotificationHandler, SegmentedWriter, TransportLink, WriterConfig,
};

pub struct PrinterSession<L: TransportLink> {
    link: L,
    address: DeviceAddress,
    writer_config: WriterConfig,
    state: LinkState,
}

impl<L: TransportLink> PrinterSession<L> {
    pub fn new(link: L, address: DeviceAddress, writer_config: WriterConfig) -> Self {
        Self {
            link,
            address,
            writer_config,
            state: LinkState::Disconnected,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Connect to the printer. On failure the session stays disconnected.
    pub async fn connect(&mut self) -> Result<(), CatprintError> {
        match self.link.connect(&self.address).await {
            Ok(()) => {
                self.state = LinkState::Connected;
                info!("Session connected to {}", self.address);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to connect to {}: {}", self.address, e);
                Err(e.into())
            }
        }
    }

    /// Disconnect from the printer. The session is disconnected afterwards
    /// even if the link reported an error while closing.
    pub async fn disconnect(&mut self) -> Result<(), CatprintError> {
        let result = self.link.disconnect().await;
        self.state = LinkState::Disconnected;
        match result {
            Ok(()) => {
                info!("Session disconnected from {}", self.address);
                Ok(())
            }
            Err(e) => {
                warn!("Error while disconnecting from {}: {}", self.address, e);
                Err(e.into())
            }
        }
    }

    /// Forward printer notifications to `handler`.
    pub async fn subscribe(&mut self, handler: NotificationHandler) -> Result<(), CatprintError> {
        self.ensure_connected()?;
        self.link.subscribe(handler).await.map_err(|e| {
            warn!("Notification start error: {}", e);
            CatprintError::from(e)
        })
    }

    pub async fn unsubscribe(&mut self) -> Result<(), CatprintError> {
        self.ensure_connected()?;
        self.link.unsubscribe().await.map_err(|e| {
            warn!("Notification stop error: {}", e);
            CatprintError::from(e)
        })
    }

    /// Raw bytes of the printer's status characteristic.
    pub async fn read_status(&mut self) -> Result<Vec<u8>, CatprintError> {
        self.ensure_connected()?;
        Ok(self.link.read_status().await?)
    }

    /// Send the handshake and then `packet`.
    ///
    /// ## Errors
    ///
    /// - [`CatprintError::NotConnected`] before anything is written
    /// - [`CatprintError::NotConnected`] if the link drops mid-job
    /// - [`CatprintError::RetryExhausted`] from the first write that gave up
    ///
    /// If the link went down during the job the session ends up disconnected.
    pub async fn send(&mut self, packet: &Packet) -> Result<WriteStats, CatprintError> {
        self.ensure_connected()?;

        let result = self.run_job(packet).await;
        if result.is_err() && !self.link.is_connected() {
            warn!("Lost connection to {} during print job", self.address);
            self.state = LinkState::Disconnected;
        }
        result
    }

    async fn run_job(&mut self, packet: &Packet) -> Result<WriteStats, CatprintError> {
        let config = self.writer_config;
        let mut writer = SegmentedWriter::new(&mut self.link, config);
        let mut total = WriteStats::default();

        for (i, command) in HANDSHAKE.iter().enumerate() {
            let stats = writer.write(command).await.inspect_err(|e| {
                warn!("Handshake command {} failed: {}", i + 1, e);
            })?;
            total.chunks += stats.chunks;
            total.retries += stats.retries;
        }
        debug!("Handshake complete, sending {} byte image", packet.len());

        let stats = writer.write(packet.as_bytes()).await.inspect_err(|e| {
            warn!("Image transfer failed: {}", e);
        })?;
        total.chunks += stats.chunks;
        total.retries += stats.retries;

        info!(
            "Sent {} bytes in {} chunks ({} retries)",
            packet.len(),
            total.chunks,
            total.retries
        );
        Ok(total)
    }

    fn ensure_connected(&self) -> Result<(), CatprintError> {
        match self.state {
            LinkState::Connected => Ok(()),
            LinkState::Disconnected => Err(CatprintError::NotConnected),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
