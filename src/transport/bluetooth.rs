//! # Bluetooth LE Transport
//!
//! This module talks to the printer over BLE GATT using `btleplug`.
//!
//! ## Connection Sequence
//!
//! 1. Open the first Bluetooth adapter
//! 2. Scan until a peripheral with the requested MAC address shows up
//!    (or the scan timeout expires)
//! 3. Connect and discover services
//! 4. Resolve the write, notify and read characteristics by UUID
//!
//! If step 3 or 4 fails the peripheral is disconnected again before the error
//! is returned. Connecting a link that is already connected closes the old
//! connection first.
//!
//! ## Writes
//!
//! Chunks go to the write characteristic as write-without-response. This
//! link never retries on its own; [`SegmentedWriter`](super::SegmentedWriter)
//! owns the retry policy. A failed write or read asks btleplug whether the
//! peripheral is still connected; if not, the link drops to disconnected so
//! the writer stops retrying.
//!
//! ## Notifications
//!
//! [`subscribe`](TransportLink::subscribe) enables notifications on the notify
//! characteristic and spawns a tokio task that hands every payload to the
//! handler, untouched.
//!
//! ## Platform Notes
//!
//! On Linux btleplug goes through BlueZ over D-Bus, so the printer does not
//! need to be paired beforehand, but `bluetoothd` must be running.

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use uuid::Uuid;

use super::{CharacteristicIds, CongestionSignal, DeviceAddress, NotificationHandler, TransportLink};
use crate::error::LinkError;

/// How long to scan for the printer before giving up
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval while waiting for the printer to appear in scan results
const SCAN_POLL: Duration = Duration::from_millis(250);

fn backend(e: btleplug::Error) -> LinkError {
    LinkError::Backend(e.to_string())
}

/// A live GATT connection and its resolved characteristics.
struct Connection {
    peripheral: Peripheral,
    write: Characteristic,
    notify: Characteristic,
    read: Characteristic,
}

/// # Bluetooth LE Printer Link
///
/// ## Example
///
/// ```no_run
/// use catprint::transport::{BluetoothLink, CharacteristicIds, DeviceAddress, TransportLink};
///
/// # async fn run() -> Result<(), catprint::CatprintError> {
/// let mut link = BluetoothLink::new(CharacteristicIds::default());
/// let address: DeviceAddress = "AA:BB:CC:DD:EE:FF".parse()?;
/// link.connect(&address).await?;
/// link.write_chunk(&catprint::protocol::commands::GET_DEVICE_STATE).await?;
/// link.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct BluetoothLink {
    ids: CharacteristicIds,
    scan_timeout: Duration,
    connection: Option<Connection>,
    notify_task: Option<JoinHandle<()>>,
    congestion: CongestionSignal,
}

impl BluetoothLink {
    pub fn new(ids: CharacteristicIds) -> Self {
        Self {
            ids,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            connection: None,
            notify_task: None,
            congestion: CongestionSignal::new(),
        }
    }

    /// Set how long [`connect`](TransportLink::connect) scans for the device.
    pub fn set_scan_timeout(&mut self, timeout: Duration) {
        self.scan_timeout = timeout;
    }

    async fn first_adapter() -> Result<Adapter, LinkError> {
        let manager = Manager::new().await.map_err(backend)?;
        manager
            .adapters()
            .await
            .map_err(backend)?
            .into_iter()
            .next()
            .ok_or_else(|| LinkError::Backend("no Bluetooth adapter found".to_string()))
    }

    async fn find_peripheral(
        &self,
        adapter: &Adapter,
        target: BDAddr,
    ) -> Result<Peripheral, LinkError> {
        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(backend)?;

        let deadline = Instant::now() + self.scan_timeout;
        let found = loop {
            let peripherals = adapter.peripherals().await.map_err(backend)?;
            if let Some(p) = peripherals.into_iter().find(|p| p.address() == target) {
                break Some(p);
            }
            if Instant::now() >= deadline {
                break None;
            }
            sleep(SCAN_POLL).await;
        };

        if let Err(e) = adapter.stop_scan().await {
            debug!("stop_scan failed: {}", e);
        }

        found.ok_or_else(|| LinkError::DeviceNotFound(target.to_string()))
    }

    fn resolve(peripheral: &Peripheral, uuid: Uuid) -> Result<Characteristic, LinkError> {
        peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(LinkError::CharacteristicNotFound(uuid))
    }

    fn connection(&self) -> Result<&Connection, LinkError> {
        self.connection
            .as_ref()
            .ok_or_else(|| LinkError::Backend("not connected".to_string()))
    }

    /// Discover services and resolve the write, notify and read characteristics.
    async fn setup(
        peripheral: &Peripheral,
        ids: &CharacteristicIds,
    ) -> Result<(Characteristic, Characteristic, Characteristic), LinkError> {
        peripheral.discover_services().await.map_err(backend)?;
        Ok((
            Self::resolve(peripheral, ids.write)?,
            Self::resolve(peripheral, ids.notify)?,
            Self::resolve(peripheral, ids.read)?,
        ))
    }

    /// After a failed operation, ask the backend whether the printer is still
    /// there and drop the connection if it is not, so
    /// [`is_connected`](TransportLink::is_connected) stops reporting a dead link.
    async fn forget_if_dropped(&mut self) {
        let dropped = match &self.connection {
            Some(conn) => matches!(conn.peripheral.is_connected().await, Ok(false)),
            None => false,
        };
        if dropped {
            warn!("Printer dropped the connection");
            self.stop_notify_task();
            self.connection = None;
        }
    }

    fn stop_notify_task(&mut self) {
        if let Some(task) = self.notify_task.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl TransportLink for BluetoothLink {
    async fn connect(&mut self, address: &DeviceAddress) -> Result<(), LinkError> {
        let target: BDAddr = address
            .as_str()
            .parse()
            .map_err(|e| LinkError::ConnectFailed(format!("{}: {:?}", address, e)))?;

        if self.connection.is_some() {
            debug!("Closing previous connection before reconnecting");
            self.disconnect().await?;
        }

        let adapter = Self::first_adapter().await?;
        info!("Scanning for {}...", address);
        let peripheral = self.find_peripheral(&adapter, target).await?;

        peripheral
            .connect()
            .await
            .map_err(|e| LinkError::ConnectFailed(e.to_string()))?;

        let (write, notify, read) = match Self::setup(&peripheral, &self.ids).await {
            Ok(chars) => chars,
            Err(e) => {
                warn!("Setup of {} failed, disconnecting: {}", address, e);
                if let Err(de) = peripheral.disconnect().await {
                    debug!("disconnect after failed setup: {}", de);
                }
                return Err(e);
            }
        };

        self.connection = Some(Connection {
            peripheral,
            write,
            notify,
            read,
        });
        info!("Connected to {}", address);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        self.stop_notify_task();
        if let Some(conn) = self.connection.take() {
            conn.peripheral.disconnect().await.map_err(backend)?;
            info!("Disconnected from {}", conn.peripheral.address());
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), LinkError> {
        let conn = self
            .connection
            .as_ref()
            .ok_or_else(|| LinkError::WriteFailed("not connected".to_string()))?;
        let result = conn
            .peripheral
            .write(&conn.write, chunk, WriteType::WithoutResponse)
            .await
            .map_err(|e| LinkError::WriteFailed(e.to_string()));
        if result.is_err() {
            self.forget_if_dropped().await;
        }
        result
    }

    async fn read_status(&mut self) -> Result<Vec<u8>, LinkError> {
        let conn = self
            .connection
            .as_ref()
            .ok_or_else(|| LinkError::ReadFailed("not connected".to_string()))?;
        let result = conn
            .peripheral
            .read(&conn.read)
            .await
            .map_err(|e| LinkError::ReadFailed(e.to_string()));
        if result.is_err() {
            self.forget_if_dropped().await;
        }
        result
    }

    async fn subscribe(&mut self, handler: NotificationHandler) -> Result<(), LinkError> {
        self.stop_notify_task();
        let conn = self.connection()?;

        conn.peripheral
            .subscribe(&conn.notify)
            .await
            .map_err(|e| LinkError::Subscribe(e.to_string()))?;
        let mut stream = conn
            .peripheral
            .notifications()
            .await
            .map_err(|e| LinkError::Subscribe(e.to_string()))?;

        let uuid = conn.notify.uuid;
        self.notify_task = Some(tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                if notification.uuid == uuid {
                    handler(notification.value);
                }
            }
        }));
        Ok(())
    }

    async fn unsubscribe(&mut self) -> Result<(), LinkError> {
        self.stop_notify_task();
        let conn = self.connection()?;
        if let Err(e) = conn.peripheral.unsubscribe(&conn.notify).await {
            warn!("Failed to stop notifications: {}", e);
            return Err(LinkError::Subscribe(e.to_string()));
        }
        Ok(())
    }

    fn congestion(&self) -> CongestionSignal {
        self.congestion.clone()
    }
}

impl Drop for BluetoothLink {
    fn drop(&mut self) {
        self.stop_notify_task();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_link_is_disconnected() {
        let link = BluetoothLink::new(CharacteristicIds::default());
        assert!(!link.is_connected());
        assert_eq!(link.scan_timeout, DEFAULT_SCAN_TIMEOUT);
    }

    #[test]
    fn test_normalized_address_parses_as_bdaddr() {
        let addr: DeviceAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        let bd: BDAddr = addr.as_str().parse().unwrap();
        assert_eq!(bd.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[tokio::test]
    async fn test_write_without_connection_fails() {
        let mut link = BluetoothLink::new(CharacteristicIds::default());
        assert!(matches!(
            link.write_chunk(&[0x00]).await,
            Err(LinkError::WriteFailed(_))
        ));
        assert!(link.disconnect().await.is_ok());
    }

    // Note: connect/subscribe need a real adapter and printer; they are
    // exercised manually with `catprint print --address ...`.
}
