//! Integer endpoint access
//!
//! hwmon exposes every sensor and actuator as a pseudo-file holding one
//! decimal integer. [`DeviceAccessor`] abstracts that so fan units and the
//! calibrator can run against real sysfs files or a simulated fan.

use async_trait::async_trait;
use pwmfan_core::{PwmFanError, Result};
use std::path::Path;
use tokio::fs;
use tracing::trace;

/// Read and write integer endpoints.
#[async_trait]
pub trait DeviceAccessor: Send + Sync {
    /// Read one integer from an endpoint.
    async fn read_integer(&self, endpoint: &Path) -> Result<i64>;

    /// Write one integer to an endpoint.
    async fn write_integer(&self, endpoint: &Path, value: i64) -> Result<()>;

    /// Switch an actuator to manual control.
    async fn enable(&self, endpoint: &Path) -> Result<()> {
        self.write_integer(endpoint, 1).await
    }

    /// Check that an endpoint can be opened for writing without writing to it.
    async fn check_writable(&self, endpoint: &Path) -> Result<()>;

    /// Check that an endpoint can be read.
    async fn check_readable(&self, endpoint: &Path) -> Result<()> {
        self.read_integer(endpoint).await.map(|_| ())
    }
}

/// Endpoint access through the filesystem (`/sys/class/hwmon/...`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsDevice;

impl SysfsDevice {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceAccessor for SysfsDevice {
    async fn read_integer(&self, endpoint: &Path) -> Result<i64> {
        let content = fs::read_to_string(endpoint)
            .await
            .map_err(|e| PwmFanError::DeviceRead {
                endpoint: endpoint.to_path_buf(),
                reason: e.to_string(),
            })?;

        let value = content
            .trim()
            .parse::<i64>()
            .map_err(|e| PwmFanError::DeviceRead {
                endpoint: endpoint.to_path_buf(),
                reason: format!("'{}' is not an integer: {}", content.trim(), e),
            })?;

        trace!("Read {} from {}", value, endpoint.display());
        Ok(value)
    }

    async fn write_integer(&self, endpoint: &Path, value: i64) -> Result<()> {
        trace!("Writing {} to {}", value, endpoint.display());
        fs::write(endpoint, value.to_string())
            .await
            .map_err(|e| PwmFanError::DeviceWrite {
                endpoint: endpoint.to_path_buf(),
                value,
                reason: e.to_string(),
            })
    }

    async fn check_writable(&self, endpoint: &Path) -> Result<()> {
        fs::OpenOptions::new()
            .write(true)
            .open(endpoint)
            .await
            .map(|_| ())
            .map_err(|e| PwmFanError::DeviceWrite {
                endpoint: endpoint.to_path_buf(),
                value: 0,
                reason: format!("cannot open for writing: {}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_integer_trims_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temp1_input");
        std::fs::write(&path, "45000\n").unwrap();

        let value = SysfsDevice::new().read_integer(&path).await.unwrap();
        assert_eq!(value, 45000);
    }

    #[tokio::test]
    async fn test_read_integer_not_a_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fan1_input");
        std::fs::write(&path, "spinning\n").unwrap();

        let err = SysfsDevice::new().read_integer(&path).await.unwrap_err();
        assert!(matches!(err, PwmFanError::DeviceRead { .. }));
        assert!(err.to_string().contains("not an integer"));
    }

    #[tokio::test]
    async fn test_read_integer_missing_endpoint() {
        let dir = TempDir::new().unwrap();
        let err = SysfsDevice::new()
            .read_integer(&dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, PwmFanError::DeviceRead { .. }));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pwm1");
        std::fs::write(&path, "0").unwrap();

        let device = SysfsDevice::new();
        device.write_integer(&path, 128).await.unwrap();
        assert_eq!(device.read_integer(&path).await.unwrap(), 128);
    }

    #[tokio::test]
    async fn test_enable_writes_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pwm1_enable");
        std::fs::write(&path, "2").unwrap();

        let device = SysfsDevice::new();
        device.enable(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1");
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("pwm1");

        let err = SysfsDevice::new().write_integer(&path, 1).await.unwrap_err();
        assert!(matches!(err, PwmFanError::DeviceWrite { value: 1, .. }));
    }

    #[tokio::test]
    async fn test_check_writable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pwm1");
        std::fs::write(&path, "77").unwrap();

        let device = SysfsDevice::new();
        device.check_writable(&path).await.unwrap();
        // Opening for writing must not truncate the value
        assert_eq!(device.read_integer(&path).await.unwrap(), 77);

        assert!(device
            .check_writable(&dir.path().join("missing"))
            .await
            .is_err());
    }
}
