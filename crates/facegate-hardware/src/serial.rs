//! Serial connector backed by the `serialport` crate.

use crate::traits::{SerialConnector, SerialHalves};
use crate::{HardwareError, LinkConfig, Result};
use serde::Serialize;
use serialport::{FlowControl, SerialPortType};
use tracing::{debug, warn};

/// Opens real serial ports: 8N1, no flow control.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialPortConnector;

impl SerialPortConnector {
    pub fn new() -> Self {
        Self
    }
}

impl SerialConnector for SerialPortConnector {
    fn open(&self, config: &LinkConfig) -> Result<SerialHalves> {
        config.validate()?;

        let port = serialport::new(&config.port, config.baud_rate)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| {
                log_available_ports();
                HardwareError::open_failed(config.port.clone(), e.to_string())
            })?;

        let writer = port
            .try_clone()
            .map_err(|e| HardwareError::open_failed(config.port.clone(), e.to_string()))?;

        debug!(port = %config.port, baud = config.baud_rate, "Serial port opened");

        Ok(SerialHalves {
            reader: Box::new(port),
            writer: Box::new(writer),
        })
    }
}

/// One serial port visible to the operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortSummary {
    pub name: String,
    pub description: String,
}

/// Enumerate serial ports on this machine.
///
/// # Errors
/// Returns `HardwareError::Other` if the platform enumeration fails.
pub fn available_ports() -> Result<Vec<PortSummary>> {
    let ports = serialport::available_ports()
        .map_err(|e| HardwareError::other(format!("Failed to enumerate serial ports: {e}")))?;

    Ok(ports
        .into_iter()
        .map(|info| PortSummary {
            description: describe(&info.port_type),
            name: info.port_name,
        })
        .collect())
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("USB serial");
            format!("{product} ({:04x}:{:04x})", usb.vid, usb.pid)
        }
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

fn log_available_ports() {
    match available_ports() {
        Ok(ports) if ports.is_empty() => warn!("No serial ports available"),
        Ok(ports) => {
            let names: Vec<&str> = ports.iter().map(|p| p.name.as_str()).collect();
            warn!(available = ?names, "Serial port open failed");
        }
        Err(e) => warn!(error = %e, "Serial port open failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_port_types() {
        assert_eq!(describe(&SerialPortType::PciPort), "PCI");
        assert_eq!(describe(&SerialPortType::Unknown), "unknown");
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let connector = SerialPortConnector::new();
        let err = connector
            .open(&LinkConfig::new("/dev/null").with_baud_rate(0))
            .unwrap_err();
        assert!(matches!(err, HardwareError::ConfigurationError { .. }));
    }

    #[test]
    fn test_open_missing_port_fails() {
        let connector = SerialPortConnector::new();
        let result = connector.open(&LinkConfig::new("/dev/facegate-does-not-exist"));
        assert!(result.is_err());
    }
}
