//! Capability documents advertised by candidate helper nodes.
//!
//! A node describes itself with a `CapabilityDocument`: identity plus a
//! list of typed capability entries (compute, sensors, network, ...).
//! The gateway consumes documents read-only and only ever trusts fields
//! it can see; unknown entry types are preserved as `Unknown` rather
//! than failing the whole document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel value a compute entry reports when a GPU can be used.
pub const GPU_AVAILABLE: &str = "available";

/// A node's self-description: identity plus advertised capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDocument {
    pub device: DeviceIdentity,
    #[serde(default)]
    pub capabilities: Vec<CapabilityEntry>,
}

impl CapabilityDocument {
    /// True iff some compute entry carries the GPU-availability sentinel.
    ///
    /// Any other value, or a document without a compute entry, means the
    /// node is not eligible for delegation.
    pub fn gpu_available(&self) -> bool {
        self.capabilities.iter().any(|c| match c {
            CapabilityEntry::Compute { gpu: Some(gpu), .. } => gpu == GPU_AVAILABLE,
            _ => false,
        })
    }
}

/// Identity block of a capability document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub transport: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub firmware: Option<String>,
    #[serde(default)]
    pub reported_at: Option<String>,
}

/// One advertised capability, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CapabilityEntry {
    Compute {
        #[serde(default)]
        gpu: Option<String>,
        #[serde(default)]
        mhz: Option<u64>,
        #[serde(default)]
        flash_kb: Option<u64>,
    },
    Sensor {
        #[serde(default)]
        chipset: Option<String>,
        #[serde(default)]
        provides: Vec<String>,
    },
    Network {
        #[serde(default)]
        interfaces: Vec<Value>,
    },
    Storage {
        #[serde(default)]
        kind: Option<String>,
        #[serde(default)]
        total_kb: Option<u64>,
        #[serde(default)]
        free_kb: Option<u64>,
    },
    Gpio {},
    Adc {},
    /// Entry types this gateway does not know about.
    #[serde(other)]
    Unknown,
}
