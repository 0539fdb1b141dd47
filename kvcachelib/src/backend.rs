use std::fmt;
use serde::{Deserialize, Serialize};
use crate::config::LevelConfig;
use crate::error::{CacheError, Result};
use crate::replacement_policies::PolicyKind;

/// The kind of storage a level stands in for
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    CpuCache,
    Memory,
    Ssd,
    Hdd,
    Network,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageType::CpuCache => "CPU_CACHE",
            StorageType::Memory => "MEMORY",
            StorageType::Ssd => "SSD",
            StorageType::Hdd => "HDD",
            StorageType::Network => "NETWORK",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SsdInterface {
    Nvme,
    Sata,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    Lan,
    Wan,
    Cloud,
}

/// A storage device a hierarchy level is modelled on
///
/// Only the name and latency reach the simulation, through [Backend::level]. The rest describes
/// the device for reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    pub name: String,
    pub storage_type: StorageType,
    pub latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_mb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput_mbps: Option<u64>,
    /// Generated from the other fields when absent, see [Backend::description]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Backend {
    /// A bare backend, with no capacity, throughput or description
    pub fn new(name: impl Into<String>, storage_type: StorageType, latency_ms: f64) -> Self {
        Self {
            name: name.into(),
            storage_type,
            latency_ms,
            capacity_mb: None,
            throughput_mbps: None,
            description: None,
        }
    }

    /// An on-die cache. Levels past 3 get L1 latency
    pub fn cpu_cache(level: u8) -> Self {
        let latency_ms = match level {
            2 => 0.003,
            3 => 0.010,
            _ => 0.001,
        };
        Self {
            capacity_mb: Some(0.032),
            throughput_mbps: Some(100_000),
            description: Some(format!("L{level} CPU Cache")),
            ..Self::new("CPU Cache", StorageType::CpuCache, latency_ms)
        }
    }

    /// 16GB of RAM. Unknown DDR generations get DDR4 throughput
    pub fn memory(ddr_generation: u8) -> Self {
        let throughput = match ddr_generation {
            3 => 17_000,
            5 => 40_000,
            _ => 25_000,
        };
        Self {
            capacity_mb: Some(16_384.0),
            throughput_mbps: Some(throughput),
            description: Some(format!("DDR{ddr_generation} RAM")),
            ..Self::new("RAM", StorageType::Memory, 0.1)
        }
    }

    /// A 500GB SSD
    pub fn ssd(interface: SsdInterface) -> Self {
        let (throughput, label) = match interface {
            SsdInterface::Nvme => (3_500, "NVME"),
            SsdInterface::Sata => (550, "SATA"),
        };
        Self {
            capacity_mb: Some(512_000.0),
            throughput_mbps: Some(throughput),
            description: Some(format!("{label} SSD")),
            ..Self::new("SSD", StorageType::Ssd, 0.5)
        }
    }

    /// A 4TB spinning disk. Unknown speeds get 7200RPM throughput
    pub fn hdd(rpm: u32) -> Self {
        let throughput = match rpm {
            5400 => 120,
            10_000 => 200,
            _ => 160,
        };
        Self {
            capacity_mb: Some(4_000_000.0),
            throughput_mbps: Some(throughput),
            description: Some(format!("{rpm}RPM HDD")),
            ..Self::new("HDD", StorageType::Hdd, 10.0)
        }
    }

    /// Remote storage of unbounded capacity
    pub fn network(kind: NetworkKind) -> Self {
        let (throughput, label) = match kind {
            NetworkKind::Lan => (125, "LAN"),
            NetworkKind::Wan => (12, "WAN"),
            NetworkKind::Cloud => (50, "CLOUD"),
        };
        Self {
            throughput_mbps: Some(throughput),
            description: Some(format!("{label} Storage")),
            ..Self::new("Network", StorageType::Network, 50.0)
        }
    }

    /// The default device of each type: an L1 cache, DDR4, NVMe, 7200RPM or LAN
    pub fn of_type(storage_type: StorageType) -> Self {
        match storage_type {
            StorageType::CpuCache => Self::cpu_cache(1),
            StorageType::Memory => Self::memory(4),
            StorageType::Ssd => Self::ssd(SsdInterface::Nvme),
            StorageType::Hdd => Self::hdd(7200),
            StorageType::Network => Self::network(NetworkKind::Lan),
        }
    }

    pub fn named(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn with_latency_ms(self, latency_ms: f64) -> Self {
        Self { latency_ms, ..self }
    }

    pub fn with_capacity_mb(self, capacity_mb: Option<f64>) -> Self {
        Self { capacity_mb, ..self }
    }

    /// The stored description, or one built from the type, size, latency and throughput
    pub fn description(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        let mut parts = vec![self.storage_type.to_string()];
        if let Some(capacity_mb) = self.capacity_mb.filter(|&mb| mb > 0.0) {
            parts.push(if capacity_mb >= 1024.0 {
                format!("{}GB", (capacity_mb / 1024.0).floor())
            } else {
                format!("{capacity_mb}MB")
            });
        }
        parts.push(format!("{}ms latency", self.latency_ms));
        if let Some(throughput) = self.throughput_mbps.filter(|&t| t > 0) {
            parts.push(if throughput >= 1024 {
                format!("{}GB/s", throughput / 1024)
            } else {
                format!("{throughput}MB/s")
            });
        }
        parts.join(" - ")
    }

    pub fn validate(&self) -> Result<()> {
        if !self.latency_ms.is_finite() || self.latency_ms < 0.0 {
            return Err(CacheError::config(format!(
                "latency of backend '{}' must be a non-negative number, got {}",
                self.name, self.latency_ms
            )));
        }
        if let Some(capacity_mb) = self.capacity_mb {
            if !capacity_mb.is_finite() || capacity_mb <= 0.0 {
                return Err(CacheError::config(format!(
                    "capacity of backend '{}' must be positive, got {capacity_mb}MB",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// A level named after this backend and charged its latency
    ///
    /// # Arguments
    ///
    /// * `replacement_policy`: The level's policy
    /// * `capacity`: The number of entries the level holds, unrelated to `capacity_mb`
    ///
    /// returns: LevelConfig
    pub fn level(&self, replacement_policy: PolicyKind, capacity: usize) -> LevelConfig {
        LevelConfig::new(self.name.clone(), replacement_policy, capacity, self.latency_ms)
    }
}

/// RAM, an NVMe SSD and a 7200RPM disk
pub fn typical_backends() -> [Backend; 3] {
    [
        Backend::memory(4).named("L1-RAM").with_latency_ms(1.0).with_capacity_mb(Some(1024.0)),
        Backend::ssd(SsdInterface::Nvme).named("L2-SSD").with_latency_ms(5.0).with_capacity_mb(Some(10_240.0)),
        Backend::hdd(7200).named("L3-HDD").with_latency_ms(50.0).with_capacity_mb(Some(100_000.0)),
    ]
}

/// Local RAM and SSD in front of cloud storage
pub fn cloud_backends() -> [Backend; 3] {
    [
        Backend::memory(4).named("Local-RAM").with_latency_ms(0.5).with_capacity_mb(Some(2048.0)),
        Backend::ssd(SsdInterface::Nvme).named("Local-SSD").with_latency_ms(2.0).with_capacity_mb(Some(20_480.0)),
        Backend::network(NetworkKind::Cloud).named("Cloud-Storage").with_latency_ms(100.0),
    ]
}
