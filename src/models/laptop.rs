//! Laptop catalog record and search filter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Result;

/// Unit of a memory size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryUnit {
    #[default]
    Unknown,
    Bit,
    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
    Terabyte,
}

impl MemoryUnit {
    /// Number of bits in one of this unit (binary prefixes)
    pub fn bits(self) -> u128 {
        match self {
            MemoryUnit::Unknown => 0,
            MemoryUnit::Bit => 1,
            MemoryUnit::Byte => 1 << 3,
            MemoryUnit::Kilobyte => 1 << 13,
            MemoryUnit::Megabyte => 1 << 23,
            MemoryUnit::Gigabyte => 1 << 33,
            MemoryUnit::Terabyte => 1 << 43,
        }
    }
}

/// A memory size, e.g. 16 gigabytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Memory {
    pub value: u64,
    pub unit: MemoryUnit,
}

impl Memory {
    pub fn new(value: u64, unit: MemoryUnit) -> Self {
        Self { value, unit }
    }

    /// Size in bits. Unknown units count as zero.
    pub fn to_bits(&self) -> u128 {
        u128::from(self.value) * self.unit.bits()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Cpu {
    pub brand: String,
    pub name: String,
    pub number_cores: u32,
    pub number_threads: u32,
    pub min_ghz: f64,
    pub max_ghz: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Gpu {
    pub brand: String,
    pub name: String,
    pub min_ghz: f64,
    pub max_ghz: f64,
    pub memory: Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    #[default]
    Unknown,
    Hdd,
    Ssd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Storage {
    pub driver: StorageDriver,
    pub memory: Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    #[default]
    Unknown,
    Ips,
    Oled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Screen {
    pub size_inch: f32,
    pub resolution: Resolution,
    pub panel: Panel,
    pub multitouch: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardLayout {
    #[default]
    Unknown,
    Qwerty,
    Qwertz,
    Azerty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Keyboard {
    pub layout: KeyboardLayout,
    pub backlit: bool,
}

/// Laptop weight, in whichever unit the vendor published
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    Kg(f64),
    Lb(f64),
}

impl Default for Weight {
    fn default() -> Self {
        Weight::Kg(0.0)
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Laptop {
    /// Globally unique identifier (UUID string). Empty means "assign one".
    pub id: String,
    pub brand: String,
    pub name: String,
    pub cpu: Cpu,
    pub ram: Memory,
    pub gpus: Vec<Gpu>,
    pub storages: Vec<Storage>,
    pub screen: Screen,
    pub keyboard: Keyboard,
    pub weight: Weight,
    pub price_usd: f64,
    pub release_year: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Laptop {
    /// Render this laptop as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Threshold conditions a search applies to stored laptops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Filter {
    pub max_price_usd: f64,
    pub min_cpu_cores: u32,
    pub min_cpu_ghz: f64,
    pub min_ram: Memory,
}

impl Filter {
    /// Whether a laptop satisfies every threshold of this filter
    pub fn is_qualified(&self, laptop: &Laptop) -> bool {
        if laptop.price_usd > self.max_price_usd {
            return false;
        }

        if laptop.cpu.number_cores < self.min_cpu_cores {
            return false;
        }

        if laptop.cpu.min_ghz < self.min_cpu_ghz {
            return false;
        }

        laptop.ram.to_bits() >= self.min_ram.to_bits()
    }
}
