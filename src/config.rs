//! Driver configuration parameters
//!
//! Platform facts and the thermal safety policy applied at startup.
//! Values are fixed at build or boot time; nothing is persisted.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::ConfigError;

/// Documented PCH catastrophic point; the trip ceiling must stay below it.
pub const HW_CATASTROPHIC_C: i16 = 120;

/// Smallest accepted MMU page.
pub const MIN_PAGE_SIZE: u64 = 4096;

/// Core driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThermalConfig {
    // --- Safety ---
    /// Catastrophic trip ceiling (Celsius).  A stored threshold at or above
    /// this value is lowered to it; lower thresholds are left alone.
    pub ctt_ceiling_c: i16,

    // --- Platform ---
    /// MMU page granularity in bytes
    pub page_size: u64,
    /// Width of a physical address on this platform (bits)
    pub phys_addr_bits: u8,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            // The PCH datasheet says to stay clear of 120C.  The sensor may read
            // 2C low due to placement and is only +-5C accurate above 90C.
            ctt_ceiling_c: 113,

            page_size: 4096,
            phys_addr_bits: 64,
        }
    }
}

impl ThermalConfig {
    /// Reject out-of-range values.  Never clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ctt_ceiling_c < codec::MIN_DEGREES_C || self.ctt_ceiling_c > codec::MAX_DEGREES_C {
            return Err(ConfigError::ValidationFailed(
                "ctt_ceiling_c: not representable in the 9-bit field",
            ));
        }
        if self.ctt_ceiling_c >= HW_CATASTROPHIC_C {
            return Err(ConfigError::ValidationFailed(
                "ctt_ceiling_c: must be below the 120C hardware catastrophic point",
            ));
        }
        if !self.page_size.is_power_of_two() || self.page_size < MIN_PAGE_SIZE {
            return Err(ConfigError::ValidationFailed(
                "page_size: must be a power of two of at least 4096",
            ));
        }
        if !(32..=64).contains(&self.phys_addr_bits) {
            return Err(ConfigError::ValidationFailed(
                "phys_addr_bits: must be within 32..=64",
            ));
        }
        Ok(())
    }

    /// Largest physical address the platform can map.
    pub fn max_phys_addr(&self) -> u64 {
        if self.phys_addr_bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.phys_addr_bits) - 1
        }
    }
}
