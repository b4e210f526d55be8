//! Configuration for the DBRC cache model.
//!
//! This module defines the configuration surface of the cache. It provides:
//! 1. **Defaults:** Baseline parameters matching the reference 64 kB,
//!    three-level configuration.
//! 2. **Structure:** A serde-deserializable `DbrcConfig` (JSON is the
//!    interchange format used by the CLI).
//! 3. **Validation:** `DbrcConfig::geometry` checks every parameter at
//!    construction and derives the fixed quantities the core works with.

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants.
///
/// These values define the baseline cache when not explicitly overridden.
mod defaults {
    /// Total cache size in bytes (64 kB).
    pub const SIZE: u64 = 64 * 1024;

    /// Block size in bytes. Matches a typical cache-line size; also fixes
    /// the translation-table fan-out at half this value.
    pub const BLOCK_SIZE: u64 = 64;

    /// Number of translation levels, including the root and the leaf.
    pub const NUM_LEVELS: u8 = 3;

    /// Advisory target level for allocation (informational only).
    pub const TARGET_LEVEL: u8 = 3;

    /// Translation-cache (block TLB) capacity in entries.
    pub const TLB_SIZE: usize = 65536;

    /// Maximum victim-scan attempts before falling back to the
    /// smallest-reuse candidate seen.
    pub const MAX_SCAN_ATTEMPTS: u32 = 5;

    /// Access latency in cycles, applied between accepting a request and
    /// performing the cache access.
    pub const LATENCY: u64 = 1;

    /// Modeled backing-memory size (512 MB); bounds the root table.
    pub const MEM_SIZE: u64 = 512 * 1024 * 1024;

    /// Backing-memory access latency in cycles.
    pub const MEM_LATENCY: u64 = 100;
}

/// Cache configuration.
///
/// Deserialize from JSON or use `DbrcConfig::default()`:
///
/// ```
/// use dbrc_core::config::DbrcConfig;
///
/// let config = DbrcConfig::default();
/// let geom = config.geometry().unwrap();
/// assert_eq!(geom.capacity, 1024);
/// assert_eq!(geom.fanout, 32);
/// assert_eq!(geom.l0t_span, 64 * 32 * 32);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DbrcConfig {
    /// Total cache size in bytes; the block capacity is `size / block_size`.
    #[serde(default = "DbrcConfig::default_size")]
    pub size: u64,

    /// Block size in bytes (power of two, at least 4).
    #[serde(default = "DbrcConfig::default_block_size")]
    pub block_size: u64,

    /// Number of translation levels, including the root; the leaf level
    /// equals this value.
    #[serde(default = "DbrcConfig::default_num_levels")]
    pub num_levels: u8,

    /// Advisory target level; carried for reporting, not behaviorally
    /// significant in the core.
    #[serde(default = "DbrcConfig::default_target_level")]
    pub target_level: u8,

    /// Translation-cache capacity in entries.
    #[serde(default = "DbrcConfig::default_tlb_size")]
    pub tlb_size: usize,

    /// Maximum victim-scan attempts per selection.
    #[serde(default = "DbrcConfig::default_max_scan_attempts")]
    pub max_scan_attempts: u32,

    /// Cache access latency in cycles.
    #[serde(default = "DbrcConfig::default_latency")]
    pub latency: u64,

    /// Modeled backing-memory size in bytes; the root table densely covers
    /// this span.
    #[serde(default = "DbrcConfig::default_mem_size")]
    pub mem_size: u64,

    /// Backing-memory access latency in cycles.
    #[serde(default = "DbrcConfig::default_mem_latency")]
    pub mem_latency: u64,
}

impl DbrcConfig {
    fn default_size() -> u64 {
        defaults::SIZE
    }
    fn default_block_size() -> u64 {
        defaults::BLOCK_SIZE
    }
    fn default_num_levels() -> u8 {
        defaults::NUM_LEVELS
    }
    fn default_target_level() -> u8 {
        defaults::TARGET_LEVEL
    }
    fn default_tlb_size() -> usize {
        defaults::TLB_SIZE
    }
    fn default_max_scan_attempts() -> u32 {
        defaults::MAX_SCAN_ATTEMPTS
    }
    fn default_latency() -> u64 {
        defaults::LATENCY
    }
    fn default_mem_size() -> u64 {
        defaults::MEM_SIZE
    }
    fn default_mem_latency() -> u64 {
        defaults::MEM_LATENCY
    }

    /// Validates the configuration and derives the fixed geometry.
    ///
    /// # Returns
    ///
    /// The derived `Geometry` on success, or the first configuration fault
    /// found. Every parameter is checked here so the core can assume a
    /// consistent geometry afterwards.
    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        if !self.block_size.is_power_of_two() || self.block_size < 4 {
            return Err(ConfigError::BadBlockSize(self.block_size));
        }
        if self.size == 0 || self.size % self.block_size != 0 {
            return Err(ConfigError::SizeNotBlockMultiple {
                size: self.size,
                block_size: self.block_size,
            });
        }
        if self.num_levels == 0 {
            return Err(ConfigError::NoLevels);
        }
        if self.mem_size == 0 {
            return Err(ConfigError::NoMemory);
        }
        if self.tlb_size == 0 {
            return Err(ConfigError::NoTlbCapacity);
        }
        if self.max_scan_attempts == 0 {
            return Err(ConfigError::NoScanAttempts);
        }

        let capacity = self.size / self.block_size;
        if capacity < u64::from(self.num_levels) {
            return Err(ConfigError::CapacityTooSmall {
                capacity,
                levels: self.num_levels,
            });
        }

        let fanout = self.block_size / 2;
        let mut l0t_span = self.block_size;
        for _ in 1..self.num_levels {
            l0t_span = l0t_span
                .checked_mul(fanout)
                .ok_or(ConfigError::BadRootSpan {
                    span: None,
                    mem_size: self.mem_size,
                })?;
        }
        if l0t_span > self.mem_size {
            return Err(ConfigError::BadRootSpan {
                span: Some(l0t_span),
                mem_size: self.mem_size,
            });
        }
        let l0t_slots = (self.mem_size + l0t_span - 1) / l0t_span;

        Ok(Geometry {
            block_size: self.block_size,
            fanout,
            levels: self.num_levels,
            capacity: capacity as u32,
            l0t_span,
            l0t_slots: l0t_slots as usize,
            tlb_size: self.tlb_size,
            max_scan_attempts: self.max_scan_attempts,
            latency: self.latency,
        })
    }
}

impl Default for DbrcConfig {
    fn default() -> Self {
        Self {
            size: defaults::SIZE,
            block_size: defaults::BLOCK_SIZE,
            num_levels: defaults::NUM_LEVELS,
            target_level: defaults::TARGET_LEVEL,
            tlb_size: defaults::TLB_SIZE,
            max_scan_attempts: defaults::MAX_SCAN_ATTEMPTS,
            latency: defaults::LATENCY,
            mem_size: defaults::MEM_SIZE,
            mem_latency: defaults::MEM_LATENCY,
        }
    }
}

/// Fixed quantities derived from a validated configuration.
///
/// The geometry is computed once at construction; all address arithmetic in
/// the core goes through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Block size in bytes.
    pub block_size: u64,
    /// Fan-out of each translation table (half the block size, so a table
    /// of 2-byte entries exactly occupies one block).
    pub fanout: u64,
    /// Number of translation levels; the leaf level equals this value.
    pub levels: u8,
    /// Number of blocks in the data block array.
    pub capacity: u32,
    /// Address span covered by one root-table slot.
    pub l0t_span: u64,
    /// Number of root-table slots (dense over the modeled memory).
    pub l0t_slots: usize,
    /// Translation-cache capacity in entries.
    pub tlb_size: usize,
    /// Maximum victim-scan attempts per selection.
    pub max_scan_attempts: u32,
    /// Cache access latency in cycles.
    pub latency: u64,
}

impl Geometry {
    /// Returns the block-aligned base of `addr`.
    #[inline(always)]
    pub fn block_addr(&self, addr: u64) -> u64 {
        crate::common::addr::block_addr(addr, self.block_size)
    }

    /// Returns the block tag of `addr`.
    #[inline(always)]
    pub fn block_tag(&self, addr: u64) -> u64 {
        crate::common::addr::block_tag(addr, self.block_size)
    }

    /// Returns the root-table slot index covering `addr`.
    ///
    /// # Panics
    ///
    /// Panics if `addr` lies outside the modeled memory span; requests for
    /// such addresses violate the port contract and are fatal.
    #[inline]
    pub fn l0t_index(&self, addr: u64) -> usize {
        let idx = (addr / self.l0t_span) as usize;
        assert!(
            idx < self.l0t_slots,
            "address {:#x} is outside the modeled memory range",
            addr
        );
        idx
    }

    /// Returns the table-slot index within a level-`parent_level` table for
    /// the chain covering `addr`.
    ///
    /// Slot selection consumes successive address digits base `fanout`: a
    /// level-k table's slot is `(addr / (l0t_span / fanout^k)) % fanout`.
    #[inline]
    pub fn table_slot(&self, addr: u64, parent_level: u8) -> usize {
        let divisor = self.l0t_span / self.fanout.pow(u32::from(parent_level));
        ((addr / divisor) % self.fanout) as usize
    }
}
