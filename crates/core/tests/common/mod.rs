//! Shared test infrastructure for the cache-model suite.

/// Mock backing stores.
pub mod mocks;

use dbrc_core::config::DbrcConfig;
use dbrc_core::mem::packet::Packet;

/// A small, deterministic two-level configuration.
///
/// With these parameters:
///   - block size 8 → fan-out 4
///   - levels 2 → root-slot span = 8 · 4 = 32 bytes
///   - size 64 → capacity 8 blocks
///   - memory 1024 bytes → 32 root slots
///
/// Leaf slot within a level-1 table: `(addr / 8) % 4`.
pub fn two_level_config() -> DbrcConfig {
    DbrcConfig {
        size: 64,
        block_size: 8,
        num_levels: 2,
        target_level: 2,
        tlb_size: 4,
        max_scan_attempts: 2,
        latency: 1,
        mem_size: 1024,
        mem_latency: 10,
    }
}

/// A small three-level configuration.
///
/// With these parameters:
///   - block size 8 → fan-out 4
///   - levels 3 → root-slot span = 8 · 4 · 4 = 128 bytes
///   - size 96 → capacity 12 blocks
///   - memory 1024 bytes → 8 root slots
///
/// Level-1 slot: `(addr / 32) % 4`; level-2 (leaf) slot: `(addr / 8) % 4`.
pub fn three_level_config() -> DbrcConfig {
    DbrcConfig {
        size: 96,
        block_size: 8,
        num_levels: 3,
        target_level: 3,
        tlb_size: 8,
        max_scan_attempts: 5,
        latency: 1,
        mem_size: 1024,
        mem_latency: 10,
    }
}

/// Builds a block-sized read response for `block_addr`, carrying `data`.
///
/// This is what the backing store hands the cache after a line fetch.
pub fn line_response(block_addr: u64, data: &[u8]) -> Packet {
    let mut pkt = Packet::read_req(block_addr, data.len());
    pkt.data_mut().copy_from_slice(data);
    pkt.make_response();
    pkt
}

/// A recognizable per-block fill pattern: byte i of the block at `addr`
/// is `(addr + i) & 0xff`.
pub fn pattern(addr: u64, len: usize) -> Vec<u8> {
    (0..len).map(|i| (addr + i as u64) as u8).collect()
}
