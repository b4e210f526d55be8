//! The DBRC cache core.
//!
//! A fully-associative, multi-level indirect-mapped cache. Data is located
//! through a hierarchy of translation tables stored inside the same block
//! arena as user data: a dense root table (L0T) points at level-1 table
//! blocks, which point at level-2 blocks, and so on down to the data
//! leaves. This module implements:
//! 1. **Walker:** The root-to-leaf descent with a translation-cache fast
//!    path and reuse-counter updates.
//! 2. **Access:** Read/write of a resident leaf at sub-block granularity.
//! 3. **Insertion:** On-demand allocation of missing chain levels, with
//!    previous-owner invalidation and dirty writeback.
//! 4. **Pipeline:** The blocking request front end: one outstanding miss,
//!    delayed access events, sub-block-to-line upgrades, and response
//!    routing with port retry notification.

/// Block arena types (table slots, metadata, blocks).
pub mod block;

/// Bounded LRU translation cache.
pub mod tlb;

/// Rotating-cursor victim selection.
pub mod victim;

use log::{debug, trace};

use crate::common::error::ConfigError;
use crate::config::{DbrcConfig, Geometry};
use crate::mem::packet::Packet;
use crate::port::{CpuSidePort, MemSidePort};
use crate::sim::event::{EventQueue, SimEvent};
use crate::stats::DbrcStats;

pub use block::{BthEntry, Block, BlockMeta, REUSE_CEILING};
pub use tlb::TranslationCache;
pub use victim::VictimSelector;

/// Outcome of a translation walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The leaf holding the block is resident at this arena index.
    Hit(u32),
    /// No resident leaf.
    Miss {
        /// Deepest existing table block on the chain, or `None` if the
        /// walk already missed at the root table.
        deepest: Option<u32>,
    },
}

/// The Dynamic Block Relocation Cache.
///
/// Owns the block arena, the root table, the translation cache, the victim
/// cursor, the port flow-control state, and the blocking pipeline state.
pub struct DbrcCache {
    geom: Geometry,
    l0t: Vec<BthEntry>,
    dba: Vec<Block>,
    tlb: TranslationCache,
    victims: VictimSelector,

    cpu_ports: Vec<CpuSidePort>,
    mem_port: MemSidePort,

    blocked: bool,
    waiting_port: Option<usize>,
    original_packet: Option<Packet>,
    miss_time: u64,

    /// Hit/miss counters and the miss-latency histogram.
    pub stats: DbrcStats,
}

impl DbrcCache {
    /// Creates the cache from a configuration, with `num_cpu_ports`
    /// CPU-side ports.
    ///
    /// All blocks are allocated here and never freed; their level fields
    /// gate reuse.
    ///
    /// # Returns
    ///
    /// The cache, or the configuration fault that makes it unbuildable.
    pub fn new(config: &DbrcConfig, num_cpu_ports: usize) -> Result<Self, ConfigError> {
        let geom = config.geometry()?;
        let dba = (0..geom.capacity)
            .map(|_| Block::new(geom.fanout, geom.block_size))
            .collect();
        Ok(Self {
            geom,
            l0t: vec![BthEntry::default(); geom.l0t_slots],
            dba,
            tlb: TranslationCache::new(geom.tlb_size),
            victims: VictimSelector::new(),
            cpu_ports: (0..num_cpu_ports).map(CpuSidePort::new).collect(),
            mem_port: MemSidePort::new(),
            blocked: false,
            waiting_port: None,
            original_packet: None,
            miss_time: 0,
            stats: DbrcStats::default(),
        })
    }

    /// Returns the derived geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geom
    }

    /// Returns a block by arena index.
    pub fn block(&self, index: u32) -> &Block {
        &self.dba[index as usize]
    }

    /// Returns a block mutably; a debugging and test aid for staging
    /// arena states, never used on the simulated path.
    pub fn block_mut(&mut self, index: u32) -> &mut Block {
        &mut self.dba[index as usize]
    }

    /// Returns the root table.
    pub fn root_table(&self) -> &[BthEntry] {
        &self.l0t
    }

    /// Returns the translation cache.
    pub fn translation_cache(&self) -> &TranslationCache {
        &self.tlb
    }

    /// Returns the victim cursor where the next scan starts.
    pub fn victim_cursor(&self) -> u32 {
        self.victims.cursor()
    }

    /// Returns whether a request is in flight.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    // ── Walker ──────────────────────────────────────────────────────────

    /// Locates the leaf holding the block containing `addr`.
    ///
    /// Consults the translation cache first; otherwise descends from the
    /// root table, bumping the reuse counter of every block entered below
    /// level 1 and validating the leaf's tag at the bottom. A successful
    /// walk installs the translation in the translation cache. All
    /// failures are reported as misses, never as errors.
    pub fn lookup(&mut self, addr: u64) -> Lookup {
        let tag = self.geom.block_tag(addr);

        if let Some(index) = self.tlb.get(tag) {
            let b = &self.dba[index as usize];
            if b.meta.level == self.geom.levels && b.meta.valid && b.tag == tag {
                return Lookup::Hit(index);
            }
            // A mapping that fails validation is stale; drop it and walk.
            self.tlb.invalidate(tag);
        }

        let root = self.l0t[self.geom.l0t_index(addr)];
        if !root.valid {
            return Lookup::Miss { deepest: None };
        }
        let mut cur = root.index;
        {
            let b = &self.dba[cur as usize];
            if !(b.meta.valid && b.meta.parent_valid && b.meta.level == 1) {
                // The slot outlived its block; the insertion engine treats
                // it as stale.
                return Lookup::Miss { deepest: None };
            }
        }

        for level in 1..self.geom.levels {
            let slot = self.geom.table_slot(addr, level);
            let entry = self.dba[cur as usize].table[slot];
            if !entry.valid {
                return Lookup::Miss { deepest: Some(cur) };
            }
            cur = entry.index;
            self.dba[cur as usize].bump_reuse();
        }

        let leaf = &self.dba[cur as usize];
        if leaf.meta.level == self.geom.levels && leaf.meta.valid && leaf.tag == tag {
            self.tlb.put(tag, cur);
            Lookup::Hit(cur)
        } else if self.geom.levels == 1 {
            Lookup::Miss { deepest: None }
        } else {
            Lookup::Miss {
                deepest: Some(self.dba[cur as usize].parent),
            }
        }
    }

    /// Structural descent without reuse or translation-cache side effects;
    /// used by the insertion engine to find where the chain ends.
    fn deepest_table(&self, addr: u64) -> Option<u32> {
        let root = self.l0t[self.geom.l0t_index(addr)];
        if !root.valid {
            return None;
        }
        let mut cur = root.index;
        {
            let b = &self.dba[cur as usize];
            if !(b.meta.valid && b.meta.parent_valid && b.meta.level == 1) {
                return None;
            }
        }
        for level in 1..self.geom.levels {
            let slot = self.geom.table_slot(addr, level);
            let entry = self.dba[cur as usize].table[slot];
            if !entry.valid {
                return Some(cur);
            }
            cur = entry.index;
        }
        // A full chain exists; the leaf's parent is the deepest table.
        if self.geom.levels == 1 {
            None
        } else {
            Some(self.dba[cur as usize].parent)
        }
    }

    // ── Functional access ───────────────────────────────────────────────

    /// Performs the packet's read or write against the resident leaf, or
    /// reports a miss without modifying block contents.
    ///
    /// # Panics
    ///
    /// Panics on a packet that is neither read nor write, or one spanning
    /// multiple blocks; both violate the port contract.
    pub fn access_functional(&mut self, pkt: &mut Packet) -> bool {
        assert!(
            pkt.fits_in_block(self.geom.block_size),
            "access at {:#x} size {} spans multiple cache blocks",
            pkt.addr(),
            pkt.size()
        );
        let index = match self.lookup(pkt.addr()) {
            Lookup::Hit(index) => index,
            Lookup::Miss { .. } => return false,
        };
        let block = &mut self.dba[index as usize];
        if pkt.is_write() {
            pkt.write_data_to_block(&mut block.data, self.geom.block_size);
            block.meta.dirty = true;
        } else if pkt.is_read() {
            pkt.set_data_from_block(&block.data, self.geom.block_size);
        } else {
            panic!("unknown packet type on the cpu side");
        }
        true
    }

    // ── Pipeline ────────────────────────────────────────────────────────

    /// Receives a request on CPU-side port `port`.
    ///
    /// Accepted requests block the cache and schedule the delayed access.
    /// A request arriving while the cache is blocked, or while the port
    /// still owes its peer a retry, is rejected and handed back; the peer
    /// is signalled when it may retry.
    ///
    /// # Returns
    ///
    /// `Ok(())` when accepted, `Err(packet)` when the caller must retry.
    pub fn handle_request(
        &mut self,
        pkt: Packet,
        port: usize,
        sched: &mut EventQueue,
    ) -> Result<(), Packet> {
        if !self.cpu_ports[port].can_accept() {
            trace!("request for addr {:#x} rejected at port {}", pkt.addr(), port);
            self.cpu_ports[port].set_need_retry();
            return Err(pkt);
        }
        if self.blocked {
            trace!("request for addr {:#x} stalled, cache blocked", pkt.addr());
            self.cpu_ports[port].set_need_retry();
            return Err(pkt);
        }

        debug!("got request for addr {:#x}", pkt.addr());
        self.blocked = true;
        assert!(self.waiting_port.is_none(), "waiting port while idle");
        self.waiting_port = Some(port);
        sched.schedule(self.geom.latency, SimEvent::CacheAccess(pkt));
        Ok(())
    }

    /// Performs the delayed access for an accepted request.
    ///
    /// On a hit the response goes straight back. On a miss, a packet that
    /// is already line-aligned and line-sized is forwarded as-is;
    /// otherwise a line-sized read is forwarded and the original packet
    /// is stashed for replay after the fill.
    pub fn access_timing(&mut self, mut pkt: Packet, sched: &mut EventQueue) {
        let hit = self.access_functional(&mut pkt);
        debug!("{} for addr {:#x}", if hit { "hit" } else { "miss" }, pkt.addr());

        if hit {
            self.stats.hits += 1;
            pkt.make_response();
            self.send_response(pkt, sched);
            return;
        }

        self.stats.misses += 1;
        self.miss_time = sched.now();

        let block_addr = pkt.block_addr(self.geom.block_size);
        if pkt.addr() == block_addr && pkt.size() as u64 == self.geom.block_size {
            trace!("forwarding aligned packet for addr {:#x}", pkt.addr());
            self.mem_port.send(pkt, sched);
        } else {
            assert!(
                pkt.is_read() || pkt.is_write(),
                "unknown packet type in upgrade to block size"
            );
            trace!("upgrading packet at {:#x} to block size", pkt.addr());
            let upgrade = Packet::read_req(block_addr, self.geom.block_size as usize);
            assert!(self.original_packet.is_none(), "upgrade while one is pending");
            self.original_packet = Some(pkt);
            self.mem_port.send(upgrade, sched);
        }
    }

    /// Receives a backing-store response: installs the line, replays a
    /// stashed sub-block packet if the miss was upgraded, and delivers the
    /// response.
    ///
    /// # Panics
    ///
    /// Panics if no request is in flight, or if the replayed access does
    /// not hit after the insert.
    pub fn handle_response(&mut self, pkt: Packet, sched: &mut EventQueue) {
        assert!(self.blocked, "backing-store response while idle");
        debug!("got response for addr {:#x}", pkt.addr());

        // Inserts are off the critical path and add no modeled latency.
        self.insert(&pkt, sched);
        let latency = sched.now() - self.miss_time;
        self.stats.miss_latency.sample(latency);

        if let Some(mut original) = self.original_packet.take() {
            trace!("replaying original packet at {:#x}", original.addr());
            let hit = self.access_functional(&mut original);
            assert!(hit, "access must hit after insert");
            original.make_response();
            // The line-sized upgrade packet is dropped here.
            self.send_response(original, sched);
        } else {
            self.send_response(pkt, sched);
        }
    }

    /// Delivers a response to the waiting port and unblocks.
    ///
    /// Unblocking happens before delivery so the peer can issue a new
    /// request in the same call chain, then every port owing a retry is
    /// signalled in port order.
    fn send_response(&mut self, pkt: Packet, sched: &mut EventQueue) {
        assert!(self.blocked, "response with no request in flight");
        let port = self.waiting_port.take().expect("blocked without a port");
        self.blocked = false;

        self.cpu_ports[port].send(pkt, sched);
        for p in &mut self.cpu_ports {
            p.try_send_retry(sched);
        }
    }

    /// Serves a synchronous host access: satisfied from the cache on a
    /// hit, otherwise the caller forwards it to the backing store.
    ///
    /// # Returns
    ///
    /// `true` if the packet was satisfied and turned into a response.
    pub fn handle_functional(&mut self, pkt: &mut Packet) -> bool {
        if self.access_functional(pkt) {
            pkt.make_response();
            true
        } else {
            false
        }
    }

    // ── Port plumbing ───────────────────────────────────────────────────

    /// Parks a response the CPU-side peer refused.
    pub fn defer_response(&mut self, port: usize, pkt: Packet) {
        self.cpu_ports[port].defer(pkt);
    }

    /// Resends the deferred response after the peer's retry, then emits
    /// any owed request-retry signal for the port.
    pub fn recv_resp_retry(&mut self, port: usize, sched: &mut EventQueue) {
        let pkt = self.cpu_ports[port]
            .take_deferred()
            .expect("response retry with no deferred response");
        trace!("retrying response for addr {:#x}", pkt.addr());
        self.cpu_ports[port].send(pkt, sched);
        self.cpu_ports[port].try_send_retry(sched);
    }

    /// Emits the port's owed retry signal if it is free.
    pub fn try_send_retry(&mut self, port: usize, sched: &mut EventQueue) -> bool {
        self.cpu_ports[port].try_send_retry(sched)
    }

    /// Parks a request the backing store refused.
    pub fn park_mem_packet(&mut self, pkt: Packet) {
        self.mem_port.defer(pkt);
    }

    /// Resends the parked memory-side request after the store's retry.
    pub fn handle_mem_retry(&mut self, sched: &mut EventQueue) {
        self.mem_port.retry(sched);
    }

    // ── Insertion engine ────────────────────────────────────────────────

    /// Installs a line-sized backing-store response, allocating every
    /// missing level of its translation chain top-down.
    ///
    /// Each level claims a victim block, invalidates that block's previous
    /// owner (parent slot, translation-cache entry, child parent-validity,
    /// dirty writeback as applicable), reinitializes it, and links it under
    /// its parent. Chain blocks are pinned for the duration so a later
    /// scan within this insertion cannot reclaim them.
    ///
    /// # Panics
    ///
    /// Panics if the packet is not a block-aligned, block-sized response,
    /// or if the address is still mapped by the translation cache.
    pub fn insert(&mut self, pkt: &Packet, sched: &mut EventQueue) {
        let block_size = self.geom.block_size;
        assert!(pkt.is_response(), "insert of a non-response packet");
        assert!(
            pkt.addr() == pkt.block_addr(block_size) && pkt.size() as u64 == block_size,
            "insert of an unaligned or partial packet at {:#x}",
            pkt.addr()
        );
        let addr = pkt.addr();
        let tag = self.geom.block_tag(addr);
        assert!(
            self.tlb.peek(tag).is_none(),
            "insert target {:#x} is already mapped",
            addr
        );
        debug!("inserting line for addr {:#x}", addr);

        let deepest = self.deepest_table(addr);
        let mut pinned: Vec<u32> = Vec::with_capacity(usize::from(self.geom.levels) + 1);

        let (mut level, mut parent) = match deepest {
            Some(index) => (self.dba[index as usize].meta.level, Some(index)),
            None => {
                let slot = self.geom.l0t_index(addr);
                if self.l0t[slot].valid {
                    // Stale root mapping: orphan the block it references
                    // before the slot is rewritten.
                    self.orphan(self.l0t[slot].index);
                }
                (0, None)
            }
        };

        if let Some(index) = parent {
            self.dba[index as usize].meta.locked = true;
            pinned.push(index);
        }

        level += 1;
        while level <= self.geom.levels {
            let v = self.victims.select(&mut self.dba, self.geom.max_scan_attempts);
            self.evict(v, sched);

            self.dba[v as usize].reset(level);
            self.dba[v as usize].meta.locked = true;
            pinned.push(v);

            if level == 1 {
                let slot = self.geom.l0t_index(addr);
                self.l0t[slot] = BthEntry {
                    valid: true,
                    index: v,
                };
                self.dba[v as usize].parent = slot as u32;
            } else {
                let p = parent.expect("interior level without a parent");
                let slot = self.geom.table_slot(addr, level - 1);
                let old = self.dba[p as usize].table[slot];
                if old.valid {
                    self.orphan(old.index);
                }
                self.dba[p as usize].table[slot] = BthEntry {
                    valid: true,
                    index: v,
                };
                self.dba[v as usize].parent = p;
            }

            parent = Some(v);
            level += 1;
        }

        let leaf = parent.expect("chain ended without a leaf") as usize;
        self.dba[leaf].tag = tag;
        self.dba[leaf].data.copy_from_slice(pkt.data());
        self.tlb.put(tag, leaf as u32);

        for index in pinned {
            self.dba[index as usize].meta.locked = false;
        }
    }

    /// Severs a block from the tree without touching its parent slot: the
    /// parent-valid bit is cleared, and a leaf's translation-cache entry
    /// goes with it.
    fn orphan(&mut self, index: u32) {
        let block = &mut self.dba[index as usize];
        block.meta.parent_valid = false;
        if block.meta.level == self.geom.levels {
            let tag = block.tag;
            self.tlb.invalidate(tag);
        }
    }

    /// Invalidates the previous owner of a claimed victim block.
    ///
    /// A reachable victim's unique parent slot is cleared. A leaf victim
    /// loses its translation-cache entry and, if dirty, is written back
    /// keyed by its tag. An interior victim orphans every child it still
    /// references.
    fn evict(&mut self, v: u32, sched: &mut EventQueue) {
        let meta = self.dba[v as usize].meta;
        if !meta.valid || meta.level == 0 {
            return;
        }

        if meta.parent_valid {
            if meta.level == 1 {
                let slot = self.dba[v as usize].parent as usize;
                self.l0t[slot].valid = false;
            } else {
                let p = self.dba[v as usize].parent as usize;
                if let Some(slot) = self.dba[p]
                    .table
                    .iter()
                    .position(|e| e.valid && e.index == v)
                {
                    self.dba[p].table[slot].valid = false;
                }
            }
        }

        if meta.level == self.geom.levels {
            let tag = self.dba[v as usize].tag;
            self.tlb.invalidate(tag);
            if meta.dirty {
                debug!("writing back dirty block tag {:#x}", tag);
                let data = self.dba[v as usize].data.clone();
                let wb = Packet::writeback(tag * self.geom.block_size, data);
                self.mem_port.send(wb, sched);
            }
            self.dba[v as usize].tag = 0;
        } else {
            for slot in 0..self.dba[v as usize].table.len() {
                let entry = self.dba[v as usize].table[slot];
                if entry.valid {
                    self.orphan(entry.index);
                }
            }
        }
    }

    // ── Integrity audit ─────────────────────────────────────────────────

    /// Checks the structural invariants of the arena, the root table, and
    /// the translation cache in a single pass.
    ///
    /// # Returns
    ///
    /// `Ok(())` when consistent, or a description of the first violation
    /// found. Intended for tests and debugging; never called on the
    /// simulated path.
    pub fn audit(&self) -> Result<(), String> {
        let leaf_level = self.geom.levels;

        // Root slots reference live level-1 blocks that point back.
        for (k, slot) in self.l0t.iter().enumerate() {
            if !slot.valid {
                continue;
            }
            let b = &self.dba[slot.index as usize];
            if b.meta.level != 1 || !b.meta.valid || !b.meta.parent_valid {
                return Err(format!(
                    "root slot {} references block {} with bad state {:?}",
                    k, slot.index, b.meta
                ));
            }
            if b.parent as usize != k {
                return Err(format!(
                    "root slot {} references block {} whose parent is {}",
                    k, slot.index, b.parent
                ));
            }
        }

        // Interior slots reference next-level blocks that point back, and
        // every reachable block has exactly one referencing slot.
        let mut parent_refs = vec![0u32; self.dba.len()];
        for slot in self.l0t.iter().filter(|s| s.valid) {
            parent_refs[slot.index as usize] += 1;
        }
        for (i, b) in self.dba.iter().enumerate() {
            if !b.meta.valid || b.meta.level == 0 || b.meta.level >= leaf_level {
                continue;
            }
            for entry in b.table.iter().filter(|e| e.valid) {
                let child = &self.dba[entry.index as usize];
                if child.meta.level != b.meta.level + 1 || !child.meta.valid {
                    return Err(format!(
                        "block {} slot to {} has bad child state {:?}",
                        i, entry.index, child.meta
                    ));
                }
                if child.parent as usize != i {
                    return Err(format!(
                        "block {} references child {} whose parent is {}",
                        i, entry.index, child.parent
                    ));
                }
                parent_refs[entry.index as usize] += 1;
            }
        }
        for (i, b) in self.dba.iter().enumerate() {
            if b.meta.valid && b.meta.level > 0 && b.meta.parent_valid && parent_refs[i] != 1 {
                return Err(format!(
                    "block {} is reachable through {} parent slots",
                    i, parent_refs[i]
                ));
            }
        }

        // Translation-cache entries map tags to live leaves.
        for (tag, index) in self.tlb.entries() {
            let b = &self.dba[index as usize];
            if b.meta.level != leaf_level || !b.meta.valid || !b.meta.parent_valid || b.tag != tag
            {
                return Err(format!(
                    "translation cache maps tag {:#x} to block {} with state {:?} tag {:#x}",
                    tag, index, b.meta, b.tag
                ));
            }
        }
        if self.tlb.len() > self.tlb.capacity() {
            return Err(format!(
                "translation cache holds {} entries over capacity {}",
                self.tlb.len(),
                self.tlb.capacity()
            ));
        }
        if self.tlb.recency().len() != self.tlb.len() {
            return Err("translation-cache recency list out of sync".to_string());
        }

        // At most one reachable leaf per tag.
        let mut tags = std::collections::HashSet::new();
        for (i, b) in self.dba.iter().enumerate() {
            if b.meta.valid && b.meta.parent_valid && b.meta.level == leaf_level {
                if !tags.insert(b.tag) {
                    return Err(format!("tag {:#x} held by two reachable leaves (block {})", b.tag, i));
                }
            }
        }

        // Reuse counters respect the ceiling.
        for (i, b) in self.dba.iter().enumerate() {
            if b.meta.reuse > REUSE_CEILING {
                return Err(format!("block {} reuse counter {} over ceiling", i, b.meta.reuse));
            }
        }

        Ok(())
    }
}
