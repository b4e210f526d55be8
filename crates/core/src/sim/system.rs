//! Top-level system wiring.
//!
//! The `System` owns the cache, the backing store, and the event queue,
//! and plays the role of the interconnect peers: CPU-side responses land
//! in per-port mailboxes (or are deferred when a port is stalled, to model
//! peer backpressure), retry signals land in a notification queue, and
//! memory-side traffic is routed to the backing store.

use crate::cache::DbrcCache;
use crate::common::error::ConfigError;
use crate::config::DbrcConfig;
use crate::mem::backing::{BackingStore, MainMemory};
use crate::mem::packet::Packet;
use crate::sim::event::{EventQueue, SimEvent};
use crate::stats::DbrcStats;
use std::collections::VecDeque;
use std::ops::Range;

/// The simulated system: cache, backing store, event queue, and the
/// CPU-side peer state.
pub struct System {
    cache: DbrcCache,
    memory: Box<dyn BackingStore>,
    queue: EventQueue,
    completed: Vec<VecDeque<Packet>>,
    retries: VecDeque<usize>,
    stalled: Vec<bool>,
}

impl System {
    /// Builds a system with a fixed-latency main memory sized from the
    /// configuration.
    pub fn new(config: &DbrcConfig, num_cpu_ports: usize) -> Result<Self, ConfigError> {
        let memory = Box::new(MainMemory::new(config.mem_size, config.mem_latency));
        Self::with_memory(config, num_cpu_ports, memory)
    }

    /// Builds a system around a caller-provided backing store.
    pub fn with_memory(
        config: &DbrcConfig,
        num_cpu_ports: usize,
        memory: Box<dyn BackingStore>,
    ) -> Result<Self, ConfigError> {
        let cache = DbrcCache::new(config, num_cpu_ports)?;
        Ok(Self {
            cache,
            memory,
            queue: EventQueue::new(),
            completed: (0..num_cpu_ports).map(|_| VecDeque::new()).collect(),
            retries: VecDeque::new(),
            stalled: vec![false; num_cpu_ports],
        })
    }

    /// Returns the current cycle.
    pub fn now(&self) -> u64 {
        self.queue.now()
    }

    /// Returns the cache.
    pub fn cache(&self) -> &DbrcCache {
        &self.cache
    }

    /// Returns the cache mutably; used by tests that drive the core
    /// directly.
    pub fn cache_mut(&mut self) -> &mut DbrcCache {
        &mut self.cache
    }

    /// Returns the cache statistics.
    pub fn stats(&self) -> &DbrcStats {
        &self.cache.stats
    }

    /// Returns the address ranges served, delegated to the backing store
    /// exactly as the cache publishes them upstream.
    pub fn addr_ranges(&self) -> Vec<Range<u64>> {
        self.memory.addr_ranges()
    }

    /// Offers a request to CPU-side port `port`.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the cache accepted; `Err(packet)` when it is blocked
    /// and the caller must retry after a retry notification.
    pub fn send_request(&mut self, port: usize, pkt: Packet) -> Result<(), Packet> {
        self.cache.handle_request(pkt, port, &mut self.queue)
    }

    /// Serves a synchronous access outside the timing model: hits are
    /// satisfied by the cache, misses pass through to the backing store.
    pub fn functional_access(&mut self, pkt: &mut Packet) {
        if !self.cache.handle_functional(pkt) {
            self.memory.functional_access(pkt);
        }
    }

    /// Takes the next completed response for `port`, if any.
    pub fn take_response(&mut self, port: usize) -> Option<Packet> {
        self.completed[port].pop_front()
    }

    /// Takes the next pending retry notification, if any.
    pub fn take_retry(&mut self) -> Option<usize> {
        self.retries.pop_front()
    }

    /// Stalls or unstalls response delivery on `port`, modeling a peer
    /// that cannot sink responses; a stalled delivery is parked in the
    /// port and resent by `retry_response`.
    pub fn set_response_stall(&mut self, port: usize, stalled: bool) {
        self.stalled[port] = stalled;
    }

    /// Signals that the peer on `port` can sink responses again.
    pub fn retry_response(&mut self, port: usize) {
        self.stalled[port] = false;
        self.cache.recv_resp_retry(port, &mut self.queue);
    }

    /// Dispatches the next pending event.
    ///
    /// # Returns
    ///
    /// `false` if no events were pending.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.queue.pop() else {
            return false;
        };
        match event {
            SimEvent::CacheAccess(pkt) => self.cache.access_timing(pkt, &mut self.queue),
            SimEvent::MemRequest(pkt) => {
                if let Some(rejected) = self.memory.recv_request(pkt, &mut self.queue) {
                    self.cache.park_mem_packet(rejected);
                }
            }
            SimEvent::MemRetry => self.cache.handle_mem_retry(&mut self.queue),
            SimEvent::MemResponse(pkt) => self.cache.handle_response(pkt, &mut self.queue),
            SimEvent::CpuResponse { port, pkt } => {
                if self.stalled[port] {
                    self.cache.defer_response(port, pkt);
                } else {
                    self.completed[port].push_back(pkt);
                }
            }
            SimEvent::CpuRetry { port } => self.retries.push_back(port),
        }
        true
    }

    /// Runs until no events remain.
    pub fn run_until_idle(&mut self) {
        while self.step() {}
    }

    /// Sends one request through the full timing path and returns its
    /// response, retrying while the cache is blocked.
    ///
    /// # Panics
    ///
    /// Panics if the system drains without producing a response; that
    /// means the pipeline dropped a request, which cannot happen in a
    /// correct model.
    pub fn perform(&mut self, port: usize, pkt: Packet) -> Packet {
        let mut pending = Some(pkt);
        while let Some(pkt) = pending.take() {
            if let Err(back) = self.send_request(port, pkt) {
                pending = Some(back);
                if !self.step() {
                    panic!("system idle while a request is still rejected");
                }
            }
        }
        loop {
            if let Some(resp) = self.take_response(port) {
                return resp;
            }
            if !self.step() {
                panic!("system idle without a response");
            }
        }
    }
}
