//! Backing store behind the cache's memory side.
//!
//! This module provides:
//! 1. **BackingStore:** The trait contract for the component answering the
//!    cache's line fetches and consuming its writebacks.
//! 2. **MainMemory:** A byte-addressable, fixed-latency implementation.

use std::ops::Range;

use log::trace;

use crate::mem::packet::{MemCmd, Packet};
use crate::sim::event::{EventQueue, SimEvent};

/// Contract for the store answering the cache's memory side.
///
/// Implementations receive block-aligned reads and dirty writebacks over
/// the timing path, and synchronous accesses over the functional path.
pub trait BackingStore {
    /// Receives a timing request.
    ///
    /// Reads and writes schedule a `MemResponse` on `sched` once served;
    /// writebacks are consumed without a response. An implementation that
    /// cannot accept the packet returns it to the caller and must schedule
    /// a `MemRetry` once it can make progress again.
    ///
    /// # Returns
    ///
    /// `None` if the packet was accepted, or the packet itself if the
    /// store is busy and the caller must hold it for a retry.
    fn recv_request(&mut self, pkt: Packet, sched: &mut EventQueue) -> Option<Packet>;

    /// Serves a synchronous, zero-time access; used by the host's
    /// functional path. Turns the packet into a response in place.
    fn functional_access(&mut self, pkt: &mut Packet);

    /// Returns the address ranges this store claims.
    fn addr_ranges(&self) -> Vec<Range<u64>>;
}

/// Byte-addressable main memory with a fixed access latency.
pub struct MainMemory {
    bytes: Vec<u8>,
    latency: u64,
}

impl MainMemory {
    /// Creates a memory of `size` bytes, zero-filled, with the given
    /// access latency in cycles.
    pub fn new(size: u64, latency: u64) -> Self {
        Self {
            bytes: vec![0; size as usize],
            latency,
        }
    }

    /// Loads a byte slice into memory at `addr`; used to seed test and
    /// replay contents.
    pub fn load(&mut self, addr: u64, data: &[u8]) {
        let start = addr as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
    }

    /// Returns a view of memory at `addr`.
    pub fn peek(&self, addr: u64, len: usize) -> &[u8] {
        let start = addr as usize;
        &self.bytes[start..start + len]
    }

    fn read(&self, pkt: &mut Packet) {
        let start = pkt.addr() as usize;
        let len = pkt.size();
        let src = &self.bytes[start..start + len];
        pkt.data_mut().copy_from_slice(src);
    }

    fn write(&mut self, pkt: &Packet) {
        let start = pkt.addr() as usize;
        self.bytes[start..start + pkt.size()].copy_from_slice(pkt.data());
    }
}

impl BackingStore for MainMemory {
    fn recv_request(&mut self, mut pkt: Packet, sched: &mut EventQueue) -> Option<Packet> {
        trace!(
            "memory request {:?} addr {:#x} size {}",
            pkt.cmd(),
            pkt.addr(),
            pkt.size()
        );
        match pkt.cmd() {
            MemCmd::ReadReq => {
                self.read(&mut pkt);
                pkt.make_response();
                sched.schedule(self.latency, SimEvent::MemResponse(pkt));
            }
            MemCmd::WriteReq => {
                self.write(&pkt);
                pkt.make_response();
                sched.schedule(self.latency, SimEvent::MemResponse(pkt));
            }
            MemCmd::WritebackDirty => {
                // Ownership of the payload ends here; no response.
                self.write(&pkt);
            }
        }
        None
    }

    fn functional_access(&mut self, pkt: &mut Packet) {
        match pkt.cmd() {
            MemCmd::ReadReq => self.read(pkt),
            MemCmd::WriteReq | MemCmd::WritebackDirty => self.write(pkt),
        }
        pkt.make_response();
    }

    fn addr_ranges(&self) -> Vec<Range<u64>> {
        vec![0..self.bytes.len() as u64]
    }
}
