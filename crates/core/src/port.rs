//! Port flow-control state.
//!
//! Both sides of the cache use the same simple discipline, workable because
//! the cache is blocking: each port holds at most one deferred packet, and
//! a CPU-side port additionally remembers whether it rejected an inbound
//! request and owes its peer a retry signal.

use log::trace;

use crate::mem::packet::Packet;
use crate::sim::event::{EventQueue, SimEvent};

/// CPU-side port: receives requests, sends responses.
pub struct CpuSidePort {
    id: usize,
    /// Response that the peer could not accept, held for its retry.
    blocked_packet: Option<Packet>,
    /// A request was rejected while the cache was blocked; the peer must
    /// be told when it may retry.
    need_retry: bool,
}

impl CpuSidePort {
    /// Creates the port with the given index.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            blocked_packet: None,
            need_retry: false,
        }
    }

    /// Returns whether the port can take a new inbound request.
    pub fn can_accept(&self) -> bool {
        self.blocked_packet.is_none() && !self.need_retry
    }

    /// Returns whether the port owes its peer a retry signal.
    pub fn needs_retry(&self) -> bool {
        self.need_retry
    }

    /// Records that an inbound request was rejected.
    pub fn set_need_retry(&mut self) {
        self.need_retry = true;
    }

    /// Schedules delivery of a response to the peer.
    ///
    /// # Panics
    ///
    /// Panics if a deferred response is already held; the blocking cache
    /// never has two responses in flight on one port.
    pub fn send(&mut self, pkt: Packet, sched: &mut EventQueue) {
        assert!(
            self.blocked_packet.is_none(),
            "cpu port {} sent a response while one is deferred",
            self.id
        );
        trace!("sending response for addr {:#x} to port {}", pkt.addr(), self.id);
        sched.schedule(0, SimEvent::CpuResponse { port: self.id, pkt });
    }

    /// Parks a response the peer refused; it is resent on the peer's
    /// retry.
    pub fn defer(&mut self, pkt: Packet) {
        assert!(
            self.blocked_packet.is_none(),
            "cpu port {} already holds a deferred response",
            self.id
        );
        self.blocked_packet = Some(pkt);
    }

    /// Takes the deferred response back for resending.
    pub fn take_deferred(&mut self) -> Option<Packet> {
        self.blocked_packet.take()
    }

    /// Emits the owed retry signal if the port is completely free.
    ///
    /// # Returns
    ///
    /// `true` if the signal was emitted and the flag cleared.
    pub fn try_send_retry(&mut self, sched: &mut EventQueue) -> bool {
        if self.need_retry && self.blocked_packet.is_none() {
            self.need_retry = false;
            trace!("sending retry signal on port {}", self.id);
            sched.schedule(0, SimEvent::CpuRetry { port: self.id });
            true
        } else {
            false
        }
    }
}

/// Memory-side port: sends requests, receives responses.
#[derive(Default)]
pub struct MemSidePort {
    /// Request the backing store could not accept, held for its retry.
    blocked_packet: Option<Packet>,
}

impl MemSidePort {
    /// Creates the port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules delivery of a request to the backing store.
    ///
    /// # Panics
    ///
    /// Panics if a rejected request is already held.
    pub fn send(&mut self, pkt: Packet, sched: &mut EventQueue) {
        assert!(
            self.blocked_packet.is_none(),
            "memory port sent a request while one is held for retry"
        );
        sched.schedule(0, SimEvent::MemRequest(pkt));
    }

    /// Parks a request the backing store refused.
    pub fn defer(&mut self, pkt: Packet) {
        assert!(
            self.blocked_packet.is_none(),
            "memory port already holds a rejected request"
        );
        self.blocked_packet = Some(pkt);
    }

    /// Resends the held request after the backing store's retry signal.
    pub fn retry(&mut self, sched: &mut EventQueue) {
        let pkt = self
            .blocked_packet
            .take()
            .expect("memory retry with no held request");
        self.send(pkt, sched);
    }
}
