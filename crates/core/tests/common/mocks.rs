//! Mock backing stores for exercising the cache's memory side.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use mockall::mock;

use dbrc_core::mem::backing::{BackingStore, MainMemory};
use dbrc_core::mem::packet::{MemCmd, Packet};
use dbrc_core::sim::event::{EventQueue, SimEvent};

mock! {
    /// mockall-generated backing store for targeted contract tests.
    pub Backing {}

    impl BackingStore for Backing {
        fn recv_request(&mut self, pkt: Packet, sched: &mut EventQueue) -> Option<Packet>;
        fn functional_access(&mut self, pkt: &mut Packet);
        fn addr_ranges(&self) -> Vec<Range<u64>>;
    }
}

/// One observed memory-side request.
#[derive(Clone, Debug)]
pub struct SeenRequest {
    pub cmd: MemCmd,
    pub addr: u64,
    pub data: Vec<u8>,
}

/// Shared log of the requests a `RecordingMemory` has served.
pub type RequestLog = Rc<RefCell<Vec<SeenRequest>>>;

/// A main memory that logs every timing request it serves.
pub struct RecordingMemory {
    inner: MainMemory,
    log: RequestLog,
}

impl RecordingMemory {
    /// Creates the memory and hands back the shared request log.
    pub fn new(size: u64, latency: u64) -> (Self, RequestLog) {
        let log: RequestLog = Rc::default();
        (
            Self {
                inner: MainMemory::new(size, latency),
                log: Rc::clone(&log),
            },
            Rc::clone(&log),
        )
    }

    /// Seeds memory contents before the run.
    pub fn load(&mut self, addr: u64, data: &[u8]) {
        self.inner.load(addr, data);
    }
}

impl BackingStore for RecordingMemory {
    fn recv_request(&mut self, pkt: Packet, sched: &mut EventQueue) -> Option<Packet> {
        self.log.borrow_mut().push(SeenRequest {
            cmd: pkt.cmd(),
            addr: pkt.addr(),
            data: pkt.data().to_vec(),
        });
        self.inner.recv_request(pkt, sched)
    }

    fn functional_access(&mut self, pkt: &mut Packet) {
        self.inner.functional_access(pkt);
    }

    fn addr_ranges(&self) -> Vec<Range<u64>> {
        self.inner.addr_ranges()
    }
}

/// A memory that rejects the first timing request, schedules the retry
/// signal, and behaves like main memory afterwards.
pub struct RejectOnceMemory {
    inner: MainMemory,
    rejected: bool,
    /// Cycles until the retry signal after the rejection.
    pub retry_delay: u64,
}

impl RejectOnceMemory {
    pub fn new(size: u64, latency: u64, retry_delay: u64) -> Self {
        Self {
            inner: MainMemory::new(size, latency),
            rejected: false,
            retry_delay,
        }
    }
}

impl BackingStore for RejectOnceMemory {
    fn recv_request(&mut self, pkt: Packet, sched: &mut EventQueue) -> Option<Packet> {
        if !self.rejected {
            self.rejected = true;
            sched.schedule(self.retry_delay, SimEvent::MemRetry);
            return Some(pkt);
        }
        self.inner.recv_request(pkt, sched)
    }

    fn functional_access(&mut self, pkt: &mut Packet) {
        self.inner.functional_access(pkt);
    }

    fn addr_ranges(&self) -> Vec<Range<u64>> {
        self.inner.addr_ranges()
    }
}
