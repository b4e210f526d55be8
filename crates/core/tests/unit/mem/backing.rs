//! Backing-Store Unit Tests.
//!
//! Verifies main memory's timing responses, writeback consumption, the
//! functional path, and address-range reporting.

use dbrc_core::mem::backing::{BackingStore, MainMemory};
use dbrc_core::mem::packet::Packet;
use dbrc_core::sim::event::{EventQueue, SimEvent};

#[test]
fn read_request_is_answered_after_the_latency() {
    let mut mem = MainMemory::new(256, 7);
    mem.load(0x40, &[1, 2, 3, 4, 5, 6, 7, 8]);
    let mut queue = EventQueue::new();

    assert!(mem.recv_request(Packet::read_req(0x40, 8), &mut queue).is_none());
    match queue.pop().unwrap() {
        SimEvent::MemResponse(pkt) => {
            assert!(pkt.is_response());
            assert_eq!(pkt.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(queue.now(), 7);
}

#[test]
fn write_request_is_applied_and_acknowledged() {
    let mut mem = MainMemory::new(256, 3);
    let mut queue = EventQueue::new();

    mem.recv_request(Packet::write_req(0x10, vec![0xEE, 0xFF]), &mut queue);
    assert!(matches!(queue.pop(), Some(SimEvent::MemResponse(_))));
    assert_eq!(mem.peek(0x10, 2), &[0xEE, 0xFF]);
}

#[test]
fn writeback_is_consumed_without_a_response() {
    let mut mem = MainMemory::new(256, 3);
    let mut queue = EventQueue::new();

    mem.recv_request(Packet::writeback(0x80, vec![9; 8]), &mut queue);
    assert!(queue.is_empty(), "writebacks are fire-and-forget");
    assert_eq!(mem.peek(0x80, 8), &[9; 8]);
}

#[test]
fn functional_access_is_synchronous() {
    let mut mem = MainMemory::new(256, 100);
    mem.load(0x20, &[0x42]);

    let mut read = Packet::read_req(0x20, 1);
    mem.functional_access(&mut read);
    assert!(read.is_response());
    assert_eq!(read.data(), &[0x42]);

    let mut write = Packet::write_req(0x21, vec![0x43]);
    mem.functional_access(&mut write);
    assert!(write.is_response());
    assert_eq!(mem.peek(0x21, 1), &[0x43]);
}

#[test]
fn addr_ranges_cover_the_whole_store() {
    let mem = MainMemory::new(1024, 1);
    let ranges = mem.addr_ranges();
    assert_eq!(ranges, vec![0..1024]);
}
