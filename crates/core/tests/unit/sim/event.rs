//! Event-Queue Unit Tests.
//!
//! Verifies timeline ordering: earliest tick first, scheduling order
//! within a tick, and cycle-counter advancement on dispatch.

use dbrc_core::mem::packet::Packet;
use dbrc_core::sim::event::{EventQueue, SimEvent};

fn marker(addr: u64) -> SimEvent {
    SimEvent::CacheAccess(Packet::read_req(addr, 1))
}

fn addr_of(event: SimEvent) -> u64 {
    match event {
        SimEvent::CacheAccess(pkt) => pkt.addr(),
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn pops_in_tick_order() {
    let mut queue = EventQueue::new();
    queue.schedule(5, marker(5));
    queue.schedule(1, marker(1));
    queue.schedule(3, marker(3));
    assert_eq!(addr_of(queue.pop().unwrap()), 1);
    assert_eq!(addr_of(queue.pop().unwrap()), 3);
    assert_eq!(addr_of(queue.pop().unwrap()), 5);
    assert!(queue.pop().is_none());
}

#[test]
fn same_tick_events_fire_in_scheduling_order() {
    let mut queue = EventQueue::new();
    for addr in 0..5 {
        queue.schedule(2, marker(addr));
    }
    for addr in 0..5 {
        assert_eq!(addr_of(queue.pop().unwrap()), addr);
    }
}

#[test]
fn now_advances_to_the_fired_tick() {
    let mut queue = EventQueue::new();
    assert_eq!(queue.now(), 0);
    queue.schedule(4, marker(0));
    queue.pop().unwrap();
    assert_eq!(queue.now(), 4);
}

#[test]
fn delays_are_relative_to_the_current_cycle() {
    let mut queue = EventQueue::new();
    queue.schedule(2, marker(0));
    queue.pop().unwrap();
    // Scheduled at now=2, so it fires at 2 + 3.
    queue.schedule(3, marker(1));
    queue.pop().unwrap();
    assert_eq!(queue.now(), 5);
}

#[test]
fn zero_delay_fires_at_the_current_cycle() {
    let mut queue = EventQueue::new();
    queue.schedule(7, marker(0));
    queue.pop().unwrap();
    queue.schedule(0, marker(1));
    queue.pop().unwrap();
    assert_eq!(queue.now(), 7);
}

#[test]
fn len_and_is_empty_track_pending_events() {
    let mut queue = EventQueue::new();
    assert!(queue.is_empty());
    queue.schedule(1, marker(0));
    queue.schedule(2, marker(1));
    assert_eq!(queue.len(), 2);
    queue.pop();
    assert_eq!(queue.len(), 1);
    queue.pop();
    assert!(queue.is_empty());
}
