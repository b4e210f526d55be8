//! Translation-Cache (B-TLB) Unit Tests.
//!
//! Verifies the bounded LRU map of leaf translations: insertion, lookup
//! with recency refresh, capacity eviction in least-recently-used order,
//! and invalidation. The recency structure must stay a permutation of the
//! map's keys through every mutation.

use dbrc_core::cache::tlb::TranslationCache;

// ──────────────────────────────────────────────────────────
// Helper: assert the recency list matches the map
// ──────────────────────────────────────────────────────────

fn assert_in_sync(tlb: &TranslationCache) {
    let recency = tlb.recency();
    assert_eq!(recency.len(), tlb.len(), "recency list length diverged");
    for tag in recency {
        assert!(tlb.peek(tag).is_some(), "recency holds unmapped tag {:#x}", tag);
    }
}

// ══════════════════════════════════════════════════════════
// 1. Basic get / put
// ══════════════════════════════════════════════════════════

#[test]
fn empty_lookup_misses() {
    let mut tlb = TranslationCache::new(4);
    assert_eq!(tlb.get(0x42), None);
    assert!(tlb.is_empty());
}

#[test]
fn put_then_get_roundtrip() {
    let mut tlb = TranslationCache::new(4);
    tlb.put(0x42, 7);
    assert_eq!(tlb.get(0x42), Some(7));
    assert_eq!(tlb.len(), 1);
    assert_in_sync(&tlb);
}

#[test]
fn put_refreshes_existing_mapping() {
    let mut tlb = TranslationCache::new(4);
    tlb.put(0x42, 7);
    tlb.put(0x42, 9);
    assert_eq!(tlb.get(0x42), Some(9));
    assert_eq!(tlb.len(), 1, "re-put must not duplicate the entry");
    assert_in_sync(&tlb);
}

#[test]
fn peek_does_not_touch_recency() {
    let mut tlb = TranslationCache::new(2);
    tlb.put(1, 10);
    tlb.put(2, 20);
    // Peeking the oldest must not save it from eviction.
    assert_eq!(tlb.peek(1), Some(10));
    tlb.put(3, 30);
    assert_eq!(tlb.peek(1), None, "peeked entry should still be the LRU victim");
    assert_in_sync(&tlb);
}

// ══════════════════════════════════════════════════════════
// 2. Capacity eviction
// ══════════════════════════════════════════════════════════

#[test]
fn overflow_evicts_least_recent() {
    let mut tlb = TranslationCache::new(3);
    tlb.put(1, 10);
    tlb.put(2, 20);
    tlb.put(3, 30);
    tlb.put(4, 40);
    assert_eq!(tlb.len(), 3);
    assert_eq!(tlb.peek(1), None, "oldest entry should be evicted");
    assert_eq!(tlb.peek(2), Some(20));
    assert_eq!(tlb.peek(4), Some(40));
    assert_in_sync(&tlb);
}

#[test]
fn get_saves_entry_from_eviction() {
    let mut tlb = TranslationCache::new(3);
    tlb.put(1, 10);
    tlb.put(2, 20);
    tlb.put(3, 30);
    // Touch the oldest; the second-oldest becomes the victim.
    assert_eq!(tlb.get(1), Some(10));
    tlb.put(4, 40);
    assert_eq!(tlb.peek(1), Some(10), "touched entry must survive");
    assert_eq!(tlb.peek(2), None, "now-oldest entry must be evicted");
    assert_in_sync(&tlb);
}

#[test]
fn eviction_order_follows_recency_exactly() {
    let mut tlb = TranslationCache::new(4);
    for tag in 1..=4 {
        tlb.put(tag, tag as u32);
    }
    tlb.get(2);
    tlb.get(1);
    // Recency is now least → most recent: 3, 4, 2, 1.
    assert_eq!(tlb.recency(), vec![3, 4, 2, 1]);
    tlb.put(5, 50);
    assert_eq!(tlb.peek(3), None);
    tlb.put(6, 60);
    assert_eq!(tlb.peek(4), None);
    assert_eq!(tlb.recency(), vec![2, 1, 5, 6]);
    assert_in_sync(&tlb);
}

// ══════════════════════════════════════════════════════════
// 3. Invalidation
// ══════════════════════════════════════════════════════════

#[test]
fn invalidate_removes_entry() {
    let mut tlb = TranslationCache::new(4);
    tlb.put(0x42, 7);
    assert!(tlb.invalidate(0x42));
    assert_eq!(tlb.get(0x42), None);
    assert!(tlb.is_empty());
    assert_in_sync(&tlb);
}

#[test]
fn invalidate_absent_tag_is_a_noop() {
    let mut tlb = TranslationCache::new(4);
    tlb.put(1, 10);
    assert!(!tlb.invalidate(0x99));
    assert_eq!(tlb.len(), 1);
    assert_in_sync(&tlb);
}

#[test]
fn invalidate_then_reinsert() {
    let mut tlb = TranslationCache::new(2);
    tlb.put(1, 10);
    tlb.put(2, 20);
    tlb.invalidate(1);
    tlb.put(3, 30);
    // Capacity is 2 and one slot was freed; nothing should be evicted.
    assert_eq!(tlb.peek(2), Some(20));
    assert_eq!(tlb.peek(3), Some(30));
    assert_eq!(tlb.len(), 2);
    assert_in_sync(&tlb);
}
