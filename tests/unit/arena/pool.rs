use std::collections::HashSet;

use super::*;

#[test]
fn allocations_are_distinct_until_exhaustion() {
    let mut pool = Pool::with_capacity(PoolKind::Layer, 4);
    let mut seen = HashSet::new();
    for i in 0..4 {
        let h = pool.allocate(i).unwrap();
        assert!(seen.insert(h.index()), "slot {} handed out twice", h.index());
    }
    assert_eq!(pool.live(), 4);
    assert!(pool.allocate(99).is_none());
    assert!(pool.allocate(100).is_none());
    assert_eq!(pool.live(), 4);
}

#[test]
fn release_makes_room_again() {
    let mut pool = Pool::with_capacity(PoolKind::Frame, 2);
    let a = pool.allocate("a").unwrap();
    let _b = pool.allocate("b").unwrap();
    assert!(pool.allocate("c").is_none());

    assert_eq!(pool.release(a), Some("a"));
    assert_eq!(pool.live(), 1);
    let c = pool.allocate("c").unwrap();
    assert_eq!(c.index(), a.index(), "released slot is reused first");
    assert_ne!(c, a);
}

#[test]
fn stale_handle_never_aliases_reused_slot() {
    let mut pool = Pool::with_capacity(PoolKind::Animation, 1);
    let old = pool.allocate(1u32).unwrap();
    pool.release(old).unwrap();
    let new = pool.allocate(2u32).unwrap();

    assert!(!pool.is_alive(old));
    assert!(pool.get(old).is_none());
    assert!(pool.get_mut(old).is_none());
    assert_eq!(pool.get(new), Some(&2));
    assert_eq!(pool.release(old), None, "stale release is ignored");
    assert_eq!(pool.live(), 1);
}

#[test]
fn reuse_order_is_last_released_first() {
    let mut pool = Pool::with_capacity(PoolKind::Layer, 3);
    let a = pool.allocate(()).unwrap();
    let b = pool.allocate(()).unwrap();
    let c = pool.allocate(()).unwrap();
    pool.release(a);
    pool.release(c);
    pool.release(b);
    assert_eq!(pool.allocate(()).unwrap().index(), b.index());
    assert_eq!(pool.allocate(()).unwrap().index(), c.index());
    assert_eq!(pool.allocate(()).unwrap().index(), a.index());
}

#[test]
fn zero_capacity_pool_is_always_exhausted() {
    let mut pool = Pool::<u8>::with_capacity(PoolKind::Frame, 0);
    assert_eq!(pool.capacity(), 0);
    assert!(pool.allocate(1).is_none());
}

#[test]
fn live_handles_lists_occupied_slots() {
    let mut pool = Pool::with_capacity(PoolKind::Layer, 3);
    let a = pool.allocate('a').unwrap();
    let b = pool.allocate('b').unwrap();
    pool.release(a);
    let live: Vec<_> = pool.live_handles().collect();
    assert_eq!(live, vec![b]);
}

#[test]
fn handle_debug_shows_generation() {
    let mut pool = Pool::with_capacity(PoolKind::Layer, 1);
    let h = pool.allocate(0).unwrap();
    pool.release(h);
    let h2 = pool.allocate(0).unwrap();
    assert_eq!(format!("{h2:?}"), "Handle(0@gen1)");
}
