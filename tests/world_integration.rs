//! Integration tests exercising `World` end to end: archetype segregation,
//! deferred mutation during iteration, and the deferred-spawn-free /
//! self-delete rules around the lock.

use archetype_ecs::signature::make_signature;
use archetype_ecs::{Component, EcsError, World};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tag;

// S1: entities with distinct signatures land in distinct archetypes, and
// entities with the same signature share one.
#[test]
fn entities_are_segregated_by_signature() {
    let mut world = World::new();
    let a = world.spawn_bundle((Position { x: 0.0, y: 0.0 },)).unwrap();
    let b = world.spawn_bundle((Position { x: 1.0, y: 1.0 },)).unwrap();
    let c = world
        .spawn_bundle((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.0 }))
        .unwrap();

    assert_eq!(world.archetype_count(), 3); // empty + (Position) + (Position, Velocity)
    assert!(world.contains(a));
    assert!(world.contains(b));
    assert!(world.contains(c));
    assert!(world.get::<Velocity>(a).is_none());
    assert!(world.get::<Velocity>(c).is_some());
}

// S2: a set issued against another entity mid-iteration is invisible until
// the tick's deferred-drain step, and visible immediately afterward.
#[test]
fn deferred_set_applies_after_tick_not_during() {
    let mut world = World::new();
    let target = world.spawn_bundle((Position { x: 0.0, y: 0.0 },)).unwrap();
    let trigger = world.spawn_bundle((Tag,)).unwrap();

    let signature = make_signature(&[Tag::id()]);
    world.add_system(signature, move |world, _entity| {
        world
            .set(target, Velocity { dx: 3.0, dy: 4.0 })
            .expect("set should be accepted, even if deferred");
        assert!(
            world.get::<Velocity>(target).is_none(),
            "a deferred set on another entity must not be visible mid-pass"
        );
    });

    world.tick().unwrap();
    assert_eq!(world.get::<Velocity>(target), Some(&Velocity { dx: 3.0, dy: 4.0 }));
    assert!(world.contains(trigger));
}

// S3: an entity may delete itself mid-iteration without being queued,
// because reverse iteration never needs to revisit the row it occupied.
// A delete targeting some other entity, by contrast, is deferred.
#[test]
fn self_delete_is_immediate_but_deleting_others_is_deferred() {
    let mut world = World::new();
    let keep = world.spawn_bundle((Tag,)).unwrap();
    let doomed = world.spawn_bundle((Tag,)).unwrap();

    let signature = make_signature(&[Tag::id()]);
    world.add_system(signature, move |world, entity| {
        if entity == doomed {
            world.delete(entity).unwrap();
        } else {
            // Targeting `doomed` from `keep`'s turn would be a delete of
            // another entity and must be deferred, not applied here; we
            // don't exercise that path from both directions to avoid
            // double-deleting, so this branch only proves `keep` survives
            // its own pass untouched.
            assert!(world.contains(keep));
        }
    });

    world.tick().unwrap();
    assert!(world.contains(keep));
    assert!(!world.contains(doomed));
    assert_eq!(world.entity_count(), 1);
}

#[test]
fn new_entity_while_locked_is_fatal_not_queued() {
    let mut world = World::new();
    world.spawn_bundle((Tag,)).unwrap();

    let signature = make_signature(&[Tag::id()]);
    world.add_system(signature, |world, _entity| {
        let result = world.new_entity();
        assert!(matches!(result, Err(EcsError::LockedMutation)));
    });
    world.tick().unwrap();
}

// S4: reading an absent component is `None`, not an error.
#[test]
fn get_of_absent_component_is_none() {
    let mut world = World::new();
    let e = world.new_entity().unwrap();
    assert_eq!(world.get::<Position>(e), None);
}

// S5: signature equality (and therefore archetype membership) doesn't
// depend on the order components were added in.
#[test]
fn archetype_membership_is_order_independent() {
    let mut world = World::new();

    // `a` arrives at (Position, Velocity) via Position-then-Velocity...
    let a = world.new_entity().unwrap();
    world.set(a, Position { x: 0.0, y: 0.0 }).unwrap();
    world.set(a, Velocity { dx: 1.0, dy: 1.0 }).unwrap();
    let after_a = world.archetype_count();

    // ...and `b` via the reverse order, landing in the same signature.
    let b = world.new_entity().unwrap();
    world.set(b, Velocity { dx: 2.0, dy: 2.0 }).unwrap();
    world.set(b, Position { x: 5.0, y: 5.0 }).unwrap();

    // If order mattered, `b`'s path would create a fresh archetype for
    // {Velocity} and another for {Position, Velocity}; since the
    // signature is canonicalized, `b` instead rejoins `a`'s existing
    // archetype (creating only the transient {Velocity}-only one).
    assert_eq!(world.archetype_count(), after_a + 1);
}

// S6: swap-delete preserves lookup correctness for the row that gets
// moved into the freed slot.
#[test]
fn swap_delete_preserves_lookup_for_moved_entity() {
    let mut world = World::new();
    let a = world.spawn_bundle((Position { x: 1.0, y: 1.0 },)).unwrap();
    let b = world.spawn_bundle((Position { x: 2.0, y: 2.0 },)).unwrap();
    let c = world.spawn_bundle((Position { x: 3.0, y: 3.0 },)).unwrap();

    world.delete(a).unwrap();

    assert!(!world.contains(a));
    assert_eq!(world.get::<Position>(b), Some(&Position { x: 2.0, y: 2.0 }));
    assert_eq!(world.get::<Position>(c), Some(&Position { x: 3.0, y: 3.0 }));
}

#[test]
fn removing_a_component_moves_entity_to_smaller_archetype() {
    let mut world = World::new();
    let e = world
        .spawn_bundle((Position { x: 1.0, y: 1.0 }, Velocity { dx: 0.0, dy: 0.0 }))
        .unwrap();

    world.remove::<Velocity>(e).unwrap();
    assert!(world.get::<Velocity>(e).is_none());
    assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 1.0 }));

    // removing something already absent is a no-op, not an error
    world.remove::<Velocity>(e).unwrap();
}

#[test]
fn spawn_batch_respects_configured_limit() {
    use archetype_ecs::EcsConfig;

    let mut world = World::with_config(EcsConfig {
        max_batch_size: 10,
        ..EcsConfig::default()
    });
    assert!(world.spawn_batch(11).is_err());
    let ids = world.spawn_batch(10).unwrap();
    assert_eq!(ids.len(), 10);
}
