//! Spawns a handful of entities across a few archetypes, registers a
//! movement system over `(Position, Velocity)`, and runs it for a few
//! ticks — demonstrating spawn, system dispatch, and an in-system despawn.

use archetype_ecs::{signature::make_signature, Component, World};

#[derive(Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Debug, Clone, Copy)]
struct Health(i32);

fn main() {
    let mut world = World::new();

    let moving = world
        .spawn_bundle((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.5 }))
        .expect("spawn moving entity");
    let stationary = world
        .spawn_bundle((Position { x: 10.0, y: 10.0 },))
        .expect("spawn stationary entity");
    let fragile = world
        .spawn_bundle((
            Position { x: -5.0, y: 2.0 },
            Velocity { dx: -1.0, dy: 0.0 },
            Health(0),
        ))
        .expect("spawn fragile entity");

    println!("spawned {} entities across {} archetypes", world.entity_count(), world.archetype_count());

    let movement_signature = make_signature(&[Position::id(), Velocity::id()]);
    world.add_system(movement_signature, |world, entity| {
        let (dx, dy) = match world.get::<Velocity>(entity) {
            Some(v) => (v.dx, v.dy),
            None => return,
        };
        if let Some(pos) = world.get_mut::<Position>(entity) {
            pos.x += dx;
            pos.y += dy;
        }
    });

    let cleanup_signature = make_signature(&[Health::id()]);
    world.add_system(cleanup_signature, |world, entity| {
        let dead = matches!(world.get::<Health>(entity), Some(h) if h.0 <= 0);
        if dead {
            // Self-delete mid-iteration: applied immediately under Rule D
            // rather than deferred, since no other row depends on this one
            // staying put for the rest of this pass.
            world.delete(entity).ok();
        }
    });

    for t in 1..=3 {
        world.tick().expect("tick");
        let pos = world.get::<Position>(moving).unwrap();
        println!("tick {t}: moving entity now at ({}, {})", pos.x, pos.y);
    }

    println!("stationary entity still at rest: {:?}", world.get::<Position>(stationary));
    println!("fragile entity alive: {}", world.contains(fragile));
}
