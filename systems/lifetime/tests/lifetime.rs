use std::{cell::RefCell, rc::Rc, time::Duration};

use pretty_assertions::assert_eq;
use sanctum_core::{config::CollectibleConfig, Event, EventKind, Lifetime};
use sanctum_system_lifetime::Lifetimes;
use sanctum_system_spawning::spawn_candle;
use sanctum_world::World;

fn freshness(world: &World, entity: sanctum_core::Entity) -> Option<f32> {
    world.get::<Lifetime>(entity).map(|lifetime| lifetime.freshness)
}

#[test]
fn freshness_decays_with_world_time() {
    let mut world = World::with_grid(10, 10);
    let config = CollectibleConfig::default();
    let candle = spawn_candle(&mut world, &config, 3, 3);
    let mut lifetimes = Lifetimes::default();

    world.advance(Duration::from_millis(3_500));
    lifetimes.handle(&mut world);
    assert_eq!(freshness(&world, candle), Some(0.75));

    world.advance(Duration::from_millis(7_000));
    lifetimes.handle(&mut world);
    assert_eq!(freshness(&world, candle), Some(0.25));
    assert!(world.is_alive(candle));
}

#[test]
fn spent_collectibles_are_destroyed_and_announced() {
    let mut world = World::with_grid(10, 10);
    let config = CollectibleConfig::default();
    let candle = spawn_candle(&mut world, &config, 4, 6);
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _ = world.subscribe(EventKind::CollectibleExpired, move |_: &mut World, event: &Event| {
        sink.borrow_mut().push(event.clone());
    });
    Lifetimes::install(&mut world);

    world.run_frame(Duration::from_millis(13_999));
    assert!(world.is_alive(candle));

    world.run_frame(Duration::from_millis(1));

    assert!(!world.is_alive(candle));
    assert!(world.grid().expect("grid").at(4, 6).is_empty());
    assert_eq!(
        *log.borrow(),
        vec![Event::CollectibleExpired {
            collectible: candle,
            kind: "candle".to_owned(),
            x: 4,
            y: 6,
        }]
    );
}

#[test]
fn untagged_lifetimes_only_decay() {
    let mut world = World::new();
    let ember = world.spawn([Lifetime::new(Duration::ZERO, Duration::from_secs(1)).into()]);
    let mut lifetimes = Lifetimes::default();

    world.advance(Duration::from_secs(2));
    lifetimes.handle(&mut world);

    assert!(world.is_alive(ember));
    assert_eq!(freshness(&world, ember), Some(0.0));
    assert_eq!(lifetimes.expired(), 0);
}
