use std::{cell::RefCell, rc::Rc, time::Duration};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sanctum_core::{
    config::CollectibleConfig, tags, ChainLink, Collectible, Corruption, Entity, Event, EventKind,
    GameState, KillCause, Lifetime, Position,
};
use sanctum_system_collectible::{install, SessionClock};
use sanctum_system_movement::Movement;
use sanctum_system_spawning::{
    spawn_candle, spawn_hellfire, spawn_singletons, spawn_snake, SingletonIds, SnakeIds,
};
use sanctum_world::{chain, World};

const INTERVAL: Duration = Duration::from_millis(110);

struct Session {
    world: World,
    snake: SnakeIds,
    singletons: SingletonIds,
    config: CollectibleConfig,
}

fn session(length: u32) -> Session {
    let mut world = World::with_grid(20, 20);
    let config = CollectibleConfig::default();
    let snake = spawn_snake(&mut world, 10, 10, length, INTERVAL);
    let singletons = spawn_singletons(&mut world);
    let _ = install(&mut world, config);
    Session {
        world,
        snake,
        singletons,
        config,
    }
}

fn record(world: &mut World, kind: EventKind) -> Rc<RefCell<Vec<Event>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _ = world.subscribe(kind, move |_: &mut World, event: &Event| {
        sink.borrow_mut().push(event.clone());
    });
    log
}

fn eat(world: &mut World, collectible: Entity, eater: Entity, freshness: f32) {
    let kind = world
        .get::<Collectible>(collectible)
        .map(|record| record.kind.clone())
        .unwrap_or_default();
    world.emit(Event::CollectibleEaten {
        collectible,
        eater,
        kind,
        freshness,
        x: 0,
        y: 0,
    });
}

fn score(session: &Session) -> u32 {
    session
        .world
        .get::<GameState>(session.singletons.game_state)
        .map_or(0, |state| state.score)
}

#[test]
fn fresh_candle_grows_four_segments_at_the_tail() {
    let mut session = session(3);
    let grew = record(&mut session.world, EventKind::ChainGrew);
    let candle = spawn_candle(&mut session.world, &session.config, 15, 15);
    let old_tail = chain::tail(&session.world, session.snake.head).expect("tail");

    eat(&mut session.world, candle, session.snake.head, 1.0);

    let links = chain::links(&session.world, session.snake.head);
    assert_eq!(links.len(), 7);
    assert!(chain::is_well_formed(&session.world, session.snake.head));
    let tail_position = session.world.get::<Position>(old_tail).copied();
    for segment in &links[3..] {
        assert_eq!(session.world.get::<Position>(*segment).copied(), tail_position);
        assert!(session.world.has_tag(*segment, tags::SNAKE_SEGMENT));
        assert!(session.world.grid_consistent(*segment));
    }
    assert_eq!(
        session.world.grid().expect("grid").at(8, 10).len(),
        5,
        "old tail plus four new segments share the cell"
    );
    assert_eq!(
        *grew.borrow(),
        vec![Event::ChainGrew {
            head: session.snake.head,
            new_segment: links[6],
            count: 4,
        }]
    );
}

#[test]
fn stale_candle_grows_one_segment() {
    let mut session = session(1);
    let candle = spawn_candle(&mut session.world, &session.config, 15, 15);

    eat(&mut session.world, candle, session.snake.head, 0.0);

    let links = chain::links(&session.world, session.snake.head);
    assert_eq!(links.len(), 2);
    assert_eq!(
        session.world.get::<ChainLink>(links[1]),
        Some(&ChainLink {
            head: Some(session.snake.head),
            parent: Some(session.snake.head),
            child: None,
            index: 1,
        })
    );
    assert_eq!(score(&session), 10);
}

#[test]
fn hellfire_outgrows_candle() {
    let mut session = session(1);
    let hellfire = spawn_hellfire(&mut session.world, &session.config, 15, 15);

    eat(&mut session.world, hellfire, session.snake.head, 0.5);

    assert_eq!(chain::links(&session.world, session.snake.head).len(), 1 + 2 + 1);
    assert_eq!(score(&session), 25 + 50);
}

#[test]
fn eaten_collectible_is_destroyed_and_score_credited() {
    let mut session = session(2);
    let candle = spawn_candle(&mut session.world, &session.config, 15, 15);

    eat(&mut session.world, candle, session.snake.head, 1.0);

    assert!(!session.world.is_alive(candle));
    assert!(session.world.grid().expect("grid").at(15, 15).is_empty());
    assert_eq!(score(&session), 110);
}

#[test]
fn missing_record_falls_back_to_default_reward() {
    let mut session = session(1);
    let ghost = session.world.spawn([Position::new(3, 3).into()]);

    eat(&mut session.world, ghost, session.snake.head, 0.0);

    assert_eq!(chain::links(&session.world, session.snake.head).len(), 2);
    assert_eq!(score(&session), 10);
}

#[test]
fn empty_reward_reports_zero_growth_at_the_old_tail() {
    let mut session = session(2);
    let grew = record(&mut session.world, EventKind::ChainGrew);
    let old_tail = chain::tail(&session.world, session.snake.head).expect("tail");
    let crumb = session.world.spawn([
        Position::new(1, 1).into(),
        Collectible {
            kind: "crumb".to_owned(),
            base_score: 5,
            segments: 0,
        }
        .into(),
    ]);

    eat(&mut session.world, crumb, session.snake.head, 0.0);

    assert_eq!(chain::links(&session.world, session.snake.head).len(), 2);
    assert_eq!(
        *grew.borrow(),
        vec![Event::ChainGrew {
            head: session.snake.head,
            new_segment: old_tail,
            count: 0,
        }]
    );
    assert_eq!(score(&session), 5);
}

#[test]
fn growth_listeners_see_the_credited_score() {
    let mut session = session(3);
    let game_state = session.singletons.game_state;
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _ = session
        .world
        .subscribe(EventKind::ChainGrew, move |world: &mut World, _: &Event| {
            let score = world.get::<GameState>(game_state).map(|state| state.score);
            sink.borrow_mut().push(score);
        });
    let candle = spawn_candle(&mut session.world, &session.config, 15, 15);

    eat(&mut session.world, candle, session.snake.head, 1.0);

    assert_eq!(*seen.borrow(), vec![Some(110)]);
}

#[test]
fn killing_blow_ends_the_session_once() {
    let mut session = session(1);
    let over = record(&mut session.world, EventKind::GameOver);
    if let Some(state) = session
        .world
        .get_mut::<GameState>(session.singletons.game_state)
    {
        state.score = 130;
    }
    if let Some(corruption) = session
        .world
        .get_mut::<Corruption>(session.singletons.corruption)
    {
        corruption.value = 0.25;
    }
    let killed = Event::ChainKilled {
        head: session.snake.head,
        killer: session.snake.head,
        x: 5,
        y: 2,
        cause: KillCause::Wall,
    };

    session.world.emit(killed.clone());
    session.world.emit(killed);

    assert_eq!(
        *over.borrow(),
        vec![Event::GameOver {
            score: 130,
            corruption: 0.25,
            cause: KillCause::Wall,
        }]
    );
    assert_eq!(
        session
            .world
            .get::<GameState>(session.singletons.game_state)
            .map(|state| state.alive),
        Some(false)
    );
}

#[test]
fn killing_without_game_state_is_silent() {
    let mut world = World::with_grid(5, 5);
    let _ = install(&mut world, CollectibleConfig::default());
    let over = record(&mut world, EventKind::GameOver);

    world.emit(Event::ChainKilled {
        head: Entity::new(1),
        killer: Entity::new(1),
        x: 0,
        y: 0,
        cause: KillCause::SelfCollision,
    });

    assert!(over.borrow().is_empty());
}

#[test]
fn moving_onto_a_candle_grows_the_chain_end_to_end() {
    let mut session = session(2);
    let candle = spawn_candle(&mut session.world, &session.config, 11, 10);
    Movement::install(&mut session.world);

    session.world.run_frame(INTERVAL);
    assert!(!session.world.is_alive(candle));
    assert_eq!(chain::links(&session.world, session.snake.head).len(), 6);

    for _ in 0..4 {
        session.world.run_frame(INTERVAL);
    }
    let positions: Vec<Position> = chain::links(&session.world, session.snake.head)
        .into_iter()
        .filter_map(|entity| session.world.get::<Position>(entity).copied())
        .collect();
    assert_eq!(
        positions,
        (0..6).map(|offset| Position::new(15 - offset, 10)).collect::<Vec<_>>(),
        "new segments unfold behind the tail"
    );
}

#[test]
fn wall_death_emits_game_over_through_movement() {
    let mut world = World::with_grid(5, 5);
    let snake = spawn_snake(&mut world, 4, 2, 1, INTERVAL);
    let singletons = spawn_singletons(&mut world);
    let _ = install(&mut world, CollectibleConfig::default());
    let over = record(&mut world, EventKind::GameOver);
    Movement::install(&mut world);

    for _ in 0..3 {
        world.run_frame(INTERVAL);
    }

    assert_eq!(over.borrow().len(), 1);
    assert_eq!(
        world.get::<Position>(snake.head),
        Some(&Position::new(4, 2))
    );
    assert_eq!(
        world
            .get::<GameState>(singletons.game_state)
            .map(|state| state.alive),
        Some(false)
    );
}

#[test]
fn session_clock_counts_only_live_started_time() {
    let mut world = World::new();
    let singletons = spawn_singletons(&mut world);
    SessionClock::install(&mut world);
    let game_time = |world: &World| {
        world
            .get::<GameState>(singletons.game_state)
            .map(|state| state.game_time)
    };

    world.run_frame(Duration::from_millis(100));
    assert_eq!(game_time(&world), Some(Duration::ZERO));

    if let Some(state) = world.get_mut::<GameState>(singletons.game_state) {
        state.started = true;
    }
    world.run_frame(Duration::from_millis(100));
    world.run_frame(Duration::from_millis(50));
    assert_eq!(game_time(&world), Some(Duration::from_millis(150)));

    if let Some(state) = world.get_mut::<GameState>(singletons.game_state) {
        state.alive = false;
    }
    world.run_frame(Duration::from_millis(100));
    assert_eq!(game_time(&world), Some(Duration::from_millis(150)));
}

proptest! {
    #[test]
    fn repeated_growth_preserves_chain_integrity(
        length in 1u32..5,
        meals in prop::collection::vec((0u32..3, 0.0f32..=1.0), 1..8),
    ) {
        let mut session = session(length);
        let mut expected = length as usize;

        for (segments, freshness) in meals {
            let candle = session.world.spawn([
                Position::new(0, 0).into(),
                Collectible {
                    kind: "candle".to_owned(),
                    base_score: 10,
                    segments,
                }
                .into(),
                Lifetime::new(Duration::ZERO, Duration::from_secs(14)).into(),
            ]);
            eat(&mut session.world, candle, session.snake.head, freshness);
            expected += session.config.growth_for(segments, freshness) as usize;

            prop_assert!(chain::is_well_formed(&session.world, session.snake.head));
            prop_assert_eq!(chain::links(&session.world, session.snake.head).len(), expected);
        }
    }
}
