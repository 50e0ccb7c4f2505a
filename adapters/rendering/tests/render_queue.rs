use std::{cell::RefCell, rc::Rc, time::Duration};

use pretty_assertions::assert_eq;
use sanctum_core::{config::CollectibleConfig, tags, Drawable, Entity, Position};
use sanctum_rendering::{render_queue, RenderItem, RendererRegistry};
use sanctum_system_spawning::{spawn_candle, spawn_obstacle, spawn_snake, spawn_wall};
use sanctum_world::World;

fn kinds(items: &[RenderItem]) -> Vec<String> {
    items.iter().map(|item| item.drawable.kind.clone()).collect()
}

#[test]
fn queue_is_sorted_by_layer_then_z_index() {
    let mut world = World::with_grid(20, 20);
    let snake = spawn_snake(&mut world, 10, 10, 3, Duration::from_millis(110));
    let candle = spawn_candle(&mut world, &CollectibleConfig::default(), 3, 3);
    let altar = spawn_obstacle(&mut world, "altar", 1, 1, 3, 2);
    let wall = spawn_wall(&mut world, 0, 0);

    let queue = render_queue(&world);

    assert_eq!(
        queue.iter().map(|item| item.entity).collect::<Vec<_>>(),
        vec![wall, altar, candle, snake.segments[0], snake.segments[1], snake.head]
    );
    assert_eq!(
        kinds(&queue),
        vec![
            tags::WALL,
            "altar",
            tags::CANDLE,
            tags::SNAKE_SEGMENT,
            tags::SNAKE_SEGMENT,
            tags::SNAKE_HEAD,
        ]
    );
    assert_eq!(queue[1].position, Position::new(1, 1));
}

#[test]
fn hidden_and_unplaced_drawables_are_left_out() {
    let mut world = World::new();
    let shown = world.spawn([
        Position::new(2, 2).into(),
        Drawable::new("banner", 3, 0).into(),
    ]);
    let hidden = world.spawn([
        Position::new(2, 2).into(),
        Drawable::new("banner", 3, 0).into(),
    ]);
    if let Some(drawable) = world.get_mut::<Drawable>(hidden) {
        drawable.visible = false;
    }
    let _floating = world.spawn([Drawable::new("banner", 3, 0).into()]);

    let queue = render_queue(&world);

    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].entity, shown);
}

#[test]
fn installed_registry_draws_every_frame_and_skips_unknown_kinds() {
    let mut world = World::with_grid(20, 20);
    let snake = spawn_snake(&mut world, 10, 10, 2, Duration::from_millis(110));
    let _altar = spawn_obstacle(&mut world, "altar", 1, 1, 3, 2);
    let canvas: Rc<RefCell<Vec<(Entity, Position)>>> = Rc::default();

    let mut registry = RendererRegistry::new();
    for kind in [tags::SNAKE_HEAD, tags::SNAKE_SEGMENT] {
        registry.register(kind, |canvas: &mut Vec<(Entity, Position)>, item: &RenderItem| {
            canvas.push((item.entity, item.position));
        });
    }
    registry.install(&mut world, Rc::clone(&canvas));

    world.run_frame(Duration::from_millis(16));

    assert_eq!(
        *canvas.borrow(),
        vec![
            (snake.segments[0], Position::new(9, 10)),
            (snake.head, Position::new(10, 10)),
        ]
    );
    assert_eq!(world.systems(sanctum_core::Phase::Render), vec!["render"]);
}

#[test]
fn borrowed_target_skips_the_frame_instead_of_panicking() {
    let mut world = World::with_grid(20, 20);
    let snake = spawn_snake(&mut world, 10, 10, 1, Duration::from_millis(110));
    let canvas: Rc<RefCell<Vec<Entity>>> = Rc::default();
    let mut registry = RendererRegistry::new();
    registry.register(tags::SNAKE_HEAD, |canvas: &mut Vec<Entity>, item: &RenderItem| {
        canvas.push(item.entity);
    });
    registry.install(&mut world, Rc::clone(&canvas));

    {
        let held = canvas.borrow();
        world.run_frame(Duration::from_millis(16));
        assert!(held.is_empty());
    }
    world.run_frame(Duration::from_millis(16));

    assert_eq!(*canvas.borrow(), vec![snake.head]);
}
