//! End-to-end scenarios stepping a full world.
//!
//! Tests cover:
//! - a sphere dropped on a plane settles and falls asleep
//! - two overlapping spheres produce one contact along the center line
//! - stepping a world at rest changes nothing
//! - a body created with zero mass is static
//! - the island-splitting solver agrees with the global solver
//! - boxes stacked on a plane stay stacked

use std::f64::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use rigid_core::narrow_phase::CONTACT_MAX_FORCE;
use rigid_core::{Body, BodyType, SleepState, World, WorldEvent};
use rigid_shapes::Shape;
use rigid_types::math::{Quat, Vec3};
use rigid_types::{SolverConfig, WorldConfig};

const DT: f64 = 1.0 / 60.0;

/// Static plane through the origin with its normal along +Y.
fn floor() -> Body {
    Body::fixed()
        .with_shape(Shape::plane())
        .with_quaternion(Quat::from_axis_angle(&Vec3::x_axis(), -FRAC_PI_2))
}

fn ball(radius: f64, position: Vec3) -> Body {
    Body::new(1.0)
        .with_shape(Shape::sphere(radius).expect("valid radius"))
        .with_position(position)
}

#[test]
fn falling_sphere_comes_to_rest_and_sleeps() {
    let mut world = World::new(WorldConfig::earth()).expect("valid config");
    world.add_body(floor()).expect("add floor");
    let id = world.add_body(ball(1.0, Vec3::new(0.0, 5.0, 0.0))).expect("add ball");

    let mut slept_at = None;
    for step in 0..600 {
        world.step(DT).expect("step");
        if slept_at.is_none() && world.body(id).expect("ball").is_sleeping() {
            slept_at = Some(step);
        }
    }

    let body = world.body(id).expect("ball");
    assert!(slept_at.is_some(), "ball never fell asleep");
    assert_eq!(body.sleep_state(), SleepState::Sleeping);
    assert_relative_eq!(body.position.y, 1.0, epsilon = 0.05);
    assert_relative_eq!(body.position.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(body.velocity, Vec3::zeros());

    let events: Vec<_> = world.drain_events().collect();
    assert!(events.contains(&WorldEvent::Sleepy(id)));
    assert!(events.contains(&WorldEvent::Sleep(id)));
}

#[test]
fn overlapping_spheres_make_one_contact() {
    let mut world = World::default();
    world.add_body(ball(1.0, Vec3::zeros())).expect("add a");
    world.add_body(ball(1.0, Vec3::new(1.5, 0.0, 0.0))).expect("add b");
    world.step(DT).expect("step");

    assert_eq!(world.contacts().len(), 1);
    let contact = &world.contacts()[0];
    assert_eq!((contact.body_a, contact.body_b), (0, 1));
    let normal = contact.contact_normal().expect("contact row");
    assert_relative_eq!(normal, Vec3::x(), epsilon = 1e-12);
    assert_relative_eq!(contact.min_force, 0.0);
    assert_relative_eq!(contact.max_force, CONTACT_MAX_FORCE);
    assert!(contact.multiplier >= 0.0);
    assert_eq!(world.friction_equations().len(), 2);

    // The solver pushes the spheres apart.
    let a = &world.bodies()[0];
    let b = &world.bodies()[1];
    assert!(a.velocity.x < 0.0);
    assert!(b.velocity.x > 0.0);
}

#[test]
fn resting_world_is_unchanged_by_stepping() {
    let mut world = World::default();
    let bodies = [
        ball(0.5, Vec3::new(-3.0, 0.0, 0.0)),
        ball(0.5, Vec3::new(3.0, 1.0, 0.0)).with_quaternion(Quat::from_euler_angles(0.1, 0.2, 0.3)),
        Body::new(2.0)
            .with_shape(Shape::cuboid(Vec3::new(0.5, 0.25, 1.0)).expect("valid box"))
            .with_position(Vec3::new(0.0, 4.0, 0.0)),
    ];
    let initial: Vec<_> = bodies.iter().map(|b| (b.position, b.quaternion)).collect();
    let ids: Vec<_> = bodies
        .into_iter()
        .map(|b| world.add_body(b).expect("add"))
        .collect();

    for _ in 0..10 {
        world.step(DT).expect("step");
    }

    for (id, (position, quaternion)) in ids.iter().zip(initial) {
        let body = world.body(*id).expect("body");
        assert_eq!(body.position, position);
        assert_relative_eq!(body.quaternion, quaternion, epsilon = 1e-12);
    }
    assert!(world.contacts().is_empty());
}

#[test]
fn zero_mass_body_is_static() {
    let mut world = World::new(WorldConfig::earth()).expect("valid config");
    let body = Body::new(0.0)
        .with_shape(Shape::sphere(1.0).expect("valid radius"))
        .with_position(Vec3::new(0.0, 3.0, 0.0))
        .with_velocity(Vec3::x());
    assert_eq!(body.body_type(), BodyType::Static);
    let id = world.add_body(body).expect("add");

    // A dynamic ball dropped onto it cannot push it.
    world.add_body(ball(1.0, Vec3::new(0.0, 4.8, 0.0))).expect("add ball");
    for _ in 0..60 {
        world.step(DT).expect("step");
    }
    let body = world.body(id).expect("static body");
    assert_eq!(body.position, Vec3::new(0.0, 3.0, 0.0));
    assert_relative_eq!(body.inv_mass(), 0.0);
}

fn sliding_scene(solver: SolverConfig) -> World {
    let config = WorldConfig::earth().with_sleep(false).with_solver(solver);
    let mut world = World::new(config).expect("valid config");
    world.add_body(floor()).expect("add floor");
    for (x, speed) in [(-4.0, 1.0), (4.0, -2.0)] {
        world
            .add_body(ball(1.0, Vec3::new(x, 0.98, 0.0)).with_velocity(Vec3::new(speed, 0.0, 0.5)))
            .expect("add ball");
    }
    world
}

#[test]
fn split_solver_matches_global_solver() {
    let exact = SolverConfig::default().with_iterations(50).with_tolerance(0.0);
    let mut global = sliding_scene(exact.clone());
    let mut split = sliding_scene(exact.split());

    for _ in 0..30 {
        global.step(DT).expect("global step");
        split.step(DT).expect("split step");
    }

    for (g, s) in global.bodies().iter().zip(split.bodies()) {
        assert_relative_eq!(g.position, s.position, epsilon = 1e-6);
        assert_relative_eq!(g.velocity, s.velocity, epsilon = 1e-6);
        assert_relative_eq!(g.angular_velocity, s.angular_velocity, epsilon = 1e-6);
    }
    // Friction turned sliding into rolling.
    let first = &global.bodies()[1];
    assert!(first.velocity.x < 1.0);
    assert!(first.angular_velocity.norm() > 0.0);
}

#[test]
fn box_stack_stays_upright() {
    let mut world = World::new(WorldConfig::earth()).expect("valid config");
    world.add_body(floor()).expect("add floor");
    let cube = || Shape::cuboid(Vec3::repeat(0.5)).expect("valid box");
    let ids: Vec<_> = (0..3)
        .map(|k| {
            let y = 0.5 + f64::from(k) * 1.0;
            world
                .add_body(Body::new(1.0).with_shape(cube()).with_position(Vec3::new(0.0, y, 0.0)))
                .expect("add box")
        })
        .collect();

    for _ in 0..120 {
        world.step(DT).expect("step");
    }

    for (k, id) in ids.iter().enumerate() {
        let body = world.body(*id).expect("box");
        #[allow(clippy::cast_precision_loss)]
        let expected = 0.5 + k as f64;
        assert_relative_eq!(body.position.y, expected, epsilon = 0.1);
        assert_relative_eq!(body.position.x, 0.0, epsilon = 1e-2);
    }
    assert!(world.validate().is_ok());
}
