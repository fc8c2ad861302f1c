//! Joints driven through full world steps.
//!
//! Tests cover:
//! - a point-to-point pendulum keeps its arm length while swinging
//! - a hinge motor spins a body about the hinge axis only
//! - a lock makes two bodies move as one
//! - disabling a constraint lets its bodies separate

use approx::assert_relative_eq;
use rigid_constraint::Constraint;
use rigid_core::{Body, World};
use rigid_shapes::Shape;
use rigid_types::math::Vec3;
use rigid_types::WorldConfig;

const DT: f64 = 1.0 / 60.0;

fn small_ball(position: Vec3) -> Body {
    Body::new(1.0)
        .with_shape(Shape::sphere(0.1).expect("valid radius"))
        .with_position(position)
}

#[test]
fn pendulum_keeps_arm_length() {
    let mut world = World::new(WorldConfig::earth().with_sleep(false)).expect("valid config");
    let pivot = world.add_body(Body::fixed()).expect("add pivot");
    let bob = world.add_body(small_ball(Vec3::x())).expect("add bob");
    world
        .add_constraint(
            Constraint::point_to_point(pivot, Vec3::zeros(), bob, -Vec3::x()).expect("joint"),
        )
        .expect("add joint");

    let mut lowest = f64::MAX;
    for _ in 0..120 {
        world.step(DT).expect("step");
        let position = world.body(bob).expect("bob").position;
        assert_relative_eq!(position.norm(), 1.0, epsilon = 0.05);
        lowest = lowest.min(position.y);
    }
    // It swung through the bottom of the arc.
    assert!(lowest < -0.9);
}

#[test]
fn hinge_motor_spins_about_axis() {
    let mut world = World::default();
    let base = world.add_body(Body::fixed()).expect("add base");
    let wheel = world.add_body(small_ball(Vec3::zeros())).expect("add wheel");
    let mut hinge = Constraint::hinge(
        base,
        Vec3::zeros(),
        Vec3::z(),
        wheel,
        Vec3::zeros(),
        Vec3::z(),
    )
    .expect("joint");
    hinge.enable_motor();
    hinge.set_motor_speed(2.0);
    let id = world.add_constraint(hinge).expect("add joint");
    assert!(world.constraint(id).expect("hinge").motor_enabled());

    for _ in 0..60 {
        world.step(DT).expect("step");
    }

    let body = world.body(wheel).expect("wheel");
    assert_relative_eq!(body.angular_velocity.z.abs(), 2.0, epsilon = 0.05);
    assert_relative_eq!(body.angular_velocity.x, 0.0, epsilon = 1e-3);
    assert_relative_eq!(body.angular_velocity.y, 0.0, epsilon = 1e-3);
    assert_relative_eq!(body.position.norm(), 0.0, epsilon = 1e-3);

    world.constraint_mut(id).expect("hinge").disable_motor();
    assert!(!world.constraint(id).expect("hinge").motor_enabled());
}

#[test]
fn lock_moves_bodies_together() {
    let mut world = World::default();
    let a = small_ball(Vec3::zeros()).with_velocity(Vec3::x());
    let b = small_ball(Vec3::new(1.0, 0.0, 0.0));
    let lock = Constraint::lock(a.id(), &a.transform(), b.id(), &b.transform()).expect("joint");
    let a = world.add_body(a).expect("add a");
    let b = world.add_body(b).expect("add b");
    world.add_constraint(lock).expect("add joint");

    for _ in 0..30 {
        world.step(DT).expect("step");
    }

    let (ba, bb) = (world.body(a).expect("a"), world.body(b).expect("b"));
    assert_relative_eq!(ba.velocity, bb.velocity, epsilon = 1e-2);
    assert_relative_eq!((bb.position - ba.position).norm(), 1.0, epsilon = 1e-2);
    // Momentum is shared between the two equal masses.
    assert_relative_eq!(ba.velocity.x + bb.velocity.x, 1.0, epsilon = 2e-2);
}

#[test]
fn disabled_constraint_is_ignored() {
    let mut world = World::default();
    let a = world.add_body(small_ball(Vec3::zeros())).expect("add a");
    let b = world
        .add_body(small_ball(Vec3::x()).with_velocity(Vec3::x()))
        .expect("add b");
    let id = world
        .add_constraint(Constraint::distance(a, b, 1.0).expect("joint"))
        .expect("add joint");
    world.constraint_mut(id).expect("joint").disable();

    for _ in 0..60 {
        world.step(DT).expect("step");
    }
    let gap = world.body(b).expect("b").position.x - world.body(a).expect("a").position.x;
    assert!(gap > 1.5, "bodies stayed together: gap {gap}");
}
