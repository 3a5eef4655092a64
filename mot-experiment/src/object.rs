//! Objects animated during a trial.
//!
//! Tracked objects bounce off the arena walls and are what the participant
//! counts. The unexpected object sweeps across the arena on probe trials and
//! ignores the walls.

use mot_core::{Canvas, NamedColor, Primitive, StimulusId, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper clamp applied to each velocity component after a perturbation.
pub const MAX_SPEED: f32 = 3.0;
/// Magnitude of a single velocity perturbation on each affected axis.
pub const PERTURBATION: f32 = 0.5;
/// Perturbation draws are uniform over `0..=PERTURBATION_DRAW_MAX`.
pub const PERTURBATION_DRAW_MAX: u32 = 200;
/// Initial speed on each axis; the sign is random.
pub const INITIAL_SPEED: f32 = 1.5;
/// Velocity of the unexpected object, pixels per frame.
pub const UNEXPECTED_VELOCITY: Vec2 = Vec2::new(-2.0, 0.0);

/// Axis-aligned rectangle in arena coordinates (y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Bounds {
    /// Rectangle of the given size centred on the origin.
    pub fn centered(size: Vec2) -> Self {
        Self {
            left: -size.x / 2.0,
            right: size.x / 2.0,
            top: size.y / 2.0,
            bottom: -size.y / 2.0,
        }
    }

    pub fn inset(&self, by: f32) -> Self {
        Self {
            left: self.left + by,
            right: self.right - by,
            top: self.top - by,
            bottom: self.bottom + by,
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.bottom && p.y <= self.top
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

/// Capabilities shared by everything animated in a trial.
pub trait DisplayObject {
    /// Attaches the visual representation and makes it visible.
    fn create<C: Canvas + ?Sized>(&mut self, canvas: &mut C);
    /// Advances one frame and updates the displayed position.
    fn advance<R: Rng + ?Sized, C: Canvas + ?Sized>(&mut self, rng: &mut R, canvas: &mut C);
    /// Detaches the visual representation. Safe to call repeatedly.
    fn clear<C: Canvas + ?Sized>(&mut self, canvas: &mut C);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedShape {
    Circle,
    Square,
}

impl TrackedShape {
    /// Distance from the object's centre to its edge along an axis.
    pub fn half_extent(&self, size: f32) -> f32 {
        match self {
            TrackedShape::Circle => 0.75 * size,
            TrackedShape::Square => 0.5 * size,
        }
    }

    pub fn primitive(&self, size: f32, color: NamedColor) -> Primitive {
        match self {
            TrackedShape::Circle => Primitive::Circle {
                radius: self.half_extent(size),
                color: color.rgba(),
            },
            TrackedShape::Square => Primitive::Rectangle {
                width: size,
                height: size,
                color: color.rgba(),
            },
        }
    }
}

/// Random spawn point on the integer grid, two object sizes clear of every edge.
pub fn spawn_position<R: Rng + ?Sized>(rng: &mut R, arena: &Bounds, size: f32) -> Vec2 {
    let area = arena.inset(2.0 * size);
    let x = rng.random_range(area.left.ceil() as i32..=area.right.floor() as i32);
    let y = rng.random_range(area.bottom.ceil() as i32..=area.top.floor() as i32);
    Vec2::new(x as f32, y as f32)
}

/// Velocity with each component independently `±INITIAL_SPEED`.
pub fn initial_velocity<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let mut sign = || if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    Vec2::new(INITIAL_SPEED * sign(), INITIAL_SPEED * sign())
}

/// A bouncing shape the participant may be tracking.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub shape: TrackedShape,
    pub color: NamedColor,
    pub size: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Arena bounds shrunk by the shape's half extent.
    pub bounds: Bounds,
    pub bounces: u32,
    handle: Option<StimulusId>,
}

impl TrackedObject {
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        shape: TrackedShape,
        color: NamedColor,
        size: f32,
        position: Vec2,
        arena: &Bounds,
    ) -> Self {
        let velocity = initial_velocity(rng);
        Self::with_velocity(shape, color, size, position, velocity, arena)
    }

    pub fn with_velocity(
        shape: TrackedShape,
        color: NamedColor,
        size: f32,
        position: Vec2,
        velocity: Vec2,
        arena: &Bounds,
    ) -> Self {
        Self {
            shape,
            color,
            size,
            position,
            velocity,
            bounds: arena.inset(shape.half_extent(size)),
            bounces: 0,
            handle: None,
        }
    }

    /// Clamps the position back inside the bounds, reversing the velocity
    /// component of every wall that was crossed. Returns the number of
    /// bounces this call added.
    pub fn check_collision(&mut self) -> u32 {
        let before = self.bounces;
        let b = self.bounds;
        if self.position.x < b.left {
            self.position.x = b.left;
            self.velocity.x = -self.velocity.x;
            self.bounces += 1;
        }
        if self.position.x > b.right {
            self.position.x = b.right;
            self.velocity.x = -self.velocity.x;
            self.bounces += 1;
        }
        if self.position.y > b.top {
            self.position.y = b.top;
            self.velocity.y = -self.velocity.y;
            self.bounces += 1;
        }
        if self.position.y < b.bottom {
            self.position.y = b.bottom;
            self.velocity.y = -self.velocity.y;
            self.bounces += 1;
        }
        self.bounces - before
    }

    /// Applies the perturbation selected by `draw`. Only 4 of the 201
    /// possible draws change the velocity.
    pub fn perturb(&mut self, draw: u32) {
        let delta = match draw {
            50 => Vec2::new(PERTURBATION, PERTURBATION),
            100 => Vec2::new(-PERTURBATION, -PERTURBATION),
            150 => Vec2::new(-PERTURBATION, PERTURBATION),
            200 => Vec2::new(PERTURBATION, -PERTURBATION),
            _ => return,
        };
        self.velocity += delta;
    }

    /// Upper clamp only: components above `MAX_SPEED` are cut back, negative
    /// components are left untouched.
    pub fn clamp_velocity(&mut self) {
        self.velocity.x = self.velocity.x.min(MAX_SPEED);
        self.velocity.y = self.velocity.y.min(MAX_SPEED);
    }

    pub fn update_velocity<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let draw = rng.random_range(0..=PERTURBATION_DRAW_MAX);
        self.perturb(draw);
        self.clamp_velocity();
    }

    /// Physics for one frame: collide, perturb, clamp, integrate.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.check_collision();
        self.update_velocity(rng);
        self.position += self.velocity;
    }
}

impl DisplayObject for TrackedObject {
    fn create<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        if self.handle.is_some() {
            return;
        }
        let id = canvas.add(self.shape.primitive(self.size, self.color), self.position);
        canvas.set_visible(id, true);
        self.handle = Some(id);
    }

    fn advance<R: Rng + ?Sized, C: Canvas + ?Sized>(&mut self, rng: &mut R, canvas: &mut C) {
        self.step(rng);
        if let Some(id) = self.handle {
            canvas.set_position(id, self.position);
        }
    }

    fn clear<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        if let Some(id) = self.handle.take() {
            canvas.remove(id);
        }
    }
}

/// The cross that sweeps leftwards across the arena on probe trials.
#[derive(Debug, Clone)]
pub struct UnexpectedObject {
    pub color: NamedColor,
    pub size: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    parts: Option<[StimulusId; 2]>,
}

impl UnexpectedObject {
    /// Spawns one object size beyond the right edge, on the horizontal midline.
    pub fn new(size: f32, arena: &Bounds, color: NamedColor) -> Self {
        Self {
            color,
            size,
            position: Vec2::new(arena.right + size, 0.0),
            velocity: UNEXPECTED_VELOCITY,
            parts: None,
        }
    }

    pub fn step(&mut self) {
        self.position += self.velocity;
    }

    fn arms(&self) -> [Primitive; 2] {
        let color = self.color.rgba();
        [
            Primitive::Rectangle {
                width: self.size * 0.25,
                height: self.size,
                color,
            },
            Primitive::Rectangle {
                width: self.size,
                height: self.size * 0.25,
                color,
            },
        ]
    }
}

impl DisplayObject for UnexpectedObject {
    fn create<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        if self.parts.is_some() {
            return;
        }
        let [vertical, horizontal] = self.arms();
        let v = canvas.add(vertical, self.position);
        let h = canvas.add(horizontal, self.position);
        canvas.set_visible(v, true);
        canvas.set_visible(h, true);
        self.parts = Some([v, h]);
    }

    fn advance<R: Rng + ?Sized, C: Canvas + ?Sized>(&mut self, _rng: &mut R, canvas: &mut C) {
        self.step();
        if let Some(parts) = self.parts {
            for id in parts {
                canvas.set_position(id, self.position);
            }
        }
    }

    fn clear<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        if let Some(parts) = self.parts.take() {
            for id in parts {
                canvas.remove(id);
            }
        }
    }
}

/// Everything a trial animates, tagged so accounting never relies on order.
#[derive(Debug, Clone)]
pub enum SceneObject {
    Tracked(TrackedObject),
    Unexpected(UnexpectedObject),
}

impl SceneObject {
    pub fn is_unexpected(&self) -> bool {
        matches!(self, SceneObject::Unexpected(_))
    }

    pub fn position(&self) -> Vec2 {
        match self {
            SceneObject::Tracked(o) => o.position,
            SceneObject::Unexpected(o) => o.position,
        }
    }

    pub fn as_tracked(&self) -> Option<&TrackedObject> {
        match self {
            SceneObject::Tracked(o) => Some(o),
            SceneObject::Unexpected(_) => None,
        }
    }
}

impl DisplayObject for SceneObject {
    fn create<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        match self {
            SceneObject::Tracked(o) => o.create(canvas),
            SceneObject::Unexpected(o) => o.create(canvas),
        }
    }

    fn advance<R: Rng + ?Sized, C: Canvas + ?Sized>(&mut self, rng: &mut R, canvas: &mut C) {
        match self {
            SceneObject::Tracked(o) => o.advance(rng, canvas),
            SceneObject::Unexpected(o) => o.advance(rng, canvas),
        }
    }

    fn clear<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        match self {
            SceneObject::Tracked(o) => o.clear(canvas),
            SceneObject::Unexpected(o) => o.clear(canvas),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSurface;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn arena() -> Bounds {
        Bounds::centered(Vec2::new(700.0, 700.0))
    }

    fn square_at(position: Vec2, velocity: Vec2) -> TrackedObject {
        TrackedObject::with_velocity(
            TrackedShape::Square,
            NamedColor::White,
            40.0,
            position,
            velocity,
            &arena(),
        )
    }

    #[test]
    fn insets_depend_on_shape() {
        let circle = TrackedObject::with_velocity(
            TrackedShape::Circle,
            NamedColor::Black,
            40.0,
            Vec2::ZERO,
            Vec2::ZERO,
            &arena(),
        );
        assert_eq!(circle.bounds.left, -320.0);
        assert_eq!(circle.bounds.top, 320.0);

        let square = square_at(Vec2::ZERO, Vec2::ZERO);
        assert_eq!(square.bounds.right, 330.0);
        assert_eq!(square.bounds.bottom, -330.0);
    }

    #[test]
    fn crossing_left_wall_flips_only_x() {
        let mut o = square_at(Vec2::new(-331.0, 10.0), Vec2::new(-1.5, 1.5));
        assert_eq!(o.check_collision(), 1);
        assert_eq!(o.position, Vec2::new(-330.0, 10.0));
        assert_eq!(o.velocity, Vec2::new(1.5, 1.5));
        assert_eq!(o.bounces, 1);
    }

    #[test]
    fn corner_hit_counts_two_bounces() {
        let mut o = square_at(Vec2::new(335.0, 340.0), Vec2::new(1.5, 1.5));
        assert_eq!(o.check_collision(), 2);
        assert_eq!(o.position, Vec2::new(330.0, 330.0));
        assert_eq!(o.velocity, Vec2::new(-1.5, -1.5));
    }

    #[test]
    fn perturbation_table() {
        let cases = [
            (50, Vec2::new(2.0, 2.0)),
            (100, Vec2::new(1.0, 1.0)),
            (150, Vec2::new(1.0, 2.0)),
            (200, Vec2::new(2.0, 1.0)),
            (0, Vec2::new(1.5, 1.5)),
            (51, Vec2::new(1.5, 1.5)),
        ];
        for (draw, expected) in cases {
            let mut o = square_at(Vec2::ZERO, Vec2::new(1.5, 1.5));
            o.perturb(draw);
            assert_eq!(o.velocity, expected, "draw {draw}");
        }
    }

    #[test]
    fn clamp_is_upper_only() {
        // Known asymmetry: there is no lower clamp, negative speeds may grow.
        let mut o = square_at(Vec2::ZERO, Vec2::new(3.5, -3.5));
        o.clamp_velocity();
        assert_eq!(o.velocity, Vec2::new(3.0, -3.5));
        o.perturb(100);
        o.clamp_velocity();
        assert_eq!(o.velocity, Vec2::new(2.5, -4.0));
    }

    #[test]
    fn spawn_at_minimum_inset_does_not_bounce_first_frame() {
        let mut rng = StdRng::seed_from_u64(1);
        let start = Vec2::new(-350.0 + 80.0, -350.0 + 80.0);
        let mut o = square_at(start, Vec2::new(-1.5, -1.5));
        o.step(&mut rng);
        assert_eq!(o.bounces, 0);

        let mut edge = square_at(Vec2::new(-330.0, 0.0), Vec2::new(-1.5, 0.0));
        edge.step(&mut rng);
        assert_eq!(edge.bounces, 0);
    }

    #[test]
    fn spawn_positions_stay_clear_of_walls() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let p = spawn_position(&mut rng, &arena(), 40.0);
            assert!(arena().inset(80.0).contains(p));
            assert_eq!(p.x.fract(), 0.0);
        }
    }

    #[test]
    fn initial_velocity_is_diagonal() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let v = initial_velocity(&mut rng);
            assert_eq!(v.abs(), Vec2::splat(INITIAL_SPEED));
        }
    }

    #[test]
    fn unexpected_object_sweeps_left_by_two() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut canvas = ScriptedSurface::default();
        let mut o = UnexpectedObject::new(40.0, &arena(), NamedColor::Purple);
        assert_eq!(o.position, Vec2::new(390.0, 0.0));
        o.create(&mut canvas);
        for frame in 1..=300 {
            o.advance(&mut rng, &mut canvas);
            assert_eq!(o.position.x, 390.0 - 2.0 * frame as f32);
            assert_eq!(o.position.y, 0.0);
        }
        assert_eq!(canvas.visible_count(), 2);
    }

    #[test]
    fn clear_twice_is_harmless() {
        let mut canvas = ScriptedSurface::default();
        let mut objects = vec![
            SceneObject::Tracked(square_at(Vec2::ZERO, Vec2::ONE)),
            SceneObject::Unexpected(UnexpectedObject::new(40.0, &arena(), NamedColor::Purple)),
        ];
        for o in &mut objects {
            o.create(&mut canvas);
        }
        assert_eq!(canvas.visible_count(), 3);
        for o in &mut objects {
            o.clear(&mut canvas);
            o.clear(&mut canvas);
        }
        assert_eq!(canvas.visible_count(), 0);
        assert_eq!(canvas.removals(), 3);
    }

    #[test]
    fn advance_moves_the_visual() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut canvas = ScriptedSurface::default();
        let mut o = square_at(Vec2::ZERO, Vec2::new(1.5, -1.5));
        o.create(&mut canvas);
        o.advance(&mut rng, &mut canvas);
        let id = canvas.visible_ids()[0];
        assert_eq!(canvas.position_of(id), Some(o.position));
    }

    proptest! {
        #[test]
        fn collision_step_keeps_object_inside(
            x in -600.0f32..600.0,
            y in -600.0f32..600.0,
            vx in -5.0f32..5.0,
            vy in -5.0f32..5.0,
        ) {
            let mut o = square_at(Vec2::new(x, y), Vec2::new(vx, vy));
            o.check_collision();
            prop_assert!(o.bounds.contains(o.position));
        }

        #[test]
        fn bounce_flips_sign_on_violating_axis_only(
            overshoot in 0.01f32..50.0,
            vx in 0.1f32..3.0,
            vy in -3.0f32..3.0,
            y in -300.0f32..300.0,
        ) {
            let mut o = square_at(Vec2::new(330.0 + overshoot, y), Vec2::new(vx, vy));
            let added = o.check_collision();
            prop_assert_eq!(added, 1);
            prop_assert_eq!(o.bounces, 1);
            prop_assert_eq!(o.velocity.x, -vx);
            prop_assert_eq!(o.velocity.y, vy);
            prop_assert_eq!(o.position.y, y);
        }

        #[test]
        fn velocity_never_exceeds_max_after_perturbations(
            draws in proptest::collection::vec(
                prop_oneof![Just(50u32), Just(100u32), Just(150u32), Just(200u32), 0u32..=200],
                1..200,
            ),
        ) {
            let mut o = square_at(Vec2::ZERO, Vec2::new(1.5, 1.5));
            for draw in draws {
                o.perturb(draw);
                o.clamp_velocity();
                prop_assert!(o.velocity.x <= MAX_SPEED);
                prop_assert!(o.velocity.y <= MAX_SPEED);
            }
        }

        #[test]
        fn overshoot_is_bounded_by_one_velocity_step(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let start = spawn_position(&mut rng, &arena(), 40.0);
            let mut o = TrackedObject::new(
                &mut rng, TrackedShape::Circle, NamedColor::White, 40.0, start, &arena(),
            );
            for _ in 0..600 {
                o.step(&mut rng);
                let slack = o.velocity.abs();
                let b = o.bounds;
                prop_assert!(o.position.x >= b.left - slack.x && o.position.x <= b.right + slack.x);
                prop_assert!(o.position.y >= b.bottom - slack.y && o.position.y <= b.top + slack.y);
            }
        }
    }
}
