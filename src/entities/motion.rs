//! Grid-locked actor motion.
//!
//! Actors live on the tile grid and move one cardinal cell at a time.
//! Each step runs a fixed-duration glide from the origin cell to the
//! destination; further movement requests arriving mid-step are refused,
//! and the actor lands exactly on the destination when the step ends.

use bevy::prelude::*;
use std::time::Duration;

/// Default wall-clock duration of one cell step; config overrides it
/// per actor at spawn
pub const STEP_DURATION: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq)]
pub enum MotionState {
    Idle,
    Moving {
        origin: Vec2,
        destination: Vec2,
        elapsed: Duration,
    },
}

/// A grid-resident mover. `position` is the exact world position used
/// for rendering; the occupied cell is its floor.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Actor {
    pub position: Vec2,
    pub motion: MotionState,
    pub step_duration: Duration,
}

impl Actor {
    pub fn at_tile(tile: IVec2) -> Self {
        Self {
            position: Vec2::new(tile.x as f32, tile.y as f32),
            motion: MotionState::Idle,
            step_duration: STEP_DURATION,
        }
    }

    pub fn with_step_duration(mut self, duration: Duration) -> Self {
        self.step_duration = duration;
        self
    }

    /// Cell currently anchoring the actor. While moving this is the
    /// origin cell until the step completes.
    pub fn tile(&self) -> IVec2 {
        match &self.motion {
            MotionState::Idle => floor_tile(self.position),
            MotionState::Moving { origin, .. } => floor_tile(*origin),
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.motion, MotionState::Moving { .. })
    }

    /// Begin a one-cell step. Returns false without changing anything
    /// if a step is already in flight.
    pub fn move_by(&mut self, delta: IVec2) -> bool {
        if self.is_moving() {
            return false;
        }
        let origin = self.position;
        self.motion = MotionState::Moving {
            origin,
            destination: origin + Vec2::new(delta.x as f32, delta.y as f32),
            elapsed: Duration::ZERO,
        };
        true
    }

    /// Teleport, cancelling any step in flight
    pub fn place(&mut self, tile: IVec2) {
        self.position = Vec2::new(tile.x as f32, tile.y as f32);
        self.motion = MotionState::Idle;
    }

    /// Advance the step clock. Position interpolates linearly between
    /// origin and destination and snaps exactly onto the destination
    /// when the step duration elapses.
    pub fn advance(&mut self, delta: Duration) {
        let step = self.step_duration;
        let MotionState::Moving {
            origin,
            destination,
            elapsed,
        } = &mut self.motion
        else {
            return;
        };

        *elapsed += delta;
        if *elapsed >= step {
            self.position = *destination;
            self.motion = MotionState::Idle;
        } else {
            let t = elapsed.as_secs_f32() / step.as_secs_f32();
            self.position = origin.lerp(*destination, t);
        }
    }
}

fn floor_tile(position: Vec2) -> IVec2 {
    IVec2::new(position.x.floor() as i32, position.y.floor() as i32)
}

/// Tick every in-flight step. Idle actors are skipped without touching
/// change detection, so `Changed<Actor>` fires only while moving.
pub fn apply_motion(time: Res<Time>, mut query: Query<&mut Actor>) {
    let delta = time.delta();
    for mut actor in &mut query {
        if actor.is_moving() {
            actor.advance(delta);
        }
    }
}

/// Mirror actor positions into render transforms
pub fn sync_actor_transforms(mut query: Query<(&Actor, &mut Transform), Changed<Actor>>) {
    for (actor, mut transform) in &mut query {
        transform.translation.x = actor.position.x;
        transform.translation.y = actor.position.y;
    }
}
