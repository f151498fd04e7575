//! Slap projectiles

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distance covered per tick
pub const SLAP_SPEED: f32 = 8.0;
/// Health removed on hit
pub const SLAP_DAMAGE: u32 = 25;
/// Minimum gap between two slaps from the same player
pub const SLAP_COOLDOWN_MILLIS: u64 = 1_000;

/// A slap in flight toward a fixed target point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Projectile {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub speed: f32,
    pub damage: u32,
    pub owner_session_id: Uuid,
    /// Client-reported aim in radians, echoed for rendering only
    pub direction: f32,
}

/// Outcome of advancing a projectile by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advance {
    /// Target was within reach; the projectile is done
    Arrived,
    /// Moved to a new in-flight position
    Moved,
}

impl Projectile {
    pub fn new(
        owner_session_id: Uuid,
        origin: (f32, f32),
        target: (f32, f32),
        direction: f32,
        created_at: u64,
    ) -> Self {
        Self {
            id: format!("slap_{}_{}", owner_session_id, created_at),
            x: origin.0,
            y: origin.1,
            target_x: target.0,
            target_y: target.1,
            speed: SLAP_SPEED,
            damage: SLAP_DAMAGE,
            owner_session_id,
            direction,
        }
    }

    /// Remaining straight-line distance to the target
    pub fn remaining(&self) -> f32 {
        let dx = self.target_x - self.x;
        let dy = self.target_y - self.y;
        dx.hypot(dy)
    }

    /// Step toward the target.
    ///
    /// When the remaining distance is at most `speed` (or not finite) the
    /// projectile has arrived and its position is left untouched. A step too
    /// small to change the position at this magnitude also counts as arrival.
    pub fn advance(&mut self) -> Advance {
        let distance = self.remaining();
        if !distance.is_finite() || distance <= self.speed {
            return Advance::Arrived;
        }
        let x = self.x + (self.target_x - self.x) / distance * self.speed;
        let y = self.y + (self.target_y - self.y) / distance * self.speed;
        if x == self.x && y == self.y {
            return Advance::Arrived;
        }
        self.x = x;
        self.y = y;
        Advance::Moved
    }
}
