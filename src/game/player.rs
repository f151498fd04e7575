//! Player entity

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hitbox width
pub const PLAYER_WIDTH: f32 = 40.0;
/// Hitbox height
pub const PLAYER_HEIGHT: f32 = 40.0;
/// Health on spawn and respawn
pub const MAX_HEALTH: u32 = 100;

/// Authoritative player state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub session_id: Uuid,
    pub external_id: String,
    pub display_name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: u32,
    pub alive: bool,
    /// Engine-clock millis of the last accepted slap
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_slap_at: Option<u64>,
    pub color: String,
}

impl Player {
    pub fn new<R: Rng>(
        session_id: Uuid,
        external_id: String,
        display_name: String,
        x: f32,
        y: f32,
        rng: &mut R,
    ) -> Self {
        let display_name = if display_name.trim().is_empty() {
            default_display_name(session_id)
        } else {
            display_name
        };

        Self {
            session_id,
            external_id,
            display_name,
            x,
            y,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            health: MAX_HEALTH,
            alive: true,
            last_slap_at: None,
            color: format!("hsl({:.0}, 70%, 60%)", rng.gen_range(0.0..360.0_f32)),
        }
    }

    /// Center of the hitbox
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive axis-aligned hitbox test
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// Subtract damage, pinning at zero. Returns true when this hit defeated the player.
    pub fn apply_damage(&mut self, damage: u32) -> bool {
        self.health = self.health.saturating_sub(damage);
        if self.health == 0 {
            self.alive = false;
            true
        } else {
            false
        }
    }

    /// Restore full health at a new position
    pub fn respawn(&mut self, x: f32, y: f32) {
        self.health = MAX_HEALTH;
        self.alive = true;
        self.x = x;
        self.y = y;
    }
}

/// `Player` followed by the last four characters of the session id
pub fn default_display_name(session_id: Uuid) -> String {
    let id = session_id.simple().to_string();
    format!("Player{}", &id[id.len() - 4..])
}
