//! Arena: bounded world owning the player registry and live projectiles

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::ArenaInfo;

use super::player::{Player, PLAYER_HEIGHT, PLAYER_WIDTH};
use super::projectile::{Projectile, SLAP_COOLDOWN_MILLIS};
use super::scoreboard::ScoreBoard;

/// The single source of truth for world state (owned by the engine task)
pub struct Arena {
    width: f32,
    height: f32,
    players: HashMap<Uuid, Player>,
    /// Registry insertion order, used as the collision tie-break
    order: Vec<Uuid>,
    pub(crate) projectiles: Vec<Projectile>,
    rng: ChaCha8Rng,
}

impl Arena {
    pub fn new(width: f32, height: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            width,
            height,
            players: HashMap::new(),
            order: Vec::new(),
            projectiles: Vec::new(),
            rng,
        }
    }

    pub fn info(&self) -> ArenaInfo {
        ArenaInfo {
            width: self.width,
            height: self.height,
        }
    }

    /// Uniformly random top-left corner that keeps a player inside bounds
    pub fn random_spawn(&mut self) -> (f32, f32) {
        let max_x = (self.width - PLAYER_WIDTH).max(0.0);
        let max_y = (self.height - PLAYER_HEIGHT).max(0.0);
        (
            self.rng.gen_range(0.0..=max_x),
            self.rng.gen_range(0.0..=max_y),
        )
    }

    /// Clamp a top-left corner into `[0, W-w] x [0, H-h]`
    pub fn clamp(&self, x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
        let max_x = (self.width - width).max(0.0);
        let max_y = (self.height - height).max(0.0);
        // max() maps NaN to the lower bound
        (x.max(0.0).min(max_x), y.max(0.0).min(max_y))
    }

    /// Spawn a player. A second join under the same session replaces the
    /// previous entry while keeping its registry slot. Health, the alive flag
    /// and the slap cooldown carry over, so a defeated player stays down until
    /// its pending respawn.
    pub fn join(
        &mut self,
        session_id: Uuid,
        external_id: String,
        display_name: String,
        scores: &mut ScoreBoard,
    ) -> Player {
        let (x, y) = self.random_spawn();
        scores.record_join(&external_id);

        let mut player = Player::new(session_id, external_id, display_name, x, y, &mut self.rng);
        match self.players.get(&session_id) {
            Some(previous) => {
                player.health = previous.health;
                player.alive = previous.alive;
                player.last_slap_at = previous.last_slap_at;
            }
            None => self.order.push(session_id),
        }
        self.players.insert(session_id, player.clone());
        player
    }

    /// Store a clamped position. Returns it when the move was applied.
    pub fn move_player(&mut self, session_id: Uuid, x: f32, y: f32) -> Option<(f32, f32)> {
        let (width, height) = match self.players.get(&session_id) {
            Some(p) if p.alive => (p.width, p.height),
            _ => return None,
        };
        let (cx, cy) = self.clamp(x, y, width, height);
        let player = self.players.get_mut(&session_id)?;
        player.x = cx;
        player.y = cy;
        Some((cx, cy))
    }

    /// Remove a player; projectiles they own keep flying
    pub fn leave(&mut self, session_id: Uuid) -> Option<Player> {
        let removed = self.players.remove(&session_id)?;
        self.order.retain(|id| *id != session_id);
        Some(removed)
    }

    /// Launch a slap from the owner's center. `None` when the owner is
    /// absent, defeated, or still cooling down.
    pub fn spawn_projectile(
        &mut self,
        owner_session_id: Uuid,
        target_x: f32,
        target_y: f32,
        direction: f32,
        now: u64,
        scores: &mut ScoreBoard,
    ) -> Option<Projectile> {
        let owner = self.players.get_mut(&owner_session_id)?;
        if !owner.alive {
            return None;
        }
        if let Some(last) = owner.last_slap_at {
            if now.saturating_sub(last) < SLAP_COOLDOWN_MILLIS {
                return None;
            }
        }
        owner.last_slap_at = Some(now);

        let projectile = Projectile::new(
            owner_session_id,
            owner.center(),
            (target_x, target_y),
            direction,
            now,
        );
        scores.record_slap(&owner.external_id);
        self.projectiles.push(projectile.clone());
        Some(projectile)
    }

    /// Bring a defeated player back at a new random position.
    /// No-op when the session has left in the meantime.
    pub fn respawn(&mut self, session_id: Uuid) -> Option<Player> {
        if !self.players.contains_key(&session_id) {
            return None;
        }
        let (x, y) = self.random_spawn();
        let player = self.players.get_mut(&session_id)?;
        player.respawn(x, y);
        Some(player.clone())
    }

    pub fn player(&self, session_id: &Uuid) -> Option<&Player> {
        self.players.get(session_id)
    }

    pub(crate) fn player_mut(&mut self, session_id: &Uuid) -> Option<&mut Player> {
        self.players.get_mut(session_id)
    }

    /// Players in registry insertion order
    pub fn players(&self) -> impl Iterator<Item = &Player> + '_ {
        self.order.iter().filter_map(|id| self.players.get(id))
    }

    /// First live non-owner player whose hitbox contains the point
    pub fn first_hit(&self, owner: Uuid, x: f32, y: f32) -> Option<Uuid> {
        self.players()
            .filter(|p| p.alive && p.session_id != owner)
            .find(|p| p.contains(x, y))
            .map(|p| p.session_id)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}
