//! Fixed-tick projectile simulation and hit resolution

use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

use super::arena::Arena;
use super::projectile::{Advance, Projectile};
use super::scoreboard::ScoreBoard;

/// A player whose health reached zero during a tick
#[derive(Debug, Clone, PartialEq)]
pub struct Defeat {
    pub session_id: Uuid,
    pub external_id: String,
    pub display_name: String,
    /// Set when the projectile owner was still connected
    pub attacker: Option<Attacker>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attacker {
    pub session_id: Uuid,
    pub external_id: String,
    pub display_name: String,
}

/// Everything a tick produced, in emission order
#[derive(Debug, Default)]
pub struct TickReport {
    pub events: Vec<ServerMsg>,
    pub defeats: Vec<Defeat>,
}

/// Advance every projectile once, in collection order.
///
/// Collisions use first match in registry order, not nearest player.
pub fn step(arena: &mut Arena, scores: &mut ScoreBoard) -> TickReport {
    let mut report = TickReport::default();
    let in_flight = std::mem::take(&mut arena.projectiles);
    let mut survivors = Vec::with_capacity(in_flight.len());

    for mut projectile in in_flight {
        match projectile.advance() {
            Advance::Arrived => {
                report
                    .events
                    .push(ServerMsg::ProjectileExpired { id: projectile.id });
            }
            Advance::Moved => {
                match arena.first_hit(projectile.owner_session_id, projectile.x, projectile.y) {
                    Some(target) => resolve_hit(arena, scores, &projectile, target, &mut report),
                    None => survivors.push(projectile),
                }
            }
        }
    }

    arena.projectiles = survivors;

    if !arena.projectiles.is_empty() {
        report
            .events
            .push(ServerMsg::ProjectilesSnapshot(arena.projectiles.clone()));
    }

    report
}

fn resolve_hit(
    arena: &mut Arena,
    scores: &mut ScoreBoard,
    projectile: &Projectile,
    target_id: Uuid,
    report: &mut TickReport,
) {
    let Some(target) = arena.player_mut(&target_id) else {
        return;
    };
    let defeated = target.apply_damage(projectile.damage);
    let (health, alive) = (target.health, target.alive);

    if defeated {
        let external_id = target.external_id.clone();
        let display_name = target.display_name.clone();

        let attacker = arena
            .player(&projectile.owner_session_id)
            .map(|owner| Attacker {
                session_id: owner.session_id,
                external_id: owner.external_id.clone(),
                display_name: owner.display_name.clone(),
            });
        if let Some(attacker) = &attacker {
            scores.record_win(&attacker.external_id);
        }

        report.defeats.push(Defeat {
            session_id: target_id,
            external_id,
            display_name,
            attacker,
        });
    }

    report.events.push(ServerMsg::PlayerHit {
        session_id: target_id,
        health,
        alive,
        projectile_id: projectile.id.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::MAX_HEALTH;
    use crate::game::projectile::{SLAP_DAMAGE, SLAP_SPEED};

    struct World {
        arena: Arena,
        scores: ScoreBoard,
    }

    impl World {
        fn new() -> Self {
            Self {
                arena: Arena::new(800.0, 600.0, Some(3)),
                scores: ScoreBoard::new(),
            }
        }

        fn join_at(&mut self, ext: &str, x: f32, y: f32) -> Uuid {
            let id = Uuid::new_v4();
            self.arena
                .join(id, ext.to_string(), format!("name-{ext}"), &mut self.scores);
            self.arena.move_player(id, x, y);
            id
        }

        fn slap(&mut self, owner: Uuid, tx: f32, ty: f32, now: u64) -> Projectile {
            self.arena
                .spawn_projectile(owner, tx, ty, 0.0, now, &mut self.scores)
                .expect("slap should be accepted")
        }

        fn tick(&mut self) -> TickReport {
            step(&mut self.arena, &mut self.scores)
        }

        fn tick_until_empty(&mut self) -> Vec<ServerMsg> {
            let mut events = Vec::new();
            for _ in 0..1_000 {
                if self.arena.projectiles().is_empty() {
                    break;
                }
                events.extend(self.tick().events);
            }
            events
        }

        fn assert_health_invariant(&self) {
            for p in self.arena.players() {
                assert!(p.health <= MAX_HEALTH);
                assert_eq!(p.alive, p.health > 0, "alive/health mismatch for {}", p.display_name);
            }
        }
    }

    fn hits(events: &[ServerMsg]) -> Vec<&ServerMsg> {
        events
            .iter()
            .filter(|e| matches!(e, ServerMsg::PlayerHit { .. }))
            .collect()
    }

    #[test]
    fn hit_lands_within_distance_over_speed_ticks() {
        let mut world = World::new();
        let p1 = world.join_at("1", 100.0, 280.0);
        let p2 = world.join_at("2", 400.0, 280.0);
        let (tx, ty) = world.arena.player(&p2).unwrap().center();
        let slap = world.slap(p1, tx, ty, 0);

        let ticks = (slap.remaining() / SLAP_SPEED).ceil() as usize;
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(world.tick().events);
        }

        assert_eq!(world.arena.player(&p2).unwrap().health, MAX_HEALTH - SLAP_DAMAGE);
        assert_eq!(
            hits(&events),
            vec![&ServerMsg::PlayerHit {
                session_id: p2,
                health: MAX_HEALTH - SLAP_DAMAGE,
                alive: true,
                projectile_id: slap.id.clone(),
            }]
        );
        assert!(world.arena.projectiles().is_empty());
        assert_eq!(world.arena.player(&p1).unwrap().health, MAX_HEALTH);
    }

    #[test]
    fn four_hits_defeat_and_credit_the_attacker() {
        let mut world = World::new();
        let p1 = world.join_at("attacker", 100.0, 280.0);
        let p2 = world.join_at("victim", 400.0, 280.0);
        let (tx, ty) = world.arena.player(&p2).unwrap().center();

        let mut defeats = Vec::new();
        for i in 0..4 {
            world.slap(p1, tx, ty, i * 1_000);
            for _ in 0..1_000 {
                if world.arena.projectiles().is_empty() {
                    break;
                }
                let report = world.tick();
                defeats.extend(report.defeats);
                world.assert_health_invariant();
            }
        }

        let victim = world.arena.player(&p2).unwrap();
        assert_eq!(victim.health, 0);
        assert!(!victim.alive);
        let score = world.scores.get("attacker").unwrap();
        assert_eq!(score.wins, 1);
        assert_eq!(score.tokens_earned, 10);
        assert_eq!(score.slaps_thrown, 4);
        assert_eq!(world.scores.get("victim").unwrap().wins, 0);

        assert_eq!(defeats.len(), 1);
        assert_eq!(defeats[0].session_id, p2);
        assert_eq!(defeats[0].external_id, "victim");
        assert_eq!(
            defeats[0].attacker.as_ref().map(|a| a.external_id.as_str()),
            Some("attacker")
        );
    }

    #[test]
    fn projectile_reaching_empty_target_expires() {
        let mut world = World::new();
        let p1 = world.join_at("1", 0.0, 0.0);
        let bystander = world.join_at("2", 700.0, 500.0);
        let slap = world.slap(p1, 300.0, 20.0, 0);

        let events = world.tick_until_empty();
        assert!(hits(&events).is_empty());
        assert_eq!(
            events.last(),
            Some(&ServerMsg::ProjectileExpired { id: slap.id.clone() })
        );
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, ServerMsg::ProjectileExpired { .. }))
                .count(),
            1
        );
        assert_eq!(world.arena.player(&bystander).unwrap().health, MAX_HEALTH);
    }

    #[test]
    fn overlapping_players_resolve_to_earliest_joined() {
        let mut world = World::new();
        let owner = world.join_at("o", 0.0, 280.0);
        let early = world.join_at("early", 300.0, 280.0);
        let late = world.join_at("late", 300.0, 280.0);
        world.slap(owner, 320.0, 300.0, 0);

        let events = world.tick_until_empty();
        assert_eq!(hits(&events).len(), 1);
        assert_eq!(world.arena.player(&early).unwrap().health, MAX_HEALTH - SLAP_DAMAGE);
        assert_eq!(world.arena.player(&late).unwrap().health, MAX_HEALTH);
    }

    #[test]
    fn owner_and_dead_players_are_not_hit() {
        let mut world = World::new();
        let owner = world.join_at("o", 100.0, 100.0);
        let dead = world.join_at("d", 200.0, 100.0);
        world.arena.player_mut(&dead).unwrap().apply_damage(MAX_HEALTH);
        // Passes through the owner's own box and the dead player's box
        world.slap(owner, 400.0, 120.0, 0);

        let events = world.tick_until_empty();
        assert!(hits(&events).is_empty());
        assert_eq!(world.arena.player(&owner).unwrap().health, MAX_HEALTH);
    }

    #[test]
    fn live_projectiles_broadcast_full_list_each_tick() {
        let mut world = World::new();
        let a = world.join_at("a", 0.0, 0.0);
        let b = world.join_at("b", 0.0, 500.0);
        world.slap(a, 700.0, 20.0, 0);
        world.slap(b, 700.0, 520.0, 0);

        let report = world.tick();
        match report.events.as_slice() {
            [ServerMsg::ProjectilesSnapshot(list)] => assert_eq!(list.len(), 2),
            other => panic!("expected a single snapshot, got {other:?}"),
        }

        world.tick_until_empty();
        assert!(world.tick().events.is_empty());
    }

    #[test]
    fn orphaned_projectile_still_hits_but_scores_nobody() {
        let mut world = World::new();
        let owner = world.join_at("gone", 100.0, 280.0);
        let victim = world.join_at("victim", 300.0, 280.0);
        world.arena.player_mut(&victim).unwrap().health = SLAP_DAMAGE;
        let (tx, ty) = world.arena.player(&victim).unwrap().center();
        world.slap(owner, tx, ty, 0);
        world.arena.leave(owner);

        let mut defeats = Vec::new();
        for _ in 0..100 {
            defeats.extend(world.tick().defeats);
        }

        assert!(!world.arena.player(&victim).unwrap().alive);
        assert_eq!(defeats.len(), 1);
        assert!(defeats[0].attacker.is_none());
        assert_eq!(world.scores.get("gone").unwrap().wins, 0);
    }
}
