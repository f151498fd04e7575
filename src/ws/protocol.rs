//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is a JSON text frame of the form
//! `{"type": "<event-name>", "data": <payload>}` with camelCase payload fields.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::game::{Player, Projectile};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMsg {
    /// Enter the arena under a durable identity
    Join {
        /// Chat platform identity; numeric ids are accepted as well
        #[serde(deserialize_with = "string_or_number")]
        external_id: String,
        #[serde(default)]
        display_name: String,
    },

    /// Client-declared position (clamped server side)
    Move { x: f32, y: f32 },

    /// Throw a slap toward a point
    Slap {
        target_x: f32,
        target_y: f32,
        /// Aim direction in radians, informational only
        #[serde(default)]
        direction: f32,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMsg {
    /// Full world state, sent once to a newly joined session
    StateSnapshot {
        players: Vec<Player>,
        arena: ArenaInfo,
        your_session_id: Uuid,
    },

    PlayerJoined(Player),

    PlayerLeft { session_id: Uuid },

    PlayerMoved { session_id: Uuid, x: f32, y: f32 },

    ProjectileCreated(Projectile),

    /// Every live projectile at tick end (full state, not a delta)
    ProjectilesSnapshot(Vec<Projectile>),

    ProjectileExpired { id: String },

    PlayerHit {
        session_id: Uuid,
        health: u32,
        alive: bool,
        projectile_id: String,
    },

    PlayerRespawned {
        session_id: Uuid,
        x: f32,
        y: f32,
        health: u32,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Arena dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ArenaInfo {
    pub width: f32,
    pub height: f32,
}

/// Which sessions an outbound message is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every connected session
    All,
    /// Every session except the one that caused the event
    AllExcept(Uuid),
    /// A single session
    Only(Uuid),
}

impl Audience {
    pub fn includes(&self, session_id: Uuid) -> bool {
        match *self {
            Audience::All => true,
            Audience::AllExcept(excluded) => excluded != session_id,
            Audience::Only(target) => target == session_id,
        }
    }
}

/// A server message together with its routing
#[derive(Debug, Clone)]
pub struct Outbound {
    pub audience: Audience,
    pub msg: ServerMsg,
}

impl Outbound {
    pub fn all(msg: ServerMsg) -> Self {
        Self {
            audience: Audience::All,
            msg,
        }
    }

    pub fn all_except(session_id: Uuid, msg: ServerMsg) -> Self {
        Self {
            audience: Audience::AllExcept(session_id),
            msg,
        }
    }

    pub fn only(session_id: Uuid, msg: ServerMsg) -> Self {
        Self {
            audience: Audience::Only(session_id),
            msg,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_inbound_actions() {
        let join: ClientMsg = serde_json::from_value(json!({
            "type": "join",
            "data": { "externalId": "42", "displayName": "Ada" }
        }))
        .unwrap();
        assert_eq!(
            join,
            ClientMsg::Join {
                external_id: "42".to_string(),
                display_name: "Ada".to_string(),
            }
        );

        let slap: ClientMsg = serde_json::from_value(json!({
            "type": "slap",
            "data": { "targetX": 10.5, "targetY": 20.0, "direction": 1.2 }
        }))
        .unwrap();
        assert!(matches!(slap, ClientMsg::Slap { target_x, .. } if target_x == 10.5));
    }

    #[test]
    fn numeric_external_id_and_missing_name() {
        let join: ClientMsg = serde_json::from_value(json!({
            "type": "join",
            "data": { "externalId": 123456789 }
        }))
        .unwrap();
        assert_eq!(
            join,
            ClientMsg::Join {
                external_id: "123456789".to_string(),
                display_name: String::new(),
            }
        );
    }

    #[test]
    fn outbound_uses_kebab_event_names_and_camel_fields() {
        let session_id = Uuid::new_v4();
        let hit = ServerMsg::PlayerHit {
            session_id,
            health: 75,
            alive: true,
            projectile_id: "slap_x_1".to_string(),
        };
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["type"], "player-hit");
        assert_eq!(value["data"]["sessionId"], session_id.to_string());
        assert_eq!(value["data"]["projectileId"], "slap_x_1");
        assert_eq!(value["data"]["health"], 75);

        let snapshot = serde_json::to_value(ServerMsg::ProjectilesSnapshot(Vec::new())).unwrap();
        assert_eq!(snapshot["type"], "projectiles-snapshot");
        assert!(snapshot["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn audience_routing() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(Audience::All.includes(a));
        assert!(!Audience::AllExcept(a).includes(a));
        assert!(Audience::AllExcept(a).includes(b));
        assert!(Audience::Only(a).includes(a));
        assert!(!Audience::Only(a).includes(b));
    }

    #[test]
    fn rejects_unknown_event() {
        let result = serde_json::from_value::<ClientMsg>(json!({ "type": "teleport", "data": {} }));
        assert!(result.is_err());
    }
}
