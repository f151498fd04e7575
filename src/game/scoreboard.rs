//! Cumulative per-identity score counters

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Wins credited for defeating a player
pub const WIN_INCREMENT: u32 = 1;
/// Reward tokens credited for defeating a player
pub const TOKENS_PER_WIN: u64 = 10;

/// Counters for one durable identity
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub wins: u32,
    pub slaps_thrown: u64,
    pub tokens_earned: u64,
}

/// Leaderboard row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub external_id: String,
    #[serde(flatten)]
    pub score: ScoreEntry,
}

/// Score store keyed by external identity. Entries are never removed.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    /// Creation order
    entries: Vec<(String, ScoreEntry)>,
    index: HashMap<String, usize>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zeroed entry on first sight of an identity
    pub fn record_join(&mut self, external_id: &str) {
        self.entry_mut(external_id);
    }

    pub fn record_slap(&mut self, external_id: &str) {
        self.entry_mut(external_id).slaps_thrown += 1;
    }

    pub fn record_win(&mut self, external_id: &str) {
        let entry = self.entry_mut(external_id);
        entry.wins += WIN_INCREMENT;
        entry.tokens_earned += TOKENS_PER_WIN;
    }

    pub fn get(&self, external_id: &str) -> Option<&ScoreEntry> {
        self.index.get(external_id).map(|&i| &self.entries[i].1)
    }

    /// Highest win counts first; ties keep creation order
    pub fn top_n(&self, n: usize) -> Vec<RankedEntry> {
        let mut ranked: Vec<&(String, ScoreEntry)> = self.entries.iter().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.wins.cmp(&a.1.wins));
        ranked
            .into_iter()
            .take(n)
            .map(|(external_id, score)| RankedEntry {
                external_id: external_id.clone(),
                score: score.clone(),
            })
            .collect()
    }

    /// Number of identities ever seen
    pub fn identity_count(&self) -> usize {
        self.entries.len()
    }

    fn entry_mut(&mut self, external_id: &str) -> &mut ScoreEntry {
        let idx = match self.index.get(external_id) {
            Some(&idx) => idx,
            None => {
                self.entries
                    .push((external_id.to_string(), ScoreEntry::default()));
                let idx = self.entries.len() - 1;
                self.index.insert(external_id.to_string(), idx);
                idx
            }
        };
        &mut self.entries[idx].1
    }
}
