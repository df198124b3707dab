//! Players, positions and the managed squad.

use serde::{Deserialize, Serialize};

pub type PlayerId = u32;
pub type TeamId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

/// Availability flag as published by the upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    #[default]
    Available,
    Doubtful,
    Injured,
    Suspended,
    Unavailable,
}

impl PlayerStatus {
    /// Statuses that rule a player out of the next gameweek.
    pub fn is_ruled_out(self) -> bool {
        matches!(
            self,
            PlayerStatus::Injured | PlayerStatus::Suspended | PlayerStatus::Unavailable
        )
    }
}

/// A player as seen by the engine. Projections come from the external
/// oracle and are taken as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: TeamId,
    pub position: Position,
    /// Price in millions
    pub price: f64,
    #[serde(default)]
    pub points_per_game: f64,
    #[serde(default)]
    pub form: f64,
    #[serde(default)]
    pub total_points: u32,
    #[serde(default)]
    pub minutes: u32,
    /// Oracle projection for the target gameweek
    #[serde(default)]
    pub expected_points: f64,
    #[serde(default)]
    pub status: PlayerStatus,
}

/// The managed 15-man squad.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    pub players: Vec<Player>,
    /// Bench order, first substitute first
    #[serde(default)]
    pub bench: Vec<PlayerId>,
    pub captain: Option<PlayerId>,
}

impl Squad {
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// Resolve a player by identifier, falling back to a case-insensitive
    /// display-name match.
    pub fn resolve(&self, id: Option<PlayerId>, name: &str) -> Option<&Player> {
        if let Some(p) = id.and_then(|id| self.get(id)) {
            return Some(p);
        }
        let needle = name.trim();
        if needle.is_empty() {
            return None;
        }
        self.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(needle))
    }

    pub fn bench_players(&self) -> impl Iterator<Item = &Player> {
        self.bench.iter().filter_map(|id| self.get(*id))
    }

    pub fn starters(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !self.bench.contains(&p.id))
    }

    pub fn captain(&self) -> Option<&Player> {
        self.captain.and_then(|id| self.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: PlayerId, name: &str) -> Player {
        Player {
            id,
            name: name.to_string(),
            team: 1,
            position: Position::Midfielder,
            price: 7.0,
            points_per_game: 4.0,
            form: 4.0,
            total_points: 40,
            minutes: 900,
            expected_points: 4.5,
            status: PlayerStatus::Available,
        }
    }

    #[test]
    fn resolve_prefers_id_then_name() {
        let squad = Squad {
            players: vec![player(1, "Saka"), player(2, "Palmer")],
            bench: vec![2],
            captain: Some(1),
        };

        assert_eq!(squad.resolve(Some(2), "Saka").map(|p| p.id), Some(2));
        assert_eq!(squad.resolve(Some(99), "palmer").map(|p| p.id), Some(2));
        assert!(squad.resolve(None, "Haaland").is_none());
        assert!(squad.resolve(None, "  ").is_none());
    }

    #[test]
    fn starters_exclude_bench() {
        let squad = Squad {
            players: vec![player(1, "A"), player(2, "B"), player(3, "C")],
            bench: vec![3],
            captain: Some(1),
        };
        let starters: Vec<_> = squad.starters().map(|p| p.id).collect();
        assert_eq!(starters, vec![1, 2]);
        assert_eq!(squad.bench_players().count(), 1);
        assert_eq!(squad.captain().map(|p| p.id), Some(1));
    }

    #[test]
    fn ruled_out_statuses() {
        assert!(PlayerStatus::Injured.is_ruled_out());
        assert!(PlayerStatus::Suspended.is_ruled_out());
        assert!(!PlayerStatus::Doubtful.is_ruled_out());
    }
}
