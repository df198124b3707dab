//! Fixture calendar: double/blank gameweek classification and fixture
//! difficulty over a planning horizon.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::gameweek::{GameweekId, SEASON_GAMEWEEKS};
use crate::squad::TeamId;

/// Difficulty charged for a gameweek in which a team has no fixture.
pub const BLANK_DIFFICULTY: f64 = 5.0;

/// A single match. Difficulty ratings are from each side's point of view (1-5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub gameweek: GameweekId,
    pub home: TeamId,
    pub away: TeamId,
    pub home_difficulty: u8,
    pub away_difficulty: u8,
}

impl Fixture {
    pub fn involves(&self, team: TeamId) -> bool {
        self.home == team || self.away == team
    }

    /// Difficulty for `team`, if it plays in this fixture.
    pub fn difficulty_for(&self, team: TeamId) -> Option<u8> {
        if self.home == team {
            Some(self.home_difficulty)
        } else if self.away == team {
            Some(self.away_difficulty)
        } else {
            None
        }
    }
}

/// Classification of one gameweek.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameweekProfile {
    pub gameweek: GameweekId,
    pub fixture_count: usize,
    pub playing_teams: HashSet<TeamId>,
    pub doubling_teams: HashSet<TeamId>,
    pub is_double: bool,
    pub is_blank: bool,
}

impl GameweekProfile {
    pub fn team_doubles(&self, team: TeamId) -> bool {
        self.doubling_teams.contains(&team)
    }

    pub fn team_plays(&self, team: TeamId) -> bool {
        self.playing_teams.contains(&team)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureCalendar {
    pub fixtures: Vec<Fixture>,
}

impl FixtureCalendar {
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        Self { fixtures }
    }

    pub fn fixtures_in(&self, gw: GameweekId) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(move |f| f.gameweek == gw)
    }

    pub fn team_fixture_count(&self, gw: GameweekId, team: TeamId) -> usize {
        self.fixtures_in(gw).filter(|f| f.involves(team)).count()
    }

    /// Teams appearing at least twice in the gameweek's fixture list.
    pub fn doubling_teams(&self, gw: GameweekId) -> HashSet<TeamId> {
        let mut counts: HashMap<TeamId, usize> = HashMap::new();
        for f in self.fixtures_in(gw) {
            *counts.entry(f.home).or_default() += 1;
            *counts.entry(f.away).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n >= 2)
            .map(|(team, _)| team)
            .collect()
    }

    /// Classify a gameweek. A gameweek is blank when its fixture count falls
    /// below `blank_threshold`; it can be both blank and double.
    pub fn profile(&self, gw: GameweekId, blank_threshold: usize) -> GameweekProfile {
        let fixture_count = self.fixtures_in(gw).count();
        let playing_teams = self
            .fixtures_in(gw)
            .flat_map(|f| [f.home, f.away])
            .collect();
        let doubling_teams = self.doubling_teams(gw);
        GameweekProfile {
            gameweek: gw,
            fixture_count,
            playing_teams,
            is_double: !doubling_teams.is_empty(),
            is_blank: fixture_count < blank_threshold,
            doubling_teams,
        }
    }

    /// Mean difficulty over `horizon` gameweeks starting at `from`. Each
    /// gameweek contributes the mean of the team's fixtures in it, or
    /// [`BLANK_DIFFICULTY`] when the team does not play. The horizon stops at
    /// the end of the season.
    pub fn horizon_difficulty(&self, team: TeamId, from: GameweekId, horizon: u32) -> f64 {
        let end = from.saturating_add(horizon).min(SEASON_GAMEWEEKS + 1);
        if end <= from {
            return 0.0;
        }
        let total: f64 = (from..end)
            .map(|gw| {
                let ratings: Vec<f64> = self
                    .fixtures_in(gw)
                    .filter_map(|f| f.difficulty_for(team))
                    .map(f64::from)
                    .collect();
                if ratings.is_empty() {
                    BLANK_DIFFICULTY
                } else {
                    ratings.iter().sum::<f64>() / ratings.len() as f64
                }
            })
            .sum();
        total / f64::from(end - from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(gw: GameweekId, home: TeamId, away: TeamId, hd: u8, ad: u8) -> Fixture {
        Fixture {
            gameweek: gw,
            home,
            away,
            home_difficulty: hd,
            away_difficulty: ad,
        }
    }

    #[test]
    fn doubling_team_appears_twice() {
        let cal = FixtureCalendar::new(vec![fx(30, 1, 2, 3, 3), fx(30, 3, 1, 2, 4), fx(30, 4, 5, 3, 3)]);
        let profile = cal.profile(30, 8);
        assert!(profile.is_double);
        assert!(profile.team_doubles(1));
        assert!(!profile.team_doubles(2));
        assert_eq!(cal.team_fixture_count(30, 1), 2);
    }

    #[test]
    fn blank_when_fixture_count_below_threshold() {
        let fixtures = (0..6).map(|i| fx(29, i * 2 + 1, i * 2 + 2, 3, 3)).collect();
        let cal = FixtureCalendar::new(fixtures);
        let profile = cal.profile(29, 8);
        assert!(profile.is_blank);
        assert!(!profile.is_double);
        assert_eq!(profile.fixture_count, 6);
        assert!(profile.team_plays(12));
        assert!(!profile.team_plays(13));
    }

    #[test]
    fn full_round_is_neither_blank_nor_double() {
        let fixtures = (0..10).map(|i| fx(10, i * 2 + 1, i * 2 + 2, 3, 3)).collect();
        let profile = FixtureCalendar::new(fixtures).profile(10, 8);
        assert!(!profile.is_blank);
        assert!(!profile.is_double);
    }

    #[test]
    fn horizon_difficulty_averages_and_penalises_blanks() {
        let cal = FixtureCalendar::new(vec![fx(1, 1, 2, 2, 4), fx(2, 3, 1, 2, 4)]);
        // GW1 home: 2, GW2 away: 4, GW3 blank: 5
        let d = cal.horizon_difficulty(1, 1, 3);
        assert!((d - 11.0 / 3.0).abs() < 1e-9);
        assert!((cal.horizon_difficulty(1, 1, 1) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn horizon_stops_at_season_end() {
        let cal = FixtureCalendar::new(vec![fx(37, 1, 2, 3, 3), fx(38, 1, 2, 2, 4)]);
        assert!((cal.horizon_difficulty(1, 38, 3) - 2.0).abs() < 1e-9);
        assert!((cal.horizon_difficulty(1, 37, 3) - 2.5).abs() < 1e-9);
        assert!(cal.horizon_difficulty(1, 38, 3) < 3.5);
        assert_eq!(cal.horizon_difficulty(1, 39, 3), 0.0);
    }
}
