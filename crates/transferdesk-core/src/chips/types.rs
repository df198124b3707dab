use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::gameweek::{GameweekId, SEASON_GAMEWEEKS};

/// The four single-use chips.
///
/// Declaration order is the fixed tie-break priority used when two chip
/// decisions rank equally: Wildcard, Free Hit, Bench Boost, Triple Captain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipName {
    Wildcard,
    FreeHit,
    BenchBoost,
    TripleCaptain,
}

impl ChipName {
    pub const ALL: [ChipName; 4] = [
        ChipName::Wildcard,
        ChipName::FreeHit,
        ChipName::BenchBoost,
        ChipName::TripleCaptain,
    ];

    /// Tie-break rank, lower wins.
    pub fn priority(self) -> u8 {
        match self {
            ChipName::Wildcard => 0,
            ChipName::FreeHit => 1,
            ChipName::BenchBoost => 2,
            ChipName::TripleCaptain => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChipName::Wildcard => "Wildcard",
            ChipName::FreeHit => "Free Hit",
            ChipName::BenchBoost => "Bench Boost",
            ChipName::TripleCaptain => "Triple Captain",
        }
    }
}

impl fmt::Display for ChipName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive gameweek range in which a chip instance may be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipWindow {
    pub start_gw: GameweekId,
    pub stop_gw: GameweekId,
}

impl ChipWindow {
    pub fn new(start_gw: GameweekId, stop_gw: GameweekId) -> Self {
        Self { start_gw, stop_gw }
    }

    pub fn contains(&self, gw: GameweekId) -> bool {
        self.start_gw <= gw && gw <= self.stop_gw
    }
}

/// One playable chip instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipDefinition {
    pub name: ChipName,
    /// 1-based, in chronological window order per chip name
    pub instance: u8,
    pub window: ChipWindow,
}

/// A confirmed chip play. The instance it consumed is the one whose window
/// contains `gameweek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipUsageRecord {
    pub name: ChipName,
    pub gameweek: GameweekId,
}

/// Raw window entry as published upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipWindowEntry {
    pub name: ChipName,
    pub start_gw: GameweekId,
    pub stop_gw: GameweekId,
}

/// Wire form of a [`ChipCatalog`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChipCatalogData {
    pub windows: Vec<ChipWindowEntry>,
    #[serde(default)]
    pub usage: Vec<ChipUsageRecord>,
}

/// Season chip definitions plus already-consumed usage records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChipCatalogData", into = "ChipCatalogData")]
pub struct ChipCatalog {
    definitions: Vec<ChipDefinition>,
    usage: Vec<ChipUsageRecord>,
}

impl ChipCatalog {
    /// Build a catalog, numbering each chip's instances by ascending `start_gw`.
    pub fn from_windows(
        windows: Vec<ChipWindowEntry>,
        usage: Vec<ChipUsageRecord>,
    ) -> Result<Self, ValidationError> {
        for w in &windows {
            if w.start_gw == 0 || w.start_gw > w.stop_gw || w.stop_gw > SEASON_GAMEWEEKS {
                return Err(ValidationError::MalformedWindow {
                    chip: w.name,
                    start_gw: w.start_gw,
                    stop_gw: w.stop_gw,
                });
            }
        }

        let mut definitions = Vec::with_capacity(windows.len());
        for name in ChipName::ALL {
            let mut own: Vec<ChipWindow> = windows
                .iter()
                .filter(|w| w.name == name)
                .map(|w| ChipWindow::new(w.start_gw, w.stop_gw))
                .collect();
            own.sort_by_key(|w| (w.start_gw, w.stop_gw));
            definitions.extend(own.into_iter().enumerate().map(|(i, window)| ChipDefinition {
                name,
                instance: (i + 1) as u8,
                window,
            }));
        }

        Ok(Self { definitions, usage })
    }

    /// Every chip twice: once in GW1-19 and once in GW20-38.
    pub fn standard_two_halves() -> Self {
        let windows = ChipName::ALL
            .iter()
            .flat_map(|&name| {
                [
                    ChipWindowEntry { name, start_gw: 1, stop_gw: 19 },
                    ChipWindowEntry { name, start_gw: 20, stop_gw: SEASON_GAMEWEEKS },
                ]
            })
            .collect();
        Self::from_windows(windows, Vec::new()).unwrap_or_default()
    }

    pub fn with_usage(mut self, usage: Vec<ChipUsageRecord>) -> Self {
        self.usage = usage;
        self
    }

    pub fn definitions(&self) -> &[ChipDefinition] {
        &self.definitions
    }

    pub fn usage(&self) -> &[ChipUsageRecord] {
        &self.usage
    }

    pub fn definitions_for(&self, name: ChipName) -> impl Iterator<Item = &ChipDefinition> {
        self.definitions.iter().filter(move |d| d.name == name)
    }

    /// The instance of `name` whose window contains `gw`.
    pub fn instance_at(&self, name: ChipName, gw: GameweekId) -> Option<&ChipDefinition> {
        self.definitions_for(name).find(|d| d.window.contains(gw))
    }
}

impl TryFrom<ChipCatalogData> for ChipCatalog {
    type Error = ValidationError;

    fn try_from(data: ChipCatalogData) -> Result<Self, Self::Error> {
        Self::from_windows(data.windows, data.usage)
    }
}

impl From<ChipCatalog> for ChipCatalogData {
    fn from(catalog: ChipCatalog) -> Self {
        ChipCatalogData {
            windows: catalog
                .definitions
                .iter()
                .map(|d| ChipWindowEntry {
                    name: d.name,
                    start_gw: d.window.start_gw,
                    stop_gw: d.window.stop_gw,
                })
                .collect(),
            usage: catalog.usage,
        }
    }
}

/// Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipStatus {
    pub name: ChipName,
    pub instance: u8,
    pub window: ChipWindow,
    pub used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_in: Option<GameweekId>,
    pub available_now: bool,
    pub gws_until_expiry: u32,
    pub expires_soon: bool,
}
