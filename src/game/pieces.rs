use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::{GOAL, HOME_BASE, MAX_TRAVELED};
use crate::types::PlayerColor;

/// Stable piece identity for the whole session, serialized `"RED_0"` style.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct PieceId {
    pub color: PlayerColor,
    pub index: u8,
}

impl PieceId {
    pub fn new(color: PlayerColor, index: u8) -> Self {
        Self { color, index }
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.color, self.index)
    }
}

impl FromStr for PieceId {
    type Err = PieceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (color, index) = s
            .split_once('_')
            .ok_or_else(|| PieceIdError(s.to_string()))?;
        let color = color.parse().map_err(|_| PieceIdError(s.to_string()))?;
        let index = index.parse().map_err(|_| PieceIdError(s.to_string()))?;
        Ok(Self { color, index })
    }
}

impl From<PieceId> for String {
    fn from(id: PieceId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PieceId {
    type Error = PieceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed piece id {0:?}")]
pub struct PieceIdError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub color: PlayerColor,
    /// -1 = home base, 0..51 = shared loop, per-color 100s block = home path,
    /// 999 = goal.
    pub position: i32,
    /// Cumulative step count since spawn; the authoritative progress counter.
    /// Position wraps on the shared loop, so it is not invertible on its own.
    pub traveled: u8,
}

impl Piece {
    pub fn new(id: PieceId) -> Self {
        Self {
            id,
            color: id.color,
            position: HOME_BASE,
            traveled: 0,
        }
    }

    pub fn at_home(&self) -> bool {
        self.position == HOME_BASE
    }

    pub fn finished(&self) -> bool {
        self.position == GOAL
    }

    pub fn on_board(&self) -> bool {
        !self.at_home() && !self.finished()
    }

    pub fn in_home_path(&self) -> bool {
        (100..GOAL).contains(&self.position)
    }

    pub fn overshoots(&self, dice: u8) -> bool {
        u16::from(self.traveled) + u16::from(dice) > u16::from(MAX_TRAVELED)
    }

    /// Per-piece legality for the active dice value: spawning needs a 6,
    /// on-board movement needs an exact-or-under roll.
    pub fn can_move(&self, dice: u8) -> bool {
        if self.finished() {
            return false;
        }
        if self.at_home() {
            return dice == 6;
        }
        !self.overshoots(dice)
    }

    pub fn send_home(&mut self) {
        self.position = HOME_BASE;
        self.traveled = 0;
    }
}
