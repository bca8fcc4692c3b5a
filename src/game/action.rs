use serde::{Deserialize, Serialize};

use crate::game::pieces::PieceId;
use crate::types::{ActionType, PlayerColor};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GameAction {
    pub color: PlayerColor,
    pub action_type: ActionType,
    pub payload: ActionPayload,
}

impl GameAction {
    pub fn new(color: PlayerColor, action_type: ActionType) -> Self {
        Self {
            color,
            action_type,
            payload: ActionPayload::None,
        }
    }

    pub fn with_payload(mut self, payload: ActionPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn roll(color: PlayerColor) -> Self {
        Self::new(color, ActionType::Roll)
    }

    /// A roll with a predetermined die, for scripted tests and replays.
    pub fn roll_exact(color: PlayerColor, value: u8) -> Self {
        Self::new(color, ActionType::Roll).with_payload(ActionPayload::Dice(value))
    }

    pub fn move_piece(color: PlayerColor, piece: PieceId) -> Self {
        Self::new(color, ActionType::MovePiece).with_payload(ActionPayload::Piece(piece))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ActionPayload {
    #[default]
    None,
    Dice(u8),
    Piece(PieceId),
}
