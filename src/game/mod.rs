pub mod action;
pub mod game;
pub mod pieces;
pub mod state;

pub use action::{ActionPayload, GameAction};
pub use game::Game;
pub use pieces::{Piece, PieceId, PieceIdError};
pub use state::{
    ExtraTurnReason, FIRST_TURN_ROLLS, GOAL_BONUS, GameConfig, GameError, GameEvent, GameState,
    StepOutcome,
};
