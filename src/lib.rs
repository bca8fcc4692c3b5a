#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod board;
pub mod commentary;
pub mod game;
pub mod sync;
pub mod types;

pub use game::{Game, GameAction, GameConfig, GameError, GameEvent, GameState, Piece, PieceId};
pub use sync::{MatchDocument, MatchStore, MemoryStore, Session};
pub use types::{PlayerColor, TileKind, TurnPhase};
