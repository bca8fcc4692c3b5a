use uuid::Uuid;

use crate::game::{GameConfig, GameState};
use crate::types::PlayerColor;

pub struct Game {
    pub id: Uuid,
    pub seed: u64,
    pub state: GameState,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            seed: config.seed,
            state: GameState::new(config),
        }
    }

    /// Wraps a replicated state received from the store; the seed is unknown
    /// and unused since only the turn owner draws dice.
    pub fn from_state(state: GameState) -> Self {
        Self {
            id: Uuid::new_v4(),
            seed: 0,
            state,
        }
    }

    pub fn winning_color(&self) -> Option<PlayerColor> {
        self.state.winner
    }
}
