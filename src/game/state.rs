use std::collections::BTreeMap;

use itertools::Itertools;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::board::{self, GOAL, PIECES_PER_PLAYER};
use crate::types::{ActionType, PlayerColor, TurnPhase};

use super::action::{ActionPayload, GameAction};
use super::pieces::{Piece, PieceId};

/// A color's very first turn grants up to four roll attempts.
pub const FIRST_TURN_ROLLS: u8 = 4;
/// Flat score bonus for every piece on the goal.
pub const GOAL_BONUS: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Fixed rotation for the session's lifetime.
    pub turn_order: [PlayerColor; 4],
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_order: PlayerColor::CLAIM_ORDER,
            seed: 42,
        }
    }
}

/// The full replicated game state. Every transition goes through [`GameState::step`];
/// collaborators only ever observe complete state values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub players: [PlayerColor; 4],
    pub current_player_index: usize,
    pub pieces: Vec<Piece>,
    /// None means "not yet rolled this decision point".
    pub dice_value: Option<u8>,
    pub phase: TurnPhase,
    pub winner: Option<PlayerColor>,
    pub has_played_first_turn: BTreeMap<PlayerColor, bool>,
    pub rolls_left_in_turn: u8,
    #[serde(skip)]
    actions: Vec<GameAction>,
    #[serde(skip, default = "detached_rng")]
    rng: StdRng,
}

// Remote snapshots deserialize with a throwaway rng; only the turn-owning
// client draws dice from its own engine.
fn detached_rng() -> StdRng {
    StdRng::seed_from_u64(0)
}

#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraTurnReason {
    RolledSix,
    Capture,
    ReachedGoal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GameEvent {
    DiceRolled {
        color: PlayerColor,
        value: u8,
    },
    /// First-turn retry: the roll was spent but the same color rolls again.
    RerollGranted {
        color: PlayerColor,
        rolls_left: u8,
    },
    PieceSpawned {
        piece: PieceId,
        tile: i32,
    },
    /// One per intermediate tile of a multi-step move, final tile included.
    PieceStepped {
        piece: PieceId,
        tile: i32,
        traveled: u8,
    },
    PieceCaptured {
        victim: PieceId,
        tile: i32,
    },
    PieceFinished {
        piece: PieceId,
    },
    /// The selected piece would overshoot the goal; the turn is forfeited.
    OvershootForfeit {
        piece: PieceId,
        traveled: u8,
        value: u8,
    },
    ExtraTurn {
        color: PlayerColor,
        reason: ExtraTurnReason,
    },
    TurnAdvanced {
        next: PlayerColor,
    },
    GameWon {
        winner: PlayerColor,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("game already completed")]
    GameFinished,
    #[error("action by {actual} but it is {expected}'s turn")]
    ActionOutOfTurn {
        expected: PlayerColor,
        actual: PlayerColor,
    },
    #[error("no roll is expected right now")]
    NotAwaitingRoll,
    #[error("no move is expected right now")]
    NotAwaitingMove,
    #[error("no dice value is active")]
    MissingDiceValue,
    #[error("dice value {0} out of range")]
    InvalidDice(u8),
    #[error("unknown piece {0}")]
    UnknownPiece(PieceId),
    #[error("piece {0} belongs to another player")]
    NotYourPiece(PieceId),
    #[error("you need a 6 to spawn")]
    SpawnNeedsSix,
    #[error("missing or invalid payload: {0}")]
    InvalidPayload(&'static str),
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let pieces = PlayerColor::ORDERED
            .into_iter()
            .flat_map(|color| {
                (0..PIECES_PER_PLAYER).map(move |index| Piece::new(PieceId::new(color, index)))
            })
            .collect();
        let has_played_first_turn = PlayerColor::ORDERED
            .into_iter()
            .map(|color| (color, false))
            .collect();
        Self {
            players: config.turn_order,
            current_player_index: 0,
            pieces,
            dice_value: None,
            phase: TurnPhase::Roll,
            winner: None,
            has_played_first_turn,
            rolls_left_in_turn: FIRST_TURN_ROLLS,
            actions: Vec::new(),
            rng,
        }
    }

    pub fn current_player(&self) -> PlayerColor {
        self.players[self.current_player_index]
    }

    pub fn played_first_turn(&self, color: PlayerColor) -> bool {
        self.has_played_first_turn
            .get(&color)
            .copied()
            .unwrap_or(false)
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    pub fn pieces_of(&self, color: PlayerColor) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(move |p| p.color == color)
    }

    pub fn action_log(&self) -> &[GameAction] {
        &self.actions
    }

    /// The single transition function. Rejections leave the state untouched;
    /// every `Ok` is a complete new state value.
    pub fn step(&mut self, action: GameAction) -> Result<StepOutcome, GameError> {
        if matches!(self.phase, TurnPhase::Win) {
            return Err(GameError::GameFinished);
        }
        if action.color != self.current_player() {
            return Err(GameError::ActionOutOfTurn {
                expected: self.current_player(),
                actual: action.color,
            });
        }
        let mut outcome = StepOutcome::default();
        match action.action_type {
            ActionType::Roll => self.handle_roll(&action, &mut outcome)?,
            ActionType::MovePiece => self.handle_move(&action, &mut outcome)?,
        }
        self.actions.push(action);
        Ok(outcome)
    }

    fn handle_roll(
        &mut self,
        action: &GameAction,
        outcome: &mut StepOutcome,
    ) -> Result<(), GameError> {
        if self.phase != TurnPhase::Roll {
            return Err(GameError::NotAwaitingRoll);
        }
        let value = match action.payload {
            ActionPayload::None => self.roll_die(),
            ActionPayload::Dice(v) if (1..=6).contains(&v) => v,
            ActionPayload::Dice(v) => return Err(GameError::InvalidDice(v)),
            ActionPayload::Piece(_) => {
                return Err(GameError::InvalidPayload("roll takes no piece"));
            }
        };
        let color = self.current_player();
        outcome.events.push(GameEvent::DiceRolled { color, value });

        // The attempt is spent before any branch-specific override.
        let rolls_left = self.rolls_left_in_turn.saturating_sub(1);
        let first_turn = !self.played_first_turn(color);
        let pieces_out = self.pieces_of(color).filter(|p| p.on_board()).count();

        self.dice_value = Some(value);
        if value == 6 {
            self.phase = TurnPhase::Move;
            self.rolls_left_in_turn = if first_turn { FIRST_TURN_ROLLS } else { 1 };
        } else if pieces_out > 0 {
            // Whether each piece can actually take this roll is rechecked at
            // move time; a board full of overshooters still enters MOVE and
            // forfeits on selection.
            self.phase = TurnPhase::Move;
            self.rolls_left_in_turn = rolls_left;
        } else if first_turn && rolls_left > 0 {
            self.rolls_left_in_turn = rolls_left;
            outcome
                .events
                .push(GameEvent::RerollGranted { color, rolls_left });
        } else {
            self.rolls_left_in_turn = rolls_left;
            self.advance_turn(outcome);
        }
        Ok(())
    }

    fn handle_move(
        &mut self,
        action: &GameAction,
        outcome: &mut StepOutcome,
    ) -> Result<(), GameError> {
        if self.phase != TurnPhase::Move {
            return Err(GameError::NotAwaitingMove);
        }
        let ActionPayload::Piece(piece_id) = action.payload else {
            return Err(GameError::InvalidPayload("expected piece payload"));
        };
        let value = self.dice_value.ok_or(GameError::MissingDiceValue)?;
        let color = self.current_player();
        let idx = self
            .pieces
            .iter()
            .position(|p| p.id == piece_id)
            .ok_or(GameError::UnknownPiece(piece_id))?;
        let piece = self.pieces[idx];
        if piece.color != color {
            return Err(GameError::NotYourPiece(piece_id));
        }

        if piece.at_home() {
            if value != 6 {
                return Err(GameError::SpawnNeedsSix);
            }
            // Spawn is atomic: no intermediate steps.
            let tile = board::spawn_index(color);
            self.pieces[idx].position = tile;
            self.pieces[idx].traveled = 1;
            outcome.events.push(GameEvent::PieceSpawned {
                piece: piece_id,
                tile,
            });
            let captured = self.resolve_capture(idx, outcome);
            self.conclude_move(value, captured, false, outcome);
            return Ok(());
        }

        if piece.overshoots(value) {
            // Exact roll required to come home; a losing selection forfeits
            // the turn in the same transition. A finished piece always lands
            // here (traveled is already 57), so clicking it forfeits too.
            outcome.events.push(GameEvent::OvershootForfeit {
                piece: piece_id,
                traveled: piece.traveled,
                value,
            });
            self.advance_turn(outcome);
            return Ok(());
        }

        let path = board::walk(color, piece.position, piece.traveled, value);
        for step in &path {
            outcome.events.push(GameEvent::PieceStepped {
                piece: piece_id,
                tile: step.position,
                traveled: step.traveled,
            });
        }
        let last = path
            .last()
            .copied()
            .ok_or(GameError::InvalidDice(value))?;
        self.pieces[idx].position = last.position;
        self.pieces[idx].traveled = last.traveled;

        let reached_goal = last.position == GOAL;
        if reached_goal {
            outcome.events.push(GameEvent::PieceFinished { piece: piece_id });
        }
        let captured = if !reached_goal && last.position < 100 {
            self.resolve_capture(idx, outcome)
        } else {
            false
        };
        self.conclude_move(value, captured, reached_goal, outcome);
        Ok(())
    }

    /// Capture on the final tile only: shared loop, not safe, one opposing
    /// occupant outside its home path. The victim returns to base.
    fn resolve_capture(&mut self, mover_idx: usize, outcome: &mut StepOutcome) -> bool {
        let tile = self.pieces[mover_idx].position;
        if board::is_safe(tile) {
            return false;
        }
        let mover_color = self.pieces[mover_idx].color;
        let victim_idx = self
            .pieces
            .iter()
            .position(|p| p.position == tile && p.color != mover_color);
        let Some(victim_idx) = victim_idx else {
            return false;
        };
        let victim = self.pieces[victim_idx].id;
        self.pieces[victim_idx].send_home();
        outcome.events.push(GameEvent::PieceCaptured { victim, tile });
        true
    }

    fn conclude_move(
        &mut self,
        value: u8,
        captured: bool,
        reached_goal: bool,
        outcome: &mut StepOutcome,
    ) {
        if reached_goal && self.check_victory(outcome) {
            return;
        }
        if value == 6 || captured || reached_goal {
            let reason = if captured {
                ExtraTurnReason::Capture
            } else if reached_goal {
                ExtraTurnReason::ReachedGoal
            } else {
                ExtraTurnReason::RolledSix
            };
            self.dice_value = None;
            self.phase = TurnPhase::Roll;
            self.rolls_left_in_turn = 1;
            outcome.events.push(GameEvent::ExtraTurn {
                color: self.current_player(),
                reason,
            });
        } else {
            self.advance_turn(outcome);
        }
    }

    fn advance_turn(&mut self, outcome: &mut StepOutcome) {
        let outgoing = self.current_player();
        // The first-turn flag flips only when the turn is handed off.
        self.has_played_first_turn.insert(outgoing, true);
        self.current_player_index = (self.current_player_index + 1) % self.players.len();
        let next = self.current_player();
        self.dice_value = None;
        self.phase = TurnPhase::Roll;
        self.rolls_left_in_turn = if self.played_first_turn(next) {
            1
        } else {
            FIRST_TURN_ROLLS
        };
        outcome.events.push(GameEvent::TurnAdvanced { next });
    }

    fn check_victory(&mut self, outcome: &mut StepOutcome) -> bool {
        let color = self.current_player();
        if self.pieces_of(color).all(|p| p.finished()) {
            self.winner = Some(color);
            self.phase = TurnPhase::Win;
            self.dice_value = None;
            outcome.events.push(GameEvent::GameWon { winner: color });
            return true;
        }
        false
    }

    fn roll_die(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }
}

impl GameState {
    /// The piece to move automatically when exactly one qualifies. The caller
    /// re-validates phase, dice, and turn ownership after its pacing delay.
    pub fn sole_legal_move(&self) -> Option<PieceId> {
        if self.phase != TurnPhase::Move {
            return None;
        }
        let value = self.dice_value?;
        let color = self.current_player();
        self.pieces_of(color)
            .filter(|p| p.can_move(value))
            .exactly_one()
            .ok()
            .map(|p| p.id)
    }

    pub fn legal_actions(&self) -> Vec<GameAction> {
        let color = self.current_player();
        match self.phase {
            TurnPhase::Roll => vec![GameAction::roll(color)],
            TurnPhase::Move => {
                let Some(value) = self.dice_value else {
                    return Vec::new();
                };
                let movable: Vec<GameAction> = self
                    .pieces_of(color)
                    .filter(|p| p.can_move(value))
                    .map(|p| GameAction::move_piece(color, p.id))
                    .collect();
                if !movable.is_empty() {
                    return movable;
                }
                // Every selectable piece overshoots; picking one is still the
                // only way forward and it forfeits the turn.
                self.pieces_of(color)
                    .filter(|p| p.on_board())
                    .map(|p| GameAction::move_piece(color, p.id))
                    .collect()
            }
            TurnPhase::Win => Vec::new(),
        }
    }

    /// Derived, never stored: traveled sum plus a flat bonus per finished piece.
    pub fn scores(&self) -> BTreeMap<PlayerColor, u32> {
        let mut scores: BTreeMap<PlayerColor, u32> =
            self.players.iter().map(|&color| (color, 0)).collect();
        for piece in &self.pieces {
            let entry = scores.entry(piece.color).or_default();
            *entry += u32::from(piece.traveled);
            if piece.finished() {
                *entry += GOAL_BONUS;
            }
        }
        scores
    }
}
