use std::sync::Arc;

use tracing::{debug, warn};

use crate::commentary::{
    CannedCommentary, CommentaryEvent, CommentaryKind, CommentaryService, FALLBACK_LINE,
};
use crate::game::{Game, GameAction, GameConfig, GameError, GameEvent, PieceId, StepOutcome};
use crate::types::{PlayerColor, TurnPhase};

use super::store::{MatchDocument, MatchId, MatchStore, ParticipantId, StoreError, Subscription};

struct OnlineBackend {
    store: Arc<dyn MatchStore>,
    match_id: MatchId,
    color: PlayerColor,
    subscription: Subscription,
}

/// One client's view of a match: the optimistic local state, its seat color
/// (hot-seat sessions act for every seat), and the replication handle.
///
/// The shell drives it with exactly two intents, `request_roll` and
/// `select_piece`, replays the emitted events with its own pacing, and calls
/// `poll_remote` / `poll_auto_move` from its event loop.
pub struct Session {
    game: Game,
    backend: Option<OnlineBackend>,
    busy: bool,
    divergence: u64,
    participants: usize,
    commentator: Box<dyn CommentaryService>,
    commentary: String,
}

impl Session {
    /// Hot-seat session: no network, every engine-produced state is simply
    /// the new source of truth.
    pub fn local(config: GameConfig) -> Self {
        let seed = config.seed;
        Self {
            game: Game::new(config),
            backend: None,
            busy: false,
            divergence: 0,
            participants: 1,
            commentator: Box::new(CannedCommentary::new(seed)),
            commentary: String::new(),
        }
    }

    /// Creates a fresh match document; the creator takes the first seat.
    pub fn create_match(
        store: Arc<dyn MatchStore>,
        participant: ParticipantId,
        config: GameConfig,
    ) -> Result<Self, StoreError> {
        let seed = config.seed;
        let game = Game::new(config);
        let color = PlayerColor::CLAIM_ORDER[0];
        let doc = MatchDocument::new(game.state.clone(), participant, color);
        let match_id = store.create(doc)?;
        let subscription = store.subscribe(match_id)?;
        Ok(Self {
            game,
            backend: Some(OnlineBackend {
                store,
                match_id,
                color,
                subscription,
            }),
            busy: false,
            divergence: 0,
            participants: 1,
            commentator: Box::new(CannedCommentary::new(seed)),
            commentary: String::new(),
        })
    }

    /// Joins an existing match, taking the first unclaimed seat color.
    /// Re-joining participants recover their previous color idempotently.
    pub fn join_match(
        store: Arc<dyn MatchStore>,
        participant: ParticipantId,
        match_id: MatchId,
    ) -> Result<Self, StoreError> {
        let doc = store.read(match_id)?;
        let color = match doc.players.get(&participant) {
            Some(&color) => color,
            None => PlayerColor::CLAIM_ORDER
                .into_iter()
                .find(|c| !doc.players.values().any(|taken| taken == c))
                .ok_or(StoreError::MatchFull)?,
        };
        store.claim_color(match_id, &participant, color)?;
        let subscription = store.subscribe(match_id)?;
        let participants = doc.players.len().max(1);
        let game = Game::from_state(doc.game_state);
        Ok(Self {
            game,
            backend: Some(OnlineBackend {
                store,
                match_id,
                color,
                subscription,
            }),
            busy: false,
            divergence: 0,
            participants,
            commentator: Box::new(CannedCommentary::new(match_id.as_u128() as u64)),
            commentary: String::new(),
        })
    }

    pub fn with_commentator(mut self, commentator: Box<dyn CommentaryService>) -> Self {
        self.commentator = commentator;
        self
    }

    /// Read-only snapshot for the presentation layer.
    pub fn state(&self) -> &crate::game::GameState {
        &self.game.state
    }

    pub fn match_id(&self) -> Option<MatchId> {
        self.backend.as_ref().map(|b| b.match_id)
    }

    /// This session's seat, or None for hot-seat play.
    pub fn color(&self) -> Option<PlayerColor> {
        self.backend.as_ref().map(|b| b.color)
    }

    pub fn is_my_turn(&self) -> bool {
        match &self.backend {
            Some(backend) => backend.color == self.game.state.current_player(),
            None => true,
        }
    }

    /// Animation guard: while set, roll and move intents are ignored (not
    /// rejected). Remote pushes still apply.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Consecutive failed publishes since the last successful one. Non-zero
    /// means the local copy has diverged from the shared record.
    pub fn pending_divergence(&self) -> u64 {
        self.divergence
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Latest commentary line; opaque UI text only.
    pub fn commentary(&self) -> &str {
        &self.commentary
    }

    /// Dice-tap intent. Returns `Ok(None)` when the session is busy (a roll
    /// or move replay is already in flight) and the request is ignored.
    pub fn request_roll(&mut self) -> Result<Option<StepOutcome>, GameError> {
        if self.busy {
            return Ok(None);
        }
        let acting = self.acting_color();
        let outcome = self.game.state.step(GameAction::roll(acting))?;
        self.after_step(acting, &outcome);
        Ok(Some(outcome))
    }

    /// Piece-tap intent.
    pub fn select_piece(&mut self, piece: PieceId) -> Result<Option<StepOutcome>, GameError> {
        if self.busy {
            return Ok(None);
        }
        let acting = self.acting_color();
        let outcome = self.game.state.step(GameAction::move_piece(acting, piece))?;
        self.after_step(acting, &outcome);
        Ok(Some(outcome))
    }

    /// Performs the automatic single-choice move if its trigger conditions
    /// still hold. The shell calls this after its pacing delay; conditions
    /// are re-validated here so a stale timer cannot act. Only the turn-owning
    /// session fires, so exactly one client performs the move per decision
    /// point.
    pub fn poll_auto_move(&mut self) -> Result<Option<StepOutcome>, GameError> {
        if self.busy || !self.is_my_turn() {
            return Ok(None);
        }
        let Some(piece) = self.game.state.sole_legal_move() else {
            return Ok(None);
        };
        debug!(%piece, "auto-moving the only legal piece");
        self.select_piece(piece)
    }

    /// Applies every queued remote snapshot wholesale, newest last, and
    /// returns how many were applied. A push arriving mid-animation replaces
    /// the state outright; the shell's replay is expected to tolerate the
    /// truncation.
    pub fn poll_remote(&mut self) -> usize {
        let Some(backend) = &self.backend else {
            return 0;
        };
        let mut applied = 0;
        while let Some(doc) = backend.subscription.try_next() {
            self.participants = doc.players.len();
            self.game.state = doc.game_state;
            applied += 1;
        }
        if applied > 0 {
            debug!(applied, "remote snapshots applied");
        }
        applied
    }

    fn acting_color(&self) -> PlayerColor {
        match &self.backend {
            Some(backend) => backend.color,
            None => self.game.state.current_player(),
        }
    }

    /// Optimistic write path: the local state is already the new truth; the
    /// full document field is republished best-effort. A failed publish is
    /// surfaced through `pending_divergence`, never rolled back.
    fn after_step(&mut self, acting: PlayerColor, outcome: &StepOutcome) {
        if let Some(backend) = &self.backend {
            match backend
                .store
                .write_game_state(backend.match_id, &self.game.state)
            {
                Ok(()) => self.divergence = 0,
                Err(err) => {
                    warn!(error = %err, "state publish failed; local copy diverges until the next remote push");
                    self.divergence += 1;
                }
            }
        }
        if let Some(event) = commentary_event(acting, &outcome.events) {
            self.commentary = match self.commentator.commentary(&event) {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "commentary backend failed, using fallback");
                    FALLBACK_LINE.to_string()
                }
            };
        }
        if self.game.state.phase == TurnPhase::Win {
            debug!(winner = ?self.game.state.winner, "match finished");
        }
    }
}

/// Picks the most newsworthy event of a transition: capture over goal over
/// six over spawn, mirroring the commentary priorities of the original HUD.
fn commentary_event(acting: PlayerColor, events: &[GameEvent]) -> Option<CommentaryEvent> {
    let mut best: Option<(u8, CommentaryEvent)> = None;
    for event in events {
        let candidate = match event {
            GameEvent::PieceCaptured { victim, tile } => Some((
                3,
                CommentaryEvent::new(
                    CommentaryKind::Capture,
                    acting,
                    format!("Captured {} at tile {tile}!", victim.color),
                ),
            )),
            GameEvent::PieceFinished { .. } => Some((
                2,
                CommentaryEvent::new(CommentaryKind::Goal, acting, "Reached the goal! +50!"),
            )),
            GameEvent::DiceRolled { value: 6, .. } => Some((
                1,
                CommentaryEvent::new(CommentaryKind::Six, acting, "Rolled the six!"),
            )),
            GameEvent::PieceSpawned { tile, .. } => Some((
                0,
                CommentaryEvent::new(
                    CommentaryKind::Spawn,
                    acting,
                    format!("A new runner enters at tile {tile}"),
                ),
            )),
            _ => None,
        };
        if let Some((rank, event)) = candidate {
            if best.as_ref().map_or(true, |(top, _)| rank > *top) {
                best = Some((rank, event));
            }
        }
    }
    best.map(|(_, event)| event)
}
