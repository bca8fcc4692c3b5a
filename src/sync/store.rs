use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::game::GameState;
use crate::types::PlayerColor;

pub type MatchId = Uuid;
pub type ParticipantId = String;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Waiting,
    Active,
    Finished,
}

/// The unit the store replicates: one whole document per match, replaced
/// field-by-field never, document-by-document always (last writer wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDocument {
    pub game_state: GameState,
    pub players: BTreeMap<ParticipantId, PlayerColor>,
    /// Creation time, unix milliseconds.
    pub created: u64,
    pub status: MatchStatus,
}

impl MatchDocument {
    pub fn new(game_state: GameState, creator: ParticipantId, color: PlayerColor) -> Self {
        let mut players = BTreeMap::new();
        players.insert(creator, color);
        Self {
            game_state,
            players,
            created: unix_millis(),
            status: MatchStatus::Waiting,
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("match {0} not found")]
    MatchNotFound(MatchId),
    #[error("match is full")]
    MatchFull,
    #[error("color {0} already claimed")]
    ColorTaken(PlayerColor),
    #[error("store backend unavailable: {0}")]
    Unavailable(&'static str),
}

/// Live feed of whole-document snapshots for one match, delivered in commit
/// order. Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: Receiver<MatchDocument>,
}

impl Subscription {
    pub fn try_next(&self) -> Option<MatchDocument> {
        self.rx.try_recv().ok()
    }

    /// Drains everything currently queued and returns the newest snapshot.
    pub fn latest(&self) -> Option<MatchDocument> {
        let mut latest = None;
        while let Some(doc) = self.try_next() {
            latest = Some(doc);
        }
        latest
    }
}

/// Abstract replication store: create, point read, whole-field game-state
/// overwrite, color claim, and push-based subscription. Concurrency control
/// is last-writer-wins at the document level; turn gating upstream is what
/// keeps writers from colliding.
pub trait MatchStore: Send + Sync {
    fn create(&self, doc: MatchDocument) -> Result<MatchId, StoreError>;

    fn read(&self, id: MatchId) -> Result<MatchDocument, StoreError>;

    /// Overwrites the document's `gameState` field wholesale and notifies
    /// subscribers. Never a field-level patch.
    fn write_game_state(&self, id: MatchId, state: &GameState) -> Result<(), StoreError>;

    /// Records `participant` as holding `color`. Idempotent for a participant
    /// re-claiming its own color; fails if another participant holds it.
    fn claim_color(
        &self,
        id: MatchId,
        participant: &ParticipantId,
        color: PlayerColor,
    ) -> Result<(), StoreError>;

    fn subscribe(&self, id: MatchId) -> Result<Subscription, StoreError>;
}

/// In-process reference store used by hot-seat play and tests. A remote
/// document store implements the same trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    matches: HashMap<MatchId, MatchDocument>,
    subscribers: HashMap<MatchId, Vec<Sender<MatchDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned"))
    }
}

impl Inner {
    fn broadcast(&mut self, id: MatchId) {
        let Some(doc) = self.matches.get(&id).cloned() else {
            return;
        };
        if let Some(senders) = self.subscribers.get_mut(&id) {
            senders.retain(|tx| tx.send(doc.clone()).is_ok());
        }
    }
}

impl MatchStore for MemoryStore {
    fn create(&self, doc: MatchDocument) -> Result<MatchId, StoreError> {
        let id = Uuid::new_v4();
        let mut inner = self.lock()?;
        inner.matches.insert(id, doc);
        Ok(id)
    }

    fn read(&self, id: MatchId) -> Result<MatchDocument, StoreError> {
        self.lock()?
            .matches
            .get(&id)
            .cloned()
            .ok_or(StoreError::MatchNotFound(id))
    }

    fn write_game_state(&self, id: MatchId, state: &GameState) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let doc = inner
            .matches
            .get_mut(&id)
            .ok_or(StoreError::MatchNotFound(id))?;
        doc.game_state = state.clone();
        if doc.game_state.winner.is_some() {
            doc.status = MatchStatus::Finished;
        }
        tracing::debug!(%id, "game state written");
        inner.broadcast(id);
        Ok(())
    }

    fn claim_color(
        &self,
        id: MatchId,
        participant: &ParticipantId,
        color: PlayerColor,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let doc = inner
            .matches
            .get_mut(&id)
            .ok_or(StoreError::MatchNotFound(id))?;
        if let Some((holder, _)) = doc.players.iter().find(|&(_, &c)| c == color) {
            if holder != participant {
                return Err(StoreError::ColorTaken(color));
            }
            return Ok(());
        }
        doc.players.insert(participant.clone(), color);
        if doc.players.len() > 1 {
            doc.status = MatchStatus::Active;
        }
        tracing::debug!(%id, participant, %color, "color claimed");
        inner.broadcast(id);
        Ok(())
    }

    fn subscribe(&self, id: MatchId) -> Result<Subscription, StoreError> {
        let mut inner = self.lock()?;
        if !inner.matches.contains_key(&id) {
            return Err(StoreError::MatchNotFound(id));
        }
        let (tx, rx) = channel();
        inner.subscribers.entry(id).or_default().push(tx);
        Ok(Subscription { rx })
    }
}
