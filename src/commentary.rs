//! Seam for the live-commentary text generator. The engine only ever treats
//! the returned string as opaque UI text; failures degrade to a canned line
//! and can never block or alter game state.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::types::PlayerColor;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentaryKind {
    Capture,
    Six,
    Goal,
    Spawn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentaryEvent {
    pub kind: CommentaryKind,
    pub color: PlayerColor,
    pub detail: String,
}

impl CommentaryEvent {
    pub fn new(kind: CommentaryKind, color: PlayerColor, detail: impl Into<String>) -> Self {
        Self {
            kind,
            color,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommentaryError {
    #[error("commentary backend unavailable: {0}")]
    Unavailable(String),
}

pub const FALLBACK_LINE: &str = "The crowd goes wild!";

pub trait CommentaryService: Send {
    fn commentary(&mut self, event: &CommentaryEvent) -> Result<String, CommentaryError>;
}

/// Built-in commentator drawing from a small line bank. A networked LLM
/// implementation plugs in behind the same trait.
#[derive(Debug)]
pub struct CannedCommentary {
    rng: StdRng,
}

const CAPTURE_LINES: [&str; 3] = [
    "Eh! {color} sends them packing! Ka-danger!",
    "Bambi! A brutal capture by {color}!",
    "Wueh! {color} shows no mercy out there!",
];

const SIX_LINES: [&str; 3] = [
    "The SIX! {color} rolls the SIX!",
    "Kati! A six for {color}, the board is open!",
    "Ssebo! {color} strikes a six!",
];

const GOAL_LINES: [&str; 2] = [
    "{color} brings one home! Fifty points, bambi!",
    "Eh eh! {color} reaches the goal in style!",
];

const SPAWN_LINES: [&str; 2] = [
    "{color} joins the race! Watch out!",
    "A fresh runner for {color}, kati kati!",
];

impl CannedCommentary {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, lines: &[&str], color: PlayerColor) -> String {
        let line = lines[self.rng.gen_range(0..lines.len())];
        line.replace("{color}", &color.to_string())
    }
}

impl CommentaryService for CannedCommentary {
    fn commentary(&mut self, event: &CommentaryEvent) -> Result<String, CommentaryError> {
        let line = match event.kind {
            CommentaryKind::Capture => self.pick(&CAPTURE_LINES, event.color),
            CommentaryKind::Six => self.pick(&SIX_LINES, event.color),
            CommentaryKind::Goal => self.pick(&GOAL_LINES, event.color),
            CommentaryKind::Spawn => self.pick(&SPAWN_LINES, event.color),
        };
        Ok(line)
    }
}
