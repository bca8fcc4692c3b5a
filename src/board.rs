use smallvec::SmallVec;

use crate::types::{PlayerColor, TileKind};

pub const MAIN_LOOP_LEN: i32 = 52;
pub const SAFE_TILE_STRIDE: i32 = 13;
pub const HOME_BASE: i32 = -1;
pub const GOAL: i32 = 999;

/// Block-relative home-path offsets 0..=5 are reachable; the traveled counter,
/// not the offset, decides when a step lands on the goal.
pub const HOME_BLOCK_SPAN: i32 = 5;

/// 50 main-loop steps, then the home path, then one final step onto the goal.
pub const MAX_TRAVELED: u8 = 57;
pub const HOME_ENTRY_TRAVELED: u8 = 50;
pub const GOAL_ENTRY_TRAVELED: u8 = 56;

pub const PIECES_PER_PLAYER: u8 = 4;

pub fn spawn_index(color: PlayerColor) -> i32 {
    match color {
        PlayerColor::Red => 0,
        PlayerColor::Green => 13,
        PlayerColor::Yellow => 26,
        PlayerColor::Blue => 39,
    }
}

pub fn home_path_entry(color: PlayerColor) -> i32 {
    match color {
        PlayerColor::Red => 100,
        PlayerColor::Green => 200,
        PlayerColor::Yellow => 300,
        PlayerColor::Blue => 400,
    }
}

pub fn tile_kind(index: i32) -> Option<TileKind> {
    if index == GOAL {
        return Some(TileKind::Goal);
    }
    if (0..MAIN_LOOP_LEN).contains(&index) {
        return Some(if index % SAFE_TILE_STRIDE == 0 {
            TileKind::Safe
        } else {
            TileKind::Common
        });
    }
    PlayerColor::ORDERED.into_iter().find_map(|color| {
        let entry = home_path_entry(color);
        ((entry..=entry + HOME_BLOCK_SPAN).contains(&index)).then_some(TileKind::HomePath(color))
    })
}

/// Capture is forbidden on every 13th main-loop tile.
pub fn is_safe(index: i32) -> bool {
    matches!(tile_kind(index), Some(TileKind::Safe))
}

/// One step of movement for a piece of `color` at `position` with `traveled`
/// steps behind it. Pure; a move of `n` calls this exactly `n` times so that
/// every intermediate tile is observable.
pub fn next_step(color: PlayerColor, position: i32, traveled: u8) -> i32 {
    if traveled >= GOAL_ENTRY_TRAVELED {
        return GOAL;
    }
    if (100..GOAL).contains(&position) {
        return position + 1;
    }
    if traveled == HOME_ENTRY_TRAVELED {
        return home_path_entry(color);
    }
    (position + 1) % MAIN_LOOP_LEN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    pub position: i32,
    pub traveled: u8,
}

/// The full step-by-step path of a `steps`-tile move, stopping early on the
/// goal; leftover steps are discarded.
pub fn walk(color: PlayerColor, position: i32, traveled: u8, steps: u8) -> SmallVec<[PathStep; 6]> {
    let mut path = SmallVec::new();
    let mut position = position;
    let mut traveled = traveled;
    for _ in 0..steps {
        position = next_step(color, position, traveled);
        traveled += 1;
        path.push(PathStep { position, traveled });
        if position == GOAL {
            break;
        }
    }
    path
}
