pub mod session;
pub mod store;

pub use session::Session;
pub use store::{
    MatchDocument, MatchId, MatchStatus, MatchStore, MemoryStore, ParticipantId, StoreError,
    Subscription,
};
