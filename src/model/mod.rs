pub mod contest;
pub mod vote;

pub use contest::{ContestScope, ElectionContest};
pub use vote::VoteRecord;
