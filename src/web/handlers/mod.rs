pub mod dislike;
pub mod games;
pub mod reactions;
