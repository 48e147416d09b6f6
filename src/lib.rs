// Grudge: throttled dislikes and emoji reactions for games
//
// This is the library root. The client side is `batcher` (plus the CLI's
// `burst` driver); the server side is `ratelimit`, `db` and `web`.

pub mod batcher;
pub mod burst;
pub mod config;
pub mod db;
pub mod output;
pub mod ratelimit;
pub mod validate;

#[cfg(feature = "web")]
pub mod web;
