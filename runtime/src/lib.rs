//! Async host for the game engine.
//!
//! A [`GameService`] task owns the engine and is the only place that mutates it. Front-ends talk to it through a
//! cloneable [`GameHandle`]: commands go in over an unbounded channel, events come back over a broadcast channel
//! and the latest [`GameSnapshot`](blink_core::GameSnapshot) is kept in a watch channel for cheap reads.

use thiserror::Error;

pub use handle::*;
pub use service::*;

mod handle;
mod service;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Game service is not running")]
    Closed,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
