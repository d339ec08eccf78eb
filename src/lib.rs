//! gtp-rust: the Go Text Protocol on both ends of the pipe.
//!
//! This crate provides a GTP engine with a pluggable command table and a
//! controller that drives external engines as child processes and runs
//! matches between them. It does not play Go: move choice sits behind the
//! [`generator::MoveGenerator`] trait and the board only tracks occupancy.
//!
//! ## Modules
//!
//! - [`constants`] - Default board bounds, komi and timeouts
//! - [`message`] - Request parsing and response formatting
//! - [`vertex`] - Colors, vertices and moves as protocol text
//! - [`board`] - Occupancy-only board
//! - [`generator`] - Move generation behind `genmove`
//! - [`engine`] - Command registry and dispatch
//! - [`peer`] - Child-process peers with bounded waits
//! - [`facade`] - Typed controller calls
//! - [`arena`] - Games and round-robin matches between peers
//! - [`config`] - Match configuration
//!
//! ## Example
//!
//! ```
//! use gtp_rust::arena::{play_game, EndReason, MatchSettings};
//! use gtp_rust::engine::{Engine, EngineConfig};
//! use gtp_rust::facade::GtpPeer;
//! use gtp_rust::generator::PassGenerator;
//!
//! // Two in-process engines that always pass
//! let passer = || Engine::with_config(EngineConfig::default(), Box::new(PassGenerator))
//!     .with_tournament_commands();
//! let mut black = GtpPeer::new("black", passer());
//! let mut white = GtpPeer::new("white", passer());
//!
//! let game = play_game(&mut black, &mut white, &MatchSettings::default()).unwrap();
//! assert_eq!(game.reason, EndReason::DoublePass);
//! ```

pub mod arena;
pub mod board;
pub mod config;
pub mod constants;
pub mod engine;
pub mod facade;
pub mod generator;
pub mod message;
pub mod peer;
pub mod vertex;
