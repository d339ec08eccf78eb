//! Default values for board geometry, protocol identity and peer timeouts.
//!
//! Nothing in the crate reads these as globals at runtime: they only seed
//! [`EngineConfig`](crate::engine::EngineConfig) and
//! [`MatchSettings`](crate::arena::MatchSettings), so independent engines with
//! different board sizes can live in the same process.

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// Smallest board size accepted by `boardsize`.
pub const MIN_BOARD_SIZE: usize = 7;

/// Largest board size accepted by `boardsize`.
pub const MAX_BOARD_SIZE: usize = 19;

/// Board size of a freshly created engine.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Komi of a freshly created engine.
pub const DEFAULT_KOMI: f32 = 6.5;

/// Column letters, 'I' skipped as in conventional Go notation.
pub const COLUMNS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

// =============================================================================
// Protocol Identity
// =============================================================================

/// GTP protocol version reported by `protocol_version`.
pub const PROTOCOL_VERSION: &str = "2";

/// Name reported by `name` unless overridden.
pub const ENGINE_NAME: &str = "gtp-rust";

/// Version reported by `version` unless overridden.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Vertex returned by the placeholder move generator.
pub const FIXED_MOVE: (usize, usize) = (16, 16);

// =============================================================================
// Match Defaults
// =============================================================================

/// Main time in seconds sent through `time_settings`.
pub const DEFAULT_MAIN_TIME: u32 = 0;

/// Byo-yomi period in seconds sent through `time_settings`.
pub const DEFAULT_BYO_YOMI_TIME: u32 = 5;

/// Stones per byo-yomi period sent through `time_settings`.
pub const DEFAULT_BYO_YOMI_STONES: u32 = 1;

/// Upper bound on moves in one game before the orchestrator stops it.
pub const DEFAULT_MAX_MOVES: usize = 1000;

/// How long a single command may wait for its response block.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(120);

/// How long a peer gets to exit after `quit` before it is killed.
pub const QUIT_GRACE_PERIOD: Duration = Duration::from_millis(500);
