//! Engine-versus-engine matches.
//!
//! [`play_game`] runs one game between two peers; [`round_robin`] plays every
//! ordered pair of a list of engines (each pair once with each engine as
//! black) and counts wins per engine name.
//!
//! A game ends when a player resigns or when two passes follow each other.
//! After a double pass the winner is whatever black's `final_score` says;
//! a drawn score such as `0` credits nobody, so a round robin's total wins
//! can be lower than its game count. A game whose peer fails (timeout,
//! crash, rejected move) is abandoned and also credits nobody.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::board::Color;
use crate::constants::{
    DEFAULT_BOARD_SIZE, DEFAULT_BYO_YOMI_STONES, DEFAULT_BYO_YOMI_TIME, DEFAULT_KOMI,
    DEFAULT_MAIN_TIME, DEFAULT_MAX_MOVES, DEFAULT_PEER_TIMEOUT,
};
use crate::facade::GtpPeer;
use crate::peer::{EngineSpec, PeerError, ProcessPeer, Transport};
use crate::vertex::Vertex;

/// Settings sent to both engines before each game.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSettings {
    pub boardsize: usize,
    pub komi: f32,
    pub main_time: u32,
    pub byo_yomi_time: u32,
    pub byo_yomi_stones: u32,
    /// Moves after which a game is stopped and scored as it stands
    pub max_moves: usize,
    /// Per-command response timeout
    pub timeout: Duration,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            boardsize: DEFAULT_BOARD_SIZE,
            komi: DEFAULT_KOMI,
            main_time: DEFAULT_MAIN_TIME,
            byo_yomi_time: DEFAULT_BYO_YOMI_TIME,
            byo_yomi_stones: DEFAULT_BYO_YOMI_STONES,
            max_moves: DEFAULT_MAX_MOVES,
            timeout: DEFAULT_PEER_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The given color resigned
    Resignation(Color),
    DoublePass,
    MoveLimit,
}

/// Outcome of one finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub black: String,
    pub white: String,
    pub winner: Option<Color>,
    pub reason: EndReason,
    /// Generated moves in order, the final pass or resignation included
    pub moves: Vec<(Color, Vertex)>,
}

impl GameRecord {
    pub fn winner_label(&self) -> Option<&str> {
        self.winner.map(|color| match color {
            Color::Black => self.black.as_str(),
            Color::White => self.white.as_str(),
        })
    }
}

// =============================================================================
// Single Game
// =============================================================================

fn introduce<T: Transport>(peer: &mut GtpPeer<T>) -> Result<(), PeerError> {
    peer.name()?;
    peer.version()?;
    Ok(())
}

/// Play one game, `black` moving first. Both peers stay open afterwards.
pub fn play_game<T: Transport>(
    black: &mut GtpPeer<T>,
    white: &mut GtpPeer<T>,
    settings: &MatchSettings,
) -> Result<GameRecord, PeerError> {
    introduce(black)?;
    introduce(white)?;
    for peer in [&mut *black, &mut *white] {
        peer.boardsize(settings.boardsize)?;
    }
    for peer in [&mut *black, &mut *white] {
        peer.time_settings(
            settings.main_time,
            settings.byo_yomi_time,
            settings.byo_yomi_stones,
        )?;
    }
    for peer in [&mut *black, &mut *white] {
        peer.komi(settings.komi)?;
    }
    for peer in [&mut *black, &mut *white] {
        peer.clear_board()?;
    }

    info!(black = %black.label(), white = %white.label(), "game started");

    // One flag for both colors: a pass right after the other side's pass ends the game.
    let mut first_pass = false;
    let mut moves = Vec::new();
    let mut color = Color::Black;

    let reason = loop {
        if moves.len() >= settings.max_moves {
            break EndReason::MoveLimit;
        }

        let (mover, opponent) = match color {
            Color::Black => (&mut *black, &mut *white),
            Color::White => (&mut *white, &mut *black),
        };

        let vertex = mover.genmove(color)?;
        moves.push((color, vertex));
        match vertex {
            Vertex::Resign => break EndReason::Resignation(color),
            Vertex::Pass if first_pass => break EndReason::DoublePass,
            Vertex::Pass => first_pass = true,
            Vertex::Point { .. } => first_pass = false,
        }

        opponent.play(color, vertex)?;
        color = color.opponent();
    };

    let winner = match reason {
        EndReason::Resignation(loser) => Some(loser.opponent()),
        EndReason::DoublePass | EndReason::MoveLimit => black.final_score()?,
    };

    let record = GameRecord {
        black: black.label().to_string(),
        white: white.label().to_string(),
        winner,
        reason,
        moves,
    };
    info!(
        black = %record.black,
        white = %record.white,
        winner = ?record.winner_label(),
        reason = ?record.reason,
        moves = record.moves.len(),
        "game finished"
    );
    Ok(record)
}

// =============================================================================
// Round Robin
// =============================================================================

/// Wins per engine label, shared between concurrently running games.
#[derive(Debug, Default)]
pub struct Tally {
    scores: Mutex<BTreeMap<String, u32>>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished game. Both labels appear in the tally afterwards.
    pub fn record(&self, game: &GameRecord) {
        let mut scores = self.scores.lock();
        scores.entry(game.black.clone()).or_insert(0);
        scores.entry(game.white.clone()).or_insert(0);
        if let Some(label) = game.winner_label() {
            *scores.entry(label.to_string()).or_insert(0) += 1;
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, u32> {
        self.scores.lock().clone()
    }
}

/// A pairing that could not be played to the end.
#[derive(Debug)]
pub struct Abandoned {
    pub black: usize,
    pub white: usize,
    pub error: PeerError,
}

#[derive(Debug, Default)]
pub struct RoundRobinReport {
    pub scores: BTreeMap<String, u32>,
    pub games: Vec<GameRecord>,
    pub abandoned: Vec<Abandoned>,
}

/// Every ordered pair `(i, j)` with `i != j`, `i` playing black.
pub fn pairings(count: usize) -> Vec<(usize, usize)> {
    (0..count)
        .flat_map(|i| (0..count).filter(move |&j| j != i).map(move |j| (i, j)))
        .collect()
}

/// Create both peers, play, and close them whatever happened.
fn run_pairing<T, F>(
    black: usize,
    white: usize,
    connect: &F,
    settings: &MatchSettings,
) -> Result<GameRecord, PeerError>
where
    T: Transport,
    F: Fn(usize) -> Result<GtpPeer<T>, PeerError>,
{
    let mut black_peer = connect(black)?;
    let mut white_peer = connect(white)?;

    let result = play_game(&mut black_peer, &mut white_peer, settings);

    for peer in [&mut black_peer, &mut white_peer] {
        if let Err(err) = peer.close() {
            warn!(peer = %peer.label(), error = %err, "close failed");
        }
    }
    result
}

/// Play all pairings among `count` engines, creating peers with `connect`.
///
/// With `parallel` every pairing gets its own thread and its own two peers.
pub fn round_robin_with<T, F>(
    count: usize,
    connect: F,
    settings: &MatchSettings,
    parallel: bool,
) -> RoundRobinReport
where
    T: Transport,
    F: Fn(usize) -> Result<GtpPeer<T>, PeerError> + Sync,
{
    let tally = Tally::new();
    let pairs = pairings(count);

    let play = |(black, white): (usize, usize)| {
        let result = run_pairing(black, white, &connect, settings);
        match &result {
            Ok(game) => tally.record(game),
            Err(err) => warn!(black, white, error = %err, "game abandoned"),
        }
        (black, white, result)
    };

    let results: Vec<_> = if parallel {
        thread::scope(|scope| {
            let handles: Vec<_> = pairs
                .iter()
                .map(|&pair| scope.spawn(move || play(pair)))
                .collect();
            handles.into_iter().filter_map(|h| h.join().ok()).collect()
        })
    } else {
        pairs.into_iter().map(play).collect()
    };

    let mut report = RoundRobinReport {
        scores: tally.snapshot(),
        ..RoundRobinReport::default()
    };
    for (black, white, result) in results {
        match result {
            Ok(game) => report.games.push(game),
            Err(error) => report.abandoned.push(Abandoned {
                black,
                white,
                error,
            }),
        }
    }
    report
}

/// Play all pairings among external engine processes.
pub fn round_robin(
    engines: &[EngineSpec],
    settings: &MatchSettings,
    parallel: bool,
) -> RoundRobinReport {
    let connect = |index: usize| -> Result<GtpPeer<ProcessPeer>, PeerError> {
        GtpPeer::spawn(&format!("engine{index}"), &engines[index], settings.timeout)
    };
    round_robin_with(engines.len(), connect, settings, parallel)
}
