//! Go Text Protocol (GTP) engine side.
//!
//! [`Engine`] turns request lines into response blocks. Commands live in an
//! explicit registry mapping names to handler functions, so `list_commands`
//! and `known_command` answer from the same table used for dispatch, and
//! embedders can [`register`](Engine::register) their own commands.
//!
//! ## Default Commands
//!
//! - `protocol_version`, `name`, `version`
//! - `known_command <cmd>`, `list_commands`, `quit`
//! - `boardsize <size>` - Accepts sizes within the configured bounds
//! - `clear_board`, `komi <value>`
//! - `play <color> <vertex>` - Occupancy check only, no captures or ko
//! - `genmove <color>` - Delegates to the configured [`MoveGenerator`]
//!
//! [`Engine::with_tournament_commands`] adds `time_settings`, `final_score`
//! and `showboard`, which a match controller needs.
//!
//! ## Example
//!
//! ```
//! use gtp_rust::engine::Engine;
//!
//! let mut engine = Engine::new();
//! assert_eq!(engine.send("1 boardsize 9"), "=1\n\n");
//! assert_eq!(engine.send("2 play black E5"), "=2\n\n");
//! assert_eq!(engine.send("3 play white E5"), "?3 illegal move\n\n");
//! ```

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{debug, trace};

use crate::board::{Board, Color};
use crate::constants::{
    COLUMNS, DEFAULT_BOARD_SIZE, DEFAULT_KOMI, ENGINE_NAME, ENGINE_VERSION, MAX_BOARD_SIZE, MIN_BOARD_SIZE,
    PROTOCOL_VERSION,
};
use crate::generator::{FixedGenerator, MoveGenerator};
use crate::message::{
    format_boolean, format_error, format_list, format_success, parse_message, sanitize_for_engine,
};
use crate::vertex::{parse_color, parse_move, Vertex};

/// Failure reasons reported in `?` responses. The `Display` text is the wire text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command")]
    UnknownCommand,
    #[error("syntax error")]
    SyntaxError,
    #[error("unacceptable size")]
    UnacceptableSize,
    #[error("illegal move")]
    IllegalMove,
}

/// Success payload (possibly empty) or failure reason.
pub type CommandResult = Result<Option<String>, CommandError>;

/// A command handler receives the raw, untokenized argument string.
pub type Handler = fn(&mut Engine, Option<&str>) -> CommandResult;

/// Construction-time settings for an [`Engine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub min_size: usize,
    pub max_size: usize,
    /// Initial board size
    pub size: usize,
    /// Initial komi
    pub komi: f32,
    pub name: String,
    pub version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_size: MIN_BOARD_SIZE,
            max_size: MAX_BOARD_SIZE,
            size: DEFAULT_BOARD_SIZE,
            komi: DEFAULT_KOMI,
            name: ENGINE_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Values received through `time_settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSettings {
    pub main_time: u32,
    pub byo_yomi_time: u32,
    pub byo_yomi_stones: u32,
}

/// GTP engine state plus its command registry.
pub struct Engine {
    config: EngineConfig,
    size: usize,
    komi: f32,
    board: Board,
    /// Accepted moves since the last clear, passes included
    move_history: Vec<(Color, Vertex)>,
    /// Stones captured by black and by white; nothing captures yet
    captures: [u32; 2],
    time_settings: Option<TimeSettings>,
    disconnect: bool,
    commands: BTreeMap<String, Handler>,
    generator: Box<dyn MoveGenerator>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with default settings and the placeholder generator.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default(), Box::new(FixedGenerator))
    }

    /// Create an engine from explicit settings and a move generator.
    ///
    /// Bounds are limited to the column alphabet, and an initial size outside
    /// `min_size..=max_size` is clamped into range.
    pub fn with_config(mut config: EngineConfig, generator: Box<dyn MoveGenerator>) -> Self {
        config.max_size = config.max_size.clamp(1, COLUMNS.len());
        config.min_size = config.min_size.clamp(1, config.max_size);
        let size = config.size.clamp(config.min_size, config.max_size);
        let mut engine = Self {
            size,
            komi: config.komi,
            board: Board::new(size),
            move_history: Vec::new(),
            captures: [0; 2],
            time_settings: None,
            disconnect: false,
            commands: BTreeMap::new(),
            generator,
            config,
        };
        engine.register_defaults();
        engine
    }

    /// Also register the commands a match controller sends.
    pub fn with_tournament_commands(mut self) -> Self {
        self.register("time_settings", cmd_time_settings);
        self.register("final_score", cmd_final_score);
        self.register("showboard", cmd_showboard);
        self
    }

    fn register_defaults(&mut self) {
        self.register("protocol_version", cmd_protocol_version);
        self.register("name", cmd_name);
        self.register("version", cmd_version);
        self.register("known_command", cmd_known_command);
        self.register("list_commands", cmd_list_commands);
        self.register("quit", cmd_quit);
        self.register("boardsize", cmd_boardsize);
        self.register("clear_board", cmd_clear_board);
        self.register("komi", cmd_komi);
        self.register("play", cmd_play);
        self.register("genmove", cmd_genmove);
    }

    /// Add a command, replacing any handler already registered under `name`.
    pub fn register(&mut self, name: &str, handler: Handler) {
        self.commands.insert(name.to_string(), handler);
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered command names in sorted order.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Handle one request line and return exactly one response block.
    pub fn send(&mut self, line: &str) -> String {
        let message = match parse_message(line) {
            Ok(message) => message,
            Err(err) => {
                debug!(error = %err, "rejecting request");
                return format_error(None, &CommandError::SyntaxError.to_string());
            }
        };
        let id = message.id;
        let command = message.command.as_deref().unwrap_or_default();

        let Some(handler) = self.commands.get(command).copied() else {
            debug!(command, "unknown command");
            return format_error(id, &CommandError::UnknownCommand.to_string());
        };

        trace!(command, arguments = ?message.arguments, "dispatching");
        match handler(self, message.arguments.as_deref()) {
            Ok(payload) => format_success(id, payload.as_deref().unwrap_or_default()),
            Err(err) => format_error(id, &err.to_string()),
        }
    }

    /// Serve requests from `input` until `quit` or end of input.
    ///
    /// Blank and comment-only lines get no response, as GTP requires. Bytes
    /// that are not UTF-8 are dropped along with other non-protocol characters.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> io::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            if sanitize_for_engine(&line).trim().is_empty() {
                continue;
            }

            let response = self.send(&line);
            output.write_all(response.as_bytes())?;
            output.flush()?;

            if self.disconnect {
                debug!("quit received");
                break;
            }
        }
        Ok(())
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn komi(&self) -> f32 {
        self.komi
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn move_history(&self) -> &[(Color, Vertex)] {
        &self.move_history
    }

    pub fn captures(&self, color: Color) -> u32 {
        self.captures[color as usize]
    }

    pub fn time_settings(&self) -> Option<TimeSettings> {
        self.time_settings
    }

    /// True once `quit` has been handled; the transport should stop reading.
    pub fn is_disconnected(&self) -> bool {
        self.disconnect
    }

    /// Empty the board and forget the game. Size and komi are kept.
    pub fn clear(&mut self) {
        self.board = Board::new(self.size);
        self.captures = [0; 2];
        self.move_history.clear();
    }

    /// Place a stone if `(x, y)` is on the board and empty.
    pub fn make_move(&mut self, color: Color, x: usize, y: usize) -> bool {
        if self.board.place(x, y, color).is_err() {
            return false;
        }
        self.move_history.push((color, Vertex::point(x, y)));
        true
    }
}

// =============================================================================
// Administrative Commands
// =============================================================================

fn cmd_protocol_version(_: &mut Engine, _: Option<&str>) -> CommandResult {
    Ok(Some(PROTOCOL_VERSION.to_string()))
}

fn cmd_name(engine: &mut Engine, _: Option<&str>) -> CommandResult {
    Ok(Some(engine.config.name.clone()))
}

fn cmd_version(engine: &mut Engine, _: Option<&str>) -> CommandResult {
    Ok(Some(engine.config.version.clone()))
}

fn cmd_known_command(engine: &mut Engine, args: Option<&str>) -> CommandResult {
    let known = args.is_some_and(|name| engine.is_known(name.trim()));
    Ok(Some(format_boolean(known).to_string()))
}

fn cmd_list_commands(engine: &mut Engine, _: Option<&str>) -> CommandResult {
    let names: Vec<&str> = engine.command_names().collect();
    Ok(Some(format_list(&names)))
}

fn cmd_quit(engine: &mut Engine, _: Option<&str>) -> CommandResult {
    engine.disconnect = true;
    Ok(None)
}

// =============================================================================
// Setup Commands
// =============================================================================

fn cmd_boardsize(engine: &mut Engine, args: Option<&str>) -> CommandResult {
    let size = args
        .and_then(|a| a.trim().parse::<usize>().ok())
        .filter(|s| (engine.config.min_size..=engine.config.max_size).contains(s))
        .ok_or(CommandError::UnacceptableSize)?;
    engine.size = size;
    engine.clear();
    Ok(None)
}

fn cmd_clear_board(engine: &mut Engine, _: Option<&str>) -> CommandResult {
    engine.clear();
    Ok(None)
}

fn cmd_komi(engine: &mut Engine, args: Option<&str>) -> CommandResult {
    engine.komi = args
        .and_then(|a| a.trim().parse::<f32>().ok())
        .ok_or(CommandError::SyntaxError)?;
    Ok(None)
}

// =============================================================================
// Core Play Commands
// =============================================================================

fn cmd_play(engine: &mut Engine, args: Option<&str>) -> CommandResult {
    let args = args.ok_or(CommandError::IllegalMove)?;

    let mut tokens = args.split_whitespace();
    if let (Some(color), Some(vertex)) = (tokens.next().and_then(parse_color), tokens.next()) {
        if vertex.eq_ignore_ascii_case("pass") {
            engine.move_history.push((color, Vertex::Pass));
            return Ok(None);
        }
    }

    let (color, x, y) = parse_move(args).map_err(|_| CommandError::IllegalMove)?;
    if engine.make_move(color, x, y) {
        Ok(None)
    } else {
        Err(CommandError::IllegalMove)
    }
}

fn cmd_genmove(engine: &mut Engine, args: Option<&str>) -> CommandResult {
    let color = args
        .and_then(|a| parse_color(a.trim()))
        .ok_or(CommandError::SyntaxError)?;

    let vertex = engine.generator.generate(color, &engine.board);
    match vertex {
        Vertex::Point { x, y } => {
            if !engine.make_move(color, x, y) {
                debug!(%vertex, "generated move not recorded, point unavailable");
            }
        }
        Vertex::Pass => engine.move_history.push((color, Vertex::Pass)),
        Vertex::Resign => {}
    }
    Ok(Some(vertex.to_string()))
}

// =============================================================================
// Tournament Commands
// =============================================================================

fn cmd_time_settings(engine: &mut Engine, args: Option<&str>) -> CommandResult {
    let values = args
        .unwrap_or_default()
        .split_whitespace()
        .map(str::parse::<u32>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| CommandError::SyntaxError)?;
    let &[main_time, byo_yomi_time, byo_yomi_stones] = values.as_slice() else {
        return Err(CommandError::SyntaxError);
    };
    engine.time_settings = Some(TimeSettings {
        main_time,
        byo_yomi_time,
        byo_yomi_stones,
    });
    Ok(None)
}

/// No scoring is done: the result is what komi alone would give on an empty board.
fn cmd_final_score(engine: &mut Engine, _: Option<&str>) -> CommandResult {
    let komi = engine.komi;
    let score = if komi > 0.0 {
        format!("W+{komi}")
    } else if komi < 0.0 {
        format!("B+{}", -komi)
    } else {
        "0".to_string()
    };
    Ok(Some(score))
}

fn cmd_showboard(engine: &mut Engine, _: Option<&str>) -> CommandResult {
    Ok(Some(format!("\n{}", engine.board.to_string().trim_end())))
}
