//! Match configuration, from a TOML file and/or the command line.
//!
//! ```toml
//! boardsize = 9
//! komi = 7.5
//! timeout_secs = 30
//!
//! [[engines]]
//! command = "gnugo"
//! args = ["--mode", "gtp", "--level", "1"]
//!
//! [[engines]]
//! command = "pachi"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::arena::MatchSettings;
use crate::constants::{
    DEFAULT_BOARD_SIZE, DEFAULT_BYO_YOMI_STONES, DEFAULT_BYO_YOMI_TIME, DEFAULT_KOMI,
    DEFAULT_MAIN_TIME, DEFAULT_MAX_MOVES, DEFAULT_PEER_TIMEOUT, MAX_BOARD_SIZE, MIN_BOARD_SIZE,
};
use crate::peer::EngineSpec;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    pub engines: Vec<EngineSpec>,
    pub boardsize: usize,
    pub komi: f32,
    pub main_time: u32,
    pub byo_yomi_time: u32,
    pub byo_yomi_stones: u32,
    pub max_moves: usize,
    pub timeout_secs: u64,
    /// Run the pairings concurrently
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            engines: Vec::new(),
            boardsize: DEFAULT_BOARD_SIZE,
            komi: DEFAULT_KOMI,
            main_time: DEFAULT_MAIN_TIME,
            byo_yomi_time: DEFAULT_BYO_YOMI_TIME,
            byo_yomi_stones: DEFAULT_BYO_YOMI_STONES,
            max_moves: DEFAULT_MAX_MOVES,
            timeout_secs: DEFAULT_PEER_TIMEOUT.as_secs(),
            parallel: false,
        }
    }
}

impl MatchConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid match configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Add an engine given as one command line, e.g. `"gnugo --mode gtp"`.
    pub fn push_engine_command(&mut self, line: &str) -> Result<()> {
        match EngineSpec::from_command_line(line) {
            Some(spec) => {
                self.engines.push(spec);
                Ok(())
            }
            None => bail!("empty engine command"),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.engines.len() < 2 {
            bail!(
                "at least two engines are needed for a match, got {}",
                self.engines.len()
            );
        }
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.boardsize) {
            bail!(
                "board size {} outside {MIN_BOARD_SIZE}..={MAX_BOARD_SIZE}",
                self.boardsize
            );
        }
        if self.timeout_secs == 0 {
            bail!("timeout must be at least one second");
        }
        if self.max_moves == 0 {
            bail!("max_moves must be positive");
        }
        Ok(())
    }

    pub fn settings(&self) -> MatchSettings {
        MatchSettings {
            boardsize: self.boardsize,
            komi: self.komi,
            main_time: self.main_time,
            byo_yomi_time: self.byo_yomi_time,
            byo_yomi_stones: self.byo_yomi_stones,
            max_moves: self.max_moves,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}
