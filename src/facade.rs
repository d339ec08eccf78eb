//! Typed GTP controller calls on top of a [`Transport`].
//!
//! Each method formats one command, sends it, and interprets the reply.
//! Failure replies become [`PeerError::Rejected`]; replies that cannot be
//! understood become [`PeerError::Malformed`].

use std::time::Duration;

use tracing::warn;

use crate::board::Color;
use crate::message::{parse_response, Response};
use crate::peer::{EngineSpec, PeerError, ProcessPeer, Transport};
use crate::vertex::{format_color, parse_vertex, Vertex};

pub struct GtpPeer<T: Transport = ProcessPeer> {
    label: String,
    transport: T,
}

impl GtpPeer<ProcessPeer> {
    /// Launch an engine process and wrap it.
    pub fn spawn(label: &str, spec: &EngineSpec, timeout: Duration) -> Result<Self, PeerError> {
        Ok(Self::new(label, ProcessPeer::spawn(label, spec, timeout)?))
    }
}

impl<T: Transport> GtpPeer<T> {
    pub fn new(label: &str, transport: T) -> Self {
        Self {
            label: label.to_string(),
            transport,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a command and parse the reply, whatever its status.
    fn command(&mut self, command: &str) -> Result<Response, PeerError> {
        let block = self.transport.send(&format!("{command}\n"))?;
        parse_response(&block).map_err(|err| PeerError::Malformed {
            label: self.label.clone(),
            command: command.to_string(),
            reason: err.to_string(),
        })
    }

    /// Send a command and return the payload of a success reply.
    fn expect_success(&mut self, command: &str) -> Result<String, PeerError> {
        let response = self.command(command)?;
        if response.success {
            Ok(response.payload)
        } else {
            Err(PeerError::Rejected {
                label: self.label.clone(),
                command: command.to_string(),
                reason: response.payload,
            })
        }
    }

    // =========================================================================
    // Administrative
    // =========================================================================

    /// Ask the engine its name and use it as this peer's label from now on.
    pub fn name(&mut self) -> Result<String, PeerError> {
        let name = self.expect_success("name")?;
        if !name.is_empty() {
            self.label = name.clone();
            self.transport.set_label(&name);
        }
        Ok(name)
    }

    pub fn version(&mut self) -> Result<String, PeerError> {
        self.expect_success("version")
    }

    pub fn protocol_version(&mut self) -> Result<String, PeerError> {
        self.expect_success("protocol_version")
    }

    pub fn known_command(&mut self, name: &str) -> Result<bool, PeerError> {
        Ok(self.expect_success(&format!("known_command {name}"))? == "true")
    }

    pub fn close(&mut self) -> Result<(), PeerError> {
        self.transport.close()
    }

    // =========================================================================
    // Setup
    // =========================================================================

    pub fn boardsize(&mut self, size: usize) -> Result<(), PeerError> {
        self.expect_success(&format!("boardsize {size}")).map(drop)
    }

    pub fn komi(&mut self, komi: f32) -> Result<(), PeerError> {
        self.expect_success(&format!("komi {komi}")).map(drop)
    }

    pub fn clear_board(&mut self) -> Result<(), PeerError> {
        self.expect_success("clear_board").map(drop)
    }

    /// Canadian byo-yomi settings. Engines without time control may refuse;
    /// that is logged and otherwise ignored.
    pub fn time_settings(
        &mut self,
        main_time: u32,
        byo_yomi_time: u32,
        byo_yomi_stones: u32,
    ) -> Result<(), PeerError> {
        let command = format!("time_settings {main_time} {byo_yomi_time} {byo_yomi_stones}");
        let response = self.command(&command)?;
        if !response.success {
            warn!(peer = %self.label, reason = %response.payload, "time_settings refused");
        }
        Ok(())
    }

    // =========================================================================
    // Play
    // =========================================================================

    /// Ask for a move: a point, PASS or RESIGN.
    pub fn genmove(&mut self, color: Color) -> Result<Vertex, PeerError> {
        let command = format!("genmove {}", format_color(color));
        let payload = self.expect_success(&command)?;
        parse_vertex(payload.trim()).map_err(|err| PeerError::Malformed {
            label: self.label.clone(),
            command,
            reason: err.to_string(),
        })
    }

    /// Tell the engine about a move. RESIGN is not a move and is not sent.
    pub fn play(&mut self, color: Color, vertex: Vertex) -> Result<(), PeerError> {
        let vertex = match vertex {
            Vertex::Resign => return Ok(()),
            Vertex::Pass => "pass".to_string(),
            point => point.to_string(),
        };
        self.expect_success(&format!("play {} {vertex}", format_color(color)))
            .map(drop)
    }

    /// Winner according to the engine's `final_score`; `None` for a draw or
    /// a result without a leading `B`/`W`.
    pub fn final_score(&mut self) -> Result<Option<Color>, PeerError> {
        let payload = self.expect_success("final_score")?;
        Ok(match payload.chars().next() {
            Some('B' | 'b') => Some(Color::Black),
            Some('W' | 'w') => Some(Color::White),
            _ => None,
        })
    }

    pub fn showboard(&mut self) -> Result<String, PeerError> {
        self.expect_success("showboard")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, EngineConfig};
    use crate::generator::PassGenerator;

    fn loopback() -> GtpPeer<Engine> {
        GtpPeer::new("loopback", Engine::new().with_tournament_commands())
    }

    #[test]
    fn test_name_relabels() {
        let mut peer = loopback();
        assert_eq!(peer.label(), "loopback");
        assert_eq!(peer.name().unwrap(), "gtp-rust");
        assert_eq!(peer.label(), "gtp-rust");
    }

    #[test]
    fn test_admin_queries() {
        let mut peer = loopback();
        assert_eq!(peer.protocol_version().unwrap(), "2");
        assert_eq!(peer.version().unwrap(), env!("CARGO_PKG_VERSION"));
        assert!(peer.known_command("final_score").unwrap());
        assert!(!peer.known_command("loadsgf").unwrap());
    }

    #[test]
    fn test_setup_commands() {
        let mut peer = loopback();
        peer.boardsize(9).unwrap();
        peer.komi(0.5).unwrap();
        peer.time_settings(0, 5, 1).unwrap();
        peer.clear_board().unwrap();
        assert_eq!(peer.transport().size(), 9);
        assert_eq!(peer.transport().komi(), 0.5);

        let err = peer.boardsize(42).unwrap_err();
        assert!(matches!(err, PeerError::Rejected { ref reason, .. } if reason == "unacceptable size"));
    }

    #[test]
    fn test_time_settings_refusal_is_tolerated() {
        let mut peer = GtpPeer::new("plain", Engine::new());
        peer.time_settings(0, 5, 1).unwrap();
    }

    #[test]
    fn test_genmove_and_play() {
        let mut peer = loopback();
        assert_eq!(peer.genmove(Color::Black).unwrap(), Vertex::point(16, 16));
        peer.play(Color::White, Vertex::point(4, 4)).unwrap();
        peer.play(Color::White, Vertex::Pass).unwrap();
        peer.play(Color::White, Vertex::Resign).unwrap();

        let err = peer.play(Color::Black, Vertex::point(4, 4)).unwrap_err();
        assert!(matches!(err, PeerError::Rejected { .. }));
        assert_eq!(peer.transport().move_history().len(), 3);
    }

    #[test]
    fn test_genmove_pass() {
        let engine = Engine::with_config(EngineConfig::default(), Box::new(PassGenerator));
        let mut peer = GtpPeer::new("passer", engine);
        assert_eq!(peer.genmove(Color::White).unwrap(), Vertex::Pass);
    }

    #[test]
    fn test_final_score() {
        let mut peer = loopback();
        assert_eq!(peer.final_score().unwrap(), Some(Color::White));
        peer.komi(-0.5).unwrap();
        assert_eq!(peer.final_score().unwrap(), Some(Color::Black));
        peer.komi(0.0).unwrap();
        assert_eq!(peer.final_score().unwrap(), None);
    }

    #[test]
    fn test_unsupported_command_is_rejected() {
        let mut peer = GtpPeer::new("plain", Engine::new());
        let err = peer.final_score().unwrap_err();
        assert!(matches!(err, PeerError::Rejected { ref reason, .. } if reason == "unknown command"));
    }

    #[test]
    fn test_showboard() {
        let mut peer = loopback();
        peer.boardsize(7).unwrap();
        let board = peer.showboard().unwrap();
        assert!(board.starts_with("A B C D E F G"));
    }
}
