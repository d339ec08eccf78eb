//! End-to-end tests for gtp-rust
//!
//! These tests run the crate's own binary as a GTP engine in a child process
//! and drive it through the controller side of the library.

use std::fs;
use std::process::Command;
use std::time::Duration;

use gtp_rust::arena::{play_game, round_robin, EndReason, MatchSettings, Tally};
use gtp_rust::board::Color;
use gtp_rust::facade::GtpPeer;
use gtp_rust::peer::{EngineSpec, PeerError, ProcessPeer, Transport};
use gtp_rust::vertex::Vertex;

// =============================================================================
// Helper functions
// =============================================================================

const BIN: &str = env!("CARGO_BIN_EXE_gtp-rust");

fn timeout() -> Duration {
    Duration::from_secs(10)
}

/// Launch spec for this crate's engine with extra flags.
fn engine_spec(args: &[&str]) -> EngineSpec {
    let mut all = vec!["engine"];
    all.extend_from_slice(args);
    EngineSpec::new(BIN, &all)
}

fn spawn_engine(label: &str, args: &[&str]) -> GtpPeer {
    GtpPeer::spawn(label, &engine_spec(args), timeout()).expect("engine should start")
}

fn small_board() -> MatchSettings {
    MatchSettings {
        boardsize: 9,
        timeout: timeout(),
        ..MatchSettings::default()
    }
}

// =============================================================================
// Raw protocol over a pipe
// =============================================================================

#[test]
fn test_process_admin_commands() {
    let mut peer = ProcessPeer::spawn("raw", &engine_spec(&[]), timeout()).unwrap();

    assert_eq!(peer.send("1 name\n").unwrap(), "=1 gtp-rust\n");
    assert_eq!(peer.send("protocol_version\n").unwrap(), "= 2\n");
    assert_eq!(peer.send("4 known_command name\n").unwrap(), "=4 true\n");
    assert_eq!(peer.send("5 known_command foo\n").unwrap(), "=5 false\n");
    assert_eq!(peer.send("foo\n").unwrap(), "? unknown command\n");

    let commands = peer.send("6 list_commands\n").unwrap();
    assert!(commands.starts_with("=6 boardsize\n"));
    assert!(commands.contains("\nfinal_score\n"));

    peer.close().unwrap();
}

#[test]
fn test_process_core_play() {
    let mut peer = ProcessPeer::spawn("raw", &engine_spec(&[]), timeout()).unwrap();

    assert_eq!(peer.send("7 boardsize 100\n").unwrap(), "?7 unacceptable size\n");
    assert_eq!(peer.send("8 boardsize 19\n").unwrap(), "=8\n");
    assert_eq!(peer.send("9 clear_board\n").unwrap(), "=9\n");
    assert_eq!(peer.send("10 komi 6.5\n").unwrap(), "=10\n");
    assert_eq!(peer.send("11 komi foo\n").unwrap(), "?11 syntax error\n");
    assert_eq!(peer.send("12 play black D4\n").unwrap(), "=12\n");
    assert_eq!(peer.send("13 genmove white\n").unwrap(), "=13 Q16\n");
    assert_eq!(peer.send("14 play black Z25\n").unwrap(), "?14 illegal move\n");
    assert_eq!(peer.send("15 play white D4\n").unwrap(), "?15 illegal move\n");

    peer.close().unwrap();
}

#[test]
fn test_comments_and_blank_lines_get_no_response() {
    let mut peer = ProcessPeer::spawn("raw", &engine_spec(&[]), timeout()).unwrap();
    // The comment line and the blank line are skipped, so only `name` answers.
    assert_eq!(peer.send("# just a comment\n\n1 name\n").unwrap(), "=1 gtp-rust\n");
    peer.close().unwrap();
}

#[test]
fn test_send_after_quit_reports_termination() {
    let mut peer = ProcessPeer::spawn("raw", &engine_spec(&[]), timeout()).unwrap();
    assert_eq!(peer.send("99 quit\n").unwrap(), "=99\n");

    let err = peer.send("name\n").unwrap_err();
    assert!(
        matches!(err, PeerError::Terminated { .. } | PeerError::Io { .. }),
        "unexpected error: {err}"
    );
    assert!(matches!(peer.send("name\n"), Err(PeerError::Poisoned { .. })));
}

// =============================================================================
// Facade over a process
// =============================================================================

#[test]
fn test_facade_relabels_from_name() {
    let mut peer = spawn_engine("engine0", &["--name", "tester"]);
    assert_eq!(peer.label(), "engine0");
    assert_eq!(peer.name().unwrap(), "tester");
    assert_eq!(peer.label(), "tester");
    assert_eq!(peer.transport().label(), "tester");
    peer.close().unwrap();
}

#[test]
fn test_facade_genmove_variants() {
    let mut fixed = spawn_engine("fixed", &[]);
    assert_eq!(fixed.genmove(Color::Black).unwrap(), Vertex::point(16, 16));

    let mut passer = spawn_engine("passer", &["--generator", "pass"]);
    assert_eq!(passer.genmove(Color::White).unwrap(), Vertex::Pass);

    let mut random = spawn_engine("random", &["--generator", "random", "--seed", "3"]);
    random.boardsize(7).unwrap();
    match random.genmove(Color::Black).unwrap() {
        Vertex::Point { x, y } => assert!((1..=7).contains(&x) && (1..=7).contains(&y)),
        other => panic!("expected a point, got {other:?}"),
    }
}

#[test]
fn test_facade_final_score_and_showboard() {
    let mut peer = spawn_engine("scorer", &["--komi", "-3.5"]);
    assert_eq!(peer.final_score().unwrap(), Some(Color::Black));
    peer.boardsize(7).unwrap();
    peer.play(Color::Black, Vertex::point(1, 1)).unwrap();
    let board = peer.showboard().unwrap();
    assert!(board.contains(" 1 X . . . . . ."), "board was:\n{board}");
}

// =============================================================================
// Games and matches between processes
// =============================================================================

#[test]
fn test_passers_end_on_double_pass_with_one_win() {
    let mut black = spawn_engine("b", &["--generator", "pass", "--name", "alpha"]);
    let mut white = spawn_engine("w", &["--generator", "pass", "--name", "beta"]);

    let game = play_game(&mut black, &mut white, &small_board()).unwrap();
    assert_eq!(game.reason, EndReason::DoublePass);
    assert_eq!(game.moves.len(), 2);

    let tally = Tally::new();
    tally.record(&game);
    let scores = tally.snapshot();
    assert_eq!(scores.values().sum::<u32>(), 1);
    assert_eq!(scores.get("beta"), Some(&1));

    black.close().unwrap();
    white.close().unwrap();
}

#[test]
fn test_random_engines_play_until_move_limit() {
    let mut black = spawn_engine("b", &["--generator", "random", "--seed", "1", "--name", "r1"]);
    let mut white = spawn_engine("w", &["--generator", "random", "--seed", "2", "--name", "r2"]);
    let settings = MatchSettings {
        max_moves: 30,
        ..small_board()
    };

    let game = play_game(&mut black, &mut white, &settings).unwrap();
    assert_eq!(game.reason, EndReason::MoveLimit);
    assert_eq!(game.moves.len(), 30);
    assert_eq!(game.winner_label(), Some("r2"));
}

#[test]
fn test_round_robin_between_processes() {
    let engines = [
        engine_spec(&["--generator", "pass", "--name", "alpha"]),
        engine_spec(&["--generator", "pass", "--name", "beta"]),
        engine_spec(&["--generator", "pass", "--name", "gamma"]),
    ];

    for parallel in [false, true] {
        let report = round_robin(&engines, &small_board(), parallel);
        assert_eq!(report.games.len(), 6);
        assert!(report.abandoned.is_empty());
        // Every game goes to white on komi; each engine plays white twice.
        for name in ["alpha", "beta", "gamma"] {
            assert_eq!(report.scores.get(name), Some(&2), "{name}");
        }
    }
}

#[test]
fn test_round_robin_survives_missing_engine() {
    let engines = [
        engine_spec(&["--generator", "pass", "--name", "alpha"]),
        EngineSpec::new("definitely-not-a-gtp-engine-binary", &[]),
    ];

    let report = round_robin(&engines, &small_board(), false);
    assert!(report.games.is_empty());
    assert_eq!(report.abandoned.len(), 2);
    assert!(matches!(report.abandoned[0].error, PeerError::Spawn { .. }));
}

// =============================================================================
// Command line
// =============================================================================

#[test]
fn test_match_subcommand_prints_tally() {
    let path = std::env::temp_dir().join(format!("gtp-rust-match-{}.toml", std::process::id()));
    let config = format!(
        "boardsize = 9\ntimeout_secs = 10\n\n\
         [[engines]]\ncommand = '{BIN}'\nargs = ['engine', '--generator', 'pass', '--name', 'alpha']\n\n\
         [[engines]]\ncommand = '{BIN}'\nargs = ['engine', '--generator', 'pass', '--name', 'beta']\n"
    );
    fs::write(&path, config).unwrap();

    let output = Command::new(BIN)
        .args(["match", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    let _ = fs::remove_file(&path);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "alpha: 1\nbeta: 1\n");
}

#[test]
fn test_match_subcommand_needs_two_engines() {
    let output = Command::new(BIN)
        .args(["match", "--engine", "gnugo --mode gtp"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("at least two engines"));
}
