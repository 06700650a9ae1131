//! The UCI protocol loop: stdin lines in, `info`/`bestmove` lines out.

use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use brio_core::{Color, Move};
use brio_engine::{
    Catalog, Driver, GoLimits, IterationReport, MATE_SCORE, MATE_THRESHOLD, MAX_PLY, OpeningBook,
    Reporter,
};

use crate::command::{Command, GoParams, PositionInfo, UciOption, parse_command};
use crate::error::UciError;

/// Prints driver progress as UCI `info` and `bestmove` lines.
///
/// Runs on the driver's worker thread; stdout is the protocol channel,
/// so nothing else in the engine may print to it.
struct UciReporter;

impl Reporter for UciReporter {
    fn iteration(&self, report: &IterationReport) {
        let elapsed = report.elapsed_ms.max(1);
        let nps = report.nodes.saturating_mul(1000) / elapsed;
        let pv: Vec<String> = report.pv.iter().map(|m| m.to_uci()).collect();
        println!(
            "info depth {} score {} nodes {} nps {} time {} pv {}",
            report.depth,
            format_score(report.score),
            report.nodes,
            nps,
            report.elapsed_ms,
            pv.join(" "),
        );
    }

    fn best_move(&self, mv: Move) {
        println!("bestmove {}", mv.to_uci());
    }

    fn no_move_found(&self) {
        // Never announce a null best move; say why nothing comes.
        println!("info string no move found");
    }
}

/// UCI score field: mate distance in moves when decided, else centipawns.
fn format_score(score: i32) -> String {
    if score > MATE_THRESHOLD {
        let moves_to_mate = (MATE_SCORE - score + 1) / 2;
        format!("mate {moves_to_mate}")
    } else if score < -MATE_THRESHOLD {
        let moves_to_mate = (MATE_SCORE + score + 1) / 2;
        format!("mate -{moves_to_mate}")
    } else {
        format!("cp {score}")
    }
}

/// Translate `go` parameters into driver inputs for the side to move.
fn resolve_go(params: &GoParams, side: Color) -> (GoLimits, u8, u64) {
    let depth = params.depth.unwrap_or(MAX_PLY as u8);
    let nodes = params.nodes.unwrap_or(u64::MAX);

    let limits = if params.infinite {
        GoLimits::Infinite
    } else if let Some(ms) = params.movetime {
        GoLimits::MoveTime(ms)
    } else {
        let (remaining, increment) = match side {
            Color::White => (params.wtime, params.winc),
            Color::Black => (params.btime, params.binc),
        };
        match remaining {
            Some(remaining_ms) => GoLimits::Clock {
                remaining_ms,
                increment_ms: increment.unwrap_or(0),
                moves_to_go: params.movestogo,
            },
            // Depth-only or bare `go`: no clock pressure.
            None => GoLimits::Infinite,
        }
    };

    (limits, depth, nodes)
}

/// The engine frontend: owns the driver and the personality catalog.
pub struct UciEngine {
    driver: Driver,
    catalog: Catalog,
}

impl UciEngine {
    /// Build an engine with styles and book loaded from the working
    /// directory (`styles.json`, `book.json`), when present.
    pub fn new() -> UciEngine {
        let mut driver = Driver::new(Arc::new(UciReporter));
        driver.set_book(OpeningBook::load_or_empty(Path::new("book.json")));
        UciEngine {
            driver,
            catalog: Catalog::load_or_builtin(Path::new("styles.json")),
        }
    }

    /// Read stdin until `quit` or the stream closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.handle(command),
                Err(err) => warn!(error = %err, line, "rejected UCI command"),
            }
        }
        self.driver.stop();
        info!("brio shutting down");
        Ok(())
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Uci => self.identify(),
            Command::IsReady => println!("readyok"),
            Command::UciNewGame => {
                self.driver.set_position(brio_core::Board::starting_position());
                self.driver.clear_tt();
            }
            Command::Position(info) => self.load_position(info),
            Command::Go(params) => {
                let (limits, depth, nodes) = resolve_go(&params, self.driver.board().side_to_move());
                self.driver.go(limits, depth, nodes);
            }
            Command::SetOption(UciOption::Hash(mb)) => self.driver.resize_tt(mb as usize),
            Command::SetOption(UciOption::Style(name)) => {
                self.driver.set_personality(self.catalog.get(&name));
            }
            Command::Stop => self.driver.stop(),
            Command::Quit => unreachable!("quit is handled by the read loop"),
            Command::Unknown(token) => {
                if !token.is_empty() {
                    warn!(token, "ignoring unknown command");
                }
            }
        }
    }

    fn identify(&self) {
        println!("id name brio");
        println!("id author brio developers");
        println!("option name Hash type spin default 16 min 1 max 4096");
        let styles = self.catalog.names();
        let vars: Vec<String> = styles.iter().map(|s| format!("var {s}")).collect();
        println!(
            "option name Style type combo default Normal {}",
            vars.join(" ")
        );
        println!("uciok");
    }

    fn load_position(&mut self, info: PositionInfo) {
        self.driver.set_position(info.base);
        // Replaying through the driver keeps the history seeding and the
        // boredom counter in step with the real game.
        for mv in info.moves {
            self.driver.play(mv);
        }
    }
}

impl Default for UciEngine {
    fn default() -> UciEngine {
        UciEngine::new()
    }
}
