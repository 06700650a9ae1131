//! UCI command parsing.

use brio_core::{Board, Move, is_legal};

use crate::error::UciError;

/// Parameters of the `go` command. All fields optional; a bare `go`
/// searches without limits.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    /// White's remaining clock in milliseconds.
    pub wtime: Option<u64>,
    /// Black's remaining clock in milliseconds.
    pub btime: Option<u64>,
    /// White's increment per move.
    pub winc: Option<u64>,
    /// Black's increment per move.
    pub binc: Option<u64>,
    /// Moves until the next time control.
    pub movestogo: Option<u32>,
    /// Search exactly this deep.
    pub depth: Option<u8>,
    /// Search at most this many nodes.
    pub nodes: Option<u64>,
    /// Spend exactly this many milliseconds.
    pub movetime: Option<u64>,
    /// Search until `stop`.
    pub infinite: bool,
}

/// A `position` command: the base board plus the moves played from it,
/// already validated in sequence.
#[derive(Debug, Clone)]
pub struct PositionInfo {
    pub base: Board,
    pub moves: Vec<Move>,
}

/// Engine options settable via `setoption`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciOption {
    /// Transposition table size in megabytes.
    Hash(u32),
    /// Play-style personality by name.
    Style(String),
}

/// One parsed line of UCI input.
#[derive(Debug)]
pub enum Command {
    Uci,
    IsReady,
    UciNewGame,
    Position(PositionInfo),
    Go(GoParams),
    SetOption(UciOption),
    Stop,
    Quit,
    /// Unrecognized input, ignored per UCI custom.
    Unknown(String),
}

/// Parse a single input line.
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&head) = tokens.first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match head {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..]),
        "setoption" => parse_setoption(&tokens[1..]),
        other => Ok(Command::Unknown(other.to_string())),
    }
}

/// `position startpos | fen <fen> [moves <uci>...]`
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.is_empty() {
        return Err(UciError::MalformedPosition);
    }

    let (base, rest): (Board, &[&str]) = if tokens[0] == "startpos" {
        (Board::starting_position(), &tokens[1..])
    } else if tokens[0] == "fen" {
        // A FEN is six space-separated fields.
        if tokens.len() < 7 {
            return Err(UciError::InvalidFen {
                fen: tokens[1..].join(" "),
            });
        }
        let fen = tokens[1..7].join(" ");
        let board = fen.parse().map_err(|_| UciError::InvalidFen { fen })?;
        (board, &tokens[7..])
    } else {
        return Err(UciError::MalformedPosition);
    };

    let mut moves = Vec::new();
    if let Some((&"moves", move_tokens)) = rest.split_first() {
        let mut board = base;
        for token in move_tokens {
            let mv = Move::from_uci(token, &board)
                .filter(|mv| is_legal(&board, *mv))
                .ok_or_else(|| UciError::InvalidMove {
                    uci_move: token.to_string(),
                })?;
            board = board.make_move(mv);
            moves.push(mv);
        }
    }

    Ok(Command::Position(PositionInfo { base, moves }))
}

/// `go [wtime n] [btime n] [winc n] [binc n] [movestogo n] [depth n]
/// [nodes n] [movetime n] [infinite]`; unknown tokens are skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut iter = tokens.iter();
    while let Some(&token) = iter.next() {
        match token {
            "wtime" => params.wtime = Some(parse_value(token, iter.next())?),
            "btime" => params.btime = Some(parse_value(token, iter.next())?),
            "winc" => params.winc = Some(parse_value(token, iter.next())?),
            "binc" => params.binc = Some(parse_value(token, iter.next())?),
            "movestogo" => params.movestogo = Some(parse_value(token, iter.next())?),
            "depth" => params.depth = Some(parse_value(token, iter.next())?),
            "nodes" => params.nodes = Some(parse_value(token, iter.next())?),
            "movetime" => params.movetime = Some(parse_value(token, iter.next())?),
            "infinite" => params.infinite = true,
            _ => {}
        }
    }

    Ok(Command::Go(params))
}

/// `setoption name <name> [value <value>]`
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.first() != Some(&"name") {
        return Ok(Command::Unknown("setoption".to_string()));
    }
    let value_at = tokens.iter().position(|&t| t == "value");
    let name = tokens[1..value_at.unwrap_or(tokens.len())]
        .join(" ")
        .to_lowercase();
    let value = value_at.map(|at| tokens[at + 1..].join(" "));

    match (name.as_str(), value) {
        ("hash", Some(value)) => {
            let mb = value.parse().map_err(|_| UciError::InvalidValue {
                token: "Hash".to_string(),
            })?;
            Ok(Command::SetOption(UciOption::Hash(mb)))
        }
        ("style", Some(value)) => Ok(Command::SetOption(UciOption::Style(value))),
        (other, _) => Ok(Command::Unknown(format!("setoption {other}"))),
    }
}

fn parse_value<T: std::str::FromStr>(token: &str, value: Option<&&str>) -> Result<T, UciError> {
    let value = value.ok_or_else(|| UciError::MissingValue {
        token: token.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidValue {
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_commands() {
        assert!(matches!(parse_command("uci").unwrap(), Command::Uci));
        assert!(matches!(parse_command("isready").unwrap(), Command::IsReady));
        assert!(matches!(parse_command("stop").unwrap(), Command::Stop));
        assert!(matches!(parse_command("quit").unwrap(), Command::Quit));
        assert!(matches!(
            parse_command("ucinewgame").unwrap(),
            Command::UciNewGame
        ));
        assert!(matches!(parse_command("").unwrap(), Command::Unknown(_)));
        assert!(matches!(
            parse_command("xyzzy").unwrap(),
            Command::Unknown(_)
        ));
    }

    #[test]
    fn position_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5 g1f3").unwrap();
        let Command::Position(info) = cmd else {
            panic!("expected a position command");
        };
        assert_eq!(info.base.to_fen(), brio_core::STARTING_FEN);
        assert_eq!(info.moves.len(), 3);
        assert_eq!(info.moves[0].to_uci(), "e2e4");
    }

    #[test]
    fn position_fen() {
        let fen = "k7/2K5/1Q6/8/8/8/8/8 b - - 0 1";
        let cmd = parse_command(&format!("position fen {fen}")).unwrap();
        let Command::Position(info) = cmd else {
            panic!("expected a position command");
        };
        assert_eq!(info.base.to_fen(), fen);
        assert!(info.moves.is_empty());
    }

    #[test]
    fn position_rejects_illegal_moves() {
        assert!(matches!(
            parse_command("position startpos moves e2e5"),
            Err(UciError::InvalidMove { .. })
        ));
        assert!(matches!(
            parse_command("position fen garbage"),
            Err(UciError::InvalidFen { .. })
        ));
        assert!(matches!(
            parse_command("position"),
            Err(UciError::MalformedPosition)
        ));
    }

    #[test]
    fn go_with_clock() {
        let cmd = parse_command("go wtime 60000 btime 55000 winc 1000 binc 1000 movestogo 20")
            .unwrap();
        let Command::Go(params) = cmd else {
            panic!("expected go");
        };
        assert_eq!(params.wtime, Some(60_000));
        assert_eq!(params.btime, Some(55_000));
        assert_eq!(params.winc, Some(1_000));
        assert_eq!(params.movestogo, Some(20));
        assert!(!params.infinite);
    }

    #[test]
    fn go_depth_nodes_movetime_infinite() {
        let Command::Go(params) =
            parse_command("go depth 6 nodes 100000 movetime 2500 infinite").unwrap()
        else {
            panic!("expected go");
        };
        assert_eq!(params.depth, Some(6));
        assert_eq!(params.nodes, Some(100_000));
        assert_eq!(params.movetime, Some(2_500));
        assert!(params.infinite);
    }

    #[test]
    fn go_missing_value_is_an_error() {
        assert!(matches!(
            parse_command("go wtime"),
            Err(UciError::MissingValue { .. })
        ));
        assert!(matches!(
            parse_command("go depth five"),
            Err(UciError::InvalidValue { .. })
        ));
    }

    #[test]
    fn setoption_style_and_hash() {
        assert_eq!(
            match parse_command("setoption name Style value Gambiteer").unwrap() {
                Command::SetOption(opt) => opt,
                _ => panic!(),
            },
            UciOption::Style("Gambiteer".to_string())
        );
        assert_eq!(
            match parse_command("setoption name Hash value 64").unwrap() {
                Command::SetOption(opt) => opt,
                _ => panic!(),
            },
            UciOption::Hash(64)
        );
        assert!(matches!(
            parse_command("setoption name Unknown value x").unwrap(),
            Command::Unknown(_)
        ));
    }
}
