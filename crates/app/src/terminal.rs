//! Text rendering and command parsing for the terminal front-end

use std::fmt::Write as _;

use fourfall_core::{AdversaryLevel, GameState, Mode, Player, Winner, COLS, ROWS};

/// One line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Zero-based column
    Drop(usize),
    Save,
    Quit,
    Help,
}

pub const HELP: &str = "Commands: 1-7 drop a piece, s save, q quit to menu, h help";

/// Parse a line such as `4`, `s` or `quit`
pub fn parse_command(line: &str) -> Result<Command, String> {
    let input = line.trim().to_ascii_lowercase();
    match input.as_str() {
        "s" | "save" => Ok(Command::Save),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        "h" | "help" | "?" => Ok(Command::Help),
        "" => Err("Enter a column 1-7".into()),
        other => match other.parse::<usize>() {
            Ok(n) if (1..=COLS).contains(&n) => Ok(Command::Drop(n - 1)),
            Ok(_) => Err(format!("Column must be between 1 and {}", COLS)),
            Err(_) => Err(format!("Unknown command '{}'", other)),
        },
    }
}

fn symbol(player: Player) -> char {
    match player {
        Player::One => 'X',
        Player::Two => 'O',
    }
}

/// Board as text. The last move is wrapped in `( )`, a winning line in `[ ]`.
pub fn render_board(state: &GameState) -> String {
    let board = state.board();
    let winning = state.winning_line().map(|line| line.cells);
    let last = state.last_move().map(|m| (m.row, m.column));

    let mut out = String::new();
    for col in 1..=COLS {
        let _ = write!(out, " {} ", col);
    }
    out.push('\n');

    for row in 0..ROWS {
        for col in 0..COLS {
            let piece = board.get(row, col).player().map(symbol).unwrap_or('.');
            let in_line = winning.is_some_and(|cells| cells.contains(&(row, col)));
            let (open, close) = if in_line {
                ('[', ']')
            } else if last == Some((row, col)) {
                ('(', ')')
            } else {
                (' ', ' ')
            };
            out.push(open);
            out.push(piece);
            out.push(close);
        }
        out.push('\n');
    }
    out.push_str(&"-".repeat(COLS * 3));
    out.push('\n');
    out
}

fn level_name(level: AdversaryLevel) -> &'static str {
    match level {
        AdversaryLevel::Easy => "easy",
        AdversaryLevel::Medium => "medium",
        AdversaryLevel::Hard => "hard",
    }
}

fn mode_name(state: &GameState) -> String {
    match state.mode() {
        Mode::Local => "Local".into(),
        Mode::VsAdversary => format!("vs computer, {}", level_name(state.adversary_level())),
        Mode::OnlineHost => "Online, hosting".into(),
        Mode::OnlineClient => "Online, joined".into(),
    }
}

/// One-line summary of whose turn it is
pub fn status_line(state: &GameState, thinking: bool) -> String {
    let mode = mode_name(state);

    if state.is_game_over() {
        return match state.winner() {
            Winner::Player(p) if state.mode() != Mode::Local && p == state.local_player() => {
                format!("{} ({}) wins! You win. [{}]", p, symbol(p), mode)
            }
            Winner::Player(p) => format!("{} ({}) wins! [{}]", p, symbol(p), mode),
            _ => format!("Draw! [{}]", mode),
        };
    }
    if !state.first_turn_decided() {
        return format!("Waiting for opponent... [{}]", mode);
    }

    let player = state.current_player();
    let mut line = format!("{}'s turn ({})", player, symbol(player));
    if thinking {
        line.push_str(", thinking...");
    } else if state.mode() != Mode::Local && state.is_local_turn() {
        line.push_str(", your move");
    }
    let _ = write!(line, " [{}]", mode);
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(state: GameState, moves: &[usize]) -> GameState {
        moves.iter().fold(state, |s, &col| {
            let player = s.current_player();
            s.apply_move(col, player).unwrap().0
        })
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("1"), Ok(Command::Drop(0)));
        assert_eq!(parse_command(" 7\n"), Ok(Command::Drop(6)));
        assert_eq!(parse_command("S"), Ok(Command::Save));
        assert_eq!(parse_command("q"), Ok(Command::Quit));
        assert_eq!(parse_command("help"), Ok(Command::Help));
        assert!(parse_command("0").is_err());
        assert!(parse_command("8").is_err());
        assert!(parse_command("").is_err());
        assert!(parse_command("left").is_err());
    }

    #[test]
    fn test_render_empty_board() {
        let text = render_board(&GameState::new(Mode::Local));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), ROWS + 2);
        assert_eq!(lines[0], " 1  2  3  4  5  6  7 ");
        assert!(lines[1..=ROWS].iter().all(|l| *l == " .  .  .  .  .  .  . "));
    }

    #[test]
    fn test_render_marks_last_move() {
        let state = play(GameState::new(Mode::Local), &[3, 3]);
        let text = render_board(&state);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[ROWS], " .  .  .  X  .  .  . ");
        assert_eq!(lines[ROWS - 1], " .  .  . (O) .  .  . ");
    }

    #[test]
    fn test_render_marks_winning_line() {
        let state = play(GameState::new(Mode::Local), &[0, 6, 1, 6, 2, 6, 3]);
        assert!(state.is_game_over());
        let text = render_board(&state);
        let bottom = text.lines().nth(ROWS).unwrap();
        assert_eq!(bottom, "[X][X][X][X] .  .  O ");
    }

    #[test]
    fn test_status_line() {
        let local = GameState::new(Mode::Local);
        assert_eq!(status_line(&local, false), "Player 1's turn (X) [Local]");

        let adversary = play(GameState::vs_adversary(AdversaryLevel::Hard), &[3]);
        assert_eq!(
            status_line(&adversary, true),
            "Player 2's turn (O), thinking... [vs computer, hard]"
        );

        let waiting = GameState::new(Mode::OnlineHost);
        assert!(status_line(&waiting, false).starts_with("Waiting for opponent"));

        let won = play(GameState::new(Mode::Local), &[0, 6, 1, 6, 2, 6, 3]);
        assert_eq!(status_line(&won, false), "Player 1 (X) wins! [Local]");
    }
}
