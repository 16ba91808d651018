//! Stateless UI rendering.

use factor_rush::{GameMode, GameSnapshot, PlayerIdentity, Screen};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

use super::app::{BoardState, BoardView};
use super::input::select_label;

const HOW_TO_PLAY: &str = "\
Rebuild the target number from the primes below before the clock runs out.

Normal mode: pick primes whose product equals the target.
Simple mode: divide the target down to 1; only divisors are accepted.

If the target is itself a large prime, press Space to claim it.

Keys: 1-0 select a prime, q-p undo the prime above, Backspace undoes the
last pick, Esc returns to the menu.

Every solved target scores a point. Undos break ties on the leaderboard.";

/// Renders the game view for the current snapshot.
pub fn draw_game(
    frame: &mut Frame,
    snapshot: &GameSnapshot,
    status: &str,
    player: Option<&PlayerIdentity>,
) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(10),   // Body
            Constraint::Length(3), // Status
        ])
        .split(area);

    let who = player.map_or("guest", |p| p.display_name().as_str());
    let title = Paragraph::new(format!(
        "Factor Rush - {} mode - {}",
        snapshot.game_mode().label(),
        who
    ))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    match snapshot.screen() {
        Screen::Main => draw_main(frame, chunks[1], *snapshot.game_mode()),
        Screen::HowToPlay => draw_text(frame, chunks[1], "How to play", HOW_TO_PLAY),
        Screen::Countdown => draw_countdown(frame, chunks[1], *snapshot.countdown_value()),
        Screen::Playing => draw_playing(frame, chunks[1], snapshot),
        Screen::GameOver => draw_game_over(frame, chunks[1], snapshot),
    }

    let status_text = Paragraph::new(status)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_text, chunks[2]);
}

fn draw_main(frame: &mut Frame, area: Rect, mode: GameMode) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "FACTOR RUSH",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Mode: {} (m to switch)", mode.label())),
        Line::from(""),
        Line::from("s / Enter: Start    h: How to play    l: Leaderboard    q: Quit"),
    ];
    let menu = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Menu"));
    frame.render_widget(menu, area);
}

fn draw_text(frame: &mut Frame, area: Rect, title: &str, body: &str) {
    let text = Paragraph::new(format!("{}\n\nEsc: Back", body))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(text, area);
}

fn draw_countdown(frame: &mut Frame, area: Rect, value: u32) {
    let label = if value == 0 {
        "Go!".to_string()
    } else {
        value.to_string()
    };
    let inner = center_rect(area, 20, 3);
    let countdown = Paragraph::new(label)
        .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(countdown, inner);
}

fn draw_playing(frame: &mut Frame, area: Rect, snapshot: &GameSnapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Clock and score
            Constraint::Length(5), // Target
            Constraint::Length(3), // Selection
            Constraint::Min(3),    // Palette
        ])
        .split(area);

    let time_style = if *snapshot.time_remaining() <= 10 {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(format!("Time: {:>2}s", snapshot.time_remaining()), time_style),
        Span::raw("    "),
        Span::styled(
            format!("Solved: {}", snapshot.scores().correct_factors()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("    "),
        Span::styled(
            format!("Undos: {}", snapshot.scores().undo_count()),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, rows[0]);

    let target_style = if *snapshot.round_resolved() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    };
    let mut target_lines = vec![Line::from(Span::styled(
        snapshot.target_number().to_string(),
        target_style,
    ))];
    if *snapshot.round_mode() == GameMode::Simple {
        target_lines.push(Line::from(format!(
            "remaining: {}",
            snapshot.current_intermediate()
        )));
    }
    if *snapshot.round_resolved() {
        target_lines.push(Line::from(Span::styled(
            "Correct!",
            Style::default().fg(Color::Green),
        )));
    }
    let target = Paragraph::new(target_lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Target"));
    frame.render_widget(target, rows[1]);

    let selection = Paragraph::new(snapshot.equation().unwrap_or_default())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Selection"));
    frame.render_widget(selection, rows[2]);

    let buttons: Vec<Span> = snapshot
        .palette()
        .iter()
        .enumerate()
        .flat_map(|(i, p)| {
            let key = select_label(i).map_or(String::new(), |k| format!("{}:", k));
            [
                Span::styled(key, Style::default().fg(Color::DarkGray)),
                Span::styled(
                    p.to_string(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
            ]
        })
        .collect();
    let palette = Paragraph::new(vec![
        Line::from(buttons),
        Line::from(""),
        Line::from(Span::styled(
            "Space: target is prime    Backspace: undo last    Esc: menu",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Primes"));
    frame.render_widget(palette, rows[3]);
}

fn draw_game_over(frame: &mut Frame, area: Rect, snapshot: &GameSnapshot) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Time's up!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "Numbers factored: {}",
            snapshot.scores().correct_factors()
        )),
        Line::from(format!("Undos: {}", snapshot.scores().undo_count())),
        Line::from(""),
        Line::from("s / Enter: Play again    l: Leaderboard    Esc: Menu"),
    ];
    let summary = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Game over"));
    frame.render_widget(summary, area);
}

/// Renders the leaderboard view.
pub fn draw_leaderboard(frame: &mut Frame, board: &BoardView, player_id: Option<&str>) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);

    let rank = board
        .rank
        .map(|r| format!("  |  Your rank: {}", r))
        .unwrap_or_default();
    let title = Paragraph::new(format!("Leaderboard - {} mode{}", board.mode.label(), rank))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    match &board.state {
        BoardState::Loading => draw_text(frame, chunks[1], "Leaderboard", "Loading..."),
        BoardState::Unavailable(reason) => draw_text(
            frame,
            chunks[1],
            "Leaderboard",
            &format!("Leaderboard unavailable: {}", reason),
        ),
        BoardState::Ready => draw_board_table(frame, chunks[1], board, player_id),
    }

    let help = Paragraph::new("Tab / m: Switch mode | Esc / b: Back | q: Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[2]);
}

fn draw_board_table(frame: &mut Frame, area: Rect, board: &BoardView, player_id: Option<&str>) {
    let header = Row::new(vec![
        Cell::from("#").style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from("Player").style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from("Factored").style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from("Undos").style(Style::default().add_modifier(Modifier::BOLD)),
    ])
    .style(Style::default().fg(Color::Yellow));

    let rows: Vec<Row> = board
        .entries
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let style = if Some(record.user_id().as_str()) == player_id {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(record.display_name().as_str()),
                Cell::from(record.numbers_factored().to_string()),
                Cell::from(record.undos().to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Percentage(50),
        Constraint::Percentage(25),
        Constraint::Percentage(20),
    ];

    let title = if board.entries.is_empty() {
        "No scores yet".to_string()
    } else {
        format!("Top {}", board.entries.len())
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vert[1])[1]
}
