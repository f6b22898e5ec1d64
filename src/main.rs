use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use odds_terminal::artifact::Artifact;
use odds_terminal::bet_book::BetBook;
use odds_terminal::config::ViewerConfig;
use odds_terminal::export::export_xlsx;
use odds_terminal::fake_rows::generate_raw_rows;
use odds_terminal::http_cache::{HttpCache, app_cache_dir};
use odds_terminal::outcome::Outcome;
use odds_terminal::presets::Preset;
use odds_terminal::schema::{Column, ColumnKind};
use odds_terminal::state::{AppState, Delta, Screen, apply_delta};
use odds_terminal::transform::transform_collection;

struct App {
    state: AppState,
    book: BetBook,
    export_dir: PathBuf,
    strategy_cursor: usize,
    should_quit: bool,
}

impl App {
    fn new(config: &ViewerConfig, book: BetBook) -> Self {
        let mut app = Self {
            state: AppState::new(config.page_size, config.filter_debounce),
            book,
            export_dir: config.export_dir.clone(),
            strategy_cursor: 0,
            should_quit: false,
        };
        app.refresh_bets();
        app
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.editing {
            self.on_edit_key(key);
            return;
        }
        if self.state.screen == Screen::Bets {
            self.on_bets_key(key);
            return;
        }
        let now = Instant::now();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('B') => {
                self.refresh_bets();
                self.state.screen = Screen::Bets;
            }
            _ if self.state.screen != Screen::Table => {}
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('n') | KeyCode::PageDown => self.state.next_page(),
            KeyCode::Char('p') | KeyCode::PageUp => self.state.prev_page(),
            KeyCode::Char('l') | KeyCode::Right => self.state.next_column(),
            KeyCode::Char('h') | KeyCode::Left => self.state.prev_column(),
            KeyCode::Char('/') => self.state.start_edit(),
            KeyCode::Char('r') => self.state.reset_filters(),
            KeyCode::Char('1') => self.state.apply_preset(Preset::Profile1x2, now),
            KeyCode::Char('2') => self.state.apply_preset(Preset::Totals, now),
            KeyCode::Char('3') => self.state.apply_preset(Preset::Full, now),
            KeyCode::Char('b') => self.save_bet(),
            KeyCode::Char('S') => self.save_strategy(),
            KeyCode::Char('L') => self.load_next_strategy(),
            KeyCode::Char('x') => self.export(),
            _ => {}
        }
    }

    fn on_edit_key(&mut self, key: KeyEvent) {
        let now = Instant::now();
        match key.code {
            KeyCode::Enter => self.state.finish_edit(),
            KeyCode::Esc => self.state.cancel_edit(),
            KeyCode::Backspace => self.state.edit_backspace(now),
            KeyCode::Char(ch) => self.state.edit_push(ch, now),
            _ => {}
        }
    }

    fn on_bets_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc | KeyCode::Char('B') => {
                self.state.screen = if self.state.engine.is_some() {
                    Screen::Table
                } else {
                    Screen::Loading
                };
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next_bet(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev_bet(),
            KeyCode::Char('d') => self.delete_bet(),
            KeyCode::Char('u') => self.update_scores(),
            _ => {}
        }
    }

    fn refresh_bets(&mut self) {
        let loaded = self
            .book
            .list_bets()
            .and_then(|bets| Ok((bets, self.book.settle()?)));
        match loaded {
            Ok((bets, settlement)) => self.state.set_bets(bets, settlement),
            Err(err) => self.state.push_log(format!("[WARN] Bet book read failed: {err:#}")),
        }
    }

    fn save_bet(&mut self) {
        let Some(bet) = self.state.focused_bet() else {
            self.state.push_log("[INFO] Focus an odds column to save a bet");
            return;
        };
        let Some(row) = self.state.selected_row().cloned() else {
            self.state.push_log("[INFO] No row selected");
            return;
        };
        match self.book.save_bet(&row, bet) {
            Ok(id) => {
                self.state.push_log(format!(
                    "[INFO] Saved bet #{id}: {} on {}",
                    bet.label(),
                    row.display(Column::Teams)
                ));
                self.refresh_bets();
            }
            Err(err) => self.state.push_log(format!("[WARN] Save bet failed: {err:#}")),
        }
    }

    fn delete_bet(&mut self) {
        let Some(id) = self.state.selected_bet().map(|b| b.id) else {
            return;
        };
        match self.book.delete_bet(id) {
            Ok(_) => {
                self.state.push_log(format!("[INFO] Deleted bet #{id}"));
                self.refresh_bets();
            }
            Err(err) => self.state.push_log(format!("[WARN] Delete bet failed: {err:#}")),
        }
    }

    fn update_scores(&mut self) {
        let Some(engine) = self.state.engine.as_ref() else {
            self.state.push_log("[INFO] No collection loaded");
            return;
        };
        match self.book.update_scores(engine.rows()) {
            Ok(n) => {
                self.state.push_log(format!("[INFO] Updated scores on {n} bets"));
                self.refresh_bets();
            }
            Err(err) => self.state.push_log(format!("[WARN] Score update failed: {err:#}")),
        }
    }

    fn save_strategy(&mut self) {
        let Some(engine) = self.state.engine.as_ref() else {
            return;
        };
        if engine.filters().is_empty() {
            self.state.push_log("[INFO] No active filters to save");
            return;
        }
        let name = Local::now().format("strategy-%Y%m%d-%H%M%S").to_string();
        match self.book.save_strategy(&name, engine.filters()) {
            Ok(()) => self.state.push_log(format!("[INFO] Saved {name}")),
            Err(err) => self.state.push_log(format!("[WARN] Save strategy failed: {err:#}")),
        }
    }

    fn load_next_strategy(&mut self) {
        let strategies = match self.book.list_strategies() {
            Ok(list) => list,
            Err(err) => {
                self.state.push_log(format!("[WARN] Strategy read failed: {err:#}"));
                return;
            }
        };
        if strategies.is_empty() {
            self.state.push_log("[INFO] No saved strategies");
            return;
        }
        let strategy = &strategies[self.strategy_cursor % strategies.len()];
        self.strategy_cursor = self.strategy_cursor.wrapping_add(1);
        self.state
            .apply_strategy(&strategy.name, strategy.filters.clone());
    }

    fn export(&mut self) {
        let rows = self.state.matched_rows();
        if rows.is_empty() {
            self.state.push_log("[INFO] Nothing to export");
            return;
        }
        let path = self
            .export_dir
            .join(Local::now().format("odds-%Y%m%d-%H%M%S.xlsx").to_string());
        let result = fs::create_dir_all(&self.export_dir)
            .with_context(|| format!("create {}", self.export_dir.display()))
            .and_then(|_| export_xlsx(&path, &rows));
        match result {
            Ok(report) => self.state.push_log(format!(
                "[INFO] Exported {} rows to {}",
                report.rows,
                path.display()
            )),
            Err(err) => self.state.push_log(format!("[WARN] Export failed: {err:#}")),
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let config = ViewerConfig::from_env();
    tracing::info!(?config, "starting viewer");
    let book = BetBook::open(&config.bets_db)?;

    let (tx, rx) = mpsc::channel();
    spawn_loader(&config, tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(&config, book);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn init_tracing() {
    let Some(dir) = app_cache_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join("odds_terminal.log")) else {
        return;
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "odds_terminal=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
}

fn spawn_loader(config: &ViewerConfig, tx: mpsc::Sender<Delta>) {
    let source = config.artifact.clone();
    let demo_rows = config.demo_rows;
    thread::spawn(move || {
        let delta = match source {
            Some(source) => {
                let cache = HttpCache::in_app_dir();
                match Artifact::load(&source, cache.as_ref()) {
                    Ok(artifact) => Delta::ArtifactLoaded {
                        source: source.to_string(),
                        rows: artifact.rows,
                    },
                    Err(err) => {
                        tracing::warn!(error = %format!("{err:#}"), "artifact load failed");
                        Delta::ArtifactFailed(format!("{err:#}"))
                    }
                }
            }
            None => {
                let _ = tx.send(Delta::Log(
                    "[INFO] ODDS_ARTIFACT not set, showing synthetic rows".to_string(),
                ));
                match transform_collection(generate_raw_rows(demo_rows, 26)) {
                    Ok(rows) => Delta::ArtifactLoaded {
                        source: "demo".to_string(),
                        rows,
                    },
                    Err(err) => Delta::ArtifactFailed(err.to_string()),
                }
            }
        };
        let _ = tx.send(delta);
    });
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.state.tick(Instant::now());

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(6),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match &app.state.screen {
        Screen::Loading => {
            let loading = Paragraph::new("Loading collection...")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(loading, chunks[1]);
        }
        Screen::Table => render_table(frame, chunks[1], &app.state),
        Screen::Bets => render_bets(frame, chunks[1], &app.state),
        Screen::Error(err) => {
            let error = Paragraph::new(format!("Could not load collection:\n{err}"))
                .style(Style::default().fg(Color::Red));
            frame.render_widget(error, chunks[1]);
        }
    }

    let console = Paragraph::new(console_text(&app.state, chunks[2].height))
        .block(Block::default().title("Console").borders(Borders::TOP))
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let Some(engine) = state.engine.as_ref() else {
        return "ODDS TERMINAL | loading".to_string();
    };
    let filters = if engine.filters().is_empty() {
        "none".to_string()
    } else {
        engine
            .filters()
            .iter()
            .map(|(c, t)| format!("{}={t}", c.label()))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let pending = if engine.is_pending() { " *" } else { "" };
    format!(
        "ODDS TERMINAL | {} | {}/{} rows | page {}/{} | filters: {filters}{pending}",
        state.source,
        state.view.total,
        engine.len(),
        state.view.page.index + 1,
        state.page_count(),
    )
}

fn footer_text(state: &AppState) -> String {
    if state.editing {
        return format!(
            "Filter {}: {}_   Enter apply | Esc cancel",
            state.column.label(),
            state.edit_buffer
        );
    }
    match state.screen {
        Screen::Bets => "j/k Move | d Delete | u Update scores | Esc/B Back | ? Help | q Quit".to_string(),
        _ => "j/k Row | h/l Column | n/p Page | / Filter | 1/2/3 Presets | r Reset | b Bet | B Bets | x Export | ? Help | q Quit".to_string(),
    }
}

fn column_width(column: Column) -> u16 {
    match column.kind() {
        ColumnKind::Text => match column {
            Column::Day => 4,
            Column::League => 18,
            _ => 24,
        },
        ColumnKind::Date => 14,
        ColumnKind::Score => 5,
        ColumnKind::Odds => 7,
        ColumnKind::Derived if column == Column::SecondHalf => 5,
        ColumnKind::Derived => 9,
    }
}

fn visible_columns(focus: Column, width: u16) -> Vec<Column> {
    let mut start = 0usize;
    loop {
        let mut used = 0u16;
        let mut cols = Vec::new();
        for column in Column::ALL.iter().copied().skip(start) {
            let w = column_width(column) + 1;
            if used + w > width && !cols.is_empty() {
                break;
            }
            used += w;
            cols.push(column);
        }
        if cols.contains(&focus) || start >= focus.index() {
            return cols;
        }
        start += 1;
    }
}

fn outcome_style(outcome: Option<Outcome>) -> Style {
    match outcome {
        Some(Outcome::Win) => Style::default().fg(Color::Green),
        Some(Outcome::Push) => Style::default().fg(Color::Yellow),
        Some(Outcome::Loss) => Style::default().fg(Color::Red),
        None => Style::default(),
    }
}

fn render_table(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.view.rows.is_empty() {
        let empty = Paragraph::new("No rows match the active filters")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let columns = visible_columns(state.column, area.width);
    let header_style = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new(columns.iter().map(|&c| {
        let style = if c == state.column {
            header_style.fg(Color::Cyan)
        } else {
            header_style
        };
        Cell::from(c.label()).style(style)
    }));

    let visible = area.height.saturating_sub(1) as usize;
    let (start, end) = visible_range(state.selected, state.view.rows.len(), visible);
    let rows = state.view.rows[start..end].iter().enumerate().map(|(i, row)| {
        let selected = start + i == state.selected;
        let cells = columns.iter().map(|&c| {
            let mut style = outcome_style(AppState::cell_outcome(row, c));
            if selected && c == state.column {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Cell::from(row.display(c)).style(style)
        });
        let row_style = if selected {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(cells).style(row_style)
    });

    let widths: Vec<Constraint> = columns
        .iter()
        .map(|&c| Constraint::Length(column_width(c)))
        .collect();
    let table = Table::new(rows, widths).header(header).column_spacing(1);
    frame.render_widget(table, area);
}

fn render_bets(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let s = &state.settlement;
    let summary = format!(
        "W {} | P {} | L {} | pending {} | profit {:+.2}u",
        s.wins, s.pushes, s.losses, s.pending, s.profit
    );
    frame.render_widget(
        Paragraph::new(summary).style(Style::default().add_modifier(Modifier::BOLD)),
        sections[0],
    );

    if state.bets.is_empty() {
        let empty = Paragraph::new("No saved bets. Press b on an odds cell to save one.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, sections[1]);
        return;
    }

    let header = Row::new(["#", "Date", "Match", "Bet", "Odds", "FT", "HT", "Result"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let visible = sections[1].height.saturating_sub(1) as usize;
    let (start, end) = visible_range(state.bets_selected, state.bets.len(), visible);
    let rows = state.bets[start..end].iter().enumerate().map(|(i, bet)| {
        let outcome = bet.outcome();
        let result = match outcome {
            Some(Outcome::Win) => "won",
            Some(Outcome::Push) => "push",
            Some(Outcome::Loss) => "lost",
            None => "pending",
        };
        let odds = bet.odds.map(|o| format!("{o:.2}")).unwrap_or_else(|| "-".into());
        let row = Row::new(vec![
            Cell::from(bet.id.to_string()),
            Cell::from(bet.date.clone()),
            Cell::from(bet.teams.clone()),
            Cell::from(bet.bet.label()),
            Cell::from(odds),
            Cell::from(bet.full_time.clone()),
            Cell::from(bet.half_time.clone()),
            Cell::from(result).style(outcome_style(outcome)),
        ]);
        if start + i == state.bets_selected {
            row.style(Style::default().bg(Color::DarkGray))
        } else {
            row
        }
    });
    let widths = [
        Constraint::Length(5),
        Constraint::Length(14),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(8),
    ];
    frame.render_widget(Table::new(rows, widths).header(header), sections[1]);
}

fn console_text(state: &AppState, height: u16) -> String {
    let lines = height.saturating_sub(1) as usize;
    let skip = state.logs.len().saturating_sub(lines);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Odds Terminal - Help",
        "",
        "Table:",
        "  j/k or ↑/↓   Move row",
        "  h/l or ←/→   Move column",
        "  n/p          Next/previous page",
        "  /            Filter focused column",
        "  r            Clear filters",
        "  1 / 2 / 3    Preset: 1X2 / totals / full",
        "  b            Save bet on focused odds cell",
        "  S / L        Save / cycle strategies",
        "  x            Export matches to xlsx",
        "",
        "Global:",
        "  B            Saved bets",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
