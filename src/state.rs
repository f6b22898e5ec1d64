use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::bet_book::{SavedBet, Settlement};
use crate::outcome::{BetType, Outcome, classify_bet};
use crate::presets::{self, Preset};
use crate::query::{PageRequest, QueryEngine, QueryResult};
use crate::schema::{Column, OddsRecord};
use crate::transform::parse_score;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Table,
    Bets,
    Error(String),
}

#[derive(Debug)]
pub enum Delta {
    ArtifactLoaded {
        source: String,
        rows: Vec<OddsRecord>,
    },
    ArtifactFailed(String),
    Log(String),
}

pub struct AppState {
    pub screen: Screen,
    pub source: String,
    pub engine: Option<QueryEngine>,
    pub view: QueryResult,
    pub page_size: usize,
    pub quiet: Duration,
    pub selected: usize,
    pub column: Column,
    pub editing: bool,
    pub edit_buffer: String,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub bets: Vec<SavedBet>,
    pub bets_selected: usize,
    pub settlement: Settlement,
    notices: Rc<RefCell<Vec<String>>>,
}

impl AppState {
    pub fn new(page_size: usize, quiet: Duration) -> Self {
        Self {
            screen: Screen::Loading,
            source: String::new(),
            engine: None,
            view: QueryResult {
                page: PageRequest::new(0, page_size),
                ..QueryResult::default()
            },
            page_size,
            quiet,
            selected: 0,
            column: Column::Teams,
            editing: false,
            edit_buffer: String::new(),
            logs: VecDeque::new(),
            help_overlay: false,
            bets: Vec::new(),
            bets_selected: 0,
            settlement: Settlement::default(),
            notices: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn load_rows(&mut self, source: String, rows: Vec<OddsRecord>) {
        let count = rows.len();
        let loaded = match self.engine.as_mut() {
            Some(engine) => engine.update_data(rows).map(|result| (None, result)),
            None => QueryEngine::new(rows, self.quiet).map(|mut engine| {
                let result = engine.page(PageRequest::new(0, self.page_size));
                (Some(engine), result)
            }),
        };
        match loaded {
            Ok((engine, result)) => {
                if let Some(engine) = engine {
                    self.engine = Some(engine);
                }
                self.set_view(result);
                self.source = source;
                self.screen = Screen::Table;
                self.push_log(format!("[INFO] Loaded {count} rows from {}", self.source));
            }
            Err(err) => {
                self.push_log(format!("[WARN] Rejected collection: {err}"));
                self.screen = Screen::Error(err.to_string());
            }
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(result) = self.engine.as_mut().and_then(|engine| engine.poll(now)) {
            self.set_view(result);
        }
        let notices: Vec<String> = self.notices.borrow_mut().drain(..).collect();
        for line in notices {
            self.push_log(line);
        }
    }

    fn set_view(&mut self, result: QueryResult) {
        let pages = result.page.page_count(result.total);
        if result.rows.is_empty() && result.page.index >= pages {
            // Filters shrank the match set below the current page.
            if let Some(engine) = self.engine.as_mut() {
                self.view = engine.page(PageRequest::new(pages - 1, self.page_size));
                self.clamp_selection();
                return;
            }
        }
        self.view = result;
        self.clamp_selection();
    }

    pub fn selected_row(&self) -> Option<&OddsRecord> {
        self.view.rows.get(self.selected)
    }

    pub fn select_next(&mut self) {
        let total = self.view.rows.len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.view.rows.len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.view.rows.len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn page_count(&self) -> usize {
        self.view.page.page_count(self.view.total)
    }

    pub fn next_page(&mut self) {
        let next = self.view.page.index + 1;
        if next < self.page_count() {
            self.goto_page(next);
        }
    }

    pub fn prev_page(&mut self) {
        if let Some(prev) = self.view.page.index.checked_sub(1) {
            self.goto_page(prev);
        }
    }

    fn goto_page(&mut self, index: usize) {
        if let Some(engine) = self.engine.as_mut() {
            self.view = engine.page(PageRequest::new(index, self.page_size));
            self.selected = 0;
        }
    }

    pub fn next_column(&mut self) {
        let next = (self.column.index() + 1) % Column::ALL.len();
        self.column = Column::ALL[next];
    }

    pub fn prev_column(&mut self) {
        let idx = self.column.index();
        let prev = if idx == 0 { Column::ALL.len() - 1 } else { idx - 1 };
        self.column = Column::ALL[prev];
    }

    pub fn start_edit(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        self.edit_buffer = engine.filter_text(self.column).to_string();
        self.editing = true;
    }

    pub fn edit_push(&mut self, ch: char, now: Instant) {
        self.edit_buffer.push(ch);
        self.stage_edit(now);
    }

    pub fn edit_backspace(&mut self, now: Instant) {
        self.edit_buffer.pop();
        self.stage_edit(now);
    }

    fn stage_edit(&mut self, now: Instant) {
        let on_result = notice(
            Rc::clone(&self.notices),
            format!("Filter {}", self.column.label()),
        );
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        engine.begin_batch();
        engine.set_filter(self.column, self.edit_buffer.clone());
        engine.end_batch(now, on_result);
    }

    pub fn finish_edit(&mut self) {
        self.editing = false;
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if engine.is_pending() {
            let result = engine.commit();
            self.set_view(result);
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = false;
        self.edit_buffer.clear();
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel();
        }
    }

    pub fn reset_filters(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let result = engine.reset_filters();
        self.set_view(result);
        self.push_log("[INFO] Filters cleared");
    }

    pub fn apply_preset(&mut self, preset: Preset, now: Instant) {
        let Some(row) = self.selected_row().cloned() else {
            self.push_log("[INFO] No row selected for preset");
            return;
        };
        let on_result = notice(Rc::clone(&self.notices), preset.label().to_string());
        if let Some(engine) = self.engine.as_mut() {
            presets::apply_preset(engine, preset, &row, now, on_result);
        }
    }

    pub fn apply_strategy(&mut self, name: &str, filters: impl IntoIterator<Item = (Column, String)>) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let result = engine.apply_filters(filters);
        self.set_view(result);
        self.push_log(format!("[INFO] Strategy {name}: {} matches", self.view.total));
    }

    pub fn focused_bet(&self) -> Option<BetType> {
        BetType::for_column(self.column)
    }

    pub fn cell_outcome(row: &OddsRecord, column: Column) -> Option<Outcome> {
        let bet = BetType::for_column(column)?;
        parse_score(row.full_time())?;
        parse_score(row.half_time())?;
        Some(classify_bet(bet, row.full_time(), row.half_time()))
    }

    pub fn set_bets(&mut self, bets: Vec<SavedBet>, settlement: Settlement) {
        self.bets = bets;
        self.settlement = settlement;
        if self.bets_selected >= self.bets.len() {
            self.bets_selected = self.bets.len().saturating_sub(1);
        }
    }

    pub fn selected_bet(&self) -> Option<&SavedBet> {
        self.bets.get(self.bets_selected)
    }

    pub fn select_next_bet(&mut self) {
        if !self.bets.is_empty() {
            self.bets_selected = (self.bets_selected + 1) % self.bets.len();
        }
    }

    pub fn select_prev_bet(&mut self) {
        if self.bets.is_empty() {
            return;
        }
        self.bets_selected = if self.bets_selected == 0 {
            self.bets.len() - 1
        } else {
            self.bets_selected - 1
        };
    }

    pub fn matched_rows(&self) -> Vec<&OddsRecord> {
        let Some(engine) = self.engine.as_ref() else {
            return Vec::new();
        };
        engine
            .matches()
            .iter()
            .filter_map(|&i| engine.row(i))
            .collect()
    }
}

fn notice(
    notices: Rc<RefCell<Vec<String>>>,
    label: String,
) -> impl FnOnce(&QueryResult) + 'static {
    move |result: &QueryResult| {
        notices
            .borrow_mut()
            .push(format!("[INFO] {label}: {} matches", result.total));
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::ArtifactLoaded { source, rows } => state.load_rows(source, rows),
        Delta::ArtifactFailed(err) => {
            state.push_log(format!("[WARN] Artifact load failed: {err}"));
            if state.engine.is_none() {
                state.screen = Screen::Error(err);
            }
        }
        Delta::Log(line) => state.push_log(line),
    }
}
