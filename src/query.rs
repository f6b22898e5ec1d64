use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::time::{Duration, Instant};

use once_cell::unsync::OnceCell;

use crate::debounce::Debounce;
use crate::markup;
use crate::schema::{self, Column, ColumnKind, FIELD_COUNT, OddsRecord, SchemaError};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_QUIET: Duration = Duration::from_millis(300);

type ResultCallback = Box<dyn FnOnce(&QueryResult)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(index: usize, size: usize) -> Self {
        Self {
            index,
            size: size.max(1),
        }
    }

    pub fn window(self, total: usize) -> Range<usize> {
        let start = self.index.saturating_mul(self.size).min(total);
        let end = start.saturating_add(self.size).min(total);
        start..end
    }

    pub fn page_count(self, total: usize) -> usize {
        total.div_ceil(self.size).max(1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    pub rows: Vec<OddsRecord>,
    pub indices: Vec<usize>,
    pub total: usize,
    pub page: PageRequest,
}

pub struct QueryEngine {
    rows: Vec<OddsRecord>,
    cells: Vec<OnceCell<String>>,
    epochs: Vec<OnceCell<i64>>,
    filters: BTreeMap<Column, String>,
    staged: BTreeMap<Column, String>,
    batch_open: bool,
    debounce: Debounce,
    pending: Option<ResultCallback>,
    page: PageRequest,
    matches: Vec<usize>,
    passes: usize,
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("rows", &self.rows.len())
            .field("filters", &self.filters)
            .field("staged", &self.staged)
            .field("pending", &self.pending.is_some())
            .field("page", &self.page)
            .field("matches", &self.matches.len())
            .finish()
    }
}

impl QueryEngine {
    pub fn new(rows: Vec<OddsRecord>, quiet: Duration) -> Result<Self, SchemaError> {
        schema::validate_rows(&rows)?;
        let matches = (0..rows.len()).collect();
        Ok(Self {
            cells: empty_cells(rows.len()),
            epochs: empty_epochs(rows.len()),
            rows,
            filters: BTreeMap::new(),
            staged: BTreeMap::new(),
            batch_open: false,
            debounce: Debounce::new(quiet),
            pending: None,
            page: PageRequest::default(),
            matches,
            passes: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&OddsRecord> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[OddsRecord] {
        &self.rows
    }

    pub fn filters(&self) -> &BTreeMap<Column, String> {
        &self.filters
    }

    pub fn filter_text(&self, column: Column) -> &str {
        self.staged
            .get(&column)
            .or_else(|| self.filters.get(&column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_batch_open(&self) -> bool {
        self.batch_open
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn page_request(&self) -> PageRequest {
        self.page
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    pub fn cell_text(&self, row: usize, column: Column) -> &str {
        let idx = row * FIELD_COUNT + column.index();
        self.cells[idx].get_or_init(|| clean_cell(&self.rows[row], column))
    }

    pub fn epoch(&self, row: usize) -> i64 {
        *self.epochs[row].get_or_init(|| self.rows[row].epoch())
    }

    pub fn begin_batch(&mut self) {
        self.batch_open = true;
    }

    pub fn set_filter(&mut self, column: Column, text: impl Into<String>) {
        self.staged.insert(column, text.into());
    }

    pub fn stage(&mut self, changes: impl IntoIterator<Item = (Column, String)>) {
        for (column, text) in changes {
            self.set_filter(column, text);
        }
    }

    /// Close the batch and schedule one commit after the quiet period.
    ///
    /// A commit already scheduled is pushed back and its callback replaced, so a
    /// burst of batches yields a single pass and a single callback.
    pub fn end_batch(&mut self, now: Instant, on_result: impl FnOnce(&QueryResult) + 'static) {
        self.batch_open = false;
        self.pending = Some(Box::new(on_result));
        self.debounce.schedule(now);
    }

    pub fn poll(&mut self, now: Instant) -> Option<QueryResult> {
        if !self.debounce.fire(now) {
            return None;
        }
        Some(self.commit())
    }

    pub fn commit(&mut self) -> QueryResult {
        self.debounce.cancel();
        self.batch_open = false;
        for (column, text) in std::mem::take(&mut self.staged) {
            if text.trim().is_empty() {
                self.filters.remove(&column);
            } else {
                self.filters.insert(column, text);
            }
        }
        let result = self.recompute(self.page);
        if let Some(on_result) = self.pending.take() {
            on_result(&result);
        }
        result
    }

    pub fn cancel(&mut self) {
        self.debounce.cancel();
        self.pending = None;
        self.staged.clear();
        self.batch_open = false;
    }

    pub fn apply_filters(
        &mut self,
        filters: impl IntoIterator<Item = (Column, String)>,
    ) -> QueryResult {
        self.cancel();
        self.filters = filters
            .into_iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();
        self.recompute(self.page)
    }

    pub fn reset_filters(&mut self) -> QueryResult {
        self.apply_filters(std::iter::empty())
    }

    pub fn recompute(&mut self, page: PageRequest) -> QueryResult {
        let started = Instant::now();
        let active: Vec<(Column, String)> = self
            .filters
            .iter()
            .filter_map(|(column, text)| {
                let needle = text.trim().to_lowercase();
                (!needle.is_empty()).then_some((*column, needle))
            })
            .collect();

        let mut matches: Vec<usize> = (0..self.rows.len())
            .filter(|&row| {
                active
                    .iter()
                    .all(|(column, needle)| self.cell_text(row, *column).contains(needle.as_str()))
            })
            .collect();

        if active.iter().any(|(column, _)| *column == Column::Date) {
            matches.sort_by_key(|&row| Reverse(self.epoch(row)));
        }

        self.matches = matches;
        self.passes += 1;
        tracing::debug!(
            filters = active.len(),
            total = self.matches.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "filter pass"
        );
        self.page(page)
    }

    pub fn page(&mut self, page: PageRequest) -> QueryResult {
        self.page = page;
        let window = page.window(self.matches.len());
        let indices = self.matches[window].to_vec();
        let rows = indices.iter().map(|&i| self.rows[i].clone()).collect();
        QueryResult {
            rows,
            indices,
            total: self.matches.len(),
            page,
        }
    }

    pub fn update_data(&mut self, rows: Vec<OddsRecord>) -> Result<QueryResult, SchemaError> {
        schema::validate_rows(&rows)?;
        self.cells = empty_cells(rows.len());
        self.epochs = empty_epochs(rows.len());
        self.rows = rows;
        let page = PageRequest::new(0, self.page.size);
        Ok(self.recompute(page))
    }
}

fn clean_cell(record: &OddsRecord, column: Column) -> String {
    let text = match column.kind() {
        ColumnKind::Date => markup::extract_visible_datetime(record.get(column)),
        _ => markup::strip_markup(record.get(column)),
    };
    text.to_lowercase()
}

fn empty_cells(rows: usize) -> Vec<OnceCell<String>> {
    std::iter::repeat_with(OnceCell::new)
        .take(rows * FIELD_COUNT)
        .collect()
}

fn empty_epochs(rows: usize) -> Vec<OnceCell<i64>> {
    std::iter::repeat_with(OnceCell::new).take(rows).collect()
}
