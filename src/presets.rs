use std::time::Instant;

use crate::margin::truncate;
use crate::query::{QueryEngine, QueryResult};
use crate::schema::{Column, OddsRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Profile1x2,
    Totals,
    Full,
}

const PROFILE_1X2: &[(Column, usize)] = &[(Column::Home, 1), (Column::Draw, 0), (Column::Away, 1)];

const TOTALS: &[(Column, usize)] = &[
    (Column::Over25, 1),
    (Column::Under25, 1),
    (Column::Over3, 0),
    (Column::Under3, 0),
    (Column::BttsYes, 0),
    (Column::BttsNo, 0),
];

const FULL: &[(Column, usize)] = &[
    (Column::Home, 1),
    (Column::Draw, 1),
    (Column::Away, 1),
    (Column::AhHome, 0),
    (Column::AhAway, 0),
    (Column::HomeToScore, 0),
    (Column::AwayToScore, 0),
    (Column::Over25, 1),
    (Column::Under25, 1),
    (Column::Over3, 0),
    (Column::Under3, 0),
    (Column::BttsYes, 0),
    (Column::BttsNo, 0),
];

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Profile1x2, Preset::Totals, Preset::Full];

    pub fn label(self) -> &'static str {
        match self {
            Preset::Profile1x2 => "1X2 profile",
            Preset::Totals => "Totals profile",
            Preset::Full => "Full profile",
        }
    }

    pub fn columns(self) -> &'static [(Column, usize)] {
        match self {
            Preset::Profile1x2 => PROFILE_1X2,
            Preset::Totals => TOTALS,
            Preset::Full => FULL,
        }
    }

    /// Truncated filter text per column. A missing price yields an empty
    /// filter, which clears that column instead of matching nothing.
    pub fn filters(self, row: &OddsRecord) -> Vec<(Column, String)> {
        self.columns()
            .iter()
            .map(|&(column, digits)| (column, truncate(&row.display(column), digits)))
            .collect()
    }
}

pub fn apply_preset(
    engine: &mut QueryEngine,
    preset: Preset,
    row: &OddsRecord,
    now: Instant,
    on_result: impl FnOnce(&QueryResult) + 'static,
) {
    engine.begin_batch();
    for (column, text) in preset.filters(row) {
        engine.set_filter(column, text);
    }
    engine.end_batch(now, on_result);
}
