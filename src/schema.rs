use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markup;

/// Bump whenever columns are added, removed or reordered.
pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("artifact schema v{found} does not match expected v{expected}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("artifact columns do not match the compiled schema (first difference at {index})")]
    ColumnMismatch { index: usize },
    #[error("row {row} has {found} fields, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
}

macro_rules! canonical_columns {
    ($( $variant:ident => $accessor:ident, $name:literal, $label:literal, $kind:ident; )+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Column {
            $($variant,)+
        }

        impl Column {
            pub const ALL: &'static [Column] = &[$(Column::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Column::$variant => $name,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $(Column::$variant => $label,)+
                }
            }

            pub fn kind(self) -> ColumnKind {
                match self {
                    $(Column::$variant => ColumnKind::$kind,)+
                }
            }
        }

        impl OddsRecord {
            $(
                pub fn $accessor(&self) -> &str {
                    self.get(Column::$variant)
                }
            )+
        }
    };
}

canonical_columns! {
    Day => day, "day", "Day", Text;
    League => league, "league", "League", Text;
    Date => date, "date", "Date", Date;
    FullTime => full_time, "full_time", "FT", Score;
    HalfTime => half_time, "half_time", "HT", Score;
    SecondHalf => second_half, "second_half", "2H", Derived;
    Teams => teams, "teams", "Match", Text;
    Home => home, "home", "1", Odds;
    Draw => draw, "draw", "X", Odds;
    Away => away, "away", "2", Odds;
    AhHome => ah_home, "ah_home", "AH1(0)", Odds;
    AhAway => ah_away, "ah_away", "AH2(0)", Odds;
    HomeToScore => home_to_score, "home_to_score", "H score", Odds;
    AwayToScore => away_to_score, "away_to_score", "A score", Odds;
    Over25 => over_25, "over_25", "O2.5", Odds;
    Under25 => under_25, "under_25", "U2.5", Odds;
    Over3 => over_3, "over_3", "O3", Odds;
    Under3 => under_3, "under_3", "U3", Odds;
    BttsYes => btts_yes, "btts_yes", "BTTS Y", Odds;
    BttsNo => btts_no, "btts_no", "BTTS N", Odds;
    Margin1x2 => margin_1x2, "margin_1x2", "M 1X2", Derived;
    MarginOu25 => margin_ou25, "margin_ou25", "M O/U2.5", Derived;
    MarginOu3 => margin_ou3, "margin_ou3", "M O/U3", Derived;
    MarginBtts => margin_btts, "margin_btts", "M BTTS", Derived;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Date,
    Score,
    Odds,
    Derived,
}

pub const FIELD_COUNT: usize = Column::ALL.len();
pub const RAW_FIELD_COUNT: usize = FIELD_COUNT - 5;

impl Column {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Column::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Column::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn raw_index(self) -> Option<usize> {
        if self.kind() == ColumnKind::Derived {
            return None;
        }
        if self.index() > Column::SecondHalf.index() {
            Some(self.index() - 1)
        } else {
            Some(self.index())
        }
    }

    pub fn is_odds(self) -> bool {
        self.kind() == ColumnKind::Odds
    }

    pub fn odds_columns() -> impl Iterator<Item = Column> {
        Column::ALL.iter().copied().filter(|c| c.is_odds())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn column_names() -> Vec<String> {
    Column::ALL.iter().map(|c| c.name().to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OddsRecord(Vec<String>);

impl OddsRecord {
    pub fn from_fields(fields: Vec<String>) -> Result<Self, SchemaError> {
        if fields.len() != FIELD_COUNT {
            return Err(SchemaError::RowLength {
                row: 0,
                expected: FIELD_COUNT,
                found: fields.len(),
            });
        }
        Ok(Self(fields))
    }

    pub fn get(&self, column: Column) -> &str {
        self.0.get(column.index()).map(String::as_str).unwrap_or("")
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn epoch(&self) -> i64 {
        markup::extract_epoch(self.date())
    }

    pub fn visible_date(&self) -> String {
        markup::extract_visible_datetime(self.date())
    }

    pub fn key(&self) -> String {
        format!("{}:{}", self.epoch(), markup::strip_markup(self.teams()))
    }

    pub fn display(&self, column: Column) -> String {
        match column.kind() {
            ColumnKind::Date => self.visible_date(),
            _ => markup::strip_markup(self.get(column)),
        }
    }
}

pub fn validate_rows(rows: &[OddsRecord]) -> Result<(), SchemaError> {
    for (row, record) in rows.iter().enumerate() {
        if record.len() != FIELD_COUNT {
            return Err(SchemaError::RowLength {
                row,
                expected: FIELD_COUNT,
                found: record.len(),
            });
        }
    }
    Ok(())
}

pub fn validate_header(version: u32, columns: &[String]) -> Result<(), SchemaError> {
    if version != SCHEMA_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found: version,
        });
    }
    let expected = column_names();
    if columns.len() != expected.len() {
        return Err(SchemaError::ColumnMismatch {
            index: columns.len().min(expected.len()),
        });
    }
    if let Some(index) = columns.iter().zip(&expected).position(|(a, b)| a != b) {
        return Err(SchemaError::ColumnMismatch { index });
    }
    Ok(())
}
