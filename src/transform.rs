use std::cmp::Reverse;

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;

use crate::margin::{three_way_margin, two_way_margin};
use crate::markup::{self, normalize_value};
use crate::schema::{Column, ColumnKind, FIELD_COUNT, OddsRecord, RAW_FIELD_COUNT, SchemaError};

static SCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)-(\d+)").expect("valid score regex"));

pub type RawRecord = Vec<Value>;

pub fn parse_score(raw: &str) -> Option<(u32, u32)> {
    let caps = SCORE.captures(raw)?;
    let home = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let away = caps.get(2)?.as_str().parse::<u32>().ok()?;
    Some((home, away))
}

pub fn derive_second_half(full_time: &str, half_time: &str) -> String {
    let (Some((fh, fa)), Some((hh, ha))) = (parse_score(full_time), parse_score(half_time)) else {
        return String::new();
    };
    format!("{}-{}", fh.saturating_sub(hh), fa.saturating_sub(ha))
}

pub fn transform_row(raw: &[Value]) -> Result<OddsRecord, SchemaError> {
    if raw.len() != RAW_FIELD_COUNT {
        return Err(SchemaError::RowLength {
            row: 0,
            expected: RAW_FIELD_COUNT,
            found: raw.len(),
        });
    }

    let mut fields = vec![String::new(); FIELD_COUNT];
    for column in Column::ALL.iter().copied() {
        let Some(raw_idx) = column.raw_index() else {
            continue;
        };
        fields[column.index()] = clean_field(column, &raw[raw_idx]);
    }

    fields[Column::SecondHalf.index()] = derive_second_half(
        &fields[Column::FullTime.index()],
        &fields[Column::HalfTime.index()],
    );

    let at = |c: Column| fields[c.index()].as_str();
    let margins = [
        three_way_margin(at(Column::Home), at(Column::Draw), at(Column::Away)),
        two_way_margin(at(Column::Over25), at(Column::Under25)),
        two_way_margin(at(Column::Over3), at(Column::Under3)),
        two_way_margin(at(Column::BttsYes), at(Column::BttsNo)),
    ];
    for (column, value) in [
        Column::Margin1x2,
        Column::MarginOu25,
        Column::MarginOu3,
        Column::MarginBtts,
    ]
    .into_iter()
    .zip(margins)
    {
        fields[column.index()] = value;
    }

    OddsRecord::from_fields(fields)
}

pub fn transform_collection(mut raws: Vec<RawRecord>) -> Result<Vec<OddsRecord>, SchemaError> {
    if let Some((row, bad)) = raws
        .iter()
        .enumerate()
        .find(|(_, r)| r.len() != RAW_FIELD_COUNT)
    {
        return Err(SchemaError::RowLength {
            row,
            expected: RAW_FIELD_COUNT,
            found: bad.len(),
        });
    }

    raws.sort_by_key(|raw| Reverse(raw_epoch(raw)));

    let rows = raws
        .par_iter()
        .map(|raw| transform_row(raw))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(rows = rows.len(), "transformed scrape rows");
    Ok(rows)
}

fn raw_epoch(raw: &[Value]) -> i64 {
    Column::Date
        .raw_index()
        .and_then(|idx| raw.get(idx))
        .and_then(Value::as_str)
        .map(markup::extract_epoch)
        .unwrap_or(0)
}

fn clean_field(column: Column, value: &Value) -> String {
    match column.kind() {
        // Keeps its markup: the epoch inside is the recency sort key.
        ColumnKind::Date => value_text(value).trim().to_string(),
        ColumnKind::Odds => markup::strip_markup(&value_text(value)),
        _ => value_text(&normalize_value(value)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}
