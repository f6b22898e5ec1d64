use serde_json::{Value, json};

use odds_terminal::schema::{Column, FIELD_COUNT, RAW_FIELD_COUNT, SchemaError};
use odds_terminal::transform::{RawRecord, transform_collection, transform_row};

fn raw_row(epoch: i64, visible: &str, ft: &str, ht: &str, teams: &str) -> RawRecord {
    let mut row = vec![
        json!("Sat"),
        json!("<b>England. Premier League</b>"),
        json!(format!(
            r#"<span class="ts" style="display:none">{epoch}</span>{visible}"#
        )),
        json!(ft),
        json!(ht),
        json!(teams),
    ];
    for price in [
        "2.00", "3.40", "4.20", "1.45", "2.70", "1.25", "1.50", "1.90", "1.90", "2.30", "1.60",
        "1.75", "2.05",
    ] {
        row.push(json!(price));
    }
    assert_eq!(row.len(), RAW_FIELD_COUNT);
    row
}

#[test]
fn row_gets_derived_fields() {
    let raw = raw_row(1_700_000_000, "14.11.23 22:13", "3-1", "1-0", "Arsenal<br>Chelsea");
    let record = transform_row(&raw).unwrap();

    assert_eq!(record.len(), FIELD_COUNT);
    assert_eq!(record.get(Column::League), "England. Premier League");
    assert_eq!(record.get(Column::Teams), "Arsenal Chelsea");
    assert_eq!(record.get(Column::SecondHalf), "2-1");
    assert_eq!(record.get(Column::Margin1x2), "3.22");
    assert_eq!(record.visible_date(), "14.11.23 22:13");
    assert_eq!(record.epoch(), 1_700_000_000);
}

#[test]
fn marked_up_price_is_cleaned_before_margins() {
    let mut raw = raw_row(1, "1.1.24 10:00", "0-0", "0-0", "A<br>B");
    raw[Column::Home.raw_index().unwrap()] = json!(r#"<span class="up">2.00</span>"#);
    let record = transform_row(&raw).unwrap();
    assert_eq!(record.get(Column::Home), "2.00");
    assert_eq!(record.get(Column::Margin1x2), "3.22");
}

#[test]
fn missing_price_leaves_margin_empty() {
    let mut raw = raw_row(1, "1.1.24 10:00", "0-0", "0-0", "A<br>B");
    raw[Column::Draw.raw_index().unwrap()] = json!("");
    let record = transform_row(&raw).unwrap();
    assert_eq!(record.get(Column::Margin1x2), "");
    assert_ne!(record.get(Column::MarginOu25), "");
}

#[test]
fn unplayed_fixture_keeps_empty_second_half() {
    let raw = raw_row(1, "1.1.24 10:00", "", "", "A<br>B");
    let record = transform_row(&raw).unwrap();
    assert_eq!(record.get(Column::FullTime), "");
    assert_eq!(record.get(Column::SecondHalf), "");
}

#[test]
fn non_string_fields_are_rendered_as_text() {
    let mut raw = raw_row(1, "1.1.24 10:00", "1-0", "0-0", "A<br>B");
    raw[Column::Day.raw_index().unwrap()] = Value::Null;
    raw[Column::Home.raw_index().unwrap()] = json!(1.85);
    let record = transform_row(&raw).unwrap();
    assert_eq!(record.get(Column::Day), "");
    assert_eq!(record.get(Column::Home), "1.85");
}

#[test]
fn collection_is_sorted_newest_first() {
    let raws = vec![
        raw_row(100, "1.1.24 10:00", "1-0", "0-0", "Old<br>Game"),
        raw_row(300, "3.1.24 10:00", "1-0", "0-0", "New<br>Game"),
        raw_row(200, "2.1.24 10:00", "1-0", "0-0", "Mid<br>Game"),
    ];
    let rows = transform_collection(raws).unwrap();
    let epochs: Vec<i64> = rows.iter().map(|r| r.epoch()).collect();
    assert_eq!(epochs, vec![300, 200, 100]);
    assert_eq!(rows[0].get(Column::Teams), "New Game");
}

#[test]
fn short_row_reports_its_position() {
    let mut raws = vec![
        raw_row(1, "1.1.24 10:00", "1-0", "0-0", "A<br>B"),
        raw_row(2, "2.1.24 10:00", "1-0", "0-0", "C<br>D"),
    ];
    raws[1].pop();
    let err = transform_collection(raws).unwrap_err();
    assert_eq!(
        err,
        SchemaError::RowLength {
            row: 1,
            expected: RAW_FIELD_COUNT,
            found: RAW_FIELD_COUNT - 1,
        }
    );
}
