use std::collections::BTreeMap;

use odds_terminal::bet_book::BetBook;
use odds_terminal::outcome::{BetType, Outcome};
use odds_terminal::schema::{Column, FIELD_COUNT, OddsRecord};

fn fixture(epoch: i64, teams: &str, ft: &str, ht: &str) -> OddsRecord {
    let mut fields = vec![String::new(); FIELD_COUNT];
    fields[Column::Date.index()] =
        format!(r#"<span class="ts" style="display:none">{epoch}</span>1.3.24 20:00"#);
    fields[Column::Teams.index()] = teams.to_string();
    fields[Column::FullTime.index()] = ft.to_string();
    fields[Column::HalfTime.index()] = ht.to_string();
    fields[Column::Home.index()] = "2.50".to_string();
    fields[Column::Draw.index()] = "3.20".to_string();
    fields[Column::Over25.index()] = "1.90".to_string();
    OddsRecord::from_fields(fields).unwrap()
}

#[test]
fn settlement_counts_results_at_unit_stake() {
    let book = BetBook::open_in_memory().unwrap();
    let played = fixture(1, "Arsenal Lens", "2-1", "1-1");
    let unplayed = fixture(2, "Ajax Twente", "", "");

    book.save_bet(&played, BetType::HomeWin).unwrap();
    book.save_bet(&played, BetType::Draw).unwrap();
    book.save_bet(&played, BetType::Over25).unwrap();
    book.save_bet(&unplayed, BetType::HomeWin).unwrap();

    let s = book.settle().unwrap();
    assert_eq!((s.wins, s.pushes, s.losses, s.pending), (2, 0, 1, 1));
    assert!((s.profit - (1.5 + 0.9 - 1.0)).abs() < 1e-9);
}

#[test]
fn saving_twice_keeps_one_bet() {
    let book = BetBook::open_in_memory().unwrap();
    let row = fixture(1, "Arsenal Lens", "", "");
    let first = book.save_bet(&row, BetType::Draw).unwrap();
    let second = book.save_bet(&row, BetType::Draw).unwrap();
    assert_eq!(first, second);

    let bets = book.list_bets().unwrap();
    assert_eq!(bets.len(), 1);
    assert_eq!(bets[0].bet, BetType::Draw);
    assert_eq!(bets[0].odds, Some(3.2));
    assert_eq!(bets[0].date, "1.3.24 20:00");
    assert_eq!(bets[0].outcome(), None);

    assert!(book.delete_bet(first).unwrap());
    assert!(!book.delete_bet(first).unwrap());
    assert!(book.list_bets().unwrap().is_empty());
}

#[test]
fn fresh_scores_settle_pending_bets() {
    let mut book = BetBook::open_in_memory().unwrap();
    let before = fixture(7, "Arsenal Lens", "", "");
    book.save_bet(&before, BetType::HomeWin).unwrap();

    let unrelated = fixture(8, "Ajax Twente", "0-0", "0-0");
    let after = fixture(7, "Arsenal Lens", "1-1", "0-1");
    assert_eq!(book.update_scores(&[unrelated, after]).unwrap(), 1);

    let bets = book.list_bets().unwrap();
    assert_eq!(bets[0].full_time, "1-1");
    assert_eq!(bets[0].outcome(), Some(Outcome::Push));
    assert_eq!(book.settle().unwrap().pushes, 1);
    assert_eq!(book.update_scores(&[]).unwrap(), 0);
}

#[test]
fn strategies_round_trip() {
    let book = BetBook::open_in_memory().unwrap();
    let filters: BTreeMap<Column, String> = [
        (Column::Home, "2.0".to_string()),
        (Column::Teams, "arsenal".to_string()),
    ]
    .into_iter()
    .collect();

    book.save_strategy("home fav", &filters).unwrap();
    let loaded = book.load_strategy("home fav").unwrap().unwrap();
    assert_eq!(loaded.filters, filters);
    assert!(book.load_strategy("nope").unwrap().is_none());

    let mut changed = filters.clone();
    changed.insert(Column::Over25, "1.9".to_string());
    book.save_strategy("home fav", &changed).unwrap();
    book.save_strategy("another", &BTreeMap::new()).unwrap();

    let all = book.list_strategies().unwrap();
    let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["another", "home fav"]);
    assert_eq!(all[1].filters, changed);

    assert!(book.delete_strategy("another").unwrap());
    assert_eq!(book.list_strategies().unwrap().len(), 1);
}

#[test]
fn reopening_a_file_keeps_saved_bets() {
    let dir = std::env::temp_dir().join(format!("odds_terminal_book_{}", std::process::id()));
    let path = dir.join("bets.sqlite");
    let _ = std::fs::remove_file(&path);
    {
        let book = BetBook::open(&path).unwrap();
        book.save_bet(&fixture(1, "A B", "1-0", "0-0"), BetType::HomeWin)
            .unwrap();
    }
    let book = BetBook::open(&path).unwrap();
    assert_eq!(book.list_bets().unwrap().len(), 1);
    let _ = std::fs::remove_dir_all(&dir);
}
