use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::margin::parse_odd;
use crate::outcome::{BetType, Outcome, classify_bet};
use crate::schema::{Column, OddsRecord};
use crate::transform::parse_score;

/// Stored in `PRAGMA user_version`; a different value means the tables are rebuilt.
const BOOK_VERSION: i64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SavedBet {
    pub id: i64,
    pub row_key: String,
    pub teams: String,
    pub date: String,
    pub bet: BetType,
    pub odds: Option<f64>,
    pub full_time: String,
    pub half_time: String,
    pub saved_at: String,
}

impl SavedBet {
    pub fn outcome(&self) -> Option<Outcome> {
        parse_score(&self.full_time)?;
        parse_score(&self.half_time)?;
        Some(classify_bet(self.bet, &self.full_time, &self.half_time))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Settlement {
    pub wins: usize,
    pub pushes: usize,
    pub losses: usize,
    pub pending: usize,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub filters: BTreeMap<Column, String>,
    pub saved_at: String,
}

pub struct BetBook {
    conn: Connection,
}

impl BetBook {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open bet book {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory bet book")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn save_bet(&self, row: &OddsRecord, bet: BetType) -> Result<i64> {
        let key = row.key();
        self.conn
            .execute(
                r#"
                INSERT INTO saved_bets
                    (row_key, teams, date, bet_type, odds, full_time, half_time, saved_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(row_key, bet_type) DO UPDATE SET
                    odds = excluded.odds,
                    full_time = excluded.full_time,
                    half_time = excluded.half_time
                "#,
                params![
                    key,
                    row.display(Column::Teams),
                    row.visible_date(),
                    bet.column().name(),
                    parse_odd(row.get(bet.column())),
                    row.full_time(),
                    row.half_time(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("insert saved bet")?;
        let id = self
            .conn
            .query_row(
                "SELECT id FROM saved_bets WHERE row_key = ?1 AND bet_type = ?2",
                params![key, bet.column().name()],
                |r| r.get(0),
            )
            .context("read saved bet id")?;
        Ok(id)
    }

    pub fn list_bets(&self) -> Result<Vec<SavedBet>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, row_key, teams, date, bet_type, odds, full_time, half_time, saved_at
            FROM saved_bets
            ORDER BY id DESC
            "#,
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, Option<f64>>(5)?,
                r.get::<_, String>(6)?,
                r.get::<_, String>(7)?,
                r.get::<_, String>(8)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, row_key, teams, date, bet_type, odds, full_time, half_time, saved_at) = row?;
            let Some(bet) = BetType::from_label(&bet_type) else {
                tracing::warn!(id, bet_type = %bet_type, "skipping saved bet with unknown type");
                continue;
            };
            out.push(SavedBet {
                id,
                row_key,
                teams,
                date,
                bet,
                odds,
                full_time,
                half_time,
                saved_at,
            });
        }
        Ok(out)
    }

    pub fn delete_bet(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM saved_bets WHERE id = ?1", params![id])
            .context("delete saved bet")?;
        Ok(n > 0)
    }

    pub fn update_scores(&mut self, rows: &[OddsRecord]) -> Result<usize> {
        let pending: Vec<SavedBet> = self
            .list_bets()?
            .into_iter()
            .filter(|b| b.outcome().is_none())
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }
        let by_key: HashMap<String, &OddsRecord> = rows.iter().map(|r| (r.key(), r)).collect();

        let tx = self.conn.transaction()?;
        let mut updated = 0usize;
        for bet in pending {
            let Some(row) = by_key.get(&bet.row_key) else {
                continue;
            };
            if parse_score(row.full_time()).is_none() || parse_score(row.half_time()).is_none() {
                continue;
            }
            updated += tx.execute(
                "UPDATE saved_bets SET full_time = ?1, half_time = ?2 WHERE id = ?3",
                params![row.full_time(), row.half_time(), bet.id],
            )?;
        }
        tx.commit()?;
        Ok(updated)
    }

    pub fn settle(&self) -> Result<Settlement> {
        let mut s = Settlement::default();
        for bet in self.list_bets()? {
            match bet.outcome() {
                Some(Outcome::Win) => {
                    s.wins += 1;
                    s.profit += bet.odds.map(|o| o - 1.0).unwrap_or(0.0);
                }
                Some(Outcome::Push) => s.pushes += 1,
                Some(Outcome::Loss) => {
                    s.losses += 1;
                    s.profit -= 1.0;
                }
                None => s.pending += 1,
            }
        }
        Ok(s)
    }

    pub fn save_strategy(&self, name: &str, filters: &BTreeMap<Column, String>) -> Result<()> {
        let by_name: BTreeMap<&str, &str> = filters
            .iter()
            .map(|(c, t)| (c.name(), t.as_str()))
            .collect();
        let json = serde_json::to_string(&by_name).context("serialize strategy filters")?;
        self.conn
            .execute(
                r#"
                INSERT INTO strategies (name, filters_json, saved_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(name) DO UPDATE SET
                    filters_json = excluded.filters_json,
                    saved_at = excluded.saved_at
                "#,
                params![name, json, Utc::now().to_rfc3339()],
            )
            .context("upsert strategy")?;
        Ok(())
    }

    pub fn load_strategy(&self, name: &str) -> Result<Option<Strategy>> {
        let row = self
            .conn
            .query_row(
                "SELECT name, filters_json, saved_at FROM strategies WHERE name = ?1",
                params![name],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?)),
            )
            .optional()?;
        row.map(|(name, json, saved_at)| strategy_from_row(name, &json, saved_at))
            .transpose()
    }

    pub fn list_strategies(&self) -> Result<Vec<Strategy>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, filters_json, saved_at FROM strategies ORDER BY name")?;
        let rows = stmt.query_map([], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (name, json, saved_at) = row?;
            out.push(strategy_from_row(name, &json, saved_at)?);
        }
        Ok(out)
    }

    pub fn delete_strategy(&self, name: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM strategies WHERE name = ?1", params![name])
            .context("delete strategy")?;
        Ok(n > 0)
    }
}

fn strategy_from_row(name: String, json: &str, saved_at: String) -> Result<Strategy> {
    let raw: BTreeMap<String, String> =
        serde_json::from_str(json).with_context(|| format!("parse strategy {name}"))?;
    let mut filters = BTreeMap::new();
    for (column_name, text) in raw {
        match Column::from_name(&column_name) {
            Some(column) => {
                filters.insert(column, text);
            }
            None => tracing::warn!(strategy = %name, column = %column_name, "dropping unknown column"),
        }
    }
    Ok(Strategy {
        name,
        filters,
        saved_at,
    })
}

fn init_schema(conn: &Connection) -> Result<()> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .context("read bet book version")?;
    if version != BOOK_VERSION {
        if version != 0 {
            tracing::info!(found = version, expected = BOOK_VERSION, "rebuilding bet book");
        }
        conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS saved_bets;
            DROP TABLE IF EXISTS strategies;
            "#,
        )?;
    }
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS saved_bets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            row_key TEXT NOT NULL,
            teams TEXT NOT NULL,
            date TEXT NOT NULL,
            bet_type TEXT NOT NULL,
            odds REAL NULL,
            full_time TEXT NOT NULL,
            half_time TEXT NOT NULL,
            saved_at TEXT NOT NULL,
            UNIQUE(row_key, bet_type)
        );
        CREATE TABLE IF NOT EXISTS strategies (
            name TEXT PRIMARY KEY,
            filters_json TEXT NOT NULL,
            saved_at TEXT NOT NULL
        );
        PRAGMA user_version = {BOOK_VERSION};
        "#
    ))
    .context("init bet book schema")?;
    Ok(())
}
