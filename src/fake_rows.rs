use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::transform::RawRecord;

const LEAGUES: &[&str] = &[
    "England. Premier League",
    "Spain. LaLiga",
    "Germany. Bundesliga",
    "Italy. Serie A",
    "France. Ligue 1",
    "Netherlands. Eredivisie",
];

const TEAMS: &[&str] = &[
    "Arsenal", "Chelsea", "Liverpool", "Everton", "Girona", "Sevilla", "Mainz", "Bochum",
    "Torino", "Lecce", "Lens", "Nantes", "Ajax", "Twente",
];

const DAYS: &[&str] = &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn generate_raw_rows(n: usize, seed: u64) -> Vec<RawRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = DateTime::<Utc>::from_timestamp(1_720_000_000, 0).unwrap_or_default();
    (0..n)
        .map(|i| {
            let kickoff = start - ChronoDuration::hours(i as i64);
            fake_row(&mut rng, kickoff)
        })
        .collect()
}

fn fake_row(rng: &mut StdRng, kickoff: DateTime<Utc>) -> RawRecord {
    let home_team = TEAMS[rng.gen_range(0..TEAMS.len())];
    let mut away_team = TEAMS[rng.gen_range(0..TEAMS.len())];
    if away_team == home_team {
        away_team = TEAMS[(TEAMS.iter().position(|t| *t == home_team).unwrap_or(0) + 1) % TEAMS.len()];
    }

    let half_home = rng.gen_range(0..3u32);
    let half_away = rng.gen_range(0..3u32);
    let full_home = half_home + rng.gen_range(0..3u32);
    let full_away = half_away + rng.gen_range(0..3u32);
    // A few rows are unfinished fixtures with no score yet.
    let played = rng.gen_bool(0.95);

    let date = format!(
        r#"<span class="ts" style="display:none">{}</span>{}"#,
        kickoff.timestamp(),
        kickoff.format("%-d.%-m.%y %H:%M")
    );

    let (home, draw, away) = three_way_prices(rng);
    let (over25, under25) = two_way_prices(rng, 1.45, 2.9);
    let (over3, under3) = two_way_prices(rng, 1.7, 3.4);
    let (btts_yes, btts_no) = two_way_prices(rng, 1.5, 2.6);

    let mut fields = vec![
        text(DAYS[kickoff.format("%u").to_string().parse::<usize>().unwrap_or(1) - 1]),
        text(&format!("<b>{}</b>", LEAGUES[rng.gen_range(0..LEAGUES.len())])),
        text(&date),
        text(&if played { format!("{full_home}-{full_away}") } else { String::new() }),
        text(&if played { format!("{half_home}-{half_away}") } else { String::new() }),
        text(&format!("{home_team}<br>{away_team}")),
    ];
    for price in [
        home,
        draw,
        away,
        home * 0.72,
        away * 0.72,
        1.2 + rng.gen_range(0.0..0.6),
        1.3 + rng.gen_range(0.0..0.9),
        over25,
        under25,
        over3,
        under3,
        btts_yes,
        btts_no,
    ] {
        // Roughly one price in fifty is missing, as on thin markets.
        if rng.gen_bool(0.02) {
            fields.push(text(""));
        } else {
            fields.push(text(&format!("{:.2}", price.max(1.01))));
        }
    }
    fields
}

fn three_way_prices(rng: &mut StdRng) -> (f64, f64, f64) {
    let p_home: f64 = rng.gen_range(0.2..0.65);
    let p_draw: f64 = rng.gen_range(0.18..0.32);
    let p_away = (1.0 - p_home - p_draw).max(0.08);
    let overround = rng.gen_range(1.03..1.08);
    (
        1.0 / (p_home * overround),
        1.0 / (p_draw * overround),
        1.0 / (p_away * overround),
    )
}

fn two_way_prices(rng: &mut StdRng, low: f64, high: f64) -> (f64, f64) {
    let a: f64 = rng.gen_range(low..high);
    let overround = rng.gen_range(1.03..1.08);
    let p_a = 1.0 / a;
    let p_b = (overround - p_a).max(0.05);
    (a, 1.0 / p_b)
}

fn text(s: &str) -> Value {
    Value::String(s.to_string())
}
