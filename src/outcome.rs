use crate::schema::Column;
use crate::transform::parse_score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Push,
    Loss,
}

impl Outcome {
    pub fn as_i8(self) -> i8 {
        match self {
            Outcome::Win => 1,
            Outcome::Push => 0,
            Outcome::Loss => -1,
        }
    }

    fn from_cmp(win: bool, push: bool) -> Self {
        if push {
            Outcome::Push
        } else if win {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BetType {
    HomeWin,
    Draw,
    AwayWin,
    HomeHandicap0,
    AwayHandicap0,
    HomeToScore,
    AwayToScore,
    Over25,
    Under25,
    Over3,
    Under3,
    BttsYes,
    BttsNo,
}

impl BetType {
    pub const ALL: [BetType; 13] = [
        BetType::HomeWin,
        BetType::Draw,
        BetType::AwayWin,
        BetType::HomeHandicap0,
        BetType::AwayHandicap0,
        BetType::HomeToScore,
        BetType::AwayToScore,
        BetType::Over25,
        BetType::Under25,
        BetType::Over3,
        BetType::Under3,
        BetType::BttsYes,
        BetType::BttsNo,
    ];

    pub fn column(self) -> Column {
        match self {
            BetType::HomeWin => Column::Home,
            BetType::Draw => Column::Draw,
            BetType::AwayWin => Column::Away,
            BetType::HomeHandicap0 => Column::AhHome,
            BetType::AwayHandicap0 => Column::AhAway,
            BetType::HomeToScore => Column::HomeToScore,
            BetType::AwayToScore => Column::AwayToScore,
            BetType::Over25 => Column::Over25,
            BetType::Under25 => Column::Under25,
            BetType::Over3 => Column::Over3,
            BetType::Under3 => Column::Under3,
            BetType::BttsYes => Column::BttsYes,
            BetType::BttsNo => Column::BttsNo,
        }
    }

    pub fn for_column(column: Column) -> Option<Self> {
        BetType::ALL.into_iter().find(|bet| bet.column() == column)
    }

    pub fn label(self) -> &'static str {
        self.column().label()
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let key = raw.trim();
        if let Some(bet) = BetType::ALL
            .into_iter()
            .find(|bet| bet.label().eq_ignore_ascii_case(key) || bet.column().name() == key)
        {
            return Some(bet);
        }
        match key.to_ascii_lowercase().as_str() {
            "home" | "home win" | "p1" => Some(BetType::HomeWin),
            "x" | "draw" => Some(BetType::Draw),
            "away" | "away win" | "p2" => Some(BetType::AwayWin),
            "ah1" | "h1(0)" => Some(BetType::HomeHandicap0),
            "ah2" | "h2(0)" => Some(BetType::AwayHandicap0),
            "over 2.5" | "tb2.5" => Some(BetType::Over25),
            "under 2.5" | "tm2.5" => Some(BetType::Under25),
            "over 3" | "tb3" => Some(BetType::Over3),
            "under 3" | "tm3" => Some(BetType::Under3),
            "btts yes" | "both score" => Some(BetType::BttsYes),
            "btts no" => Some(BetType::BttsNo),
            _ => None,
        }
    }
}

pub fn classify(bet_label: &str, full_time: &str, half_time: &str) -> Outcome {
    match BetType::from_label(bet_label) {
        Some(bet) => classify_bet(bet, full_time, half_time),
        None => Outcome::Loss,
    }
}

pub fn classify_bet(bet: BetType, full_time: &str, half_time: &str) -> Outcome {
    let (Some((home, away)), Some(_half)) = (parse_score(full_time), parse_score(half_time)) else {
        return Outcome::Loss;
    };
    let total = f64::from(home + away);
    let level = home == away;

    match bet {
        BetType::HomeWin => Outcome::from_cmp(home > away, level),
        BetType::Draw => Outcome::from_cmp(level, false),
        BetType::AwayWin => Outcome::from_cmp(away > home, level),
        BetType::HomeHandicap0 => Outcome::from_cmp(home > away, level),
        BetType::AwayHandicap0 => Outcome::from_cmp(away > home, level),
        BetType::HomeToScore => Outcome::from_cmp(home > 0, false),
        BetType::AwayToScore => Outcome::from_cmp(away > 0, false),
        BetType::Under25 => Outcome::from_cmp(total < 2.5, false),
        BetType::Over25 => Outcome::from_cmp(total > 2.5, false),
        BetType::Under3 => Outcome::from_cmp(total < 3.0, false),
        BetType::Over3 => Outcome::from_cmp(total > 3.0, false),
        BetType::BttsYes => Outcome::from_cmp(home > 0 && away > 0, false),
        BetType::BttsNo => Outcome::from_cmp(home == 0 || away == 0, false),
    }
}
