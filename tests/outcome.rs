use odds_terminal::outcome::{BetType, Outcome, classify, classify_bet};

#[test]
fn two_one_with_level_half_time() {
    let (ft, ht) = ("2-1", "1-1");
    assert_eq!(classify("1", ft, ht).as_i8(), 1);
    assert_eq!(classify("X", ft, ht).as_i8(), -1);
    assert_eq!(classify("2", ft, ht).as_i8(), -1);
    assert_eq!(classify("O2.5", ft, ht).as_i8(), 1);
    assert_eq!(classify("U2.5", ft, ht).as_i8(), -1);
    assert_eq!(classify("U3", ft, ht).as_i8(), -1);
    assert_eq!(classify("BTTS Y", ft, ht).as_i8(), 1);
    assert_eq!(classify("BTTS N", ft, ht).as_i8(), -1);
}

#[test]
fn three_goals_settle_both_sides_of_the_three_line_as_losses() {
    assert_eq!(classify_bet(BetType::Over3, "2-1", "0-0"), Outcome::Loss);
    assert_eq!(classify_bet(BetType::Under3, "2-1", "0-0"), Outcome::Loss);
    assert_eq!(classify_bet(BetType::Over3, "3-1", "0-0"), Outcome::Win);
    assert_eq!(classify_bet(BetType::Under3, "1-1", "0-0"), Outcome::Win);
}

#[test]
fn draw_no_bet_lines_push_on_level_scores() {
    assert_eq!(classify_bet(BetType::HomeHandicap0, "1-1", "1-0"), Outcome::Push);
    assert_eq!(classify_bet(BetType::AwayHandicap0, "2-2", "0-1"), Outcome::Push);
    assert_eq!(classify_bet(BetType::HomeHandicap0, "0-1", "0-0"), Outcome::Loss);
    assert_eq!(classify_bet(BetType::AwayHandicap0, "0-1", "0-0"), Outcome::Win);
}

#[test]
fn team_to_score() {
    assert_eq!(classify_bet(BetType::HomeToScore, "0-2", "0-1"), Outcome::Loss);
    assert_eq!(classify_bet(BetType::AwayToScore, "0-2", "0-1"), Outcome::Win);
    assert_eq!(classify_bet(BetType::BttsNo, "0-2", "0-1"), Outcome::Win);
}

#[test]
fn spelled_out_labels_are_accepted() {
    assert_eq!(classify("home win", "2-0", "1-0"), Outcome::Win);
    assert_eq!(classify("Under 2.5", "2-0", "1-0"), Outcome::Win);
    assert_eq!(classify("btts yes", "2-0", "1-0"), Outcome::Loss);
}

#[test]
fn unknown_bet_or_unplayed_fixture_is_a_loss() {
    assert_eq!(classify("corners over 9.5", "2-1", "1-1").as_i8(), -1);
    assert_eq!(classify("1", "", "").as_i8(), -1);
    assert_eq!(classify("1", "postp.", "-").as_i8(), -1);
}
