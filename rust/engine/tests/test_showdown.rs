use cardroom_engine::cards::{Card, Rank as R, Suit as S};
use cardroom_engine::hand::{compare_hands, evaluate_hand, Category};
use cardroom_engine::seat::{PlayerAction, PlayerId};
use cardroom_engine::table::{Phase, Table, TableConfig};

fn c(s: S, r: R) -> Card {
    Card { suit: s, rank: r }
}

fn human(id: &str) -> PlayerId {
    PlayerId::Human(id.to_string())
}

fn table_with(players: usize, seed: u64) -> Table {
    let config = TableConfig {
        seed: Some(seed),
        ..TableConfig::default()
    };
    let mut table = Table::new(config, human("u0"), "P0");
    for i in 1..players {
        table
            .seat_player(human(&format!("u{i}")), format!("P{i}"), None)
            .unwrap();
    }
    table
}

#[test]
fn compare_hands_is_reflexive() {
    let hands = [
        vec![
            c(S::Spades, R::Ace),
            c(S::Hearts, R::Ace),
            c(S::Diamonds, R::Ace),
            c(S::Spades, R::King),
            c(S::Hearts, R::King),
        ],
        vec![
            c(S::Clubs, R::Two),
            c(S::Clubs, R::Seven),
            c(S::Diamonds, R::Nine),
            c(S::Spades, R::Jack),
            c(S::Hearts, R::Ace),
        ],
    ];
    for cards in &hands {
        let h = evaluate_hand(cards);
        assert!(compare_hands(&h, &h).is_eq());
    }
}

#[test]
fn quads_beat_full_house() {
    let quads = evaluate_hand(&[
        c(S::Spades, R::Nine),
        c(S::Hearts, R::Nine),
        c(S::Diamonds, R::Nine),
        c(S::Clubs, R::Nine),
        c(S::Spades, R::Two),
    ]);
    let full_house = evaluate_hand(&[
        c(S::Spades, R::King),
        c(S::Hearts, R::King),
        c(S::Diamonds, R::King),
        c(S::Spades, R::Queen),
        c(S::Hearts, R::Queen),
    ]);
    assert_eq!(quads.category, Category::FourOfAKind);
    assert_eq!(full_house.category, Category::FullHouse);
    assert!(compare_hands(&quads, &full_house).is_gt());
}

#[test]
fn wheel_beats_trips_and_loses_to_six_high_straight() {
    let wheel = evaluate_hand(&[
        c(S::Spades, R::Ace),
        c(S::Hearts, R::Two),
        c(S::Diamonds, R::Three),
        c(S::Clubs, R::Four),
        c(S::Spades, R::Five),
    ]);
    let trips = evaluate_hand(&[
        c(S::Spades, R::Queen),
        c(S::Hearts, R::Queen),
        c(S::Diamonds, R::Queen),
        c(S::Clubs, R::Four),
        c(S::Spades, R::Nine),
    ]);
    let six_high = evaluate_hand(&[
        c(S::Spades, R::Two),
        c(S::Hearts, R::Three),
        c(S::Diamonds, R::Four),
        c(S::Clubs, R::Five),
        c(S::Spades, R::Six),
    ]);
    assert_eq!(wheel.category, Category::Straight);
    assert!(compare_hands(&wheel, &trips).is_gt());
    assert!(compare_hands(&six_high, &wheel).is_gt());
}

#[test]
fn evaluator_picks_best_five_of_seven() {
    // Pair in hand plus pair on board, but the board also carries a flush.
    let cards = [
        c(S::Hearts, R::Two),
        c(S::Hearts, R::Nine),
        c(S::Hearts, R::Jack),
        c(S::Hearts, R::Queen),
        c(S::Hearts, R::King),
        c(S::Spades, R::King),
        c(S::Diamonds, R::Two),
    ];
    let hs = evaluate_hand(&cards);
    assert_eq!(hs.category, Category::Flush);
    assert_eq!(hs.kickers[0], 13, "king-high flush");
}

#[test]
fn showdown_distributes_the_whole_pot() {
    let mut table = table_with(3, 21);
    table.start_hand().unwrap();
    let total = table.total_chips();

    // Everyone calls pre-flop and checks every street.
    while !table.phase().hand_over() {
        let acting = table.current_seat().unwrap();
        let seat = table.seat(acting).unwrap();
        let action = if seat.current_bet < table.current_bet() {
            PlayerAction::Call
        } else {
            PlayerAction::Check
        };
        table.apply_action(acting, action).unwrap();
    }

    assert_eq!(table.phase(), Phase::Showdown);
    assert_eq!(table.pot(), 0);
    let awarded: u32 = table.winners().iter().map(|w| w.amount).sum();
    assert_eq!(awarded, 3 * 20, "three big blinds were in the middle");
    let stacks: u32 = table.seats().map(|s| s.stack).sum();
    assert_eq!(stacks, total);
    for w in table.winners() {
        assert!(w.description.is_some(), "showdown winners carry a rank");
    }
}

#[test]
fn short_stack_contests_only_the_main_pot() {
    let mut table = table_with(3, 22);
    // Seat 2 is the short stack: it can win at most 3 x 60 chips.
    table.set_stack(0, 500).unwrap();
    table.set_stack(1, 500).unwrap();
    table.set_stack(2, 60).unwrap();
    table.start_hand().unwrap();
    let total = table.total_chips();
    assert_eq!(total, 1_060);

    // Shove every seat; unequal stacks force a side pot.
    while let Some(acting) = table.current_seat() {
        table.apply_action(acting, PlayerAction::AllIn).unwrap();
        if table.phase().hand_over() {
            break;
        }
    }
    assert_eq!(table.phase(), Phase::Showdown);
    assert_eq!(table.pot(), 0);

    let awarded: u32 = table.winners().iter().map(|w| w.amount).sum();
    assert_eq!(awarded, 1_060);
    let stacks: u32 = table.seats().map(|s| s.stack).sum();
    assert_eq!(stacks, total);

    // The short seat's entitlement is capped at the main pot: 60 matched by
    // two larger stacks.
    if let Some(w) = table.winners().iter().find(|w| w.seat_no == 2) {
        assert!(w.amount <= 180, "short stack won {} > main pot", w.amount);
    }
    // The two covering stacks settle the 440-chip side pot among themselves.
    let covered: u32 = table
        .winners()
        .iter()
        .filter(|w| w.seat_no != 2)
        .map(|w| w.amount)
        .sum();
    assert!(covered >= 1_060 - 180);
}

#[test]
fn split_pot_is_shared_with_integer_floor() {
    // Force a guaranteed split: both hole hands play the board. Run many
    // seeds and verify conservation plus even splitting whenever a tie
    // happens naturally.
    for seed in 0..30u64 {
        let mut table = table_with(2, seed);
        table.start_hand().unwrap();
        let total = table.total_chips();
        while !table.phase().hand_over() {
            let acting = table.current_seat().unwrap();
            let seat = table.seat(acting).unwrap();
            let action = if seat.current_bet < table.current_bet() {
                PlayerAction::Call
            } else {
                PlayerAction::Check
            };
            table.apply_action(acting, action).unwrap();
        }
        let stacks: u32 = table.seats().map(|s| s.stack).sum();
        assert_eq!(stacks, total, "seed {seed}");
        if table.winners().len() == 2 {
            let a = table.winners()[0].amount;
            let b = table.winners()[1].amount;
            assert!(a.abs_diff(b) <= 1, "split differs by more than one chip");
        }
    }
}

#[test]
fn next_hand_can_start_after_showdown() {
    let mut table = table_with(2, 23);
    table.start_hand().unwrap();
    while !table.phase().hand_over() {
        let acting = table.current_seat().unwrap();
        let seat = table.seat(acting).unwrap();
        let action = if seat.current_bet < table.current_bet() {
            PlayerAction::Call
        } else {
            PlayerAction::Check
        };
        table.apply_action(acting, action).unwrap();
    }
    table.start_hand().unwrap();
    assert_eq!(table.phase(), Phase::Preflop);
    assert_eq!(table.hand_no(), 2);
    assert!(table.winners().is_empty(), "winners reset for the new hand");
    assert!(table.community().is_empty());
}
