use baccarat_advisor::game::{BetResult, Side, Winner};
use baccarat_advisor::session::{EndReason, Phase};
use baccarat_advisor::{Engine, EngineConfig, Session, TurnEvent};
use rust_decimal_macros::dec;

fn engine() -> Engine {
    Engine::new(EngineConfig {
        seed: Some(2025),
        ..EngineConfig::default()
    })
}

fn opened(engine: &Engine, bankroll: &str) -> Session {
    let mut session = engine.new_session();
    engine.handle(&mut session, "start");
    let reply = engine.handle(&mut session, bankroll);
    assert!(matches!(reply.event, TurnEvent::BankrollSet { .. }));
    session
}

#[test]
fn bankroll_sets_stakes_and_thresholds() {
    let engine = engine();
    let session = opened(&engine, "5000");

    assert_eq!(session.phase, Phase::AwaitingRound);
    assert_eq!(session.initial_bankroll, Some(dec!(5000)));
    assert_eq!(session.base_stake, dec!(150));
    assert_eq!(session.current_stake, dec!(150));
    assert_eq!(session.profit_target, dec!(10000));
    assert_eq!(session.loss_threshold, dec!(3000));
    assert_eq!(session.recovery_threshold, dec!(4000));
}

#[test]
fn calibration_round_records_without_stake() {
    let engine = engine();
    let mut session = opened(&engine, "5000");

    let reply = engine.handle(&mut session, "3 5");
    let TurnEvent::Settled(report) = reply.event else {
        panic!("expected settlement, got {:?}", reply.event);
    };
    assert_eq!(report.round, 1);
    assert_eq!(report.winner, Winner::Banker);
    assert!(report.settlement.is_none());
    assert_eq!(report.bankroll, dec!(5000));
    assert_eq!(session.history.len(), 1);
    assert_eq!(session.history[0].stake, dec!(0));
    assert_eq!(session.last_suggestion, Some(Side::Banker));
}

#[test]
fn correct_banker_call_pays_ninety_five_percent() {
    let engine = engine();
    let mut session = opened(&engine, "5000");
    engine.handle(&mut session, "3 5");
    assert_eq!(session.last_suggestion, Some(Side::Banker));

    let reply = engine.handle(&mut session, "6 8");
    let TurnEvent::Settled(report) = reply.event else {
        panic!("expected settlement");
    };
    let settlement = report.settlement.expect("round two is staked");
    assert_eq!(settlement.result, BetResult::Won);
    assert_eq!(settlement.delta, dec!(142.5));
    assert_eq!(session.bankroll, dec!(5142.5));
    assert_eq!(session.streak.wins(), 1);
    assert!(reply.text.contains("Bankroll: 5142.50"), "{}", reply.text);
}

#[test]
fn wrong_call_loses_full_stake() {
    let engine = engine();
    let mut session = opened(&engine, "5000");
    engine.handle(&mut session, "3 5");
    session.last_suggestion = Some(Side::Player);

    engine.handle(&mut session, "6 8");
    assert_eq!(session.bankroll, dec!(4850));
    assert_eq!(session.streak.losses(), 1);
    assert_eq!(session.tally.suggestions_lost, 1);
}

#[test]
fn correct_player_call_pays_even_money() {
    let engine = engine();
    let mut session = opened(&engine, "5000");
    engine.handle(&mut session, "3 5");
    session.last_suggestion = Some(Side::Player);

    engine.handle(&mut session, "9 2");
    assert_eq!(session.bankroll, dec!(5150));
}

#[test]
fn tie_leaves_bankroll_and_streak_alone() {
    let engine = engine();
    let mut session = opened(&engine, "5000");
    engine.handle(&mut session, "3 5");
    engine.handle(&mut session, "6 8");
    let before = (session.bankroll, session.streak, session.current_stake);

    let reply = engine.handle(&mut session, "4 4");
    let TurnEvent::Settled(report) = reply.event else {
        panic!("expected settlement");
    };
    assert_eq!(report.settlement.map(|s| s.result), Some(BetResult::Push));
    assert_eq!((session.bankroll, session.streak, session.current_stake), before);
    assert_eq!(session.tally.ties, 1);
}

#[test]
fn card_input_feeds_the_shoe() {
    let engine = engine();
    let mut session = opened(&engine, "5000");

    let reply = engine.handle(&mut session, "AJ / K8J");
    let TurnEvent::Settled(report) = reply.event else {
        panic!("expected settlement");
    };
    assert_eq!((report.player_total, report.banker_total), (1, 8));
    assert_eq!(session.composition.total(), 315);
    assert_eq!(session.composition.count(0), 29);
}

#[test]
fn ending_without_rounds_reports_zero_net() {
    let engine = engine();
    let mut session = opened(&engine, "7300");

    let reply = engine.handle(&mut session, "end");
    let TurnEvent::Ended(summary) = reply.event else {
        panic!("expected end summary");
    };
    assert_eq!(summary.rounds, 0);
    assert_eq!(summary.net, dec!(0));
    assert_eq!(summary.final_bankroll, dec!(7300));
    assert_eq!(session.phase, Phase::Ended(EndReason::Closed));
}

#[test]
fn end_preserves_state_for_resume() {
    let engine = engine();
    let mut session = opened(&engine, "5000");
    engine.handle(&mut session, "3 5");
    engine.handle(&mut session, "6 8");
    engine.handle(&mut session, "END");

    let reply = engine.handle(&mut session, "resume");
    assert!(matches!(reply.event, TurnEvent::Resumed));
    assert_eq!(session.phase, Phase::AwaitingRound);
    assert_eq!(session.bankroll, dec!(5142.5));
    assert_eq!(session.round_number, 2);

    engine.handle(&mut session, "2 7");
    assert_eq!(session.round_number, 3);
}

#[test]
fn pause_blocks_rounds_until_resumed() {
    let engine = engine();
    let mut session = opened(&engine, "5000");

    assert!(matches!(engine.handle(&mut session, "pause").event, TurnEvent::Paused));
    let blocked = engine.handle(&mut session, "6 8");
    assert!(blocked.is_rejected());
    assert_eq!(session.round_number, 0);

    engine.handle(&mut session, "resume");
    engine.handle(&mut session, "6 8");
    assert_eq!(session.round_number, 1);
}

#[test]
fn reset_clears_everything() {
    let engine = engine();
    let mut session = opened(&engine, "5000");
    engine.handle(&mut session, "AJ / K8J");
    engine.handle(&mut session, "6 8");

    let reply = engine.handle(&mut session, "reset");
    assert!(matches!(reply.event, TurnEvent::Reset));
    assert_eq!(session.phase, Phase::Idle);
    assert_eq!(session.bankroll, dec!(0));
    assert_eq!(session.initial_bankroll, None);
    assert!(session.history.is_empty());
    assert_eq!(session.composition.total(), 320);
    assert!(engine.handle(&mut session, "resume").is_rejected());
}

#[test]
fn start_restarts_an_active_game() {
    let engine = engine();
    let mut session = opened(&engine, "5000");
    engine.handle(&mut session, "3 5");

    engine.handle(&mut session, "Start");
    assert_eq!(session.phase, Phase::AwaitingBankroll);
    assert_eq!(session.round_number, 0);
    assert!(session.history.is_empty());
}

#[test]
fn no_calibration_stakes_round_one() {
    let engine = Engine::new(EngineConfig {
        calibration_round: false,
        seed: Some(1),
        ..EngineConfig::default()
    });
    let mut session = opened(&engine, "5000");
    assert_eq!(session.last_suggestion, Some(Side::Banker));

    engine.handle(&mut session, "6 8");
    assert_eq!(session.bankroll, dec!(5142.5));
}

#[test]
fn bankroll_reply_lists_plan() {
    let engine = engine();
    let mut session = engine.new_session();
    engine.handle(&mut session, "start");
    let reply = engine.handle(&mut session, "5000");

    insta::assert_snapshot!(reply.text, @r###"
Bankroll set: 5000.00
Base stake: 150.00
Profit target: 10000.00
Drawdown brake at: 3000.00
Round 1 is a calibration round with no stake. Send the result as 6 8 or AJ / K8J.
"###);
}

#[test]
fn settled_reply_shows_next_bet() {
    let engine = engine();
    let mut session = opened(&engine, "5000");
    engine.handle(&mut session, "3 5");
    let reply = engine.handle(&mut session, "6 8");

    assert_eq!(
        reply.text,
        "Round 2: Banker wins (Player 6 - Banker 8)\n\
         Banker 150.00 won +142.50\n\
         Bankroll: 5142.50\n\
         Next: Banker 150.00 (Banker 50.68% / Player 49.32%)"
    );
}
