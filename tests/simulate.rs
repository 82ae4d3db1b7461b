use baccarat_advisor::cards::{Shoe, play_coup};
use baccarat_advisor::estimator::EstimatorConfig;
use baccarat_advisor::simulate::{SimulationParams, simulate};
use baccarat_advisor::{Engine, EngineConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;

fn params(rounds: u32, bankroll: u64) -> SimulationParams {
    SimulationParams {
        rounds,
        bankroll,
        ..SimulationParams::default()
    }
}

#[test]
fn same_seed_same_report() {
    let engine = Engine::new(EngineConfig {
        estimator: EstimatorConfig {
            jitter: 0.01,
            trend_weight: 0.01,
            ..EstimatorConfig::default()
        },
        ..EngineConfig::default()
    });

    let first = simulate(&engine, &params(600, 20_000), &mut ChaCha8Rng::seed_from_u64(7))
        .expect("simulation runs");
    let second = simulate(&engine, &params(600, 20_000), &mut ChaCha8Rng::seed_from_u64(7))
        .expect("simulation runs");
    assert_eq!(first, second);
}

#[test]
fn report_counts_add_up() {
    let engine = Engine::default();
    let report = simulate(&engine, &params(1_000, 50_000), &mut ChaCha8Rng::seed_from_u64(11))
        .expect("simulation runs");

    assert_eq!(
        report.banker_wins + report.player_wins + report.ties,
        report.rounds_played
    );
    if report.ruined_at.is_none() {
        assert_eq!(report.rounds_played, 1_000);
    }
    // Round one is a calibration round and ties push.
    assert!(report.suggestions_won + report.suggestions_lost <= report.rounds_played - report.ties);
    assert!(report.low_bankroll <= report.final_bankroll);
    assert!(report.peak_bankroll >= report.final_bankroll);
    // 1000 coups from eight decks need several shoes.
    assert!(report.reshuffles >= 1);
}

#[test]
fn small_bankroll_can_be_ruined() {
    let engine = Engine::default();
    let report = simulate(&engine, &params(100_000, 300), &mut ChaCha8Rng::seed_from_u64(3))
        .expect("simulation runs");

    let ruined_at = report.ruined_at.expect("300 units at 100 a hand runs out");
    assert_eq!(ruined_at, report.rounds_played);
    assert!(report.final_bankroll <= Decimal::ZERO);
}

#[test]
fn shoe_deals_legal_coups() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let mut shoe = Shoe::new(8, &mut rng);
    assert_eq!(shoe.remaining(), 416);

    while shoe.remaining() >= 6 {
        let coup = play_coup(&mut shoe).expect("enough cards for a coup");
        assert!((2..=3).contains(&coup.player.len()));
        assert!((2..=3).contains(&coup.banker.len()));
        assert!(coup.player_total() <= 9 && coup.banker_total() <= 9);
    }
}
