use baccarat_advisor::session::Session;
use baccarat_advisor::staking::{BaseStake, Press, StakeConfig, StakePolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn run_random_walk(policy: &StakePolicy, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut session = Session::new(Some(seed), 20);
    let opening = Decimal::from(rng.gen_range(1_000u32..=30_000));
    policy.open(&mut session, opening).expect("bankroll opens");
    let min = policy.config().min_stake;
    assert!(session.current_stake >= min);

    for _ in 0..400 {
        let won = rng.gen_bool(0.5);
        let stake = session.current_stake;
        if won {
            session.bankroll += stake;
        } else {
            session.bankroll -= stake;
        }
        if session.bankroll <= Decimal::ZERO {
            break;
        }
        let next = policy.next_stake(&mut session, won);
        assert!(next >= min, "stake {next} fell under {min}");
        assert_eq!(next % policy.config().grid, Decimal::ZERO);
        assert!(session.streak.wins() == 0 || session.streak.losses() == 0);
    }
}

#[test]
fn stake_never_drops_below_minimum() {
    let policy = StakePolicy::default();
    for seed in 0..50 {
        run_random_walk(&policy, seed);
    }
}

#[test]
fn tiered_flat_press_never_drops_below_minimum() {
    let policy = StakePolicy::new(StakeConfig {
        base: BaseStake::standard_tiers(),
        press: Press::Add { amount: dec!(50) },
        min_stake: dec!(50),
        reset_after_losses: 4,
        ..StakeConfig::default()
    });
    for seed in 100..150 {
        run_random_walk(&policy, seed);
    }
}

#[test]
fn flat_press_adds_one_grid_step() {
    let policy = StakePolicy::new(StakeConfig {
        press: Press::Add { amount: dec!(50) },
        ..StakeConfig::default()
    });
    let mut session = Session::new(Some(3), 20);
    policy.open(&mut session, dec!(5000)).expect("bankroll opens");
    policy.next_stake(&mut session, true);
    assert_eq!(policy.next_stake(&mut session, true), dec!(200));
    assert_eq!(policy.next_stake(&mut session, true), dec!(250));
}

#[test]
fn tiers_rebase_as_bankroll_moves() {
    let policy = StakePolicy::new(StakeConfig {
        base: BaseStake::standard_tiers(),
        min_stake: dec!(50),
        ..StakeConfig::default()
    });
    let mut session = Session::new(Some(3), 20);
    policy.open(&mut session, dec!(12000)).expect("bankroll opens");
    assert_eq!(session.base_stake, dec!(200));

    session.bankroll = dec!(9000);
    for _ in 0..5 {
        policy.next_stake(&mut session, false);
    }
    assert_eq!(session.base_stake, dec!(150));
    assert_eq!(session.current_stake, dec!(150));
}
