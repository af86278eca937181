//! Metropolis sweep: invariants, acceptance rule and seeded replay.

use ising2d::{IsingError, Lattice, SweepInfo};
use rand::rngs::mock::StepRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_pcg::Pcg64;

/// Constant stream whose integer draws stay inside the rejection zone of
/// `gen_range(0..4)` (always site (3, 3)) and whose uniform draw is ≈ 0.875.
const HIGH_DRAW: u64 = 0xDFFF_FFFF_FFFF_FFFF;

fn random_lattice(size: usize, t: f64, seed: u64) -> (Lattice, ChaCha20Rng) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut lattice = Lattice::new(size).unwrap();
    lattice.set_temperature(t).unwrap();
    lattice.randomize(0.5, &mut rng).unwrap();
    (lattice, rng)
}

#[test]
fn test_spins_stay_unit_valued() {
    let (mut lattice, mut rng) = random_lattice(12, 2.3, 11);
    for _ in 0..200 {
        lattice.sweep(&mut rng).unwrap();
        assert!(lattice.spins().iter().all(|&s| s == 1 || s == -1));
    }
}

#[test]
fn test_sweep_count_increments_once_per_sweep() {
    let (mut lattice, mut rng) = random_lattice(6, 1.5, 3);
    for k in 1..=25 {
        let info = lattice.sweep(&mut rng).unwrap();
        assert_eq!(info.trials, 36);
        assert!(info.accepted <= info.trials);
        assert_eq!(lattice.sweep_count(), k);
    }
}

#[test]
fn test_sweep_count_increments_with_nothing_accepted() {
    let mut lattice = Lattice::filled(4, 1).unwrap();
    lattice.set_temperature(0.0).unwrap();
    let mut rng = StepRng::new(HIGH_DRAW, 0);

    let info = lattice.sweep(&mut rng).unwrap();
    assert_eq!(info, SweepInfo { trials: 16, accepted: 0 });
    assert_eq!(info.acceptance_ratio(), 0.0);
    assert_eq!(lattice.sweep_count(), 1);
}

#[test]
fn test_uphill_move_rejected_near_zero_temperature() {
    for t in [0.0, 1e-3, 1e-9] {
        let mut lattice = Lattice::filled(4, 1).unwrap();
        lattice.set_temperature(t).unwrap();
        assert_eq!(lattice.delta_energy(2, 1).unwrap(), 8);

        // Maximal uniform draw.
        let mut rng = StepRng::new(u64::MAX, 0);
        assert!(!lattice.attempt_flip(2, 1, &mut rng).unwrap());
        assert_eq!(lattice.spin(2, 1), 1);

        let mut rng = StepRng::new(HIGH_DRAW, 0);
        for _ in 0..10 {
            lattice.sweep(&mut rng).unwrap();
        }
        assert_eq!(lattice.magnetization(), 16.0);
    }
}

#[test]
fn test_downhill_move_always_accepted() {
    // A lone up spin in a sea of down spins: flipping it costs -8.
    let mut lattice = Lattice::filled(4, -1).unwrap();
    lattice.set_spin(1, 1, 1).unwrap();
    lattice.set_temperature(1e-3).unwrap();
    assert_eq!(lattice.delta_energy(1, 1).unwrap(), -8);

    // The acceptance draw is never consulted: the counter does not advance.
    let mut rng = StepRng::new(u64::MAX, 1);
    assert!(lattice.attempt_flip(1, 1, &mut rng).unwrap());
    assert_eq!(lattice.spin(1, 1), -1);
    assert_eq!(rng.next_u64(), u64::MAX);
}

#[test]
fn test_neutral_move_always_accepted() {
    // Two up and two down neighbours: ΔE = 0.
    let mut lattice = Lattice::filled(4, 1).unwrap();
    lattice.set_spin(0, 1, -1).unwrap();
    lattice.set_spin(1, 0, -1).unwrap();
    lattice.set_temperature(0.0).unwrap();
    assert_eq!(lattice.delta_energy(1, 1).unwrap(), 0);

    let mut rng = StepRng::new(u64::MAX, 0);
    assert!(lattice.attempt_flip(1, 1, &mut rng).unwrap());
    assert_eq!(lattice.spin(1, 1), -1);
}

#[test]
fn test_lone_spin_flips_once_per_sweep_at_low_temperature() {
    // HIGH_DRAW always selects (3, 3): the first trial relaxes it, the
    // remaining 15 would raise the energy and are rejected.
    let mut lattice = Lattice::filled(4, -1).unwrap();
    lattice.set_spin(3, 3, 1).unwrap();
    lattice.set_temperature(1e-3).unwrap();

    let mut rng = StepRng::new(HIGH_DRAW, 0);
    let info = lattice.sweep(&mut rng).unwrap();
    assert_eq!(info.accepted, 1);
    assert_eq!(lattice.magnetization(), -16.0);
}

#[test]
fn test_seeded_replay_is_bit_identical() {
    let run = |seed: u64| {
        let (mut lattice, mut rng) = random_lattice(10, 2.27, seed);
        for _ in 0..50 {
            lattice.sweep(&mut rng).unwrap();
        }
        lattice
    };
    assert_eq!(run(0xDEADBEEF), run(0xDEADBEEF));
    assert_ne!(run(0xDEADBEEF).spins(), run(0xBEEF).spins());

    let pcg_run = || {
        let mut rng = Pcg64::seed_from_u64(42);
        let mut lattice = Lattice::new(8).unwrap();
        lattice.set_temperature(1.8).unwrap();
        lattice.randomize(0.5, &mut rng).unwrap();
        for _ in 0..30 {
            lattice.sweep(&mut rng).unwrap();
        }
        lattice.spins().to_vec()
    };
    assert_eq!(pcg_run(), pcg_run());
}

#[test]
fn test_aligned_lattice_stays_put_at_low_temperature() {
    let mut rng = ChaCha20Rng::seed_from_u64(9);
    let mut lattice = Lattice::new(4).unwrap();
    lattice.randomize(1.0, &mut rng).unwrap();
    assert_eq!(lattice.total_energy(), -32.0);
    assert_eq!(lattice.magnetization(), 16.0);

    lattice.set_temperature(0.001).unwrap();
    lattice.sweep(&mut rng).unwrap();
    let m = lattice.magnetization();
    assert!(m.abs() <= 16.0);
    // exp(-8 / 0.001) underflows to zero: nothing can flip.
    assert_eq!(m, 16.0);
}

#[test]
fn test_acceptance_rate_is_plausible_near_criticality() {
    let (mut lattice, mut rng) = random_lattice(16, 2.27, 0xC0FFEE);
    let mut accepted = 0;
    let mut trials = 0;
    for _ in 0..100 {
        let info = lattice.sweep(&mut rng).unwrap();
        accepted += info.accepted;
        trials += info.trials;
    }
    let rate = accepted as f64 / trials as f64;
    assert!((0.01..=0.99).contains(&rate), "acceptance rate {rate:.3}");
}

#[test]
fn test_low_temperature_keeps_order_high_temperature_destroys_it() {
    let mut rng = ChaCha20Rng::seed_from_u64(77);

    let mut cold = Lattice::filled(16, 1).unwrap();
    cold.set_temperature(1.0).unwrap();
    let mut hot = Lattice::filled(16, 1).unwrap();
    hot.set_temperature(10.0).unwrap();

    for _ in 0..100 {
        cold.sweep(&mut rng).unwrap();
        hot.sweep(&mut rng).unwrap();
    }
    let mut cold_m = 0.0;
    let mut hot_m = 0.0;
    for _ in 0..100 {
        cold.sweep(&mut rng).unwrap();
        hot.sweep(&mut rng).unwrap();
        cold_m += cold.magnetization().abs() / 256.0;
        hot_m += hot.magnetization().abs() / 256.0;
    }
    cold_m /= 100.0;
    hot_m /= 100.0;
    assert!(cold_m > 0.9, "cold |m| = {cold_m}");
    assert!(hot_m < 0.3, "hot |m| = {hot_m}");
}

#[test]
fn test_single_site_moves_need_a_populated_lattice() {
    let mut lattice = Lattice::new(3).unwrap();
    let mut rng = StepRng::new(0, 1);

    assert!(matches!(lattice.delta_energy(0, 0), Err(IsingError::InvalidState(_))));
    assert!(matches!(
        lattice.attempt_flip(0, 0, &mut rng),
        Err(IsingError::InvalidState(_))
    ));
    assert!(lattice.spins().iter().all(|&s| s == 0));
    assert_eq!(rng.next_u64(), 0);

    lattice.randomize(1.0, &mut rng).unwrap();
    assert_eq!(lattice.delta_energy(0, 0).unwrap(), 8);
}
