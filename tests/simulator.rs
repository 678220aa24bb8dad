use qecsim::errors::SimulatorError;
use qecsim::{
    CodeType, CustomGate, GateErrorConfig, GateKind, GateOperation, LogicalState, NoiseConfig,
    NoiseType, Pauli, Phase, QecSimulator, SimulatorConfig, SnapshotPolicy, StepKind,
};
use std::f64::consts::PI;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn repetition(seed: u64) -> QecSimulator {
    let config = SimulatorConfig::new(CodeType::Repetition, LogicalState::One).with_seed(seed);
    QecSimulator::new(config).unwrap()
}

fn custom(kind: GateKind, qubit: usize) -> CustomGate {
    CustomGate::new(GateOperation::single(kind, qubit).unwrap())
}

#[test]
fn commands_out_of_order_are_rejected() {
    let mut sim = repetition(0);
    assert!(matches!(
        sim.correct(),
        Err(SimulatorError::InvalidTransition { phase: "init", .. })
    ));
    assert!(sim.inject_error(0, Pauli::X).is_err());

    sim.encode().unwrap();
    assert!(sim.encode().is_err());
    assert!(sim.measure_syndrome().is_err());
    assert_eq!(sim.phase(), Phase::Encode);
}

#[test]
fn reset_is_idempotent() {
    init();
    let mut sim = repetition(3);
    sim.run_full_cycle().unwrap();

    sim.reset().unwrap();
    let state = sim.state().clone();
    let steps = sim.history().len();
    sim.reset().unwrap();

    assert_eq!(sim.state(), &state);
    assert_eq!(sim.history().len(), steps);
    assert_eq!(sim.phase(), Phase::Init);
    assert_eq!(sim.snapshot_count(), 1);
    assert_eq!(sim.actual_error_count(), 0);
}

#[test]
fn seeded_runs_are_reproducible() {
    let config = SimulatorConfig::new(CodeType::Repetition, LogicalState::Plus)
        .with_noise(NoiseConfig::new(NoiseType::Depolarizing, 0.4).unwrap())
        .with_gate_errors(GateErrorConfig::new(NoiseType::BitFlip, 0.05).unwrap())
        .with_seed(1234);
    let mut a = QecSimulator::new(config.clone()).unwrap();
    let mut b = QecSimulator::new(config).unwrap();
    a.run_full_cycle().unwrap();
    b.run_full_cycle().unwrap();

    assert_eq!(a.state(), b.state());
    let describe = |sim: &QecSimulator| -> Vec<String> {
        sim.history().iter().map(|s| s.description.clone()).collect()
    };
    assert_eq!(describe(&a), describe(&b));
}

#[test]
fn gate_errors_keep_state_normalized() {
    init();
    for seed in 0..5 {
        let config = SimulatorConfig::new(CodeType::Repetition, LogicalState::Minus)
            .with_noise(NoiseConfig::new(NoiseType::Depolarizing, 0.2).unwrap())
            .with_gate_errors(GateErrorConfig::new(NoiseType::Depolarizing, 0.1).unwrap())
            .with_seed(seed);
        let mut sim = QecSimulator::new(config).unwrap();
        sim.run_full_cycle().unwrap();

        let gate_errors = sim
            .history()
            .iter()
            .filter(|s| s.kind == StepKind::GateError)
            .count();
        assert!(sim.actual_error_count() >= gate_errors);
        for step in sim.history() {
            assert!(step.state_after.is_normalized(1e-9));
        }
    }
}

#[test]
fn stepping_back_and_forward_replays_snapshots() {
    init();
    let mut sim = repetition(5);
    sim.encode().unwrap();
    sim.inject_error(2, Pauli::X).unwrap();
    sim.apply_noise().unwrap();
    sim.measure_syndrome().unwrap();
    let measured = sim.state().clone();
    assert_eq!(sim.snapshot_count(), 5);

    assert!(sim.step_backward());
    assert_eq!(sim.phase(), Phase::Noise);
    assert!(sim.step_backward());
    assert!(sim.step_backward());
    assert_eq!(sim.phase(), Phase::Encode);

    assert!(sim.step_forward().unwrap());
    assert!(sim.step_forward().unwrap());
    assert!(sim.step_forward().unwrap());
    assert_eq!(sim.phase(), Phase::Syndrome);
    assert_eq!(sim.state(), &measured);
    assert_eq!(sim.snapshot_count(), 5);

    // At the head, stepping forward runs the next phase
    assert!(sim.step_forward().unwrap());
    assert_eq!(sim.phase(), Phase::Correction);
    assert_eq!(sim.snapshot_count(), 6);
}

#[test]
fn new_command_after_stepping_back_discards_future() {
    let mut sim = repetition(6);
    sim.encode().unwrap();
    sim.apply_noise().unwrap();
    sim.measure_syndrome().unwrap();

    sim.go_to_step(1).unwrap();
    assert_eq!(sim.phase(), Phase::Encode);
    sim.inject_error(0, Pauli::X).unwrap();
    assert_eq!(sim.snapshot_count(), 3);
    assert_eq!(sim.snapshot_index(), 2);

    assert_eq!(
        sim.go_to_step(9),
        Err(SimulatorError::SnapshotOutOfRange { index: 9, len: 3 })
    );
}

#[test]
fn step_backward_at_start_is_a_no_op() {
    let mut sim = repetition(7);
    assert!(!sim.step_backward());
    assert_eq!(sim.phase(), Phase::Init);
}

#[test]
fn sparse_policy_still_snapshots_transitions() {
    let config = SimulatorConfig::new(CodeType::Repetition, LogicalState::Zero)
        .with_snapshot_policy(SnapshotPolicy::Every(10))
        .with_seed(8);
    let mut sim = QecSimulator::new(config).unwrap();
    sim.encode().unwrap();
    sim.inject_error(0, Pauli::X).unwrap();
    sim.inject_error(1, Pauli::X).unwrap();
    assert_eq!(sim.snapshot_count(), 2);

    // The unrecorded injections are dropped by stepping back to the encode snapshot
    assert!(sim.step_backward());
    assert_eq!(sim.actual_error_count(), 0);
    assert_eq!(sim.phase(), Phase::Encode);
}

#[test]
fn intended_gates_are_not_corrected() {
    init();
    let mut sim = repetition(9);
    sim.encode().unwrap();
    let report = sim.apply_custom_circuit(&[custom(GateKind::X, 1)]).unwrap();

    assert_eq!(report.correction.measured.bits(), &[1, 1]);
    assert_eq!(report.correction.expected.bits(), &[1, 1]);
    assert!(report.correction.residual.is_trivial());
    assert!(report.correction.corrections.is_empty());
    assert!(approx_eq(sim.fidelity(), 1.0));
    assert_eq!(sim.phase(), Phase::Correction);
}

#[test]
fn residual_error_is_corrected_alongside_intended_gates() {
    init();
    let mut sim = repetition(10);
    sim.encode().unwrap();
    sim.inject_error(0, Pauli::X).unwrap();
    let gates = [custom(GateKind::X, 1), custom(GateKind::Rz(PI / 2.0), 2)];
    let report = sim.apply_custom_circuit(&gates).unwrap();

    assert_eq!(report.correction.residual.bits(), &[1, 0]);
    assert_eq!(report.correction.corrections.len(), 1);
    assert_eq!(report.correction.corrections[0].qubit, 0);
    assert!(approx_eq(sim.fidelity(), 1.0));

    sim.decode().unwrap();
    sim.finish().unwrap();
    assert!(approx_eq(sim.fidelity(), 1.0));
}

#[test]
fn custom_gate_validation() {
    let mut sim = repetition(11);
    sim.encode().unwrap();

    let cnot = CustomGate::new(GateOperation::cnot(0, 1).unwrap());
    assert_eq!(
        sim.apply_custom_circuit(&[cnot]),
        Err(SimulatorError::UnsupportedCustomGate("CNOT"))
    );
    assert_eq!(
        sim.apply_custom_gate(&custom(GateKind::X, 3)),
        Err(SimulatorError::NotDataQubit(3))
    );
    // Nothing was applied by the rejected circuit
    assert_eq!(sim.phase(), Phase::Encode);
    assert!(sim.expected_syndrome().is_trivial());
}

#[test]
fn per_gate_error_override_is_restored() {
    let mut sim = repetition(12);
    sim.encode().unwrap();
    let flip = GateErrorConfig::new(NoiseType::PhaseFlip, 1.0).unwrap();
    let noisy = custom(GateKind::H, 0).with_gate_errors(flip);
    let errors = sim.apply_custom_gate(&noisy).unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error, Pauli::Z);
    assert!(sim.system().gate_error_config().is_none());
    assert_eq!(sim.actual_error_count(), 1);
    assert_eq!(sim.expected_syndrome().bits(), &[1, 0]);
}

#[test]
fn fidelity_against_reference_tracks_injected_error() {
    let mut sim = repetition(13);
    sim.encode().unwrap();
    assert!(approx_eq(sim.fidelity(), 1.0));
    sim.inject_error(1, Pauli::X).unwrap();
    assert!(approx_eq(sim.fidelity(), 0.0));
    assert!(approx_eq(sim.reference_state().probability(0b00111), 1.0));
}

#[test]
fn finish_closes_history_with_decode_marker() {
    let mut sim = repetition(14);
    sim.run_full_cycle().unwrap();

    let last = sim.history().last().unwrap();
    assert_eq!(last.kind, StepKind::Decode);
    assert!(last.description.starts_with("Cycle complete"));
    assert_eq!(sim.phase(), Phase::Complete);
}
