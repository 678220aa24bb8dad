//! Statevector simulator for small quantum error-correcting codes.
//!
//! A [`QecSimulator`] carries one logical qubit through encode, noise, syndrome
//! extraction, correction and decode, recording every gate and measurement so the
//! run can be inspected step by step. [`MonteCarloSampler`] repeats full cycles to
//! estimate logical error rates.

pub mod codes;
mod core;
pub mod sampler;
pub mod simulator;
pub mod snapshot;

pub use crate::codes::{AncillaPool, CodeType, ErrorCorrectingCode, RepetitionCode, ShorCode};
pub use crate::core::{
    BlochVector, Correction, CorrectionDetails, CorrectionOutcome, GateErrorConfig,
    GateErrorDetails, GateErrorScope, GateKind, GateOperation, LogicalState, MAX_QUBITS,
    MeasurementRecord, NoiseConfig, NoiseEvent, NoiseMode, NoiseType, Pauli, QuantumStep,
    QuantumSystem, QubitInfo, QubitRole, StateVector, StepDetails, StepKind, Syndrome,
    apply_gate, apply_noise, errors, repetition_logical_error_rate, shor_logical_error_rate,
    utils,
};
pub use crate::sampler::{MonteCarloConfig, MonteCarloResult, MonteCarloSampler};
pub use crate::simulator::{
    Action, CustomCircuitReport, CustomGate, CycleReport, Phase, QecSimulator, SimulatorConfig,
};
pub use crate::snapshot::{SnapshotPolicy, SnapshotStore};
