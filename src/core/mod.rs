pub mod errors;
mod gates;
mod noise;
mod state;
mod syndrome;
mod system;
pub mod utils;

pub use gates::{GateKind, GateOperation, Pauli, apply_gate};
pub use noise::{
    GateErrorConfig, GateErrorScope, NoiseConfig, NoiseEvent, NoiseMode, NoiseType, apply_noise,
    repetition_logical_error_rate, shor_logical_error_rate,
};
pub use state::{BlochVector, MAX_QUBITS, StateVector};
pub use syndrome::{Correction, CorrectionDetails, CorrectionOutcome, Syndrome};
pub use system::{
    GateErrorDetails, LogicalState, MeasurementRecord, QuantumStep, QuantumSystem, QubitInfo,
    QubitRole, StepDetails, StepKind,
};
