use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    #[error("Unsupported gate: {0}")]
    UnsupportedGate(String),

    #[error("Gate {gate} expects {expected} target qubit(s), got {got}")]
    InvalidOperandCount {
        gate: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Gate {0} requires an angle parameter")]
    MissingParameter(&'static str),

    #[error("Duplicate qubit index found: {0}")]
    DuplicateQubit(usize),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("Amplitude count {0} is not a power of two")]
    InvalidDimensions(usize),

    #[error("A state needs at least one qubit")]
    ZeroQubits,

    #[error("{requested} qubits exceed the dense limit of {max}")]
    TooManyQubits { requested: usize, max: usize },

    #[error("Vector has zero norm and cannot be normalized")]
    ZeroNorm,

    #[error("Qubit index {index} out of bounds for {num_qubits} qubits")]
    IndexOutOfBounds { index: usize, num_qubits: usize },

    #[error("Gate error: {0}")]
    GateError(#[from] GateError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseError {
    #[error("Invalid probability: {0}. Must be between 0.0 and 1.0")]
    InvalidProbability(f64),

    #[error("Duplicate qubit index found: {0}")]
    DuplicateQubit(usize),

    #[error("State error: {0}")]
    StateError(#[from] StateError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodeError {
    #[error("Ancilla qubit {qubit} was not reset before reuse (P(1) = {probability})")]
    AncillaNotReset { qubit: usize, probability: f64 },

    #[error("No free ancilla for role {0}")]
    AncillaPoolExhausted(String),

    #[error("Qubit {0} is not managed by this ancilla pool")]
    UnknownAncilla(usize),

    #[error("Syndrome has {got} bits, code expects {expected}")]
    InvalidSyndromeLength { expected: usize, got: usize },

    #[error("State error: {0}")]
    StateError(#[from] StateError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulatorError {
    #[error("Cannot {action} during phase {phase}")]
    InvalidTransition {
        phase: &'static str,
        action: &'static str,
    },

    #[error("Custom gate {0} is not supported: only single-qubit gates are accepted")]
    UnsupportedCustomGate(&'static str),

    #[error("Qubit {0} is not a data qubit")]
    NotDataQubit(usize),

    #[error("Snapshot {index} out of range ({len} stored)")]
    SnapshotOutOfRange { index: usize, len: usize },

    #[error("Noise error: {0}")]
    NoiseError(#[from] NoiseError),

    #[error("Code error: {0}")]
    CodeError(#[from] CodeError),

    #[error("State error: {0}")]
    StateError(#[from] StateError),
}

impl From<GateError> for SimulatorError {
    fn from(err: GateError) -> Self {
        SimulatorError::StateError(StateError::GateError(err))
    }
}

impl From<GateError> for CodeError {
    fn from(err: GateError) -> Self {
        CodeError::StateError(StateError::GateError(err))
    }
}
