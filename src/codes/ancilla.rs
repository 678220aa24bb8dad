use crate::core::errors::CodeError;
use crate::core::{GateKind, GateOperation, QuantumSystem, StepKind};
use log::trace;

/// Ancillas read as |0> when P(1) stays below this bound.
const RESET_TOLERANCE: f64 = 1e-9;

/// Fixed set of physical ancilla qubits lent out to syndrome-extraction roles.
///
/// A qubit is handed out only if it currently reads |0>, so a role never inherits
/// entanglement left behind by the previous one. Slots are lent round-robin: with
/// more than one physical ancilla, consecutive roles land on different qubits.
#[derive(Clone, Debug)]
pub struct AncillaPool {
    slots: Vec<AncillaSlot>,
    next: usize,
}

#[derive(Clone, Debug)]
struct AncillaSlot {
    qubit: usize,
    role: Option<String>,
}

impl AncillaPool {
    pub fn new(qubits: Vec<usize>) -> Self {
        Self {
            slots: qubits
                .into_iter()
                .map(|qubit| AncillaSlot { qubit, role: None })
                .collect(),
            next: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.role.is_some()).count()
    }

    /// Role currently held by `qubit`, if lent out.
    pub fn role_of(&self, qubit: usize) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.qubit == qubit)
            .and_then(|s| s.role.as_deref())
    }

    /// Lends a free ancilla to `role`.
    ///
    /// # Errors
    ///
    /// - `AncillaNotReset` if the free qubit is not in |0>.
    /// - `AncillaPoolExhausted` if every slot is lent out.
    pub fn allocate(&mut self, system: &QuantumSystem, role: &str) -> Result<usize, CodeError> {
        let n = self.slots.len();
        for offset in 0..n {
            let idx = (self.next + offset) % n;
            if self.slots[idx].role.is_some() {
                continue;
            }

            let qubit = self.slots[idx].qubit;
            let probability = system.state().qubit_probability(qubit)?;
            if probability > RESET_TOLERANCE {
                return Err(CodeError::AncillaNotReset { qubit, probability });
            }

            trace!("ancilla q{qubit} -> {role}");
            self.slots[idx].role = Some(role.to_string());
            self.next = (idx + 1) % n;
            return Ok(qubit);
        }
        Err(CodeError::AncillaPoolExhausted(role.to_string()))
    }

    /// Returns `qubit` to the pool, flipping it back to |0> when it was measured as 1.
    pub fn release(
        &mut self,
        system: &mut QuantumSystem,
        qubit: usize,
        measured: u8,
    ) -> Result<(), CodeError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.qubit == qubit)
            .ok_or(CodeError::UnknownAncilla(qubit))?;

        if measured == 1 {
            let reset = GateOperation::single(GateKind::X, qubit)?;
            system.apply_ideal_gate_as(&reset, StepKind::Gate, format!("Reset ancilla q{qubit}"))?;
        }
        trace!("ancilla q{qubit} released");
        slot.role = None;
        Ok(())
    }
}
