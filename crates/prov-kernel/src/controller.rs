//! # The controller
//!
//! Owns the memory DAG and the critic, tracks the current phase, and turns
//! accepted proofs into receipts. A receipt binds the pinned law hash, the
//! phase it was minted in, the goal, and the proof's final output node; it
//! is stored back into the DAG with that output as its parent, so receipts
//! chain into the same content-addressed structure they attest to.
//!
//! Phase ordering is deliberately not enforced here: `advance_phase` is a
//! plain setter so harnesses can jump phases, and each receipt records the
//! phase it was minted under for after-the-fact auditing.

use serde::{Deserialize, Serialize};

use prov_core::canonical_json;

use crate::critic::{Critic, Verdict, VerdictCode};
use crate::error::KernelError;
use crate::memory::MemoryStore;
use crate::step::{Phase, Proof};

/// A minted attestation: this goal's proof verified under this law, in this
/// phase, ending at this output node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// The law hash the proof was verified under.
    pub law_hash: String,
    /// Wire name of the phase the proof was submitted in.
    pub phase: String,
    /// The goal the proof argued for.
    pub goal_id: String,
    /// Memory hash of the proof's final output node.
    pub output_node: String,
}

/// Phase state, submit pipeline, and receipt minting.
pub struct Controller {
    memory: MemoryStore,
    critic: Critic,
    phase: Phase,
    last_receipt_id: Option<String>,
}

impl Controller {
    /// Controller starting in the INGEST phase.
    pub fn new(memory: MemoryStore, critic: Critic) -> Self {
        Self {
            memory,
            critic,
            phase: Phase::Ingest,
            last_receipt_id: None,
        }
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Jump to a phase. No ordering is enforced.
    pub fn advance_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// The law hash this controller mints receipts under.
    pub fn law_hash(&self) -> &str {
        self.critic.law_hash()
    }

    /// Memory hash of the most recently minted receipt.
    pub fn last_receipt_id(&self) -> Option<&str> {
        self.last_receipt_id.as_deref()
    }

    /// Read access to the memory DAG.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Write access to the memory DAG, for seeding inputs.
    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    /// Verify a proof under the current phase and, on acceptance, mint and
    /// chain a receipt.
    pub fn submit(&mut self, proof: &Proof) -> Result<Verdict, KernelError> {
        let verdict = self
            .critic
            .replay_and_verify(&mut self.memory, proof, self.phase)?;
        if !verdict.ok {
            return Ok(verdict);
        }

        // The critic rejects empty proofs, so a final step exists.
        let Some(final_step) = proof.steps.last() else {
            return Ok(Verdict::reject(VerdictCode::EmptyProof));
        };

        let receipt = Receipt {
            law_hash: self.critic.law_hash().to_string(),
            phase: self.phase.name().to_string(),
            goal_id: proof.goal_id.clone(),
            output_node: final_step.output_node.clone(),
        };
        let bytes = canonical_json(&receipt)?.into_vec();
        let receipt_id = self
            .memory
            .put(&bytes, std::slice::from_ref(&final_step.output_node))?;
        self.last_receipt_id = Some(receipt_id);

        Ok(Verdict::committed())
    }
}
