//! # Phases, step types, and proofs
//!
//! The typed vocabulary of the kernel. Wire names (used in law bundles,
//! receipts, and step payloads) are the SCREAMING_SNAKE forms.

use serde_json::{Map, Value};

/// Execution phases, in nominal lifecycle order.
///
/// The controller does not enforce this order; it is the monitors, through
/// the phase allowlist, that constrain what each phase may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Raw input admission.
    Ingest,
    /// Structure discovery over admitted inputs.
    Traverse,
    /// Derivation of intermediate findings.
    Analyze,
    /// Candidate-conclusion construction.
    Hypothesize,
    /// Commitment to a conclusion.
    Decide,
    /// Externally visible effect.
    Act,
}

impl Phase {
    /// Every phase, in declaration order.
    pub const ALL: [Phase; 6] = [
        Phase::Ingest,
        Phase::Traverse,
        Phase::Analyze,
        Phase::Hypothesize,
        Phase::Decide,
        Phase::Act,
    ];

    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Ingest => "INGEST",
            Phase::Traverse => "TRAVERSE",
            Phase::Analyze => "ANALYZE",
            Phase::Hypothesize => "HYPOTHESIZE",
            Phase::Decide => "DECIDE",
            Phase::Act => "ACT",
        }
    }
}

/// The step opcodes a proof may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepType {
    /// Decode raw bytes into structure.
    Parse,
    /// Pull a fact out of existing structure.
    Extract,
    /// Derive a new fact from premises.
    Infer,
    /// Combine facts into a summary.
    Aggregate,
    /// Bind a fact to an entity.
    EntityBind,
    /// Commit to a conclusion.
    Decide,
    /// Perform an effect.
    Act,
}

impl StepType {
    /// Every step type, in declaration order.
    pub const ALL: [StepType; 7] = [
        StepType::Parse,
        StepType::Extract,
        StepType::Infer,
        StepType::Aggregate,
        StepType::EntityBind,
        StepType::Decide,
        StepType::Act,
    ];

    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            StepType::Parse => "PARSE",
            StepType::Extract => "EXTRACT",
            StepType::Infer => "INFER",
            StepType::Aggregate => "AGGREGATE",
            StepType::EntityBind => "ENTITY_BIND",
            StepType::Decide => "DECIDE",
            StepType::Act => "ACT",
        }
    }
}

/// One typed claim: "re-evaluating this opcode over these inputs with these
/// params produces the node whose hash is `output_node`".
#[derive(Debug, Clone)]
pub struct Step {
    /// The opcode.
    pub step_type: StepType,
    /// The rule this step instantiates; opaque to the kernel.
    pub rule_id: String,
    /// Ordered input node hashes.
    pub inputs: Vec<String>,
    /// Opcode parameters; part of the recomputed payload.
    pub params: Map<String, Value>,
    /// The expected hash of the recomputed output node.
    pub output_node: String,
}

/// An ordered sequence of steps toward one goal, optionally resting on
/// previously minted receipts.
#[derive(Debug, Clone)]
pub struct Proof {
    /// The goal this proof argues for; opaque to the kernel.
    pub goal_id: String,
    /// Ordered steps; must be non-empty.
    pub steps: Vec<Step>,
    /// Memory hashes of receipts this proof depends on.
    pub receipt_deps: Vec<String>,
}
