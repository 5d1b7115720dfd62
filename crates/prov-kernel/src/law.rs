//! # The pinned law
//!
//! The law bundle is a canonical JSON snapshot of the kernel's rules of
//! engagement: which step types each phase allows, the full opcode set, and
//! the monitor names. Its SHA-256 is the law hash that every receipt pins,
//! so two kernels agree on their law iff they agree on this hash.
//!
//! The bundle is deliberately built from literals, not by reflecting over
//! the configured monitors: the law is what is pinned, not what happens to
//! be installed.

use prov_core::{canonical_json, sha256_hex, CanonicalError};

use crate::step::{Phase, StepType};

/// Monitor names included in the law bundle.
const LAW_MONITORS: [&str; 2] = ["HiddenPremiseMonitor", "PhaseAllowlistMonitor"];

/// The step types a phase allows.
pub fn allowed_step_types(phase: Phase) -> &'static [StepType] {
    match phase {
        Phase::Ingest => &[StepType::Parse],
        Phase::Traverse => &[StepType::Extract],
        Phase::Analyze | Phase::Hypothesize => {
            &[StepType::Extract, StepType::Aggregate, StepType::Infer]
        }
        Phase::Decide => &[StepType::Decide],
        Phase::Act => &[StepType::Act],
    }
}

/// Canonical JSON of the law: `{monitors, opcodes, phases}` with every name
/// list sorted.
pub fn law_bundle() -> Result<Vec<u8>, CanonicalError> {
    let mut phases = serde_json::Map::new();
    for phase in Phase::ALL {
        let mut allowed: Vec<&str> = allowed_step_types(phase)
            .iter()
            .map(StepType::name)
            .collect();
        allowed.sort_unstable();
        phases.insert(phase.name().to_string(), serde_json::json!(allowed));
    }

    let mut opcodes: Vec<&str> = StepType::ALL.iter().map(StepType::name).collect();
    opcodes.sort_unstable();

    let mut monitors = LAW_MONITORS.to_vec();
    monitors.sort_unstable();

    let bundle = serde_json::json!({
        "phases": phases,
        "opcodes": opcodes,
        "monitors": monitors,
    });
    Ok(canonical_json(&bundle)?.into_vec())
}

/// The pinned law hash: SHA-256 hex of the law bundle.
pub fn law_hash() -> Result<String, CanonicalError> {
    Ok(sha256_hex(&law_bundle()?))
}
