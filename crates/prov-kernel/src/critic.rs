//! # The critic
//!
//! Re-evaluates a proof step by step and reports a deterministic verdict
//! code. The critic never trusts a declared output: it recomputes each
//! step's payload from the inputs actually in memory, stores it, and
//! compares the resulting hash against the declaration. After every
//! verified step the monitors are offered an observation event; the first
//! rejection halts replay.
//!
//! Verification failures are codes, not errors: the same proof against the
//! same memory yields the same code, every time.

use serde::Serialize;
use serde_json::{Map, Value};

use prov_core::{canonical_json, sha256_hex};

use crate::error::KernelError;
use crate::memory::MemoryStore;
use crate::monitor::{HiddenPremiseMonitor, Monitor, Norms, ObsEvent, PhaseAllowlistMonitor};
use crate::step::{Phase, Proof, Step, StepType};

/// Deterministic verdict codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictCode {
    /// The proof has no steps.
    EmptyProof,
    /// A receipt dep hash is not in memory.
    MissingReceiptNode,
    /// Receipt node bytes do not decode as a JSON object.
    BadReceiptEncoding,
    /// Receipt's law hash differs from the critic's.
    ReceiptLawMismatch,
    /// Receipt lacks `output_node`, `phase`, or `goal_id`.
    BadReceiptSchema,
    /// Receipt's declared output node is not in memory.
    MissingReceiptOutputNode,
    /// A step input hash is not in memory.
    MissingMemnode,
    /// Recomputed step output differs from the declaration.
    ReplayMismatch,
    /// A monitor rejected the step's observation event.
    MonitorReject,
    /// ACT-phase proofs must be exactly one ACT step.
    BadActShape,
    /// The proof verified.
    Accept,
    /// The proof verified and a receipt was minted.
    Committed,
}

impl VerdictCode {
    /// The stable wire string for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictCode::EmptyProof => "EMPTY_PROOF",
            VerdictCode::MissingReceiptNode => "MISSING_RECEIPT_NODE",
            VerdictCode::BadReceiptEncoding => "BAD_RECEIPT_ENCODING",
            VerdictCode::ReceiptLawMismatch => "RECEIPT_LAW_MISMATCH",
            VerdictCode::BadReceiptSchema => "BAD_RECEIPT_SCHEMA",
            VerdictCode::MissingReceiptOutputNode => "MISSING_RECEIPT_OUTPUT_NODE",
            VerdictCode::MissingMemnode => "MISSING_MEMNODE",
            VerdictCode::ReplayMismatch => "REPLAY_MISMATCH",
            VerdictCode::MonitorReject => "MONITOR_REJECT",
            VerdictCode::BadActShape => "BAD_ACT_SHAPE",
            VerdictCode::Accept => "ACCEPT",
            VerdictCode::Committed => "COMMITTED",
        }
    }
}

impl std::fmt::Display for VerdictCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of replaying a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the proof verified.
    pub ok: bool,
    /// The deterministic code.
    pub code: VerdictCode,
}

impl Verdict {
    pub(crate) fn accept() -> Self {
        Self {
            ok: true,
            code: VerdictCode::Accept,
        }
    }

    pub(crate) fn committed() -> Self {
        Self {
            ok: true,
            code: VerdictCode::Committed,
        }
    }

    pub(crate) fn reject(code: VerdictCode) -> Self {
        Self { ok: false, code }
    }
}

/// The deterministic payload a step's re-evaluation produces.
#[derive(Serialize)]
struct StepPayload<'a> {
    op: &'static str,
    rule: &'a str,
    params: &'a Map<String, Value>,
    inputs_data: Vec<String>,
    inputs_parents: Vec<Vec<String>>,
}

/// Re-evaluates proofs against a memory DAG under a pinned law hash.
pub struct Critic {
    monitors: Vec<Box<dyn Monitor>>,
    law_hash: String,
}

impl Critic {
    /// Critic with an explicit monitor set and law hash.
    pub fn new(monitors: Vec<Box<dyn Monitor>>, law_hash: String) -> Self {
        Self { monitors, law_hash }
    }

    /// Critic running the built-in monitors under the pinned law.
    pub fn with_builtin_monitors() -> Result<Self, KernelError> {
        Ok(Self::new(
            vec![
                Box::new(PhaseAllowlistMonitor),
                Box::new(HiddenPremiseMonitor),
            ],
            crate::law::law_hash()?,
        ))
    }

    /// The law hash receipts must carry to be accepted.
    pub fn law_hash(&self) -> &str {
        &self.law_hash
    }

    /// Replay and verify a proof under `phase`.
    ///
    /// Errors are reserved for kernel-machinery failures; every
    /// verification outcome, positive or negative, is a [`Verdict`].
    pub fn replay_and_verify(
        &self,
        memory: &mut MemoryStore,
        proof: &Proof,
        phase: Phase,
    ) -> Result<Verdict, KernelError> {
        if proof.steps.is_empty() {
            return Ok(Verdict::reject(VerdictCode::EmptyProof));
        }

        if let Some(code) = self.validate_receipts(memory, &proof.receipt_deps) {
            return Ok(Verdict::reject(code));
        }

        let mut norms = Norms::for_goal(&proof.goal_id);

        for step in &proof.steps {
            // Every referenced input node must exist before anything is
            // recomputed.
            let mut inputs_data = Vec::with_capacity(step.inputs.len());
            let mut inputs_parents = Vec::with_capacity(step.inputs.len());
            for h in &step.inputs {
                match memory.get(h) {
                    Ok(node) => {
                        inputs_data.push(sha256_hex(&node.data));
                        inputs_parents.push(node.parents.clone());
                    }
                    Err(_) => return Ok(Verdict::reject(VerdictCode::MissingMemnode)),
                }
            }

            let out_bytes = self.eval_step(step, inputs_data, inputs_parents)?;
            let out_h = memory.put(&out_bytes, &step.inputs)?;
            if out_h != step.output_node {
                return Ok(Verdict::reject(VerdictCode::ReplayMismatch));
            }

            norms.record(step.step_type);
            let event = ObsEvent {
                phase,
                step_type: step.step_type,
                rule_id: step.rule_id.clone(),
                deps_count: step.inputs.len(),
                norms: norms.clone(),
            };

            for monitor in &self.monitors {
                if !monitor.step(&event) {
                    return Ok(Verdict::reject(VerdictCode::MonitorReject));
                }
            }
        }

        if phase == Phase::Act
            && (proof.steps.len() != 1 || proof.steps[0].step_type != StepType::Act)
        {
            return Ok(Verdict::reject(VerdictCode::BadActShape));
        }

        Ok(Verdict::accept())
    }

    /// Deterministic opcode evaluation: the payload bytes a step produces.
    fn eval_step(
        &self,
        step: &Step,
        inputs_data: Vec<String>,
        inputs_parents: Vec<Vec<String>>,
    ) -> Result<Vec<u8>, KernelError> {
        let payload = StepPayload {
            op: step.step_type.name(),
            rule: &step.rule_id,
            params: &step.params,
            inputs_data,
            inputs_parents,
        };
        Ok(canonical_json(&payload)?.into_vec())
    }

    /// Check every receipt dep; `None` means all pass.
    fn validate_receipts(&self, memory: &MemoryStore, deps: &[String]) -> Option<VerdictCode> {
        for dep in deps {
            let node = match memory.get(dep) {
                Ok(n) => n,
                Err(_) => return Some(VerdictCode::MissingReceiptNode),
            };

            let receipt: Value = match serde_json::from_slice(&node.data) {
                Ok(v) => v,
                Err(_) => return Some(VerdictCode::BadReceiptEncoding),
            };
            let receipt = match receipt.as_object() {
                Some(r) => r,
                None => return Some(VerdictCode::BadReceiptEncoding),
            };

            if receipt.get("law_hash").and_then(Value::as_str) != Some(self.law_hash.as_str()) {
                return Some(VerdictCode::ReceiptLawMismatch);
            }

            let output_node = receipt.get("output_node");
            if output_node.is_none()
                || !receipt.contains_key("phase")
                || !receipt.contains_key("goal_id")
            {
                return Some(VerdictCode::BadReceiptSchema);
            }

            // The receipt's declared output must itself be in memory.
            match output_node.and_then(Value::as_str) {
                Some(h) if memory.contains(h) => {}
                _ => return Some(VerdictCode::MissingReceiptOutputNode),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::law::law_hash;

    fn critic() -> Critic {
        Critic::with_builtin_monitors().unwrap()
    }

    /// The output hash a well-formed step must declare: payload bytes put
    /// with the step's inputs as parents.
    fn expected_output(
        memory: &MemoryStore,
        step_type: StepType,
        rule_id: &str,
        inputs: &[String],
        params: &Map<String, Value>,
    ) -> String {
        let inputs_data: Vec<String> = inputs
            .iter()
            .map(|h| sha256_hex(&memory.get(h).unwrap().data))
            .collect();
        let inputs_parents: Vec<Vec<String>> = inputs
            .iter()
            .map(|h| memory.get(h).unwrap().parents.clone())
            .collect();
        let payload = serde_json::json!({
            "op": step_type.name(),
            "rule": rule_id,
            "params": params,
            "inputs_data": inputs_data,
            "inputs_parents": inputs_parents,
        });
        let payload_bytes = canonical_json(&payload).unwrap().into_vec();
        let envelope = serde_json::json!({
            "data_sha256": sha256_hex(&payload_bytes),
            "parents": inputs,
        });
        sha256_hex(canonical_json(&envelope).unwrap().as_bytes())
    }

    fn step(
        memory: &MemoryStore,
        step_type: StepType,
        rule_id: &str,
        inputs: Vec<String>,
        params: Map<String, Value>,
    ) -> Step {
        let output_node = expected_output(memory, step_type, rule_id, &inputs, &params);
        Step {
            step_type,
            rule_id: rule_id.into(),
            inputs,
            params,
            output_node,
        }
    }

    fn proof(steps: Vec<Step>) -> Proof {
        Proof {
            goal_id: "g".into(),
            steps,
            receipt_deps: Vec::new(),
        }
    }

    #[test]
    fn empty_proof_rejected() {
        let mut mem = MemoryStore::new();
        let v = critic()
            .replay_and_verify(&mut mem, &proof(vec![]), Phase::Analyze)
            .unwrap();
        assert!(!v.ok);
        assert_eq!(v.code.as_str(), "EMPTY_PROOF");
    }

    #[test]
    fn missing_input_node_rejected() {
        let mut mem = MemoryStore::new();
        let p = proof(vec![Step {
            step_type: StepType::Infer,
            rule_id: "r1".into(),
            inputs: vec!["deadbeef".into()],
            params: Map::new(),
            output_node: "outnode".into(),
        }]);
        let v = critic().replay_and_verify(&mut mem, &p, Phase::Analyze).unwrap();
        assert!(!v.ok);
        assert_eq!(v.code.as_str(), "MISSING_MEMNODE");
    }

    #[test]
    fn extract_step_accepts_with_worked_digests() {
        let mut mem = MemoryStore::new();
        let inp = mem.put(b"input-data", &[]).unwrap();
        assert_eq!(
            inp,
            "075406b5b82ecd1a5d40299e9feca1bf90774a3f4ae6541b58381b10fa874e53"
        );

        let mut params = Map::new();
        params.insert("k".into(), Value::String("v".into()));
        let s = step(&mem, StepType::Extract, "r_extract", vec![inp], params);
        assert_eq!(
            s.output_node,
            "39881f0fe920dfce87044e25837aafe1cd2568126ae3b3ee055cdca9901e5d2c"
        );

        let v = critic()
            .replay_and_verify(&mut mem, &proof(vec![s]), Phase::Traverse)
            .unwrap();
        assert!(v.ok);
        assert_eq!(v.code.as_str(), "ACCEPT");
    }

    #[test]
    fn verification_is_idempotent() {
        let mut mem = MemoryStore::new();
        let inp = mem.put(b"input-data", &[]).unwrap();
        let s = step(&mem, StepType::Extract, "r", vec![inp], Map::new());
        let p = proof(vec![s]);
        let c = critic();

        let before = mem.len();
        let first = c.replay_and_verify(&mut mem, &p, Phase::Traverse).unwrap();
        let between = mem.len();
        let second = c.replay_and_verify(&mut mem, &p, Phase::Traverse).unwrap();

        assert_eq!(first.code, VerdictCode::Accept);
        assert_eq!(second.code, VerdictCode::Accept);
        // The recomputed node is stored once; re-verification adds nothing.
        assert_eq!(between, before + 1);
        assert_eq!(mem.len(), between);
    }

    #[test]
    fn wrong_declared_output_is_replay_mismatch() {
        let mut mem = MemoryStore::new();
        let inp = mem.put(b"input-data", &[]).unwrap();
        let mut s = step(&mem, StepType::Extract, "r", vec![inp], Map::new());
        s.output_node = "0".repeat(64);

        let v = critic()
            .replay_and_verify(&mut mem, &proof(vec![s]), Phase::Traverse)
            .unwrap();
        assert_eq!(v.code.as_str(), "REPLAY_MISMATCH");
    }

    #[test]
    fn out_of_phase_step_is_monitor_reject() {
        let mut mem = MemoryStore::new();
        let inp = mem.put(b"doc", &[]).unwrap();
        // EXTRACT is not allowed during INGEST.
        let s = step(&mem, StepType::Extract, "r", vec![inp], Map::new());
        let v = critic()
            .replay_and_verify(&mut mem, &proof(vec![s]), Phase::Ingest)
            .unwrap();
        assert_eq!(v.code.as_str(), "MONITOR_REJECT");
    }

    #[test]
    fn premiseless_inference_is_monitor_reject() {
        let mut mem = MemoryStore::new();
        let s = step(&mem, StepType::Infer, "r", vec![], Map::new());
        let v = critic()
            .replay_and_verify(&mut mem, &proof(vec![s]), Phase::Analyze)
            .unwrap();
        assert_eq!(v.code.as_str(), "MONITOR_REJECT");
    }

    #[test]
    fn act_phase_requires_exactly_one_act_step() {
        let mut mem = MemoryStore::new();
        let inp = mem.put(b"decision basis", &[]).unwrap();

        let s1 = step(&mem, StepType::Act, "r1", vec![inp], Map::new());
        let v = critic()
            .replay_and_verify(&mut mem, &proof(vec![s1.clone()]), Phase::Act)
            .unwrap();
        assert_eq!(v.code.as_str(), "ACCEPT");

        // Two ACT steps: each passes the monitors, but the shape check
        // rejects the proof as a whole.
        let s2 = step(&mem, StepType::Act, "r2", vec![s1.output_node.clone()], Map::new());
        let v = critic()
            .replay_and_verify(&mut mem, &proof(vec![s1, s2]), Phase::Act)
            .unwrap();
        assert_eq!(v.code.as_str(), "BAD_ACT_SHAPE");
    }

    // Receipt-dep validation paths.

    fn receipt_bytes(law: &str, with_all_keys: bool) -> Vec<u8> {
        let mut r = serde_json::json!({
            "law_hash": law,
            "phase": "ANALYZE",
            "goal_id": "g",
            "output_node": "nonexistent",
        });
        if !with_all_keys {
            r.as_object_mut().unwrap().remove("output_node");
        }
        canonical_json(&r).unwrap().into_vec()
    }

    fn one_valid_step_proof(mem: &mut MemoryStore, deps: Vec<String>) -> Proof {
        let inp = mem.put(b"x", &[]).unwrap();
        let s = step(mem, StepType::Extract, "r", vec![inp], Map::new());
        Proof {
            goal_id: "g".into(),
            steps: vec![s],
            receipt_deps: deps,
        }
    }

    #[test]
    fn unknown_receipt_dep_rejected() {
        let mut mem = MemoryStore::new();
        let p = one_valid_step_proof(&mut mem, vec!["deadbeef".into()]);
        let v = critic().replay_and_verify(&mut mem, &p, Phase::Traverse).unwrap();
        assert_eq!(v.code.as_str(), "MISSING_RECEIPT_NODE");
    }

    #[test]
    fn non_json_receipt_rejected() {
        let mut mem = MemoryStore::new();
        let dep = mem.put(b"not json at all", &[]).unwrap();
        let p = one_valid_step_proof(&mut mem, vec![dep]);
        let v = critic().replay_and_verify(&mut mem, &p, Phase::Traverse).unwrap();
        assert_eq!(v.code.as_str(), "BAD_RECEIPT_ENCODING");
    }

    #[test]
    fn non_object_receipt_rejected() {
        let mut mem = MemoryStore::new();
        let dep = mem.put(b"[1,2,3]", &[]).unwrap();
        let p = one_valid_step_proof(&mut mem, vec![dep]);
        let v = critic().replay_and_verify(&mut mem, &p, Phase::Traverse).unwrap();
        assert_eq!(v.code.as_str(), "BAD_RECEIPT_ENCODING");
    }

    #[test]
    fn foreign_law_receipt_rejected() {
        let mut mem = MemoryStore::new();
        let bytes = receipt_bytes("some other law", true);
        let dep = mem.put(&bytes, &[]).unwrap();
        let p = one_valid_step_proof(&mut mem, vec![dep]);
        let v = critic().replay_and_verify(&mut mem, &p, Phase::Traverse).unwrap();
        assert_eq!(v.code.as_str(), "RECEIPT_LAW_MISMATCH");
    }

    #[test]
    fn incomplete_receipt_rejected() {
        let mut mem = MemoryStore::new();
        let bytes = receipt_bytes(&law_hash().unwrap(), false);
        let dep = mem.put(&bytes, &[]).unwrap();
        let p = one_valid_step_proof(&mut mem, vec![dep]);
        let v = critic().replay_and_verify(&mut mem, &p, Phase::Traverse).unwrap();
        assert_eq!(v.code.as_str(), "BAD_RECEIPT_SCHEMA");
    }

    #[test]
    fn receipt_with_absent_output_node_rejected() {
        let mut mem = MemoryStore::new();
        let bytes = receipt_bytes(&law_hash().unwrap(), true);
        let dep = mem.put(&bytes, &[]).unwrap();
        let p = one_valid_step_proof(&mut mem, vec![dep]);
        let v = critic().replay_and_verify(&mut mem, &p, Phase::Traverse).unwrap();
        assert_eq!(v.code.as_str(), "MISSING_RECEIPT_OUTPUT_NODE");
    }
}
