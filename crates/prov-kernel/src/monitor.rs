//! # Monitors
//!
//! Predicates evaluated over an observation event after each step is
//! re-verified. Monitors see the step's shape and the rolling norms, never
//! the payload bytes: they gate structure, not content. The first monitor
//! to reject halts the replay.

use crate::law::allowed_step_types;
use crate::step::{Phase, StepType};

/// Rolling tallies across a proof's steps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Norms {
    /// INFER steps seen so far.
    pub infer_count: u32,
    /// AGGREGATE steps seen so far.
    pub aggregate_count: u32,
    /// DECIDE and ACT steps seen so far.
    pub decision_count: u32,
    /// The goal the proof argues for.
    pub goal_id: String,
}

impl Norms {
    /// Fresh tallies for a proof toward `goal_id`.
    pub fn for_goal(goal_id: &str) -> Self {
        Self {
            goal_id: goal_id.to_string(),
            ..Self::default()
        }
    }

    /// Account for one verified step.
    pub fn record(&mut self, step_type: StepType) {
        match step_type {
            StepType::Infer => self.infer_count += 1,
            StepType::Aggregate => self.aggregate_count += 1,
            StepType::Decide | StepType::Act => self.decision_count += 1,
            _ => {}
        }
    }
}

/// What a monitor observes after each verified step.
#[derive(Debug, Clone)]
pub struct ObsEvent {
    /// The phase the proof was submitted under.
    pub phase: Phase,
    /// The step's opcode.
    pub step_type: StepType,
    /// The step's rule identifier.
    pub rule_id: String,
    /// Number of declared inputs.
    pub deps_count: usize,
    /// Rolling tallies up to and including this step.
    pub norms: Norms,
}

/// A predicate over observation events.
///
/// Returning `false` rejects the proof at this step.
pub trait Monitor {
    /// Judge one event.
    fn step(&self, event: &ObsEvent) -> bool;
}

/// Rejects steps whose type the current phase does not allow.
#[derive(Debug, Default)]
pub struct PhaseAllowlistMonitor;

impl Monitor for PhaseAllowlistMonitor {
    fn step(&self, event: &ObsEvent) -> bool {
        allowed_step_types(event.phase).contains(&event.step_type)
    }
}

/// Rejects conclusion-shaped steps with no premises: INFER, DECIDE, and ACT
/// must each rest on at least one input.
#[derive(Debug, Default)]
pub struct HiddenPremiseMonitor;

impl Monitor for HiddenPremiseMonitor {
    fn step(&self, event: &ObsEvent) -> bool {
        match event.step_type {
            StepType::Infer | StepType::Decide | StepType::Act => event.deps_count > 0,
            _ => true,
        }
    }
}
