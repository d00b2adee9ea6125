//! Signal collection: deadline-bounded parallel fan-out of every agent and
//! forensic module against one shared sample.
//!
//! Each component runs as an independent rayon task, isolated from its
//! siblings by `catch_unwind`, and reports back over a channel. The join
//! barrier waits until every component has reported or the overall
//! deadline expires. Components that panic, error, or miss their budget
//! are recorded as Failed/skipped; completed results are always retained.
//! The returned bundle is complete: one entry per configured component.

use crate::agents::ClassifierAgent;
use crate::config::VeriteConfig;
use crate::forensics::ForensicModule;
use crate::ingest::ImageSample;
use crate::signal::{
    AgentResult, ForensicFinding, SignalBundle, SkipReason, SkippedComponent,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ─── Task Plumbing ──────────────────────────────────────────────────

enum TaskOutput {
    Agent(AgentResult),
    Forensic(Vec<ForensicFinding>),
}

struct TaskReport {
    slot: Slot,
    elapsed: Duration,
    outcome: Result<TaskOutput, SkipReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Agent(usize),
    Module(usize),
}

// ─── Collector ──────────────────────────────────────────────────────

/// Run every agent and module concurrently and assemble the frozen bundle
pub fn collect_signals(
    agents: &[Arc<ClassifierAgent>],
    modules: &[Arc<dyn ForensicModule>],
    sample: &Arc<ImageSample>,
    config: &VeriteConfig,
) -> SignalBundle {
    let started = Instant::now();
    let deadline = started + config.overall_deadline();
    let agent_budget = config.agent_timeout();

    let (tx, rx) = mpsc::channel::<TaskReport>();

    for (idx, agent) in agents.iter().enumerate() {
        let tx = tx.clone();
        let agent = Arc::clone(agent);
        let sample = Arc::clone(sample);
        rayon::spawn(move || {
            let t0 = Instant::now();
            let outcome = catch_unwind(AssertUnwindSafe(|| agent.evaluate(&sample)))
                .map(TaskOutput::Agent)
                .map_err(|_| SkipReason::Panicked);
            // A send after the collector gave up on us lands in a dropped
            // receiver; the result is intentionally discarded.
            let _ = tx.send(TaskReport {
                slot: Slot::Agent(idx),
                elapsed: t0.elapsed(),
                outcome,
            });
        });
    }

    for (idx, module) in modules.iter().enumerate() {
        let tx = tx.clone();
        let module = Arc::clone(module);
        let sample = Arc::clone(sample);
        rayon::spawn(move || {
            let t0 = Instant::now();
            let outcome = catch_unwind(AssertUnwindSafe(|| module.inspect(&sample)))
                .map_err(|_| SkipReason::Panicked)
                .and_then(|r| match r {
                    Ok(findings) => Ok(TaskOutput::Forensic(findings)),
                    Err(e) => Err(SkipReason::Failed(e.to_string())),
                });
            let _ = tx.send(TaskReport {
                slot: Slot::Module(idx),
                elapsed: t0.elapsed(),
                outcome,
            });
        });
    }
    drop(tx);

    // ── Join barrier ──
    let mut agent_slots: Vec<Option<AgentResult>> = vec![None; agents.len()];
    let mut module_slots: Vec<Option<Result<Vec<ForensicFinding>, SkipReason>>> =
        vec![None; modules.len()];
    let mut pending = agents.len() + modules.len();

    while pending > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let report = match rx.recv_timeout(remaining) {
            Ok(report) => report,
            Err(_) => break, // deadline expired or all senders gone
        };
        pending -= 1;

        match report.slot {
            Slot::Agent(idx) => {
                let agent = &agents[idx];
                let result = match report.outcome {
                    // The per-call budget is enforced here: a completed
                    // inference that overran it still counts as a timeout
                    Ok(TaskOutput::Agent(_)) if report.elapsed > agent_budget => {
                        tracing::warn!(
                            "{}: exceeded {}ms budget ({}ms)",
                            agent.id(),
                            agent_budget.as_millis(),
                            report.elapsed.as_millis()
                        );
                        AgentResult::failed(agent.id(), agent.display_name(), "timeout")
                    }
                    Ok(TaskOutput::Agent(result)) => result,
                    Ok(TaskOutput::Forensic(_)) => unreachable!("agent slot carries agent output"),
                    Err(_) => AgentResult::failed(agent.id(), agent.display_name(), "panic"),
                };
                agent_slots[idx] = Some(result);
            }
            Slot::Module(idx) => {
                let entry = match report.outcome {
                    Ok(TaskOutput::Forensic(findings)) => Ok(findings),
                    Ok(TaskOutput::Agent(_)) => unreachable!("module slot carries findings"),
                    Err(reason) => Err(reason),
                };
                module_slots[idx] = Some(entry);
            }
        }
    }

    // ── Completeness: fill every slot that never reported ──
    let mut bundle = SignalBundle::default();

    for (idx, slot) in agent_slots.into_iter().enumerate() {
        let agent = &agents[idx];
        bundle.agent_results.push(slot.unwrap_or_else(|| {
            tracing::warn!("{}: no result before deadline", agent.id());
            AgentResult::failed(agent.id(), agent.display_name(), "timeout")
        }));
    }

    for (idx, slot) in module_slots.into_iter().enumerate() {
        let module = &modules[idx];
        match slot {
            Some(Ok(findings)) => bundle.findings.extend(findings),
            Some(Err(reason)) => {
                tracing::warn!("{}: {}", module.id(), reason);
                bundle.skipped.push(SkippedComponent {
                    component_id: module.id().to_string(),
                    reason,
                });
            }
            None => {
                tracing::warn!("{}: no result before deadline", module.id());
                bundle.skipped.push(SkippedComponent {
                    component_id: module.id().to_string(),
                    reason: SkipReason::TimedOut,
                });
            }
        }
    }

    tracing::debug!(
        "collected {} agent results, {} findings, {} skipped in {}ms",
        bundle.agent_results.len(),
        bundle.findings.len(),
        bundle.skipped.len(),
        started.elapsed().as_millis()
    );

    bundle
}

// ─── Tests ──────────────────────────────────────────────────────────
