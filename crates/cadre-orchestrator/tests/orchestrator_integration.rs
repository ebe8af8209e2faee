//! Integration tests for the task lifecycle.
//!
//! Covers queue ordering, agent exclusivity, the completion → QA → requeue
//! loop, QA pool contention, cleanup boundaries, and concurrent execution
//! through the engine with mock collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use cadre_agent::{Agent, AgentBehavior};
use cadre_core::{payload, CadreError, CadreResult, Payload};
use cadre_orchestrator::*;
use cadre_qa::{CheckOutcome, Checklist, ChecklistSweep, QaAgent, QualityScorer, Severity};
use chrono::Duration as ChronoDuration;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Mock collaborators
// ---------------------------------------------------------------------------

/// Replies with a fixed payload after an optional delay.
struct Scripted {
    reply: Value,
    delay: Duration,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(reply: Value) -> Arc<Self> {
        Arc::new(Self {
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(reply: Value, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply,
            delay,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AgentBehavior for Scripted {
    async fn process(&self, input: &Payload) -> CadreResult<Payload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut out = payload(self.reply.clone());
        out.insert("input_type".into(), input["type"].clone());
        Ok(out)
    }
}

struct Broken;

#[async_trait]
impl AgentBehavior for Broken {
    async fn process(&self, _input: &Payload) -> CadreResult<Payload> {
        Err(CadreError::Agent("upstream unavailable".into()))
    }
}

/// Reports a score outside the unit interval.
struct Overconfident;

impl QualityScorer for Overconfident {
    fn score(&self, _sweep: &ChecklistSweep, _task_data: &Payload, _result: &Payload) -> f64 {
        1.5
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn config() -> OrgConfig {
    OrgConfig {
        rng_seed: Some(7),
        ..OrgConfig::named("Morgan", "Marketing")
    }
}

fn matcher() -> Arc<dyn CapabilityMatcher> {
    Arc::new(SkillRequirementMatcher::new(0.7).with_requirement("write", ["writing"]))
}

fn manager_with(config: OrgConfig) -> Manager {
    Manager::new(config, matcher()).unwrap()
}

fn writer(name: &str, behavior: Arc<dyn AgentBehavior>) -> Agent {
    Agent::new(name, "Marketing", "Writer")
        .unwrap()
        .with_skills(HashMap::from([("writing".to_string(), 0.8)]))
        .with_behavior(behavior)
}

fn idle_writer(name: &str) -> Agent {
    writer(name, Scripted::new(json!({"success": true})))
}

/// Approves unless the result carries `"sloppy": true`.
fn reviewer(name: &str) -> QaAgent {
    let evaluator =
        |_: &str, item: &str, _: &Payload, result: &Payload| -> CadreResult<CheckOutcome> {
            let sloppy = result.get("sloppy").and_then(Value::as_bool).unwrap_or(false);
            Ok(CheckOutcome::check(!sloppy, Severity::High, item))
        };
    QaAgent::new(name, "Marketing", Arc::new(evaluator))
        .unwrap()
        .with_checklist(Checklist::from_categories([(
            "content",
            vec!["Grammar", "Tone"],
        )]))
}

fn ok() -> Payload {
    payload(json!({"success": true}))
}

// ---------------------------------------------------------------------------
// Queue ordering
// ---------------------------------------------------------------------------

#[test]
fn test_queue_orders_by_priority_then_creation() {
    let mut m = manager_with(config());
    let ids: Vec<_> = [1, 5, 3, 5]
        .into_iter()
        .map(|p| m.create_task("write", json!({}), p).unwrap())
        .collect();

    assert_eq!(m.store().queue(), [ids[1], ids[3], ids[2], ids[0]]);
}

#[test]
fn test_assignment_follows_queue_order() {
    let mut m = manager_with(config());
    let low = m.create_task("write", json!({}), 1).unwrap();
    let high = m.create_task("write", json!({}), 9).unwrap();
    let a = m.add_agent(idle_writer("Avery"));

    let outcomes = m.assign_tasks();
    assert_eq!(
        outcomes[0],
        AssignmentOutcome::Assigned {
            task_id: high,
            agent_id: a
        }
    );
    assert_eq!(outcomes[1], AssignmentOutcome::NoCapableAgent { task_id: low });
}

// ---------------------------------------------------------------------------
// Exclusivity and metrics
// ---------------------------------------------------------------------------

#[test]
fn test_busy_agent_refuses_second_task() {
    let mut m = manager_with(config());
    let a = m.add_agent(idle_writer("Avery"));
    let first = m.create_task("write", json!({}), 1).unwrap();
    m.assign_tasks();

    let agent = m.get_agent_mut(a).unwrap();
    assert!(!agent.assign_task(uuid::Uuid::new_v4(), Payload::new()));
    assert_eq!(agent.current_task().unwrap().task_id, first);
}

#[test]
fn test_agent_success_rate_is_running_mean() {
    let mut m = manager_with(config());
    let a = m.add_agent(idle_writer("Avery"));

    let t1 = m.create_task("write", json!({}), 1).unwrap();
    m.assign_tasks();
    m.complete_task(a, t1, ok()).unwrap();

    let t2 = m.create_task("write", json!({}), 1).unwrap();
    m.assign_tasks();
    assert!(m.abandon_task(t2, a, "failed").unwrap());

    let t3 = m.create_task("write", json!({}), 1).unwrap();
    let outcomes = m.assign_tasks();
    // t2 went back to pending and sits ahead of t3 in the queue.
    assert_eq!(
        outcomes[0],
        AssignmentOutcome::Assigned {
            task_id: t2,
            agent_id: a
        }
    );
    m.complete_task(a, t2, ok()).unwrap();

    let rate = m.get_agent(a).unwrap().metrics().success_rate;
    assert!((rate - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(m.get_task(t3).unwrap().status, TaskStatus::Pending);
    assert_eq!(m.metrics().tasks_assigned, 3);
    assert_eq!(m.metrics().tasks_completed, 2);
}

// ---------------------------------------------------------------------------
// Review and requeue
// ---------------------------------------------------------------------------

fn reject_once(policy: RequeuePolicy) -> (Manager, Vec<uuid::Uuid>) {
    let mut m = manager_with(OrgConfig {
        requeue_policy: policy,
        ..config()
    });
    let a = m.add_agent(idle_writer("Avery"));
    m.add_qa_agent(reviewer("Quinn"));

    let urgent = m.create_task("archive", json!({}), 5).unwrap();
    let task = m.create_task("write", json!({}), 2).unwrap();
    let minor = m.create_task("archive", json!({}), 1).unwrap();
    m.assign_tasks();

    let dispatch = m
        .complete_task(a, task, payload(json!({"success": true, "sloppy": true})))
        .unwrap();
    assert!(dispatch.is_dispatched());
    let review = m.run_review(task).unwrap();
    assert!(!review.approved());
    // No base checks: 0.4 * 1.0 + 0.6 * 0.0.
    assert!((review.score - 0.4).abs() < 1e-9);

    (m, vec![urgent, task, minor])
}

#[test]
fn test_rejected_task_goes_to_tail_with_bumped_priority() {
    let (m, ids) = reject_once(RequeuePolicy::Tail);
    let task = m.get_task(ids[1]).unwrap();
    assert_eq!(task.priority, 3);
    assert_eq!(task.status, TaskStatus::Rejected);
    assert_eq!(task.qa_status, QaStatus::Rejected);
    assert_eq!(m.store().queue(), [ids[0], ids[2], ids[1]]);
}

#[test]
fn test_priority_requeue_policy_reinserts_by_priority() {
    let (m, ids) = reject_once(RequeuePolicy::Priority);
    assert_eq!(m.get_task(ids[1]).unwrap().priority, 3);
    assert_eq!(m.store().queue(), [ids[0], ids[1], ids[2]]);
}

#[test]
fn test_busy_qa_agent_leaves_review_pending_until_retry() {
    let mut m = manager_with(config());
    let a = m.add_agent(idle_writer("Avery"));
    let b = m.add_agent(idle_writer("Blake"));
    let qa = m.add_qa_agent(reviewer("Quinn"));
    let t1 = m.create_task("write", json!({}), 1).unwrap();
    let t2 = m.create_task("write", json!({}), 1).unwrap();
    m.assign_tasks();

    assert_eq!(
        m.complete_task(a, t1, ok()).unwrap(),
        DispatchOutcome::Dispatched { qa_agent_id: qa }
    );
    assert_eq!(
        m.complete_task(b, t2, ok()).unwrap(),
        DispatchOutcome::QaBusy { qa_agent_id: qa }
    );
    assert_eq!(m.get_task(t2).unwrap().qa_status, QaStatus::Pending);

    m.run_review(t1).unwrap();
    let retried = m.dispatch_pending_reviews();
    assert_eq!(
        retried,
        vec![(t2, DispatchOutcome::Dispatched { qa_agent_id: qa })]
    );
    assert!(m.run_review(t2).unwrap().approved());
    assert_eq!(m.get_team_performance_report().approved_tasks, 2);
}

#[test]
fn test_fallback_dispatch_uses_free_qa_agent() {
    let mut m = manager_with(OrgConfig {
        qa_dispatch: QaDispatch::RandomThenFallback,
        ..config()
    });
    let a = m.add_agent(idle_writer("Avery"));
    let b = m.add_agent(idle_writer("Blake"));
    m.add_qa_agent(reviewer("Quinn"));
    m.add_qa_agent(reviewer("Riley"));
    let t1 = m.create_task("write", json!({}), 1).unwrap();
    let t2 = m.create_task("write", json!({}), 1).unwrap();
    m.assign_tasks();

    let DispatchOutcome::Dispatched { qa_agent_id: first } = m.complete_task(a, t1, ok()).unwrap()
    else {
        panic!("first review should dispatch");
    };
    let DispatchOutcome::Dispatched { qa_agent_id: second } =
        m.complete_task(b, t2, ok()).unwrap()
    else {
        panic!("fallback should find the free QA agent");
    };
    assert_ne!(first, second);
}

#[test]
fn test_evaluator_error_skips_item() {
    let mut m = manager_with(config());
    let a = m.add_agent(idle_writer("Avery"));
    let evaluator =
        |_: &str, item: &str, _: &Payload, _: &Payload| -> CadreResult<CheckOutcome> {
            if item == "Tone" {
                return Err(CadreError::Evaluator("no tone data".into()));
            }
            Ok(CheckOutcome::pass(Severity::High, item))
        };
    m.add_qa_agent(
        QaAgent::new("Quinn", "Marketing", Arc::new(evaluator))
            .unwrap()
            .with_checklist(Checklist::from_categories([(
                "content",
                vec!["Grammar", "Tone"],
            )])),
    );
    let t = m.create_task("write", json!({}), 1).unwrap();
    m.assign_tasks();
    m.complete_task(a, t, ok()).unwrap();

    let review = m.run_review(t).unwrap();
    assert_eq!(review.checks_skipped, 1);
    assert!(review.approved());
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

#[test]
fn test_cleanup_boundary_is_exclusive() {
    let mut m = manager_with(config());
    let a = m.add_agent(idle_writer("Avery"));
    let done = m.create_task("write", json!({}), 1).unwrap();
    let waiting = m.create_task("archive", json!({}), 1).unwrap();
    m.assign_tasks();
    m.complete_task(a, done, ok()).unwrap();

    let created = m.get_task(done).unwrap().created_at;
    let exactly = created + ChronoDuration::days(30);
    assert_eq!(m.cleanup_old_tasks_as_of(30, exactly).unwrap(), 0);
    assert!(m.get_task(done).is_some());

    let older = exactly + ChronoDuration::days(1);
    assert_eq!(m.cleanup_old_tasks_as_of(30, older).unwrap(), 1);
    assert!(m.get_task(done).is_none());
    assert!(m.get_task(waiting).is_some());
    assert_eq!(m.store().queue(), [waiting]);
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_engine_runs_cycle_through_review() {
    let mut m = manager_with(config());
    let behavior = Scripted::new(json!({"success": true, "content": "draft"}));
    m.add_agent(writer("Avery", behavior.clone()));
    m.add_agent(writer("Blake", behavior.clone()));
    m.add_qa_agent(reviewer("Quinn"));
    m.add_qa_agent(reviewer("Riley"));
    for _ in 0..2 {
        m.create_task("write", json!({"topic": "launch"}), 1).unwrap();
    }

    let engine = Engine::new(m);
    let outcomes = engine.run_cycle().await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(behavior.calls.load(Ordering::SeqCst), 2);
    for outcome in &outcomes {
        assert!(matches!(outcome, ExecutionOutcome::Completed { .. }));
    }

    // Reviews that lost the QA draw are retried on the next cycle.
    engine.run_cycle().await.unwrap();
    let manager = engine.manager().lock().await;
    let report = manager.get_team_performance_report();
    assert_eq!(report.approved_tasks, 2);
    assert_eq!(report.metrics.tasks_completed, 2);
    assert_eq!(report.metrics.team_efficiency, 1.0);
}

#[tokio::test]
async fn test_engine_failure_returns_task_to_pending() {
    let mut m = manager_with(config());
    let a = m.add_agent(writer(
        "Avery",
        Scripted::new(json!({"success": false, "error": "quota exceeded"})),
    ));
    let t = m.create_task("write", json!({}), 1).unwrap();

    let engine = Engine::new(m);
    let outcomes = engine.run_cycle().await.unwrap();
    match &outcomes[0] {
        ExecutionOutcome::Failed { task_id, reason } => {
            assert_eq!(*task_id, t);
            assert_eq!(reason, "quota exceeded");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let manager = engine.manager().lock().await;
    let task = manager.get_task(t).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.assigned_to.is_none());
    let agent = manager.get_agent(a).unwrap();
    assert!(agent.is_available());
    assert_eq!(agent.metrics().success_rate, 0.0);
}

#[tokio::test]
async fn test_engine_missing_discriminator_is_failure() {
    let mut m = manager_with(config());
    m.add_agent(writer("Avery", Scripted::new(json!({"content": "draft"}))));
    let t = m.create_task("write", json!({}), 1).unwrap();

    let engine = Engine::new(m);
    let outcome = engine.run_cycle().await.unwrap().remove(0);
    assert!(matches!(outcome, ExecutionOutcome::Failed { .. }));
    let manager = engine.manager().lock().await;
    assert_eq!(manager.get_task(t).unwrap().status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_engine_collaborator_error_is_failure() {
    let mut m = manager_with(config());
    m.add_agent(writer("Avery", Arc::new(Broken)));
    let t = m.create_task("write", json!({}), 1).unwrap();

    let engine = Engine::new(m);
    let outcome = engine.run_cycle().await.unwrap().remove(0);
    match outcome {
        ExecutionOutcome::Failed { task_id, reason } => {
            assert_eq!(task_id, t);
            assert!(reason.contains("upstream unavailable"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_engine_deadline_frees_agent() {
    let mut m = manager_with(config());
    let a = m.add_agent(writer(
        "Avery",
        Scripted::slow(json!({"success": true}), Duration::from_secs(30)),
    ));
    let t = m.create_task("write", json!({}), 1).unwrap();

    let engine = Engine::new(m).with_deadline(Duration::from_millis(50));
    let outcome = engine.run_cycle().await.unwrap().remove(0);
    assert!(matches!(outcome, ExecutionOutcome::TimedOut { task_id } if task_id == t));

    let manager = engine.manager().lock().await;
    assert!(manager.get_agent(a).unwrap().is_available());
    assert_eq!(manager.get_task(t).unwrap().status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_engine_skips_unassigned_task() {
    let mut m = manager_with(config());
    let t = m.create_task("write", json!({}), 1).unwrap();
    let engine = Engine::new(m);
    let outcome = engine.execute_task(t).await.unwrap();
    assert!(matches!(outcome, ExecutionOutcome::Skipped { .. }));
}

#[tokio::test]
async fn test_bookkeeping_continues_while_collaborator_runs() {
    let mut m = manager_with(config());
    m.add_agent(writer(
        "Avery",
        Scripted::slow(json!({"success": true}), Duration::from_millis(200)),
    ));
    m.create_task("write", json!({}), 1).unwrap();
    let engine = Engine::new(m);

    let running = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run_cycle().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The manager lock is free while the collaborator sleeps.
    let created = {
        let mut manager = engine.manager().lock().await;
        manager.create_task("write", json!({}), 3).unwrap()
    };
    let outcomes = running.await.unwrap().unwrap();
    assert_eq!(outcomes.len(), 1);

    let manager = engine.manager().lock().await;
    assert_eq!(manager.get_task(created).unwrap().status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_failing_review_does_not_strand_later_reviews() {
    let mut m = manager_with(OrgConfig {
        qa_dispatch: QaDispatch::RandomThenFallback,
        ..config()
    });
    m.add_agent(idle_writer("Avery"));
    m.add_agent(idle_writer("Blake"));
    let tasks = [
        m.create_task("write", json!({}), 1).unwrap(),
        m.create_task("write", json!({}), 1).unwrap(),
    ];
    m.assign_tasks();
    for t in tasks {
        let agent = m.get_task(t).unwrap().assigned_to.unwrap();
        assert_eq!(m.complete_task(agent, t, ok()).unwrap(), DispatchOutcome::NoQaAgents);
    }
    let reviewers = ["Quinn", "Riley"]
        .map(|name| m.add_qa_agent(reviewer(name).with_scorer(Arc::new(Overconfident))));
    let engine = Engine::new(m);

    let err = engine.run_cycle().await.unwrap_err();
    assert!(matches!(err, CadreError::Evaluator(_)));

    let manager = engine.manager().lock().await;
    for t in tasks {
        let task = manager.get_task(t).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.qa_status, QaStatus::Pending);
        assert!(task.qa_reviewer.is_none());
    }
    for qa in reviewers {
        let qa_agent = manager.get_qa_agent(qa).unwrap();
        assert!(qa_agent.is_available());
        assert_eq!(qa_agent.agent().metrics().tasks_completed, 1);
    }
}

#[tokio::test]
async fn test_late_failure_from_removed_agent_is_discarded() {
    let mut m = manager_with(config());
    let first = m.add_agent(writer(
        "Avery",
        Scripted::slow(
            json!({"success": false, "error": "draft lost"}),
            Duration::from_millis(100),
        ),
    ));
    let t = m.create_task("write", json!({}), 1).unwrap();
    let engine = Engine::new(m);

    let stale = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run_cycle().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let second = {
        let mut manager = engine.manager().lock().await;
        assert!(manager.remove_agent(first));
        manager.add_agent(writer(
            "Blake",
            Scripted::slow(json!({"success": true}), Duration::from_millis(300)),
        ))
    };
    let replacement = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run_cycle().await })
    };

    let outcomes = stale.await.unwrap().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], ExecutionOutcome::Skipped { task_id } if task_id == t));
    {
        let manager = engine.manager().lock().await;
        let task = manager.get_task(t).unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(task.assigned_to, Some(second));
        assert!(!manager.get_agent(second).unwrap().is_available());
    }

    let outcomes = replacement.await.unwrap().unwrap();
    assert!(matches!(outcomes[0], ExecutionOutcome::Completed { task_id, .. } if task_id == t));
    let manager = engine.manager().lock().await;
    assert_eq!(manager.get_task(t).unwrap().status, TaskStatus::Completed);
    assert_eq!(manager.get_agent(second).unwrap().metrics().success_rate, 1.0);
}
