//! End-to-end tree execution tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use behavior_tree::{
    ActionContext, ActionHandler, ActionHandlerRegistry, BehaviorResult, BehaviorTreeEngine,
    DrainOutcome, ExpressionConfig, ExpressionEvaluator, NodeStatus, NodeTemplate, RuntimeOptions,
    TreeBuilder, TreeRuntime, VarMap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LeafKind {
    SetVar,
    Increment,
    Fail,
    StayRunning,
    SleepSet,
    Broken,
    Control,
}

#[derive(Debug, Clone, Default)]
struct Cfg {
    expression: String,
    var: String,
    value: Option<Value>,
}

impl Cfg {
    fn expr(expression: &str) -> Self {
        Cfg {
            expression: expression.to_string(),
            ..Default::default()
        }
    }

    fn var(name: &str, value: Value) -> Self {
        Cfg {
            var: name.to_string(),
            value: Some(value),
            ..Default::default()
        }
    }

    fn counter(name: &str) -> Self {
        Cfg {
            var: name.to_string(),
            ..Default::default()
        }
    }

    fn none() -> Self {
        Cfg::default()
    }
}

impl ExpressionConfig for Cfg {
    fn expression(&self) -> &str {
        &self.expression
    }
}

/// Understands `true`, `false`, `name` (variable truthiness), and
/// `name >= n`.
struct TestEvaluator;

impl ExpressionEvaluator for TestEvaluator {
    fn evaluate(&self, expression: &str, vars: &VarMap, _node_key: &str) -> anyhow::Result<Value> {
        let expr = expression.trim();
        match expr {
            "" | "false" => return Ok(Value::Bool(false)),
            "true" => return Ok(Value::Bool(true)),
            _ => {}
        }
        if let Some((name, rhs)) = expr.split_once(">=") {
            let lhs = vars.get(name.trim()).and_then(Value::as_i64).unwrap_or(0);
            let rhs: i64 = rhs.trim().parse()?;
            return Ok(Value::Bool(lhs >= rhs));
        }
        if let Some(value) = vars.get(expr) {
            return Ok(value.clone());
        }
        anyhow::bail!("unknown expression: {expr}")
    }
}

struct SetVar;

#[async_trait]
impl ActionHandler<LeafKind, Cfg> for SetVar {
    async fn execute(&self, ctx: ActionContext<LeafKind, Cfg>) -> anyhow::Result<BehaviorResult> {
        let value = ctx.node.config.value.clone().unwrap_or(Value::Bool(true));
        ctx.set_var(ctx.node.config.var.clone(), value);
        Ok(BehaviorResult::Success)
    }
}

struct Increment;

#[async_trait]
impl ActionHandler<LeafKind, Cfg> for Increment {
    async fn execute(&self, ctx: ActionContext<LeafKind, Cfg>) -> anyhow::Result<BehaviorResult> {
        let name = ctx.node.config.var.clone();
        let current = ctx.get_var(&name).and_then(|v| v.as_i64()).unwrap_or(0);
        ctx.set_var(name, json!(current + 1));
        Ok(BehaviorResult::Success)
    }
}

struct AlwaysFail;

#[async_trait]
impl ActionHandler<LeafKind, Cfg> for AlwaysFail {
    async fn execute(&self, _ctx: ActionContext<LeafKind, Cfg>) -> anyhow::Result<BehaviorResult> {
        Ok(BehaviorResult::Failure)
    }
}

struct StayRunning;

#[async_trait]
impl ActionHandler<LeafKind, Cfg> for StayRunning {
    async fn execute(&self, _ctx: ActionContext<LeafKind, Cfg>) -> anyhow::Result<BehaviorResult> {
        Ok(BehaviorResult::Running)
    }
}

struct SleepSet;

#[async_trait]
impl ActionHandler<LeafKind, Cfg> for SleepSet {
    async fn execute(&self, ctx: ActionContext<LeafKind, Cfg>) -> anyhow::Result<BehaviorResult> {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let value = ctx.node.config.value.clone().unwrap_or(Value::Bool(true));
        ctx.set_var(ctx.node.config.var.clone(), value);
        Ok(BehaviorResult::Success)
    }
}

struct Broken;

#[async_trait]
impl ActionHandler<LeafKind, Cfg> for Broken {
    async fn execute(&self, _ctx: ActionContext<LeafKind, Cfg>) -> anyhow::Result<BehaviorResult> {
        anyhow::bail!("handler blew up")
    }
}

fn registry() -> Arc<ActionHandlerRegistry<LeafKind, Cfg>> {
    let mut registry = ActionHandlerRegistry::new();
    registry
        .register(LeafKind::SetVar, Arc::new(SetVar))
        .register(LeafKind::Increment, Arc::new(Increment))
        .register(LeafKind::Fail, Arc::new(AlwaysFail))
        .register(LeafKind::StayRunning, Arc::new(StayRunning))
        .register(LeafKind::SleepSet, Arc::new(SleepSet))
        .register(LeafKind::Broken, Arc::new(Broken));
    Arc::new(registry)
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn runtime(
    template: &NodeTemplate<LeafKind, Cfg>,
    initial_vars: VarMap,
) -> TreeRuntime<LeafKind, Cfg> {
    init_tracing();
    TreeRuntime::new(
        template,
        Arc::new(TestEvaluator),
        initial_vars,
        RuntimeOptions {
            enable_history: true,
        },
    )
}

#[tokio::test]
async fn sequence_runs_all_children_and_succeeds() {
    let mut b = TreeBuilder::new();
    let set_a = b.action(LeafKind::SetVar, Cfg::var("a", json!(1)));
    let set_b = b.action(LeafKind::SetVar, Cfg::var("b", json!(2)));
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![set_a, set_b]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Success);
    assert_eq!(rt.get_var("a"), Some(json!(1)));
    assert_eq!(rt.get_var("b"), Some(json!(2)));
}

#[tokio::test]
async fn sequence_fails_fast_and_omits_the_rest() {
    let mut b = TreeBuilder::new();
    let early = b.action(LeafKind::SetVar, Cfg::var("early", json!(true)));
    let fail = b.action(LeafKind::Fail, Cfg::none());
    let skipped = b.action(LeafKind::SetVar, Cfg::var("late", json!(true)));
    let skipped_key = skipped.key.clone();
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![early, fail, skipped]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Failure);
    assert_eq!(rt.get_var("early"), Some(json!(true)));
    assert_eq!(rt.get_var("late"), None);
    assert_eq!(rt.node(&skipped_key).unwrap().status, NodeStatus::Omitted);
}

#[tokio::test]
async fn selector_stops_at_first_success() {
    let mut b = TreeBuilder::new();
    let fail = b.action(LeafKind::Fail, Cfg::none());
    let second = b.action(LeafKind::SetVar, Cfg::var("second", json!(true)));
    let skipped = b.action(LeafKind::SetVar, Cfg::var("third", json!(true)));
    let skipped_key = skipped.key.clone();
    let tree = b.selector(LeafKind::Control, Cfg::none(), vec![fail, second, skipped]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Success);
    assert_eq!(rt.get_var("second"), Some(json!(true)));
    assert_eq!(rt.get_var("third"), None);
    assert_eq!(rt.node(&skipped_key).unwrap().status, NodeStatus::Omitted);
}

#[tokio::test]
async fn selector_fails_when_every_child_fails() {
    let mut b = TreeBuilder::new();
    let fail_a = b.action(LeafKind::Fail, Cfg::none());
    let fail_b = b.action(LeafKind::Fail, Cfg::none());
    let tree = b.selector(LeafKind::Control, Cfg::none(), vec![fail_a, fail_b]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Failure);
}

#[tokio::test]
async fn condition_gates_a_sequence() {
    let mut b = TreeBuilder::new();
    let gate = b.condition(LeafKind::Control, Cfg::expr("flag"));
    let body = b.action(LeafKind::SetVar, Cfg::var("ran", json!(true)));
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![gate, body]);
    let engine = BehaviorTreeEngine::new(registry());

    let mut closed = runtime(&tree, VarMap::from([("flag".to_string(), json!(false))]));
    let result = engine.run_to_completion(&mut closed).await.unwrap();
    assert_eq!(result, BehaviorResult::Failure);
    assert_eq!(closed.get_var("ran"), None);

    let mut open = runtime(&tree, VarMap::from([("flag".to_string(), json!(true))]));
    let result = engine.run_to_completion(&mut open).await.unwrap();
    assert_eq!(result, BehaviorResult::Success);
    assert_eq!(open.get_var("ran"), Some(json!(true)));
}

#[tokio::test]
async fn until_loops_body_until_condition_holds() {
    let mut b = TreeBuilder::new();
    let body = b.action(LeafKind::Increment, Cfg::counter("count"));
    let tree = b.until(LeafKind::Control, Cfg::expr("count >= 3"), vec![body]);
    let until_key = tree.key.clone();
    let mut rt = runtime(&tree, VarMap::from([("count".to_string(), json!(0))]));
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Success);
    assert_eq!(rt.get_var("count"), Some(json!(3)));

    // The loop guard counts completed body passes in an ordinary variable.
    let guard = rt.get_var(&format!("__until_iterations_{until_key}"));
    assert_eq!(guard, Some(json!(2)));
}

#[tokio::test]
async fn until_aborts_when_body_fails() {
    let mut b = TreeBuilder::new();
    let bump = b.action(LeafKind::Increment, Cfg::counter("count"));
    let fail = b.action(LeafKind::Fail, Cfg::none());
    let tree = b.until(LeafKind::Control, Cfg::expr("false"), vec![bump, fail]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Failure);
    // The body ran exactly once before the failure aborted the loop.
    assert_eq!(rt.get_var("count"), Some(json!(1)));
}

#[tokio::test]
async fn until_succeeds_without_running_body_when_condition_already_holds() {
    let mut b = TreeBuilder::new();
    let body = b.action(LeafKind::Increment, Cfg::counter("count"));
    let body_key = body.key.clone();
    let tree = b.until(LeafKind::Control, Cfg::expr("true"), vec![body]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Success);
    assert_eq!(rt.get_var("count"), None);
    // Finishing from the initial condition check leaves the body untouched.
    assert_eq!(rt.node(&body_key).unwrap().status, NodeStatus::Init);
}

#[tokio::test]
async fn async_leaf_completion_resumes_the_tree() {
    let mut b = TreeBuilder::new();
    let sleeper = b.action(LeafKind::SleepSet, Cfg::var("flag", json!(true)));
    let check = b.condition(LeafKind::Control, Cfg::expr("flag"));
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![sleeper, check]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Success);
    assert_eq!(rt.get_var("flag"), Some(json!(true)));
}

#[tokio::test]
async fn drain_reports_outstanding_leaf_work() {
    let mut b = TreeBuilder::new();
    let sleeper = b.action(LeafKind::SleepSet, Cfg::var("flag", json!(true)));
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![sleeper]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    // The queue empties while the leaf task is still sleeping.
    let outcome = engine.start(&mut rt).await.unwrap();
    assert_eq!(outcome, DrainOutcome::StillRunning);

    assert!(rt.recv_completion().await);
    let outcome = engine.drain(&mut rt).await.unwrap();
    assert_eq!(outcome, DrainOutcome::Idle);
    assert_eq!(rt.result(), BehaviorResult::Success);
}

#[tokio::test]
async fn running_leaf_stalls_a_sequence() {
    let mut b = TreeBuilder::new();
    let running = b.action(LeafKind::StayRunning, Cfg::none());
    let running_key = running.key.clone();
    let after = b.action(LeafKind::SetVar, Cfg::var("after", json!(true)));
    let after_key = after.key.clone();
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![running, after]);
    let root_key = tree.key.clone();
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    // The sequence drops the Running notification: the leaf settles as
    // Failure, the next sibling never runs, and the pass stalls.
    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Running);
    assert_eq!(rt.node(&running_key).unwrap().status, NodeStatus::Failure);
    assert_eq!(rt.node(&after_key).unwrap().status, NodeStatus::Init);
    assert_eq!(rt.node(&root_key).unwrap().status, NodeStatus::Started);
    assert_eq!(rt.get_var("after"), None);
}

#[tokio::test]
async fn running_leaf_stalls_a_selector() {
    let mut b = TreeBuilder::new();
    let running = b.action(LeafKind::StayRunning, Cfg::none());
    let fallback = b.action(LeafKind::SetVar, Cfg::var("fallback", json!(true)));
    let tree = b.selector(LeafKind::Control, Cfg::none(), vec![running, fallback]);
    let root_key = tree.key.clone();
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    // Running is neither a selector success nor a failure to skip past.
    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Running);
    assert_eq!(rt.node(&root_key).unwrap().status, NodeStatus::Started);
    assert_eq!(rt.get_var("fallback"), None);
}

#[tokio::test]
async fn until_drives_past_a_running_body() {
    let mut b = TreeBuilder::new();
    let running = b.action(LeafKind::StayRunning, Cfg::none());
    let done = b.action(LeafKind::SetVar, Cfg::var("done", json!(true)));
    let tree = b.until(LeafKind::Control, Cfg::expr("done"), vec![running, done]);
    let mut rt = runtime(&tree, VarMap::from([("done".to_string(), json!(false))]));
    let engine = BehaviorTreeEngine::new(registry());

    // Unlike the composites, Until re-checks its condition on a Running
    // child and keeps the loop moving.
    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Success);
    assert_eq!(rt.get_var("done"), Some(json!(true)));
}

#[tokio::test]
async fn missing_handler_fails_the_action() {
    let mut b = TreeBuilder::new();
    // Control has no registered handler.
    let orphan = b.action(LeafKind::Control, Cfg::none());
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![orphan]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Failure);
    assert!(!rt.errors().is_empty());
}

#[tokio::test]
async fn handler_error_becomes_failure() {
    let mut b = TreeBuilder::new();
    let broken = b.action(LeafKind::Broken, Cfg::none());
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![broken]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Failure);
}

#[tokio::test]
async fn condition_evaluation_error_counts_as_false() {
    let mut b = TreeBuilder::new();
    let bogus = b.condition(LeafKind::Control, Cfg::expr("no_such_thing!!"));
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![bogus]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Failure);
    assert_eq!(rt.errors().len(), 1);
}

#[tokio::test]
async fn rerun_resets_variables_and_statuses() {
    let mut b = TreeBuilder::new();
    let bump = b.action(LeafKind::Increment, Cfg::counter("count"));
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![bump]);
    let mut rt = runtime(&tree, VarMap::from([("count".to_string(), json!(0))]));
    let engine = BehaviorTreeEngine::new(registry());

    let first = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(first, BehaviorResult::Success);
    assert_eq!(rt.get_var("count"), Some(json!(1)));

    // Each pass starts from the initial variables, not the previous pass.
    let second = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(second, BehaviorResult::Success);
    assert_eq!(rt.get_var("count"), Some(json!(1)));
}

#[tokio::test]
async fn history_records_processed_commands() {
    let mut b = TreeBuilder::new();
    let check = b.condition(LeafKind::Control, Cfg::expr("true"));
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![check]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    engine.run_to_completion(&mut rt).await.unwrap();
    // Visit root, visit condition, finish leaf, finish child.
    assert_eq!(rt.history().len(), 4);
}

#[tokio::test]
async fn commands_for_unknown_nodes_are_dropped() {
    let mut b = TreeBuilder::new();
    let check = b.condition(LeafKind::Control, Cfg::expr("true"));
    let tree = b.sequence(LeafKind::Control, Cfg::none(), vec![check]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    rt.initialize_state();
    rt.push_command(behavior_tree::Command::visit("no_such_node"));
    rt.push_command(behavior_tree::Command::visit(rt.root_key().to_string()));

    // The dangling command is dropped and the rest of the pass proceeds.
    let outcome = engine.drain(&mut rt).await.unwrap();
    assert_eq!(outcome, DrainOutcome::Idle);
    assert_eq!(rt.result(), BehaviorResult::Success);
}

#[tokio::test]
async fn nested_composites_resolve_bottom_up() {
    let mut b = TreeBuilder::new();
    let closed_gate = b.condition(LeafKind::Control, Cfg::expr("false"));
    let unreached = b.action(LeafKind::SetVar, Cfg::var("unreached", json!(true)));
    let first = b.sequence(LeafKind::Control, Cfg::none(), vec![closed_gate, unreached]);

    let open_gate = b.condition(LeafKind::Control, Cfg::expr("true"));
    let reached = b.action(LeafKind::SetVar, Cfg::var("reached", json!(true)));
    let second = b.sequence(LeafKind::Control, Cfg::none(), vec![open_gate, reached]);

    let tree = b.selector(LeafKind::Control, Cfg::none(), vec![first, second]);
    let mut rt = runtime(&tree, VarMap::new());
    let engine = BehaviorTreeEngine::new(registry());

    let result = engine.run_to_completion(&mut rt).await.unwrap();
    assert_eq!(result, BehaviorResult::Success);
    assert_eq!(rt.get_var("unreached"), None);
    assert_eq!(rt.get_var("reached"), Some(json!(true)));
}
