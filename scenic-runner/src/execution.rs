//! Per-scenario execution -- the action behind every scenario leaf.
//!
//! A [`ScenarioExecution`] bridges one pickle run on the push-based engine
//! into a single pass/fail result for the pull-based test tree:
//!
//! 1. Activate a fresh scenario scope and object factory.
//! 2. Subscribe three handlers filtered to this pickle's id:
//!    - scenario-started: `notify_before`
//!    - scenario-finished: `notify_after`, then `destroy_all` on the scope
//!    - step-finished: record the first non-passed step
//! 3. Run the pickle on the engine and wait for it to complete.
//! 4. Drop the subscriptions (also on every early-return and panic path).
//!    If the engine returned without finishing the scenario, tear down the
//!    scope here unless the BEFORE notification failed.
//! 5. Convert the first recorded handler error, engine error, or failed
//!    step into a [`TestFailure`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use metrics::counter;
use parking_lot::Mutex;

use scenic_core::container::{Container, ObjectFactory};
use scenic_core::engine::{
    DynScenarioEngine, EngineEvent, EventBus, EventHandler, EventKind, Pickle, RunContext,
    StepFinished, StepRef, Subscription,
};
use scenic_core::error::{EngineError, ScenicError};
use scenic_core::metrics as m;
use scenic_core::notifier::LifecycleNotifier;
use scenic_core::scope::ScopeContext;
use scenic_core::tree::{FailureLocation, TestFailure};
use scenic_core::EffectiveOptions;

/// Everything one scenario leaf needs to run its pickle.
pub struct ScenarioExecution {
    engine: Arc<dyn DynScenarioEngine>,
    container: Arc<Container>,
    notifier: LifecycleNotifier,
    bus: Arc<dyn EventBus>,
    options: Arc<EffectiveOptions>,
    pickle: Pickle,
}

/// State shared between the leaf and its event handlers.
#[derive(Default)]
struct ExecutionState {
    /// Set when the BEFORE notification failed; the finish handler then
    /// skips the AFTER notification and scope teardown.
    before_failed: AtomicBool,
    /// Set once the scenario-finished handler has run.
    finished: AtomicBool,
    /// The first error raised inside a handler, kept with its cause chain.
    handler_error: Mutex<Option<ScenicError>>,
    /// The first non-passed step result.
    first_failure: OnceLock<StepFinished>,
}

impl ExecutionState {
    /// Keep the first handler error and hand the engine a summary of it.
    fn abort(&self, error: ScenicError) -> ScenicError {
        let reason = error.to_string();
        let mut slot = self.handler_error.lock();
        if slot.is_none() {
            *slot = Some(error);
        }
        EngineError::Aborted { reason }.into()
    }

    fn take_handler_error(&self) -> Option<ScenicError> {
        self.handler_error.lock().take()
    }
}

impl ScenarioExecution {
    pub fn new(
        engine: Arc<dyn DynScenarioEngine>,
        container: Arc<Container>,
        notifier: LifecycleNotifier,
        bus: Arc<dyn EventBus>,
        options: Arc<EffectiveOptions>,
        pickle: Pickle,
    ) -> Self {
        Self {
            engine,
            container,
            notifier,
            bus,
            options,
            pickle,
        }
    }

    pub fn pickle(&self) -> &Pickle {
        &self.pickle
    }

    /// Run the pickle and report the leaf result.
    pub async fn run(self) -> Result<(), TestFailure> {
        let pickle_id = self.pickle.id;
        tracing::info!(
            scenario = %self.pickle.name,
            uri = %self.pickle.uri,
            line = self.pickle.line,
            "running scenario"
        );

        let scope = self.container.activate_scenario_scope();
        let objects: Arc<dyn ObjectFactory> =
            Arc::new(self.container.object_factory(Arc::clone(&scope)));
        let state = Arc::new(ExecutionState::default());

        let subscriptions = [
            Subscription::new(
                &self.bus,
                EventKind::ScenarioStarted,
                Some(pickle_id),
                started_handler(self.notifier.clone(), Arc::clone(&state)),
            ),
            Subscription::new(
                &self.bus,
                EventKind::ScenarioFinished,
                Some(pickle_id),
                finished_handler(self.notifier.clone(), Arc::clone(&scope), Arc::clone(&state)),
            ),
            Subscription::new(
                &self.bus,
                EventKind::StepFinished,
                Some(pickle_id),
                step_handler(Arc::clone(&state)),
            ),
        ];

        let ctx = RunContext {
            bus: Arc::clone(&self.bus),
            objects,
            options: Arc::clone(&self.options),
        };
        let engine_result = self.engine.run_pickle(&self.pickle, ctx).await;
        drop(subscriptions);
        release_unfinished_scope(&state, scope.as_ref(), &self.pickle);

        let result = self.conclude(&state, engine_result);
        if let Err(failure) = &result {
            counter!(m::SCENARIOS_FAILED_TOTAL).increment(1);
            tracing::warn!(
                scenario = %self.pickle.name,
                error = %failure,
                "scenario failed"
            );
        }
        result
    }

    fn conclude(
        &self,
        state: &ExecutionState,
        engine_result: Result<(), ScenicError>,
    ) -> Result<(), TestFailure> {
        if let Some(error) = state.take_handler_error() {
            return Err(TestFailure::from_error(error));
        }
        engine_result.map_err(TestFailure::from_error)?;

        match state.first_failure.get() {
            Some(step) => Err(self.step_failure(step)),
            None => Ok(()),
        }
    }

    fn step_failure(&self, step: &StepFinished) -> TestFailure {
        let location = match &step.step {
            StepRef::Step { line, .. } => FailureLocation::FeatureLine {
                uri: self.pickle.uri.clone(),
                line: *line,
            },
            StepRef::Hook { location, .. } => FailureLocation::Code {
                location: location.clone(),
            },
        };
        TestFailure::at(location, step.status, step.error.as_deref())
    }
}

/// Tear down the scope when the engine returned without finishing the scenario.
///
/// A failed BEFORE notification still skips teardown.
fn release_unfinished_scope(state: &ExecutionState, scope: &dyn ScopeContext, pickle: &Pickle) {
    if state.finished.load(Ordering::SeqCst) || state.before_failed.load(Ordering::SeqCst) {
        return;
    }
    if scope.is_active() {
        tracing::debug!(
            scenario = %pickle.name,
            "scenario did not finish, releasing scope"
        );
        scope.destroy_all();
    }
}

fn started_handler(notifier: LifecycleNotifier, state: Arc<ExecutionState>) -> EventHandler {
    Arc::new(move |event: &EngineEvent| {
        let EngineEvent::ScenarioStarted { identity, .. } = event else {
            return Ok(());
        };
        notifier.notify_before(identity).map_err(|e| {
            state.before_failed.store(true, Ordering::SeqCst);
            state.abort(e)
        })
    })
}

fn finished_handler(
    notifier: LifecycleNotifier,
    scope: Arc<dyn ScopeContext>,
    state: Arc<ExecutionState>,
) -> EventHandler {
    Arc::new(move |event: &EngineEvent| {
        let EngineEvent::ScenarioFinished {
            identity, outcome, ..
        } = event
        else {
            return Ok(());
        };
        state.finished.store(true, Ordering::SeqCst);
        counter!(m::SCENARIOS_EXECUTED_TOTAL, m::LABEL_OUTCOME => outcome.as_str()).increment(1);

        if state.before_failed.load(Ordering::SeqCst) {
            tracing::debug!(
                scenario = %identity.name,
                "before notification failed, skipping after notification and teardown"
            );
            return Ok(());
        }

        let notified = notifier.notify_after(identity, *outcome);
        // teardown strictly after the AFTER notification has returned
        if scope.is_active() {
            scope.destroy_all();
        }
        notified.map_err(|e| state.abort(e))
    })
}

fn step_handler(state: Arc<ExecutionState>) -> EventHandler {
    Arc::new(move |event: &EngineEvent| {
        let EngineEvent::StepFinished(step) = event else {
            return Ok(());
        };
        if !step.is_passed() && state.first_failure.set(step.clone()).is_ok() {
            tracing::debug!(status = %step.status, "recorded first non-passed step");
        }
        Ok(())
    })
}
