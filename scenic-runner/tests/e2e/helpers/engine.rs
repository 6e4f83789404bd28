//! Scripted scenario engine for E2E tests.
//!
//! Step behavior is driven by the step text and pickle tags:
//! - a step whose text starts with `fail` fails with `assertion failed`
//! - a step whose text starts with `undefined` is undefined
//! - steps after the first non-passed step are skipped
//! - `@hook-fails` fails a before hook located at `hooks::reset_db`
//! - `@engine-crash` makes `run_pickle` return an error without events
//! - `wip` in the run options is logged as `engine:wip:<name>`
//! - `@engine-abandons` starts the scenario, then errors before finishing it
//!
//! Every scenario resolves a [`World`] bean from the object factory, so
//! teardown of the scenario scope shows up in the log as `teardown:<name>`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use scenic_core::container::{BeanContext, Container};
use scenic_core::engine::{
    EngineEvent, Feature, Pickle, RunContext, ScenarioEngine, StepFinished, StepRef,
};
use scenic_core::error::{BoxError, DiscoveryError, EngineError, ScenicError};
use scenic_core::event::ScenarioOutcome;
use scenic_core::EffectiveOptions;

use super::log::EventLog;

/// Per-scenario step definitions bean.
#[derive(Debug, Default)]
pub struct World {
    scenario: Arc<Mutex<Option<String>>>,
}

impl World {
    fn enter(&self, name: &str) {
        *self.scenario.lock() = Some(name.to_owned());
    }
}

/// Container with a scenario-scoped [`World`] whose release is logged.
pub fn world_container(log: &EventLog) -> Arc<Container> {
    let log = log.clone();
    Container::builder()
        .step_definitions_with(move |cx: &BeanContext<'_>| -> Result<World, BoxError> {
            let world = World::default();
            let scenario = Arc::clone(&world.scenario);
            let log = log.clone();
            cx.on_release(move || {
                let name = scenario.lock().clone().unwrap_or_default();
                log.push(format!("teardown:{name}"));
            });
            Ok(world)
        })
        .build()
}

/// Engine that replays scripted features.
pub struct FakeEngine {
    features: Vec<Feature>,
    log: EventLog,
    discover_error: Option<String>,
    step_delay: Option<Duration>,
}

#[allow(dead_code)]
impl FakeEngine {
    pub fn new(log: &EventLog) -> Self {
        Self {
            features: Vec::new(),
            log: log.clone(),
            discover_error: None,
            step_delay: None,
        }
    }

    pub fn feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Make discovery fail as if `path` did not exist.
    pub fn missing_path(mut self, path: impl Into<String>) -> Self {
        self.discover_error = Some(path.into());
        self
    }

    /// Sleep before every step to let concurrent scenarios interleave.
    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = Some(delay);
        self
    }

    fn status_of(text: &str) -> ScenarioOutcome {
        if text.starts_with("fail") {
            ScenarioOutcome::Failed
        } else if text.starts_with("undefined") {
            ScenarioOutcome::Undefined
        } else {
            ScenarioOutcome::Passed
        }
    }
}

/// Keeps the first publish error, like an engine that reports but does not stop.
fn publish(ctx: &RunContext, event: &EngineEvent, first_error: &mut Option<ScenicError>) {
    if let Err(e) = ctx.bus.publish(event) {
        first_error.get_or_insert(e);
    }
}

impl ScenarioEngine for FakeEngine {
    async fn discover(&self, options: &EffectiveOptions) -> Result<Vec<Feature>, ScenicError> {
        if let Some(path) = &self.discover_error {
            return Err(DiscoveryError::PathNotFound { path: path.clone() }.into());
        }
        self.log
            .push(format!("discover:{}", options.feature_paths.join(",")));
        Ok(self.features.clone())
    }

    async fn start_run(&self) -> Result<(), ScenicError> {
        self.log.push("engine:start-run");
        Ok(())
    }

    async fn before_all(&self) -> Result<(), ScenicError> {
        self.log.push("engine:before-all");
        Ok(())
    }

    async fn before_feature(&self, feature: &Feature) -> Result<(), ScenicError> {
        self.log.push(format!("engine:feature:{}", feature.name));
        Ok(())
    }

    async fn run_pickle(&self, pickle: &Pickle, ctx: RunContext) -> Result<(), ScenicError> {
        let identity = pickle.identity();
        if identity.has_tag("@engine-crash") {
            return Err(EngineError::Execution {
                reason: format!("engine crashed running '{}'", pickle.name),
            }
            .into());
        }

        let world = ctx.objects.get::<World>()?;
        world.enter(&pickle.name);

        let mut first_error = None;
        publish(
            &ctx,
            &EngineEvent::ScenarioStarted {
                pickle_id: pickle.id,
                identity: identity.clone(),
            },
            &mut first_error,
        );
        self.log.push(format!("engine:run:{}", pickle.name));
        if ctx.options.wip {
            self.log.push(format!("engine:wip:{}", pickle.name));
        }

        if identity.has_tag("@engine-abandons") {
            return Err(EngineError::Execution {
                reason: format!("engine lost '{}' mid-run", pickle.name),
            }
            .into());
        }

        let mut outcome = ScenarioOutcome::Passed;
        if identity.has_tag("@hook-fails") {
            outcome = ScenarioOutcome::Failed;
            publish(
                &ctx,
                &EngineEvent::StepFinished(StepFinished {
                    pickle_id: pickle.id,
                    step: StepRef::Hook {
                        name: "reset_db".to_owned(),
                        location: "hooks::reset_db".to_owned(),
                    },
                    status: ScenarioOutcome::Failed,
                    error: Some("database unavailable".to_owned()),
                }),
                &mut first_error,
            );
        }

        for step in &pickle.steps {
            if let Some(delay) = self.step_delay {
                tokio::time::sleep(delay).await;
            }
            let status = if outcome.is_passed() {
                Self::status_of(&step.text)
            } else {
                ScenarioOutcome::Skipped
            };
            if outcome.is_passed() && !status.is_passed() {
                outcome = status;
            }
            publish(
                &ctx,
                &EngineEvent::StepFinished(StepFinished {
                    pickle_id: pickle.id,
                    step: StepRef::Step {
                        text: step.text.clone(),
                        line: step.line,
                    },
                    status,
                    error: (status == ScenarioOutcome::Failed)
                        .then(|| "assertion failed".to_owned()),
                }),
                &mut first_error,
            );
        }

        if first_error.is_some() {
            outcome = ScenarioOutcome::Failed;
        }
        publish(
            &ctx,
            &EngineEvent::ScenarioFinished {
                pickle_id: pickle.id,
                identity,
                outcome,
            },
            &mut first_error,
        );
        self.log.push(format!("engine:done:{}", pickle.name));

        first_error.map_or(Ok(()), Err)
    }

    async fn after_all(&self) -> Result<(), ScenicError> {
        self.log.push("engine:after-all");
        Ok(())
    }

    async fn finish_run(&self) -> Result<(), ScenicError> {
        self.log.push("engine:finish-run");
        Ok(())
    }
}

/// Feature at `uri` with one pickle per `(name, line, tags, steps)` entry.
///
/// Steps are placed on the lines following the scenario line.
pub fn feature(uri: &str, name: &str, scenarios: &[(&str, u32, &[&str], &[&str])]) -> Feature {
    scenarios
        .iter()
        .fold(Feature::new(uri, name), |feature, (scenario, line, tags, steps)| {
            let pickle = steps.iter().enumerate().fold(
                Pickle::new(*scenario, uri, *line).with_tags(tags.iter().copied()),
                |pickle, (i, text)| pickle.with_step(*text, *line + 1 + i as u32),
            );
            feature.with_pickle(pickle)
        })
}
