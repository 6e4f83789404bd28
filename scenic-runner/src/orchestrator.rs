//! Scenario orchestration -- option resolution, discovery, and tree building.
//!
//! The [`Orchestrator`] is the central coordinator of a scenic run.
//! One call to [`Orchestrator::discover`] is one discovery pass:
//!
//! 1. **Configure** -- merge the options file, environment, system
//!    properties, and suite options into [`EffectiveOptions`].
//! 2. **Discover** -- ask the engine for features (in the order it returns
//!    them) and keep the pickles that pass the tag/name filters, up to the
//!    configured limit.
//! 3. **Build tree** -- produce the run-level and per-feature nodes.
//!
//! Failures in these steps are fatal to the whole run. Once the tree is
//! built, every failure is reported on the leaf that hit it.
//!
//! # Tree Shape
//!
//! ```text
//! Start Run
//! Before All
//! <feature name>            (container, omitted when no scenario survives)
//!   Start Feature
//!   <scenario name> ...     (one leaf per surviving pickle)
//! After All
//! Finish Run
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;

use scenic_core::config::{
    DEFAULT_OPTIONS_FILE, EffectiveOptions, OptionLayers, PartialOptions, SuiteOptions,
    SystemProperties,
};
use scenic_core::container::Container;
use scenic_core::engine::{DynScenarioEngine, EventBus, Feature, event_bus_for};
use scenic_core::error::{ConfigError, ScenicError};
use scenic_core::event::LifecyclePhase;
use scenic_core::metrics as m;
use scenic_core::notifier::{LifecycleNotifier, ObserverBus, ScenarioObserver};
use scenic_core::tags::Filters;
use scenic_core::tree::{DynamicContainer, DynamicTest, SourceLocation, TestFailure, TestNode};

use crate::execution::ScenarioExecution;
use crate::runner::{RunReport, run_tree_with};

pub const START_RUN: &str = "Start Run";
pub const BEFORE_ALL: &str = "Before All";
pub const START_FEATURE: &str = "Start Feature";
pub const AFTER_ALL: &str = "After All";
pub const FINISH_RUN: &str = "Finish Run";

/// Glue namespace used when no layer names one and no caller namespace is given.
pub const DEFAULT_CALLER_NAMESPACE: &str = "crate";

/// Where the environment layer comes from.
#[derive(Debug, Clone)]
enum EnvironmentSource {
    Process,
    Snapshot(Vec<(String, String)>),
    Disabled,
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    engine: Option<Arc<dyn DynScenarioEngine>>,
    container: Option<Arc<Container>>,
    observers: Arc<ObserverBus>,
    caller_namespace: String,
    suite: Option<SuiteOptions>,
    system: SystemProperties,
    options_file: Option<PathBuf>,
    environment: EnvironmentSource,
}

impl OrchestratorBuilder {
    fn new() -> Self {
        Self {
            engine: None,
            container: None,
            observers: Arc::new(ObserverBus::new()),
            caller_namespace: DEFAULT_CALLER_NAMESPACE.to_owned(),
            suite: None,
            system: SystemProperties::new(),
            options_file: Some(PathBuf::from(DEFAULT_OPTIONS_FILE)),
            environment: EnvironmentSource::Process,
        }
    }

    /// The external scenario engine (required).
    pub fn engine(mut self, engine: Arc<dyn DynScenarioEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Bean container used to resolve step definitions. Defaults to an empty one.
    pub fn container(mut self, container: Arc<Container>) -> Self {
        self.container = Some(container);
        self
    }

    /// Namespace used as the default glue path (usually `module_path!()`).
    pub fn caller_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.caller_namespace = namespace.into();
        self
    }

    /// Options declared by the suite itself (highest precedence layer).
    pub fn suite_options(mut self, suite: SuiteOptions) -> Self {
        self.suite = Some(suite);
        self
    }

    pub fn system_properties(mut self, properties: SystemProperties) -> Self {
        self.system = properties;
        self
    }

    /// Options file path. A missing file is treated as an absent layer.
    pub fn options_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.options_file = Some(path.into());
        self
    }

    /// Skip the options file layer entirely.
    pub fn without_options_file(mut self) -> Self {
        self.options_file = None;
        self
    }

    /// Use a fixed environment snapshot instead of the process environment.
    pub fn environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = EnvironmentSource::Snapshot(
            vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        );
        self
    }

    /// Skip the environment layer entirely.
    pub fn without_environment(mut self) -> Self {
        self.environment = EnvironmentSource::Disabled;
        self
    }

    /// Register a lifecycle observer for one phase.
    pub fn observer(self, phase: LifecyclePhase, observer: impl ScenarioObserver + 'static) -> Self {
        self.observers.observe(phase, observer);
        self
    }

    /// Share an existing observer bus instead of the builder's own.
    pub fn observer_bus(mut self, bus: Arc<ObserverBus>) -> Self {
        self.observers = bus;
        self
    }

    pub fn build(self) -> Result<Orchestrator, ScenicError> {
        let engine = self.engine.ok_or_else(|| ConfigError::InvalidValue {
            field: "engine".to_owned(),
            reason: "a scenario engine is required".to_owned(),
        })?;
        let container = self
            .container
            .unwrap_or_else(|| Container::builder().build());

        Ok(Orchestrator {
            engine,
            container,
            notifier: LifecycleNotifier::new(self.observers),
            caller_namespace: self.caller_namespace,
            suite: self.suite,
            system: self.system,
            options_file: self.options_file,
            environment: self.environment,
        })
    }
}

/// Result of one discovery pass.
pub struct DiscoveryPlan {
    pub options: Arc<EffectiveOptions>,
    pub nodes: Vec<TestNode>,
}

/// Coordinates one scenic run: options, discovery, and tree building.
pub struct Orchestrator {
    engine: Arc<dyn DynScenarioEngine>,
    container: Arc<Container>,
    notifier: LifecycleNotifier,
    caller_namespace: String,
    suite: Option<SuiteOptions>,
    system: SystemProperties,
    options_file: Option<PathBuf>,
    environment: EnvironmentSource,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Merge every configured layer into the effective options.
    pub async fn resolve_options(&self) -> Result<EffectiveOptions, ScenicError> {
        let file = match &self.options_file {
            Some(path) => load_options_file(path).await?,
            None => None,
        };
        let environment = match &self.environment {
            EnvironmentSource::Process => Some(PartialOptions::from_env()),
            EnvironmentSource::Snapshot(vars) => Some(PartialOptions::from_env_vars(
                vars.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            )),
            EnvironmentSource::Disabled => None,
        };
        let layers = OptionLayers {
            file,
            environment,
            system: Some(self.system.to_partial()),
            suite: self.suite.as_ref().map(SuiteOptions::to_partial),
        };

        let options = layers.resolve(&self.caller_namespace)?;
        tracing::debug!(
            features = ?options.feature_paths,
            glue = ?options.glue,
            threads = options.threads,
            "options resolved"
        );
        Ok(options)
    }

    /// Run one discovery pass and return the test tree.
    pub async fn discover(&self) -> Result<Vec<TestNode>, ScenicError> {
        Ok(self.plan().await?.nodes)
    }

    /// Run one discovery pass, keeping the effective options alongside the tree.
    pub async fn plan(&self) -> Result<DiscoveryPlan, ScenicError> {
        let options = Arc::new(self.resolve_options().await?);
        let filters = Filters::from_options(&options)?;

        let features = self.engine.discover(&options).await?;
        let features = select_pickles(features, &filters);
        let selected: usize = features.iter().map(|f| f.pickles.len()).sum();
        counter!(m::PICKLES_SELECTED_TOTAL).increment(selected as u64);
        tracing::info!(
            features = features.len(),
            scenarios = selected,
            "discovery complete"
        );

        let bus = event_bus_for(&options);
        let nodes = self.build_tree(features, &options, &bus);
        Ok(DiscoveryPlan { options, nodes })
    }

    /// Discover and run the whole tree, using `threads` workers for scenario leaves.
    pub async fn run(&self) -> Result<RunReport, ScenicError> {
        let plan = self.plan().await?;
        Ok(run_tree_with(plan.nodes, plan.options.threads).await)
    }

    fn build_tree(
        &self,
        features: Vec<Feature>,
        options: &Arc<EffectiveOptions>,
        bus: &Arc<dyn EventBus>,
    ) -> Vec<TestNode> {
        let mut nodes = Vec::with_capacity(features.len() + 4);
        nodes.push(self.run_leaf(START_RUN, |engine| engine.start_run()).into());
        nodes.push(self.run_leaf(BEFORE_ALL, |engine| engine.before_all()).into());

        for feature in features {
            let mut children: Vec<TestNode> = Vec::with_capacity(feature.pickles.len() + 1);
            children.push(self.start_feature_leaf(&feature).into());
            for pickle in &feature.pickles {
                let source = SourceLocation::at_line(&pickle.uri, pickle.line);
                let execution = ScenarioExecution::new(
                    Arc::clone(&self.engine),
                    Arc::clone(&self.container),
                    self.notifier.clone(),
                    Arc::clone(bus),
                    Arc::clone(options),
                    pickle.clone(),
                );
                let leaf = DynamicTest::from_fn(pickle.name.clone(), move || execution.run())
                    .with_source(source);
                children.push(leaf.into());
            }

            if children.len() < 2 {
                tracing::debug!(uri = %feature.uri, "no scenarios selected, omitting feature");
                continue;
            }
            let container = DynamicContainer::new(feature.name.clone(), children)
                .with_source(SourceLocation::new(&feature.uri));
            nodes.push(container.into());
        }

        nodes.push(self.run_leaf(AFTER_ALL, |engine| engine.after_all()).into());
        nodes.push(self.run_leaf(FINISH_RUN, |engine| engine.finish_run()).into());
        nodes
    }

    /// A run-level leaf that invokes one engine phase.
    fn run_leaf<F>(&self, name: &'static str, phase: F) -> DynamicTest
    where
        F: for<'a> FnOnce(
                &'a dyn DynScenarioEngine,
            ) -> scenic_core::BoxFuture<'a, Result<(), ScenicError>>
            + Send
            + 'static,
    {
        let engine = Arc::clone(&self.engine);
        DynamicTest::from_fn(name, move || async move {
            tracing::debug!(phase = name, "running engine phase");
            phase(engine.as_ref()).await.map_err(TestFailure::from_error)
        })
    }

    fn start_feature_leaf(&self, feature: &Feature) -> DynamicTest {
        let engine = Arc::clone(&self.engine);
        let header = Feature {
            pickles: Vec::new(),
            ..feature.clone()
        };
        DynamicTest::from_fn(START_FEATURE, move || async move {
            engine
                .before_feature(&header)
                .await
                .map_err(TestFailure::from_error)
        })
        .with_source(SourceLocation::at_line(&feature.uri, feature.line))
    }
}

async fn load_options_file(path: &Path) -> Result<Option<PartialOptions>, ScenicError> {
    let layer = PartialOptions::load_file(path).await?;
    if layer.is_some() {
        tracing::debug!(path = %path.display(), "options file loaded");
    }
    Ok(layer)
}

/// Apply the filters to every feature in discovery order, capping the total at the limit.
fn select_pickles(features: Vec<Feature>, filters: &Filters) -> Vec<Feature> {
    let mut remaining = filters.limit().unwrap_or(usize::MAX);
    features
        .into_iter()
        .map(|mut feature| {
            feature.pickles.retain(|pickle| {
                if remaining == 0 || !filters.accepts(&pickle.name, &pickle.tags) {
                    return false;
                }
                remaining -= 1;
                true
            });
            feature
        })
        .collect()
}
