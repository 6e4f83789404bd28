//! 외부 시나리오 엔진 경계
//!
//! 엔진은 피처를 탐색하고 피클(시나리오) 하나를 실행하면서
//! [`EngineEvent`]를 호출자가 넘긴 [`EventBus`]에 발행합니다.
//!
//! # 이벤트 흐름
//! ```text
//! run_pickle(pickle, ctx)
//!   → ScenarioStarted
//!   → StepFinished × N   (스텝 또는 훅)
//!   → ScenarioFinished
//! ```
//!
//! 모든 이벤트는 피클 id를 가지며, 구독은 특정 피클 id로 필터링됩니다.
//! 따라서 여러 시나리오가 동시에 실행되어도 핸들러는 자신을 등록한
//! 시나리오의 이벤트만 봅니다.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::config::EffectiveOptions;
use crate::container::ObjectFactory;
use crate::error::ScenicError;
use crate::event::{ScenarioIdentity, ScenarioOutcome};

/// `Send` 가능한 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ─── 피처 / 피클 ─────────────────────────────────────────────────────

/// 피클의 스텝 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickleStep {
    pub text: String,
    pub line: u32,
}

/// 실행 단위 시나리오
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pickle {
    pub id: Uuid,
    pub name: String,
    pub uri: String,
    pub line: u32,
    pub tags: Vec<String>,
    pub steps: Vec<PickleStep>,
}

impl Pickle {
    /// 새 id로 피클을 만듭니다.
    pub fn new(name: impl Into<String>, uri: impl Into<String>, line: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            uri: uri.into(),
            line,
            tags: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_step(mut self, text: impl Into<String>, line: u32) -> Self {
        self.steps.push(PickleStep {
            text: text.into(),
            line,
        });
        self
    }

    /// 이 피클의 시나리오 식별 정보
    pub fn identity(&self) -> ScenarioIdentity {
        ScenarioIdentity::new(&self.name, &self.uri, self.line).with_tags(self.tags.iter().cloned())
    }
}

/// 피처 소스 하나와 그 안의 피클 목록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub uri: String,
    pub name: String,
    pub line: u32,
    pub pickles: Vec<Pickle>,
}

impl Feature {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            line: 1,
            pickles: Vec::new(),
        }
    }

    pub fn with_pickle(mut self, pickle: Pickle) -> Self {
        self.pickles.push(pickle);
        self
    }
}

// ─── 엔진 이벤트 ─────────────────────────────────────────────────────

/// 구독 단위 이벤트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ScenarioStarted,
    StepFinished,
    ScenarioFinished,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScenarioStarted => write!(f, "scenario-started"),
            Self::StepFinished => write!(f, "step-finished"),
            Self::ScenarioFinished => write!(f, "scenario-finished"),
        }
    }
}

/// 완료된 테스트 스텝의 출처
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepRef {
    /// 피처 파일의 구체적인 스텝
    Step { text: String, line: u32 },
    /// 훅 (before/after 등). `location`은 코드 위치 설명입니다.
    Hook { name: String, location: String },
}

/// 스텝 완료 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFinished {
    pub pickle_id: Uuid,
    pub step: StepRef,
    pub status: ScenarioOutcome,
    /// 실패 메시지 (있을 경우)
    pub error: Option<String>,
}

impl StepFinished {
    pub fn is_passed(&self) -> bool {
        self.status.is_passed()
    }
}

/// 엔진이 발행하는 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    ScenarioStarted {
        pickle_id: Uuid,
        identity: ScenarioIdentity,
    },
    StepFinished(StepFinished),
    ScenarioFinished {
        pickle_id: Uuid,
        identity: ScenarioIdentity,
        outcome: ScenarioOutcome,
    },
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ScenarioStarted { .. } => EventKind::ScenarioStarted,
            Self::StepFinished(_) => EventKind::StepFinished,
            Self::ScenarioFinished { .. } => EventKind::ScenarioFinished,
        }
    }

    pub fn pickle_id(&self) -> Uuid {
        match self {
            Self::ScenarioStarted { pickle_id, .. } | Self::ScenarioFinished { pickle_id, .. } => {
                *pickle_id
            }
            Self::StepFinished(step) => step.pickle_id,
        }
    }
}

// ─── 이벤트 버스 ─────────────────────────────────────────────────────

/// 이벤트 핸들러. 실패를 반환하면 발행이 중단되고 엔진에 에러가 전달됩니다.
pub type EventHandler = Arc<dyn Fn(&EngineEvent) -> Result<(), ScenicError> + Send + Sync>;

/// 구독 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// 엔진 이벤트 구독/발행 계약
pub trait EventBus: Send + Sync {
    /// 핸들러를 등록합니다. `pickle`이 주어지면 해당 피클의 이벤트만 받습니다.
    fn subscribe(&self, kind: EventKind, pickle: Option<Uuid>, handler: EventHandler)
    -> SubscriptionId;

    /// 핸들러를 해제합니다. 이미 해제되었으면 `false`를 반환합니다.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// 이벤트를 등록 순서대로 핸들러에 전달합니다.
    ///
    /// 첫 번째 핸들러 실패에서 멈추고 그 에러를 반환합니다.
    fn publish(&self, event: &EngineEvent) -> Result<(), ScenicError>;

    /// 현재 등록된 핸들러 수
    fn handler_count(&self) -> usize;
}

struct Registered {
    id: SubscriptionId,
    kind: EventKind,
    pickle: Option<Uuid>,
    handler: EventHandler,
}

#[derive(Default)]
struct HandlerRegistry {
    next_id: AtomicU64,
    handlers: RwLock<Vec<Registered>>,
}

impl HandlerRegistry {
    fn subscribe(&self, kind: EventKind, pickle: Option<Uuid>, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push(Registered {
            id,
            kind,
            pickle,
            handler,
        });
        trace!(?id, %kind, "event handler subscribed");
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|h| h.id != id);
        before != handlers.len()
    }

    /// 이벤트에 해당하는 핸들러 스냅샷
    fn matching(&self, event: &EngineEvent) -> Vec<EventHandler> {
        let kind = event.kind();
        let pickle_id = event.pickle_id();
        self.handlers
            .read()
            .iter()
            .filter(|h| h.kind == kind && h.pickle.is_none_or(|p| p == pickle_id))
            .map(|h| Arc::clone(&h.handler))
            .collect()
    }

    fn deliver(&self, event: &EngineEvent) -> Result<(), ScenicError> {
        for handler in self.matching(event) {
            handler(event)?;
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.handlers.read().len()
    }
}

/// 단일 스레드 실행 모드용 이벤트 버스
#[derive(Default)]
pub struct LocalEventBus {
    registry: HandlerRegistry,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventBus for LocalEventBus {
    fn subscribe(&self, kind: EventKind, pickle: Option<Uuid>, handler: EventHandler) -> SubscriptionId {
        self.registry.subscribe(kind, pickle, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }

    fn publish(&self, event: &EngineEvent) -> Result<(), ScenicError> {
        self.registry.deliver(event)
    }

    fn handler_count(&self) -> usize {
        self.registry.len()
    }
}

/// 멀티 스레드 실행 모드용 이벤트 버스
///
/// 이벤트 전달 전체를 재진입 가능한 잠금으로 직렬화합니다.
/// 여러 워커가 동시에 발행해도 핸들러 호출은 겹치지 않으며,
/// 핸들러 안에서 같은 스레드가 다시 발행해도 교착되지 않습니다.
#[derive(Default)]
pub struct SerialEventBus {
    registry: HandlerRegistry,
    delivery: ReentrantMutex<()>,
}

impl SerialEventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventBus for SerialEventBus {
    fn subscribe(&self, kind: EventKind, pickle: Option<Uuid>, handler: EventHandler) -> SubscriptionId {
        self.registry.subscribe(kind, pickle, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }

    fn publish(&self, event: &EngineEvent) -> Result<(), ScenicError> {
        let _delivery = self.delivery.lock();
        self.registry.deliver(event)
    }

    fn handler_count(&self) -> usize {
        self.registry.len()
    }
}

/// 실행 옵션에 맞는 이벤트 버스를 만듭니다.
pub fn event_bus_for(options: &EffectiveOptions) -> Arc<dyn EventBus> {
    if options.is_multi_threaded() {
        Arc::new(SerialEventBus::new())
    } else {
        Arc::new(LocalEventBus::new())
    }
}

/// 드롭 시 자동으로 해제되는 구독
#[must_use = "dropping a Subscription unsubscribes its handler immediately"]
pub struct Subscription {
    bus: Arc<dyn EventBus>,
    id: SubscriptionId,
}

impl Subscription {
    pub fn new(
        bus: &Arc<dyn EventBus>,
        kind: EventKind,
        pickle: Option<Uuid>,
        handler: EventHandler,
    ) -> Self {
        let id = bus.subscribe(kind, pickle, handler);
        Self {
            bus: Arc::clone(bus),
            id,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// ─── 엔진 trait ──────────────────────────────────────────────────────

/// 피클 하나를 실행할 때 엔진에 넘기는 컨텍스트
#[derive(Clone)]
pub struct RunContext {
    /// 이벤트를 발행할 버스
    pub bus: Arc<dyn EventBus>,
    /// 이 시나리오의 스텝 정의 인스턴스를 얻는 팩토리
    pub objects: Arc<dyn ObjectFactory>,
    pub options: Arc<EffectiveOptions>,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("handlers", &self.bus.handler_count())
            .finish()
    }
}

/// 외부 시나리오 엔진
///
/// 실행 전후 단계는 기본적으로 아무 일도 하지 않습니다.
///
/// # 구현 예시
/// ```ignore
/// struct MyEngine { features: Vec<Feature> }
///
/// impl ScenarioEngine for MyEngine {
///     async fn discover(&self, _options: &EffectiveOptions) -> Result<Vec<Feature>, ScenicError> {
///         Ok(self.features.clone())
///     }
///     async fn run_pickle(&self, pickle: &Pickle, ctx: RunContext) -> Result<(), ScenicError> {
///         ctx.bus.publish(&EngineEvent::ScenarioStarted { .. })?;
///         // 스텝 실행 ...
///         ctx.bus.publish(&EngineEvent::ScenarioFinished { .. })
///     }
/// }
/// ```
pub trait ScenarioEngine: Send + Sync {
    /// 옵션의 피처 경로에서 피처를 탐색합니다. 반환 순서가 실행 순서입니다.
    fn discover(
        &self,
        options: &EffectiveOptions,
    ) -> impl Future<Output = Result<Vec<Feature>, ScenicError>> + Send;

    fn start_run(&self) -> impl Future<Output = Result<(), ScenicError>> + Send {
        async { Ok(()) }
    }

    fn before_all(&self) -> impl Future<Output = Result<(), ScenicError>> + Send {
        async { Ok(()) }
    }

    fn before_feature(
        &self,
        _feature: &Feature,
    ) -> impl Future<Output = Result<(), ScenicError>> + Send {
        async { Ok(()) }
    }

    /// 피클 하나를 실행합니다. 완료될 때까지 반환하지 않습니다.
    fn run_pickle(
        &self,
        pickle: &Pickle,
        ctx: RunContext,
    ) -> impl Future<Output = Result<(), ScenicError>> + Send;

    fn after_all(&self) -> impl Future<Output = Result<(), ScenicError>> + Send {
        async { Ok(()) }
    }

    fn finish_run(&self) -> impl Future<Output = Result<(), ScenicError>> + Send {
        async { Ok(()) }
    }
}

/// dyn-compatible 엔진 trait
///
/// `ScenarioEngine`은 RPITIT를 사용하므로 `dyn ScenarioEngine`이 불가합니다.
/// 테스트 트리의 액션이 `Arc<dyn DynScenarioEngine>`을 공유할 수 있도록
/// `BoxFuture`를 반환합니다.
pub trait DynScenarioEngine: Send + Sync {
    fn discover<'a>(
        &'a self,
        options: &'a EffectiveOptions,
    ) -> BoxFuture<'a, Result<Vec<Feature>, ScenicError>>;

    fn start_run(&self) -> BoxFuture<'_, Result<(), ScenicError>>;

    fn before_all(&self) -> BoxFuture<'_, Result<(), ScenicError>>;

    fn before_feature<'a>(&'a self, feature: &'a Feature) -> BoxFuture<'a, Result<(), ScenicError>>;

    fn run_pickle<'a>(
        &'a self,
        pickle: &'a Pickle,
        ctx: RunContext,
    ) -> BoxFuture<'a, Result<(), ScenicError>>;

    fn after_all(&self) -> BoxFuture<'_, Result<(), ScenicError>>;

    fn finish_run(&self) -> BoxFuture<'_, Result<(), ScenicError>>;
}

/// ScenarioEngine을 구현한 타입은 자동으로 DynScenarioEngine도 구현됩니다.
impl<T: ScenarioEngine> DynScenarioEngine for T {
    fn discover<'a>(
        &'a self,
        options: &'a EffectiveOptions,
    ) -> BoxFuture<'a, Result<Vec<Feature>, ScenicError>> {
        Box::pin(ScenarioEngine::discover(self, options))
    }

    fn start_run(&self) -> BoxFuture<'_, Result<(), ScenicError>> {
        Box::pin(ScenarioEngine::start_run(self))
    }

    fn before_all(&self) -> BoxFuture<'_, Result<(), ScenicError>> {
        Box::pin(ScenarioEngine::before_all(self))
    }

    fn before_feature<'a>(&'a self, feature: &'a Feature) -> BoxFuture<'a, Result<(), ScenicError>> {
        Box::pin(ScenarioEngine::before_feature(self, feature))
    }

    fn run_pickle<'a>(
        &'a self,
        pickle: &'a Pickle,
        ctx: RunContext,
    ) -> BoxFuture<'a, Result<(), ScenicError>> {
        Box::pin(ScenarioEngine::run_pickle(self, pickle, ctx))
    }

    fn after_all(&self) -> BoxFuture<'_, Result<(), ScenicError>> {
        Box::pin(ScenarioEngine::after_all(self))
    }

    fn finish_run(&self) -> BoxFuture<'_, Result<(), ScenicError>> {
        Box::pin(ScenarioEngine::finish_run(self))
    }
}
