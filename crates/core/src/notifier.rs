//! 라이프사이클 알림 — 시나리오 경계에서 옵저버에게 이벤트 발행
//!
//! [`ObserverBus`]는 단계(`before`/`after`)별로 태그된 옵저버를 보관하고,
//! [`LifecycleNotifier`]는 시나리오 식별 정보로 [`LifecycleEvent`]를 만들어
//! 버스에 동기적으로 발행합니다.
//!
//! 옵저버 실패는 삼키지 않고 [`ObserverError`]로 감싸 호출자에게 전파합니다.
//! 재시도하지 않습니다.

use std::fmt;
use std::sync::Arc;

use metrics::counter;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{BoxError, ObserverError, ScenicError};
use crate::event::{LifecycleEvent, LifecyclePhase, ScenarioIdentity, ScenarioOutcome};
use crate::metrics as m;

/// 시나리오 라이프사이클 옵저버
///
/// 클로저 `Fn(&LifecycleEvent) -> Result<(), BoxError>`도 옵저버로 사용할 수 있습니다.
pub trait ScenarioObserver: Send + Sync {
    fn on_event(&self, event: &LifecycleEvent) -> Result<(), BoxError>;
}

impl<F> ScenarioObserver for F
where
    F: Fn(&LifecycleEvent) -> Result<(), BoxError> + Send + Sync,
{
    fn on_event(&self, event: &LifecycleEvent) -> Result<(), BoxError> {
        self(event)
    }
}

/// 단계별 옵저버 레지스트리
///
/// 발행은 등록 순서대로 진행되며, 첫 번째 실패에서 멈춥니다.
#[derive(Default)]
pub struct ObserverBus {
    observers: RwLock<Vec<(LifecyclePhase, Arc<dyn ScenarioObserver>)>>,
}

impl ObserverBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 주어진 단계의 이벤트를 받을 옵저버를 등록합니다.
    pub fn observe(&self, phase: LifecyclePhase, observer: impl ScenarioObserver + 'static) {
        self.observers.write().push((phase, Arc::new(observer)));
    }

    /// 주어진 단계에 등록된 옵저버 수
    pub fn count(&self, phase: LifecyclePhase) -> usize {
        self.observers
            .read()
            .iter()
            .filter(|(p, _)| *p == phase)
            .count()
    }

    /// 이벤트 단계에 맞는 옵저버에게 이벤트를 전달합니다.
    ///
    /// 옵저버 목록의 스냅샷에 대해 호출하므로 옵저버가 재등록해도 교착되지 않습니다.
    pub fn publish(&self, event: &LifecycleEvent) -> Result<(), BoxError> {
        let targets: Vec<_> = self
            .observers
            .read()
            .iter()
            .filter(|(phase, _)| *phase == event.phase())
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in targets {
            observer.on_event(event)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObserverBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverBus")
            .field("before", &self.count(LifecyclePhase::Before))
            .field("after", &self.count(LifecyclePhase::After))
            .finish()
    }
}

/// 시나리오 경계 알림 발행기
#[derive(Debug, Clone, Default)]
pub struct LifecycleNotifier {
    bus: Arc<ObserverBus>,
}

impl LifecycleNotifier {
    pub fn new(bus: Arc<ObserverBus>) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &Arc<ObserverBus> {
        &self.bus
    }

    /// 시나리오 시작을 알립니다.
    pub fn notify_before(&self, identity: &ScenarioIdentity) -> Result<(), ScenicError> {
        self.notify(LifecycleEvent::before(identity.clone()))
    }

    /// 시나리오 완료를 최종 결과와 함께 알립니다.
    pub fn notify_after(
        &self,
        identity: &ScenarioIdentity,
        outcome: ScenarioOutcome,
    ) -> Result<(), ScenicError> {
        self.notify(LifecycleEvent::after(identity.clone(), outcome))
    }

    fn notify(&self, event: LifecycleEvent) -> Result<(), ScenicError> {
        debug!(
            phase = %event.phase(),
            scenario = event.name(),
            uri = event.uri(),
            line = event.line(),
            "publishing lifecycle event"
        );
        self.bus.publish(&event).map_err(|source| {
            let phase = event.phase();
            counter!(m::OBSERVER_FAILURES_TOTAL, m::LABEL_PHASE => phase.to_string()).increment(1);
            warn!(%phase, scenario = event.name(), error = %source, "lifecycle observer failed");
            ScenicError::from(ObserverError::Failed {
                phase,
                scenario: event.name().to_owned(),
                source,
            })
        })
    }
}
