#![doc = include_str!("../README.md")]

pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod event;
pub mod metrics;
pub mod notifier;
pub mod scope;
pub mod tags;
pub mod tree;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{
    BoxError, ConfigError, DiscoveryError, EngineError, ObserverError, ScenicError, ScopeError,
};

// 설정
pub use config::{EffectiveOptions, OptionLayers, PartialOptions, SuiteOptions, SystemProperties};

// 이벤트
pub use event::{LifecycleEvent, LifecyclePhase, ScenarioIdentity, ScenarioOutcome};

// 스코프 / 컨테이너
pub use container::{BeanScope, Container, ObjectFactory, ScenarioObjectFactory};
pub use scope::{ContractId, ScenarioContext, ScopeContext};

// 알림
pub use notifier::{LifecycleNotifier, ObserverBus, ScenarioObserver};

// 엔진 경계
pub use engine::{
    BoxFuture, DynScenarioEngine, EngineEvent, EventBus, Feature, Pickle, RunContext,
    ScenarioEngine,
};

// 테스트 트리
pub use tree::{DynamicContainer, DynamicTest, SourceLocation, TestFailure, TestNode};
