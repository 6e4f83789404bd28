//! 에러 타입 — 도메인별 에러 정의

use crate::event::LifecyclePhase;

/// 외부 협력자(옵저버, 빈 팩토리 등)가 반환하는 임의의 에러
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Scenic 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ScenicError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 시나리오 스코프 / 빈 해석 에러
    #[error("scope error: {0}")]
    Scope(#[from] ScopeError),

    /// 라이프사이클 옵저버 에러
    #[error("observer error: {0}")]
    Observer(#[from] ObserverError),

    /// 외부 시나리오 엔진 에러
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// 피처 탐색 에러
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 명시적으로 지정된 옵션 파일을 찾을 수 없음
    #[error("options file not found: {path}")]
    FileNotFound { path: String },

    /// 옵션 파일 파싱 실패
    #[error("failed to parse options: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 옵션 값
    #[error("invalid option value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 시나리오 스코프 / 빈 해석 에러
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// 컨테이너에 등록되지 않은 타입
    #[error("{contract} is not a registered bean")]
    Unsatisfied { contract: String },

    /// 빈 팩토리가 인스턴스 생성에 실패
    #[error("failed to create {contract}: {source}")]
    CreationFailed {
        contract: String,
        #[source]
        source: BoxError,
    },

    /// 스코프에 저장된 인스턴스의 타입이 요청한 타입과 다름
    #[error("instance registered for {contract} has a different type")]
    TypeMismatch { contract: String },

    /// 시나리오 스코프가 활성 상태가 아님
    #[error("scenario scope is not active while resolving {contract}")]
    Inactive { contract: String },
}

/// 라이프사이클 옵저버 에러
///
/// 원인 에러는 `source`로 체인에 보존됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// 옵저버가 이벤트 처리 중 실패
    #[error("{phase} observer failed for scenario '{scenario}': {source}")]
    Failed {
        phase: LifecyclePhase,
        scenario: String,
        #[source]
        source: BoxError,
    },
}

/// 외부 시나리오 엔진 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 엔진 내부 실행 실패
    #[error("execution failed: {reason}")]
    Execution { reason: String },

    /// 이벤트 핸들러가 실패하여 시나리오 실행이 중단됨
    #[error("scenario aborted by event handler: {reason}")]
    Aborted { reason: String },
}

/// 피처 탐색 에러
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// 피처 소스를 읽을 수 없음
    #[error("feature source unreadable: {uri}: {reason}")]
    FeatureUnreadable { uri: String, reason: String },

    /// 피처 경로에 해당하는 소스가 없음
    #[error("no feature source found at {path}")]
    PathNotFound { path: String },
}
