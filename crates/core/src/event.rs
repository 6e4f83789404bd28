//! 시나리오 라이프사이클 이벤트 — 옵저버에게 전달되는 기본 단위
//!
//! [`ScenarioIdentity`]는 외부 엔진이 시나리오를 시작할 때 만드는 불변 값이며,
//! [`LifecycleEvent`]는 오케스트레이터가 시나리오 경계에서 만들어
//! [`LifecycleNotifier`](crate::notifier::LifecycleNotifier)를 통해 발행합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 시나리오 식별 정보
///
/// 이름, 피처 소스 URI, 줄 번호, 태그로 구성됩니다.
/// 엔진이 생성하며 코어에서는 읽기 전용입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioIdentity {
    /// 시나리오 이름
    pub name: String,
    /// 피처 파일 URI
    pub uri: String,
    /// 피처 파일 내 시나리오 줄 번호 (1부터 시작)
    pub line: u32,
    /// 태그 목록 (예: `"@smoke"`)
    pub tags: Vec<String>,
}

impl ScenarioIdentity {
    pub fn new(name: impl Into<String>, uri: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            line,
            tags: Vec::new(),
        }
    }

    /// 태그를 지정합니다.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// 주어진 태그를 가지고 있는지 확인합니다.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl fmt::Display for ScenarioIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.uri, self.line)
    }
}

/// 시나리오 및 스텝 실행 결과
///
/// 스텝 결과와 시나리오 최종 결과 모두 이 열거형을 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScenarioOutcome {
    Passed,
    Failed,
    Undefined,
    Pending,
    Skipped,
    Ambiguous,
    Unknown,
}

impl ScenarioOutcome {
    /// 통과 여부
    pub fn is_passed(self) -> bool {
        self == Self::Passed
    }

    /// 메트릭 레이블 등에 쓰는 소문자 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Undefined => "undefined",
            Self::Pending => "pending",
            Self::Skipped => "skipped",
            Self::Ambiguous => "ambiguous",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// 라이프사이클 단계 태그
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecyclePhase {
    /// 시나리오 첫 스텝 실행 전
    Before,
    /// 시나리오 완료 후
    After,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

/// 시나리오 라이프사이클 이벤트
///
/// `Before` 단계에서는 `outcome`이 항상 `None`이고,
/// `After` 단계에서는 항상 최종 결과를 담습니다.
/// 생성자만으로 만들 수 있으므로 이 불변식이 깨지지 않습니다.
///
/// # 사용 예시
/// ```
/// use scenic_core::event::{LifecycleEvent, ScenarioIdentity, ScenarioOutcome};
///
/// let identity = ScenarioIdentity::new("checkout", "features/cart.feature", 12);
/// let event = LifecycleEvent::after(identity, ScenarioOutcome::Failed);
/// assert!(event.is_failed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleEvent {
    identity: ScenarioIdentity,
    phase: LifecyclePhase,
    outcome: Option<ScenarioOutcome>,
}

impl LifecycleEvent {
    /// 시나리오 시작 이벤트
    pub fn before(identity: ScenarioIdentity) -> Self {
        Self {
            identity,
            phase: LifecyclePhase::Before,
            outcome: None,
        }
    }

    /// 시나리오 완료 이벤트
    pub fn after(identity: ScenarioIdentity, outcome: ScenarioOutcome) -> Self {
        Self {
            identity,
            phase: LifecyclePhase::After,
            outcome: Some(outcome),
        }
    }

    pub fn identity(&self) -> &ScenarioIdentity {
        &self.identity
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// 최종 결과 (`Before` 이벤트에서는 `None`)
    pub fn outcome(&self) -> Option<ScenarioOutcome> {
        self.outcome
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn uri(&self) -> &str {
        &self.identity.uri
    }

    pub fn line(&self) -> u32 {
        self.identity.line
    }

    pub fn tags(&self) -> &[String] {
        &self.identity.tags
    }

    /// 시나리오가 실패했는지 확인합니다.
    pub fn is_failed(&self) -> bool {
        self.outcome == Some(ScenarioOutcome::Failed)
    }

    /// 시나리오가 통과했는지 확인합니다.
    pub fn is_passed(&self) -> bool {
        self.outcome == Some(ScenarioOutcome::Passed)
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScenarioEvent[{}] name='{}' uri={} line={}",
            self.phase, self.identity.name, self.identity.uri, self.identity.line
        )?;
        if let Some(outcome) = self.outcome {
            write!(f, " status={outcome}")?;
        }
        Ok(())
    }
}
