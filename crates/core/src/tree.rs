//! 동적 테스트 트리 — 테스트 러너에 넘기는 노드 구조
//!
//! 리프([`DynamicTest`])는 한 번 실행되는 비동기 액션을 가지고,
//! 컨테이너([`DynamicContainer`])는 순서가 있는 자식 노드 목록을 가집니다.
//! 러너는 액션의 성공/실패로 통과 여부를 기록합니다.

use std::fmt;
use std::future::Future;

use crate::engine::BoxFuture;
use crate::error::ScenicError;
use crate::event::ScenarioOutcome;

/// 리프 노드의 실행 액션 (한 번만 실행)
pub type TestAction = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), TestFailure>> + Send>;

/// 노드의 소스 위치
///
/// 줄 번호는 선택 메타데이터이며, 있으면 `uri?line=N` 형식으로 렌더링됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub uri: String,
    pub line: Option<u32>,
}

impl SourceLocation {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            line: None,
        }
    }

    pub fn at_line(uri: impl Into<String>, line: u32) -> Self {
        Self {
            uri: uri.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}?line={line}", self.uri),
            None => f.write_str(&self.uri),
        }
    }
}

/// 실패가 발생한 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureLocation {
    /// 피처 파일의 구체적인 스텝 줄
    FeatureLine { uri: String, line: u32 },
    /// 훅 등 코드 위치
    Code { location: String },
}

impl fmt::Display for FailureLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeatureLine { uri, line } => write!(f, "{uri} at line {line}"),
            Self::Code { location } => f.write_str(location),
        }
    }
}

/// 리프 실패
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TestFailure {
    message: String,
    location: Option<FailureLocation>,
    status: Option<ScenarioOutcome>,
    #[source]
    cause: Option<ScenicError>,
}

impl TestFailure {
    /// 스텝 또는 훅의 결과로 인한 실패
    pub fn at(location: FailureLocation, status: ScenarioOutcome, detail: Option<&str>) -> Self {
        let mut message = format!("{} in {location}", status.as_str());
        if let Some(detail) = detail {
            message.push_str(": ");
            message.push_str(detail);
        }
        Self {
            message,
            location: Some(location),
            status: Some(status),
            cause: None,
        }
    }

    /// 엔진 / 옵저버 / 스코프 에러로 인한 실패. 원인이 체인에 보존됩니다.
    pub fn from_error(cause: ScenicError) -> Self {
        Self {
            message: cause.to_string(),
            location: None,
            status: None,
            cause: Some(cause),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&FailureLocation> {
        self.location.as_ref()
    }

    /// 실패를 일으킨 스텝 상태 (에러 기반 실패에서는 `None`)
    pub fn status(&self) -> Option<ScenarioOutcome> {
        self.status
    }

    pub fn cause(&self) -> Option<&ScenicError> {
        self.cause.as_ref()
    }
}

impl From<ScenicError> for TestFailure {
    fn from(cause: ScenicError) -> Self {
        Self::from_error(cause)
    }
}

/// 실행 가능한 리프 노드
pub struct DynamicTest {
    name: String,
    source: Option<SourceLocation>,
    action: TestAction,
}

impl DynamicTest {
    pub fn new(name: impl Into<String>, action: TestAction) -> Self {
        Self {
            name: name.into(),
            source: None,
            action,
        }
    }

    /// 비동기 클로저로 리프를 만듭니다.
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TestFailure>> + Send + 'static,
    {
        Self::new(
            name,
            Box::new(move || -> BoxFuture<'static, Result<(), TestFailure>> { Box::pin(f()) }),
        )
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    /// 액션을 실행합니다. 리프는 한 번만 실행할 수 있으므로 `self`를 소비합니다.
    pub async fn run(self) -> Result<(), TestFailure> {
        (self.action)().await
    }
}

impl fmt::Debug for DynamicTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicTest")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// 자식 노드를 가진 컨테이너
#[derive(Debug)]
pub struct DynamicContainer {
    name: String,
    source: Option<SourceLocation>,
    children: Vec<TestNode>,
}

impl DynamicContainer {
    pub fn new(name: impl Into<String>, children: Vec<TestNode>) -> Self {
        Self {
            name: name.into(),
            source: None,
            children,
        }
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    pub fn children(&self) -> &[TestNode] {
        &self.children
    }

    pub fn into_children(self) -> Vec<TestNode> {
        self.children
    }
}

/// 테스트 트리 노드
#[derive(Debug)]
pub enum TestNode {
    Test(DynamicTest),
    Container(DynamicContainer),
}

impl TestNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Test(test) => test.name(),
            Self::Container(container) => container.name(),
        }
    }

    pub fn source(&self) -> Option<&SourceLocation> {
        match self {
            Self::Test(test) => test.source(),
            Self::Container(container) => container.source(),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Container(_))
    }

    /// 하위 트리의 리프 수
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Test(_) => 1,
            Self::Container(container) => container.children.iter().map(Self::leaf_count).sum(),
        }
    }
}

impl From<DynamicTest> for TestNode {
    fn from(test: DynamicTest) -> Self {
        Self::Test(test)
    }
}

impl From<DynamicContainer> for TestNode {
    fn from(container: DynamicContainer) -> Self {
        Self::Container(container)
    }
}
