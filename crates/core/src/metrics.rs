//! 메트릭 상수
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 라이브러리는 exporter를 설치하지 않으므로, 수집하려면 호스트가
//! recorder를 등록해야 합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `scenic_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(scenic_core::metrics::SCENARIOS_EXECUTED_TOTAL, "outcome" => "passed").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 시나리오 결과 레이블 키 (passed, failed, ...)
pub const LABEL_OUTCOME: &str = "outcome";

/// 라이프사이클 단계 레이블 키 (before, after)
pub const LABEL_PHASE: &str = "phase";

// ─── 스코프 메트릭 ─────────────────────────────────────────────────

/// 시나리오 스코프: 생성된 인스턴스 수 (counter)
pub const SCOPE_INSTANCES_CREATED_TOTAL: &str = "scenic_scope_instances_created_total";

/// 시나리오 스코프: 파기된 인스턴스 수 (counter)
pub const SCOPE_INSTANCES_DESTROYED_TOTAL: &str = "scenic_scope_instances_destroyed_total";

// ─── 실행 메트릭 ───────────────────────────────────────────────────

/// 실행된 시나리오 수 (counter, label: outcome)
pub const SCENARIOS_EXECUTED_TOTAL: &str = "scenic_scenarios_executed_total";

/// 실패로 보고된 시나리오 리프 수 (counter)
pub const SCENARIOS_FAILED_TOTAL: &str = "scenic_scenarios_failed_total";

/// 옵저버 실패 수 (counter, label: phase)
pub const OBSERVER_FAILURES_TOTAL: &str = "scenic_observer_failures_total";

/// 탐색된 시나리오 중 필터를 통과한 수 (counter)
pub const PICKLES_SELECTED_TOTAL: &str = "scenic_pickles_selected_total";
