//! 시나리오 스코프 — 시나리오 단위 인스턴스 캐시
//!
//! [`ScopeContext`]는 스코프 계약(조회/생성, 개별 파기, 일괄 파기, 활성 여부)을
//! 정의하고, [`ScenarioContext`]가 이를 구현합니다.
//!
//! # 생명주기
//! ```text
//! 시나리오 시작 → 새 ScenarioContext 활성화
//!   get(계약) 최초 요청 → 생성 잠금 → 재확인 → 생성 → 저장
//!   get(계약) 이후 요청 → 잠금 없이 저장된 인스턴스 반환
//! AFTER 알림 완료 → destroy_all() → 모든 엔트리 정리
//! ```
//!
//! 캐시는 시나리오 하나에만 속하므로 두 시나리오가 같은 인스턴스를 보는 일은 없습니다.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use metrics::counter;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::{debug, trace};

use crate::error::ScopeError;
use crate::metrics as m;

/// 스코프에 저장되는 살아있는 인스턴스
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 협력자 타입 식별자
///
/// 컨테이너가 빈을 해석할 때 사용하는 키입니다.
/// 동등성과 해시는 `TypeId`만으로 결정되며, 이름은 로그와 에러 메시지용입니다.
#[derive(Clone, Copy)]
pub struct ContractId {
    type_id: TypeId,
    name: &'static str,
}

impl ContractId {
    /// 타입 `T`의 계약 식별자를 만듭니다.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 타입 이름 (예: `"app::steps::CartSteps"`)
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ContractId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ContractId {}

impl Hash for ContractId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractId({})", self.name)
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// 인스턴스 생성 컨텍스트
///
/// 생성 중에 등록된 해제 훅을 보관하며, 엔트리가 파기될 때
/// 등록 역순으로 실행됩니다.
#[derive(Default)]
pub struct CreationContext {
    release_hooks: Mutex<Vec<ReleaseHook>>,
}

impl CreationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 인스턴스 파기 시 실행할 훅을 등록합니다.
    pub fn on_release(&self, hook: impl FnOnce() + Send + 'static) {
        self.release_hooks.lock().push(Box::new(hook));
    }

    /// 등록된 해제 훅을 역순으로 실행합니다. 두 번째 호출부터는 아무 일도 하지 않습니다.
    pub fn release(&self) {
        let hooks = std::mem::take(&mut *self.release_hooks.lock());
        for hook in hooks.into_iter().rev() {
            hook();
        }
    }

    /// 아직 실행되지 않은 훅 수
    pub fn pending_hooks(&self) -> usize {
        self.release_hooks.lock().len()
    }
}

impl fmt::Debug for CreationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationContext")
            .field("pending_hooks", &self.pending_hooks())
            .finish()
    }
}

/// 스코프에 인스턴스를 만들어 넣을 수 있는 빈 기술자
pub trait Contextual: Send + Sync {
    /// 이 빈이 해석되는 계약
    fn contract(&self) -> ContractId;

    /// 새 인스턴스를 생성합니다.
    ///
    /// 파기 시 필요한 정리 작업은 `ctx.on_release`로 등록합니다.
    fn create(&self, ctx: &CreationContext) -> Result<Instance, ScopeError>;
}

/// 시나리오 스코프 계약
///
/// 특정 DI 컨테이너 SPI와 무관하게 네 가지 연산만 정의합니다.
pub trait ScopeContext: Send + Sync {
    /// 계약에 해당하는 인스턴스를 반환합니다.
    ///
    /// - 엔트리가 있으면 잠금 없이 반환
    /// - 없고 `ctx`가 주어지면 생성 잠금 하에 재확인 후 생성
    /// - 없고 `ctx`도 없으면 `Ok(None)`
    fn get(
        &self,
        contextual: &dyn Contextual,
        ctx: Option<CreationContext>,
    ) -> Result<Option<Instance>, ScopeError>;

    /// 단일 엔트리를 제거하고 정리합니다. 없으면 아무 일도 하지 않습니다.
    fn destroy(&self, contract: ContractId);

    /// 모든 엔트리를 제거하고 정리합니다.
    fn destroy_all(&self);

    /// 스코프 활성 여부
    fn is_active(&self) -> bool;
}

/// 스코프 엔트리 — (인스턴스, 생성 컨텍스트)
struct ContextInstance {
    instance: Instance,
    ctx: CreationContext,
}

impl ContextInstance {
    fn finalize(self, contract: ContractId) {
        trace!(contract = contract.name(), "finalizing scenario-scoped instance");
        self.ctx.release();
        counter!(m::SCOPE_INSTANCES_DESTROYED_TOTAL).increment(1);
    }
}

/// 시나리오 하나의 수명에 묶인 인스턴스 캐시
///
/// 조회는 `RwLock` 읽기 잠금만 사용하며, 생성과 파기는 재진입 가능한
/// 생성 잠금 하나로 직렬화됩니다. 재진입을 허용하므로 빈 팩토리가
/// 생성 도중 같은 스코프의 다른 빈을 요청할 수 있습니다.
pub struct ScenarioContext {
    instances: RwLock<HashMap<ContractId, ContextInstance>>,
    creation_lock: ReentrantMutex<()>,
}

impl ScenarioContext {
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            creation_lock: ReentrantMutex::new(()),
        }
    }

    /// 현재 살아있는 엔트리 수
    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    /// 현재 살아있는 계약 목록 (진단용)
    pub fn contracts(&self) -> Vec<ContractId> {
        self.instances.read().keys().copied().collect()
    }

    fn lookup(&self, contract: &ContractId) -> Option<Instance> {
        self.instances
            .read()
            .get(contract)
            .map(|entry| Arc::clone(&entry.instance))
    }
}

impl Default for ScenarioContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeContext for ScenarioContext {
    fn get(
        &self,
        contextual: &dyn Contextual,
        ctx: Option<CreationContext>,
    ) -> Result<Option<Instance>, ScopeError> {
        let contract = contextual.contract();
        if let Some(instance) = self.lookup(&contract) {
            return Ok(Some(instance));
        }
        let Some(ctx) = ctx else {
            return Ok(None);
        };

        let _guard = self.creation_lock.lock();
        // 잠금을 기다리는 동안 다른 호출자가 이미 만들었을 수 있음
        if let Some(instance) = self.lookup(&contract) {
            return Ok(Some(instance));
        }

        let instance = contextual.create(&ctx)?;
        self.instances.write().insert(
            contract,
            ContextInstance {
                instance: Arc::clone(&instance),
                ctx,
            },
        );
        counter!(m::SCOPE_INSTANCES_CREATED_TOTAL).increment(1);
        debug!(contract = contract.name(), "created scenario-scoped instance");
        Ok(Some(instance))
    }

    fn destroy(&self, contract: ContractId) {
        let _guard = self.creation_lock.lock();
        let removed = self.instances.write().remove(&contract);
        if let Some(entry) = removed {
            entry.finalize(contract);
        }
    }

    fn destroy_all(&self) {
        // 생성 중인 엔트리가 파기 뒤에 남지 않도록 생성 잠금을 잡음
        let _guard = self.creation_lock.lock();
        let drained: Vec<_> = self.instances.write().drain().collect();
        if !drained.is_empty() {
            debug!(count = drained.len(), "destroying scenario scope");
        }
        for (contract, entry) in drained {
            entry.finalize(contract);
        }
    }

    fn is_active(&self) -> bool {
        true
    }
}

impl fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("contracts", &self.contracts())
            .finish()
    }
}
