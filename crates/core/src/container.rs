//! 빈 컨테이너 — 스텝 정의와 협력자 인스턴스 해석
//!
//! [`ContainerBuilder`]로 타입별 빈을 등록하고, 시나리오마다
//! [`ScenarioObjectFactory`]를 만들어 엔진에 넘깁니다.
//!
//! # 빈 스코프
//! - [`BeanScope::Singleton`]: 컨테이너 전체에서 하나
//! - [`BeanScope::Scenario`]: 시나리오 스코프 컨텍스트마다 하나
//! - [`BeanScope::Dependent`]: 요청할 때마다 새로 생성
//!
//! 스텝 정의 타입은 기본적으로 시나리오 스코프로 등록됩니다.
//!
//! # 사용 예시
//! ```
//! use scenic_core::container::{BeanScope, Container};
//!
//! #[derive(Default)]
//! struct CartSteps { items: Vec<String> }
//!
//! struct Clock;
//!
//! let container = Container::builder()
//!     .step_definitions::<CartSteps>()
//!     .register(BeanScope::Singleton, |_| Ok(Clock))
//!     .build();
//!
//! let objects = container.object_factory(container.activate_scenario_scope());
//! let steps = objects.get::<CartSteps>().unwrap();
//! assert!(steps.items.is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, trace, warn};

use crate::error::{BoxError, ScopeError};
use crate::scope::{
    ContractId, Contextual, CreationContext, Instance, ScenarioContext, ScopeContext,
};

/// 빈 생명주기 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeanScope {
    Singleton,
    Scenario,
    Dependent,
}

impl fmt::Display for BeanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::Scenario => write!(f, "scenario"),
            Self::Dependent => write!(f, "dependent"),
        }
    }
}

type Factory = Arc<dyn Fn(&BeanContext<'_>) -> Result<Instance, BoxError> + Send + Sync>;

struct BeanDefinition {
    contract: ContractId,
    scope: BeanScope,
    factory: Factory,
}

/// 빈 팩토리에 전달되는 생성 컨텍스트
///
/// 다른 빈을 해석하거나 파기 시 실행할 정리 작업을 등록할 때 사용합니다.
pub struct BeanContext<'a> {
    objects: &'a ScenarioObjectFactory,
    creation: Option<&'a CreationContext>,
}

impl BeanContext<'_> {
    /// 같은 시나리오에서 다른 빈을 해석합니다.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ScopeError> {
        self.objects.get::<T>()
    }

    /// 인스턴스가 파기될 때 실행할 정리 작업을 등록합니다.
    ///
    /// 시나리오 스코프 빈에서만 의미가 있으며, 다른 스코프에서는 무시됩니다.
    pub fn on_release(&self, hook: impl FnOnce() + Send + 'static) {
        match self.creation {
            Some(ctx) => ctx.on_release(hook),
            None => trace!("release hook ignored outside scenario scope"),
        }
    }
}

/// 시나리오 스코프 등록 정보
///
/// 컨테이너 시작 시 한 번 지정되며, 시나리오마다 새 [`ScopeContext`]를 만듭니다.
#[derive(Clone)]
pub struct ScopeRegistration {
    name: &'static str,
    activate: Arc<dyn Fn() -> Arc<dyn ScopeContext> + Send + Sync>,
}

impl ScopeRegistration {
    pub fn new<F>(name: &'static str, activate: F) -> Self
    where
        F: Fn() -> Arc<dyn ScopeContext> + Send + Sync + 'static,
    {
        Self {
            name,
            activate: Arc::new(activate),
        }
    }

    /// [`ScenarioContext`]를 사용하는 기본 등록
    pub fn scenario() -> Self {
        Self::new("scenario", || Arc::new(ScenarioContext::new()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 새 스코프 컨텍스트를 활성화합니다.
    pub fn activate(&self) -> Arc<dyn ScopeContext> {
        (self.activate)()
    }
}

impl fmt::Debug for ScopeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRegistration")
            .field("name", &self.name)
            .finish()
    }
}

/// 컨테이너 빌더
#[derive(Default)]
pub struct ContainerBuilder {
    beans: HashMap<ContractId, BeanDefinition>,
    scope: Option<ScopeRegistration>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 타입 `T`를 주어진 스코프의 빈으로 등록합니다.
    ///
    /// 같은 타입을 다시 등록하면 이전 등록을 대체합니다.
    pub fn register<T, F>(mut self, scope: BeanScope, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&BeanContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let contract = ContractId::of::<T>();
        let factory: Factory =
            Arc::new(move |cx: &BeanContext<'_>| factory(cx).map(|bean| Arc::new(bean) as Instance));
        if self
            .beans
            .insert(
                contract,
                BeanDefinition {
                    contract,
                    scope,
                    factory,
                },
            )
            .is_some()
        {
            warn!(contract = contract.name(), "bean registered twice, replacing");
        }
        self
    }

    /// 스텝 정의 타입을 시나리오 스코프 빈으로 등록합니다.
    pub fn step_definitions<T>(self) -> Self
    where
        T: Default + Send + Sync + 'static,
    {
        self.register(BeanScope::Scenario, |_| Ok(T::default()))
    }

    /// 생성자를 지정하여 스텝 정의 타입을 시나리오 스코프 빈으로 등록합니다.
    pub fn step_definitions_with<T, F>(self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&BeanContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.register(BeanScope::Scenario, factory)
    }

    /// 시나리오 스코프를 등록합니다. 지정하지 않으면 [`ScopeRegistration::scenario`]를 사용합니다.
    pub fn scenario_scope(mut self, registration: ScopeRegistration) -> Self {
        if let Some(previous) = self.scope.replace(registration) {
            warn!(
                previous = previous.name(),
                "scenario scope registered twice, keeping the latest"
            );
        }
        self
    }

    pub fn build(self) -> Arc<Container> {
        let scope = self.scope.unwrap_or_else(ScopeRegistration::scenario);
        debug!(
            beans = self.beans.len(),
            scope = scope.name(),
            "bean container built"
        );
        Arc::new(Container {
            beans: self.beans,
            scope,
            singletons: RwLock::new(HashMap::new()),
            singleton_lock: ReentrantMutex::new(()),
        })
    }
}

/// 빈 컨테이너
pub struct Container {
    beans: HashMap<ContractId, BeanDefinition>,
    scope: ScopeRegistration,
    singletons: RwLock<HashMap<ContractId, Instance>>,
    singleton_lock: ReentrantMutex<()>,
}

impl Container {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.contains_contract(ContractId::of::<T>())
    }

    pub fn contains_contract(&self, contract: ContractId) -> bool {
        self.beans.contains_key(&contract)
    }

    /// 등록된 빈의 스코프
    pub fn scope_of(&self, contract: ContractId) -> Option<BeanScope> {
        self.beans.get(&contract).map(|def| def.scope)
    }

    pub fn bean_count(&self) -> usize {
        self.beans.len()
    }

    /// 등록된 시나리오 스코프 이름
    pub fn scope_name(&self) -> &'static str {
        self.scope.name()
    }

    /// 새 시나리오 스코프 컨텍스트를 활성화합니다.
    pub fn activate_scenario_scope(&self) -> Arc<dyn ScopeContext> {
        self.scope.activate()
    }

    /// 주어진 시나리오 스코프에 대해 객체 팩토리를 만듭니다.
    pub fn object_factory(self: &Arc<Self>, scope: Arc<dyn ScopeContext>) -> ScenarioObjectFactory {
        ScenarioObjectFactory {
            container: Arc::clone(self),
            scope,
        }
    }

    fn singleton(
        &self,
        definition: &BeanDefinition,
        objects: &ScenarioObjectFactory,
    ) -> Result<Instance, ScopeError> {
        if let Some(instance) = self.singletons.read().get(&definition.contract) {
            return Ok(Arc::clone(instance));
        }
        let _guard = self.singleton_lock.lock();
        if let Some(instance) = self.singletons.read().get(&definition.contract) {
            return Ok(Arc::clone(instance));
        }
        let instance = create(definition, objects, None)?;
        self.singletons
            .write()
            .insert(definition.contract, Arc::clone(&instance));
        debug!(contract = definition.contract.name(), "created singleton bean");
        Ok(instance)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("beans", &self.beans.len())
            .field("scope", &self.scope.name())
            .finish()
    }
}

fn create(
    definition: &BeanDefinition,
    objects: &ScenarioObjectFactory,
    creation: Option<&CreationContext>,
) -> Result<Instance, ScopeError> {
    (definition.factory)(&BeanContext { objects, creation }).map_err(|source| {
        ScopeError::CreationFailed {
            contract: definition.contract.name().to_owned(),
            source,
        }
    })
}

/// 시나리오 스코프에 넣을 빈 기술자
struct ScopedBean<'a> {
    definition: &'a BeanDefinition,
    objects: &'a ScenarioObjectFactory,
}

impl Contextual for ScopedBean<'_> {
    fn contract(&self) -> ContractId {
        self.definition.contract
    }

    fn create(&self, ctx: &CreationContext) -> Result<Instance, ScopeError> {
        create(self.definition, self.objects, Some(ctx))
    }
}

/// 엔진이 스텝 정의 인스턴스를 얻는 경계
pub trait ObjectFactory: Send + Sync {
    /// 계약에 해당하는 살아있는 인스턴스를 반환합니다.
    ///
    /// 등록되지 않은 타입은 [`ScopeError::Unsatisfied`]입니다.
    fn instance(&self, contract: ContractId) -> Result<Instance, ScopeError>;
}

impl dyn ObjectFactory {
    /// 타입 `T`의 인스턴스를 해석합니다.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ScopeError> {
        downcast(self.instance(ContractId::of::<T>())?)
    }
}

fn downcast<T: Send + Sync + 'static>(instance: Instance) -> Result<Arc<T>, ScopeError> {
    instance
        .downcast::<T>()
        .map_err(|_| ScopeError::TypeMismatch {
            contract: std::any::type_name::<T>().to_owned(),
        })
}

/// 시나리오 하나에 묶인 객체 팩토리
#[derive(Clone)]
pub struct ScenarioObjectFactory {
    container: Arc<Container>,
    scope: Arc<dyn ScopeContext>,
}

impl ScenarioObjectFactory {
    /// 타입 `T`의 인스턴스를 해석합니다.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ScopeError> {
        downcast(self.resolve(ContractId::of::<T>())?)
    }

    pub fn scope(&self) -> &Arc<dyn ScopeContext> {
        &self.scope
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    fn resolve(&self, contract: ContractId) -> Result<Instance, ScopeError> {
        // 해석 컨텍스트: 조회 동안만 요청 타입의 span에 진입
        let _span = debug_span!("resolve_bean", contract = contract.name()).entered();

        let definition =
            self.container
                .beans
                .get(&contract)
                .ok_or_else(|| ScopeError::Unsatisfied {
                    contract: contract.name().to_owned(),
                })?;

        match definition.scope {
            BeanScope::Singleton => self.container.singleton(definition, self),
            BeanScope::Dependent => create(definition, self, None),
            BeanScope::Scenario => {
                if !self.scope.is_active() {
                    return Err(ScopeError::Inactive {
                        contract: contract.name().to_owned(),
                    });
                }
                let bean = ScopedBean {
                    definition,
                    objects: self,
                };
                self.scope
                    .get(&bean, Some(CreationContext::new()))?
                    .ok_or_else(|| ScopeError::Unsatisfied {
                        contract: contract.name().to_owned(),
                    })
            }
        }
    }
}

impl ObjectFactory for ScenarioObjectFactory {
    fn instance(&self, contract: ContractId) -> Result<Instance, ScopeError> {
        self.resolve(contract)
    }
}

impl fmt::Debug for ScenarioObjectFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioObjectFactory")
            .field("container", &self.container)
            .finish()
    }
}
