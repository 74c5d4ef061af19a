//! Cube Factory - 큐브 라이프사이클 컨테이너
//!
//! 정의를 단계별 파이프라인(instantiate -> configure -> initialize)으로
//! 진행시켜 ready 상태의 큐브를 만든다. 싱글턴 인스턴스를 캐시하며,
//! 핫 리로드 통지(`invalidate`)로 캐시를 비울 수 있다.
//!
//! 프로세스 전역 static이 아니라 명시적으로 소유되는 인스턴스다.
//! 런타임(또는 "world")마다 독립적인 팩토리를 둘 수 있다.

use super::api::CubeApi;
use super::definition::{CubeDefinition, CubeModel};
use super::extension::ExtensionPackage;
use super::model::{Cube, CubeMetadata, LifecycleState};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_foundation::{
    cube_created_event, cube_invalidated_event, Error, EventBus, Guid, LifecyclePhase, Result,
};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

// ============================================================================
// LifecycleHook - 초기화 전/후 훅
// ============================================================================

/// 라이프사이클 훅 - initialize 단계에서 init 호출을 감싼다
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// 훅 이름
    fn name(&self) -> &str;

    /// init 호출 직전
    async fn pre_init(
        &self,
        _cube: &Cube,
        _definition: &CubeDefinition,
        _args: &[Value],
    ) -> Result<()> {
        Ok(())
    }

    /// init 성공 직후
    async fn post_init(
        &self,
        _cube: &Cube,
        _definition: &CubeDefinition,
        _args: &[Value],
    ) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// CubeFactory - 팩토리 본체
// ============================================================================

/// 싱글턴 캐시 키: (정의 id, 인스턴스 구성 id)
///
/// 구성 id는 불투명하다 - 병렬 인스턴스 집합("world")의 구분은 전적으로
/// 외부 소관이고, 팩토리는 키 분할만 담당한다.
type SingletonKey = (Guid, Option<Guid>);

/// 큐브 팩토리 - 정의 등록 + 라이프사이클 파이프라인 + 싱글턴 캐시
pub struct CubeFactory {
    /// 등록된 정의 (등록 후 불변)
    definitions: RwLock<HashMap<Guid, Arc<CubeDefinition>>>,

    /// 싱글턴 인스턴스 캐시
    singletons: RwLock<HashMap<SingletonKey, Arc<Cube>>>,

    /// 라이프사이클 훅
    hooks: RwLock<Vec<Arc<dyn LifecycleHook>>>,

    /// 이벤트 버스
    event_bus: Arc<EventBus>,
}

impl CubeFactory {
    /// 새 팩토리 생성
    pub fn new() -> Self {
        Self::with_event_bus(Arc::new(EventBus::new()))
    }

    /// 기존 이벤트 버스와 함께 생성
    pub fn with_event_bus(event_bus: Arc<EventBus>) -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
            singletons: RwLock::new(HashMap::new()),
            hooks: RwLock::new(Vec::new()),
            event_bus,
        }
    }

    // ========================================================================
    // 정의 등록/조회
    // ========================================================================

    /// 정의 등록 - 등록 후에는 불변
    pub async fn register_definition(&self, definition: CubeDefinition) -> Result<()> {
        let id = definition.id.clone();
        let mut definitions = self.definitions.write().await;

        if definitions.contains_key(&id) {
            return Err(Error::Conflict(format!(
                "Cube definition {} is already registered",
                id
            )));
        }

        info!("Registered cube definition: {} (v{})", id, definition.version);
        definitions.insert(id, Arc::new(definition));
        Ok(())
    }

    /// 정의 조회
    pub async fn definition(&self, cube_id: &Guid) -> Option<Arc<CubeDefinition>> {
        let definitions = self.definitions.read().await;
        definitions.get(cube_id).map(Arc::clone)
    }

    /// 모든 정의 목록
    pub async fn definitions(&self) -> Vec<Arc<CubeDefinition>> {
        let definitions = self.definitions.read().await;
        definitions.values().map(Arc::clone).collect()
    }

    /// 정의 존재 여부
    pub async fn contains(&self, cube_id: &Guid) -> bool {
        let definitions = self.definitions.read().await;
        definitions.contains_key(cube_id)
    }

    /// 정의 수
    pub async fn definition_count(&self) -> usize {
        let definitions = self.definitions.read().await;
        definitions.len()
    }

    // ========================================================================
    // 라이프사이클 훅
    // ========================================================================

    /// 훅 등록
    pub async fn register_hook(&self, hook: Arc<dyn LifecycleHook>) {
        let mut hooks = self.hooks.write().await;
        hooks.push(hook);
    }

    // ========================================================================
    // 생성 파이프라인
    // ========================================================================

    /// 정의로부터 ready 상태의 큐브 생성
    ///
    /// 싱글턴 모델이면 (정의 id, 구성 id) 키로 캐시를 먼저 확인하고,
    /// 프로토타입 모델이면 매 호출 파이프라인을 전부 수행한다.
    /// 어느 단계든 실패하면 `Error::Lifecycle`로 중단되고 부분 생성물은
    /// 어떤 레지스트리에도 공개되지 않는다.
    pub async fn create(
        &self,
        definition: &Arc<CubeDefinition>,
        config_id: Option<&Guid>,
        args: &[Value],
    ) -> Result<Arc<Cube>> {
        if definition.model == CubeModel::Singleton {
            let key = (definition.id.clone(), config_id.cloned());
            {
                let singletons = self.singletons.read().await;
                if let Some(cube) = singletons.get(&key) {
                    debug!("Returning cached singleton cube: {}", definition.id);
                    return Ok(Arc::clone(cube));
                }
            }

            let cube = self.run_pipeline(definition, args).await?;

            let mut singletons = self.singletons.write().await;
            // 동시 첫 생성 경쟁: 먼저 게시된 인스턴스가 이긴다
            let cube = singletons
                .entry(key)
                .or_insert_with(|| Arc::clone(&cube));
            Ok(Arc::clone(cube))
        } else {
            self.run_pipeline(definition, args).await
        }
    }

    /// 플러그인 호스트 조회 인터페이스: (cube id, 구성 id) -> 큐브 인스턴스
    ///
    /// 정의가 없으면 `None`. 생성 파이프라인 실패는 로깅 후 `None`으로
    /// 수렴한다 (해석 체인에서는 "cube not found"로 관측된다).
    pub async fn get_cube(&self, cube_id: &Guid, config_id: Option<&Guid>) -> Option<Arc<Cube>> {
        let definition = self.definition(cube_id).await?;

        match self.create(&definition, config_id, &[]).await {
            Ok(cube) => Some(cube),
            Err(e) => {
                error!("Failed to build cube {}: {}", cube_id, e);
                None
            }
        }
    }

    /// 캐시된 싱글턴 조회 (생성하지 않음)
    pub async fn cached(&self, cube_id: &Guid, config_id: Option<&Guid>) -> Option<Arc<Cube>> {
        let singletons = self.singletons.read().await;
        singletons
            .get(&(cube_id.clone(), config_id.cloned()))
            .map(Arc::clone)
    }

    /// 핫 리로드 통지: 해당 큐브의 캐시된 싱글턴 전부 폐기
    ///
    /// 다음 해석에서 파이프라인이 다시 수행된다. 구현 교체가 어떻게
    /// 도착하는지는 이 계층의 관심사가 아니다.
    pub async fn invalidate(&self, cube_id: &Guid) -> usize {
        let dropped = {
            let mut singletons = self.singletons.write().await;
            let before = singletons.len();
            singletons.retain(|(id, _), _| id != cube_id);
            before - singletons.len()
        };

        // 이벤트 핸들러가 팩토리로 재진입할 수 있으므로 락 해제 후 발행
        if dropped > 0 {
            info!("Invalidated {} cached instance(s) of cube {}", dropped, cube_id);
            self.event_bus.publish(cube_invalidated_event(cube_id)).await;
        }

        dropped
    }

    /// 캐시 전체 클리어
    pub async fn clear_singletons(&self) {
        let mut singletons = self.singletons.write().await;
        singletons.clear();
    }

    /// 캐시된 싱글턴 수
    pub async fn singleton_count(&self) -> usize {
        let singletons = self.singletons.read().await;
        singletons.len()
    }

    // ========================================================================
    // 파이프라인 단계
    // ========================================================================

    async fn run_pipeline(
        &self,
        definition: &Arc<CubeDefinition>,
        args: &[Value],
    ) -> Result<Arc<Cube>> {
        let cube = self.instantiate_phase(definition).await?;
        self.configure_phase(&cube, definition).await?;
        self.initialize_phase(&cube, definition, args).await?;

        info!(
            "Cube initialized: {} (instance {})",
            definition.id,
            cube.id()
        );
        self.event_bus
            .publish(cube_created_event(&definition.id, &definition.name))
            .await;

        Ok(cube)
    }

    /// 1단계: 인스턴스 할당 (부작용 없음)
    async fn instantiate_phase(&self, definition: &Arc<CubeDefinition>) -> Result<Arc<Cube>> {
        debug!("Instantiate phase | cube: {}", definition.id);

        let api = definition.construct();

        let mut packages = HashMap::new();
        for package_def in &definition.packages {
            let package =
                ExtensionPackage::from_definition(definition.id.clone(), package_def).await;
            packages.insert(package.id.clone(), Arc::new(package));
        }

        let metadata = CubeMetadata::from_definition(definition);
        Ok(Arc::new(Cube::new(metadata, api, packages)))
    }

    /// 2단계: 선언 속성 주입
    async fn configure_phase(&self, cube: &Arc<Cube>, definition: &Arc<CubeDefinition>) -> Result<()> {
        debug!("Configure phase | cube: {}", definition.id);

        if let Err(e) = cube.api().configure(&definition.properties).await {
            cube.set_state(LifecycleState::Failed).await;
            return Err(Error::lifecycle(
                definition.id.clone(),
                LifecyclePhase::Configure,
                e.to_string(),
            ));
        }

        cube.set_state(LifecycleState::Configured).await;
        Ok(())
    }

    /// 3단계: 초기화 (pre_init 훅 -> init -> post_init 훅)
    ///
    /// init이 `false`를 반환하면 실패와 동일하게 파이프라인을 중단한다.
    async fn initialize_phase(
        &self,
        cube: &Arc<Cube>,
        definition: &Arc<CubeDefinition>,
        args: &[Value],
    ) -> Result<()> {
        debug!("Initialize phase | cube: {}", definition.id);

        let hooks = {
            let hooks = self.hooks.read().await;
            hooks.clone()
        };

        for hook in &hooks {
            if let Err(e) = hook.pre_init(cube, definition, args).await {
                cube.set_state(LifecycleState::Failed).await;
                return Err(Error::lifecycle(
                    definition.id.clone(),
                    LifecyclePhase::Initialize,
                    format!("pre_init hook `{}` failed: {}", hook.name(), e),
                ));
            }
        }

        match cube.api().init().await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Cube init returned false | cube: {}", definition.id);
                cube.set_state(LifecycleState::Failed).await;
                return Err(Error::lifecycle(
                    definition.id.clone(),
                    LifecyclePhase::Initialize,
                    "init returned false",
                ));
            }
            Err(e) => {
                cube.set_state(LifecycleState::Failed).await;
                return Err(Error::lifecycle(
                    definition.id.clone(),
                    LifecyclePhase::Initialize,
                    e.to_string(),
                ));
            }
        }

        for hook in &hooks {
            if let Err(e) = hook.post_init(cube, definition, args).await {
                cube.set_state(LifecycleState::Failed).await;
                return Err(Error::lifecycle(
                    definition.id.clone(),
                    LifecyclePhase::Initialize,
                    format!("post_init hook `{}` failed: {}", hook.name(), e),
                ));
            }
        }

        cube.set_state(LifecycleState::Initialized).await;
        Ok(())
    }

    /// 이벤트 버스 접근
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

impl Default for CubeFactory {
    fn default() -> Self {
        Self::new()
    }
}
