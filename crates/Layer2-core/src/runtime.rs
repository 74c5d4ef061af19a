//! Cube Runtime - 런타임 퍼사드
//!
//! 팩토리, Slot 레지스트리, Actuator 레지스트리, 프록시, 이벤트 버스를
//! 하나로 묶은 진입점. 임베딩하는 호스트는 이 타입 하나로 큐브 등록부터
//! Slot 실행까지 전부 수행한다. 런타임은 명시적으로 소유되는 인스턴스라
//! 프로세스 안에 여러 개 둘 수 있다.

use crate::actuator::{ActuatorProxy, ActuatorRegistry, CubeActuator};
use crate::cube::{
    CubeDefinition, CubeFactory, CubeModel, CubeVersion, Isolation, LifecycleHook, PointResult,
};
use crate::slot::{Slot, SlotRegistry, SlotSetup};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tessera_foundation::{
    slot_bound_event, Error, EventBus, EventType, Guid, Result, RuntimeEvent,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

// ============================================================================
// RuntimeConfig - 런타임 구성
// ============================================================================

/// 런타임 구성
///
/// 두 용량 모두 최소 1로 보정된다 (0은 허용되지 않음).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 이벤트 브로드캐스트 채널 용량
    pub event_channel_capacity: usize,

    /// 이벤트 히스토리 보관 개수
    pub event_history_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: 1024,
            event_history_size: 100,
        }
    }
}

// ============================================================================
// CubeInfo / CubeFilter - 조회용 뷰
// ============================================================================

/// 등록된 큐브 정의의 조회용 요약
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeInfo {
    pub id: Guid,
    pub name: String,
    pub version: CubeVersion,
    pub description: String,
    pub model: CubeModel,
    pub isolation: Isolation,
}

impl CubeInfo {
    fn from_definition(definition: &CubeDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            version: definition.version.clone(),
            description: definition.description.clone(),
            model: definition.model,
            isolation: definition.isolation,
        }
    }
}

/// 큐브 정의 필터 - 모든 조건은 AND로 결합
#[derive(Debug, Clone, Default)]
pub struct CubeFilter {
    /// 이름 부분 일치 (대소문자 무시)
    pub name: Option<String>,

    /// 인스턴스 모델 일치
    pub model: Option<CubeModel>,

    /// 호환 버전 (같은 메이저)
    pub compatible_with: Option<CubeVersion>,
}

impl CubeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_model(mut self, model: CubeModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn compatible_with(mut self, version: CubeVersion) -> Self {
        self.compatible_with = Some(version);
        self
    }

    fn matches(&self, info: &CubeInfo) -> bool {
        if let Some(name) = &self.name {
            if !info.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(model) = self.model {
            if info.model != model {
                return false;
            }
        }
        if let Some(version) = &self.compatible_with {
            if !info.version.is_compatible_with(version) {
                return false;
            }
        }
        true
    }
}

/// 런타임 상태 요약
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSummary {
    pub definitions: usize,
    pub cached_singletons: usize,
    pub slots: usize,
    pub actuators: usize,
}

// ============================================================================
// CubeRuntime - 퍼사드
// ============================================================================

/// Cube 런타임 - 등록/바인딩/실행의 단일 진입점
pub struct CubeRuntime {
    event_bus: Arc<EventBus>,
    factory: Arc<CubeFactory>,
    slots: Arc<SlotRegistry>,
    actuators: Arc<ActuatorRegistry>,
    proxy: ActuatorProxy,
}

impl CubeRuntime {
    /// 기본 구성으로 런타임 생성
    pub async fn new() -> Self {
        Self::with_config(RuntimeConfig::default()).await
    }

    /// 구성 지정하여 런타임 생성 (기본 Actuator 3종 등록됨)
    pub async fn with_config(config: RuntimeConfig) -> Self {
        let event_bus = Arc::new(EventBus::with_capacity(
            config.event_channel_capacity,
            config.event_history_size,
        ));
        let factory = Arc::new(CubeFactory::with_event_bus(Arc::clone(&event_bus)));
        let slots = Arc::new(SlotRegistry::new());
        let actuators = Arc::new(ActuatorRegistry::with_defaults().await);

        let proxy = ActuatorProxy::new(
            Arc::clone(&factory),
            Arc::clone(&slots),
            Arc::clone(&actuators),
        );

        info!("Cube runtime initialized");
        Self {
            event_bus,
            factory,
            slots,
            actuators,
            proxy,
        }
    }

    // ========================================================================
    // 큐브 정의
    // ========================================================================

    /// 큐브 정의 등록
    pub async fn register_definition(&self, definition: CubeDefinition) -> Result<()> {
        self.factory.register_definition(definition).await
    }

    /// 라이프사이클 훅 등록
    pub async fn register_hook(&self, hook: Arc<dyn LifecycleHook>) {
        self.factory.register_hook(hook).await;
    }

    /// 정의 존재 여부
    pub async fn has_cube(&self, cube_id: &Guid) -> bool {
        self.factory.contains(cube_id).await
    }

    /// 등록된 모든 큐브 요약
    pub async fn list_cubes(&self) -> Vec<CubeInfo> {
        self.factory
            .definitions()
            .await
            .iter()
            .map(|d| CubeInfo::from_definition(d))
            .collect()
    }

    /// 필터에 맞는 큐브 요약
    pub async fn filter_cubes(&self, filter: &CubeFilter) -> Vec<CubeInfo> {
        self.list_cubes()
            .await
            .into_iter()
            .filter(|info| filter.matches(info))
            .collect()
    }

    /// 핫 리로드 통지: 해당 큐브의 캐시된 인스턴스 폐기
    ///
    /// 다음 해석부터 파이프라인이 다시 수행된다.
    pub async fn invalidate(&self, cube_id: &Guid) -> usize {
        self.factory.invalidate(cube_id).await
    }

    // ========================================================================
    // Slot 구성
    // ========================================================================

    /// 미구성 Slot 생성
    pub async fn create_slot(&self, slot_id: impl Into<Guid>, name: impl Into<String>) -> bool {
        let slot = Slot::new(slot_id, name);
        let registered = self.slots.register(slot.clone()).await;
        if registered {
            self.event_bus
                .publish(RuntimeEvent::new(
                    EventType::SlotRegistered,
                    serde_json::json!({ "slot_id": slot.id }),
                    "runtime",
                ))
                .await;
        }
        registered
    }

    /// Slot 바인딩/재바인딩 - 다음 호출부터 반영
    ///
    /// 타깃은 여기서 검증하지 않는다 (lazy validation - 해석 시 확인).
    pub async fn bind_slot(&self, slot_id: &Guid, setup: SlotSetup) -> Result<()> {
        if !self.slots.rebind(slot_id, setup.clone()).await {
            return Err(Error::NotFound(format!("slot {}", slot_id)));
        }

        self.event_bus
            .publish(slot_bound_event(slot_id, &setup.cube_id, &setup.point_id))
            .await;
        Ok(())
    }

    /// 바인딩 해제 (Slot은 미구성 상태로 유지)
    pub async fn unbind_slot(&self, slot_id: &Guid) -> bool {
        let unbound = self.slots.unbind(slot_id).await;
        if unbound {
            self.event_bus
                .publish(RuntimeEvent::new(
                    EventType::SlotUnbound,
                    serde_json::json!({ "slot_id": slot_id }),
                    "runtime",
                ))
                .await;
        }
        unbound
    }

    /// Slot 제거
    pub async fn remove_slot(&self, slot_id: &Guid) -> bool {
        let removed = self.slots.remove(slot_id).await.is_some();
        if removed {
            self.event_bus
                .publish(RuntimeEvent::new(
                    EventType::SlotRemoved,
                    serde_json::json!({ "slot_id": slot_id }),
                    "runtime",
                ))
                .await;
        }
        removed
    }

    /// 모든 Slot 목록
    pub async fn list_slots(&self) -> Vec<Slot> {
        self.slots.list().await
    }

    // ========================================================================
    // 실행
    // ========================================================================

    /// Slot 실행 - 해석/실행 실패는 로깅 후 `None`
    pub async fn execute(&self, slot_id: &Guid, args: Vec<Value>) -> Option<PointResult> {
        self.proxy.execute(slot_id, args).await
    }

    /// Slot 중지 - 어떤 실패든 로깅 후 `true` (best-effort)
    pub async fn stop(&self, slot_id: &Guid) -> bool {
        self.proxy.stop(slot_id).await
    }

    /// Actuator 전략 추가/교체
    pub async fn register_actuator(&self, actuator: Arc<dyn CubeActuator>) {
        self.actuators.register(actuator).await;
    }

    // ========================================================================
    // Angel 큐브 제어
    // ========================================================================

    /// Angel 큐브 시작 - 인스턴스를 만들고 start 신호를 보낸다
    pub async fn start_angel(&self, cube_id: &Guid, config_id: Option<&Guid>) -> Result<bool> {
        let definition = self
            .factory
            .definition(cube_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("cube {}", cube_id)))?;

        if !definition.isolation.is_angel() {
            return Err(Error::InvalidInput(format!(
                "cube {} is not an angel cube",
                cube_id
            )));
        }

        let cube = self
            .factory
            .get_cube(cube_id, config_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("cube {}", cube_id)))?;

        let started = cube.api().start().await?;
        if started {
            info!("Angel cube started: {} (instance {})", cube_id, cube.id());
            self.event_bus
                .publish(RuntimeEvent::new(
                    EventType::AngelStarted,
                    serde_json::json!({ "cube_id": cube_id, "instance_id": cube.id() }),
                    "runtime",
                ))
                .await;
        }
        Ok(started)
    }

    /// Angel 큐브 중지 - 캐시된 인스턴스에만 stop 신호 (advisory)
    ///
    /// 캐시에 없으면 보낼 대상이 없으므로 `Ok(false)`.
    pub async fn stop_angel(&self, cube_id: &Guid, config_id: Option<&Guid>) -> Result<bool> {
        let definition = self
            .factory
            .definition(cube_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("cube {}", cube_id)))?;

        if !definition.isolation.is_angel() {
            return Err(Error::InvalidInput(format!(
                "cube {} is not an angel cube",
                cube_id
            )));
        }

        let Some(cube) = self.factory.cached(cube_id, config_id).await else {
            warn!("No cached instance of angel cube {} to stop", cube_id);
            return Ok(false);
        };

        let stopped = cube.api().stop().await?;
        if stopped {
            info!("Angel cube stopped: {}", cube_id);
            self.event_bus
                .publish(RuntimeEvent::new(
                    EventType::AngelStopped,
                    serde_json::json!({ "cube_id": cube_id }),
                    "runtime",
                ))
                .await;
        }
        Ok(stopped)
    }

    // ========================================================================
    // 관측
    // ========================================================================

    /// 이벤트 버스 접근
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// 이벤트 구독 (스트림 반환)
    pub fn subscribe_events(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.event_bus.subscribe()
    }

    /// 런타임 상태 요약
    pub async fn summary(&self) -> RuntimeSummary {
        RuntimeSummary {
            definitions: self.factory.definition_count().await,
            cached_singletons: self.factory.singleton_count().await,
            slots: self.slots.len().await,
            actuators: self.actuators.len().await,
        }
    }
}
