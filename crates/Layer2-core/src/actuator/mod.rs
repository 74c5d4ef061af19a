//! Actuator - 실행 전략 계층
//!
//! 해석이 끝난 호출(`ExecuteContext`)을 실제로 수행하는 전략들.
//! 전략 선택은 시작 시 채워지는 키 기반 레지스트리 조회다 - 새 전략은
//! 해석 알고리즘을 건드리지 않고 `ActuatorKind` 키로 추가된다.

pub mod angel;
pub mod asynchronous;
pub mod generic;
pub mod proxy;

pub use angel::AngelActuator;
pub use asynchronous::AsyncActuator;
pub use generic::GenericActuator;
pub use proxy::ActuatorProxy;

use crate::cube::{CubeApi, ExtensionPackage, ExtensionPoint, Isolation, PointResult};
use crate::slot::Slot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_foundation::{Guid, Result};
use tokio::sync::RwLock;

// ============================================================================
// ActuatorKind - 전략 키
// ============================================================================

/// Actuator 전략 키
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    /// 동기 실행 (호출 태스크에서 직접)
    Generic,

    /// 비동기 실행 (백그라운드 태스크로 제출)
    Async,

    /// 샌드박스 실행 (angel 큐브 전용)
    Angel,
}

impl std::fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Async => write!(f, "async"),
            Self::Angel => write!(f, "angel"),
        }
    }
}

// ============================================================================
// ExecuteContext - 해석 결과 번들 (호출당 생성, 불변)
// ============================================================================

/// 실행 컨텍스트 - Dispatcher가 만들고 Actuator 한 번의 호출이 소비한다
///
/// 샌드박스 실행에서는 이 컨텍스트가 큐브에 노출되는 능력의 전부다.
pub struct ExecuteContext {
    /// 해석 시점의 Slot 스냅샷
    slot: Slot,

    /// 큐브 인스턴스 id (진단용)
    cube_instance_id: Guid,

    /// 큐브 구현 핸들
    cube_api: Arc<dyn CubeApi>,

    /// 격리 수준
    isolation: Isolation,

    /// 해석된 패키지
    package: Arc<ExtensionPackage>,

    /// 해석된 포인트
    point: Arc<ExtensionPoint>,

    /// 호출 인자
    args: Vec<Value>,
}

impl std::fmt::Debug for ExecuteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecuteContext")
            .field("slot", &self.slot)
            .field("cube_instance_id", &self.cube_instance_id)
            .field("isolation", &self.isolation)
            .field("package", &self.package)
            .field("point", &self.point)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl ExecuteContext {
    pub fn new(
        slot: Slot,
        cube_instance_id: Guid,
        cube_api: Arc<dyn CubeApi>,
        isolation: Isolation,
        package: Arc<ExtensionPackage>,
        point: Arc<ExtensionPoint>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            slot,
            cube_instance_id,
            cube_api,
            isolation,
            package,
            point,
            args,
        }
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn cube_instance_id(&self) -> &Guid {
        &self.cube_instance_id
    }

    pub fn cube_api(&self) -> &Arc<dyn CubeApi> {
        &self.cube_api
    }

    pub fn isolation(&self) -> Isolation {
        self.isolation
    }

    pub fn is_angel(&self) -> bool {
        self.isolation.is_angel()
    }

    pub fn package(&self) -> &Arc<ExtensionPackage> {
        &self.package
    }

    pub fn point(&self) -> &Arc<ExtensionPoint> {
        &self.point
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

// ============================================================================
// CubeActuator - 실행 전략 트레이트
// ============================================================================

/// 실행 전략 트레이트
#[async_trait]
pub trait CubeActuator: Send + Sync {
    /// 전략 키
    fn kind(&self) -> ActuatorKind;

    /// 해석된 호출 실행
    async fn execute(&self, ctx: Arc<ExecuteContext>) -> Result<PointResult>;

    /// 진행 중인 작업 중지 (advisory)
    async fn stop(&self, ctx: Arc<ExecuteContext>) -> Result<bool>;
}

// ============================================================================
// ActuatorRegistry - 열린 전략 레지스트리
// ============================================================================

/// Actuator 레지스트리 - 키 기반 전략 조회
pub struct ActuatorRegistry {
    actuators: RwLock<HashMap<ActuatorKind, Arc<dyn CubeActuator>>>,
}

impl ActuatorRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self {
            actuators: RwLock::new(HashMap::new()),
        }
    }

    /// 기본 전략 3종으로 초기화
    pub async fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(GenericActuator::new())).await;
        registry.register(Arc::new(AsyncActuator::new())).await;
        registry.register(Arc::new(AngelActuator::new())).await;
        registry
    }

    /// 전략 등록 (같은 키는 교체)
    pub async fn register(&self, actuator: Arc<dyn CubeActuator>) {
        let mut actuators = self.actuators.write().await;
        actuators.insert(actuator.kind(), actuator);
    }

    /// 전략 조회
    pub async fn get(&self, kind: ActuatorKind) -> Option<Arc<dyn CubeActuator>> {
        let actuators = self.actuators.read().await;
        actuators.get(&kind).map(Arc::clone)
    }

    /// 등록된 전략 키 목록
    pub async fn kinds(&self) -> Vec<ActuatorKind> {
        let actuators = self.actuators.read().await;
        actuators.keys().copied().collect()
    }

    /// 등록된 전략 수
    pub async fn len(&self) -> usize {
        let actuators = self.actuators.read().await;
        actuators.len()
    }

    pub async fn is_empty(&self) -> bool {
        let actuators = self.actuators.read().await;
        actuators.is_empty()
    }
}

impl Default for ActuatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_defaults() {
        let registry = ActuatorRegistry::with_defaults().await;

        assert_eq!(registry.len().await, 3);
        assert!(registry.get(ActuatorKind::Generic).await.is_some());
        assert!(registry.get(ActuatorKind::Async).await.is_some());
        assert!(registry.get(ActuatorKind::Angel).await.is_some());
    }

    #[tokio::test]
    async fn test_registry_is_open() {
        // 새 전략이 기존 키들과 독립적으로 등록된다
        struct CustomActuator;

        #[async_trait]
        impl CubeActuator for CustomActuator {
            fn kind(&self) -> ActuatorKind {
                ActuatorKind::Generic
            }

            async fn execute(&self, _ctx: Arc<ExecuteContext>) -> Result<PointResult> {
                Ok(PointResult::new().with_item("custom", serde_json::json!(true)))
            }

            async fn stop(&self, _ctx: Arc<ExecuteContext>) -> Result<bool> {
                Ok(true)
            }
        }

        let registry = ActuatorRegistry::with_defaults().await;
        registry.register(Arc::new(CustomActuator)).await;

        // 같은 키는 교체된다
        assert_eq!(registry.len().await, 3);
    }
}
