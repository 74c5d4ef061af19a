//! Cube - 라이브 큐브 인스턴스 모델

use super::api::CubeApi;
use super::definition::{CubeDefinition, CubeModel, CubeVersion, Isolation};
use super::extension::ExtensionPackage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tessera_foundation::Guid;
use tokio::sync::RwLock;

// ============================================================================
// LifecycleState - 라이프사이클 상태
// ============================================================================

/// 큐브 라이프사이클 상태
///
/// `Defined -> Instantiated -> Configured -> Initialized` 순서로 진행하며
/// 어느 단계에서든 실패하면 터미널 상태인 `Failed`로 간다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// 정의만 등록됨
    Defined,

    /// 인스턴스 할당 완료
    Instantiated,

    /// 속성 주입 완료
    Configured,

    /// 초기화 완료 (ready)
    Initialized,

    /// 실패 (터미널)
    Failed,
}

impl LifecycleState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Initialized)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defined => write!(f, "defined"),
            Self::Instantiated => write!(f, "instantiated"),
            Self::Configured => write!(f, "configured"),
            Self::Initialized => write!(f, "initialized"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ============================================================================
// CubeMetadata - 정의에서 복사되는 인스턴스 메타데이터
// ============================================================================

/// 큐브 메타데이터 (정의에서 유래, 인스턴스와 함께 보관)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeMetadata {
    /// 정의 id
    pub definition_id: Guid,

    /// 표시 이름
    pub name: String,

    /// 버전
    pub version: CubeVersion,

    /// 설명
    pub description: String,

    /// 인스턴스 모델
    pub model: CubeModel,

    /// 격리 수준
    pub isolation: Isolation,
}

impl CubeMetadata {
    /// 정의로부터 메타데이터 추출
    pub fn from_definition(definition: &CubeDefinition) -> Self {
        Self {
            definition_id: definition.id.clone(),
            name: definition.name.clone(),
            version: definition.version.clone(),
            description: definition.description.clone(),
            model: definition.model,
            isolation: definition.isolation,
        }
    }
}

// ============================================================================
// Cube - 라이브 인스턴스
// ============================================================================

/// 라이브 큐브 인스턴스
///
/// Extension Package/Point를 배타적으로 소유한다. Slot은 id 참조만 들고
/// 해석 시점마다 새로 조회하므로 인스턴스 교체에 dangling 참조가 없다.
pub struct Cube {
    /// 인스턴스 고유 id (정의 id와 별개)
    id: Guid,

    /// 메타데이터
    metadata: CubeMetadata,

    /// 라이프사이클 상태
    state: RwLock<LifecycleState>,

    /// 플러그인 구현 핸들
    api: Arc<dyn CubeApi>,

    /// 소유한 Extension Package들
    packages: HashMap<Guid, Arc<ExtensionPackage>>,
}

impl Cube {
    /// 새 인스턴스 생성 (instantiate 단계)
    pub fn new(
        metadata: CubeMetadata,
        api: Arc<dyn CubeApi>,
        packages: HashMap<Guid, Arc<ExtensionPackage>>,
    ) -> Self {
        Self {
            id: Guid::new(),
            metadata,
            state: RwLock::new(LifecycleState::Instantiated),
            api,
            packages,
        }
    }

    /// 인스턴스 id
    pub fn id(&self) -> &Guid {
        &self.id
    }

    /// 메타데이터
    pub fn metadata(&self) -> &CubeMetadata {
        &self.metadata
    }

    /// 구현 핸들
    pub fn api(&self) -> &Arc<dyn CubeApi> {
        &self.api
    }

    /// Angel(샌드박스) 큐브 여부
    pub fn is_angel(&self) -> bool {
        self.metadata.isolation.is_angel()
    }

    /// 현재 상태
    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// 상태 전이
    pub async fn set_state(&self, state: LifecycleState) {
        let mut current = self.state.write().await;
        *current = state;
    }

    /// 패키지 조회
    pub fn find_package(&self, package_id: &Guid) -> Option<Arc<ExtensionPackage>> {
        self.packages.get(package_id).map(Arc::clone)
    }

    /// 패키지 수
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

impl std::fmt::Debug for Cube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cube")
            .field("id", &self.id)
            .field("name", &self.metadata.name)
            .field("model", &self.metadata.model)
            .field("isolation", &self.metadata.isolation)
            .field("packages", &self.packages.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    struct NoopCube;

    impl CubeApi for NoopCube {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn test_metadata(isolation: Isolation) -> CubeMetadata {
        CubeMetadata {
            definition_id: Guid::of("test.cube"),
            name: "Test".into(),
            version: CubeVersion::default(),
            description: String::new(),
            model: CubeModel::Singleton,
            isolation,
        }
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let cube = Cube::new(test_metadata(Isolation::Generic), Arc::new(NoopCube), HashMap::new());

        assert_eq!(cube.state().await, LifecycleState::Instantiated);
        assert!(!cube.state().await.is_ready());

        cube.set_state(LifecycleState::Initialized).await;
        assert!(cube.state().await.is_ready());
    }

    #[test]
    fn test_instance_ids_differ() {
        let a = Cube::new(test_metadata(Isolation::Generic), Arc::new(NoopCube), HashMap::new());
        let b = Cube::new(test_metadata(Isolation::Generic), Arc::new(NoopCube), HashMap::new());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_is_angel() {
        let cube = Cube::new(test_metadata(Isolation::Angel), Arc::new(NoopCube), HashMap::new());
        assert!(cube.is_angel());
    }
}
