//! Cube Definition - 큐브 정적 정의 (등록 후 불변)

use super::api::CubeApi;
use super::extension::Extension;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_foundation::Guid;

// ============================================================================
// CubeVersion - 큐브 버전
// ============================================================================

/// 큐브 버전
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CubeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl CubeVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// 버전 문자열 파싱 (예: "1.2.3")
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        Some(Self {
            major: parts[0].parse().ok()?,
            minor: parts[1].parse().ok()?,
            patch: parts[2].parse().ok()?,
        })
    }

    /// 호환성 검사
    pub fn is_compatible_with(&self, other: &CubeVersion) -> bool {
        // 같은 메이저 버전이면 호환
        self.major == other.major
    }
}

impl std::fmt::Display for CubeVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for CubeVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

// ============================================================================
// CubeModel / Isolation - 인스턴스 모델과 격리 수준
// ============================================================================

/// 인스턴스 생성 모델
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubeModel {
    /// 정의당 하나의 live 인스턴스 (캐시됨)
    Singleton,

    /// 호출마다 새 인스턴스
    Prototype,
}

impl Default for CubeModel {
    fn default() -> Self {
        Self::Singleton
    }
}

impl std::fmt::Display for CubeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::Prototype => write!(f, "prototype"),
        }
    }
}

/// 격리 수준 - Actuator 선택의 유일한 하드코딩 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    /// 신뢰된 큐브: 호출 스레드에서 직접 실행
    Generic,

    /// 샌드박스 큐브 (angel): 비신뢰 실행 경로로 라우팅
    Angel,
}

impl Default for Isolation {
    fn default() -> Self {
        Self::Generic
    }
}

impl Isolation {
    pub fn is_angel(&self) -> bool {
        matches!(self, Self::Angel)
    }
}

impl std::fmt::Display for Isolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Angel => write!(f, "angel"),
        }
    }
}

// ============================================================================
// ExPointDefinition / ExPackageDefinition - 확장 메타데이터
// ============================================================================

/// Extension Point 정의 - 결과 항목 선언 + 확장 구현 목록
pub struct ExPointDefinition {
    /// 패키지 내 고유 id
    pub id: Guid,

    /// 표시 이름
    pub name: String,

    /// 선언된 결과 항목 이름들
    pub result_items: Vec<String>,

    /// 확장 구현 (우선순위 정렬은 포인트 생성 시 수행)
    pub extensions: Vec<Arc<dyn Extension>>,
}

impl ExPointDefinition {
    pub fn new(id: impl Into<Guid>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            result_items: vec![],
            extensions: vec![],
        }
    }

    /// 빌더 패턴: 결과 항목 선언
    pub fn with_result_item(mut self, item: impl Into<String>) -> Self {
        self.result_items.push(item.into());
        self
    }

    /// 빌더 패턴: 확장 구현 추가
    pub fn with_extension(mut self, extension: Arc<dyn Extension>) -> Self {
        self.extensions.push(extension);
        self
    }
}

/// Extension Package 정의 - 큐브가 내보내는 포인트 그룹
pub struct ExPackageDefinition {
    /// 큐브 내 고유 id
    pub id: Guid,

    /// 표시 이름
    pub name: String,

    /// 포함된 포인트들 (멤버십은 정의 시점에 고정)
    pub points: Vec<ExPointDefinition>,
}

impl ExPackageDefinition {
    pub fn new(id: impl Into<Guid>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            points: vec![],
        }
    }

    /// 빌더 패턴: 포인트 추가
    pub fn with_point(mut self, point: ExPointDefinition) -> Self {
        self.points.push(point);
        self
    }
}

// ============================================================================
// CubeDefinition - 큐브 정의
// ============================================================================

/// `CubeApi` 구현체를 생성하는 팩토리 클로저
pub type CubeConstructor = Arc<dyn Fn() -> Arc<dyn CubeApi> + Send + Sync>;

/// 큐브 정의 - 등록 후 불변인 정적 메타데이터 + 구현 참조
pub struct CubeDefinition {
    /// 고유 큐브 id (예: "system.log")
    pub id: Guid,

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

    /// configure 단계에서 주입되는 선언 속성
    pub properties: HashMap<String, Value>,

    /// 내보내는 Extension Package 정의
    pub packages: Vec<ExPackageDefinition>,

    /// 구현 참조
    constructor: CubeConstructor,
}

impl CubeDefinition {
    /// 새 정의 생성
    pub fn new(
        id: impl Into<Guid>,
        name: impl Into<String>,
        constructor: CubeConstructor,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: CubeVersion::default(),
            description: String::new(),
            model: CubeModel::default(),
            isolation: Isolation::default(),
            properties: HashMap::new(),
            packages: vec![],
            constructor,
        }
    }

    /// 빌더 패턴: 버전 설정
    pub fn with_version(mut self, version: CubeVersion) -> Self {
        self.version = version;
        self
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// 빌더 패턴: 인스턴스 모델 설정
    pub fn with_model(mut self, model: CubeModel) -> Self {
        self.model = model;
        self
    }

    /// 빌더 패턴: 격리 수준 설정
    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    /// 빌더 패턴: 선언 속성 추가
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// 빌더 패턴: 패키지 추가
    pub fn with_package(mut self, package: ExPackageDefinition) -> Self {
        self.packages.push(package);
        self
    }

    /// 구현 인스턴스 생성 (instantiate 단계에서 호출)
    pub fn construct(&self) -> Arc<dyn CubeApi> {
        (self.constructor)()
    }
}

impl std::fmt::Debug for CubeDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CubeDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("model", &self.model)
            .field("isolation", &self.isolation)
            .field("packages", &self.packages.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::api::CubeApi;
    use std::any::Any;

    struct NoopCube;

    impl CubeApi for NoopCube {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn noop_constructor() -> CubeConstructor {
        Arc::new(|| Arc::new(NoopCube))
    }

    #[test]
    fn test_version_parse() {
        let v = CubeVersion::parse("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);

        assert!(CubeVersion::parse("1.2").is_none());
    }

    #[test]
    fn test_version_compatibility() {
        let v1 = CubeVersion::new(1, 0, 0);
        let v2 = CubeVersion::new(1, 2, 0);
        let v3 = CubeVersion::new(2, 0, 0);

        assert!(v1.is_compatible_with(&v2));
        assert!(!v1.is_compatible_with(&v3));
    }

    #[test]
    fn test_definition_builder() {
        let definition = CubeDefinition::new("system.log", "System Logger", noop_constructor())
            .with_version(CubeVersion::new(1, 0, 0))
            .with_description("logging cube")
            .with_model(CubeModel::Singleton)
            .with_isolation(Isolation::Generic)
            .with_package(
                ExPackageDefinition::new("sys.log", "log package").with_point(
                    ExPointDefinition::new("error", "error output").with_result_item("ack"),
                ),
            );

        assert_eq!(definition.id, Guid::of("system.log"));
        assert_eq!(definition.packages.len(), 1);
        assert_eq!(definition.packages[0].points[0].result_items, vec!["ack"]);
        assert!(!definition.isolation.is_angel());
    }
}
