//! Extension - 확장 포인트/패키지/결과 모델
//!
//! Cube가 내보내는 확장 계층: Package -> Point -> Extension -> PointResult

use super::api::CubeApi;
use super::definition::ExPackageDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_foundation::{Guid, Result};
use tokio::sync::RwLock;

// ============================================================================
// PointResult - 호출당 생성되는 이름 붙은 결과 집합
// ============================================================================

/// Extension Point 호출 결과 - 이름 붙은 항목들의 집합
///
/// 호출마다 새로 생성되고 사용 후 폐기된다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointResult {
    items: HashMap<String, Value>,
}

impl PointResult {
    /// 빈 결과 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 패턴: 항목 추가
    pub fn with_item(mut self, name: impl Into<String>, value: Value) -> Self {
        self.items.insert(name.into(), value);
        self
    }

    /// 항목 추가
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.items.insert(name.into(), value);
    }

    /// 항목 조회
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.items.get(name)
    }

    /// 항목 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// 다른 결과 병합 (키 충돌 시 other가 우선)
    pub fn merge(&mut self, other: PointResult) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// ResultDescriptor - 포인트가 선언하는 결과 항목들
// ============================================================================

/// Result Descriptor - Extension Point가 생산할 수 있는 결과 항목 선언
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultDescriptor {
    /// 선언된 항목 이름 (선언 순서 유지)
    items: Vec<String>,
}

impl ResultDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 패턴: 항목 선언
    pub fn with_item(mut self, name: impl Into<String>) -> Self {
        self.items.push(name.into());
        self
    }

    /// 해당 이름이 선언되어 있는지 확인 (해석 6단계에서 사용)
    pub fn declares(&self, name: &str) -> bool {
        self.items.iter().any(|item| item == name)
    }

    /// 선언된 항목 목록
    pub fn items(&self) -> &[String] {
        &self.items
    }
}

impl From<&[String]> for ResultDescriptor {
    fn from(items: &[String]) -> Self {
        Self {
            items: items.to_vec(),
        }
    }
}

// ============================================================================
// Extension - 확장 구현 트레이트
// ============================================================================

/// 확장 구현 트레이트 - 포인트에 등록되는 실행 단위
#[async_trait]
pub trait Extension: Send + Sync {
    /// 확장 이름
    fn name(&self) -> &str;

    /// 우선순위 (오름차순 실행, 동률은 등록 순서 유지)
    fn priority(&self) -> i32 {
        0
    }

    /// 확장 호출
    async fn invoke(&self, cube: Arc<dyn CubeApi>, args: &[Value]) -> Result<PointResult>;
}

/// 클로저 기반 확장 - 함수 하나로 확장을 정의할 때 사용
pub struct FnExtension {
    name: String,
    priority: i32,
    handler: Box<dyn Fn(Arc<dyn CubeApi>, &[Value]) -> Result<PointResult> + Send + Sync>,
}

impl FnExtension {
    pub fn new<F>(name: impl Into<String>, priority: i32, handler: F) -> Self
    where
        F: Fn(Arc<dyn CubeApi>, &[Value]) -> Result<PointResult> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority,
            handler: Box::new(handler),
        }
    }
}

#[async_trait]
impl Extension for FnExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn invoke(&self, cube: Arc<dyn CubeApi>, args: &[Value]) -> Result<PointResult> {
        (self.handler)(cube, args)
    }
}

// ============================================================================
// ExtensionPoint - 우선순위 정렬된 확장 목록 + Result Descriptor
// ============================================================================

/// Extension Point - 이름 붙은 확장 훅
///
/// 확장 목록은 생성 후에도 등록으로 늘어날 수 있어 내부 가변성을 가진다.
/// 포인트 자체는 `Arc`로 공유되고, 해석은 항상 새 조회이므로
/// 리바인딩/교체와 충돌하지 않는다.
pub struct ExtensionPoint {
    /// 패키지 내 고유 id
    pub id: Guid,

    /// 표시 이름
    pub name: String,

    /// Result Descriptor
    descriptor: ResultDescriptor,

    /// 확장 목록 (우선순위 오름차순, 동률은 등록 순서)
    extensions: RwLock<Vec<Arc<dyn Extension>>>,
}

impl ExtensionPoint {
    /// 새 포인트 생성
    pub fn new(id: impl Into<Guid>, name: impl Into<String>, descriptor: ResultDescriptor) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            descriptor,
            extensions: RwLock::new(Vec::new()),
        }
    }

    /// Result Descriptor 조회
    pub fn descriptor(&self) -> &ResultDescriptor {
        &self.descriptor
    }

    /// 확장 등록 - 우선순위 오름차순 유지 (stable sort로 동률 순서 보존)
    pub async fn register_extension(&self, extension: Arc<dyn Extension>) {
        let mut extensions = self.extensions.write().await;
        extensions.push(extension);
        extensions.sort_by_key(|ext| ext.priority());
    }

    /// 현재 확장 목록 스냅샷
    pub async fn extensions(&self) -> Vec<Arc<dyn Extension>> {
        let extensions = self.extensions.read().await;
        extensions.clone()
    }

    /// 등록된 확장 수
    pub async fn extension_count(&self) -> usize {
        let extensions = self.extensions.read().await;
        extensions.len()
    }

    /// 포인트 호출 - 확장들을 우선순위 순서로 실행하고 결과를 병합
    ///
    /// 키 충돌 시 나중에 실행된 확장의 항목이 남는다.
    pub async fn invoke(&self, cube: Arc<dyn CubeApi>, args: &[Value]) -> Result<PointResult> {
        let extensions = self.extensions().await;

        let mut merged = PointResult::new();
        for extension in extensions {
            let result = extension.invoke(Arc::clone(&cube), args).await?;
            merged.merge(result);
        }

        Ok(merged)
    }
}

impl std::fmt::Debug for ExtensionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionPoint")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

// ============================================================================
// ExtensionPackage - 큐브가 내보내는 포인트 그룹
// ============================================================================

/// Extension Package - 큐브가 내보내는, id로 조회되는 포인트 그룹
///
/// 포인트 멤버십은 정의 시점에 고정된다.
pub struct ExtensionPackage {
    /// 큐브 내 고유 id
    pub id: Guid,

    /// 소유 큐브 id
    pub cube_id: Guid,

    /// 표시 이름
    pub name: String,

    /// 포함된 포인트들
    points: HashMap<Guid, Arc<ExtensionPoint>>,
}

impl ExtensionPackage {
    /// 정의로부터 패키지 구축 (큐브 instantiate 단계에서 호출)
    pub async fn from_definition(cube_id: Guid, definition: &ExPackageDefinition) -> Self {
        let mut points = HashMap::new();

        for point_def in &definition.points {
            let descriptor = ResultDescriptor::from(point_def.result_items.as_slice());
            let point = ExtensionPoint::new(point_def.id.clone(), &point_def.name, descriptor);

            for extension in &point_def.extensions {
                point.register_extension(Arc::clone(extension)).await;
            }

            points.insert(point_def.id.clone(), Arc::new(point));
        }

        Self {
            id: definition.id.clone(),
            cube_id,
            name: definition.name.clone(),
            points,
        }
    }

    /// 포인트 조회
    pub fn find_point(&self, point_id: &Guid) -> Option<Arc<ExtensionPoint>> {
        self.points.get(point_id).map(Arc::clone)
    }

    /// 포인트 수
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

impl std::fmt::Debug for ExtensionPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionPackage")
            .field("id", &self.id)
            .field("cube_id", &self.cube_id)
            .field("name", &self.name)
            .field("points", &self.points.len())
            .finish()
    }
}
