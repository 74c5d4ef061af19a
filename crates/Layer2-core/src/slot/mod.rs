//! Slot - 내구성 있는, 재바인딩 가능한 호출 지점
//!
//! Slot은 (cube, package, point, result name) 타깃을 id로만 참조한다.
//! 소유하지 않으므로 해석은 항상 새 조회이고, 리바인딩이나 큐브 교체는
//! 다음 호출부터 자연히 반영된다 (dangling 참조 없음).

pub mod registry;

pub use registry::SlotRegistry;

use serde::{Deserialize, Serialize};
use tessera_foundation::Guid;

// ============================================================================
// SlotSetup - 바인딩 타깃 (원자적 단위)
// ============================================================================

/// Slot 바인딩 타깃
///
/// 하나의 단위로 읽고 복사된다 - 진행 중인 해석은 옛 타깃 전체 아니면
/// 새 타깃 전체를 보며, 절대 섞인 타깃을 보지 않는다.
/// 바인딩 시점에는 검증하지 않는다 (lazy validation - 해석 시 확인).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSetup {
    /// 타깃 큐브 정의 id
    pub cube_id: Guid,

    /// 인스턴스 구성 id (불투명 - "world" 구분 등 외부 소관)
    pub config_id: Option<Guid>,

    /// 타깃 Extension Package id
    pub package_id: Guid,

    /// 타깃 Extension Point id
    pub point_id: Guid,

    /// 요청하는 결과 항목 이름
    pub result_name: String,
}

impl SlotSetup {
    pub fn new(
        cube_id: impl Into<Guid>,
        package_id: impl Into<Guid>,
        point_id: impl Into<Guid>,
        result_name: impl Into<String>,
    ) -> Self {
        Self {
            cube_id: cube_id.into(),
            config_id: None,
            package_id: package_id.into(),
            point_id: point_id.into(),
            result_name: result_name.into(),
        }
    }

    /// 빌더 패턴: 구성 id 설정
    pub fn with_config_id(mut self, config_id: impl Into<Guid>) -> Self {
        self.config_id = Some(config_id.into());
        self
    }
}

// ============================================================================
// Slot - 호출 지점
// ============================================================================

/// Slot - id로 조회되는 내구성 있는 호출 지점
///
/// 비어있는 채로 생성되고, 구성 작업으로 바인딩/재바인딩된다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// 고유 id
    pub id: Guid,

    /// 표시 이름
    pub name: String,

    /// 현재 바인딩 (없으면 미구성)
    pub setup: Option<SlotSetup>,
}

impl Slot {
    /// 미구성 Slot 생성
    pub fn new(id: impl Into<Guid>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            setup: None,
        }
    }

    /// 빌더 패턴: 바인딩 설정
    pub fn with_setup(mut self, setup: SlotSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    /// 바인딩 여부
    pub fn is_configured(&self) -> bool {
        self.setup.is_some()
    }
}
