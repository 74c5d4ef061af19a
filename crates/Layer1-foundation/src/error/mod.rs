//! Error types for Tessera
//!
//! 모든 에러를 중앙에서 관리

use crate::guid::Guid;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// LifecyclePhase - 라이프사이클 단계
// ============================================================================

/// Cube 생성 파이프라인의 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// 인스턴스 할당 단계
    Instantiate,

    /// 속성 주입 단계
    Configure,

    /// 초기화 단계 (pre_init -> init -> post_init)
    Initialize,
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instantiate => write!(f, "instantiate"),
            Self::Configure => write!(f, "configure"),
            Self::Initialize => write!(f, "initialize"),
        }
    }
}

// ============================================================================
// ResolutionError - 해석 체인 실패 (명시적 태그 유니언)
// ============================================================================

/// Slot 해석 체인의 실패 지점
///
/// 각 variant는 slot -> cube -> package -> point -> result name 체인에서
/// 누락된 엔티티 하나에 대응하며, 그 시점까지 수집된 식별자 체인을 담는다.
/// 호출부는 예외 대신 패턴 매칭으로 실패 지점을 구분할 수 있다.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("slot not found | slot:{slot_id}")]
    SlotNotFound { slot_id: Guid },

    #[error("slot not configured | slot:{slot_id}")]
    SlotNotConfigured { slot_id: Guid },

    #[error("cube not found | slot:{slot_id} | cube:{cube_id}")]
    CubeNotFound { slot_id: Guid, cube_id: Guid },

    #[error("package not found | slot:{slot_id} | cube:{cube_id} | package:{package_id}")]
    PackageNotFound {
        slot_id: Guid,
        cube_id: Guid,
        package_id: Guid,
    },

    #[error("point not found | slot:{slot_id} | cube:{cube_id} | package:{package_id} | point:{point_id}")]
    PointNotFound {
        slot_id: Guid,
        cube_id: Guid,
        package_id: Guid,
        point_id: Guid,
    },

    #[error("result name `{result_name}` not found | slot:{slot_id} | cube:{cube_id} | package:{package_id} | point:{point_id}")]
    ResultNameNotFound {
        slot_id: Guid,
        cube_id: Guid,
        package_id: Guid,
        point_id: Guid,
        result_name: String,
    },
}

impl ResolutionError {
    /// 실패가 시작된 Slot id
    pub fn slot_id(&self) -> &Guid {
        match self {
            Self::SlotNotFound { slot_id }
            | Self::SlotNotConfigured { slot_id }
            | Self::CubeNotFound { slot_id, .. }
            | Self::PackageNotFound { slot_id, .. }
            | Self::PointNotFound { slot_id, .. }
            | Self::ResultNameNotFound { slot_id, .. } => slot_id,
        }
    }
}

// ============================================================================
// Error - Tessera 에러 타입
// ============================================================================

/// Tessera 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 라이프사이클 관련
    // ========================================================================
    #[error("Lifecycle error: cube {cube_id} failed at {phase} - {message}")]
    Lifecycle {
        cube_id: Guid,
        phase: LifecyclePhase,
        message: String,
    },

    // ========================================================================
    // 해석 관련
    // ========================================================================
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    // ========================================================================
    // Actuator 관련
    // ========================================================================
    #[error("Actuator error: {kind} - {message}")]
    Actuator { kind: String, message: String },

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 라이프사이클 에러 생성 헬퍼
    pub fn lifecycle(cube_id: Guid, phase: LifecyclePhase, message: impl Into<String>) -> Self {
        Error::Lifecycle {
            cube_id,
            phase,
            message: message.into(),
        }
    }

    /// Actuator 에러 생성 헬퍼
    pub fn actuator(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Actuator {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// 해석 단계 실패인지 확인
    pub fn is_resolution(&self) -> bool {
        matches!(self, Error::Resolution(_))
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_chain_in_message() {
        let err = ResolutionError::ResultNameNotFound {
            slot_id: Guid::of("s1"),
            cube_id: Guid::of("c1"),
            package_id: Guid::of("p1"),
            point_id: Guid::of("e1"),
            result_name: "count".into(),
        };

        let msg = err.to_string();
        assert!(msg.contains("slot:s1"));
        assert!(msg.contains("cube:c1"));
        assert!(msg.contains("package:p1"));
        assert!(msg.contains("point:e1"));
        assert!(msg.contains("`count`"));
    }

    #[test]
    fn test_resolution_error_slot_id() {
        let err = ResolutionError::SlotNotFound {
            slot_id: Guid::of("s1"),
        };
        assert_eq!(err.slot_id(), &Guid::of("s1"));
    }

    #[test]
    fn test_lifecycle_error_display() {
        let err = Error::lifecycle(Guid::of("logger"), LifecyclePhase::Initialize, "init returned false");
        let msg = err.to_string();
        assert!(msg.contains("logger"));
        assert!(msg.contains("initialize"));
    }
}
