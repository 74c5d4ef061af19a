//! Guid - 전역 고유 식별자
//!
//! Cube, ExtensionPackage, ExtensionPoint, Slot 모두 같은 불투명 id 타입을 사용

use serde::{Deserialize, Serialize};

/// 전역 고유 식별자 (불투명)
///
/// 런타임이 생성하는 id는 UUIDv4, 플러그인이 선언하는 id는
/// `"system.error"` 같은 안정적인 리터럴을 그대로 감싼다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(String);

impl Guid {
    /// 새 랜덤 id 생성 (UUIDv4)
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 리터럴 id 래핑 (예: "system.error")
    pub fn of(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 문자열 표현
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Guid {
    fn from(s: &str) -> Self {
        Self::of(s)
    }
}

impl From<String> for Guid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_guids_differ() {
        assert_ne!(Guid::new(), Guid::new());
    }

    #[test]
    fn test_literal_guid_is_stable() {
        assert_eq!(Guid::of("system.error"), Guid::of("system.error"));
        assert_eq!(Guid::of("system.error").as_str(), "system.error");
    }

    #[test]
    fn test_serde_transparent() {
        let id = Guid::of("sys.log");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"sys.log\"");

        let back: Guid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
