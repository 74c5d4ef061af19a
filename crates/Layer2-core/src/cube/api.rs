//! CubeApi - 플러그인이 제공하는 동작 인터페이스
//!
//! 모든 Tessera 큐브 구현체는 이 트레이트를 구현해야 합니다.

use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use tessera_foundation::Result;

/// 큐브 구현 트레이트
///
/// 라이프사이클 파이프라인이 단계별로 호출한다:
/// configure(속성 주입) -> init(초기화). Angel 큐브는 추가로
/// start/stop 신호를 받는다 (advisory - 강제 종료는 없음).
#[async_trait]
pub trait CubeApi: Send + Sync {
    /// 선언 속성 주입 (configure 단계)
    async fn configure(&self, _properties: &HashMap<String, Value>) -> Result<()> {
        Ok(())
    }

    /// 초기화 훅 (initialize 단계)
    ///
    /// `false` 반환은 실패와 동일하게 취급되어 파이프라인이 중단된다.
    async fn init(&self) -> Result<bool> {
        Ok(true)
    }

    /// Angel 큐브 시작 신호
    async fn start(&self) -> Result<bool> {
        Ok(true)
    }

    /// 중지 신호 (advisory)
    async fn stop(&self) -> Result<bool> {
        Ok(true)
    }

    /// 타입 캐스팅을 위한 헬퍼 (다운캐스팅 지원)
    fn as_any(&self) -> &dyn Any;
}
