//! Runtime Events - 런타임 이벤트 시스템
//!
//! Cube/Slot 라이프사이클 변화를 발행/구독하는 이벤트 버스

use crate::guid::Guid;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

// ============================================================================
// RuntimeEvent - 런타임 이벤트 타입
// ============================================================================

/// 런타임 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeEvent {
    /// 이벤트 타입
    pub event_type: EventType,

    /// 이벤트 데이터
    pub data: Value,

    /// 타임스탬프
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// 소스 (이벤트 발생 위치)
    pub source: String,
}

impl RuntimeEvent {
    /// 새 이벤트 생성
    pub fn new(event_type: EventType, data: Value, source: impl Into<String>) -> Self {
        Self {
            event_type,
            data,
            timestamp: chrono::Utc::now(),
            source: source.into(),
        }
    }

    /// 간단한 이벤트 생성
    pub fn simple(event_type: EventType) -> Self {
        Self::new(event_type, Value::Null, "runtime")
    }
}

/// 이벤트 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // Cube 이벤트
    CubeCreated,
    CubeInvalidated,
    CubeDestroyed,

    // Slot 이벤트
    SlotRegistered,
    SlotBound,
    SlotUnbound,
    SlotRemoved,

    // Angel Cube 이벤트
    AngelStarted,
    AngelStopped,

    // 사용자 정의 이벤트
    Custom,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CubeCreated => write!(f, "cube_created"),
            Self::CubeInvalidated => write!(f, "cube_invalidated"),
            Self::CubeDestroyed => write!(f, "cube_destroyed"),
            Self::SlotRegistered => write!(f, "slot_registered"),
            Self::SlotBound => write!(f, "slot_bound"),
            Self::SlotUnbound => write!(f, "slot_unbound"),
            Self::SlotRemoved => write!(f, "slot_removed"),
            Self::AngelStarted => write!(f, "angel_started"),
            Self::AngelStopped => write!(f, "angel_stopped"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

// ============================================================================
// EventHandler - 이벤트 핸들러 트레이트
// ============================================================================

/// 이벤트 핸들러 트레이트
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 핸들러 이름
    fn name(&self) -> &str;

    /// 관심 있는 이벤트 타입들
    fn interested_events(&self) -> Vec<EventType>;

    /// 이벤트 처리
    async fn handle(&self, event: &RuntimeEvent);
}

// ============================================================================
// EventBus - 이벤트 버스 (발행/구독)
// ============================================================================

/// 이벤트 버스 - 이벤트 발행 및 구독 관리
pub struct EventBus {
    /// 브로드캐스트 채널 발신자
    sender: broadcast::Sender<RuntimeEvent>,

    /// 등록된 핸들러
    handlers: RwLock<HashMap<String, Arc<dyn EventHandler>>>,

    /// 이벤트 히스토리 (최근 N개)
    history: RwLock<Vec<RuntimeEvent>>,

    /// 히스토리 최대 크기
    history_size: usize,
}

impl EventBus {
    /// 새 이벤트 버스 생성
    pub fn new() -> Self {
        Self::with_capacity(1024, 100)
    }

    /// 용량 지정하여 생성
    ///
    /// broadcast 채널과 히스토리 모두 0 용량을 허용하지 않으므로
    /// 최소 1로 보정한다.
    pub fn with_capacity(channel_capacity: usize, history_size: usize) -> Self {
        let channel_capacity = channel_capacity.max(1);
        let history_size = history_size.max(1);
        let (sender, _) = broadcast::channel(channel_capacity);
        Self {
            sender,
            handlers: RwLock::new(HashMap::new()),
            history: RwLock::new(Vec::with_capacity(history_size)),
            history_size,
        }
    }

    /// 이벤트 핸들러 등록
    pub async fn register_handler(&self, handler: Arc<dyn EventHandler>) {
        let name = handler.name().to_string();
        let mut handlers = self.handlers.write().await;
        handlers.insert(name, handler);
    }

    /// 이벤트 핸들러 제거
    pub async fn unregister_handler(&self, name: &str) {
        let mut handlers = self.handlers.write().await;
        handlers.remove(name);
    }

    /// 이벤트 발행
    pub async fn publish(&self, event: RuntimeEvent) {
        debug!("Publishing event: {:?}", event.event_type);

        // 히스토리에 추가
        {
            let mut history = self.history.write().await;
            if history.len() >= self.history_size {
                history.remove(0);
            }
            history.push(event.clone());
        }

        // 브로드캐스트 (구독자가 없어도 OK)
        let _ = self.sender.send(event.clone());

        // 핸들러 호출 - 핸들러가 버스로 재진입(등록/해제)할 수 있으므로
        // 관심 핸들러만 복제해 락 해제 후 호출한다
        let interested: Vec<Arc<dyn EventHandler>> = {
            let handlers = self.handlers.read().await;
            handlers
                .values()
                .filter(|h| h.interested_events().contains(&event.event_type))
                .cloned()
                .collect()
        };

        for handler in interested {
            handler.handle(&event).await;
        }
    }

    /// 이벤트 구독 (스트림 반환)
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.sender.subscribe()
    }

    /// 이벤트 히스토리 조회
    pub async fn history(&self) -> Vec<RuntimeEvent> {
        let history = self.history.read().await;
        history.clone()
    }

    /// 특정 타입의 이벤트 히스토리 조회
    pub async fn history_by_type(&self, event_type: EventType) -> Vec<RuntimeEvent> {
        let history = self.history.read().await;
        history
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// 히스토리 클리어
    pub async fn clear_history(&self) {
        let mut history = self.history.write().await;
        history.clear();
    }

    /// 등록된 핸들러 수
    pub async fn handler_count(&self) -> usize {
        let handlers = self.handlers.read().await;
        handlers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// 헬퍼 함수
// ============================================================================

/// Cube 생성 이벤트
pub fn cube_created_event(cube_id: &Guid, name: &str) -> RuntimeEvent {
    RuntimeEvent::new(
        EventType::CubeCreated,
        serde_json::json!({
            "cube_id": cube_id,
            "name": name,
        }),
        "factory",
    )
}

/// Cube 무효화 이벤트 (핫 리로드 통지)
pub fn cube_invalidated_event(cube_id: &Guid) -> RuntimeEvent {
    RuntimeEvent::new(
        EventType::CubeInvalidated,
        serde_json::json!({ "cube_id": cube_id }),
        "factory",
    )
}

/// Slot 바인딩 이벤트
pub fn slot_bound_event(slot_id: &Guid, cube_id: &Guid, point_id: &Guid) -> RuntimeEvent {
    RuntimeEvent::new(
        EventType::SlotBound,
        serde_json::json!({
            "slot_id": slot_id,
            "cube_id": cube_id,
            "point_id": point_id,
        }),
        "slot_registry",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestHandler {
        name: String,
    }

    #[async_trait]
    impl EventHandler for TestHandler {
        fn name(&self) -> &str {
            &self.name
        }

        fn interested_events(&self) -> Vec<EventType> {
            vec![EventType::CubeCreated, EventType::SlotBound]
        }

        async fn handle(&self, _event: &RuntimeEvent) {
            // Test handler
        }
    }

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();

        let handler = Arc::new(TestHandler {
            name: "test".into(),
        });
        bus.register_handler(handler).await;

        assert_eq!(bus.handler_count().await, 1);

        bus.publish(RuntimeEvent::simple(EventType::CubeCreated))
            .await;

        let history = bus.history().await;
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_event_subscribe() {
        let bus = Arc::new(EventBus::new());
        let mut receiver = bus.subscribe();

        let bus_clone = Arc::clone(&bus);
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
            bus_clone
                .publish(RuntimeEvent::simple(EventType::SlotBound))
                .await;
        });

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::SlotBound);
    }

    struct SelfRemovingHandler {
        bus: Arc<EventBus>,
    }

    #[async_trait]
    impl EventHandler for SelfRemovingHandler {
        fn name(&self) -> &str {
            "self-removing"
        }

        fn interested_events(&self) -> Vec<EventType> {
            vec![EventType::CubeCreated]
        }

        async fn handle(&self, _event: &RuntimeEvent) {
            // 발행 도중 버스로 재진입
            self.bus.unregister_handler("self-removing").await;
        }
    }

    #[tokio::test]
    async fn test_handler_may_reenter_bus_during_publish() {
        let bus = Arc::new(EventBus::new());
        bus.register_handler(Arc::new(SelfRemovingHandler {
            bus: Arc::clone(&bus),
        }))
        .await;

        let publish = bus.publish(RuntimeEvent::simple(EventType::CubeCreated));
        tokio::time::timeout(tokio::time::Duration::from_secs(2), publish)
            .await
            .expect("publish must not block on a reentrant handler");

        assert_eq!(bus.handler_count().await, 0);
    }

    #[tokio::test]
    async fn test_zero_capacities_are_clamped() {
        let bus = EventBus::with_capacity(0, 0);

        bus.publish(RuntimeEvent::simple(EventType::CubeCreated)).await;
        bus.publish(RuntimeEvent::simple(EventType::SlotBound)).await;

        // 최소 용량 1로 동작: 패닉 없이 가장 최근 이벤트 하나만 보관
        let history = bus.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_type, EventType::SlotBound);
    }

    #[tokio::test]
    async fn test_history_by_type() {
        let bus = EventBus::new();
        bus.publish(RuntimeEvent::simple(EventType::CubeCreated)).await;
        bus.publish(RuntimeEvent::simple(EventType::SlotBound)).await;
        bus.publish(RuntimeEvent::simple(EventType::CubeCreated)).await;

        let created = bus.history_by_type(EventType::CubeCreated).await;
        assert_eq!(created.len(), 2);
    }
}
