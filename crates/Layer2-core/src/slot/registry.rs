//! Slot Registry - 동시성 안전 Slot 저장소

use super::{Slot, SlotSetup};
use std::collections::HashMap;
use tessera_foundation::Guid;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Slot 레지스트리 - id -> Slot 동시성 안전 맵
///
/// rebind와 진행 중인 해석 사이에 트랜잭션 보장은 없다. `get`이 Slot을
/// 통째로 복제해 반환하므로, rebind 이전에 시작한 호출은 옛 타깃 전체
/// 아니면 새 타깃 전체만 관측한다.
pub struct SlotRegistry {
    /// Slot 저장소 (ID -> Slot)
    slots: RwLock<HashMap<Guid, Slot>>,
}

impl SlotRegistry {
    /// 새 레지스트리 생성
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Slot 등록
    pub async fn register(&self, slot: Slot) -> bool {
        let mut slots = self.slots.write().await;

        if slots.contains_key(&slot.id) {
            warn!("Slot {} is already registered", slot.id);
            return false;
        }

        info!("Registered slot: {} ({})", slot.id, slot.name);
        slots.insert(slot.id.clone(), slot);
        true
    }

    /// Slot 조회 - 원자적 스냅샷 복제본 반환
    pub async fn get(&self, slot_id: &Guid) -> Option<Slot> {
        let slots = self.slots.read().await;
        slots.get(slot_id).cloned()
    }

    /// 타깃 재바인딩 - 다음 호출부터 반영
    pub async fn rebind(&self, slot_id: &Guid, setup: SlotSetup) -> bool {
        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get_mut(slot_id) {
            debug!("Rebound slot {} -> cube {}", slot_id, setup.cube_id);
            slot.setup = Some(setup);
            true
        } else {
            false
        }
    }

    /// 바인딩 해제 (Slot은 미구성 상태로 유지)
    pub async fn unbind(&self, slot_id: &Guid) -> bool {
        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get_mut(slot_id) {
            debug!("Unbound slot {}", slot_id);
            slot.setup = None;
            true
        } else {
            false
        }
    }

    /// Slot 제거
    pub async fn remove(&self, slot_id: &Guid) -> Option<Slot> {
        let mut slots = self.slots.write().await;
        let removed = slots.remove(slot_id);
        if removed.is_some() {
            info!("Removed slot: {}", slot_id);
        }
        removed
    }

    /// Slot 존재 여부
    pub async fn contains(&self, slot_id: &Guid) -> bool {
        let slots = self.slots.read().await;
        slots.contains_key(slot_id)
    }

    /// 모든 Slot 목록
    pub async fn list(&self) -> Vec<Slot> {
        let slots = self.slots.read().await;
        slots.values().cloned().collect()
    }

    /// Slot 수
    pub async fn len(&self) -> usize {
        let slots = self.slots.read().await;
        slots.len()
    }

    /// 비어있는지 확인
    pub async fn is_empty(&self) -> bool {
        let slots = self.slots.read().await;
        slots.is_empty()
    }

    /// 모든 Slot 클리어
    pub async fn clear(&self) {
        let mut slots = self.slots.write().await;
        slots.clear();
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(cube: &str) -> SlotSetup {
        SlotSetup::new(cube, "pkg", "point", "ack")
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = SlotRegistry::new();

        assert!(registry.register(Slot::new("s1", "first")).await);
        assert!(!registry.register(Slot::new("s1", "duplicate")).await);

        let slot = registry.get(&Guid::of("s1")).await.unwrap();
        assert_eq!(slot.name, "first");
        assert!(!slot.is_configured());
        assert!(registry.get(&Guid::of("missing")).await.is_none());
    }

    #[tokio::test]
    async fn test_rebind_and_unbind() {
        let registry = SlotRegistry::new();
        registry.register(Slot::new("s1", "slot")).await;

        assert!(registry.rebind(&Guid::of("s1"), setup("cube.a")).await);
        let slot = registry.get(&Guid::of("s1")).await.unwrap();
        assert_eq!(slot.setup.as_ref().unwrap().cube_id, Guid::of("cube.a"));

        assert!(registry.rebind(&Guid::of("s1"), setup("cube.b")).await);
        let slot = registry.get(&Guid::of("s1")).await.unwrap();
        assert_eq!(slot.setup.as_ref().unwrap().cube_id, Guid::of("cube.b"));

        assert!(registry.unbind(&Guid::of("s1")).await);
        assert!(!registry.get(&Guid::of("s1")).await.unwrap().is_configured());

        assert!(!registry.rebind(&Guid::of("missing"), setup("cube.a")).await);
    }

    #[tokio::test]
    async fn test_snapshot_is_stable_after_rebind() {
        let registry = SlotRegistry::new();
        registry
            .register(Slot::new("s1", "slot").with_setup(setup("cube.a")))
            .await;

        // rebind 이전에 얻은 스냅샷은 rebind의 영향을 받지 않는다
        let snapshot = registry.get(&Guid::of("s1")).await.unwrap();
        registry.rebind(&Guid::of("s1"), setup("cube.b")).await;

        assert_eq!(snapshot.setup.as_ref().unwrap().cube_id, Guid::of("cube.a"));
        let fresh = registry.get(&Guid::of("s1")).await.unwrap();
        assert_eq!(fresh.setup.as_ref().unwrap().cube_id, Guid::of("cube.b"));
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = SlotRegistry::new();
        registry.register(Slot::new("s1", "slot")).await;

        assert_eq!(registry.len().await, 1);
        assert!(registry.remove(&Guid::of("s1")).await.is_some());
        assert!(registry.is_empty().await);
        assert!(registry.remove(&Guid::of("s1")).await.is_none());
    }
}
