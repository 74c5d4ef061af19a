//! # tessera-foundation
//!
//! Foundation layer for Tessera:
//! - Guid: 전역 고유 식별자 (Cube/Package/Point/Slot 공용)
//! - Error: 중앙 에러 타입 (Lifecycle / Resolution / Actuator 분류)
//! - Event: 런타임 이벤트 버스 (발행/구독 + 히스토리)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  tessera-core (Layer2)                           │
//! │  ├── CubeFactory / SlotRegistry / ActuatorProxy  │
//! │  └──────────────┬───────────────────────────────-┘
//! │                 ▼
//! │  tessera-foundation (Layer1)
//! │  ├── Guid            불투명 id
//! │  ├── Error/Result    thiserror 기반 분류
//! │  └── EventBus        broadcast + handler registry
//! └──────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod event;
pub mod guid;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, LifecyclePhase, ResolutionError, Result};

// ============================================================================
// Guid (식별자)
// ============================================================================
pub use guid::Guid;

// ============================================================================
// Event (이벤트 시스템)
// ============================================================================
pub use event::{
    // Helpers
    cube_created_event,
    cube_invalidated_event,
    slot_bound_event,
    // Bus
    EventBus,
    // Handler
    EventHandler,
    // Types
    EventType,
    RuntimeEvent,
};
