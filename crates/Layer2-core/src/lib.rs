//! tessera-core: Core Runtime for Tessera
//!
//! Layer2 - 큐브(플러그인) 라이프사이클 + 디스패치 레이어
//!
//! # 주요 모듈
//!
//! - `cube`: 큐브 정의/인스턴스/확장 계층과 라이프사이클 팩토리
//! - `slot`: 내구성 있는 호출 지점 (Slot)과 레지스트리
//! - `actuator`: 실행 전략 (Generic / Async / Angel)과 Dispatcher
//! - `runtime`: 전부를 묶은 `CubeRuntime` 퍼사드
//!
//! # 사용 예시
//!
//! ```ignore
//! use tessera_core::{CubeRuntime, CubeDefinition, SlotSetup};
//! use tessera_foundation::Guid;
//!
//! let runtime = CubeRuntime::new().await;
//!
//! // 큐브 정의 등록
//! runtime.register_definition(logger_definition()).await?;
//!
//! // Slot 생성 후 바인딩
//! runtime.create_slot("ui.on-error", "error reporting hook").await;
//! runtime.bind_slot(
//!     &Guid::of("ui.on-error"),
//!     SlotSetup::new("system.log", "sys.log", "error", "ack"),
//! ).await?;
//!
//! // 실행 - 실패는 로깅되고 None으로 수렴
//! let result = runtime.execute(&Guid::of("ui.on-error"), vec![json!("boom")]).await;
//!
//! // 핫 리로드 통지
//! runtime.invalidate(&Guid::of("system.log")).await;
//! ```

// Core modules
pub mod actuator;
pub mod cube;
pub mod runtime;
pub mod slot;

// Re-exports: Runtime
pub use runtime::{CubeFilter, CubeInfo, CubeRuntime, RuntimeConfig, RuntimeSummary};

// Re-exports: Cube
pub use cube::{
    Cube, CubeApi, CubeConstructor, CubeDefinition, CubeFactory, CubeMetadata, CubeModel,
    CubeVersion, ExPackageDefinition, ExPointDefinition, Extension, ExtensionPackage,
    ExtensionPoint, FnExtension, Isolation, LifecycleHook, LifecycleState, PointResult,
    ResultDescriptor,
};

// Re-exports: Slot
pub use slot::{Slot, SlotRegistry, SlotSetup};

// Re-exports: Actuator
pub use actuator::{
    ActuatorKind, ActuatorProxy, ActuatorRegistry, AngelActuator, AsyncActuator, CubeActuator,
    ExecuteContext, GenericActuator,
};
