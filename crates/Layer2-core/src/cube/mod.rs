//! Cube 시스템 - 정의, 인스턴스, 확장 계층, 라이프사이클 팩토리
//!
//! ## 구성
//!
//! - `definition`: 정적 `CubeDefinition` (등록 후 불변) + 확장 메타데이터
//! - `api`: 플러그인이 구현하는 `CubeApi` 트레이트
//! - `extension`: `ExtensionPackage` -> `ExtensionPoint` -> `PointResult` 계층
//! - `model`: 라이브 `Cube` 인스턴스와 `LifecycleState`
//! - `factory`: 단계별 생성 파이프라인 + 싱글턴 캐시 + `invalidate`

pub mod api;
pub mod definition;
pub mod extension;
pub mod factory;
pub mod model;

pub use api::CubeApi;
pub use definition::{
    CubeConstructor, CubeDefinition, CubeModel, CubeVersion, ExPackageDefinition,
    ExPointDefinition, Isolation,
};
pub use extension::{
    Extension, ExtensionPackage, ExtensionPoint, FnExtension, PointResult, ResultDescriptor,
};
pub use factory::{CubeFactory, LifecycleHook};
pub use model::{Cube, CubeMetadata, LifecycleState};
