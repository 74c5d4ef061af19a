//! Actuator Proxy - 단일 진입점 Dispatcher
//!
//! Slot id를 4중 레지스트리 체인(slot -> cube -> package -> point ->
//! result descriptor)으로 해석하고, 격리 플래그로 전략을 골라 실행한다.

use super::{ActuatorKind, ActuatorRegistry, CubeActuator, ExecuteContext};
use crate::cube::{CubeFactory, PointResult};
use crate::slot::SlotRegistry;
use serde_json::Value;
use std::sync::Arc;
use tessera_foundation::{Guid, ResolutionError};
use tracing::{debug, error};

/// Actuator Proxy - 해석 + 전략 선택 + 실행
///
/// ## 실패 정책 (외부에서 관측되는 계약, 의도적으로 유지)
///
/// - `execute`: 해석/실행 실패는 식별자 체인과 함께 로깅되고 `None`을
///   반환한다. 호출자는 "실행됐지만 결과 없음"과 "해석 실패"를 구분할
///   수 없다 - 알려진 약한 계약이며, 내부는 `ResolutionError`로 명시적
///   이므로 구분이 필요해지면 추가 API로 노출할 수 있다.
/// - `stop`: 어떤 실패든 로깅 후 `true`를 반환한다 (best-effort 중지).
pub struct ActuatorProxy {
    /// 플러그인 호스트 조회 (큐브 인스턴스 제공자)
    factory: Arc<CubeFactory>,

    /// Slot 레지스트리
    slots: Arc<SlotRegistry>,

    /// 전략 레지스트리
    actuators: Arc<ActuatorRegistry>,
}

impl ActuatorProxy {
    /// 새 프록시 생성
    pub fn new(
        factory: Arc<CubeFactory>,
        slots: Arc<SlotRegistry>,
        actuators: Arc<ActuatorRegistry>,
    ) -> Self {
        Self {
            factory,
            slots,
            actuators,
        }
    }

    // ========================================================================
    // 공개 진입점
    // ========================================================================

    /// Slot 실행 - 실패는 삼키고 `None` 반환
    pub async fn execute(&self, slot_id: &Guid, args: Vec<Value>) -> Option<PointResult> {
        let ctx = match self.resolve(slot_id, args).await {
            Ok(ctx) => ctx,
            Err(e) => {
                error!("execute failed | {}", e);
                return None;
            }
        };

        let actuator = self.choose_actuator(&ctx).await?;

        match actuator.execute(Arc::clone(&ctx)).await {
            Ok(result) => Some(result),
            Err(e) => {
                error!(
                    "actuator {} execute failed | slot: {} | error: {}",
                    actuator.kind(),
                    slot_id,
                    e
                );
                None
            }
        }
    }

    /// Slot 중지 - 실패는 삼키고 `true` 반환 (best-effort)
    pub async fn stop(&self, slot_id: &Guid) -> bool {
        let ctx = match self.resolve(slot_id, vec![]).await {
            Ok(ctx) => ctx,
            Err(e) => {
                error!("stop failed | {}", e);
                return true;
            }
        };

        let Some(actuator) = self.choose_actuator(&ctx).await else {
            return true;
        };

        match actuator.stop(ctx).await {
            Ok(stopped) => stopped,
            Err(e) => {
                error!(
                    "actuator {} stop failed | slot: {} | error: {}",
                    actuator.kind(),
                    slot_id,
                    e
                );
                true
            }
        }
    }

    // ========================================================================
    // 해석 체인
    // ========================================================================

    /// 6단계 해석: slot -> setup -> cube -> package -> point -> result name
    ///
    /// 각 단계의 부재는 그 시점까지의 식별자 체인을 담은 variant로
    /// 표현된다. 해석 자체는 상태를 바꾸지 않는다 (멱등).
    pub async fn resolve(
        &self,
        slot_id: &Guid,
        args: Vec<Value>,
    ) -> Result<Arc<ExecuteContext>, ResolutionError> {
        // 1. Slot 조회 (원자적 스냅샷)
        let slot = self
            .slots
            .get(slot_id)
            .await
            .ok_or_else(|| ResolutionError::SlotNotFound {
                slot_id: slot_id.clone(),
            })?;

        // 2. 바인딩 확인
        let setup = slot
            .setup
            .clone()
            .ok_or_else(|| ResolutionError::SlotNotConfigured {
                slot_id: slot_id.clone(),
            })?;

        // 3. 큐브 조회 (호스트 lookup; 싱글턴은 캐시, 프로토타입은 신규)
        let cube = self
            .factory
            .get_cube(&setup.cube_id, setup.config_id.as_ref())
            .await
            .ok_or_else(|| ResolutionError::CubeNotFound {
                slot_id: slot_id.clone(),
                cube_id: setup.cube_id.clone(),
            })?;

        // 4. 패키지 조회
        let package =
            cube.find_package(&setup.package_id)
                .ok_or_else(|| ResolutionError::PackageNotFound {
                    slot_id: slot_id.clone(),
                    cube_id: setup.cube_id.clone(),
                    package_id: setup.package_id.clone(),
                })?;

        // 5. 포인트 조회
        let point =
            package
                .find_point(&setup.point_id)
                .ok_or_else(|| ResolutionError::PointNotFound {
                    slot_id: slot_id.clone(),
                    cube_id: setup.cube_id.clone(),
                    package_id: setup.package_id.clone(),
                    point_id: setup.point_id.clone(),
                })?;

        // 6. 결과 이름 검증
        if !point.descriptor().declares(&setup.result_name) {
            return Err(ResolutionError::ResultNameNotFound {
                slot_id: slot_id.clone(),
                cube_id: setup.cube_id.clone(),
                package_id: setup.package_id.clone(),
                point_id: setup.point_id.clone(),
                result_name: setup.result_name.clone(),
            });
        }

        debug!(
            "Resolved slot {} -> cube {} / package {} / point {}",
            slot_id, setup.cube_id, setup.package_id, setup.point_id
        );

        Ok(Arc::new(ExecuteContext::new(
            slot,
            cube.id().clone(),
            Arc::clone(cube.api()),
            cube.metadata().isolation,
            package,
            point,
            args,
        )))
    }

    /// 전략 선택 - 격리 플래그가 유일한 하드코딩 규칙
    ///
    /// Angel 큐브는 항상 Angel 전략, 그 외는 Generic. Async 전략은
    /// 레지스트리에 있지만 이 규칙만으로는 선택되지 않는다 (향후 선택
    /// 기준의 확장 지점).
    async fn choose_actuator(&self, ctx: &ExecuteContext) -> Option<Arc<dyn CubeActuator>> {
        let kind = if ctx.is_angel() {
            ActuatorKind::Angel
        } else {
            ActuatorKind::Generic
        };

        let actuator = self.actuators.get(kind).await;
        if actuator.is_none() {
            error!("no actuator registered for kind {}", kind);
        }
        actuator
    }
}
