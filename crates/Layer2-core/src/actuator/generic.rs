//! Generic Actuator - 신뢰된 큐브의 동기 실행 전략

use super::{ActuatorKind, CubeActuator, ExecuteContext};
use crate::cube::PointResult;
use async_trait::async_trait;
use std::sync::Arc;
use tessera_foundation::Result;
use tracing::debug;

/// Generic Actuator - 호출 태스크에서 직접, 격리 없이 실행
///
/// 포인트의 확장들을 우선순위 순서로 실행하고 결과를 병합한다.
/// 확장 호출이 끝날 때까지 호출 태스크를 점유한다.
pub struct GenericActuator;

impl GenericActuator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GenericActuator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CubeActuator for GenericActuator {
    fn kind(&self) -> ActuatorKind {
        ActuatorKind::Generic
    }

    async fn execute(&self, ctx: Arc<ExecuteContext>) -> Result<PointResult> {
        debug!(
            "Generic execute | slot: {} | point: {}",
            ctx.slot().id,
            ctx.point().id
        );

        ctx.point()
            .invoke(Arc::clone(ctx.cube_api()), ctx.args())
            .await
    }

    async fn stop(&self, ctx: Arc<ExecuteContext>) -> Result<bool> {
        // 동기 전략에는 추적 중인 작업이 없다; 큐브에 신호만 전달
        debug!("Generic stop | slot: {}", ctx.slot().id);
        ctx.cube_api().stop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{CubeApi, ExtensionPackage, ExtensionPoint, FnExtension, Isolation, ResultDescriptor};
    use crate::cube::definition::ExPackageDefinition;
    use crate::slot::Slot;
    use std::any::Any;
    use tessera_foundation::Guid;

    struct NoopCube;

    impl CubeApi for NoopCube {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    async fn test_context() -> Arc<ExecuteContext> {
        let point = Arc::new(ExtensionPoint::new(
            "error",
            "error output",
            ResultDescriptor::new().with_item("ack"),
        ));
        point
            .register_extension(Arc::new(FnExtension::new("echo", 1, |_cube, args| {
                Ok(PointResult::new().with_item("ack", args.first().cloned().unwrap_or_default()))
            })))
            .await;

        let package = Arc::new(
            ExtensionPackage::from_definition(
                Guid::of("system.log"),
                &ExPackageDefinition::new("sys.log", "log package"),
            )
            .await,
        );

        Arc::new(ExecuteContext::new(
            Slot::new("s1", "slot"),
            Guid::new(),
            Arc::new(NoopCube),
            Isolation::Generic,
            package,
            point,
            vec![serde_json::json!("boom")],
        ))
    }

    #[tokio::test]
    async fn test_generic_executes_inline() {
        let actuator = GenericActuator::new();
        let ctx = test_context().await;

        let result = actuator.execute(ctx).await.unwrap();
        assert_eq!(result.get("ack"), Some(&serde_json::json!("boom")));
    }

    #[tokio::test]
    async fn test_generic_stop_is_best_effort() {
        let actuator = GenericActuator::new();
        let ctx = test_context().await;

        assert!(actuator.stop(ctx).await.unwrap());
    }
}
