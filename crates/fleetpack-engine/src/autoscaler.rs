//! Autoscaler synthesis (`autoscaling/v2 HorizontalPodAutoscaler`)

use fleetpack_core::ResolvedApp;
use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec, MetricSpec,
    MetricTarget, ResourceMetricSource,
};

use crate::meta::{SynthContext, object_meta};

/// Build the autoscaler for an application, if enabled
pub fn autoscaler(app: &ResolvedApp, ctx: &SynthContext<'_>) -> Option<HorizontalPodAutoscaler> {
    let hpa = app.hpa.as_ref()?;
    let name = ctx.app_object_name(app);

    let metrics: Vec<MetricSpec> = [("cpu", hpa.target_cpu), ("memory", hpa.target_memory)]
        .into_iter()
        .filter_map(|(resource, target)| target.map(|t| utilization(resource, t)))
        .collect();

    Some(HorizontalPodAutoscaler {
        metadata: object_meta(name.clone(), &app.namespace, ctx.app_labels(app)),
        spec: Some(HorizontalPodAutoscalerSpec {
            scale_target_ref: CrossVersionObjectReference {
                api_version: Some("apps/v1".to_string()),
                kind: "Deployment".to_string(),
                name,
            },
            min_replicas: Some(hpa.min_replicas),
            max_replicas: hpa.max_replicas,
            metrics: Some(metrics),
            ..Default::default()
        }),
        ..Default::default()
    })
}

fn utilization(resource: &str, average: i32) -> MetricSpec {
    MetricSpec {
        type_: "Resource".to_string(),
        resource: Some(ResourceMetricSource {
            name: resource.to_string(),
            target: MetricTarget {
                type_: "Utilization".to_string(),
                average_utilization: Some(average),
                ..Default::default()
            },
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    const VALUES: &str = r#"
apps:
  - name: api
    image: { name: api, tag: "1" }
    resources:
      enabled: true
      requests: { cpu: 200m, memory: 256Mi }
    hpa:
      enabled: true
      minReplicas: 2
      maxReplicas: 10
      targetCPUUtilizationPercentage: 70
      targetMemoryUtilizationPercentage: 85
  - name: worker
    image: { name: worker, tag: "1" }
    hpa: { enabled: false }
"#;

    #[test]
    fn test_autoscaler_targets_deployment() {
        let fixture = Fixture::new(VALUES);
        let hpa = autoscaler(fixture.app("api"), &fixture.ctx()).unwrap();
        let spec = hpa.spec.unwrap();

        assert_eq!(spec.scale_target_ref.kind, "Deployment");
        assert_eq!(spec.scale_target_ref.name, "prod-shop-api");
        assert_eq!(spec.min_replicas, Some(2));
        assert_eq!(spec.max_replicas, 10);

        let metrics = spec.metrics.unwrap();
        assert_eq!(metrics.len(), 2);
        let cpu = metrics[0].resource.as_ref().unwrap();
        assert_eq!(cpu.name, "cpu");
        assert_eq!(cpu.target.average_utilization, Some(70));
        assert_eq!(metrics[1].resource.as_ref().unwrap().target.average_utilization, Some(85));
    }

    #[test]
    fn test_disabled_autoscaler() {
        let fixture = Fixture::new(VALUES);
        assert!(autoscaler(fixture.app("worker"), &fixture.ctx()).is_none());
    }
}
