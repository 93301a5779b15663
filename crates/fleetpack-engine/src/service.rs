//! Network-service synthesis (`v1 Service`)
//!
//! The Service is where blue/green routing happens: its selector pins the
//! active color, so re-rendering with another color moves traffic without
//! touching any Deployment.

use fleetpack_core::ResolvedApp;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::meta::{SynthContext, object_meta};

/// Build the Service for an application, if it declares one
pub fn service(app: &ResolvedApp, ctx: &SynthContext<'_>) -> Option<Service> {
    let service_type = app.service?;
    let port = app.ports.port?;

    let mut ports = vec![ServicePort {
        name: Some("http".to_string()),
        port,
        target_port: Some(IntOrString::Int(app.ports.target_port.unwrap_or(port))),
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }];

    // The secondary port is exposed only with both halves present
    if let (Some(grpc), Some(node_port)) = (app.ports.grpc_port, app.ports.node_port) {
        ports.push(ServicePort {
            name: Some("grpc".to_string()),
            port: grpc,
            target_port: Some(IntOrString::Int(grpc)),
            node_port: Some(node_port),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        });
    }

    let selector = ctx.selector(app, &app.active_color);
    tracing::debug!(
        app = %app.name,
        active_color = %app.active_color,
        "routing service to active color"
    );

    Some(Service {
        metadata: object_meta(ctx.app_object_name(app), &app.namespace, ctx.app_labels(app)),
        spec: Some(ServiceSpec {
            type_: Some(service_type.as_str().to_string()),
            selector: Some(selector),
            ports: Some(ports),
            ..Default::default()
        }),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[test]
    fn test_no_service_when_absent() {
        let fixture = Fixture::new(
            r#"
apps:
  - name: worker
    image: { name: worker, tag: "1" }
    ports: { port: 8080 }
    service: null
"#,
        );
        assert!(service(fixture.app("worker"), &fixture.ctx()).is_none());
    }

    #[test]
    fn test_default_color_selector() {
        let fixture = Fixture::new(
            r#"
apps:
  - name: api
    image: { name: api, tag: "1" }
    ports: { port: 8080 }
    service: { type: ClusterIP }
"#,
        );
        let svc = service(fixture.app("api"), &fixture.ctx()).unwrap();
        let spec = svc.spec.unwrap();

        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        let selector = spec.selector.unwrap();
        assert_eq!(selector["app"], "api");
        assert_eq!(selector["color"], "blue");

        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].port, 8080);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(8080)));
    }

    #[test]
    fn test_active_color_selector() {
        let fixture = Fixture::new(
            r#"
global:
  activeColor: green
apps:
  - name: api
    color: blue
    image: { name: api, tag: "1" }
    ports: { port: 8080 }
    service: { type: ClusterIP }
"#,
        );
        let svc = service(fixture.app("api"), &fixture.ctx()).unwrap();
        assert_eq!(svc.spec.unwrap().selector.unwrap()["color"], "green");
    }

    #[test]
    fn test_grpc_port_needs_node_port() {
        let fixture = Fixture::new(
            r#"
apps:
  - name: api
    image: { name: api, tag: "1" }
    ports: { port: 8080, targetPort: 8000, grpcPort: 9090, nodePort: 30090 }
    service: { type: NodePort }
  - name: web
    image: { name: web, tag: "1" }
    ports: { port: 80, grpcPort: 9090 }
    service: { type: LoadBalancer }
"#,
        );
        let api = service(fixture.app("api"), &fixture.ctx()).unwrap();
        let ports = api.spec.unwrap().ports.unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(8000)));
        assert_eq!(ports[1].name.as_deref(), Some("grpc"));
        assert_eq!(ports[1].node_port, Some(30090));

        let web = service(fixture.app("web"), &fixture.ctx()).unwrap();
        assert_eq!(web.spec.unwrap().ports.unwrap().len(), 1);
    }
}
