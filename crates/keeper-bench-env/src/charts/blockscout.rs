//! Blockscout block explorer for simulated networks
//!
//! Rendered as a Deployment (explorer + its postgres) and a Service rather
//! than a Helm chart.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use keeper_bench_common::{Error, Result};

use super::ManifestSet;

/// Name of the explorer deployment for the simulated chain
pub const BLOCKSCOUT_NAME: &str = "geth-blockscout";

const BLOCKSCOUT_IMAGE: &str = "blockscout/blockscout:4.1.5";
const POSTGRES_IMAGE: &str = "postgres:13.6";
const BLOCKSCOUT_PORT: i32 = 4000;

/// Explorer parameters
#[derive(Debug, Clone)]
pub struct BlockscoutProps {
    /// Deployment and service name
    pub name: String,
    /// Chain websocket endpoint
    pub ws_url: String,
    /// Chain HTTP endpoint
    pub http_url: String,
}

/// Render the explorer manifests
pub fn blockscout_manifests(props: &BlockscoutProps) -> Result<ManifestSet> {
    let labels = BTreeMap::from([("app".to_string(), props.name.clone())]);

    let documents = vec![
        serde_json::to_string_pretty(&deployment(props, &labels))
            .map_err(|e| Error::serialization_for_kind("Deployment", e.to_string()))?,
        serde_json::to_string_pretty(&service(props, &labels))
            .map_err(|e| Error::serialization_for_kind("Service", e.to_string()))?,
    ];

    Ok(ManifestSet {
        name: props.name.clone(),
        documents,
    })
}

fn env(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

fn deployment(props: &BlockscoutProps, labels: &BTreeMap<String, String>) -> Deployment {
    let explorer = Container {
        name: "blockscout".to_string(),
        image: Some(BLOCKSCOUT_IMAGE.to_string()),
        command: Some(vec![
            "/bin/bash".to_string(),
            "-c".to_string(),
            "mix do ecto.create, ecto.migrate && mix phx.server".to_string(),
        ]),
        ports: Some(vec![ContainerPort {
            name: Some("explorer".to_string()),
            container_port: BLOCKSCOUT_PORT,
            ..Default::default()
        }]),
        env: Some(vec![
            env("MIX_ENV", "prod"),
            env("ECTO_USE_SSL", "false"),
            env("COIN", "DAI"),
            env("ETHEREUM_JSONRPC_VARIANT", "geth"),
            env("ETHEREUM_JSONRPC_HTTP_URL", &props.http_url),
            env("ETHEREUM_JSONRPC_TRACE_URL", &props.http_url),
            env("ETHEREUM_JSONRPC_WS_URL", &props.ws_url),
            env(
                "DATABASE_URL",
                "postgresql://postgres:@localhost:5432/blockscout?ssl=false",
            ),
            env("PORT", &BLOCKSCOUT_PORT.to_string()),
        ]),
        ..Default::default()
    };

    let database = Container {
        name: "blockscout-db".to_string(),
        image: Some(POSTGRES_IMAGE.to_string()),
        ports: Some(vec![ContainerPort {
            name: Some("postgres".to_string()),
            container_port: 5432,
            ..Default::default()
        }]),
        env: Some(vec![
            env("POSTGRES_PASSWORD", ""),
            env("POSTGRES_HOST_AUTH_METHOD", "trust"),
        ]),
        ..Default::default()
    };

    Deployment {
        metadata: ObjectMeta {
            name: Some(props.name.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels.clone()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![explorer, database],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn service(props: &BlockscoutProps, labels: &BTreeMap<String, String>) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(props.name.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(labels.clone()),
            ports: Some(vec![ServicePort {
                name: Some("explorer".to_string()),
                port: BLOCKSCOUT_PORT,
                target_port: Some(IntOrString::Int(BLOCKSCOUT_PORT)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn props() -> BlockscoutProps {
        BlockscoutProps {
            name: BLOCKSCOUT_NAME.to_string(),
            ws_url: "ws://geth:8546".to_string(),
            http_url: "http://geth:8544".to_string(),
        }
    }

    #[test]
    fn renders_deployment_and_service() {
        let set = blockscout_manifests(&props()).unwrap();
        assert_eq!(set.name, "geth-blockscout");
        assert_eq!(set.documents.len(), 2);

        let deploy: Value = serde_json::from_str(&set.documents[0]).unwrap();
        assert_eq!(deploy["kind"], "Deployment");
        assert_eq!(deploy["metadata"]["name"], "geth-blockscout");

        let svc: Value = serde_json::from_str(&set.documents[1]).unwrap();
        assert_eq!(svc["kind"], "Service");
        assert_eq!(svc["spec"]["ports"][0]["port"], 4000);
    }

    #[test]
    fn explorer_points_at_chain_endpoints() {
        let set = blockscout_manifests(&props()).unwrap();
        let deploy: Value = serde_json::from_str(&set.documents[0]).unwrap();
        let env = deploy["spec"]["template"]["spec"]["containers"][0]["env"]
            .as_array()
            .unwrap();

        let lookup = |name: &str| {
            env.iter()
                .find(|e| e["name"] == name)
                .map(|e| e["value"].clone())
        };
        assert_eq!(lookup("ETHEREUM_JSONRPC_WS_URL"), Some("ws://geth:8546".into()));
        assert_eq!(lookup("ETHEREUM_JSONRPC_HTTP_URL"), Some("http://geth:8544".into()));
    }

    #[test]
    fn selector_matches_pod_labels() {
        let set = blockscout_manifests(&props()).unwrap();
        let deploy: Value = serde_json::from_str(&set.documents[0]).unwrap();
        assert_eq!(
            deploy["spec"]["selector"]["matchLabels"],
            deploy["spec"]["template"]["metadata"]["labels"]
        );
    }
}
