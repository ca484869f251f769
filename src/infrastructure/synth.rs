//! Synthesizing stack constructor
//!
//! Produces deterministic logical resource descriptions for each lab stack.
//! Nothing is provisioned; the descriptions end up in the deployment plan
//! and are what a provider layer would turn into real resources.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{ConstructRequest, StackConstructor};
use crate::config::NatMode;
use crate::domain::registry::{ResourceHandle, StackOutputs};
use crate::domain::topology;

pub const DEFAULT_NAT_MODE: NatMode = NatMode::Single;
pub const DEFAULT_DB_MULTI_AZ: bool = false;
pub const DEFAULT_EC2_INSTANCE_TYPE: &str = "t3.micro";
pub const DEFAULT_DB_INSTANCE_CLASS: &str = "db.t3.micro";
pub const DEFAULT_INGRESS_CIDR: &str = "0.0.0.0/0";

/// Availability zones spanned by the VPC
pub const AZ_COUNT: usize = 2;

const VPC_CIDR: &str = "10.0.0.0/16";
const POSTGRES_PORT: u16 = 5432;
const HTTP_PORT: u16 = 80;

/// Built-in constructor used by `synth`
#[derive(Debug, Clone, Copy, Default)]
pub struct SynthConstructor;

impl SynthConstructor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StackConstructor for SynthConstructor {
    async fn construct(&self, request: ConstructRequest<'_>) -> Result<StackOutputs> {
        debug!("Synthesizing stack {}", request.stack_id);

        let outputs = match request.stack.name() {
            topology::NETWORK => network(&request),
            topology::SECURITY => security(&request),
            topology::STORAGE => storage(&request),
            topology::DATA => data(&request)?,
            topology::SECRETS => secrets(&request)?,
            topology::COMPUTE => compute(&request)?,
            other => bail!("no synthesizer for stack '{}'", other),
        };

        Ok(outputs
            .into_iter()
            .map(|(name, value)| (name.to_string(), ResourceHandle::new(value)))
            .collect())
    }
}

/// Describe one logical resource, tagged with the run's tag set
fn resource(request: &ConstructRequest<'_>, kind: &str, logical_id: &str, properties: Value) -> Value {
    json!({
        "type": kind,
        "logical_id": format!("{}/{}", request.stack_id, logical_id),
        "region": request.env.region,
        "properties": properties,
        "tags": request.tags,
    })
}

/// Reference to a resource produced by another stack
///
/// Lists of resources (subnets) become lists of references.
fn reference(handle: &ResourceHandle) -> Value {
    match handle.as_value() {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| item.get("logical_id").cloned().unwrap_or_else(|| item.clone()))
                .collect(),
        ),
        value => value
            .get("logical_id")
            .cloned()
            .unwrap_or_else(|| value.clone()),
    }
}

fn input_ref(request: &ConstructRequest<'_>, name: &str) -> Result<Value> {
    Ok(reference(request.input(name)?))
}

fn network(request: &ConstructRequest<'_>) -> Vec<(&'static str, Value)> {
    let nat_mode = request.params.nat_mode().unwrap_or(DEFAULT_NAT_MODE);
    let nat_gateways = match nat_mode {
        NatMode::Single => 1,
        NatMode::PerAz => AZ_COUNT,
        NatMode::None => 0,
    };
    let ingress = request
        .params
        .allowed_ingress_cidr()
        .map(|c| c.to_string())
        .unwrap_or_else(|| DEFAULT_INGRESS_CIDR.to_string());

    let vpc_id = format!("{}/Vpc", request.stack_id);

    let subnets = |tier: &str, offset: usize| -> Value {
        Value::Array(
            (0..AZ_COUNT)
                .map(|az| {
                    resource(
                        request,
                        "Subnet",
                        &format!("{}Subnet{}", tier, az + 1),
                        json!({
                            "vpc": vpc_id,
                            "cidr": format!("10.0.{}.0/24", offset + az),
                            "az_index": az,
                        }),
                    )
                })
                .collect(),
        )
    };

    let alb_sg = resource(
        request,
        "SecurityGroup",
        "AlbSecurityGroup",
        json!({ "vpc": vpc_id, "ingress": [{ "cidr": ingress, "port": HTTP_PORT }] }),
    );
    let ec2_sg = resource(
        request,
        "SecurityGroup",
        "Ec2SecurityGroup",
        json!({ "vpc": vpc_id, "ingress": [{ "source": alb_sg["logical_id"], "port": HTTP_PORT }] }),
    );
    let rds_sg = resource(
        request,
        "SecurityGroup",
        "RdsSecurityGroup",
        json!({ "vpc": vpc_id, "ingress": [{ "source": ec2_sg["logical_id"], "port": POSTGRES_PORT }] }),
    );

    vec![
        (
            "vpc",
            resource(
                request,
                "Vpc",
                "Vpc",
                json!({
                    "cidr": VPC_CIDR,
                    "max_azs": AZ_COUNT,
                    "nat_mode": nat_mode,
                    "nat_gateways": nat_gateways,
                }),
            ),
        ),
        ("public_subnets", subnets("Public", 0)),
        ("private_subnets", subnets("Private", 10)),
        ("alb_security_group", alb_sg),
        ("ec2_security_group", ec2_sg),
        ("rds_security_group", rds_sg),
    ]
}

fn security(request: &ConstructRequest<'_>) -> Vec<(&'static str, Value)> {
    vec![
        (
            "inspector",
            resource(
                request,
                "InspectorEnabler",
                "Inspector",
                json!({ "resource_types": ["EC2"] }),
            ),
        ),
        (
            "security_hub",
            resource(
                request,
                "SecurityHub",
                "SecurityHub",
                json!({ "standards": ["aws-foundational-security-best-practices"] }),
            ),
        ),
    ]
}

fn storage(request: &ConstructRequest<'_>) -> Vec<(&'static str, Value)> {
    let bucket_name = format!(
        "{}-images",
        topology::stack_id(request.params.deployment_id(), topology::STORAGE)
    )
    .to_ascii_lowercase();

    vec![(
        "bucket",
        resource(
            request,
            "Bucket",
            "ImageBucket",
            json!({
                "bucket_name": bucket_name,
                "encryption": "S3_MANAGED",
                "block_public_access": true,
                "versioned": true,
                "enforce_ssl": true,
            }),
        ),
    )]
}

fn data(request: &ConstructRequest<'_>) -> Result<Vec<(&'static str, Value)>> {
    let instance_class = request
        .params
        .db_instance_class()
        .unwrap_or(DEFAULT_DB_INSTANCE_CLASS);
    let multi_az = request.params.db_multi_az().unwrap_or(DEFAULT_DB_MULTI_AZ);

    Ok(vec![(
        "rds_instance",
        resource(
            request,
            "DatabaseInstance",
            "Database",
            json!({
                "engine": "postgres",
                "instance_class": instance_class,
                "multi_az": multi_az,
                "port": POSTGRES_PORT,
                "storage_encrypted": true,
                "vpc": input_ref(request, "vpc")?,
                "subnets": input_ref(request, "private_subnets")?,
                "security_groups": [input_ref(request, "db_security_group")?],
            }),
        ),
    )])
}

fn secrets(request: &ConstructRequest<'_>) -> Result<Vec<(&'static str, Value)>> {
    Ok(vec![(
        "db_secret",
        resource(
            request,
            "Secret",
            "DatabaseCredentials",
            json!({
                "database": input_ref(request, "rds_instance")?,
                "username": "hrapp_admin",
                "generate_password": true,
            }),
        ),
    )])
}

fn compute(request: &ConstructRequest<'_>) -> Result<Vec<(&'static str, Value)>> {
    let instance_type = request
        .params
        .ec2_instance_type()
        .unwrap_or(DEFAULT_EC2_INSTANCE_TYPE);

    let role = resource(
        request,
        "Role",
        "InstanceRole",
        json!({
            "assumed_by": "ec2.amazonaws.com",
            "grants": [
                { "action": "read_write", "resource": input_ref(request, "s3_bucket")? },
                { "action": "read", "resource": input_ref(request, "db_secret")? },
            ],
        }),
    );

    let instance = resource(
        request,
        "Instance",
        "AppInstance",
        json!({
            "instance_type": instance_type,
            "vpc": input_ref(request, "vpc")?,
            "subnets": input_ref(request, "private_subnets")?,
            "security_groups": [input_ref(request, "ec2_security_group")?],
            "role": role["logical_id"],
        }),
    );

    let load_balancer = resource(
        request,
        "ApplicationLoadBalancer",
        "LoadBalancer",
        json!({
            "internet_facing": true,
            "vpc": input_ref(request, "vpc")?,
            "subnets": input_ref(request, "public_subnets")?,
            "security_groups": [input_ref(request, "alb_security_group")?],
            "targets": [instance["logical_id"]],
            "port": HTTP_PORT,
        }),
    );

    Ok(vec![
        ("load_balancer", load_balancer),
        ("instance", instance),
        ("instance_role", role),
    ])
}
