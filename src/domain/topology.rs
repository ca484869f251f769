//! HR App Lab stack topology
//!
//! The fixed set of logical stacks and the handles wired between them.
//! Adding a stack means adding a node here; [`StackGraph::from_nodes`]
//! re-validates the whole table on every run.

use crate::domain::graph::{StackGraph, StackNode};
use crate::error::GraphError;

pub const NETWORK: &str = "network";
pub const SECURITY: &str = "security";
pub const STORAGE: &str = "storage";
pub const DATA: &str = "data";
pub const SECRETS: &str = "secrets";
pub const COMPUTE: &str = "compute";

/// Prefix for physical stack identifiers
pub const STACK_ID_PREFIX: &str = "hrapp";

/// Physical stack identifier, e.g. `hrapp-lab01-network`
pub fn stack_id(deployment_id: &str, stack: &str) -> String {
    format!("{}-{}-{}", STACK_ID_PREFIX, deployment_id, stack)
}

/// Declarative node list for the lab topology, in declaration order.
pub fn stack_nodes() -> Vec<StackNode> {
    vec![
        StackNode::new(NETWORK).produces([
            "vpc",
            "public_subnets",
            "private_subnets",
            "alb_security_group",
            "ec2_security_group",
            "rds_security_group",
        ]),
        StackNode::new(SECURITY).produces(["inspector", "security_hub"]),
        StackNode::new(STORAGE).produces(["bucket"]),
        StackNode::new(DATA)
            .depends_on([NETWORK])
            .consumes("vpc", NETWORK, "vpc")
            .consumes("db_security_group", NETWORK, "rds_security_group")
            .consumes("private_subnets", NETWORK, "private_subnets")
            .produces(["rds_instance"]),
        StackNode::new(SECRETS)
            .depends_on([DATA])
            .consumes("rds_instance", DATA, "rds_instance")
            .produces(["db_secret"]),
        StackNode::new(COMPUTE)
            .depends_on([NETWORK, STORAGE, SECRETS])
            .consumes("vpc", NETWORK, "vpc")
            .consumes("alb_security_group", NETWORK, "alb_security_group")
            .consumes("ec2_security_group", NETWORK, "ec2_security_group")
            .consumes("public_subnets", NETWORK, "public_subnets")
            .consumes("private_subnets", NETWORK, "private_subnets")
            .consumes("s3_bucket", STORAGE, "bucket")
            .consumes("db_secret", SECRETS, "db_secret")
            .produces(["load_balancer", "instance", "instance_role"]),
    ]
}

/// Build and validate the lab stack graph.
pub fn build_graph() -> Result<StackGraph, GraphError> {
    StackGraph::from_nodes(stack_nodes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_graph_is_valid() {
        let graph = build_graph().unwrap();
        assert_eq!(graph.nodes().len(), 6);
    }

    #[test]
    fn test_construction_order() {
        let graph = build_graph().unwrap();
        assert_eq!(
            graph.order_names(),
            vec!["network", "security", "storage", "data", "secrets", "compute"]
        );
    }

    #[test]
    fn test_order_is_stable() {
        let first = build_graph().unwrap().order_names();
        for _ in 0..10 {
            assert_eq!(build_graph().unwrap().order_names(), first);
        }
    }

    #[test]
    fn test_every_node_after_its_dependencies() {
        let graph = build_graph().unwrap();
        let order = graph.order_names();
        let position = |name: &str| order.iter().position(|n| n == name).unwrap();

        for node in graph.nodes() {
            for dep in node.dependencies() {
                assert!(position(dep) < position(node.name()), "{} before {}", dep, node.name());
            }
        }
    }

    #[test]
    fn test_compute_wiring() {
        let graph = build_graph().unwrap();
        let compute = graph.node(COMPUTE).unwrap();

        assert_eq!(compute.dependencies(), &["network", "storage", "secrets"]);
        assert_eq!(compute.inputs().len(), 7);
        assert!(compute
            .inputs()
            .iter()
            .any(|i| i.name == "s3_bucket" && i.producer == STORAGE && i.output == "bucket"));
    }

    #[test]
    fn test_extension_with_cycle_fails() {
        let mut nodes = stack_nodes();
        nodes[0] = StackNode::new(NETWORK).depends_on([COMPUTE]).produces([
            "vpc",
            "public_subnets",
            "private_subnets",
            "alb_security_group",
            "ec2_security_group",
            "rds_security_group",
        ]);

        assert!(matches!(
            StackGraph::from_nodes(nodes),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn test_stack_id() {
        assert_eq!(stack_id("lab01", NETWORK), "hrapp-lab01-network");
    }
}
