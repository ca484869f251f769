//! Deployment parameter resolution.

use std::fmt;
use std::str::FromStr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::RawContext;
use crate::error::ConfigError;
use crate::validation::{parse_bool_flag, parse_cidr, require_non_empty};

/// Recognized context keys
pub mod keys {
    pub const DEPLOYMENT_ID: &str = "deployment_id";
    pub const OWNER: &str = "owner";
    pub const ALLOWED_INGRESS_CIDR: &str = "allowed_ingress_cidr";
    pub const NAT_MODE: &str = "nat_mode";
    pub const DB_MULTI_AZ: &str = "db_multi_az";
    pub const EC2_INSTANCE_TYPE: &str = "ec2_instance_type";
    pub const DB_INSTANCE_CLASS: &str = "db_instance_class";

    pub const ALL: &[&str] = &[
        DEPLOYMENT_ID,
        OWNER,
        ALLOWED_INGRESS_CIDR,
        NAT_MODE,
        DB_MULTI_AZ,
        EC2_INSTANCE_TYPE,
        DB_INSTANCE_CLASS,
    ];
}

/// NAT gateway placement for private subnets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NatMode {
    /// One NAT gateway shared by all availability zones
    Single,
    /// One NAT gateway per availability zone
    PerAz,
    /// No NAT gateways; private subnets are isolated
    None,
}

impl NatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::PerAz => "per-az",
            Self::None => "none",
        }
    }
}

impl fmt::Display for NatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "per-az" | "per_az" => Ok(Self::PerAz),
            "none" => Ok(Self::None),
            _ => Err("expected one of: single, per-az, none".to_string()),
        }
    }
}

/// Validated, immutable deployment input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentParameters {
    deployment_id: String,
    owner: String,
    allowed_ingress_cidr: Option<IpNet>,
    nat_mode: Option<NatMode>,
    db_multi_az: Option<bool>,
    ec2_instance_type: Option<String>,
    db_instance_class: Option<String>,
}

impl DeploymentParameters {
    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn allowed_ingress_cidr(&self) -> Option<IpNet> {
        self.allowed_ingress_cidr
    }

    pub fn nat_mode(&self) -> Option<NatMode> {
        self.nat_mode
    }

    pub fn db_multi_az(&self) -> Option<bool> {
        self.db_multi_az
    }

    pub fn ec2_instance_type(&self) -> Option<&str> {
        self.ec2_instance_type.as_deref()
    }

    pub fn db_instance_class(&self) -> Option<&str> {
        self.db_instance_class.as_deref()
    }
}

/// Resolve raw context into validated deployment parameters.
///
/// Fails before anything else happens when `deployment_id` or `owner` is
/// missing or blank, or when an optional value is present but malformed.
pub fn resolve(raw: &RawContext) -> Result<DeploymentParameters, ConfigError> {
    for key in raw.keys() {
        if !keys::ALL.contains(&key.as_str()) {
            debug!("Ignoring unrecognized context key: {}", key);
        }
    }

    let deployment_id = require_non_empty(lookup(raw, keys::DEPLOYMENT_ID), keys::DEPLOYMENT_ID)?;
    let owner = require_non_empty(lookup(raw, keys::OWNER), keys::OWNER)?;

    let allowed_ingress_cidr = optional(raw, keys::ALLOWED_INGRESS_CIDR)
        .map(|v| parse_cidr(v, keys::ALLOWED_INGRESS_CIDR))
        .transpose()?;

    let nat_mode = optional(raw, keys::NAT_MODE)
        .map(|v| {
            v.parse::<NatMode>()
                .map_err(|reason| ConfigError::invalid(keys::NAT_MODE, v, reason))
        })
        .transpose()?;

    let db_multi_az = optional(raw, keys::DB_MULTI_AZ)
        .map(|v| parse_bool_flag(v, keys::DB_MULTI_AZ))
        .transpose()?;

    let ec2_instance_type = optional(raw, keys::EC2_INSTANCE_TYPE).map(str::to_string);
    let db_instance_class = optional(raw, keys::DB_INSTANCE_CLASS).map(str::to_string);

    Ok(DeploymentParameters {
        deployment_id,
        owner,
        allowed_ingress_cidr,
        nat_mode,
        db_multi_az,
        ec2_instance_type,
        db_instance_class,
    })
}

fn lookup<'a>(raw: &'a RawContext, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(|v| v.as_deref())
}

/// Optional values that are null or blank are treated as unset.
fn optional<'a>(raw: &'a RawContext, key: &str) -> Option<&'a str> {
    lookup(raw, key).map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(pairs: &[(&str, &str)]) -> RawContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Some(v.to_string())))
            .collect()
    }

    #[test]
    fn test_resolve_minimal() {
        let params = resolve(&context(&[("deployment_id", "lab01"), ("owner", "alice")])).unwrap();

        assert_eq!(params.deployment_id(), "lab01");
        assert_eq!(params.owner(), "alice");
        assert_eq!(params.allowed_ingress_cidr(), None);
        assert_eq!(params.nat_mode(), None);
        assert_eq!(params.db_multi_az(), None);
        assert_eq!(params.ec2_instance_type(), None);
        assert_eq!(params.db_instance_class(), None);
    }

    #[test]
    fn test_resolve_all_fields() {
        let params = resolve(&context(&[
            ("deployment_id", "lab01"),
            ("owner", "alice"),
            ("allowed_ingress_cidr", "198.51.100.0/24"),
            ("nat_mode", "per-az"),
            ("db_multi_az", "true"),
            ("ec2_instance_type", "t3.small"),
            ("db_instance_class", "db.t3.medium"),
        ]))
        .unwrap();

        assert_eq!(
            params.allowed_ingress_cidr().map(|c| c.to_string()),
            Some("198.51.100.0/24".to_string())
        );
        assert_eq!(params.nat_mode(), Some(NatMode::PerAz));
        assert_eq!(params.db_multi_az(), Some(true));
        assert_eq!(params.ec2_instance_type(), Some("t3.small"));
        assert_eq!(params.db_instance_class(), Some("db.t3.medium"));
    }

    #[test]
    fn test_resolve_missing_required() {
        let cases: Vec<(RawContext, &str)> = vec![
            (context(&[("owner", "alice")]), "deployment_id"),
            (context(&[("deployment_id", "lab01")]), "owner"),
            (context(&[]), "deployment_id"),
            (context(&[("deployment_id", ""), ("owner", "alice")]), "deployment_id"),
            (context(&[("deployment_id", "lab01"), ("owner", "  ")]), "owner"),
        ];

        for (raw, field) in cases {
            assert_eq!(resolve(&raw), Err(ConfigError::missing(field)), "{:?}", raw);
        }
    }

    #[test]
    fn test_resolve_null_required_is_missing() {
        let mut raw = context(&[("deployment_id", "lab01")]);
        raw.insert("owner".to_string(), None);
        assert_eq!(resolve(&raw), Err(ConfigError::missing("owner")));
    }

    #[test]
    fn test_resolve_rejects_malformed_optionals() {
        let base = [("deployment_id", "lab01"), ("owner", "alice")];

        for (key, value) in [
            ("allowed_ingress_cidr", "10.0.0.0"),
            ("nat_mode", "double"),
            ("db_multi_az", "maybe"),
        ] {
            let mut pairs = base.to_vec();
            pairs.push((key, value));
            let err = resolve(&context(&pairs)).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref field, .. } if field == key),
                "{} should be rejected, got {:?}",
                key,
                err
            );
        }
    }

    #[test]
    fn test_resolve_blank_optionals_are_unset() {
        let params = resolve(&context(&[
            ("deployment_id", "lab01"),
            ("owner", "alice"),
            ("nat_mode", ""),
            ("ec2_instance_type", " "),
        ]))
        .unwrap();

        assert_eq!(params.nat_mode(), None);
        assert_eq!(params.ec2_instance_type(), None);
    }

    #[test]
    fn test_nat_mode_parsing() {
        assert_eq!("single".parse::<NatMode>(), Ok(NatMode::Single));
        assert_eq!("PER_AZ".parse::<NatMode>(), Ok(NatMode::PerAz));
        assert_eq!("none".parse::<NatMode>(), Ok(NatMode::None));
        assert!("nat".parse::<NatMode>().is_err());
        assert_eq!(NatMode::PerAz.to_string(), "per-az");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let params = resolve(&context(&[
            ("deployment_id", "lab01"),
            ("owner", "alice"),
            ("@aws-cdk/core:newStyleStackSynthesis", "true"),
        ]));
        assert!(params.is_ok());
    }
}
