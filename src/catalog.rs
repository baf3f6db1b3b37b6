//! Service kinds a node can represent.
//!
//! A kind only decides how a node is drawn. Kinds are addressed by their
//! dotted path, `provider.group.Name`, e.g. `aws.storage.S3`.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Aws,
    OnPrem,
    Generic,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::OnPrem => "onprem",
            Provider::Generic => "generic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // aws.compute
    Ec2,
    Ecs,
    Lambda,
    // aws.database
    Dynamodb,
    Elasticache,
    Rds,
    // aws.devtools
    Codebuild,
    Codecommit,
    Codedeploy,
    Codepipeline,
    // aws.integration
    Sns,
    Sqs,
    // aws.network
    ApiGateway,
    CloudFront,
    Elb,
    Route53,
    // aws.storage
    Efs,
    S3,
    // onprem.client
    Client,
    User,
    // generic.blank
    Blank,
}

impl NodeKind {
    pub const ALL: [NodeKind; 21] = [
        NodeKind::Ec2,
        NodeKind::Ecs,
        NodeKind::Lambda,
        NodeKind::Dynamodb,
        NodeKind::Elasticache,
        NodeKind::Rds,
        NodeKind::Codebuild,
        NodeKind::Codecommit,
        NodeKind::Codedeploy,
        NodeKind::Codepipeline,
        NodeKind::Sns,
        NodeKind::Sqs,
        NodeKind::ApiGateway,
        NodeKind::CloudFront,
        NodeKind::Elb,
        NodeKind::Route53,
        NodeKind::Efs,
        NodeKind::S3,
        NodeKind::Client,
        NodeKind::User,
        NodeKind::Blank,
    ];

    pub fn provider(self) -> Provider {
        match self {
            NodeKind::Client | NodeKind::User => Provider::OnPrem,
            NodeKind::Blank => Provider::Generic,
            _ => Provider::Aws,
        }
    }

    pub fn group(self) -> &'static str {
        match self {
            NodeKind::Ec2 | NodeKind::Ecs | NodeKind::Lambda => "compute",
            NodeKind::Dynamodb | NodeKind::Elasticache | NodeKind::Rds => "database",
            NodeKind::Codebuild
            | NodeKind::Codecommit
            | NodeKind::Codedeploy
            | NodeKind::Codepipeline => "devtools",
            NodeKind::Sns | NodeKind::Sqs => "integration",
            NodeKind::ApiGateway | NodeKind::CloudFront | NodeKind::Elb | NodeKind::Route53 => {
                "network"
            }
            NodeKind::Efs | NodeKind::S3 => "storage",
            NodeKind::Client | NodeKind::User => "client",
            NodeKind::Blank => "blank",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Ec2 => "EC2",
            NodeKind::Ecs => "ECS",
            NodeKind::Lambda => "Lambda",
            NodeKind::Dynamodb => "Dynamodb",
            NodeKind::Elasticache => "Elasticache",
            NodeKind::Rds => "RDS",
            NodeKind::Codebuild => "Codebuild",
            NodeKind::Codecommit => "Codecommit",
            NodeKind::Codedeploy => "Codedeploy",
            NodeKind::Codepipeline => "Codepipeline",
            NodeKind::Sns => "SNS",
            NodeKind::Sqs => "SQS",
            NodeKind::ApiGateway => "APIGateway",
            NodeKind::CloudFront => "CloudFront",
            NodeKind::Elb => "ELB",
            NodeKind::Route53 => "Route53",
            NodeKind::Efs => "EFS",
            NodeKind::S3 => "S3",
            NodeKind::Client => "Client",
            NodeKind::User => "User",
            NodeKind::Blank => "Blank",
        }
    }

    /// Fill color of the node, keyed by service group.
    pub fn fill_color(self) -> &'static str {
        match self.group() {
            "compute" => "#ED7100",
            "database" => "#C925D1",
            "devtools" => "#3B48CC",
            "integration" => "#E7157B",
            "network" => "#8C4FFF",
            "storage" => "#7AA116",
            "client" => "#B2BEC3",
            _ => "#FFFFFF",
        }
    }

    /// Caption color that stays readable on [`NodeKind::fill_color`].
    pub fn font_color(self) -> &'static str {
        match self.provider() {
            Provider::Aws => "#FFFFFF",
            Provider::OnPrem | Provider::Generic => "#2D3436",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.provider().as_str(), self.group(), self.name())
    }
}

/// Returned when a dotted path names no known kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown node kind `{0}`")]
pub struct UnknownKind(pub String);

impl FromStr for NodeKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
