//! The AWS architectures shipped with the crate.
//!
//! Each one also exists as a descriptor under `descriptors/`, which parses
//! to an equal [`Diagram`].

use crate::catalog::NodeKind;
use crate::diagram::{Diagram, Direction};
use crate::error::DiagramError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Aws1,
    Aws2,
    Aws3,
}

impl Architecture {
    pub const ALL: [Architecture; 3] = [Architecture::Aws1, Architecture::Aws2, Architecture::Aws3];

    pub fn name(self) -> &'static str {
        match self {
            Architecture::Aws1 => "aws-architecture1",
            Architecture::Aws2 => "aws-architecture2",
            Architecture::Aws3 => "aws-architecture3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Architecture::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn build(self) -> Result<Diagram, DiagramError> {
        match self {
            Architecture::Aws1 => aws_architecture1(),
            Architecture::Aws2 => aws_architecture2(),
            Architecture::Aws3 => aws_architecture3(),
        }
    }
}

/// CloudFront in front of the S3 bucket holding the React build.
pub fn aws_architecture1() -> Result<Diagram, DiagramError> {
    let mut d = Diagram::new("AWS Architecture1");

    let cf = d.node(NodeKind::CloudFront, "CloudFront\nDistribution");
    let s3 = d.node(NodeKind::S3, "React\nBuild Files");

    d.connect(cf, s3)?;
    Ok(d)
}

fn pipeline_graph_attr(d: &mut Diagram) {
    d.direction = Direction::LeftRight;
    d.graph_attr
        .set("rankdir", "LR")
        .set("ratio", "1.7")
        .set("splines", "ortho");
}

/// CodeCommit/CodePipeline/CodeBuild deploying to S3 behind CloudFront.
pub fn aws_architecture2() -> Result<Diagram, DiagramError> {
    let mut d = Diagram::new("AWS Architecture2");
    pipeline_graph_attr(&mut d);

    let developer = d.node(NodeKind::Client, "Developer");
    let end_user = d.node(NodeKind::Client, "End User");

    let (repo, pipeline, build) = d.cluster("CI/CD Pipeline", |d| {
        (
            d.node(NodeKind::Codecommit, "Source\nRepository"),
            d.node(NodeKind::Codepipeline, "CI/CD\nPipeline"),
            d.node(NodeKind::Codebuild, "React\nBuild"),
        )
    });

    let s3 = d.node(NodeKind::S3, "Build Files\nStorage");
    let cdn = d.node(NodeKind::CloudFront, "Content\nDelivery");

    d.connect(developer, repo)?.label("git push");
    d.connect(repo, pipeline)?.label("Source");
    d.connect(pipeline, build)?.label("Build");
    d.connect(build, s3)?.label("Deploy");
    d.connect(cdn, s3)?.label("Origin");
    d.connect(end_user, cdn)?.label("Access");
    Ok(d)
}

/// Architecture 2 split into frontend and backend clusters, with a Lambda API
/// over DynamoDB.
pub fn aws_architecture3() -> Result<Diagram, DiagramError> {
    let mut d = Diagram::new("AWS Architecture3");
    pipeline_graph_attr(&mut d);
    d.graph_attr.set("pad", "0.5");

    let developer = d.node(NodeKind::Client, "Developer");
    let end_user = d.node(NodeKind::Client, "End User");

    let (repo, pipeline, build) = d.cluster("CI/CD Pipeline", |d| {
        (
            d.node(NodeKind::Codecommit, "Source\nRepository"),
            d.node(NodeKind::Codepipeline, "CI/CD\nPipeline"),
            d.node(NodeKind::Codebuild, "React\nBuild"),
        )
    });

    let (s3, cdn) = d.cluster("Frontend", |d| {
        (
            d.node(NodeKind::S3, "Static Content\nStorage"),
            d.node(NodeKind::CloudFront, "Content\nDelivery"),
        )
    });

    let (api, table) = d.cluster("Backend", |d| {
        (
            d.node(NodeKind::Lambda, "API\nFunction"),
            d.node(NodeKind::Dynamodb, "Task\nDatabase"),
        )
    });

    d.connect(developer, repo)?.label("git push");
    d.connect(repo, pipeline)?.label("Source");
    d.connect(pipeline, build)?.label("Build");
    d.connect(build, s3)?.label("Deploy");

    d.connect(cdn, s3)?.label("Origin");
    d.connect(end_user, cdn)?.label("Access");

    d.connect(cdn, api)?.label("API Call");
    d.connect(api, table)?.label("CRUD\nOperations");
    Ok(d)
}
