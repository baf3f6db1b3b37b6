use std::path::Path;

use archdiag::architectures::{aws_architecture1, aws_architecture2, aws_architecture3};
use archdiag::dot::to_dot;
use archdiag::{Architecture, Diagram, Direction, NodeKind};
use pretty_assertions::assert_eq;

fn descriptor(name: &str) -> Diagram {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("descriptors")
        .join(name);
    let source = std::fs::read_to_string(&path).unwrap();
    archdiag::parse_descriptor(&source).unwrap()
}

fn labels(d: &Diagram) -> Vec<&str> {
    d.nodes().iter().map(|n| n.label.as_str()).collect()
}

// =============================================================================
// Architecture 1
// =============================================================================

#[test]
fn architecture1_two_nodes_one_edge() {
    let d = aws_architecture1().unwrap();
    assert_eq!(d.title, "AWS Architecture1");
    assert_eq!(labels(&d), vec!["CloudFront\nDistribution", "React\nBuild Files"]);
    assert_eq!(d.nodes()[0].kind, NodeKind::CloudFront);
    assert_eq!(d.nodes()[1].kind, NodeKind::S3);
    assert_eq!(d.edges().len(), 1);
    assert_eq!(d.edges()[0].label, None);
    assert!(d.clusters().is_empty());
}

#[test]
fn architecture1_default_options() {
    let d = aws_architecture1().unwrap();
    assert_eq!(d.direction, Direction::LeftRight);
    assert!(d.graph_attr.is_empty());
    assert_eq!(d.output_stem(), "aws_architecture1");
}

#[test]
fn architecture1_dot() {
    let dot = to_dot(&aws_architecture1().unwrap());
    assert!(dot.contains("n0 [label=\"CloudFront\\nDistribution\""));
    assert!(dot.contains("n1 [label=\"React\\nBuild Files\""));
    assert!(dot.contains("  n0 -> n1;\n"));
    assert!(!dot.contains("subgraph"));
}

// =============================================================================
// Architecture 2
// =============================================================================

#[test]
fn architecture2_graph_attr() {
    let d = aws_architecture2().unwrap();
    let attrs: Vec<_> = d.graph_attr.iter().collect();
    assert_eq!(
        attrs,
        vec![("rankdir", "LR"), ("ratio", "1.7"), ("splines", "ortho")]
    );
}

#[test]
fn architecture2_storage_outside_cluster() {
    let d = aws_architecture2().unwrap();
    let s3 = d.nodes().iter().find(|n| n.kind == NodeKind::S3).unwrap();
    assert_eq!(s3.label, "Build Files\nStorage");
    assert_eq!(s3.cluster, None);
}

// =============================================================================
// Architecture 3
// =============================================================================

#[test]
fn architecture3_clusters() {
    let d = aws_architecture3().unwrap();
    let names: Vec<&str> = d.clusters().iter().map(|c| c.label.as_str()).collect();
    assert_eq!(names, vec!["CI/CD Pipeline", "Frontend", "Backend"]);

    let per_cluster: Vec<usize> = d
        .clusters()
        .iter()
        .map(|c| d.nodes_in(Some(c.id)).count())
        .collect();
    assert_eq!(per_cluster, vec![3, 2, 2]);
    assert_eq!(d.nodes().len(), 9);
    assert_eq!(d.nodes_in(None).count(), 2, "developer and end user");
}

#[test]
fn architecture3_edges_labeled() {
    let d = aws_architecture3().unwrap();
    let edge_labels: Vec<&str> = d
        .edges()
        .iter()
        .map(|e| e.label.as_deref().unwrap())
        .collect();
    assert_eq!(
        edge_labels,
        vec![
            "git push",
            "Source",
            "Build",
            "Deploy",
            "Origin",
            "Access",
            "API Call",
            "CRUD\nOperations"
        ]
    );
}

#[test]
fn architecture3_edge_endpoints() {
    let d = aws_architecture3().unwrap();
    let by_label = |label: &str| {
        let e = d
            .edges()
            .iter()
            .find(|e| e.label.as_deref() == Some(label))
            .unwrap();
        (
            d.get_node(e.from).unwrap().label.as_str(),
            d.get_node(e.to).unwrap().label.as_str(),
        )
    };
    assert_eq!(by_label("Origin"), ("Content\nDelivery", "Static Content\nStorage"));
    assert_eq!(by_label("API Call"), ("Content\nDelivery", "API\nFunction"));
    assert_eq!(by_label("Access"), ("End User", "Content\nDelivery"));
}

#[test]
fn architecture3_dot_keeps_clusters_and_labels() {
    let dot = to_dot(&aws_architecture3().unwrap());
    for cluster in ["CI/CD Pipeline", "Frontend", "Backend"] {
        assert!(dot.contains(&format!("label=\"{cluster}\"")), "missing {cluster}");
    }
    for label in ["git push", "Deploy", "API Call", "CRUD\\nOperations"] {
        assert!(dot.contains(&format!("[label=\"{label}\"]")), "missing {label}");
    }
    assert_eq!(dot.matches("subgraph cluster_").count(), 3);
    assert_eq!(dot.matches(" -> ").count(), 8);
    assert!(dot.contains("pad=\"0.5\""));
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn every_edge_endpoint_declared_earlier() {
    for arch in Architecture::ALL {
        let d = arch.build().unwrap();
        for e in d.edges() {
            assert!(e.from.index() < d.nodes().len());
            assert!(e.to.index() < d.nodes().len());
        }
    }
}

#[test]
fn build_is_repeatable() {
    for arch in Architecture::ALL {
        assert_eq!(arch.build().unwrap(), arch.build().unwrap());
        assert_eq!(
            to_dot(&arch.build().unwrap()),
            to_dot(&arch.build().unwrap())
        );
    }
}

// =============================================================================
// Descriptor files
// =============================================================================

#[test]
fn descriptor_matches_architecture1() {
    assert_eq!(descriptor("aws_architecture1.diag"), aws_architecture1().unwrap());
}

#[test]
fn descriptor_matches_architecture2() {
    assert_eq!(descriptor("aws_architecture2.diag"), aws_architecture2().unwrap());
}

#[test]
fn descriptor_matches_architecture3() {
    assert_eq!(descriptor("aws_architecture3.diag"), aws_architecture3().unwrap());
}
