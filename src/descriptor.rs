//! Text form of a diagram.
//!
//! ```text
//! diagram "AWS Architecture2"
//! direction LR
//! graph_attr ratio="1.7" splines=ortho
//!
//! developer = onprem.client.Client "Developer"
//! cluster "CI/CD Pipeline" {
//!     repo = aws.devtools.Codecommit "Source\nRepository"
//! }
//! developer >> repo "git push"
//! ```
//!
//! One statement per line, `#` starts a comment. Edge operators are `>>`
//! (forward), `<<` (back), `<>` (both) and `--` (no arrow); `&` fans one
//! source out to several targets.

use std::collections::HashMap;

use winnow::prelude::*;
use winnow::ascii::{line_ending, space0, space1, till_line_ending};
use winnow::combinator::{alt, eof, opt, preceded, repeat, separated};
use winnow::error::ParserError;
use winnow::token::{any, take_while};

use crate::catalog::NodeKind;
use crate::diagram::{Attrs, Diagram, Direction, EdgeDir, NodeId, OutFormat};
use crate::error::DescriptorError;

pub fn parse_descriptor(source: &str) -> Result<Diagram, DescriptorError> {
    let statements = parse_statements(source)?;
    build(source, statements)
}

#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Header(String),
    Direction(String),
    GraphAttr(Vec<(String, String)>),
    NodeAttr(Vec<(String, String)>),
    EdgeAttr(Vec<(String, String)>),
    Filename(String),
    OutFormat(Vec<String>),
    Node {
        name: String,
        kind: String,
        label: String,
    },
    ClusterOpen(String),
    ClusterClose,
    Edge {
        from: String,
        dir: EdgeDir,
        to: Vec<String>,
        label: Option<String>,
    },
}

#[derive(Debug)]
struct Located {
    /// Length of the source remaining at the start of the statement.
    rest: usize,
    stmt: Statement,
}

fn parse_statements(source: &str) -> Result<Vec<Located>, DescriptorError> {
    let mut input = source;
    let mut statements = Vec::new();
    while !input.is_empty() {
        let before = input;
        match line(&mut input) {
            Ok(Some(stmt)) => statements.push(Located {
                rest: before.len(),
                stmt,
            }),
            Ok(None) => {}
            Err(_) => return Err(syntax_error(source, before)),
        }
    }
    Ok(statements)
}

fn line_number(source: &str, rest: usize) -> usize {
    source[..source.len() - rest].matches('\n').count() + 1
}

fn syntax_error(source: &str, at: &str) -> DescriptorError {
    let context = at.lines().next().unwrap_or("").trim();
    let context = if context.chars().count() > 40 {
        format!("{}...", context.chars().take(40).collect::<String>())
    } else {
        context.to_string()
    };
    DescriptorError::Syntax {
        line: line_number(source, at.len()),
        context,
    }
}

fn line(input: &mut &str) -> winnow::Result<Option<Statement>> {
    space0.parse_next(input)?;
    alt((
        end_of_line.map(|_| None),
        header.map(Some),
        direction.map(Some),
        attr_stmt("graph_attr").map(|a| Some(Statement::GraphAttr(a))),
        attr_stmt("node_attr").map(|a| Some(Statement::NodeAttr(a))),
        attr_stmt("edge_attr").map(|a| Some(Statement::EdgeAttr(a))),
        filename.map(Some),
        outformat.map(Some),
        cluster_open.map(Some),
        cluster_close.map(Some),
        node_decl.map(Some),
        edge_line.map(Some),
    ))
    .parse_next(input)
}

/// Trailing spaces, an optional comment, then a newline or end of input.
fn end_of_line(input: &mut &str) -> winnow::Result<()> {
    space0.parse_next(input)?;
    opt(("#", till_line_ending)).parse_next(input)?;
    alt((line_ending.void(), eof.void())).parse_next(input)
}

fn identifier<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}

fn kind_path<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '.').parse_next(input)
}

fn bare_value<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '"').parse_next(input)
}

/// Double-quoted string. Understands `\n`, `\t`, `\"` and `\\`; other escapes
/// are kept as written.
fn quoted(input: &mut &str) -> winnow::Result<String> {
    '"'.parse_next(input)?;
    let mut out = String::new();
    loop {
        match any.parse_next(input)? {
            '"' => return Ok(out),
            '\\' => match any.parse_next(input)? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            '\n' | '\r' => return Err(ParserError::from_input(input)),
            c => out.push(c),
        }
    }
}

fn value(input: &mut &str) -> winnow::Result<String> {
    alt((quoted, bare_value.map(str::to_string))).parse_next(input)
}

fn header(input: &mut &str) -> winnow::Result<Statement> {
    "diagram".parse_next(input)?;
    space1.parse_next(input)?;
    let title = quoted.parse_next(input)?;
    end_of_line.parse_next(input)?;
    Ok(Statement::Header(title))
}

fn direction(input: &mut &str) -> winnow::Result<Statement> {
    "direction".parse_next(input)?;
    space1.parse_next(input)?;
    let token = identifier.parse_next(input)?;
    end_of_line.parse_next(input)?;
    Ok(Statement::Direction(token.to_string()))
}

fn attr_pair(input: &mut &str) -> winnow::Result<(String, String)> {
    let key = identifier.parse_next(input)?;
    "=".parse_next(input)?;
    let value = value.parse_next(input)?;
    Ok((key.to_string(), value))
}

fn attr_stmt(
    mut keyword: &'static str,
) -> impl FnMut(&mut &str) -> winnow::Result<Vec<(String, String)>> {
    move |input: &mut &str| {
        keyword.parse_next(input)?;
        space1.parse_next(input)?;
        let pairs: Vec<(String, String)> = separated(1.., attr_pair, space1).parse_next(input)?;
        end_of_line.parse_next(input)?;
        Ok(pairs)
    }
}

fn filename(input: &mut &str) -> winnow::Result<Statement> {
    "filename".parse_next(input)?;
    space1.parse_next(input)?;
    let name = value.parse_next(input)?;
    end_of_line.parse_next(input)?;
    Ok(Statement::Filename(name))
}

fn outformat(input: &mut &str) -> winnow::Result<Statement> {
    "outformat".parse_next(input)?;
    let formats: Vec<&str> = repeat(1.., preceded(space1, identifier)).parse_next(input)?;
    end_of_line.parse_next(input)?;
    Ok(Statement::OutFormat(
        formats.into_iter().map(str::to_string).collect(),
    ))
}

fn cluster_open(input: &mut &str) -> winnow::Result<Statement> {
    "cluster".parse_next(input)?;
    space1.parse_next(input)?;
    let label = quoted.parse_next(input)?;
    space0.parse_next(input)?;
    "{".parse_next(input)?;
    end_of_line.parse_next(input)?;
    Ok(Statement::ClusterOpen(label))
}

fn cluster_close(input: &mut &str) -> winnow::Result<Statement> {
    "}".parse_next(input)?;
    end_of_line.parse_next(input)?;
    Ok(Statement::ClusterClose)
}

fn node_decl(input: &mut &str) -> winnow::Result<Statement> {
    let name = identifier.parse_next(input)?;
    space0.parse_next(input)?;
    "=".parse_next(input)?;
    space0.parse_next(input)?;
    let kind = kind_path.parse_next(input)?;
    space1.parse_next(input)?;
    let label = quoted.parse_next(input)?;
    end_of_line.parse_next(input)?;
    Ok(Statement::Node {
        name: name.to_string(),
        kind: kind.to_string(),
        label,
    })
}

fn edge_op(input: &mut &str) -> winnow::Result<EdgeDir> {
    alt((
        ">>".value(EdgeDir::Forward),
        "<<".value(EdgeDir::Back),
        "<>".value(EdgeDir::Both),
        "--".value(EdgeDir::None),
    ))
    .parse_next(input)
}

fn edge_line(input: &mut &str) -> winnow::Result<Statement> {
    let from = identifier.parse_next(input)?;
    space0.parse_next(input)?;
    let dir = edge_op.parse_next(input)?;
    space0.parse_next(input)?;
    let to: Vec<&str> = separated(1.., identifier, (space0, "&", space0)).parse_next(input)?;
    let label = opt(preceded(space0, quoted)).parse_next(input)?;
    end_of_line.parse_next(input)?;
    Ok(Statement::Edge {
        from: from.to_string(),
        dir,
        to: to.into_iter().map(str::to_string).collect(),
        label,
    })
}

struct Builder<'a> {
    source: &'a str,
    names: HashMap<String, NodeId>,
}

fn build(source: &str, statements: Vec<Located>) -> Result<Diagram, DescriptorError> {
    let mut iter = statements.into_iter();
    let mut diagram = match iter.next() {
        Some(Located {
            stmt: Statement::Header(title),
            ..
        }) => Diagram::new(title),
        _ => return Err(DescriptorError::MissingHeader),
    };

    let mut builder = Builder {
        source,
        names: HashMap::new(),
    };
    builder.apply_block(&mut diagram, &mut iter, None)?;
    Ok(diagram)
}

impl Builder<'_> {
    /// Applies statements until the matching `}` of a cluster opened on line
    /// `open`, or until the end for the top level.
    fn apply_block(
        &mut self,
        diagram: &mut Diagram,
        iter: &mut impl Iterator<Item = Located>,
        open: Option<usize>,
    ) -> Result<(), DescriptorError> {
        while let Some(located) = iter.next() {
            let line = line_number(self.source, located.rest);
            match located.stmt {
                Statement::ClusterOpen(label) => {
                    diagram.cluster(label, |d| self.apply_block(d, &mut *iter, Some(line)))?;
                }
                Statement::ClusterClose => {
                    if open.is_some() {
                        return Ok(());
                    }
                    return Err(DescriptorError::Syntax {
                        line,
                        context: "}".to_string(),
                    });
                }
                Statement::Header(title) => {
                    return Err(DescriptorError::Syntax {
                        line,
                        context: format!("diagram \"{title}\""),
                    });
                }
                Statement::Direction(token) => {
                    diagram.direction = Direction::from_token(&token)
                        .ok_or(DescriptorError::UnknownDirection { value: token, line })?;
                }
                Statement::GraphAttr(pairs) => extend(&mut diagram.graph_attr, pairs),
                Statement::NodeAttr(pairs) => extend(&mut diagram.node_attr, pairs),
                Statement::EdgeAttr(pairs) => extend(&mut diagram.edge_attr, pairs),
                Statement::Filename(name) => diagram.filename = Some(name),
                Statement::OutFormat(tokens) => {
                    let mut formats = Vec::with_capacity(tokens.len());
                    for token in tokens {
                        match OutFormat::from_token(&token) {
                            Some(format) => formats.push(format),
                            None => return Err(DescriptorError::UnknownFormat { value: token, line }),
                        }
                    }
                    diagram.outformats = formats;
                }
                Statement::Node { name, kind, label } => {
                    if self.names.contains_key(&name) {
                        return Err(DescriptorError::DuplicateNode { name, line });
                    }
                    let kind: NodeKind = kind
                        .parse()
                        .map_err(|_| DescriptorError::UnknownKind { path: kind, line })?;
                    let id = diagram.node(kind, label);
                    self.names.insert(name, id);
                }
                Statement::Edge {
                    from,
                    dir,
                    to,
                    label,
                } => {
                    let from = self.resolve(&from, line)?;
                    let targets = to
                        .iter()
                        .map(|name| self.resolve(name, line))
                        .collect::<Result<Vec<_>, _>>()?;
                    for target in targets {
                        let edge = diagram.connect(from, target)?;
                        edge.dir(dir);
                        if let Some(label) = &label {
                            edge.label(label.as_str());
                        }
                    }
                }
            }
        }
        match open {
            Some(line) => Err(DescriptorError::UnclosedCluster { line }),
            None => Ok(()),
        }
    }

    fn resolve(&self, name: &str, line: usize) -> Result<NodeId, DescriptorError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| DescriptorError::UnknownNode {
                name: name.to_string(),
                line,
            })
    }
}

fn extend(attrs: &mut Attrs, pairs: Vec<(String, String)>) {
    for (k, v) in pairs {
        attrs.set(k, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_quoted_with_escapes() {
        let mut input = "\"Source\\nRepository \\\"main\\\"\" rest";
        assert_eq!(quoted(&mut input).unwrap(), "Source\nRepository \"main\"");
        assert_eq!(input, " rest");
    }

    #[test]
    fn quoted_does_not_span_lines() {
        let mut input = "\"open\nclose\"";
        assert!(quoted(&mut input).is_err());
    }

    #[test]
    fn parse_edge_ops() {
        for (text, dir) in [
            (">>", EdgeDir::Forward),
            ("<<", EdgeDir::Back),
            ("<>", EdgeDir::Both),
            ("--", EdgeDir::None),
        ] {
            let mut input = text;
            assert_eq!(edge_op(&mut input).unwrap(), dir);
        }
    }

    #[test]
    fn parse_edge_line_with_fan_out_and_label() {
        let mut input = "lb >> web1 & web2 \"HTTP\"\n";
        assert_eq!(
            edge_line(&mut input).unwrap(),
            Statement::Edge {
                from: "lb".to_string(),
                dir: EdgeDir::Forward,
                to: vec!["web1".to_string(), "web2".to_string()],
                label: Some("HTTP".to_string()),
            }
        );
        assert_eq!(input, "");
    }

    #[test]
    fn parse_node_decl() {
        let mut input = "repo = aws.devtools.Codecommit \"Source\\nRepository\" # vcs\n";
        assert_eq!(
            node_decl(&mut input).unwrap(),
            Statement::Node {
                name: "repo".to_string(),
                kind: "aws.devtools.Codecommit".to_string(),
                label: "Source\nRepository".to_string(),
            }
        );
    }

    #[test]
    fn parse_graph_attr_mixed_values() {
        let mut input = "graph_attr ratio=\"1.7\" splines=ortho bgcolor=#ffffff\n";
        let pairs = attr_stmt("graph_attr")(&mut input).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("ratio".to_string(), "1.7".to_string()),
                ("splines".to_string(), "ortho".to_string()),
                ("bgcolor".to_string(), "#ffffff".to_string()),
            ]
        );
    }

    #[test]
    fn minimal_descriptor() {
        let d = parse_descriptor("diagram \"Solo\"\n").unwrap();
        assert_eq!(d.title, "Solo");
        assert!(d.nodes().is_empty());
    }

    #[test]
    fn full_descriptor() {
        let source = "\
# web tier
diagram \"Web Tier\"
direction TB
graph_attr pad=\"0.5\"
node_attr fontsize=14
edge_attr color=red
outformat svg dot
filename web

user = onprem.client.User \"Visitor\"
cluster \"Public\" {
    lb = aws.network.ELB \"LB\"
    cluster \"Workers\" {
        web1 = aws.compute.EC2 \"Web 1\"
        web2 = aws.compute.EC2 \"Web 2\"
    }
}
user >> lb \"HTTPS\"
lb >> web1 & web2
web1 -- web2
";
        let d = parse_descriptor(source).unwrap();
        assert_eq!(d.title, "Web Tier");
        assert_eq!(d.direction, Direction::TopBottom);
        assert_eq!(d.graph_attr.get("pad"), Some("0.5"));
        assert_eq!(d.node_attr.get("fontsize"), Some("14"));
        assert_eq!(d.edge_attr.get("color"), Some("red"));
        assert_eq!(d.outformats, vec![OutFormat::Svg, OutFormat::Dot]);
        assert_eq!(d.output_stem(), "web");
        assert_eq!(d.nodes().len(), 4);
        assert_eq!(d.clusters().len(), 2);
        assert_eq!(d.clusters()[1].parent, Some(d.clusters()[0].id));
        assert_eq!(d.nodes()[2].cluster, Some(d.clusters()[1].id));
        assert_eq!(d.edges().len(), 4);
        assert_eq!(d.edges()[0].label.as_deref(), Some("HTTPS"));
        assert_eq!(d.edges()[1].label, None);
        assert_eq!(d.edges()[3].dir, EdgeDir::None);
    }

    #[test]
    fn node_declared_after_cluster_is_top_level() {
        let source = "diagram \"T\"\ncluster \"C\" {\n a = aws.storage.S3 \"A\"\n}\nb = aws.storage.S3 \"B\"\n";
        let d = parse_descriptor(source).unwrap();
        assert_eq!(d.nodes()[1].cluster, None);
    }

    #[test]
    fn missing_header() {
        let err = parse_descriptor("a = aws.storage.S3 \"A\"\n").unwrap_err();
        assert_eq!(err, DescriptorError::MissingHeader);
        assert_eq!(parse_descriptor("").unwrap_err(), DescriptorError::MissingHeader);
    }

    #[test]
    fn second_header_rejected() {
        let err = parse_descriptor("diagram \"A\"\ndiagram \"B\"\n").unwrap_err();
        assert!(matches!(err, DescriptorError::Syntax { line: 2, .. }), "got {err:?}");
    }

    #[test]
    fn header_inside_cluster_rejected() {
        let source = "diagram \"A\"\ncluster \"C\" {\ndiagram \"B\"\n}\n";
        let err = parse_descriptor(source).unwrap_err();
        assert!(matches!(err, DescriptorError::Syntax { line: 3, .. }), "got {err:?}");
    }

    #[test]
    fn syntax_error_reports_line_and_text() {
        let err = parse_descriptor("diagram \"T\"\n\na => b\n").unwrap_err();
        assert_eq!(
            err,
            DescriptorError::Syntax {
                line: 3,
                context: "a => b".to_string()
            }
        );
    }

    #[test]
    fn long_syntax_context_truncated() {
        let bad = format!("diagram \"T\"\n{}\n", "x".repeat(60));
        match parse_descriptor(&bad).unwrap_err() {
            DescriptorError::Syntax { context, .. } => {
                assert_eq!(context, format!("{}...", "x".repeat(40)))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn edge_to_undeclared_node() {
        let source = "diagram \"T\"\na = aws.storage.S3 \"A\"\na >> ghost\n";
        assert_eq!(
            parse_descriptor(source).unwrap_err(),
            DescriptorError::UnknownNode {
                name: "ghost".to_string(),
                line: 3
            }
        );
    }

    #[test]
    fn edge_before_declaration_rejected() {
        let source = "diagram \"T\"\na >> b\na = aws.storage.S3 \"A\"\nb = aws.storage.S3 \"B\"\n";
        assert!(matches!(
            parse_descriptor(source).unwrap_err(),
            DescriptorError::UnknownNode { line: 2, .. }
        ));
    }

    #[test]
    fn duplicate_node_name() {
        let source = "diagram \"T\"\na = aws.storage.S3 \"A\"\na = aws.storage.S3 \"B\"\n";
        assert_eq!(
            parse_descriptor(source).unwrap_err(),
            DescriptorError::DuplicateNode {
                name: "a".to_string(),
                line: 3
            }
        );
    }

    #[test]
    fn unknown_kind() {
        let source = "diagram \"T\"\na = aws.storage.Tape \"A\"\n";
        assert_eq!(
            parse_descriptor(source).unwrap_err(),
            DescriptorError::UnknownKind {
                path: "aws.storage.Tape".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn unknown_direction_and_format() {
        let err = parse_descriptor("diagram \"T\"\ndirection TD\n").unwrap_err();
        assert_eq!(
            err,
            DescriptorError::UnknownDirection {
                value: "TD".to_string(),
                line: 2
            }
        );
        let err = parse_descriptor("diagram \"T\"\noutformat png gif\n").unwrap_err();
        assert_eq!(
            err,
            DescriptorError::UnknownFormat {
                value: "gif".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn unclosed_cluster() {
        let source = "diagram \"T\"\ncluster \"Open\" {\na = aws.storage.S3 \"A\"\n";
        assert_eq!(
            parse_descriptor(source).unwrap_err(),
            DescriptorError::UnclosedCluster { line: 2 }
        );
    }

    #[test]
    fn stray_closing_brace() {
        let err = parse_descriptor("diagram \"T\"\n}\n").unwrap_err();
        assert_eq!(
            err,
            DescriptorError::Syntax {
                line: 2,
                context: "}".to_string()
            }
        );
    }

    #[test]
    fn crlf_line_endings() {
        let source = "diagram \"T\"\r\na = aws.storage.S3 \"A\"\r\nb = aws.storage.S3 \"B\"\r\na >> b\r\n";
        let d = parse_descriptor(source).unwrap();
        assert_eq!(d.edges().len(), 1);
    }

    #[test]
    fn last_line_without_newline() {
        let d = parse_descriptor("diagram \"T\"\na = aws.storage.S3 \"A\"").unwrap();
        assert_eq!(d.nodes().len(), 1);
    }
}
