use std::collections::BTreeSet;
use std::fmt::Write;

use crate::template::{Document, Node, VarName};

/// Describe how to call an action, e.g. `Usage: foo $0 $1 [--name <value>]`.
///
/// Positional arguments are listed in index order; named arguments in the
/// order they first appear in the template.
#[must_use]
pub fn usage(doc: &Document, action: &str) -> String {
    let mut positional = BTreeSet::new();
    let mut named = Vec::new();
    collect(doc.nodes(), &mut positional, &mut named);

    let mut out = format!("Usage: {action}");
    for index in positional {
        let _ = write!(out, " ${index}");
    }
    for name in named {
        let _ = write!(out, " [--{name} <value>]");
    }
    out
}

fn collect<'a>(nodes: &'a [Node], positional: &mut BTreeSet<usize>, named: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Literal(_) => {}
            Node::Var(name) => visit(name, positional, named),
            Node::Conditional {
                name,
                then,
                otherwise,
            } => {
                visit(name, positional, named);
                collect(then, positional, named);
                if let Some(otherwise) = otherwise {
                    collect(otherwise, positional, named);
                }
            }
        }
    }
}

fn visit<'a>(name: &'a VarName, positional: &mut BTreeSet<usize>, named: &mut Vec<&'a str>) {
    match name {
        VarName::Positional(index) => {
            positional.insert(*index);
        }
        VarName::Named(name) => {
            if !named.contains(&name.as_str()) {
                named.push(name.as_str());
            }
        }
    }
}
