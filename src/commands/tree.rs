use super::Context;
use crate::registry::{Registry, ResolveError};
use anyhow::Result;
use std::collections::HashSet;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node<'a> {
    Component(&'a str),
    Lib(&'a str),
}

impl Node<'_> {
    fn label(&self) -> String {
        match self {
            Node::Component(name) => name.to_string(),
            Node::Lib(name) => format!("lib/{}", name),
        }
    }
}

pub fn run(ctx: &Context, name: &str) -> Result<ExitCode> {
    print!("{}", render(&ctx.registry, name)?);
    Ok(ExitCode::SUCCESS)
}

/// Dependency tree of a component. Nodes already shown are marked `(*)`
/// and not expanded again; names missing from the registry are marked.
pub fn render(registry: &Registry, name: &str) -> Result<String, ResolveError> {
    let entry = registry.find_component(name)?;
    let root = Node::Component(&entry.name);

    let mut out = format!("{}\n", entry.name);
    let mut seen = HashSet::from([root]);
    render_children(registry, root, "", &mut seen, &mut out);
    Ok(out)
}

fn children<'a>(registry: &'a Registry, node: Node<'a>) -> Option<Vec<Node<'a>>> {
    match node {
        Node::Component(name) => registry.component(name).map(|c| {
            c.internal_dependencies
                .iter()
                .map(|l| Node::Lib(l))
                .chain(c.registry_dependencies.iter().map(|d| Node::Component(d)))
                .collect()
        }),
        Node::Lib(name) => registry
            .lib_module(name)
            .map(|m| m.internal_dependencies.iter().map(|l| Node::Lib(l)).collect()),
    }
}

fn render_children<'a>(
    registry: &'a Registry,
    node: Node<'a>,
    prefix: &str,
    seen: &mut HashSet<Node<'a>>,
    out: &mut String,
) {
    let Some(kids) = children(registry, node) else {
        return;
    };
    let count = kids.len();
    for (i, child) in kids.into_iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };
        let exists = children(registry, child).is_some();

        let marker = if !exists {
            " (missing)"
        } else if !seen.insert(child) {
            " (*)"
        } else {
            ""
        };
        out.push_str(&format!("{}{}{}{}\n", prefix, branch, child.label(), marker));

        if marker.is_empty() {
            let extended = format!("{}{}", prefix, if last { "    " } else { "│   " });
            render_children(registry, child, &extended, seen, out);
        }
    }
}
