//! Whitespace token matcher that turns argv into a [`ParseResult`].
//!
//! At each level a literal child matching the token wins; otherwise argument
//! children are tried in declaration order. Only `String` and `i64` arguments
//! are understood.

use anyhow::{Result, anyhow, bail};
use cmdguard::{ArgType, ArgValue, CommandTree, NodeId, NodeKind, ParseResult, ParsedArguments};

pub fn resolve(tree: &CommandTree, tokens: &[String]) -> Result<ParseResult> {
    if tokens.is_empty() {
        bail!("no command given");
    }
    let mut node = tree.root();
    let mut arguments = ParsedArguments::new();
    for token in tokens {
        node = step(tree, node, token, &mut arguments)?;
    }
    Ok(ParseResult::new(node, arguments))
}

fn step(
    tree: &CommandTree,
    node: NodeId,
    token: &str,
    arguments: &mut ParsedArguments,
) -> Result<NodeId> {
    let current = tree
        .node(node)
        .ok_or_else(|| anyhow!("node {} missing from tree", node.index()))?;

    let literal = tree.children(node).iter().copied().find(|&child| {
        tree.node(child)
            .is_some_and(|n| n.kind() == NodeKind::Literal && n.name() == token)
    });
    if let Some(child) = literal {
        return Ok(child);
    }

    for &child in tree.children(node) {
        let Some(entry) = tree.node(child) else {
            continue;
        };
        let NodeKind::Argument(ty) = entry.kind() else {
            continue;
        };
        if let Some(value) = parse_value(ty, token) {
            arguments.insert_value(entry.name(), value)?;
            return Ok(child);
        }
    }

    if current.command().is_empty() {
        bail!("unknown command '{}'", token);
    }
    bail!("unexpected '{}' after '{}'", token, current.command())
}

fn parse_value(ty: ArgType, token: &str) -> Option<ArgValue> {
    if ty.is::<i64>() {
        token.parse::<i64>().ok().map(ArgValue::new)
    } else if ty.is::<String>() {
        Some(ArgValue::new(token.to_string()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdguard::CommandTreeBuilder;

    fn tree() -> CommandTree {
        let mut builder = CommandTreeBuilder::new();
        let repeat = builder.literal(builder.root(), "repeat").unwrap();
        let count = builder.argument::<i64>(repeat, "count").unwrap();
        builder.argument::<String>(count, "text").unwrap();
        let group = builder.literal(builder.root(), "group").unwrap();
        let name = builder.argument::<String>(group, "name").unwrap();
        builder.literal(name, "add").unwrap();
        builder.build()
    }

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn typed_arguments_are_stored_by_node_name() {
        let tree = tree();
        let parse = resolve(&tree, &tokens("repeat 3 hi")).unwrap();
        assert_eq!(parse.node, tree.find(&["repeat", "count", "text"]).unwrap());
        assert_eq!(
            parse.arguments.get("count").and_then(|v| v.downcast_ref::<i64>()),
            Some(&3)
        );
        assert_eq!(
            parse
                .arguments
                .get("text")
                .and_then(|v| v.downcast_ref::<String>()),
            Some(&"hi".to_string())
        );
    }

    #[test]
    fn literal_wins_over_argument() {
        let tree = tree();
        let parse = resolve(&tree, &tokens("group add add")).unwrap();
        assert_eq!(parse.node, tree.find(&["group", "name", "add"]).unwrap());
        assert_eq!(
            parse
                .arguments
                .get("name")
                .and_then(|v| v.downcast_ref::<String>()),
            Some(&"add".to_string())
        );
    }

    #[test]
    fn non_numeric_count_is_rejected() {
        let err = resolve(&tree(), &tokens("repeat many hi")).unwrap_err();
        assert_eq!(err.to_string(), "unexpected 'many' after 'repeat'");
    }

    #[test]
    fn unknown_and_empty_commands_are_rejected() {
        let err = resolve(&tree(), &tokens("launch")).unwrap_err();
        assert_eq!(err.to_string(), "unknown command 'launch'");
        assert!(resolve(&tree(), &[]).is_err());
    }
}
