//! Small tree-sitter helpers shared by the Go extractors.

use tree_sitter::Node;

use crate::routes::{CallArg, HttpMethod};

/// Longest source excerpt kept for a non-trivial argument.
const MAX_ARG_TEXT: usize = 60;

/// Packages that export `MethodGet`-style verb constants.
const METHOD_CONSTANT_PACKAGES: &[&str] = &["http", "fiber"];

/// Get the full text of a node.
pub fn node_text(node: &Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

/// 1-based line of the node's first character.
pub fn line_of(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Named children, skipping comments (which tree-sitter places anywhere).
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            if child.kind() != "comment" {
                out.push(child);
            }
        }
    }
    out
}

/// Children attached under a repeated field (`name` in `var a, b = ...`).
pub fn field_children<'t>(node: &Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children_by_field_name(field, &mut cursor).collect();
    children
}

/// Remove the quotes of a Go string literal: `"..."` or `` `...` ``.
pub fn strip_quotes(s: &str) -> String {
    let s = s.trim();
    if s.len() < 2 {
        return s.to_string();
    }

    if (s.starts_with('"') && s.ends_with('"')) || (s.starts_with('`') && s.ends_with('`')) {
        s[1..s.len() - 1].replace("\\\"", "\"")
    } else {
        s.to_string()
    }
}

/// Value of a string-valued expression: a literal, or a `+` concatenation of
/// literals.
pub fn string_value(node: &Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "interpreted_string_literal" | "raw_string_literal" => {
            Some(strip_quotes(&node_text(node, source)))
        }
        "parenthesized_expression" => string_value(named_children(node).first()?, source),
        "binary_expression" => {
            let op = node.child_by_field_name("operator")?;
            if op.kind() != "+" {
                return None;
            }
            let left = string_value(&node.child_by_field_name("left")?, source)?;
            let right = string_value(&node.child_by_field_name("right")?, source)?;
            Some(left + &right)
        }
        _ => None,
    }
}

/// Parameter names of a function, method or func literal, in order.
pub fn param_names(node: &Node, source: &[u8]) -> Vec<String> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    named_children(&params)
        .iter()
        .filter(|p| p.kind() == "parameter_declaration" || p.kind() == "variadic_parameter_declaration")
        .flat_map(|p| field_children(p, "name"))
        .map(|n| node_text(&n, source))
        .collect()
}

/// Convert one call argument into the shape the matchers understand.
pub fn call_arg(node: &Node, source: &[u8]) -> CallArg {
    if let Some(s) = string_value(node, source) {
        return CallArg::Str(s);
    }
    match node.kind() {
        "selector_expression" => {
            let text = node_text(node, source);
            match method_constant(&text) {
                Some(method) => CallArg::Str(method.as_str().to_string()),
                None => CallArg::Name(text),
            }
        }
        "identifier" => CallArg::Name(node_text(node, source)),
        "func_literal" => CallArg::FuncLit {
            params: param_names(node, source),
        },
        _ => CallArg::Other(excerpt(&node_text(node, source))),
    }
}

/// The verb behind `http.MethodGet`, `fiber.MethodPost` and so on.
pub fn method_constant(text: &str) -> Option<HttpMethod> {
    let (pkg, name) = text.split_once('.')?;
    if !METHOD_CONSTANT_PACKAGES.contains(&pkg) {
        return None;
    }
    HttpMethod::parse(name.strip_prefix("Method")?)
}

/// Single-line, length-capped version of a source fragment.
pub fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_ARG_TEXT {
        return flat;
    }
    let cut: String = flat.chars().take(MAX_ARG_TEXT).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"/api/users\""), "/api/users");
        assert_eq!(strip_quotes("`/raw/{id}`"), "/raw/{id}");
        assert_eq!(strip_quotes("x"), "x");
        assert_eq!(strip_quotes("\"say \\\"hi\\\"\""), "say \"hi\"");
    }

    #[test]
    fn test_method_constant() {
        assert_eq!(method_constant("http.MethodGet"), Some(HttpMethod::Get));
        assert_eq!(method_constant("http.MethodOptions"), Some(HttpMethod::Options));
        assert_eq!(method_constant("fiber.MethodPatch"), Some(HttpMethod::Patch));
        assert_eq!(method_constant("http.StatusOK"), None);
        assert_eq!(method_constant("cfg.MethodGet"), None);
        assert_eq!(method_constant("MethodGet"), None);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("middleware.Chain(\n\t\th,\n\t)"), "middleware.Chain( h, )");
        let long = "x".repeat(100);
        assert!(excerpt(&long).ends_with("..."));
        assert_eq!(excerpt(&long).chars().count(), MAX_ARG_TEXT + 3);
    }
}
