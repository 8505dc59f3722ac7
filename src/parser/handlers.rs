//! Handler functions: their doc comments and the types they decode and encode.
//!
//! Registrations usually name a handler declared elsewhere
//! (`r.GET("/users", h.ListUsers)`). The [`HandlerIndex`] joins those names
//! with the functions collected from every scanned file.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;
use tree_sitter::Node;

use super::comments::CommentIndex;
use super::extractor::FileExtraction;
use super::helpers::{field_children, line_of, named_children, node_text};
use super::structs::{find_kind, type_ref_of, StructDef, TypeRef};
use crate::routes::{RawDeclaration, SourcePosition};

/// Calls that fill their pointer argument from the request body.
const DECODE_MEMBERS: &[&str] = &[
    "Decode",
    "ShouldBindJSON",
    "ShouldBind",
    "BindJSON",
    "Bind",
    "BodyParser",
];

/// Calls that write their last argument as the JSON response body.
const ENCODE_MEMBERS: &[&str] = &["Encode", "JSON", "IndentedJSON", "PureJSON"];

/// A top-level function or method that may serve as a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerInfo {
    pub name: String,
    pub doc: Option<String>,
    /// Types decoded from the request body, in call order.
    pub requests: Vec<TypeRef>,
    /// Types written as the response body, in call order.
    pub responses: Vec<TypeRef>,
    pub position: SourcePosition,
}

/// Collect every function and method declared at file level.
pub fn collect_handlers(
    root: &Node,
    source: &[u8],
    comments: &CommentIndex,
    file: &std::path::Path,
) -> Vec<HandlerInfo> {
    named_children(root)
        .into_iter()
        .filter(|n| n.kind() == "function_declaration" || n.kind() == "method_declaration")
        .filter_map(|func| {
            let name = node_text(&func.child_by_field_name("name")?, source);
            let body = func.child_by_field_name("body");
            let doc = comments.preceding(func.start_position().row).or_else(|| {
                let body = body?;
                comments.first_within(body.start_position().row, body.end_position().row)
            });
            let (requests, responses) = body
                .map(|b| body_types(&b, source))
                .unwrap_or_default();

            Some(HandlerInfo {
                name,
                doc,
                requests,
                responses,
                position: SourcePosition::new(file, line_of(&func)),
            })
        })
        .collect()
}

/// Decoded and encoded types of a function body. `gin.H` and map
/// literals are kept too; callers pick the first type they know.
fn body_types(body: &Node, source: &[u8]) -> (Vec<TypeRef>, Vec<TypeRef>) {
    let locals = local_types(body, source);

    let mut calls = Vec::new();
    find_kind(body, "call_expression", &mut calls);

    let mut requests = Vec::new();
    let mut responses = Vec::new();
    for call in calls {
        let Some(member) = call
            .child_by_field_name("function")
            .filter(|f| f.kind() == "selector_expression")
            .and_then(|f| f.child_by_field_name("field"))
            .map(|f| node_text(&f, source))
        else {
            continue;
        };
        let args = call
            .child_by_field_name("arguments")
            .map(|a| named_children(&a))
            .unwrap_or_default();

        let (found, slot) = if DECODE_MEMBERS.contains(&member.as_str()) {
            (args.first(), &mut requests)
        } else if ENCODE_MEMBERS.contains(&member.as_str()) {
            (args.last(), &mut responses)
        } else {
            continue;
        };
        if let Some(ty) = found.and_then(|a| arg_type(a, source, &locals)) {
            if !slot.contains(&ty) {
                slot.push(ty);
            }
        }
    }
    (requests, responses)
}

/// Declared types of the body's local variables, by name. Later
/// declarations of the same name overwrite earlier ones.
fn local_types(body: &Node, source: &[u8]) -> HashMap<String, TypeRef> {
    let mut locals = HashMap::new();

    let mut specs = Vec::new();
    find_kind(body, "var_spec", &mut specs);
    for spec in specs {
        let declared = spec
            .child_by_field_name("type")
            .and_then(|t| type_ref_of(&t, source));
        let values = spec
            .child_by_field_name("value")
            .map(|v| named_children(&v))
            .unwrap_or_default();
        for (i, name) in field_children(&spec, "name").iter().enumerate() {
            let ty = declared
                .clone()
                .or_else(|| values.get(i).and_then(|v| literal_type(v, source)));
            if let Some(ty) = ty {
                locals.insert(node_text(name, source), ty);
            }
        }
    }

    let mut shorts = Vec::new();
    find_kind(body, "short_var_declaration", &mut shorts);
    for decl in shorts {
        let (Some(left), Some(right)) = (
            decl.child_by_field_name("left"),
            decl.child_by_field_name("right"),
        ) else {
            continue;
        };
        let values = named_children(&right);
        for (i, name) in named_children(&left).iter().enumerate() {
            if let Some(ty) = values.get(i).and_then(|v| literal_type(v, source)) {
                locals.insert(node_text(name, source), ty);
            }
        }
    }
    locals
}

/// Type of `T{...}`, `&T{...}`, `[]T{}` and `new(T)`.
fn literal_type(value: &Node, source: &[u8]) -> Option<TypeRef> {
    match value.kind() {
        "composite_literal" => type_ref_of(&value.child_by_field_name("type")?, source),
        "unary_expression" => literal_type(&value.child_by_field_name("operand")?, source),
        "call_expression" => {
            let func = value.child_by_field_name("function")?;
            if node_text(&func, source) != "new" {
                return None;
            }
            let args = named_children(&value.child_by_field_name("arguments")?);
            type_ref_of(args.first()?, source)
        }
        _ => None,
    }
}

fn arg_type(arg: &Node, source: &[u8], locals: &HashMap<String, TypeRef>) -> Option<TypeRef> {
    match arg.kind() {
        "identifier" => locals.get(&node_text(arg, source)).cloned(),
        "unary_expression" => arg_type(&arg.child_by_field_name("operand")?, source, locals),
        _ => literal_type(arg, source),
    }
}

/// Key under which a handler expression is looked up: the last identifier
/// of `h.ListUsers` or `listUsers`. Anything else has no key.
pub fn handler_key(expr: &str) -> Option<&str> {
    let last = expr.trim().rsplit('.').next()?;
    let valid = !last.is_empty()
        && last.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !last.starts_with(|c: char| c.is_ascii_digit());
    valid.then_some(last)
}

/// Handlers and struct types from every scanned file.
#[derive(Debug, Default)]
pub struct HandlerIndex {
    handlers: HashMap<String, HandlerInfo>,
    structs: HashMap<String, StructDef>,
}

impl HandlerIndex {
    /// Index extractions in order; the first definition of a name wins.
    pub fn build(extractions: &[FileExtraction]) -> Self {
        let mut index = Self::default();
        for extraction in extractions {
            for handler in &extraction.handlers {
                index
                    .handlers
                    .entry(handler.name.clone())
                    .or_insert_with(|| handler.clone());
            }
            for def in &extraction.structs {
                index
                    .structs
                    .entry(def.name.clone())
                    .or_insert_with(|| def.clone());
            }
        }
        debug!(
            handlers = index.handlers.len(),
            structs = index.structs.len(),
            "handler index built"
        );
        index
    }

    pub fn handler(&self, expr: &str) -> Option<&HandlerInfo> {
        self.handlers.get(handler_key(expr)?)
    }

    pub fn structure(&self, name: &str) -> Option<&StructDef> {
        let key = name.rsplit('.').next().unwrap_or(name);
        self.structs.get(key)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Give declarations without an adjacent comment the doc comment of the
    /// handler they name. Returns how many were filled.
    pub fn fill_descriptions(&self, declarations: &mut [RawDeclaration]) -> usize {
        let mut filled = 0;
        for decl in declarations.iter_mut() {
            if decl.comment_text().is_some() {
                continue;
            }
            if let Some(doc) = self.handler(&decl.handler).and_then(|h| h.doc.clone()) {
                decl.comment = Some(doc);
                filled += 1;
            }
        }
        filled
    }
}
