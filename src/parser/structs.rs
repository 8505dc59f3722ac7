//! Go struct declarations and their JSON field names.

use serde::Serialize;
use tree_sitter::Node;

use super::helpers::{field_children, named_children, node_text};

/// Reference to a named Go type, as used by a local variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRef {
    /// Unqualified type name (`User` for `models.User`)
    pub name: String,
    pub is_slice: bool,
}

/// JSON-relevant kind of a struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldType {
    String,
    Number,
    Bool,
    List(Box<FieldType>),
    Map,
    Struct(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    /// Key under which `encoding/json` emits the field.
    pub json_name: String,
    pub ty: FieldType,
}

/// A struct type declaration with its JSON-visible fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    /// Embedded struct names; their fields are promoted.
    pub embedded: Vec<String>,
}

/// Collect every struct type declared anywhere in the file.
pub fn collect_structs(root: &Node, source: &[u8]) -> Vec<StructDef> {
    let mut specs = Vec::new();
    find_kind(root, "type_spec", &mut specs);

    specs
        .iter()
        .filter_map(|spec| {
            let name = node_text(&spec.child_by_field_name("name")?, source);
            let ty = spec.child_by_field_name("type")?;
            if ty.kind() != "struct_type" {
                return None;
            }
            Some(struct_def(name, &ty, source))
        })
        .collect()
}

fn struct_def(name: String, struct_type: &Node, source: &[u8]) -> StructDef {
    let mut def = StructDef {
        name,
        fields: Vec::new(),
        embedded: Vec::new(),
    };
    let Some(list) = named_children(struct_type)
        .into_iter()
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return def;
    };

    for decl in named_children(&list) {
        if decl.kind() != "field_declaration" {
            continue;
        }
        let Some(ty_node) = decl.child_by_field_name("type") else {
            continue;
        };
        let tag = decl
            .child_by_field_name("tag")
            .map(|t| node_text(&t, source));
        let names = field_children(&decl, "name");

        if names.is_empty() {
            let embedded = type_ref_of(&ty_node, source).map(|t| t.name);
            match (json_tag(tag.as_deref()), embedded) {
                // tagged embedded struct is an ordinary named field
                (Some(JsonTag::Named(key)), _) => def.fields.push(FieldDef {
                    json_name: key,
                    ty: field_type(&ty_node, source),
                }),
                (Some(JsonTag::Skip), _) | (_, None) => {}
                (_, Some(name)) => def.embedded.push(name),
            }
            continue;
        }

        for name_node in names {
            let go_name = node_text(&name_node, source);
            if !go_name.starts_with(|c: char| c.is_ascii_uppercase()) {
                continue;
            }
            let json_name = match json_tag(tag.as_deref()) {
                Some(JsonTag::Skip) => continue,
                Some(JsonTag::Named(key)) => key,
                Some(JsonTag::Default) | None => go_name,
            };
            def.fields.push(FieldDef {
                json_name,
                ty: field_type(&ty_node, source),
            });
        }
    }
    def
}

enum JsonTag {
    Named(String),
    /// `json:",omitempty"`
    Default,
    /// `json:"-"`
    Skip,
}

fn json_tag(tag: Option<&str>) -> Option<JsonTag> {
    let tag = tag?;
    let start = tag.find("json:\"")? + "json:\"".len();
    let rest = &tag[start..];
    let value = &rest[..rest.find('"')?];
    let key = value.split(',').next().unwrap_or("");
    Some(match key {
        "-" => JsonTag::Skip,
        "" => JsonTag::Default,
        k => JsonTag::Named(k.to_string()),
    })
}

/// JSON kind of a Go type expression.
pub fn field_type(node: &Node, source: &[u8]) -> FieldType {
    match node.kind() {
        "type_identifier" => match node_text(node, source).as_str() {
            "string" => FieldType::String,
            "bool" => FieldType::Bool,
            "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
            | "uint32" | "uint64" | "float32" | "float64" | "byte" | "rune" | "uintptr" => {
                FieldType::Number
            }
            "any" | "error" => FieldType::Unknown,
            other => FieldType::Struct(other.to_string()),
        },
        "qualified_type" => {
            let text = node_text(node, source);
            match text.as_str() {
                "time.Time" | "uuid.UUID" | "json.Number" => FieldType::String,
                "json.RawMessage" => FieldType::Unknown,
                _ => FieldType::Struct(unqualified(&text).to_string()),
            }
        }
        "pointer_type" => named_children(node)
            .first()
            .map(|inner| field_type(inner, source))
            .unwrap_or(FieldType::Unknown),
        "slice_type" | "array_type" => match node.child_by_field_name("element") {
            // []byte marshals as a base64 string
            Some(el) if node_text(&el, source) == "byte" => FieldType::String,
            Some(el) => FieldType::List(Box::new(field_type(&el, source))),
            None => FieldType::List(Box::new(FieldType::Unknown)),
        },
        "map_type" | "struct_type" => FieldType::Map,
        _ => FieldType::Unknown,
    }
}

/// Named type behind a variable's type expression, seeing through pointers
/// and one level of slice.
pub fn type_ref_of(node: &Node, source: &[u8]) -> Option<TypeRef> {
    match node.kind() {
        "type_identifier" | "qualified_type" => Some(TypeRef {
            name: unqualified(&node_text(node, source)).to_string(),
            is_slice: false,
        }),
        "pointer_type" => type_ref_of(named_children(node).first()?, source),
        "slice_type" | "array_type" => {
            let el = type_ref_of(&node.child_by_field_name("element")?, source)?;
            Some(TypeRef {
                is_slice: true,
                ..el
            })
        }
        _ => None,
    }
}

fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Every descendant of `kind`, in source order.
pub fn find_kind<'t>(node: &Node<'t>, kind: &str, out: &mut Vec<Node<'t>>) {
    if node.kind() == kind {
        out.push(*node);
    }
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            find_kind(&child, kind, out);
        }
    }
}
