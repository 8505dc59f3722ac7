//! Request and response skeletons inferred from Go struct declarations.

use serde_json::{Map, Value};

use super::DataShapeProvider;
use crate::parser::{FieldType, HandlerIndex, StructDef, TypeRef};
use crate::routes::{DataShape, EndpointRecord};

/// Deepest struct nesting rendered; deeper structs become `{}`.
const MAX_DEPTH: usize = 3;

/// Shapes read from the Go source: the struct types a handler decodes from
/// the request body and encodes into the response.
pub struct InferredShapes<'a> {
    index: &'a HandlerIndex,
}

impl<'a> InferredShapes<'a> {
    pub fn new(index: &'a HandlerIndex) -> Self {
        Self { index }
    }

    /// First type in `candidates` that names a known struct.
    fn first_known<'t>(&self, candidates: &'t [TypeRef]) -> Option<(&'t TypeRef, &StructDef)> {
        candidates
            .iter()
            .find_map(|t| Some((t, self.index.structure(&t.name)?)))
    }

    /// JSON skeleton for a type reference: the struct's fields with
    /// zero-value placeholders, wrapped in an array for slices.
    pub fn skeleton(&self, ty: &TypeRef) -> Option<Value> {
        let def = self.index.structure(&ty.name)?;
        let object = self.struct_value(def, 1);
        Some(if ty.is_slice {
            Value::Array(vec![object])
        } else {
            object
        })
    }

    fn struct_value(&self, def: &StructDef, depth: usize) -> Value {
        let mut map = Map::new();
        self.fill_fields(def, depth, &mut map);
        Value::Object(map)
    }

    fn fill_fields(&self, def: &StructDef, depth: usize, map: &mut Map<String, Value>) {
        for embedded in &def.embedded {
            if let Some(inner) = self.index.structure(embedded) {
                if depth <= MAX_DEPTH && inner.name != def.name {
                    self.fill_fields(inner, depth + 1, map);
                }
            }
        }
        for field in &def.fields {
            map.insert(field.json_name.clone(), self.field_value(&field.ty, depth));
        }
    }

    fn field_value(&self, ty: &FieldType, depth: usize) -> Value {
        match ty {
            FieldType::String => Value::String(String::new()),
            FieldType::Number => Value::from(0),
            FieldType::Bool => Value::Bool(false),
            FieldType::Map => Value::Object(Map::new()),
            FieldType::Unknown => Value::Null,
            FieldType::List(inner) => match inner.as_ref() {
                FieldType::Struct(name) if depth < MAX_DEPTH => match self.index.structure(name) {
                    Some(def) => Value::Array(vec![self.struct_value(def, depth + 1)]),
                    None => Value::Array(Vec::new()),
                },
                _ => Value::Array(Vec::new()),
            },
            FieldType::Struct(name) => match self.index.structure(name) {
                Some(def) if depth < MAX_DEPTH => self.struct_value(def, depth + 1),
                _ => Value::Object(Map::new()),
            },
        }
    }

    fn shape(&self, kind: &str, ty: &TypeRef, def: &StructDef) -> Option<DataShape> {
        let value = self.skeleton(ty)?;
        let description = if ty.is_slice {
            format!("Array of {} objects", def.name)
        } else {
            format!("{} object", def.name)
        };
        let rendered = serde_json::to_string_pretty(&value).ok()?;
        Some(DataShape::new(kind, description, rendered))
    }
}

impl DataShapeProvider for InferredShapes<'_> {
    fn name(&self) -> &'static str {
        "inferred"
    }

    fn shapes_for(&self, endpoint: &EndpointRecord) -> Vec<DataShape> {
        let Some(handler) = self.index.handler(&endpoint.handler) else {
            return Vec::new();
        };

        let mut shapes = Vec::new();
        if let Some((ty, def)) = self.first_known(&handler.requests) {
            shapes.extend(self.shape("Request", ty, def));
        }
        if let Some((ty, def)) = self.first_known(&handler.responses) {
            shapes.extend(self.shape("Response", ty, def));
        }
        shapes
    }
}
