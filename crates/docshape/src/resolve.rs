//! Type resolution.
//!
//! Maps a non-object node to its [`FieldType`]. Arrays and alternatives
//! collapse the kinds of their members:
//!
//! | members                         | array                     | alternatives         |
//! |---------------------------------|---------------------------|----------------------|
//! | none                            | `[]`                      | `Mixed`              |
//! | several kinds                   | `[Mixed]`                 | `Mixed`              |
//! | several of one kind             | `[<kind>]`                | `<kind>`             |
//! | exactly one                     | `[<converted member>]`    | type of the member   |

use std::collections::BTreeMap;

use docshape_schema::{Kind, Schema};
use tracing::trace;

use crate::config::ConvertOptions;
use crate::convert::Converter;
use crate::error::{ConvertError, ConvertResult};
use crate::meta;
use crate::model::{Element, FieldType};

fn tally<'a>(schemas: impl IntoIterator<Item = &'a Schema>) -> BTreeMap<Kind, usize> {
    let mut kinds = BTreeMap::new();
    for schema in schemas {
        *kinds.entry(schema.kind()).or_insert(0) += 1;
    }
    kinds
}

/// The only kind present, with its count.
fn sole_kind(kinds: &BTreeMap<Kind, usize>) -> Option<(Kind, usize)> {
    match kinds.len() {
        1 => kinds.iter().next().map(|(kind, count)| (*kind, *count)),
        _ => None,
    }
}

impl Converter {
    /// Resolve the field type of a node.
    ///
    /// Object nodes resolve to the generic [`FieldType::Object`]; their
    /// fields are only converted by [`convert`](Converter::convert).
    pub fn resolve_type(
        &self,
        schema: &Schema,
        options: &ConvertOptions,
    ) -> ConvertResult<FieldType> {
        match schema.kind() {
            Kind::String => Ok(FieldType::String),
            Kind::Number => Ok(FieldType::Number),
            Kind::Date => Ok(FieldType::Date),
            Kind::Boolean => Ok(FieldType::Boolean),
            Kind::Object => Ok(FieldType::Object),
            Kind::Any => Ok(FieldType::Mixed),
            Kind::Array => self.resolve_array(schema, options),
            Kind::Alternatives => self.resolve_alternatives(schema, options),
            kind @ Kind::Binary => Err(ConvertError::unsupported(kind)),
        }
    }

    /// Type of a bare node of one kind.
    fn resolve_kind(&self, kind: Kind, options: &ConvertOptions) -> ConvertResult<FieldType> {
        self.resolve_type(&Schema::bare(kind), options)
    }

    fn resolve_array(&self, schema: &Schema, options: &ConvertOptions) -> ConvertResult<FieldType> {
        let items = schema.items();
        let kinds = tally(items);

        if kinds.len() > 1 {
            trace!(kinds = kinds.len(), "Heterogeneous array items, using Mixed");
            return Ok(FieldType::array_of(Element::Type(FieldType::Mixed)));
        }
        if let Some((kind, count)) = sole_kind(&kinds)
            && count > 1
        {
            trace!(%kind, count, "Array items share a kind");
            let element = self.resolve_kind(kind, options)?;
            return Ok(FieldType::array_of(Element::Type(element)));
        }

        let [item] = items else {
            return Ok(FieldType::Array(None));
        };

        let element = if self.resolve_type(item, options)?.is_object() {
            let schema_options = meta::schema_options(schema, self.config().subdocument.as_ref());
            trace!(options = schema_options.len(), "Building sub-schema for array item");
            let definition = self.convert_schema(item, options)?;
            Element::Schema(self.model().sub_schema(definition, schema_options))
        } else {
            Element::Field(self.convert_schema(item, options)?)
        };
        Ok(FieldType::array_of(element))
    }

    fn resolve_alternatives(
        &self,
        schema: &Schema,
        options: &ConvertOptions,
    ) -> ConvertResult<FieldType> {
        let candidates = schema.matches();
        let kinds = tally(candidates);

        match (sole_kind(&kinds), candidates) {
            (_, []) => Ok(FieldType::Mixed),
            (None, _) => {
                trace!(kinds = kinds.len(), "Alternatives span kinds, using Mixed");
                Ok(FieldType::Mixed)
            }
            (Some((_, 1)), [candidate]) => self.resolve_type(candidate, options),
            (Some((kind, _)), _) => self.resolve_kind(kind, options),
        }
    }
}
