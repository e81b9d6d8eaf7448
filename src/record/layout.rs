use std::collections::HashMap;

use super::{FieldType, Schema};
use crate::storage::page::{Page, INT_SIZE};

/// Physical layout of a table's records.
///
/// Each slot starts with a 4-byte in-use flag followed by the fields in
/// schema order. Integers take 4 bytes and `varchar(n)` takes `4 + n` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    schema: Schema,
    offsets: HashMap<String, usize>,
    slot_size: usize,
}

impl Layout {
    pub fn new(schema: Schema) -> Self {
        let mut offsets = HashMap::new();
        let mut pos = INT_SIZE;
        for name in schema.fields() {
            offsets.insert(name.clone(), pos);
            pos += Self::length_in_bytes(&schema, name);
        }
        Self {
            schema,
            offsets,
            slot_size: pos,
        }
    }

    /// Rebuilds a layout from values read back from the catalog.
    pub fn with_offsets(schema: Schema, offsets: HashMap<String, usize>, slot_size: usize) -> Self {
        Self {
            schema,
            offsets,
            slot_size,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn offset(&self, field: &str) -> Option<usize> {
        self.offsets.get(field).copied()
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    fn length_in_bytes(schema: &Schema, field: &str) -> usize {
        match schema.info(field) {
            Some(info) if info.field_type == FieldType::Varchar => Page::max_length(info.length),
            _ => INT_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_follow_schema_order() {
        let mut schema = Schema::new();
        schema.add_int_field("a");
        schema.add_string_field("b", 9);
        schema.add_int_field("c");
        let layout = Layout::new(schema);
        assert_eq!(layout.offset("a"), Some(4));
        assert_eq!(layout.offset("b"), Some(8));
        assert_eq!(layout.offset("c"), Some(21));
        assert_eq!(layout.slot_size(), 25);
        assert_eq!(layout.offset("z"), None);
    }
}
