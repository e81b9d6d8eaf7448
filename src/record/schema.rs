use std::collections::HashMap;

use super::FieldType;

/// Type and declared length of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub field_type: FieldType,
    /// Maximum number of bytes for a varchar; 0 for integers
    pub length: usize,
}

/// The ordered fields of a table or of a scan's output.
///
/// Field names are unique; adding a name that is already present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Field names in declaration order
    fields: Vec<String>,
    info: HashMap<String, FieldInfo>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, name: impl Into<String>, field_type: FieldType, length: usize) {
        let name = name.into();
        if self.info.contains_key(&name) {
            return;
        }
        self.info.insert(name.clone(), FieldInfo { field_type, length });
        self.fields.push(name);
    }

    pub fn add_int_field(&mut self, name: impl Into<String>) {
        self.add_field(name, FieldType::Integer, 0);
    }

    pub fn add_string_field(&mut self, name: impl Into<String>, length: usize) {
        self.add_field(name, FieldType::Varchar, length);
    }

    /// Copies the definition of `name` from `other`, if it has one.
    pub fn add(&mut self, name: &str, other: &Schema) {
        if let Some(info) = other.info(name) {
            self.add_field(name, info.field_type, info.length);
        }
    }

    pub fn add_all(&mut self, other: &Schema) {
        for name in other.fields() {
            self.add(name, other);
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.info.contains_key(name)
    }

    pub fn info(&self, name: &str) -> Option<FieldInfo> {
        self.info.get(name).copied()
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.info(name).map(|i| i.field_type)
    }

    pub fn length(&self, name: &str) -> Option<usize> {
        self.info(name).map(|i| i.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_keep_declaration_order() {
        let mut schema = Schema::new();
        schema.add_int_field("a");
        schema.add_string_field("b", 9);
        schema.add_int_field("a");
        assert_eq!(schema.fields(), &["a".to_string(), "b".to_string()]);
        assert_eq!(schema.field_type("b"), Some(FieldType::Varchar));
        assert_eq!(schema.length("b"), Some(9));
        assert!(!schema.has_field("c"));
    }

    #[test]
    fn test_add_all_copies_definitions() {
        let mut left = Schema::new();
        left.add_int_field("a");
        let mut right = Schema::new();
        right.add_string_field("d", 4);
        right.add_int_field("c");

        let mut joined = Schema::new();
        joined.add_all(&left);
        joined.add_all(&right);
        assert_eq!(joined.fields().len(), 3);
        assert_eq!(joined.info("d"), right.info("d"));
    }
}
