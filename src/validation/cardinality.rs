use super::{CheckResult, local_error};
use crate::error::ViolationKind;
use crate::schema::TypeSchema;

/// Fail on the first required field, in schema order, for which `is_set`
/// returns false. An empty list counts as unset.
pub fn check_required(schema: &TypeSchema, is_set: impl Fn(usize) -> bool) -> CheckResult {
    for (index, field) in schema.fields.iter().enumerate() {
        if field.required && !is_set(index) {
            return Err(local_error(
                &schema.name,
                ViolationKind::RequiredFieldMissing {
                    field: field.name.clone(),
                },
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;
    use crate::types::{NodeKind, PrimitiveType};

    #[test]
    fn test_first_missing_in_schema_order() {
        let schema = TypeSchema::new("Task", NodeKind::Resource)
            .with_field(FieldDescriptor::scalar("status", PrimitiveType::Code).required())
            .with_field(FieldDescriptor::scalar("note", PrimitiveType::String))
            .with_field(FieldDescriptor::scalar("intent", PrimitiveType::Code).required());

        let err = check_required(&schema, |_| false).unwrap_err();
        assert_eq!(err.path, "Task.status");

        let err = check_required(&schema, |index| index == 0).unwrap_err();
        assert_eq!(err.field(), Some("intent"));

        assert!(check_required(&schema, |index| index != 1).is_ok());
    }
}
