//! Group update rules shared by the REST layer and the repository.

use validator::{Validate, ValidationErrors};

/// Maximum length of a group name (matches `groups.name VARCHAR(500)`).
pub const MAX_GROUP_NAME_LENGTH: u64 = 500;

/// Maximum length of a group description (matches `groups.description VARCHAR(200)`).
pub const MAX_GROUP_DESCRIPTION_LENGTH: u64 = 200;

/// The full replacement state of a group after a merge-patch has been resolved
/// against the stored row.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct GroupUpdate {
    #[validate(length(min = 1, max = MAX_GROUP_NAME_LENGTH))]
    pub name: String,
    #[validate(length(max = MAX_GROUP_DESCRIPTION_LENGTH))]
    pub description: Option<String>,
}

impl GroupUpdate {
    /// Resolve a merge-patch against the current values.
    ///
    /// `None` leaves a field unchanged, `Some(None)` clears it, `Some(Some(v))`
    /// replaces it. The name cannot be cleared.
    pub fn resolve(
        current_name: &str,
        current_description: Option<&str>,
        name: Option<Option<String>>,
        description: Option<Option<String>>,
    ) -> Result<Self, crate::error::CoreError> {
        let name = match name {
            None => current_name.to_string(),
            Some(Some(name)) => name,
            Some(None) => {
                return Err(crate::error::CoreError::Validation(
                    "name must not be null".into(),
                ))
            }
        };
        let description = match description {
            None => current_description.map(str::to_string),
            Some(value) => value,
        };

        let update = GroupUpdate { name, description };
        update.validate()?;
        Ok(update)
    }
}

/// Flatten validator output into a single human-readable message.
pub(crate) fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
            format!("{field}: {}", codes.join(", "))
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
