// Resource controllers, one module per resource.
//
// Every handler takes the shared state plus whatever the router extracted
// (path parameter, raw body) and returns an `ApiResult`.

pub mod employee;
pub mod payload;
pub mod project;

use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::database::models::FieldError;
use crate::error::ApiError;
use crate::types::Patch;

/// Parse a buffered request body.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::validation(format!("Invalid JSON body: {}", e)))
}

/// Path ids must be well-formed before any store call is made.
pub fn parse_path_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::validation("Invalid id"))
}

/// Required text fields can be changed but never cleared.
fn required(field: Patch<String>, name: &'static str) -> Result<Option<String>, FieldError> {
    match field {
        Patch::Unset => Ok(None),
        Patch::Null => Err(FieldError::Required(name)),
        Patch::Set(value) => Ok(Some(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn rejects_malformed_ids() {
        assert!(parse_path_id("abc123").is_err());
        assert!(parse_path_id(&Uuid::new_v4().to_string()).is_ok());
    }

    #[test]
    fn required_fields_cannot_be_nulled() {
        assert_eq!(required(Patch::Unset, "Name").unwrap(), None);
        assert_eq!(
            required(Patch::Set("Ann".into()), "Name").unwrap(),
            Some("Ann".to_string())
        );
        assert_eq!(
            required(Patch::Null, "Name").unwrap_err().to_string(),
            "Name is required"
        );
    }

    #[test]
    fn empty_body_is_invalid_json() {
        let err = parse_body::<Value>(b"").unwrap_err();
        assert!(err.message().starts_with("Invalid JSON body"));
    }
}
