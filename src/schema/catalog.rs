//! Built-in schema catalog.
//!
//! The compiled schema set shared by the demo API routes and the CLI.
//! Constructed once at process start and handed to whatever needs it,
//! never reached through ambient globals.

use std::sync::Arc;

use serde_json::json;

use super::{FieldSpec, Rule, Schema};
use crate::error::Result;

/// Username charset: alphanumeric, underscore, hyphen
const USERNAME_PATTERN: &str = r"^[a-zA-Z0-9_-]+$";

/// Compiled-once schemas for the built-in API surface.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    /// `POST /api/items` request body
    pub item_create: Arc<Schema>,
    /// `POST /api/users` registration body
    pub user_registration: Arc<Schema>,
    /// `GET /api/items` pagination query
    pub pagination: Arc<Schema>,
    /// `/api/items/:id` path params
    pub item_id: Arc<Schema>,
}

impl SchemaCatalog {
    /// Build every schema. Pure; call once at startup and share the result.
    pub fn build() -> Result<Self> {
        let item_create = Schema::builder()
            .field(
                "title",
                FieldSpec::string().required().min_len(1).max_len(200),
            )
            .field("description", FieldSpec::string().max_len(2000))
            .field(
                "quantity",
                FieldSpec::integer().min(0.0).default_value(json!(1)),
            )
            .field("tags", FieldSpec::array(FieldSpec::string().max_len(40)).max_items(16))
            .build()?;

        let user_registration = Schema::builder()
            .field(
                "username",
                FieldSpec::string()
                    .required()
                    .min_len(3)
                    .max_len(32)
                    .pattern(USERNAME_PATTERN),
            )
            .field("email", FieldSpec::string().required().email())
            .field(
                "password",
                FieldSpec::string().required().min_len(8).max_len(128),
            )
            .field("confirmPassword", FieldSpec::string().required())
            .rule(Rule::fields_equal("password", "confirmPassword"))
            .build()?;

        let pagination = Schema::builder()
            .field(
                "page",
                FieldSpec::integer().coerce().min(1.0).default_value(json!(1)),
            )
            .field(
                "limit",
                FieldSpec::integer()
                    .coerce()
                    .min(1.0)
                    .max(100.0)
                    .default_value(json!(20)),
            )
            .build()?;

        let item_id = Schema::builder()
            .field("id", FieldSpec::integer().required().coerce().min(1.0))
            .build()?;

        Ok(Self {
            item_create: Arc::new(item_create),
            user_registration: Arc::new(user_registration),
            pagination: Arc::new(pagination),
            item_id: Arc::new(item_id),
        })
    }

    /// Look up a schema by name (CLI `validate` subcommand)
    pub fn by_name(&self, name: &str) -> Option<Arc<Schema>> {
        match name {
            "item-create" => Some(self.item_create.clone()),
            "user-registration" => Some(self.user_registration.clone()),
            "pagination" => Some(self.pagination.clone()),
            "item-id" => Some(self.item_id.clone()),
            _ => None,
        }
    }

    /// Names accepted by [`SchemaCatalog::by_name`]
    pub fn names() -> &'static [&'static str] {
        &["item-create", "user-registration", "pagination", "item-id"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_builds() {
        let catalog = SchemaCatalog::build().unwrap();
        assert_eq!(catalog.user_registration.len(), 4);
        assert_eq!(catalog.pagination.len(), 2);
    }

    #[test]
    fn test_by_name() {
        let catalog = SchemaCatalog::build().unwrap();
        for name in SchemaCatalog::names() {
            assert!(catalog.by_name(name).is_some(), "missing schema {name}");
        }
        assert!(catalog.by_name("nope").is_none());
    }
}
