//! Category resource.

use serde_json::{Map, Value};

use crate::attrs::AttributeStore;
use crate::constants::CATEGORIES_PATH;
use crate::error::ApiError;
use crate::resource::{create_resource, expect_object, require_fields, Resource};
use crate::transport::Session;
use crate::user::User;

/// A task category. The single category with `isDefault` true, if any, is
/// the user's default category.
#[derive(Debug, Clone)]
pub struct Category {
    store: AttributeStore,
    session: Session,
}

impl Resource for Category {
    const TYPE_NAME: &'static str = "Category";
    const ENDPOINT: &'static str = CATEGORIES_PATH;
    const ALLOWED_FIELDS: &'static [&'static str] = &["id", "name", "isDefault", "isDeleted"];
    const REQUIRED_FIELDS: &'static [&'static str] = &["name"];

    fn store(&self) -> &AttributeStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut AttributeStore {
        &mut self.store
    }

    fn session(&self) -> &Session {
        &self.session
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
    }
}

impl Category {
    /// Wrap a server document. Fails if `name` is absent.
    pub fn from_data(session: Session, data: Value) -> Result<Category, ApiError> {
        let doc = expect_object(data)?;
        require_fields(Self::TYPE_NAME, Self::REQUIRED_FIELDS, &doc)?;
        Ok(Category {
            store: AttributeStore::from_server(Self::TYPE_NAME, Self::ALLOWED_FIELDS, doc),
            session,
        })
    }

    /// Create a category on the server and append it to the user's cached
    /// category list.
    pub fn create(user: &mut User, attrs: Map<String, Value>) -> Result<Category, ApiError> {
        let store = create_resource(
            user.session(),
            Self::TYPE_NAME,
            Self::ENDPOINT,
            Self::ALLOWED_FIELDS,
            Self::REQUIRED_FIELDS,
            attrs,
        )?;
        let category = Category {
            store,
            session: user.session().clone(),
        };
        user.add_category(category.clone());
        Ok(category)
    }

    pub fn name(&self) -> Option<&str> {
        self.store.try_get("name").and_then(Value::as_str)
    }

    pub fn is_default(&self) -> bool {
        self.store
            .try_get("isDefault")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn is_deleted(&self) -> bool {
        self.store
            .try_get("isDeleted")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
