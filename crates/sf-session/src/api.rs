//! Product API boundary
//!
//! The session never performs I/O itself. It calls an injected
//! [`ProductApi`] and maps the outcome onto form errors and a global
//! [`Notification`].
//!
//! Wire shapes:
//! - `GET /products/:id` → `{"data": {..fields, "images": [uri]}}`
//! - `POST /products`, `PUT /products/:id` → multipart [`Payload`]
//! - 400 → `{"errors": [{"field", "message"}]}`, others → `{"message"}`

use crate::auth::AuthContext;
use crate::payload::Payload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sf_form::FieldErrors;
use sf_staging::PersistedImageRef;

/// Backend product identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Wrap an identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A stored product as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    /// Identifier
    pub id: ProductId,
    /// Every non-image attribute, keyed by field name
    pub fields: Map<String, Value>,
    /// Persisted image identifiers, in display order
    pub images: Vec<PersistedImageRef>,
}

impl ProductRecord {
    /// Parse a response body
    ///
    /// Accepts either the `{"data": {...}}` envelope or a bare object. The
    /// id is read from `id` or `_id` (string or number); non-string image
    /// entries are skipped.
    ///
    /// # Errors
    /// `ApiError::Malformed` if the body is not an object or has no id
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let object = body
            .get("data")
            .unwrap_or(body)
            .as_object()
            .ok_or_else(|| ApiError::Malformed("product is not an object".into()))?;

        let id = match object.get("id").or_else(|| object.get("_id")) {
            Some(Value::String(s)) if !s.is_empty() => ProductId::new(s.as_str()),
            Some(Value::Number(n)) => ProductId::new(n.to_string()),
            _ => return Err(ApiError::Malformed("product has no id".into())),
        };

        let images = match object.get("images") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    let uri = item.as_str();
                    if uri.is_none() {
                        tracing::warn!(%item, "skipped non-string image entry");
                    }
                    uri.map(PersistedImageRef::new)
                })
                .collect(),
            _ => Vec::new(),
        };

        let fields = object
            .iter()
            .filter(|(k, _)| k.as_str() != "images")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self { id, fields, images })
    }
}

/// One backend validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFieldError {
    /// Field name
    pub field: String,
    /// Message to show next to it
    pub message: String,
}

/// Errors returned by a [`ProductApi`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// 400 with per-field errors
    #[error("backend rejected {} field(s)", .0.len())]
    Validation(Vec<BackendFieldError>),

    /// 401
    #[error("unauthorized")]
    Unauthorized,

    /// 404
    #[error("product not found")]
    NotFound,

    /// Any other error status
    #[error("server error {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Server {
        /// HTTP status
        status: u16,
        /// `message` from the body, if any
        message: Option<String>,
    },

    /// The request never reached the backend
    #[error("transport error: {0}")]
    Transport(String),

    /// The request timed out
    #[error("request timed out")]
    Timeout,

    /// The response body could not be understood
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Map an error response
    #[must_use]
    pub fn from_response(status: u16, body: &Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        match status {
            400 => {
                let items = body
                    .get("errors")
                    .and_then(Value::as_array)
                    .map(|items| Self::backend_field_errors(items))
                    .unwrap_or_default();
                if items.is_empty() {
                    Self::Server { status, message }
                } else {
                    Self::Validation(items)
                }
            }
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            _ => Self::Server { status, message },
        }
    }

    fn backend_field_errors(items: &[Value]) -> Vec<BackendFieldError> {
        items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(error) => Some(error),
                Err(e) => {
                    tracing::warn!(%item, error = %e, "skipped malformed field error");
                    None
                }
            })
            .collect()
    }

    /// Backend field errors, keyed by field
    #[must_use]
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Validation(items) => Some(
                items
                    .iter()
                    .map(|e| (e.field.as_str(), e.message.as_str()))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Global notification for a failed `operation`
    #[must_use]
    pub fn notification(&self, operation: ApiOperation) -> Notification {
        let server_message = match self {
            Self::Server {
                message: Some(m), ..
            } => Some(m.clone()),
            _ => None,
        };

        match (self, operation) {
            (Self::Validation(_), _) => {
                Notification::error("Validation Error", "Please check the form and try again.")
            }
            (Self::NotFound, ApiOperation::Load) => Notification::error("Error!", "Product not found"),
            (Self::NotFound, _) => Notification::error(
                "Product Not Found",
                "The product you're trying to update doesn't exist.",
            ),
            (Self::Unauthorized, ApiOperation::Load) => {
                Notification::error("Error!", "Unauthorized. Please login again.")
            }
            (Self::Unauthorized, _) => Notification::error("Unauthorized", "Please login again."),
            _ => Notification::error(
                "Error!",
                server_message.unwrap_or_else(|| operation.fallback_message().to_string()),
            ),
        }
    }
}

/// Which API call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiOperation {
    /// Fetching the record for edit
    Load,
    /// Creating a product
    Create,
    /// Updating a product
    Update,
}

impl ApiOperation {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::Load => "Failed to load product data",
            Self::Create => "Failed to create product. Please try again.",
            Self::Update => "Failed to update product. Please try again.",
        }
    }
}

/// Severity of a global notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Operation succeeded
    Success,
    /// Nothing happened, for a benign reason
    Info,
    /// Needs confirmation
    Warning,
    /// Operation failed
    Error,
}

/// Global toast shown above the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Headline
    pub title: String,
    /// Body text
    pub text: String,
}

impl Notification {
    /// Notification with explicit level
    #[must_use]
    pub fn new(level: NotificationLevel, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            text: text.into(),
        }
    }

    /// Error notification
    #[inline]
    #[must_use]
    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, text)
    }

    /// Edit submitted without changes
    #[must_use]
    pub fn no_changes() -> Self {
        Self::new(
            NotificationLevel::Info,
            "No Changes",
            "You haven't made any changes to update.",
        )
    }

    /// Successful save
    #[must_use]
    pub fn saved(created: bool) -> Self {
        if created {
            Self::new(
                NotificationLevel::Success,
                "Product Created!",
                "Your product has been successfully created.",
            )
        } else {
            Self::new(
                NotificationLevel::Success,
                "Product Updated!",
                "Your product has been successfully updated.",
            )
        }
    }

    /// Confirmation shown before discarding unsaved edits
    #[must_use]
    pub fn discard_changes() -> Self {
        Self::new(
            NotificationLevel::Warning,
            "Cancel editing?",
            "All unsaved changes will be lost.",
        )
    }
}

/// Remote product store
#[async_trait::async_trait]
pub trait ProductApi: Send + Sync {
    /// Fetch one product for editing
    async fn fetch_product(
        &self,
        auth: &AuthContext,
        id: &ProductId,
    ) -> Result<ProductRecord, ApiError>;

    /// Create a product from a multipart payload
    async fn create_product(
        &self,
        auth: &AuthContext,
        payload: &Payload,
    ) -> Result<ProductRecord, ApiError>;

    /// Update a product from a multipart payload
    async fn update_product(
        &self,
        auth: &AuthContext,
        id: &ProductId,
        payload: &Payload,
    ) -> Result<ProductRecord, ApiError>;
}
