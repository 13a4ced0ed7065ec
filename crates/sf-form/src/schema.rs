//! Form schema: field kinds, options and validation checks

use serde::{Deserialize, Serialize};

/// Option of a select field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Submitted value; empty for the placeholder
    pub value: String,
    /// Label shown to the user
    pub label: String,
}

impl SelectOption {
    /// Create option
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Kind of a scalar field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text (input or textarea)
    Text,
    /// Numeric input; value kept as entered
    Number,
    /// Checkbox
    Bool,
    /// Select with fixed options
    Select {
        /// Available options, placeholder first
        options: Vec<SelectOption>,
    },
}

impl FieldKind {
    /// Short name for error messages
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Select { .. } => "select",
        }
    }
}

/// A single validation rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum Rule {
    /// Non-empty after trimming
    Required,
    /// Numeric and strictly greater than the bound
    GreaterThan(f64),
    /// Numeric and greater than or equal to the bound
    AtLeast(f64),
    /// One of the select options (placeholder excluded)
    OneOfOptions,
}

/// Rule plus the message shown when it fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    /// Rule to evaluate
    pub rule: Rule,
    /// Message stored in the field's error slot
    pub message: String,
}

impl Check {
    /// Create check
    #[inline]
    #[must_use]
    pub fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

/// One scalar field of the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name, used as the payload part name
    pub name: String,
    /// Label shown next to the control
    pub label: String,
    /// Kind
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Checks in evaluation order; the first failure wins
    #[serde(default)]
    pub checks: Vec<Check>,
}

impl FieldSpec {
    /// Create field without checks
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            checks: Vec::new(),
        }
    }

    /// Add a check
    #[must_use]
    pub fn check(mut self, rule: Rule, message: impl Into<String>) -> Self {
        self.checks.push(Check::new(rule, message));
        self
    }
}

/// Scalar fields of a form, in payload order, plus its image field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
    image_field: String,
}

impl FormSchema {
    /// Create schema
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>, image_field: impl Into<String>) -> Self {
        Self {
            fields,
            image_field: image_field.into(),
        }
    }

    /// Product form with the default categories
    #[must_use]
    pub fn product() -> Self {
        Self::product_with_categories(Self::default_categories())
    }

    /// Product form with custom category options
    #[must_use]
    pub fn product_with_categories(categories: Vec<SelectOption>) -> Self {
        Self::new(
            vec![
                FieldSpec::new("name", "Product Name", FieldKind::Text)
                    .check(Rule::Required, "Product name is required"),
                FieldSpec::new("price", "Price", FieldKind::Number)
                    .check(Rule::GreaterThan(0.0), "Price must be greater than 0"),
                FieldSpec::new("stock", "Stock", FieldKind::Number)
                    .check(Rule::Required, "Stock is required")
                    .check(Rule::AtLeast(0.0), "Stock cannot be negative"),
                FieldSpec::new(
                    "category",
                    "Category",
                    FieldKind::Select {
                        options: categories,
                    },
                )
                .check(Rule::Required, "Category must be selected")
                .check(Rule::OneOfOptions, "Category must be selected"),
                FieldSpec::new("isFeatured", "Featured Product", FieldKind::Bool),
                FieldSpec::new("description", "Description", FieldKind::Text)
                    .check(Rule::Required, "Description is required"),
            ],
            "images",
        )
    }

    /// Categories offered by the product form
    #[must_use]
    pub fn default_categories() -> Vec<SelectOption> {
        vec![
            SelectOption::new("", "Choose a category"),
            SelectOption::new("daily", "Daily"),
            SelectOption::new("formal", "Formal"),
            SelectOption::new("sport", "Sport"),
            SelectOption::new("night", "Night"),
            SelectOption::new("body_mist", "Body mist"),
            SelectOption::new("other", "Other"),
        ]
    }

    /// Scalar fields in payload order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Name of the image field (error slot for image-count failures)
    #[inline]
    #[must_use]
    pub fn image_field(&self) -> &str {
        &self.image_field
    }
}
