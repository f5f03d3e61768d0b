//! # Shape Descriptors
//!
//! Structural descriptions of request/response types, used only for
//! documentation. A shape is a name plus an ordered list of fields; each
//! field records its display name, type, description and (after linking)
//! the fields of the shape it refers to.
//!
//! Types opt in by implementing [`Describe`], normally through
//! `#[derive(Describe)]`. The derive feeds field annotations into
//! [`ShapeBuilder`], which owns the hiding and renaming rules:
//!
//! - a description of `"-"` hides the field
//! - an external name of `"-"` hides the field
//! - a non-empty external name replaces the declared field name

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;

/// Marker that suppresses documentation of a route or a field
pub const HIDDEN: &str = "-";

/// One level of indentation in the text documentation
pub const INDENT: &str = "  ";

/// Documentation for a single field of a shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Display name (external name if declared, field name otherwise)
    pub name: String,
    /// Declared type, as displayed
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the field is marked as required
    pub required: bool,
    /// Free-text description
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Fields of the referenced shape, filled in by the linker
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<FieldDescriptor>,
    /// Canonical name of the documented shape this field refers to
    #[serde(skip)]
    pub shape_ref: Option<String>,
}

impl FieldDescriptor {
    /// Render as `name(type): description`
    #[must_use]
    pub fn render_text(&self) -> String {
        if self.description.is_empty() {
            format!("{}({})", self.name, self.type_name)
        } else {
            format!("{}({}): {}", self.name, self.type_name, self.description)
        }
    }
}

/// Documentation for a structured type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeDescriptor {
    /// Canonical (module-qualified) type name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Fields in declaration order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
}

impl ShapeDescriptor {
    /// Start building a shape called `name`
    pub fn builder(name: impl Into<String>) -> ShapeBuilder {
        ShapeBuilder::new(name)
    }

    /// Look up a field by display name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check that the shape can be documented
    ///
    /// # Errors
    ///
    /// Returns `Error::Descriptor` on an empty shape name, an empty field
    /// name, or two fields sharing a display name.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::descriptor("<unnamed>", "shape name is empty"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(Error::descriptor(&self.name, "field with empty name"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::descriptor(
                    &self.name,
                    format!("duplicate field name '{}'", field.name),
                ));
            }
        }
        Ok(())
    }

    /// Render the shape header and one line per field
    ///
    /// `level` is the indentation of the header line; fields are indented
    /// one level deeper.
    #[must_use]
    pub fn render_text(&self, level: usize) -> String {
        let tab = INDENT.repeat(level);
        let mut out = format!("{tab}Structure {}\n", self.name);
        for field in &self.fields {
            let _ = writeln!(out, "{tab}{INDENT}{}", field.render_text());
        }
        out
    }
}

/// Annotations of one declared field, before hiding and renaming rules apply
#[derive(Debug, Clone)]
pub struct FieldSpec<'a> {
    raw_name: &'a str,
    type_name: String,
    shape_ref: Option<String>,
    external_name: Option<&'a str>,
    description: Option<&'a str>,
    required: bool,
}

impl<'a> FieldSpec<'a> {
    /// A field with an explicit type string and no shape reference
    pub fn new(raw_name: &'a str, type_name: impl Into<String>) -> Self {
        Self {
            raw_name,
            type_name: type_name.into(),
            shape_ref: None,
            external_name: None,
            description: None,
            required: false,
        }
    }

    /// A field whose type name and shape reference come from `T`
    #[must_use]
    pub fn of<T: FieldType + ?Sized>(raw_name: &'a str) -> Self {
        Self {
            shape_ref: T::shape_ref(),
            ..Self::new(raw_name, T::type_name())
        }
    }

    /// Serialization-name override, e.g. `"id"` or `"id,optional"`
    #[must_use]
    pub const fn external_name(mut self, name: &'a str) -> Self {
        self.external_name = Some(name);
        self
    }

    /// Free-text description; `"-"` hides the field
    #[must_use]
    pub const fn description(mut self, text: &'a str) -> Self {
        self.description = Some(text);
        self
    }

    /// Mark the field as required
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Override the referenced shape
    #[must_use]
    pub fn shape_ref(mut self, shape: Option<String>) -> Self {
        self.shape_ref = shape;
        self
    }

    /// Apply hiding and renaming; `None` when the field is hidden
    fn resolve(self) -> Option<FieldDescriptor> {
        let description = self.description.unwrap_or_default();
        if description == HIDDEN {
            return None;
        }

        let external = self.external_name.map(clean_external_name).unwrap_or_default();
        if external == HIDDEN {
            return None;
        }

        let name = if external.is_empty() {
            self.raw_name
        } else {
            external
        };

        Some(FieldDescriptor {
            name: name.to_string(),
            type_name: self.type_name,
            required: self.required,
            description: description.to_string(),
            properties: Vec::new(),
            shape_ref: self.shape_ref,
        })
    }
}

/// Strip options such as `,optional` from an external name
fn clean_external_name(name: &str) -> &str {
    name.split(',').next().unwrap_or_default().trim()
}

/// Incremental construction of a [`ShapeDescriptor`]
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl ShapeBuilder {
    /// Create a builder for the shape `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field; hidden fields are dropped
    #[must_use]
    pub fn field(mut self, spec: FieldSpec<'_>) -> Self {
        if let Some(field) = spec.resolve() {
            self.fields.push(field);
        }
        self
    }

    /// Finish and validate the shape
    ///
    /// # Errors
    ///
    /// See [`ShapeDescriptor::validate`].
    pub fn build(self) -> Result<ShapeDescriptor> {
        let shape = ShapeDescriptor {
            name: self.name,
            fields: self.fields,
        };
        shape.validate()?;
        Ok(shape)
    }
}

/// A structured type that can describe its own fields
pub trait Describe {
    /// Build the shape descriptor for this type
    ///
    /// # Errors
    ///
    /// Returns `Error::Descriptor` if the description is malformed.
    fn shape() -> Result<ShapeDescriptor>;
}

/// Build the shape descriptor of `T`
///
/// # Errors
///
/// Propagates [`Describe::shape`] errors.
pub fn shape_of<T: Describe>() -> Result<ShapeDescriptor> {
    T::shape()
}

/// A type that can appear as a field of a documented shape
pub trait FieldType {
    /// Type name shown in documentation
    fn type_name() -> String;

    /// Canonical name of the documented shape behind this type, if any
    fn shape_ref() -> Option<String> {
        None
    }
}

macro_rules! impl_primitive_field_type {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldType for $ty {
                fn type_name() -> String {
                    stringify!($ty).to_string()
                }
            }
        )*
    };
}

impl_primitive_field_type!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, str,
);

impl<T: FieldType + ?Sized> FieldType for &T {
    fn type_name() -> String {
        format!("&{}", T::type_name())
    }

    fn shape_ref() -> Option<String> {
        T::shape_ref()
    }
}

impl<T: FieldType> FieldType for Vec<T> {
    fn type_name() -> String {
        format!("Vec<{}>", T::type_name())
    }

    fn shape_ref() -> Option<String> {
        T::shape_ref()
    }
}

impl<T: FieldType> FieldType for [T] {
    fn type_name() -> String {
        format!("[{}]", T::type_name())
    }

    fn shape_ref() -> Option<String> {
        T::shape_ref()
    }
}

impl<T: FieldType, const N: usize> FieldType for [T; N] {
    fn type_name() -> String {
        format!("[{}; {N}]", T::type_name())
    }

    fn shape_ref() -> Option<String> {
        T::shape_ref()
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn type_name() -> String {
        format!("Option<{}>", T::type_name())
    }

    fn shape_ref() -> Option<String> {
        T::shape_ref()
    }
}

impl<T: FieldType + ?Sized> FieldType for Box<T> {
    fn type_name() -> String {
        format!("Box<{}>", T::type_name())
    }

    fn shape_ref() -> Option<String> {
        T::shape_ref()
    }
}

impl<K: FieldType, V: FieldType, S> FieldType for HashMap<K, V, S> {
    fn type_name() -> String {
        format!("HashMap<{}, {}>", K::type_name(), V::type_name())
    }

    fn shape_ref() -> Option<String> {
        V::shape_ref()
    }
}

impl<K: FieldType, V: FieldType> FieldType for BTreeMap<K, V> {
    fn type_name() -> String {
        format!("BTreeMap<{}, {}>", K::type_name(), V::type_name())
    }

    fn shape_ref() -> Option<String> {
        V::shape_ref()
    }
}

impl FieldType for serde_json::Value {
    fn type_name() -> String {
        "json".to_string()
    }
}
