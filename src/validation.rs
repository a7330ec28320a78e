//! Validation Support
//!
//! Entities declare their integrity and format constraints by implementing
//! [`Validatable`]. Persistence services call it before anything reaches
//! storage; violations come back as [`ValidationErrors`] and are rendered by
//! the error translator as a `validationErrors` payload with one entry per
//! violated field.
//!
//! # Example
//!
//! ```rust,ignore
//! use crudrest::validation::{Validatable, ValidationErrors, validators};
//!
//! impl Validatable for Customer {
//!     fn validate(&self) -> Result<(), ValidationErrors> {
//!         let mut errors = ValidationErrors::new();
//!         errors.check(validators::not_blank("name", &self.name));
//!         errors.check(validators::size("city", &self.city, Some(2), Some(40)));
//!         errors.result()
//!     }
//! }
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Property key reported for violations that concern the whole object.
pub const WHOLE_OBJECT: &str = ".";

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintViolation {
    /// Violated field; `None` when the constraint applies to the whole object
    pub property_path: Option<String>,
    /// Message template, possibly wrapped in braces (`{crudrest.NotNull.message}`)
    pub message_template: String,
    /// String form of the offending value
    pub invalid_value: Option<String>,
    /// Qualified name of the constraint
    pub constraint: String,
    /// Constraint attributes such as `min` / `max`
    pub attributes: BTreeMap<String, String>,
}

impl ConstraintViolation {
    /// Create a violation on a named field
    #[must_use]
    pub fn new(
        property_path: impl Into<String>,
        constraint: impl Into<String>,
        message_template: impl Into<String>,
    ) -> Self {
        Self {
            property_path: Some(property_path.into()),
            message_template: message_template.into(),
            invalid_value: None,
            constraint: constraint.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Create a violation of a class-level constraint
    #[must_use]
    pub fn on_object(constraint: impl Into<String>, message_template: impl Into<String>) -> Self {
        Self {
            property_path: None,
            message_template: message_template.into(),
            invalid_value: None,
            constraint: constraint.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_invalid_value(mut self, value: impl fmt::Display) -> Self {
        self.invalid_value = Some(value.to_string());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.attributes.insert(key.into(), value.to_string());
        self
    }

    /// Key under which this violation is reported.
    #[must_use]
    pub fn property_name(&self) -> &str {
        match self.property_path.as_deref() {
            None | Some("") => WHOLE_OBJECT,
            Some(path) => path,
        }
    }

    /// Message template with one pair of surrounding braces removed.
    #[must_use]
    pub fn message_key(&self) -> &str {
        self.message_template
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .unwrap_or(&self.message_template)
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property_name(), self.message_key())
    }
}

/// Collection of constraint violations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    violations: Vec<ConstraintViolation>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, violation: ConstraintViolation) {
        self.violations.push(violation);
    }

    /// Record the outcome of a single validator
    pub fn check(&mut self, outcome: Result<(), ConstraintViolation>) {
        if let Err(violation) = outcome {
            self.add(violation);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    #[must_use]
    pub fn violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }

    /// Convert to Result
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one violation was recorded.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ConstraintViolation> for ValidationErrors {
    fn from(violation: ConstraintViolation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} violation(s):", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Types with declared integrity and format constraints.
///
/// The default implementation accepts every value.
pub trait Validatable {
    /// Validate the instance
    ///
    /// # Errors
    ///
    /// Returns every violated constraint.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Helper validators for common constraints
pub mod validators {
    use super::ConstraintViolation;
    use regex::Regex;
    use std::fmt;

    pub const NOT_NULL: &str = "crudrest::validation::NotNull";
    pub const NOT_BLANK: &str = "crudrest::validation::NotBlank";
    pub const SIZE: &str = "crudrest::validation::Size";
    pub const RANGE: &str = "crudrest::validation::Range";
    pub const PATTERN: &str = "crudrest::validation::Pattern";

    /// A regular expression that has to match a whole value.
    ///
    /// Compile once, e.g. in a `LazyLock`, and pass it to [`pattern`].
    #[derive(Debug, Clone)]
    pub struct Pattern {
        expression: String,
        anchored: Regex,
    }

    impl Pattern {
        /// # Errors
        ///
        /// Returns the regex error when `expression` does not compile.
        pub fn new(expression: &str) -> Result<Self, regex::Error> {
            let anchored = Regex::new(&format!(r"\A(?:{expression})\z"))?;
            Ok(Self {
                expression: expression.to_string(),
                anchored,
            })
        }

        /// The expression as written, without anchors
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.expression
        }

        #[must_use]
        pub fn matches(&self, value: &str) -> bool {
            self.anchored.is_match(value)
        }
    }

    /// Value must be present
    ///
    /// # Errors
    ///
    /// Returns a `NotNull` violation when `value` is `None`.
    pub fn not_null<V>(field: &str, value: Option<&V>) -> Result<(), ConstraintViolation> {
        match value {
            Some(_) => Ok(()),
            None => Err(ConstraintViolation::new(
                field,
                NOT_NULL,
                "{crudrest.validation.NotNull.message}",
            )),
        }
    }

    /// Value must contain at least one non-whitespace character
    ///
    /// # Errors
    ///
    /// Returns a `NotBlank` violation for empty or whitespace-only strings.
    pub fn not_blank(field: &str, value: &str) -> Result<(), ConstraintViolation> {
        if value.trim().is_empty() {
            return Err(ConstraintViolation::new(
                field,
                NOT_BLANK,
                "{crudrest.validation.NotBlank.message}",
            )
            .with_invalid_value(value));
        }
        Ok(())
    }

    /// String length (in characters) must lie within the bounds
    ///
    /// # Errors
    ///
    /// Returns a `Size` violation carrying the bounds as attributes.
    pub fn size(
        field: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<(), ConstraintViolation> {
        let len = value.chars().count();
        let too_short = min.is_some_and(|min_len| len < min_len);
        let too_long = max.is_some_and(|max_len| len > max_len);
        if too_short || too_long {
            return Err(ConstraintViolation::new(
                field,
                SIZE,
                "{crudrest.validation.Size.message}",
            )
            .with_invalid_value(value)
            .with_attribute("min", min.unwrap_or(0))
            .with_attribute("max", max.map_or_else(|| "unbounded".to_string(), |m| m.to_string())));
        }
        Ok(())
    }

    /// Number must lie within the bounds (inclusive)
    ///
    /// # Errors
    ///
    /// Returns a `Range` violation carrying the bounds that were set.
    pub fn range<T: PartialOrd + fmt::Display>(
        field: &str,
        value: T,
        min: Option<T>,
        max: Option<T>,
    ) -> Result<(), ConstraintViolation> {
        let too_small = min.as_ref().is_some_and(|min_val| value < *min_val);
        let too_large = max.as_ref().is_some_and(|max_val| value > *max_val);
        if too_small || too_large {
            let mut violation = ConstraintViolation::new(
                field,
                RANGE,
                "{crudrest.validation.Range.message}",
            )
            .with_invalid_value(&value);
            if let Some(min_val) = min {
                violation = violation.with_attribute("min", min_val);
            }
            if let Some(max_val) = max {
                violation = violation.with_attribute("max", max_val);
            }
            return Err(violation);
        }
        Ok(())
    }

    /// The whole string must match the regular expression
    ///
    /// # Errors
    ///
    /// Returns a `Pattern` violation carrying the expression as `regexp`.
    pub fn pattern(field: &str, value: &str, pattern: &Pattern) -> Result<(), ConstraintViolation> {
        if !pattern.matches(value) {
            return Err(ConstraintViolation::new(
                field,
                PATTERN,
                "{crudrest.validation.Pattern.message}",
            )
            .with_invalid_value(value)
            .with_attribute("regexp", pattern.as_str()));
        }
        Ok(())
    }
}
