use std::collections::BTreeMap;
use thiserror::Error;

/// Raw filter parameters of one request: field name to value string.
pub type FilterSet = BTreeMap<String, String>;

/// Value prefix selecting [`PredicateOperator::Le`]
pub const LE_MARKER: char = '<';
/// Value prefix selecting [`PredicateOperator::Ge`]
pub const GE_MARKER: char = '>';
/// Value prefix selecting [`PredicateOperator::Like`]
pub const LIKE_MARKER: char = '~';
/// Field suffix selecting [`PredicateOperator::Id`]
pub const ID_SUFFIX: &str = "Id";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("filter value '{value}' for field '{field}' is not an integer")]
    MalformedFilterValue { field: String, value: String },
    #[error("field '{field}' cannot be filtered")]
    UnknownField { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateOperator {
    /// String equality
    Eq,
    /// Numeric less-or-equal
    Le,
    /// Numeric greater-or-equal
    Ge,
    /// SQL `LIKE` pattern match
    Like,
    /// Equality against an associated entity's id
    Id,
}

/// One comparison derived from one filter parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPredicate {
    Eq { field: String, value: String },
    Le { field: String, bound: i64 },
    Ge { field: String, bound: i64 },
    Like { field: String, pattern: String },
    Id { association: String, id: String },
}

impl QueryPredicate {
    #[must_use]
    pub const fn operator(&self) -> PredicateOperator {
        match self {
            Self::Eq { .. } => PredicateOperator::Eq,
            Self::Le { .. } => PredicateOperator::Le,
            Self::Ge { .. } => PredicateOperator::Ge,
            Self::Like { .. } => PredicateOperator::Like,
            Self::Id { .. } => PredicateOperator::Id,
        }
    }

    /// Field the predicate applies to; the association name for `Id`.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Eq { field, .. }
            | Self::Le { field, .. }
            | Self::Ge { field, .. }
            | Self::Like { field, .. } => field,
            Self::Id { association, .. } => association,
        }
    }
}

fn parse_bound(field: &str, raw: &str) -> Result<i64, FilterError> {
    raw.parse::<i64>()
        .map_err(|_| FilterError::MalformedFilterValue {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Resolve one filter parameter into its predicate.
///
/// Precedence: value prefix `<`, `>`, `~` first, then an `Id` suffix on the
/// field name, then plain string equality.
///
/// # Errors
///
/// Returns [`FilterError::MalformedFilterValue`] when a `<` or `>` value is
/// not followed by an integer.
pub fn resolve(field: &str, value: &str) -> Result<QueryPredicate, FilterError> {
    if let Some(rest) = value.strip_prefix(LE_MARKER) {
        return Ok(QueryPredicate::Le {
            field: field.to_string(),
            bound: parse_bound(field, rest)?,
        });
    }
    if let Some(rest) = value.strip_prefix(GE_MARKER) {
        return Ok(QueryPredicate::Ge {
            field: field.to_string(),
            bound: parse_bound(field, rest)?,
        });
    }
    if let Some(rest) = value.strip_prefix(LIKE_MARKER) {
        return Ok(QueryPredicate::Like {
            field: field.to_string(),
            pattern: rest.to_string(),
        });
    }
    if let Some(association) = field.strip_suffix(ID_SUFFIX)
        && !association.is_empty()
    {
        return Ok(QueryPredicate::Id {
            association: association.to_string(),
            id: value.to_string(),
        });
    }
    Ok(QueryPredicate::Eq {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Resolve a whole filter set; the predicates are meant to be ANDed.
///
/// # Errors
///
/// Fails on the first malformed entry.
pub fn resolve_all(filters: &FilterSet) -> Result<Vec<QueryPredicate>, FilterError> {
    filters
        .iter()
        .map(|(field, value)| resolve(field, value))
        .collect()
}
