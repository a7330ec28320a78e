use sea_orm::{
    ColumnTrait, Condition, DatabaseBackend,
    sea_query::{Alias, Expr, SimpleExpr},
};

use super::predicate::{FilterError, FilterSet, QueryPredicate, resolve_all};

fn lookup_column<C: Copy>(columns: &[(&str, C)], field: &str) -> Result<C, FilterError> {
    columns
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| *column)
        .ok_or_else(|| FilterError::UnknownField {
            field: field.to_string(),
        })
}

/// Column rendered as text, so string comparisons work on any column type.
/// SQLite compares across storage classes on its own.
fn as_text(column: impl ColumnTrait, backend: DatabaseBackend) -> SimpleExpr {
    match backend {
        DatabaseBackend::Postgres => Expr::col(column).cast_as(Alias::new("TEXT")),
        DatabaseBackend::MySql => Expr::col(column).cast_as(Alias::new("CHAR")),
        _ => Expr::col(column).into(),
    }
}

/// Rewrite a LIKE pattern for SQLite's `GLOB`, which is case-sensitive
fn like_to_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' => glob.push('*'),
            '_' => glob.push('?'),
            '*' | '?' | '[' => {
                glob.push('[');
                glob.push(c);
                glob.push(']');
            }
            _ => glob.push(c),
        }
    }
    glob
}

/// Case-sensitive pattern match on every backend
fn like_expr(column: impl ColumnTrait, pattern: &str, backend: DatabaseBackend) -> SimpleExpr {
    match backend {
        DatabaseBackend::Postgres => Expr::expr(as_text(column, backend)).like(pattern),
        DatabaseBackend::MySql => Expr::cust_with_exprs(
            "$1 LIKE BINARY $2",
            [as_text(column, backend), pattern.into()],
        ),
        _ => Expr::cust_with_exprs(
            "$1 GLOB $2",
            [as_text(column, backend), like_to_glob(pattern).into()],
        ),
    }
}

fn predicate_expr<C: ColumnTrait + Copy>(
    predicate: &QueryPredicate,
    filterable_columns: &[(&str, C)],
    association_columns: &[(&str, C)],
    backend: DatabaseBackend,
) -> Result<SimpleExpr, FilterError> {
    let expr = match predicate {
        QueryPredicate::Eq { field, value } => {
            let column = lookup_column(filterable_columns, field)?;
            Expr::expr(as_text(column, backend)).eq(value.as_str())
        }
        QueryPredicate::Le { field, bound } => {
            Expr::col(lookup_column(filterable_columns, field)?).lte(*bound)
        }
        QueryPredicate::Ge { field, bound } => {
            Expr::col(lookup_column(filterable_columns, field)?).gte(*bound)
        }
        QueryPredicate::Like { field, pattern } => {
            like_expr(lookup_column(filterable_columns, field)?, pattern, backend)
        }
        QueryPredicate::Id { association, id } => {
            let column = lookup_column(association_columns, association)?;
            Expr::expr(as_text(column, backend)).eq(id.as_str())
        }
    };
    Ok(expr)
}

/// AND together the conditions for already resolved predicates, rendered for
/// `backend`. `LIKE` patterns match case-sensitively everywhere.
///
/// # Errors
///
/// Returns [`FilterError::UnknownField`] when a predicate names a field that
/// has no column in the given lists.
pub fn build_condition<C: ColumnTrait + Copy>(
    predicates: &[QueryPredicate],
    filterable_columns: &[(&str, C)],
    association_columns: &[(&str, C)],
    backend: DatabaseBackend,
) -> Result<Condition, FilterError> {
    predicates.iter().try_fold(Condition::all(), |condition, predicate| {
        Ok(condition.add(predicate_expr(
            predicate,
            filterable_columns,
            association_columns,
            backend,
        )?))
    })
}

/// Resolve a filter set and build its condition. An empty set matches everything.
///
/// # Errors
///
/// Propagates malformed values and unknown fields.
pub fn apply_filters<C: ColumnTrait + Copy>(
    filters: &FilterSet,
    filterable_columns: &[(&str, C)],
    association_columns: &[(&str, C)],
    backend: DatabaseBackend,
) -> Result<Condition, FilterError> {
    let predicates = resolve_all(filters)?;
    build_condition(&predicates, filterable_columns, association_columns, backend)
}
