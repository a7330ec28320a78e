//! # Query Parameter Filtering
//!
//! Turns the flat `field=value` query parameters of a request into typed
//! comparison predicates. The operator is chosen from the value's first
//! character, falling back to the field name's suffix:
//!
//! ```rust,ignore
//! GET /customers?city=Rome            // string equality
//! GET /customers?amount=<100          // amount <= 100
//! GET /customers?amount=>10           // amount >= 10
//! GET /customers?name=~Jo%            // SQL LIKE, case-sensitive
//! GET /orders?customerId=12           // order.customer.id == 12
//! ```
//!
//! All parameters of one request are ANDed. The same grammar drives list,
//! count and bulk-delete requests.

pub mod conditions;
pub mod predicate;
pub mod query;

pub use conditions::{apply_filters, build_condition};
pub use predicate::{FilterError, FilterSet, PredicateOperator, QueryPredicate, resolve, resolve_all};
pub use query::parse_query;
