use crate::validation::Validatable;

/// Identifier type of every persistent entity.
pub type EntityId = i64;

/// The minimal contract an entity type must fulfil to be served by a
/// [`CrudService`](crate::service::CrudService) and exposed through a
/// [`CrudResource`](crate::resource::CrudResource).
///
/// The id is `None` until storage assigns one on first insert. Clients never
/// choose the id of a new entity.
///
/// ```rust,ignore
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// pub struct Customer {
///     pub id: Option<i64>,
///     pub name: String,
///     pub city: String,
/// }
///
/// impl CrudIdentifiable for Customer {
///     fn id(&self) -> Option<i64> { self.id }
///     fn set_id(&mut self, id: Option<i64>) { self.id = id; }
/// }
///
/// impl Validatable for Customer {}
/// ```
pub trait CrudIdentifiable: Validatable + Clone + Send + Sync + 'static {
    fn id(&self) -> Option<EntityId>;

    fn set_id(&mut self, id: Option<EntityId>);

    /// Identity equality: both ids present and equal, or the very same value.
    ///
    /// Two distinct entities without an id are never equal.
    fn same_identity(&self, other: &Self) -> bool {
        match (self.id(), other.id()) {
            (Some(left), Some(right)) => left == right,
            _ => std::ptr::eq(self, other),
        }
    }
}
