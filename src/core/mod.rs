// Entity capability shared by services and resources

pub mod traits;

pub use traits::{CrudIdentifiable, EntityId};
