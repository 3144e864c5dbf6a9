//! CrudService: generic CRUD using safe SQL builder.

mod crud;
mod validation;
pub use crud::{CrudService, ListParams, Page, DEFAULT_LIMIT};
pub use validation::RequestValidator;
