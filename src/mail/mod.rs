pub mod api;
pub mod extract;
pub mod gmail;
pub mod query;
