pub mod convert;
pub mod download;
pub mod fetch_ids;
