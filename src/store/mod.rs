pub mod fs;
pub mod repo;

pub use fs::FsStore;
pub use repo::Store;
