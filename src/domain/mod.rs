pub mod essay;
pub mod record;
