pub mod entry;
pub mod step;
