mod pool;
mod store;

pub use pool::connect;
pub use store::EntryStore;
