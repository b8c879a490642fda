#![forbid(unsafe_code)]

mod config;
mod entry;
mod handle;
mod key;
mod store;
mod sweeper;
mod table;

pub use config::StoreConfig;
pub use entry::{Entry, SetOptions};
pub use handle::{HandleId, HandleRegistry, KeyHandle};
pub use key::Key;
pub use store::Store;
pub use sweeper::{Purge, Sweeper};
pub use table::EntryTable;
