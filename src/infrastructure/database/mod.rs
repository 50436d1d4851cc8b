pub mod seed;
mod sqlite;

pub use seed::{bootstrap, BootstrapReport};
pub use sqlite::SqliteDatabase;
