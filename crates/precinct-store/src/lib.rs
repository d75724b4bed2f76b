//! Sheet storage for the precinct ballot scanner.
//!
//! The scanner controller records every sheet it scans through the
//! [`SheetStore`] trait:
//!
//! - [`MemorySheetStore`] keeps everything in memory (tests, demos)
//! - [`SqliteSheetStore`] persists to SQLite through a [`Database`] pool
//!   with embedded migrations
//!
//! # Examples
//!
//! ```no_run
//! use precinct_store::{Database, DatabaseConfig, SheetStore, SqliteSheetStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("precinct-scan.db")).await?;
//! let store = SqliteSheetStore::new(db);
//!
//! println!("ballots counted: {}", store.ballots_counted().await?);
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use memory::{MemorySheetStore, StoredSheet};
pub use sqlite::SqliteSheetStore;
pub use store::SheetStore;
