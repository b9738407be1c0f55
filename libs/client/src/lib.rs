//! Client application core for Love Nest
//!
//! Everything the front end needs apart from drawing pixels: a typed API
//! client, an explicit application state advanced by a pure reducer, view
//! models derived from state snapshots, a controller that performs the
//! network and storage effects, and the one-time import of data cached by
//! the pre-API client.
//!
//! ```rust,no_run
//! use client::{ApiClient, Controller, FileStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), client::ClientError> {
//!     let controller = Controller::new(
//!         ApiClient::new("http://localhost:3001/api"),
//!         FileStore::new("love-nest.json"),
//!     );
//!     controller.boot().await?;
//!     if !controller.state().is_authenticated() {
//!         controller.login("love2024").await?;
//!     }
//!     let today = chrono::Local::now().date_naive();
//!     let dashboard = client::views::dashboard(&controller.state(), today);
//!     println!("{} days together", dashboard.days_together.unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod controller;
pub mod error;
pub mod migration;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;
pub mod views;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, JournalApi};
pub use controller::{Confirm, Controller};
pub use error::{ClientError, ClientResult};
pub use state::{Action, AppState, reduce};
pub use storage::{FileStore, LocalStore, MemoryStore};
pub use store::Store;
