//! # cardroom-service: Multiplayer Table Server
//!
//! HTTP surface and table lobby on top of [`cardroom_engine`]. Every table
//! is owned by a dedicated actor task; commands (joins, actions, views) go
//! through its queue, which serializes all table mutations without locks
//! around the engine. Bot seats are driven on the same queue.
//!
//! Layout:
//! - [`lobby`] — table registry, per-table actors, staleness reclamation
//! - [`view`] — sanitized client projections (hole cards withheld)
//! - [`store`] — persisted table records
//! - [`events`] — per-table event fan-out
//! - [`handlers`] + [`server`] — warp routes and the server lifecycle

pub mod errors;
pub mod events;
pub mod handlers;
pub mod lobby;
pub mod logging;
pub mod server;
pub mod store;
pub mod view;

pub use errors::LobbyError;
pub use events::{EventBus, TableEvent};
pub use lobby::{Lobby, LobbyConfig, TableId};
pub use server::{AppContext, ServerConfig, ServerHandle, WebServer};
pub use store::{TableRecord, TableStore};
pub use view::{TableSummary, TableView};
