//! State containers shared by the screens.

mod client_store;
pub mod persist;
mod selection_store;
mod session_store;

pub use client_store::{ClientState, ClientStore, Pagination};
pub use selection_store::{SELECTION_KEY, SelectionState, SelectionStore};
pub use session_store::{
    MAX_NAME_LEN, SESSION_KEY, SessionState, SessionStore, ValidationError, validate_display_name,
};

pub const CLIENTS_KEY: &str = "clients-storage";
