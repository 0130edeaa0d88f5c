pub mod database;
pub mod models;
pub mod session_db;

pub use models::AuthContext;
pub use session_db::SessionStore;
