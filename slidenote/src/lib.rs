mod app;
pub mod app_core;
pub mod background;
pub mod backend;
pub mod commands;
pub mod error;
pub mod events;
pub mod log_buffer;
pub mod logging;
pub mod state;

pub use app::App;
pub use error::AppError;

// Always expose testing module (integration tests need it)
pub mod testing;
