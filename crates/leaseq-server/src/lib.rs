pub mod config;
pub mod dispatch;
pub mod queue;
pub mod registry;
pub mod server;

pub use config::ServerConfig;
pub use registry::Registry;
