pub mod constants;
pub mod engine;
pub mod grid;
pub mod levels;
pub mod pathfinding;
pub mod patrol;
pub mod scripted;
pub mod server_protocol;
pub mod session;
pub mod structured_log;
pub mod targeting;
pub mod types;
