pub mod atomic;
pub mod config_io;
pub mod lock;
pub mod session;
pub mod watcher;
