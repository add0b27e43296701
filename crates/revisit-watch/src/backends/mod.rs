//! File watching backends.

pub mod notify_backend;

pub use notify_backend::{convert_event, NotifyWatcher};
