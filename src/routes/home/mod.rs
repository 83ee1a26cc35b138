mod handler;

pub use handler::{Landing, categories, landing, messages};
