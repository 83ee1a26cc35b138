mod handler;
mod model;

pub use handler::subscribe;
pub use model::{PushSubscription, endpoint_hash};
