mod model;

pub use model::{AnalyticsEvent, EventType};
