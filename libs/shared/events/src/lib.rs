pub mod event;
pub mod publisher;

pub use event::TransitionEvent;
pub use publisher::{BroadcastPublisher, EventPublisher, FanoutPublisher, WebhookPublisher};
