pub mod config;
pub mod publisher;

pub use config::RabbitMqConfig;
pub use publisher::{GradeChangedMessage, PublisherError, RabbitMqPublisher};
