//! Events - 事件发布与进度监听

mod progress_listener;
mod publisher;

pub use progress_listener::ProgressListener;
pub use publisher::EventPublisher;
