// Per-category event feeds posted to their own channels

pub mod cursor;
pub mod listener;
pub mod publisher;
pub mod render;

pub use cursor::FeedCursor;
pub use listener::FeedListener;
pub use publisher::FeedPublisher;
