mod client;
mod poller;
mod watcher;

pub use client::ContentClient;
pub use poller::{PollCoordinator, PollHandle, PollHandler, PollOptions, Visibility};
pub use watcher::{Clock, ContemplationWatcher};
