mod push_dispatcher;

pub use push_dispatcher::{PushDispatcher, DEFAULT_GATEWAY_URL};
