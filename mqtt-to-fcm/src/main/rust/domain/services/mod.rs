mod notification_builder;

pub use notification_builder::NotificationBuilder;
