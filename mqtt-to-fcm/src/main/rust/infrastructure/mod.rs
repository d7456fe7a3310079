pub mod fcm;
pub mod google;
pub mod metrics;
pub mod mqtt;
