mod mqtt_bus_client;

pub use mqtt_bus_client::MqttBusClient;
