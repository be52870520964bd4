//! Object storage through registered serializers.

use config_tree::{
    Config, ConfigError, ConfigOptions, ConfigSerializer, ConfigType, Map, Result, Serializations,
    Value, convert_field,
};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct Endpoint {
    host: String,
    port: i64,
    tags: Vec<String>,
}

impl ConfigType for Endpoint {}

struct EndpointSerializer;

impl ConfigSerializer for EndpointSerializer {
    type Target = Endpoint;

    fn serialize(&self, object: &Endpoint) -> Result<Map> {
        let mut map = Map::new();
        map.insert("host".into(), Value::from(&object.host));
        map.insert("port".into(), Value::from(object.port));
        map.insert("tags".into(), Value::from(object.tags.clone()));
        Ok(map)
    }

    fn deserialize(&self, serialized: &Map) -> Result<Endpoint> {
        Ok(Endpoint {
            host: convert_field(serialized.get("host").cloned(), "Endpoint", "host")?,
            port: convert_field(serialized.get("port").cloned(), "Endpoint", "port")?,
            tags: convert_field(serialized.get("tags").cloned(), "Endpoint", "tags")?,
        })
    }
}

struct UppercaseSerializer;

impl ConfigSerializer for UppercaseSerializer {
    type Target = Endpoint;

    fn serialize(&self, object: &Endpoint) -> Result<Map> {
        let mut map = Map::new();
        map.insert("HOST".into(), Value::from(object.host.to_uppercase()));
        Ok(map)
    }

    fn deserialize(&self, _serialized: &Map) -> Result<Endpoint> {
        Err(ConfigError::custom("write-only serializer"))
    }
}

/// A type with no serialization strategy at all.
#[derive(Debug, Clone, PartialEq)]
struct Opaque(u8);

impl ConfigType for Opaque {}

fn endpoint(host: &str, port: i64) -> Endpoint {
    Endpoint {
        host: host.to_string(),
        port,
        tags: vec!["primary".to_string()],
    }
}

fn isolated() -> (Arc<Serializations>, Config) {
    let serializations = Arc::new(Serializations::new());
    serializations.register(EndpointSerializer).unwrap();
    let config =
        Config::with_options(ConfigOptions::new().with_serializations(Arc::clone(&serializations)));
    (serializations, config)
}

#[test]
fn test_registered_round_trip() {
    let serializations = Serializations::new();
    serializations.register(EndpointSerializer).unwrap();

    for original in [endpoint("localhost", 80), endpoint("db.internal", 5432)] {
        let map = serializations.serialize(&original).unwrap();
        assert_eq!(serializations.deserialize::<Endpoint>(&map).unwrap(), original);
    }
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let (serializations, config) = isolated();

    let err = serializations.register(UppercaseSerializer).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"Serializer for serialization::Endpoint is already registered"
    );

    config.set("api", Value::object(endpoint("localhost", 80))).unwrap();
    assert_eq!(config.get_string("api.host").unwrap().as_deref(), Some("localhost"));
}

#[test]
fn test_object_becomes_section() {
    let (_, config) = isolated();
    config.set("api", Value::object(endpoint("localhost", 8080))).unwrap();

    assert!(config.has_child("api").unwrap());
    let deep: Vec<String> = config.keys(true).into_iter().collect();
    assert_eq!(deep, vec!["api.host", "api.port", "api.tags"]);
    assert_eq!(config.get_long("api.port").unwrap(), 8080);

    let restored = config.get_object::<Endpoint>("api").unwrap();
    assert_eq!(restored, Some(endpoint("localhost", 8080)));
}

#[test]
fn test_unserializable_object_is_stored_as_is() {
    let (_, config) = isolated();
    config.set("raw", Value::object(Opaque(3))).unwrap();

    let stored = config.get("raw").unwrap().unwrap();
    assert_eq!(stored.as_object().unwrap().downcast_ref::<Opaque>(), Some(&Opaque(3)));
    assert_eq!(config.get_object::<Opaque>("raw").unwrap(), Some(Opaque(3)));
    assert_eq!(config.get_object::<Endpoint>("raw").unwrap(), None);
}

#[test]
fn test_get_object_on_section_without_strategy_fails() {
    let (_, config) = isolated();
    config.set("plain.value", 1).unwrap();
    let err = config.get_object::<Opaque>("plain").unwrap_err();
    assert!(err.is_unserializable());
    assert!(err.to_string().contains("Opaque"));
}

#[test]
fn test_object_list_round_trip() {
    let (_, config) = isolated();
    let endpoints = vec![endpoint("a", 1), endpoint("b", 2)];
    let items: Vec<Value> = endpoints.iter().cloned().map(Value::object).collect();
    let mixed = [items, vec![Value::object(Opaque(9)), Value::from("ignored")]].concat();
    config.set("endpoints", mixed).unwrap();

    let stored = config.get_list("endpoints").unwrap();
    assert!(matches!(stored[0], Value::Map(_)));
    assert!(matches!(stored[2], Value::Object(_)));

    assert_eq!(config.get_object_list::<Endpoint>("endpoints").unwrap(), endpoints);
    assert_eq!(config.get_object_list::<Opaque>("endpoints").unwrap(), vec![Opaque(9)]);
}

#[test]
fn test_deserializer_error_is_propagated() {
    let serializations = Arc::new(Serializations::new());
    serializations.register(UppercaseSerializer).unwrap();
    let config =
        Config::with_options(ConfigOptions::new().with_serializations(Arc::clone(&serializations)));

    config.set("api", Value::object(endpoint("x", 1))).unwrap();
    assert_eq!(config.get_string("api.HOST").unwrap().as_deref(), Some("X"));

    let err = config.get_object::<Endpoint>("api").unwrap_err();
    assert_eq!(err, ConfigError::custom("write-only serializer"));
}

#[test]
fn test_unregister_falls_back_to_unserializable() {
    let (serializations, config) = isolated();
    serializations.unregister::<Endpoint>().unwrap();

    config.set("api", Value::object(endpoint("x", 1))).unwrap();
    assert!(!config.has_child("api").unwrap());
    assert!(config.get("api").unwrap().unwrap().as_object().is_some());

    let err = serializations.unregister::<Endpoint>().unwrap_err();
    assert!(matches!(err, ConfigError::NotRegistered { .. }));
}

#[test]
fn test_isolated_services_do_not_share_registrations() {
    let (serializations, _) = isolated();
    let other = Serializations::new();
    assert!(serializations.is_registered::<Endpoint>());
    assert!(!other.is_registered::<Endpoint>());
    assert!(!Serializations::global().is_registered::<Opaque>());
}

#[test]
fn test_exporting_unserialized_object_fails_in_codec() {
    let (_, config) = isolated();
    config.set("raw", Value::object(Opaque(1))).unwrap();
    let err = serde_json::to_string(&Value::Map(config.values())).unwrap_err();
    assert!(err.to_string().contains("Opaque"));
}
