//! Tag-based reflection generated by `#[derive(AutoSerialize)]`.

use config_tree::{
    AutoSerialize, Config, ConfigError, ConfigOptions, ConfigSerializer, ConfigType, Map, Result,
    Serializations, Value, convert_field,
};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, AutoSerialize)]
#[auto_serialize(constructor = new)]
struct Point {
    #[serialize_as("X")]
    x: i32,
    #[serialize_as("Y")]
    y: i32,
    #[serialize_as("Z")]
    z: i32,
}

impl Point {
    fn new(x: i32, y: i32, z: i32) -> Self {
        Point { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq, Default, AutoSerialize)]
#[auto_serialize(default)]
struct Permission {
    #[serialize_as("Name")]
    name: String,
    #[serialize_as("Default")]
    granted_by_default: bool,
    #[serialize_as("Children")]
    children: Vec<String>,
    /// Not tagged, never serialized.
    cached_hash: u64,
}

#[derive(Debug, Clone, PartialEq, AutoSerialize)]
struct Unbuildable {
    #[serialize_as("Id")]
    id: i64,
}

#[derive(Debug, Clone, PartialEq, AutoSerialize)]
#[auto_serialize(constructor = new)]
struct Server {
    #[serialize_as("name")]
    name: String,
    #[serialize_as("origin")]
    origin: Point,
}

impl Server {
    fn new(name: String, origin: Point) -> Self {
        Server { name, origin }
    }
}

/// Lower-case keys instead of the reflective `X`, `Y`, `Z` tags.
struct LowerPointSerializer;

impl ConfigSerializer for LowerPointSerializer {
    type Target = Point;

    fn serialize(&self, point: &Point) -> Result<Map> {
        let mut map = Map::new();
        map.insert("x".into(), Value::from(point.x));
        map.insert("y".into(), Value::from(point.y));
        map.insert("z".into(), Value::from(point.z));
        Ok(map)
    }

    fn deserialize(&self, serialized: &Map) -> Result<Point> {
        Ok(Point::new(
            convert_field(serialized.get("x").cloned(), "Point", "x")?,
            convert_field(serialized.get("y").cloned(), "Point", "y")?,
            convert_field(serialized.get("z").cloned(), "Point", "z")?,
        ))
    }
}

#[test]
fn test_constructor_round_trip() {
    let serializations = Serializations::new();
    let point = Point::new(102, 64, -110);

    let map = serializations.serialize(&point).unwrap();
    let tags: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(tags, vec!["X", "Y", "Z"]);
    assert_eq!(serializations.deserialize::<Point>(&map).unwrap(), point);
}

#[test]
fn test_metadata_is_memoized() {
    let serializations = Serializations::new();
    assert_eq!(serializations.cached_types(), 0);
    serializations.serialize(&Point::new(1, 2, 3)).unwrap();
    serializations.serialize(&Point::new(4, 5, 6)).unwrap();
    assert_eq!(serializations.cached_types(), 1);

    serializations.clear_cache();
    assert_eq!(serializations.cached_types(), 0);
    serializations.serialize(&Point::new(1, 2, 3)).unwrap();
    assert_eq!(serializations.cached_types(), 1);
}

#[test]
fn test_descriptor_lists_tagged_fields_only() {
    let descriptor = Permission::descriptor().unwrap();
    let fields: Vec<(&str, &str)> = descriptor
        .fields()
        .iter()
        .map(|field| (field.tag(), field.field_name()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("Name", "name"),
            ("Default", "granted_by_default"),
            ("Children", "children"),
        ]
    );
}

#[test]
fn test_empty_constructor_injects_present_fields() {
    let config = Config::new();
    config.set("perm.Name", "admin").unwrap();
    config.set("perm.Children", vec!["read", "write"]).unwrap();

    let permission = config.get_object::<Permission>("perm").unwrap().unwrap();
    assert_eq!(
        permission,
        Permission {
            name: "admin".to_string(),
            granted_by_default: false,
            children: vec!["read".to_string(), "write".to_string()],
            cached_hash: 0,
        }
    );
}

#[test]
fn test_object_stored_via_reflection() {
    let config = Config::new();
    let permission = Permission {
        name: "op".to_string(),
        granted_by_default: true,
        children: vec![],
        cached_hash: 42,
    };
    config.set("perm", permission).unwrap();

    let keys: Vec<String> = config.keys(true).into_iter().collect();
    assert_eq!(keys, vec!["perm.Name", "perm.Default", "perm.Children"]);
    assert!(config.get_boolean("perm.Default").unwrap());

    let restored = config.get_object::<Permission>("perm").unwrap().unwrap();
    assert_eq!(restored.name, "op");
    assert_eq!(restored.cached_hash, 0);
}

#[test]
fn test_field_type_mismatch_names_owner_and_tag() {
    let config = Config::new();
    config.set("p.X", 1).unwrap();
    config.set("p.Y", "two").unwrap();
    config.set("p.Z", 3).unwrap();

    let err = config.get_object::<Point>("p").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"derive::Point.Y: expected i32, found string");
}

#[test]
fn test_missing_field_for_constructor() {
    let config = Config::new();
    config.set("p.X", 1).unwrap();
    let err = config.get_object::<Point>("p").unwrap_err();
    assert!(matches!(err, ConfigError::MissingField { ref key, .. } if key == "Y"));
}

#[test]
fn test_no_constructor_is_construction_error() {
    let serializations = Serializations::new();
    let map = serializations.serialize(&Unbuildable { id: 7 }).unwrap();
    assert_eq!(map.get("Id"), Some(&Value::Int(7)));

    let err = serializations.deserialize::<Unbuildable>(&map).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"derive::Unbuildable has neither a matching parameterized constructor nor an empty constructor"
    );
}

#[test]
fn test_nested_reflective_objects() {
    let config = Config::new();
    let server = Server::new("alpha".to_string(), Point::new(1, 2, 3));
    config.set("servers.alpha", server.clone()).unwrap();

    assert!(config.has_child("servers.alpha.origin").unwrap());
    assert_eq!(config.get_int("servers.alpha.origin.Z").unwrap(), 3);
    assert_eq!(config.get_object::<Server>("servers.alpha").unwrap(), Some(server));
}

#[test]
fn test_object_lists_through_reflection() {
    let config = Config::new();
    let points = vec![Point::new(0, 0, 0), Point::new(1, -1, 2)];
    config.set("points", points.clone()).unwrap();

    let maps = config.get_map_list("points").unwrap();
    assert_eq!(maps.len(), 2);
    assert_eq!(maps[1].get("Y"), Some(&Value::Int(-1)));
    assert_eq!(config.get_object_list::<Point>("points").unwrap(), points);
}

#[test]
fn test_convert_from_value() {
    let point = Point::new(5, 6, 7);
    let value = Value::from(point.clone());
    assert_eq!(value.to::<Point>(), Some(point));
    assert_eq!(Value::from(1).to::<Point>(), None);
}

#[test]
fn test_nested_objects_use_the_tree_service() {
    let serializations = Arc::new(Serializations::new());
    serializations.register(LowerPointSerializer).unwrap();
    let config =
        Config::with_options(ConfigOptions::new().with_serializations(Arc::clone(&serializations)));

    let server = Server::new("edge".to_string(), Point::new(7, 8, 9));
    config.set("srv", server.clone()).unwrap();

    let origin_keys: Vec<String> = config
        .get_child("srv.origin")
        .unwrap()
        .unwrap()
        .keys(false)
        .into_iter()
        .collect();
    assert_eq!(origin_keys, vec!["x", "y", "z"]);
    assert_eq!(config.get_int("srv.origin.y").unwrap(), 8);
    assert_eq!(config.get_object::<Server>("srv").unwrap(), Some(server));

    // A mapping snapshot is rebuilt with the same service.
    let snapshot = config.get_child("srv").unwrap().unwrap().values();
    assert_eq!(
        serializations.deserialize::<Server>(&snapshot).unwrap().origin,
        Point::new(7, 8, 9)
    );
}
