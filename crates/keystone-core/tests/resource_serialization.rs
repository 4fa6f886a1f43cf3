use keystone_core::{ForeignKeyRule, Resource};

#[test]
fn serializes_resource_deterministically() {
    let resource = Resource::new("plants_pudl", ["plant_id_pudl", "plant_name_pudl"])
        .with_primary_key(["plant_id_pudl"])
        .with_rule(ForeignKeyRule::new([["plant_id_pudl"]]).excluding(["plants_eia"]))
        .with_sources(["glue"]);

    let json = serde_json::to_string_pretty(&resource).expect("serialize resource");
    let expected = r#"{
  "name": "plants_pudl",
  "schema": {
    "fields": [
      "plant_id_pudl",
      "plant_name_pudl"
    ],
    "primary_key": [
      "plant_id_pudl"
    ],
    "foreign_key_rules": {
      "fields": [
        [
          "plant_id_pudl"
        ]
      ],
      "exclude": [
        "plants_eia"
      ]
    }
  },
  "sources": [
    "glue"
  ]
}"#;
    assert_eq!(json, expected);
}

#[test]
fn resource_round_trips_through_json() {
    let resource = Resource::new("utilities_eia", ["utility_id_eia"])
        .with_primary_key(["utility_id_eia"])
        .with_etl_group("eia860");
    let json = serde_json::to_value(&resource).expect("serialize resource");
    let parsed: Resource = serde_json::from_value(json).expect("parse resource");
    assert_eq!(parsed, resource);
}
