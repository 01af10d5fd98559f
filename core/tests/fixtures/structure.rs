use std::collections::HashMap;
use std::fmt;

/// target object
pub struct S {
    pub name: String, // name of object
    pub age: i64,
}

pub struct PositiveInt(i64);
pub struct PInt(PositiveInt);

pub struct S2 {
    pub name: String, // name of object

    /// age of object
    #[tag = r#"json:"age" required:"false""#]
    pub age: PInt,

    #[serde(default)]
    pub nickname: String,

    pub friends: Vec<String>,
    pub items: HashMap<String, i32>,

    #[serde(skip)]
    pub ignored: String,

    pub greeting: Box<dyn fmt::Display>,
    #[tag = r#"jsonschema-override:"{'required': false, 'deprecated': true}""#]
    pub any: serde_json::Value,

    secret: String,
}

pub struct S3 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub named: Option<Sub2>,
    pub other: Sub2,
}

/// nested object
pub struct Sub2 {
    pub name: Name,
}

pub struct Name(String);

pub struct Node {
    pub value: i32,
    pub children: Vec<Node>,
}
