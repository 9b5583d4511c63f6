//! publish::request
//!
//! Typed Save/Publish requests, validated before any I/O.
//!
//! Bodies arrive as loosely typed JSON. They are parsed into a
//! [`ContentRequest`] up front: required fields must be present with the
//! right type, unknown fields are rejected, and the slug is normalized. A
//! request that fails here never reaches the content store.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::errors::PublishError;
use crate::core::types::{Channel, Slug};

/// Which workflow a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Save,
    Publish,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "save" => Some(Action::Save),
            "publish" => Some(Action::Publish),
            _ => None,
        }
    }
}

/// A validated save request.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub slug: Slug,
    pub channel: Channel,
    /// Config document, written only when supplied
    pub config: Option<Value>,
    /// Missions document, written only when supplied
    pub missions: Option<Value>,
}

/// A validated publish request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub slug: Slug,
}

/// A validated request for either workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentRequest {
    Save(SaveRequest),
    Publish(PublishRequest),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSave {
    slug: Option<Value>,
    config: Option<Value>,
    missions: Option<Value>,
    channel: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPublish {
    slug: Option<Value>,
}

impl ContentRequest {
    /// Parse a body for a known action.
    pub fn parse(action: Action, body: Value) -> Result<Self, PublishError> {
        match action {
            Action::Save => SaveRequest::from_json(body).map(ContentRequest::Save),
            Action::Publish => PublishRequest::from_json(body).map(ContentRequest::Publish),
        }
    }

    /// Parse a body that names its own action in an `action` field.
    pub fn from_tagged(body: Value) -> Result<Self, PublishError> {
        let mut map = into_object(body)?;
        let action = match map.remove("action") {
            Some(Value::String(s)) => Action::parse(&s)
                .ok_or_else(|| PublishError::Validation(format!("unknown action '{}'", s)))?,
            Some(_) => return Err(PublishError::Validation("action must be a string".into())),
            None => return Err(PublishError::Validation("action is required".into())),
        };
        Self::parse(action, Value::Object(map))
    }

    pub fn slug(&self) -> &Slug {
        match self {
            ContentRequest::Save(r) => &r.slug,
            ContentRequest::Publish(r) => &r.slug,
        }
    }
}

impl SaveRequest {
    pub fn from_json(body: Value) -> Result<Self, PublishError> {
        let raw: RawSave = deserialize(body)?;
        let slug = parse_slug(raw.slug)?;
        let channel = match raw.channel.as_deref() {
            None => Channel::default(),
            Some(s) => Channel::parse(s)
                .ok_or_else(|| PublishError::Validation(format!("unknown channel '{}'", s)))?,
        };

        if raw.config.is_none() && raw.missions.is_none() {
            return Err(PublishError::Validation(
                "at least one of config or missions is required".into(),
            ));
        }

        Ok(Self {
            slug,
            channel,
            config: raw.config,
            missions: raw.missions,
        })
    }
}

impl PublishRequest {
    pub fn from_json(body: Value) -> Result<Self, PublishError> {
        let raw: RawPublish = deserialize(body)?;
        Ok(Self {
            slug: parse_slug(raw.slug)?,
        })
    }
}

fn into_object(body: Value) -> Result<Map<String, Value>, PublishError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(PublishError::Validation(
            "request body must be a JSON object".into(),
        )),
    }
}

fn deserialize<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, PublishError> {
    let map = into_object(body)?;
    serde_json::from_value(Value::Object(map)).map_err(|e| PublishError::Validation(e.to_string()))
}

/// An absent slug is an error; an empty string is the legacy root.
fn parse_slug(raw: Option<Value>) -> Result<Slug, PublishError> {
    match raw {
        None | Some(Value::Null) => Err(PublishError::Validation("slug is required".into())),
        Some(Value::String(s)) => Slug::new(&s).map_err(|e| PublishError::Validation(e.to_string())),
        Some(_) => Err(PublishError::Validation("slug must be a string".into())),
    }
}
