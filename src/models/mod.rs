//! Data models for lift-telemetry-bridge
//!
//! A `Device` is one piece of equipment; its `children` are the typed
//! endpoints carrying the latest telemetry values.

use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{BridgeError, Result};

/// Device handle shared between the poller and in-flight refreshes
pub type SharedDevice = Arc<RwLock<Device>>;

// ============================================================================
// Endpoint Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndpointDataType {
    String,
    Integer,
    Real,
    Boolean,
    Duration,
}

impl EndpointDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointDataType::String => "String",
            EndpointDataType::Integer => "Integer",
            EndpointDataType::Real => "Real",
            EndpointDataType::Boolean => "Boolean",
            EndpointDataType::Duration => "Duration",
        }
    }
}

/// Semantic tag of an endpoint. Elevator fields carry no finer category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndpointType {
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EndpointValue {
    Str(String),
    Int(i64),
    Real(f64),
    Bool(bool),
    Duration(#[serde(serialize_with = "serialize_secs")] Duration),
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl EndpointValue {
    pub fn data_type(&self) -> EndpointDataType {
        match self {
            EndpointValue::Str(_) => EndpointDataType::String,
            EndpointValue::Int(_) => EndpointDataType::Integer,
            EndpointValue::Real(_) => EndpointDataType::Real,
            EndpointValue::Bool(_) => EndpointDataType::Boolean,
            EndpointValue::Duration(_) => EndpointDataType::Duration,
        }
    }

    /// Convert a raw JSON value into the variant named by `data_type`.
    ///
    /// Integers accept whole-valued floats (`12.0`), durations are seconds.
    pub fn from_json(data_type: EndpointDataType, raw: &Value) -> Result<Self> {
        let converted = match data_type {
            EndpointDataType::String => raw.as_str().map(|s| EndpointValue::Str(s.to_string())),
            EndpointDataType::Integer => raw
                .as_i64()
                .or_else(|| raw.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(EndpointValue::Int),
            EndpointDataType::Real => raw.as_f64().map(EndpointValue::Real),
            EndpointDataType::Boolean => raw.as_bool().map(EndpointValue::Bool),
            EndpointDataType::Duration => raw
                .as_f64()
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(|secs| EndpointValue::Duration(Duration::from_secs_f64(secs))),
        };

        converted.ok_or_else(|| {
            BridgeError::malformed(format!("expected {}, got {}", data_type.as_str(), raw))
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    pub id: String,
    pub name: String,
    pub current_value: EndpointValue,
    pub unit: String,
    pub data_type: EndpointDataType,
    pub endpoint_type: EndpointType,
}

impl Endpoint {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        current_value: EndpointValue,
        unit: impl Into<String>,
        data_type: EndpointDataType,
        endpoint_type: EndpointType,
    ) -> Result<Self> {
        let name = name.into();
        check_type(&name, data_type, &current_value)?;

        Ok(Self {
            id: id.into(),
            name,
            current_value,
            unit: unit.into(),
            data_type,
            endpoint_type,
        })
    }

    /// Check that `value` matches the declared data type without storing it
    pub fn accepts(&self, value: &EndpointValue) -> Result<()> {
        check_type(&self.name, self.data_type, value)
    }

    /// Replace the current value; the data type of an endpoint never changes
    pub fn set_value(&mut self, value: EndpointValue) -> Result<()> {
        self.accepts(&value)?;
        self.current_value = value;
        Ok(())
    }
}

fn check_type(name: &str, expected: EndpointDataType, value: &EndpointValue) -> Result<()> {
    if value.data_type() != expected {
        return Err(BridgeError::malformed(format!(
            "endpoint '{}' declared {} but value is {}",
            name,
            expected.as_str(),
            value.data_type().as_str()
        )));
    }
    Ok(())
}

// ============================================================================
// Device Models
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub children: Vec<Endpoint>,
}

impl Device {
    /// Device with identity only, no endpoints
    pub fn shell(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            device_type: "device".to_string(),
            children: Vec::new(),
        }
    }

    pub fn is_shell(&self) -> bool {
        self.children.is_empty()
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.children.iter().find(|e| e.name == name)
    }

    pub fn endpoint_mut(&mut self, name: &str) -> Option<&mut Endpoint> {
        self.children.iter_mut().find(|e| e.name == name)
    }

    pub fn into_shared(self) -> SharedDevice {
        Arc::new(RwLock::new(self))
    }
}
