//! Field tables mapping upstream records onto named endpoints

use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::models::{Endpoint, EndpointDataType, EndpointType, EndpointValue};

/// Upstream lookup a field is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Movement,
    Availability,
    Entrapment,
    ServiceOrder,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Movement => "movement",
            Source::Availability => "availability",
            Source::Entrapment => "entrapment",
            Source::ServiceOrder => "service order",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub name: &'static str,
    pub source: Source,
    /// JSON pointer into the source record
    pub pointer: &'static str,
    pub unit: &'static str,
    pub data_type: EndpointDataType,
    /// Substituted when the field is absent, null or an empty string
    pub fallback: Option<&'static str>,
}

const fn field(
    name: &'static str,
    source: Source,
    pointer: &'static str,
    unit: &'static str,
    data_type: EndpointDataType,
) -> FieldMapping {
    FieldMapping {
        name,
        source,
        pointer,
        unit,
        data_type,
        fallback: None,
    }
}

/// Fields re-read on every refresh
pub const LIVE_FIELDS: &[FieldMapping] = &[
    field("MovementEvent", Source::Movement, "/movementEventType", "", EndpointDataType::String),
    field("Distance", Source::Movement, "/distanceMeters", "m", EndpointDataType::Integer),
    field("Duration", Source::Movement, "/durationSeconds", "s", EndpointDataType::Duration),
    field("Estimated Persons", Source::Movement, "/decks/0/estimatedPersons", "", EndpointDataType::Integer),
    field("Load Percentage", Source::Movement, "/decks/0/loadPercentage", "%", EndpointDataType::Integer),
    field("Start Floor", Source::Movement, "/decks/0/startFloor/marking", "", EndpointDataType::String),
    field("Stop Floor", Source::Movement, "/decks/0/stopFloor/marking", "", EndpointDataType::String),
    field("State", Source::Availability, "/state", "", EndpointDataType::String),
    field("Previous State", Source::Availability, "/previousState", "", EndpointDataType::String),
    field("Active Alert Count", Source::Availability, "/activeAlertCount", "", EndpointDataType::Integer),
    field("Entrapment", Source::Entrapment, "/entrapment", "", EndpointDataType::Boolean),
];

/// Fields read once when the device is first built
pub const MAINTENANCE_FIELDS: &[FieldMapping] = &[
    FieldMapping {
        fallback: Some("No maintenance ongoing"),
        ..field("Maintenance Status", Source::Entrapment, "/maintenance/status", "", EndpointDataType::String)
    },
    field("Maintenance Description", Source::ServiceOrder, "/description", "", EndpointDataType::String),
    field("Maintenance Price", Source::ServiceOrder, "/invoices/0/costAmount", "EUR", EndpointDataType::Real),
];

impl FieldMapping {
    pub fn extract(&self, record: &Value) -> Result<EndpointValue> {
        let raw = record.pointer(self.pointer).filter(|v| !v.is_null());

        match (raw, self.fallback) {
            (Some(Value::String(s)), Some(fallback)) if s.is_empty() => {
                Ok(EndpointValue::Str(fallback.to_string()))
            }
            (Some(raw), _) => EndpointValue::from_json(self.data_type, raw).map_err(|e| {
                BridgeError::malformed(format!(
                    "{} field {}: {}",
                    self.source.as_str(),
                    self.pointer,
                    e
                ))
            }),
            (None, Some(fallback)) => Ok(EndpointValue::Str(fallback.to_string())),
            (None, None) => Err(BridgeError::malformed(format!(
                "{} record has no {}",
                self.source.as_str(),
                self.pointer
            ))),
        }
    }

    pub fn to_endpoint(&self, device_id: &str, record: &Value) -> Result<Endpoint> {
        Endpoint::new(
            format!("DEVICE-{} {}", device_id, self.name),
            self.name,
            self.extract(record)?,
            self.unit,
            self.data_type,
            EndpointType::Other,
        )
    }
}
