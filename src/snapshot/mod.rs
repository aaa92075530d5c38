//! Device snapshot assembly
//!
//! - `mapping`: fixed field tables (endpoint name -> upstream field)
//!
//! `SnapshotBuilder` turns a device identifier into a `Device` by issuing the
//! movement, availability and entrapment lookups one after the other. A
//! device lacking movement or availability data becomes a shell with no
//! endpoints. Maintenance data is read only on the first build; refreshes
//! update the live fields and leave maintenance endpoints as they were.

pub mod mapping;

use std::sync::Arc;

use serde_json::{json, Value};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{BridgeError, Result};
use crate::models::{Device, EndpointValue, SharedDevice};
use crate::upstream::Fetcher;

use self::mapping::{Source, LIVE_FIELDS, MAINTENANCE_FIELDS};

/// Namespace the upstream expects in front of equipment ids
const EQUIPMENT_PREFIX: &str = "ken:";

static NO_RECORD: Value = Value::Null;

pub fn equipment_key(device_id: &str) -> String {
    format!("{}{}", EQUIPMENT_PREFIX, device_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Movement or availability had no record; nothing was touched
    Skipped,
    /// Number of endpoints whose value was rewritten
    Updated(usize),
}

/// Records returned by the per-refresh lookups
struct LiveRecords {
    movement: Value,
    availability: Value,
    entrapment: Value,
}

impl LiveRecords {
    fn record(&self, source: Source) -> &Value {
        match source {
            Source::Movement => &self.movement,
            Source::Availability => &self.availability,
            Source::Entrapment => &self.entrapment,
            Source::ServiceOrder => &NO_RECORD,
        }
    }
}

struct ApiUrls {
    base: Url,
    resources: Url,
    movement: Url,
    availability: Url,
    entrapment: Url,
    service_order_path: String,
    service_order_id: String,
}

impl ApiUrls {
    fn from_config(api: &ApiConfig) -> Result<Self> {
        let base = Url::parse(&api.base_url)?;
        Ok(Self {
            resources: base.join(&api.resources_path)?,
            movement: base.join(&api.movement_path)?,
            availability: base.join(&api.availability_path)?,
            entrapment: base.join(&api.entrapment_path)?,
            service_order_path: api.service_order_path.clone(),
            service_order_id: api.service_order_id.clone(),
            base,
        })
    }

    fn service_order(&self, device_id: &str) -> Result<Url> {
        let path = self
            .service_order_path
            .replace("{equipment}", &equipment_key(device_id))
            .replace("{service_order}", &self.service_order_id);
        Ok(self.base.join(&path)?)
    }
}

pub struct SnapshotBuilder {
    fetcher: Arc<dyn Fetcher>,
    urls: ApiUrls,
}

impl SnapshotBuilder {
    pub fn new(fetcher: Arc<dyn Fetcher>, api: &ApiConfig) -> Result<Self> {
        Ok(Self {
            fetcher,
            urls: ApiUrls::from_config(api)?,
        })
    }

    /// Identifiers of every device visible to the application credentials
    pub async fn list_device_ids(&self) -> Result<Vec<String>> {
        let body = self.fetcher.get(self.urls.resources.as_str()).await?;

        let equipments = body
            .get("equipments")
            .and_then(Value::as_array)
            .ok_or_else(|| BridgeError::malformed("resources response has no equipments array"))?;

        equipments
            .iter()
            .map(|equipment| match equipment.get("id") {
                Some(Value::String(id)) => Ok(id.clone()),
                Some(Value::Number(id)) => Ok(id.to_string()),
                _ => Err(BridgeError::malformed(format!(
                    "equipment without usable id: {}",
                    equipment
                ))),
            })
            .collect()
    }

    /// Build the full endpoint tree for a device, or a shell when the
    /// upstream has no movement/availability record for it.
    pub async fn build_snapshot(&self, device_id: &str) -> Result<Device> {
        let Some(live) = self.fetch_live(device_id).await? else {
            tracing::debug!("[Snapshot] Device {} has no live data, keeping shell", device_id);
            return Ok(Device::shell(device_id));
        };

        let service_order_url = self.urls.service_order(device_id)?;
        let service_order = self.fetcher.get(service_order_url.as_str()).await?;

        let mut device = Device::shell(device_id);
        for field in LIVE_FIELDS {
            device
                .children
                .push(field.to_endpoint(device_id, live.record(field.source))?);
        }
        for field in MAINTENANCE_FIELDS {
            let record = match field.source {
                Source::ServiceOrder => &service_order,
                source => live.record(source),
            };
            device.children.push(field.to_endpoint(device_id, record)?);
        }

        tracing::debug!(
            "[Snapshot] Device {} built with {} endpoints",
            device_id,
            device.children.len()
        );
        Ok(device)
    }

    /// Re-read the live fields of an existing device and write them in place.
    ///
    /// Every value is extracted and type-checked before the first write, so a
    /// failure leaves all previous values intact.
    pub async fn refresh_snapshot(&self, device: &SharedDevice) -> Result<RefreshOutcome> {
        let device_id = device.read().await.id.clone();

        let Some(live) = self.fetch_live(&device_id).await? else {
            return Ok(RefreshOutcome::Skipped);
        };

        let values = LIVE_FIELDS
            .iter()
            .map(|field| -> Result<(&'static str, EndpointValue)> {
                Ok((field.name, field.extract(live.record(field.source))?))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut device = device.write().await;
        for (name, value) in &values {
            if let Some(endpoint) = device.endpoint(name) {
                endpoint.accepts(value)?;
            }
        }

        let mut updated = 0;
        for (name, value) in values {
            if let Some(endpoint) = device.endpoint_mut(name) {
                endpoint.set_value(value)?;
                updated += 1;
            }
        }

        Ok(RefreshOutcome::Updated(updated))
    }

    async fn fetch_live(&self, device_id: &str) -> Result<Option<LiveRecords>> {
        let movement = self.search(&self.urls.movement, device_id).await?;
        let availability = self.search(&self.urls.availability, device_id).await?;

        let (Some(movement), Some(availability)) = (movement, availability) else {
            return Ok(None);
        };

        let entrapment = self
            .search(&self.urls.entrapment, device_id)
            .await?
            .ok_or_else(|| {
                BridgeError::malformed(format!("no entrapment record for device {}", device_id))
            })?;

        Ok(Some(LiveRecords {
            movement,
            availability,
            entrapment,
        }))
    }

    /// First record of a search lookup, `None` when the upstream has none
    async fn search(&self, url: &Url, device_id: &str) -> Result<Option<Value>> {
        let body = json!({ "equipmentIds": [equipment_key(device_id)] });
        let response = self.fetcher.post(url.as_str(), &body).await?;

        match response {
            Value::Array(mut records) => {
                if records.is_empty() {
                    return Ok(None);
                }
                Ok(Some(records.swap_remove(0)).filter(|r| !r.is_null()))
            }
            Value::Null => Ok(None),
            other => Err(BridgeError::malformed(format!(
                "{} returned {} instead of an array",
                url.path(),
                type_name(&other)
            ))),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
