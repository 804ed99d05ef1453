//! DNS view, zone and host/alias record operations.
use crate::error::{ProteusError, Result};
use crate::proteus::client::Session;
use crate::proteus::properties::Properties;
use crate::proteus::types::{EntityId, RecordTarget, View, ViewSelector};
use serde_json::Value;
use tracing::{debug, info};

const DEFAULT_CONFIGURATION: &str = "default";

/// Apply the replacements in order, then split into (zones, host).
///
/// Zones come most-significant first: `host.sub.example.com` gives
/// `["com", "example", "sub"]` and `"host"`.
pub fn split_domain(domain: &str, replacements: &[(String, String)]) -> Result<(Vec<String>, String)> {
    let mut domain = domain.to_string();
    for (src, dst) in replacements {
        domain = domain.replace(src.as_str(), dst);
    }

    let mut labels: Vec<String> = domain
        .split('.')
        .filter(|label| !label.is_empty())
        .rev()
        .map(str::to_string)
        .collect();
    let host = labels
        .pop()
        .ok_or_else(|| ProteusError::validation(format!("'{domain}' contains no labels")))?;
    Ok((labels, host))
}

fn missing_zone(zones: &[String], index: usize) -> ProteusError {
    ProteusError::not_found(format!(
        "zone {} could not be found (missing '{}')",
        zones.join(" → "),
        zones[index]
    ))
}

impl Session {
    pub async fn resolve_configuration(&self) -> Result<EntityId> {
        self.get_entities_by_name(DEFAULT_CONFIGURATION, 0, "Configuration")
            .await?
            .first()
            .map(|entity| entity.id)
            .ok_or_else(|| {
                ProteusError::not_found(format!("configuration '{DEFAULT_CONFIGURATION}'"))
            })
    }

    /// Resolve the selected views, always `intern` before `extern`.
    pub async fn resolve_views(&self, selector: ViewSelector) -> Result<Vec<View>> {
        let conf_id = self.resolve_configuration().await?;

        let mut views = Vec::new();
        for name in selector.names() {
            let id = self
                .get_entities_by_name(name, conf_id, "View")
                .await?
                .first()
                .map(|entity| entity.id)
                .ok_or_else(|| ProteusError::not_found(format!("view '{name}'")))?;
            views.push(View {
                name: (*name).to_string(),
                id,
            });
        }
        Ok(views)
    }

    /// Walk the zones below `view`. `Err(index)` names the first zone that is missing.
    async fn walk_zones(
        &self,
        view: EntityId,
        zones: &[String],
    ) -> Result<std::result::Result<EntityId, usize>> {
        let mut parent = view;
        for (index, zone) in zones.iter().enumerate() {
            match self.get_entities_by_name(zone, parent, "Zone").await?.first() {
                Some(entity) => parent = entity.id,
                None => return Ok(Err(index)),
            }
        }
        Ok(Ok(parent))
    }

    /// Properties of the host or alias record for `domain`, empty if there is none.
    pub async fn get_record(&self, view: EntityId, domain: &str) -> Result<Properties> {
        let (zones, host) = split_domain(domain, self.client().replacements())?;

        let parent = match self.walk_zones(view, &zones).await? {
            Ok(parent) => parent,
            Err(index) => {
                debug!(zone = %zones[index], "zone lookup returned nothing");
                return Err(missing_zone(&zones, index));
            }
        };

        let mut records = self.get_entities_by_name(&host, parent, "HostRecord").await?;
        records.extend(self.get_entities_by_name(&host, parent, "AliasRecord").await?);

        Ok(records
            .first()
            .map(|record| record.decoded_properties())
            .unwrap_or_default())
    }

    /// Create a host or alias record. Existing records are not checked for.
    pub async fn set_record<S: AsRef<str>>(
        &self,
        view: EntityId,
        domain: &str,
        targets: &[S],
    ) -> Result<Value> {
        let target = RecordTarget::classify(targets)?;
        let (path, link) = match &target {
            RecordTarget::Host(addresses) => (
                "addHostRecord",
                (
                    "addresses",
                    addresses
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(","),
                ),
            ),
            RecordTarget::Alias(name) => ("addAliasRecord", ("linkedRecordName", name.clone())),
        };

        let params = [
            ("absoluteName", domain.to_string()),
            link,
            ("ttl", "-1".to_string()),
            ("viewId", view.to_string()),
        ];
        let result = self.post(path, &params).await?;
        info!(domain, view, record_type = target.record_type(), "record created");
        Ok(result)
    }

    /// Delete the host (or else alias) record for `domain`.
    ///
    /// A missing zone is not an error here, it just means there is nothing to delete.
    pub async fn delete_record(&self, view: EntityId, domain: &str) -> Result<Option<EntityId>> {
        let (zones, host) = split_domain(domain, self.client().replacements())?;

        let Ok(parent) = self.walk_zones(view, &zones).await? else {
            return Ok(None);
        };

        let mut records = self.get_entities_by_name(&host, parent, "HostRecord").await?;
        if records.is_empty() {
            records = self.get_entities_by_name(&host, parent, "AliasRecord").await?;
        }
        let Some(record) = records.first() else {
            return Ok(None);
        };

        self.delete_entity(record.id).await?;
        Ok(Some(record.id))
    }

    /// Names of the zones directly below `zone`.
    pub async fn list_zones(&self, view: EntityId, zone: &str) -> Result<Vec<String>> {
        let (mut zones, first) = split_domain(zone, self.client().replacements())?;
        zones.push(first);

        let parent = match self.walk_zones(view, &zones).await? {
            Ok(parent) => parent,
            Err(index) => return Err(missing_zone(&zones, index)),
        };

        Ok(self
            .get_entities(parent, "Zone")
            .await?
            .into_iter()
            .filter_map(|entity| entity.name)
            .collect())
    }
}
