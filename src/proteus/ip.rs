//! IPv4/IPv6 address reservations.
use crate::error::{ProteusError, Result};
use crate::proteus::client::{Session, decode};
use crate::proteus::properties::{Properties, encode_properties};
use crate::proteus::types::{
    ApiEntity, EntityId, EntityRecord, ReservationStatus, ViewSelector, host_info,
};
use serde_json::Value;
use std::net::{IpAddr, Ipv6Addr};
use tracing::{info, warn};

/// Everything needed to assign one address.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub address: IpAddr,
    pub status: ReservationStatus,
    pub mac: String,
    pub properties: Properties,
    /// Together with `view`, creates DNS records for the address.
    pub hostname: Option<String>,
    pub view: Option<ViewSelector>,
}

impl Reservation {
    /// The same reservation for the IPv6 address paired with this one.
    /// Fails for statuses IPv6 does not support.
    pub fn paired_v6(&self, address: Ipv6Addr) -> Result<Reservation> {
        check_ipv6_status(self.status)?;
        Ok(Reservation {
            address: IpAddr::V6(address),
            ..self.clone()
        })
    }

    fn host_binding(&self) -> Option<(&str, ViewSelector)> {
        match (&self.hostname, self.view) {
            (Some(hostname), Some(view)) => Some((hostname.as_str(), view)),
            _ => None,
        }
    }
}

fn check_ipv6_status(status: ReservationStatus) -> Result<()> {
    match status {
        ReservationStatus::Reserved => Err(ProteusError::validation(format!(
            "status {status} is not available for IPv6"
        ))),
        _ => Ok(()),
    }
}

fn network_type(address: IpAddr) -> &'static str {
    match address {
        IpAddr::V4(_) => "IP4Network",
        IpAddr::V6(_) => "IP6Network",
    }
}

impl Session {
    /// Id of the network holding `address` under the configuration `conf_id`.
    pub async fn resolve_container(&self, address: IpAddr, conf_id: EntityId) -> Result<EntityId> {
        let params = [
            ("address", address.to_string()),
            ("containerId", conf_id.to_string()),
            ("type", network_type(address).to_string()),
        ];
        let body = self.get("getIPRangedByIP", &params).await?;
        let network: Option<ApiEntity> = decode("getIPRangedByIP", body)?;
        match network {
            Some(network) if network.id != 0 => Ok(network.id),
            _ => Err(ProteusError::not_found(format!("no network contains {address}"))),
        }
    }

    pub async fn get_address(&self, address: IpAddr, container_id: EntityId) -> Result<EntityRecord> {
        let path = match address {
            IpAddr::V4(_) => "getIP4Address",
            IpAddr::V6(_) => "getIP6Address",
        };
        let params = [
            ("address", address.to_string()),
            ("containerId", container_id.to_string()),
        ];
        let body = self.get(path, &params).await?;
        let entity: Option<ApiEntity> = decode(path, body)?;
        match entity {
            Some(entity) if entity.id != 0 => Ok(entity.into()),
            _ => Err(ProteusError::not_found(format!("address {address}"))),
        }
    }

    /// Reserve an IPv4 address. With a hostname and view, forward records are created per view.
    pub async fn assign_ipv4(&self, conf_id: EntityId, reservation: &Reservation) -> Result<Value> {
        if !reservation.address.is_ipv4() {
            return Err(ProteusError::Type(format!(
                "{} is not an IPv4 address",
                reservation.address
            )));
        }

        let mut params = vec![
            ("action", reservation.status.action()),
            ("configurationId", conf_id.to_string()),
            ("ip4Address", reservation.address.to_string()),
            ("macAddress", reservation.mac.clone()),
            ("properties", encode_properties(&reservation.properties, &[])),
        ];

        if let Some((hostname, selector)) = reservation.host_binding() {
            let entries = self
                .resolve_views(selector)
                .await?
                .iter()
                .map(|view| host_info(hostname, view.id, false))
                .collect::<Vec<_>>();
            params.push(("hostInfo", entries.join(",")));
        }

        let result = self.post("assignIP4Address", &params).await?;
        info!(address = %reservation.address, status = %reservation.status, "IPv4 address assigned");
        Ok(result)
    }

    /// Create, then assign, an IPv6 address.
    ///
    /// With a hostname and view the assign step runs once per view, creating the
    /// reverse record each time. One result per assign call.
    pub async fn assign_ipv6(&self, container_id: EntityId, reservation: &Reservation) -> Result<Vec<Value>> {
        check_ipv6_status(reservation.status)?;
        let IpAddr::V6(address) = reservation.address else {
            return Err(ProteusError::Type(format!(
                "{} is not an IPv6 address",
                reservation.address
            )));
        };

        let mut create = vec![
            ("containerId", container_id.to_string()),
            ("address", address.to_string()),
            ("type", "IP6Address".to_string()),
            ("properties", encode_properties(&reservation.properties, &["name"])),
        ];
        if let Some(name) = reservation.properties.get("name").filter(|n| !n.is_empty()) {
            create.push(("name", name.clone()));
        }
        self.post("addIP6Address", &create).await?;

        let mut properties = encode_properties(&reservation.properties, &["name"]);
        if !properties.is_empty() {
            properties.push('|');
        }
        properties.push_str("reserveUsing=MAC_ADDRESS");

        let base = [
            ("containerId", container_id.to_string()),
            ("address", address.to_string()),
            ("action", reservation.status.action()),
            ("macAddress", reservation.mac.clone()),
            ("properties", properties),
        ];

        let host_infos: Vec<Option<String>> = match reservation.host_binding() {
            Some((hostname, selector)) => self
                .resolve_views(selector)
                .await?
                .iter()
                .map(|view| Some(host_info(hostname, view.id, true)))
                .collect(),
            None => vec![None],
        };

        let mut results = Vec::with_capacity(host_infos.len());
        for entry in host_infos {
            let mut params = base.to_vec();
            if let Some(entry) = entry {
                params.push(("hostInfo", entry));
            }
            results.push(self.post("assignIP6Address", &params).await?);
        }
        info!(%address, status = %reservation.status, calls = results.len(), "IPv6 address assigned");
        Ok(results)
    }

    /// Assign `reservation` in the network holding its address.
    ///
    /// An address that is already reserved is an error unless `force` is set,
    /// in which case the old reservation is deleted before assigning again.
    pub async fn reserve(&self, conf_id: EntityId, reservation: &Reservation, force: bool) -> Result<Value> {
        let address = reservation.address;
        let container = self.resolve_container(address, conf_id).await?;

        match self.get_address(address, container).await {
            Ok(existing) if force => {
                warn!(%address, id = existing.id, "replacing existing reservation");
                self.delete_entity(existing.id).await?;
            }
            Ok(existing) => {
                return Err(ProteusError::validation(format!(
                    "{address} is already reserved (id {})",
                    existing.id
                )));
            }
            Err(ProteusError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }

        match address {
            IpAddr::V4(_) => self.assign_ipv4(conf_id, reservation).await,
            IpAddr::V6(_) => Ok(Value::from(self.assign_ipv6(container, reservation).await?)),
        }
    }

    /// Look the address up and delete it. Fails if it is not reserved.
    pub async fn delete_address(&self, address: IpAddr, container_id: EntityId) -> Result<EntityId> {
        let record = self.get_address(address, container_id).await?;
        self.delete_entity(record.id).await?;
        Ok(record.id)
    }
}
