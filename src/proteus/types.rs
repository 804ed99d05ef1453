use crate::error::{ProteusError, Result};
use crate::proteus::properties::{Properties, decode_properties};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Server-assigned object id.
pub type EntityId = i64;

/// APIEntity as returned by `getEntitiesByName`, `getIPRangedByIP`, `getIP4Address`, ...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEntity {
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub entity_type: Option<String>, // "HostRecord", "IP4Address", ...
    #[serde(default)]
    pub properties: Option<String>, // "addresses=192.0.2.1|ttl=-1|"
}

impl ApiEntity {
    pub fn decoded_properties(&self) -> Properties {
        self.properties
            .as_deref()
            .map(decode_properties)
            .unwrap_or_default()
    }
}

/// Entity with its property string already decoded; what the CLI prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub properties: Properties,
}

impl From<ApiEntity> for EntityRecord {
    fn from(entity: ApiEntity) -> Self {
        let properties = entity.decoded_properties();
        EntityRecord {
            id: entity.id,
            name: entity.name,
            entity_type: entity.entity_type,
            properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub name: String,
    pub id: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewSelector {
    All,
    Intern,
    Extern,
}

impl ViewSelector {
    /// View names in the order they are processed.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            ViewSelector::All => &["intern", "extern"],
            ViewSelector::Intern => &["intern"],
            ViewSelector::Extern => &["extern"],
        }
    }
}

impl FromStr for ViewSelector {
    type Err = ProteusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ViewSelector::All),
            "intern" => Ok(ViewSelector::Intern),
            "extern" => Ok(ViewSelector::Extern),
            other => Err(ProteusError::validation(format!(
                "unknown view '{other}' (expected all, intern or extern)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    Static,
    /// IPv4 only.
    Reserved,
    DhcpReserved,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Static => "STATIC",
            ReservationStatus::Reserved => "RESERVED",
            ReservationStatus::DhcpReserved => "DHCP_RESERVED",
        }
    }

    /// Value of the `action` parameter for the assign calls.
    pub fn action(self) -> String {
        format!("MAKE_{}", self.as_str())
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ProteusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "STATIC" => Ok(ReservationStatus::Static),
            "RESERVED" => Ok(ReservationStatus::Reserved),
            "DHCP_RESERVED" => Ok(ReservationStatus::DhcpReserved),
            other => Err(ProteusError::validation(format!("invalid status: {other}"))),
        }
    }
}

/// What a DNS name should point at, derived from the given targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordTarget {
    Host(Vec<IpAddr>),
    Alias(String),
}

impl RecordTarget {
    /// All IP literals make a host record, a single name makes an alias.
    pub fn classify<S: AsRef<str>>(targets: &[S]) -> Result<Self> {
        if targets.is_empty() {
            return Err(ProteusError::InvalidTarget("no target given".into()));
        }

        let parsed: Vec<Option<IpAddr>> = targets
            .iter()
            .map(|t| t.as_ref().trim().parse::<IpAddr>().ok())
            .collect();

        if parsed.iter().all(Option::is_some) {
            return Ok(RecordTarget::Host(parsed.into_iter().flatten().collect()));
        }

        match targets {
            [single] => Ok(RecordTarget::Alias(single.as_ref().trim().to_string())),
            _ => Err(ProteusError::InvalidTarget(format!(
                "cannot mix addresses and names or use several names: {}",
                targets
                    .iter()
                    .map(|t| t.as_ref())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    pub fn record_type(&self) -> &'static str {
        match self {
            RecordTarget::Host(_) => "HostRecord",
            RecordTarget::Alias(_) => "AliasRecord",
        }
    }
}

/// One `hostInfo` entry: `fqdn,viewId,reverseFlag,sameAsZoneFlag`.
pub fn host_info(hostname: &str, view: EntityId, reverse: bool) -> String {
    format!("{hostname},{view},{reverse},false")
}
