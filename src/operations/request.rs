use std::collections::HashMap;

use crate::access::AccessLevel;
use crate::entity::sensor_nodes::SensorStatus;
use crate::error::{AppError, AppResult};
use crate::integrity::{normalize_ip, validate_floor, validate_ip};

/// Raw operation request: the `type` tag and every other submitted field.
#[derive(Debug, Clone, Default)]
pub struct OperationRequest {
    pub kind: String,
    pub fields: HashMap<String, String>,
}

impl OperationRequest {
    pub fn new<K, V>(kind: impl Into<String>, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind: kind.into(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Split a submitted form into its `type` tag and the remaining fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingField("type")` when no tag was submitted.
    pub fn from_form(mut form: HashMap<String, String>) -> AppResult<Self> {
        let kind = form
            .remove("type")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(AppError::MissingField("type"))?;
        Ok(Self { kind, fields: form })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    AddBuilding,
    EditBuilding,
    RemoveBuilding,
    AddCluster,
    EditCluster,
    RemoveCluster,
    AddSensor,
    EditSensor,
    RemoveSensor,
    GetCluster,
    GetSensor,
}

impl OperationKind {
    /// `None` for tags this service does not know.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        Some(match tag {
            "add_building" => Self::AddBuilding,
            "edit_building" => Self::EditBuilding,
            "remove_building" => Self::RemoveBuilding,
            "add_cluster" => Self::AddCluster,
            "edit_cluster" => Self::EditCluster,
            "remove_cluster" => Self::RemoveCluster,
            "add_sensor" => Self::AddSensor,
            "edit_sensor" => Self::EditSensor,
            "remove_sensor" => Self::RemoveSensor,
            "get_cluster" => Self::GetCluster,
            "get_sensor" => Self::GetSensor,
            _ => return None,
        })
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AddBuilding => "add_building",
            Self::EditBuilding => "edit_building",
            Self::RemoveBuilding => "remove_building",
            Self::AddCluster => "add_cluster",
            Self::EditCluster => "edit_cluster",
            Self::RemoveCluster => "remove_cluster",
            Self::AddSensor => "add_sensor",
            Self::EditSensor => "edit_sensor",
            Self::RemoveSensor => "remove_sensor",
            Self::GetCluster => "get_cluster",
            Self::GetSensor => "get_sensor",
        }
    }

    #[must_use]
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::GetCluster | Self::GetSensor)
    }

    #[must_use]
    pub fn required_access(self) -> AccessLevel {
        if self.is_mutation() {
            AccessLevel::ReadWrite
        } else {
            AccessLevel::Read
        }
    }
}

/// Locates one cluster by its natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterKey {
    pub building_id: i32,
    pub floor: i32,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddBuilding {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub floors: Option<i32>,
    pub owner: Option<String>,
    pub comment: Option<String>,
}

impl AddBuilding {
    /// Single-line postal address handed to the geocoder.
    #[must_use]
    pub fn full_address(&self) -> String {
        [&self.address, &self.city, &self.state, &self.zip]
            .map(String::as_str)
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditBuilding {
    pub building_id: i32,
    pub new_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub floors: Option<i32>,
    pub owner: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddCluster {
    pub building_id: i32,
    pub floor: i32,
    pub ip: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditCluster {
    pub key: ClusterKey,
    pub new_building_id: Option<i32>,
    pub new_floor: Option<i32>,
    pub new_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddSensor {
    pub building_id: i32,
    pub cluster_ip: String,
    pub sensor_ip: String,
    pub status: SensorStatus,
    pub room: Option<String>,
    pub sensor_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSensor {
    pub cluster: ClusterKey,
    pub new_building_id: Option<i32>,
    pub new_floor: Option<i32>,
    pub new_cluster_ip: Option<String>,
    pub new_sensor_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveSensor {
    pub cluster: ClusterKey,
    pub sensor_ip: String,
}

/// A fully parsed request; every required field is present and typed.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    AddBuilding(AddBuilding),
    EditBuilding(EditBuilding),
    RemoveBuilding { building_id: i32 },
    AddCluster(AddCluster),
    EditCluster(EditCluster),
    RemoveCluster(ClusterKey),
    AddSensor(AddSensor),
    EditSensor(EditSensor),
    RemoveSensor(RemoveSensor),
    GetCluster { building_id: i32 },
    GetSensor { cluster_id: i32 },
}

impl Operation {
    /// Check presence and shape of every field `kind` needs.
    ///
    /// # Errors
    ///
    /// `MissingField` for an absent or empty required field, `InvalidField`
    /// for a value that does not parse or is out of range.
    pub fn parse(kind: OperationKind, fields: &HashMap<String, String>) -> AppResult<Self> {
        let f = Fields(fields);

        Ok(match kind {
            OperationKind::AddBuilding => Self::AddBuilding(AddBuilding {
                name: f.required("building_name")?.to_string(),
                address: f.required("address")?.to_string(),
                city: f.required("city")?.to_string(),
                state: f.required("state")?.to_string(),
                zip: f.required("zip")?.to_string(),
                floors: f.optional_count("floors")?,
                owner: f.optional_string("owner"),
                comment: f.optional_string("comment"),
            }),
            OperationKind::EditBuilding => Self::EditBuilding(EditBuilding {
                building_id: f.required_id("building_id")?,
                new_name: f.optional_string("new_name"),
                address: f.optional_string("address"),
                city: f.optional_string("city"),
                state: f.optional_string("state"),
                zip: f.optional_string("zip"),
                floors: f.optional_count("floors")?,
                owner: f.optional_string("owner"),
                comment: f.optional_string("comment"),
            }),
            OperationKind::RemoveBuilding => Self::RemoveBuilding {
                building_id: f.required_id("building_id")?,
            },
            OperationKind::AddCluster => Self::AddCluster(AddCluster {
                building_id: f.required_id("building_id")?,
                floor: validate_floor("floor", f.required_int("floor")?)?,
                ip: validate_ip("ip", f.required("ip")?)?,
                comment: f.optional_string("comment"),
            }),
            OperationKind::EditCluster => Self::EditCluster(EditCluster {
                key: f.cluster_key("ip")?,
                new_building_id: f.optional_int("new_building_id")?,
                new_floor: f
                    .optional_int("new_floor")?
                    .map(|floor| validate_floor("new_floor", floor))
                    .transpose()?,
                new_ip: f
                    .optional("new_ip")
                    .map(|ip| validate_ip("new_ip", ip))
                    .transpose()?,
            }),
            OperationKind::RemoveCluster => Self::RemoveCluster(f.cluster_key("ip")?),
            OperationKind::AddSensor => Self::AddSensor(AddSensor {
                building_id: f.required_id("building_id")?,
                cluster_ip: normalize_ip(f.required("cluster_ip")?),
                sensor_ip: validate_ip("sensor_ip", f.required("sensor_ip")?)?,
                status: f.required_status("status")?,
                room: f.optional_string("room"),
                sensor_type: f.optional_string("type"),
            }),
            OperationKind::EditSensor => Self::EditSensor(EditSensor {
                cluster: f.cluster_key("ip")?,
                new_building_id: f.optional_int("new_building_id")?,
                new_floor: f.optional_int("new_floor")?,
                new_cluster_ip: f.optional("new_cluster_ip").map(normalize_ip),
                new_sensor_ip: f
                    .optional("new_sensor_ip")
                    .map(|ip| validate_ip("new_sensor_ip", ip))
                    .transpose()?,
            }),
            OperationKind::RemoveSensor => Self::RemoveSensor(RemoveSensor {
                cluster: f.cluster_key("cluster_ip")?,
                sensor_ip: normalize_ip(f.required("sensor_ip")?),
            }),
            OperationKind::GetCluster => Self::GetCluster {
                building_id: f.required_id("building_id")?,
            },
            OperationKind::GetSensor => Self::GetSensor {
                cluster_id: f.required_id("cluster_id")?,
            },
        })
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::AddBuilding(_) => OperationKind::AddBuilding,
            Self::EditBuilding(_) => OperationKind::EditBuilding,
            Self::RemoveBuilding { .. } => OperationKind::RemoveBuilding,
            Self::AddCluster(_) => OperationKind::AddCluster,
            Self::EditCluster(_) => OperationKind::EditCluster,
            Self::RemoveCluster(_) => OperationKind::RemoveCluster,
            Self::AddSensor(_) => OperationKind::AddSensor,
            Self::EditSensor(_) => OperationKind::EditSensor,
            Self::RemoveSensor(_) => OperationKind::RemoveSensor,
            Self::GetCluster { .. } => OperationKind::GetCluster,
            Self::GetSensor { .. } => OperationKind::GetSensor,
        }
    }
}

/// Typed accessors over submitted form fields. Blank values count as absent.
struct Fields<'a>(&'a HashMap<String, String>);

impl Fields<'_> {
    fn optional(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn optional_string(&self, name: &str) -> Option<String> {
        self.optional(name).map(str::to_string)
    }

    fn required(&self, name: &'static str) -> AppResult<&str> {
        self.optional(name).ok_or(AppError::MissingField(name))
    }

    fn required_int(&self, name: &'static str) -> AppResult<i32> {
        parse_int(name, self.required(name)?)
    }

    fn optional_int(&self, name: &'static str) -> AppResult<Option<i32>> {
        self.optional(name).map(|v| parse_int(name, v)).transpose()
    }

    fn required_id(&self, name: &'static str) -> AppResult<i32> {
        let id = self.required_int(name)?;
        if id <= 0 {
            return Err(AppError::invalid(name, format!("ids are positive, got {id}")));
        }
        Ok(id)
    }

    fn optional_count(&self, name: &'static str) -> AppResult<Option<i32>> {
        match self.optional_int(name)? {
            Some(n) if n < 0 => Err(AppError::invalid(name, format!("must be >= 0, got {n}"))),
            other => Ok(other),
        }
    }

    fn required_status(&self, name: &'static str) -> AppResult<SensorStatus> {
        let raw = self.required(name)?;
        raw.parse().map_err(|()| {
            AppError::invalid(name, format!("expected ON, OFF or unknown, got '{raw}'"))
        })
    }

    fn cluster_key(&self, ip_field: &'static str) -> AppResult<ClusterKey> {
        Ok(ClusterKey {
            building_id: self.required_id("building_id")?,
            floor: self.required_int("floor")?,
            ip: normalize_ip(self.required(ip_field)?),
        })
    }
}

fn parse_int(name: &'static str, raw: &str) -> AppResult<i32> {
    raw.parse()
        .map_err(|_| AppError::invalid(name, format!("expected an integer, got '{raw}'")))
}
