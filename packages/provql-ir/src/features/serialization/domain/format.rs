use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Cbor,
    Json,
    Packed,
    /// One-way, metadata-lossy
    Sql,
}

impl Format {
    pub const ALL: [Format; 4] = [Self::Cbor, Self::Json, Self::Packed, Self::Sql];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cbor => "cbor",
            Self::Json => "json",
            Self::Packed => "packed",
            Self::Sql => "sql",
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Cbor | Self::Packed)
    }

    pub fn is_decodable(&self) -> bool {
        !matches!(self, Self::Sql)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cbor" => Ok(Self::Cbor),
            "json" => Ok(Self::Json),
            "packed" => Ok(Self::Packed),
            "sql" => Ok(Self::Sql),
            _ => Err(format!(
                "unknown format '{}' (expected cbor, json, packed or sql)",
                s
            )),
        }
    }
}
