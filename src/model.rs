use chrono::{SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Record is the document stored for each QR code.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Record {
    pub code: String, // the user-chosen "abc" part of "/q/abc"
    pub url: String,  // where a scan is sent
    #[serde(rename = "password")]
    pub password_hash: String, // hex digest, see crate::hash
    #[serde(with = "iso_naive")]
    pub created: chrono::DateTime<Utc>,
    pub scans: i64, // number of successful redirects
}

impl Record {
    /// A fresh record with no scans, created now.
    pub fn new(code: &str, url: &str, password_hash: String) -> Self {
        Self {
            code: code.to_string(),
            url: url.to_string(),
            password_hash,
            created: Utc::now().trunc_subsecs(6),
            scans: 0,
        }
    }

    /// The public redirect path for this record.
    pub fn fixed_link(&self) -> String {
        fixed_link(&self.code)
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.fixed_link(), self.url)?;
        write!(f, " [created: {}, scans: {}]", self.created, self.scans)
    }
}

/// Fields of a record that may change after creation. `None` leaves the stored value alone.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordUpdate {
    pub url: Option<String>,
}

impl RecordUpdate {
    pub fn url(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
        }
    }
}

pub fn fixed_link(code: &str) -> String {
    format!("/q/{}", code)
}

/// `created` on the wire: naive UTC with microseconds (`2024-05-01T09:30:00.123456`),
/// the shape existing documents carry. RFC 3339 input is accepted as well.
mod iso_naive {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    pub fn serialize<S: Serializer>(created: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&created.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .or_else(|_| DateTime::parse_from_rfc3339(&raw).map(|created| created.with_timezone(&Utc)))
            .map_err(D::Error::custom)
    }
}
