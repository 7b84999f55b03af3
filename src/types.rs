use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of a single probe: whether `port` accepted a TCP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub port: u16,
    pub open: bool,
}

/// One entry of the result set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PortRecord {
    pub open: bool,
    pub service_guess: String,
}

/// Port number -> record, iterated in ascending port order.
pub type ResultSet = BTreeMap<u16, PortRecord>;

/// Finished scan of one host.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub host: String,
    #[serde(with = "secs_f64")]
    pub elapsed: Duration,
    pub ports: ResultSet,
}

impl ScanReport {
    /// Open ports in ascending order.
    pub fn open_ports(&self) -> impl Iterator<Item = (u16, &PortRecord)> + '_ {
        self.ports
            .iter()
            .filter(|(_, rec)| rec.open)
            .map(|(&port, rec)| (port, rec))
    }

    pub fn open_count(&self) -> usize {
        self.open_ports().count()
    }
}

// `elapsed` goes over the wire as fractional seconds.
mod secs_f64 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
