use std::collections::HashMap;

use crate::types::{PortRecord, ProbeOutcome};

const COMMON: &[(u16, &str)] = &[
    (20, "FTP-data"),
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (143, "IMAP"),
    (161, "SNMP"),
    (389, "LDAP"),
    (443, "HTTPS"),
    (465, "SMTPS"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (3306, "MySQL"),
    (5432, "PostgreSQL"),
    (6379, "Redis"),
    (27017, "MongoDB"),
    (8080, "HTTP-alt"),
    (8443, "HTTPS-alt"),
];

/// Read-only port -> service name table used to guess what listens on an open port.
///
/// The guess comes from the port number alone, never from talking to the service.
#[derive(Debug, Clone)]
pub struct ServiceLookup {
    names: HashMap<u16, &'static str>,
}

impl ServiceLookup {
    /// Small table of well-known ports (not exhaustive).
    pub fn common() -> Self {
        Self::from_pairs(COMMON.iter().copied())
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (u16, &'static str)>) -> Self {
        Self {
            names: pairs.into_iter().collect(),
        }
    }

    /// Service name for `port`, or `""` when unknown.
    pub fn get(&self, port: u16) -> &'static str {
        self.names.get(&port).copied().unwrap_or("")
    }

    pub fn enrich(&self, outcome: &ProbeOutcome) -> PortRecord {
        PortRecord {
            open: outcome.open,
            service_guess: self.get(outcome.port).to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ServiceLookup {
    fn default() -> Self {
        Self::common()
    }
}
