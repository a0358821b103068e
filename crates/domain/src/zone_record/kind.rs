use std::fmt;
use std::str::FromStr;

/// Record types a zone document may carry. Each variant has exactly one encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubRecordKind {
    A,
    AAAA,
    CNAME,
    NS,
    PTR,
    SRV,
    TXT,
    SOA,
    SVCB,
    HTTPS,
}

impl SubRecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubRecordKind::A => "A",
            SubRecordKind::AAAA => "AAAA",
            SubRecordKind::CNAME => "CNAME",
            SubRecordKind::NS => "NS",
            SubRecordKind::PTR => "PTR",
            SubRecordKind::SRV => "SRV",
            SubRecordKind::TXT => "TXT",
            SubRecordKind::SOA => "SOA",
            SubRecordKind::SVCB => "SVCB",
            SubRecordKind::HTTPS => "HTTPS",
        }
    }

    pub fn to_u16(&self) -> u16 {
        match self {
            SubRecordKind::A => 1,
            SubRecordKind::NS => 2,
            SubRecordKind::CNAME => 5,
            SubRecordKind::SOA => 6,
            SubRecordKind::PTR => 12,
            SubRecordKind::TXT => 16,
            SubRecordKind::AAAA => 28,
            SubRecordKind::SRV => 33,
            SubRecordKind::SVCB => 64,
            SubRecordKind::HTTPS => 65,
        }
    }

    pub fn is_service_binding(&self) -> bool {
        matches!(self, SubRecordKind::SVCB | SubRecordKind::HTTPS)
    }
}

impl FromStr for SubRecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(SubRecordKind::A),
            "AAAA" => Ok(SubRecordKind::AAAA),
            "CNAME" => Ok(SubRecordKind::CNAME),
            "NS" => Ok(SubRecordKind::NS),
            "PTR" => Ok(SubRecordKind::PTR),
            "SRV" => Ok(SubRecordKind::SRV),
            "TXT" => Ok(SubRecordKind::TXT),
            "SOA" => Ok(SubRecordKind::SOA),
            "SVCB" => Ok(SubRecordKind::SVCB),
            "HTTPS" => Ok(SubRecordKind::HTTPS),
            _ => Err(format!("Unsupported record type: {}", s)),
        }
    }
}

impl fmt::Display for SubRecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
