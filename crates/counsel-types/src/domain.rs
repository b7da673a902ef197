use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Restricted subject-matter mode constraining assistant behavior.
///
/// The wire form is snake_case (`legal`, `civil_engineering`, `real_estate`);
/// the storage layer maps to its own SCREAMING representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[default]
    Legal,
    CivilEngineering,
    RealEstate,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Legal, Domain::CivilEngineering, Domain::RealEstate];

    /// Human-readable display name ("Legal", "Civil Engineering", ...).
    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::Legal => "Legal",
            Domain::CivilEngineering => "Civil Engineering",
            Domain::RealEstate => "Real Estate",
        }
    }

    /// Snake-case tag used on the wire and in URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Legal => "legal",
            Domain::CivilEngineering => "civil_engineering",
            Domain::RealEstate => "real_estate",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDomainError(pub String);

impl fmt::Display for ParseDomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown domain: {}", self.0)
    }
}

impl std::error::Error for ParseDomainError {}

impl FromStr for Domain {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legal" => Ok(Domain::Legal),
            "civil_engineering" => Ok(Domain::CivilEngineering),
            "real_estate" => Ok(Domain::RealEstate),
            other => Err(ParseDomainError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_snake_case() {
        for domain in Domain::ALL {
            assert_eq!(domain.as_str().parse::<Domain>().unwrap(), domain);
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Domain::CivilEngineering).unwrap();
        assert_eq!(json, "\"civil_engineering\"");
    }

    #[test]
    fn rejects_unknown() {
        assert!("cooking".parse::<Domain>().is_err());
    }
}
