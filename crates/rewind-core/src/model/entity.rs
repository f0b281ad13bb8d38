use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The closed set of entity tags the coordinator can reverse operations on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Project,
    Epic,
    Story,
    Client,
    SlaRule,
    User,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Epic => "epic",
            Self::Story => "story",
            Self::Client => "client",
            Self::SlaRule => "sla-rule",
            Self::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse error for [`EntityKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity kind '{0}'")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(Self::Project),
            "epic" => Ok(Self::Epic),
            "story" => Ok(Self::Story),
            "client" => Ok(Self::Client),
            // "sla" is the legacy wire spelling.
            "sla-rule" | "sla" => Ok(Self::SlaRule),
            "user" => Ok(Self::User),
            other => Err(UnknownEntityKind(other.to_string())),
        }
    }
}

/// A server-assigned entity identifier.
///
/// The remote store hands out numeric ids for most records and opaque
/// strings for a few (users created through the SSO path), so both forms
/// are carried verbatim and compared structurally. Identifiers are *not*
/// stable across a delete/re-create cycle — see
/// [`RecreatedIdCell`](crate::model::RecreatedIdCell).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Num(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::Num(n)
    }
}

impl From<i32> for EntityId {
    fn from(n: i32) -> Self {
        Self::Num(i64::from(n))
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_round_trips_through_str() {
        for kind in [
            EntityKind::Project,
            EntityKind::Epic,
            EntityKind::Story,
            EntityKind::Client,
            EntityKind::SlaRule,
            EntityKind::User,
        ] {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn legacy_sla_spelling_parses() {
        assert_eq!("sla".parse::<EntityKind>().unwrap(), EntityKind::SlaRule);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!("sprint".parse::<EntityKind>().is_err());
    }

    #[test]
    fn entity_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&EntityKind::SlaRule).unwrap();
        assert_eq!(json, "\"sla-rule\"");
    }

    #[test]
    fn entity_id_deserializes_both_forms() {
        let num: EntityId = serde_json::from_str("10").unwrap();
        assert_eq!(num, EntityId::Num(10));
        let text: EntityId = serde_json::from_str("\"usr_9f2\"").unwrap();
        assert_eq!(text, EntityId::Text("usr_9f2".into()));
    }

    #[test]
    fn entity_id_displays_bare() {
        assert_eq!(EntityId::from(77).to_string(), "77");
        assert_eq!(EntityId::from("usr_9f2").to_string(), "usr_9f2");
    }
}
