use std::fmt;

/// Access policy encoded in a location string, tagged with its owner.
///
/// The wire format projects this back into the `type`/`ownerId` pair (plus
/// the dynamic-key field on instance responses); at the domain level it is a
/// single variant so an owner can never be attached to a public instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceAccess {
    Public,
    Private { owner_id: String },
    Friends { owner_id: String },
    /// "Friends+": friends-of-friends one hop out from the owner.
    Hidden { owner_id: String },
    Group { group_id: String },
}

impl InstanceAccess {
    /// Wire name of the instance type (`"public"`, `"private"`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            InstanceAccess::Public => "public",
            InstanceAccess::Private { .. } => "private",
            InstanceAccess::Friends { .. } => "friends",
            InstanceAccess::Hidden { .. } => "hidden",
            InstanceAccess::Group { .. } => "group",
        }
    }

    /// Owner (or group) the policy is anchored to. Empty for public.
    pub fn owner_id(&self) -> &str {
        match self {
            InstanceAccess::Public => "",
            InstanceAccess::Private { owner_id }
            | InstanceAccess::Friends { owner_id }
            | InstanceAccess::Hidden { owner_id } => owner_id,
            InstanceAccess::Group { group_id } => group_id,
        }
    }
}

/// A parsed location string: `worldId:instanceId~ext1(v1)~ext2...`
///
/// `encode` is the exact inverse of `parse`, so a `Location` can serve as a
/// cache key or audit-log entry without ambiguity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub world_id: String,
    pub instance_id: String,
    pub access: InstanceAccess,
    pub region: Option<String>,
    pub is_strict: bool,
    pub can_request_invite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("malformed location string: {0}")]
    Malformed(String),

    #[error("unrecognized location extension: {0}")]
    UnrecognizedExtension(String),
}

impl Location {
    /// Parse a raw location string.
    ///
    /// Only canonical strings are accepted: each extension at most once, in
    /// encode order (ownership, region, strict, canRequestInvite). Anything
    /// else would break the re-encode round trip and is rejected outright.
    /// Unknown extension keys are an error, never a silent public fallback.
    pub fn parse(raw: &str) -> Result<Location, LocationError> {
        let (world_id, rest) = raw
            .split_once(':')
            .ok_or_else(|| LocationError::Malformed("missing ':' separator".to_string()))?;

        if world_id.is_empty() {
            return Err(LocationError::Malformed("empty world id".to_string()));
        }

        let mut segments = rest.split('~');
        let instance_id = segments.next().unwrap_or_default();
        if instance_id.is_empty() {
            return Err(LocationError::Malformed("empty instance id".to_string()));
        }

        let mut location = Location {
            world_id: world_id.to_string(),
            instance_id: instance_id.to_string(),
            access: InstanceAccess::Public,
            region: None,
            is_strict: false,
            can_request_invite: false,
        };

        for segment in segments {
            location.apply_extension(segment)?;
        }

        // Duplicated or out-of-order extensions parse into the same struct a
        // canonical string would, so the only reliable check is re-encoding.
        if location.encode() != raw {
            return Err(LocationError::Malformed(format!(
                "non-canonical extension order in '{}'",
                raw
            )));
        }

        Ok(location)
    }

    fn apply_extension(&mut self, segment: &str) -> Result<(), LocationError> {
        let (key, value) = split_extension(segment)?;

        match (key, value) {
            ("private", Some(owner)) => {
                self.access = InstanceAccess::Private {
                    owner_id: owner.to_string(),
                }
            }
            ("friends", Some(owner)) => {
                self.access = InstanceAccess::Friends {
                    owner_id: owner.to_string(),
                }
            }
            ("hidden", Some(owner)) => {
                self.access = InstanceAccess::Hidden {
                    owner_id: owner.to_string(),
                }
            }
            ("group", Some(group)) => {
                self.access = InstanceAccess::Group {
                    group_id: group.to_string(),
                }
            }
            ("region", Some(code)) => self.region = Some(code.to_string()),
            ("strict", None) => self.is_strict = true,
            ("canRequestInvite", None) => self.can_request_invite = true,
            ("private" | "friends" | "hidden" | "group" | "region", None) => {
                return Err(LocationError::Malformed(format!(
                    "extension '{}' requires a value",
                    key
                )))
            }
            ("strict" | "canRequestInvite", Some(_)) => {
                return Err(LocationError::Malformed(format!(
                    "extension '{}' does not take a value",
                    key
                )))
            }
            _ => return Err(LocationError::UnrecognizedExtension(key.to_string())),
        }

        Ok(())
    }

    /// Canonical string form. Extension order is fixed (ownership, region,
    /// strict, canRequestInvite) so equal structs always encode identically.
    pub fn encode(&self) -> String {
        let mut out = format!("{}:{}", self.world_id, self.instance_id);

        match &self.access {
            InstanceAccess::Public => {}
            InstanceAccess::Private { owner_id } => {
                out.push_str(&format!("~private({})", owner_id))
            }
            InstanceAccess::Friends { owner_id } => {
                out.push_str(&format!("~friends({})", owner_id))
            }
            InstanceAccess::Hidden { owner_id } => out.push_str(&format!("~hidden({})", owner_id)),
            InstanceAccess::Group { group_id } => out.push_str(&format!("~group({})", group_id)),
        }

        if let Some(region) = &self.region {
            out.push_str(&format!("~region({})", region));
        }
        if self.is_strict {
            out.push_str("~strict");
        }
        if self.can_request_invite {
            out.push_str("~canRequestInvite");
        }

        out
    }

    /// Everything after the world id: the per-world instance discriminator
    /// with its extensions. Clients display this as the "instance id".
    pub fn instance_location(&self) -> String {
        let encoded = self.encode();
        encoded[self.world_id.len() + 1..].to_string()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Split an extension segment into `key` and optional `(value)`.
fn split_extension(segment: &str) -> Result<(&str, Option<&str>), LocationError> {
    if segment.is_empty() {
        return Err(LocationError::Malformed("empty extension segment".to_string()));
    }

    match segment.split_once('(') {
        None => {
            if segment.contains(')') {
                return Err(LocationError::Malformed(format!(
                    "unbalanced parenthesis in '{}'",
                    segment
                )));
            }
            Ok((segment, None))
        }
        Some((key, rest)) => {
            let value = rest.strip_suffix(')').ok_or_else(|| {
                LocationError::Malformed(format!("unterminated value in '{}'", segment))
            })?;
            if key.is_empty() || value.is_empty() || value.contains('(') {
                return Err(LocationError::Malformed(format!(
                    "bad extension segment '{}'",
                    segment
                )));
            }
            Ok((key, Some(value)))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn roundtrip(raw: &str) -> Location {
        let parsed = Location::parse(raw).expect("should parse");
        assert_eq!(parsed.encode(), raw, "round trip must be byte-identical");
        parsed
    }

    #[test]
    fn test_public_instance_no_extensions() {
        let loc = roundtrip("wrld_abc:12345");
        assert_eq!(loc.world_id, "wrld_abc");
        assert_eq!(loc.instance_id, "12345");
        assert_eq!(loc.access, InstanceAccess::Public);
        assert_eq!(loc.access.owner_id(), "");
        assert!(!loc.is_strict);
        assert!(!loc.can_request_invite);
    }

    #[test]
    fn test_private_instance() {
        let loc = roundtrip("wrld_abc:12345~private(usr_1)");
        assert_eq!(
            loc.access,
            InstanceAccess::Private {
                owner_id: "usr_1".to_string()
            }
        );
        assert_eq!(loc.access.type_name(), "private");
    }

    #[test]
    fn test_friends_strict_preserved() {
        let loc = roundtrip("wrld_abc:12345~friends(usr_1)~strict");
        assert_eq!(
            loc.access,
            InstanceAccess::Friends {
                owner_id: "usr_1".to_string()
            }
        );
        assert!(loc.is_strict);
    }

    #[test]
    fn test_all_extensions_canonical_order() {
        let loc = roundtrip("wrld_abc:12345~hidden(usr_1)~region(eu)~strict~canRequestInvite");
        assert_eq!(
            loc.access,
            InstanceAccess::Hidden {
                owner_id: "usr_1".to_string()
            }
        );
        assert_eq!(loc.region.as_deref(), Some("eu"));
        assert!(loc.is_strict);
        assert!(loc.can_request_invite);
    }

    #[test]
    fn test_group_instance() {
        let loc = roundtrip("wrld_abc:12345~group(grp_9)");
        assert_eq!(
            loc.access,
            InstanceAccess::Group {
                group_id: "grp_9".to_string()
            }
        );
        assert_eq!(loc.access.owner_id(), "grp_9");
    }

    #[test]
    fn test_encode_idempotent() {
        let raw = "wrld_abc:12345~friends(usr_1)~region(us)~strict";
        let once = Location::parse(raw).unwrap().encode();
        let twice = Location::parse(&once).unwrap().encode();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_separator_is_malformed() {
        assert!(matches!(
            Location::parse("wrld_abc"),
            Err(LocationError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_world_or_instance_is_malformed() {
        assert!(matches!(
            Location::parse(":12345"),
            Err(LocationError::Malformed(_))
        ));
        assert!(matches!(
            Location::parse("wrld_abc:"),
            Err(LocationError::Malformed(_))
        ));
        assert!(matches!(
            Location::parse("wrld_abc:~strict"),
            Err(LocationError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_extension_never_falls_back_to_public() {
        let err = Location::parse("wrld_abc:12345~bogus(x)").unwrap_err();
        assert_eq!(err, LocationError::UnrecognizedExtension("bogus".to_string()));

        let err = Location::parse("wrld_abc:12345~nonce").unwrap_err();
        assert_eq!(err, LocationError::UnrecognizedExtension("nonce".to_string()));
    }

    #[test]
    fn test_value_grammar_violations() {
        assert!(matches!(
            Location::parse("wrld_abc:12345~private"),
            Err(LocationError::Malformed(_))
        ));
        assert!(matches!(
            Location::parse("wrld_abc:12345~strict(x)"),
            Err(LocationError::Malformed(_))
        ));
        assert!(matches!(
            Location::parse("wrld_abc:12345~private(usr_1"),
            Err(LocationError::Malformed(_))
        ));
        assert!(matches!(
            Location::parse("wrld_abc:12345~private()"),
            Err(LocationError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_canonical_order_rejected() {
        // strict before the ownership extension re-encodes differently.
        assert!(matches!(
            Location::parse("wrld_abc:12345~strict~private(usr_1)"),
            Err(LocationError::Malformed(_))
        ));
        // Duplicate flag collapses on re-encode.
        assert!(matches!(
            Location::parse("wrld_abc:12345~strict~strict"),
            Err(LocationError::Malformed(_))
        ));
        // Second ownership extension overwrites the first.
        assert!(matches!(
            Location::parse("wrld_abc:12345~private(usr_1)~friends(usr_2)"),
            Err(LocationError::Malformed(_))
        ));
    }

    #[test]
    fn test_instance_location_is_suffix() {
        let loc = roundtrip("wrld_abc:12345~private(usr_1)~strict");
        assert_eq!(loc.instance_location(), "12345~private(usr_1)~strict");
    }
}
