use async_trait::async_trait;

use crate::location::{InstanceAccess, Location};
use crate::models::{ReleaseStatus, UserRef, World};

/// A relationship/world lookup that could not be completed.
///
/// Access checks fail closed on this: a broken lookup is never treated as
/// permission.
#[derive(Debug, thiserror::Error)]
#[error("lookup failed: {0}")]
pub struct LookupError(pub String);

/// Social-graph collaborator: accepted-friend queries.
#[async_trait]
pub trait RelationshipProvider: Send + Sync {
    /// Whether `user` is on `owner`'s accepted-friends list.
    async fn are_friends(&self, owner: &str, user: &str) -> Result<bool, LookupError>;

    /// Accepted friends of `user`, for the one-hop "friends+" expansion.
    async fn friends_of(&self, user: &str) -> Result<Vec<String>, LookupError>;
}

/// Group-membership collaborator.
#[async_trait]
pub trait GroupMembership: Send + Sync {
    async fn is_member(&self, user: &str, group: &str) -> Result<bool, LookupError>;
}

/// Presence collaborator supplying instance occupancy. The core never counts
/// occupants itself.
#[async_trait]
pub trait PresenceProvider: Send + Sync {
    async fn occupant_count(&self, location: &str) -> Result<usize, LookupError>;
}

/// Why a join was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    NotOwner,
    NotFriend,
    NotGroupMember,
    WorldPrivateOrGone,
    CapacityExceeded,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::NotOwner => "not_owner",
            DenialReason::NotFriend => "not_friend",
            DenialReason::NotGroupMember => "not_group_member",
            DenialReason::WorldPrivateOrGone => "world_private_or_gone",
            DenialReason::CapacityExceeded => "capacity_exceeded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(DenialReason),
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("relationship lookup failed: {0}")]
    RelationshipLookupFailed(String),
}

impl From<LookupError> for AccessError {
    fn from(err: LookupError) -> Self {
        AccessError::RelationshipLookupFailed(err.0)
    }
}

/// Decide whether `requester` may join the instance at `location`.
///
/// Pure over its inputs: world record, requester identity, and the injected
/// collaborators. Capacity and world gating apply to every instance type;
/// the ownership policy then depends on the access variant.
pub async fn can_join(
    location: &Location,
    requester: &UserRef,
    world: &World,
    relationships: &impl RelationshipProvider,
    groups: &impl GroupMembership,
    presence: &impl PresenceProvider,
) -> Result<AccessDecision, AccessError> {
    if world.release_status == ReleaseStatus::Private
        && world.author_id != requester.id
        && !requester.is_staff
    {
        return Ok(AccessDecision::Denied(DenialReason::WorldPrivateOrGone));
    }

    let occupants = presence.occupant_count(&location.encode()).await?;
    if occupants >= world.capacity as usize {
        return Ok(AccessDecision::Denied(DenialReason::CapacityExceeded));
    }

    let decision = match &location.access {
        InstanceAccess::Public => AccessDecision::Allowed,

        InstanceAccess::Private { owner_id } => {
            if requester.id == *owner_id || requester.is_staff {
                AccessDecision::Allowed
            } else {
                AccessDecision::Denied(DenialReason::NotOwner)
            }
        }

        InstanceAccess::Friends { owner_id } => {
            if requester.id == *owner_id
                || requester.is_staff
                || relationships.are_friends(owner_id, &requester.id).await?
            {
                AccessDecision::Allowed
            } else {
                AccessDecision::Denied(DenialReason::NotFriend)
            }
        }

        InstanceAccess::Hidden { owner_id } => {
            if requester.id == *owner_id
                || requester.is_staff
                || relationships.are_friends(owner_id, &requester.id).await?
                || is_friend_of_friend(relationships, owner_id, &requester.id).await?
            {
                AccessDecision::Allowed
            } else {
                AccessDecision::Denied(DenialReason::NotFriend)
            }
        }

        InstanceAccess::Group { group_id } => {
            if groups.is_member(&requester.id, group_id).await? {
                AccessDecision::Allowed
            } else {
                AccessDecision::Denied(DenialReason::NotGroupMember)
            }
        }
    };

    Ok(decision)
}

/// One-hop "friends+" expansion: is `user` a friend of any friend of `owner`?
async fn is_friend_of_friend(
    relationships: &impl RelationshipProvider,
    owner: &str,
    user: &str,
) -> Result<bool, LookupError> {
    for friend in relationships.friends_of(owner).await? {
        if relationships.are_friends(&friend, user).await? {
            return Ok(true);
        }
    }
    Ok(false)
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::test_support::FakeSocialGraph;
    use super::*;

    fn user(id: &str) -> UserRef {
        UserRef {
            id: id.to_string(),
            display_name: id.to_string(),
            is_staff: false,
        }
    }

    fn staff(id: &str) -> UserRef {
        UserRef {
            is_staff: true,
            ..user(id)
        }
    }

    fn world(author_id: &str, capacity: u32, release_status: ReleaseStatus) -> World {
        World::new(
            author_id.to_string(),
            "Test World".to_string(),
            String::new(),
            capacity,
            release_status,
        )
    }

    fn parse(raw: &str) -> Location {
        Location::parse(raw).expect("test location should parse")
    }

    #[tokio::test]
    async fn test_public_instance_allows_anyone() {
        let graph = FakeSocialGraph::default();
        let w = world("usr_author", 16, ReleaseStatus::Public);
        let loc = parse("wrld_abc:12345");

        let decision = can_join(&loc, &user("usr_2"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Allowed);
    }

    #[tokio::test]
    async fn test_private_instance_owner_only() {
        let graph = FakeSocialGraph::default();
        let w = world("usr_author", 16, ReleaseStatus::Public);
        let loc = parse("wrld_abc:12345~private(usr_1)");

        let owner = can_join(&loc, &user("usr_1"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(owner, AccessDecision::Allowed);

        let stranger = can_join(&loc, &user("usr_2"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(stranger, AccessDecision::Denied(DenialReason::NotOwner));

        let moderator = can_join(&loc, &staff("usr_3"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(moderator, AccessDecision::Allowed);
    }

    #[tokio::test]
    async fn test_friends_instance_requires_friendship() {
        let graph = FakeSocialGraph::default().with_friendship("usr_1", "usr_2");
        let w = world("usr_author", 16, ReleaseStatus::Public);
        let loc = parse("wrld_abc:12345~friends(usr_1)~strict");
        assert!(loc.is_strict);

        let friend = can_join(&loc, &user("usr_2"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(friend, AccessDecision::Allowed);

        let stranger = can_join(&loc, &user("usr_3"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(stranger, AccessDecision::Denied(DenialReason::NotFriend));
    }

    #[tokio::test]
    async fn test_hidden_instance_reaches_friends_of_friends() {
        // usr_3 is a friend of usr_2, who is a friend of the owner usr_1.
        let graph = FakeSocialGraph::default()
            .with_friendship("usr_1", "usr_2")
            .with_friendship("usr_2", "usr_3");
        let w = world("usr_author", 16, ReleaseStatus::Public);
        let loc = parse("wrld_abc:12345~hidden(usr_1)");

        let second_hop = can_join(&loc, &user("usr_3"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(second_hop, AccessDecision::Allowed);

        // usr_4 is two hops out and stays excluded.
        let graph = graph.with_friendship("usr_3", "usr_4");
        let third_hop = can_join(&loc, &user("usr_4"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(third_hop, AccessDecision::Denied(DenialReason::NotFriend));
    }

    #[tokio::test]
    async fn test_group_instance_requires_membership() {
        let graph = FakeSocialGraph::default().with_group_member("grp_9", "usr_2");
        let w = world("usr_author", 16, ReleaseStatus::Public);
        let loc = parse("wrld_abc:12345~group(grp_9)");

        let member = can_join(&loc, &user("usr_2"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(member, AccessDecision::Allowed);

        let outsider = can_join(&loc, &user("usr_3"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(outsider, AccessDecision::Denied(DenialReason::NotGroupMember));
    }

    #[tokio::test]
    async fn test_private_world_gates_everyone_but_author() {
        let graph = FakeSocialGraph::default();
        let w = world("usr_author", 16, ReleaseStatus::Private);
        let loc = parse("wrld_abc:12345");

        let stranger = can_join(&loc, &user("usr_2"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(
            stranger,
            AccessDecision::Denied(DenialReason::WorldPrivateOrGone)
        );

        let author = can_join(&loc, &user("usr_author"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(author, AccessDecision::Allowed);
    }

    #[tokio::test]
    async fn test_capacity_exceeded() {
        let loc = parse("wrld_abc:12345");
        let graph = FakeSocialGraph::default().with_occupancy(&loc.encode(), 16);
        let w = world("usr_author", 16, ReleaseStatus::Public);

        let decision = can_join(&loc, &user("usr_2"), &w, &graph, &graph, &graph)
            .await
            .unwrap();
        assert_eq!(
            decision,
            AccessDecision::Denied(DenialReason::CapacityExceeded)
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_closed() {
        let mut graph = FakeSocialGraph::default().with_friendship("usr_1", "usr_2");
        graph.fail_lookups = true;
        let w = world("usr_author", 16, ReleaseStatus::Public);
        let loc = parse("wrld_abc:12345~friends(usr_1)");

        let result = can_join(&loc, &user("usr_2"), &w, &graph, &graph, &graph).await;
        assert!(matches!(result, Err(AccessError::RelationshipLookupFailed(_))));
    }
}
