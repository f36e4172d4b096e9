//! Desired-set computation.
//!
//! The desired whale set is the union of three sources: current
//! Twitch-subrole holders, Patreon backers whose linked account resolves
//! to a guild member, and holders of the optional override role. Members
//! are keyed by identity, so a member contributed by several sources
//! appears once, and the set does not record which source contributed it.

use crate::gateway::{GuildHost, MemberHandle};
use serenity::model::id::{GuildId, UserId};
use std::collections::BTreeMap;
use tracing::debug;
use whalesync_error::SyncResult;
use whalesync_patreon::BackerIdSet;

/// The "should have the whale role" set, keyed by member identity.
pub type DesiredWhaleSet = BTreeMap<UserId, MemberHandle>;

/// Resolve backer IDs against the guild's current membership.
///
/// IDs that do not resolve (the backer left the guild or never joined)
/// are dropped; they contribute no role changes. Malformed linked-account
/// IDs are dropped the same way.
pub async fn resolve_backers<H: GuildHost + ?Sized>(
    host: &H,
    guild: GuildId,
    backers: &BackerIdSet,
) -> SyncResult<Vec<MemberHandle>> {
    let mut resolved = Vec::new();
    for raw_id in backers {
        let user = match raw_id.parse::<u64>() {
            Ok(id) if id != 0 => UserId::new(id),
            _ => {
                debug!(id = %raw_id, "ignoring malformed linked account id");
                continue;
            }
        };
        match host.resolve_member(guild, user).await? {
            Some(member) => resolved.push(member),
            None => debug!(user = user.get(), "backer is not a guild member"),
        }
    }
    Ok(resolved)
}

/// Union the three membership sources into the desired whale set.
pub fn desired_whales(
    twitch_subs: Vec<MemberHandle>,
    backers: Vec<MemberHandle>,
    overrides: Vec<MemberHandle>,
) -> DesiredWhaleSet {
    let mut desired = DesiredWhaleSet::new();
    for member in twitch_subs.into_iter().chain(backers).chain(overrides) {
        desired.insert(*member.user_id(), member);
    }
    desired
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: u64, name: &str) -> MemberHandle {
        MemberHandle::new(UserId::new(id), name.to_string())
    }

    #[test]
    fn test_union_deduplicates_by_identity() {
        let desired = desired_whales(
            vec![member(1, "a"), member(2, "b")],
            vec![member(2, "b"), member(3, "c")],
            vec![member(3, "c"), member(1, "a")],
        );

        assert_eq!(desired.len(), 3);
        assert!(desired.contains_key(&UserId::new(1)));
        assert!(desired.contains_key(&UserId::new(2)));
        assert!(desired.contains_key(&UserId::new(3)));
    }

    #[test]
    fn test_union_of_empty_sources_is_empty() {
        assert!(desired_whales(Vec::new(), Vec::new(), Vec::new()).is_empty());
    }
}
