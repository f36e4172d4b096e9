//! Role diff computation and sequential apply.

use crate::gateway::{GuildHost, MemberHandle};
use crate::resolver::DesiredWhaleSet;
use derive_getters::Getters;
use serenity::model::id::{GuildId, RoleId, UserId};
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

/// The minimal set of mutations that brings current role membership in
/// line with the desired set.
///
/// A member appears in at most one of the two lists; a member already
/// correctly in or out of the role appears in neither.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct RoleDiff {
    /// Desired members that do not hold the role yet
    to_add: Vec<MemberHandle>,
    /// Current holders no longer in the desired set
    to_remove: Vec<MemberHandle>,
}

impl RoleDiff {
    /// Diff the desired set against the role's current holders.
    ///
    /// Both lists come out in member-ID order so a pass applies changes
    /// in a deterministic sequence.
    pub fn compute(desired: &DesiredWhaleSet, holders: &[MemberHandle]) -> Self {
        let holder_ids: BTreeSet<UserId> = holders.iter().map(|m| *m.user_id()).collect();

        let to_add = desired
            .values()
            .filter(|member| !holder_ids.contains(member.user_id()))
            .cloned()
            .collect();

        let mut to_remove: Vec<MemberHandle> = holders
            .iter()
            .filter(|member| !desired.contains_key(member.user_id()))
            .cloned()
            .collect();
        to_remove.sort_by_key(|member| *member.user_id());

        Self { to_add, to_remove }
    }

    /// Whether the pass has nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Counts from one applied pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Members the role was granted to
    pub granted: usize,
    /// Members the role was revoked from
    pub revoked: usize,
    /// Mutations that failed and were skipped past
    pub failed: usize,
}

/// Apply a diff: all grants first, then all revocations.
///
/// The role API disallows concurrent mutations against the same guild,
/// so every call is awaited before the next one starts. A failed call is
/// logged with the member it targeted and the pass moves on; one
/// member's failure must not block fixing everyone else.
#[instrument(skip_all, fields(additions = diff.to_add.len(), removals = diff.to_remove.len()))]
pub async fn apply<H: GuildHost + ?Sized>(
    host: &H,
    guild: GuildId,
    whale_role: RoleId,
    diff: &RoleDiff,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for member in &diff.to_add {
        info!(member = %member.display_name(), "granting whale role");
        match host.grant_role(guild, *member.user_id(), whale_role).await {
            Ok(()) => report.granted += 1,
            Err(e) => {
                warn!(member = %member.display_name(), error = %e, "grant failed, continuing");
                report.failed += 1;
            }
        }
    }

    for member in &diff.to_remove {
        info!(member = %member.display_name(), "revoking whale role");
        match host.revoke_role(guild, *member.user_id(), whale_role).await {
            Ok(()) => report.revoked += 1,
            Err(e) => {
                warn!(member = %member.display_name(), error = %e, "revoke failed, continuing");
                report.failed += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::desired_whales;

    fn member(id: u64, name: &str) -> MemberHandle {
        MemberHandle::new(UserId::new(id), name.to_string())
    }

    #[test]
    fn test_diff_adds_missing_and_removes_undesired() {
        // Twitch subs {A, B}, backers {B, C}, no override; holders {A, D}.
        let desired = desired_whales(
            vec![member(1, "a"), member(2, "b")],
            vec![member(2, "b"), member(3, "c")],
            Vec::new(),
        );
        let holders = [member(1, "a"), member(4, "d")];

        let diff = RoleDiff::compute(&desired, &holders);

        assert_eq!(*diff.to_add(), vec![member(2, "b"), member(3, "c")]);
        assert_eq!(*diff.to_remove(), vec![member(4, "d")]);
    }

    #[test]
    fn test_diff_lists_are_disjoint() {
        let desired = desired_whales(
            vec![member(1, "a"), member(2, "b")],
            vec![member(3, "c")],
            vec![member(4, "d")],
        );
        let holders = [member(2, "b"), member(5, "e")];

        let diff = RoleDiff::compute(&desired, &holders);

        for added in diff.to_add() {
            assert!(!diff.to_remove().contains(added));
        }
        // B already holds the role and stays desired: in neither list.
        assert!(!diff.to_add().contains(&member(2, "b")));
        assert!(!diff.to_remove().contains(&member(2, "b")));
    }

    #[test]
    fn test_diff_of_matching_sets_is_empty() {
        let desired = desired_whales(vec![member(1, "a")], Vec::new(), Vec::new());
        let holders = [member(1, "a")];

        let diff = RoleDiff::compute(&desired, &holders);
        assert!(diff.is_empty());
    }
}
