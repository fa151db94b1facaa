//! Keeps platform channels and roles in line with the registry.
//!
//! Only creation is ever issued. Role and channel batches run side by side;
//! inside a batch items are created one at a time so that ordering-sensitive
//! platform state is never raced.

use crate::error::Result;
use crate::naming;
use crate::platform::{Channel, ChannelKind, Platform, Role};
use crate::types::ManagedClass;
use serde::Serialize;
use std::collections::HashSet;

const CREATE_REASON: &str = "Managed class";

// ---------------------------------------------------------------------------
// Pure set logic
// ---------------------------------------------------------------------------

/// Registry classes whose role does not exist yet, one per role name.
pub fn missing_roles(classes: &[ManagedClass], roles: &[Role]) -> Vec<ManagedClass> {
    let existing: HashSet<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    missing_by(classes, &existing, ManagedClass::role_name)
}

/// Registry classes whose channel does not exist yet, one per channel name.
pub fn missing_channels(classes: &[ManagedClass], channels: &[Channel]) -> Vec<ManagedClass> {
    let existing: HashSet<&str> = channels.iter().map(|c| c.name.as_str()).collect();
    missing_by(classes, &existing, ManagedClass::channel_name)
}

fn missing_by(
    classes: &[ManagedClass],
    existing: &HashSet<&str>,
    name: fn(&ManagedClass) -> String,
) -> Vec<ManagedClass> {
    let mut seen = HashSet::new();
    classes
        .iter()
        .filter(|c| {
            let name = name(c);
            !existing.contains(name.as_str()) && seen.insert(name)
        })
        .cloned()
        .collect()
}

/// Channels that look like class channels but are not tracked by the
/// registry, in channel order, one entry per distinct name.
pub fn ingestion_candidates(classes: &[ManagedClass], channels: &[Channel]) -> Vec<ManagedClass> {
    let expected: HashSet<String> = classes.iter().map(naming::channel_name).collect();
    let mut seen = HashSet::new();
    channels
        .iter()
        .filter(|c| !expected.contains(&c.name) && seen.insert(c.name.as_str()))
        .filter_map(|c| naming::parse_channel_name(&c.name).ok())
        .collect()
}

/// Moves that put `channels` in name order with zero-based positions.
/// Channels already in place are skipped.
pub fn reorder_plan(channels: &[Channel]) -> Vec<(String, i64)> {
    let mut ordered: Vec<&Channel> = channels.iter().collect();
    ordered.sort_by(|a, b| naming::locale_cmp(&a.name, &b.name));
    ordered
        .into_iter()
        .enumerate()
        .filter(|(i, c)| c.position != *i as i64)
        .map(|(i, c)| (c.id.clone(), i as i64))
        .collect()
}

// ---------------------------------------------------------------------------
// Plan / Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcilePlan {
    pub missing_roles: Vec<ManagedClass>,
    pub missing_channels: Vec<ManagedClass>,
    pub ingestion_candidates: Vec<ManagedClass>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.missing_roles.is_empty()
            && self.missing_channels.is_empty()
            && self.ingestion_candidates.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub roles_created: Vec<String>,
    pub channels_created: Vec<String>,
    pub channels_moved: usize,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct Reconciler<'a> {
    platform: &'a dyn Platform,
    category: &'a str,
    reorder_channels: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(platform: &'a dyn Platform, category: &'a str, reorder_channels: bool) -> Self {
        Self {
            platform,
            category,
            reorder_channels,
        }
    }

    /// What a reconciliation would do right now, without doing it.
    pub async fn plan(&self, classes: &[ManagedClass]) -> Result<ReconcilePlan> {
        let (channels, roles) = tokio::try_join!(self.platform.channels(), self.platform.roles())?;
        Ok(ReconcilePlan {
            missing_roles: missing_roles(classes, &roles),
            missing_channels: missing_channels(classes, &channels),
            ingestion_candidates: ingestion_candidates(classes, &channels),
        })
    }

    /// Create every missing role and channel.
    ///
    /// Both batches always run to their own end; if either failed, the first
    /// error is returned. Nothing already created is rolled back.
    pub async fn reconcile(&self, classes: &[ManagedClass]) -> Result<ReconcileReport> {
        let (channels, roles) = tokio::try_join!(self.platform.channels(), self.platform.roles())?;
        let roles_needed = missing_roles(classes, &roles);
        let channels_needed = missing_channels(classes, &channels);

        let (roles_result, channels_result) = tokio::join!(
            self.create_roles(&roles_needed),
            self.create_channels(&channels_needed, &channels)
        );
        let roles_created = roles_result?;
        let (channels_created, channels_moved) = channels_result?;

        tracing::info!(
            roles = roles_created.len(),
            channels = channels_created.len(),
            moved = channels_moved,
            "reconciled managed classes"
        );
        Ok(ReconcileReport {
            roles_created,
            channels_created,
            channels_moved,
        })
    }

    async fn create_roles(&self, needed: &[ManagedClass]) -> Result<Vec<String>> {
        let mut created = Vec::with_capacity(needed.len());
        for class in needed {
            let role = self
                .platform
                .create_role(&class.role_name(), None, CREATE_REASON)
                .await?;
            tracing::info!(role = %role.name, "created class role");
            created.push(role.name);
        }
        Ok(created)
    }

    async fn create_channels(
        &self,
        needed: &[ManagedClass],
        existing: &[Channel],
    ) -> Result<(Vec<String>, usize)> {
        let parent = existing
            .iter()
            .find(|c| c.kind == ChannelKind::Category && c.name == self.category);
        if parent.is_none() && !needed.is_empty() {
            tracing::warn!(
                category = self.category,
                "class category not found, creating channels without a parent"
            );
        }
        let parent_id = parent.map(|p| p.id.as_str());

        // Snapshot siblings before creating so the sort sees exactly the
        // channels that existed plus the ones created here.
        let mut siblings: Vec<Channel> = match parent_id {
            Some(id) => existing
                .iter()
                .filter(|c| c.parent_id.as_deref() == Some(id))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        let mut created = Vec::with_capacity(needed.len());
        for class in needed {
            let channel = self
                .platform
                .create_channel(&class.channel_name(), parent_id, CREATE_REASON)
                .await?;
            tracing::info!(channel = %channel.name, "created class channel");
            created.push(channel.name.clone());
            siblings.push(channel);
        }

        let mut moved = 0;
        if self.reorder_channels && parent_id.is_some() {
            for (channel_id, position) in reorder_plan(&siblings) {
                self.platform
                    .set_channel_position(&channel_id, position)
                    .await?;
                moved += 1;
            }
        }
        Ok((created, moved))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePlatform;

    fn class(dept: &str, id: &str) -> ManagedClass {
        ManagedClass::from_parts(dept, id)
    }

    fn channel(id: &str, name: &str, position: i64) -> Channel {
        Channel {
            id: id.into(),
            name: name.into(),
            kind: ChannelKind::Text,
            parent_id: Some("cat".into()),
            position,
        }
    }

    fn role(name: &str) -> Role {
        Role {
            id: format!("r-{name}"),
            name: name.into(),
            position: 1,
        }
    }

    #[test]
    fn empty_platform_is_missing_everything() {
        let classes = vec![class("CS", "101")];
        let roles = missing_roles(&classes, &[]);
        let channels = missing_channels(&classes, &[]);
        assert_eq!(roles, classes);
        assert_eq!(roles[0].role_name(), "CS 101");
        assert_eq!(channels, classes);
        assert_eq!(channels[0].channel_name(), "cs-101");
    }

    #[test]
    fn fully_reconciled_platform_is_missing_nothing() {
        let classes = vec![class("CS", "101"), class("math", "2210")];
        let roles = vec![role("CS 101"), role("MATH 2210"), role("Moderators")];
        let channels = vec![channel("1", "cs-101", 0), channel("2", "math-2210", 1)];
        assert!(missing_roles(&classes, &roles).is_empty());
        assert!(missing_channels(&classes, &channels).is_empty());
    }

    #[test]
    fn missing_sets_are_subsets_of_registry() {
        let classes = vec![class("CS", "101"), class("BIO", "1")];
        let roles = vec![role("CS 101")];
        let channels = vec![channel("1", "bio-1", 0)];
        assert_eq!(missing_roles(&classes, &roles), vec![class("BIO", "1")]);
        assert_eq!(missing_channels(&classes, &channels), vec![class("CS", "101")]);
    }

    #[test]
    fn duplicate_registry_entries_are_created_once() {
        let classes = vec![class("CS", "101"), class("cs", "101")];
        assert_eq!(missing_roles(&classes, &[]).len(), 1);
        assert_eq!(missing_channels(&classes, &[]).len(), 1);
    }

    #[test]
    fn untracked_class_channel_is_a_candidate() {
        let channels = vec![channel("1", "cs-101", 0), channel("2", "general", 1)];
        assert_eq!(ingestion_candidates(&[], &channels), vec![class("cs", "101")]);
    }

    #[test]
    fn tracked_channels_are_not_candidates() {
        let channels = vec![channel("1", "cs-101", 0), channel("2", "bio-7", 1)];
        let classes = vec![class("CS", "101")];
        assert_eq!(ingestion_candidates(&classes, &channels), vec![class("bio", "7")]);
    }

    #[test]
    fn duplicate_channel_names_yield_one_candidate() {
        let channels = vec![channel("1", "cs-101", 0), channel("2", "cs-101", 1)];
        assert_eq!(ingestion_candidates(&[], &channels).len(), 1);
    }

    #[test]
    fn reorder_plan_skips_channels_in_place() {
        let channels = vec![
            channel("a", "cs-101", 0),
            channel("b", "cs-9", 2),
            channel("c", "bio-1", 1),
        ];
        // bio-1 → 0, cs-101 → 1, cs-9 → 2 (already there)
        assert_eq!(
            reorder_plan(&channels),
            vec![("c".to_string(), 0), ("a".to_string(), 1)]
        );
    }

    #[test]
    fn reorder_plan_sorted_is_empty() {
        let channels = vec![channel("a", "bio-1", 0), channel("b", "cs-101", 1)];
        assert!(reorder_plan(&channels).is_empty());
    }

    #[tokio::test]
    async fn reconcile_creates_missing_under_category() {
        let platform = FakePlatform::new()
            .with_category("course-specific")
            .with_channel("math-1", Some("course-specific"), 0)
            .with_role("MATH 1");
        let classes = vec![class("MATH", "1"), class("CS", "101")];

        let report = Reconciler::new(&platform, "course-specific", true)
            .reconcile(&classes)
            .await
            .unwrap();

        assert_eq!(report.roles_created, vec!["CS 101"]);
        assert_eq!(report.channels_created, vec!["cs-101"]);
        assert!(platform.role_names().contains(&"CS 101".to_string()));

        let state = platform.state();
        let created = state.channels.iter().find(|c| c.name == "cs-101").unwrap();
        assert_eq!(created.parent_id.as_deref(), Some("cat-course-specific"));
        // cs-101 sorts before math-1, so both move.
        assert_eq!(report.channels_moved, 2);
        let math = state.channels.iter().find(|c| c.name == "math-1").unwrap();
        assert_eq!(created.position, 0);
        assert_eq!(math.position, 1);
    }

    #[tokio::test]
    async fn reconcile_without_reordering_issues_no_moves() {
        let platform = FakePlatform::new()
            .with_category("course-specific")
            .with_channel("math-1", Some("course-specific"), 0);
        Reconciler::new(&platform, "course-specific", false)
            .reconcile(&[class("CS", "101")])
            .await
            .unwrap();
        assert!(platform.state().moves.is_empty());
    }

    #[tokio::test]
    async fn reconcile_without_category_creates_orphans() {
        let platform = FakePlatform::new();
        let report = Reconciler::new(&platform, "course-specific", true)
            .reconcile(&[class("CS", "101")])
            .await
            .unwrap();
        assert_eq!(report.channels_created, vec!["cs-101"]);
        assert_eq!(report.channels_moved, 0);
        assert!(platform.state().channels[0].parent_id.is_none());
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let platform = FakePlatform::new().with_category("course-specific");
        let classes = vec![class("CS", "101"), class("CS", "9")];
        let reconciler = Reconciler::new(&platform, "course-specific", true);
        reconciler.reconcile(&classes).await.unwrap();
        let second = reconciler.reconcile(&classes).await.unwrap();
        assert_eq!(second, ReconcileReport::default());
    }

    #[tokio::test]
    async fn channel_failure_aborts_its_batch_but_not_roles() {
        let platform = FakePlatform::new().with_category("course-specific");
        platform.state().fail_channel = Some("cs-101".into());
        let classes = vec![class("CS", "101"), class("CS", "102")];

        let err = Reconciler::new(&platform, "course-specific", true)
            .reconcile(&classes)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cs-101"));

        // Roles ran to completion; the second channel was never attempted.
        assert_eq!(platform.role_names(), vec!["CS 101", "CS 102"]);
        assert!(!platform.channel_names().contains(&"cs-102".to_string()));
    }

    #[tokio::test]
    async fn plan_reports_all_three_sets() {
        let platform = FakePlatform::new()
            .with_category("course-specific")
            .with_channel("bio-1", Some("course-specific"), 0);
        let plan = Reconciler::new(&platform, "course-specific", true)
            .plan(&[class("CS", "101")])
            .await
            .unwrap();
        assert_eq!(plan.missing_roles, vec![class("CS", "101")]);
        assert_eq!(plan.missing_channels, vec![class("CS", "101")]);
        assert_eq!(plan.ingestion_candidates, vec![class("bio", "1")]);
        assert!(!plan.is_empty());
    }
}
