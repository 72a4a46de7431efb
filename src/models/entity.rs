//! Entity kinds and the tables linking them.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::GenerateConfig;

/// The three entity tables that get a content file per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Member,
    Group,
    Project,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Member, EntityKind::Group, EntityKind::Project];

    /// Data file key the table is synced under.
    pub fn data_key(self) -> &'static str {
        match self {
            EntityKind::Member => "members",
            EntityKind::Group => "groups",
            EntityKind::Project => "projects",
        }
    }

    /// Layout name written into the front matter.
    pub fn layout(self) -> &'static str {
        match self {
            EntityKind::Member => "member",
            EntityKind::Group => "groups",
            EntityKind::Project => "project",
        }
    }

    /// Build the permalink path for a slug of this kind.
    pub fn path_for(self, slug: &str) -> String {
        format!("/{}/{}", self.data_key(), slug)
    }

    /// Output directory for generated content files.
    pub fn output_dir(self, config: &GenerateConfig) -> &Path {
        match self {
            EntityKind::Member => &config.members_dir,
            EntityKind::Group => &config.groups_dir,
            EntityKind::Project => &config.projects_dir,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.data_key())
    }
}

/// Members and projects listed under one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRelations {
    #[serde(default)]
    pub members: Option<Vec<String>>,
    #[serde(default)]
    pub projects: Option<Vec<String>>,
}

/// Group slug to membership mapping, the authority on group links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relationships(IndexMap<String, Option<GroupRelations>>);

impl Relationships {
    pub fn new(groups: IndexMap<String, Option<GroupRelations>>) -> Self {
        Self(groups)
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &GroupRelations)> {
        self.0
            .iter()
            .filter_map(|(slug, rel)| rel.as_ref().map(|rel| (slug.as_str(), rel)))
    }

    fn group(&self, slug: &str) -> Option<&GroupRelations> {
        self.0.get(slug).and_then(Option::as_ref)
    }

    /// Member paths listed for a group.
    pub fn members_of(&self, group_slug: &str) -> Vec<String> {
        self.group(group_slug)
            .and_then(|rel| rel.members.as_ref())
            .map(|slugs| slugs.iter().map(|s| EntityKind::Member.path_for(s)).collect())
            .unwrap_or_default()
    }

    /// Project paths listed for a group.
    pub fn projects_of(&self, group_slug: &str) -> Vec<String> {
        self.group(group_slug)
            .and_then(|rel| rel.projects.as_ref())
            .map(|slugs| slugs.iter().map(|s| EntityKind::Project.path_for(s)).collect())
            .unwrap_or_default()
    }

    /// Paths of the groups listing a member slug.
    pub fn groups_with_member(&self, member_slug: &str) -> Vec<String> {
        self.entries()
            .filter(|(_, rel)| Self::lists(&rel.members, member_slug))
            .map(|(group, _)| EntityKind::Group.path_for(group))
            .collect()
    }

    /// Paths of the groups listing a project slug.
    pub fn groups_with_project(&self, project_slug: &str) -> Vec<String> {
        self.entries()
            .filter(|(_, rel)| Self::lists(&rel.projects, project_slug))
            .map(|(group, _)| EntityKind::Group.path_for(group))
            .collect()
    }

    fn lists(slugs: &Option<Vec<String>>, slug: &str) -> bool {
        slugs
            .as_ref()
            .is_some_and(|slugs| slugs.iter().any(|s| s == slug))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One member-to-project contribution pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorLink {
    #[serde(default)]
    pub member_permalink: Option<String>,
    #[serde(default)]
    pub project_permalink: Option<String>,
}

impl ContributorLink {
    pub fn new(member: &str, project: &str) -> Self {
        Self {
            member_permalink: Some(member.to_string()),
            project_permalink: Some(project.to_string()),
        }
    }
}

/// Projects a member contributes to, by exact permalink match.
pub fn projects_of_member(links: &[ContributorLink], member_permalink: &str) -> Vec<String> {
    links
        .iter()
        .filter(|link| link.member_permalink.as_deref() == Some(member_permalink))
        .filter_map(|link| link.project_permalink.clone())
        .collect()
}

/// Members contributing to a project, by exact permalink match.
pub fn contributors_of_project(links: &[ContributorLink], project_permalink: &str) -> Vec<String> {
    links
        .iter()
        .filter(|link| link.project_permalink.as_deref() == Some(project_permalink))
        .filter_map(|link| link.member_permalink.clone())
        .collect()
}
