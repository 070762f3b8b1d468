use std::collections::BTreeSet;

use crate::models::ClassDefinition;

/// Selecting this id in a dimension disables filtering on it.
pub const ALL: &str = "all";

/// Season and room narrowing. Ids within a dimension are alternatives; both
/// dimensions must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFilter {
    seasons: Option<BTreeSet<String>>,
    rooms: Option<BTreeSet<String>>,
}

impl ClassFilter {
    pub fn new<S, R>(season_ids: S, room_ids: R) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            seasons: dimension(season_ids),
            rooms: dimension(room_ids),
        }
    }

    pub fn season_ids(&self) -> Option<&BTreeSet<String>> {
        self.seasons.as_ref()
    }

    pub fn room_ids(&self) -> Option<&BTreeSet<String>> {
        self.rooms.as_ref()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.seasons.is_none() && self.rooms.is_none()
    }

    pub fn matches(&self, class: &ClassDefinition) -> bool {
        admits(&self.seasons, class.season_id.as_deref())
            && admits(&self.rooms, class.room_id.as_deref())
    }

    /// Matching classes, in input order.
    pub fn apply(&self, classes: &[ClassDefinition]) -> Vec<ClassDefinition> {
        classes
            .iter()
            .filter(|class| self.matches(class))
            .cloned()
            .collect()
    }

    pub fn retain(&self, classes: &mut Vec<ClassDefinition>) {
        classes.retain(|class| self.matches(class));
    }
}

/// Narrows `classes` by season and room. An empty id list, or one holding
/// [`ALL`], leaves that dimension unfiltered.
pub fn filter_classes<S: AsRef<str>>(
    classes: &[ClassDefinition],
    season_ids: &[S],
    room_ids: &[S],
) -> Vec<ClassDefinition> {
    ClassFilter::new(
        season_ids.iter().map(|id| id.as_ref().to_string()),
        room_ids.iter().map(|id| id.as_ref().to_string()),
    )
    .apply(classes)
}

fn dimension<I>(ids: I) -> Option<BTreeSet<String>>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
    if ids.is_empty() || ids.contains(ALL) {
        None
    } else {
        Some(ids)
    }
}

fn admits(allowed: &Option<BTreeSet<String>>, value: Option<&str>) -> bool {
    match (allowed, value) {
        (None, _) => true,
        (Some(ids), Some(value)) => ids.contains(value),
        (Some(_), None) => false,
    }
}
