//! Section selection: reconciling configured include/exclude lists against
//! the sections that actually exist in a scope.

use super::{LookupError, ResourceType, SectionId, SectionResolutionError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// Configured include/exclude lists, by name and by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionSelector {
    /// Section names whose sections are explicitly included.
    pub include_names: BTreeSet<String>,
    /// Section ids that are explicitly included.
    pub include_ids: BTreeSet<SectionId>,
    /// Section names whose sections are explicitly excluded.
    pub exclude_names: BTreeSet<String>,
    /// Section ids that are explicitly excluded.
    pub exclude_ids: BTreeSet<SectionId>,
}

impl SectionSelector {
    /// Creates an empty selector, which allows every live section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds included section names.
    #[must_use]
    pub fn including_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds included section ids.
    #[must_use]
    pub fn including_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SectionId>,
    {
        self.include_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Adds excluded section names.
    #[must_use]
    pub fn excluding_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds excluded section ids.
    #[must_use]
    pub fn excluding_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SectionId>,
    {
        self.exclude_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Returns `true` when any include entry, by name or id, is present.
    #[must_use]
    pub fn has_includes(&self) -> bool {
        !self.include_names.is_empty() || !self.include_ids.is_empty()
    }
}

/// Finds the single identifier whose name matches exactly.
///
/// When `expected` is given, the found identifier must equal it.
///
/// # Errors
///
/// Returns [`LookupError::DataNotFound`] when nothing matches,
/// [`LookupError::DuplicateName`] when more than one entry matches and
/// [`LookupError::MismatchedData`] when the match differs from `expected`.
pub fn find_unique_id_by_name<'a, Id, I>(
    resource: ResourceType,
    entries: I,
    name: &str,
    expected: Option<&Id>,
) -> Result<Id, LookupError>
where
    Id: Clone + PartialEq + Display + 'a,
    I: IntoIterator<Item = (&'a Id, &'a str)>,
{
    let matches: Vec<&Id> = entries
        .into_iter()
        .filter(|(_, candidate)| *candidate == name)
        .map(|(id, _)| id)
        .collect();

    let found = match matches.as_slice() {
        [] => {
            return Err(LookupError::DataNotFound {
                resource,
                name: name.to_owned(),
            });
        }
        [single] => (*single).clone(),
        several => {
            return Err(LookupError::DuplicateName {
                resource,
                name: name.to_owned(),
                ids: several.iter().map(ToString::to_string).collect(),
            });
        }
    };

    match expected {
        Some(expected_id) if *expected_id != found => Err(LookupError::MismatchedData {
            resource,
            name: name.to_owned(),
            found: found.to_string(),
            expected: expected_id.to_string(),
        }),
        _ => Ok(found),
    }
}

/// Resolves a selector into the set of section ids a rule may act on.
///
/// Names are resolved against `live_sections` (id → name). Any id that is
/// both included and excluded is a conflict. If anything is included, the
/// allowed set is exactly the included ids; otherwise it is every live
/// section minus the excluded ids.
///
/// # Errors
///
/// Returns [`SectionResolutionError::Lookup`] when a name is missing or
/// ambiguous and [`SectionResolutionError::Conflict`] when include and
/// exclude overlap.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeMap;
/// use tasksweep::rule::domain::{SectionId, SectionSelector, resolve_allowed_sections};
///
/// let live = BTreeMap::from([
///     (SectionId::new("s1"), "Inbox".to_owned()),
///     (SectionId::new("s2"), "Done".to_owned()),
/// ]);
/// let selector = SectionSelector::new().excluding_names(["Done"]);
/// let allowed = resolve_allowed_sections(&selector, &live).expect("resolvable");
/// assert_eq!(allowed.into_iter().collect::<Vec<_>>(), vec![SectionId::new("s1")]);
/// ```
pub fn resolve_allowed_sections(
    selector: &SectionSelector,
    live_sections: &BTreeMap<SectionId, String>,
) -> Result<BTreeSet<SectionId>, SectionResolutionError> {
    let live_entries = || live_sections.iter().map(|(id, name)| (id, name.as_str()));

    let mut include_from_names: BTreeMap<SectionId, String> = BTreeMap::new();
    for name in &selector.include_names {
        let id = find_unique_id_by_name(ResourceType::Section, live_entries(), name, None)?;
        include_from_names.insert(id, name.clone());
    }
    let mut exclude_from_names: BTreeMap<SectionId, String> = BTreeMap::new();
    for name in &selector.exclude_names {
        let id = find_unique_id_by_name(ResourceType::Section, live_entries(), name, None)?;
        exclude_from_names.insert(id, name.clone());
    }

    let include_ids: BTreeSet<SectionId> = include_from_names
        .keys()
        .chain(&selector.include_ids)
        .cloned()
        .collect();
    let exclude_ids: BTreeSet<SectionId> = exclude_from_names
        .keys()
        .chain(&selector.exclude_ids)
        .cloned()
        .collect();

    let conflicting: Vec<&SectionId> = include_ids.intersection(&exclude_ids).collect();
    if !conflicting.is_empty() {
        let names = conflicting
            .iter()
            .flat_map(|id| [include_from_names.get(*id), exclude_from_names.get(*id)])
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        return Err(SectionResolutionError::Conflict {
            ids: conflicting.iter().map(ToString::to_string).collect(),
            names,
        });
    }

    if !include_ids.is_empty() {
        return Ok(include_ids);
    }

    Ok(live_sections
        .keys()
        .filter(|id| !exclude_ids.contains(*id))
        .cloned()
        .collect())
}
