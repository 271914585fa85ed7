use crate::track::TrackKey;
use serde::{Deserialize, Serialize};

/// Ordered working set of track keys threaded through query, ranking and
/// post-processing. Created fresh per query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    keys: Vec<TrackKey>,
}

impl ResultSet {
    #[inline]
    #[must_use]
    pub fn new(keys: Vec<TrackKey>) -> Self {
        Self { keys }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn keys(&self) -> &[TrackKey] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    #[inline]
    pub fn into_keys(self) -> Vec<TrackKey> {
        self.keys
    }
}

impl From<Vec<TrackKey>> for ResultSet {
    fn from(keys: Vec<TrackKey>) -> Self {
        ResultSet::new(keys)
    }
}

impl FromIterator<TrackKey> for ResultSet {
    fn from_iter<I: IntoIterator<Item = TrackKey>>(iter: I) -> Self {
        ResultSet::new(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for ResultSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        ResultSet::new(iter.into_iter().map(str::to_string).collect())
    }
}
