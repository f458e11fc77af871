//! Group-by precedence between tags and dimensions.

use super::{GroupKey, GroupSpec};

/// Resolve requested grouping into provider group keys.
///
/// Precedence:
/// 1. exactly one dimension and one tag: the dimension, then the tag
/// 2. otherwise any tags: tags only, dimensions are dropped
/// 3. otherwise: dimensions only
#[must_use]
pub fn resolve(dims: &[String], tags: &[String]) -> Vec<GroupKey> {
    match (dims, tags) {
        ([dim], [tag]) => vec![GroupKey::dimension(dim.clone()), GroupKey::tag(tag.clone())],
        (_, tags) if !tags.is_empty() => tags.iter().cloned().map(GroupKey::tag).collect(),
        (dims, _) => dims.iter().cloned().map(GroupKey::dimension).collect(),
    }
}

impl GroupSpec {
    /// Resolve this spec with [`resolve`].
    #[must_use]
    pub fn resolve(&self) -> Vec<GroupKey> {
        resolve(&self.dimensions, &self.tags)
    }
}
