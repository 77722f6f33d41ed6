//! Selector search and `/`-separated path resolution over a [`Document`]

use tracing::trace;

use crate::document::{Document, NodeId};
use crate::error::{Error, Result};
use crate::selector::Selector;

/// Split a path on `/` outside of `[...]`, so constraint values may contain `/`
pub fn split_path(path: &str) -> Result<Vec<Selector>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in path.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                segments.push(Selector::parse(path.get(start..i).unwrap_or_default())?);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(Selector::parse(path.get(start..).unwrap_or_default())?);
    Ok(segments)
}

impl Document {
    /// Elements matching `selector`
    ///
    /// With `deep`, `start` itself is tested first and then every descendant
    /// in document order. Otherwise only the direct children of `start` are
    /// tested.
    pub fn find(&self, start: NodeId, selector: &str, deep: bool) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        self.find_with(start, &selector, deep)
    }

    pub fn find_with(&self, start: NodeId, selector: &Selector, deep: bool) -> Result<Vec<NodeId>> {
        let origin = self.element(start)?;
        let mut found = Vec::new();

        if !deep {
            found.extend(
                origin
                    .children()
                    .filter(|child| selector.matches(*child))
                    .map(|child| child.id()),
            );
            return Ok(found);
        }

        let mut pending = vec![start];
        while let Some(current) = pending.pop() {
            let Some(element) = self.get(current) else {
                continue;
            };
            if selector.matches(element) {
                found.push(current);
            }
            pending.extend(self.children(current).iter().rev().copied());
        }
        Ok(found)
    }

    pub fn find_first(&self, start: NodeId, selector: &str, deep: bool) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        self.find_first_with(start, &selector, deep)
    }

    pub fn find_first_with(
        &self,
        start: NodeId,
        selector: &Selector,
        deep: bool,
    ) -> Result<Option<NodeId>> {
        if deep {
            return Ok(self.find_with(start, selector, true)?.into_iter().next());
        }
        let origin = self.element(start)?;
        let found = origin
            .children()
            .find(|child| selector.matches(*child))
            .map(|child| child.id());
        Ok(found)
    }

    /// Walk `path` from the children of `start`, one shallow first match per
    /// segment; `None` as soon as a segment does not resolve
    pub fn access(&self, start: NodeId, path: &str) -> Result<Option<NodeId>> {
        let segments = split_path(path)?;
        self.walk(start, &segments)
    }

    /// Like [`Self::access`] but a segment that does not resolve is an error
    pub fn access_required(&self, start: NodeId, path: &str) -> Result<NodeId> {
        let segments = split_path(path)?;
        let mut current = start;
        for segment in &segments {
            current = self
                .find_first_with(current, segment, false)?
                .ok_or_else(|| Error::not_found(format!("'{segment}' in path '{path}'")))?;
        }
        Ok(current)
    }

    /// Every sibling matching the last segment of `path`
    ///
    /// All but the last segment resolve to a container as in
    /// [`Self::access`]; the last segment is then a shallow search over that
    /// container. Unresolved containers yield an empty list.
    pub fn access_all(&self, start: NodeId, path: &str) -> Result<Vec<NodeId>> {
        let mut segments = split_path(path)?;
        let Some(last) = segments.pop() else {
            return Ok(vec![start]);
        };
        match self.walk(start, &segments)? {
            Some(container) => self.find_with(container, &last, false),
            None => Ok(Vec::new()),
        }
    }

    /// [`Self::access`] from the root element
    pub fn access_from_root(&self, path: &str) -> Result<Option<NodeId>> {
        self.access(self.root(), path)
    }

    /// [`Self::access_all`] from the root element
    pub fn access_all_from_root(&self, path: &str) -> Result<Vec<NodeId>> {
        self.access_all(self.root(), path)
    }

    fn walk(&self, start: NodeId, segments: &[Selector]) -> Result<Option<NodeId>> {
        let mut current = start;
        for segment in segments {
            match self.find_first_with(current, segment, false)? {
                Some(next) => current = next,
                None => {
                    trace!(segment = %segment, "path segment did not resolve");
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }
}
