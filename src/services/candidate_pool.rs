use std::collections::HashSet;

use crate::models::CatalogTrack;

/// Deduplicated working set of candidate tracks for one request
///
/// Ids passed to [`CandidatePool::excluding`] are marked as seen up front and
/// can never be accepted, which keeps seed tracks out of the result.
#[derive(Debug, Default)]
pub struct CandidatePool {
    seen: HashSet<String>,
    tracks: Vec<CatalogTrack>,
}

impl CandidatePool {
    pub fn excluding<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            seen: ids.into_iter().collect(),
            tracks: Vec::new(),
        }
    }

    /// Accepts the track unless its id is empty or already seen
    pub fn offer(&mut self, track: CatalogTrack) -> bool {
        if track.id.is_empty() || !self.seen.insert(track.id.clone()) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// Offers every track, returning how many were accepted
    pub fn offer_all<I>(&mut self, tracks: I) -> usize
    where
        I: IntoIterator<Item = CatalogTrack>,
    {
        tracks
            .into_iter()
            .map(|track| self.offer(track))
            .filter(|accepted| *accepted)
            .count()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[CatalogTrack] {
        &self.tracks
    }

    pub fn into_tracks(self) -> Vec<CatalogTrack> {
        self.tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> CatalogTrack {
        serde_json::from_value(serde_json::json!({"id": id, "name": id})).unwrap()
    }

    #[test]
    fn test_excluded_ids_are_never_accepted() {
        let mut pool = CandidatePool::excluding(vec!["T1".to_string()]);
        assert!(!pool.offer(track("T1")));
        assert!(pool.offer(track("T2")));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.tracks()[0].id, "T2");
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let mut pool = CandidatePool::default();
        let accepted = pool.offer_all(vec![track("a"), track("b"), track("a"), track("c"), track("b")]);
        assert_eq!(accepted, 3);
        let ids: Vec<&str> = pool.tracks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_ids_are_rejected() {
        let mut pool = CandidatePool::default();
        assert!(!pool.offer(track("")));
        assert!(pool.is_empty());
    }
}
