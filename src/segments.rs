//! Candidate segment enumeration between adjacent modules.

use crate::event_model::{Event, Segment, SegmentId};

/// All candidate segments of one event, flat and grouped by module pair.
///
/// `grouped[k]` holds the segments from module `k` to module `k + 1`, in the
/// same order they appear in `segments`. Segment ids equal flat positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentSet {
    pub segments: Vec<Segment>,
    pub grouped: Vec<Vec<Segment>>,
}

impl SegmentSet {
    /// Cartesian product of the hit lists of every consecutive module pair,
    /// from-hits varying slower. Ids run over the whole event.
    pub fn build(event: &Event) -> Self {
        let n_pairs = event.modules.len().saturating_sub(1);
        let mut segments = Vec::new();
        let mut grouped = Vec::with_capacity(n_pairs);
        let mut next_id = 0usize;

        for pair in event.modules.windows(2) {
            let (from_module, to_module) = (&pair[0], &pair[1]);
            let mut group = Vec::with_capacity(from_module.hits.len() * to_module.hits.len());
            for from_hit in &from_module.hits {
                for to_hit in &to_module.hits {
                    let segment = Segment::new(SegmentId(next_id), *from_hit, *to_hit);
                    next_id += 1;
                    group.push(segment);
                    segments.push(segment);
                }
            }
            grouped.push(group);
        }

        log::debug!(
            "built {} segments in {} module-pair groups",
            segments.len(),
            grouped.len()
        );

        Self { segments, grouped }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Pairs of groups at consecutive indices, the only pairs that can couple.
    pub fn consecutive_groups(&self) -> impl Iterator<Item = (&[Segment], &[Segment])> + '_ {
        self.grouped
            .windows(2)
            .map(|w| (w[0].as_slice(), w[1].as_slice()))
    }
}

/// Expected segment count: Σ hits(module_i) · hits(module_{i+1}).
pub fn expected_segment_count(event: &Event) -> usize {
    event
        .modules
        .windows(2)
        .map(|w| w[0].hits.len() * w[1].hits.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_model::{hit, Module, ModuleId};

    fn module(id: usize, hits: Vec<crate::event_model::Hit>) -> Module {
        Module {
            module_id: ModuleId(id),
            z: id as f64,
            lx: 100.0,
            ly: 100.0,
            hits,
        }
    }

    fn event(modules: Vec<Module>) -> Event {
        let hits = modules.iter().flat_map(|m| m.hits.clone()).collect();
        Event {
            modules,
            tracks: Vec::new(),
            hits,
        }
    }

    #[test]
    fn count_matches_product_of_neighbouring_modules() {
        let ev = event(vec![
            module(0, vec![hit(0, 0.0, 0.0, 0.0, 0), hit(1, 1.0, 0.0, 0.0, 1)]),
            module(1, vec![hit(2, 0.0, 0.0, 1.0, 0), hit(3, 1.0, 0.0, 1.0, 1), hit(4, 2.0, 0.0, 1.0, 2)]),
            module(2, vec![hit(5, 0.0, 0.0, 2.0, 0)]),
        ]);
        let set = SegmentSet::build(&ev);
        assert_eq!(set.len(), 2 * 3 + 3 * 1);
        assert_eq!(set.len(), expected_segment_count(&ev));
        assert_eq!(set.grouped.len(), 2);
        assert_eq!(set.grouped[0].len(), 6);
        assert_eq!(set.grouped[1].len(), 3);
    }

    #[test]
    fn ids_are_sequential_with_from_hits_slowest() {
        let ev = event(vec![
            module(0, vec![hit(0, 0.0, 0.0, 0.0, 0), hit(1, 1.0, 0.0, 0.0, 1)]),
            module(1, vec![hit(2, 0.0, 0.0, 1.0, 0), hit(3, 1.0, 0.0, 1.0, 1)]),
        ]);
        let set = SegmentSet::build(&ev);
        let pairs: Vec<(usize, usize, usize)> = set
            .segments
            .iter()
            .map(|s| (s.segment_id.0, s.hit_from.hit_id.0, s.hit_to.hit_id.0))
            .collect();
        assert_eq!(pairs, vec![(0, 0, 2), (1, 0, 3), (2, 1, 2), (3, 1, 3)]);
        assert_eq!(set.grouped[0], set.segments);
    }

    #[test]
    fn empty_module_yields_empty_groups() {
        let ev = event(vec![
            module(0, vec![hit(0, 0.0, 0.0, 0.0, 0)]),
            module(1, vec![]),
            module(2, vec![hit(1, 0.0, 0.0, 2.0, 0)]),
        ]);
        let set = SegmentSet::build(&ev);
        assert!(set.is_empty());
        assert_eq!(set.grouped, vec![Vec::new(), Vec::new()]);
    }

    #[test]
    fn no_segments_skip_a_module() {
        let ev = event(vec![
            module(0, vec![hit(0, 0.0, 0.0, 0.0, 0)]),
            module(1, vec![hit(1, 0.0, 0.0, 1.0, 0)]),
            module(2, vec![hit(2, 0.0, 0.0, 2.0, 0)]),
        ]);
        let set = SegmentSet::build(&ev);
        for s in &set.segments {
            assert_eq!(s.hit_to.module_id.0, s.hit_from.module_id.0 + 1);
        }
    }

    #[test]
    fn single_module_has_no_groups() {
        let ev = event(vec![module(0, vec![hit(0, 0.0, 0.0, 0.0, 0)])]);
        let set = SegmentSet::build(&ev);
        assert!(set.grouped.is_empty());
        assert_eq!(set.consecutive_groups().count(), 0);
    }
}
