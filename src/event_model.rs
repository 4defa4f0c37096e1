//! Detector event records: hits, modules, tracks and candidate segments.
//!
//! All records are immutable once built. Identity is carried by the id
//! newtypes; the `same_*` methods compare identity only, while `==` (where
//! derived) compares every field.

use std::fmt;
use std::ops::Index;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Sequential hit number within one event.
    HitId
);
id_type!(ModuleId);
id_type!(
    /// Ground-truth particle number.
    TrackId
);
id_type!(
    /// Row/column of the segment in the Hamiltonian.
    SegmentId
);

/// A measured point on one detector module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub hit_id: HitId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub module_id: ModuleId,
    pub track_id: TrackId,
}

impl Hit {
    /// Identity comparison: two hits are the same hit when their ids match,
    /// whatever their coordinates.
    #[inline]
    pub fn same_hit(&self, other: &Hit) -> bool {
        self.hit_id == other.hit_id
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Index<usize> for Hit {
    type Output = f64;

    fn index(&self, axis: usize) -> &f64 {
        match axis {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("hit axis {} out of range (0..3)", axis),
        }
    }
}

/// A planar detector layer at fixed z with half-open acceptance |x| < lx/2, |y| < ly/2.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub module_id: ModuleId,
    pub z: f64,
    pub lx: f64,
    pub ly: f64,
    pub hits: Vec<Hit>,
}

impl Module {
    pub fn same_module(&self, other: &Module) -> bool {
        self.module_id == other.module_id
    }
}

/// Monte Carlo truth for one generated particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MCInfo {
    pub primary_vertex: (f64, f64, f64),
    pub phi: f64,
    pub theta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: TrackId,
    pub mc_info: MCInfo,
    pub hits: Vec<Hit>,
}

impl Track {
    pub fn same_track(&self, other: &Track) -> bool {
        self.track_id == other.track_id
    }
}

/// One generated collision: modules in detector order, truth tracks and the
/// flattened hit list (module order, then hit order within a module).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub modules: Vec<Module>,
    pub tracks: Vec<Track>,
    pub hits: Vec<Hit>,
}

impl Event {
    /// Ground-truth activation per segment: true when both endpoints were
    /// produced by the same particle.
    pub fn segment_truth(segments: &[Segment]) -> Vec<bool> {
        segments.iter().map(Segment::is_true_segment).collect()
    }
}

/// A directed candidate edge between two hits on adjacent modules.
///
/// Endpoints are copies of the event's hits; `Hit` is a small `Copy` record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub segment_id: SegmentId,
    pub hit_from: Hit,
    pub hit_to: Hit,
}

impl Segment {
    pub fn new(segment_id: SegmentId, hit_from: Hit, hit_to: Hit) -> Self {
        Self {
            segment_id,
            hit_from,
            hit_to,
        }
    }

    pub fn same_segment(&self, other: &Segment) -> bool {
        self.segment_id == other.segment_id
    }

    /// Direction vector `hit_to - hit_from`.
    pub fn to_vect(&self) -> [f64; 3] {
        [
            self.hit_to.x - self.hit_from.x,
            self.hit_to.y - self.hit_from.y,
            self.hit_to.z - self.hit_from.z,
        ]
    }

    /// Cosine similarity of the two direction vectors.
    ///
    /// Zero-length segments yield NaN, which never passes a collinearity test.
    pub fn cosine(&self, other: &Segment) -> f64 {
        let v1 = self.to_vect();
        let v2 = other.to_vect();
        let n1 = (v1[0] * v1[0] + v1[1] * v1[1] + v1[2] * v1[2]).sqrt();
        let n2 = (v2[0] * v2[0] + v2[1] * v2[1] + v2[2] * v2[2]).sqrt();
        (v1[0] * v2[0] + v1[1] * v2[1] + v1[2] * v2[2]) / (n1 * n2)
    }

    /// True when `next` starts at the hit where `self` ends (by hit id).
    #[inline]
    pub fn joins(&self, next: &Segment) -> bool {
        self.hit_to.same_hit(&next.hit_from)
    }

    pub fn is_true_segment(&self) -> bool {
        self.hit_from.track_id == self.hit_to.track_id
    }
}

#[cfg(test)]
pub(crate) fn hit(id: usize, x: f64, y: f64, z: f64, track: usize) -> Hit {
    Hit {
        hit_id: HitId(id),
        x,
        y,
        z,
        module_id: ModuleId(z as usize),
        track_id: TrackId(track),
    }
}
