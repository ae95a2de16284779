// SPDX-License-Identifier: Apache-2.0
//! Arena storage, handles, traversal, diagnostics, and the edge flip.

use core::fmt;

use pdt_kernel::{ExactReal, Kernel, Orientation, Point2};

use crate::off::MeshError;

/// Handle to a vertex of a [`Triangulation`].
///
/// Handles are stable for the lifetime of the mesh: flips rewire
/// connectivity but never move or renumber entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub(crate) usize);

/// Handle to a directed halfedge of a [`Triangulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HalfedgeId(pub(crate) usize);

/// Handle to an internal (triangle) face of a [`Triangulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub(crate) usize);

impl VertexId {
    /// The arena index of this vertex; doubles as its OFF output index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl HalfedgeId {
    pub(crate) const INVALID: Self = Self(usize::MAX);

    /// The arena index of this halfedge.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }

    /// The opposite halfedge of the same undirected edge.
    ///
    /// Twins occupy adjacent arena slots, so the involution is an XOR and
    /// `twin(twin(h)) == h` holds structurally.
    #[must_use]
    pub fn twin(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// The index of the undirected edge this halfedge belongs to.
    ///
    /// A halfedge and its twin share the edge index; useful for per-edge
    /// side tables.
    #[must_use]
    pub fn edge_index(self) -> usize {
        self.0 >> 1
    }
}

impl FaceId {
    /// The arena index of this face.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for HalfedgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Vertex<R> {
    pub(crate) point: Point2<R>,
    /// Any halfedge pointing away from this vertex.
    pub(crate) halfedge: HalfedgeId,
}

#[derive(Debug, Clone)]
pub(crate) struct Halfedge {
    /// The vertex this halfedge points at.
    pub(crate) target: VertexId,
    /// Next halfedge CCW around `face` (or along the boundary cycle).
    pub(crate) next: HalfedgeId,
    /// Previous halfedge around `face`.
    pub(crate) prev: HalfedgeId,
    /// Incident face; `None` exactly on the outer boundary cycle.
    pub(crate) face: Option<FaceId>,
}

#[derive(Debug, Clone)]
pub(crate) struct Face {
    /// Any halfedge of this face's CCW cycle.
    pub(crate) halfedge: HalfedgeId,
}

/// A planar triangulation in halfedge representation.
///
/// See the crate docs for the storage scheme and the construction contract.
/// The scalar type `R` is the coordinate type of the geometry kernel the
/// mesh was validated with.
#[derive(Debug)]
pub struct Triangulation<R> {
    pub(crate) vertices: Vec<Vertex<R>>,
    pub(crate) halfedges: Vec<Halfedge>,
    pub(crate) faces: Vec<Face>,
}

impl<R: ExactReal> Triangulation<R> {
    /// The number of vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// The number of halfedges (always twice the number of edges).
    #[must_use]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// The number of undirected edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.halfedges.len() / 2
    }

    /// The number of internal (triangle) faces.
    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// The position of a vertex.
    #[must_use]
    pub fn point(&self, v: VertexId) -> Point2<R> {
        self.vertices[v.0].point
    }

    /// An outgoing halfedge of `v`.
    #[must_use]
    pub fn vertex_halfedge(&self, v: VertexId) -> HalfedgeId {
        self.vertices[v.0].halfedge
    }

    /// The vertex `h` points at.
    #[must_use]
    pub fn target(&self, h: HalfedgeId) -> VertexId {
        self.halfedges[h.0].target
    }

    /// The vertex `h` points away from.
    #[must_use]
    pub fn source(&self, h: HalfedgeId) -> VertexId {
        self.halfedges[h.twin().0].target
    }

    /// The next halfedge CCW around the face of `h` (or along the boundary).
    #[must_use]
    pub fn next(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h.0].next
    }

    /// The previous halfedge around the face of `h`.
    #[must_use]
    pub fn prev(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h.0].prev
    }

    /// The face to the left of `h`, or `None` on the boundary.
    #[must_use]
    pub fn face(&self, h: HalfedgeId) -> Option<FaceId> {
        self.halfedges[h.0].face
    }

    /// Whether `h` lies on the outer boundary cycle.
    #[must_use]
    pub fn is_border(&self, h: HalfedgeId) -> bool {
        self.halfedges[h.0].face.is_none()
    }

    /// Whether the undirected edge of `h` has an internal face on both
    /// sides, the entry requirement for flipping.
    #[must_use]
    pub fn is_interior_edge(&self, h: HalfedgeId) -> bool {
        self.halfedges[h.0].face.is_some() && self.halfedges[h.twin().0].face.is_some()
    }

    /// An anchor halfedge of a face's CCW cycle.
    #[must_use]
    pub fn face_halfedge(&self, f: FaceId) -> HalfedgeId {
        self.faces[f.0].halfedge
    }

    /// The three vertices of a face, starting at its anchor halfedge's
    /// target and following `next`.
    #[must_use]
    pub fn face_vertices(&self, f: FaceId) -> [VertexId; 3] {
        let h0 = self.faces[f.0].halfedge;
        let h1 = self.next(h0);
        let h2 = self.next(h1);
        [self.target(h0), self.target(h1), self.target(h2)]
    }

    /// Iterates over all vertex handles in arena order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertices.len()).map(VertexId)
    }

    /// Iterates over all halfedge handles in arena order; a halfedge and its
    /// twin are always adjacent in this sequence.
    pub fn halfedges(&self) -> impl Iterator<Item = HalfedgeId> {
        (0..self.halfedges.len()).map(HalfedgeId)
    }

    /// Iterates over one canonical halfedge per undirected edge (the
    /// even-indexed one of each twin pair).
    pub fn edges(&self) -> impl Iterator<Item = HalfedgeId> {
        (0..self.halfedges.len()).step_by(2).map(HalfedgeId)
    }

    /// Iterates over all face handles in arena order.
    pub fn faces(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len()).map(FaceId)
    }

    pub(crate) fn link(&mut self, h: HalfedgeId, next: HalfedgeId) {
        self.halfedges[h.0].next = next;
        self.halfedges[next.0].prev = h;
    }

    /// Flips the edge of `h`: the diagonal of the quadrilateral formed by
    /// the two incident triangles is replaced by the other diagonal, in
    /// place. Counts are preserved, and `h` (returned) keeps its identity:
    /// it simply becomes one halfedge of the new diagonal.
    ///
    /// Precondition: the edge is interior and the union of its two incident
    /// triangles is a strictly convex quadrilateral (check with
    /// [`pdt_kernel::Kernel::is_strictly_convex_quad`]). Violating the
    /// precondition corrupts the mesh; it is a programming error, guarded
    /// only in debug builds.
    pub fn flip_edge(&mut self, h: HalfedgeId) -> HalfedgeId {
        debug_assert!(self.is_interior_edge(h), "flip_edge requires an interior edge");
        let t = h.twin();

        // Before: h runs a→c inside face f1 = (a, c, d); t runs c→a inside
        // face f2 = (a, b, c).
        let hn = self.next(h); // c→d
        let hp = self.prev(h); // d→a
        let tn = self.next(t); // a→b
        let tp = self.prev(t); // b→c

        let a = self.target(t);
        let c = self.target(h);
        let b = self.target(tn);
        let d = self.target(hn);

        let f1 = self.halfedges[h.0].face;
        let f2 = self.halfedges[t.0].face;

        // After: h runs d→b inside (b, c, d); t runs b→d inside (a, b, d).
        self.halfedges[h.0].target = b;
        self.halfedges[t.0].target = d;

        self.link(h, tp);
        self.link(tp, hn);
        self.link(hn, h);

        self.link(t, hp);
        self.link(hp, tn);
        self.link(tn, t);

        self.halfedges[tp.0].face = f1;
        self.halfedges[hp.0].face = f2;
        if let Some(f) = f1 {
            self.faces[f.0].halfedge = h;
        }
        if let Some(f) = f2 {
            self.faces[f.0].halfedge = t;
        }

        // a and c may have anchored the flipped diagonal; re-anchor them on
        // rim halfedges that still leave them.
        self.vertices[a.0].halfedge = tn;
        self.vertices[c.0].halfedge = hn;

        h
    }

    /// Walks every structural and geometric invariant of the mesh and
    /// reports the first violation.
    ///
    /// Intended for tests and debug assertions; a violation after a
    /// successful construction means a flip precondition was broken.
    pub fn check_invariants(&self) -> Result<(), MeshError> {
        let corrupt = |detail: String| Err(MeshError::Corrupt(detail));

        if self.halfedges.len() % 2 != 0 {
            return corrupt("odd halfedge count".into());
        }

        for h in self.halfedges() {
            let rec = &self.halfedges[h.0];
            if rec.next == HalfedgeId::INVALID || rec.prev == HalfedgeId::INVALID {
                return corrupt(format!("{h} has an unset link"));
            }
            if self.prev(self.next(h)) != h {
                return corrupt(format!("prev(next({h})) != {h}"));
            }
            if self.next(self.prev(h)) != h {
                return corrupt(format!("next(prev({h})) != {h}"));
            }
            // Consecutive halfedges share the vertex between them.
            if self.source(self.next(h)) != self.target(h) {
                return corrupt(format!("next({h}) does not continue at its target"));
            }
            if self.face(h).is_none() && self.face(h.twin()).is_none() {
                return corrupt(format!("edge of {h} has no incident face"));
            }
        }

        for v in self.vertices() {
            let h = self.vertices[v.0].halfedge;
            if h == HalfedgeId::INVALID || h.0 >= self.halfedges.len() {
                return corrupt(format!("{v} has no outgoing halfedge"));
            }
            if self.source(h) != v {
                return corrupt(format!("{v} anchor does not leave it"));
            }
        }

        let kernel = Kernel::<R>::new();
        for f in self.faces() {
            let h0 = self.faces[f.0].halfedge;
            let h1 = self.next(h0);
            let h2 = self.next(h1);
            if self.next(h2) != h0 {
                return corrupt(format!("{f} cycle is not a triangle"));
            }
            for h in [h0, h1, h2] {
                if self.face(h) != Some(f) {
                    return corrupt(format!("{h} disowns {f}"));
                }
            }
            let [va, vb, vc] = self.face_vertices(f);
            if kernel.orientation(self.point(va), self.point(vb), self.point(vc))
                != Orientation::LeftTurn
            {
                return corrupt(format!("{f} is not in CCW order"));
            }
        }

        // Exactly one boundary cycle, traced by `next`, convex throughout.
        let border_count = self.halfedges().filter(|&h| self.is_border(h)).count();
        if border_count == 0 {
            return corrupt("no boundary cycle".into());
        }
        let start = match self.halfedges().find(|&h| self.is_border(h)) {
            Some(h) => h,
            None => return corrupt("no boundary cycle".into()),
        };
        let mut cur = start;
        let mut walked = 0usize;
        loop {
            if !self.is_border(cur) {
                return corrupt(format!("boundary walk reached interior {cur}"));
            }
            let nxt = self.next(cur);
            if kernel.orientation(
                self.point(self.source(cur)),
                self.point(self.target(cur)),
                self.point(self.target(nxt)),
            ) == Orientation::LeftTurn
            {
                return Err(MeshError::BoundaryNotConvex);
            }
            walked += 1;
            if walked > border_count {
                return corrupt("boundary walk does not close".into());
            }
            cur = nxt;
            if cur == start {
                break;
            }
        }
        if walked != border_count {
            return Err(MeshError::Holes);
        }

        Ok(())
    }
}
