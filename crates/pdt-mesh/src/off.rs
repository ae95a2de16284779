// SPDX-License-Identifier: Apache-2.0
//! OFF input with staged topology validation, and OFF output.
//!
//! The reader accepts the ASCII OFF subset this engine works with: the
//! literal `OFF` signature, a `V F E` count line (`E` is not validated),
//! `V` lines of `x y z` (the `z` is read and discarded), and `F` records of
//! `3 i j k` with distinct in-range indices in CCW order. Tokens may be
//! split across lines arbitrarily; trailing content is ignored. Any
//! deviation, and any topology defect found while assembling the halfedge
//! structure, aborts construction with a [`MeshError`]; a partially built
//! mesh is never observable.

use std::io::{self, BufRead, Write};

use rustc_hash::FxHashMap;
use thiserror::Error;

use pdt_kernel::{ExactReal, Kernel, Orientation, Point2};

use crate::mesh::{Face, FaceId, Halfedge, HalfedgeId, Triangulation, Vertex, VertexId};

/// Why a triangulation could not be constructed (or, for
/// [`MeshError::Corrupt`], why a built mesh no longer satisfies its
/// invariants).
#[derive(Debug, Error)]
pub enum MeshError {
    /// The underlying stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The stream does not start with the `OFF` signature.
    #[error("not OFF format (signature {found:?})")]
    NotOff {
        /// The token found in place of `OFF`.
        found: String,
    },
    /// The stream ended where a token was required.
    #[error("unexpected end of input while reading {expected}")]
    UnexpectedEof {
        /// What the reader was looking for.
        expected: &'static str,
    },
    /// A token could not be parsed as the required kind of number.
    #[error("cannot parse {found:?} as {expected}")]
    InvalidToken {
        /// What the reader was looking for.
        expected: &'static str,
        /// The offending token.
        found: String,
    },
    /// A vertex coordinate parsed to an infinity or NaN.
    #[error("non-finite coordinate {found:?} for vertex {vertex}")]
    NonFiniteCoordinate {
        /// The vertex ordinal in the input.
        vertex: usize,
        /// The offending token.
        found: String,
    },
    /// A face record declared a degree other than three.
    #[error("face {face} is not a triangle (degree {degree})")]
    NonTriangleFace {
        /// The face ordinal in the input.
        face: usize,
        /// The declared degree.
        degree: usize,
    },
    /// A face referenced a vertex index at or beyond the vertex count.
    #[error("face {face} references vertex {index} outside 0..{limit}")]
    VertexIndexOutOfRange {
        /// The face ordinal in the input.
        face: usize,
        /// The out-of-range index.
        index: usize,
        /// The number of vertices declared.
        limit: usize,
    },
    /// A face listed the same vertex twice.
    #[error("face {face} repeats a vertex")]
    RepeatedFaceVertex {
        /// The face ordinal in the input.
        face: usize,
    },
    /// A face's vertices are not in strict CCW (left-turn) order.
    #[error("face {face} has incorrect orientation")]
    FaceNotCcw {
        /// The face ordinal in the input.
        face: usize,
    },
    /// Two faces claimed the same directed side of an edge.
    #[error("face {face} overlaps a previously added face")]
    CoincidentFaces {
        /// The face ordinal in the input.
        face: usize,
    },
    /// A vertex is referenced by no face.
    #[error("vertex {index} has no incident edges")]
    IsolatedVertex {
        /// The vertex ordinal in the input.
        index: usize,
    },
    /// The border halfedges form more than one cycle.
    #[error("one or more holes are present")]
    Holes,
    /// Three consecutive boundary vertices form a left turn, so the outer
    /// face is not the convex hull.
    #[error("border is not a convex hull")]
    BoundaryNotConvex,
    /// The stream declared no vertices or no faces.
    #[error("empty triangulation")]
    Empty,
    /// A built mesh violates a structural invariant (diagnostic only; see
    /// [`Triangulation::check_invariants`]).
    #[error("corrupt topology: {0}")]
    Corrupt(String),
}

/// Whitespace-token reader over a buffered stream.
struct Tokens<I> {
    input: I,
    line: String,
    pending: std::vec::IntoIter<String>,
}

impl<I: BufRead> Tokens<I> {
    fn new(input: I) -> Self {
        Self {
            input,
            line: String::new(),
            pending: Vec::new().into_iter(),
        }
    }

    fn next_token(&mut self) -> Result<Option<String>, MeshError> {
        loop {
            if let Some(tok) = self.pending.next() {
                return Ok(Some(tok));
            }
            self.line.clear();
            if self.input.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.pending = self
                .line
                .split_whitespace()
                .map(String::from)
                .collect::<Vec<_>>()
                .into_iter();
        }
    }

    fn require(&mut self, expected: &'static str) -> Result<String, MeshError> {
        self.next_token()?
            .ok_or(MeshError::UnexpectedEof { expected })
    }

    fn require_usize(&mut self, expected: &'static str) -> Result<usize, MeshError> {
        let tok = self.require(expected)?;
        tok.parse()
            .map_err(|_| MeshError::InvalidToken { expected, found: tok })
    }

    fn require_f64(&mut self, expected: &'static str) -> Result<f64, MeshError> {
        let tok = self.require(expected)?;
        tok.parse()
            .map_err(|_| MeshError::InvalidToken { expected, found: tok })
    }
}

/// Staged halfedge assembler: vertices first, then faces (creating twin
/// pairs on demand and rejecting overlaps), then boundary stitching and the
/// global validity checks.
struct Builder<R> {
    vertices: Vec<Vertex<R>>,
    halfedges: Vec<Halfedge>,
    faces: Vec<Face>,
    edge_lut: FxHashMap<(usize, usize), HalfedgeId>,
    kernel: Kernel<R>,
}

impl<R: ExactReal> Builder<R> {
    fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            faces: Vec::new(),
            edge_lut: FxHashMap::default(),
            kernel: Kernel::new(),
        }
    }

    fn add_vertex(&mut self, point: Point2<R>) {
        self.vertices.push(Vertex {
            point,
            halfedge: HalfedgeId::INVALID,
        });
    }

    /// The halfedge `va → vb`, creating the twin pair on first sight of the
    /// unordered endpoint pair.
    fn lookup_halfedge(&mut self, va: VertexId, vb: VertexId) -> HalfedgeId {
        let key = if va < vb { (va.0, vb.0) } else { (vb.0, va.0) };
        if let Some(&h) = self.edge_lut.get(&key) {
            if self.halfedges[h.0].target == vb {
                h
            } else {
                h.twin()
            }
        } else {
            let h = HalfedgeId(self.halfedges.len());
            self.halfedges.push(Halfedge {
                target: vb,
                next: HalfedgeId::INVALID,
                prev: HalfedgeId::INVALID,
                face: None,
            });
            self.halfedges.push(Halfedge {
                target: va,
                next: HalfedgeId::INVALID,
                prev: HalfedgeId::INVALID,
                face: None,
            });
            self.edge_lut.insert(key, h);
            if self.vertices[va.0].halfedge == HalfedgeId::INVALID {
                self.vertices[va.0].halfedge = h;
            }
            if self.vertices[vb.0].halfedge == HalfedgeId::INVALID {
                self.vertices[vb.0].halfedge = h.twin();
            }
            h
        }
    }

    fn add_face(&mut self, ordinal: usize, ia: usize, ib: usize, ic: usize) -> Result<(), MeshError> {
        let limit = self.vertices.len();
        for index in [ia, ib, ic] {
            if index >= limit {
                return Err(MeshError::VertexIndexOutOfRange {
                    face: ordinal,
                    index,
                    limit,
                });
            }
        }
        if ia == ib || ib == ic || ia == ic {
            return Err(MeshError::RepeatedFaceVertex { face: ordinal });
        }
        let (va, vb, vc) = (VertexId(ia), VertexId(ib), VertexId(ic));
        let (pa, pb, pc) = (
            self.vertices[ia].point,
            self.vertices[ib].point,
            self.vertices[ic].point,
        );
        if self.kernel.orientation(pa, pb, pc) != Orientation::LeftTurn {
            return Err(MeshError::FaceNotCcw { face: ordinal });
        }

        let ab = self.lookup_halfedge(va, vb);
        let bc = self.lookup_halfedge(vb, vc);
        let ca = self.lookup_halfedge(vc, va);
        if self.halfedges[ab.0].face.is_some()
            || self.halfedges[bc.0].face.is_some()
            || self.halfedges[ca.0].face.is_some()
        {
            return Err(MeshError::CoincidentFaces { face: ordinal });
        }

        let f = FaceId(self.faces.len());
        self.faces.push(Face { halfedge: ab });
        for (h, n) in [(ab, bc), (bc, ca), (ca, ab)] {
            self.halfedges[h.0].face = Some(f);
            self.halfedges[h.0].next = n;
            self.halfedges[n.0].prev = h;
        }
        Ok(())
    }

    fn finish(self) -> Result<Triangulation<R>, MeshError> {
        let Self {
            vertices,
            halfedges,
            faces,
            edge_lut,
            kernel,
        } = self;

        if vertices.is_empty() || faces.is_empty() {
            return Err(MeshError::Empty);
        }

        let mut mesh = Triangulation {
            vertices,
            halfedges,
            faces,
        };

        // An edge both of whose halfedges stayed faceless would derail the
        // boundary rotation below; the lut holds one halfedge per edge.
        for &h in edge_lut.values() {
            if mesh.halfedges[h.0].face.is_none() && mesh.halfedges[h.twin().0].face.is_none() {
                return Err(MeshError::Corrupt(format!("edge of {h} has no incident face")));
            }
        }

        for (index, v) in mesh.vertices.iter().enumerate() {
            if v.halfedge == HalfedgeId::INVALID {
                return Err(MeshError::IsolatedVertex { index });
            }
        }

        Self::stitch_boundary(&mut mesh)?;
        Self::check_boundary_convex(&mesh, &kernel)?;

        Ok(mesh)
    }

    /// Links the faceless halfedges into the boundary cycle.
    ///
    /// From a border halfedge ending at vertex `v`, the following border
    /// halfedge is the one leaving `v`; it is found by rotating through the
    /// interior halfedges that end at `v` via `prev(twin(·))` until a
    /// faceless twin appears. Border halfedges left unlinked after the cycle
    /// through the starting halfedge closes belong to a second cycle, i.e. a
    /// hole.
    fn stitch_boundary(mesh: &mut Triangulation<R>) -> Result<(), MeshError> {
        let border_total = mesh
            .halfedges()
            .filter(|&h| mesh.halfedges[h.0].face.is_none())
            .count();
        let start = match mesh
            .halfedges()
            .find(|&h| mesh.halfedges[h.0].face.is_none())
        {
            Some(h) => h,
            // A triangulation with faces always has a hull.
            None => return Err(MeshError::Corrupt("no border halfedge".into())),
        };

        let mut cur = start;
        let mut stitched = 0usize;
        loop {
            let mut g = cur;
            let mut rotations = 0usize;
            let next_border = loop {
                let t = g.twin();
                if mesh.halfedges[t.0].face.is_none() {
                    break t;
                }
                g = mesh.halfedges[t.0].prev;
                rotations += 1;
                if rotations > mesh.halfedges.len() {
                    return Err(MeshError::Corrupt(format!(
                        "boundary rotation around target of {cur} found no border halfedge"
                    )));
                }
            };
            mesh.link(cur, next_border);
            stitched += 1;
            if stitched > border_total {
                return Err(MeshError::Corrupt("boundary walk does not close".into()));
            }
            cur = next_border;
            if cur == start {
                break;
            }
        }

        if stitched != border_total {
            return Err(MeshError::Holes);
        }
        Ok(())
    }

    fn check_boundary_convex(mesh: &Triangulation<R>, kernel: &Kernel<R>) -> Result<(), MeshError> {
        let start = match mesh.halfedges().find(|&h| mesh.is_border(h)) {
            Some(h) => h,
            None => return Err(MeshError::Corrupt("no border halfedge".into())),
        };
        let mut cur = start;
        loop {
            let nxt = mesh.next(cur);
            if kernel.orientation(
                mesh.point(mesh.source(cur)),
                mesh.point(mesh.target(cur)),
                mesh.point(mesh.target(nxt)),
            ) == Orientation::LeftTurn
            {
                return Err(MeshError::BoundaryNotConvex);
            }
            cur = nxt;
            if cur == start {
                return Ok(());
            }
        }
    }
}

impl<R: ExactReal> Triangulation<R> {
    /// Reads a triangulation in OFF format, validating topology as described
    /// in the module docs.
    pub fn read_off<I: BufRead>(input: I) -> Result<Self, MeshError> {
        let mut tokens = Tokens::new(input);

        let signature = tokens.require("OFF signature")?;
        if signature != "OFF" {
            return Err(MeshError::NotOff { found: signature });
        }
        let num_vertices = tokens.require_usize("vertex count")?;
        let num_faces = tokens.require_usize("face count")?;
        // The edge count is present in the format but not validated.
        let _ = tokens.require_usize("edge count")?;

        let mut builder = Builder::new();
        for vertex in 0..num_vertices {
            let x = tokens.require_f64("vertex x coordinate")?;
            let y = tokens.require_f64("vertex y coordinate")?;
            // The z coordinate is read and discarded.
            let _ = tokens.require_f64("vertex z coordinate")?;
            for value in [x, y] {
                if !value.is_finite() {
                    return Err(MeshError::NonFiniteCoordinate {
                        vertex,
                        found: value.to_string(),
                    });
                }
            }
            builder.add_vertex(Point2::new(R::from_f64(x), R::from_f64(y)));
        }
        for face in 0..num_faces {
            let degree = tokens.require_usize("face degree")?;
            if degree != 3 {
                return Err(MeshError::NonTriangleFace { face, degree });
            }
            let i = tokens.require_usize("face vertex index")?;
            let j = tokens.require_usize("face vertex index")?;
            let k = tokens.require_usize("face vertex index")?;
            builder.add_face(face, i, j, k)?;
        }
        builder.finish()
    }

    /// Writes the triangulation in OFF format.
    ///
    /// Vertices are numbered in iteration order; coordinates round-trip
    /// (shortest representation that parses back to the same scalar), and
    /// `z` is emitted as `0`. Faces are emitted from their anchor halfedge's
    /// successive targets.
    pub fn write_off<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "OFF")?;
        writeln!(out, "{} {} 0", self.num_vertices(), self.num_faces())?;
        for v in self.vertices() {
            let p = self.point(v);
            writeln!(out, "{} {} 0", p.x().to_f64(), p.y().to_f64())?;
        }
        for f in self.faces() {
            let [i, j, k] = self.face_vertices(f);
            writeln!(out, "3 {} {} {}", i.index(), j.index(), k.index())?;
        }
        Ok(())
    }
}
