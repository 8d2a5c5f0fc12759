#![warn(missing_docs)]

//! Editable polygon meshes on a half-edge structure.
//!
//! The [`HalfedgeMesh`] stores vertices, edges, half-edges, and faces in
//! generational arenas and keeps them consistent across a family of
//! topology-preserving edits:
//!
//! - local operations: edge flip/split/collapse, edge and vertex
//!   dissolution, face bevel ([`ops`])
//! - global operations: triangulation, linear and Catmull-Clark
//!   subdivision position rules ([`subdivide`]), and quadric-error-metric
//!   simplification ([`simplify`])
//!
//! Every operation either succeeds and leaves the mesh satisfying the
//! connectivity invariants checked by [`HalfedgeMesh::validate`], or
//! refuses with an [`EditError`] and leaves the mesh untouched. Erased
//! entities are only marked; [`HalfedgeMesh::sweep`] reclaims them once
//! callers are done dereferencing.

pub mod mesh;
pub mod ops;
pub mod simplify;
pub mod subdivide;
pub mod validate;

pub use mesh::{
    BuildError, Edge, EdgeId, Face, FaceId, Halfedge, HalfedgeId, HalfedgeMesh, Vertex, VertexId,
};
pub use simplify::edge_collapsable;
pub use validate::ValidateError;

use thiserror::Error;

/// Why a local operation refused to run.
///
/// A refusing operation leaves the mesh exactly as it found it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditError {
    /// Flipping a boundary edge would detach the hole loop.
    #[error("cannot flip a boundary edge")]
    BoundaryEdge,
    /// Edge split requires triangles on both sides of the edge.
    #[error("edge split requires triangles on both sides")]
    NonTriangleNeighborhood,
    /// Dissolving this edge would pinch its face ring apart.
    #[error("dissolving this edge would disconnect its faces")]
    WouldPinch,
    /// Collapsing this edge would produce a non-manifold mesh.
    #[error("collapse would produce a non-manifold configuration")]
    DegenerateCollapse,
    /// The mesh must keep at least one vertex.
    #[error("cannot erase the last vertex")]
    LastVertex,
    /// Beveling a boundary face is meaningless.
    #[error("cannot bevel a boundary face")]
    BoundaryFace,
    /// The operation is declared but not supported.
    #[error("operation not supported")]
    Unsupported,
}
