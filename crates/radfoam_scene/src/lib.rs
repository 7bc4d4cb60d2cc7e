//! radfoam_scene - Radiance-foam scene files
//!
//! A trained radiance foam is a point cloud whose points are the sites of a
//! Voronoi-like cell complex. Each vertex carries a density, a base color
//! and spherical-harmonic color coefficients; the adjacency list links each
//! cell to its neighbors so a ray can walk from cell to cell.
//!
//! Scenes are stored as PLY with a `vertex` and an `adjacency` element.
//!
//! ```ignore
//! use point_bvh::AabbTree;
//! use radfoam_scene::RadFoamScene;
//!
//! let scene = RadFoamScene::load("scene.ply")?;
//! let tree = AabbTree::build(scene.points().clone())?;
//! ```

pub mod error;
pub mod ply;
pub mod scene;

pub use error::SceneError;
pub use ply::{PlyElement, PlyFormat, PlyHeader, PlyProperty, PlyReader, ScalarType};
pub use scene::{RadFoamScene, RadFoamVertex, SH_COEFFS};
