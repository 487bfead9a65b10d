mod gpu;
mod render;
mod spheres;

pub use self::{gpu::*, render::*, spheres::*};
