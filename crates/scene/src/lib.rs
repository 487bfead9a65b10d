mod gradient;
mod lighting;
mod scene;
mod spheres;

pub use self::{gradient::*, lighting::*, scene::*, spheres::*};
