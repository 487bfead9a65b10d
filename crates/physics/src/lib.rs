mod buffer;
mod config;
mod physics;

pub use self::{buffer::*, config::*, physics::*};
