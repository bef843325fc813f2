pub mod camera;
pub mod mesh;
pub mod model;
pub mod texture;
