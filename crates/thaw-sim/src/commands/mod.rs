pub mod mesh;
pub mod snaps;
pub mod thaw_times;
pub mod trials;
