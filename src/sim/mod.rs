/// The running world and its per-tick step.

pub mod event;
pub mod level;
pub mod respawn;
pub mod screen;
pub mod step;
pub mod world;
