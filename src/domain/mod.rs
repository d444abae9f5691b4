/// Pure simulation data and rules. Nothing in here knows about screens
/// beyond their ids, or about the world-level tick order.

pub mod character;
pub mod entity;
pub mod geometry;
pub mod history;
pub mod physics;
pub mod registry;
pub mod sprite;
pub mod tile;
