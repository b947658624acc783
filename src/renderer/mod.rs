//! Presentation layer
//!
//! The simulation never talks to a graphics API. Actors append screen-space
//! commands to a [`DrawList`] through the [`Camera`]; a backend resolves them
//! against a [`SpriteAtlas`] and blits.

pub mod background;
pub mod camera;
pub mod draw_list;
pub mod sprites;

pub use background::Background;
pub use camera::Camera;
pub use draw_list::{DrawCmd, DrawList, Sprite};
pub use sprites::{Facing, SpriteAtlas, SpriteKey, SpriteQuad, SpriteSheet};
