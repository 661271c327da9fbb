//! tilecollide: tile-grid collision and contact resolution for 2D platformers

pub mod types;
pub mod tiled;
pub mod error;
pub mod slope;
pub mod tilemap;
pub mod collider;
pub mod api;
pub mod narrowphase;
pub mod contact;
pub mod contact_map;
pub mod lerp;
mod ground;
mod entities;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::CollisionError;
pub use crate::tiled::{TiledPoint, TiledRange, TiledRect, TiledSize};
pub use crate::tilemap::{SlopeRun, TileDescriptor, TileMap};
pub use crate::collider::{ColliderFlags, ColliderGeometry, ColliderState};
pub use crate::contact::{Contact, ContactContext, ContactEvent, ContactPhase, ContactedObject};
pub use crate::world::CollisionWorld;
