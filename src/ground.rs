//! Collider against the tile map: ground, one-way and slope tiles, plus the
//! gap and corner-jump bookkeeping done on empty tiles.

use glam::Vec2;
use smallvec::smallvec;

use crate::collider::{ColliderFlags, ColliderMovement, ColliderState};
use crate::contact::{ContactContext, ContactPolicy, ContactedObject, SideList};
use crate::slope::{self, SLOPE_RESOLUTION};
use crate::tilemap::{TileDescriptor, TileIntersection, TileMap};
use crate::tiled::TiledPoint;
use crate::types::*;
use crate::world::CollisionWorld;

impl CollisionWorld {
    /// First blocking tile contact for this sub-move. Non-blocking tile contacts go to `non_collisions`.
    pub(crate) fn ground_contact(
        &self,
        map: &TileMap,
        body: &mut BodyDesc,
        movement: &ColliderMovement,
        contacts: &[ContactContext],
        non_collisions: &mut Vec<ContactContext>,
    ) -> Option<ContactContext> {
        let should_collide = body.roles.contains(BodyRoles::HOLDS_TILES);
        let already_touched = contacts.iter().any(|c| {
            c.collider == body.key && matches!(c.other, ContactedObject::Tile | ContactedObject::EmptyTile)
        });
        let should_test = !already_touched && self.can_contact_tiles(body.category);
        if !should_collide && !should_test {
            return None;
        }

        let (tiles, empties): (Vec<_>, Vec<_>) = map
            .tile_intersections(&movement.proposed_frame, movement.current_position)
            .into_iter()
            .partition(|t| t.tile.is_some());

        if let Some(contact) = self.collider_tile_contact(map, body, movement, &tiles, should_collide, non_collisions) {
            return Some(contact);
        }
        self.empty_tiles_contact(map, body, movement, &empties, non_collisions);
        None
    }

    fn can_contact_tiles(&self, category: CategoryMask) -> bool {
        self.contact_tests.can_have_contact(category, CategoryMask::COLLIDER_TILE)
    }

    /// Visit occupied tiles nearest first and return the first collision.
    fn collider_tile_contact(
        &self,
        map: &TileMap,
        body: &mut BodyDesc,
        movement: &ColliderMovement,
        tiles: &[TileIntersection],
        should_collide: bool,
        non_collisions: &mut Vec<ContactContext>,
    ) -> Option<ContactContext> {
        let vertical_velocity = body.proposed.y - body.position.y;
        for tile in tiles {
            let contact = match tile.tile {
                Some(TileDescriptor::Slope { left, right }) if slope::is_supported(left, right) => {
                    let Some((run, _)) = map.slope_run_at(tile.point) else { continue };
                    self.slope_tile_contact(body, movement, should_collide, tile, run, vertical_velocity)
                }
                Some(_) => self.basic_tile_contact(body, movement, should_collide, tile),
                None => continue,
            };
            match contact {
                Some(c) if c.is_collision => return Some(c),
                Some(c) => non_collisions.push(c),
                None => {}
            }
        }
        None
    }

    /// Ground and one-way tiles. Unsupported slopes are treated as ground.
    pub(crate) fn basic_tile_contact(
        &self,
        body: &BodyDesc,
        movement: &ColliderMovement,
        should_collide: bool,
        tile: &TileIntersection,
    ) -> Option<ContactContext> {
        let between = |policy: ContactPolicy| {
            ContactContext::between(
                body.key,
                &body.geometry,
                body.state.was_on_slope(),
                movement,
                tile.intersection,
                ContactedObject::Tile,
                &tile.tile_frame,
                policy,
            )
        };

        let one_way = tile.tile == Some(TileDescriptor::OneWay);
        match (one_way, should_collide) {
            (true, true) if body.state.did_push_down() => None,
            (true, true) => between(ContactPolicy::CollideOneWay),
            (true, false) => between(ContactPolicy::Touch).filter(|c| c.collider_sides.contains(&ContactSide::Bottom)),
            (false, true) => between(ContactPolicy::Collide),
            (false, false) => between(ContactPolicy::Touch),
        }
    }

    /// Snap the collider's bottom onto the slope surface under its leading bottom probe.
    ///
    /// Only one slope may lift a collider per step. Moving up, the collider is only
    /// caught once it has sunk below the surface.
    pub(crate) fn slope_tile_contact(
        &self,
        body: &mut BodyDesc,
        movement: &ColliderMovement,
        should_collide: bool,
        tile: &TileIntersection,
        run: usize,
        vertical_velocity: f32,
    ) -> Option<ContactContext> {
        let (left, right) = tile.tile.as_ref().and_then(TileDescriptor::slope_values)?;
        if !should_collide {
            return ContactContext::between(
                body.key,
                &body.geometry,
                body.state.was_on_slope(),
                movement,
                tile.intersection,
                ContactedObject::Tile,
                &tile.tile_frame,
                ContactPolicy::Touch,
            );
        }
        if body.state.on_slope() {
            return None;
        }

        let bottom = &movement.proposed_hit_points.bottom;
        let corner = if left > right { bottom.right } else { bottom.left };
        if !tile.intersection.intersects(&corner) {
            return None;
        }
        let probe = tile.tile_frame.intersection(&corner)?;
        let tile_size = tile.tile_frame.size;
        let local = probe.origin.floor() - tile.tile_frame.origin;
        let resolution = SLOPE_RESOLUTION as f32;
        let sub_tile = TiledPoint::new(
            (local.x * resolution / tile_size.x).floor() as i32,
            (local.y * resolution / tile_size.y).floor() as i32,
        );
        let offset = slope::slope_contact_offset(sub_tile, left, right)? as f32 * tile_size.y / resolution;
        if offset < 0.0 && vertical_velocity > 0.0 {
            return None;
        }

        body.state.set(ColliderFlags::ON_SLOPE, true);
        body.state.slope_run = Some(run);
        let sides: SideList = smallvec![ContactSide::Bottom];
        Some(ContactContext {
            collider: body.key,
            other: ContactedObject::Slope(run),
            is_collision: true,
            collider_sides: sides,
            collider_intersection: Rect::ZERO,
            other_sides: SideList::new(),
            other_intersection: Rect::ZERO,
            proposed_position: movement.proposed_position + Vec2::new(0.0, offset),
        })
    }

    /// Empty tiles never block. They drive corner-jump support and report gaps under the collider.
    pub(crate) fn empty_tiles_contact(
        &self,
        map: &TileMap,
        body: &mut BodyDesc,
        movement: &ColliderMovement,
        empties: &[TileIntersection],
        non_collisions: &mut Vec<ContactContext>,
    ) {
        let bottom = movement.proposed_hit_points.bottom;
        for tile in empties {
            let Some(contact) = ContactContext::between(
                body.key,
                &body.geometry,
                body.state.was_on_slope(),
                movement,
                tile.intersection,
                ContactedObject::EmptyTile,
                &tile.tile_frame,
                ContactPolicy::Touch,
            ) else {
                continue;
            };

            if map.is_corner_jump(tile.point) {
                let state = &mut body.state;
                if state.on_corner_jump() || state.discards_corner_jump {
                    continue;
                }
                if state.was_on_corner_jump() {
                    self.continue_corner_jump(state, movement.proposed_position);
                } else if (tile.intersection.intersects(&bottom.left) || tile.intersection.intersects(&bottom.right))
                    && state.was_on_ground()
                {
                    begin_corner_jump(state, movement.proposed_position);
                } else {
                    state.discards_corner_jump = true;
                }
            }

            if map.does_contact_gap(tile.point, &movement.proposed_frame) {
                if body.state.on_gap() {
                    continue;
                }
                body.state.set(ColliderFlags::ON_GAP, true);
                non_collisions.push(contact);
            }
        }
    }

    /// Keep corner-jump support from the last step unless the collider strayed too far from its anchor.
    pub(crate) fn continue_corner_jump(&self, state: &mut ColliderState, at: Vec2) {
        let strayed = match (self.cfg.corner_jump_discard_distance, state.corner_jump_anchor) {
            (Some(limit), Some(anchor)) => anchor.distance(at) > limit,
            _ => false,
        };
        if strayed {
            state.discards_corner_jump = true;
            return;
        }
        state.set(ColliderFlags::ON_CORNER_JUMP, true);
        state.corner_jump_anchor.get_or_insert(at);
    }
}

pub(crate) fn begin_corner_jump(state: &mut ColliderState, at: Vec2) {
    state.set(ColliderFlags::ON_CORNER_JUMP, true);
    state.corner_jump_anchor = Some(at);
}
