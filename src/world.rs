use glam::Vec2;

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::api::CollisionWorldApi;
use crate::collider::{ColliderFlags, ColliderMovement};
use crate::contact::{classify_contacts, dedup_contacts, ContactContext, ContactEvent, ContactedObject};
use crate::contact_map::ContactTestMap;
use crate::entities::SnappableBody;
use crate::lerp;
use crate::tilemap::TileMap;
use crate::types::*;

/// Step-based collision world. Bodies are pushed every step; contacts, riding
/// bindings and contact-test registrations persist between steps.
pub struct CollisionWorld {
    pub cfg: CollisionsConfig,
    pub frame_counter: u32,

    pub(crate) tile_map: Option<TileMap>,
    pub(crate) contact_tests: ContactTestMap,

    // Frame-local storage
    bodies: Vec<BodyDesc>,
    key_to_id: HashMap<ColKey, FrameId>,
    outcomes: Vec<BodyOutcome>,
    events: Vec<ContactEvent>,

    // Carried into the next step
    snap_bindings: HashMap<ColKey, ColKey>,
    previous_contacts: Vec<ContactContext>,
    contacts: Vec<ContactContext>,
}

impl CollisionWorldApi for CollisionWorld {
    fn new(cfg: CollisionsConfig, tile_map: Option<TileMap>) -> Self {
        Self {
            cfg,
            frame_counter: 0,
            tile_map,
            contact_tests: ContactTestMap::new(),
            bodies: Vec::new(),
            key_to_id: HashMap::new(),
            outcomes: Vec::new(),
            events: Vec::new(),
            snap_bindings: HashMap::new(),
            previous_contacts: Vec::new(),
            contacts: Vec::new(),
        }
    }

    fn begin_frame(&mut self) {
        self.bodies.clear();
        self.key_to_id.clear();
        self.outcomes.clear();
        self.events.clear();
        self.previous_contacts = std::mem::take(&mut self.contacts);
        self.frame_counter = self.frame_counter.wrapping_add(1);
    }

    fn push(&mut self, mut desc: BodyDesc) -> FrameId {
        let id = FrameId(self.bodies.len() as u32);
        debug_assert!(
            !self.key_to_id.contains_key(&desc.key),
            "duplicate ColKey pushed in same frame: {}",
            desc.key
        );
        debug_assert!(desc.geometry.validate().is_ok(), "invalid hit-point insets for {}", desc.key);
        desc.state.advance();
        desc.state.set(ColliderFlags::PUSHES_DOWN, desc.pushes_down);
        self.key_to_id.insert(desc.key, id);
        self.bodies.push(desc);
        id
    }

    fn step(&mut self) {
        let mut bodies = std::mem::take(&mut self.bodies);

        self.apply_snap_bindings(&mut bodies);
        let snappables = self.collect_snappables(&mut bodies);

        let mut contacts = Vec::new();
        for body in bodies.iter_mut() {
            if body.roles.contains(BodyRoles::SNAPPABLE) {
                continue;
            }
            if !self.is_within_map_bounds(&body.frame()) {
                body.state.set(ColliderFlags::OUTSIDE_MAP_BOUNDS, true);
                debug!(key = body.key, "collider outside map bounds, skipping resolution");
                continue;
            }
            let resolved = self.resolved_proposed_position(body, &snappables, &mut contacts);
            body.proposed = resolved;
            if !body.state.on_corner_jump() {
                body.state.corner_jump_anchor = None;
            }
        }

        self.contacts_between_entities(&bodies, &mut contacts);
        dedup_contacts(&mut contacts);
        self.rebuild_snap_bindings(&mut bodies, &contacts);

        // Bodies not pushed this step leave without Finished events.
        let present: HashSet<ColKey> = bodies.iter().map(|b| b.key).collect();
        self.previous_contacts.retain(|c| {
            present.contains(&c.collider)
                && !matches!(c.other, ContactedObject::Collider(other) if !present.contains(&other))
        });
        self.events = classify_contacts(&self.previous_contacts, &contacts);
        self.contacts = contacts;

        self.outcomes = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| BodyOutcome {
                id: FrameId(i as u32),
                key: body.key,
                position: body.proposed,
                state: body.state.clone(),
                snapped_to: self.snap_bindings.get(&body.key).copied(),
            })
            .collect();
        self.bodies = bodies;
    }

    fn drain_bodies(&mut self) -> Vec<BodyOutcome> {
        std::mem::take(&mut self.outcomes)
    }

    fn drain_events(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.events)
    }

    fn map_contact(&mut self, category: CategoryMask, other: CategoryMask) {
        self.contact_tests.map_contact(category, other);
    }

    fn unregister_contacts(&mut self, category: CategoryMask) {
        self.contact_tests.unregister(category);
    }

    fn reset_contacts(&mut self) {
        self.contact_tests.reset();
    }

    fn can_have_contact(&self, a: CategoryMask, b: CategoryMask) -> bool {
        self.contact_tests.can_have_contact(a, b)
    }

    fn set_tile_map(&mut self, tile_map: Option<TileMap>) {
        self.tile_map = tile_map;
        self.contacts.clear();
        self.previous_contacts.clear();
        self.snap_bindings.clear();
    }

    fn tile_map(&self) -> Option<&TileMap> {
        self.tile_map.as_ref()
    }
}

// Helper methods
impl CollisionWorld {
    pub fn contacts(&self) -> &[ContactContext] {
        &self.contacts
    }

    pub fn body_id(&self, key: ColKey) -> Option<FrameId> {
        self.key_to_id.get(&key).copied()
    }

    /// Move riders along with the platform they were bound to last step.
    fn apply_snap_bindings(&self, bodies: &mut [BodyDesc]) {
        let translations: HashMap<ColKey, Vec2> = bodies
            .iter()
            .filter(|b| b.roles.contains(BodyRoles::SNAPPABLE) && b.enabled)
            .map(|b| (b.key, b.proposed - b.position))
            .collect();
        for body in bodies.iter_mut().filter(|b| b.roles.contains(BodyRoles::SNAPPER)) {
            let Some(platform) = self.snap_bindings.get(&body.key) else { continue };
            if let Some(by) = translations.get(platform) {
                body.proposed += *by;
                trace!(key = body.key, platform = *platform, dx = by.x, dy = by.y, "carried by platform");
            }
        }
    }

    /// Snapshot of this step's snappables; out-of-bounds ones are flagged and left out.
    fn collect_snappables(&self, bodies: &mut [BodyDesc]) -> Vec<SnappableBody> {
        let mut out = Vec::new();
        for body in bodies.iter_mut().filter(|b| b.roles.contains(BodyRoles::SNAPPABLE)) {
            if self.is_within_map_bounds(&body.frame()) {
                out.push(SnappableBody::from_body(body));
            } else {
                body.state.set(ColliderFlags::OUTSIDE_MAP_BOUNDS, true);
                debug!(key = body.key, "snappable outside map bounds");
            }
        }
        out
    }

    /// Always true without a tile map.
    pub(crate) fn is_within_map_bounds(&self, frame: &Rect) -> bool {
        let Some(map) = &self.tile_map else { return true };
        let size = map.map_size();
        !(frame.max_x() < 0.0 || frame.min_x() > size.x || frame.max_y() < 0.0 || frame.min_y() > size.y)
    }

    /// Walk the sub-moves of `body`'s step and return the blocked-at or final position.
    /// Every blocking contact restarts the walk from its corrected position.
    fn resolved_proposed_position(
        &self,
        body: &mut BodyDesc,
        snappables: &[SnappableBody],
        contacts: &mut Vec<ContactContext>,
    ) -> Vec2 {
        let mut targets = lerp::interpolated_positions(
            body.position,
            body.proposed,
            &body.waypoints,
            self.cfg.interpolation_max_delta,
        );
        let mut resolved = body.proposed;

        for _ in 0..self.cfg.max_resolution_passes.max(1) {
            let mut blocked_at = None;
            for &target in &targets {
                if body.state.should_be_killed_by_collision() {
                    body.state.set(ColliderFlags::KILLED_BY_COLLISION, true);
                    return resolved;
                }
                let mut non_collisions = Vec::new();
                let contact = self.contact_at(body, target, snappables, contacts.as_slice(), &mut non_collisions);
                let Some(contact) = contact else {
                    contacts.append(&mut non_collisions);
                    continue;
                };
                body.state.apply_contact_sides(&contact.collider_sides);
                trace!(
                    key = body.key,
                    other = ?contact.other,
                    sides = ?contact.collider_sides,
                    x = contact.proposed_position.x,
                    y = contact.proposed_position.y,
                    "blocked"
                );
                blocked_at = Some(contact.proposed_position);
                contacts.push(contact);
                contacts.append(&mut non_collisions);
                break;
            }
            match blocked_at {
                Some(position) => {
                    resolved = position;
                    targets = vec![position];
                }
                None => return resolved,
            }
        }

        warn!(
            key = body.key,
            passes = self.cfg.max_resolution_passes,
            "resolution pass limit reached, keeping last correction"
        );
        resolved
    }

    /// First blocking contact for one sub-move: tiles first, then snappables.
    fn contact_at(
        &self,
        body: &mut BodyDesc,
        target: Vec2,
        snappables: &[SnappableBody],
        contacts: &[ContactContext],
        non_collisions: &mut Vec<ContactContext>,
    ) -> Option<ContactContext> {
        let movement = ColliderMovement::new(&body.geometry, body.position, target);
        if let Some(map) = &self.tile_map {
            if let Some(contact) = self.ground_contact(map, body, &movement, contacts, non_collisions) {
                return Some(contact);
            }
        }
        self.snappable_contact(body, &movement, snappables, contacts, non_collisions)
    }

    /// Bind each rider to the snappable it stands on for the next step.
    fn rebuild_snap_bindings(&mut self, bodies: &mut [BodyDesc], contacts: &[ContactContext]) {
        let snappables: HashSet<ColKey> =
            bodies.iter().filter(|b| b.roles.contains(BodyRoles::SNAPPABLE)).map(|b| b.key).collect();
        let riders: HashSet<ColKey> =
            bodies.iter().filter(|b| b.roles.contains(BodyRoles::SNAPPER)).map(|b| b.key).collect();

        self.snap_bindings.clear();
        for c in contacts.iter().filter(|c| c.is_collision && c.collider_sides.contains(&ContactSide::Bottom)) {
            let ContactedObject::Collider(platform) = c.other else { continue };
            if riders.contains(&c.collider) && snappables.contains(&platform) {
                self.snap_bindings.entry(c.collider).or_insert(platform);
            }
        }
        for body in bodies.iter_mut() {
            if self.snap_bindings.contains_key(&body.key) {
                body.state.set(ColliderFlags::SNAPPING, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::{ColliderGeometry, ColliderState};
    use crate::contact::ContactPhase;
    use crate::tilemap::TileDescriptor;
    use proptest::prelude::*;

    const G: Option<TileDescriptor> = Some(TileDescriptor::Ground);
    const O: Option<TileDescriptor> = Some(TileDescriptor::OneWay);
    const N: Option<TileDescriptor> = None;

    fn geometry() -> ColliderGeometry {
        ColliderGeometry::new(Vec2::splat(14.0)).with_uniform_insets(3.0)
    }

    fn floor_map(columns: usize, floor: Option<TileDescriptor>) -> TileMap {
        TileMap::new(vec![vec![floor, N, N, N]; columns], Vec2::splat(16.0)).unwrap()
    }

    fn walker(key: ColKey, from: Vec2, to: Vec2) -> BodyDesc {
        BodyDesc::new(key, geometry(), from, to).with_roles(BodyRoles::HOLDS_TILES)
    }

    fn run(world: &mut CollisionWorld, bodies: Vec<BodyDesc>) -> Vec<BodyOutcome> {
        world.begin_frame();
        for b in bodies {
            world.push(b);
        }
        world.step();
        world.drain_bodies()
    }

    /// Flat ground at row 0 rising over four slope tiles to ground at row 1.
    fn ramp_map() -> TileMap {
        let slope = |left, right| Some(TileDescriptor::Slope { left, right });
        let mut columns = vec![vec![G, N, N, N]; 3];
        columns.push(vec![G, slope(15, 12), N, N]);
        columns.push(vec![G, slope(11, 8), N, N]);
        columns.push(vec![G, slope(7, 4), N, N]);
        columns.push(vec![G, slope(3, 0), N, N]);
        columns.extend(vec![vec![G, G, N, N]; 3]);
        TileMap::new(columns, Vec2::splat(16.0)).unwrap()
    }

    /// Step a walker `steps` times by `dx` with one pixel of gravity, feeding state back each step.
    fn walk(world: &mut CollisionWorld, start: Vec2, dx: f32, steps: usize) -> Vec<BodyOutcome> {
        let mut position = start;
        let mut state = ColliderState::default();
        let mut frames = Vec::new();
        for _ in 0..steps {
            let mut body = walker(1, position, position + Vec2::new(dx, -1.0));
            body.state = state;
            let outcome = run(world, vec![body]).remove(0);
            position = outcome.position;
            state = outcome.state.clone();
            frames.push(outcome);
        }
        frames
    }

    fn frame_at_x(frames: &[BodyOutcome], x: f32) -> &BodyOutcome {
        frames.iter().find(|f| f.position.x == x).unwrap()
    }

    fn tile_phases(events: &[ContactEvent]) -> Vec<ContactPhase> {
        events
            .iter()
            .filter(|e| e.contact.other == ContactedObject::Tile && e.contact.is_collision)
            .map(|e| e.phase)
            .collect()
    }

    #[test]
    fn test_falling_body_lands_on_ground() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(floor_map(8, G)));
        let out = run(&mut world, vec![walker(1, Vec2::new(40.0, 30.0), Vec2::new(40.0, 18.0))]);
        assert_eq!(out.len(), 1);
        assert!((out[0].position.y - 23.0).abs() < 1e-3);
        assert_eq!(out[0].position.x, 40.0);
        assert!(out[0].state.is_on_ground());
        assert_eq!(world.body_id(1), Some(FrameId(0)));
    }

    #[test]
    fn test_ground_contact_lifecycle() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(floor_map(8, G)));

        let out = run(&mut world, vec![walker(1, Vec2::new(40.0, 26.0), Vec2::new(40.0, 22.0))]);
        assert_eq!(tile_phases(&world.drain_events()), vec![ContactPhase::New]);

        let state = out[0].state.clone();
        let rest = out[0].position;
        let out = run(
            &mut world,
            vec![walker(1, rest, rest - Vec2::new(0.0, 1.0)).with_state(state)],
        );
        assert_eq!(tile_phases(&world.drain_events()), vec![ContactPhase::Continuing]);
        assert!(out[0].state.was_on_ground() && out[0].state.is_on_ground());

        let state = out[0].state.clone();
        let rest = out[0].position;
        let out = run(
            &mut world,
            vec![walker(1, rest, rest + Vec2::new(0.0, 6.0)).with_state(state)],
        );
        assert_eq!(tile_phases(&world.drain_events()), vec![ContactPhase::Finished]);
        assert!(!out[0].state.is_on_ground());
    }

    #[test]
    fn test_one_way_lets_body_through_from_below() {
        let map = TileMap::new(vec![vec![G, N, N, O, N, N]; 4], Vec2::splat(16.0)).unwrap();
        let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(map));
        // Jumping up through the one-way row at y 48..64.
        let out = run(&mut world, vec![walker(1, Vec2::new(24.0, 40.0), Vec2::new(24.0, 52.0))]);
        assert_eq!(out[0].position, Vec2::new(24.0, 52.0));
        assert!(!out[0].state.is(ColliderFlags::AT_CEILING));
    }

    #[test]
    fn test_one_way_blocks_from_above_until_pushed_down() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(floor_map(4, O)));
        let rest = Vec2::new(24.0, 23.0);

        let out = run(&mut world, vec![walker(1, rest, rest - Vec2::Y).pushing_down(true)]);
        assert!((out[0].position.y - 23.0).abs() < 1e-3, "push-down acts from the next step");

        let state = out[0].state.clone();
        let out = run(&mut world, vec![walker(1, rest, rest - Vec2::Y).with_state(state)]);
        assert_eq!(out[0].position, rest - Vec2::Y);
        assert!(!out[0].state.is_on_ground());
    }

    #[test]
    fn test_body_outside_map_is_flagged_and_untouched() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(floor_map(2, G)));
        let far = Vec2::new(200.0, 200.0);
        let out = run(&mut world, vec![walker(1, far, far - Vec2::new(0.0, 190.0))]);
        assert!(out[0].state.is_outside_map_bounds());
        assert_eq!(out[0].position, far - Vec2::new(0.0, 190.0));
        assert!(world.contacts().is_empty());
    }

    #[test]
    fn test_no_tile_map_means_free_movement() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), None);
        let out = run(&mut world, vec![walker(1, Vec2::ZERO, Vec2::new(-500.0, -500.0))]);
        assert_eq!(out[0].position, Vec2::new(-500.0, -500.0));
        assert!(!out[0].state.is_outside_map_bounds());
    }

    #[test]
    fn test_walk_up_ramp_onto_ground() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(ramp_map()));
        let frames = walk(&mut world, Vec2::new(24.0, 23.0), 2.0, 50);

        let mut last_y = 23.0;
        for f in &frames {
            assert!(f.position.y >= last_y, "sank to {} at x {}", f.position.y, f.position.x);
            assert!(f.state.is_on_ground(), "airborne at x {}", f.position.x);
            // The leading bottom hit point is over a slope tile between x 45 and 109.
            let over_ramp = f.position.x > 45.0 && f.position.x < 109.0;
            assert_eq!(f.state.on_slope(), over_ramp, "slope flag at x {}", f.position.x);
            last_y = f.position.y;
        }
        for (x, y) in [(44.0, 23.0), (46.0, 23.0), (60.0, 26.0), (64.0, 28.0), (84.0, 32.0), (100.0, 36.0), (108.0, 38.0), (110.0, 39.0)] {
            assert_eq!(frame_at_x(&frames, x).position.y, y, "height at x {}", x);
        }
        let end = frames.last().unwrap();
        assert_eq!(end.position, Vec2::new(124.0, 39.0));
        assert!(!end.state.on_slope());
    }

    #[test]
    fn test_walk_down_ramp() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(ramp_map()));
        let frames = walk(&mut world, Vec2::new(124.0, 39.0), -2.0, 50);

        let mut last_y = 39.0;
        for f in &frames {
            assert!(f.position.y <= last_y, "rose to {} at x {}", f.position.y, f.position.x);
            assert!(f.state.is_on_ground(), "airborne at x {}", f.position.x);
            let over_ramp = f.position.x > 45.0 && f.position.x < 109.0;
            assert_eq!(f.state.on_slope(), over_ramp, "slope flag at x {}", f.position.x);
            last_y = f.position.y;
        }
        for (x, y) in [(110.0, 39.0), (108.0, 38.0), (100.0, 36.0), (84.0, 32.0), (64.0, 28.0), (60.0, 26.0), (46.0, 23.0)] {
            assert_eq!(frame_at_x(&frames, x).position.y, y, "height at x {}", x);
        }
        let end = frames.last().unwrap();
        assert_eq!(end.position, Vec2::new(24.0, 23.0));
        assert!(!end.state.on_slope());
    }

    #[test]
    fn test_waypoint_detour_is_resolved() {
        // The straight move is free; the detour dips into the floor.
        let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(floor_map(8, G)));
        let body = walker(1, Vec2::new(36.0, 40.0), Vec2::new(60.0, 40.0))
            .with_waypoints(vec![Vec2::new(40.0, 16.0)]);
        let out = run(&mut world, vec![body]);
        assert!(out[0].state.is_on_ground());
        assert!((out[0].position - Vec2::new(40.0, 23.0)).length() < 1e-3);
    }

    #[test]
    fn test_rider_follows_platform() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), None);
        let platform_geometry = ColliderGeometry::new(Vec2::new(32.0, 8.0));
        let platform = |at: Vec2| {
            BodyDesc::new(9, platform_geometry, at, at + Vec2::new(4.0, 0.0)).with_roles(BodyRoles::SNAPPABLE)
        };
        let rider = |from: Vec2, to: Vec2| BodyDesc::new(1, geometry(), from, to).with_roles(BodyRoles::SNAPPER);

        let out = run(
            &mut world,
            vec![platform(Vec2::new(50.0, 40.0)), rider(Vec2::new(50.0, 52.0), Vec2::new(50.0, 49.0))],
        );
        let r = &out[1];
        assert!((r.position.y - 51.0).abs() < 1e-3);
        assert_eq!(r.snapped_to, Some(9));
        assert!(r.state.is_snapping() && r.state.is_on_ground());

        let state = r.state.clone();
        let out = run(
            &mut world,
            vec![
                platform(Vec2::new(54.0, 40.0)),
                rider(Vec2::new(50.0, 51.0), Vec2::new(50.0, 50.0)).with_state(state),
            ],
        );
        let r = &out[1];
        assert_eq!(r.position.x, 54.0);
        assert!((r.position.y - 51.0).abs() < 1e-3);
        assert!(r.state.was_snapping());
        assert_eq!(r.snapped_to, Some(9));
    }

    #[test]
    fn test_platform_crushes_body_on_floor() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(floor_map(8, G)));
        let crusher = BodyDesc::new(9, ColliderGeometry::new(Vec2::new(32.0, 8.0)), Vec2::new(40.0, 44.0), Vec2::new(40.0, 33.0))
            .with_roles(BodyRoles::SNAPPABLE);
        let body = walker(1, Vec2::new(40.0, 23.0), Vec2::new(40.0, 22.0))
            .with_roles(BodyRoles::HOLDS_TILES | BodyRoles::SNAPPER);
        let out = run(&mut world, vec![crusher, body]);
        let s = &out[1].state;
        assert!(s.is_on_ground() && s.is(ColliderFlags::AT_CEILING));
        assert!(s.is(ColliderFlags::KILLED_BY_COLLISION));
        assert_eq!(out[0].position, Vec2::new(40.0, 33.0));
    }

    #[test]
    fn test_disabled_platform_is_not_ridden() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), None);
        let mut platform = BodyDesc::new(9, ColliderGeometry::new(Vec2::new(32.0, 8.0)), Vec2::new(50.0, 40.0), Vec2::new(50.0, 40.0))
            .with_roles(BodyRoles::SNAPPABLE);
        platform.enabled = false;
        let rider = BodyDesc::new(1, geometry(), Vec2::new(50.0, 52.0), Vec2::new(50.0, 49.0)).with_roles(BodyRoles::SNAPPER);
        let out = run(&mut world, vec![platform, rider]);
        assert_eq!(out[1].position, Vec2::new(50.0, 49.0));
        assert_eq!(out[1].snapped_to, None);
    }

    #[test]
    fn test_entity_contacts_need_registration() {
        const PLAYER: CategoryMask = CategoryMask::bit(0);
        const COIN: CategoryMask = CategoryMask::bit(1);
        let player = BodyDesc::new(1, geometry(), Vec2::new(10.0, 10.0), Vec2::new(12.0, 10.0)).with_category(PLAYER);
        let coin = BodyDesc::new(2, geometry(), Vec2::new(20.0, 10.0), Vec2::new(20.0, 10.0)).with_category(COIN);

        let mut world = CollisionWorld::new(CollisionsConfig::default(), None);
        run(&mut world, vec![player.clone(), coin.clone()]);
        assert!(world.drain_events().is_empty());

        world.map_contact(PLAYER, COIN);
        assert!(world.can_have_contact(COIN, PLAYER));
        run(&mut world, vec![player.clone(), coin.clone()]);
        let events = world.drain_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.phase == ContactPhase::New && !e.contact.is_collision));
        assert!(events.iter().any(|e| e.contact.collider == 1 && e.contact.other == ContactedObject::Collider(2)));
        assert!(events.iter().any(|e| e.contact.collider == 2 && e.contact.other == ContactedObject::Collider(1)));

        world.unregister_contacts(COIN);
        run(&mut world, vec![player, coin]);
        let events = world.drain_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.phase == ContactPhase::Finished));
    }

    #[test]
    fn test_reset_contacts_forgets_registrations() {
        const A: CategoryMask = CategoryMask::bit(0);
        const B: CategoryMask = CategoryMask::bit(1);
        let mut world = CollisionWorld::new(CollisionsConfig::default(), None);
        world.map_contact(A, B);
        world.map_contact(B, B);
        let a = BodyDesc::new(1, geometry(), Vec2::ZERO, Vec2::ZERO).with_category(A);
        let b = BodyDesc::new(2, geometry(), Vec2::new(5.0, 0.0), Vec2::new(5.0, 0.0)).with_category(B);
        run(&mut world, vec![a.clone(), b.clone()]);
        assert_eq!(world.drain_events().len(), 2);

        world.reset_contacts();
        assert!(!world.can_have_contact(A, B));
        assert!(!world.can_have_contact(B, B));
        run(&mut world, vec![a, b]);
        let events = world.drain_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.phase == ContactPhase::Finished));
    }

    #[test]
    fn test_absent_body_leaves_silently() {
        const A: CategoryMask = CategoryMask::bit(0);
        let mut world = CollisionWorld::new(CollisionsConfig::default(), None);
        world.map_contact(A, A);
        let a = BodyDesc::new(1, geometry(), Vec2::ZERO, Vec2::ZERO).with_category(A);
        let b = BodyDesc::new(2, geometry(), Vec2::new(5.0, 0.0), Vec2::new(5.0, 0.0)).with_category(A);
        run(&mut world, vec![a.clone(), b]);
        assert!(!world.drain_events().is_empty());
        run(&mut world, vec![a]);
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn test_set_tile_map_discards_contacts() {
        let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(floor_map(8, G)));
        run(&mut world, vec![walker(1, Vec2::new(40.0, 26.0), Vec2::new(40.0, 22.0))]);
        assert!(!world.contacts().is_empty());
        world.set_tile_map(None);
        assert!(world.contacts().is_empty());
        assert!(world.tile_map().is_none());
    }

    proptest! {
        #[test]
        fn prop_falls_stop_on_floor_top(
            x in 16.0f32..100.0,
            height in 0.0f32..24.0,
            fall in 1.0f32..60.0,
        ) {
            let mut world = CollisionWorld::new(CollisionsConfig::default(), Some(floor_map(8, G)));
            let start = Vec2::new(x, 23.0 + height);
            let out = run(&mut world, vec![walker(1, start, start - Vec2::new(0.0, height + fall))]);
            let bottom = geometry().frame_at(out[0].position).min_y();
            prop_assert!((bottom - 16.0).abs() < 1e-3, "bottom edge {}", bottom);
            prop_assert!(out[0].state.is_on_ground());
        }
    }
}
