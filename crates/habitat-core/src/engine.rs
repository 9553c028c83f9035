//! Habitat engine - main entry point for the interior editor
//!
//! Owns the floor plan, the furniture world and every piece of transient
//! state (falling objects, stability releases, the drag, attachment links).
//! The shell calls in with user actions and `update(dt)` once per frame, and
//! drains [`EngineEvent`]s to keep the scene and notices in sync.

use rand::Rng;

use habitat_logic::config::{validate_config, ConfigError, HabitatConfig};
use habitat_logic::constants::interaction::{
    AMBIENT_ROTATION_STEP, ATTACH_SEARCH_RADIUS, DUPLICATE_OFFSET_X,
};
use habitat_logic::furniture::{furniture_color, FurnitureKind, Theme};
use habitat_logic::geometry::{PlanPoint, Vec3};
use habitat_logic::layout::{generate_floor_plan, FloorPlan, LayoutParams};
use habitat_logic::placement::{
    correct_release, validate, PlacementContext, PlacementRejection, PlacementRules,
};
use habitat_logic::systems::{auto_layout, SystemKind, SystemPlacement};

use crate::attachments::{AttachError, AttachmentGraph, AttachmentRef, ConnectorId, NearbyPoint};
use crate::components::*;
use crate::drag::{DragController, DragError, DragRelease, DragState, ReleaseContext};
use crate::events::EngineEvent;
use crate::persistence::{unix_now, LayoutRecord, RecordError};
use crate::registry::{FurnitureRegistry, FurnitureSnapshot};
use crate::session::SessionState;
use crate::systems::*;

/// Where a pointer ray met a floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerHit {
    pub point: Vec3,
    pub floor_index: u32,
}

/// Main habitat engine
pub struct HabitatEngine {
    config: HabitatConfig,
    /// Placement and drag tunables
    pub rules: PlacementRules,
    /// Integrator tunables
    pub settling: SettlingParams,
    plan: FloorPlan,
    registry: FurnitureRegistry,
    scheduler: StabilityScheduler,
    drag: DragController,
    attachments: AttachmentGraph,
    session: SessionState,
    systems: Vec<SystemPlacement>,
    events: Vec<EngineEvent>,
}

impl HabitatEngine {
    /// Create an engine with the default shell and no floors
    pub fn new() -> Self {
        Self {
            config: HabitatConfig::default(),
            rules: PlacementRules::default(),
            settling: SettlingParams::default(),
            plan: FloorPlan::empty(),
            registry: FurnitureRegistry::new(),
            scheduler: StabilityScheduler::new(),
            drag: DragController::new(),
            attachments: AttachmentGraph::new(),
            session: SessionState::default(),
            systems: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Create an engine from a validated configuration
    pub fn with_config(config: HabitatConfig) -> Result<Self, Vec<ConfigError>> {
        let mut engine = Self::new();
        engine.configure(config)?;
        Ok(engine)
    }

    /// Apply a new configuration: rebuild floors and lay out systems.
    /// Nothing changes if validation fails.
    pub fn configure(&mut self, config: HabitatConfig) -> Result<(), Vec<ConfigError>> {
        let errors = validate_config(&config);
        if !errors.is_empty() {
            for error in &errors {
                log::warn!("Rejected configuration: {}", error);
            }
            return Err(errors);
        }
        let floor_count = config.floor_count;
        let systems = config.enabled_systems.clone();
        self.config = config;
        self.rebuild_floors(floor_count);
        self.set_enabled_systems(systems);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Floors
    // ------------------------------------------------------------------

    /// Regenerate every floor and wall, then re-anchor furniture to the
    /// same floor indices. Focus is cleared.
    pub fn rebuild_floors(&mut self, floor_count: u32) {
        self.config.floor_count = floor_count;
        self.plan = generate_floor_plan(&LayoutParams::from(&self.config));
        self.config.floor_count = self.plan.floor_count();
        self.session.selected_floor = None;
        self.session.planner_active = false;
        self.reanchor_all();

        log::info!(
            "Rebuilt {} floors with {} partition walls",
            self.plan.floor_count(),
            self.plan.walls.len()
        );
        self.events.push(EngineEvent::FloorsRebuilt {
            floor_count: self.plan.floor_count(),
            wall_count: self.plan.walls.len(),
        });
    }

    /// Put every settled object at its floor's rest height. Objects whose
    /// floor no longer exists fall back to floor 0.
    fn reanchor_all(&mut self) {
        if self.plan.floors.is_empty() {
            return;
        }
        let plan = &self.plan;
        let mut missing = Vec::new();
        for (_, (furniture, transform, falling, stable)) in self
            .registry
            .world_mut()
            .query_mut::<(&mut Furniture, &mut Transform, Option<&Falling>, Option<&mut Stable>)>()
        {
            if plan.floor(furniture.locked_floor).is_none() {
                missing.push((furniture.id, furniture.locked_floor));
                furniture.locked_floor = 0;
            }
            let Some(floor) = plan.floor(furniture.locked_floor) else {
                continue;
            };
            if falling.is_some() {
                continue;
            }
            transform.position.y = floor.rest_height(furniture.bounding_height);
            if let Some(stable) = stable {
                stable.anchor_elevation = floor.elevation_current;
            }
        }
        for (id, floor) in missing {
            log::warn!("{} lost floor {}, reassigned to floor 0", id, floor);
        }
    }

    /// Raise one floor for focus and enter planner mode.
    pub fn select_floor(&mut self, index: u32) -> bool {
        if !self.plan.focus(index) {
            let rejection = PlacementRejection::MissingFloor(index);
            log::warn!("Cannot select floor {}: {}", index, rejection);
            self.events.push(EngineEvent::error(rejection.message()));
            return false;
        }
        self.session.selected_floor = Some(index);
        self.session.planner_active = true;
        self.events.push(EngineEvent::hint(format!(
            "Floor {} selected. Click to place objects.",
            index + 1
        )));
        true
    }

    /// Lower every floor back to its base and leave planner mode.
    pub fn reset_floor_focus(&mut self) {
        self.plan.reset_focus();
        self.session.selected_floor = None;
        self.session.planner_active = false;
    }

    pub fn is_floor_visible(&self, index: u32) -> bool {
        if self.plan.floor(index).is_none() {
            return false;
        }
        match self.session.selected_floor {
            Some(selected) => selected == index,
            None => true,
        }
    }

    pub fn is_furniture_visible(&self, id: FurnitureId) -> bool {
        match self.registry.locked_floor(id) {
            Some(floor) => self.is_floor_visible(floor),
            None => false,
        }
    }

    pub fn visible_furniture(&self) -> Vec<FurnitureId> {
        self.registry
            .ids()
            .into_iter()
            .filter(|id| self.is_furniture_visible(*id))
            .collect()
    }

    // ------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------

    /// Place a new object at a world point on `floor_index`. It spawns above
    /// its rest height and falls onto the floor over the next updates.
    pub fn place_object(
        &mut self,
        kind: FurnitureKind,
        point: Vec3,
        floor_index: u32,
    ) -> Result<FurnitureId, PlacementRejection> {
        if self.session.dragging {
            return Err(self.reject(PlacementRejection::DragInProgress));
        }

        let mut candidate = PlanPoint::new(point.x, point.z);
        if self.session.planner_active && self.session.snap_enabled {
            candidate = PlanPoint::new(candidate.x.round(), candidate.z.round());
        }

        let occupants = self.registry.occupants(floor_index, None);
        let ctx = PlacementContext {
            layout_locked: self.session.layout_locked,
            now: self.session.clock,
            last_placement_at: self.session.last_placement_at,
            floor_exists: self.plan.floor(floor_index).is_some(),
            radius: self.config.radius,
            occupants: &occupants,
        };
        if let Err(rejection) = validate(candidate, floor_index, &ctx, &self.rules) {
            return Err(self.reject(rejection));
        }
        let Some(floor) = self.plan.floor(floor_index) else {
            return Err(self.reject(PlacementRejection::MissingFloor(floor_index)));
        };

        let spawn_y = floor.rest_height(kind.bounding_height()) + self.settling.spawn_lift;
        let color = furniture_color(self.session.theme, self.session.vibrant, self.registry.len());
        let id = self.registry.place(
            kind,
            Vec3::new(candidate.x, spawn_y, candidate.z),
            floor_index,
            self.session.clock,
            color,
        );
        self.session.last_placement_at = Some(self.session.clock);

        log::info!(
            "Placed {} {} on floor {} at ({:.2}, {:.2})",
            kind.name(),
            id,
            floor_index,
            candidate.x,
            candidate.z
        );
        self.events.push(EngineEvent::FurnitureSpawned {
            id,
            kind,
            floor: floor_index,
        });
        self.events.push(EngineEvent::success(format!(
            "{} placed on Floor {}",
            kind.name(),
            floor_index + 1
        )));
        Ok(id)
    }

    /// Place where a pointer ray meets a floor. `pick` maps normalized device
    /// coordinates to a floor hit; a miss places nothing.
    pub fn place_at_pointer(
        &mut self,
        kind: FurnitureKind,
        pointer: (f32, f32),
        pick: &dyn Fn(f32, f32) -> Option<PointerHit>,
    ) -> Result<Option<FurnitureId>, PlacementRejection> {
        match pick(pointer.0, pointer.1) {
            Some(hit) => self.place_object(kind, hit.point, hit.floor_index).map(Some),
            None => Ok(None),
        }
    }

    fn reject(&mut self, rejection: PlacementRejection) -> PlacementRejection {
        log::debug!("Placement rejected: {}", rejection);
        self.events.push(EngineEvent::error(rejection.message()));
        rejection
    }

    /// Copy an object under a new id, shifted along x. The copy must pass
    /// the same checks as a placement except the cooldown. Returns
    /// `Ok(None)` if `id` is unknown.
    pub fn duplicate_object(&mut self, id: FurnitureId) -> Result<Option<FurnitureId>, PlacementRejection> {
        let Some(source) = self.registry.get(id) else {
            return Ok(None);
        };
        if self.session.dragging {
            return Err(self.reject(PlacementRejection::DragInProgress));
        }

        let offset = Vec3::new(DUPLICATE_OFFSET_X, 0.0, 0.0);
        let target = source.position + offset;
        let occupants = self.registry.occupants(source.locked_floor, None);
        let ctx = PlacementContext {
            layout_locked: self.session.layout_locked,
            now: self.session.clock,
            last_placement_at: None,
            floor_exists: self.plan.floor(source.locked_floor).is_some(),
            radius: self.config.radius,
            occupants: &occupants,
        };
        if let Err(rejection) = validate(
            PlanPoint::new(target.x, target.z),
            source.locked_floor,
            &ctx,
            &self.rules,
        ) {
            return Err(self.reject(rejection));
        }

        let Some(copy) = self.registry.duplicate(id, offset, self.session.clock) else {
            return Ok(None);
        };
        log::info!("Duplicated {} as {}", id, copy);
        self.events.push(EngineEvent::FurnitureSpawned {
            id: copy,
            kind: source.kind,
            floor: source.locked_floor,
        });
        self.events.push(EngineEvent::success("Object duplicated"));
        Ok(Some(copy))
    }

    /// Remove an object, its sockets and every link touching it.
    pub fn delete_object(&mut self, id: FurnitureId) -> bool {
        if !self.registry.contains(id) {
            return false;
        }
        if self.drag.active().map(|a| a.object) == Some(id) {
            self.drag.abort(&mut self.registry, &mut self.session);
            self.events.push(EngineEvent::CameraNavigation(true));
        }
        self.detach_everything(id);
        self.scheduler.cancel(id);
        self.registry.remove(id);
        log::info!("Deleted {}", id);
        self.events.push(EngineEvent::FurnitureRemoved { id });
        true
    }

    /// Remove every object locked to a floor. Returns how many were removed.
    pub fn clear_floor(&mut self, floor_index: u32) -> usize {
        let ids = self.registry.objects_on(floor_index);
        for id in &ids {
            self.delete_object(*id);
        }
        if !ids.is_empty() {
            self.events.push(EngineEvent::success(format!(
                "Cleared {} objects from Floor {}",
                ids.len(),
                floor_index + 1
            )));
        }
        ids.len()
    }

    pub fn rotate_object(&mut self, id: FurnitureId, delta: f32) -> bool {
        self.registry.rotate(id, delta)
    }

    /// Move an object back to the floor centre with no rotation, pushed
    /// clear of neighbours, and rest it on its floor.
    pub fn reset_object_transform(&mut self, id: FurnitureId) -> bool {
        let Some(snapshot) = self.registry.get(id) else {
            return false;
        };
        let others = self.registry.occupants(snapshot.locked_floor, Some(id));
        let outcome = correct_release(
            PlanPoint::new(0.0, 0.0),
            &others,
            self.config.radius,
            &self.rules,
            false,
        );
        let (x, z) = if outcome.resolved {
            (outcome.position.x, outcome.position.z)
        } else {
            (snapshot.position.x, snapshot.position.z)
        };
        let y = match self.plan.floor(snapshot.locked_floor) {
            Some(floor) => {
                if let Some(entity) = self.registry.entity_of(id) {
                    let _ = self.registry.world_mut().remove_one::<Falling>(entity);
                }
                floor.rest_height(snapshot.bounding_height)
            }
            None => snapshot.position.y,
        };
        self.registry.reset_orientation(id);
        self.registry.set_position(id, Vec3::new(x, y, z))
    }

    // ------------------------------------------------------------------
    // Layout lock
    // ------------------------------------------------------------------

    pub fn set_layout_locked(&mut self, locked: bool) {
        self.session.layout_locked = locked;
        if locked {
            log::info!("Layout locked");
            self.events.push(EngineEvent::hint("Layout locked. No new objects can be placed."));
        } else {
            log::info!("Layout unlocked");
            self.events.push(EngineEvent::hint("Layout unlocked"));
        }
    }

    pub fn toggle_layout_lock(&mut self) -> bool {
        let locked = !self.session.layout_locked;
        self.set_layout_locked(locked);
        locked
    }

    // ------------------------------------------------------------------
    // Drag
    // ------------------------------------------------------------------

    pub fn begin_drag(&mut self, id: FurnitureId, pointer: (f32, f32)) -> Result<(), DragError> {
        let result = self.drag.begin(
            &mut self.registry,
            &mut self.scheduler,
            &mut self.session,
            id,
            pointer,
            &self.rules,
        );
        match &result {
            Ok(()) => self.events.push(EngineEvent::CameraNavigation(false)),
            Err(e) => log::debug!("Drag refused: {}", e),
        }
        result
    }

    /// Pointer-down: start dragging whatever furniture `pick` reports under
    /// the pointer. A miss does nothing.
    pub fn begin_drag_at_pointer(
        &mut self,
        pointer: (f32, f32),
        pick: &dyn Fn(f32, f32) -> Option<FurnitureId>,
    ) -> Result<Option<FurnitureId>, DragError> {
        if self.drag.is_dragging() {
            return Err(DragError::AlreadyDragging);
        }
        match pick(pointer.0, pointer.1) {
            Some(id) => self.begin_drag(id, pointer).map(|_| Some(id)),
            None => Ok(None),
        }
    }

    pub fn drag_pointer(&mut self, pointer: (f32, f32)) -> Result<Vec3, DragError> {
        self.drag
            .drag_pointer(&mut self.registry, pointer, self.config.radius, &self.rules)
    }

    pub fn drag_to(&mut self, point: Vec3) -> Result<Vec3, DragError> {
        self.drag
            .drag_to(&mut self.registry, point, self.config.radius, &self.rules)
    }

    pub fn end_drag(&mut self) -> Result<DragRelease, DragError> {
        let ctx = ReleaseContext {
            floors: &self.plan,
            radius: self.config.radius,
            rules: &self.rules,
            params: &self.settling,
        };
        let release = self.drag.release(
            &mut self.registry,
            &mut self.scheduler,
            &mut self.session,
            &ctx,
        );
        if !matches!(release, Err(DragError::NotDragging)) {
            self.events.push(EngineEvent::CameraNavigation(true));
        }
        if let Ok(release) = &release {
            if release.reverted {
                self.events
                    .push(EngineEvent::hint("No room there, object returned to its previous spot"));
            }
        }
        release
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    // ------------------------------------------------------------------
    // Attachments
    // ------------------------------------------------------------------

    /// Sockets near `object` within the default search radius.
    pub fn find_nearby_points(&self, object: FurnitureId) -> Vec<NearbyPoint> {
        AttachmentGraph::find_nearby(&self.registry, object, ATTACH_SEARCH_RADIUS)
    }

    pub fn find_nearby_points_within(&self, object: FurnitureId, max_distance: f32) -> Vec<NearbyPoint> {
        AttachmentGraph::find_nearby(&self.registry, object, max_distance)
    }

    /// Attach `object` to a socket, replacing any link it already had.
    pub fn connect(&mut self, object: FurnitureId, point: AttachmentRef) -> Result<ConnectorId, AttachError> {
        if let Some(holder) = self.attachments.attached_at(point) {
            if holder != object {
                return Err(AttachError::PointOccupied(holder));
            }
        }
        self.disconnect(object);
        let connector = self.attachments.connect(&mut self.registry, object, point)?;
        self.events.push(EngineEvent::ConnectorAdded {
            connector,
            object,
            point,
        });
        Ok(connector)
    }

    pub fn disconnect(&mut self, object: FurnitureId) -> bool {
        match self.attachments.disconnect(object) {
            Some(connector) => {
                self.events.push(EngineEvent::ConnectorRemoved { connector });
                true
            }
            None => false,
        }
    }

    fn detach_everything(&mut self, object: FurnitureId) {
        for connector in self.attachments.remove_object(object) {
            self.events.push(EngineEvent::ConnectorRemoved { connector });
        }
    }

    pub fn attachments(&self) -> &AttachmentGraph {
        &self.attachments
    }

    // ------------------------------------------------------------------
    // Frame update
    // ------------------------------------------------------------------

    /// Advance the session clock by `dt` seconds and run one frame:
    /// stability releases, the duplicate sweep, then settling and ambient
    /// rotation unless suspended.
    pub fn update(&mut self, dt: f32) -> SettleReport {
        let dt = dt.max(0.0);
        self.session.clock += dt as f64;
        let now = self.session.clock;

        stability_system(self.registry.world_mut(), &mut self.scheduler, now);
        self.registry.dedup_sweep();

        let report = if self.session.settling_active() {
            settling_system(
                self.registry.world_mut(),
                &self.plan,
                &self.settling,
                &mut self.scheduler,
                now,
                dt,
            )
        } else {
            SettleReport::default()
        };

        if self.session.rotation_active() {
            self.session.habitat_rotation += AMBIENT_ROTATION_STEP;
        }
        report
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    /// Enable a set of systems and lay them out with a fresh random seed.
    pub fn set_enabled_systems(&mut self, systems: Vec<SystemKind>) {
        let seed = rand::thread_rng().gen();
        self.set_enabled_systems_seeded(systems, seed);
    }

    pub fn set_enabled_systems_seeded(&mut self, systems: Vec<SystemKind>, seed: u64) {
        self.systems = auto_layout(&systems, self.config.radius, self.config.height, seed);
        self.config.enabled_systems = systems;
        self.events.push(EngineEvent::SystemsLaidOut {
            count: self.systems.len(),
        });
    }

    pub fn systems(&self) -> &[SystemPlacement] {
        &self.systems
    }

    pub fn systems_count(&self) -> usize {
        self.systems.len()
    }

    // ------------------------------------------------------------------
    // Save/Load
    // ------------------------------------------------------------------

    pub fn layout_record(&self, saved_at: u64) -> LayoutRecord {
        LayoutRecord::from_config(&self.config, saved_at)
    }

    /// Serialize the layout record as pretty JSON, stamped with the current time.
    pub fn save_layout(&self) -> Result<String, RecordError> {
        self.layout_record(unix_now()).to_json()
    }

    /// Apply a layout record, then rebuild the floors for the new footprint
    /// and re-anchor furniture by floor index. On any error the engine is
    /// left untouched and an error notice is queued.
    pub fn load_layout(&mut self, json: &str) -> Result<(), RecordError> {
        let validated = match LayoutRecord::from_json(json).and_then(|r| r.validate()) {
            Ok(validated) => validated,
            Err(e) => {
                log::warn!("Layout load failed: {}", e);
                self.events
                    .push(EngineEvent::error(format!("Error loading layout file: {}", e)));
                return Err(e);
            }
        };

        self.config.shape = validated.shape;
        self.config.radius = validated.radius;
        self.config.height = validated.height;
        self.rebuild_floors(self.config.floor_count);
        self.set_enabled_systems(validated.systems);
        log::info!(
            "Loaded {} layout (r={}, h={}) with {} systems",
            validated.shape.id(),
            validated.radius,
            validated.height,
            self.systems.len()
        );
        self.events.push(EngineEvent::success("Layout loaded"));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Workspace
    // ------------------------------------------------------------------

    /// Discard floors, furniture and all transient state. Ids keep counting.
    pub fn clear_workspace(&mut self) {
        if self.drag.abort(&mut self.registry, &mut self.session).is_some() {
            self.events.push(EngineEvent::CameraNavigation(true));
        }
        for link in self.attachments.links() {
            self.events.push(EngineEvent::ConnectorRemoved {
                connector: link.connector,
            });
        }
        for id in self.registry.ids() {
            self.events.push(EngineEvent::FurnitureRemoved { id });
        }
        self.attachments.clear();
        self.scheduler.clear();
        self.registry.clear();
        self.plan = FloorPlan::empty();
        self.config.floor_count = 0;
        self.systems.clear();
        self.config.enabled_systems.clear();
        self.session.reset_workspace();

        log::info!("Workspace cleared");
        self.events.push(EngineEvent::FloorsRebuilt {
            floor_count: 0,
            wall_count: 0,
        });
        self.events.push(EngineEvent::SystemsLaidOut { count: 0 });
    }

    // ------------------------------------------------------------------
    // Session and queries
    // ------------------------------------------------------------------

    pub fn set_theme(&mut self, theme: Theme) {
        self.session.theme = theme;
        self.recolor_primitives();
    }

    pub fn set_vibrant(&mut self, vibrant: bool) {
        self.session.vibrant = vibrant;
        self.recolor_primitives();
    }

    /// Repaint recolourable objects for the current theme and vibrant mode.
    /// Prefab kinds keep their own colour.
    fn recolor_primitives(&mut self) {
        let (theme, vibrant) = (self.session.theme, self.session.vibrant);
        for (ordinal, id) in self.registry.ids().into_iter().enumerate() {
            let recolor = self
                .registry
                .get(id)
                .is_some_and(|s| s.kind.allows_recolor());
            if recolor {
                self.registry.set_color(id, furniture_color(theme, vibrant, ordinal));
            }
        }
    }

    pub fn set_snap_enabled(&mut self, snap: bool) {
        self.session.snap_enabled = snap;
    }

    pub fn config(&self) -> &HabitatConfig {
        &self.config
    }

    pub fn floors(&self) -> &FloorPlan {
        &self.plan
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn registry(&self) -> &FurnitureRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &StabilityScheduler {
        &self.scheduler
    }

    pub fn furniture(&self, id: FurnitureId) -> Option<FurnitureSnapshot> {
        self.registry.get(id)
    }

    pub fn object_count(&self) -> usize {
        self.registry.len()
    }

    pub fn objects_on_floor(&self, floor_index: u32) -> usize {
        self.registry.count_on(floor_index)
    }

    /// Session clock in seconds
    pub fn clock(&self) -> f64 {
        self.session.clock
    }

    /// Take every queued event
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for HabitatEngine {
    fn default() -> Self {
        Self::new()
    }
}
