use std::{num::NonZeroUsize, sync::Mutex};

use rapier2d_f64::prelude::*;
use robotex_core::{BallId, Side, Vector2};

const KIND_SHIFT: u32 = 64;
const KIND_WALL: u128 = 1;
const KIND_BALL: u128 = 2;
const KIND_GOAL: u128 = 3;
const KIND_ROBOT: u128 = 4;

/// Identifies the entity a collider belongs to. Stored in the collider's user data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTag {
    Wall,
    Ball(BallId),
    Goal(Side),
    Robot(Side),
}

impl EntityTag {
    pub fn to_user_data(self) -> u128 {
        match self {
            EntityTag::Wall => KIND_WALL << KIND_SHIFT,
            EntityTag::Ball(id) => (KIND_BALL << KIND_SHIFT) | id as u128,
            EntityTag::Goal(side) => (KIND_GOAL << KIND_SHIFT) | side_bits(side),
            EntityTag::Robot(side) => (KIND_ROBOT << KIND_SHIFT) | side_bits(side),
        }
    }

    pub fn from_user_data(data: u128) -> Option<Self> {
        let payload = data & u64::MAX as u128;
        match data >> KIND_SHIFT {
            KIND_WALL => Some(EntityTag::Wall),
            KIND_BALL => u32::try_from(payload).ok().map(EntityTag::Ball),
            KIND_GOAL => side_from_bits(payload).map(EntityTag::Goal),
            KIND_ROBOT => side_from_bits(payload).map(EntityTag::Robot),
            _ => None,
        }
    }
}

fn side_bits(side: Side) -> u128 {
    match side {
        Side::Yellow => 0,
        Side::Blue => 1,
    }
}

fn side_from_bits(bits: u128) -> Option<Side> {
    match bits {
        0 => Some(Side::Yellow),
        1 => Some(Side::Blue),
        _ => None,
    }
}

/// A begin or end of contact between two tagged colliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub first: EntityTag,
    pub second: EntityTag,
    pub started: bool,
}

/// Collects collision events emitted during a physics step.
#[derive(Default)]
struct ContactCollector {
    events: Mutex<Vec<CollisionEvent>>,
}

impl ContactCollector {
    fn drain(&self) -> Vec<CollisionEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// The 2D rigid-body world of a match, with zero gravity (top-down view).
///
/// This is the only place that talks to the physics engine; everything else goes
/// through the small surface below.
pub struct PhysicsWorld {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    collector: ContactCollector,
}

impl PhysicsWorld {
    /// Creates an empty world. `velocity_iterations` and `position_iterations` are
    /// used for every step.
    pub fn new(velocity_iterations: usize, position_iterations: usize) -> Self {
        let integration_parameters = IntegrationParameters {
            num_solver_iterations: NonZeroUsize::new(velocity_iterations)
                .unwrap_or(NonZeroUsize::MIN),
            num_internal_pgs_iterations: position_iterations.max(1),
            ..IntegrationParameters::default()
        };

        PhysicsWorld {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collector: ContactCollector::default(),
        }
    }

    /// Inserts a body together with its single collider.
    pub fn insert(
        &mut self,
        body: impl Into<RigidBody>,
        collider: impl Into<Collider>,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body_handle = self.rigid_body_set.insert(body);
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        (body_handle, collider_handle)
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    /// World transform of a body.
    pub fn pose(&self, handle: RigidBodyHandle) -> Option<Isometry<Real>> {
        self.body(handle).map(|body| *body.position())
    }

    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vector2> {
        self.body(handle).map(|body| *body.translation())
    }

    /// Velocity of the material point of a body located at `world_point`.
    pub fn velocity_at_point(
        &self,
        handle: RigidBodyHandle,
        world_point: Vector2,
    ) -> Option<Vector2> {
        self.body(handle)
            .map(|body| body.velocity_at_point(&Point::from(world_point)))
    }

    /// Applies a world-space force at a world point. Forces last until the next
    /// [`PhysicsWorld::clear_forces`].
    pub fn apply_force_at_point(
        &mut self,
        handle: RigidBodyHandle,
        force: Vector2,
        world_point: Vector2,
    ) {
        if let Some(body) = self.body_mut(handle) {
            body.add_force_at_point(force, Point::from(world_point), true);
        }
    }

    /// Applies a world-space impulse at a world point.
    pub fn apply_impulse_at_point(
        &mut self,
        handle: RigidBodyHandle,
        impulse: Vector2,
        world_point: Vector2,
    ) {
        if let Some(body) = self.body_mut(handle) {
            body.apply_impulse_at_point(impulse, Point::from(world_point), true);
        }
    }

    /// Removes all user forces from every body.
    pub fn clear_forces(&mut self) {
        for (_, body) in self.rigid_body_set.iter_mut() {
            body.reset_forces(false);
        }
    }

    /// Advances the world by `dt` and returns the contact events that happened.
    pub fn step(&mut self, dt: f64) -> Vec<ContactEvent> {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &vector![0.0, 0.0],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.collector,
        );

        self.collector
            .drain()
            .into_iter()
            .filter_map(|event| {
                let first = self.tag(event.collider1())?;
                let second = self.tag(event.collider2())?;
                Some(ContactEvent {
                    first,
                    second,
                    started: event.started(),
                })
            })
            .collect()
    }

    fn tag(&self, handle: ColliderHandle) -> Option<EntityTag> {
        self.collider_set
            .get(handle)
            .and_then(|collider| EntityTag::from_user_data(collider.user_data))
    }
}

/// Transforms a point from a body's local frame to world space.
pub fn world_point(pose: &Isometry<Real>, local: Vector2) -> Vector2 {
    pose.transform_point(&Point::from(local)).coords
}
