//! Shell flight and per-kind contact behaviour
//!
//! Each tick a shell integrates gravity and wind, records its trail and runs
//! the ordered collision checks. What happens on contact depends on its
//! [`Behavior`]: standard shells detonate, splitting shells break apart at
//! the apex, bouncing shells hop, cluster shells scatter bomblets and inert
//! shells just land.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Contact, Side, detect_contact, reflect_off_boundary, reflect_velocity};
use super::state::GameEvent;
use super::terrain::Terrain;
use super::weapons::{Behavior, BlastSpec, ProjectileKind};
use crate::consts::*;
use crate::{heading_to_velocity, velocity_heading};

/// Read-only world view for one integration step
#[derive(Debug, Clone, Copy)]
pub struct FlightContext<'a> {
    pub terrain: &'a Terrain,
    /// Living tanks as (roster index, position)
    pub targets: &'a [(usize, Vec2)],
    pub wind: f32,
    pub gravity: f32,
}

/// Result of moving a shell one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Flying,
    /// A splitting shell started to fall
    Apex,
    Contact(Contact),
}

/// A detonation the blast model must apply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlastRequest {
    pub point: Vec2,
    pub blast: BlastSpec,
    /// Crater the terrain as well as damaging tanks
    pub struck_terrain: bool,
    /// Player credited for the damage
    pub owner: usize,
}

/// What the simulator must do after a step
#[derive(Debug, Default)]
pub struct Resolution {
    /// The shell is gone
    pub finished: bool,
    pub blasts: Vec<BlastRequest>,
    /// New sub-munitions for the mini-batch
    pub spawned: Vec<Projectile>,
    pub events: Vec<GameEvent>,
}

impl Resolution {
    fn flying() -> Self {
        Self::default()
    }

    fn finished() -> Self {
        Self {
            finished: true,
            ..Default::default()
        }
    }
}

/// A shell or sub-munition in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub kind: ProjectileKind,
    /// Roster index of the player who fired it
    pub owner: usize,
    pub pos: Vec2,
    pub vel: Vec2,
    pub blast: BlastSpec,
    pub behavior: Behavior,
    /// Bounces taken so far
    pub bounces: u32,
    /// Recent positions, oldest first
    pub trail: VecDeque<Vec2>,
}

impl Projectile {
    /// A freshly fired shell with its kind's catalogue data
    pub fn launch(id: u32, kind: ProjectileKind, owner: usize, pos: Vec2, vel: Vec2) -> Self {
        let spec = kind.spec();
        Self {
            id,
            kind,
            owner,
            pos,
            vel,
            blast: spec.blast,
            behavior: spec.behavior,
            bounces: 0,
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
        }
    }

    /// Standard sub-munition inheriting kind and owner. The simulator
    /// assigns its id when it joins the batch.
    pub fn submunition(&self, pos: Vec2, vel: Vec2, blast: BlastSpec) -> Self {
        Self {
            id: 0,
            kind: self.kind,
            owner: self.owner,
            pos,
            vel,
            blast,
            behavior: Behavior::Standard,
            bounces: 0,
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
        }
    }

    /// Record current position, evicting the oldest past `TRAIL_LENGTH`
    pub fn record_trail(&mut self) {
        self.trail.push_back(self.pos);
        while self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }

    /// Integrate one step and run collision checks
    pub fn step(&mut self, ctx: &FlightContext, dt: f32) -> StepOutcome {
        self.vel += Vec2::new(ctx.wind, ctx.gravity) * dt;
        self.pos += self.vel * dt;
        self.record_trail();

        if let Behavior::Split { .. } = self.behavior {
            // Rising warheads ignore terrain and field edges until the apex
            return if self.vel.y >= 0.0 {
                StepOutcome::Apex
            } else {
                StepOutcome::Flying
            };
        }

        match detect_contact(self.pos, ctx.terrain, ctx.targets) {
            Some(contact) => StepOutcome::Contact(contact),
            None => StepOutcome::Flying,
        }
    }

    /// Apply this shell's behaviour to a step outcome
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        outcome: StepOutcome,
        ctx: &FlightContext,
        rng: &mut R,
    ) -> Resolution {
        let contact = match outcome {
            StepOutcome::Flying => return Resolution::flying(),
            StepOutcome::Apex => {
                return match self.behavior {
                    Behavior::Split { warheads, warhead } => self.split(warheads, warhead, rng),
                    _ => Resolution::flying(),
                };
            }
            StepOutcome::Contact(contact) => contact,
        };

        match self.behavior {
            Behavior::Inert => {
                let mut res = Resolution::finished();
                res.events.push(GameEvent::Landed { projectile: self.id });
                res
            }
            Behavior::Standard | Behavior::Split { .. } => self.detonate(contact),
            Behavior::Bounce { max_bounces, small } => {
                self.bounce(contact, max_bounces, small, ctx.terrain, rng)
            }
            Behavior::Cluster {
                min_bomblets,
                max_bomblets,
                bomblet,
            } => self.scatter(contact, min_bomblets, max_bomblets, bomblet, rng),
        }
    }

    fn blast_at(&self, contact: &Contact, blast: BlastSpec) -> BlastRequest {
        BlastRequest {
            point: contact.point(),
            blast,
            struck_terrain: contact.touches_ground(),
            owner: self.owner,
        }
    }

    /// Side exits vanish; everything else detonates
    fn detonate(&self, contact: Contact) -> Resolution {
        let mut res = Resolution::finished();
        if !is_side_exit(&contact) {
            res.blasts.push(self.blast_at(&contact, self.blast));
        }
        res
    }

    fn split<R: Rng + ?Sized>(&self, warheads: u32, warhead: BlastSpec, rng: &mut R) -> Resolution {
        let heading = velocity_heading(self.vel);
        let speed = self.vel.length().max(SPLIT_MIN_SPEED);
        let mut res = Resolution::finished();
        res.spawned = (0..warheads)
            .map(|i| {
                let fan = if warheads > 1 {
                    i as f32 / (warheads - 1) as f32 - 0.5
                } else {
                    0.0
                };
                let jitter = rng.random_range(-SPLIT_ANGLE_JITTER_DEG..=SPLIT_ANGLE_JITTER_DEG);
                let h = heading + SPLIT_SPREAD_DEG * fan + jitter;
                let s = speed * (1.0 + rng.random_range(-SPLIT_SPEED_JITTER..=SPLIT_SPEED_JITTER));
                self.submunition(self.pos, heading_to_velocity(h, s), warhead)
            })
            .collect();
        res.events.push(GameEvent::Split {
            projectile: self.id,
            warheads,
        });
        res
    }

    fn bounce<R: Rng + ?Sized>(
        &mut self,
        contact: Contact,
        max_bounces: u32,
        small: BlastSpec,
        terrain: &Terrain,
        rng: &mut R,
    ) -> Resolution {
        if let Contact::Player { .. } = contact {
            return self.detonate(contact);
        }

        self.bounces += 1;
        if self.bounces >= max_bounces {
            let mut res = Resolution::finished();
            res.blasts.push(self.blast_at(&contact, self.blast));
            return res;
        }

        let mut res = Resolution::flying();
        res.blasts.push(self.blast_at(&contact, small));
        match contact {
            Contact::Boundary { side, point } => {
                self.vel = reflect_off_boundary(self.vel, side) * BOUNCE_ENERGY_RETAINED;
                self.pos = point;
                if side == Side::Bottom {
                    self.pos.y -= 1.0;
                }
            }
            Contact::Terrain { point } => {
                let normal = terrain.normal_at(point.x);
                let mut vel = reflect_velocity(self.vel, normal);
                // Always leave the ground heading up
                vel.y = -vel.y.abs();
                let spread = rng.random_range(-BOUNCE_SPREAD_DEG..=BOUNCE_SPREAD_DEG);
                self.vel =
                    Vec2::from_angle(spread.to_radians()).rotate(vel) * BOUNCE_ENERGY_RETAINED;
                self.vel.y = -self.vel.y.abs();
                self.pos = Vec2::new(point.x, point.y - 1.0);
            }
            Contact::Player { .. } => {}
        }
        res.events.push(GameEvent::Bounced {
            projectile: self.id,
            bounce: self.bounces,
        });
        res
    }

    fn scatter<R: Rng + ?Sized>(
        &self,
        contact: Contact,
        min_bomblets: u32,
        max_bomblets: u32,
        bomblet: BlastSpec,
        rng: &mut R,
    ) -> Resolution {
        let mut res = self.detonate(contact);
        if is_side_exit(&contact) {
            return res;
        }
        let count = rng.random_range(min_bomblets..=max_bomblets.max(min_bomblets));
        let origin = contact.point() - Vec2::new(0.0, 2.0);
        res.spawned = (0..count)
            .map(|_| {
                let heading = rng.random_range(CLUSTER_MIN_HEADING..=CLUSTER_MAX_HEADING);
                let speed = rng.random_range(CLUSTER_MIN_SPEED..=CLUSTER_MAX_SPEED);
                self.submunition(origin, heading_to_velocity(heading, speed), bomblet)
            })
            .collect();
        res.events.push(GameEvent::Scattered {
            projectile: self.id,
            bomblets: count,
        });
        res
    }
}

fn is_side_exit(contact: &Contact) -> bool {
    matches!(
        contact,
        Contact::Boundary {
            side: Side::Left | Side::Right,
            ..
        }
    )
}

/// Everything in the air for the current turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Flight {
    /// The shell that was fired
    pub primary: Option<Projectile>,
    /// Sub-munitions spawned by splits and clusters
    pub batch: Vec<Projectile>,
}

impl Flight {
    /// True while the primary shell or any batch member is unresolved
    pub fn is_active(&self) -> bool {
        self.primary.is_some() || !self.batch.is_empty()
    }

    pub fn clear(&mut self) {
        self.primary = None;
        self.batch.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.primary.iter().chain(self.batch.iter())
    }
}
