//! Weapon and shield catalogue
//!
//! Every projectile kind carries its damage, blast radius, price and flight
//! behaviour as plain data. The simulator dispatches on [`Behavior`].

use serde::{Deserialize, Serialize};

/// Damage falloff and reach of one detonation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlastSpec {
    /// Damage at the edge of the radius
    pub min_damage: i32,
    /// Damage at the centre
    pub max_damage: i32,
    pub radius: f32,
}

impl BlastSpec {
    pub const fn new(min_damage: i32, max_damage: i32, radius: f32) -> Self {
        Self {
            min_damage,
            max_damage,
            radius,
        }
    }
}

/// How a projectile behaves in flight and on contact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Detonates on first contact
    Standard,
    /// Splits into `warheads` at the apex without detonating itself. Each
    /// warhead carries the smaller `warhead` blast.
    Split { warheads: u32, warhead: BlastSpec },
    /// Bounces off terrain and field edges; small blasts until the last bounce
    Bounce { max_bounces: u32, small: BlastSpec },
    /// Detonates and scatters bomblets from the impact point
    Cluster {
        min_bomblets: u32,
        max_bomblets: u32,
        bomblet: BlastSpec,
    },
    /// Flies and lands without any blast
    Inert,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum ProjectileKind {
    #[default]
    BabyMissile,
    Missile,
    BabyNuke,
    Nuke,
    Mirv,
    DeathsHead,
    Leapfrog,
    FunkyBomb,
    Tracer,
}

/// Catalogue entry for a projectile kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSpec {
    pub blast: BlastSpec,
    pub price: u32,
    /// Units credited per purchase
    pub bundle: u32,
    pub behavior: Behavior,
}

impl ProjectileKind {
    pub const ALL: [ProjectileKind; 9] = [
        ProjectileKind::BabyMissile,
        ProjectileKind::Missile,
        ProjectileKind::BabyNuke,
        ProjectileKind::Nuke,
        ProjectileKind::Mirv,
        ProjectileKind::DeathsHead,
        ProjectileKind::Leapfrog,
        ProjectileKind::FunkyBomb,
        ProjectileKind::Tracer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectileKind::BabyMissile => "Baby Missile",
            ProjectileKind::Missile => "Missile",
            ProjectileKind::BabyNuke => "Baby Nuke",
            ProjectileKind::Nuke => "Nuke",
            ProjectileKind::Mirv => "MIRV",
            ProjectileKind::DeathsHead => "Death's Head",
            ProjectileKind::Leapfrog => "Leapfrog",
            ProjectileKind::FunkyBomb => "Funky Bomb",
            ProjectileKind::Tracer => "Tracer",
        }
    }

    pub fn spec(&self) -> WeaponSpec {
        let (blast, price, bundle, behavior) = match self {
            ProjectileKind::BabyMissile => {
                (BlastSpec::new(10, 30, 20.0), 400, 10, Behavior::Standard)
            }
            ProjectileKind::Missile => (BlastSpec::new(20, 50, 35.0), 1500, 5, Behavior::Standard),
            ProjectileKind::BabyNuke => (BlastSpec::new(30, 70, 55.0), 3000, 3, Behavior::Standard),
            ProjectileKind::Nuke => (BlastSpec::new(50, 100, 80.0), 6000, 1, Behavior::Standard),
            ProjectileKind::Mirv => (
                BlastSpec::new(15, 40, 30.0),
                5000,
                2,
                Behavior::Split {
                    warheads: 5,
                    warhead: BlastSpec::new(8, 25, 20.0),
                },
            ),
            ProjectileKind::DeathsHead => (
                BlastSpec::new(25, 60, 40.0),
                10000,
                1,
                Behavior::Split {
                    warheads: 9,
                    warhead: BlastSpec::new(12, 35, 25.0),
                },
            ),
            ProjectileKind::Leapfrog => (
                BlastSpec::new(25, 60, 40.0),
                4000,
                2,
                Behavior::Bounce {
                    max_bounces: 3,
                    small: BlastSpec::new(5, 15, 15.0),
                },
            ),
            ProjectileKind::FunkyBomb => (
                BlastSpec::new(20, 50, 40.0),
                7000,
                2,
                Behavior::Cluster {
                    min_bomblets: 5,
                    max_bomblets: 9,
                    bomblet: BlastSpec::new(10, 30, 25.0),
                },
            ),
            ProjectileKind::Tracer => (BlastSpec::new(0, 0, 0.0), 100, 20, Behavior::Inert),
        };
        WeaponSpec {
            blast,
            price,
            bundle,
            behavior,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShieldKind {
    Light,
    Medium,
    Heavy,
}

impl ShieldKind {
    pub const ALL: [ShieldKind; 3] = [ShieldKind::Light, ShieldKind::Medium, ShieldKind::Heavy];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShieldKind::Light => "Light Shield",
            ShieldKind::Medium => "Medium Shield",
            ShieldKind::Heavy => "Heavy Shield",
        }
    }

    /// Damage absorbed by a fresh shield
    pub fn capacity(&self) -> i32 {
        match self {
            ShieldKind::Light => 50,
            ShieldKind::Medium => 100,
            ShieldKind::Heavy => 200,
        }
    }

    pub fn price(&self) -> u32 {
        match self {
            ShieldKind::Light => 2000,
            ShieldKind::Medium => 4000,
            ShieldKind::Heavy => 8000,
        }
    }

    pub fn bundle(&self) -> u32 {
        1
    }
}

/// Anything that can sit in an inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Projectile(ProjectileKind),
    Shield(ShieldKind),
}

impl ItemKind {
    pub fn price(&self) -> u32 {
        match self {
            ItemKind::Projectile(kind) => kind.spec().price,
            ItemKind::Shield(kind) => kind.price(),
        }
    }

    pub fn bundle(&self) -> u32 {
        match self {
            ItemKind::Projectile(kind) => kind.spec().bundle,
            ItemKind::Shield(kind) => kind.bundle(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Projectile(kind) => kind.as_str(),
            ItemKind::Shield(kind) => kind.as_str(),
        }
    }
}

impl From<ProjectileKind> for ItemKind {
    fn from(kind: ProjectileKind) -> Self {
        ItemKind::Projectile(kind)
    }
}

impl From<ShieldKind> for ItemKind {
    fn from(kind: ShieldKind) -> Self {
        ItemKind::Shield(kind)
    }
}
