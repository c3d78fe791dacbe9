//! Proximity flags: which landmarks the Main-scene figurine is standing close to.
//!
//! Recomputed synchronously whenever the figurine position or the breakpoint changes. The flags
//! gate hotspot clicks and drive the hotspot highlight.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::DioramaConfig;
use crate::drag::FigurinePosition;
use crate::state::DioramaSet;
use crate::viewport::Viewport;

pub struct ProximityPlugin;

impl Plugin for ProximityPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProximityFlags>()
            .add_systems(Update, update_proximity.in_set(DioramaSet::Proximity));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Landmark {
    Mirror,
    Hydrant,
    Phone,
    Computer,
    Radio,
}

impl Landmark {
    pub const ALL: [Landmark; 5] = [
        Landmark::Mirror,
        Landmark::Hydrant,
        Landmark::Phone,
        Landmark::Computer,
        Landmark::Radio,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Fixed position (percent of the scene) and interaction radius of a landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSpec {
    pub landmark: Landmark,
    pub position: Vec2,
    /// The figurine is near when strictly closer than this.
    pub threshold: f32,
    /// Radius of the clickable hotspot around `position`.
    pub hotspot_radius: f32,
}

impl LandmarkSpec {
    pub fn new(landmark: Landmark, position: Vec2, threshold: f32, hotspot_radius: f32) -> Self {
        Self {
            landmark,
            position,
            threshold,
            hotspot_radius,
        }
    }

    pub fn is_near(&self, figurine: Vec2) -> bool {
        figurine.distance(self.position) < self.threshold
    }
}

/// One boolean per landmark. The default (all false) is also the answer for a missing figurine.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProximityFlags([bool; 5]);

impl ProximityFlags {
    pub fn is_near(&self, landmark: Landmark) -> bool {
        self.0[landmark.index()]
    }

    pub fn set(&mut self, landmark: Landmark, near: bool) {
        self.0[landmark.index()] = near;
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|near| *near)
    }

    pub fn nearby(&self) -> impl Iterator<Item = Landmark> + '_ {
        Landmark::ALL
            .into_iter()
            .filter(|landmark| self.is_near(*landmark))
    }
}

pub fn compute_proximity(figurine: Option<Vec2>, landmarks: &[LandmarkSpec]) -> ProximityFlags {
    let mut flags = ProximityFlags::default();
    let Some(figurine) = figurine else {
        return flags;
    };

    for spec in landmarks {
        flags.set(spec.landmark, spec.is_near(figurine));
    }
    flags
}

fn update_proximity(
    position: Res<FigurinePosition>,
    viewport: Res<Viewport>,
    config: Res<DioramaConfig>,
    mut flags: ResMut<ProximityFlags>,
) {
    if !position.is_changed() && !viewport.is_changed() && !config.is_changed() {
        return;
    }

    let layout = config.layout(viewport.breakpoint);
    let next = compute_proximity(position.get(), &layout.landmarks);

    if *flags != next {
        debug!("Proximity now {:?}", next.nearby().collect::<Vec<_>>());
    }
    flags.set_if_neq(next);
}
