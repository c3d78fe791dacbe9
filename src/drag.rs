//! Figurine drag controllers.
//!
//! Both variants follow the same gesture contract: a press captures the pointer, moves from that
//! pointer update the candidate position, and up or cancel releases the capture. The final up or
//! cancel event never moves the figurine; only the preceding moves do.
//!
//! * Opening scene: free placement in pixel offsets. Release inside the drop zone latches the
//!   figurine as placed for good, anywhere else snaps it home.
//! * Main scene: movement constrained to the floor polygon. A candidate whose feet leave the floor
//!   is not committed, so the figurine sticks at the edge instead of snapping back.

use bevy::prelude::*;

use crate::audio::AudioCue;
use crate::config::DioramaConfig;
use crate::geometry::{Bounds, Polygon};
use crate::hud::Hud;
use crate::input::{PointerId, PointerInput, PointerPhase};
use crate::scene::{Scene, SceneEvent, SceneId, SceneMachine};
use crate::state::DioramaSet;
use crate::viewport::{DropZone, OpeningGeometry, Viewport};

pub struct DragPlugin;

impl Plugin for DragPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FigurinePosition>()
            .init_resource::<OpeningFigurine>()
            .init_resource::<MainDrag>()
            .add_systems(
                Update,
                (
                    follow_scene_lifecycle,
                    drive_opening_drag,
                    drive_main_drag,
                )
                    .chain()
                    .in_set(DioramaSet::Movement),
            );
    }
}

/// Main-scene figurine center in percent of the scene. `None` until the hub is first entered.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct FigurinePosition(Option<Vec2>);

impl FigurinePosition {
    pub fn get(&self) -> Option<Vec2> {
        self.0
    }

    pub fn set(&mut self, position: Vec2) {
        self.0 = Some(position);
    }
}

/// A pointer held by a drag gesture, with where it was last seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerCapture {
    pointer: PointerId,
    origin: Vec2,
    last: Vec2,
}

impl PointerCapture {
    pub fn new(pointer: PointerId, position: Vec2) -> Self {
        Self {
            pointer,
            origin: position,
            last: position,
        }
    }

    pub fn owns(&self, pointer: PointerId) -> bool {
        self.pointer == pointer
    }

    /// Total movement since the press.
    pub fn travel(&self, position: Vec2) -> Vec2 {
        position - self.origin
    }

    /// Movement since the previous update; records `position` as the new last point.
    pub fn advance(&mut self, position: Vec2) -> Vec2 {
        let delta = position - self.last;
        self.last = position;
        delta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Placed,
    SnappedBack,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FreeDrag {
    capture: PointerCapture,
    start_offset: Vec2,
}

/// Opening-scene figurine: pixel offset from its home box plus the one-way placement latch.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct OpeningFigurine {
    offset: Vec2,
    placed: bool,
    drag: Option<FreeDrag>,
}

impl OpeningFigurine {
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn bounds(&self, home: Bounds) -> Bounds {
        home.translated(self.offset)
    }

    /// Starts a drag when the press lands on the figurine. Placed figurines never move again.
    pub fn press(&mut self, pointer: PointerId, position: Vec2, home: Bounds) -> bool {
        if self.placed || self.drag.is_some() || !self.bounds(home).contains(position) {
            return false;
        }

        self.drag = Some(FreeDrag {
            capture: PointerCapture::new(pointer, position),
            start_offset: self.offset,
        });
        true
    }

    pub fn drag(&mut self, pointer: PointerId, position: Vec2) {
        let Some(drag) = self.drag.as_mut().filter(|drag| drag.capture.owns(pointer)) else {
            return;
        };
        self.offset = drag.start_offset + drag.capture.travel(position);
    }

    /// Ends the gesture (pointer up or cancel) and tests the figurine box against the drop zone.
    pub fn release(
        &mut self,
        pointer: PointerId,
        home: Bounds,
        zone: &DropZone,
    ) -> Option<DropOutcome> {
        if !self.drag.is_some_and(|drag| drag.capture.owns(pointer)) {
            return None;
        }
        self.drag = None;

        let samples = self.bounds(home).sample_points();
        if zone.contains_any(&samples) {
            self.placed = true;
            Some(DropOutcome::Placed)
        } else {
            self.offset = Vec2::ZERO;
            Some(DropOutcome::SnappedBack)
        }
    }

    /// Drops the capture without a placement test, e.g. when the scene unmounts mid-drag.
    pub fn abort(&mut self) {
        if self.drag.take().is_some() && !self.placed {
            self.offset = Vec2::ZERO;
        }
    }
}

/// Main-scene gesture state. The position itself lives in `FigurinePosition`.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct MainDrag {
    capture: Option<PointerCapture>,
}

/// Inputs of the constrained move that depend on layout and camera.
#[derive(Debug, Clone, Copy)]
pub struct MoveFrame<'a> {
    pub viewport_size: Vec2,
    pub zoom: f32,
    /// Walkable polygon with the boundary offset already applied.
    pub floor: &'a Polygon,
    pub foot_offset: Vec2,
}

/// Candidate center after a pointer delta, or `None` when the feet would leave the floor.
pub fn constrained_step(current: Vec2, delta_px: Vec2, frame: &MoveFrame) -> Option<Vec2> {
    if frame.viewport_size.x <= 0.0 || frame.viewport_size.y <= 0.0 {
        return None;
    }

    let zoom = frame.zoom.max(f32::EPSILON);
    let delta = delta_px / frame.viewport_size * 100.0 / zoom;
    let candidate = current + delta;
    let foot = candidate + frame.foot_offset;

    frame.floor.contains(foot).then_some(candidate)
}

impl MainDrag {
    pub fn is_dragging(&self) -> bool {
        self.capture.is_some()
    }

    /// `grab` is the pointer already mapped into scene percent.
    pub fn press(
        &mut self,
        pointer: PointerId,
        position: Vec2,
        grab: Vec2,
        figurine: Vec2,
        grab_radius: f32,
    ) -> bool {
        if self.capture.is_some() || grab.distance(figurine) > grab_radius {
            return false;
        }
        self.capture = Some(PointerCapture::new(pointer, position));
        true
    }

    /// Returns the position to commit, if any.
    pub fn drag(
        &mut self,
        pointer: PointerId,
        position: Vec2,
        figurine: Vec2,
        frame: &MoveFrame,
    ) -> Option<Vec2> {
        let capture = self.capture.as_mut().filter(|capture| capture.owns(pointer))?;
        let delta = capture.advance(position);
        let next = constrained_step(figurine, delta, frame);
        if next.is_none() {
            // Rewind so that moving back toward the floor starts from the stuck position.
            capture.last -= delta;
        }
        next
    }

    pub fn release(&mut self, pointer: PointerId) -> bool {
        if self.capture.is_some_and(|capture| capture.owns(pointer)) {
            self.capture = None;
            return true;
        }
        false
    }

    pub fn abort(&mut self) {
        self.capture = None;
    }
}

/// Seeds the hub figurine on first entry and releases captures of scenes that went away.
fn follow_scene_lifecycle(
    mut events: EventReader<SceneEvent>,
    viewport: Res<Viewport>,
    config: Res<DioramaConfig>,
    mut position: ResMut<FigurinePosition>,
    mut opening: ResMut<OpeningFigurine>,
    mut main_drag: ResMut<MainDrag>,
) {
    for event in events.read() {
        let SceneEvent::Changed { from, to } = *event else {
            continue;
        };

        if from == Scene::Opening {
            opening.abort();
        }
        if from.id() == SceneId::Main && to.id() != SceneId::Main {
            main_drag.abort();
        }
        if to.id() == SceneId::Main && position.get().is_none() {
            position.set(config.layout(viewport.breakpoint).figurine_spawn);
        }
    }
}

/// Opening pointers are mapped through the Opening HUD so hits and travel match what is drawn.
fn drive_opening_drag(
    mut pointer_events: EventReader<PointerInput>,
    machine: Res<SceneMachine>,
    geometry: Res<OpeningGeometry>,
    viewport: Res<Viewport>,
    hud: Res<Hud>,
    mut opening: ResMut<OpeningFigurine>,
    mut cues: EventWriter<AudioCue>,
) {
    let active = machine.current() == Scene::Opening && !machine.is_transitioning();
    let transform = hud.current();

    for input in pointer_events.read() {
        if !active {
            continue;
        }

        let position = transform.screen_px_to_scene_px(input.position, &viewport);
        match input.phase {
            PointerPhase::Down => {
                if opening.press(input.pointer, position, geometry.figurine_home) {
                    debug!("Opening figurine grabbed by {:?}", input.pointer);
                }
            }
            PointerPhase::Move => opening.drag(input.pointer, position),
            PointerPhase::Up | PointerPhase::Cancel => {
                match opening.release(input.pointer, geometry.figurine_home, &geometry.drop_zone) {
                    Some(DropOutcome::Placed) => {
                        info!("Figurine placed in the drop zone");
                        cues.send(AudioCue::FigurinePlaced);
                    }
                    Some(DropOutcome::SnappedBack) => debug!("Figurine snapped back home"),
                    None => {}
                }
            }
        }
    }
}

fn drive_main_drag(
    mut pointer_events: EventReader<PointerInput>,
    machine: Res<SceneMachine>,
    viewport: Res<Viewport>,
    config: Res<DioramaConfig>,
    hud: Res<Hud>,
    mut main_drag: ResMut<MainDrag>,
    mut position: ResMut<FigurinePosition>,
) {
    let active = machine.state().id() == SceneId::Main && !machine.is_transitioning();
    let layout = config.layout(viewport.breakpoint);
    let floor = layout.floor();
    let transform = hud.current();

    for input in pointer_events.read() {
        let Some(figurine) = position.get().filter(|_| active) else {
            continue;
        };

        match input.phase {
            PointerPhase::Down => {
                let grab = transform.screen_to_scene(viewport.to_percent(input.position));
                if main_drag.press(
                    input.pointer,
                    input.position,
                    grab,
                    figurine,
                    layout.figurine_grab_radius,
                ) {
                    debug!("Figurine grabbed by {:?}", input.pointer);
                }
            }
            PointerPhase::Move => {
                let frame = MoveFrame {
                    viewport_size: viewport.size,
                    zoom: transform.zoom,
                    floor: &floor,
                    foot_offset: layout.foot_offset,
                };
                if let Some(next) = main_drag.drag(input.pointer, input.position, figurine, &frame)
                {
                    position.set(next);
                }
            }
            PointerPhase::Up | PointerPhase::Cancel => {
                main_drag.release(input.pointer);
            }
        }
    }
}
