//! Raw window input to pointer, click, and HUD events.
//!
//! Mouse and touch are folded into one `PointerInput` stream keyed by `PointerId`, so the drag
//! controllers never care which device is behind a gesture. Clicks are synthesised here: a press
//! released within `CLICK_SLOP_PX` of where it went down is a click, anything longer is a drag.

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::input::touch::{TouchInput, TouchPhase};
use bevy::prelude::*;
use bevy::utils::HashMap;
use bevy::window::{PrimaryWindow, WindowFocused};

use crate::config::DioramaConfig;
use crate::hud::HudCommand;
use crate::state::DioramaSet;

/// Maximum pointer travel, in pixels, for a press/release pair to still count as a click.
pub const CLICK_SLOP_PX: f32 = 8.0;

/// Pixels of `MouseScrollUnit::Pixel` scrolling that make one zoom step.
const PIXELS_PER_SCROLL_LINE: f32 = 40.0;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerTracker>()
            .add_event::<PointerInput>()
            .add_event::<PointerClick>()
            .add_systems(
                Update,
                (
                    (read_mouse_buttons, read_touches, cancel_on_focus_loss),
                    synthesize_clicks,
                    read_hud_input,
                )
                    .chain()
                    .in_set(DioramaSet::Input),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One step of a pointer gesture, in window logical pixels (origin top-left, y down).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer: PointerId,
    pub phase: PointerPhase,
    pub position: Vec2,
}

impl PointerInput {
    pub fn new(pointer: PointerId, phase: PointerPhase, position: Vec2) -> Self {
        Self {
            pointer,
            phase,
            position,
        }
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PointerClick {
    pub pointer: PointerId,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    origin: Vec2,
    last: Vec2,
    travelled: f32,
}

/// Pointers currently down, and how far each has wandered.
#[derive(Resource, Debug, Clone, Default)]
pub struct PointerTracker {
    presses: HashMap<PointerId, Press>,
}

impl PointerTracker {
    pub fn is_down(&self, pointer: PointerId) -> bool {
        self.presses.contains_key(&pointer)
    }

    pub fn active(&self) -> impl Iterator<Item = (PointerId, Vec2)> + '_ {
        self.presses.iter().map(|(pointer, press)| (*pointer, press.last))
    }

    /// Feeds one pointer event; returns a click when an up ends a short enough gesture.
    pub fn observe(&mut self, input: &PointerInput, slop: f32) -> Option<PointerClick> {
        match input.phase {
            PointerPhase::Down => {
                self.presses.insert(
                    input.pointer,
                    Press {
                        origin: input.position,
                        last: input.position,
                        travelled: 0.0,
                    },
                );
                None
            }
            PointerPhase::Move => {
                if let Some(press) = self.presses.get_mut(&input.pointer) {
                    press.travelled = press
                        .travelled
                        .max(input.position.distance(press.origin));
                    press.last = input.position;
                }
                None
            }
            PointerPhase::Up => {
                let press = self.presses.remove(&input.pointer)?;
                let travelled = press.travelled.max(input.position.distance(press.origin));
                (travelled <= slop).then_some(PointerClick {
                    pointer: input.pointer,
                    position: press.origin,
                })
            }
            PointerPhase::Cancel => {
                self.presses.remove(&input.pointer);
                None
            }
        }
    }
}

fn read_mouse_buttons(
    buttons: Res<ButtonInput<MouseButton>>,
    mut moved: EventReader<CursorMoved>,
    windows: Query<&Window, With<PrimaryWindow>>,
    tracker: Res<PointerTracker>,
    mut pointer: EventWriter<PointerInput>,
) {
    let cursor = windows
        .get_single()
        .ok()
        .and_then(|window| window.cursor_position());

    if buttons.just_pressed(MouseButton::Left) {
        if let Some(position) = cursor {
            pointer.send(PointerInput::new(PointerId::Mouse, PointerPhase::Down, position));
        }
    }

    let held = buttons.pressed(MouseButton::Left) || tracker.is_down(PointerId::Mouse);
    for event in moved.read() {
        if held {
            pointer.send(PointerInput::new(
                PointerId::Mouse,
                PointerPhase::Move,
                event.position,
            ));
        }
    }

    if buttons.just_released(MouseButton::Left) {
        let position = cursor
            .or_else(|| {
                tracker
                    .active()
                    .find_map(|(id, last)| (id == PointerId::Mouse).then_some(last))
            })
            .unwrap_or_default();
        pointer.send(PointerInput::new(PointerId::Mouse, PointerPhase::Up, position));
    }
}

fn read_touches(mut touches: EventReader<TouchInput>, mut pointer: EventWriter<PointerInput>) {
    pointer.send_batch(touches.read().map(|touch| {
        let phase = match touch.phase {
            TouchPhase::Started => PointerPhase::Down,
            TouchPhase::Moved => PointerPhase::Move,
            TouchPhase::Ended => PointerPhase::Up,
            TouchPhase::Canceled => PointerPhase::Cancel,
        };
        PointerInput::new(PointerId::Touch(touch.id), phase, touch.position)
    }));
}

/// Losing window focus cancels every gesture in flight.
fn cancel_on_focus_loss(
    mut focus: EventReader<WindowFocused>,
    tracker: Res<PointerTracker>,
    mut pointer: EventWriter<PointerInput>,
) {
    if !focus.read().any(|event| !event.focused) {
        return;
    }

    for (id, last) in tracker.active() {
        debug!("Focus lost; cancelling {:?}", id);
        pointer.send(PointerInput::new(id, PointerPhase::Cancel, last));
    }
}

fn synthesize_clicks(
    mut pointer: EventReader<PointerInput>,
    mut tracker: ResMut<PointerTracker>,
    mut clicks: EventWriter<PointerClick>,
) {
    for input in pointer.read() {
        if let Some(click) = tracker.observe(input, CLICK_SLOP_PX) {
            clicks.send(click);
        }
    }
}

/// Wheel zooms, arrow keys pan. Whether the HUD accepts them is the HUD's call.
fn read_hud_input(
    mut wheel: EventReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    config: Res<DioramaConfig>,
    mut hud: EventWriter<HudCommand>,
) {
    let steps: f32 = wheel
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / PIXELS_PER_SCROLL_LINE,
        })
        .sum();
    if steps != 0.0 {
        hud.send(HudCommand::Zoom(steps));
    }

    let mut pan = Vec2::ZERO;
    if keyboard.pressed(KeyCode::ArrowLeft) {
        pan.x += 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        pan.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowUp) {
        pan.y += 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowDown) {
        pan.y -= 1.0;
    }
    if pan != Vec2::ZERO {
        hud.send(HudCommand::Pan(pan * config.hud.pan_step));
    }
}
