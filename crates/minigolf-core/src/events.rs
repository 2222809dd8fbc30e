use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload delivered when the ball drops into the hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleComplete {
    pub strokes: u32,
}

/// State transitions reported by the simulation, in the order they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// A shot was accepted; `count` is the stroke total after it.
    StrokeTaken { count: u32 },
    /// The ball was captured by the hole.
    HoleSunk { strokes: u32 },
    /// Fired once per capture, just before `HoleSunk`, for audio and effects.
    SinkEffectTriggered,
}

/// Observer for simulation events.
///
/// Events are delivered synchronously from inside `apply_shot` and `update`,
/// so a listener sees them in tick order. Implement the three narrow hooks,
/// or override [`SimListener::on_event`] to receive every event as a value.
pub trait SimListener {
    fn on_stroke(&mut self, _count: u32) {}

    fn on_hole(&mut self, _result: HoleComplete) {}

    fn on_sink_effect(&mut self) {}

    fn on_event(&mut self, event: &SimEvent) {
        match *event {
            SimEvent::StrokeTaken { count } => self.on_stroke(count),
            SimEvent::HoleSunk { strokes } => self.on_hole(HoleComplete { strokes }),
            SimEvent::SinkEffectTriggered => self.on_sink_effect(),
        }
    }
}

/// Listener that ignores everything.
impl SimListener for () {}

impl<L: SimListener + ?Sized> SimListener for Box<L> {
    fn on_event(&mut self, event: &SimEvent) {
        (**self).on_event(event);
    }
}

impl<L: SimListener + ?Sized> SimListener for &mut L {
    fn on_event(&mut self, event: &SimEvent) {
        (**self).on_event(event);
    }
}

/// Records every event in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Take the recorded events, leaving the log empty.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of `HoleSunk` events seen so far.
    pub fn holes_sunk(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SimEvent::HoleSunk { .. }))
            .count()
    }

    /// The stroke count carried by the most recent `StrokeTaken`.
    pub fn last_stroke(&self) -> Option<u32> {
        self.events.iter().rev().find_map(|e| match e {
            SimEvent::StrokeTaken { count } => Some(*count),
            _ => None,
        })
    }
}

impl SimListener for EventLog {
    fn on_event(&mut self, event: &SimEvent) {
        self.events.push(*event);
    }
}

type StrokeFn = Box<dyn FnMut(u32)>;
type HoleFn = Box<dyn FnMut(HoleComplete)>;
type EffectFn = Box<dyn FnMut()>;

/// Listener built from plain closures, one per hook. Unset hooks are skipped.
#[derive(Default)]
pub struct Callbacks {
    on_stroke: Option<StrokeFn>,
    on_hole: Option<HoleFn>,
    on_sink_effect: Option<EffectFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_stroke(mut self, f: impl FnMut(u32) + 'static) -> Self {
        self.on_stroke = Some(Box::new(f));
        self
    }

    pub fn on_hole(mut self, f: impl FnMut(HoleComplete) + 'static) -> Self {
        self.on_hole = Some(Box::new(f));
        self
    }

    pub fn on_sink_effect(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_sink_effect = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_stroke", &self.on_stroke.is_some())
            .field("on_hole", &self.on_hole.is_some())
            .field("on_sink_effect", &self.on_sink_effect.is_some())
            .finish()
    }
}

impl SimListener for Callbacks {
    fn on_stroke(&mut self, count: u32) {
        if let Some(f) = self.on_stroke.as_mut() {
            f(count);
        }
    }

    fn on_hole(&mut self, result: HoleComplete) {
        if let Some(f) = self.on_hole.as_mut() {
            f(result);
        }
    }

    fn on_sink_effect(&mut self) {
        if let Some(f) = self.on_sink_effect.as_mut() {
            f();
        }
    }
}
