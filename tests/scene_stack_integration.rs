//! Scene stack integration tests for deferred push/pop, lifecycle
//! ordering, and transition hand-off.

use std::cell::RefCell;
use std::rc::Rc;

use digivice::config::GameConfig;
use digivice::context::{GameContext, Services};
use digivice::scenes::transition::TransitionScene;
use digivice::scenes::{Scene, SceneStack};
use digivice::world::WorldGraph;
use raylib::prelude::{Color, RaylibDrawHandle, RaylibTextureMode};

type EventLog = Rc<RefCell<Vec<String>>>;

/// A scene that records its lifecycle calls into a shared log.
struct Probe {
    tag: &'static str,
    log: EventLog,
}

impl Probe {
    fn new(tag: &'static str, log: &EventLog) -> Box<Self> {
        Box::new(Self {
            tag,
            log: log.clone(),
        })
    }

    fn record(&self, event: &str) {
        self.log.borrow_mut().push(format!("{} {}", event, self.tag));
    }
}

impl Scene for Probe {
    fn name(&self) -> &'static str {
        self.tag
    }

    fn enter(&mut self, _ctx: &mut GameContext) {
        self.record("enter");
    }

    fn exit(&mut self, _ctx: &mut GameContext) {
        self.record("exit");
    }

    fn pause(&mut self) {
        self.record("pause");
    }

    fn resume(&mut self) {
        self.record("resume");
    }

    fn handle_input(&mut self, _ctx: &mut GameContext) {
        self.record("input");
    }

    fn update(&mut self, _dt: f32, _ctx: &mut GameContext) {
        self.record("update");
    }

    fn render(&mut self, _d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>, _ctx: &GameContext) {}
}

fn services() -> Services {
    Services::new(GameConfig::new(), WorldGraph::file_island_prototype())
}

fn log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn test_push_is_deferred_until_apply() {
    let mut services = services();
    let log = log();
    let mut stack = SceneStack::new();

    services.requests.push(Probe::new("a", &log));
    assert!(stack.is_empty());
    assert!(log.borrow().is_empty());

    stack.apply(&mut services.ctx());
    assert_eq!(stack.len(), 1);
    assert_eq!(stack.top_name(), Some("a"));
    assert_eq!(*log.borrow(), vec!["enter a"]);
}

#[test]
fn test_push_pauses_previous_top() {
    let mut services = services();
    let log = log();
    let mut stack = SceneStack::new();

    services.requests.push(Probe::new("a", &log));
    stack.apply(&mut services.ctx());
    services.requests.push(Probe::new("b", &log));
    stack.apply(&mut services.ctx());

    assert_eq!(stack.len(), 2);
    assert_eq!(stack.top_name(), Some("b"));
    assert_eq!(*log.borrow(), vec!["enter a", "pause a", "enter b"]);
}

#[test]
fn test_pop_resumes_new_top() {
    let mut services = services();
    let log = log();
    let mut stack = SceneStack::new();

    services.requests.push(Probe::new("a", &log));
    stack.apply(&mut services.ctx());
    services.requests.push(Probe::new("b", &log));
    stack.apply(&mut services.ctx());
    services.requests.pop();
    stack.apply(&mut services.ctx());

    assert_eq!(stack.top_name(), Some("a"));
    assert_eq!(
        *log.borrow(),
        vec!["enter a", "pause a", "enter b", "exit b", "resume a"]
    );
}

#[test]
fn test_replace_pops_then_pushes_in_one_apply() {
    let mut services = services();
    let log = log();
    let mut stack = SceneStack::new();

    services.requests.push(Probe::new("a", &log));
    stack.apply(&mut services.ctx());
    services.requests.replace(Probe::new("b", &log));
    stack.apply(&mut services.ctx());

    assert_eq!(stack.len(), 1);
    assert_eq!(stack.top_name(), Some("b"));
    // No pause/resume on a replace: the old scene exits, the new one enters.
    assert_eq!(*log.borrow(), vec!["enter a", "exit a", "enter b"]);
}

#[test]
fn test_only_top_scene_is_routed() {
    let mut services = services();
    let log = log();
    let mut stack = SceneStack::new();

    services.requests.push(Probe::new("a", &log));
    stack.apply(&mut services.ctx());
    services.requests.push(Probe::new("b", &log));
    stack.apply(&mut services.ctx());
    log.borrow_mut().clear();

    stack.handle_input(&mut services.ctx());
    stack.update(0.016, &mut services.ctx());
    assert_eq!(*log.borrow(), vec!["input b", "update b"]);
}

#[test]
fn test_pop_on_empty_stack_is_dropped() {
    let mut services = services();
    let mut stack = SceneStack::new();
    services.requests.pop();
    stack.apply(&mut services.ctx());
    assert!(stack.is_empty());
}

#[test]
fn test_fade_transition_hands_off_with_replace() {
    let mut services = services();
    let log = log();
    let mut stack = SceneStack::new();

    services.requests.push(Probe::new("a", &log));
    stack.apply(&mut services.ctx());

    // A fade that, on completion, replaces the covered scene with "b".
    let fade = TransitionScene::fade_to(Color::BLACK, 0.05, Some(Probe::new("b", &log)), true);
    services.requests.push(Box::new(fade));
    stack.apply(&mut services.ctx());
    assert_eq!(stack.len(), 2);
    assert_eq!(stack.top_name(), Some("transition"));

    // Drive frames until the transition queues its hand-off.
    for _ in 0..4 {
        stack.update(0.02, &mut services.ctx());
        stack.apply(&mut services.ctx());
    }

    assert_eq!(stack.len(), 1);
    assert_eq!(stack.top_name(), Some("b"));
    assert_eq!(
        *log.borrow(),
        vec!["enter a", "pause a", "exit a", "enter b"]
    );
}

#[test]
fn test_requests_issued_mid_frame_affect_next_apply_only() {
    let mut services = services();
    let log = log();
    let mut stack = SceneStack::new();

    services.requests.push(Probe::new("a", &log));
    stack.apply(&mut services.ctx());

    // A request queued after this frame's apply is invisible until the next.
    services.requests.push(Probe::new("b", &log));
    stack.handle_input(&mut services.ctx());
    stack.update(0.016, &mut services.ctx());
    assert_eq!(stack.top_name(), Some("a"));

    stack.apply(&mut services.ctx());
    assert_eq!(stack.top_name(), Some("b"));
}
