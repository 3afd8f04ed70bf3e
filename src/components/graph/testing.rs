//! Manual stand-ins for browser services, shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::frame::{FrameLoop, FrameScheduler};
use super::neighborhood::{NeighborhoodParams, build_graph};
use super::popover::{PopoverHost, Timers};
use super::scene::Scene;
use super::theme::ThemeTokens;
use super::types::{ContentIndex, ContentRecord};
use super::visited::{VisitedSet, VisitedStore};

pub fn record(title: &str, links: &[&str], tags: &[&str]) -> ContentRecord {
	ContentRecord {
		title: title.to_string(),
		links: links.iter().map(|s| s.to_string()).collect(),
		tags: tags.iter().map(|s| s.to_string()).collect(),
		file_path: Some(format!("{title}.md")),
	}
}

/// `A → B`, `B → A, C`, `C`.
pub fn abc_index() -> ContentIndex {
	[
		("A", record("A", &["B"], &[])),
		("B", record("B", &["A", "C"], &[])),
		("C", record("C", &[], &[])),
	]
	.into_iter()
	.collect()
}

pub fn empty_visited() -> VisitedSet {
	VisitedSet::load(Box::new(MemoryStore::default()))
}

pub fn abc_scene() -> Scene {
	let data = build_graph(
		&abc_index(),
		"A",
		&NeighborhoodParams {
			depth: -1,
			show_tags: false,
			remove_tags: Vec::new(),
		},
	);
	Scene::build(&data, "A", &ThemeTokens::default(), &empty_visited(), 0.6)
}

#[derive(Clone, Default)]
pub struct MemoryStore {
	value: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
	pub fn with(raw: &str) -> Self {
		Self {
			value: Rc::new(RefCell::new(Some(raw.to_string()))),
		}
	}

	pub fn contents(&self) -> Option<String> {
		self.value.borrow().clone()
	}
}

impl VisitedStore for MemoryStore {
	fn load(&self) -> Option<String> {
		self.contents()
	}

	fn save(&self, serialized: &str) {
		*self.value.borrow_mut() = Some(serialized.to_string());
	}
}

/// Frame requests queue up until [`ManualFrames::fire`] delivers them.
#[derive(Clone, Default)]
pub struct ManualFrames {
	queue: Rc<RefCell<Vec<(i32, Weak<FrameLoop>)>>>,
	next_id: Rc<Cell<i32>>,
	cancelled: Rc<Cell<usize>>,
}

impl ManualFrames {
	pub fn pending(&self) -> usize {
		self.queue.borrow().len()
	}

	pub fn cancelled(&self) -> usize {
		self.cancelled.get()
	}

	/// Deliver every request queued so far.
	pub fn fire(&self, now: f64) {
		let due = std::mem::take(&mut *self.queue.borrow_mut());
		for (_, target) in due {
			if let Some(frame_loop) = target.upgrade() {
				frame_loop.on_frame(now);
			}
		}
	}

	/// Fire frames `dt` apart until nothing is queued; returns the frame count.
	pub fn run_until_idle(&self, start: f64, dt: f64) -> usize {
		let mut now = start;
		let mut frames = 0;
		while self.pending() > 0 {
			self.fire(now);
			now += dt;
			frames += 1;
			assert!(frames < 10_000, "frame loop never went idle");
		}
		frames
	}
}

impl FrameScheduler for ManualFrames {
	fn request_frame(&self, target: Weak<FrameLoop>) -> Option<i32> {
		let id = self.next_id.get() + 1;
		self.next_id.set(id);
		self.queue.borrow_mut().push((id, target));
		Some(id)
	}

	fn cancel_frame(&self, id: i32) {
		let mut queue = self.queue.borrow_mut();
		let before = queue.len();
		queue.retain(|(queued, _)| *queued != id);
		if queue.len() != before {
			self.cancelled.set(self.cancelled.get() + 1);
		}
	}
}

type PendingTimer = (i32, i64, Box<dyn FnOnce()>);

/// Timers driven by [`ManualTimers::advance`].
#[derive(Clone, Default)]
pub struct ManualTimers {
	now: Rc<Cell<i64>>,
	next_id: Rc<Cell<i32>>,
	pending: Rc<RefCell<Vec<PendingTimer>>>,
}

impl ManualTimers {
	pub fn pending(&self) -> usize {
		self.pending.borrow().len()
	}

	pub fn advance(&self, ms: i32) {
		let now = self.now.get() + ms as i64;
		self.now.set(now);
		loop {
			let due = {
				let mut pending = self.pending.borrow_mut();
				let next = pending.iter().position(|(_, at, _)| *at <= now);
				next.map(|i| pending.remove(i))
			};
			match due {
				Some((_, _, callback)) => callback(),
				None => break,
			}
		}
	}
}

impl Timers for ManualTimers {
	fn set_timeout(&self, delay_ms: i32, callback: Box<dyn FnOnce()>) -> Option<i32> {
		let id = self.next_id.get() + 1;
		self.next_id.set(id);
		let at = self.now.get() + delay_ms as i64;
		self.pending.borrow_mut().push((id, at, callback));
		Some(id)
	}

	fn clear_timeout(&self, id: i32) {
		self.pending.borrow_mut().retain(|(pending, _, _)| *pending != id);
	}
}

#[derive(Default)]
pub struct RecordingHost {
	shows: RefCell<Vec<(String, (f64, f64))>>,
	hides: Cell<usize>,
}

impl RecordingHost {
	pub fn shows(&self) -> Vec<String> {
		self.shows.borrow().iter().map(|(a, _)| a.clone()).collect()
	}

	pub fn hides(&self) -> usize {
		self.hides.get()
	}
}

impl PopoverHost for RecordingHost {
	fn show(&self, address: &str, cursor: (f64, f64)) {
		self.shows.borrow_mut().push((address.to_string(), cursor));
	}

	fn hide(&self) {
		self.hides.set(self.hides.get() + 1);
	}
}
