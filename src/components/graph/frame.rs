use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::warn;

use super::lifecycle::Disposable;

/// Host side of the frame loop: asks for one callback at the next display
/// refresh.
pub trait FrameScheduler {
	/// Arrange for `target.on_frame(now)` to run once; returns a handle for
	/// cancellation.
	fn request_frame(&self, target: Weak<FrameLoop>) -> Option<i32>;
	fn cancel_frame(&self, id: i32);
	/// Drop any resources held for callbacks.
	fn release(&self) {}
}

/// Per-mount frame loop.
///
/// At most one frame request is outstanding at a time. The step closure
/// reports whether it wants another frame; when it says no the loop goes
/// idle until the next [`FrameLoop::kick`].
pub struct FrameLoop {
	scheduler: Box<dyn FrameScheduler>,
	step: RefCell<Box<dyn FnMut(f64) -> bool>>,
	pending: Cell<Option<i32>>,
	disposed: Cell<bool>,
	this: Weak<FrameLoop>,
}

impl FrameLoop {
	pub fn new(
		scheduler: Box<dyn FrameScheduler>,
		step: impl FnMut(f64) -> bool + 'static,
	) -> Rc<Self> {
		Rc::new_cyclic(|this| Self {
			scheduler,
			step: RefCell::new(Box::new(step)),
			pending: Cell::new(None),
			disposed: Cell::new(false),
			this: this.clone(),
		})
	}

	/// Start a frame chain unless one is already pending. Returns whether a
	/// new chain was started.
	pub fn kick(&self) -> bool {
		if self.disposed.get() || self.pending.get().is_some() {
			return false;
		}
		self.schedule();
		self.pending.get().is_some()
	}

	pub fn is_running(&self) -> bool {
		self.pending.get().is_some()
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed.get()
	}

	fn schedule(&self) {
		self.pending.set(self.scheduler.request_frame(self.this.clone()));
	}

	/// Run one step; called by the scheduler.
	pub fn on_frame(&self, now: f64) {
		self.pending.set(None);
		if self.disposed.get() {
			return;
		}
		let again = match self.step.try_borrow_mut() {
			Ok(mut step) => step(now),
			Err(_) => {
				warn!("frame step re-entered, skipping frame");
				true
			}
		};
		if again && !self.disposed.get() && self.pending.get().is_none() {
			self.schedule();
		}
	}

	/// Cancel the pending frame and refuse further kicks. Safe to call twice.
	pub fn stop(&self) {
		if self.disposed.replace(true) {
			return;
		}
		if let Some(id) = self.pending.take() {
			self.scheduler.cancel_frame(id);
		}
		self.scheduler.release();
	}
}

impl Disposable for Rc<FrameLoop> {
	fn dispose(&mut self) {
		self.stop();
	}
}
