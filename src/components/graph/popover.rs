use std::cell::RefCell;
use std::rc::Rc;

use super::lifecycle::Disposable;
use super::types::slug_href;

/// Delay between a modifier-held hover and the preview request.
pub const SHOW_DELAY_MS: i32 = 200;
/// Delay before a preview is hidden once the pointer moves away.
pub const HIDE_DELAY_MS: i32 = 300;
/// Distance kept between the cursor and the popover.
pub const CURSOR_GAP: f64 = 12.0;
/// Prefix applied to ids inside a preview so they cannot clash with the host page.
pub const INTERNAL_ID_PREFIX: &str = "popover-internal-";

/// One-shot timers.
pub trait Timers {
	fn set_timeout(&self, delay_ms: i32, callback: Box<dyn FnOnce()>) -> Option<i32>;
	fn clear_timeout(&self, id: i32);
}

/// Where previews are fetched and shown.
pub trait PopoverHost {
	/// Fetch (or reuse) the preview for `address` and show it near `cursor`.
	fn show(&self, address: &str, cursor: (f64, f64));
	fn hide(&self);
}

/// Same-origin address of the page behind `slug`, without fragment or query.
pub fn preview_address(origin: &str, slug: &str) -> String {
	let href = slug_href(slug);
	let href = href.split(['#', '?']).next().unwrap_or_default();
	format!("{}{}", origin.trim_end_matches('/'), href)
}

/// Element id of the popover for `address`.
pub fn popover_element_id(address: &str) -> String {
	let path = address
		.split_once("://")
		.and_then(|(_, rest)| rest.split_once('/'))
		.map(|(_, path)| path)
		.unwrap_or(address);
	let cleaned: String = path
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
		.collect();
	format!("popover-{}", cleaned.trim_matches('-'))
}

pub fn namespaced_id(id: &str) -> String {
	format!("{INTERNAL_ID_PREFIX}{id}")
}

/// What kind of preview a response can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewKind {
	Html,
	Image,
	Pdf,
}

pub fn preview_kind(content_type: &str) -> Option<PreviewKind> {
	let mime = content_type
		.split(';')
		.next()
		.unwrap_or_default()
		.trim()
		.to_ascii_lowercase();
	if mime == "text/html" {
		Some(PreviewKind::Html)
	} else if mime.starts_with("image/") {
		Some(PreviewKind::Image)
	} else if mime == "application/pdf" {
		Some(PreviewKind::Pdf)
	} else {
		None
	}
}

/// Top-left corner for a `size` popover near `cursor`, flipped to the other
/// side of the cursor on either axis when it would leave the viewport.
pub fn place_popover(cursor: (f64, f64), size: (f64, f64), viewport: (f64, f64)) -> (f64, f64) {
	let axis = |pointer: f64, extent: f64, limit: f64| {
		let after = pointer + CURSOR_GAP;
		let before = pointer - CURSOR_GAP - extent;
		let start = if after + extent <= limit || before < 0.0 {
			after
		} else {
			before
		};
		start.min(limit - extent).max(0.0)
	};
	(
		axis(cursor.0, size.0, viewport.0),
		axis(cursor.1, size.1, viewport.1),
	)
}

#[derive(Clone, Debug, PartialEq)]
struct Hovered {
	address: String,
	cursor: (f64, f64),
}

/// Debounced show/hide of link previews for one graph instance.
pub struct PopoverService<T: Timers> {
	timers: T,
	host: Rc<dyn PopoverHost>,
	hovered: Option<Hovered>,
	modifier: bool,
	show_timer: Option<i32>,
	hide_timer: Option<i32>,
	disposed: bool,
}

impl<T: Timers> PopoverService<T> {
	pub fn new(timers: T, host: Rc<dyn PopoverHost>) -> Self {
		Self {
			timers,
			host,
			hovered: None,
			modifier: false,
			show_timer: None,
			hide_timer: None,
			disposed: false,
		}
	}

	/// Pointer entered the node behind `address`.
	pub fn hover_start(&mut self, address: String, cursor: (f64, f64), modifier: bool) {
		self.hovered = Some(Hovered { address, cursor });
		self.modifier = modifier;
		self.schedule_show();
	}

	pub fn pointer_moved(&mut self, cursor: (f64, f64)) {
		if let Some(hovered) = &mut self.hovered {
			hovered.cursor = cursor;
		}
	}

	/// Pointer left the node.
	pub fn hover_end(&mut self) {
		self.hovered = None;
		self.cancel_show();
		self.schedule_hide();
	}

	pub fn modifier_changed(&mut self, held: bool) {
		if held == self.modifier {
			return;
		}
		self.modifier = held;
		if held {
			self.schedule_show();
		} else {
			self.cancel_show();
			self.schedule_hide();
		}
	}

	/// Pointer entered the popover itself; keep it open.
	pub fn enter_popover(&mut self) {
		self.cancel_hide();
	}

	pub fn leave_popover(&mut self) {
		self.schedule_hide();
	}

	pub fn has_pending_timers(&self) -> bool {
		self.show_timer.is_some() || self.hide_timer.is_some()
	}

	fn schedule_show(&mut self) {
		self.cancel_show();
		if self.disposed || !self.modifier {
			return;
		}
		let Some(hovered) = self.hovered.clone() else {
			return;
		};
		self.cancel_hide();
		let host = self.host.clone();
		self.show_timer = self.timers.set_timeout(
			SHOW_DELAY_MS,
			Box::new(move || host.show(&hovered.address, hovered.cursor)),
		);
	}

	fn schedule_hide(&mut self) {
		self.cancel_hide();
		if self.disposed {
			return;
		}
		let host = self.host.clone();
		self.hide_timer = self
			.timers
			.set_timeout(HIDE_DELAY_MS, Box::new(move || host.hide()));
	}

	fn cancel_show(&mut self) {
		if let Some(id) = self.show_timer.take() {
			self.timers.clear_timeout(id);
		}
	}

	fn cancel_hide(&mut self) {
		if let Some(id) = self.hide_timer.take() {
			self.timers.clear_timeout(id);
		}
	}

	/// Clear pending timers and hide whatever is showing.
	pub fn shutdown(&mut self) {
		if self.disposed {
			return;
		}
		self.disposed = true;
		self.cancel_show();
		self.cancel_hide();
		self.hovered = None;
		self.host.hide();
	}
}

impl<T: Timers> Disposable for Rc<RefCell<PopoverService<T>>> {
	fn dispose(&mut self) {
		match self.try_borrow_mut() {
			Ok(mut service) => service.shutdown(),
			Err(_) => log::warn!("popover service busy during teardown"),
		}
	}
}
