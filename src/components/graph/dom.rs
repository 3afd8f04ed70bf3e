//! Thin web-sys glue used by the browser mounter and the host page.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Weak;

use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, Event, EventTarget, MouseEvent, Response, Storage};

use super::error::GraphError;
use super::frame::{FrameLoop, FrameScheduler};
use super::lifecycle::Disposable;
use super::popover::Timers;
use super::types::ContentIndex;
use super::visited::VisitedStore;

/// localStorage key holding the visited set.
pub const VISITED_KEY: &str = "graph-visited";
/// Where the site emits its content index.
pub const CONTENT_INDEX_URL: &str = "/static/contentIndex.json";

/// An attached DOM listener, removed on dispose or drop.
pub struct EventListener<E> {
	target: EventTarget,
	event: &'static str,
	callback: Option<Closure<dyn FnMut(Event)>>,
	_event: PhantomData<E>,
}

impl<E: JsCast + 'static> EventListener<E> {
	pub fn new(
		target: &EventTarget,
		event: &'static str,
		mut handler: impl FnMut(E) + 'static,
	) -> Result<Self, GraphError> {
		let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
			if let Ok(event) = event.dyn_into::<E>() {
				handler(event);
			}
		});
		target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
		Ok(Self {
			target: target.clone(),
			event,
			callback: Some(callback),
			_event: PhantomData,
		})
	}

	pub fn detach(&mut self) {
		let Some(callback) = self.callback.take() else {
			return;
		};
		if self
			.target
			.remove_event_listener_with_callback(self.event, callback.as_ref().unchecked_ref())
			.is_err()
		{
			warn!("could not detach {} listener", self.event);
		}
	}
}

impl<E> Drop for EventListener<E> {
	fn drop(&mut self) {
		if let Some(callback) = self.callback.take() {
			let _ = self
				.target
				.remove_event_listener_with_callback(self.event, callback.as_ref().unchecked_ref());
		}
	}
}

impl<E: JsCast + 'static> Disposable for EventListener<E> {
	fn dispose(&mut self) {
		self.detach();
	}
}

/// Milliseconds on the same clock `requestAnimationFrame` reports.
pub fn now() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map(|p| p.now())
		.unwrap_or_else(js_sys::Date::now)
}

/// Pointer position relative to the top-left corner of `element`.
pub fn local_point(ev: &MouseEvent, element: &Element) -> (f64, f64) {
	let rect = element.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// `requestAnimationFrame`-backed scheduler for one frame loop.
#[derive(Default)]
pub struct RafScheduler {
	callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameScheduler for RafScheduler {
	fn request_frame(&self, target: Weak<FrameLoop>) -> Option<i32> {
		let window = web_sys::window()?;
		let mut slot = self.callback.borrow_mut();
		let callback = slot.get_or_insert_with(|| {
			Closure::new(move |now: f64| {
				if let Some(frame_loop) = target.upgrade() {
					frame_loop.on_frame(now);
				}
			})
		});
		window
			.request_animation_frame(callback.as_ref().unchecked_ref())
			.ok()
	}

	fn cancel_frame(&self, id: i32) {
		if let Some(window) = web_sys::window() {
			let _ = window.cancel_animation_frame(id);
		}
	}

	fn release(&self) {
		self.callback.borrow_mut().take();
	}
}

/// `setTimeout`-backed timers.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTimers;

impl Timers for BrowserTimers {
	fn set_timeout(&self, delay_ms: i32, callback: Box<dyn FnOnce()>) -> Option<i32> {
		let window = web_sys::window()?;
		let callback = Closure::once_into_js(move || callback());
		window
			.set_timeout_with_callback_and_timeout_and_arguments_0(
				callback.unchecked_ref(),
				delay_ms,
			)
			.ok()
	}

	fn clear_timeout(&self, id: i32) {
		if let Some(window) = web_sys::window() {
			window.clear_timeout_with_handle(id);
		}
	}
}

fn local_storage() -> Option<Storage> {
	web_sys::window()?.local_storage().ok().flatten()
}

/// Visited set persisted under [`VISITED_KEY`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorageStore;

impl VisitedStore for LocalStorageStore {
	fn load(&self) -> Option<String> {
		local_storage()?.get_item(VISITED_KEY).ok().flatten()
	}

	fn save(&self, serialized: &str) {
		let Some(storage) = local_storage() else {
			return;
		};
		if storage.set_item(VISITED_KEY, serialized).is_err() {
			warn!("could not persist visited set");
		}
	}
}

/// GET `url`; non-2xx responses are errors.
pub async fn fetch_response(url: &str) -> Result<Response, GraphError> {
	let window = web_sys::window().ok_or(GraphError::NoWindow)?;
	let response: Response = JsFuture::from(window.fetch_with_str(url))
		.await?
		.dyn_into()?;
	if !response.ok() {
		return Err(GraphError::Fetch {
			status: response.status(),
		});
	}
	Ok(response)
}

pub async fn response_text(response: &Response) -> Result<String, GraphError> {
	JsFuture::from(response.text()?)
		.await?
		.as_string()
		.ok_or_else(|| GraphError::Dom("response body is not text".into()))
}

pub async fn fetch_content_index(url: &str) -> Result<ContentIndex, GraphError> {
	let response = fetch_response(url).await?;
	ContentIndex::from_json(&response_text(&response).await?)
}

/// The canvas a mount created; removed from the document on dispose.
pub struct SurfaceGuard {
	element: Option<Element>,
}

impl SurfaceGuard {
	pub fn new(element: Element) -> Self {
		Self {
			element: Some(element),
		}
	}
}

impl Disposable for SurfaceGuard {
	fn dispose(&mut self) {
		if let Some(element) = self.element.take() {
			element.remove();
		}
	}
}
