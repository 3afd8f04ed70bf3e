use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_location, use_navigate};
use log::{error, info, warn};
use web_sys::{Event, KeyboardEvent};

use crate::components::graph::dom::{
	CONTENT_INDEX_URL, EventListener, LocalStorageStore, fetch_content_index,
};
use crate::components::graph::interaction::NavigationRequest;
use crate::components::graph::lifecycle::GraphHandle;
use crate::components::graph::mount::Navigator;
use crate::components::graph::visited::VisitedSet;
use crate::components::graph::{
	BrowserMounter, ContentIndex, GraphError, GraphPanel, LifecycleManager, slug_from_path,
};
use crate::pages::not_found::NotFound;

type Manager = LifecycleManager<BrowserMounter>;

/// Keyboard shortcuts for the global graph and the theme-change hook.
fn document_listeners(
	manager: StoredValue<Option<Manager>, LocalStorage>,
) -> Result<GraphHandle, GraphError> {
	let window = web_sys::window().ok_or(GraphError::NoWindow)?;
	let document = window.document().ok_or(GraphError::NoWindow)?;

	let shortcuts = EventListener::<KeyboardEvent>::new(&window, "keydown", move |ev| {
		let toggle = (ev.ctrl_key() || ev.meta_key()) && ev.key().eq_ignore_ascii_case("g");
		if toggle {
			ev.prevent_default();
			manager.update_value(|m| {
				if let Some(m) = m {
					m.toggle_global();
				}
			});
		} else if ev.key() == "Escape" {
			manager.update_value(|m| {
				if let Some(m) = m {
					m.close_global();
				}
			});
		}
	})?;
	let theme = EventListener::<Event>::new(&document, "themechange", move |_| {
		manager.update_value(|m| {
			if let Some(m) = m {
				m.theme_changed();
			}
		});
	})?;

	Ok(GraphHandle::new().with(shortcuts).with(theme))
}

/// Renders the page for the current path and keeps its graphs in step with
/// navigation.
#[component]
pub fn ContentPage() -> impl IntoView {
	let location = use_location();
	let navigate = use_navigate();
	let index = RwSignal::new(None::<Arc<ContentIndex>>);
	let slug = Memo::new(move |_| slug_from_path(&location.pathname.get()));
	let visited = Rc::new(VisitedSet::load(Box::new(LocalStorageStore)));
	let manager = StoredValue::new_local(None::<Manager>);

	spawn_local(async move {
		match fetch_content_index(CONTENT_INDEX_URL).await {
			Ok(loaded) => {
				info!("content index loaded with {} pages", loaded.len());
				index.set(Some(Arc::new(loaded)));
			}
			Err(e) => error!("could not load content index: {e}"),
		}
	});

	match document_listeners(manager) {
		// dropped, and so detached, with the page
		Ok(listeners) => {
			let _listeners = StoredValue::new_local(listeners);
		}
		Err(e) => warn!("global graph shortcuts unavailable: {e}"),
	}

	let navigator: Navigator = Rc::new(move |request: NavigationRequest| {
		navigate(&request.href(), Default::default());
	});

	Effect::new(move |_| {
		let slug = slug.get();
		let Some(index) = index.get() else {
			return;
		};
		let (navigator, visited) = (navigator.clone(), visited.clone());
		manager.update_value(move |slot| {
			slot.get_or_insert_with(|| {
				LifecycleManager::new(BrowserMounter::new(index, navigator), visited)
			})
			.navigate(&slug);
		});
	});

	let on_toggle_global = Callback::new(move |_: ()| {
		manager.update_value(|m| {
			if let Some(m) = m {
				m.toggle_global();
			}
		});
	});
	let on_close_global = Callback::new(move |_: ()| {
		manager.update_value(|m| {
			if let Some(m) = m {
				m.close_global();
			}
		});
	});

	let known = move || {
		index
			.get()
			.is_none_or(|index| index.contains(&slug.get()))
	};
	let title = move || {
		let slug = slug.get();
		index
			.get()
			.and_then(|index| index.get(&slug).map(|r| r.title.clone()))
			.unwrap_or(slug)
	};

	view! {
		<Show when=known fallback=|| view! { <NotFound /> }>
			<article class="popover-hint">
				<h1>{title}</h1>
			</article>
		</Show>
		<GraphPanel on_toggle_global=on_toggle_global on_close_global=on_close_global />
	}
}
