use std::rc::Rc;

use log::{error, info};

use super::error::GraphError;
use super::theme::ThemeTokens;
use super::visited::VisitedSet;

/// A resource owned by one mount that must be released on teardown.
pub trait Disposable {
	/// Release the resource. Must tolerate being called more than once.
	fn dispose(&mut self);
}

/// Teardown handle for one mounted graph.
///
/// Parts are released in the order they were added; the mounter adds the
/// frame loop first, then popover timers, listeners and finally the surface.
#[derive(Default)]
pub struct GraphHandle {
	parts: Vec<Box<dyn Disposable>>,
	disposed: bool,
}

impl GraphHandle {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, part: impl Disposable + 'static) -> Self {
		self.push(part);
		self
	}

	pub fn push(&mut self, part: impl Disposable + 'static) {
		self.parts.push(Box::new(part));
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed
	}

	pub fn dispose(&mut self) {
		if self.disposed {
			return;
		}
		self.disposed = true;
		for part in &mut self.parts {
			part.dispose();
		}
		self.parts.clear();
	}
}

impl Drop for GraphHandle {
	fn drop(&mut self) {
		self.dispose();
	}
}

/// Which family of containers a graph lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphKind {
	/// In-page graphs, rebuilt on every navigation.
	Local,
	/// The full-site overlay.
	Global,
}

/// Live handles, kept apart per kind so each can be rebuilt on its own.
#[derive(Default)]
pub struct GraphRegistry {
	local: Vec<GraphHandle>,
	global: Vec<GraphHandle>,
}

impl GraphRegistry {
	fn slot(&mut self, kind: GraphKind) -> &mut Vec<GraphHandle> {
		match kind {
			GraphKind::Local => &mut self.local,
			GraphKind::Global => &mut self.global,
		}
	}

	pub fn register(&mut self, kind: GraphKind, handle: GraphHandle) {
		self.slot(kind).push(handle);
	}

	/// Dispose and forget every handle of `kind`.
	pub fn dispose(&mut self, kind: GraphKind) {
		let handles = std::mem::take(self.slot(kind));
		if handles.is_empty() {
			return;
		}
		info!("tearing down {} {kind:?} graph(s)", handles.len());
		for mut handle in handles {
			handle.dispose();
		}
	}

	pub fn len(&self, kind: GraphKind) -> usize {
		match kind {
			GraphKind::Local => self.local.len(),
			GraphKind::Global => self.global.len(),
		}
	}
}

/// Everything a mount reads from its surroundings.
pub struct MountRequest<'a> {
	pub kind: GraphKind,
	pub focal: &'a str,
	pub theme: &'a Rc<ThemeTokens>,
	pub visited: &'a Rc<VisitedSet>,
}

/// Builds graph pipelines into host containers.
pub trait GraphMounter {
	type Container;

	/// Containers currently present for `kind`.
	fn containers(&self, kind: GraphKind) -> Vec<Self::Container>;
	fn mount(
		&self,
		container: &Self::Container,
		request: MountRequest<'_>,
	) -> Result<GraphHandle, GraphError>;
	fn read_theme(&self) -> ThemeTokens;
	/// Show or hide the overlay that holds the global containers.
	fn set_global_visible(&self, _visible: bool) {}
}

/// Owns every graph instance on the page and rebuilds them on navigation,
/// theme changes and global-graph toggles.
pub struct LifecycleManager<M: GraphMounter> {
	mounter: M,
	registry: GraphRegistry,
	visited: Rc<VisitedSet>,
	theme: Rc<ThemeTokens>,
	current: Option<String>,
	global_open: bool,
}

impl<M: GraphMounter> LifecycleManager<M> {
	pub fn new(mounter: M, visited: Rc<VisitedSet>) -> Self {
		let theme = Rc::new(mounter.read_theme());
		Self {
			mounter,
			registry: GraphRegistry::default(),
			visited,
			theme,
			current: None,
			global_open: false,
		}
	}

	pub fn current(&self) -> Option<&str> {
		self.current.as_deref()
	}

	pub fn is_global_open(&self) -> bool {
		self.global_open
	}

	pub fn registry(&self) -> &GraphRegistry {
		&self.registry
	}

	pub fn visited(&self) -> &Rc<VisitedSet> {
		&self.visited
	}

	/// Handle an in-app page transition to `slug`.
	pub fn navigate(&mut self, slug: &str) {
		self.visited.add(slug);
		self.current = Some(slug.to_string());
		self.close_global();
		self.rebuild(GraphKind::Local);
	}

	/// Re-read theme tokens and rebuild the in-page graphs with them.
	pub fn theme_changed(&mut self) {
		self.theme = Rc::new(self.mounter.read_theme());
		self.rebuild(GraphKind::Local);
	}

	pub fn open_global(&mut self) {
		self.global_open = true;
		self.mounter.set_global_visible(true);
		self.rebuild(GraphKind::Global);
		info!("global graph opened");
	}

	pub fn close_global(&mut self) {
		if !self.global_open {
			return;
		}
		self.global_open = false;
		self.registry.dispose(GraphKind::Global);
		self.mounter.set_global_visible(false);
		info!("global graph closed");
	}

	pub fn toggle_global(&mut self) {
		if self.global_open {
			self.close_global();
		} else {
			self.open_global();
		}
	}

	/// Tear down every instance of `kind`, then mount one per container.
	pub fn rebuild(&mut self, kind: GraphKind) {
		self.registry.dispose(kind);
		let Some(focal) = self.current.clone() else {
			return;
		};
		for container in self.mounter.containers(kind) {
			let request = MountRequest {
				kind,
				focal: &focal,
				theme: &self.theme,
				visited: &self.visited,
			};
			match self.mounter.mount(&container, request) {
				Ok(handle) => self.registry.register(kind, handle),
				Err(e) => error!("could not mount {kind:?} graph for {focal}: {e}"),
			}
		}
	}

	pub fn dispose(&mut self) {
		self.registry.dispose(GraphKind::Local);
		self.registry.dispose(GraphKind::Global);
	}
}
