use std::cell::RefCell;
use std::collections::BTreeSet;

use log::warn;

/// Where the visited set lives between page loads.
pub trait VisitedStore {
	fn load(&self) -> Option<String>;
	fn save(&self, serialized: &str);
}

/// Pages navigated to during this session, shared by every graph instance.
///
/// Loaded once, then only ever appended to; each append is written through to
/// the store.
pub struct VisitedSet {
	slugs: RefCell<BTreeSet<String>>,
	store: Box<dyn VisitedStore>,
}

impl VisitedSet {
	pub fn load(store: Box<dyn VisitedStore>) -> Self {
		let slugs = match store.load() {
			Some(raw) => serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|e| {
				warn!("discarding unreadable visited set: {e}");
				Vec::new()
			}),
			None => Vec::new(),
		};
		Self {
			slugs: RefCell::new(slugs.into_iter().collect()),
			store,
		}
	}

	pub fn add(&self, slug: &str) {
		let mut slugs = self.slugs.borrow_mut();
		if !slugs.insert(slug.to_string()) {
			return;
		}
		match serde_json::to_string(&*slugs) {
			Ok(serialized) => self.store.save(&serialized),
			Err(e) => warn!("could not persist visited set: {e}"),
		}
	}

	pub fn contains(&self, slug: &str) -> bool {
		self.slugs.borrow().contains(slug)
	}

	pub fn len(&self) -> usize {
		self.slugs.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.slugs.borrow().is_empty()
	}
}
