pub mod category;
mod component;
pub mod config;
pub mod dom;
pub mod error;
pub mod frame;
pub mod interaction;
pub mod layout;
pub mod lifecycle;
pub mod mount;
pub mod neighborhood;
pub mod popover;
pub mod preview;
mod render;
pub mod scene;
pub mod state;
pub mod theme;
pub mod transition;
pub mod types;
pub mod visited;

#[cfg(test)]
pub(crate) mod testing;

pub use component::GraphPanel;
pub use error::GraphError;
pub use lifecycle::{GraphKind, LifecycleManager};
pub use mount::BrowserMounter;
pub use types::{ContentIndex, slug_from_path};
