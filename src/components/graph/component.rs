use leptos::prelude::*;
use web_sys::MouseEvent;

use super::config::GraphConfig;

/// Local graph container, the global-graph button and the overlay the
/// global graph opens in. Graphs are mounted into the containers by the
/// lifecycle manager once the page is on screen.
#[component]
pub fn GraphPanel(
	#[prop(into)] on_toggle_global: Callback<()>,
	#[prop(into)] on_close_global: Callback<()>,
) -> impl IntoView {
	let local_cfg = GraphConfig::local().to_json();
	let global_cfg = GraphConfig::global().to_json();

	// only a click on the backdrop itself closes the overlay
	let on_backdrop = move |ev: MouseEvent| {
		if ev.target() == ev.current_target() {
			on_close_global.run(());
		}
	};

	view! {
		<div class="graph">
			<h3>"Graph View"</h3>
			<div class="graph-outer">
				<div
					class="graph-container"
					data-cfg=local_cfg
					style="position: relative; width: 100%; height: 250px;"
				></div>
				<button
					class="global-graph-icon"
					aria-label="Global Graph"
					on:click=move |_| on_toggle_global.run(())
				>
					<svg viewBox="0 0 55 55" width="20" height="20" fill="currentColor">
						<circle cx="10" cy="10" r="5" />
						<circle cx="45" cy="15" r="5" />
						<circle cx="27" cy="42" r="5" />
						<path d="M10 10 L45 15 L27 42 Z" fill="none" stroke="currentColor" />
					</svg>
				</button>
			</div>
			<div
				class="global-graph-outer"
				style="position: fixed; inset: 0; z-index: 998; display: none; align-items: center; justify-content: center; background: rgba(0, 0, 0, 0.5);"
				on:click=on_backdrop
			>
				<div
					class="global-graph-container"
					data-cfg=global_cfg
					style="width: 80vw; height: 80vh;"
				></div>
			</div>
		</div>
	}
}
