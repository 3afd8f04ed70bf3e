use leptos::prelude::*;

/// Shown for paths the content index does not know.
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<article class="popover-hint">
			<h1>"404"</h1>
			<p>"Either this page is private or doesn't exist."</p>
			<a href="/">"Return to Homepage"</a>
		</article>
	}
}
