use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../../templates/index.html");

/// Render the index page, injecting the accepted container suffix.
pub fn render_index(container_suffix: &str) -> Html<String> {
    let html = INDEX_HTML.replace("{{ container_suffix }}", container_suffix);
    Html(html)
}
