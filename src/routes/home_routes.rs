use axum::{Router, extract::State, response::Html, routing::get};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(home))
}

async fn home(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<html>
<head><title>Outline Wiki Exporter</title></head>
<body>
<h1>Outline Wiki Exporter</h1>
<p><a href="{path}">Metrics</a></p>
</body>
</html>"#,
        path = state.config.metrics_path
    ))
}
