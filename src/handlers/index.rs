//! Landing page linking to the metrics endpoint

use axum::{extract::State, response::Html};

use crate::handlers::AppState;

pub async fn handler(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>JSON Exporter</title></head>\n\
         <body>\n\
         <h1>JSON Exporter</h1>\n\
         <p><a href='{path}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        path = state.metrics_path()
    ))
}
