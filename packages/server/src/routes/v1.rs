use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::upload::upload_batch,
            handlers::upload::list_uploads
        ))
        .routes(routes!(handlers::analyze::run_analysis))
}
