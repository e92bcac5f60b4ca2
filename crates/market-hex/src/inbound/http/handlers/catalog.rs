use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use market_types::domain::livestock::{Livestock, LivestockFilter};
use market_types::ports::MarketRepository;

use crate::errors::AppError;
use crate::inbound::http::server::{parse_id, AppState};

pub(crate) const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400";

pub(crate) async fn list<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Query(filter): Query<LivestockFilter>,
) -> Result<Json<Vec<Livestock>>, AppError> {
    Ok(Json(state.services.catalog.list(&filter).await?))
}

pub(crate) async fn get<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<Json<Livestock>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.services.catalog.get(id).await?))
}

pub(crate) async fn image<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let image = state.services.catalog.image(id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
        ],
        image.data,
    ))
}
