use axum::{Json, extract::Path, response::IntoResponse};
use axum_valid::Garde;
use http::StatusCode;
use movie_info_dal::movie_info::{CreateMovieInfo, MovieInfo};

use crate::error::{ApiError, ApiResult};
use crate::service::MovieInfoService;

pub async fn list(service: MovieInfoService) -> ApiResult<impl IntoResponse> {
    let records = service.get_all().await?;
    Ok((StatusCode::OK, Json(records)))
}

pub async fn get(
    Path(id): Path<String>,
    service: MovieInfoService,
) -> ApiResult<impl IntoResponse> {
    let record = service.find_by_id(&id).await?.ok_or(ApiError::NotFound)?;
    Ok((StatusCode::OK, Json(record)))
}

pub async fn create(
    service: MovieInfoService,
    Garde(Json(payload)): Garde<Json<CreateMovieInfo>>,
) -> ApiResult<impl IntoResponse> {
    let record = decode(payload)?;
    let record = service.create(record).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

// The body is deliberately not field-validated here, only create enforces the
// rules. Update is an upsert: an unknown id answers 200 with the new record.
pub async fn update(
    Path(id): Path<String>,
    service: MovieInfoService,
    Json(payload): Json<CreateMovieInfo>,
) -> ApiResult<impl IntoResponse> {
    let record = decode(payload)?;
    let record = service.update(record, &id).await?;
    Ok((StatusCode::OK, Json(record)))
}

pub async fn delete(
    Path(id): Path<String>,
    service: MovieInfoService,
) -> ApiResult<impl IntoResponse> {
    service.delete_by_id(&id).await?;
    Ok((StatusCode::NO_CONTENT, ()))
}

fn decode(payload: CreateMovieInfo) -> Result<MovieInfo, ApiError> {
    payload
        .try_into()
        .map_err(|e| ApiError::InvalidPayload(format!("release_date: {e}")))
}

pub fn router() -> axum::Router<crate::state::AppState> {
    use axum::routing;
    axum::Router::new()
        .route("/movie-info", routing::get(list).post(create))
        .route(
            "/movie-info/{id}",
            routing::get(get).put(update).delete(delete),
        )
}
