use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_valid::Garde;
use garde::Validate;
use http::StatusCode;
use serde::Deserialize;

use kino_dal::movie::{CreateMovie, MovieFilter, MovieRepository};

use crate::error::ApiResult;
use crate::rest_api::{Page, Paging};
use crate::state::AppState;

crate::repository_from_request!(MovieRepository);

/// Listing query: paging plus the filter sidebar and search box fields.
#[derive(Debug, Clone, Deserialize, Validate)]
#[garde(allow_unvalidated)]
pub struct MovieListQuery {
    #[garde(range(min = 1))]
    page: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    page_size: Option<u32>,
    #[garde(length(max = 255))]
    sort: Option<String>,
    #[garde(length(max = 100))]
    genre: Option<String>,
    #[garde(length(max = 50))]
    language: Option<String>,
    #[garde(length(max = 100))]
    country: Option<String>,
    is_public: Option<bool>,
    #[garde(length(max = 255))]
    search: Option<String>,
}

impl MovieListQuery {
    fn paging(&self) -> Paging {
        Paging {
            page: self.page,
            page_size: self.page_size,
            sort: self.sort.clone(),
        }
    }

    fn into_filter(self) -> MovieFilter {
        MovieFilter {
            genre: self.genre,
            language: self.language,
            country: self.country,
            is_public: self.is_public,
            search: self.search,
        }
    }
}

pub async fn list(
    repository: MovieRepository,
    State(state): State<AppState>,
    Garde(Query(query)): Garde<Query<MovieListQuery>>,
) -> ApiResult<impl IntoResponse> {
    let default_page_size = state.config().default_page_size;
    let paging = query.paging();
    let page_size = paging.page_size(default_page_size);
    let listing_params = paging.into_listing_params(default_page_size)?;
    let batch = repository.list(listing_params, query.into_filter()).await?;
    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

pub async fn list_all(repository: MovieRepository) -> ApiResult<impl IntoResponse> {
    let batch = repository.list_all().await?;
    Ok((StatusCode::OK, Json(batch.rows)))
}

pub async fn count(repository: MovieRepository) -> ApiResult<impl IntoResponse> {
    let count = repository.count().await?;
    Ok((StatusCode::OK, Json(count)))
}

pub async fn get(
    Path(id): Path<i64>,
    repository: MovieRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(id).await?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn create(
    repository: MovieRepository,
    Garde(Json(payload)): Garde<Json<CreateMovie>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.create(payload).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update(
    Path(id): Path<i64>,
    repository: MovieRepository,
    Garde(Json(payload)): Garde<Json<CreateMovie>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.update(id, payload).await?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn delete(
    Path(id): Path<i64>,
    repository: MovieRepository,
) -> ApiResult<impl IntoResponse> {
    repository.delete(id).await?;

    Ok((StatusCode::NO_CONTENT, ()))
}

pub fn router() -> axum::Router<AppState> {
    use axum::routing;
    axum::Router::new()
        .route("/", routing::get(list).post(create))
        .route("/all", routing::get(list_all))
        .route("/count", routing::get(count))
        .route("/{id}", routing::get(get).put(update).delete(delete))
}
