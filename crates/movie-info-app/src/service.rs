use movie_info_dal::error::Result;
use movie_info_dal::movie_info::{MovieInfo, MovieInfoRepository};

use crate::state::AppState;

/// Business layer over the repository. Exists to guarantee that identity is
/// assigned by the store on create and that the path id wins on update.
pub struct MovieInfoService {
    repository: MovieInfoRepository,
}

impl MovieInfoService {
    pub fn new(repository: MovieInfoRepository) -> Self {
        Self { repository }
    }

    pub async fn get_all(&self) -> Result<Vec<MovieInfo>> {
        self.repository.list_all().await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<MovieInfo>> {
        self.repository.find_by_id(id).await
    }

    /// A client supplied id is never trusted on create.
    pub async fn create(&self, mut record: MovieInfo) -> Result<MovieInfo> {
        record.id = None;
        self.repository.save(record).await
    }

    /// Blind upsert: the body id is overwritten with the path id and no
    /// existence check is made, so an unknown id creates the record under it.
    pub async fn update(&self, mut record: MovieInfo, id: &str) -> Result<MovieInfo> {
        record.id = Some(id.to_string());
        self.repository.save(record).await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.repository.delete_by_id(id).await
    }
}

impl axum::extract::FromRequestParts<AppState> for MovieInfoService {
    type Rejection = http::StatusCode;

    fn from_request_parts(
        _parts: &mut http::request::Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = std::result::Result<Self, Self::Rejection>>
           + core::marker::Send {
        futures::future::ready(std::result::Result::Ok(MovieInfoService::new(
            MovieInfoRepository::new(state.pool().clone()),
        )))
    }
}
