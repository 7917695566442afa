use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::debug;
use uuid::Uuid;

use crate::{Error, error::Result};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

time::serde::format_description!(wire_date, Date, "[year]-[month]-[day]");

/// Stored record, also the wire shape of responses. Field casing is part of
/// the existing external contract (camel for the id, snake for the date).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieInfo {
    #[serde(rename = "movieInfoId")]
    pub id: Option<String>,
    pub name: String,
    pub year: i32,
    pub cast: Vec<String>,
    #[serde(with = "wire_date")]
    pub release_date: Date,
}

/// Incoming payload. The date stays a string here so garde can report an
/// unparseable value together with the other field failures.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateMovieInfo {
    #[serde(rename = "movieInfoId", default)]
    #[garde(skip)]
    id: Option<String>,
    #[garde(custom(not_blank))]
    name: String,
    #[garde(range(min = 1))]
    year: i32,
    #[garde(inner(custom(not_blank)))]
    cast: Vec<String>,
    #[garde(custom(valid_date))]
    release_date: String,
}

fn not_blank(value: &str, _context: &()) -> garde::Result {
    if value.trim().is_empty() {
        Err(garde::Error::new("must not be blank"))
    } else {
        Ok(())
    }
}

fn valid_date(value: &str, _context: &()) -> garde::Result {
    Date::parse(value, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| garde::Error::new("must be a YYYY-MM-DD date"))
}

impl TryFrom<CreateMovieInfo> for MovieInfo {
    type Error = time::error::Parse;

    fn try_from(payload: CreateMovieInfo) -> Result<Self, Self::Error> {
        let release_date = Date::parse(&payload.release_date, DATE_FORMAT)?;
        Ok(MovieInfo {
            id: payload.id,
            name: payload.name,
            year: payload.year,
            cast: payload.cast,
            release_date,
        })
    }
}

pub type MovieInfoRepository = MovieInfoRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct MovieInfoRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> MovieInfoRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// All stored records, in no particular order.
    pub async fn list_all(&self) -> Result<Vec<MovieInfo>> {
        let docs = sqlx::query_scalar::<_, String>(r#"SELECT doc FROM "movieInfos""#)
            .fetch_all(&self.executor)
            .await?;
        docs.iter()
            .map(|doc| serde_json::from_str(doc).map_err(Error::from))
            .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<MovieInfo>> {
        let doc = sqlx::query_scalar::<_, String>(r#"SELECT doc FROM "movieInfos" WHERE id = ?"#)
            .bind(id)
            .fetch_optional(&self.executor)
            .await?;
        doc.map(|doc| serde_json::from_str(&doc).map_err(Error::from))
            .transpose()
    }

    /// Insert with a freshly minted id when the record has none, otherwise
    /// upsert by id, replacing the whole document.
    pub async fn save(&self, mut record: MovieInfo) -> Result<MovieInfo> {
        let id = match record.id.take() {
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };
        record.id = Some(id.clone());
        let doc = serde_json::to_string(&record)?;
        sqlx::query(
            r#"INSERT INTO "movieInfos" (id, doc) VALUES (?, ?)
               ON CONFLICT(id) DO UPDATE SET doc = excluded.doc"#,
        )
        .bind(&id)
        .bind(&doc)
        .execute(&self.executor)
        .await?;
        Ok(record)
    }

    pub async fn save_all(&self, records: Vec<MovieInfo>) -> Result<Vec<MovieInfo>> {
        let mut saved = Vec::with_capacity(records.len());
        for record in records {
            saved.push(self.save(record).await?);
        }
        Ok(saved)
    }

    /// Deleting a missing id is not an error, the operation is idempotent.
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        let res = sqlx::query(r#"DELETE FROM "movieInfos" WHERE id = ?"#)
            .bind(id)
            .execute(&self.executor)
            .await?;
        if res.rows_affected() == 0 {
            debug!("Delete of missing record {id}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    // Single connection, otherwise every pooled connection gets its own
    // private in-memory database.
    async fn test_pool() -> crate::Pool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(crate::SCHEMA).execute(&pool).await.unwrap();
        pool
    }

    fn sample(name: &str, year: i32) -> MovieInfo {
        MovieInfo {
            id: None,
            name: name.to_string(),
            year,
            cast: vec!["Christian Bale".to_string()],
            release_date: date!(2005 - 06 - 15),
        }
    }

    #[tokio::test]
    async fn save_without_id_assigns_one() {
        let repository = MovieInfoRepositoryImpl::new(test_pool().await);

        let saved = repository.save(sample("Batman Begins", 2005)).await.unwrap();
        let id = saved.id.clone().expect("id assigned");
        assert!(!id.is_empty());

        let found = repository.find_by_id(&id).await.unwrap();
        assert_eq!(found, Some(saved));
    }

    #[tokio::test]
    async fn save_with_id_replaces_whole_document() {
        let repository = MovieInfoRepositoryImpl::new(test_pool().await);

        let saved = repository.save(sample("Batman Begins", 2005)).await.unwrap();
        let id = saved.id.clone().unwrap();

        let mut replacement = sample("The Dark Knight", 2008);
        replacement.id = Some(id.clone());
        replacement.cast.push("Heath Ledger".to_string());
        let updated = repository.save(replacement.clone()).await.unwrap();
        assert_eq!(updated, replacement);

        let found = repository.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.name, "The Dark Knight");
        assert_eq!(found.cast.len(), 2);
        assert_eq!(repository.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_with_unknown_id_inserts_under_it() {
        let repository = MovieInfoRepositoryImpl::new(test_pool().await);

        let mut record = sample("Batman Begins", 2005);
        record.id = Some("abc".to_string());
        let saved = repository.save(record).await.unwrap();
        assert_eq!(saved.id.as_deref(), Some("abc"));

        let found = repository.find_by_id("abc").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn find_missing_is_none() {
        let repository = MovieInfoRepositoryImpl::new(test_pool().await);
        assert_eq!(repository.find_by_id("does-not-exist").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repository = MovieInfoRepositoryImpl::new(test_pool().await);

        let saved = repository.save(sample("Batman Begins", 2005)).await.unwrap();
        let id = saved.id.unwrap();

        repository.delete_by_id(&id).await.unwrap();
        assert_eq!(repository.find_by_id(&id).await.unwrap(), None);
        repository.delete_by_id(&id).await.unwrap();
        repository.delete_by_id("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn save_all_then_list_all() {
        let repository = MovieInfoRepositoryImpl::new(test_pool().await);

        let records = vec![
            sample("Batman Begins", 2005),
            sample("The Dark Knight", 2008),
            sample("Dark Knight Rises", 2012),
        ];
        let saved = repository.save_all(records).await.unwrap();
        assert!(saved.iter().all(|r| r.id.is_some()));

        let mut listed = repository.list_all().await.unwrap();
        listed.sort_by_key(|r| r.year);
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].name, "Batman Begins");
        assert_eq!(listed[2].name, "Dark Knight Rises");
    }

    #[test]
    fn wire_shape_keeps_contract_casing() {
        let record = MovieInfo {
            id: Some("abc".to_string()),
            ..sample("Batman Begins", 2005)
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["movieInfoId"], "abc");
        assert_eq!(value["release_date"], "2005-06-15");
    }

    #[test]
    fn payload_validation_reports_all_offending_fields() {
        let payload: CreateMovieInfo = serde_json::from_value(json!({
            "movieInfoId": null,
            "name": "  ",
            "year": -2005,
            "cast": [""],
            "release_date": "2005-06-15",
        }))
        .unwrap();

        let report = payload.validate().unwrap_err();
        let fields: Vec<String> = report.iter().map(|(path, _)| path.to_string()).collect();
        assert!(fields.iter().any(|f| f.contains("name")));
        assert!(fields.iter().any(|f| f.contains("year")));
        assert!(fields.iter().any(|f| f.contains("cast")));
    }

    #[test]
    fn payload_rejects_unparseable_date() {
        let payload: CreateMovieInfo = serde_json::from_value(json!({
            "name": "Batman Begins",
            "year": 2005,
            "cast": ["Christian Bale"],
            "release_date": "June 15, 2005",
        }))
        .unwrap();

        let report = payload.validate().unwrap_err();
        let fields: Vec<String> = report.iter().map(|(path, _)| path.to_string()).collect();
        assert!(fields.iter().any(|f| f.contains("release_date")));
    }

    #[test]
    fn empty_cast_sequence_is_accepted() {
        let payload: CreateMovieInfo = serde_json::from_value(json!({
            "name": "Batman Begins",
            "year": 2005,
            "cast": [],
            "release_date": "2005-06-15",
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
    }
}
