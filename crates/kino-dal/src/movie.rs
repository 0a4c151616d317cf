use std::fmt::Display;

use futures::{StreamExt as _, TryStreamExt as _};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::{Batch, Error, ListingParams, error::Result};

pub const DEFAULT_LANGUAGE: &str = "English";

/// Newest releases first, creation time breaks ties.
const DEFAULT_ORDER: &str = "release_date DESC, created_at DESC";

const VALID_ORDER_FIELDS: &[&str] = &[
    "id",
    "title",
    "director",
    "genre",
    "release_date",
    "runtime",
    "rating",
    "language",
    "country",
    "created_at",
    "updated_at",
];

// "cast" is a SQL keyword, must stay quoted
const SEARCH_FIELDS: &[&str] = &["title", "director", "\"cast\"", "genre", "country"];

fn one_fraction_digit(value: &f64, _ctx: &()) -> garde::Result {
    let scaled = value * 10.0;
    if (scaled - scaled.round()).abs() > 1e-9 {
        return Err(garde::Error::new(
            "rating can have at most one fraction digit",
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateMovie {
    #[garde(length(min = 1, max = 255))]
    pub title: String,
    #[garde(length(min = 1, max = 200))]
    pub director: String,
    #[garde(length(min = 1, max = 200))]
    pub screenwriter: Option<String>,
    /// Free form, comma separated names
    #[garde(length(min = 1))]
    pub cast: String,
    #[garde(length(min = 1, max = 100))]
    pub genre: String,
    #[garde(skip)]
    pub release_date: Date,
    /// Minutes
    #[garde(range(min = 0))]
    pub runtime: i64,
    #[garde(length(min = 1))]
    pub plot_summary: String,
    #[garde(range(min = 0.0, max = 10.0), inner(custom(one_fraction_digit)))]
    pub rating: Option<f64>,
    #[garde(length(min = 1, max = 50))]
    pub language: Option<String>,
    #[garde(length(min = 1, max = 100))]
    pub country: String,
    #[garde(skip)]
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub director: String,
    pub screenwriter: Option<String>,
    pub cast: String,
    pub genre: String,
    pub release_date: Date,
    pub runtime: i64,
    pub plot_summary: String,
    pub rating: Option<f64>,
    pub language: String,
    pub country: String,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Display for Movie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.release_date.year())
    }
}

/// Listing columns, matching what the admin table shows.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct MovieShort {
    pub id: i64,
    pub title: String,
    pub director: String,
    pub genre: String,
    pub release_date: Date,
    pub runtime: i64,
    pub rating: Option<f64>,
    pub is_public: bool,
}

#[derive(Debug, Default, Clone)]
pub struct MovieFilter {
    pub genre: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub is_public: Option<bool>,
    pub search: Option<String>,
}

impl MovieFilter {
    fn where_clause(&self) -> String {
        let mut conditions: Vec<String> = Vec::new();
        if self.genre.is_some() {
            conditions.push("genre = ?".into());
        }
        if self.language.is_some() {
            conditions.push("language = ?".into());
        }
        if self.country.is_some() {
            conditions.push("country = ?".into());
        }
        if self.is_public.is_some() {
            conditions.push("is_public = ?".into());
        }
        if self.search.is_some() {
            let like = SEARCH_FIELDS
                .iter()
                .map(|f| format!("{f} LIKE ? ESCAPE '\\'"))
                .collect::<Vec<_>>()
                .join(" OR ");
            conditions.push(format!("({like})"));
        }
        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }

    /// Substring match pattern; LIKE wildcards in the term match literally.
    fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|s| {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}

// Binds must follow the order of conditions in where_clause.
macro_rules! bind_filter {
    ($query:expr, $filter:expr, $pattern:expr) => {{
        let mut query = $query;
        if let Some(genre) = &$filter.genre {
            query = query.bind(genre);
        }
        if let Some(language) = &$filter.language {
            query = query.bind(language);
        }
        if let Some(country) = &$filter.country {
            query = query.bind(country);
        }
        if let Some(is_public) = $filter.is_public {
            query = query.bind(is_public);
        }
        if let Some(pattern) = &$pattern {
            for _ in 0..SEARCH_FIELDS.len() {
                query = query.bind(pattern.clone());
            }
        }
        query
    }};
}

pub type MovieRepository = MovieRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct MovieRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> MovieRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateMovie) -> Result<Movie> {
        payload.validate()?;
        let now = OffsetDateTime::now_utc();
        let result = sqlx::query(
            r#"INSERT INTO movie
            (title, director, screenwriter, "cast", genre, release_date, runtime,
             plot_summary, rating, language, country, is_public, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&payload.title)
        .bind(&payload.director)
        .bind(&payload.screenwriter)
        .bind(&payload.cast)
        .bind(&payload.genre)
        .bind(payload.release_date)
        .bind(payload.runtime)
        .bind(&payload.plot_summary)
        .bind(payload.rating)
        .bind(payload.language.as_deref().unwrap_or(DEFAULT_LANGUAGE))
        .bind(&payload.country)
        .bind(payload.is_public.unwrap_or(true))
        .bind(now)
        .bind(now)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id).await
    }

    /// Full row update, created_at stays untouched. Concurrent writers are
    /// last-write-wins, there is no version column.
    pub async fn update(&self, id: i64, payload: CreateMovie) -> Result<Movie> {
        payload.validate()?;
        let now = OffsetDateTime::now_utc();
        let result = sqlx::query(
            r#"UPDATE movie SET title = ?, director = ?, screenwriter = ?, "cast" = ?,
            genre = ?, release_date = ?, runtime = ?, plot_summary = ?, rating = ?,
            language = ?, country = ?, is_public = ?, updated_at = ?
            WHERE id = ?"#,
        )
        .bind(&payload.title)
        .bind(&payload.director)
        .bind(&payload.screenwriter)
        .bind(&payload.cast)
        .bind(&payload.genre)
        .bind(payload.release_date)
        .bind(payload.runtime)
        .bind(&payload.plot_summary)
        .bind(payload.rating)
        .bind(payload.language.as_deref().unwrap_or(DEFAULT_LANGUAGE))
        .bind(&payload.country)
        .bind(payload.is_public.unwrap_or(true))
        .bind(now)
        .bind(id)
        .execute(&self.executor)
        .await?;

        if result.rows_affected() == 0 {
            debug!("Update of missing movie {id}");
            Err(Error::RecordNotFound("Movie".to_string()))
        } else {
            self.get(id).await
        }
    }

    pub async fn get(&self, id: i64) -> Result<Movie> {
        let record = sqlx::query_as::<_, Movie>("SELECT * FROM movie WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound("Movie".to_string()))?;
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM movie WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Movie".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn count(&self) -> Result<u64> {
        let count: u64 = sqlx::query_scalar("SELECT count(*) FROM movie")
            .fetch_one(&self.executor)
            .await?;
        Ok(count)
    }

    pub async fn list_all(&self) -> Result<Batch<MovieShort>> {
        self.list(ListingParams::default(), MovieFilter::default())
            .await
    }

    /// Fresh query each call. Equality filters and substring search narrow
    /// both the rows and the reported total.
    pub async fn list(
        &self,
        params: ListingParams,
        filter: MovieFilter,
    ) -> Result<Batch<MovieShort>> {
        let ordering = params.ordering(VALID_ORDER_FIELDS)?;
        let order = if ordering.is_empty() {
            DEFAULT_ORDER.to_string()
        } else {
            ordering
        };
        let where_clause = filter.where_clause();
        let pattern = filter.search_pattern();

        let count_sql = format!("SELECT count(*) FROM movie {where_clause}");
        let total: u64 = bind_filter!(sqlx::query_scalar(&count_sql), filter, pattern)
            .fetch_one(&self.executor)
            .await?;

        let sql = format!(
            "SELECT id, title, director, genre, release_date, runtime, rating, is_public \
             FROM movie {where_clause} ORDER BY {order} LIMIT ? OFFSET ?"
        );
        let rows = bind_filter!(sqlx::query_as::<_, MovieShort>(&sql), filter, pattern)
            .bind(params.limit)
            .bind(params.offset)
            .fetch(&self.executor)
            .take(crate::MAX_LIMIT)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(Batch {
            offset: params.offset,
            total,
            rows,
        })
    }
}
