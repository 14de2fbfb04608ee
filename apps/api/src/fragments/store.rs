//! Read-only access to the prompt-fragment store (SQLite `elements` table).
//!
//! The store is populated elsewhere. Every query degrades to an empty result
//! when the database is missing, cannot be opened, or a query fails, so the
//! pipeline keeps working with a thinner context.
//!
//! Ranked queries order by `reusability_score DESC`, ties broken by insertion
//! order (`rowid ASC`).

use std::path::Path;

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::models::fragment::{Fragment, FragmentRow};

/// Identity columns are coerced to text so integer keys and NULL names decode.
const FRAGMENT_COLUMNS: &str = "COALESCE(CAST(element_id AS TEXT), '') AS element_id, \
    COALESCE(CAST(domain_id AS TEXT), '') AS domain_id, \
    COALESCE(CAST(category_id AS TEXT), '') AS category_id, \
    COALESCE(CAST(name AS TEXT), '') AS name, \
    CAST(chinese_name AS TEXT) AS chinese_name, \
    CAST(ai_prompt_template AS TEXT) AS ai_prompt_template, \
    CAST(keywords AS TEXT) AS keywords, \
    CAST(reusability_score AS REAL) AS reusability_score";

/// Per-category row count for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

pub struct FragmentStore {
    pool: Option<SqlitePool>,
}

impl FragmentStore {
    /// Opens the store read-only. Never fails: a missing or unreadable file
    /// yields an unavailable store.
    pub async fn open(path: &str) -> Self {
        if !Path::new(path).exists() {
            warn!("Fragment store not found at {path}; continuing without fragments");
            return Self::unavailable();
        }

        let options = SqliteConnectOptions::new().filename(path).read_only(true);

        match SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
        {
            Ok(pool) => {
                info!("Fragment store opened at {path}");
                Self { pool: Some(pool) }
            }
            Err(e) => {
                warn!("Failed to open fragment store at {path}: {e}");
                Self::unavailable()
            }
        }
    }

    pub fn unavailable() -> Self {
        Self { pool: None }
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    /// Releases the underlying connection. Safe to call on an unavailable store.
    pub async fn close(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
            debug!("Fragment store closed");
        }
    }

    /// Highest-ranked fragments of a domain.
    pub async fn top_by_domain(&self, domain: &str, limit: u32) -> Vec<Fragment> {
        let Some(pool) = &self.pool else {
            return Vec::new();
        };

        let sql = format!(
            "SELECT {FRAGMENT_COLUMNS} FROM elements \
             WHERE domain_id = ? \
             ORDER BY reusability_score DESC, rowid ASC \
             LIMIT ?"
        );

        let rows = sqlx::query_as::<_, FragmentRow>(&sql)
            .bind(domain)
            .bind(i64::from(limit))
            .fetch_all(pool)
            .await;

        into_fragments(rows, "top_by_domain")
    }

    /// Highest-ranked fragments of one category within a domain.
    pub async fn by_category(&self, domain: &str, category: &str, limit: u32) -> Vec<Fragment> {
        let Some(pool) = &self.pool else {
            return Vec::new();
        };

        let sql = format!(
            "SELECT {FRAGMENT_COLUMNS} FROM elements \
             WHERE domain_id = ? AND category_id = ? \
             ORDER BY reusability_score DESC, rowid ASC \
             LIMIT ?"
        );

        let rows = sqlx::query_as::<_, FragmentRow>(&sql)
            .bind(domain)
            .bind(category)
            .bind(i64::from(limit))
            .fetch_all(pool)
            .await;

        into_fragments(rows, "by_category")
    }

    /// Fragments where any keyword is a substring of any of name, localized
    /// name, keyword list, or template text. `domain` narrows with AND.
    ///
    /// Matching uses SQLite `LIKE` (ASCII case-insensitive); wildcard
    /// characters in keywords are escaped so they match literally.
    pub async fn search_by_keywords(
        &self,
        keywords: &[String],
        domain: Option<&str>,
        limit: u32,
    ) -> Vec<Fragment> {
        let Some(pool) = &self.pool else {
            return Vec::new();
        };

        let patterns: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(like_pattern)
            .collect();

        if patterns.is_empty() {
            return Vec::new();
        }

        let field_match = "(keywords LIKE ? ESCAPE '\\' OR name LIKE ? ESCAPE '\\' \
             OR chinese_name LIKE ? ESCAPE '\\' OR ai_prompt_template LIKE ? ESCAPE '\\')";
        let any_keyword = vec![field_match; patterns.len()].join(" OR ");

        let where_clause = match domain {
            Some(_) => format!("domain_id = ? AND ({any_keyword})"),
            None => any_keyword,
        };

        let sql = format!(
            "SELECT {FRAGMENT_COLUMNS} FROM elements \
             WHERE {where_clause} \
             ORDER BY reusability_score DESC, rowid ASC \
             LIMIT ?"
        );

        let mut query = sqlx::query_as::<_, FragmentRow>(&sql);
        if let Some(domain) = domain {
            query = query.bind(domain);
        }
        for pattern in &patterns {
            for _ in 0..4 {
                query = query.bind(pattern.clone());
            }
        }
        query = query.bind(i64::from(limit));

        into_fragments(query.fetch_all(pool).await, "search_by_keywords")
    }

    /// Categories present for a domain, in first-insertion order.
    pub async fn distinct_categories(&self, domain: &str) -> Vec<String> {
        let Some(pool) = &self.pool else {
            return Vec::new();
        };

        let result = sqlx::query_scalar::<_, String>(
            "SELECT COALESCE(CAST(category_id AS TEXT), '') AS category FROM elements \
             WHERE domain_id = ? \
             GROUP BY category \
             ORDER BY MIN(rowid)",
        )
        .bind(domain)
        .fetch_all(pool)
        .await;

        result.unwrap_or_else(|e| {
            warn!("Fragment query distinct_categories failed: {e}");
            Vec::new()
        })
    }

    /// Row count per category, largest first.
    pub async fn category_stats(&self, domain: &str) -> Vec<CategoryCount> {
        let Some(pool) = &self.pool else {
            return Vec::new();
        };

        let result = sqlx::query_as::<_, (String, i64)>(
            "SELECT COALESCE(CAST(category_id AS TEXT), '') AS category, COUNT(*) AS count \
             FROM elements \
             WHERE domain_id = ? \
             GROUP BY category \
             ORDER BY count DESC, MIN(rowid)",
        )
        .bind(domain)
        .fetch_all(pool)
        .await;

        match result {
            Ok(rows) => rows
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
            Err(e) => {
                warn!("Fragment query category_stats failed: {e}");
                Vec::new()
            }
        }
    }
}

fn into_fragments(rows: Result<Vec<FragmentRow>, sqlx::Error>, op: &str) -> Vec<Fragment> {
    match rows {
        Ok(rows) => rows.into_iter().map(Fragment::from).collect(),
        Err(e) => {
            warn!("Fragment query {op} failed: {e}");
            Vec::new()
        }
    }
}

/// `%keyword%` with LIKE wildcards and the escape character escaped.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// (element_id, domain, category, name, chinese_name, template, keywords, score)
    pub(crate) type SeedRow = (
        &'static str,
        &'static str,
        &'static str,
        &'static str,
        &'static str,
        &'static str,
        &'static str,
        f64,
    );

    /// Writes a fragment database into a temp dir and returns it with its path.
    pub(crate) async fn seed_store(rows: &[SeedRow]) -> (TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elements.db").to_string_lossy().to_string();

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE elements (
                element_id         TEXT PRIMARY KEY,
                domain_id          TEXT NOT NULL,
                category_id        TEXT NOT NULL,
                name               TEXT NOT NULL,
                chinese_name       TEXT,
                ai_prompt_template TEXT,
                keywords           TEXT,
                reusability_score  REAL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        for row in rows {
            sqlx::query("INSERT INTO elements VALUES (?, ?, ?, ?, ?, ?, ?, ?)")
                .bind(row.0)
                .bind(row.1)
                .bind(row.2)
                .bind(row.3)
                .bind(row.4)
                .bind(row.5)
                .bind(row.6)
                .bind(row.7)
                .execute(&pool)
                .await
                .unwrap();
        }

        pool.close().await;
        (dir, path)
    }

    fn sample_rows() -> Vec<SeedRow> {
        vec![
            ("p1", "portrait", "lighting_techniques", "rim_light", "轮廓光", "rim lighting, glowing edges", "[\"rim\"]", 0.7),
            ("p2", "portrait", "lighting_techniques", "neon_light", "霓虹光", "neon lighting, cyberpunk glow", "neon,glow", 0.9),
            ("p3", "portrait", "poses", "hand_on_chin", "托腮", "hand resting on chin", "", 0.7),
            ("p4", "portrait", "lighting_techniques", "soft_window", "窗光", "soft natural window light", "natural", 0.5),
            ("a1", "art", "art_styles", "ink_wash", "水墨画", "traditional ink wash painting", "ink", 0.95),
            ("p5", "portrait", "poses", "percent_pose", "百分", "100%_literal pose", "", 0.1),
        ]
    }

    #[tokio::test]
    async fn test_missing_store_degrades_to_empty() {
        let store = FragmentStore::open("/nonexistent/dir/elements.db").await;
        assert!(!store.is_available());
        assert!(store.top_by_domain("portrait", 10).await.is_empty());
        assert!(store.by_category("portrait", "poses", 10).await.is_empty());
        assert!(store
            .search_by_keywords(&["neon".to_string()], None, 10)
            .await
            .is_empty());
        assert!(store.distinct_categories("portrait").await.is_empty());
        assert!(store.category_stats("portrait").await.is_empty());
        store.close().await;
    }

    #[tokio::test]
    async fn test_top_by_domain_orders_by_score_then_insertion() {
        let (_dir, path) = seed_store(&sample_rows()).await;
        let store = FragmentStore::open(&path).await;
        assert!(store.is_available());

        let ids: Vec<String> = store
            .top_by_domain("portrait", 10)
            .await
            .into_iter()
            .map(|f| f.id)
            .collect();
        // p1 and p3 tie at 0.7; insertion order decides
        assert_eq!(ids, vec!["p2", "p1", "p3", "p4", "p5"]);
        store.close().await;
    }

    #[tokio::test]
    async fn test_by_category_filters_and_limits() {
        let (_dir, path) = seed_store(&sample_rows()).await;
        let store = FragmentStore::open(&path).await;

        let fragments = store.by_category("portrait", "lighting_techniques", 2).await;
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].id, "p2");
        assert_eq!(fragments[0].keywords, vec!["neon", "glow"]);
        assert!(fragments.iter().all(|f| f.category == "lighting_techniques"));
        store.close().await;
    }

    #[tokio::test]
    async fn test_search_matches_any_keyword_any_field() {
        let (_dir, path) = seed_store(&sample_rows()).await;
        let store = FragmentStore::open(&path).await;

        // "托腮" hits chinese_name, "WINDOW" hits template case-insensitively
        let keywords = vec!["托腮".to_string(), "WINDOW".to_string()];
        let ids: Vec<String> = store
            .search_by_keywords(&keywords, None, 10)
            .await
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["p3", "p4"]);
        store.close().await;
    }

    #[tokio::test]
    async fn test_search_domain_is_and_filter() {
        let (_dir, path) = seed_store(&sample_rows()).await;
        let store = FragmentStore::open(&path).await;

        let keywords = vec!["ink".to_string(), "neon".to_string()];
        let scoped = store
            .search_by_keywords(&keywords, Some("portrait"), 10)
            .await;
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, "p2");

        let unscoped = store.search_by_keywords(&keywords, None, 10).await;
        assert_eq!(unscoped[0].id, "a1");
        assert_eq!(unscoped.len(), 2);
        store.close().await;
    }

    #[tokio::test]
    async fn test_search_escapes_like_wildcards() {
        let (_dir, path) = seed_store(&sample_rows()).await;
        let store = FragmentStore::open(&path).await;

        let hits = store
            .search_by_keywords(&["%_".to_string()], Some("portrait"), 10)
            .await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p5");

        assert!(store
            .search_by_keywords(&["  ".to_string()], None, 10)
            .await
            .is_empty());
        store.close().await;
    }

    #[tokio::test]
    async fn test_search_is_monotone_in_limit() {
        let (_dir, path) = seed_store(&sample_rows()).await;
        let store = FragmentStore::open(&path).await;
        let keywords = vec!["light".to_string(), "pose".to_string(), "chin".to_string()];

        let mut previous: Vec<Fragment> = Vec::new();
        for limit in 1..=6 {
            let current = store
                .search_by_keywords(&keywords, Some("portrait"), limit)
                .await;
            assert!(current.len() <= limit as usize);
            assert!(
                current
                    .windows(2)
                    .all(|w| w[0].reusability_score >= w[1].reusability_score),
                "results must stay sorted by score"
            );
            assert_eq!(&current[..previous.len()], &previous[..]);
            previous = current;
        }
        store.close().await;
    }

    #[tokio::test]
    async fn test_distinct_categories_and_stats() {
        let (_dir, path) = seed_store(&sample_rows()).await;
        let store = FragmentStore::open(&path).await;

        assert_eq!(
            store.distinct_categories("portrait").await,
            vec!["lighting_techniques", "poses"]
        );

        let stats = store.category_stats("portrait").await;
        assert_eq!(
            stats,
            vec![
                CategoryCount {
                    category: "lighting_techniques".to_string(),
                    count: 3
                },
                CategoryCount {
                    category: "poses".to_string(),
                    count: 2
                },
            ]
        );
        store.close().await;
    }

    #[tokio::test]
    async fn test_integer_ids_and_null_names_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elements.db").to_string_lossy().to_string();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::query(
            r#"
            CREATE TABLE elements (
                element_id         INTEGER PRIMARY KEY,
                domain_id          TEXT,
                category_id        TEXT,
                name               TEXT,
                chinese_name       TEXT,
                ai_prompt_template TEXT,
                keywords           TEXT,
                reusability_score  REAL
            );
            INSERT INTO elements VALUES
                (1, 'art', 'art_styles', 'ink_wash', '水墨画', 'ink wash painting', 'ink', 0.9),
                (2, 'art', NULL, NULL, NULL, 'loose brush strokes', NULL, 0.4);
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;

        let store = FragmentStore::open(&path).await;
        let fragments = store.top_by_domain("art", 10).await;
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].id, "1");
        assert_eq!(fragments[1].id, "2");
        assert_eq!(fragments[1].name, "");
        assert_eq!(fragments[1].category, "");

        let hits = store
            .search_by_keywords(&["brush".to_string()], Some("art"), 10)
            .await;
        assert_eq!(hits.len(), 1);
        assert_eq!(store.distinct_categories("art").await, vec!["art_styles", ""]);
        store.close().await;
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("neon"), "%neon%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
