use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{
    Answer, AnswerFilter, AnswerUpdate, Article, ArticleContent, ArticleUpdate, Contemplation,
    ContemplationUpdate, Intention, IntentionUpdate, NewAnswer, NewArticle, NewContemplation,
    NewIntention, NewProject, NewQuote, Position, Project, ProjectUpdate, Quote, QuoteUpdate,
    ReorderItem,
};

use super::schema::SCHEMA;

const CONTEMPLATION_COLUMNS: &str =
    "id, question, active, featured, sort_order, votes, created_at";
const ANSWER_COLUMNS: &str = "id, contemplation_id, question, answer, author, color, \
     position_x, position_y, rotation, approved, created_at";
const INTENTION_COLUMNS: &str = "id, text, active, sort_order";
const QUOTE_COLUMNS: &str = "id, text, author, source, active";
const ARTICLE_COLUMNS: &str = "id, slug, title, excerpt, date, read_time, tags, featured, \
     epigraph, content_format, content_body";
const PROJECT_COLUMNS: &str = "id, slug, title, description, tech, year, status, featured, \
     role, links, philosophy, sections, gallery";

/// Tables that carry a single system-wide `featured` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeaturedTable {
    Contemplations,
    Articles,
    Projects,
}

impl FeaturedTable {
    fn name(self) -> &'static str {
        match self {
            FeaturedTable::Contemplations => "contemplations",
            FeaturedTable::Articles => "articles",
            FeaturedTable::Projects => "projects",
        }
    }
}

#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Feature one row and clear the flag everywhere else, in one transaction.
    /// Returns false when the row does not exist, leaving the table untouched.
    pub async fn set_featured(&self, table: FeaturedTable, id: i64) -> Result<bool> {
        let found = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let exists = row_exists(&tx, table.name(), id)?;
                if exists {
                    feature_exclusively(&tx, table, id)?;
                }
                tx.commit()?;
                Ok(exists)
            })
            .await?;
        Ok(found)
    }

    // Contemplation operations

    pub async fn list_contemplations(&self) -> Result<Vec<Contemplation>> {
        self.query_all(
            format!("SELECT {CONTEMPLATION_COLUMNS} FROM contemplations ORDER BY sort_order, id"),
            contemplation_from_row,
        )
        .await
    }

    pub async fn list_active_contemplations(&self) -> Result<Vec<Contemplation>> {
        self.query_all(
            format!(
                "SELECT {CONTEMPLATION_COLUMNS} FROM contemplations WHERE active = 1 ORDER BY sort_order, id"
            ),
            contemplation_from_row,
        )
        .await
    }

    pub async fn get_contemplation(&self, id: i64) -> Result<Option<Contemplation>> {
        let contemplation = self
            .conn
            .call(move |conn| Ok(fetch_contemplation(conn, id)?))
            .await?;
        Ok(contemplation)
    }

    pub async fn insert_contemplation(&self, new: NewContemplation) -> Result<Contemplation> {
        let contemplation = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let order = next_sort_order(&tx, "contemplations")?;
                tx.execute(
                    "INSERT INTO contemplations (question, active, featured, sort_order) VALUES (?1, ?2, 0, ?3)",
                    params![new.question, new.active.unwrap_or(true), order],
                )?;
                let id = tx.last_insert_rowid();
                if new.featured.unwrap_or(false) {
                    feature_exclusively(&tx, FeaturedTable::Contemplations, id)?;
                }
                let created = fetch_contemplation(&tx, id)?;
                tx.commit()?;
                Ok(created)
            })
            .await?;
        contemplation.ok_or_else(|| AppError::not_found("Contemplation"))
    }

    pub async fn update_contemplation(
        &self,
        id: i64,
        update: ContemplationUpdate,
    ) -> Result<Option<Contemplation>> {
        let contemplation = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(mut current) = fetch_contemplation(&tx, id)? else {
                    return Ok(None);
                };
                current.apply(update);
                tx.execute(
                    "UPDATE contemplations SET question = ?1, active = ?2, featured = ?3, sort_order = ?4 WHERE id = ?5",
                    params![current.question, current.active, current.featured, current.order, id],
                )?;
                if current.featured {
                    feature_exclusively(&tx, FeaturedTable::Contemplations, id)?;
                }
                tx.commit()?;
                Ok(Some(current))
            })
            .await?;
        Ok(contemplation)
    }

    pub async fn reorder_contemplations(&self, items: Vec<ReorderItem>) -> Result<()> {
        self.reorder("contemplations", items).await
    }

    /// Answers survive the deletion with their link cleared.
    pub async fn delete_contemplation(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "UPDATE answers SET contemplation_id = NULL WHERE contemplation_id = ?1",
                    params![id],
                )?;
                let affected = tx.execute("DELETE FROM contemplations WHERE id = ?1", params![id])?;
                tx.commit()?;
                Ok(affected > 0)
            })
            .await?;
        Ok(deleted)
    }

    pub async fn increment_votes(&self, id: i64) -> Result<Option<i64>> {
        let votes = self
            .conn
            .call(move |conn| {
                let votes = conn
                    .query_row(
                        "UPDATE contemplations SET votes = votes + 1 WHERE id = ?1 RETURNING votes",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(votes)
            })
            .await?;
        Ok(votes)
    }

    // Answer operations

    pub async fn insert_answer(&self, new: NewAnswer) -> Result<Answer> {
        let answer = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO answers (contemplation_id, question, answer, author, color,
                                            position_x, position_y, rotation, approved)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)"#,
                    params![
                        new.contemplation_id,
                        new.question,
                        new.answer,
                        new.author,
                        new.color.as_str(),
                        new.position.x,
                        new.position.y,
                        new.rotation,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok(fetch_answer(conn, id)?)
            })
            .await?;
        answer.ok_or_else(|| AppError::not_found("Answer"))
    }

    pub async fn list_answers(&self, filter: AnswerFilter) -> Result<Vec<Answer>> {
        let condition = match filter {
            AnswerFilter::Approved => "WHERE approved = 1",
            AnswerFilter::Pending => "WHERE approved = 0",
            AnswerFilter::All => "",
        };
        self.query_all(
            format!("SELECT {ANSWER_COLUMNS} FROM answers {condition} ORDER BY created_at DESC, id DESC"),
            answer_from_row,
        )
        .await
    }

    pub async fn get_answer(&self, id: i64) -> Result<Option<Answer>> {
        let answer = self
            .conn
            .call(move |conn| Ok(fetch_answer(conn, id)?))
            .await?;
        Ok(answer)
    }

    pub async fn update_answer(&self, id: i64, update: AnswerUpdate) -> Result<Option<Answer>> {
        let answer = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(mut current) = fetch_answer(&tx, id)? else {
                    return Ok(None);
                };
                current.apply(update);
                tx.execute(
                    "UPDATE answers SET approved = ?1, answer = ?2, author = ?3, color = ?4 WHERE id = ?5",
                    params![
                        current.approved,
                        current.answer,
                        current.author,
                        current.color.as_str(),
                        id
                    ],
                )?;
                tx.commit()?;
                Ok(Some(current))
            })
            .await?;
        Ok(answer)
    }

    pub async fn delete_answer(&self, id: i64) -> Result<bool> {
        self.delete_by_id("answers", id).await
    }

    // Intention operations

    pub async fn list_intentions(&self) -> Result<Vec<Intention>> {
        self.query_all(
            format!("SELECT {INTENTION_COLUMNS} FROM intentions ORDER BY sort_order, id"),
            intention_from_row,
        )
        .await
    }

    pub async fn list_active_intentions(&self) -> Result<Vec<Intention>> {
        self.query_all(
            format!(
                "SELECT {INTENTION_COLUMNS} FROM intentions WHERE active = 1 ORDER BY sort_order, id"
            ),
            intention_from_row,
        )
        .await
    }

    pub async fn get_intention(&self, id: i64) -> Result<Option<Intention>> {
        let intention = self
            .conn
            .call(move |conn| Ok(fetch_intention(conn, id)?))
            .await?;
        Ok(intention)
    }

    pub async fn insert_intention(&self, new: NewIntention) -> Result<Intention> {
        let intention = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let order = next_sort_order(&tx, "intentions")?;
                tx.execute(
                    "INSERT INTO intentions (text, active, sort_order) VALUES (?1, ?2, ?3)",
                    params![new.text, new.active.unwrap_or(true), order],
                )?;
                let created = fetch_intention(&tx, tx.last_insert_rowid())?;
                tx.commit()?;
                Ok(created)
            })
            .await?;
        intention.ok_or_else(|| AppError::not_found("Intention"))
    }

    pub async fn update_intention(
        &self,
        id: i64,
        update: IntentionUpdate,
    ) -> Result<Option<Intention>> {
        let intention = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(mut current) = fetch_intention(&tx, id)? else {
                    return Ok(None);
                };
                current.apply(update);
                tx.execute(
                    "UPDATE intentions SET text = ?1, active = ?2, sort_order = ?3 WHERE id = ?4",
                    params![current.text, current.active, current.order, id],
                )?;
                tx.commit()?;
                Ok(Some(current))
            })
            .await?;
        Ok(intention)
    }

    pub async fn reorder_intentions(&self, items: Vec<ReorderItem>) -> Result<()> {
        self.reorder("intentions", items).await
    }

    pub async fn delete_intention(&self, id: i64) -> Result<bool> {
        self.delete_by_id("intentions", id).await
    }

    // Quote operations

    pub async fn list_quotes(&self) -> Result<Vec<Quote>> {
        self.query_all(
            format!("SELECT {QUOTE_COLUMNS} FROM quotes ORDER BY id"),
            quote_from_row,
        )
        .await
    }

    pub async fn list_active_quotes(&self) -> Result<Vec<Quote>> {
        self.query_all(
            format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE active = 1 ORDER BY id"),
            quote_from_row,
        )
        .await
    }

    pub async fn get_quote(&self, id: i64) -> Result<Option<Quote>> {
        let quote = self
            .conn
            .call(move |conn| Ok(fetch_quote(conn, id)?))
            .await?;
        Ok(quote)
    }

    pub async fn insert_quote(&self, new: NewQuote) -> Result<Quote> {
        let quote = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO quotes (text, author, source, active) VALUES (?1, ?2, ?3, ?4)",
                    params![new.text, new.author, new.source, new.active.unwrap_or(true)],
                )?;
                Ok(fetch_quote(conn, conn.last_insert_rowid())?)
            })
            .await?;
        quote.ok_or_else(|| AppError::not_found("Quote"))
    }

    pub async fn update_quote(&self, id: i64, update: QuoteUpdate) -> Result<Option<Quote>> {
        let quote = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(mut current) = fetch_quote(&tx, id)? else {
                    return Ok(None);
                };
                current.apply(update);
                tx.execute(
                    "UPDATE quotes SET text = ?1, author = ?2, source = ?3, active = ?4 WHERE id = ?5",
                    params![current.text, current.author, current.source, current.active, id],
                )?;
                tx.commit()?;
                Ok(Some(current))
            })
            .await?;
        Ok(quote)
    }

    pub async fn delete_quote(&self, id: i64) -> Result<bool> {
        self.delete_by_id("quotes", id).await
    }

    // Article operations

    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        self.query_all(
            format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY date DESC, id DESC"),
            article_from_row,
        )
        .await
    }

    /// Look an article up by numeric id or by slug.
    pub async fn get_article(&self, key: &str) -> Result<Option<Article>> {
        let key = key.to_string();
        let article = self
            .conn
            .call(move |conn| {
                let Some(id) = resolve_key(conn, "articles", &key)? else {
                    return Ok(None);
                };
                Ok(fetch_article(conn, id)?)
            })
            .await?;
        Ok(article)
    }

    pub async fn insert_article(&self, new: NewArticle) -> Result<Article> {
        let tags = serde_json::to_string(&new.tags)?;
        let (format, body) = new.content.to_columns()?;
        let article = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    r#"INSERT INTO articles (slug, title, excerpt, date, read_time, tags, featured,
                                             epigraph, content_format, content_body)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9)"#,
                    params![
                        new.slug,
                        new.title,
                        new.excerpt,
                        format_date(new.date),
                        new.read_time,
                        tags,
                        new.epigraph,
                        format,
                        body,
                    ],
                )?;
                let id = tx.last_insert_rowid();
                if new.featured {
                    feature_exclusively(&tx, FeaturedTable::Articles, id)?;
                }
                let created = fetch_article(&tx, id)?;
                tx.commit()?;
                Ok(created)
            })
            .await
            .map_err(|e| unique_violation(e, "An article with this slug already exists"))?;
        article.ok_or_else(|| AppError::not_found("Article"))
    }

    pub async fn update_article(&self, key: &str, update: ArticleUpdate) -> Result<Option<Article>> {
        let key = key.to_string();
        let article = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(id) = resolve_key(&tx, "articles", &key)? else {
                    return Ok(None);
                };
                let Some(mut current) = fetch_article(&tx, id)? else {
                    return Ok(None);
                };
                current.apply(update);
                let tags = to_json(&current.tags)?;
                let (format, body) = current.content.to_columns().map_err(other_error)?;
                tx.execute(
                    r#"UPDATE articles SET slug = ?1, title = ?2, excerpt = ?3, date = ?4,
                              read_time = ?5, tags = ?6, featured = ?7, epigraph = ?8,
                              content_format = ?9, content_body = ?10
                       WHERE id = ?11"#,
                    params![
                        current.slug,
                        current.title,
                        current.excerpt,
                        format_date(current.date),
                        current.read_time,
                        tags,
                        current.featured,
                        current.epigraph,
                        format,
                        body,
                        id,
                    ],
                )?;
                if current.featured {
                    feature_exclusively(&tx, FeaturedTable::Articles, id)?;
                }
                tx.commit()?;
                Ok(Some(current))
            })
            .await
            .map_err(|e| unique_violation(e, "An article with this slug already exists"))?;
        Ok(article)
    }

    pub async fn delete_article(&self, key: &str) -> Result<bool> {
        self.delete_by_key("articles", key).await
    }

    // Project operations

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.query_all(
            format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY year DESC, id DESC"),
            project_from_row,
        )
        .await
    }

    pub async fn get_project(&self, key: &str) -> Result<Option<Project>> {
        let key = key.to_string();
        let project = self
            .conn
            .call(move |conn| {
                let Some(id) = resolve_key(conn, "projects", &key)? else {
                    return Ok(None);
                };
                Ok(fetch_project(conn, id)?)
            })
            .await?;
        Ok(project)
    }

    pub async fn insert_project(&self, new: NewProject) -> Result<Project> {
        let tech = serde_json::to_string(&new.tech)?;
        let links = optional_json(&new.links)?;
        let sections = optional_json(&new.sections)?;
        let gallery = optional_json(&new.gallery)?;
        let project = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    r#"INSERT INTO projects (slug, title, description, tech, year, status, featured,
                                             role, links, philosophy, sections, gallery)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9, ?10, ?11)"#,
                    params![
                        new.slug,
                        new.title,
                        new.description,
                        tech,
                        new.year,
                        new.status.as_str(),
                        new.role,
                        links,
                        new.philosophy,
                        sections,
                        gallery,
                    ],
                )?;
                let id = tx.last_insert_rowid();
                if new.featured {
                    feature_exclusively(&tx, FeaturedTable::Projects, id)?;
                }
                let created = fetch_project(&tx, id)?;
                tx.commit()?;
                Ok(created)
            })
            .await
            .map_err(|e| unique_violation(e, "A project with this slug already exists"))?;
        project.ok_or_else(|| AppError::not_found("Project"))
    }

    pub async fn update_project(&self, key: &str, update: ProjectUpdate) -> Result<Option<Project>> {
        let key = key.to_string();
        let project = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(id) = resolve_key(&tx, "projects", &key)? else {
                    return Ok(None);
                };
                let Some(mut current) = fetch_project(&tx, id)? else {
                    return Ok(None);
                };
                current.apply(update);
                let tech = to_json(&current.tech)?;
                let links = current.links.as_ref().map(to_json).transpose()?;
                let sections = current.sections.as_ref().map(to_json).transpose()?;
                let gallery = current.gallery.as_ref().map(to_json).transpose()?;
                tx.execute(
                    r#"UPDATE projects SET slug = ?1, title = ?2, description = ?3, tech = ?4,
                              year = ?5, status = ?6, featured = ?7, role = ?8, links = ?9,
                              philosophy = ?10, sections = ?11, gallery = ?12
                       WHERE id = ?13"#,
                    params![
                        current.slug,
                        current.title,
                        current.description,
                        tech,
                        current.year,
                        current.status.as_str(),
                        current.featured,
                        current.role,
                        links,
                        current.philosophy,
                        sections,
                        gallery,
                        id,
                    ],
                )?;
                if current.featured {
                    feature_exclusively(&tx, FeaturedTable::Projects, id)?;
                }
                tx.commit()?;
                Ok(Some(current))
            })
            .await
            .map_err(|e| unique_violation(e, "A project with this slug already exists"))?;
        Ok(project)
    }

    pub async fn delete_project(&self, key: &str) -> Result<bool> {
        self.delete_by_key("projects", key).await
    }

    // Shared helpers

    async fn query_all<T, F>(&self, sql: String, map: F) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(&Row) -> rusqlite::Result<T> + Send + 'static,
    {
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], |row| map(row))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(rows)
    }

    async fn reorder(&self, table: &'static str, items: Vec<ReorderItem>) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt =
                        tx.prepare(&format!("UPDATE {table} SET sort_order = ?1 WHERE id = ?2"))?;
                    for item in &items {
                        stmt.execute(params![item.order, item.id])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn delete_by_id(&self, table: &'static str, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let affected = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
                Ok(affected > 0)
            })
            .await?;
        Ok(deleted)
    }

    async fn delete_by_key(&self, table: &'static str, key: &str) -> Result<bool> {
        let key = key.to_string();
        let deleted = self
            .conn
            .call(move |conn| {
                let Some(id) = resolve_key(conn, table, &key)? else {
                    return Ok(false);
                };
                let affected = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
                Ok(affected > 0)
            })
            .await?;
        Ok(deleted)
    }
}

fn row_exists(conn: &rusqlite::Connection, table: &str, id: i64) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1"),
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn feature_exclusively(tx: &Transaction, table: FeaturedTable, id: i64) -> rusqlite::Result<()> {
    let table = table.name();
    tx.execute(
        &format!("UPDATE {table} SET featured = 0 WHERE featured = 1 AND id != ?1"),
        params![id],
    )?;
    tx.execute(&format!("UPDATE {table} SET featured = 1 WHERE id = ?1"), params![id])?;
    Ok(())
}

fn next_sort_order(conn: &rusqlite::Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COALESCE(MAX(sort_order), -1) + 1 FROM {table}"),
        [],
        |row| row.get(0),
    )
}

/// Numeric keys match ids first; anything that misses falls back to the slug.
fn resolve_key(conn: &rusqlite::Connection, table: &str, key: &str) -> rusqlite::Result<Option<i64>> {
    if let Ok(id) = key.parse::<i64>() {
        if row_exists(conn, table, id)? {
            return Ok(Some(id));
        }
    }
    conn.query_row(
        &format!("SELECT id FROM {table} WHERE slug = ?1"),
        params![key],
        |row| row.get(0),
    )
    .optional()
}

fn fetch_contemplation(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Contemplation>> {
    conn.query_row(
        &format!("SELECT {CONTEMPLATION_COLUMNS} FROM contemplations WHERE id = ?1"),
        params![id],
        contemplation_from_row,
    )
    .optional()
}

fn fetch_answer(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Answer>> {
    conn.query_row(
        &format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE id = ?1"),
        params![id],
        answer_from_row,
    )
    .optional()
}

fn fetch_intention(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Intention>> {
    conn.query_row(
        &format!("SELECT {INTENTION_COLUMNS} FROM intentions WHERE id = ?1"),
        params![id],
        intention_from_row,
    )
    .optional()
}

fn fetch_quote(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Quote>> {
    conn.query_row(
        &format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ?1"),
        params![id],
        quote_from_row,
    )
    .optional()
}

fn fetch_article(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Article>> {
    conn.query_row(
        &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
        params![id],
        article_from_row,
    )
    .optional()
}

fn fetch_project(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
        params![id],
        project_from_row,
    )
    .optional()
}

fn unique_violation(err: tokio_rusqlite::Error, message: &str) -> AppError {
    match err {
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(code, _))
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            AppError::validation(message)
        }
        other => other.into(),
    }
}

fn other_error(err: serde_json::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Other(Box::new(err))
}

fn to_json<T: Serialize>(value: &T) -> tokio_rusqlite::Result<String> {
    serde_json::to_string(value).map_err(other_error)
}

fn optional_json<T: Serialize>(value: &Option<T>) -> Result<Option<String>> {
    Ok(value.as_ref().map(serde_json::to_string).transpose()?)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_datetime(&raw).ok_or_else(|| conversion_error(idx, format!("bad timestamp: {raw}")))
}

fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e.to_string()))
}

fn optional_json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| serde_json::from_str(&s).map_err(|e| conversion_error(idx, e.to_string())))
        .transpose()
}

fn parsed_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn contemplation_from_row(row: &Row) -> rusqlite::Result<Contemplation> {
    Ok(Contemplation {
        id: row.get(0)?,
        question: row.get(1)?,
        active: row.get(2)?,
        featured: row.get(3)?,
        order: row.get(4)?,
        votes: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        answers: None,
    })
}

fn answer_from_row(row: &Row) -> rusqlite::Result<Answer> {
    Ok(Answer {
        id: row.get(0)?,
        contemplation_id: row.get(1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        author: row.get(4)?,
        color: parsed_column(row, 5)?,
        position: Position {
            x: row.get(6)?,
            y: row.get(7)?,
        },
        rotation: row.get(8)?,
        approved: row.get(9)?,
        created_at: timestamp_column(row, 10)?,
    })
}

fn intention_from_row(row: &Row) -> rusqlite::Result<Intention> {
    Ok(Intention {
        id: row.get(0)?,
        text: row.get(1)?,
        active: row.get(2)?,
        order: row.get(3)?,
    })
}

fn quote_from_row(row: &Row) -> rusqlite::Result<Quote> {
    Ok(Quote {
        id: row.get(0)?,
        text: row.get(1)?,
        author: row.get(2)?,
        source: row.get(3)?,
        active: row.get(4)?,
    })
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    let date: String = row.get(4)?;
    let format: String = row.get(9)?;
    let body: String = row.get(10)?;
    Ok(Article {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        excerpt: row.get(3)?,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| conversion_error(4, e.to_string()))?,
        read_time: row.get(5)?,
        tags: json_column(row, 6)?,
        featured: row.get(7)?,
        epigraph: row.get(8)?,
        content: ArticleContent::from_columns(&format, body)
            .map_err(|e| conversion_error(10, e.to_string()))?,
    })
}

fn project_from_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        tech: json_column(row, 4)?,
        year: row.get(5)?,
        status: parsed_column(row, 6)?,
        featured: row.get(7)?,
        role: row.get(8)?,
        links: optional_json_column(row, 9)?,
        philosophy: row.get(10)?,
        sections: optional_json_column(row, 11)?,
        gallery: optional_json_column(row, 12)?,
    })
}
