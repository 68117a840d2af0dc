use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Role::parse(value.as_str()?).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for ItemKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ItemKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        ItemKind::parse(s).ok_or_else(|| {
            FromSqlError::Other(Box::new(Error::BadRequest(format!(
                "unknown item kind '{s}'"
            ))))
        })
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn parse_optional_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.as_deref().map(parse_datetime)
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Maps unique-constraint failures to `AlreadyExists`.
fn unique_violation(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Error::AlreadyExists
        }
        e => Error::from(e),
    }
}

const USER_COLUMNS: &str = "id, email, display_name, role, created_at, updated_at";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        role: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at";

fn row_to_token(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        user_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        expires_at: parse_optional_datetime(row.get(5)?),
        last_used_at: parse_optional_datetime(row.get(6)?),
    })
}

const SECTION_COLUMNS: &str =
    "id, title, slug, description, position, published, created_at, updated_at";

fn row_to_section(row: &Row<'_>) -> rusqlite::Result<Section> {
    Ok(Section {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        position: row.get(4)?,
        published: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const GRIMOIRE_COLUMNS: &str = "id, section_id, title, slug, excerpt, content, required_role, \
     is_paid, price_cents, unlock_order, published, word_count, reading_minutes, created_at, updated_at";

fn row_to_grimoire(row: &Row<'_>) -> rusqlite::Result<Grimoire> {
    Ok(Grimoire {
        id: row.get(0)?,
        section_id: row.get(1)?,
        title: row.get(2)?,
        slug: row.get(3)?,
        excerpt: row.get(4)?,
        content: row.get(5)?,
        required_role: row.get(6)?,
        is_paid: row.get(7)?,
        price_cents: row.get(8)?,
        unlock_order: row.get(9)?,
        published: row.get(10)?,
        word_count: row.get(11)?,
        reading_minutes: row.get(12)?,
        created_at: parse_datetime(&row.get::<_, String>(13)?),
        updated_at: parse_datetime(&row.get::<_, String>(14)?),
    })
}

const COURSE_COLUMNS: &str = "id, title, slug, description, required_role, is_paid, price_cents, \
     position, published, created_at, updated_at";

fn row_to_course(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        required_role: row.get(4)?,
        is_paid: row.get(5)?,
        price_cents: row.get(6)?,
        position: row.get(7)?,
        published: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
        updated_at: parse_datetime(&row.get::<_, String>(10)?),
    })
}

const MODULE_COLUMNS: &str = "id, course_id, title, content, unlock_order, published, word_count, \
     reading_minutes, created_at, updated_at";

fn row_to_module(row: &Row<'_>) -> rusqlite::Result<CourseModule> {
    Ok(CourseModule {
        id: row.get(0)?,
        course_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        unlock_order: row.get(4)?,
        published: row.get(5)?,
        word_count: row.get(6)?,
        reading_minutes: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

const PROGRESS_COLUMNS: &str = "user_id, item_id, item_kind, percentage, completed_at, updated_at";

fn row_to_progress(row: &Row<'_>) -> rusqlite::Result<Progress> {
    Ok(Progress {
        user_id: row.get(0)?,
        item_id: row.get(1)?,
        item_kind: row.get(2)?,
        percentage: row.get(3)?,
        completed_at: parse_optional_datetime(row.get(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn row_to_purchase(row: &Row<'_>) -> rusqlite::Result<Purchase> {
    Ok(Purchase {
        user_id: row.get(0)?,
        item_id: row.get(1)?,
        item_kind: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, email, display_name, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id,
                    user.email,
                    user.display_name,
                    user.role,
                    format_datetime(&user.created_at),
                    format_datetime(&user.updated_at),
                ],
            )
            .map_err(unique_violation)?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], row_to_user)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET display_name = ?1, role = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                user.display_name,
                user.role,
                format_datetime(&user.updated_at),
                user.id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn has_admin_user(&self) -> Result<bool> {
        let count: i32 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![Role::ADMIN],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(Error::TokenLookupCollision)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>> {
        self.conn()
            .query_row(
                &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = ?1"),
                params![id],
                row_to_token,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        self.conn()
            .query_row(
                &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
                params![lookup],
                row_to_token,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_user_tokens(&self, user_id: &str) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE user_id = ?1 ORDER BY created_at"
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_token)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Section operations

    fn create_section(&self, section: &Section) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO sections (id, title, slug, description, position, published, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    section.id,
                    section.title,
                    section.slug,
                    section.description,
                    section.position,
                    section.published,
                    format_datetime(&section.created_at),
                    format_datetime(&section.updated_at),
                ],
            )
            .map_err(unique_violation)?;
        Ok(())
    }

    fn get_section(&self, id: &str) -> Result<Option<Section>> {
        self.conn()
            .query_row(
                &format!("SELECT {SECTION_COLUMNS} FROM sections WHERE id = ?1"),
                params![id],
                row_to_section,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_section_by_slug(&self, slug: &str) -> Result<Option<Section>> {
        self.conn()
            .query_row(
                &format!("SELECT {SECTION_COLUMNS} FROM sections WHERE slug = ?1"),
                params![slug],
                row_to_section,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_sections(&self, published_only: bool) -> Result<Vec<Section>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections
             WHERE (?1 = 0 OR published = 1)
             ORDER BY position, title"
        ))?;

        let rows = stmt.query_map(params![published_only], row_to_section)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_section(&self, section: &Section) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE sections SET title = ?1, slug = ?2, description = ?3, position = ?4,
                    published = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    section.title,
                    section.slug,
                    section.description,
                    section.position,
                    section.published,
                    format_datetime(&section.updated_at),
                    section.id,
                ],
            )
            .map_err(unique_violation)?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_section(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM progress WHERE item_id IN (SELECT id FROM grimoires WHERE section_id = ?1)",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM purchases WHERE item_id IN (SELECT id FROM grimoires WHERE section_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM grimoires WHERE section_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM sections WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Grimoire operations

    fn create_grimoire(&self, g: &Grimoire) -> Result<()> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO grimoires ({GRIMOIRE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
                ),
                params![
                    g.id,
                    g.section_id,
                    g.title,
                    g.slug,
                    g.excerpt,
                    g.content,
                    g.required_role,
                    g.is_paid,
                    g.price_cents,
                    g.unlock_order,
                    g.published,
                    g.word_count,
                    g.reading_minutes,
                    format_datetime(&g.created_at),
                    format_datetime(&g.updated_at),
                ],
            )
            .map_err(unique_violation)?;
        Ok(())
    }

    fn get_grimoire(&self, id: &str) -> Result<Option<Grimoire>> {
        self.conn()
            .query_row(
                &format!("SELECT {GRIMOIRE_COLUMNS} FROM grimoires WHERE id = ?1"),
                params![id],
                row_to_grimoire,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_grimoire_by_slug(&self, slug: &str) -> Result<Option<Grimoire>> {
        self.conn()
            .query_row(
                &format!("SELECT {GRIMOIRE_COLUMNS} FROM grimoires WHERE slug = ?1"),
                params![slug],
                row_to_grimoire,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_grimoires(
        &self,
        section_id: Option<&str>,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Grimoire>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GRIMOIRE_COLUMNS} FROM grimoires
             WHERE (?1 IS NULL OR section_id = ?1) AND id > ?2
             ORDER BY id LIMIT ?3"
        ))?;

        let rows = stmt.query_map(params![section_id, cursor, limit], row_to_grimoire)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_section_grimoires(
        &self,
        section_id: &str,
        published_only: bool,
    ) -> Result<Vec<Grimoire>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GRIMOIRE_COLUMNS} FROM grimoires
             WHERE section_id = ?1 AND (?2 = 0 OR published = 1)
             ORDER BY unlock_order, id"
        ))?;

        let rows = stmt.query_map(params![section_id, published_only], row_to_grimoire)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_grimoire(&self, g: &Grimoire) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE grimoires SET section_id = ?1, title = ?2, slug = ?3, excerpt = ?4,
                    content = ?5, required_role = ?6, is_paid = ?7, price_cents = ?8,
                    unlock_order = ?9, published = ?10, word_count = ?11, reading_minutes = ?12,
                    updated_at = ?13
                 WHERE id = ?14",
                params![
                    g.section_id,
                    g.title,
                    g.slug,
                    g.excerpt,
                    g.content,
                    g.required_role,
                    g.is_paid,
                    g.price_cents,
                    g.unlock_order,
                    g.published,
                    g.word_count,
                    g.reading_minutes,
                    format_datetime(&g.updated_at),
                    g.id,
                ],
            )
            .map_err(unique_violation)?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_grimoire(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM progress WHERE item_id = ?1", params![id])?;
        tx.execute("DELETE FROM purchases WHERE item_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM grimoires WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Course operations

    fn create_course(&self, c: &Course) -> Result<()> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO courses ({COURSE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    c.id,
                    c.title,
                    c.slug,
                    c.description,
                    c.required_role,
                    c.is_paid,
                    c.price_cents,
                    c.position,
                    c.published,
                    format_datetime(&c.created_at),
                    format_datetime(&c.updated_at),
                ],
            )
            .map_err(unique_violation)?;
        Ok(())
    }

    fn get_course(&self, id: &str) -> Result<Option<Course>> {
        self.conn()
            .query_row(
                &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"),
                params![id],
                row_to_course,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_course_by_slug(&self, slug: &str) -> Result<Option<Course>> {
        self.conn()
            .query_row(
                &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE slug = ?1"),
                params![slug],
                row_to_course,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_courses(&self, published_only: bool) -> Result<Vec<Course>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             WHERE (?1 = 0 OR published = 1)
             ORDER BY position, title"
        ))?;

        let rows = stmt.query_map(params![published_only], row_to_course)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_course(&self, c: &Course) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE courses SET title = ?1, slug = ?2, description = ?3, required_role = ?4,
                    is_paid = ?5, price_cents = ?6, position = ?7, published = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    c.title,
                    c.slug,
                    c.description,
                    c.required_role,
                    c.is_paid,
                    c.price_cents,
                    c.position,
                    c.published,
                    format_datetime(&c.updated_at),
                    c.id,
                ],
            )
            .map_err(unique_violation)?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_course(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM progress WHERE item_id IN (SELECT id FROM course_modules WHERE course_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM purchases WHERE item_id = ?1", params![id])?;
        tx.execute("DELETE FROM course_modules WHERE course_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM courses WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Course module operations

    fn create_module(&self, m: &CourseModule) -> Result<()> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO course_modules ({MODULE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                params![
                    m.id,
                    m.course_id,
                    m.title,
                    m.content,
                    m.unlock_order,
                    m.published,
                    m.word_count,
                    m.reading_minutes,
                    format_datetime(&m.created_at),
                    format_datetime(&m.updated_at),
                ],
            )
            .map_err(unique_violation)?;
        Ok(())
    }

    fn get_module(&self, id: &str) -> Result<Option<CourseModule>> {
        self.conn()
            .query_row(
                &format!("SELECT {MODULE_COLUMNS} FROM course_modules WHERE id = ?1"),
                params![id],
                row_to_module,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_course_modules(
        &self,
        course_id: &str,
        published_only: bool,
    ) -> Result<Vec<CourseModule>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MODULE_COLUMNS} FROM course_modules
             WHERE course_id = ?1 AND (?2 = 0 OR published = 1)
             ORDER BY unlock_order, id"
        ))?;

        let rows = stmt.query_map(params![course_id, published_only], row_to_module)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_module(&self, m: &CourseModule) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE course_modules SET title = ?1, content = ?2, unlock_order = ?3, published = ?4,
                word_count = ?5, reading_minutes = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                m.title,
                m.content,
                m.unlock_order,
                m.published,
                m.word_count,
                m.reading_minutes,
                format_datetime(&m.updated_at),
                m.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_module(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM progress WHERE item_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM course_modules WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Progress operations

    fn record_progress(&self, p: &Progress) -> Result<Progress> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO progress (user_id, item_id, item_kind, percentage, completed_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (user_id, item_id) DO UPDATE SET
                percentage = MAX(progress.percentage, excluded.percentage),
                completed_at = COALESCE(progress.completed_at, excluded.completed_at),
                updated_at = excluded.updated_at",
            params![
                p.user_id,
                p.item_id,
                p.item_kind,
                p.percentage,
                p.completed_at.as_ref().map(format_datetime),
                format_datetime(&p.updated_at),
            ],
        )?;

        let stored = tx.query_row(
            &format!("SELECT {PROGRESS_COLUMNS} FROM progress WHERE user_id = ?1 AND item_id = ?2"),
            params![p.user_id, p.item_id],
            row_to_progress,
        )?;

        tx.commit()?;
        Ok(stored)
    }

    fn list_user_progress(&self, user_id: &str) -> Result<Vec<Progress>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE user_id = ?1 ORDER BY updated_at DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_progress)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Purchase operations

    fn create_purchase(&self, p: &Purchase) -> Result<()> {
        self.conn().execute(
            "INSERT INTO purchases (user_id, item_id, item_kind, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, item_id) DO NOTHING",
            params![
                p.user_id,
                p.item_id,
                p.item_kind,
                format_datetime(&p.created_at)
            ],
        )?;
        Ok(())
    }

    fn list_user_purchases(&self, user_id: &str) -> Result<Vec<Purchase>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id, item_id, item_kind, created_at
             FROM purchases WHERE user_id = ?1 ORDER BY created_at",
        )?;

        let rows = stmt.query_map(params![user_id], row_to_purchase)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_purchase(&self, user_id: &str, item_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM purchases WHERE user_id = ?1 AND item_id = ?2",
            params![user_id, item_id],
        )?;
        Ok(rows > 0)
    }
}
