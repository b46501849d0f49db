use std::collections::HashMap;

use anyhow::{Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row, TransactionBehavior, params, params_from_iter};
use showcase_types::models::{Author, Comment, Polarity, Project, User, VoteCounts};
use uuid::Uuid;

use crate::Database;
use crate::models::{NewProject, ProfileUpdate, ProjectFilter, ProjectWithOwner, VoteWrite};

const USER_COLUMNS: &str = "id, email, name, image, bio, location, created_at";

const PROJECT_SELECT: &str =
    "SELECT p.id, p.owner_id, p.title, p.description, p.image_url, p.category, p.private, p.created_at,
            u.name, u.image
     FROM projects p
     JOIN users u ON u.id = p.owner_id";

const COMMENT_SELECT: &str =
    "SELECT c.id, c.project_id, c.content, c.created_at, c.updated_at, c.user_id, u.name, u.image
     FROM comments c
     JOIN users u ON u.id = c.user_id";

impl Database {
    // -- Users --

    /// Returns the user with `email`, creating it on first sight.
    /// Display fields of an existing user are left untouched.
    pub fn ensure_user(&self, email: &str, name: Option<&str>, image: Option<&str>) -> Result<User> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, name, image, created_at) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(email) DO NOTHING",
                params![Uuid::new_v4().to_string(), email, name, image, now()],
            )?;
            query_user_by_email(conn, email)?.ok_or_else(|| anyhow!("User missing after insert: {}", email))
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    bio = COALESCE(?3, bio),
                    location = COALESCE(?4, location),
                    image = COALESCE(?5, image)
                 WHERE id = ?1",
                params![id.to_string(), update.name, update.bio, update.location, update.image],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user_by_id(conn, id)
        })
    }

    // -- Projects --

    pub fn insert_project(&self, new: &NewProject) -> Result<ProjectWithOwner> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (id, owner_id, title, description, image_url, category, private, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id.to_string(),
                    new.owner_id.to_string(),
                    new.title,
                    new.description,
                    new.image_url,
                    new.category,
                    new.private,
                    now(),
                ],
            )?;
            query_project(conn, id)?.ok_or_else(|| anyhow!("Project missing after insert: {}", id))
        })
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<ProjectWithOwner>> {
        self.with_conn(|conn| query_project(conn, id))
    }

    /// Newest first.
    pub fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<ProjectWithOwner>> {
        self.with_conn(|conn| query_projects(conn, filter))
    }

    /// Returns false if the project does not exist.
    pub fn set_project_private(&self, id: Uuid, private: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE projects SET private = ?2 WHERE id = ?1",
                params![id.to_string(), private],
            )?;
            Ok(changed > 0)
        })
    }

    /// Votes and comments go with it (ON DELETE CASCADE).
    pub fn delete_project(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM projects WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }

    // -- Votes --

    /// Records `polarity` as the user's vote on the project.
    ///
    /// The read of the current vote and the upsert share one IMMEDIATE
    /// transaction, and the upsert replaces an opposite vote in place, so the
    /// (user, project) pair never holds zero or two rows mid-switch.
    pub fn cast_vote(&self, user_id: Uuid, project_id: Uuid, polarity: Polarity) -> Result<VoteWrite> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current = tx
                .query_row(
                    "SELECT polarity FROM votes WHERE user_id = ?1 AND project_id = ?2",
                    params![user_id.to_string(), project_id.to_string()],
                    |row| polarity_at(row, 0),
                )
                .optional()?;

            let outcome = match current {
                Some(existing) if existing == polarity => return Ok(VoteWrite::Unchanged),
                Some(_) => VoteWrite::Switched,
                None => VoteWrite::Inserted,
            };

            tx.execute(
                "INSERT INTO votes (id, user_id, project_id, polarity, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id, project_id) DO UPDATE SET
                    polarity = excluded.polarity,
                    created_at = excluded.created_at",
                params![
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    project_id.to_string(),
                    polarity.as_str(),
                    now(),
                ],
            )?;
            tx.commit()?;

            Ok(outcome)
        })
    }

    /// Removes the user's vote only if it has `polarity`. Returns whether a row was removed.
    pub fn retract_vote(&self, user_id: Uuid, project_id: Uuid, polarity: Polarity) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM votes WHERE user_id = ?1 AND project_id = ?2 AND polarity = ?3",
                params![user_id.to_string(), project_id.to_string(), polarity.as_str()],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn vote_counts(&self, project_id: Uuid) -> Result<VoteCounts> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(polarity = 'like'), 0), COALESCE(SUM(polarity = 'dislike'), 0)
                 FROM votes WHERE project_id = ?1",
                [project_id.to_string()],
                |row| {
                    Ok(VoteCounts {
                        likes: row.get::<_, i64>(0)? as u64,
                        dislikes: row.get::<_, i64>(1)? as u64,
                    })
                },
            )
            .map_err(Into::into)
        })
    }

    pub fn user_polarity(&self, user_id: Uuid, project_id: Uuid) -> Result<Option<Polarity>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT polarity FROM votes WHERE user_id = ?1 AND project_id = ?2",
                params![user_id.to_string(), project_id.to_string()],
                |row| polarity_at(row, 0),
            )
            .optional()
        })
    }

    /// Batch vote counts for a page of projects. Projects without votes are absent.
    pub fn vote_counts_for(&self, project_ids: &[Uuid]) -> Result<HashMap<Uuid, VoteCounts>> {
        if project_ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT project_id,
                        COALESCE(SUM(polarity = 'like'), 0),
                        COALESCE(SUM(polarity = 'dislike'), 0)
                 FROM votes WHERE project_id IN ({})
                 GROUP BY project_id",
                placeholders(1, project_ids.len())
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(id_values(project_ids)), |row| {
                    Ok((
                        uuid_at(row, 0)?,
                        VoteCounts {
                            likes: row.get::<_, i64>(1)? as u64,
                            dislikes: row.get::<_, i64>(2)? as u64,
                        },
                    ))
                })?
                .collect::<std::result::Result<HashMap<_, _>, _>>()?;

            Ok(rows)
        })
    }

    /// The user's polarity on each of `project_ids` they have voted on.
    pub fn user_polarities_for(&self, user_id: Uuid, project_ids: &[Uuid]) -> Result<HashMap<Uuid, Polarity>> {
        if project_ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT project_id, polarity FROM votes WHERE user_id = ?1 AND project_id IN ({})",
                placeholders(2, project_ids.len())
            );

            let mut values = vec![Value::Text(user_id.to_string())];
            values.extend(id_values(project_ids));

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values), |row| Ok((uuid_at(row, 0)?, polarity_at(row, 1)?)))?
                .collect::<std::result::Result<HashMap<_, _>, _>>()?;

            Ok(rows)
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, project_id: Uuid, user_id: Uuid, content: &str) -> Result<Comment> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            let ts = now();
            conn.execute(
                "INSERT INTO comments (id, project_id, user_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id.to_string(), project_id.to_string(), user_id.to_string(), content, ts],
            )?;
            query_comment(conn, id)?.ok_or_else(|| anyhow!("Comment missing after insert: {}", id))
        })
    }

    pub fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        self.with_conn(|conn| query_comment(conn, id))
    }

    /// Newest first, with the author snapshot joined at read time.
    pub fn list_comments(&self, project_id: Uuid) -> Result<Vec<Comment>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{COMMENT_SELECT} WHERE c.project_id = ?1 ORDER BY c.created_at DESC, c.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([project_id.to_string()], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_comment(&self, id: Uuid, content: &str) -> Result<Option<Comment>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE comments SET content = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.to_string(), content, now()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_comment(conn, id)
        })
    }

    pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM comments WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }

    pub fn comment_count(&self, project_id: Uuid) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE project_id = ?1",
                [project_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    /// Batch comment counts for a page of projects. Projects without comments are absent.
    pub fn comment_counts_for(&self, project_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>> {
        if project_ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT project_id, COUNT(*) FROM comments WHERE project_id IN ({}) GROUP BY project_id",
                placeholders(1, project_ids.len())
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(id_values(project_ids)), |row| {
                    Ok((uuid_at(row, 0)?, row.get::<_, i64>(1)? as u64))
                })?
                .collect::<std::result::Result<HashMap<_, _>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    conn.query_row(&sql, [email], user_from_row).optional()
}

fn query_user_by_id(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, [id.to_string()], user_from_row).optional()
}

fn query_project(conn: &Connection, id: Uuid) -> Result<Option<ProjectWithOwner>> {
    let sql = format!("{PROJECT_SELECT} WHERE p.id = ?1");
    conn.query_row(&sql, [id.to_string()], project_from_row).optional()
}

fn query_projects(conn: &Connection, filter: &ProjectFilter) -> Result<Vec<ProjectWithOwner>> {
    let mut sql = format!("{PROJECT_SELECT} WHERE 1 = 1");
    let mut values: Vec<Value> = Vec::new();

    if let Some(owner_id) = filter.owner_id {
        values.push(Value::Text(owner_id.to_string()));
        sql.push_str(&format!(" AND p.owner_id = ?{}", values.len()));
    }
    if filter.public_only {
        sql.push_str(" AND p.private = 0");
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        values.push(Value::Text(format!("%{}%", escape_like(&search.to_lowercase()))));
        let n = values.len();
        sql.push_str(&format!(
            " AND (unicode_lower(p.title) LIKE ?{n} ESCAPE '\\' \
               OR unicode_lower(p.description) LIKE ?{n} ESCAPE '\\')"
        ));
    }
    if let Some(category) = &filter.category {
        values.push(Value::Text(category.clone()));
        sql.push_str(&format!(" AND p.category = ?{}", values.len()));
    }

    sql.push_str(" ORDER BY p.created_at DESC, p.rowid DESC");

    if let Some(limit) = filter.limit {
        values.push(Value::Integer(i64::from(limit)));
        sql.push_str(&format!(" LIMIT ?{}", values.len()));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), project_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_comment(conn: &Connection, id: Uuid) -> Result<Option<Comment>> {
    let sql = format!("{COMMENT_SELECT} WHERE c.id = ?1");
    conn.query_row(&sql, [id.to_string()], comment_from_row).optional()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        image: row.get(3)?,
        bio: row.get(4)?,
        location: row.get(5)?,
        created_at: timestamp_at(row, 6)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectWithOwner> {
    let owner_id = uuid_at(row, 1)?;
    Ok(ProjectWithOwner {
        project: Project {
            id: uuid_at(row, 0)?,
            owner_id,
            title: row.get(2)?,
            description: row.get(3)?,
            image_url: row.get(4)?,
            category: row.get(5)?,
            private: row.get(6)?,
            created_at: timestamp_at(row, 7)?,
        },
        owner: Author {
            id: owner_id,
            name: row.get(8)?,
            image: row.get(9)?,
        },
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: uuid_at(row, 0)?,
        project_id: uuid_at(row, 1)?,
        content: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
        updated_at: timestamp_at(row, 4)?,
        author: Author {
            id: uuid_at(row, 5)?,
            name: row.get(6)?,
            image: row.get(7)?,
        },
    })
}

/// RFC 3339 with milliseconds; fixed width, so it sorts lexicographically.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn polarity_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Polarity> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// `?start, ?start+1, ...` for an IN clause of `count` values.
fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn id_values(ids: &[Uuid]) -> impl Iterator<Item = Value> + '_ {
    ids.iter().map(|id| Value::Text(id.to_string()))
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;

    fn seed_user(db: &Database, email: &str) -> User {
        db.ensure_user(email, Some(email.split('@').next().unwrap_or(email)), None).unwrap()
    }

    fn seed_project(db: &Database, owner: Uuid, title: &str, category: &str, private: bool) -> Project {
        db.insert_project(&NewProject {
            owner_id: owner,
            title: title.into(),
            description: format!("{} description", title),
            image_url: "https://img.example/p.png".into(),
            category: category.into(),
            private,
        })
        .unwrap()
        .project
    }

    fn vote_rows(db: &Database, user: Uuid, project: Uuid) -> i64 {
        db.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM votes WHERE user_id = ?1 AND project_id = ?2",
                params![user.to_string(), project.to_string()],
                |row| row.get(0),
            )
            .map_err(Into::into)
        })
        .unwrap()
    }

    #[test]
    fn ensure_user_is_idempotent_on_email() {
        let db = Database::open_in_memory().unwrap();
        let first = db.ensure_user("ada@example.com", Some("Ada"), None).unwrap();
        let again = db.ensure_user("ada@example.com", Some("Someone Else"), None).unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(again.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn update_profile_keeps_unset_fields() {
        let db = Database::open_in_memory().unwrap();
        let user = db.ensure_user("ada@example.com", Some("Ada"), Some("a.png")).unwrap();
        let updated = db
            .update_profile(
                user.id,
                &ProfileUpdate {
                    bio: Some("Builds engines".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Ada"));
        assert_eq!(updated.image.as_deref(), Some("a.png"));
        assert_eq!(updated.bio.as_deref(), Some("Builds engines"));
        assert!(db.update_profile(Uuid::new_v4(), &ProfileUpdate::default()).unwrap().is_none());
    }

    #[test]
    fn cast_vote_reports_insert_switch_and_unchanged() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db, "owner@example.com");
        let voter = seed_user(&db, "voter@example.com");
        let project = seed_project(&db, owner.id, "Maze", "Game", false);

        assert_eq!(db.cast_vote(voter.id, project.id, Polarity::Like).unwrap(), VoteWrite::Inserted);
        assert_eq!(db.cast_vote(voter.id, project.id, Polarity::Like).unwrap(), VoteWrite::Unchanged);
        assert_eq!(db.cast_vote(voter.id, project.id, Polarity::Dislike).unwrap(), VoteWrite::Switched);

        assert_eq!(vote_rows(&db, voter.id, project.id), 1);
        assert_eq!(db.user_polarity(voter.id, project.id).unwrap(), Some(Polarity::Dislike));
        assert_eq!(db.vote_counts(project.id).unwrap(), VoteCounts { likes: 0, dislikes: 1 });
    }

    #[test]
    fn racing_switches_leave_one_row() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let owner = seed_user(&db, "owner@example.com");
        let voter = seed_user(&db, "voter@example.com");
        let project = seed_project(&db, owner.id, "Maze", "Game", false);
        let (voter_id, project_id) = (voter.id, project.id);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for i in 0..25 {
                        let polarity = if (t + i) % 2 == 0 { Polarity::Like } else { Polarity::Dislike };
                        db.cast_vote(voter_id, project_id, polarity).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(vote_rows(&db, voter.id, project.id), 1);
        let counts = db.vote_counts(project.id).unwrap();
        assert_eq!(counts.likes + counts.dislikes, 1);
        let polarity = db.user_polarity(voter.id, project.id).unwrap();
        let expected = if counts.likes == 1 { Polarity::Like } else { Polarity::Dislike };
        assert_eq!(polarity, Some(expected));
    }

    #[test]
    fn racing_first_votes_insert_once() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let owner = seed_user(&db, "owner@example.com");
        let project_id = seed_project(&db, owner.id, "Maze", "Game", false).id;

        for round in 0..10 {
            let voter_id = seed_user(&db, &format!("voter{}@example.com", round)).id;
            let barrier = Arc::new(Barrier::new(2));
            let polarities = [Polarity::Like, if round % 2 == 0 { Polarity::Like } else { Polarity::Dislike }];

            let handles: Vec<_> = polarities
                .into_iter()
                .map(|polarity| {
                    let db = Arc::clone(&db);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        db.cast_vote(voter_id, project_id, polarity).unwrap()
                    })
                })
                .collect();
            let outcomes: Vec<VoteWrite> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            let inserted = outcomes.iter().filter(|o| **o == VoteWrite::Inserted).count();
            assert_eq!(inserted, 1, "round {}: {:?}", round, outcomes);
            assert!(
                outcomes
                    .iter()
                    .any(|o| matches!(o, VoteWrite::Unchanged | VoteWrite::Switched)),
                "round {}: {:?}",
                round,
                outcomes
            );
            assert_eq!(vote_rows(&db, voter_id, project_id), 1);
        }
    }

    #[test]
    fn store_rejects_second_row_for_same_pair() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db, "owner@example.com");
        let project = seed_project(&db, owner.id, "Maze", "Game", false);
        db.cast_vote(owner.id, project.id, Polarity::Like).unwrap();

        let raw_insert = db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO votes (id, user_id, project_id, polarity, created_at) VALUES (?1, ?2, ?3, 'dislike', ?4)",
                params![Uuid::new_v4().to_string(), owner.id.to_string(), project.id.to_string(), now()],
            )?;
            Ok(())
        });
        assert!(raw_insert.is_err());
        assert_eq!(vote_rows(&db, owner.id, project.id), 1);
    }

    #[test]
    fn store_rejects_unknown_polarity() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db, "owner@example.com");
        let project = seed_project(&db, owner.id, "Maze", "Game", false);

        let raw_insert = db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO votes (id, user_id, project_id, polarity, created_at) VALUES (?1, ?2, ?3, 'meh', ?4)",
                params![Uuid::new_v4().to_string(), owner.id.to_string(), project.id.to_string(), now()],
            )?;
            Ok(())
        });
        assert!(raw_insert.is_err());
    }

    #[test]
    fn retract_vote_only_removes_matching_polarity() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db, "owner@example.com");
        let project = seed_project(&db, owner.id, "Maze", "Game", false);
        db.cast_vote(owner.id, project.id, Polarity::Like).unwrap();

        assert!(!db.retract_vote(owner.id, project.id, Polarity::Dislike).unwrap());
        assert_eq!(db.user_polarity(owner.id, project.id).unwrap(), Some(Polarity::Like));
        assert!(db.retract_vote(owner.id, project.id, Polarity::Like).unwrap());
        assert_eq!(db.user_polarity(owner.id, project.id).unwrap(), None);
    }

    #[test]
    fn batch_counts_group_by_project() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "a@example.com");
        let b = seed_user(&db, "b@example.com");
        let p1 = seed_project(&db, a.id, "One", "Game", false);
        let p2 = seed_project(&db, a.id, "Two", "Art", false);
        let p3 = seed_project(&db, a.id, "Three", "Art", false);

        db.cast_vote(a.id, p1.id, Polarity::Like).unwrap();
        db.cast_vote(b.id, p1.id, Polarity::Dislike).unwrap();
        db.cast_vote(b.id, p2.id, Polarity::Like).unwrap();
        db.insert_comment(p2.id, a.id, "nice").unwrap();

        let ids = [p1.id, p2.id, p3.id];
        let votes = db.vote_counts_for(&ids).unwrap();
        assert_eq!(votes[&p1.id], VoteCounts { likes: 1, dislikes: 1 });
        assert_eq!(votes[&p2.id], VoteCounts { likes: 1, dislikes: 0 });
        assert!(!votes.contains_key(&p3.id));

        let comments = db.comment_counts_for(&ids).unwrap();
        assert_eq!(comments.get(&p2.id), Some(&1));
        assert_eq!(comments.get(&p1.id), None);

        let mine = db.user_polarities_for(b.id, &ids).unwrap();
        assert_eq!(mine.get(&p1.id), Some(&Polarity::Dislike));
        assert_eq!(mine.get(&p2.id), Some(&Polarity::Like));
        assert_eq!(mine.get(&p3.id), None);
    }

    #[test]
    fn list_projects_filters_and_orders_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "a@example.com");
        let b = seed_user(&db, "b@example.com");
        let maze = seed_project(&db, a.id, "Maze Runner", "Game", false);
        let _secret = seed_project(&db, a.id, "Secret Maze", "Game", true);
        let art = seed_project(&db, b.id, "Pixel art", "Art", false);

        let public = db
            .list_projects(&ProjectFilter { public_only: true, ..Default::default() })
            .unwrap();
        let ids: Vec<Uuid> = public.iter().map(|p| p.project.id).collect();
        assert_eq!(ids, vec![art.id, maze.id]);

        let search = db
            .list_projects(&ProjectFilter {
                public_only: true,
                search: Some("MAZE".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].project.id, maze.id);
        assert_eq!(search[0].owner.name.as_deref(), Some("a"));

        let mine = db
            .list_projects(&ProjectFilter {
                owner_id: Some(a.id),
                category: Some("Game".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(mine.len(), 2);

        let limited = db
            .list_projects(&ProjectFilter { limit: Some(1), ..Default::default() })
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn non_rfc3339_timestamp_is_a_conversion_error() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "a@example.com");
        let project = seed_project(&db, a.id, "Maze", "Game", false);
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE projects SET created_at = '2024-01-01 00:00:00' WHERE id = ?1",
                [project.id.to_string()],
            )?;
            Ok(())
        })
        .unwrap();

        assert!(db.get_project(project.id).is_err());
    }

    #[test]
    fn search_folds_case_beyond_ascii() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "a@example.com");
        let ete = seed_project(&db, a.id, "Été Projekt", "Game", false);
        seed_project(&db, a.id, "Winter", "Game", false);

        for term in ["été", "ÉTÉ", "projekt"] {
            let found = db
                .list_projects(&ProjectFilter { search: Some(term.into()), ..Default::default() })
                .unwrap();
            assert_eq!(found.len(), 1, "search {:?}", term);
            assert_eq!(found[0].project.id, ete.id);
        }
    }

    #[test]
    fn search_treats_like_wildcards_literally() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "a@example.com");
        seed_project(&db, a.id, "Plain", "Game", false);
        let pct = seed_project(&db, a.id, "100% fun", "Game", false);

        let found = db
            .list_projects(&ProjectFilter { search: Some("%".into()), ..Default::default() })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].project.id, pct.id);
    }

    #[test]
    fn comments_list_newest_first_with_author_snapshot() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "a@example.com");
        let project = seed_project(&db, a.id, "Maze", "Game", false);

        let first = db.insert_comment(project.id, a.id, "first").unwrap();
        let second = db.insert_comment(project.id, a.id, "second").unwrap();

        let listed = db.list_comments(project.id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert_eq!(listed[0].author.id, a.id);
        assert_eq!(listed[0].author.name.as_deref(), Some("a"));

        db.update_profile(a.id, &ProfileUpdate { name: Some("Ada".into()), ..Default::default() })
            .unwrap();
        assert_eq!(db.list_comments(project.id).unwrap()[0].author.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn deleting_project_cascades_votes_and_comments() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "a@example.com");
        let project = seed_project(&db, a.id, "Maze", "Game", false);
        db.cast_vote(a.id, project.id, Polarity::Like).unwrap();
        let comment = db.insert_comment(project.id, a.id, "hi").unwrap();

        assert!(db.delete_project(project.id).unwrap());
        assert!(!db.delete_project(project.id).unwrap());
        assert_eq!(vote_rows(&db, a.id, project.id), 0);
        assert!(db.get_comment(comment.id).unwrap().is_none());
    }

    #[test]
    fn migrations_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("showcase.db");

        let user_id = {
            let db = Database::open(&path).unwrap();
            seed_user(&db, "a@example.com").id
        };

        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_user(user_id).unwrap().unwrap().email, "a@example.com");
        let versions: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
                    .map_err(Into::into)
            })
            .unwrap();
        assert_eq!(versions, 1);
    }
}
