//! Job store: CRUD operations for the `jobs` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use clipcast_models::{Job, JobId, JobStatus, JobUpdate};

use crate::error::{StoreError, StoreResult};
use crate::Database;

/// Durable store of job lifecycle records.
///
/// Safe under concurrent access from multiple jobs' orchestrators: every
/// operation takes the connection lock, so read-modify-write updates are
/// atomic per call.
#[derive(Clone)]
pub struct JobStore {
    db: Database,
}

impl JobStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a freshly submitted job. Creating an existing id is an error.
    pub fn create(&self, job: &Job) -> StoreResult<Job> {
        self.db.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO jobs (job_id, status, progress, video_id, video_url, error,
                 created_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    job.job_id.as_str(),
                    job.status.as_str(),
                    job.progress,
                    job.video_id,
                    job.video_url,
                    job.error,
                    job.created_at.to_rfc3339(),
                    job.completed_at.map(|t| t.to_rfc3339()),
                ],
            );

            match result {
                Ok(_) => Ok(job.clone()),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::AlreadyExists(job.job_id.to_string()))
                }
                Err(e) => Err(StoreError::Sqlite(e)),
            }
        })
    }

    /// Merge the supplied fields into the stored job, preserving the rest.
    ///
    /// Stamps `completed_at` exactly when the row enters a terminal status.
    /// A status change on an already-terminal row is ignored (terminal
    /// states never re-transition), though the other supplied fields still
    /// merge.
    pub fn update(&self, job_id: &JobId, patch: &JobUpdate) -> StoreResult<Job> {
        self.db.with_conn(|conn| {
            let mut job = get_row(conn, job_id)?
                .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;

            if let Some(status) = patch.status {
                if job.status.is_terminal() && status != job.status {
                    tracing::debug!(
                        job_id = %job_id,
                        "Ignoring status change on terminal job ({} -> {})",
                        job.status,
                        status
                    );
                } else {
                    if status.is_terminal() && !job.status.is_terminal() {
                        job.completed_at = Some(Utc::now());
                    }
                    job.status = status;
                }
            }
            if let Some(ref progress) = patch.progress {
                job.progress = progress.clone();
            }
            if let Some(ref video_id) = patch.video_id {
                job.video_id = Some(video_id.clone());
            }
            if let Some(ref video_url) = patch.video_url {
                job.video_url = Some(video_url.clone());
            }
            if let Some(ref error) = patch.error {
                job.error = Some(error.clone());
            }

            conn.execute(
                "UPDATE jobs SET status=?2, progress=?3, video_id=?4, video_url=?5,
                 error=?6, completed_at=?7 WHERE job_id=?1",
                params![
                    job.job_id.as_str(),
                    job.status.as_str(),
                    job.progress,
                    job.video_id,
                    job.video_url,
                    job.error,
                    job.completed_at.map(|t| t.to_rfc3339()),
                ],
            )?;

            Ok(job)
        })
    }

    /// Fetch a job by its ID.
    pub fn get(&self, job_id: &JobId) -> StoreResult<Job> {
        self.db.with_conn(|conn| {
            get_row(conn, job_id)?.ok_or_else(|| StoreError::NotFound(job_id.to_string()))
        })
    }

    /// List jobs, newest created_at first.
    pub fn list(&self, limit: u32) -> StoreResult<Vec<Job>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM jobs ORDER BY created_at DESC, job_id DESC LIMIT ?1",
            )?;
            let jobs = stmt
                .query_map(params![limit], job_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(jobs)
        })
    }

    /// Delete a job record. Returns false if the id was absent.
    pub fn delete(&self, job_id: &JobId) -> StoreResult<bool> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM jobs WHERE job_id = ?1",
                params![job_id.as_str()],
            )?;
            Ok(changed > 0)
        })
    }
}

fn get_row(conn: &Connection, job_id: &JobId) -> StoreResult<Option<Job>> {
    let job = conn
        .query_row(
            "SELECT * FROM jobs WHERE job_id = ?1",
            params![job_id.as_str()],
            job_from_row,
        )
        .optional()?;
    Ok(job)
}

fn job_from_row(row: &Row<'_>) -> Result<Job, rusqlite::Error> {
    let status_str: String = row.get("status")?;
    let status = JobStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown job status: {}", status_str).into(),
        )
    })?;

    Ok(Job {
        job_id: JobId::from(row.get::<_, String>("job_id")?),
        status,
        progress: row.get("progress")?,
        video_id: row.get("video_id")?,
        video_url: row.get("video_url")?,
        error: row.get("error")?,
        created_at: parse_timestamp(row, "created_at")?,
        completed_at: row
            .get::<_, Option<String>>("completed_at")?
            .map(|s| parse_timestamp_str(&s))
            .transpose()?,
    })
}

fn parse_timestamp(row: &Row<'_>, column: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    let s: String = row.get(column)?;
    parse_timestamp_str(&s)
}

fn parse_timestamp_str(s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                e.to_string().into(),
            )
        })
}
