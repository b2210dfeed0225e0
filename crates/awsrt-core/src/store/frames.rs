//! Per-run time slices of hidden state and belief, backed by SQLite.
//!
//! Each frame row holds the state raster as one byte per cell and the belief
//! raster as little-endian `f32`. Frames of a run are dense: indices
//! `0..T` are always present.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::manifest::RunConfig;
use crate::raster::Raster;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS runs (
        run_id TEXT PRIMARY KEY,
        config TEXT NOT NULL,
        height INTEGER NOT NULL,
        width INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS frames (
        run_id TEXT NOT NULL REFERENCES runs(run_id),
        t INTEGER NOT NULL,
        state BLOB NOT NULL,
        belief BLOB NOT NULL,
        PRIMARY KEY (run_id, t)
    );";

/// Frame produced by a step closure, appended at `t_latest + 1`.
pub struct NextFrame {
    pub state: Raster<u8>,
    pub belief: Raster<f32>,
}

pub struct FrameStore {
    conn: Mutex<Connection>,
}

impl FrameStore {
    pub fn open(path: &Path) -> CoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "Opened frame store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store (for testing).
    pub fn open_in_memory() -> CoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // Transactions roll back on panic, so a poisoned connection is consistent.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist a new run together with frame 0.
    pub fn create_run(
        &self,
        config: &RunConfig,
        state0: &Raster<u8>,
        belief0: &Raster<f32>,
    ) -> CoreResult<()> {
        check_shape(config, state0, belief0)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO runs (run_id, config, height, width, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                config.run_id,
                serde_json::to_string(config)?,
                config.height,
                config.width,
                config.created_at.to_rfc3339(),
            ],
        )?;
        if inserted == 0 {
            return Err(CoreError::Conflict(format!(
                "run {} already exists",
                config.run_id
            )));
        }
        tx.execute(
            "INSERT INTO frames (run_id, t, state, belief) VALUES (?1, 0, ?2, ?3)",
            params![config.run_id, state0.to_bytes(), belief0.to_bytes()],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn run_config(&self, run_id: &str) -> CoreResult<RunConfig> {
        load_config(&self.lock(), run_id)
    }

    /// Number of stored frames (`T`).
    pub fn frame_count(&self, run_id: &str) -> CoreResult<u32> {
        let conn = self.lock();
        load_config(&conn, run_id)?;
        count_frames(&conn, run_id)
    }

    pub fn state_at(&self, run_id: &str, t: u32) -> CoreResult<Raster<u8>> {
        let conn = self.lock();
        let config = load_config(&conn, run_id)?;
        load_state(&conn, &config, t)
    }

    pub fn belief_at(&self, run_id: &str, t: u32) -> CoreResult<Raster<f32>> {
        let conn = self.lock();
        let config = load_config(&conn, run_id)?;
        load_belief(&conn, &config, t)
    }

    /// All run ids, sorted.
    pub fn list_runs(&self) -> CoreResult<Vec<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT run_id FROM runs ORDER BY run_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Compute and append the frame after the latest one.
    ///
    /// `next` receives the run config, `t_latest` and the latest frame. It
    /// returns `None` when the run cannot advance. The whole call holds the
    /// store lock, so concurrent callers append strictly consecutive indices.
    /// Returns the new `t_latest`.
    pub fn append_next<F>(&self, run_id: &str, next: F) -> CoreResult<u32>
    where
        F: FnOnce(&RunConfig, u32, &Raster<u8>, &Raster<f32>) -> CoreResult<Option<NextFrame>>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let config = load_config(&tx, run_id)?;
        let count = count_frames(&tx, run_id)?;
        let t_latest = count.checked_sub(1).ok_or_else(|| {
            CoreError::Conflict(format!("run {} has no initial frame", run_id))
        })?;

        let state = load_state(&tx, &config, t_latest)?;
        let belief = load_belief(&tx, &config, t_latest)?;
        let Some(frame) = next(&config, t_latest, &state, &belief)? else {
            return Ok(t_latest);
        };
        check_shape(&config, &frame.state, &frame.belief)?;

        let t_next = t_latest + 1;
        tx.execute(
            "INSERT INTO frames (run_id, t, state, belief) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, t_next, frame.state.to_bytes(), frame.belief.to_bytes()],
        )?;
        tx.commit()?;
        debug!(run_id, t = t_next, "Appended frame");
        Ok(t_next)
    }
}

fn check_shape(config: &RunConfig, state: &Raster<u8>, belief: &Raster<f32>) -> CoreResult<()> {
    let expected = (config.height as usize, config.width as usize);
    for (name, shape) in [
        ("state", (state.height(), state.width())),
        ("belief", (belief.height(), belief.width())),
    ] {
        if shape != expected {
            return Err(CoreError::Conflict(format!(
                "{} raster is {}x{} but run {} is {}x{}",
                name, shape.0, shape.1, config.run_id, expected.0, expected.1
            )));
        }
    }
    Ok(())
}

fn load_config(conn: &Connection, run_id: &str) -> CoreResult<RunConfig> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT config FROM runs WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )
        .optional()?;
    let raw = raw.ok_or_else(|| CoreError::not_found("Run", run_id))?;
    Ok(serde_json::from_str(&raw)?)
}

fn count_frames(conn: &Connection, run_id: &str) -> CoreResult<u32> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM frames WHERE run_id = ?1",
        params![run_id],
        |row| row.get(0),
    )?)
}

fn load_blob(conn: &Connection, run_id: &str, t: u32, column: &str) -> CoreResult<Vec<u8>> {
    let sql = format!("SELECT {} FROM frames WHERE run_id = ?1 AND t = ?2", column);
    conn.query_row(&sql, params![run_id, t], |row| row.get(0))
        .optional()?
        .ok_or_else(|| CoreError::not_found("Frame", format!("{}@t={}", run_id, t)))
}

fn load_state(conn: &Connection, config: &RunConfig, t: u32) -> CoreResult<Raster<u8>> {
    let bytes = load_blob(conn, &config.run_id, t, "state")?;
    Raster::from_vec(config.height as usize, config.width as usize, bytes)
}

fn load_belief(conn: &Connection, config: &RunConfig, t: u32) -> CoreResult<Raster<f32>> {
    let bytes = load_blob(conn, &config.run_id, t, "belief")?;
    Raster::from_le_bytes(config.height as usize, config.width as usize, &bytes)
}
