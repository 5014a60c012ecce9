// src/engine/stream.rs
//! Parallel export of a whole store
//!
//! The row-id space is cut into disjoint ranges, one per worker. Each worker
//! opens its own read-only connection and ships batches over a bounded
//! channel; the calling thread is the only consumer, so the sink never
//! needs locking.

use crossbeam_channel::{bounded, Sender};
use rusqlite::{params, OpenFlags};

use super::{Engine, KvPair, Location};
use crate::consts::STREAM_BATCH;
use crate::error::Result;

type Message = Result<Vec<KvPair>>;

impl Engine {
    /// Produce every pair under `prefix` exactly once, in no particular order.
    /// Returns the number of pairs handed to `sink`.
    pub fn stream<F>(&self, prefix: &[u8], workers: usize, mut sink: F) -> Result<usize>
    where
        F: FnMut(Vec<KvPair>) -> Result<()>,
    {
        let bounds: (Option<i64>, Option<i64>) =
            self.conn
                .query_row("SELECT MIN(id), MAX(id) FROM kv", [], |r| {
                    Ok((r.get(0)?, r.get(1)?))
                })?;
        let (Some(low), Some(high)) = bounds else {
            return Ok(0);
        };

        let workers = workers.max(1) as i64;
        let span = (high - low + 1 + workers - 1) / workers;
        let location = &self.location;

        std::thread::scope(|s| {
            let (tx, rx) = bounded::<Message>(workers as usize * 2);

            for worker in 0..workers {
                let start = low + worker * span;
                if start > high {
                    break;
                }
                let end = (start + span - 1).min(high);
                let tx = tx.clone();
                s.spawn(move || {
                    if let Err(err) = export_range(location, prefix, start, end, &tx) {
                        let _ = tx.send(Err(err));
                    }
                });
            }
            drop(tx);

            // Keep draining after a failure so no worker blocks on a full channel
            let mut produced = 0;
            let mut first_error = None;
            for message in rx {
                match message {
                    Ok(batch) if first_error.is_none() => {
                        produced += batch.len();
                        if let Err(err) = sink(batch) {
                            first_error = Some(err);
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                    }
                }
            }

            match first_error {
                Some(err) => Err(err),
                None => Ok(produced),
            }
        })
    }
}

fn export_range(
    location: &Location,
    prefix: &[u8],
    start: i64,
    end: i64,
    tx: &Sender<Message>,
) -> Result<()> {
    let conn = location.connect(OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)?;
    let mut stmt = conn.prepare("SELECT k, v FROM kv WHERE id BETWEEN ?1 AND ?2")?;
    let mut rows = stmt.query(params![start, end])?;

    let mut batch = Vec::with_capacity(STREAM_BATCH);
    while let Some(row) = rows.next()? {
        let key: Vec<u8> = row.get(0)?;
        if !key.starts_with(prefix) {
            continue;
        }
        batch.push((key, row.get(1)?));
        if batch.len() == STREAM_BATCH {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(STREAM_BATCH));
            if tx.send(Ok(full)).is_err() {
                return Ok(());
            }
        }
    }
    if !batch.is_empty() {
        let _ = tx.send(Ok(batch));
    }
    Ok(())
}
