//! Watch-folder ingestion.
//!
//! Subscribes to create and rename-into events on one root directory and
//! feeds qualifying files into the same job queue batch mode uses. Only the
//! root itself is
//! subscribed: a directory created under it is expanded once, recursively,
//! when its create event arrives, but is not watched afterwards.

use std::path::PathBuf;

use anyhow::{Context, Result};
use mp4forge_common::paths::is_media_candidate;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::discover::discover;
use crate::pool::{JobSink, QueueClosed};

/// Events buffered between the notify thread and the ingest loop.
const EVENT_BUFFER: usize = 256;

/// File watcher that turns newly arrived paths into jobs.
pub struct WatchIngestor {
    root: PathBuf,
    sink: JobSink,
}

impl WatchIngestor {
    pub fn new(root: impl Into<PathBuf>, sink: JobSink) -> Self {
        Self {
            root: root.into(),
            sink,
        }
    }

    /// Watch until the job queue is closed.
    ///
    /// Returns `Ok` after the queue closes. Failing to subscribe, an error
    /// from the event stream, or a failed directory expansion is returned as
    /// `Err`; these are not retried.
    pub async fn run(self) -> Result<()> {
        let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(EVENT_BUFFER);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Only fails once the ingest loop is gone.
            let _ = event_tx.blocking_send(res);
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(&self.root, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch path: {:?}", self.root))?;
        info!("Watching directory: {:?}", self.root);

        // Directory expansion runs off the event loop so a large new
        // directory cannot stall event delivery.
        let mut expansions: JoinSet<Result<usize>> = JoinSet::new();

        let result = loop {
            tokio::select! {
                biased;

                _ = self.sink.closed() => break Ok(()),

                Some(joined) = expansions.join_next() => match joined {
                    Ok(Ok(queued)) => debug!("Expansion finished, {} job(s) queued", queued),
                    Ok(Err(e)) => break Err(e),
                    Err(e) if e.is_panic() => break Err(anyhow::anyhow!("expansion task panicked: {e}")),
                    Err(_) => {}
                },

                event = event_rx.recv() => match event {
                    Some(Ok(event)) => self.dispatch(event, &mut expansions),
                    Some(Err(e)) => break Err(anyhow::Error::new(e).context("File watch failed")),
                    None => break Err(anyhow::anyhow!("File watcher stopped unexpectedly")),
                },
            }
        };

        // Unblock the notify thread before tearing the watcher down.
        drop(event_rx);
        drop(watcher);
        expansions.shutdown().await;

        info!("File watcher stopped");
        result
    }

    fn dispatch(&self, event: Event, expansions: &mut JoinSet<Result<usize>>) {
        if !is_arrival(&event.kind) {
            return;
        }

        for path in event.paths {
            let sink = self.sink.clone();
            expansions.spawn(async move { ingest_created(path, &sink).await });
        }
    }
}

/// Whether an event means a path appeared in the watched directory.
///
/// A finished download is often renamed into place rather than written
/// there. `RenameMode::To` carries the destination of every such rename;
/// backends that pair renames send `RenameMode::Both` in addition to it, so
/// that one is ignored. `RenameMode::Any` does not say which side the path
/// is on; an old name fails the stat in [`ingest_created`] and is skipped.
fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any))
    )
}

/// Turn one newly created path into jobs, returning how many were queued.
///
/// A directory is expanded recursively and only media candidates are
/// queued; a file is queued iff it is a media candidate. A path that is
/// already gone is skipped.
pub async fn ingest_created(path: PathBuf, sink: &JobSink) -> Result<usize> {
    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta,
        Err(e) => {
            warn!("Created path disappeared before it could be inspected {:?}: {}", path, e);
            return Ok(0);
        }
    };

    let candidates: Vec<PathBuf> = if meta.is_dir() {
        let dir = path.clone();
        let files = tokio::task::spawn_blocking(move || discover(&dir, true))
            .await
            .context("directory expansion task failed")??;
        files.into_iter().filter(|f| is_media_candidate(f)).collect()
    } else if is_media_candidate(&path) {
        vec![path]
    } else {
        debug!("Ignoring non-media file {:?}", path);
        Vec::new()
    };

    let mut queued = 0;
    for file in candidates {
        match sink.submit(file.clone()).await {
            Ok(()) => {
                queued += 1;
                info!(file = %file.display(), "File watcher queued job");
            }
            Err(QueueClosed) => {
                debug!("Job queue closed, dropping remaining files");
                break;
            }
        }
    }

    Ok(queued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{job_channel, JobReceiver};
    use std::time::Duration;
    use tempfile::tempdir;

    /// Run `ingest_created` while receiving every job it hands off.
    async fn collect_ingested(path: PathBuf) -> (usize, Vec<PathBuf>) {
        let (sink, rx) = job_channel();
        let task = tokio::spawn(async move { ingest_created(path, &sink).await });

        let mut received = Vec::new();
        while let Some(job) = rx.recv().await {
            received.push(job.path);
        }
        (task.await.unwrap().unwrap(), received)
    }

    #[tokio::test]
    async fn test_new_directory_queues_only_candidates() {
        let root = tempdir().unwrap();
        let drop_dir = root.path().join("season1");
        std::fs::create_dir(&drop_dir).unwrap();
        std::fs::write(drop_dir.join("e01.mkv"), b"").unwrap();
        std::fs::write(drop_dir.join("e02.avi"), b"").unwrap();
        std::fs::write(drop_dir.join("notes.txt"), b"").unwrap();

        let (queued, received) = collect_ingested(drop_dir.clone()).await;
        assert_eq!(queued, 2);
        assert_eq!(
            received,
            vec![drop_dir.join("e01.mkv"), drop_dir.join("e02.avi")]
        );
    }

    #[tokio::test]
    async fn test_new_directory_is_expanded_recursively() {
        let root = tempdir().unwrap();
        let drop_dir = root.path().join("show");
        std::fs::create_dir_all(drop_dir.join("extras")).unwrap();
        std::fs::write(drop_dir.join("extras/bonus.mp4"), b"").unwrap();
        std::fs::write(drop_dir.join("extras/.partial.mp4"), b"").unwrap();

        let (queued, received) = collect_ingested(drop_dir.clone()).await;
        assert_eq!(queued, 1);
        assert_eq!(received, vec![drop_dir.join("extras/bonus.mp4")]);
    }

    #[tokio::test]
    async fn test_single_file_filtering() {
        let root = tempdir().unwrap();
        let movie = root.path().join("movie.mkv");
        let text = root.path().join("movie.nfo");
        std::fs::write(&movie, b"").unwrap();
        std::fs::write(&text, b"").unwrap();

        assert_eq!(collect_ingested(movie.clone()).await, (1, vec![movie]));
        assert_eq!(collect_ingested(text).await, (0, vec![]));
    }

    #[tokio::test]
    async fn test_vanished_path_is_skipped() {
        let root = tempdir().unwrap();
        let (queued, received) = collect_ingested(root.path().join("gone.mkv")).await;
        assert_eq!(queued, 0);
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn test_closed_queue_stops_ingest() {
        let root = tempdir().unwrap();
        let movie = root.path().join("movie.mkv");
        std::fs::write(&movie, b"").unwrap();

        let (sink, _rx) = job_channel();
        sink.close();
        assert_eq!(ingest_created(movie, &sink).await.unwrap(), 0);
    }

    #[test]
    fn test_arrival_events() {
        use notify::event::{CreateKind, DataChange, RemoveKind};

        assert!(is_arrival(&EventKind::Create(CreateKind::File)));
        assert!(is_arrival(&EventKind::Create(CreateKind::Folder)));
        assert!(is_arrival(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));
        assert!(is_arrival(&EventKind::Modify(ModifyKind::Name(RenameMode::Any))));

        assert!(!is_arrival(&EventKind::Modify(ModifyKind::Name(RenameMode::From))));
        assert!(!is_arrival(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))));
        assert!(!is_arrival(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(!is_arrival(&EventKind::Remove(RemoveKind::File)));
    }

    /// Start watching `root`, giving the watcher time to subscribe.
    async fn start_watching(
        root: &std::path::Path,
    ) -> (JobSink, JobReceiver, tokio::task::JoinHandle<Result<()>>) {
        let (sink, rx) = job_channel();
        let running = tokio::spawn(WatchIngestor::new(root, sink.clone()).run());
        tokio::time::sleep(Duration::from_millis(300)).await;
        (sink, rx, running)
    }

    async fn stop_watching(
        sink: JobSink,
        running: tokio::task::JoinHandle<Result<()>>,
    ) -> Result<()> {
        sink.close();
        tokio::time::timeout(Duration::from_secs(10), running)
            .await
            .expect("watcher did not stop")
            .unwrap()
    }

    #[tokio::test]
    async fn test_watch_missing_root_fails() {
        let root = tempdir().unwrap();
        let (sink, _rx) = job_channel();
        let ingestor = WatchIngestor::new(root.path().join("missing"), sink);
        assert!(ingestor.run().await.is_err());
    }

    #[tokio::test]
    async fn test_watch_picks_up_created_file_and_stops_on_close() {
        let root = tempdir().unwrap();
        let (sink, rx, running) = start_watching(root.path()).await;

        let movie = root.path().join("arrival.mkv");
        std::fs::write(&movie, b"").unwrap();

        let job = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no job queued")
            .unwrap();
        assert_eq!(job.path, movie);

        assert!(stop_watching(sink, running).await.is_ok());
    }

    #[tokio::test]
    async fn test_watch_picks_up_file_renamed_into_root() {
        let staging = tempdir().unwrap();
        let root = tempdir().unwrap();
        let (sink, rx, running) = start_watching(root.path()).await;

        let finished = staging.path().join("done.mkv");
        std::fs::write(&finished, b"").unwrap();
        let moved = root.path().join("done.mkv");
        std::fs::rename(&finished, &moved).unwrap();

        let job = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("rename into the root queued nothing")
            .unwrap();
        assert_eq!(job.path, moved);

        assert!(stop_watching(sink, running).await.is_ok());
    }

    #[tokio::test]
    async fn test_watch_expands_created_directory() {
        let root = tempdir().unwrap();
        let (sink, rx, running) = start_watching(root.path()).await;

        // No await until the directory is complete, so the ingest loop
        // cannot expand it half-written.
        let season = root.path().join("season1");
        std::fs::create_dir(&season).unwrap();
        std::fs::write(season.join("e01.mkv"), b"").unwrap();
        std::fs::write(season.join("e02.avi"), b"").unwrap();
        std::fs::write(season.join("notes.txt"), b"").unwrap();

        let mut received = Vec::new();
        for _ in 0..2 {
            let job = tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .expect("directory expansion queued too few jobs")
                .unwrap();
            received.push(job.path);
        }
        assert_eq!(received, vec![season.join("e01.mkv"), season.join("e02.avi")]);

        let extra = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(extra.is_err(), "unexpected extra job: {:?}", extra);

        assert!(stop_watching(sink, running).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_watch_fails_when_created_directory_cannot_be_expanded() {
        let root = tempdir().unwrap();
        let (_sink, _rx, running) = start_watching(root.path()).await;

        let broken = root.path().join("broken");
        std::fs::create_dir(&broken).unwrap();
        std::os::unix::fs::symlink(root.path().join("nowhere"), broken.join("link.mkv"))
            .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), running)
            .await
            .expect("watcher kept running after a failed expansion")
            .unwrap();
        assert!(result.is_err());
    }
}
