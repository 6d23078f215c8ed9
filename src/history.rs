use crate::error::{Result, StudioError};
use crate::render::RenderOutput;
use crate::request::MovieRequest;
use crate::script::Scene;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieStatus {
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub duration_seconds: f64,
    pub file_size_bytes: u64,
    pub total_clips: usize,
    pub resolution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: String,
    pub title: String,
    pub genre: String,
    pub style: String,
    pub description: String,
    pub num_scenes: usize,
    pub video_path: String,
    pub video_url: String,
    /// Unix seconds.
    pub created_at: f64,
    pub status: MovieStatus,
    pub video_info: VideoInfo,
    pub scenes: Vec<Scene>,
    pub images: Vec<String>,
}

impl MovieRecord {
    pub fn completed(
        id: String,
        request: &MovieRequest,
        scenes: Vec<Scene>,
        images: Vec<String>,
        output: &RenderOutput,
        total_clips: usize,
        video_url: String,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            title: request.title.clone(),
            genre: request.genre.clone(),
            style: request.style.clone(),
            description: request.description.clone(),
            num_scenes: scenes.len(),
            video_path: output.path.display().to_string(),
            video_url,
            created_at: now.timestamp_millis() as f64 / 1000.0,
            status: MovieStatus::Completed,
            video_info: VideoInfo {
                duration_seconds: output.duration_seconds,
                file_size_bytes: output.file_size_bytes,
                total_clips,
                resolution: output.resolution.clone(),
            },
            scenes,
            images,
        }
    }
}

/// JSON-file movie history.
///
/// Writers inside one process are serialised by a lock around the whole
/// read-modify-write cycle, and every write lands in a temporary file in the
/// same directory that is then renamed over the target.
pub struct HistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> Result<Vec<MovieRecord>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            StudioError::History(format!("corrupt history file {}: {}", self.path.display(), e))
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<MovieRecord>> {
        Ok(self.list().await?.into_iter().find(|m| m.id == id))
    }

    pub async fn append(&self, record: MovieRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.list().await?;
        if records.iter().any(|m| m.id == record.id) {
            return Err(StudioError::History(format!("duplicate movie id {}", record.id)));
        }
        records.push(record);
        self.write_all(records).await
    }

    /// Removes the record and returns it. The video file is left to the
    /// caller.
    pub async fn delete(&self, id: &str) -> Result<Option<MovieRecord>> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.list().await?;
        let Some(pos) = records.iter().position(|m| m.id == id) else {
            return Ok(None);
        };
        let removed = records.remove(pos);
        self.write_all(records).await?;
        Ok(Some(removed))
    }

    async fn write_all(&self, records: Vec<MovieRecord>) -> Result<()> {
        let json = serde_json::to_vec_pretty(&records)?;
        let target = self.path.clone();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        tokio::task::spawn_blocking(move || -> Result<()> {
            std::fs::create_dir_all(&dir)?;
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&json)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| StudioError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StudioError::History(format!("history writer panicked: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record(id: &str, title: &str) -> MovieRecord {
        let request = MovieRequest {
            title: title.to_string(),
            description: "A test movie".to_string(),
            ..MovieRequest::default()
        };
        let output = RenderOutput {
            path: PathBuf::from(format!("static/output/{id}.mp4")),
            duration_seconds: 7.25,
            resolution: "832x480".to_string(),
            file_size_bytes: 4096,
        };
        let scenes = crate::script::segment("Scene 1: A\nBody", &request.genre, &request.style);
        MovieRecord::completed(
            id.to_string(),
            &request,
            scenes,
            vec!["static/output/scene_1.jpg".to_string()],
            &output,
            1,
            format!("/static/output/{id}.mp4"),
        )
    }

    #[tokio::test]
    async fn missing_file_lists_empty() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn append_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));

        store.append(record("a", "First")).await.unwrap();
        store.append(record("b", "Second")).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(store.get("b").await.unwrap().unwrap().title, "Second");

        let removed = store.delete("a").await.unwrap().unwrap();
        assert_eq!(removed.title, "First");
        assert!(store.delete("a").await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        store.append(record("a", "First")).await.unwrap();
        assert!(matches!(
            store.append(record("a", "Again")).await,
            Err(StudioError::History(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(HistoryStore::new(dir.path().join("history.json")));

        let mut handles = Vec::new();
        for i in 0..12 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.append(record(&format!("m{i}"), "Parallel")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list().await.unwrap().len(), 12);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "history.json")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn floats_read_back_exactly() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        let mut movie = record("f", "Floats");
        movie.video_info.duration_seconds = (5.0 - 0.0) + (4.0 - 0.3) + (6.0 - 0.3);
        movie.created_at = 1_760_601_234.567_891;

        store.append(movie.clone()).await.unwrap();
        assert_eq!(store.get("f").await.unwrap().unwrap(), movie);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = HistoryStore::new(&path);
        assert!(matches!(store.list().await, Err(StudioError::History(_))));
    }

    #[test]
    fn record_json_shape() {
        let json = serde_json::to_value(record("abc", "Shape")).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["num_scenes"], 1);
        assert_eq!(json["video_info"]["total_clips"], 1);
        assert_eq!(json["video_info"]["resolution"], "832x480");
        assert_eq!(json["video_info"]["file_size_bytes"], 4096);
        assert_eq!(json["scenes"][0]["title"], "Scene 1: A");
        assert!(json["created_at"].as_f64().unwrap() > 0.0);
    }
}
