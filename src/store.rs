use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{Video, VideoDraft},
};

/// In-memory video registry. Every operation takes the lock once and
/// releases it before returning.
#[derive(Debug, Default)]
pub struct VideoStore {
    inner: RwLock<Inner>,
    capacity: Option<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    videos: HashMap<String, Entry>,
    next_seq: u64,
}

#[derive(Debug)]
struct Entry {
    // insertion order, breaks created_at ties
    seq: u64,
    video: Video,
}

impl VideoStore {
    /// `0` means unbounded.
    pub fn with_capacity_limit(max_videos: usize) -> Self {
        Self {
            inner: RwLock::default(),
            capacity: (max_videos > 0).then_some(max_videos),
        }
    }

    /// Registers a draft under a fresh id with zeroed counters.
    pub fn create(&self, draft: VideoDraft) -> Result<Video, StoreError> {
        let id = Uuid::new_v4().to_string();

        let mut inner = self.inner.write();
        if let Some(limit) = self.capacity {
            if inner.videos.len() >= limit {
                return Err(StoreError::CapacityExhausted { limit });
            }
        }
        if inner.videos.contains_key(&id) {
            return Err(StoreError::Conflict(id));
        }

        let video = Video {
            id: id.clone(),
            title: draft.title,
            description: draft.description,
            file_path: draft.file_path,
            thumbnail: draft.thumbnail,
            views: 0,
            likes: 0,
            dislikes: 0,
            created_at: Utc::now(),
            duration: draft.duration,
            author: draft.author,
        };

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.videos.insert(
            id,
            Entry {
                seq,
                video: video.clone(),
            },
        );

        Ok(video)
    }

    pub fn get(&self, id: &str) -> Option<Video> {
        self.inner.read().videos.get(id).map(|e| e.video.clone())
    }

    /// All videos, newest first.
    pub fn list_all(&self) -> Vec<Video> {
        let inner = self.inner.read();
        let mut entries: Vec<&Entry> = inner.videos.values().collect();
        entries.sort_by(|a, b| {
            b.video
                .created_at
                .cmp(&a.video.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        entries.into_iter().map(|e| e.video.clone()).collect()
    }

    /// Adds one view. Unknown ids are ignored; the return value says whether
    /// the video existed.
    pub fn increment_views(&self, id: &str) -> bool {
        match self.inner.write().videos.get_mut(id) {
            Some(entry) => {
                entry.video.views += 1;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().videos.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn draft(title: &str) -> VideoDraft {
        VideoDraft::new(title, "tester", PathBuf::from(format!("uploads/videos/{title}.mp4")))
    }

    #[test]
    fn create_assigns_id_timestamp_and_zero_counters() {
        let store = VideoStore::default();
        let before = Utc::now();
        let video = store.create(draft("A").with_description("first")).unwrap();
        let after = Utc::now();

        assert!(!video.id.is_empty());
        assert!(video.created_at >= before && video.created_at <= after);

        let fetched = store.get(&video.id).expect("video stored");
        assert_eq!(fetched, video);
        assert_eq!((fetched.views, fetched.likes, fetched.dislikes), (0, 0, 0));
        assert_eq!(fetched.description, "first");
        assert_eq!(fetched.thumbnail, crate::models::DEFAULT_THUMBNAIL);
        assert_eq!(fetched.duration, crate::models::DEFAULT_DURATION);
    }

    #[test]
    fn get_unknown_id_is_none() {
        let store = VideoStore::default();
        store.create(draft("A")).unwrap();
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn list_all_is_newest_first() {
        let store = VideoStore::default();
        for title in ["A", "B", "C"] {
            store.create(draft(title)).unwrap();
        }
        let titles: Vec<String> = store.list_all().into_iter().map(|v| v.title).collect();
        assert_eq!(titles, ["C", "B", "A"]);
    }

    #[test]
    fn list_all_orders_many_quick_inserts_by_insertion() {
        // Timestamps may collide at this rate; insertion order must decide.
        let store = VideoStore::default();
        let ids: Vec<String> = (0..200)
            .map(|i| store.create(draft(&i.to_string())).unwrap().id)
            .collect();
        let listed: Vec<String> = store.list_all().into_iter().map(|v| v.id).collect();
        let expected: Vec<String> = ids.into_iter().rev().collect();
        assert_eq!(listed, expected);
    }

    #[test]
    fn concurrent_creates_get_unique_ids() {
        let store = Arc::new(VideoStore::default());
        let ids: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let store = store.clone();
                    s.spawn(move || {
                        (0..50)
                            .map(|i| store.create(draft(&format!("{t}-{i}"))).unwrap().id)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 400);
        assert_eq!(store.len(), 400);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let store = Arc::new(VideoStore::default());
        let id = store.create(draft("A")).unwrap().id;

        std::thread::scope(|s| {
            for _ in 0..10 {
                let store = store.clone();
                let id = id.clone();
                s.spawn(move || {
                    for _ in 0..100 {
                        assert!(store.increment_views(&id));
                    }
                });
            }
        });

        assert_eq!(store.get(&id).unwrap().views, 1000);
    }

    #[test]
    fn increment_unknown_id_changes_nothing() {
        let store = VideoStore::default();
        let video = store.create(draft("A")).unwrap();
        let before = store.list_all();

        assert!(!store.increment_views("missing"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.list_all(), before);
        assert_eq!(store.get(&video.id).unwrap().views, 0);
    }

    #[test]
    fn full_store_rejects_create() {
        let store = VideoStore::with_capacity_limit(2);
        store.create(draft("A")).unwrap();
        store.create(draft("B")).unwrap();

        let err = store.create(draft("C")).unwrap_err();
        assert!(matches!(err, StoreError::CapacityExhausted { limit: 2 }));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn zero_capacity_means_unbounded() {
        let store = VideoStore::with_capacity_limit(0);
        for i in 0..10 {
            store.create(draft(&i.to_string())).unwrap();
        }
        assert_eq!(store.len(), 10);
    }
}
