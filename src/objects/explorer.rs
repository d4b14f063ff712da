//! S3 explorer tab state machine
//!
//! ```text
//!            non-empty input             head fails
//!   Idle ───────────────────▶ Fetching ─────────────▶ MetadataError
//!    ▲                           │ │     presign fails
//!    │ empty input               │ └────────────────▶ UrlError
//!    └──── (any state)           │ ok
//!                                └──────────────────▶ PreviewReady(kind)
//! ```
//!
//! Any new non-empty input moves back to `Fetching`. The most recent
//! submission wins; a response for a superseded submission is dropped.

use crate::error::RemoteError;
use crate::metrics;
use crate::objects::classify::MediaKind;
use crate::objects::client::ObjectStore;
use crate::objects::descriptor::{describe, download_to_temp, ObjectDescriptor};
use crate::types::ObjectRef;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Prompt shown while bucket or key is empty
pub const IDLE_TEXT: &str = "Enter bucket name and object key above...";

/// Progress text while a fetch is outstanding
pub const FETCHING_TEXT: &str = "Fetching S3 object...";

/// Status text when presigning failed
pub const URL_ERROR_TEXT: &str = "Error generating presigned URL";

/// Preview pane contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Preview {
    /// Embedded video player
    Video {
        /// Presigned URL
        url: String,
    },
    /// Embedded PDF viewer
    Pdf {
        /// Presigned URL
        url: String,
    },
    /// Embedded image
    Image {
        /// Presigned URL
        url: String,
    },
    /// Markdown download link
    DownloadLink {
        /// `[Download {key}]({url})`
        markdown: String,
    },
}

impl Preview {
    /// Preview for `kind`, rendering directly from `url`
    pub fn for_kind(kind: MediaKind, key: &str, url: &str) -> Self {
        let url = url.to_string();
        match kind {
            MediaKind::Video => Preview::Video { url },
            MediaKind::Pdf => Preview::Pdf { url },
            MediaKind::Image => Preview::Image { url },
            MediaKind::Other => Preview::DownloadLink {
                markdown: format!("[Download {}]({})", key, url),
            },
        }
    }
}

/// What the S3 tab currently shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ObjectView {
    /// Waiting for bucket and key
    Idle,
    /// Lookup in flight
    Fetching {
        /// Object being fetched
        object: ObjectRef,
    },
    /// Metadata lookup failed
    MetadataError {
        /// Descriptor with `error` set
        descriptor: ObjectDescriptor,
    },
    /// Metadata succeeded, presigning failed
    UrlError {
        /// Descriptor with `url_error` set
        descriptor: ObjectDescriptor,
    },
    /// Preview available
    PreviewReady {
        /// Descriptor with metadata and access URL
        descriptor: ObjectDescriptor,
        /// Preview pane contents
        preview: Preview,
    },
}

impl ObjectView {
    /// Status line
    pub fn status_text(&self) -> String {
        match self {
            ObjectView::Idle => IDLE_TEXT.to_string(),
            ObjectView::Fetching { .. } => FETCHING_TEXT.to_string(),
            ObjectView::MetadataError { descriptor } => {
                format!("Error: {}", descriptor.error.as_deref().unwrap_or("unknown"))
            },
            ObjectView::UrlError { .. } => URL_ERROR_TEXT.to_string(),
            ObjectView::PreviewReady { descriptor, .. } => match descriptor.kind {
                MediaKind::Video => "Video preview loaded",
                MediaKind::Pdf => "PDF preview loaded",
                MediaKind::Image => "Image preview loaded",
                MediaKind::Other => "File ready for download",
            }
            .to_string(),
        }
    }

    /// Info pane JSON
    ///
    /// Empty while idle or fetching, `{"Error": ..}` on metadata failure,
    /// metadata fields otherwise.
    pub fn info_json(&self) -> Value {
        match self {
            ObjectView::Idle | ObjectView::Fetching { .. } => json!({}),
            ObjectView::MetadataError { descriptor }
            | ObjectView::UrlError { descriptor }
            | ObjectView::PreviewReady { descriptor, .. } => descriptor.info_json(),
        }
    }

    /// Preview pane contents, if any
    pub fn preview(&self) -> Option<&Preview> {
        match self {
            ObjectView::PreviewReady { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Media kind of a ready preview
    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            ObjectView::PreviewReady { descriptor, .. } => Some(descriptor.kind),
            _ => None,
        }
    }

    /// Descriptor, once a lookup completed
    pub fn descriptor(&self) -> Option<&ObjectDescriptor> {
        match self {
            ObjectView::MetadataError { descriptor }
            | ObjectView::UrlError { descriptor }
            | ObjectView::PreviewReady { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }
}

impl From<ObjectDescriptor> for ObjectView {
    /// Terminal state for a completed lookup
    fn from(descriptor: ObjectDescriptor) -> Self {
        if descriptor.error.is_some() {
            return ObjectView::MetadataError { descriptor };
        }
        match descriptor.access_url.clone() {
            Some(access) => {
                let preview = Preview::for_kind(descriptor.kind, &descriptor.key, &access.url);
                ObjectView::PreviewReady {
                    descriptor,
                    preview,
                }
            },
            None => ObjectView::UrlError { descriptor },
        }
    }
}

struct Submission {
    generation: u64,
    object: Option<ObjectRef>,
}

/// One S3 explorer instance
pub struct ObjectExplorer {
    store: Arc<dyn ObjectStore>,
    presign_expiry: Duration,
    submission: Mutex<Submission>,
    state: watch::Sender<ObjectView>,
}

impl ObjectExplorer {
    /// Create an idle explorer
    pub fn new(store: Arc<dyn ObjectStore>, presign_expiry: Duration) -> Self {
        let (state, _) = watch::channel(ObjectView::Idle);
        Self {
            store,
            presign_expiry,
            submission: Mutex::new(Submission {
                generation: 0,
                object: None,
            }),
            state,
        }
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<ObjectView> {
        self.state.subscribe()
    }

    /// Current state
    pub fn state(&self) -> ObjectView {
        self.state.borrow().clone()
    }

    /// Submit bucket and key and return the resulting pane state
    ///
    /// Either input blank resets to `Idle`. Resubmitting the current
    /// object returns the current state at once while its URL is valid or
    /// a fetch is in flight (`Fetching`); after an error or URL expiry it
    /// fetches again and waits for the lookup.
    pub async fn fetch(&self, bucket: &str, key: &str) -> ObjectView {
        let object = ObjectRef::new(bucket.trim(), key.trim());

        let generation = {
            let mut submission = self.submission.lock();

            if object.is_empty() {
                submission.generation += 1;
                submission.object = None;
                self.state.send_replace(ObjectView::Idle);
                return ObjectView::Idle;
            }

            if submission.object.as_ref() == Some(&object) && self.is_current(&self.state.borrow())
            {
                debug!(%object, "Object unchanged, keeping current preview");
                return self.state();
            }

            submission.generation += 1;
            submission.object = Some(object.clone());
            self.state.send_replace(ObjectView::Fetching {
                object: object.clone(),
            });
            submission.generation
        };

        let descriptor = describe(
            self.store.as_ref(),
            &object.bucket,
            &object.key,
            self.presign_expiry,
        )
        .await;

        let submission = self.submission.lock();
        if submission.generation != generation {
            metrics::record_stale("s3");
            debug!(%object, generation, "Discarding superseded object response");
            return self.state();
        }

        if let Some(error) = &descriptor.error {
            warn!(%object, error = %error, "Object metadata lookup failed");
            metrics::record_error("remote", "s3_head_object");
        } else if let Some(error) = &descriptor.url_error {
            warn!(%object, error = %error, "Presigning failed");
            metrics::record_error("remote", "s3_presign");
        }

        let view = ObjectView::from(descriptor);
        self.state.send_replace(view.clone());
        view
    }

    /// Download the current object to a local temp file
    ///
    /// Requires a ready preview whose URL has not expired.
    pub async fn download(&self) -> Result<PathBuf, RemoteError> {
        let (key, url) = {
            let state = self.state.borrow();
            let descriptor = state
                .descriptor()
                .filter(|_| state.preview().is_some())
                .ok_or_else(|| RemoteError::NotFound("no object loaded".to_string()))?;
            let url = descriptor
                .valid_url()
                .ok_or_else(|| RemoteError::Presign("access URL expired".to_string()))?;
            (descriptor.key.clone(), url.to_string())
        };

        download_to_temp(self.store.as_ref(), &key, &url).await
    }

    fn is_current(&self, view: &ObjectView) -> bool {
        match view {
            ObjectView::Fetching { .. } => true,
            ObjectView::PreviewReady { descriptor, .. } => descriptor.valid_url().is_some(),
            _ => false,
        }
    }
}
