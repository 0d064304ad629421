//! Reader Host - shows the reader overlay in live Chrome tabs
//!
//! Activation per tab:
//! fetch DOM + layout snapshot + image sizes → run the reader against the
//! tab's surface → inject stylesheet and overlay HTML, lock page scrolling.
//!
//! Activations and dismissals for the same tab are serialized; different
//! tabs proceed independently.

use dashmap::DashMap;
use dom::DomService;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use termview::output::classes;
use termview::{Assembly, Document, LocalSurface, OutputDocument, Reader, ReaderConfig, SnapshotGeometry, Surface};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::cdp::{CDPClient, CDPError, CDPSession, TargetId};
use crate::events::{EventBus, ReaderEvent};

/// Id of the injected `<style>` element
pub const STYLE_ID: &str = "terminal-view-style";

const STYLESHEET: &str = include_str!("../assets/terminal.css");
const SHOW_SCRIPT: &str = include_str!("../assets/show_overlay.js");
const DISMISS_SCRIPT: &str = include_str!("../assets/dismiss_overlay.js");

#[derive(Error, Debug)]
pub enum HostError {
    #[error("CDP error: {0}")]
    Cdp(#[from] CDPError),

    #[error("DOM error: {0}")]
    Dom(#[from] dom::DomError),

    #[error("Reader error: {0}")]
    Reader(#[from] termview::ReaderError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read host configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Target not found: {0}")]
    TargetNotFound(TargetId),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

pub type Result<T> = std::result::Result<T, HostError>;

/// Host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Browser-level DevTools websocket URL
    pub cdp_url: String,
    pub request_timeout_ms: u64,
    pub reader: ReaderConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            cdp_url: "ws://localhost:9222/devtools/browser".to_string(),
            request_timeout_ms: 30_000,
            reader: ReaderConfig::default(),
        }
    }
}

impl HostConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Per-tab state
struct Tab {
    session: CDPSession,
    surface: LocalSurface,
    /// Serializes activate/dismiss on this tab
    lock: Mutex<()>,
}

/// Reader host bound to one browser connection
pub struct ReaderHost {
    client: Arc<CDPClient>,
    reader: Reader,
    tabs: DashMap<TargetId, Arc<Tab>>,
    events: EventBus,
}

impl ReaderHost {
    /// Compile the reader rules, then connect to the browser
    pub async fn connect(config: HostConfig) -> Result<Self> {
        let reader = Reader::with_config(config.reader.clone())?;
        let client = CDPClient::connect_with_timeout(&config.cdp_url, config.request_timeout()).await?;
        tracing::info!("[ReaderHost] Connected to {}", config.cdp_url);
        Ok(Self::with_client(client, reader))
    }

    pub fn with_client(client: Arc<CDPClient>, reader: Reader) -> Self {
        Self {
            client,
            reader,
            tabs: DashMap::new(),
            events: EventBus::new(),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    /// Page targets currently open in the browser
    pub async fn page_targets(&self) -> Result<Vec<TargetId>> {
        let result = self.client.send_request("Target.getTargets", None, None).await?;
        let infos = result["targetInfos"]
            .as_array()
            .ok_or_else(|| HostError::UnexpectedResponse("missing 'targetInfos'".to_string()))?;

        Ok(infos
            .iter()
            .filter(|info| info["type"] == "page")
            .filter_map(|info| info["targetId"].as_str().map(String::from))
            .collect())
    }

    /// Show the reader overlay on a tab
    ///
    /// Returns [`Assembly::AlreadyShown`] when the tab already shows one.
    pub async fn activate(&self, target_id: &str) -> Result<Assembly> {
        let tab = self.tab(target_id).await?;
        let _guard = tab.lock.lock().await;

        let result = self.activate_locked(target_id, &tab).await;
        if let Err(e) = &result {
            tracing::warn!("[ReaderHost] Activation failed on {}: {}", target_id, e);
            self.events.publish(ReaderEvent::Failed {
                target_id: target_id.to_string(),
                error: e.to_string(),
            });
        }
        result
    }

    async fn activate_locked(&self, target_id: &str, tab: &Tab) -> Result<Assembly> {
        let doc = Self::load_document(&tab.session).await?;

        // The page drops the overlay on navigation or in-page close
        if tab.surface.is_claimed() && doc.element_by_id(classes::OVERLAY_ID).is_none() {
            tracing::debug!("[ReaderHost] Releasing stale surface on {}", target_id);
            tab.surface.release();
        }

        let output = match self.reader.assemble(&doc, &SnapshotGeometry, &tab.surface) {
            Assembly::AlreadyShown => {
                tracing::info!("[ReaderHost] Overlay already shown on {}", target_id);
                self.events.publish(ReaderEvent::Skipped {
                    target_id: target_id.to_string(),
                });
                return Ok(Assembly::AlreadyShown);
            }
            Assembly::Assembled(output) => output,
        };

        let inserted: bool = match tab.session.evaluate_as(show_script(&output)?).await {
            Ok(inserted) => inserted,
            Err(e) => {
                tab.surface.release();
                return Err(e.into());
            }
        };

        Ok(Self::finish_activation(&self.events, target_id, inserted, output))
    }

    /// Outcome of the insertion script
    ///
    /// `inserted == false` means an overlay appeared between the snapshot
    /// and insertion; the tab keeps its claimed surface since one is shown.
    fn finish_activation(events: &EventBus, target_id: &str, inserted: bool, output: OutputDocument) -> Assembly {
        if !inserted {
            tracing::info!("[ReaderHost] Overlay already on page {}, insertion skipped", target_id);
            events.publish(ReaderEvent::Skipped {
                target_id: target_id.to_string(),
            });
            return Assembly::AlreadyShown;
        }

        let activation_id = Uuid::now_v7();
        tracing::info!(
            "[ReaderHost] Activated {} on {}: \"{}\" ({} nodes)",
            activation_id,
            target_id,
            output.title,
            output.body.len()
        );
        events.publish(ReaderEvent::Activated {
            target_id: target_id.to_string(),
            activation_id,
            title: output.title.clone(),
            body_nodes: output.body.len(),
        });

        Assembly::Assembled(output)
    }

    /// Remove the overlay and restore page scrolling
    ///
    /// Returns whether an overlay was on the page.
    pub async fn dismiss(&self, target_id: &str) -> Result<bool> {
        let tab = self
            .tabs
            .get(target_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| HostError::TargetNotFound(target_id.to_string()))?;
        let _guard = tab.lock.lock().await;

        let removed: bool = tab.session.evaluate_as(dismiss_script()?).await?;
        tab.surface.release();

        tracing::info!("[ReaderHost] Dismissed overlay on {} (present: {})", target_id, removed);
        self.events.publish(ReaderEvent::Dismissed {
            target_id: target_id.to_string(),
        });
        Ok(removed)
    }

    /// Forget a tab and detach its session
    pub async fn detach(&self, target_id: &str) -> Result<()> {
        let Some((_, tab)) = self.tabs.remove(target_id) else {
            return Ok(());
        };
        self.client
            .send_request(
                "Target.detachFromTarget",
                Some(serde_json::json!({ "sessionId": tab.session.session_id })),
                None,
            )
            .await?;
        Ok(())
    }

    /// Close the browser connection
    pub async fn close(&self) -> Result<()> {
        self.tabs.clear();
        self.client.close().await?;
        Ok(())
    }

    async fn tab(&self, target_id: &str) -> Result<Arc<Tab>> {
        if let Some(tab) = self.tabs.get(target_id) {
            return Ok(Arc::clone(tab.value()));
        }

        let session = match CDPSession::attach(Arc::clone(&self.client), target_id.to_string(), None).await {
            Ok(session) => session,
            Err(CDPError::Protocol { .. }) => return Err(HostError::TargetNotFound(target_id.to_string())),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("[ReaderHost] Attached to {} ({})", target_id, session.url);

        // A concurrent first activation may have attached too; keep one
        let tab = Arc::clone(
            self.tabs
                .entry(target_id.to_string())
                .or_insert_with(|| {
                    Arc::new(Tab {
                        session,
                        surface: LocalSurface::new(),
                        lock: Mutex::new(()),
                    })
                })
                .value(),
        );

        self.events.publish(ReaderEvent::TabAttached {
            target_id: target_id.to_string(),
        });
        Ok(tab)
    }

    /// Source document with layout bounds and natural image sizes merged in
    async fn load_document(session: &CDPSession) -> Result<Document> {
        let mut service = DomService::new();
        service.parse_cdp_dom_tree(&session.get_document().await?)?;

        let ratio = session.device_pixel_ratio().await?;
        let bounds = service.merge_snapshot(&session.capture_snapshot().await?, ratio)?;
        let images = service.merge_natural_sizes(&session.image_natural_sizes().await?)?;
        tracing::debug!(
            nodes = service.arena().len(),
            bounds,
            images,
            "[ReaderHost] Loaded document"
        );

        Ok(Document::from_service(service)?)
    }
}

/// Values handed to the page scripts as a single JSON object
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScriptConfig<'a> {
    overlay_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stylesheet: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlay_html: Option<String>,
}

/// Substitute the script's only placeholder; inserted text is never rescanned
fn render_script(template: &str, config: &ScriptConfig<'_>) -> Result<String> {
    Ok(template.replacen("__CONFIG__", &serde_json::to_string(config)?, 1))
}

/// Insertion script for an assembled document
fn show_script(output: &OutputDocument) -> Result<String> {
    render_script(
        SHOW_SCRIPT,
        &ScriptConfig {
            overlay_id: classes::OVERLAY_ID,
            exit_id: Some(classes::EXIT_BUTTON_ID),
            style_id: Some(STYLE_ID),
            stylesheet: Some(STYLESHEET),
            overlay_html: Some(output.to_html()),
        },
    )
}

fn dismiss_script() -> Result<String> {
    render_script(
        DISMISS_SCRIPT,
        &ScriptConfig {
            overlay_id: classes::OVERLAY_ID,
            exit_id: None,
            style_id: None,
            stylesheet: None,
            overlay_html: None,
        },
    )
}
