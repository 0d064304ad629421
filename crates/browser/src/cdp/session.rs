//! CDP Session - Represents a connection to a specific page target
//!
//! Design: Lightweight wrapper around CDPClient with target-specific context.
//! All sessions share the same WebSocket - no per-session connection overhead.

use dom::NaturalSize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

use super::client::{CDPClient, CDPError, Result};
use super::protocol::{AttachToTargetResult, EvaluateResult, SessionId, TargetId, TargetInfo};

/// Domains the reader host needs on every page
pub const DEFAULT_DOMAINS: &[&str] = &["Page", "DOM", "DOMSnapshot", "Runtime"];

const NATURAL_SIZES_SCRIPT: &str =
    "Array.from(document.images).map(img => [img.naturalWidth, img.naturalHeight])";

/// CDP Session bound to a specific target
#[derive(Clone)]
pub struct CDPSession {
    /// Shared CDP client
    client: Arc<CDPClient>,

    /// Target this session is attached to
    pub target_id: TargetId,

    /// Session ID assigned by Chrome
    pub session_id: SessionId,

    /// Cached target info
    pub title: String,
    pub url: String,
}

impl CDPSession {
    /// Attach to a target and create session
    pub async fn attach(
        client: Arc<CDPClient>,
        target_id: TargetId,
        domains: Option<Vec<&str>>,
    ) -> Result<Self> {
        let result = client
            .send_request(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true,
                })),
                None,
            )
            .await?;

        let attach_result: AttachToTargetResult = serde_json::from_value(result)?;
        let session_id = attach_result.session_id;

        let domains = domains.unwrap_or_else(|| DEFAULT_DOMAINS.to_vec());

        // Enable all domains in parallel
        let enable_futures: Vec<_> = domains
            .into_iter()
            .map(|domain| {
                let client = client.clone();
                let session_id = session_id.clone();
                async move {
                    client
                        .send_request(format!("{}.enable", domain), None, Some(session_id))
                        .await
                }
            })
            .collect();

        // Wait for all enables (ignore individual failures)
        let results = futures_util::future::join_all(enable_futures).await;
        let failures = results.iter().filter(|r| r.is_err()).count();
        if failures > 0 {
            tracing::warn!(
                "[CDPSession] Some domain enables failed: {}/{}",
                failures,
                results.len()
            );
        }

        let info_result = client
            .send_request(
                "Target.getTargetInfo",
                Some(json!({ "targetId": &target_id })),
                None,
            )
            .await?;

        let target_info: TargetInfo = serde_json::from_value(info_result["targetInfo"].clone())?;

        Ok(Self {
            client,
            target_id,
            session_id,
            title: target_info.title,
            url: target_info.url,
        })
    }

    /// Send command within this session's context
    pub async fn send(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        self.client
            .send_request(method, params, Some(self.session_id.clone()))
            .await
    }

    /// Get current target info
    pub async fn get_target_info(&self) -> Result<TargetInfo> {
        let result = self
            .client
            .send_request(
                "Target.getTargetInfo",
                Some(json!({ "targetId": &self.target_id })),
                None,
            )
            .await?;

        Ok(serde_json::from_value(result["targetInfo"].clone())?)
    }

    /// Navigate to URL
    pub async fn navigate(&self, url: impl Into<String>) -> Result<Value> {
        self.send("Page.navigate", Some(json!({ "url": url.into() })))
            .await
    }

    /// Full document tree (`DOM.getDocument`), without frames or shadow roots
    pub async fn get_document(&self) -> Result<Value> {
        let result = self
            .send("DOM.getDocument", Some(json!({ "depth": -1, "pierce": false })))
            .await?;

        if result.get("root").is_none() {
            return Err(CDPError::InvalidResponse {
                method: "DOM.getDocument".to_string(),
                reason: "missing 'root'".to_string(),
            });
        }
        Ok(result)
    }

    /// Layout snapshot (`DOMSnapshot.captureSnapshot`) with bounds only
    pub async fn capture_snapshot(&self) -> Result<Value> {
        self.send(
            "DOMSnapshot.captureSnapshot",
            Some(json!({ "computedStyles": [] })),
        )
        .await
    }

    pub async fn device_pixel_ratio(&self) -> Result<f64> {
        self.evaluate_as("window.devicePixelRatio").await
    }

    /// Natural sizes of `document.images`, in document order
    pub async fn image_natural_sizes(&self) -> Result<Vec<NaturalSize>> {
        let pairs: Vec<(f64, f64)> = self.evaluate_as(NATURAL_SIZES_SCRIPT).await?;
        Ok(pairs
            .into_iter()
            .map(|(width, height)| NaturalSize::new(width, height))
            .collect())
    }

    /// Evaluate JavaScript and return the value by value
    ///
    /// A thrown exception is reported as an error, not as a value.
    pub async fn evaluate(&self, expression: impl Into<String>) -> Result<Value> {
        let result = self
            .send(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression.into(),
                    "returnByValue": true,
                })),
            )
            .await?;

        let result: EvaluateResult = serde_json::from_value(result)?;
        if let Some(exception) = result.exception_details {
            return Err(CDPError::InvalidResponse {
                method: "Runtime.evaluate".to_string(),
                reason: exception.text,
            });
        }

        Ok(result.result.value.unwrap_or(Value::Null))
    }

    /// Evaluate and deserialize the returned value
    pub async fn evaluate_as<T: DeserializeOwned>(&self, expression: impl Into<String>) -> Result<T> {
        let value = self.evaluate(expression).await?;
        Ok(serde_json::from_value(value)?)
    }
}
