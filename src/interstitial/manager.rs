//! Ad-break ("interstitial") semantics layered over [`super::daterange`]:
//! asset references, playback restrictions, skip control, and SCTE-35
//! carriage, rendered as `EXT-X-DATERANGE:CLASS="com.apple.hls.interstitial"`
//! lines (spec §4.9).

use super::daterange::DateRangeManager;
use crate::manifest::generator::format_daterange;
use crate::manifest::model::DateRange;

const INTERSTITIAL_CLASS: &str = "com.apple.hls.interstitial";

/// Ad-specific attributes for one interstitial. Exactly one of
/// `asset_uri`/`asset_list_uri` is normally set.
#[derive(Debug, Clone, Default)]
pub struct InterstitialOptions {
    pub asset_uri: Option<String>,
    pub asset_list_uri: Option<String>,
    pub restrict_jump: bool,
    pub restrict_skip: bool,
    pub resume_offset: Option<f64>,
    pub playout_limit: Option<f64>,
    pub snap_in: bool,
    pub snap_out: bool,
    pub scte35_cmd: Option<String>,
    pub scte35_out: Option<String>,
    pub scte35_in: Option<String>,
}

impl InterstitialOptions {
    fn into_custom_attributes(self) -> (Vec<(String, String)>, Option<String>, Option<String>, Option<String>) {
        let mut attrs = Vec::new();
        if let Some(uri) = &self.asset_uri {
            attrs.push(("X-ASSET-URI".to_string(), uri.clone()));
        }
        if let Some(uri) = &self.asset_list_uri {
            attrs.push(("X-ASSET-LIST".to_string(), uri.clone()));
        }
        let mut restrict = Vec::new();
        if self.restrict_jump {
            restrict.push("JUMP");
        }
        if self.restrict_skip {
            restrict.push("SKIP");
        }
        if !restrict.is_empty() {
            attrs.push(("X-RESTRICT".to_string(), restrict.join(",")));
        }
        if let Some(offset) = self.resume_offset {
            attrs.push(("X-RESUME-OFFSET".to_string(), format!("{offset}")));
        }
        if let Some(limit) = self.playout_limit {
            attrs.push(("X-PLAYOUT-LIMIT".to_string(), format!("{limit}")));
        }
        let mut snap = Vec::new();
        if self.snap_in {
            snap.push("IN");
        }
        if self.snap_out {
            snap.push("OUT");
        }
        if !snap.is_empty() {
            attrs.push(("X-SNAP".to_string(), snap.join(",")));
        }
        (attrs, self.scte35_cmd, self.scte35_out, self.scte35_in)
    }
}

/// Actor-style handle; cloning shares the same underlying set of
/// interstitials. Invariants: ids unique, insertion order preserved,
/// completed ids are a subset of known ids (inherited from
/// [`DateRangeManager`]).
#[derive(Clone)]
pub struct InterstitialManager {
    date_ranges: DateRangeManager,
}

impl InterstitialManager {
    pub fn new() -> Self {
        Self { date_ranges: DateRangeManager::new() }
    }

    pub async fn schedule(
        &self,
        id: impl Into<String>,
        start_date: impl Into<String>,
        planned_duration: Option<f64>,
        options: InterstitialOptions,
    ) -> bool {
        let id = id.into();
        let (custom_attrs, scte35_cmd, scte35_out, scte35_in) = options.into_custom_attributes();
        let scheduled = self
            .date_ranges
            .open_with_scte35(
                id.clone(),
                start_date,
                Some(INTERSTITIAL_CLASS.to_string()),
                planned_duration,
                custom_attrs,
                scte35_cmd,
                scte35_out,
                scte35_in,
            )
            .await;
        if scheduled {
            tracing::info!(%id, "interstitial scheduled");
        } else {
            tracing::warn!(%id, "interstitial schedule rejected: duplicate id");
        }
        scheduled
    }

    pub async fn close(&self, id: &str, end_date: impl Into<String>, duration: Option<f64>) -> bool {
        let closed = self.date_ranges.close(id, end_date, duration).await;
        if closed {
            tracing::info!(%id, "interstitial closed");
        }
        closed
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.date_ranges.remove(id).await
    }

    pub async fn get(&self, id: &str) -> Option<DateRange> {
        self.date_ranges.get(id).await
    }

    /// Rendered `EXT-X-DATERANGE` lines for every scheduled interstitial,
    /// insertion order preserved.
    pub async fn render_lines(&self) -> Vec<String> {
        self.date_ranges.all().await.iter().map(format_daterange).collect()
    }
}

impl Default for InterstitialManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_interstitial_class_and_asset_uri() {
        let manager = InterstitialManager::new();
        let options = InterstitialOptions { asset_uri: Some("https://ads.example/break1.m3u8".to_string()), restrict_jump: true, ..Default::default() };
        manager.schedule("ad-1", "2026-01-01T00:00:00.000Z", Some(30.0), options).await;
        let lines = manager.render_lines().await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("CLASS=\"com.apple.hls.interstitial\""));
        assert!(lines[0].contains("X-ASSET-URI=\"https://ads.example/break1.m3u8\""));
        assert!(lines[0].contains("X-RESTRICT=\"JUMP\""));
    }

    #[tokio::test]
    async fn close_fixes_duration_and_remove_deletes() {
        let manager = InterstitialManager::new();
        manager.schedule("ad-1", "2026-01-01T00:00:00.000Z", None, InterstitialOptions::default()).await;
        assert!(manager.close("ad-1", "2026-01-01T00:00:30.000Z", Some(30.0)).await);
        assert_eq!(manager.get("ad-1").await.unwrap().duration, Some(30.0));
        assert!(manager.remove("ad-1").await);
        assert!(manager.get("ad-1").await.is_none());
    }
}
