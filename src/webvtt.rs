//! WebVTT subtitle segment writer (spec §6): header, blank line, then
//! per-cue timing/settings/text blocks. Mirrors [`crate::cmaf::writer`]'s
//! accumulate-then-emit ergonomics for a text track instead of fMP4.

use std::sync::Arc;
use tokio::sync::Mutex;

/// `align:` cue setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
    Left,
    Right,
}

impl Align {
    fn as_str(self) -> &'static str {
        match self {
            Align::Start => "start",
            Align::Center => "center",
            Align::End => "end",
            Align::Left => "left",
            Align::Right => "right",
        }
    }
}

/// One subtitle cue.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub position: Option<u32>,
    pub align: Option<Align>,
}

impl Cue {
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self { start_ms, end_ms, text: text.into(), position: None, align: None }
    }
}

fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1_000) % 60;
    let millis = ms % 1_000;
    if hours == 0 {
        format!("{minutes:02}:{seconds:02}.{millis:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    }
}

fn format_cue(cue: &Cue) -> String {
    let mut line = format!("{} --> {}", format_timestamp(cue.start_ms), format_timestamp(cue.end_ms));
    if let Some(position) = cue.position {
        line.push_str(&format!(" position:{position}%"));
    }
    if let Some(align) = cue.align {
        line.push_str(&format!(" align:{}", align.as_str()));
    }
    format!("{line}\n{}\n", cue.text)
}

/// Renders a standalone WebVTT segment from a fixed cue list.
pub fn render_segment(cues: &[Cue]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for cue in cues {
        out.push_str(&format_cue(cue));
        out.push('\n');
    }
    out
}

/// Actor-style live writer: cues accumulate across calls to `write_cues`
/// until `new_segment` renders and clears the buffer, mirroring a
/// segmenter's ingest/emit cycle for a text track.
#[derive(Clone)]
pub struct WebVttWriter {
    buffer: Arc<Mutex<Vec<Cue>>>,
}

impl WebVttWriter {
    pub fn new() -> Self {
        Self { buffer: Arc::new(Mutex::new(Vec::new())) }
    }

    pub async fn write_cues(&self, cues: Vec<Cue>) {
        self.buffer.lock().await.extend(cues);
    }

    /// Renders the buffered cues as one WebVTT segment and clears the
    /// buffer for the next one.
    pub async fn new_segment(&self) -> String {
        let mut buffer = self.buffer.lock().await;
        let rendered = render_segment(&buffer);
        buffer.clear();
        rendered
    }
}

impl Default for WebVttWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_timestamp_without_hours_when_zero() {
        assert_eq!(format_timestamp(65_432), "01:05.432");
        assert_eq!(format_timestamp(3_665_000), "01:01:05.000");
    }

    #[test]
    fn renders_header_blank_line_and_cue_settings() {
        let mut cue = Cue::new(1_000, 4_500, "Hello");
        cue.position = Some(50);
        cue.align = Some(Align::Center);
        let rendered = render_segment(&[cue]);
        assert!(rendered.starts_with("WEBVTT\n\n"));
        assert!(rendered.contains("00:01.000 --> 00:04.500 position:50% align:center"));
        assert!(rendered.contains("Hello"));
    }

    #[tokio::test]
    async fn new_segment_clears_buffer() {
        let writer = WebVttWriter::new();
        writer.write_cues(vec![Cue::new(0, 1000, "a")]).await;
        let first = writer.new_segment().await;
        assert!(first.contains("a"));
        let second = writer.new_segment().await;
        assert_eq!(second, "WEBVTT\n\n");
    }
}
