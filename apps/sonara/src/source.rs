//! # Landmark Sources
//!
//! Where detector frames and user controls come from.
//!
//! ## Wire format
//!
//! One JSON value per line:
//!
//! ```text
//! {"timestamp_ms": 1234, "hands": [{"handedness": "Right", "score": 0.97,
//!   "landmarks": [{"x": 0.51, "y": 0.62, "z": -0.03}, ... 21 points]}]}
//! {"control": "pause"}
//! {"key": "q"}
//! ```
//!
//! A frame may carry `"error"` when the detector failed on that camera frame.
//! Bare key lines (`p`, `r`, `s`, `q`) are accepted too, so a person can
//! steer a session by typing into stdin. Blank lines are ignored. Lines
//! that cannot be used are logged and skipped; they never end a session.

use serde::{Deserialize, Serialize};
use sonara_core::{Frame, Hand, Landmark, SonaraError};
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver};

use crate::config::DetectorConfig;

/// Maximum length of one input line (256 KiB).
pub const MAX_LINE_LENGTH: usize = 256 * 1024;

/// Maximum number of hands accepted in one frame message.
pub const MAX_MESSAGE_HANDS: usize = 8;

/// Line a detector prints once it is ready to stream frames.
pub const READY_LINE: &str = "READY";

// =============================================================================
// EVENTS
// =============================================================================

/// A user command, normally bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Toggle pause (`p`).
    Pause,
    /// Discard the current session and start over (`r`).
    Reset,
    /// Show statistics (`s`).
    Stats,
    /// End the session (`q`).
    Quit,
}

impl Control {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Control::Pause => "pause",
            Control::Reset => "reset",
            Control::Stats => "stats",
            Control::Quit => "quit",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Control {
    type Err = SonaraError;

    /// Accepts the action name or its key, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Ok(Control::Pause),
            "r" | "reset" => Ok(Control::Reset),
            "s" | "stats" => Ok(Control::Stats),
            "q" | "quit" => Ok(Control::Quit),
            _ => Err(SonaraError::InvalidControl(format!(
                "unknown control '{}' (expected pause, reset, stats or quit)",
                s.trim()
            ))),
        }
    }
}

/// One item read from a source.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Frame(Frame),
    Control(Control),
}

// =============================================================================
// WIRE TYPES
// =============================================================================

fn default_score() -> f32 {
    1.0
}

/// One hand as the detector reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandMessage {
    /// `"Left"` or `"Right"`.
    pub handedness: String,
    #[serde(default = "default_score")]
    pub score: f32,
    pub landmarks: Vec<Landmark>,
}

impl HandMessage {
    /// Validate and convert to a core [`Hand`].
    pub fn to_hand(&self) -> Result<Hand, SonaraError> {
        let handedness = self.handedness.parse()?;
        if !(0.0..=1.0).contains(&self.score) {
            return Err(SonaraError::InvalidHand(format!(
                "score {} outside 0..=1",
                self.score
            )));
        }
        Hand::from_landmarks(handedness, self.score, &self.landmarks)
    }
}

/// One detector frame on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    #[serde(default)]
    pub hands: Vec<HandMessage>,
    /// Set by the detector when it could not process the camera frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameMessage {
    /// Validate and convert to a core [`Frame`].
    pub fn into_frame(self) -> Result<Frame, SonaraError> {
        if let Some(error) = self.error {
            return Err(SonaraError::Detector(error));
        }
        to_frame(self.timestamp_ms, &self.hands)
    }
}

/// Build a frame from wire hands, enforcing [`MAX_MESSAGE_HANDS`].
pub fn to_frame(timestamp_ms: Option<u64>, hands: &[HandMessage]) -> Result<Frame, SonaraError> {
    if hands.len() > MAX_MESSAGE_HANDS {
        return Err(SonaraError::InvalidFrame(format!(
            "{} hands exceeds maximum {}",
            hands.len(),
            MAX_MESSAGE_HANDS
        )));
    }
    let hands = hands
        .iter()
        .map(HandMessage::to_hand)
        .collect::<Result<Vec<_>, _>>()?;
    let frame = Frame::new(hands);
    Ok(match timestamp_ms {
        Some(ts) => frame.at(ts),
        None => frame,
    })
}

/// Parse one input line. `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<InputEvent>, SonaraError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.len() > MAX_LINE_LENGTH {
        return Err(SonaraError::InvalidFrame(format!(
            "line length {} exceeds maximum {}",
            line.len(),
            MAX_LINE_LENGTH
        )));
    }

    // A bare key typed at a terminal.
    if !line.starts_with('{') {
        return line.parse().map(|c| Some(InputEvent::Control(c)));
    }

    let value: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| SonaraError::InvalidFrame(format!("malformed JSON: {}", e)))?;

    if let Some(action) = value.get("control").or_else(|| value.get("key")) {
        let action = action.as_str().ok_or_else(|| {
            SonaraError::InvalidControl("control must be a string".to_string())
        })?;
        return action.parse().map(|c| Some(InputEvent::Control(c)));
    }

    let message: FrameMessage = serde_json::from_value(value)
        .map_err(|e| SonaraError::InvalidFrame(e.to_string()))?;
    message.into_frame().map(|f| Some(InputEvent::Frame(f)))
}

// =============================================================================
// SOURCE TRAIT
// =============================================================================

/// A stream of frames and controls.
pub trait LandmarkSource {
    /// Next event, or `None` at end of stream.
    fn next_event(&mut self) -> Result<Option<InputEvent>, SonaraError>;
}

// =============================================================================
// JSON LINES
// =============================================================================

/// Reads the JSON-lines format from any buffered reader (a file, stdin, a pipe).
pub struct JsonLinesSource<R> {
    reader: R,
    line_number: u64,
    skipped: u64,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            skipped: 0,
        }
    }

    /// Lines read so far.
    #[must_use]
    pub fn lines_read(&self) -> u64 {
        self.line_number
    }

    /// Lines dropped because they were malformed, oversized or reported an error.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn skip(&mut self, reason: &SonaraError) {
        self.skipped += 1;
        tracing::warn!(line = self.line_number, "Skipping input line: {}", reason);
    }
}

impl<R: BufRead> LandmarkSource for JsonLinesSource<R> {
    fn next_event(&mut self) -> Result<Option<InputEvent>, SonaraError> {
        loop {
            let mut buf = Vec::new();
            let read = (&mut self.reader)
                .take(MAX_LINE_LENGTH as u64 + 1)
                .read_until(b'\n', &mut buf)
                .map_err(|e| SonaraError::Io(format!("Read input: {}", e)))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            if buf.len() > MAX_LINE_LENGTH && buf.last() != Some(&b'\n') {
                self.reader
                    .skip_until(b'\n')
                    .map_err(|e| SonaraError::Io(format!("Read input: {}", e)))?;
                self.skip(&SonaraError::InvalidFrame(format!(
                    "line longer than {} bytes",
                    MAX_LINE_LENGTH
                )));
                continue;
            }

            let parsed = std::str::from_utf8(&buf)
                .map_err(|e| SonaraError::InvalidFrame(format!("invalid UTF-8: {}", e)))
                .and_then(parse_line);
            match parsed {
                Ok(Some(event)) => return Ok(Some(event)),
                Ok(None) => {}
                Err(e) => self.skip(&e),
            }
        }
    }
}

// =============================================================================
// DETECTOR PROCESS
// =============================================================================

/// An external hand-landmark detector running as a child process.
///
/// The process owns the camera. It must print [`READY_LINE`] once its model
/// is loaded, then one frame per line on stdout. Its stderr is passed
/// through. The process is killed when this value is dropped.
pub struct DetectorProcess {
    child: Child,
    lines: JsonLinesSource<BufReader<ChildStdout>>,
}

impl DetectorProcess {
    /// Start the configured detector and wait for it to become ready.
    pub fn spawn(config: &DetectorConfig) -> Result<Self, SonaraError> {
        let command = config
            .command
            .as_deref()
            .ok_or_else(|| SonaraError::Config("no detector command configured".to_string()))?;

        tracing::info!(command, args = ?config.args, "Starting hand detector");

        let mut child = Command::new(command)
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SonaraError::Detector(format!("Failed to start '{}': {}", command, e)))?;

        let Some(stdout) = child.stdout.take() else {
            stop(&mut child);
            return Err(SonaraError::Detector(
                "Detector stdout is not available".to_string(),
            ));
        };
        let mut reader = BufReader::new(stdout);

        let mut ready = String::new();
        let handshake = reader.read_line(&mut ready);
        if handshake.is_err() || ready.trim() != READY_LINE {
            stop(&mut child);
            return Err(SonaraError::Detector(format!(
                "Detector did not signal ready, got: {:?}",
                ready.trim()
            )));
        }

        tracing::info!(pid = child.id(), "Hand detector ready");
        Ok(Self {
            child,
            lines: JsonLinesSource::new(reader),
        })
    }

    /// Lines dropped so far.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.lines.skipped()
    }
}

impl LandmarkSource for DetectorProcess {
    fn next_event(&mut self) -> Result<Option<InputEvent>, SonaraError> {
        let event = self.lines.next_event()?;
        if event.is_none() {
            tracing::warn!("Hand detector closed its output");
        }
        Ok(event)
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        stop(&mut self.child);
        tracing::debug!("Hand detector stopped");
    }
}

fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

// =============================================================================
// KEYBOARD CONTROLS
// =============================================================================

/// Frames from one source, controls typed on stdin.
///
/// Pending controls are delivered before the next frame.
pub struct WithKeyboard<S> {
    frames: S,
    controls: Receiver<Control>,
}

impl<S: LandmarkSource> WithKeyboard<S> {
    /// Wrap `frames`, reading control keys from stdin on a background thread.
    pub fn stdin(frames: S) -> Self {
        let (tx, controls) = mpsc::channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match parse_line(&line) {
                    Ok(Some(InputEvent::Control(control))) => {
                        if tx.send(control).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Ignoring keyboard input: {}", e),
                }
            }
        });
        Self::new(frames, controls)
    }

    pub fn new(frames: S, controls: Receiver<Control>) -> Self {
        Self { frames, controls }
    }
}

impl<S: LandmarkSource> LandmarkSource for WithKeyboard<S> {
    fn next_event(&mut self) -> Result<Option<InputEvent>, SonaraError> {
        if let Ok(control) = self.controls.try_recv() {
            return Ok(Some(InputEvent::Control(control)));
        }
        self.frames.next_event()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sonara_core::{Handedness, primitives::LANDMARK_COUNT};
    use std::io::Cursor;

    fn hand_json(handedness: &str, points: usize) -> String {
        let landmarks = vec![r#"{"x":0.5,"y":0.5,"z":0.0}"#; points].join(",");
        format!(
            r#"{{"handedness":"{}","score":0.9,"landmarks":[{}]}}"#,
            handedness, landmarks
        )
    }

    fn source(text: &str) -> JsonLinesSource<Cursor<Vec<u8>>> {
        JsonLinesSource::new(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn control_names_and_keys() {
        assert_eq!("p".parse::<Control>().expect("p"), Control::Pause);
        assert_eq!("P".parse::<Control>().expect("P"), Control::Pause);
        assert_eq!("Reset".parse::<Control>().expect("reset"), Control::Reset);
        assert_eq!(" s ".parse::<Control>().expect("s"), Control::Stats);
        assert_eq!("quit".parse::<Control>().expect("quit"), Control::Quit);
        assert!(matches!(
            "x".parse::<Control>(),
            Err(SonaraError::InvalidControl(_))
        ));
    }

    #[test]
    fn parse_frame_line() {
        let line = format!(
            r#"{{"timestamp_ms":1500,"hands":[{}]}}"#,
            hand_json("Right", LANDMARK_COUNT)
        );
        let Some(InputEvent::Frame(frame)) = parse_line(&line).expect("frame") else {
            unreachable!("expected a frame");
        };
        assert_eq!(frame.timestamp_ms, Some(1500));
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].handedness, Handedness::Right);
    }

    #[test]
    fn parse_control_lines() {
        for (line, expected) in [
            (r#"{"control":"pause"}"#, Control::Pause),
            (r#"{"key":"q"}"#, Control::Quit),
            ("r", Control::Reset),
        ] {
            assert_eq!(
                parse_line(line).expect(line),
                Some(InputEvent::Control(expected))
            );
        }
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(parse_line("   ").expect("blank"), None);
        assert!(matches!(
            parse_line("{nope"),
            Err(SonaraError::InvalidFrame(_))
        ));
        assert!(matches!(
            parse_line(&format!(r#"{{"hands":[{}]}}"#, hand_json("Right", 20))),
            Err(SonaraError::InvalidHand(_))
        ));
        assert!(matches!(
            parse_line(&format!(r#"{{"hands":[{}]}}"#, hand_json("Middle", 21))),
            Err(SonaraError::InvalidHand(_))
        ));
        assert!(matches!(
            parse_line(r#"{"hands":[],"error":"camera unplugged"}"#),
            Err(SonaraError::Detector(_))
        ));
        assert!(matches!(
            parse_line(r#"{"frames":[]}"#),
            Err(SonaraError::InvalidFrame(_))
        ));
        assert!(matches!(
            parse_line(r#"{"control":3}"#),
            Err(SonaraError::InvalidControl(_))
        ));
    }

    #[test]
    fn too_many_hands_rejected() {
        let hands = vec![hand_json("Left", LANDMARK_COUNT); MAX_MESSAGE_HANDS + 1].join(",");
        assert!(matches!(
            parse_line(&format!(r#"{{"hands":[{}]}}"#, hands)),
            Err(SonaraError::InvalidFrame(_))
        ));
    }

    #[test]
    fn json_lines_skip_bad_lines() {
        let text = format!(
            "{}\n\nnot json at all\n{{\"hands\":[]}}\n{{\"control\":\"stats\"}}\n",
            r#"{"hands":[],"timestamp_ms":10}"#
        );
        let mut src = source(&text);

        assert_eq!(
            src.next_event().expect("read"),
            Some(InputEvent::Frame(Frame::empty().at(10)))
        );
        assert_eq!(
            src.next_event().expect("read"),
            Some(InputEvent::Frame(Frame::empty()))
        );
        assert_eq!(
            src.next_event().expect("read"),
            Some(InputEvent::Control(Control::Stats))
        );
        assert_eq!(src.next_event().expect("read"), None);
        assert_eq!(src.lines_read(), 5);
        assert_eq!(src.skipped(), 1);
    }

    #[test]
    fn oversized_line_is_skipped_and_stream_continues() {
        let mut text = "x".repeat(MAX_LINE_LENGTH + 10);
        text.push('\n');
        text.push_str("q\n");
        let mut src = source(&text);

        assert_eq!(
            src.next_event().expect("read"),
            Some(InputEvent::Control(Control::Quit))
        );
        assert_eq!(src.skipped(), 1);
    }

    #[test]
    fn keyboard_controls_come_before_frames() {
        let (tx, rx) = mpsc::channel();
        let mut src = WithKeyboard::new(source("{\"hands\":[]}\n"), rx);
        tx.send(Control::Pause).expect("send");

        assert_eq!(
            src.next_event().expect("read"),
            Some(InputEvent::Control(Control::Pause))
        );
        assert_eq!(
            src.next_event().expect("read"),
            Some(InputEvent::Frame(Frame::empty()))
        );
        assert_eq!(src.next_event().expect("read"), None);
    }

    #[test]
    fn missing_detector_command_is_config_error() {
        let err = DetectorProcess::spawn(&DetectorConfig::default())
            .err()
            .expect("no command");
        assert!(matches!(err, SonaraError::Config(_)));
    }

    #[cfg(unix)]
    #[test]
    fn detector_handshake_and_frames() {
        let config = DetectorConfig {
            command: Some("sh".to_string()),
            args: vec![
                "-c".to_string(),
                r#"echo READY; echo '{"timestamp_ms":5,"hands":[]}'"#.to_string(),
            ],
        };
        let mut detector = DetectorProcess::spawn(&config).expect("spawn");
        assert_eq!(
            detector.next_event().expect("read"),
            Some(InputEvent::Frame(Frame::empty().at(5)))
        );
        assert_eq!(detector.next_event().expect("read"), None);
        assert_eq!(detector.skipped(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn detector_without_ready_line_fails() {
        let config = DetectorConfig {
            command: Some("sh".to_string()),
            args: vec!["-c".to_string(), "echo loading".to_string()],
        };
        let err = DetectorProcess::spawn(&config).err().expect("no handshake");
        assert!(matches!(err, SonaraError::Detector(_)));
    }
}
