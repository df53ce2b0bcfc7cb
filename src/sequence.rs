//! Motion sequence text format.
//!
//! Export (bit-exact, what the recorder writes):
//!
//! ```text
//! {
//!   {  10,  20,  30,  40,  50,   2000 },
//!   { 350,   0,   0,   0,   0,   1000 }
//! };
//! ```
//!
//! Import is lenient: the export format, or bare CSV
//! `base,arm1X,arm1Z,arm2X,arm2Z,duration` per line, with or without braces and
//! trailing commas. Each field contributes its first `-?\d+` token.

use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use regex::Regex;

use crate::joint::JointType;

/// Duration used when a line has no positive duration field.
pub const DEFAULT_DURATION_MS: u32 = 1000;

/// One pose of the five recorded joints plus how long to hold it.
///
/// Angles are calibrated integer degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedFrame {
    pub base: i32,
    pub arm1_x: i32,
    pub arm1_z: i32,
    pub arm2_x: i32,
    pub arm2_z: i32,
    pub duration_ms: u32,
}

impl RecordedFrame {
    /// Build from angles in [`JointType::RECORDED`] order.
    pub fn from_angles(angles: [i32; 5], duration_ms: u32) -> Self {
        let [base, arm1_x, arm1_z, arm2_x, arm2_z] = angles;
        Self {
            base,
            arm1_x,
            arm1_z,
            arm2_x,
            arm2_z,
            duration_ms,
        }
    }

    /// Angles in [`JointType::RECORDED`] order.
    pub fn angles(&self) -> [i32; 5] {
        [
            self.base,
            self.arm1_x,
            self.arm1_z,
            self.arm2_x,
            self.arm2_z,
        ]
    }

    /// `(joint, calibrated angle)` pairs in file order.
    pub fn joint_angles(&self) -> impl Iterator<Item = (JointType, i32)> {
        JointType::RECORDED.into_iter().zip(self.angles())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.duration_ms))
    }
}

fn integer_token() -> &'static Regex {
    static INTEGER: OnceLock<Regex> = OnceLock::new();
    INTEGER.get_or_init(|| Regex::new(r"-?\d+").expect("integer pattern is valid"))
}

/// First integer token of a field, if any.
fn field_value(field: &str) -> Option<i64> {
    integer_token()
        .find(field)
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

fn parse_line(line: &str) -> Option<RecordedFrame> {
    let line = line.trim();
    let line = line.strip_suffix(',').unwrap_or(line);
    let fields: Vec<Option<i64>> = line.split(',').map(field_value).collect();

    let mut angles = [0i32; 5];
    let mut found = false;
    for (slot, field) in angles.iter_mut().zip(fields.iter().chain(std::iter::repeat(&None))) {
        if let Some(value) = field {
            *slot = (*value).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
            found = true;
        }
    }
    if !found {
        return None;
    }

    let duration_ms = match fields.get(5).copied().flatten() {
        Some(d) if d > 0 => d.min(i64::from(u32::MAX)) as u32,
        _ => DEFAULT_DURATION_MS,
    };
    Some(RecordedFrame::from_angles(angles, duration_ms))
}

/// Parse sequence text. Lines without any numeric angle field are dropped.
pub fn parse_sequence(text: &str) -> Vec<RecordedFrame> {
    let cleaned = text.replace(['{', '}'], "");
    let mut frames = Vec::new();
    for (n, line) in cleaned.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(frame) => frames.push(frame),
            None => tracing::debug!("Dropping sequence line {}: {:?}", n + 1, line.trim()),
        }
    }
    frames
}

/// Render frames in the export format.
pub fn format_sequence(frames: &[RecordedFrame]) -> String {
    let mut out = String::from("{\n");
    for (i, f) in frames.iter().enumerate() {
        out.push_str(&format!(
            "  {{ {:>3}, {:>3}, {:>3}, {:>3}, {:>3}, {:>6} }}",
            f.base, f.arm1_x, f.arm1_z, f.arm2_x, f.arm2_z, f.duration_ms
        ));
        if i + 1 < frames.len() {
            out.push_str(",\n");
        } else {
            out.push('\n');
        }
    }
    out.push_str("};");
    out
}

/// `robot_motion_YYYY-MM-DDTHH-MM-SS-mmmZ.txt` for the given instant.
///
/// The UTC ISO-8601 timestamp with `:` and `.` replaced by `-`, so the name is
/// safe on every filesystem.
pub fn export_file_name(at: SystemTime) -> String {
    let since_epoch = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs();
    let days = secs / 86400;
    let time_of_day = secs % 86400;
    let (year, month, day) = civil_from_days(days as i64);
    format!(
        "robot_motion_{:04}-{:02}-{:02}T{:02}-{:02}-{:02}-{:03}Z.txt",
        year,
        month,
        day,
        time_of_day / 3600,
        (time_of_day % 3600) / 60,
        time_of_day % 60,
        since_epoch.subsec_millis()
    )
}

fn is_leap(year: i64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Days since 1970-01-01 → (year, month, day).
fn civil_from_days(mut days: i64) -> (i64, u32, i64) {
    let mut year = 1970;
    loop {
        let in_year = if is_leap(year) { 366 } else { 365 };
        if days < in_year {
            break;
        }
        days -= in_year;
        year += 1;
    }
    let month_lengths = [
        31,
        if is_leap(year) { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    let mut month = 1;
    for len in month_lengths {
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }
    (year, month, days + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_braced_upload() {
        let frames = parse_sequence("{ 10, 20, 30, 40, 50, 2000 },\n{ 350, 0, 0, 0, 0, 1000 }");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], RecordedFrame::from_angles([10, 20, 30, 40, 50], 2000));
        assert_eq!(frames[1].base, 350);
        assert_eq!(frames[1].duration_ms, 1000);
    }

    #[test]
    fn test_parse_csv() {
        let frames = parse_sequence("90,45,0,30,0,1500\n180,10,20,30,40\n\n  \n0,0,0,0,0,750,\n");
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].duration_ms, 1500);
        // Missing duration defaults to one second.
        assert_eq!(frames[1], RecordedFrame::from_angles([180, 10, 20, 30, 40], 1000));
        assert_eq!(frames[2].duration_ms, 750);
    }

    #[test]
    fn test_parse_missing_and_garbage_fields() {
        let frames = parse_sequence("12, abc, x7y, 3\n");
        assert_eq!(frames, [RecordedFrame::from_angles([12, 0, 7, 3, 0], 1000)]);
    }

    #[test]
    fn test_parse_negative_values() {
        let frames = parse_sequence("-15, 20, -1, 0, 0, -200");
        assert_eq!(frames[0].base, -15);
        assert_eq!(frames[0].arm1_z, -1);
        assert_eq!(frames[0].duration_ms, 1000);
    }

    #[test]
    fn test_zero_duration_defaults() {
        let frames = parse_sequence("1,2,3,4,5,0");
        assert_eq!(frames[0].duration_ms, 1000);
    }

    #[test]
    fn test_lines_without_numbers_dropped() {
        let text = "base,shoulderX,shoulderZ,elbowX,elbowZ,duration\n\
                    1,2,3,4,5,6000\n\
                    ;\n\
                    garbage line\n";
        let frames = parse_sequence(text);
        assert_eq!(frames, [RecordedFrame::from_angles([1, 2, 3, 4, 5], 6000)]);
    }

    #[test]
    fn test_format_exact() {
        let frames = [
            RecordedFrame::from_angles([10, 20, 30, 40, 50], 2000),
            RecordedFrame::from_angles([350, 0, 0, 0, 0], 1000),
        ];
        let expected = "{\n  {  10,  20,  30,  40,  50,   2000 },\n  { 350,   0,   0,   0,   0,   1000 }\n};";
        assert_eq!(format_sequence(&frames), expected);
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_sequence(&[]), "{\n};");
        assert!(parse_sequence(&format_sequence(&[])).is_empty());
    }

    #[test]
    fn test_export_import_round_trip() {
        let frames: Vec<RecordedFrame> = (0..25)
            .map(|i| {
                RecordedFrame::from_angles(
                    [i * 14 % 360, 359 - i, i, (i * 37) % 360, 0],
                    1000 + (i as u32) * 123,
                )
            })
            .collect();
        let text = format_sequence(&frames);
        assert_eq!(parse_sequence(&text), frames);
    }

    #[test]
    fn test_export_file_name() {
        // 2024-02-29T13:05:09.042Z
        let at = UNIX_EPOCH + Duration::from_millis(1_709_211_909_042);
        assert_eq!(export_file_name(at), "robot_motion_2024-02-29T13-05-09-042Z.txt");
        assert_eq!(
            export_file_name(UNIX_EPOCH),
            "robot_motion_1970-01-01T00-00-00-000Z.txt"
        );
        let end_of_year = UNIX_EPOCH + Duration::from_secs(1_735_689_599);
        assert_eq!(
            export_file_name(end_of_year),
            "robot_motion_2024-12-31T23-59-59-000Z.txt"
        );
    }
}
