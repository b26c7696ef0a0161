use abstutil::Timer;
use anyhow::Result;
use serde::Serialize;

use telemetry::{Engine, Format, QueryResult, Trackpoint};

const NS_PER_SEC: f64 = 1e9;

/// Evenly spaced frames covering a video.
pub struct FrameSchedule {
    fps: f64,
    num_frames: usize,
}

impl FrameSchedule {
    pub fn new(fps: f64, duration_secs: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            bail!("Bad frame rate {fps}");
        }
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            bail!("Bad video duration {duration_secs}");
        }
        Ok(Self {
            fps,
            num_frames: (duration_secs * fps).ceil() as usize,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Nanoseconds from the start of the video to when this frame is shown
    pub fn offset_ns(&self, frame: usize) -> u64 {
        (frame as f64 * NS_PER_SEC / self.fps).round() as u64
    }
}

/// Queries the engine once per frame, in order, and produces CSV for the renderer. Frames without
/// telemetry have blank metric cells.
pub fn render<I: Iterator<Item = Trackpoint>>(
    engine: &mut Engine<I>,
    schedule: &FrameSchedule,
    timer: &mut Timer,
) -> Result<String> {
    let mut out = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        let mut frames_with_data = 0;
        timer.start_iter("query telemetry per frame", schedule.num_frames());
        for frame in 0..schedule.num_frames() {
            timer.next();
            let offset_ns = schedule.offset_ns(frame);
            let result = engine.query_video_offset(offset_ns)?;
            if result.data_available() {
                frames_with_data += 1;
            }
            writer.serialize(FrameRow::new(frame, offset_ns, &result))?;
        }
        writer.flush()?;
        info!(
            "{} of {} frames have telemetry",
            abstutil::prettyprint_usize(frames_with_data),
            abstutil::prettyprint_usize(schedule.num_frames())
        );
    }
    let out = String::from_utf8(out)?;
    Ok(out)
}

#[derive(Serialize)]
struct FrameRow {
    frame: usize,
    video_offset_ns: u64,
    time: String,
    data_available: bool,
    input_format: Format,
    elevation_m: Option<f64>,
    distance_m: Option<f64>,
    speed_mps: Option<f64>,
    grade: Option<f64>,
    cadence: Option<f64>,
    climb_m: f64,
    descent_m: f64,
}

impl FrameRow {
    fn new(frame: usize, video_offset_ns: u64, result: &QueryResult) -> Self {
        let metrics = result.metrics.as_ref();
        Self {
            frame,
            video_offset_ns,
            time: result.time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            data_available: result.data_available(),
            input_format: result.input_format,
            elevation_m: metrics.map(|m| m.elevation),
            distance_m: metrics.map(|m| m.distance_traveled.inner_meters()),
            speed_mps: metrics.map(|m| m.speed.inner_meters_per_second()),
            grade: metrics.map(|m| m.grade),
            cadence: metrics.and_then(|m| m.cadence),
            climb_m: result.climb,
            descent_m: result.descent,
        }
    }
}
