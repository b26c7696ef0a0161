#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod frames;

use abstutil::Timer;
use anyhow::Result;
use geom::UnitFmt;
use structopt::StructOpt;

use telemetry::{Engine, Format, Trackpoint, VideoClock};

use self::frames::FrameSchedule;

#[derive(StructOpt)]
struct Args {
    /// The path to a CSV file of trackpoints already extracted from a GPX or TCX file
    #[structopt(long)]
    trackpoints: String,
    /// gpx or tcx. Guessed from the trackpoints filename by default.
    #[structopt(long)]
    format: Option<Format>,
    /// When the video started recording, as YYYY-MM-DDTHH:MM:SS[Z], in UTC
    #[structopt(long)]
    video_start: String,
    /// Frames per second of the video
    #[structopt(long, default_value = "30")]
    fps: f64,
    /// Length of the video in seconds
    #[structopt(long)]
    duration: f64,
    /// Where to write one CSV row per frame. Defaults to STDOUT.
    #[structopt(long)]
    output: Option<String>,
}

impl Args {
    fn load(&self) -> Result<Engine<std::vec::IntoIter<Trackpoint>>> {
        let format = match self.format {
            Some(format) => format,
            None => match Format::from_path(&self.trackpoints) {
                Some(format) => format,
                None => bail!(
                    "Can't tell the format of {}; pass --format gpx or --format tcx",
                    self.trackpoints
                ),
            },
        };
        let clock = VideoClock::parse(&self.video_start)?;
        let points = telemetry::records::load(fs_err::File::open(&self.trackpoints)?, format)?;
        info!(
            "Loaded {} {} trackpoints from {}",
            abstutil::prettyprint_usize(points.len()),
            format,
            self.trackpoints
        );
        Ok(Engine::new(format, points, clock)?)
    }
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());
    let schedule = FrameSchedule::new(args.fps, args.duration)?;
    let mut engine = args.load()?;

    let mut timer = Timer::new("overlay telemetry");
    let csv = frames::render(&mut engine, &schedule, &mut timer)?;
    match args.output {
        Some(path) => {
            fs_err::write(&path, csv)?;
            info!("Wrote {}", path);
        }
        None => {
            print!("{}", csv);
        }
    }

    let totals = engine.totals();
    let unit_fmt = UnitFmt::metric();
    info!(
        "Covered {}, climbing {}m and descending {}m",
        totals.prior_distance.to_string(&unit_fmt),
        totals.climb.round(),
        totals.descent.round()
    );
    Ok(())
}
