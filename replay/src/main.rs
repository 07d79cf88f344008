#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod input;
mod sink;

use std::time::Instant;

use anyhow::Result;
use futures_channel::mpsc::UnboundedReceiver;
use geom::Duration;
use structopt::StructOpt;

use model::{Command, PlaybackConfig, PositionSink, Session};

use self::input::Input;
use self::sink::TerminalSink;

#[derive(StructOpt)]
struct Args {
    /// A .csv or .txt file of lat,lng,timestamp records to load at startup
    #[structopt(long)]
    input: Option<String>,
    /// How many steps each segment is divided into
    #[structopt(long, default_value = "100")]
    steps: usize,
    /// Milliseconds between ticks
    #[structopt(long, default_value = "50")]
    tick_ms: f64,
    /// Start playback right after loading --input
    #[structopt(long)]
    autostart: bool,
    /// Print positions as JSON lines instead of lat,lng
    #[structopt(long)]
    json: bool,
}

// How often to check for commands when nothing is playing
const IDLE_POLL: std::time::Duration = std::time::Duration::from_millis(50);

fn main() -> Result<()> {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());
    if args.autostart && args.input.is_none() {
        bail!("--autostart needs --input");
    }
    let config = PlaybackConfig::from_millis(args.steps, args.tick_ms)?;

    let mut session = Session::new(config, TerminalSink::new(std::io::stdout(), args.json));
    if let Some(path) = args.input {
        session.handle(Command::Load(fs_err::read(path)?))?;
    }
    if args.autostart {
        session.handle(Command::Start)?;
    }

    info!("Commands: add <lat,lng,timestamp>, load <file>, start, pause, resume, stop, status, quit");
    let rx = input::spawn_reader(std::io::BufReader::new(std::io::stdin()));
    run(&mut session, rx);
    Ok(())
}

/// The session lives on this thread only. Input arrives over the channel, and ticks happen in
/// between reading it, so the two never overlap.
fn run<S: PositionSink>(session: &mut Session<S>, mut rx: UnboundedReceiver<Input>) {
    let mut last_update = Instant::now();
    let mut input_open = true;

    loop {
        let now = Instant::now();
        let real_dt = now - last_update;
        last_update = now;
        session.update(Duration::seconds(real_dt.as_secs_f64()));

        while input_open {
            match rx.try_next() {
                Ok(Some(Input::Quit)) => {
                    return;
                }
                Ok(Some(input)) => handle_input(session, input),
                // Input ended
                Ok(None) => {
                    input_open = false;
                }
                // Nothing queued right now
                Err(_) => break,
            }
        }

        if done(input_open, session) {
            return;
        }

        let wait = match session.until_next_tick() {
            Some(dt) => std::time::Duration::from_secs_f64(dt.inner_seconds()).min(IDLE_POLL),
            None => IDLE_POLL,
        };
        std::thread::sleep(wait);
    }
}

/// Without input, nothing can start or resume playback, so only a running session is worth
/// waiting for.
fn done<S: PositionSink>(input_open: bool, session: &Session<S>) -> bool {
    !input_open && !session.is_ticking()
}

fn handle_input<S: PositionSink>(session: &mut Session<S>, input: Input) {
    let cmd = match input {
        Input::Command(cmd) => cmd,
        Input::LoadFile(path) => match fs_err::read(&path) {
            Ok(bytes) => Command::Load(bytes),
            Err(err) => {
                warn!("{}", err);
                return;
            }
        },
        Input::Status => {
            let engine = session.engine();
            let state = engine.state();
            info!(
                "{:?} on segment {}/{}, step {}, at {:?}",
                state.status,
                state.segment_index + 1,
                engine.path().num_segments(),
                state.step_index,
                engine.current_position()
            );
            return;
        }
        Input::Quit => unreachable!(),
    };
    if let Err(err) = session.handle(cmd) {
        warn!("{}", err);
    }
}
