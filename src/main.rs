/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::KeyCode;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use error::GameError;
use sim::event::GameEvent;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{Renderer, MAP_ROW};
use ui::sound::{Cue, SoundEngine};
use ui::sprites::SpriteSheet;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "thicket.log";

#[derive(Parser, Debug)]
#[command(name = "thicket", version, about = "Top-down action in the terminal: smash crates, hide in bushes, outlast the foes")]
struct Args {
    /// Map seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Named waypoint path idle enemies patrol, e.g. `lava_hell`
    #[arg(long)]
    map: Option<String>,

    /// Config file to use instead of searching for config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start with sound muted
    #[arg(long)]
    mute: bool,
}

/// World plus the generator that built it, so a restart can reseed.
struct Session {
    world: WorldState,
    rng: ChaCha8Rng,
    patrol_map: Option<String>,
}

impl Session {
    fn start(config: &GameConfig, seed: u64, patrol_map: Option<String>) -> Result<Self, GameError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let world = WorldState::new_session(config, seed, &mut rng, patrol_map.as_deref())?;
        Ok(Session { world, rng, patrol_map })
    }

    fn restart(&mut self, config: &GameConfig) -> Result<(), GameError> {
        let seed: u64 = rand::random();
        info!(seed, "new map");
        *self = Session::start(config, seed, self.patrol_map.clone())?;
        Ok(())
    }
}

fn main() {
    let args = Args::parse();
    init_logging();

    if let Err(e) = run(args) {
        eprintln!("thicket: {e}");
        std::process::exit(1);
    }
}

/// Log to a file: the terminal belongs to the renderer while playing.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match File::create(LOG_FILE) {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        Err(e) => eprintln!("thicket: logging disabled, cannot create {LOG_FILE}: {e}"),
    }
}

fn run(args: Args) -> Result<(), GameError> {
    let config = match &args.config {
        Some(path) => GameConfig::load_from(path)?,
        None => GameConfig::load(),
    };

    // Everything that can fail on bad input fails here, before raw mode.
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut session = Session::start(&config, seed, args.map.clone())?;

    let mut renderer = Renderer::new();
    let honor_release = renderer.init()?;

    let mut sound = SoundEngine::new(args.mute);
    if let Some(s) = sound.as_mut() {
        s.start_music();
    }
    let sheet = SpriteSheet::terminal();

    let result = game_loop(&mut session, &mut renderer, &mut sound, &sheet, &config, honor_release);

    if let Some(s) = sound.as_mut() {
        s.stop_all();
    }
    let cleanup = renderer.cleanup();

    let world = &session.world;
    info!(
        seed = world.seed,
        ticks = world.tick,
        kills = world.kills,
        objects = world.objects_cleared,
        "session ended"
    );
    result?;
    cleanup?;

    println!();
    println!("Thanks for playing Thicket!");
    println!("Seed {}  Foes defeated: {}  Objects cleared: {}", world.seed, world.kills, world.objects_cleared);
    Ok(())
}

/// What the meta keys asked for this frame.
enum Meta {
    None,
    Quit,
    Restart,
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: &mut Option<SoundEngine>,
    sheet: &SpriteSheet,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), GameError> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    debug!(connected = gp.connected, "gamepad");
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let mut last_tick = Instant::now();

    // Attack presses between ticks are edge events; hold them for the next tick.
    let mut pending_attack: Option<(f32, f32)> = None;

    loop {
        kb.drain_events();
        gp.update();

        match handle_meta(&mut session.world, sound, &kb, &gp) {
            Meta::Quit => break,
            Meta::Restart => {
                session.restart(config)?;
                pending_attack = None;
                last_tick = Instant::now();
            }
            Meta::None => {}
        }

        let world = &mut session.world;
        let center = world.player.body.center();
        let facing = world.player.direction;
        let mut snap = kb.snapshot(&world.camera, MAP_ROW, center, facing);
        gp.merge_into(&mut snap, center, facing);

        if world.phase == Phase::Playing && !world.paused && snap.attack {
            pending_attack = Some((snap.cursor_x, snap.cursor_y));
        }

        if last_tick.elapsed() >= tick_rate {
            let dt = last_tick.elapsed().as_secs_f32();
            last_tick = Instant::now();

            if let Some((x, y)) = pending_attack.take() {
                snap.attack = true;
                snap.cursor_x = x;
                snap.cursor_y = y;
            }
            let events = step::step(world, &snap, dt, &mut session.rng);
            play_cues(sound.as_ref(), &events);
        }

        renderer.render(&mut session.world, sheet)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn play_cues(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for cue in events.iter().filter_map(Cue::for_event) {
        sfx.play(cue);
    }
}

fn handle_meta(world: &mut WorldState, sound: &mut Option<SoundEngine>, kb: &InputState, gp: &GamepadState) -> Meta {
    if kb.ctrl_c_pressed()
        || kb.any_pressed(&[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')])
        || gp.quit_pressed()
    {
        return Meta::Quit;
    }

    if kb.any_pressed(&[KeyCode::Char('m'), KeyCode::Char('M')]) {
        if let Some(s) = sound.as_mut() {
            let muted = s.toggle_mute();
            info!(muted, "sound toggled");
        }
    }

    let restart = kb.any_pressed(&[KeyCode::Char('r'), KeyCode::Char('R')]);
    match world.phase {
        Phase::GameOver => {
            if restart || kb.any_pressed(&[KeyCode::Enter]) || gp.pause_pressed() {
                return Meta::Restart;
            }
        }
        Phase::Playing => {
            if kb.any_pressed(&[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::F(1)]) || gp.pause_pressed() {
                world.paused = !world.paused;
                info!(paused = world.paused, "pause toggled");
            } else if restart && world.paused {
                return Meta::Restart;
            }
        }
    }
    Meta::None
}
