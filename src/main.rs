use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use desk_wm::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use desk_wm::persistence::{JsonFileSettings, MemorySettings, default_settings_path};
use desk_wm::runner::{Desktop, run_desktop};
use desk_wm::{AppId, AppInfo, StaticRegistry, Viewport, WindowManager, WmConfig, tracing_sub};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(
    name = "desk-wm",
    version = env!("CARGO_PKG_VERSION"),
    about = "Simulated desktop with snapping, minimize/maximize and task view"
)]
struct Cli {
    /// Virtual screen width in pixels.
    #[arg(long, value_name = "PX", default_value_t = 1920)]
    width: i32,

    /// Virtual screen height in pixels.
    #[arg(long, value_name = "PX", default_value_t = 1080)]
    height: i32,

    /// Pixels reserved at the bottom for the taskbar.
    #[arg(long, value_name = "PX", default_value_t = 48)]
    taskbar: i32,

    /// Where window bounds are remembered between runs.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Do not snap windows dragged against a screen edge.
    #[arg(long)]
    no_edge_snap: bool,

    /// Do not show the layout picker when hovering the maximize button.
    #[arg(long)]
    no_hover_menu: bool,

    /// Append log output to this file.
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

impl TryFrom<&Cli> for WmConfig {
    type Error = String;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        if !(640..=20000).contains(&cli.width) || !(480..=20000).contains(&cli.height) {
            return Err("screen must be at least 640x480 and at most 20000 px".to_string());
        }
        if !(0..cli.height / 2).contains(&cli.taskbar) {
            return Err("taskbar must be smaller than half the screen height".to_string());
        }
        Ok(WmConfig {
            viewport: Viewport::new(cli.width, cli.height, cli.taskbar),
            edge_snap_on_drag: !cli.no_edge_snap,
            hover_snap_menu: !cli.no_hover_menu,
            ..WmConfig::default()
        })
    }
}

fn demo_registry() -> StaticRegistry {
    StaticRegistry::new()
        .with_app("notes", AppInfo::new("Notes", 720, 540).with_icon("N"))
        .with_app("calculator", AppInfo::new("Calculator", 420, 560).with_icon("C"))
        .with_app("clock", AppInfo::new("Clock", 480, 360).with_icon("T"))
        .with_app("weather", AppInfo::new("Weather", 900, 600).with_icon("W"))
        .with_app("files", AppInfo::new("Files", 1100, 700).with_icon("F"))
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    tracing_sub::init_default(cli.log.as_deref())?;
    let config = WmConfig::try_from(&cli).map_err(io::Error::other)?;

    let registry = demo_registry();
    let launchers: Vec<AppId> = registry.app_ids().cloned().collect();
    let settings_path = cli.settings.clone().or_else(default_settings_path);
    let wm = match settings_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "remembering window bounds");
            WindowManager::new(config, registry, JsonFileSettings::open(path))
        }
        None => {
            tracing::warn!("no config directory; window bounds will not be remembered");
            WindowManager::new(config, registry, MemorySettings::new())
        }
    };

    let mut desktop = Desktop::new(wm, launchers);
    let mut input = ConsoleInputDriver::new();
    let mut output = ConsoleOutputDriver::new()?;
    run_desktop(&mut input, &mut output, &mut desktop, FRAME_INTERVAL)
}
