//! `screencap` -- capture the screen or a window and save it to a file.

use clap::{CommandFactory, Parser};
use screencap_core::pipeline;
use screencap_core::platform;
use screencap_core::window::list_windows_json;
use screencap_core::{CaptureConfig, CaptureTarget, ScreenCapError};

const AFTER_HELP: &str = "\
FILENAME is the file where the screen capture will be saved.
    Allowed file extensions are: bmp, emf, exif, gif, jpg, jpeg, png, tiff, wmf.
    Missing parent directories are created.

WINDOW_TITLE captures a window instead of the whole screen.
    Only the first few characters of the title are needed.
    Pass \"\" to capture the current active window.

Arguments after WINDOW_TITLE are ignored.

Exit codes: 0 ok, -1 window not found, 2 no active window, 3 encoding error,
    4 I/O error, 5 OS resource failure, 7 missing extension, 8 unsupported extension,
    64 command-line usage error.";

/// Exit status for arguments clap rejects (`EX_USAGE`).  Clap's own status
/// of 2 is already taken by "no active window".
const USAGE_ERROR_EXIT: i32 = 64;

#[derive(Parser)]
#[command(
    name = "screencap",
    about = "Captures the screen or a window and saves it to a file",
    after_help = AFTER_HELP
)]
struct Args {
    /// Output image file
    filename: Option<String>,

    /// Capture the first window whose title starts with this text
    window_title: Option<String>,

    /// Print the visible top-level windows as JSON and exit
    #[arg(long)]
    list_windows: bool,

    /// Compact JSON output for --list-windows
    #[arg(long, requires = "list_windows")]
    compact: bool,

    #[arg(hide = true, num_args = 0..)]
    extra: Vec<String>,
}

fn is_help(arg: &str) -> bool {
    arg.eq_ignore_ascii_case("/h") || arg.eq_ignore_ascii_case("/help")
}

fn print_usage() {
    if let Err(e) = Args::command().print_help() {
        log::warn!("failed to print usage: {e}");
    }
    println!();
}

fn list_windows(compact: bool) -> i32 {
    let result = platform::native().and_then(|system| list_windows_json(&*system, !compact));
    match result {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(e) => {
            println!("Failed to enumerate windows: {e}");
            e.exit_code()
        }
    }
}

fn describe(target: &CaptureTarget) -> &'static str {
    match target {
        CaptureTarget::Desktop => "the whole screen",
        CaptureTarget::ActiveWindow | CaptureTarget::Title(_) => "the active window",
    }
}

fn run(args: Args) -> i32 {
    if args.list_windows {
        return list_windows(args.compact);
    }
    if !args.extra.is_empty() {
        log::info!("ignoring extra arguments: {:?}", args.extra);
    }

    let Some(filename) = args.filename.as_deref().filter(|f| !is_help(f)) else {
        print_usage();
        return 0;
    };

    let config = match CaptureConfig::from_args(filename, args.window_title.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            println!("{e}");
            return e.exit_code();
        }
    };
    log::debug!("{config:?}");

    if let CaptureTarget::Title(title) = &config.target {
        println!("Looking for window '{title}'.");
    }

    let result = platform::native().and_then(|system| pipeline::run(&*system, &config));
    match result {
        Ok(report) => {
            println!(
                "Took a {}x{} capture of {} to {}",
                report.width,
                report.height,
                describe(&config.target),
                report.path.display()
            );
            0
        }
        Err(e @ (ScreenCapError::WindowNotFound(_) | ScreenCapError::NoActiveWindow)) => {
            println!("{e}");
            e.exit_code()
        }
        Err(e) => {
            println!("Check if file path is valid {}", config.output().display());
            println!("{e}");
            e.exit_code()
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let code = match Args::try_parse() {
        Ok(args) => run(args),
        Err(e) => {
            if let Err(io) = e.print() {
                log::warn!("failed to print argument error: {io}");
            }
            // --help and --version come through here too.
            if e.use_stderr() {
                USAGE_ERROR_EXIT
            } else {
                0
            }
        }
    };
    std::process::exit(code);
}
