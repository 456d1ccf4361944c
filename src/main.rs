use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use invitation::app::Invitation;
use invitation::color::parse_hex_color;
use invitation::config::{InvitationConfig, ServerConfig, Variant};
use invitation::{guestbook, logging};
use std::env;
use std::io::{BufWriter, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

fn print_usage() {
    eprintln!("invitation - animated graduation and wedding invitations in the terminal");
    eprintln!();
    eprintln!("Usage: invitation [VARIANT] [OPTIONS]");
    eprintln!("       invitation serve [--port N] [--store FILE]");
    eprintln!();
    eprintln!("Variants:");
    eprintln!("  graduation  Floating caps (default)");
    eprintln!("  wedding     Floating hearts");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config FILE      Load overrides from a JSON file");
    eprintln!("  --bg-color RRGGBB  Set background color as hex (e.g., --bg-color 1a1b26)");
    eprintln!("  --compact          Always use the reduced particle counts");
    eprintln!();
    eprintln!("Serve options (also read from HOST, PORT, GUESTBOOK_PATH):");
    eprintln!("  --port N           Listen port (default 3000)");
    eprintln!("  --store FILE       Guestbook JSON file (default guestbook.json)");
    eprintln!();
    eprintln!("Enter or click opens the envelope. Click for confetti, double-click for emoji,");
    eprintln!("'f' for fireworks. Press 'q', ESC, or Ctrl+C to exit");
    eprintln!("Set {} to a file path to write logs.", logging::LOG_FILE_VAR);
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

/// Value following a flag, or exit with a message.
fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value.as_str(),
        None => fail(&format!("{} requires a value", flag)),
    }
}

fn run_invitation(config: InvitationConfig) -> std::io::Result<()> {
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All), EnableMouseCapture)?;

    let (cols, rows) = terminal::size()?;
    let result = Invitation::new(config, cols as usize, rows as usize)
        .map_err(std::io::Error::other)
        .and_then(|mut app| run_loop(&mut app, &mut stdout));

    execute!(stdout, Show, LeaveAlternateScreen, DisableMouseCapture)?;
    terminal::disable_raw_mode()?;

    result
}

fn run_loop<W: std::io::Write>(app: &mut Invitation, stdout: &mut W) -> std::io::Result<()> {
    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;
    const FIXED_DT: f32 = 1.0 / 60.0;

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            match &event {
                Event::Key(key_event) => {
                    if key_event.code == KeyCode::Char('q')
                        || key_event.code == KeyCode::Esc
                        || (key_event.code == KeyCode::Char('c')
                            && key_event.modifiers.contains(event::KeyModifiers::CONTROL))
                    {
                        break;
                    }
                    app.handle_event(&event);
                }
                Event::Resize(_, _) => {
                    app.handle_event(&event);
                    execute!(stdout, Clear(ClearType::All))?;
                }
                _ => {
                    app.handle_event(&event);
                }
            }
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        accumulator += frame_time;
        if accumulator > FIXED_DT * 3.0 {
            accumulator = FIXED_DT * 3.0;
        }

        while accumulator >= FIXED_DT {
            app.update(FIXED_DT, chrono::Local::now().naive_local());
            accumulator -= FIXED_DT;
        }

        app.render(stdout)?;
    }

    Ok(())
}

fn run_server(args: &[String]) -> std::io::Result<()> {
    logging::init_stdout();

    let mut config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => fail(&format!("Configuration error: {}", e)),
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                let value = flag_value(args, i, "--port");
                config.port = value
                    .parse()
                    .unwrap_or_else(|_| fail(&format!("Invalid port: {}", value)));
                i += 2;
            }
            "--store" => {
                config.store_path = PathBuf::from(flag_value(args, i, "--store"));
                i += 2;
            }
            arg => {
                eprintln!("Unknown option: {}", arg);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    tracing::info!("Starting invitation guestbook");
    actix_web::rt::System::new().block_on(guestbook::serve(config))
}

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.get(1).map(String::as_str) == Some("serve") {
        return run_server(&args[2..]);
    }

    let mut variant: Option<Variant> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut bg_color = None;
    let mut compact = false;

    // Parse arguments
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bg-color" => {
                let value = flag_value(&args, i, "--bg-color");
                match parse_hex_color(value) {
                    Some(color) => bg_color = Some(color),
                    None => {
                        eprintln!("Invalid hex color: {}", value);
                        fail("Expected format: RRGGBB (e.g., 1a1b26)");
                    }
                }
                i += 2;
            }
            "--config" => {
                config_path = Some(PathBuf::from(flag_value(&args, i, "--config")));
                i += 2;
            }
            "--compact" => {
                compact = true;
                i += 1;
            }
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            arg => {
                if !arg.starts_with('-') {
                    variant = match Variant::from_name(arg) {
                        Some(v) => Some(v),
                        None => {
                            eprintln!("Unknown variant: {}", arg);
                            eprintln!();
                            print_usage();
                            std::process::exit(1);
                        }
                    };
                    i += 1;
                } else {
                    eprintln!("Unknown option: {}", arg);
                    eprintln!();
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
    }

    let log_path = env::var_os(logging::LOG_FILE_VAR).map(PathBuf::from);
    logging::init_file(log_path.as_deref())?;

    let mut config = match &config_path {
        Some(path) => InvitationConfig::load(path).unwrap_or_else(|e| fail(&e.to_string())),
        None => InvitationConfig::preset(variant.unwrap_or_default()),
    };
    // A variant named on the command line swaps the file's theme and text
    if let Some(variant) = variant.filter(|v| *v != config.variant) {
        let preset = InvitationConfig::preset(variant);
        config = InvitationConfig {
            variant,
            title: preset.title,
            lines: preset.lines,
            effects: preset.effects,
            emoji: preset.emoji,
            ..config
        };
    }
    if let Some(color) = bg_color {
        config.background = color;
    }
    if compact {
        config.compact_width = f32::MAX;
    }

    run_invitation(config)
}
