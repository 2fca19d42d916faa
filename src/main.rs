//! formwright - Main entry point
//!
//! Parses the command line, sets up logging and dispatches to the form
//! console or one of the batch commands.

use anyhow::{Context, Result, bail};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::cell::RefCell;
use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Mutex;
use strum::IntoEnumIterator;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use formwright::app::App;
use formwright::cli::{Cli, Commands, PresetCommands};
use formwright::config::{FormConfig, load_document, save_document, submission_document};
use formwright::engine::{DiscardSubmit, FormEngine};
use formwright::presets::Preset;
use formwright::uploads::UploadPlan;
use formwright::value::FormValue;

/// Install the tracing subscriber.
///
/// `RUST_LOG` overrides the default `warn` level. The interactive console
/// must not write to the terminal, so without a log file its logs are
/// discarded; batch commands log to stderr.
fn init_tracing(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create log file {path:?}"))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if interactive => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// A preset name or the path of a configuration file
fn load_form(source: &str) -> Result<FormConfig> {
    let config = match Preset::from_str(source) {
        Ok(preset) => {
            debug!(%preset, "Using built-in preset");
            preset.config()?
        }
        Err(_) => FormConfig::load_from_file(source)?,
    };
    Ok(config)
}

/// Main application entry point
fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let interactive = matches!(cli.command, Commands::Fill { .. });
    init_tracing(cli.log_file.as_deref(), interactive)?;
    info!("formwright starting up");

    match cli.command {
        Commands::Validate { config, data } => run_validate(&config, data.as_deref()),
        Commands::Fill { config, data, save } => run_fill(&config, data.as_deref(), save),
        Commands::Presets { action } => run_presets(action),
        Commands::Uploads {
            config,
            data,
            collection,
            slug,
        } => {
            let config = load_form(&config)?;
            let data = load_document(&data)?;
            let plan = UploadPlan::from_data(&collection, &slug, &config, &data);
            print!("{plan}");
            Ok(())
        }
    }
}

fn run_validate(source: &str, data: Option<&Path>) -> Result<()> {
    info!("Validating form configuration: {}", source);
    let config = load_form(source)?;

    for warning in config.lint().iter().filter(|w| !w.is_fatal()) {
        println!("⚠ {warning}");
    }
    if let Err(e) = config.validate() {
        error!("Form configuration is invalid: {}", e);
        eprintln!("✗ {e}");
        std::process::exit(1);
    }
    println!("✓ Form {:?} is valid ({} steps)", config.id, config.steps.len());

    let Some(data_path) = data else {
        return Ok(());
    };
    let engine = FormEngine::new(config, DiscardSubmit).with_data(load_document(data_path)?);
    let errors = engine.collect_errors(engine.data());
    if errors.is_empty() {
        println!("✓ Document {data_path:?} passes every rule");
        return Ok(());
    }
    for (key, message) in &errors {
        eprintln!("✗ {key}: {message}");
    }
    error!(count = errors.len(), "Document failed validation");
    std::process::exit(1);
}

fn run_presets(action: PresetCommands) -> Result<()> {
    match action {
        PresetCommands::List => {
            for preset in Preset::iter() {
                println!("{:<10} {}", preset.to_string(), preset.description());
            }
        }
        PresetCommands::Export { name, out } => {
            let Ok(preset) = Preset::from_str(&name) else {
                bail!("Unknown preset {name:?}; expected one of {}", Preset::names().join(", "));
            };
            let config = preset.config()?;
            match out {
                Some(path) => {
                    config.save_to_file(&path)?;
                    println!("✓ Wrote {preset} form to {path:?}");
                }
                None => println!("{}", serde_json::to_string_pretty(&config)?),
            }
        }
    }
    Ok(())
}

/// Run the interactive console
fn run_fill(source: &str, data: Option<&Path>, save: Option<PathBuf>) -> Result<()> {
    let config = load_form(source)?;
    config.validate()?;

    // Without a save path the last submission is printed once the
    // terminal is restored
    let captured: Rc<RefCell<Option<serde_json::Value>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&captured);
    let handler = move |doc: &FormValue, is_draft: bool| -> Result<()> {
        match &save {
            Some(path) => save_document(path, doc, is_draft),
            None => {
                *sink.borrow_mut() = Some(submission_document(doc, is_draft));
                Ok(())
            }
        }
    };

    let mut engine = FormEngine::new(config, handler);
    if let Some(path) = data {
        engine = engine.with_data(load_document(path)?);
    }

    debug!("Initializing terminal for the form console");
    enable_raw_mode().context("Failed to enable raw mode")?;
    crossterm::execute!(stdout(), EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let result = Terminal::new(CrosstermBackend::new(stdout()))
        .map_err(anyhow::Error::from)
        .and_then(|mut terminal| {
            let mut app = App::new(engine);
            app.run(&mut terminal).map_err(anyhow::Error::from)
        });

    // Always restore the terminal, even if the console failed
    if let Err(e) = disable_raw_mode() {
        error!("Failed to disable raw mode: {}", e);
    }
    if let Err(e) = crossterm::execute!(stdout(), LeaveAlternateScreen) {
        error!("Failed to leave alternate screen: {}", e);
    }
    result?;

    if let Some(doc) = captured.borrow().as_ref() {
        println!("{}", serde_json::to_string_pretty(doc)?);
    }
    info!("Form console closed");
    Ok(())
}
