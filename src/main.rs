use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use key_metronome::config::parse_interval;
use key_metronome::{Config, GlobalHotkeyTrigger, InputHost, Metronome, RecordingHost, ToggleTrigger};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Periodic synthetic key presses on a virtual keyboard.
#[derive(Parser, Debug)]
#[command(name = "metronome", version, about)]
struct Cli {
    /// JSON configuration file; command-line options override it
    #[arg(short, long)]
    config: Option<String>,

    /// Generator 1 interval (ns, or with a ns/us/ms/s/m suffix)
    #[arg(long, value_parser = parse_interval, allow_hyphen_values = true)]
    delay: Option<i64>,

    /// Generator 1 key
    #[arg(long)]
    key: Option<String>,

    /// Generator 2 interval; zero or negative disables it
    #[arg(long, value_parser = parse_interval, allow_hyphen_values = true)]
    delay2: Option<i64>,

    /// Generator 2 key
    #[arg(long)]
    key2: Option<String>,

    /// Generator 3 interval; zero or negative disables it
    #[arg(long, value_parser = parse_interval, allow_hyphen_values = true)]
    delay3: Option<i64>,

    /// Generator 3 key
    #[arg(long)]
    key3: Option<String>,

    /// Key combination that toggles emission
    #[arg(long)]
    hotkey_code: Option<String>,

    /// Initial emission state (true or false); overrides the config file
    #[arg(long)]
    status: Option<bool>,

    /// Record key events in memory instead of creating a uinput device
    #[arg(long)]
    dry_run: bool,

    /// Write the effective configuration to this file and exit
    #[arg(long)]
    save_config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(delay) = self.delay {
            config.delay = delay;
        }
        if let Some(key) = self.key {
            config.key = key;
        }
        if let Some(delay2) = self.delay2 {
            config.delay2 = delay2;
        }
        if let Some(key2) = self.key2 {
            config.key2 = key2;
        }
        if let Some(delay3) = self.delay3 {
            config.delay3 = delay3;
        }
        if let Some(key3) = self.key3 {
            config.key3 = key3;
        }
        if let Some(hotkey_code) = self.hotkey_code {
            config.hotkey_code = hotkey_code;
        }
        if let Some(status) = self.status {
            config.status = status;
        }
        config.verbose |= self.verbose;

        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn toggle_triggers(hotkey_code: &str) -> Vec<Box<dyn ToggleTrigger>> {
    let mut triggers: Vec<Box<dyn ToggleTrigger>> = Vec::new();

    match GlobalHotkeyTrigger::new(hotkey_code) {
        Ok(trigger) => triggers.push(Box::new(trigger)),
        Err(e) => warn!("Global hotkey unavailable: {}", e),
    }

    #[cfg(unix)]
    triggers.push(Box::new(key_metronome::SignalTrigger::new()));

    triggers
}

async fn run<H: InputHost>(config: &Config, host: &H) -> Result<()> {
    let settings = config.settings().context("invalid configuration")?;

    println!("{}", "Key Metronome".bold());
    for slot in settings.generators() {
        println!(
            "  {} every {:?} -> '{}'",
            format!("#{}", slot.index).cyan(),
            slot.interval,
            slot.key
        );
    }
    println!(
        "  toggle with {} (currently {})",
        settings.hotkey_code().yellow(),
        if settings.status() {
            "ON".green()
        } else {
            "OFF".red()
        }
    );

    let metronome = Metronome::start(&settings, host, toggle_triggers(settings.hotkey_code()))
        .context("failed to start metronome")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    metronome.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dry_run = cli.dry_run;
    let save_config = cli.save_config.clone();
    let config = cli.into_config()?;

    init_logging(config.verbose);

    if let Some(path) = save_config {
        config.validate()?;
        config.save_to_file(&path)?;
        println!("Configuration saved to {}", path.green());
        return Ok(());
    }

    if dry_run {
        return run(&config, &RecordingHost::new()).await;
    }

    #[cfg(target_os = "linux")]
    {
        run(&config, &key_metronome::UinputHost::new()).await
    }

    #[cfg(not(target_os = "linux"))]
    {
        Err(key_metronome::MetronomeError::unsupported_platform(
            "virtual keyboards require Linux uinput; use --dry-run",
        )
        .into())
    }
}
