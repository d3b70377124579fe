pub mod clock;
pub mod config;
pub mod daemon_path;
pub mod process;
pub mod status;
pub mod test_sms;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use config::{process_config_command, ConfigCommand};
use process::{restart_server, stop_servers};
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::{
        dispatch::{
            desktop::DesktopNotifier,
            twilio::{TwilioCredentials, TwilioTransport, DEFAULT_SMS_TIMEOUT},
            Notifier, APP_TITLE,
        },
        start_daemon,
        storage::entities::ClockState,
        DaemonOptions,
    },
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX, DAEMON_PREFIX},
    },
};

pub const INFO_URL: &str = "http://russell-digital.be/moffett/clockhelper.html";

#[derive(Parser, Debug)]
#[command(name = "Clockhelper", version, long_about = None)]
#[command(about = "Reminds you to clock in and out of your time tracker", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum NotificationKind {
    ClockIn,
    ClockOut,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init,
    #[command(
        about = "Run a daemon directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[arg(long, default_value_t = 10, help = "Seconds between two reminder checks")]
        poll_interval_secs: u64,
        #[arg(long, default_value_t = 10, help = "Upper bound for a single sms delivery attempt")]
        sms_timeout_secs: u64,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop,
    #[command(about = "Mark yourself as clocked in and open the tracker")]
    ClockIn {
        #[arg(long, help = "Don't open the tracker page")]
        no_browser: bool,
    },
    #[command(about = "Mark yourself as clocked out and open the tracker")]
    ClockOut {
        #[arg(long, help = "Don't open the tracker page")]
        no_browser: bool,
    },
    #[command(about = "Show the clock state and today's reminder budget")]
    Status,
    #[command(about = "Inspect or change the reminder settings")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    #[command(about = "Show one of the reminder notifications")]
    TestNotification {
        #[arg(value_enum)]
        kind: NotificationKind,
    },
    #[command(about = "Send a test sms. Counts toward the daily and monthly caps, use sparingly")]
    TestSms {
        #[arg(long, help = "Phone number with +country code. Defaults to the configured one")]
        phone: Option<String>,
    },
    #[command(about = "Open the project page")]
    Info,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let prefix = match args.commands {
        Commands::Serve { .. } => DAEMON_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init => {
            restart_server(args.dir.as_deref())?;
            println!("Daemon started");
        }
        Commands::Stop => {
            let stopped = stop_servers()?;
            println!("Stopped {stopped} daemon(s)");
        }
        Commands::Serve {
            poll_interval_secs,
            sms_timeout_secs,
        } => {
            let options = DaemonOptions {
                poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
                sms_timeout: Duration::from_secs(sms_timeout_secs.max(1)),
            };
            start_daemon(dir, options).await?;
        }
        Commands::ClockIn { no_browser } => {
            clock::set_clock_state(&dir, ClockState::On, !no_browser).await?;
        }
        Commands::ClockOut { no_browser } => {
            clock::set_clock_state(&dir, ClockState::Off, !no_browser).await?;
        }
        Commands::Status => status::print_status(&dir, Local::now().date_naive()).await?,
        Commands::Config { command } => process_config_command(&dir, command).await?,
        Commands::TestNotification { kind } => {
            let body = match kind {
                NotificationKind::ClockIn => "Forgot to clock in? (test)",
                NotificationKind::ClockOut => "Still working? (test)",
            };
            DesktopNotifier::new(APP_TITLE).notify(APP_TITLE, body)?;
        }
        Commands::TestSms { phone } => {
            let transport =
                TwilioTransport::new(TwilioCredentials::from_env(), DEFAULT_SMS_TIMEOUT)?;
            let outcome = test_sms::send_test_sms(
                &dir,
                phone.as_deref(),
                &transport,
                DEFAULT_SMS_TIMEOUT,
                Local::now().date_naive(),
            )
            .await?;
            println!("{outcome}");
        }
        Commands::Info => open::that(INFO_URL)?,
    }
    Ok(())
}
