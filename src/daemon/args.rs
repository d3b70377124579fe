use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
pub struct DaemonArgs {
  #[arg(long)]
  pub force: bool,
  #[arg(long)]
  pub dir: Option<PathBuf>,
  /// This option is for debugging purposes only.
  #[arg(long = "log-console")]
  pub log_console : bool,
  #[arg(long = "log-filter")]
  pub log: Option<LevelFilter>,
  /// Seconds between two evaluations of the reminders.
  #[arg(long = "poll-interval-secs", default_value_t = 10)]
  pub poll_interval_secs: u64,
  /// Upper bound for a single sms delivery attempt.
  #[arg(long = "sms-timeout-secs", default_value_t = 10)]
  pub sms_timeout_secs: u64,
}
