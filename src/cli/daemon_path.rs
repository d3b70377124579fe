use std::path::{Path, PathBuf};

pub const DAEMON_BINARY_NAME: &str = "clockhelper-daemon";

/// The daemon binary is expected right next to the cli one.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name(DAEMON_BINARY_NAME);
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}

pub fn daemon_exists(cli_path: &Path) -> bool {
    to_daemon_path(cli_path.to_owned()).is_file()
}
