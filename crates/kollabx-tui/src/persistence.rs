use std::fs;
use std::path::PathBuf;

use kollabx_sdk::Session;

const APP_DIR: &str = "kollabx";
const SESSION_FILE: &str = "session.json";

/// Get the config directory for the application, creating it if needed.
fn config_dir() -> Option<PathBuf> {
    let dir = dirs::config_dir()?.join(APP_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir).ok()?;
    }
    Some(dir)
}

/// Load the cached session from the local config file, if any.
pub fn load_session() -> Option<Session> {
    let path = config_dir()?.join(SESSION_FILE);
    if !path.exists() {
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str::<Session>(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                eprintln!("[persistence] Failed to parse {}: {e}", path.display());
                None
            }
        },
        Err(e) => {
            eprintln!("[persistence] Failed to read {}: {e}", path.display());
            None
        }
    }
}

/// Save the session to the local config file.
pub fn save_session(session: &Session) {
    let Some(path) = config_dir().map(|d| d.join(SESSION_FILE)) else {
        eprintln!("[persistence] Could not determine config directory");
        return;
    };

    match serde_json::to_string_pretty(session) {
        Ok(json) => {
            if let Err(e) = fs::write(&path, &json) {
                eprintln!("[persistence] Failed to write {}: {e}", path.display());
            }
        }
        Err(e) => {
            eprintln!("[persistence] Failed to serialize session: {e}");
        }
    }
}

/// Drop the cached session (after sign-out).
pub fn clear_session() {
    if let Some(path) = config_dir().map(|d| d.join(SESSION_FILE)) {
        let _ = fs::remove_file(path);
    }
}
