//! Save games using `MessagePack`.
//!
//! A save game is the whole [`RuntimeState`] in named `MessagePack`
//! encoding. The game file itself is not stored; restoring needs the same
//! game loaded.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use lantern_foundation::{Error, ErrorKind, Result};
use lantern_storage::RuntimeState;

/// Serializes a state to bytes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(state: &RuntimeState) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(state).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Deserializes a state from bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not a saved state.
pub fn from_bytes(bytes: &[u8]) -> Result<RuntimeState> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Saves a state to a file, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_to_file<P: AsRef<Path>>(state: &RuntimeState, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(state)?;
    let file = File::create(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to create file '{}': {e}",
            path.display()
        )))
    })?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .and_then(|()| writer.flush())
        .map_err(|e| {
            Error::new(ErrorKind::Io(format!(
                "failed to write file '{}': {e}",
                path.display()
            )))
        })?;
    log::debug!(target: "lantern::runtime", "saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Loads a state from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a saved state.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RuntimeState> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to open file '{}': {e}",
            path.display()
        )))
    })?;

    let mut bytes = Vec::new();
    BufReader::new(file).read_to_end(&mut bytes).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to read file '{}': {e}",
            path.display()
        )))
    })?;
    from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use lantern_language::load_str;
    use lantern_storage::initialize_state;

    use super::*;

    const GAME: &str = r"
define game <Saves>
  start <hall>
end define

define room <hall>
  define object <lamp>
  end define
end define

define room <yard>
end define

define variable <score>
  type numeric
  value <3>
end define

define timer <bell>
  interval <4>
  enabled
  action msg <Ding.>
end define
";

    fn played_state() -> RuntimeState {
        let model = load_str(GAME).unwrap();
        let mut state = initialize_state(&model);
        state.move_object("lamp", "inventory");
        state.set_location("yard");
        state.set_svar(&model, "motto", "carpe diem");
        state.set_ivar(&model, "score[2]", 9);
        state.set_obj_property("lamp", "lit");
        state
    }

    #[test]
    fn roundtrip_bytes() {
        let state = played_state();
        let bytes = to_bytes(&state).unwrap();
        assert!(!bytes.is_empty());

        let restored = from_bytes(&bytes).unwrap();
        assert_eq!(restored.location(), "yard");
        assert_eq!(restored.parent_of("lamp"), Some("inventory"));
        assert_eq!(restored.svar("motto").as_deref(), Some("carpe diem"));
        assert_eq!(restored.ivar("score"), Some(3));
        assert_eq!(restored.ivar("score[2]"), Some(9));
        assert_eq!(restored.timer_count(), 1);
    }

    #[test]
    fn roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.sav");
        let state = played_state();

        save_to_file(&state, &path).unwrap();
        let restored = load_from_file(&path).unwrap();
        assert_eq!(restored.location(), state.location());
        assert_eq!(restored.exits().count(), state.exits().count());
    }

    #[test]
    fn garbage_is_rejected() {
        let err = from_bytes(b"not a save game").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Serialization(_)));
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_file(dir.path().join("absent.sav")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Io(_)));
    }
}
