// ABOUTME: Atomic file write helper shared by the credential and state stores
// ABOUTME: Temp file beside the target, 0600 permissions, rename into place

use crate::Result;
use std::fs;
use std::path::Path;

/// Write `content` to `path` so that a crash at any point leaves either the
/// previous file or the new one, never a partial write. The temp file lives
/// in the target's directory so the rename cannot cross filesystems.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    use rand::Rng;

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let random: u32 = rand::thread_rng().gen();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".into());
    let tmp_path = parent.join(format!(".{}.{:x}.part", file_name, random));

    fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&tmp_path, perms)?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}
