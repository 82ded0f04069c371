use std::fs;
use std::io::Write;
use std::path::Path;

use crate::errors::{AppError, AppResult};

/// Create `dir` and its parents (owner-only) unless it already exists.
pub fn ensure_dir(dir: &Path) -> AppResult<()> {
    if dir.exists() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|e| AppError::io(dir, e))
}

/// Write `data` to `path`, replacing any previous content. New files are
/// created owner read/write only. Returns the number of bytes written.
pub fn write_body(path: &Path, data: &[u8]) -> AppResult<usize> {
    let mut options = fs::OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| AppError::io(path, e))?;
    file.write_all(data).map_err(|e| AppError::io(path, e))?;
    Ok(data.len())
}
