use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

/// Write `value` as pretty JSON to `<dir>/<name>.json`, atomically.
pub fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.json", name));
    let tmp_path = dir.join(format!(".{}.json.tmp", name));

    let file = fs::File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    let mut out = BufWriter::new(file);
    // pretty-print with a trailing newline
    serde_json::to_writer_pretty(&mut out, value)
        .with_context(|| format!("serializing {}", name))?;
    out.write_all(b"\n")?;
    out.flush()?;
    drop(out);

    fs::rename(&tmp_path, &path)
        .with_context(|| format!("renaming {} -> {}", tmp_path.display(), path.display()))?;
    Ok(())
}
