//! `.env` loading. Existing environment variables always win.

use std::io;
use std::path::Path;
use log::{debug, trace};

/// Parse `KEY=VALUE` lines.
/// Blank lines, `#` comments and lines without `=` or key are skipped.
/// One pair of matching surrounding quotes is stripped from values.
pub fn parse(raw: &str) -> Vec<(String, String)>
{   raw.lines()
      .map(str::trim)
      .filter(|line| !line.is_empty() && !line.starts_with('#'))
      .filter_map(|line| {
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        if key.is_empty()
        {   return None;
        }
        Some((key.to_string(), unquote(value.trim()).to_string()))
      })
      .collect()
}

fn unquote(value: &str) -> &str
{   for quote in ['"', '\'']
    {   if value.len() >= 2
          && value.starts_with(quote)
          && value.ends_with(quote)
        {   return &value[1..value.len() - 1];
        }
    }
    value
}

/// Load a `.env` file into the process environment.
///
/// A missing file is not an error. Returns the number of variables set.
/// Call once at startup, before other threads read the environment.
pub fn load(path: &Path) -> io::Result<usize>
{   if !path.exists()
    {   debug!("No env file at {}", path.display());
        return Ok(0);
    }

    let raw = std::fs::read_to_string(path)?;
    let mut applied = 0;
    for (key, value) in parse(&raw)
    {   if std::env::var_os(&key).is_none()
        {   trace!("Setting {} from env file", key);
            std::env::set_var(&key, value);
            applied += 1;
        }
    }

    debug!("Applied {} variables from {}", applied, path.display());
    Ok(applied)
}
