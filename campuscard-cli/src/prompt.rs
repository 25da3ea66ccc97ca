use anyhow::{bail, Result};
use std::io::{self, Write};

/// Read one line from stdin after printing `label`.
pub fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    if io::stdin().read_line(&mut s)? == 0 {
        bail!("no input for {label} (stdin closed)");
    }
    Ok(s.trim().to_string())
}

/// Use the flag/env value if present, otherwise ask.
pub fn value_or_prompt(given: Option<String>, label: &str) -> Result<String> {
    match given {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => prompt_secret(label),
    }
}
