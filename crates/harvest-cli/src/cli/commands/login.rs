//! `harvest login` – store the bearer token for progress channels.

use anyhow::{bail, Result};
use harvest_core::session::SessionFile;

pub fn run_login(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        bail!("token is empty");
    }
    let session = SessionFile::open_default()?;
    session.save(token)?;
    println!("Signed in; token stored at {}", session.path().display());
    Ok(())
}
