//! `harvest logout` – forget the stored token.

use anyhow::Result;
use harvest_core::session::SessionFile;

pub fn run_logout() -> Result<()> {
    let session = SessionFile::open_default()?;
    session.clear()?;
    println!("Signed out.");
    Ok(())
}
