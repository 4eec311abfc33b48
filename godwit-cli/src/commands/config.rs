//! Echo the effective configuration

use anyhow::Result;

use godwit_core::Config;

pub fn run(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if shown.db.password.is_some() {
        shown.db.password = Some("********".to_string());
    }
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}
