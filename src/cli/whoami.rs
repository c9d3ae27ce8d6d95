// `docuhuman whoami` - show the profile decoded from the credential

use anyhow::{bail, Result};
use tracing::warn;

use crate::auth::{Credential, UserProfile};
use crate::config::Config;

pub fn run_whoami(config: &Config) -> Result<()> {
    let Some(token) = &config.auth.token else {
        bail!("Not logged in: pass --token or set DOCUHUMAN_TOKEN");
    };

    // Decode failures only affect the display
    let profile = match Credential::new(token.as_str()).decode_profile() {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!("Failed to decode credential for display: {}", e);
            None
        }
    };

    println!("{}", render_profile(profile.as_ref()));
    Ok(())
}

fn render_profile(profile: Option<&UserProfile>) -> String {
    let mut lines = vec![
        format!("Name:    {}", UserProfile::card_name(profile)),
        format!("Email:   {}", UserProfile::card_email(profile)),
    ];
    if let Some(picture) = profile.and_then(|p| p.picture.as_deref()) {
        lines.push(format!("Picture: {}", picture));
    }
    lines.join("\n")
}
