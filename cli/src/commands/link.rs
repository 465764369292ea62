use anyhow::{anyhow, Result};
use settings::{shared_secret, FileSettings, OTP_KEY};
use std::path::Path;
use user::TOKEN_PARAM;

/// Append the token parameter to `base_url`, ahead of any fragment.
pub fn magic_url(base_url: &str, secret: &str) -> String {
    let (base, fragment) = match base_url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (base_url, None),
    };

    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };

    let mut url = format!(
        "{}{}{}={}",
        base,
        separator,
        TOKEN_PARAM,
        urlencoding::encode(secret)
    );
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

/// Print the magic link for the configured key
pub fn execute(settings_path: &Path, base_url: &str) -> Result<()> {
    let settings = FileSettings::open(settings_path)?;
    let secret = shared_secret(&settings).ok_or_else(|| {
        anyhow!(
            "No magic key configured in {}. Set one with: autoreg settings set {} <key>",
            settings_path.display(),
            OTP_KEY
        )
    })?;

    println!("{}", magic_url(base_url, &secret));
    Ok(())
}
