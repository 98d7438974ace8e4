//! Session cookie parsing and `Set-Cookie` serialization.

use crate::env::cookie::{EPOCH_HTTP_DATE, HTTP_DATE_FORMAT};
use crate::session::config::SessionConfig;
use chrono::{DateTime, TimeDelta, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters left unescaped in cookie values (same set as `encodeURIComponent`)
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Find `cookie_name` in a `Cookie` request header and return its decoded value.
///
/// Entries are separated by `;`, whitespace, or both. The first entry whose
/// name matches exactly and whose value decodes as UTF-8 wins.
pub fn extract(header: &str, cookie_name: &str) -> Option<String> {
    header
        .split(|c: char| c == ';' || c.is_ascii_whitespace())
        .find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            if name != cookie_name {
                return None;
            }

            let value = value.trim_matches('"');
            percent_decode_str(value)
                .decode_utf8()
                .ok()
                .map(|decoded| decoded.into_owned())
        })
}

/// Build the `Set-Cookie` header value binding `id` to the session.
///
/// `Expires` is computed from `now` plus the effective cookie max age.
pub fn build_set_cookie(id: &str, config: &SessionConfig, now: DateTime<Utc>) -> String {
    let max_age = config.cookie_max_age();
    let encoded = utf8_percent_encode(id, COOKIE_VALUE).to_string();
    assemble(config, &encoded, max_age, &http_date_after(now, max_age))
}

/// Build a `Set-Cookie` header value that makes the client drop the cookie
pub fn build_expired_cookie(config: &SessionConfig) -> String {
    assemble(config, "", 0, EPOCH_HTTP_DATE)
}

fn assemble(config: &SessionConfig, value: &str, max_age: u64, expires: &str) -> String {
    let mut header = format!(
        "{}={}; Max-Age={}; Path={}",
        config.cookie_name(),
        value,
        max_age,
        config.cookie.path
    );

    if let Some(domain) = &config.cookie.domain {
        header.push_str("; Domain=");
        header.push_str(domain);
    }

    header.push_str("; Expires=");
    header.push_str(expires);

    if config.cookie.http_only {
        header.push_str("; HttpOnly");
    }
    if config.cookie.secure {
        header.push_str("; Secure");
    }

    header
}

fn http_date_after(now: DateTime<Utc>, seconds: u64) -> String {
    i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .format(HTTP_DATE_FORMAT)
        .to_string()
}
