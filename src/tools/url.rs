//! URL pieces and percent-encoding.

use url::Url;

use crate::error::Result;

/// Percent-encode everything except ASCII alphanumerics and `-_.~`.
pub fn quote(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

pub fn unquote(text: &str) -> Result<String> {
    Ok(urlencoding::decode(text)?.into_owned())
}

pub fn scheme(url: &str) -> Result<String> {
    Ok(Url::parse(url)?.scheme().to_string())
}

pub fn domain(url: &str) -> Result<Option<String>> {
    Ok(Url::parse(url)?.host_str().map(str::to_string))
}

/// `user:pass@host:port`, each part only when present.
pub fn netloc(url: &str) -> Result<String> {
    Ok(netloc_of(&Url::parse(url)?))
}

/// `scheme://netloc`
pub fn root(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    Ok(format!("{}://{}", parsed.scheme(), netloc_of(&parsed)))
}

pub fn path(url: &str) -> Result<String> {
    Ok(Url::parse(url)?.path().to_string())
}

/// Explicit port. The scheme's default port (80 for http, ...) is
/// normalised away by the parser and reported as `None`.
pub fn port(url: &str) -> Result<Option<u16>> {
    Ok(Url::parse(url)?.port())
}

fn netloc_of(url: &Url) -> String {
    let mut out = String::new();
    if !url.username().is_empty() {
        out.push_str(url.username());
        if let Some(password) = url.password() {
            out.push(':');
            out.push_str(password);
        }
        out.push('@');
    }
    if let Some(host) = url.host_str() {
        out.push_str(host);
    }
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    out
}
