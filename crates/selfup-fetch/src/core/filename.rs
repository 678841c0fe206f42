//! Choosing the on-disk name of a downloaded installer.

use url::Url;

/// Name used when neither the URI nor the response names the file.
#[cfg(windows)]
pub const FALLBACK_FILE_NAME: &str = "Setup.exe";
#[cfg(not(windows))]
pub const FALLBACK_FILE_NAME: &str = "setup";

/// Pick a file name for a download.
///
/// A name from the `Content-Disposition` header wins over the last segment of
/// the URI path. Only the final path component of either is used.
pub fn resolve_file_name(content_disposition: Option<&str>, url: &Url) -> String {
    content_disposition
        .and_then(content_disposition_file_name)
        .or_else(|| uri_file_name(url))
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Last non-empty path segment of `url`, percent-decoded.
pub fn uri_file_name(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(segment).ok()?;
    sanitize(&decoded)
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// `filename*=UTF-8''...` takes precedence over a plain `filename=`.
pub fn content_disposition_file_name(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in split_params(header).into_iter().skip(1) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "filename" => plain = Some(unquote(value)),
            "filename*" => extended = decode_ext_value(value),
            _ => {}
        }
    }

    extended
        .and_then(|name| sanitize(&name))
        .or_else(|| plain.and_then(|name| sanitize(&name)))
}

/// Split on `;` outside of quoted strings.
fn split_params(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (i, c) in header.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&header[start..]);
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// RFC 5987 `charset'lang'value`. Only UTF-8 (and its ASCII subset) is
/// understood.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _lang = parts.next()?;
    let encoded = parts.next()?;
    if !charset.eq_ignore_ascii_case("utf-8") && !charset.eq_ignore_ascii_case("us-ascii") {
        return None;
    }
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}

/// Reduce to a bare file name that cannot escape the target folder.
fn sanitize(name: &str) -> Option<String> {
    let name = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim();
    match name {
        "" | "." | ".." => None,
        _ if name.contains('\0') => None,
        _ => Some(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url { Url::parse(s).unwrap() }

    #[test]
    fn test_uri_file_name() {
        assert_eq!(
            uri_file_name(&url("https://example.org/dl/Setup%20v2.exe?x=1")).as_deref(),
            Some("Setup v2.exe")
        );
        assert_eq!(uri_file_name(&url("https://example.org/dl/")), None);
        assert_eq!(uri_file_name(&url("https://example.org")), None);
        assert_eq!(uri_file_name(&url("https://example.org/a/%2e%2e")), None);
    }

    #[test]
    fn test_content_disposition_plain() {
        assert_eq!(
            content_disposition_file_name(r#"attachment; filename="Product Setup.exe""#).as_deref(),
            Some("Product Setup.exe")
        );
        assert_eq!(
            content_disposition_file_name("attachment; filename=setup.msi").as_deref(),
            Some("setup.msi")
        );
        assert_eq!(
            content_disposition_file_name(r#"attachment; filename="a;b.exe"; size=10"#).as_deref(),
            Some("a;b.exe")
        );
    }

    #[test]
    fn test_content_disposition_extended_wins() {
        let header = r#"attachment; filename="fallback.exe"; filename*=UTF-8''%C3%A9t%C3%A9.exe"#;
        assert_eq!(content_disposition_file_name(header).as_deref(), Some("été.exe"));
    }

    #[test]
    fn test_content_disposition_strips_directories() {
        assert_eq!(
            content_disposition_file_name(r#"attachment; filename="..\..\evil.exe""#).as_deref(),
            Some("....evil.exe")
        );
        assert_eq!(
            content_disposition_file_name(r#"attachment; filename="..\\..\\evil.exe""#).as_deref(),
            Some("evil.exe")
        );
        assert_eq!(
            content_disposition_file_name(r#"attachment; filename="C:\\Windows\\evil.exe""#).as_deref(),
            Some("evil.exe")
        );
        assert_eq!(
            content_disposition_file_name(r#"attachment; filename="/etc/passwd""#).as_deref(),
            Some("passwd")
        );
        assert_eq!(content_disposition_file_name(r#"attachment; filename="..""#), None);
        assert_eq!(content_disposition_file_name("inline"), None);
    }

    #[test]
    fn test_resolve_file_name_precedence() {
        let u = url("https://example.org/files/Setup.exe");
        assert_eq!(
            resolve_file_name(Some(r#"attachment; filename="Other.exe""#), &u),
            "Other.exe"
        );
        assert_eq!(resolve_file_name(Some("attachment"), &u), "Setup.exe");
        assert_eq!(resolve_file_name(None, &u), "Setup.exe");
        assert_eq!(
            resolve_file_name(None, &url("https://example.org/")),
            FALLBACK_FILE_NAME
        );
    }
}
