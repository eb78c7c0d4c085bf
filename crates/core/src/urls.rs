use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters left untouched by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn search_url(
    base_url: &str,
    term: &str,
    media: &str,
    limit: u32,
) -> Result<Url, url::ParseError> {
    let base = base_url.trim_end_matches('/');
    let term = utf8_percent_encode(term, COMPONENT);
    let media = utf8_percent_encode(media, COMPONENT);
    Url::parse(&format!(
        "{base}/search?term={term}&media={media}&limit={limit}"
    ))
}
