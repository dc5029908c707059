//! Remote location of an e-print.

use crate::config::EPRINT_PATH;
use crate::identifier::Identifier;
use url::Url;

/// Builds `<base>/e-print/<identifier>`.
///
/// Any path already present on `base` is replaced, and query and fragment
/// are cleared. Each identifier segment is percent-encoded by `url` only
/// where path syntax requires it, so `1910.02474` stays readable while `#`
/// or `?` cannot turn into a fragment or query.
///
/// ```
/// use fetcher::{resolve_url, Identifier};
/// use url::Url;
///
/// let base = Url::parse("https://arxiv.org").unwrap();
/// let id = Identifier::new("1910.02474").unwrap();
/// assert_eq!(
///     resolve_url(&base, &id).as_str(),
///     "https://arxiv.org/e-print/1910.02474"
/// );
/// ```
pub fn resolve_url(base: &Url, identifier: &Identifier) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);

    // `base` comes from an http(s) URL, which always has a path to extend.
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(EPRINT_PATH).extend(identifier.segments());
    }

    url
}
