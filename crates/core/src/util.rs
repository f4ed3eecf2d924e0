use url::Url;

pub trait UrlExt {
    fn with_path(&self, path: &str) -> Url;
    fn with_query_pairs(&self, pairs: &[(&str, &str)]) -> Url;
}

impl UrlExt for Url {
    #[inline]
    fn with_path(&self, path: &str) -> Url {
        let mut out = self.clone();
        out.set_path(path);
        out.set_query(None);
        out
    }

    /// Replaces the query string. Empty values are written as bare keys.
    fn with_query_pairs(&self, pairs: &[(&str, &str)]) -> Url {
        let mut out = self.clone();
        out.set_query(None);
        if pairs.is_empty() {
            return out;
        }
        {
            let mut query = out.query_pairs_mut();
            for &(key, value) in pairs {
                if value.is_empty() {
                    query.append_key_only(key);
                } else {
                    query.append_pair(key, value);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query_pairs() {
        let base = Url::parse("https://og.example.com/?x=1").unwrap();
        let url = base.with_path("/render").with_query_pairs(&[
            ("title", "Start Your Career"),
            ("theme", "purple"),
            ("ratio", "4:5"),
        ]);
        assert_eq!(
            url.as_str(),
            "https://og.example.com/render?title=Start+Your+Career&theme=purple&ratio=4%3A5"
        );
        assert_eq!(base.with_query_pairs(&[]).as_str(), "https://og.example.com/");
        let url = base.with_query_pairs(&[("debug", "")]);
        assert_eq!(url.as_str(), "https://og.example.com/?debug");
    }
}
