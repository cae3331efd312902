use percent_encoding::{percent_encode, AsciiSet, CONTROLS};

/// https://url.spec.whatwg.org/#fragment-percent-encode-set
const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// https://url.spec.whatwg.org/#path-percent-encode-set
const PATH: &AsciiSet = &FRAGMENT.add(b'#').add(b'?').add(b'{').add(b'}');

/// https://url.spec.whatwg.org/#userinfo-percent-encode-set
const USERINFO: &AsciiSet = &PATH
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'|');

/// `+`, `%`, `&` and `,` have meaning for PubNub API and must be escaped
/// inside path segments and query values.
const PUBNUB_SET: &AsciiSet = &USERINFO.add(b'+').add(b'%').add(b'&').add(b',').add(b'$');

/// Percent-encode data for use in URL path segment or query value.
pub fn url_encode(data: &[u8]) -> String {
    percent_encode(data, PUBNUB_SET).to_string()
}

/// Join list of encoded strings.
///
/// Separator itself is kept as-is, which is how multiplexed channel lists are
/// sent in subscribe and heartbeat paths.
pub fn join_url_encoded<S>(strings: &[S], sep: &str) -> Option<String>
where
    S: AsRef<str>,
{
    if strings.is_empty() {
        return None;
    }

    Some(
        strings
            .iter()
            .map(|val| url_encode(val.as_ref().as_bytes()))
            .collect::<Vec<String>>()
            .join(sep),
    )
}

#[cfg(test)]
mod should {
    use super::*;
    use test_case::test_case;

    #[test_case("demo", "demo" ; "plain name")]
    #[test_case("a b", "a%20b" ; "space")]
    #[test_case("{\"a\":\"b\"}", "%7B%22a%22%3A%22b%22%7D" ; "json object")]
    #[test_case("1+1=2", "1%2B1%3D2" ; "plus and equal signs")]
    #[test_case("a,b&c", "a%2Cb%26c" ; "separators")]
    #[test_case("a.*", "a.*" ; "wildcard")]
    fn encode_value(input: &str, expected: &str) {
        assert_eq!(url_encode(input.as_bytes()), expected);
    }

    #[test]
    fn join_names_keeping_separator() {
        assert_eq!(
            join_url_encoded(&["ch 1", "ch,2"], ","),
            Some("ch%201,ch%2C2".into())
        );
        assert_eq!(join_url_encoded::<&str>(&[], ","), None);
    }
}
