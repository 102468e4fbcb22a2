//! 字符串判断、反转、填充以及前后缀匹配。
//!
//! 长度一律按 `char` 计算。

/// `None` 或长度为 0 时返回 `true`。
#[must_use]
pub fn is_empty(text: Option<&str>) -> bool {
    text.is_none_or(str::is_empty)
}

/// `None` 或只包含空白字符（含空字符串）时返回 `true`。
#[must_use]
pub fn is_blank(text: Option<&str>) -> bool {
    text.is_none_or(|t| t.chars().all(char::is_whitespace))
}

/// 按字符反转字符串，例如 `"aBcDeF"` 变为 `"FeDcBa"`。
#[must_use]
pub fn reverse(text: Option<&str>) -> Option<String> {
    text.map(|t| t.chars().rev().collect())
}

/// 在左侧用 `pad` 补齐到 `expected_len` 个字符，已经足够长时原样返回。
#[must_use]
pub fn pad_leading(text: &str, pad: char, expected_len: usize) -> String {
    let missing = expected_len.saturating_sub(text.chars().count());
    let mut padded: String = std::iter::repeat_n(pad, missing).collect();
    padded.push_str(text);
    padded
}

/// 在右侧用 `pad` 补齐到 `expected_len` 个字符，已经足够长时原样返回。
#[must_use]
pub fn pad_trailing(text: &str, pad: char, expected_len: usize) -> String {
    let missing = expected_len.saturating_sub(text.chars().count());
    let mut padded = text.to_string();
    padded.extend(std::iter::repeat_n(pad, missing));
    padded
}

/// 是否以任意一个候选前缀开头。候选列表为空时返回 `false`。
#[must_use]
pub fn starts_with_any<S: AsRef<str>>(text: &str, prefixes: &[S]) -> bool {
    prefixes.iter().any(|p| text.starts_with(p.as_ref()))
}

/// 忽略大小写的 [`starts_with_any`]。
#[must_use]
pub fn starts_with_any_ignore_case<S: AsRef<str>>(text: &str, prefixes: &[S]) -> bool {
    let text = text.to_lowercase();
    prefixes
        .iter()
        .any(|p| text.starts_with(&p.as_ref().to_lowercase()))
}

/// 是否以任意一个候选后缀结尾。候选列表为空时返回 `false`。
#[must_use]
pub fn ends_with_any<S: AsRef<str>>(text: &str, suffixes: &[S]) -> bool {
    suffixes.iter().any(|s| text.ends_with(s.as_ref()))
}

/// 忽略大小写的 [`ends_with_any`]。
#[must_use]
pub fn ends_with_any_ignore_case<S: AsRef<str>>(text: &str, suffixes: &[S]) -> bool {
    let text = text.to_lowercase();
    suffixes
        .iter()
        .any(|s| text.ends_with(&s.as_ref().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_or_empty() {
        let cases = [
            (Some("text"), false, false),
            (None, true, true),
            (Some(""), true, true),
            (Some(" "), false, true),
            (Some("_"), false, false),
            (Some("\t\n"), false, true),
        ];
        for (text, empty, blank) in cases {
            assert_eq!(is_empty(text), empty, "{text:?}");
            assert_eq!(is_blank(text), blank, "{text:?}");
        }
    }

    #[test]
    fn test_reverse() {
        assert_eq!(reverse(None), None);
        assert_eq!(reverse(Some("a")).as_deref(), Some("a"));
        assert_eq!(reverse(Some("xyz")).as_deref(), Some("zyx"));
        assert_eq!(reverse(Some("abba")).as_deref(), Some("abba"));
        assert_eq!(reverse(Some("aBcDeF")).as_deref(), Some("FeDcBa"));
    }

    #[test]
    fn test_padding() {
        let cases = [
            ("", 'a', 5, "aaaaa", "aaaaa"),
            ("xyz", '_', 4, "_xyz", "xyz_"),
            ("xyz", '_', 2, "xyz", "xyz"),
            ("pl", 'Ą', 5, "ĄĄĄpl", "plĄĄĄ"),
            ("", 'x', 1, "x", "x"),
        ];
        for (text, pad, len, leading, trailing) in cases {
            assert_eq!(pad_leading(text, pad, len), leading);
            assert_eq!(pad_trailing(text, pad, len), trailing);
        }
    }

    #[test]
    fn test_starts_with() {
        let cases: [(bool, bool, &[&str]); 9] = [
            (false, false, &[]),
            (true, true, &["a"]),
            (true, true, &["a", "b", "c"]),
            (false, false, &["d"]),
            (false, true, &["A"]),
            (true, true, &["abc"]),
            (false, true, &["aBc"]),
            (false, false, &["abcd"]),
            (false, false, &["c"]),
        ];
        for (expected, expected_ignore_case, prefixes) in cases {
            assert_eq!(starts_with_any("abc", prefixes), expected, "{prefixes:?}");
            assert_eq!(
                starts_with_any_ignore_case("abc", prefixes),
                expected_ignore_case,
                "{prefixes:?}"
            );
        }
    }

    #[test]
    fn test_ends_with() {
        let cases: [(bool, bool, &[&str]); 10] = [
            (false, false, &[]),
            (true, true, &["c"]),
            (true, true, &["a", "b", "c"]),
            (false, false, &["d"]),
            (false, true, &["C"]),
            (true, true, &["abc"]),
            (false, false, &["cb"]),
            (false, true, &["aBc"]),
            (false, false, &["_abc"]),
            (false, false, &["a"]),
        ];
        for (expected, expected_ignore_case, suffixes) in cases {
            assert_eq!(ends_with_any("abc", suffixes), expected, "{suffixes:?}");
            assert_eq!(
                ends_with_any_ignore_case("abc", suffixes),
                expected_ignore_case,
                "{suffixes:?}"
            );
        }
    }

    #[test]
    fn test_accepts_owned_candidates() {
        let owned = vec![String::from("ab")];
        assert!(starts_with_any("abc", &owned));
        assert!(!ends_with_any("abc", &owned));
    }
}
