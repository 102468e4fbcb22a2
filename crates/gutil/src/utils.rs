//! 包含一些 XML 相关工具函数的模块。

use std::borrow::Cow;

/// 判断文本是否只由 XML 空白字符（空格、制表符、换行、回车）组成。
///
/// 空字符串同样视为空白。
pub(crate) fn is_xml_blank(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

/// 是否为合法的 `NameStartChar` (XML 1.0 §2.3 [4])。
fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// 是否为合法的 `NameChar` (XML 1.0 §2.3 [4a])。
fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// 校验元素名、属性名或处理指令目标是否符合 XML 的 `Name` 产生式。
pub(crate) fn is_valid_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// 将 `&name;` 形式的实体引用解析为字符。
///
/// 只认识五个预定义实体和数字字符引用；未知实体返回 `None`。
pub(crate) fn resolve_entity(entity_name: &str) -> Option<char> {
    if let Some(num_str) = entity_name.strip_prefix('#') {
        let (radix, code_point_str) = if let Some(stripped) = num_str.strip_prefix('x') {
            (16, stripped)
        } else {
            (10, num_str)
        };
        return u32::from_str_radix(code_point_str, radix)
            .ok()
            .and_then(char::from_u32);
    }

    match entity_name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// 转义文本内容中的 `&`、`<`、`>` 和回车符。
///
/// 回车符写成字符引用，否则重新解析时会被换行规范化为 `\n`。
pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    escape_with(text, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#13;"),
        _ => None,
    })
}

/// 转义属性值，额外处理引号以及换行、制表和回车符。
pub(crate) fn escape_attribute(value: &str) -> Cow<'_, str> {
    escape_with(value, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&apos;"),
        '\t' => Some("&#9;"),
        '\n' => Some("&#10;"),
        '\r' => Some("&#13;"),
        _ => None,
    })
}

fn escape_with(text: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    if !text.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match replacement(c) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
