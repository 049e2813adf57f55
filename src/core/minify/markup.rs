use regex::Regex;
use std::sync::LazyLock;

// Elements whose content must survive byte for byte.
static PROTECTED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<(pre)\b.*?</pre\s*>|<(textarea)\b.*?</textarea\s*>|<(script)\b.*?</script\s*>|<(style)\b.*?</style\s*>",
    )
    .unwrap()
});

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static TAG_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"> <").unwrap());

// Whitespace next to these never renders, so it can go.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hr", "html", "li", "link", "main", "meta", "nav", "ol", "p", "pre", "script", "section",
    "style", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "ul",
];

/// Name of the tag starting at `tag`; `!` for doctype and other declarations.
fn tag_name(tag: &str) -> &str {
    let rest = tag.trim_start_matches('<');
    if rest.starts_with('!') {
        return "!";
    }
    let rest = rest.trim_start_matches('/');
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    &rest[..end]
}

fn is_block(name: &str) -> bool {
    name == "!" || BLOCK_ELEMENTS.iter().any(|b| b.eq_ignore_ascii_case(name))
}

fn drops_gap(left: &str, right: &str) -> bool {
    is_block(left) || is_block(right)
}

/// Tag name of the last tag opened before `end`.
fn last_tag(text: &str, end: usize) -> Option<&str> {
    text[..end].rfind('<').map(|i| tag_name(&text[i..]))
}

/// Collapse an unprotected fragment. `before` and `after` name the protected
/// elements around it, if any.
fn collapse(fragment: &str, before: Option<&str>, after: Option<&str>) -> String {
    let collapsed = WHITESPACE.replace_all(fragment, " ");
    let text = collapsed.as_ref();

    if text == " " {
        return match (before, after) {
            (Some(left), Some(right)) if drops_gap(left, right) => String::new(),
            _ => text.to_string(),
        };
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for gap in TAG_GAP.find_iter(text) {
        let left = last_tag(text, gap.start()).or(before).unwrap_or("");
        let right = tag_name(&text[gap.end() - 1..]);
        out.push_str(&text[last..=gap.start()]);
        if !drops_gap(left, right) {
            out.push(' ');
        }
        last = gap.end() - 1;
    }
    out.push_str(&text[last..]);

    if let Some(left) = before {
        if out.starts_with(" <") && drops_gap(left, tag_name(&out[1..])) {
            out.remove(0);
        }
    }
    if let Some(right) = after {
        if out.ends_with("> ") {
            let left = last_tag(&out, out.len() - 1).unwrap_or("");
            if drops_gap(left, right) {
                out.pop();
            }
        }
    }
    out
}

fn protected_name(block: &regex::Captures<'_>) -> &'static str {
    match (1..=4).find(|&i| block.get(i).is_some()) {
        Some(1) => "pre",
        Some(2) => "textarea",
        Some(3) => "script",
        _ => "style",
    }
}

/// Remove comments and collapse whitespace to single spaces. Whitespace
/// between two tags is dropped when either tag is block level.
///
/// `pre`, `textarea`, `script` and `style` elements are copied verbatim.
pub fn minify_html(source: &str) -> String {
    let without_comments = COMMENT.replace_all(source, "");
    let text = without_comments.as_ref();

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut before = None;
    for block in PROTECTED_BLOCK.captures_iter(text) {
        let Some(whole) = block.get(0) else {
            continue;
        };
        let name = protected_name(&block);
        out.push_str(&collapse(&text[last..whole.start()], before, Some(name)));
        out.push_str(whole.as_str());
        last = whole.end();
        before = Some(name);
    }
    out.push_str(&collapse(&text[last..], before, None));

    out.trim().to_string()
}
