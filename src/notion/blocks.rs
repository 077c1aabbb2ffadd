//! Markdown to Notion block conversion.
//!
//! Only the constructs our reports produce are recognised: ATX headings,
//! bullet and numbered items, quotes, fenced code, dividers and paragraphs.
//! Inline markup is passed through as plain text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};

/// Notion rejects rich-text objects longer than this many characters.
pub const RICH_TEXT_LIMIT: usize = 2000;

static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+(.*)$").expect("static regex"));

const CODE_LANGUAGES: &[&str] = &[
    "bash", "c", "c++", "css", "go", "html", "java", "javascript", "json", "markdown", "python",
    "rust", "shell", "sql", "typescript", "yaml",
];

/// Split `text` into rich-text objects of at most [`RICH_TEXT_LIMIT`] characters.
pub fn rich_text(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": content } })
        })
        .collect()
}

fn text_block(kind: &str, text: &str) -> Value {
    json!({
        "object": "block",
        "type": kind,
        kind: { "rich_text": rich_text(text) }
    })
}

fn code_block(language: &str, code: &str) -> Value {
    let language = language.trim().to_ascii_lowercase();
    let language = if CODE_LANGUAGES.contains(&language.as_str()) {
        language
    } else {
        "plain text".to_string()
    };
    json!({
        "object": "block",
        "type": "code",
        "code": { "rich_text": rich_text(code), "language": language }
    })
}

fn divider() -> Value {
    json!({ "object": "block", "type": "divider", "divider": {} })
}

/// Convert a Markdown document into a flat list of Notion blocks.
pub fn markdown_to_blocks(markdown: &str) -> Vec<Value> {
    let mut blocks = Vec::new();
    let mut lines = markdown.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(language) = trimmed.strip_prefix("```") {
            let mut code = Vec::new();
            for inner in lines.by_ref() {
                if inner.trim_start().starts_with("```") {
                    break;
                }
                code.push(inner);
            }
            blocks.push(code_block(language, &code.join("\n")));
            continue;
        }

        let block = if matches!(trimmed, "---" | "***" | "___") {
            divider()
        } else if let Some(rest) = trimmed.strip_prefix("# ") {
            text_block("heading_1", rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("## ") {
            text_block("heading_2", rest.trim())
        } else if trimmed.starts_with("###") && trimmed.trim_start_matches('#').starts_with(' ') {
            text_block("heading_3", trimmed.trim_start_matches('#').trim())
        } else if let Some(rest) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            text_block("bulleted_list_item", rest.trim())
        } else if let Some(caps) = NUMBERED.captures(trimmed) {
            text_block("numbered_list_item", caps[1].trim())
        } else if let Some(rest) = trimmed.strip_prefix('>') {
            text_block("quote", rest.trim())
        } else {
            text_block("paragraph", trimmed)
        };
        blocks.push(block);
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(blocks: &[Value]) -> Vec<&str> {
        blocks.iter().map(|b| b["type"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_block_kinds() {
        let md = "# Title\n\n## Section\n#### Deep\n- one\n* two\n1. first\n> quoted\n---\nplain text\n";
        let blocks = markdown_to_blocks(md);
        assert_eq!(
            kinds(&blocks),
            vec![
                "heading_1",
                "heading_2",
                "heading_3",
                "bulleted_list_item",
                "bulleted_list_item",
                "numbered_list_item",
                "quote",
                "divider",
                "paragraph",
            ]
        );
        assert_eq!(blocks[2]["heading_3"]["rich_text"][0]["text"]["content"], "Deep");
        assert_eq!(blocks[5]["numbered_list_item"]["rich_text"][0]["text"]["content"], "first");
    }

    #[test]
    fn test_fenced_code() {
        let md = "```Rust\nfn main() {}\n\nlet x = 1;\n```\nafter";
        let blocks = markdown_to_blocks(md);
        assert_eq!(kinds(&blocks), vec!["code", "paragraph"]);
        assert_eq!(blocks[0]["code"]["language"], "rust");
        assert_eq!(
            blocks[0]["code"]["rich_text"][0]["text"]["content"],
            "fn main() {}\n\nlet x = 1;"
        );

        let blocks = markdown_to_blocks("```brainfuck\n+++\n```");
        assert_eq!(blocks[0]["code"]["language"], "plain text");
    }

    #[test]
    fn test_unterminated_fence_takes_the_rest() {
        let blocks = markdown_to_blocks("```\nline one\nline two");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["code"]["rich_text"][0]["text"]["content"], "line one\nline two");
    }

    #[test]
    fn test_rich_text_splits_long_content() {
        let long = "字".repeat(RICH_TEXT_LIMIT * 2 + 5);
        let parts = rich_text(&long);
        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[0]["text"]["content"].as_str().unwrap().chars().count(),
            RICH_TEXT_LIMIT
        );
        assert_eq!(parts[2]["text"]["content"].as_str().unwrap().chars().count(), 5);
        assert!(rich_text("").is_empty());
    }

    #[test]
    fn test_hashtag_is_not_a_heading() {
        let blocks = markdown_to_blocks("#rustlang trending");
        assert_eq!(kinds(&blocks), vec!["paragraph"]);
    }
}
