//! JSON decoding with readable failure messages for upstream APIs.

use anyhow::Result;

/// Decode `body` as `T`. On failure the error names the JSON path of the
/// offending value and quotes the surrounding text of the payload.
pub fn decode_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let inner = err.inner();
        let (line, column) = (inner.line(), inner.column());
        let path = err.path().to_string();

        let message = inner.to_string();
        let message = message
            .split(" at line ")
            .next()
            .unwrap_or(&message)
            .to_string();

        let location = if path.is_empty() || path == "." {
            String::new()
        } else {
            format!("at '{path}': ")
        };

        anyhow::anyhow!(
            "{location}{message} (line {line} col {column})\n{}",
            excerpt(body, line, column, 24)
        )
    })
}

/// A window of `width` characters of `body` around the 1-based `line`/`column`,
/// with a caret under the error position.
fn excerpt(body: &str, line: usize, column: usize, width: usize) -> String {
    let text: Vec<char> = body
        .lines()
        .nth(line.saturating_sub(1))
        .unwrap_or("")
        .chars()
        .collect();
    if text.is_empty() {
        return "(empty line)".to_string();
    }

    let at = column.saturating_sub(1).min(text.len());
    let start = at.saturating_sub(width / 2);
    let end = (at + width / 2).min(text.len());
    let window: String = text[start..end].iter().collect();

    format!("  {window}\n  {}^", " ".repeat(at - start))
}
