//! Response body rewriting.

const BODY_CLOSE: &[u8] = b"</body>";

/// Insert `script` before the last `</body>`, or append it when there is none.
pub fn inject_before_body_close(content: &[u8], script: &str) -> Vec<u8> {
    let pos = content
        .windows(BODY_CLOSE.len())
        .rposition(|w| w.eq_ignore_ascii_case(BODY_CLOSE))
        .unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + script.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(script.as_bytes());
    result.extend_from_slice(&content[pos..]);
    result
}
