/// Finds the closing quote of a JSON string body starting at `x`.
///
/// Returns the index of the quote, skipping backslash escapes. `None` if the
/// input ends first.
pub fn find_ending_quote(data: &[u8], x: usize) -> Option<usize> {
    let mut i = x;
    while i < data.len() {
        match data[i] {
            b'"' => return Some(i),
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    None
}

/// Decodes a JSON string body (between the quotes), resolving escapes.
pub fn decode_json_string(bytes: &[u8]) -> Result<String, String> {
    if let Some(b) = bytes.iter().find(|b| **b < 0x20) {
        return Err(format!("unescaped control character 0x{b:02x}"));
    }
    // Fast path: no backslash
    if !bytes.contains(&b'\\') {
        return std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| e.to_string());
    }
    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'"');
    quoted.extend_from_slice(bytes);
    quoted.push(b'"');
    serde_json::from_slice::<String>(&quoted).map_err(|e| e.to_string())
}
