use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

use crate::sources::SourceValue;

/// Render a value for an env-style line, base64-encoding its UTF-8 form if
/// asked. The result never contains a raw line break.
pub fn encode(value: &SourceValue, must_base64: bool) -> String {
    let text = value.render();
    if must_base64 {
        escape_newlines(&BASE64_STANDARD.encode(text.as_bytes()))
    } else {
        escape_newlines(&text)
    }
}

/// Replace `\n` with the two characters `\` `n`.
pub fn escape_newlines(s: &str) -> String {
    if !s.contains('\n') {
        return s.to_string();
    }
    s.replace('\n', "\\n")
}
