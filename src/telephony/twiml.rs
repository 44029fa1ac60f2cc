//! `TwiML` markup returned to the telephony provider on call arrival

/// Build a response instructing the provider to open a bidirectional media
/// stream to `stream_url`
#[must_use]
pub fn connect_stream(stream_url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Connect>
        <Stream url="{}" />
    </Connect>
</Response>
"#,
        escape_attr(stream_url)
    )
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
