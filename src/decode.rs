use mailparse::body::Body;
use mailparse::{DispositionType, MailHeaderMap, ParsedMail};

/// Subject and plaintext body of one message, ready for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub subject: String,
    pub body: String,
}

impl NormalizedMessage {
    pub fn from_raw(raw: &[u8]) -> Self {
        match mailparse::parse_mail(raw) {
            Ok(parsed) => Self {
                subject: parsed
                    .headers
                    .get_first_header("Subject")
                    .map(|h| decode_header_text(h.get_value_raw()))
                    .unwrap_or_default(),
                body: extract_plain_text(&parsed),
            },
            Err(e) => {
                tracing::debug!("Unparseable message, classifying raw text: {}", e);
                Self {
                    subject: String::new(),
                    body: String::from_utf8_lossy(raw).trim().to_string(),
                }
            }
        }
    }

    pub fn classification_text(&self) -> String {
        format!("{} {}", self.subject, self.body)
    }
}

/// Unfold a raw header value and decode RFC 2047 encoded-words in it.
/// Surrounding whitespace is trimmed; invalid bytes become U+FFFD.
pub fn decode_header_text(raw: &[u8]) -> String {
    // continuation lines always start with whitespace, so dropping the line
    // breaks is a full unfold
    let unfolded = String::from_utf8_lossy(raw).replace("\r\n", "").replace('\n', "");
    if !unfolded.contains("=?") {
        return unfolded.trim().to_string();
    }

    // mailparse expects a full "Key: value" header line
    let line = format!("Subject: {unfolded}\r\n");
    match mailparse::parse_header(line.as_bytes()) {
        Ok((header, _)) => header.get_value().trim().to_string(),
        Err(_) => unfolded.trim().to_string(),
    }
}

/// Plaintext content of a message: every non-attachment `text/plain` part in
/// order, or the single body of a flat message.
pub fn extract_plain_text(mail: &ParsedMail) -> String {
    let mut parts = Vec::new();
    if mail.subparts.is_empty() {
        parts.push(decode_body(mail));
    } else {
        collect_plain_parts(mail, &mut parts);
    }
    parts.join("\n").trim().to_string()
}

fn collect_plain_parts(mail: &ParsedMail, out: &mut Vec<String>) {
    for part in &mail.subparts {
        if part.get_content_disposition().disposition == DispositionType::Attachment {
            continue;
        }

        if !part.subparts.is_empty() {
            collect_plain_parts(part, out);
        } else if part.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
            out.push(decode_body(part));
        }
    }
}

/// Charset-aware decode, degrading to lossy text of the transfer-decoded bytes,
/// then of the bytes exactly as they arrived.
fn decode_body(part: &ParsedMail) -> String {
    match part.get_body() {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("Body decode failed ({}), falling back to raw bytes", e);
            match part.get_body_raw() {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => encoded_text(part),
            }
        }
    }
}

fn encoded_text(part: &ParsedMail) -> String {
    let body = part.get_body_encoded();
    let raw = match &body {
        Body::Base64(body) | Body::QuotedPrintable(body) => body.get_raw(),
        Body::SevenBit(body) | Body::EightBit(body) => body.get_raw(),
        Body::Binary(body) => body.get_raw(),
    };
    String::from_utf8_lossy(raw).into_owned()
}
