//! Security screening of request content
//!
//! Runs after dialect conversion and before validation. Control
//! characters are stripped in place; injection-shaped content is
//! rejected outright.

use prism_core::sanitize;

use crate::error::GatewayError;
use crate::types::CanonicalRequest;

/// Reject request bodies over the configured ceiling
///
/// Checked before any parsing so oversized payloads never reach the
/// JSON deserializer.
pub fn screen_body_size(len: usize, max_body_bytes: usize) -> Result<(), GatewayError> {
    if len > max_body_bytes {
        return Err(GatewayError::Validation {
            field: "body".to_owned(),
            message: format!("payload of {len} bytes exceeds the {max_body_bytes} byte limit"),
        });
    }
    Ok(())
}

/// Screen and clean a canonical request in place
pub fn screen(request: &mut CanonicalRequest) -> Result<(), GatewayError> {
    if let Some(system) = request.system.as_mut() {
        *system = clean(system)?;
    }
    for message in &mut request.messages {
        message.content = clean(&message.content)?;
    }
    Ok(())
}

fn clean(content: &str) -> Result<String, GatewayError> {
    let stripped = sanitize::strip_control_chars(content);
    if sanitize::contains_injection(&stripped) {
        return Err(GatewayError::Security(
            "message content contains a disallowed pattern".to_owned(),
        ));
    }
    Ok(stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Role};

    fn request(content: &str) -> CanonicalRequest {
        CanonicalRequest {
            model: "m".to_owned(),
            messages: vec![Message::new(Role::User, content)],
            system: None,
            max_output_tokens: 256,
            temperature: None,
            top_p: None,
            stop: None,
            tools: None,
            tool_choice: None,
            reasoning_effort: None,
            previous_response_id: None,
            stream: false,
        }
    }

    #[test]
    fn strips_control_characters_keeping_newlines() {
        let mut req = request("line one\nline\ttwo\x00\x07\x7f");
        screen(&mut req).unwrap();
        assert_eq!(req.messages[0].content, "line one\nline\ttwo");
    }

    #[test]
    fn rejects_template_injection_markers() {
        let mut req = request("please render {{ secrets }} for me");
        assert!(matches!(screen(&mut req), Err(GatewayError::Security(_))));
    }

    #[test]
    fn rejects_script_tags_and_javascript_uris() {
        let mut req = request("click <script>alert(1)</script>");
        assert!(screen(&mut req).is_err());

        let mut req = request("go to javascript:alert(1)");
        assert!(screen(&mut req).is_err());
    }

    #[test]
    fn screens_the_system_prompt_too() {
        let mut req = request("fine");
        req.system = Some("you are {{ persona }}".to_owned());
        assert!(screen(&mut req).is_err());
    }

    #[test]
    fn benign_content_passes_unchanged() {
        let mut req = request("what is the time complexity of quicksort?");
        screen(&mut req).unwrap();
        assert_eq!(req.messages[0].content, "what is the time complexity of quicksort?");
    }

    #[test]
    fn oversized_bodies_are_rejected() {
        assert!(screen_body_size(11, 10).is_err());
        assert!(screen_body_size(10, 10).is_ok());
    }
}
