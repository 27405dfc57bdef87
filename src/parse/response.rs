// Response-envelope readers for the chat-completion and image-generation APIs.

use serde_json::Value;

/// Extract the reply text from a chat-completion response.
pub fn extract_reply(payload: &Value) -> Option<String> {
    payload
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Extract the model name the service reports having used.
pub fn extract_model(payload: &Value) -> Option<String> {
    payload
        .get("model")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Extract usage statistics and format as a display string
pub fn extract_usage_line(payload: &Value) -> String {
    if let Some(usage) = payload.get("usage") {
        let input = usage
            .get("prompt_tokens")
            .or_else(|| usage.get("input_tokens"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let output = usage
            .get("completion_tokens")
            .or_else(|| usage.get("output_tokens"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let total = usage
            .get("total_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(input + output);
        return format!("usage(input={input}, output={output}, total={total})");
    }
    "usage(unknown)".to_string()
}

/// Extract the retrievable reference of the first generated image.
pub fn extract_image_url(payload: &Value) -> Option<String> {
    payload
        .get("data")
        .and_then(|v| v.as_array())
        .and_then(|data| data.first())
        .and_then(|item| item.get("url"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// The prompt the image service actually rendered, when it rewrote ours.
pub fn extract_revised_prompt(payload: &Value) -> Option<String> {
    payload
        .get("data")
        .and_then(|v| v.as_array())
        .and_then(|data| data.first())
        .and_then(|item| item.get("revised_prompt"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_is_trimmed_first_choice() {
        let payload = json!({
            "model": "gpt-3.5-turbo-0125",
            "choices": [
                { "message": { "role": "assistant", "content": "\n  Moody blues.  \n" } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        });
        assert_eq!(extract_reply(&payload).as_deref(), Some("Moody blues."));
        assert_eq!(
            extract_model(&payload).as_deref(),
            Some("gpt-3.5-turbo-0125")
        );
    }

    #[test]
    fn blank_or_missing_reply_is_none() {
        assert_eq!(extract_reply(&json!({ "choices": [] })), None);
        assert_eq!(
            extract_reply(&json!({ "choices": [{ "message": { "content": "   " } }] })),
            None
        );
        assert_eq!(extract_reply(&json!({ "raw": "<html>" })), None);
    }

    #[test]
    fn usage_line_reads_chat_counters() {
        let payload = json!({
            "usage": { "prompt_tokens": 120, "completion_tokens": 380, "total_tokens": 500 }
        });
        assert_eq!(
            extract_usage_line(&payload),
            "usage(input=120, output=380, total=500)"
        );
        assert_eq!(extract_usage_line(&json!({})), "usage(unknown)");
    }

    #[test]
    fn image_url_comes_from_first_entry() {
        let payload = json!({
            "created": 1,
            "data": [{ "url": "https://img.example.com/a.png", "revised_prompt": "A dusk street" }]
        });
        assert_eq!(
            extract_image_url(&payload).as_deref(),
            Some("https://img.example.com/a.png")
        );
        assert_eq!(
            extract_revised_prompt(&payload).as_deref(),
            Some("A dusk street")
        );
        assert_eq!(extract_image_url(&json!({ "data": [] })), None);
    }
}
