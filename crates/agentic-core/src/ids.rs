//! Opaque identifier generation (`<prefix>-<uuid v4>`).

fn prefixed(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

pub fn generate_thread_id() -> String {
    prefixed("thread")
}

pub fn generate_run_id() -> String {
    prefixed("run")
}

pub fn generate_message_id() -> String {
    prefixed("msg")
}

pub fn generate_tool_call_id() -> String {
    prefixed("tool")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_prefixed_and_unique() {
        let a = generate_run_id();
        let b = generate_run_id();
        assert!(a.starts_with("run-"));
        assert_ne!(a, b);
        assert!(generate_thread_id().starts_with("thread-"));
        assert!(generate_message_id().starts_with("msg-"));
        assert!(generate_tool_call_id().starts_with("tool-"));
    }
}
