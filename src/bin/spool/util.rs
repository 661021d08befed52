/// Renders a script line for logs, escaping anything that isn't printable
/// ASCII.
pub(crate) fn bytes_to_human_str(input: &[u8]) -> String {
    input.escape_ascii().to_string()
}
