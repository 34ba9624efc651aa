/// Fragments joined by newlines, UTF-8, no trailing newline.
pub fn render(fragments: &[String]) -> Vec<u8> {
    fragments.join("\n").into_bytes()
}
