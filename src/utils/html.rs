use ammonia;

/// Clean faculty-authored rich text using the ammonia library.
///
/// Quiz titles, descriptions and question text are rendered in the
/// browser, so this applies whitelist-based sanitization: safe tags
/// (like <b>, <p>) survive while dangerous tags (like <script>,
/// <iframe>) and attributes (like onclick) are stripped.
///
/// Note: plain text such as "O(n^2)" or "a < b" passes through with
/// entity escaping only, which the frontend decodes on display.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
