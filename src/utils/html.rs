//! HTML escaping utilities.

/// Escape HTML special characters for safe rendering in text and attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape_basic() {
        assert_eq!(html_escape("Constitución"), "Constitución");
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("Ley 100 & decretos"), "Ley 100 &amp; decretos");
        assert_eq!(html_escape("l'acte"), "l&#39;acte");
    }

    #[test]
    fn test_html_escape_attribute() {
        assert_eq!(
            html_escape("<a title=\"art. 86\">tutela</a>"),
            "&lt;a title=&quot;art. 86&quot;&gt;tutela&lt;/a&gt;"
        );
    }
}
