//! Pure Business Logic Functions
//!
//! URL-Aufbau und Track-Auswahl, ohne Hardware-Dependencies (testbar!)

use alloc::format;
use alloc::string::String;

/// Normalisiert eine vom Benutzer eingegebene Server-Adresse
///
/// - entfernt Whitespace am Anfang und Ende
/// - entfernt ein führendes `http://` oder `https://` (exakt, case-sensitive)
/// - entfernt alle abschließenden `/`
///
/// Die Schritte werden wiederholt, bis sich nichts mehr ändert. Dadurch gilt
/// `normalize_server(normalize_server(x)) == normalize_server(x)` für jede Eingabe.
/// Eine Validierung als Hostname findet nicht statt.
///
/// # Beispiele
///
/// ```
/// # use esp_core::normalize_server;
/// assert_eq!(normalize_server(" http://music.local/mp3/// "), "music.local/mp3");
/// ```
pub fn normalize_server(raw: &str) -> &str {
    let mut host = raw;
    loop {
        let trimmed = host.trim();
        let stripped = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .unwrap_or(trimmed);
        let next = stripped.trim_end_matches('/');

        if next == host {
            return next;
        }
        host = next;
    }
}

/// Baut eine absolute HTTP-URL aus Host und Pfad
///
/// Fehlt der führende Slash im Pfad, wird er ergänzt.
///
/// ```
/// # use esp_core::{build_url, normalize_server};
/// assert_eq!(build_url(normalize_server("example.com/"), "5.mp3"), "http://example.com/5.mp3");
/// ```
pub fn build_url(host: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("http://{}{}", host, path)
    } else {
        format!("http://{}/{}", host, path)
    }
}

/// Wählt eine Track-Nummer im Bereich `1..=count` aus einer Zufallszahl
pub fn pick_track(random: u32, count: u32) -> u32 {
    1 + random % count.max(1)
}

/// Pfad einer Track-Nummer, z.B. `/7.mp3`
pub fn track_path(track: u32) -> String {
    format!("/{}.mp3", track)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_http_prefix() {
        assert_eq!(normalize_server("http://example.com"), "example.com");
    }

    #[test]
    fn test_normalize_strips_https_prefix() {
        assert_eq!(normalize_server("https://example.com"), "example.com");
    }

    #[test]
    fn test_normalize_strips_all_trailing_slashes() {
        assert_eq!(normalize_server("http://example.com///"), "example.com");
        assert_eq!(normalize_server("example.com/music/"), "example.com/music");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(normalize_server("  example.com/ \r\n"), "example.com");
    }

    #[test]
    fn test_normalize_prefix_is_case_sensitive() {
        assert_eq!(normalize_server("HTTP://example.com"), "HTTP://example.com");
    }

    #[test]
    fn test_normalize_empty_and_slashes_only() {
        assert_eq!(normalize_server(""), "");
        assert_eq!(normalize_server("///"), "");
        assert_eq!(normalize_server("http://"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "http://example.com/",
            "https://a.b/c//",
            " http://host ",
            "http://http://nested/",
            "http:// spaced /",
            "plain",
            "",
        ];
        for input in inputs {
            let once = normalize_server(input);
            assert_eq!(normalize_server(once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_build_url_with_leading_slash() {
        assert_eq!(build_url("example.com", "/5.mp3"), "http://example.com/5.mp3");
    }

    #[test]
    fn test_build_url_inserts_missing_slash() {
        assert_eq!(
            build_url("example.com", "no-leading-slash.mp3"),
            "http://example.com/no-leading-slash.mp3"
        );
    }

    #[test]
    fn test_build_url_from_normalized_host() {
        assert_eq!(
            build_url(normalize_server("example.com/"), "5.mp3"),
            "http://example.com/5.mp3"
        );
    }

    #[test]
    fn test_pick_track_range() {
        assert_eq!(pick_track(0, 10), 1);
        assert_eq!(pick_track(9, 10), 10);
        assert_eq!(pick_track(10, 10), 1);
        assert_eq!(pick_track(u32::MAX, 10), 6);
    }

    #[test]
    fn test_pick_track_zero_count() {
        assert_eq!(pick_track(12345, 0), 1);
    }

    #[test]
    fn test_track_path() {
        assert_eq!(track_path(7), "/7.mp3");
    }
}
