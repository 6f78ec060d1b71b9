// ============================================================================
// Formatage des nombres
// ============================================================================
// Valeurs des graduations : "950", "1.2K", "3.4M"
// ============================================================================

/// Formate un compteur de manière compacte
///
/// # Exemple
/// format_pretty(1250) == "1.3K"
pub fn format_pretty(value: u64) -> String {
    const SUFFIXES: [(u64, &str); 3] = [(1_000, "K"), (1_000_000, "M"), (1_000_000_000, "B")];

    if value < 1_000 {
        return value.to_string();
    }

    // Une décimale, arrondie au plus proche, ".0" supprimé.
    // L'arrondi peut atteindre 1000 (999 950 -> "1000K") : on passe alors
    // à l'unité suivante.
    let mut tenths = 0.0;
    let mut suffix = "";
    for (unit, unit_suffix) in SUFFIXES {
        if value < unit {
            break;
        }
        tenths = (value as f64 / unit as f64 * 10.0).round() / 10.0;
        suffix = unit_suffix;
        if tenths < 1000.0 {
            break;
        }
    }

    let text = format!("{:.1}", tenths);
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{}{}", text, suffix)
}

/// Séparateur de milliers pour les totaux ("12 345")
pub fn format_grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty() {
        assert_eq!(format_pretty(0), "0");
        assert_eq!(format_pretty(999), "999");
        assert_eq!(format_pretty(1000), "1K");
        assert_eq!(format_pretty(1250), "1.3K");
        assert_eq!(format_pretty(400_000), "400K");
        assert_eq!(format_pretty(3_400_000), "3.4M");
        // L'arrondi fait changer d'unité
        assert_eq!(format_pretty(999_950), "1M");
        assert_eq!(format_pretty(999_949), "999.9K");
        assert_eq!(format_pretty(999_960_000), "1B");
        assert_eq!(format_pretty(2_000_000_000), "2B");
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(7), "7");
        assert_eq!(format_grouped(1234), "1 234");
        assert_eq!(format_grouped(1234567), "1 234 567");
    }
}
