// ============================================================================
// Axe vertical : pas des graduations
// ============================================================================
// Choisit un pas "rond" (multiple d'une puissance de dix) pour 3 intervalles,
// soit 4 lignes horizontales : 0, pas, 2·pas, 3·pas
// ============================================================================

/// Nombre d'intervalles sur l'axe Y (4 lignes en comptant zéro)
pub const Y_TICKS: u64 = 3;

/// Plus grande échelle essayée par `step`
const MAX_ROUND: u64 = 1_000_000;

/// Pas arrondi pour `ticks` intervalles jusqu'à `max`
///
/// 1. max == 0 → 0
/// 2. pas naïf = max / ticks (division entière), 0 → 0
/// 3. échelle = plus grande puissance de dix (≤ 1 000 000) telle que
///    échelle × ticks ≤ max
/// 4. pas = pas naïf tronqué au multiple de l'échelle
///
/// Le résultat est toujours ≤ max / ticks.
pub fn step(max: u64, ticks: u64) -> u64 {
    if max == 0 || ticks == 0 {
        return 0;
    }

    let naive = max / ticks;
    if naive == 0 {
        return 0;
    }

    // Termine toujours : l'échelle descend jusqu'à 1, et 1 × ticks ≤ max ici
    let mut round = MAX_ROUND;
    while round > 1 && max < round.saturating_mul(ticks) {
        round /= 10;
    }

    naive / round * round
}

/// Pas utilisé pour le rendu : jamais 0 (évite un axe de hauteur nulle)
pub fn effective_step(max: u64, ticks: u64) -> u64 {
    match step(max, ticks) {
        0 => 1,
        s => s,
    }
}

/// Valeurs des lignes horizontales, limitées à `max`
pub fn gridline_values(max: u64) -> Vec<u64> {
    let step = effective_step(max, Y_TICKS);
    (0..=Y_TICKS)
        .map(|i| i * step)
        .filter(|&value| value <= max)
        .collect()
}

// ============================================================================
// Tests unitaires
// ============================================================================
