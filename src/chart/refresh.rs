// ============================================================================
// Rafraîchissement automatique
// ============================================================================
// Minuterie périodique (60 s par défaut) pilotée par les ticks de la boucle
// d'événements. À chaque échéance :
// - la plage affichée contient "maintenant" → nouveau fetch (sans rebâtir
//   le squelette)
// - sinon → rien, la plage ne peut plus recevoir de données
//
// La minuterie est démarrée à l'activation de la vue et annulée au
// démontage : aucune échéance ne peut viser une vue détruite.
// ============================================================================

use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use tracing::trace;

use crate::models::DateRange;

/// Résultat d'un passage de la minuterie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// Minuterie arrêtée (vue non active)
    Inactive,
    /// Échéance pas encore atteinte
    NotDue,
    /// Échéance atteinte mais la plage ne contient pas "maintenant"
    Skip,
    /// Échéance atteinte : relancer le fetch
    Fetch,
}

/// Minuterie de rafraîchissement possédée par la vue
///
/// CONCEPT : Minuterie sans thread
/// - une simple échéance (Option<Instant>) vérifiée à chaque tick de la
///   boucle d'événements
/// - None = arrêtée : rien à annuler ni à joindre au démontage
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    period: Duration,
    next_due: Option<Instant>,
}

impl RefreshScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    /// Démarre la minuterie : première échéance dans une période
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    /// Arrête la minuterie ; retourne false si elle l'était déjà
    pub fn cancel(&mut self) -> bool {
        self.next_due.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Vérifie l'échéance
    ///
    /// `now` sert à l'échéance (horloge monotone), `wall` à savoir si la
    /// plage contient l'instant présent (heure locale). Les périodes
    /// manquées (machine en veille) ne déclenchent qu'un seul passage.
    pub fn poll(&mut self, now: Instant, wall: NaiveDateTime, range: &DateRange) -> RefreshDecision {
        let Some(due) = self.next_due else {
            return RefreshDecision::Inactive;
        };
        if now < due {
            return RefreshDecision::NotDue;
        }

        // CONCEPT : Rattrapage sans rafale
        // - après une veille, plusieurs périodes sont dépassées
        // - on saute à la prochaine échéance future : un seul passage
        let mut next = due + self.period;
        while next <= now {
            next += self.period;
        }
        self.next_due = Some(next);

        if range.contains_instant(wall) {
            trace!(%range, "Refresh tick inside displayed range");
            RefreshDecision::Fetch
        } else {
            trace!(%range, "Refresh tick outside displayed range, skipped");
            RefreshDecision::Skip
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap()
    }

    #[test]
    fn test_inactive_until_started() {
        let mut scheduler = RefreshScheduler::new(Duration::from_secs(60));
        let wall = date(2024, 1, 15).and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(scheduler.poll(Instant::now(), wall, &range()), RefreshDecision::Inactive);
    }

    #[test]
    fn test_fetch_when_range_contains_now() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(Duration::from_secs(60));
        scheduler.start(start);

        let wall = date(2024, 1, 15).and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(scheduler.poll(start + Duration::from_secs(30), wall, &range()), RefreshDecision::NotDue);
        assert_eq!(scheduler.poll(start + Duration::from_secs(60), wall, &range()), RefreshDecision::Fetch);
        assert_eq!(scheduler.poll(start + Duration::from_secs(61), wall, &range()), RefreshDecision::NotDue);
    }

    #[test]
    fn test_skip_when_range_is_past() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(Duration::from_secs(60));
        scheduler.start(start);

        let wall = date(2024, 2, 10).and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(scheduler.poll(start + Duration::from_secs(60), wall, &range()), RefreshDecision::Skip);
    }

    #[test]
    fn test_missed_periods_fire_once() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(Duration::from_secs(60));
        scheduler.start(start);

        let wall = date(2024, 1, 15).and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(scheduler.poll(start + Duration::from_secs(600), wall, &range()), RefreshDecision::Fetch);
        assert_eq!(scheduler.poll(start + Duration::from_secs(601), wall, &range()), RefreshDecision::NotDue);
        assert_eq!(scheduler.poll(start + Duration::from_secs(660), wall, &range()), RefreshDecision::Fetch);
    }

    #[test]
    fn test_cancel_stops_ticks() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(Duration::from_secs(60));
        scheduler.start(start);

        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());
        assert!(!scheduler.is_active());

        let wall = date(2024, 1, 15).and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(scheduler.poll(start + Duration::from_secs(120), wall, &range()), RefreshDecision::Inactive);
    }
}
