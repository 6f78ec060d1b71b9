// ============================================================================
// Structure : DateRange
// ============================================================================
// Plage de dates affichée par le graphique (bornes incluses, start <= end)
//
// CONCEPTS RUST :
// 1. NaiveDate : un jour calendaire sans fuseau horaire
//    - L'itération jour par jour ne dépend pas de la durée d'une journée,
//      donc les changements d'heure (DST) ne sautent ni ne dupliquent de jour
// 2. Copy : la plage est petite (deux dates), on la copie librement
// ============================================================================

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Format des dates échangées avec l'API (`yyyy-MM-dd`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Plage de dates inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// Premier jour affiché
    pub start: NaiveDate,

    /// Dernier jour affiché (inclus)
    pub end: NaiveDate,
}

impl DateRange {
    /// Crée une plage, refuse start > end
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            anyhow::bail!(
                "La date de début ({}) est postérieure à la date de fin ({})",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            );
        }
        Ok(Self { start, end })
    }

    /// Plage d'un seul jour
    pub fn single_day(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// Plage par défaut du serveur : du 1er du mois jusqu'à aujourd'hui
    pub fn month_to_date(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        Self { start, end: today }
    }

    /// Plage depuis les paramètres `start_date` / `end_date`
    ///
    /// Comme côté serveur : fin absente = aujourd'hui, début absent = 1er
    /// du mois de la fin. Chaque valeur fournie doit être une date valide.
    pub fn from_params(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Result<Self> {
        let end = match end {
            Some(raw) => parse_date_param(raw)?,
            None => today,
        };
        let start = match start {
            Some(raw) => parse_date_param(raw)?,
            None => end.with_day(1).unwrap_or(end),
        };
        Self::new(start, end)
    }

    /// Nombre de jours calendaires couverts (bornes incluses)
    pub fn day_count(&self) -> usize {
        let days = self.end.signed_duration_since(self.start).num_days();
        usize::try_from(days + 1).unwrap_or(0)
    }

    /// Itère sur chaque jour de la plage, dans l'ordre chronologique
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.day_count())
    }

    /// Instant de début : minuit (heure locale) du premier jour
    pub fn start_instant(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Instant de fin (exclu) : minuit du lendemain du dernier jour
    pub fn end_instant(&self) -> NaiveDateTime {
        self.end
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Vrai si `now` tombe strictement entre le début et la fin de la plage
    ///
    /// C'est la condition du rafraîchissement automatique : seule une plage
    /// qui contient "maintenant" peut encore recevoir des données.
    pub fn contains_instant(&self, now: NaiveDateTime) -> bool {
        self.start_instant() < now && now < self.end_instant()
    }

    /// Décale la plage de sa propre longueur (en avant ou en arrière)
    ///
    /// Retourne None si le décalage sort du calendrier représentable.
    pub fn shifted(&self, forward: bool) -> Option<Self> {
        let len = i64::try_from(self.day_count()).ok()?;
        let delta = if forward {
            Duration::days(len)
        } else {
            Duration::days(-len)
        };

        Some(Self {
            start: self.start.checked_add_signed(delta)?,
            end: self.end.checked_add_signed(delta)?,
        })
    }

    /// Paramètre `start_date` de l'API
    pub fn start_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    /// Paramètre `end_date` de l'API
    pub fn end_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start_param(), self.end_param())
    }
}

/// Valide un paramètre de date : il doit être une date calendaire `yyyy-MM-dd`
///
/// Même règle que la validation côté serveur : tout le reste est rejeté.
pub fn parse_date_param(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("Date invalide : {:?} (format attendu : yyyy-MM-dd)", value))
}

// ============================================================================
// Enum : RangePreset
// ============================================================================
// Plages prédéfinies du sélecteur de dates
// Cycle avec h / l, comme les intervalles d'un graphique boursier
// ============================================================================

/// Plage prédéfinie, résolue par rapport à "aujourd'hui"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePreset {
    Today,
    Yesterday,
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    ThisWeek,
    LastWeek,
    /// Du 1er du mois à aujourd'hui (plage par défaut du serveur)
    #[default]
    MonthToDate,
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
    /// Plage saisie explicitement (--start / --end ou décalage avec [ ])
    Custom,
}

impl RangePreset {
    /// Presets navigables (Custom n'en fait pas partie)
    pub const CYCLE: [RangePreset; 11] = [
        RangePreset::Today,
        RangePreset::Yesterday,
        RangePreset::Last7Days,
        RangePreset::Last30Days,
        RangePreset::ThisWeek,
        RangePreset::LastWeek,
        RangePreset::MonthToDate,
        RangePreset::ThisMonth,
        RangePreset::LastMonth,
        RangePreset::ThisYear,
        RangePreset::LastYear,
    ];

    /// Résout le preset en plage concrète
    ///
    /// Les semaines commencent le lundi. Custom n'a pas de résolution.
    pub fn resolve(&self, today: NaiveDate) -> Option<DateRange> {
        let days_back = |n: i64| today.checked_sub_signed(Duration::days(n));
        let week_start = days_back(i64::from(today.weekday().num_days_from_monday()))?;
        let month_start = today.with_day(1)?;
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;

        let range = match self {
            RangePreset::Today => DateRange::single_day(today),
            RangePreset::Yesterday => DateRange::single_day(days_back(1)?),
            RangePreset::Last7Days => DateRange { start: days_back(6)?, end: today },
            RangePreset::Last30Days => DateRange { start: days_back(29)?, end: today },
            RangePreset::ThisWeek => DateRange {
                start: week_start,
                end: week_start.checked_add_signed(Duration::days(6))?,
            },
            RangePreset::LastWeek => {
                let start = week_start.checked_sub_signed(Duration::days(7))?;
                DateRange { start, end: week_start.pred_opt()? }
            }
            RangePreset::MonthToDate => DateRange::month_to_date(today),
            RangePreset::ThisMonth => {
                let next_month = if month_start.month() == 12 {
                    NaiveDate::from_ymd_opt(month_start.year() + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(month_start.year(), month_start.month() + 1, 1)?
                };
                DateRange { start: month_start, end: next_month.pred_opt()? }
            }
            RangePreset::LastMonth => {
                let end = month_start.pred_opt()?;
                DateRange { start: end.with_day(1)?, end }
            }
            RangePreset::ThisYear => DateRange {
                start: year_start,
                end: NaiveDate::from_ymd_opt(today.year(), 12, 31)?,
            },
            RangePreset::LastYear => DateRange {
                start: NaiveDate::from_ymd_opt(today.year() - 1, 1, 1)?,
                end: year_start.pred_opt()?,
            },
            RangePreset::Custom => return None,
        };

        Some(range)
    }

    /// Libellé affiché dans l'en-tête
    pub fn label(&self) -> &'static str {
        match self {
            RangePreset::Today => "Today",
            RangePreset::Yesterday => "Yesterday",
            RangePreset::Last7Days => "Last 7 days",
            RangePreset::Last30Days => "Last 30 days",
            RangePreset::ThisWeek => "This week",
            RangePreset::LastWeek => "Last week",
            RangePreset::MonthToDate => "Month to date",
            RangePreset::ThisMonth => "This month",
            RangePreset::LastMonth => "Last month",
            RangePreset::ThisYear => "This year",
            RangePreset::LastYear => "Last year",
            RangePreset::Custom => "Custom",
        }
    }

    /// Preset suivant (cycle)
    pub fn next(&self) -> RangePreset {
        match Self::CYCLE.iter().position(|p| p == self) {
            Some(i) => Self::CYCLE[(i + 1) % Self::CYCLE.len()],
            None => Self::CYCLE[0],
        }
    }

    /// Preset précédent (cycle)
    pub fn previous(&self) -> RangePreset {
        match Self::CYCLE.iter().position(|p| p == self) {
            Some(0) | None => Self::CYCLE[Self::CYCLE.len() - 1],
            Some(i) => Self::CYCLE[i - 1],
        }
    }
}

impl FromStr for RangePreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "today" => Ok(RangePreset::Today),
            "yesterday" => Ok(RangePreset::Yesterday),
            "last_7_days" | "last7days" => Ok(RangePreset::Last7Days),
            "last_30_days" | "last30days" => Ok(RangePreset::Last30Days),
            "this_week" => Ok(RangePreset::ThisWeek),
            "last_week" => Ok(RangePreset::LastWeek),
            "month_to_date" | "mtd" => Ok(RangePreset::MonthToDate),
            "this_month" => Ok(RangePreset::ThisMonth),
            "last_month" => Ok(RangePreset::LastMonth),
            "this_year" => Ok(RangePreset::ThisYear),
            "last_year" => Ok(RangePreset::LastYear),
            other => Err(format!("Preset inconnu : {}", other)),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
