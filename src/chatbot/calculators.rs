//! Pregnancy and vaccination calendars
//!
//! Pure date arithmetic over a `DD/MM/YYYY` input and an injected "today".
//! Months in the vaccination table are approximated as 30 days.

use chrono::{Duration, NaiveDate};

/// Reply for any date that does not parse as `DD/MM/YYYY`.
pub const INVALID_DATE_MESSAGE: &str =
    "La date n'est pas valide ❗ Utilise le format JJ/MM/AAAA.";

const DATE_INPUT_FORMAT: &str = "%d/%m/%Y";
const DATE_OUTPUT_FORMAT: &str = "%d %B %Y";

/// Gestation length from conception to due date.
pub const GESTATION_DAYS: i64 = 280;

/// Days per month in the vaccination schedule.
pub const DAYS_PER_MONTH: i64 = 30;

/// Burkina Faso immunization calendar, 30 January 2025 revision.
pub const VACCINATION_SCHEDULE: &[(&str, i64)] = &[
    ("BCG", 0),
    ("Hépatite B", 0),
    ("VPO", 0),
    ("DTC-Hepatite-B Hib2", 2),
    ("VPO 1", 2),
    ("Pneumo 1 PCV13", 2),
    ("Rota 1", 2),
    ("DTC-HepB-Hib 2", 3),
    ("VPO 2", 3),
    ("Rota 2", 3),
    ("DTC-HepB-Hib 3", 4),
    ("VPO 3", 4),
    ("Pneumo 2", 4),
    ("Rota 3", 4),
    ("VPI", 4),
    ("Vaccin anti paludique 1", 5),
    ("Vaccin anti paludique 2", 6),
    ("Vaccin anti paludique 3", 7),
    ("RR 1", 9),
    ("VAA", 9),
    ("VTC fievre typhoide", 9),
    ("VPI 2", 9),
    ("RR 2", 15),
    ("Men A MenAfricVac", 15),
    ("Pneumo 3 PCV 13", 23),
    ("Vaccin anti-paludique 4", 23),
];

pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_INPUT_FORMAT).ok()
}

/// Key dates of a pregnancy derived from its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PregnancyTimeline {
    pub due_date: NaiveDate,
    pub conception: NaiveDate,
    pub weeks_pregnant: i64,
    pub weeks_remaining: i64,
}

impl PregnancyTimeline {
    pub fn new(due_date: NaiveDate, today: NaiveDate) -> Self {
        let conception = due_date - Duration::days(GESTATION_DAYS);
        Self {
            due_date,
            conception,
            weeks_pregnant: (today - conception).num_days().div_euclid(7),
            weeks_remaining: (due_date - today).num_days().div_euclid(7),
        }
    }
}

/// Date of each vaccine for a child born on `birth_date`.
pub fn vaccination_dates(birth_date: NaiveDate) -> Vec<(&'static str, NaiveDate)> {
    VACCINATION_SCHEDULE
        .iter()
        .map(|&(vaccine, months)| (vaccine, birth_date + Duration::days(months * DAYS_PER_MONTH)))
        .collect()
}

/// Pregnancy calendar text for a `DD/MM/YYYY` due date.
pub fn generate_pregnancy_calendar(due_date: &str, today: NaiveDate) -> String {
    let Some(due) = parse_date(due_date) else {
        return INVALID_DATE_MESSAGE.to_string();
    };
    let timeline = PregnancyTimeline::new(due, today);

    format!(
        "🤰 **Calendrier de votre grossesse :**\n\n\
         📅 **Date prévue d'accouchement :** {}\n\
         🌱 **Date probable de conception :** {}\n\
         👶 **Âge actuel de grossesse :** {} semaines\n\
         ⏳ **Semaines restantes :** {} semaines\n\n\
         Souhaitez-vous un calendrier détaillé mois par mois ? 😊",
        timeline.due_date.format(DATE_OUTPUT_FORMAT),
        timeline.conception.format(DATE_OUTPUT_FORMAT),
        timeline.weeks_pregnant,
        timeline.weeks_remaining,
    )
}

/// Vaccination calendar text for a `DD/MM/YYYY` birth date.
pub fn generate_vaccination_calendar(birth_date: &str) -> String {
    let Some(birth) = parse_date(birth_date) else {
        return INVALID_DATE_MESSAGE.to_string();
    };

    let mut response = String::from("💉 **Calendrier de vaccination pour votre enfant :**\n\n");
    for (vaccine, date) in vaccination_dates(birth) {
        response.push_str(&format!(
            "• {} : {}\n",
            vaccine,
            date.format(DATE_OUTPUT_FORMAT)
        ));
    }
    response
}
