//! Persona script templating
//!
//! The persona script is plain text with two placeholders:
//! - `{{date}}`: today's date in the configured timezone, written out in the
//!   configured locale (Brazilian Portuguese by default, "3 de outubro de 2024")
//! - `{{schedule}}`: the availability document fetched for the call
//!
//! `$resultadoDaApi` is accepted as an alias for `{{schedule}}` so existing
//! scripts keep working.

use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use chrono::{Locale, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::{Error, Result};

const DATE_PLACEHOLDER: &str = "{{date}}";
const SCHEDULE_PLACEHOLDER: &str = "{{schedule}}";
const LEGACY_SCHEDULE_PLACEHOLDER: &str = "$resultadoDaApi";

/// Default locale for `{{date}}`
pub const DEFAULT_DATE_LOCALE: &str = "pt_BR";

/// Default strftime pattern for `{{date}}`
pub const DEFAULT_DATE_FORMAT: &str = "%-d de %B de %Y";

/// Built-in script used when no template file is configured
pub const DEFAULT_TEMPLATE: &str = "\
You are a friendly phone assistant that books appointments. Today is {{date}}.

Callers want to schedule an appointment with one of the professionals listed \
in the schedule below. Offer two available slots at a time and ask whether \
either works; if not, offer others. Ask whether the caller prefers mornings \
or afternoons before suggesting times.

<Schedule>
{{schedule}}
</Schedule>

<rules>
Ask one question at a time.
Ask for the caller's full name before booking, then address them by first name.
Confirm whether the number they are calling from is the best contact number.
</rules>
";

/// How `{{date}}` is written
#[derive(Debug, Clone)]
pub struct DateStyle {
    format: String,
    locale: Locale,
}

impl DateStyle {
    /// Build from a strftime pattern and a POSIX locale name such as `pt_BR`
    ///
    /// # Errors
    ///
    /// Returns error if the locale is unknown or the pattern is invalid
    pub fn new(format: &str, locale: &str) -> Result<Self> {
        let locale = Locale::try_from(locale)
            .map_err(|_| Error::Config(format!("unknown date locale: {locale}")))?;
        if StrftimeItems::new_with_locale(format, locale).any(|item| item == Item::Error) {
            return Err(Error::Config(format!("invalid date format: {format}")));
        }
        Ok(Self {
            format: format.to_string(),
            locale,
        })
    }

    fn render(&self, day: NaiveDate) -> String {
        day.format_localized(&self.format, self.locale).to_string()
    }
}

impl Default for DateStyle {
    fn default() -> Self {
        Self {
            format: DEFAULT_DATE_FORMAT.to_string(),
            locale: Locale::pt_BR,
        }
    }
}

/// Persona script template bound to a timezone
#[derive(Debug, Clone)]
pub struct PersonaTemplate {
    template: String,
    timezone: Tz,
    date_style: DateStyle,
}

impl PersonaTemplate {
    /// Create from template text
    #[must_use]
    pub fn new(template: impl Into<String>, timezone: Tz) -> Self {
        Self {
            template: template.into(),
            timezone,
            date_style: DateStyle::default(),
        }
    }

    /// Override how `{{date}}` is written
    #[must_use]
    pub fn with_date_style(mut self, date_style: DateStyle) -> Self {
        self.date_style = date_style;
        self
    }

    /// Load from a file, or fall back to [`DEFAULT_TEMPLATE`]
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or has no schedule placeholder
    pub fn load(path: Option<&Path>, timezone: Tz) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::new(DEFAULT_TEMPLATE, timezone));
        };

        let template = std::fs::read_to_string(path).map_err(|e| {
            Error::Persona(format!("failed to read {}: {e}", path.display()))
        })?;
        if !template.contains(SCHEDULE_PLACEHOLDER) && !template.contains(LEGACY_SCHEDULE_PLACEHOLDER)
        {
            tracing::warn!(
                path = %path.display(),
                "persona template has no schedule placeholder; schedule will not be included"
            );
        }
        tracing::info!(path = %path.display(), "loaded persona template");

        Ok(Self::new(template, timezone))
    }

    /// Render for a specific day
    #[must_use]
    pub fn render_on(&self, today: NaiveDate, schedule: &str) -> String {
        let date = self.date_style.render(today);
        self.template
            .replace(DATE_PLACEHOLDER, &date)
            .replace(SCHEDULE_PLACEHOLDER, schedule)
            .replace(LEGACY_SCHEDULE_PLACEHOLDER, schedule)
    }

    /// Render for today in the template's timezone
    #[must_use]
    pub fn render(&self, schedule: &str) -> String {
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        self.render_on(today, schedule)
    }
}
