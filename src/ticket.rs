use chrono::NaiveDate;

/// The travel pass shown on the ticket screen
#[derive(Debug, Clone, Default)]
pub struct Ticket {
    valid_until: Option<NaiveDate>,
}

impl Ticket {
    /// Recompute the validity date as the day after `today`
    pub fn refresh(&mut self, today: NaiveDate) {
        self.valid_until = today.succ_opt();
    }

    #[cfg(test)]
    pub fn valid_until(&self) -> Option<NaiveDate> {
        self.valid_until
    }

    pub fn valid_until_label(&self) -> String {
        self.valid_until
            .map(format_long_date)
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Long calendar form, e.g. "June 5, 2025"
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
