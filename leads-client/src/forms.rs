use regex::Regex;
use shared_types::{Credentials, Lead, LeadPayload, LeadSource, LeadStatus};
use std::sync::OnceLock;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found in a form, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_messages(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    messages.join("; ")
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"))
}

fn validate_email(email: &str, errors: &mut ValidationErrors) {
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !email_regex().is_match(email) {
        errors.add("email", "Email is invalid");
    }
}

/// Raw create/edit form input. Text fields hold what the user typed;
/// `score` and `lead_value` are parsed on validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub city: String,
    pub state: String,
    pub source: Option<LeadSource>,
    pub status: LeadStatus,
    pub score: String,
    pub lead_value: String,
}

impl LeadForm {
    /// Prefills the edit form from an existing lead
    pub fn from_lead(lead: &Lead) -> Self {
        Self {
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone().unwrap_or_default(),
            company: lead.company.clone().unwrap_or_default(),
            city: lead.city.clone().unwrap_or_default(),
            state: lead.state.clone().unwrap_or_default(),
            source: lead.source_kind(),
            status: lead.status_kind().unwrap_or_default(),
            score: lead.score.map(|s| s.to_string()).unwrap_or_default(),
            lead_value: lead.lead_value.map(|v| v.to_string()).unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<LeadPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        let email = self.email.trim();

        if first_name.is_empty() {
            errors.add("first_name", "First name is required");
        }
        if last_name.is_empty() {
            errors.add("last_name", "Last name is required");
        }
        validate_email(email, &mut errors);

        let score = match self.score.trim() {
            "" => None,
            raw => match raw.parse::<i32>() {
                Ok(score) if (0..=100).contains(&score) => Some(score),
                _ => {
                    errors.add("score", "Score must be a number between 0 and 100");
                    None
                }
            },
        };

        let lead_value = match self.lead_value.trim() {
            "" => None,
            raw => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
                _ => {
                    errors.add("lead_value", "Lead value must be a non-negative number");
                    None
                }
            },
        };

        errors.into_result(LeadPayload {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            phone: optional(&self.phone),
            company: optional(&self.company),
            city: optional(&self.city),
            state: optional(&self.state),
            source: self.source,
            status: self.status,
            score,
            lead_value,
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Checks login/register input before anything is sent
pub fn validate_credentials(credentials: &Credentials) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    validate_email(credentials.email.trim(), &mut errors);

    if credentials.password.is_empty() {
        errors.add("password", "Password is required");
    } else if credentials.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }

    errors.into_result(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> LeadForm {
        LeadForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            ..LeadForm::default()
        }
    }

    #[test]
    fn test_valid_form_builds_payload() {
        let form = LeadForm {
            company: "  Analytical Engines ".to_string(),
            score: "85".to_string(),
            lead_value: "12500.50".to_string(),
            source: Some(LeadSource::Referral),
            ..valid_form()
        };

        let payload = form.validate().unwrap();
        assert_eq!(payload.company.as_deref(), Some("Analytical Engines"));
        assert_eq!(payload.phone, None);
        assert_eq!(payload.score, Some(85));
        assert_eq!(payload.lead_value, Some(12500.5));
        assert_eq!(payload.status, LeadStatus::New);
    }

    #[test]
    fn test_required_fields() {
        let errors = LeadForm::default().validate().unwrap_err();
        assert_eq!(errors.get("first_name"), Some("First name is required"));
        assert_eq!(errors.get("last_name"), Some("Last name is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.errors().len(), 3);
        assert_eq!(
            errors.to_string(),
            "First name is required; Last name is required; Email is required"
        );
        let boxed: Box<dyn std::error::Error> = Box::new(errors);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_malformed_email() {
        for email in ["ada", "ada@example", "ada @example.com"] {
            let form = LeadForm {
                email: email.to_string(),
                ..valid_form()
            };
            let errors = form.validate().unwrap_err();
            assert_eq!(errors.get("email"), Some("Email is invalid"), "{}", email);
        }
    }

    #[test]
    fn test_score_bounds() {
        for score in ["-1", "101", "eighty", "8.5"] {
            let form = LeadForm {
                score: score.to_string(),
                ..valid_form()
            };
            assert!(form.validate().unwrap_err().get("score").is_some(), "{}", score);
        }
        for score in ["0", "100"] {
            let form = LeadForm {
                score: score.to_string(),
                ..valid_form()
            };
            assert!(form.validate().is_ok(), "{}", score);
        }
    }

    #[test]
    fn test_negative_lead_value() {
        let form = LeadForm {
            lead_value: "-5".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("lead_value"),
            Some("Lead value must be a non-negative number")
        );
    }

    #[test]
    fn test_prefill_from_lead() {
        let lead = Lead {
            id: 4,
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@navy.mil".to_string(),
            phone: None,
            company: Some("US Navy".to_string()),
            city: None,
            state: None,
            source: Some("events".to_string()),
            status: "won".to_string(),
            score: Some(0),
            lead_value: Some(2500.0),
        };

        let form = LeadForm::from_lead(&lead);
        assert_eq!(form.score, "0");
        assert_eq!(form.lead_value, "2500");
        assert_eq!(form.company, "US Navy");

        let payload = form.validate().unwrap();
        assert_eq!(payload.status, LeadStatus::Won);
        assert_eq!(payload.source, Some(LeadSource::Events));
    }

    #[test]
    fn test_credentials() {
        assert!(validate_credentials(&Credentials::new("me@site.io", "secret")).is_ok());

        let errors = validate_credentials(&Credentials::new("", "")).unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));

        let errors = validate_credentials(&Credentials::new("me@site.io", "12345")).unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(errors.to_string(), "Password must be at least 6 characters");
    }
}
