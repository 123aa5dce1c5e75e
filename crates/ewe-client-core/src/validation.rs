//! Per-field validation rules
//!
//! Rules are held in an ordered [`RuleSet`]. A field is checked against each
//! applicable rule in order and the first failing rule decides the message,
//! so precedence is a property of the list rather than of branch order.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Field name the server uses for Indian mobile numbers
pub const MOBILE_FIELD_NAME: &str = "mobile_no";

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const MSG_REQUIRED: &str = "This field is required";
pub const MSG_EMAIL: &str = "Please enter a valid email address";
pub const MSG_MOBILE: &str = "Please enter a valid 10-digit mobile number";
pub const MSG_PASSWORD: &str = "Password must be at least 8 characters long";

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    // ASCII digits only; `\d` would also accept other Unicode decimal digits.
    static ref MOBILE_RE: Regex = Regex::new(r"^[6-9][0-9]{9}$").unwrap();
    static ref STANDARD_RULES: RuleSet = RuleSet::standard();
}

/// Snapshot of a form control, as read from the DOM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Control type (`text`, `email`, `password`, `select-one`, `textarea`, ...)
    pub input_type: String,
    /// The control's `name` attribute
    pub name: String,
    /// Whether the control carries the `required` attribute
    pub required: bool,
    /// Raw, untrimmed value
    pub value: String,
}

impl FieldDescriptor {
    pub fn new(input_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            input_type: input_type.into(),
            name: name.into(),
            required: false,
            value: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Value with leading and trailing whitespace stripped
    pub fn trimmed_value(&self) -> &str {
        self.value.trim()
    }

    fn has_type(&self, input_type: &str) -> bool {
        self.input_type.eq_ignore_ascii_case(input_type)
    }

    fn is_filled(&self) -> bool {
        !self.trimmed_value().is_empty()
    }
}

/// Outcome of validating one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Empty when valid
    pub message: String,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// A single declarative check
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    applies_to: fn(&FieldDescriptor) -> bool,
    check: fn(&str) -> bool,
    pub message: &'static str,
}

impl FieldRule {
    pub const fn new(
        name: &'static str,
        applies_to: fn(&FieldDescriptor) -> bool,
        check: fn(&str) -> bool,
        message: &'static str,
    ) -> Self {
        Self {
            name,
            applies_to,
            check,
            message,
        }
    }

    pub fn applies_to(&self, field: &FieldDescriptor) -> bool {
        (self.applies_to)(field)
    }

    /// Run the check against an already-trimmed value
    pub fn check(&self, value: &str) -> bool {
        (self.check)(value)
    }

    pub fn required() -> Self {
        Self::new(
            "required",
            |field| field.required,
            |value| !value.is_empty(),
            MSG_REQUIRED,
        )
    }

    pub fn email() -> Self {
        Self::new(
            "email",
            |field| field.has_type("email") && field.is_filled(),
            |value| EMAIL_RE.is_match(value),
            MSG_EMAIL,
        )
    }

    pub fn mobile() -> Self {
        Self::new(
            "mobile",
            |field| field.name == MOBILE_FIELD_NAME && field.is_filled(),
            |value| MOBILE_RE.is_match(value),
            MSG_MOBILE,
        )
    }

    pub fn password() -> Self {
        Self::new(
            "password",
            |field| field.has_type("password") && field.is_filled(),
            |value| value.chars().count() >= MIN_PASSWORD_LENGTH,
            MSG_PASSWORD,
        )
    }
}

impl std::fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRule")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish()
    }
}

/// Ordered list of rules; the first failing rule wins
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// required → email → mobile → password
    pub fn standard() -> Self {
        Self::new(vec![
            FieldRule::required(),
            FieldRule::email(),
            FieldRule::mobile(),
            FieldRule::password(),
        ])
    }

    pub fn push(&mut self, rule: FieldRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Names of the rules in evaluation order
    pub fn order(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name).collect()
    }

    pub fn validate(&self, field: &FieldDescriptor) -> ValidationResult {
        let value = field.trimmed_value();
        self.rules
            .iter()
            .filter(|rule| rule.applies_to(field))
            .find(|rule| !rule.check(value))
            .map(|rule| ValidationResult::invalid(rule.message))
            .unwrap_or_else(ValidationResult::ok)
    }
}

/// Validate a field against the standard rule set
pub fn validate(field: &FieldDescriptor) -> ValidationResult {
    STANDARD_RULES.validate(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn email(value: &str) -> FieldDescriptor {
        FieldDescriptor::new("email", "email").with_value(value)
    }

    fn mobile(value: &str) -> FieldDescriptor {
        FieldDescriptor::new("tel", MOBILE_FIELD_NAME).with_value(value)
    }

    fn password(value: &str) -> FieldDescriptor {
        FieldDescriptor::new("password", "password").with_value(value)
    }

    #[test]
    fn test_standard_rule_order() {
        assert_eq!(
            RuleSet::standard().order(),
            vec!["required", "email", "mobile", "password"]
        );
    }

    #[test]
    fn test_required_empty_fails() {
        let field = FieldDescriptor::new("text", "full_name").required();
        assert_eq!(validate(&field), ValidationResult::invalid(MSG_REQUIRED));
    }

    #[test]
    fn test_required_whitespace_only_fails() {
        let field = FieldDescriptor::new("text", "full_name")
            .required()
            .with_value("   \t ");
        assert_eq!(validate(&field), ValidationResult::invalid(MSG_REQUIRED));
    }

    #[test]
    fn test_required_email_empty_reports_required() {
        let field = email("").required();
        assert_eq!(validate(&field).message, MSG_REQUIRED);
    }

    #[test]
    fn test_optional_empty_passes() {
        assert!(validate(&email("")).valid);
        assert!(validate(&mobile("")).valid);
        assert!(validate(&password("  ")).valid);
    }

    #[test]
    fn test_email_shape() {
        assert_eq!(validate(&email("a@b")), ValidationResult::invalid(MSG_EMAIL));
        assert!(validate(&email("a@b.com")).valid);
        assert!(validate(&email("  a@b.com  ")).valid);
        assert!(!validate(&email("a b@c.com")).valid);
        assert!(!validate(&email("a@@b.com")).valid);
    }

    #[test]
    fn test_email_type_is_case_insensitive() {
        let field = FieldDescriptor::new("EMAIL", "contact").with_value("nope");
        assert!(!validate(&field).valid);
    }

    #[test]
    fn test_mobile_numbers() {
        assert_eq!(
            validate(&mobile("5123456789")),
            ValidationResult::invalid(MSG_MOBILE)
        );
        assert!(validate(&mobile("9123456789")).valid);
        assert!(!validate(&mobile("91234567890")).valid);
        assert!(!validate(&mobile("912345678")).valid);
        assert!(!validate(&mobile("91234a6789")).valid);
    }

    #[test]
    fn test_mobile_rejects_non_ascii_digits() {
        // Devanagari digits are decimal digits but not valid input here
        assert!(!validate(&mobile("९१२३४५६७८९")).valid);
    }

    #[test]
    fn test_mobile_rule_keyed_on_name_not_type() {
        let field = FieldDescriptor::new("tel", "phone").with_value("123");
        assert!(validate(&field).valid);
    }

    #[test]
    fn test_password_length() {
        assert_eq!(
            validate(&password("short12")),
            ValidationResult::invalid(MSG_PASSWORD)
        );
        assert!(validate(&password("longenough1")).valid);
        assert!(validate(&password("exactly8")).valid);
    }

    #[test]
    fn test_password_counts_characters_not_bytes() {
        assert!(!validate(&password("ééééééé")).valid);
        assert!(validate(&password("éééééééé")).valid);
    }

    #[test]
    fn test_unknown_type_valid_once_filled() {
        let field = FieldDescriptor::new("color", "favourite")
            .required()
            .with_value("#ff0000");
        assert_eq!(validate(&field), ValidationResult::ok());
    }

    #[test]
    fn test_first_failing_rule_wins() {
        // Email-typed field that also uses the mobile name: both rules fail,
        // the earlier rule in the list decides the message.
        let field = FieldDescriptor::new("email", MOBILE_FIELD_NAME).with_value("oops");
        assert_eq!(validate(&field).message, MSG_EMAIL);

        let reversed = RuleSet::new(vec![FieldRule::mobile(), FieldRule::email()]);
        assert_eq!(reversed.validate(&field).message, MSG_MOBILE);
    }

    #[test]
    fn test_custom_rule_appended() {
        let mut rules = RuleSet::standard();
        rules.push(FieldRule::new(
            "sponsor",
            |field| field.name == "sponsor_id",
            |value| value.starts_with("EWE"),
            "Sponsor ID must start with EWE",
        ));
        let field = FieldDescriptor::new("text", "sponsor_id").with_value("ABC123");
        assert_eq!(
            rules.validate(&field).message,
            "Sponsor ID must start with EWE"
        );
    }

    #[test]
    fn test_empty_rule_set_accepts_everything() {
        let field = FieldDescriptor::new("email", "x").required();
        assert!(RuleSet::default().validate(&field).valid);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: required + blank is always the required message, whatever the type
        #[test]
        fn required_blank_always_fails(
            input_type in "(text|email|password|tel|number|select-one|textarea)",
            name in "[a-z_]{1,12}",
            blank in "[ \t\n]{0,4}"
        ) {
            let field = FieldDescriptor::new(input_type, name).required().with_value(blank);
            prop_assert_eq!(validate(&field), ValidationResult::invalid(MSG_REQUIRED));
        }

        /// Property: optional blank fields never fail a format rule
        #[test]
        fn optional_blank_always_passes(
            input_type in "(text|email|password|tel)",
            name in "(mobile_no|email|password|other)",
            blank in "[ \t]{0,4}"
        ) {
            let field = FieldDescriptor::new(input_type, name).with_value(blank);
            prop_assert!(validate(&field).valid);
        }

        /// Property: any 6-9 led ten digit number is accepted
        #[test]
        fn well_formed_mobiles_pass(number in "[6-9][0-9]{9}") {
            let field = FieldDescriptor::new("tel", MOBILE_FIELD_NAME).with_value(number);
            prop_assert!(validate(&field).valid);
        }

        /// Property: numbers led by 0-5 are rejected
        #[test]
        fn low_leading_digit_mobiles_fail(number in "[0-5][0-9]{9}") {
            let field = FieldDescriptor::new("tel", MOBILE_FIELD_NAME).with_value(number);
            prop_assert!(!validate(&field).valid);
        }

        /// Property: password validity is exactly the length threshold
        #[test]
        fn password_threshold(value in "[a-zA-Z0-9]{1,20}") {
            let field = FieldDescriptor::new("password", "password").with_value(value.clone());
            prop_assert_eq!(validate(&field).valid, value.len() >= MIN_PASSWORD_LENGTH);
        }
    }
}
